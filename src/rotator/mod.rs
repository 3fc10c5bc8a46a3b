mod client;
mod error;
pub mod retry;

pub use client::{ActuatorClient, Axis, ACK_OK};
pub use error::RotatorError;
pub use retry::RetryPolicy;

#[cfg(test)]
pub(crate) use client::tests as fake;
