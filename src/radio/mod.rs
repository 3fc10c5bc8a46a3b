mod client;
mod error;

pub use client::RadioClient;
pub use error::RadioError;

#[cfg(test)]
pub(crate) use client::tests as fake;
