mod controller;
pub mod doppler;
mod error;
mod operator;
mod report;
mod state;
mod status;

pub use controller::{
    ElementsRefresh, ParkPosition, RotorPair, Shutdown, TrackingController, TrackingSettings,
};
pub use error::TrackerError;
pub use operator::OperatorConsole;
pub use state::{Candidate, Directive, TrackPhase, TrackState};
pub use status::{RotorReadout, StatusHandle, TrackerStatus};
