use thiserror::Error;

use crate::rotator::RotatorError;

#[derive(Debug, Error)]
pub enum TrackerError {
    #[error("no orbital elements found for {0}")]
    UnknownSatellite(String),
    #[error("operator input closed")]
    InputClosed,
    #[error("rotator error: {0}")]
    Rotator(#[from] RotatorError),
}
