use thiserror::Error;

use crate::rotator::Axis;

#[derive(Debug, Error)]
pub enum RotatorError {
    #[error("{endpoint}: maximum number of unsuccessful connection attempts ({attempts}) reached")]
    RetriesExhausted { endpoint: String, attempts: u32 },
    #[error("rotator I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("{axis} rotator did not answer in time")]
    Timeout { axis: Axis },
    #[error("{axis} rotator closed the connection")]
    Closed { axis: Axis },
    #[error("{axis} rotator rejected command: {reply:?}")]
    Rejected { axis: Axis, reply: String },
    #[error("{axis} angle is not a finite number")]
    InvalidAngle { axis: Axis },
}
