use thiserror::Error;

#[derive(Debug, Error)]
pub enum RadioError {
    #[error("radio I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("radio did not answer within {0:?}")]
    Timeout(std::time::Duration),
    #[error("radio closed the connection without replying")]
    Closed,
    #[error("unexpected reply to {command:?}: {reply:?}")]
    Malformed { command: String, reply: String },
}
