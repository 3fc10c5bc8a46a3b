use thiserror::Error;

#[derive(Debug, Error)]
pub enum PredictError {
    #[error("Unknown satellite: {0}")]
    UnknownSatellite(String),
    #[error("No orbital elements available for {0}")]
    ElementsUnavailable(String),
    #[error("TLE file read error: {0}")]
    FileRead(#[from] std::io::Error),
    #[error("Invalid TLE for {source_name}: {message}")]
    InvalidTle {
        source_name: String,
        message: String,
    },
    #[error("Propagation error: {0}")]
    Propagation(String),
    #[error("No pass found for {satellite} within the search window")]
    NoPass { satellite: String },
    #[error("TLE download failed: {0}")]
    Download(String),
}

impl From<sgp4::Error> for PredictError {
    fn from(err: sgp4::Error) -> Self {
        PredictError::Propagation(err.to_string())
    }
}
