mod error;
pub mod ground_station;
mod pass_finder;
mod predictor;
mod propagation;
pub mod tle_fetch;
pub mod tle_loader;
mod types;

pub use error::PredictError;
pub use ground_station::GroundStation;
pub use predictor::{OrbitalPredictor, Sgp4Predictor};
pub use tle_fetch::download_tles;
pub use tle_loader::{ElementsSource, TleLoader};
pub use types::{LookAngles, OrbitalElements, PassWindow};
