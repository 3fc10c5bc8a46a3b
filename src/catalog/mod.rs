mod catalog;
pub mod defaults;
mod types;

pub use catalog::SatelliteCatalog;
pub use types::{SatelliteMetadata, SatelliteRecord, SatelliteSummary};
