use crate::catalog::defaults::{canonical_name, default_metadata};
use crate::catalog::types::{SatelliteMetadata, SatelliteRecord, SatelliteSummary};
use crate::predict::{ElementsSource, PredictError};

/// Satellites under track, in the order they were added.
pub struct SatelliteCatalog {
    source: Box<dyn ElementsSource>,
    records: Vec<SatelliteRecord>,
}

impl SatelliteCatalog {
    pub fn new(source: Box<dyn ElementsSource>) -> Self {
        Self {
            source,
            records: Vec::new(),
        }
    }

    /// Registers `identifier` if its elements can be resolved.
    ///
    /// Built-in metadata wins over `metadata` for well-known satellites.
    /// Adding a name twice appends a second record.
    pub fn add(&mut self, identifier: &str, metadata: Option<SatelliteMetadata>) -> bool {
        let name = canonical_name(identifier);
        if name.is_empty() {
            return false;
        }

        let Some(elements) = self.source.resolve(&name) else {
            log::warn!("TLE not found for {}", name);
            return false;
        };

        let metadata = default_metadata(&name).unwrap_or_else(|| metadata.unwrap_or_default());
        log::info!(
            "Added {} (NORAD {}) to catalog",
            name,
            elements.norad_id()
        );
        self.records.push(SatelliteRecord {
            name,
            metadata,
            elements: Some(elements),
        });
        true
    }

    /// Removes the first record registered under `identifier`.
    pub fn remove(&mut self, identifier: &str) -> bool {
        let name = canonical_name(identifier);
        match self.records.iter().position(|r| r.name == name) {
            Some(index) => {
                self.records.remove(index);
                log::info!("Removed {} from catalog", name);
                true
            }
            None => false,
        }
    }

    pub fn get(&self, identifier: &str) -> Option<&SatelliteRecord> {
        let name = canonical_name(identifier);
        self.records.iter().find(|r| r.name == name)
    }

    pub fn contains(&self, identifier: &str) -> bool {
        self.get(identifier).is_some()
    }

    pub fn list(&self) -> Vec<String> {
        self.records.iter().map(|r| r.name.clone()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn summaries(&self) -> Vec<SatelliteSummary> {
        self.records.iter().map(SatelliteSummary::from).collect()
    }

    /// Reloads the element source and re-resolves every record. Records
    /// whose name disappeared keep their metadata but lose their elements.
    /// Returns how many records are left without elements.
    pub fn refresh_elements(&mut self) -> Result<usize, PredictError> {
        self.source.reload()?;

        let mut missing = 0;
        for record in &mut self.records {
            record.elements = self.source.resolve(&record.name);
            if record.elements.is_none() {
                log::warn!("Elements for {} vanished from the feed", record.name);
                missing += 1;
            }
        }
        Ok(missing)
    }
}
