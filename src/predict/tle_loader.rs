use std::fs;
use std::path::PathBuf;

use crate::predict::error::PredictError;
use crate::predict::types::OrbitalElements;

/// Anything that can turn a satellite name into orbital elements.
pub trait ElementsSource: Send {
    /// Returns `None` when no element set matches `name`.
    fn resolve(&self, name: &str) -> Option<OrbitalElements>;

    /// Re-reads the backing feed, returning the number of element sets.
    fn reload(&mut self) -> Result<usize, PredictError>;
}

struct TleEntry {
    name: String,
    line1: String,
    line2: String,
}

/// Three-line element sets read from a local file (or an in-memory string).
pub struct TleLoader {
    path: Option<PathBuf>,
    entries: Vec<TleEntry>,
}

impl TleLoader {
    pub fn from_file(path: impl Into<PathBuf>) -> Result<Self, PredictError> {
        let mut loader = Self {
            path: Some(path.into()),
            entries: Vec::new(),
        };
        loader.reload()?;
        Ok(loader)
    }

    #[cfg(test)]
    pub fn from_str(content: &str) -> Self {
        Self {
            path: None,
            entries: parse_entries(content),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    fn find(&self, name: &str) -> Option<&TleEntry> {
        let wanted = name.trim();
        if wanted.is_empty() {
            return None;
        }
        self.entries
            .iter()
            .find(|e| e.name == wanted)
            .or_else(|| self.entries.iter().find(|e| e.name.contains(wanted)))
    }
}

impl ElementsSource for TleLoader {
    fn resolve(&self, name: &str) -> Option<OrbitalElements> {
        let entry = self.find(name)?;
        match OrbitalElements::from_tle(&entry.name, &entry.line1, &entry.line2) {
            Ok(elements) => Some(elements),
            Err(e) => {
                log::warn!("Matched {} for {} but could not parse it: {}", entry.name, name, e);
                None
            }
        }
    }

    fn reload(&mut self) -> Result<usize, PredictError> {
        if let Some(path) = &self.path {
            let content = fs::read_to_string(path)?;
            self.entries = parse_entries(&content);
            log::info!(
                "Loaded {} element sets from {}",
                self.entries.len(),
                path.display()
            );
        }
        Ok(self.entries.len())
    }
}

fn parse_entries(content: &str) -> Vec<TleEntry> {
    parse_multi_tle(content)
        .into_iter()
        .filter_map(|(name, line1, line2)| match name {
            Some(name) => Some(TleEntry { name, line1, line2 }),
            None => {
                log::debug!("Skipping unnamed element set {}", line1);
                None
            }
        })
        .collect()
}

/// Parse multi-satellite TLE content
pub fn parse_multi_tle(content: &str) -> Vec<(Option<String>, String, String)> {
    let lines: Vec<&str> = content
        .lines()
        .map(|l| l.trim())
        .filter(|l| !l.is_empty())
        .collect();

    let mut result = Vec::new();
    let mut i = 0;

    while i < lines.len() {
        if lines[i].starts_with("1 ") && i + 1 < lines.len() && lines[i + 1].starts_with("2 ") {
            // 2-line TLE (no name)
            result.push((None, lines[i].to_string(), lines[i + 1].to_string()));
            i += 2;
        } else if i + 2 < lines.len()
            && lines[i + 1].starts_with("1 ")
            && lines[i + 2].starts_with("2 ")
        {
            // 3-line TLE (with name)
            result.push((
                Some(lines[i].to_string()),
                lines[i + 1].to_string(),
                lines[i + 2].to_string(),
            ));
            i += 3;
        } else {
            i += 1;
        }
    }

    result
}
