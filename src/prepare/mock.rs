use std::collections::{HashMap, HashSet};

use super::error::PrepareError;
use super::normalize::{Coordinates, Geocoder, clean_text};

/// In-memory [`Geocoder`] keyed by cleaned address text.
#[derive(Debug, Default, Clone)]
pub struct MockGeocoder {
    known: HashMap<String, Coordinates>,
    failing: HashSet<String>,
}

impl MockGeocoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, address: &str, latitude: f64, longitude: f64) -> Self {
        self.known.insert(
            clean_text(address),
            Coordinates {
                latitude,
                longitude,
            },
        );
        self
    }

    /// Makes lookups of `address` fail as a timed-out request would.
    pub fn failing(mut self, address: &str) -> Self {
        self.failing.insert(clean_text(address));
        self
    }
}

impl Geocoder for MockGeocoder {
    fn geocode(&self, address: &str) -> Result<Option<Coordinates>, PrepareError> {
        let key = clean_text(address);
        if self.failing.contains(&key) {
            return Err(PrepareError::Geocode {
                reason: format!("timed out resolving '{key}'"),
            });
        }
        Ok(self.known.get(&key).copied())
    }
}
