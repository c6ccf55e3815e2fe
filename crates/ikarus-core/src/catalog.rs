use crate::IkarusError;
use anyhow::{Context, Result};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AirportRecord {
    /// Empty for airports without an IATA designator.
    #[serde(default)]
    pub iata: String,
    pub city: String,
    pub country: String,
    pub lat: f64,
    pub lon: f64,
}

impl AirportRecord {
    /// Airports with an IATA code are treated as major airports.
    pub fn is_major(&self) -> bool {
        !self.iata.is_empty()
    }
}

/// Every known airport, keyed by ICAO code, in the order of the source document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AirportCatalog {
    airports: IndexMap<String, AirportRecord>,
}

impl AirportCatalog {
    pub fn from_records<I>(records: I) -> Self
    where
        I: IntoIterator<Item = (String, AirportRecord)>,
    {
        Self {
            airports: records.into_iter().collect(),
        }
    }

    /// Loads the `airports.json` document (ICAO code -> record).
    pub fn load_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)
            .with_context(|| format!("Failed to open airport catalog {}", path.display()))?;
        let catalog = Self::parse(BufReader::new(file))
            .with_context(|| format!("Failed to parse airport catalog {}", path.display()))?;
        log::info!(
            "Loaded airport catalog — path={} airports={}",
            path.display(),
            catalog.len()
        );
        Ok(catalog)
    }

    pub fn parse<R: Read>(reader: R) -> Result<Self> {
        Ok(serde_json::from_reader(reader)?)
    }

    pub fn lookup(&self, code: &str) -> Result<&AirportRecord, IkarusError> {
        self.airports
            .get(code)
            .ok_or_else(|| IkarusError::NotFound(code.to_string()))
    }

    pub fn contains(&self, code: &str) -> bool {
        self.airports.contains_key(code)
    }

    pub fn len(&self) -> usize {
        self.airports.len()
    }

    pub fn is_empty(&self) -> bool {
        self.airports.is_empty()
    }

    /// Iterates airports in document order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &AirportRecord)> {
        self.airports.iter().map(|(code, record)| (code.as_str(), record))
    }
}
