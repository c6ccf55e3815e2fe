pub mod catalog;
pub mod flight;
pub mod history;
pub mod index;
pub mod matcher;

use chrono::NaiveDate;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub use catalog::{AirportCatalog, AirportRecord};
pub use flight::{split_key, FlightKey, FlightRecord, FlightType};
pub use history::{FlightHistory, HistoryReport, HistoryStats, Placement};
pub use index::AirportIndex;
pub use matcher::AirportMatch;

pub const AIRPORTS_FILE: &str = "airports.json";
pub const INDEX_FILE: &str = "airport_ids.json";
pub const SESSION_FILE: &str = "session.json";

#[derive(Error, Debug)]
pub enum IkarusError {
    #[error("{0} is not a valid ICAO code")]
    NotFound(String),
    #[error("{0} did not match any known airport")]
    NoMatch(String),
    #[error("Malformed flight key '{0}', expected YYYY-MM-DD_DEP_ARR")]
    KeyFormat(String),
    #[error("{0} already exists")]
    DuplicateFlight(String),
    #[error("{0} is not part of the flight history")]
    FlightNotInHistory(String),
}

fn project_dirs() -> Option<directories::ProjectDirs> {
    directories::ProjectDirs::from("org", "ikarus", "ikarus")
}

/// Platform data directory holding the airport documents.
pub fn get_data_root() -> PathBuf {
    project_dirs()
        .map(|dirs| dirs.data_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Platform config directory holding the session file.
pub fn get_config_root() -> PathBuf {
    project_dirs()
        .map(|dirs| dirs.config_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from("."))
}

pub fn default_session_path() -> PathBuf {
    get_config_root().join(SESSION_FILE)
}

/// Locations of the two airport documents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataPaths {
    pub airports: PathBuf,
    pub index: PathBuf,
}

impl DataPaths {
    pub fn in_dir<P: AsRef<Path>>(dir: P) -> Self {
        let dir = dir.as_ref();
        Self {
            airports: dir.join(AIRPORTS_FILE),
            index: dir.join(INDEX_FILE),
        }
    }

    /// Uses `dir` when given, otherwise the platform data directory.
    pub fn resolve(dir: Option<&Path>) -> Self {
        match dir {
            Some(dir) => Self::in_dir(dir),
            None => Self::in_dir(get_data_root()),
        }
    }
}

/// Catalog and index, loaded once and shared read-only by every request.
#[derive(Debug, Clone)]
pub struct AirportDatabase {
    catalog: AirportCatalog,
    index: AirportIndex,
}

impl AirportDatabase {
    /// Fails if the index references an airport the catalog does not know.
    pub fn new(catalog: AirportCatalog, index: AirportIndex) -> Result<Self, IkarusError> {
        index.validate(&catalog)?;
        Ok(Self { catalog, index })
    }

    /// Loads both documents. The index is built from the catalog when its
    /// document does not exist yet.
    pub fn load(paths: &DataPaths) -> anyhow::Result<Self> {
        let catalog = AirportCatalog::load_file(&paths.airports)?;
        let index = if paths.index.exists() {
            AirportIndex::load_file(&paths.index)?
        } else {
            log::warn!(
                "Airport index missing, building from catalog — path={}",
                paths.index.display()
            );
            AirportIndex::build(&catalog)
        };
        Ok(Self::new(catalog, index)?)
    }

    pub fn catalog(&self) -> &AirportCatalog {
        &self.catalog
    }

    pub fn index(&self) -> &AirportIndex {
        &self.index
    }

    pub fn lookup(&self, code: &str) -> Result<&AirportRecord, IkarusError> {
        self.catalog.lookup(code)
    }

    pub fn match_airports(
        &self,
        query: &str,
        major_only: bool,
    ) -> Result<HashMap<String, AirportMatch>, IkarusError> {
        matcher::match_airports(&self.catalog, &self.index, query, major_only)
    }

    pub fn derive_flight(
        &self,
        date: NaiveDate,
        departure: &str,
        arrival: &str,
    ) -> Result<FlightRecord, IkarusError> {
        flight::derive_flight(&self.catalog, date, departure, arrival)
    }

    pub fn build_key(
        &self,
        date: NaiveDate,
        departure: &str,
        arrival: &str,
    ) -> Result<FlightKey, IkarusError> {
        flight::build_key(&self.catalog, date, departure, arrival)
    }

    pub fn build_history(&self, order: &[FlightKey]) -> Result<HistoryReport, IkarusError> {
        history::build_history(&self.catalog, order)
    }
}
