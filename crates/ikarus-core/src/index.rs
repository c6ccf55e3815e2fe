use crate::catalog::AirportCatalog;
use crate::IkarusError;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{BufReader, Read};
use std::path::Path;

/// Search keys (IATA codes and city names, case as stored) mapped to the
/// ICAO codes they refer to.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AirportIndex {
    keys: BTreeMap<String, Vec<String>>,
}

impl AirportIndex {
    /// Builds the search index from the full catalog.
    ///
    /// An IATA key always holds exactly the last airport registered under it,
    /// while a city key accumulates every airport of that city in catalog order.
    pub fn build(catalog: &AirportCatalog) -> Self {
        let mut keys: BTreeMap<String, Vec<String>> = BTreeMap::new();

        for (code, record) in catalog.iter() {
            if !record.iata.is_empty() {
                keys.insert(record.iata.clone(), vec![code.to_string()]);
            }
            keys.entry(record.city.clone())
                .or_default()
                .push(code.to_string());
        }

        log::info!(
            "Built airport index — airports={} keys={}",
            catalog.len(),
            keys.len()
        );

        Self { keys }
    }

    pub fn from_entries<I>(entries: I) -> Self
    where
        I: IntoIterator<Item = (String, Vec<String>)>,
    {
        Self {
            keys: entries.into_iter().collect(),
        }
    }

    /// Loads the `airport_ids.json` document (search key -> ICAO codes).
    pub fn load_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)
            .with_context(|| format!("Failed to open airport index {}", path.display()))?;
        let index = Self::parse(BufReader::new(file))
            .with_context(|| format!("Failed to parse airport index {}", path.display()))?;
        log::info!(
            "Loaded airport index — path={} keys={}",
            path.display(),
            index.len()
        );
        Ok(index)
    }

    pub fn parse<R: Read>(reader: R) -> Result<Self> {
        Ok(serde_json::from_reader(reader)?)
    }

    pub fn save_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).context("Failed to create index directory")?;
            }
        }
        let content =
            serde_json::to_string_pretty(self).context("Failed to serialize airport index")?;
        fs::write(path, content)
            .with_context(|| format!("Failed to write airport index {}", path.display()))
    }

    /// Checks that every referenced code resolves in the catalog.
    pub fn validate(&self, catalog: &AirportCatalog) -> Result<(), IkarusError> {
        for (key, codes) in &self.keys {
            if let Some(missing) = codes.iter().find(|code| !catalog.contains(code)) {
                log::warn!(
                    "Airport index references unknown airport — key={} code={}",
                    key,
                    missing
                );
                return Err(IkarusError::NotFound(missing.clone()));
            }
        }
        Ok(())
    }

    pub fn get(&self, key: &str) -> Option<&[String]> {
        self.keys.get(key).map(Vec::as_slice)
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.keys
            .iter()
            .map(|(key, codes)| (key.as_str(), codes.as_slice()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::AirportRecord;

    fn record(iata: &str, city: &str) -> AirportRecord {
        AirportRecord {
            iata: iata.to_string(),
            city: city.to_string(),
            country: "Testland".to_string(),
            lat: 0.0,
            lon: 0.0,
        }
    }

    #[test]
    fn test_build_registers_iata_and_city() {
        let catalog = AirportCatalog::from_records(vec![
            ("EGLL".to_string(), record("LHR", "London")),
            ("EGKK".to_string(), record("LGW", "London")),
            ("EGLW".to_string(), record("", "London")),
        ]);
        let index = AirportIndex::build(&catalog);

        assert_eq!(index.get("LHR"), Some(&["EGLL".to_string()][..]));
        assert_eq!(index.get("LGW"), Some(&["EGKK".to_string()][..]));
        // City keys accumulate in catalog order
        assert_eq!(
            index.get("London").unwrap(),
            &["EGLL".to_string(), "EGKK".to_string(), "EGLW".to_string()]
        );
        // Empty IATA codes are never registered
        assert_eq!(index.get(""), None);
        assert_eq!(index.len(), 3);
    }

    #[test]
    fn test_build_duplicate_iata_keeps_last() {
        let data = r#"{
            "BBBB": {"iata": "DUP", "city": "Twin", "country": "Testland", "lat": 0.0, "lon": 0.0},
            "AAAA": {"iata": "DUP", "city": "Twin", "country": "Testland", "lat": 0.0, "lon": 0.0}
        }"#;
        let catalog = AirportCatalog::parse(std::io::Cursor::new(data)).unwrap();
        let index = AirportIndex::build(&catalog);

        // Last airport in the document wins the IATA key
        assert_eq!(index.get("DUP"), Some(&["AAAA".to_string()][..]));
        assert_eq!(
            index.get("Twin").unwrap(),
            &["BBBB".to_string(), "AAAA".to_string()]
        );
    }

    #[test]
    fn test_validate_reports_dangling_code() {
        let catalog = AirportCatalog::from_records(vec![(
            "EGLL".to_string(),
            record("LHR", "London"),
        )]);
        let good = AirportIndex::build(&catalog);
        assert!(good.validate(&catalog).is_ok());

        let bad = AirportIndex::from_entries(vec![(
            "Paris".to_string(),
            vec!["LFPG".to_string()],
        )]);
        match bad.validate(&catalog) {
            Err(IkarusError::NotFound(code)) => assert_eq!(code, "LFPG"),
            other => panic!("Expected NotFound, got {:?}", other),
        }
    }

    #[test]
    fn test_save_and_load() {
        let catalog = AirportCatalog::from_records(vec![(
            "EDDB".to_string(),
            record("BER", "Berlin"),
        )]);
        let index = AirportIndex::build(&catalog);

        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("data").join("airport_ids.json");
        index.save_file(&path).unwrap();

        let loaded = AirportIndex::load_file(&path).unwrap();
        assert_eq!(loaded, index);
    }
}
