use crate::catalog::AirportCatalog;
use crate::index::AirportIndex;
use crate::IkarusError;
use serde::{Deserialize, Serialize};
use std::collections::hash_map::Entry;
use std::collections::HashMap;

/// One candidate airport for a search query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AirportMatch {
    /// Index keys that led to this airport, in scan order.
    pub matched: Vec<String>,
    pub iata: String,
}

impl AirportMatch {
    fn record_key(&mut self, key: &str) {
        if !self.matched.iter().any(|k| k == key) {
            self.matched.push(key.to_string());
        }
    }
}

/// Resolves a free-text prefix against every index key, case-insensitively.
///
/// With `major_only` set, airports without an IATA code are left out.
/// Result order is not meaningful.
pub fn match_airports(
    catalog: &AirportCatalog,
    index: &AirportIndex,
    query: &str,
    major_only: bool,
) -> Result<HashMap<String, AirportMatch>, IkarusError> {
    let needle = query.to_lowercase();
    let mut matches: HashMap<String, AirportMatch> = HashMap::new();

    for (key, codes) in index
        .iter()
        .filter(|(key, _)| key.to_lowercase().starts_with(&needle))
    {
        for code in codes {
            match matches.entry(code.clone()) {
                Entry::Occupied(mut existing) => existing.get_mut().record_key(key),
                Entry::Vacant(slot) => {
                    let record = catalog.lookup(code)?;
                    if major_only && !record.is_major() {
                        continue;
                    }
                    slot.insert(AirportMatch {
                        matched: vec![key.to_string()],
                        iata: record.iata.clone(),
                    });
                }
            }
        }
    }

    log::debug!(
        "Airport search — query='{}' major_only={} results={}",
        query,
        major_only,
        matches.len()
    );

    if matches.is_empty() {
        return Err(IkarusError::NoMatch(query.to_string()));
    }
    Ok(matches)
}
