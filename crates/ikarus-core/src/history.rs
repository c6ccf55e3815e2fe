use crate::catalog::AirportCatalog;
use crate::flight::{FlightKey, FlightRecord};
use crate::IkarusError;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    Before,
    After,
}

/// The ordered, duplicate-free list of flights of one session.
///
/// Persisted as the session document `{"ORDER": ["2024-01-01_EDDB_EGLL", ...]}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FlightHistory {
    #[serde(rename = "ORDER")]
    order: Vec<FlightKey>,
}

impl FlightHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a history from an uploaded key list, rejecting repeated keys.
    pub fn from_keys<I>(keys: I) -> Result<Self, IkarusError>
    where
        I: IntoIterator<Item = FlightKey>,
    {
        let mut history = Self::new();
        for key in keys {
            history.add(key)?;
        }
        Ok(history)
    }

    pub fn keys(&self) -> &[FlightKey] {
        &self.order
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn contains(&self, key: &FlightKey) -> bool {
        self.order.contains(key)
    }

    /// Appends a flight at the end of the history.
    pub fn add(&mut self, key: FlightKey) -> Result<(), IkarusError> {
        self.ensure_new(&key)?;
        self.order.push(key);
        Ok(())
    }

    /// Places a flight directly before or after an existing one.
    pub fn insert(
        &mut self,
        key: FlightKey,
        placement: Placement,
        anchor: &FlightKey,
    ) -> Result<(), IkarusError> {
        self.ensure_new(&key)?;
        let pos = self.position(anchor)?;
        let at = match placement {
            Placement::Before => pos,
            Placement::After => pos + 1,
        };
        self.order.insert(at, key);
        Ok(())
    }

    pub fn remove(&mut self, key: &FlightKey) -> Result<FlightKey, IkarusError> {
        let pos = self.position(key)?;
        Ok(self.order.remove(pos))
    }

    fn ensure_new(&self, key: &FlightKey) -> Result<(), IkarusError> {
        if self.contains(key) {
            return Err(IkarusError::DuplicateFlight(key.to_string()));
        }
        Ok(())
    }

    fn position(&self, key: &FlightKey) -> Result<usize, IkarusError> {
        self.order
            .iter()
            .position(|k| k == key)
            .ok_or_else(|| IkarusError::FlightNotInHistory(key.to_string()))
    }

    pub fn load_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read session file {}", path.display()))?;
        let raw: RawSession =
            serde_json::from_str(&content).context("Failed to parse session file")?;
        // Duplicate keys are rejected on load as well
        Ok(Self::from_keys(raw.order)?)
    }

    pub fn save_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).context("Failed to create session directory")?;
            }
        }
        let content = serde_json::to_string_pretty(self).context("Failed to serialize session")?;
        fs::write(path, content)
            .with_context(|| format!("Failed to write session file {}", path.display()))
    }

    /// Removes the session file. A missing file is not an error.
    pub fn delete_file<P: AsRef<Path>>(path: P) -> Result<()> {
        let path = path.as_ref();
        if path.exists() {
            fs::remove_file(path)
                .with_context(|| format!("Failed to delete session file {}", path.display()))?;
        }
        Ok(())
    }

    pub fn build_report(&self, catalog: &AirportCatalog) -> Result<HistoryReport, IkarusError> {
        build_history(catalog, &self.order)
    }
}

#[derive(Deserialize)]
struct RawSession {
    #[serde(rename = "ORDER")]
    order: Vec<FlightKey>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryStats {
    #[serde(rename = "Number of flights")]
    pub count: usize,
    #[serde(rename = "Total CO2 [kg]")]
    pub total_co2_kg: u64,
    #[serde(rename = "Total Distance [km]")]
    pub total_distance_km: u64,
}

/// Fully derived view of a history, shaped like the downloadable history document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryReport {
    #[serde(rename = "FLIGHTS")]
    pub flights: HashMap<FlightKey, FlightRecord>,
    #[serde(rename = "ORDER")]
    pub order: Vec<FlightKey>,
    #[serde(rename = "STATS")]
    pub stats: HistoryStats,
}

impl HistoryReport {
    /// Flights in history order.
    pub fn ordered_flights(&self) -> impl Iterator<Item = (&FlightKey, &FlightRecord)> {
        self.order
            .iter()
            .filter_map(|key| self.flights.get(key).map(|f| (key, f)))
    }
}

/// Derives every flight of `order` and sums the truncated distances and emissions.
///
/// Nothing is cached between calls. One unknown airport fails the whole report.
pub fn build_history(
    catalog: &AirportCatalog,
    order: &[FlightKey],
) -> Result<HistoryReport, IkarusError> {
    let mut flights = HashMap::with_capacity(order.len());
    let mut stats = HistoryStats {
        count: order.len(),
        ..Default::default()
    };

    for key in order {
        let flight = key.derive(catalog)?;
        stats.total_co2_kg += flight.co2_kg();
        stats.total_distance_km += flight.distance_km();
        flights.insert(key.clone(), flight);
    }

    log::debug!(
        "Built flight history — flights={} co2_kg={} distance_km={}",
        stats.count,
        stats.total_co2_kg,
        stats.total_distance_km
    );

    Ok(HistoryReport {
        flights,
        order: order.to_vec(),
        stats,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::AirportRecord;
    use crate::flight::split_key;

    fn catalog() -> AirportCatalog {
        let rec = |iata: &str, country: &str, lat: f64, lon: f64| AirportRecord {
            iata: iata.to_string(),
            city: iata.to_string(),
            country: country.to_string(),
            lat,
            lon,
        };
        AirportCatalog::from_records(vec![
            ("EDDB".to_string(), rec("BER", "Germany", 52.36, 13.50)),
            ("EDDM".to_string(), rec("MUC", "Germany", 48.35, 11.79)),
            ("EGLL".to_string(), rec("LHR", "UK", 51.47, -0.45)),
        ])
    }

    fn key(s: &str) -> FlightKey {
        split_key(s).unwrap()
    }

    #[test]
    fn test_empty_history() {
        let report = build_history(&catalog(), &[]).unwrap();
        assert!(report.flights.is_empty());
        assert!(report.order.is_empty());
        assert_eq!(report.stats, HistoryStats::default());
    }

    #[test]
    fn test_stats_sum_truncated_values() {
        let order = vec![
            key("2024-01-01_EDDB_EGLL"),
            key("2024-01-05_EGLL_EDDM"),
            key("2024-01-09_EDDM_EDDB"),
        ];
        let report = build_history(&catalog(), &order).unwrap();

        assert_eq!(report.stats.count, 3);
        // 960 + 941 + 462 km, 96 + 94 + 46 kg
        assert_eq!(report.stats.total_distance_km, 2363);
        assert_eq!(report.stats.total_co2_kg, 236);
        assert_eq!(report.order, order);

        let flights: Vec<&FlightKey> = report.ordered_flights().map(|(k, _)| k).collect();
        assert_eq!(flights, order.iter().collect::<Vec<_>>());
    }

    #[test]
    fn test_unknown_code_aborts_report() {
        let order = vec![key("2024-01-01_EDDB_EGLL"), key("2024-01-02_EGLL_KJFK")];
        assert!(matches!(
            build_history(&catalog(), &order),
            Err(IkarusError::NotFound(code)) if code == "KJFK"
        ));
    }

    #[test]
    fn test_add_rejects_duplicates() {
        let mut history = FlightHistory::new();
        history.add(key("2024-01-01_EDDB_EGLL")).unwrap();

        match history.add(key("2024-01-01_EDDB_EGLL")) {
            Err(IkarusError::DuplicateFlight(k)) => assert_eq!(k, "2024-01-01_EDDB_EGLL"),
            other => panic!("Expected DuplicateFlight, got {:?}", other),
        }
        assert_eq!(history.len(), 1);

        // Same route on another day is a different flight
        history.add(key("2024-01-02_EDDB_EGLL")).unwrap();
        assert_eq!(history.len(), 2);
    }

    #[test]
    fn test_insert_relative_to_anchor() {
        let mut history = FlightHistory::new();
        let first = key("2024-01-01_EDDB_EGLL");
        let last = key("2024-01-09_EDDM_EDDB");
        history.add(first.clone()).unwrap();
        history.add(last.clone()).unwrap();

        let middle = key("2024-01-05_EGLL_EDDM");
        history
            .insert(middle.clone(), Placement::Before, &last)
            .unwrap();
        let tail = key("2024-02-01_EDDB_EDDM");
        history.insert(tail.clone(), Placement::After, &last).unwrap();
        let head = key("2023-12-24_EDDM_EDDB");
        history.insert(head.clone(), Placement::Before, &first).unwrap();

        assert_eq!(history.keys(), &[head, first, middle, last, tail][..]);
    }

    #[test]
    fn test_insert_with_unknown_anchor() {
        let mut history = FlightHistory::new();
        let missing = key("2024-01-01_EDDB_EGLL");
        assert!(matches!(
            history.insert(key("2024-01-02_EGLL_EDDB"), Placement::After, &missing),
            Err(IkarusError::FlightNotInHistory(_))
        ));
        assert!(history.is_empty());
    }

    #[test]
    fn test_remove() {
        let mut history =
            FlightHistory::from_keys(vec![key("2024-01-01_EDDB_EGLL"), key("2024-01-02_EGLL_EDDB")])
                .unwrap();
        let removed = history.remove(&key("2024-01-01_EDDB_EGLL")).unwrap();
        assert_eq!(removed.to_string(), "2024-01-01_EDDB_EGLL");
        assert_eq!(history.len(), 1);
        assert!(history.remove(&removed).is_err());
    }

    #[test]
    fn test_from_keys_rejects_duplicates() {
        let result = FlightHistory::from_keys(vec![
            key("2024-01-01_EDDB_EGLL"),
            key("2024-01-01_EDDB_EGLL"),
        ]);
        assert!(matches!(result, Err(IkarusError::DuplicateFlight(_))));
    }

    #[test]
    fn test_report_json_shape() {
        let history = FlightHistory::from_keys(vec![key("2024-01-01_EDDB_EGLL")]).unwrap();
        let report = history.build_report(&catalog()).unwrap();
        let value = serde_json::to_value(&report).unwrap();

        assert_eq!(value["ORDER"][0], "2024-01-01_EDDB_EGLL");
        assert_eq!(value["STATS"]["Number of flights"], 1);
        assert_eq!(value["STATS"]["Total Distance [km]"], 960);
        assert_eq!(
            value["FLIGHTS"]["2024-01-01_EDDB_EGLL"]["INFO"]["Type"],
            "international"
        );
    }

    #[test]
    fn test_report_flights_keyed_by_flight_key() {
        let order = vec![key("2024-01-01_EDDB_EGLL"), key("2024-01-02_EGLL_EDDM")];
        let report = build_history(&catalog(), &order).unwrap();

        let ber_lhr = &report.flights[&order[0]];
        assert_eq!(ber_lhr.distance_km(), 960);

        let json = serde_json::to_string(&report).unwrap();
        let restored: HistoryReport = serde_json::from_str(&json).unwrap();
        assert_eq!(restored.order, order);
        assert_eq!(restored.stats, report.stats);
        assert_eq!(restored.flights.len(), 2);
        assert_eq!(restored.flights[&order[1]].info, report.flights[&order[1]].info);
    }
}
