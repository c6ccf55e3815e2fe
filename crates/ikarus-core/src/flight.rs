use crate::catalog::{AirportCatalog, AirportRecord};
use crate::IkarusError;
use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Linear emission model, kg CO2 per flown km.
pub const EMISSION_KG_PER_KM: f64 = 0.1;

const KEY_SEPARATOR: char = '_';
const KEY_DATE_FORMAT: &str = "%Y-%m-%d";

/// Identifies one flight of a history: date plus departure and arrival ICAO codes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FlightKey {
    pub date: NaiveDate,
    pub departure: String,
    pub arrival: String,
}

impl FlightKey {
    pub fn derive(&self, catalog: &AirportCatalog) -> Result<FlightRecord, IkarusError> {
        derive_flight(catalog, self.date, &self.departure, &self.arrival)
    }
}

impl fmt::Display for FlightKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{sep}{}{sep}{}",
            self.date.format(KEY_DATE_FORMAT),
            self.departure,
            self.arrival,
            sep = KEY_SEPARATOR
        )
    }
}

impl FromStr for FlightKey {
    type Err = IkarusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let malformed = || IkarusError::KeyFormat(s.to_string());

        let parts: Vec<&str> = s.split(KEY_SEPARATOR).collect();
        let [date, departure, arrival] = parts[..] else {
            return Err(malformed());
        };
        if departure.is_empty() || arrival.is_empty() {
            return Err(malformed());
        }
        let parsed = NaiveDate::parse_from_str(date, KEY_DATE_FORMAT).map_err(|_| malformed())?;
        // chrono accepts unpadded and space-prefixed fields; keys must round-trip exactly
        if parsed.format(KEY_DATE_FORMAT).to_string() != date {
            return Err(malformed());
        }

        Ok(Self {
            date: parsed,
            departure: departure.to_string(),
            arrival: arrival.to_string(),
        })
    }
}

impl Serialize for FlightKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for FlightKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlightType {
    Domestic,
    International,
}

impl FlightType {
    pub fn classify(departure: &AirportRecord, arrival: &AirportRecord) -> Self {
        if departure.country == arrival.country {
            FlightType::Domestic
        } else {
            FlightType::International
        }
    }
}

impl fmt::Display for FlightType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FlightType::Domestic => write!(f, "domestic"),
            FlightType::International => write!(f, "international"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlightInfo {
    #[serde(rename = "CO2 [kg]")]
    pub co2_kg: u64,
    #[serde(rename = "Distance [km]")]
    pub distance_km: u64,
    #[serde(rename = "Type")]
    pub flight_type: FlightType,
    #[serde(rename = "Date")]
    pub date: NaiveDate,
}

/// Everything derived from one flight key. Rebuilt on every read.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlightRecord {
    #[serde(rename = "INFO")]
    pub info: FlightInfo,
    #[serde(rename = "DEPARTURE")]
    pub departure: AirportRecord,
    #[serde(rename = "ARRIVAL")]
    pub arrival: AirportRecord,
}

impl FlightRecord {
    pub fn distance_km(&self) -> u64 {
        self.info.distance_km
    }

    pub fn co2_kg(&self) -> u64 {
        self.info.co2_kg
    }

    pub fn flight_type(&self) -> FlightType {
        self.info.flight_type
    }
}

/// Great-circle distance in km between two points given in decimal degrees.
pub fn haversine_km(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let d_lat = (lat2 - lat1).to_radians();
    let d_lon = (lon2 - lon1).to_radians();
    let a = (d_lat / 2.0).sin().powi(2)
        + (d_lon / 2.0).sin().powi(2) * lat1.to_radians().cos() * lat2.to_radians().cos();
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());
    EARTH_RADIUS_KM * c
}

pub fn derive_flight(
    catalog: &AirportCatalog,
    date: NaiveDate,
    departure: &str,
    arrival: &str,
) -> Result<FlightRecord, IkarusError> {
    let dep = catalog.lookup(departure)?;
    let arr = catalog.lookup(arrival)?;

    let distance = haversine_km(dep.lat, dep.lon, arr.lat, arr.lon);
    let emission = distance * EMISSION_KG_PER_KM;

    Ok(FlightRecord {
        info: FlightInfo {
            // Truncation, not rounding
            co2_kg: emission as u64,
            distance_km: distance as u64,
            flight_type: FlightType::classify(dep, arr),
            date,
        },
        departure: dep.clone(),
        arrival: arr.clone(),
    })
}

pub fn build_key(
    catalog: &AirportCatalog,
    date: NaiveDate,
    departure: &str,
    arrival: &str,
) -> Result<FlightKey, IkarusError> {
    catalog.lookup(departure)?;
    catalog.lookup(arrival)?;
    Ok(FlightKey {
        date,
        departure: departure.to_string(),
        arrival: arrival.to_string(),
    })
}

/// Parses the `YYYY-MM-DD_DEP_ARR` string form of a flight key.
pub fn split_key(key: &str) -> Result<FlightKey, IkarusError> {
    key.parse()
}
