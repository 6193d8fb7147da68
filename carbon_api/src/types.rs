use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, SecondsFormat, Timelike};
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

// ---------- Timestamps ----------

const OFFSET_FORMATS: [&str; 3] = [
    "%Y-%m-%d %H:%M:%S%.f%:z",
    "%Y-%m-%dT%H:%M%:z",
    "%Y-%m-%d %H:%M%:z",
];

const NAIVE_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

/// An ISO-8601 timestamp as the client wrote it, with or without a UTC offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Timestamp {
    Naive(NaiveDateTime),
    Offset(DateTime<FixedOffset>),
}

impl Timestamp {
    pub fn parse(raw: &str) -> Option<Self> {
        let s = raw.trim();
        if let Ok(t) = DateTime::parse_from_rfc3339(s) {
            return Some(Self::Offset(t));
        }
        for fmt in OFFSET_FORMATS {
            if let Ok(t) = DateTime::parse_from_str(s, fmt) {
                return Some(Self::Offset(t));
            }
        }
        for fmt in NAIVE_FORMATS {
            if let Ok(t) = NaiveDateTime::parse_from_str(s, fmt) {
                return Some(Self::Naive(t));
            }
        }
        NaiveDate::parse_from_str(s, "%Y-%m-%d")
            .ok()
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .map(Self::Naive)
    }

    /// Date and time fields exactly as written, ignoring any offset.
    pub fn wall_clock(&self) -> NaiveDateTime {
        match self {
            Self::Naive(t) => *t,
            Self::Offset(t) => t.naive_local(),
        }
    }

    /// UTC instant; naive timestamps are taken to already be UTC.
    pub fn to_utc_naive(&self) -> NaiveDateTime {
        match self {
            Self::Naive(t) => *t,
            Self::Offset(t) => t.naive_utc(),
        }
    }

    pub fn to_iso(&self) -> String {
        match self {
            Self::Naive(t) if t.nanosecond() == 0 => t.format("%Y-%m-%dT%H:%M:%S").to_string(),
            Self::Naive(t) => t.format("%Y-%m-%dT%H:%M:%S%.6f").to_string(),
            Self::Offset(t) => t.to_rfc3339_opts(SecondsFormat::AutoSi, true),
        }
    }
}

impl From<NaiveDateTime> for Timestamp {
    fn from(t: NaiveDateTime) -> Self {
        Self::Naive(t)
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_iso())
    }
}

impl Serialize for Timestamp {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_iso())
    }
}

impl<'de> Deserialize<'de> for Timestamp {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Timestamp::parse(&raw)
            .ok_or_else(|| de::Error::custom(format!("invalid ISO-8601 timestamp: {raw:?}")))
    }
}

// ---------- Request/Response types ----------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CarbonRequest {
    pub timestamp: Timestamp,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CarbonResponse {
    pub timestamp: Timestamp,
    pub predicted_carbon_intensity: f64,
}

/// One charging session as fed to the behaviour clusterer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClusterInput {
    pub arrival_hour: f64,
    pub charging_duration: f64,
    pub energy_consumed: f64,
}

impl ClusterInput {
    pub fn to_array(&self) -> [f64; 3] {
        [self.arrival_hour, self.charging_duration, self.energy_consumed]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterResponse {
    pub user_cluster: usize,
}
