use carbon_api::{ClusterInput, Timestamp};
use chrono::NaiveDateTime;
use std::ops::RangeInclusive;

pub const ARRIVAL_HOUR_RANGE: RangeInclusive<u8> = 0..=23;
pub const DURATION_RANGE: RangeInclusive<f64> = 1.0..=10.0;
pub const ENERGY_RANGE: RangeInclusive<f64> = 5.0..=100.0;

pub const DEFAULT_ARRIVAL_HOUR: u8 = 18;
pub const DEFAULT_DURATION: f64 = 2.0;
pub const DEFAULT_ENERGY: f64 = 40.0;

/// What the user filled in on the form.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChargingInputs {
    pub arrival_hour: u8,
    /// Charging duration in hours
    pub charging_duration: f64,
    /// Energy required in kWh
    pub energy_consumed: f64,
    /// Charging start, local wall clock
    pub start_time: NaiveDateTime,
}

impl ChargingInputs {
    pub fn cluster_input(&self) -> ClusterInput {
        ClusterInput {
            arrival_hour: self.arrival_hour as f64,
            charging_duration: self.charging_duration,
            energy_consumed: self.energy_consumed,
        }
    }
}

fn parse_bounded(s: &str, range: &RangeInclusive<f64>, what: &str) -> Result<f64, String> {
    let v: f64 = s.trim().parse().map_err(|_| format!("{what} must be a number, got {s:?}"))?;
    if !range.contains(&v) {
        return Err(format!(
            "{what} must be between {} and {}, got {v}",
            range.start(),
            range.end()
        ));
    }
    Ok(v)
}

pub fn parse_duration(s: &str) -> Result<f64, String> {
    parse_bounded(s, &DURATION_RANGE, "charging duration")
}

pub fn parse_energy(s: &str) -> Result<f64, String> {
    parse_bounded(s, &ENERGY_RANGE, "energy required")
}

/// Any ISO-8601 form the API accepts; offsets are dropped to wall clock.
pub fn parse_start_time(s: &str) -> Result<NaiveDateTime, String> {
    Timestamp::parse(s)
        .map(|t| t.wall_clock())
        .ok_or_else(|| format!("start time must be ISO-8601, got {s:?}"))
}
