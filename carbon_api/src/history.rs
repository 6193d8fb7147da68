//! Historical carbon-intensity series backing the lag and rolling features.

use anyhow::{bail, Context, Result};
use chrono::NaiveDateTime;
use std::{fs::File, io::Read, path::Path};

use crate::types::Timestamp;

pub const TIMESTAMP_COLUMN: &str = "Datetime (UTC)";
pub const INTENSITY_COLUMN: &str = "Carbon intensity gCO₂eq/kWh (direct)";

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sample {
    /// Sample time, UTC
    pub at: NaiveDateTime,
    /// Direct carbon intensity in gCO₂eq/kWh
    pub intensity: f64,
}

/// Time-ordered, read-only carbon-intensity history.
#[derive(Debug, Clone, Default)]
pub struct HistoricalSeries {
    samples: Vec<Sample>,
    skipped: usize,
}

impl HistoricalSeries {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)
            .with_context(|| format!("failed to open carbon history at {}", path.display()))?;
        Self::from_reader(file)
            .with_context(|| format!("failed to parse carbon history at {}", path.display()))
    }

    /// Parse a CSV with at least the timestamp and direct-intensity columns.
    ///
    /// Rows with an empty (or `NaN`) intensity are skipped and counted;
    /// anything else that fails to parse is an error.
    pub fn from_reader<R: Read>(rdr: R) -> Result<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(rdr);

        let headers = reader.headers().context("failed to read CSV headers")?.clone();
        let ts_idx = column_index(&headers, TIMESTAMP_COLUMN)?;
        let ci_idx = column_index(&headers, INTENSITY_COLUMN)?;

        let mut samples = Vec::new();
        let mut skipped = 0;
        for record in reader.records() {
            let record = record.context("malformed CSV record")?;
            let line = record.position().map(|p| p.line()).unwrap_or_default();

            let raw_ci = record.get(ci_idx).unwrap_or_default();
            if raw_ci.is_empty() {
                skipped += 1;
                continue;
            }
            let intensity: f64 = raw_ci
                .parse()
                .with_context(|| format!("line {line}: invalid carbon intensity {raw_ci:?}"))?;
            if intensity.is_nan() {
                skipped += 1;
                continue;
            }
            if intensity.is_infinite() {
                bail!("line {line}: carbon intensity must be finite, got {raw_ci:?}");
            }

            let raw_ts = record.get(ts_idx).unwrap_or_default();
            let at = Timestamp::parse(raw_ts)
                .map(|t| t.to_utc_naive())
                .with_context(|| format!("line {line}: invalid datetime {raw_ts:?}"))?;

            samples.push(Sample { at, intensity });
        }

        let mut series = Self::from_samples(samples);
        series.skipped = skipped;
        Ok(series)
    }

    /// Build a series from samples in any order; equal timestamps keep their input order.
    pub fn from_samples(mut samples: Vec<Sample>) -> Self {
        samples.sort_by(|a, b| a.at.cmp(&b.at));
        Self { samples, skipped: 0 }
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }

    /// Rows dropped during load because their intensity was missing.
    pub fn skipped(&self) -> usize {
        self.skipped
    }

    pub fn latest_timestamp(&self) -> Option<NaiveDateTime> {
        self.samples.last().map(|s| s.at)
    }

    /// Intensity `k` samples back from the end; `lag(1)` is the latest reading.
    pub fn lag(&self, k: usize) -> Option<f64> {
        if k == 0 || k > self.samples.len() {
            return None;
        }
        Some(self.samples[self.samples.len() - k].intensity)
    }

    /// Mean intensity over the last `n` samples.
    pub fn rolling_mean(&self, n: usize) -> Option<f64> {
        let tail = self.tail(n)?;
        Some(tail.iter().map(|s| s.intensity).sum::<f64>() / n as f64)
    }

    /// The last `n` samples, or `None` when fewer are available.
    pub fn tail(&self, n: usize) -> Option<&[Sample]> {
        if n == 0 || n > self.samples.len() {
            return None;
        }
        Some(&self.samples[self.samples.len() - n..])
    }
}

fn column_index(headers: &csv::StringRecord, name: &str) -> Result<usize> {
    headers
        .iter()
        .position(|h| h.trim_start_matches('\u{feff}') == name)
        .with_context(|| format!("missing required column {name:?}"))
}
