use anyhow::{Context, Result};
use serde::Deserialize;
use std::{env, fs, path::{Path, PathBuf}};

/// Where the service binds and where it finds its artifacts.
///
/// Defaults can be replaced by a JSON file named in `CARBON_API_CONFIG`;
/// individual environment variables win over both.
#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct ServiceConfig {
    pub bind_addr: String,
    pub carbon_model_path: PathBuf,
    pub cluster_model_path: PathBuf,
    pub cluster_scaler_path: PathBuf,
    pub history_path: PathBuf,
    /// Log every derived feature vector
    pub log_features: bool,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:8000".to_string(),
            carbon_model_path: PathBuf::from("backend/models/carbon_intensity_model.json"),
            cluster_model_path: PathBuf::from("backend/models/customer_behavior_kmeans_model.json"),
            cluster_scaler_path: PathBuf::from("backend/models/customer_behavior_scaler.json"),
            history_path: PathBuf::from("backend/data/EV_Grid_Dataset.csv"),
            log_features: false,
        }
    }
}

impl ServiceConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let data = fs::read_to_string(path)
            .with_context(|| format!("failed to read config at {}", path.display()))?;
        serde_json::from_str(&data).with_context(|| format!("invalid config JSON in {}", path.display()))
    }

    pub fn from_env() -> Result<Self> {
        let base = match env::var("CARBON_API_CONFIG") {
            Ok(path) => Self::load(path)?,
            Err(_) => Self::default(),
        };
        Ok(base.with_overrides(|key| env::var(key).ok()))
    }

    fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(v) = lookup("BIND_ADDR") {
            self.bind_addr = v;
        }
        for (key, slot) in [
            ("CARBON_MODEL_PATH", &mut self.carbon_model_path),
            ("CLUSTER_MODEL_PATH", &mut self.cluster_model_path),
            ("CLUSTER_SCALER_PATH", &mut self.cluster_scaler_path),
            ("CARBON_HISTORY_PATH", &mut self.history_path),
        ] {
            if let Some(v) = lookup(key) {
                *slot = PathBuf::from(v);
            }
        }
        if let Some(v) = lookup("LOG_FEATURES") {
            self.log_features = v == "1";
        }
        self
    }
}
