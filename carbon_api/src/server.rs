use axum::{extract::State, routing::post, Json, Router};
use chrono::NaiveDateTime;
use std::sync::Arc;

use crate::config::ServiceConfig;
use crate::error::ServiceError;
use crate::features::FeatureVector;
use crate::history::HistoricalSeries;
use crate::model::{CarbonModel, UserClusterer};
use crate::types::{CarbonRequest, CarbonResponse, ClusterInput, ClusterResponse};

// ---------- Server state ----------

/// Everything loaded at startup; read-only for the life of the process.
#[derive(Clone)]
pub struct AppState {
    carbon: Arc<CarbonModel>,
    clusterer: Arc<UserClusterer>,
    history: Arc<HistoricalSeries>,
    log_features: bool,
}

impl AppState {
    pub fn new(carbon: CarbonModel, clusterer: UserClusterer, history: HistoricalSeries) -> Self {
        Self {
            carbon: Arc::new(carbon),
            clusterer: Arc::new(clusterer),
            history: Arc::new(history),
            log_features: false,
        }
    }

    pub fn load(cfg: &ServiceConfig) -> anyhow::Result<Self> {
        let carbon = CarbonModel::load(&cfg.carbon_model_path)?;
        let clusterer = UserClusterer::load(&cfg.cluster_model_path, &cfg.cluster_scaler_path)?;
        let history = HistoricalSeries::load(&cfg.history_path)?;
        Ok(Self::new(carbon, clusterer, history).with_feature_logging(cfg.log_features))
    }

    pub fn with_feature_logging(mut self, enabled: bool) -> Self {
        self.log_features = enabled;
        self
    }

    pub fn history(&self) -> &HistoricalSeries {
        &self.history
    }

    pub fn carbon_model(&self) -> &CarbonModel {
        &self.carbon
    }

    pub fn clusterer(&self) -> &UserClusterer {
        &self.clusterer
    }

    /// Predicted carbon intensity for `at`, rounded to 3 decimals.
    pub fn predict_carbon(&self, at: NaiveDateTime) -> Result<f64, ServiceError> {
        let features = FeatureVector::build(at, &self.history)?;
        if self.log_features {
            tracing::info!("features at={} [{}]", at, features.describe());
        }

        let raw = self.carbon.predict(&features);
        if !raw.is_finite() {
            return Err(ServiceError::NonFinitePrediction(raw));
        }
        Ok(round3(raw))
    }

    pub fn cluster_user(&self, input: &ClusterInput) -> usize {
        self.clusterer.assign(input)
    }
}

/// Three-decimal rounding of the exact binary value, ties to even.
fn round3(x: f64) -> f64 {
    format!("{:.3}", x).parse().unwrap_or(x)
}

// ---------- Handlers ----------

async fn predict_carbon(
    State(state): State<AppState>,
    Json(req): Json<CarbonRequest>,
) -> Result<Json<CarbonResponse>, ServiceError> {
    let predicted = state.predict_carbon(req.timestamp.wall_clock())?;
    tracing::debug!("predict_carbon timestamp={} -> {}", req.timestamp, predicted);

    Ok(Json(CarbonResponse {
        timestamp: req.timestamp,
        predicted_carbon_intensity: predicted,
    }))
}

async fn cluster_user(
    State(state): State<AppState>,
    Json(input): Json<ClusterInput>,
) -> Json<ClusterResponse> {
    let user_cluster = state.cluster_user(&input);
    tracing::debug!(
        "cluster_user arrival_hour={} charging_duration={} energy_consumed={} -> {}",
        input.arrival_hour,
        input.charging_duration,
        input.energy_consumed,
        user_cluster
    );
    Json(ClusterResponse { user_cluster })
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/predict_carbon", post(predict_carbon))
        .route("/cluster_user", post(cluster_user))
        .with_state(state)
}
