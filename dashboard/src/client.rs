use carbon_api::{CarbonRequest, CarbonResponse, ClusterInput, ClusterResponse, Timestamp};
use chrono::NaiveDateTime;
use reqwest::Client;
use serde::{de::DeserializeOwned, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::inputs::ChargingInputs;

pub const BACKEND_URL: &str = "https://carbon-smart-charging-scheduler-jnc5.onrender.com";

/// The one message users see when either call fails.
pub const BACKEND_ERROR_MESSAGE: &str = "❌ Backend API error. Ensure the carbon API is running.";

#[derive(Debug, Error)]
pub enum DashboardError {
    #[error("{endpoint} failed: {source}")]
    Request {
        endpoint: &'static str,
        #[source]
        source: reqwest::Error,
    },
}

/// Logs the cause at debug and returns the only text the user sees.
pub fn user_facing_error(err: &DashboardError) -> &'static str {
    debug!("analysis failed: {}", err);
    BACKEND_ERROR_MESSAGE
}

/// Both model answers needed to render the dashboard.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Analysis {
    pub cluster: usize,
    pub carbon_intensity: f64,
}

pub struct ApiClient {
    client: Client,
    base_url: String,
}

impl Default for ApiClient {
    fn default() -> Self {
        Self::new()
    }
}

impl ApiClient {
    pub fn new() -> Self {
        Self::with_base_url(BACKEND_URL)
    }

    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into(),
        }
    }

    pub async fn cluster_user(&self, input: &ClusterInput) -> Result<usize, DashboardError> {
        let out: ClusterResponse = self.post("/cluster_user", input).await?;
        Ok(out.user_cluster)
    }

    pub async fn predict_carbon(&self, at: NaiveDateTime) -> Result<f64, DashboardError> {
        let req = CarbonRequest {
            timestamp: Timestamp::from(at),
        };
        let out: CarbonResponse = self.post("/predict_carbon", &req).await?;
        Ok(out.predicted_carbon_intensity)
    }

    /// Clusters the user, then predicts carbon intensity, one after the other.
    /// Both requests are always sent; the result is usable only if both succeed.
    pub async fn analyze(&self, inputs: &ChargingInputs) -> Result<Analysis, DashboardError> {
        let cluster = self.cluster_user(&inputs.cluster_input()).await;
        let carbon = self.predict_carbon(inputs.start_time).await;
        Ok(Analysis {
            cluster: cluster?,
            carbon_intensity: carbon?,
        })
    }

    async fn post<B, T>(&self, endpoint: &'static str, body: &B) -> Result<T, DashboardError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = format!("{}{}", self.base_url.trim_end_matches('/'), endpoint);
        let wrap = |source: reqwest::Error| DashboardError::Request { endpoint, source };

        debug!("POST {}", url);
        let response = self
            .client
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(wrap)?
            .error_for_status()
            .map_err(wrap)?;
        debug!("{} -> {}", endpoint, response.status());
        response.json::<T>().await.map_err(wrap)
    }
}
