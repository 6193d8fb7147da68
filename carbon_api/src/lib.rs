//! Carbon-intensity forecasting and charging-behaviour clustering over HTTP.
//!
//! Models, scaler and grid history are loaded once at startup into an
//! [`server::AppState`] and served read-only by the axum router.

pub mod config;
pub mod error;
pub mod features;
pub mod history;
pub mod model;
pub mod server;
pub mod types;

pub use config::ServiceConfig;
pub use error::ServiceError;
pub use features::{FeatureVector, MIN_HISTORY};
pub use history::{HistoricalSeries, Sample};
pub use model::{CarbonModel, UserClusterer};
pub use server::{router, AppState};
pub use types::{CarbonRequest, CarbonResponse, ClusterInput, ClusterResponse, Timestamp};
