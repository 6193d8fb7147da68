//! Terminal front end for the carbon-smart charging API.

pub mod advice;
pub mod client;
pub mod inputs;
pub mod render;

pub use advice::Urgency;
pub use client::{Analysis, ApiClient, DashboardError, BACKEND_ERROR_MESSAGE};
pub use inputs::ChargingInputs;
pub use render::Report;
