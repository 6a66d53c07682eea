//! HTTP API module for the benefit engine.
//!
//! This module provides the REST endpoint that evaluates already
//! consolidated employee records for one reference month.

mod handlers;
mod request;
mod response;
mod state;

pub use handlers::create_router;
pub use request::CalculationRequest;
pub use response::{ApiError, CalculationResponse};
pub use state::AppState;
