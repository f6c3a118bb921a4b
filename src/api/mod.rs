pub mod handlers;
pub mod routes;

pub use routes::*;

use crate::{analytics::AnalyticsService, config::Config, ml::InferenceService};
use std::sync::Arc;

/// Shared application state, built once at startup and never mutated
#[derive(Clone)]
pub struct AppState {
    pub analytics: Arc<AnalyticsService>,
    pub inference: Arc<InferenceService>,
}

impl AppState {
    pub fn new(config: &Config, inference: InferenceService) -> Self {
        Self {
            analytics: Arc::new(AnalyticsService::new(&config.data)),
            inference: Arc::new(inference),
        }
    }
}
