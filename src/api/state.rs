//! Application State
//!
//! Shared state accessible by all API handlers.
//! Wrapped in Arc for thread-safe sharing across async tasks.

use crate::api::response::ResponseAssembler;
use crate::config::ApiConfig;
use crate::repository::StatsRepository;
use std::sync::Arc;
use std::time::Instant;

/// Shared application state for all handlers
#[derive(Clone)]
pub struct AppState {
    /// Repository running the statistics queries
    pub repository: StatsRepository,
    /// Envelope builder
    pub assembler: ResponseAssembler,
    /// API configuration
    pub config: Arc<ApiConfig>,
    /// Server start time for uptime tracking
    pub start_time: Instant,
}

impl AppState {
    pub fn new(repository: StatsRepository, config: ApiConfig) -> Self {
        Self {
            repository,
            assembler: ResponseAssembler::from_config(&config),
            config: Arc::new(config),
            start_time: Instant::now(),
        }
    }

    /// Get server uptime in seconds
    pub fn uptime_seconds(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }
}
