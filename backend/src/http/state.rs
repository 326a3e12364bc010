//! Application state for the HTTP server.

use std::sync::Arc;

use crate::db::repo_config::SchedulingSettings;
use crate::db::repository::FullRepository;
use crate::services::ScheduleService;

/// Shared application state passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Schedule operations over the configured repository
    pub schedules: ScheduleService,
}

impl AppState {
    /// Create a new application state with the given repository and default settings.
    pub fn new(repository: Arc<dyn FullRepository>) -> Self {
        Self::with_settings(repository, SchedulingSettings::default())
    }

    pub fn with_settings(repository: Arc<dyn FullRepository>, settings: SchedulingSettings) -> Self {
        Self {
            schedules: ScheduleService::with_settings(repository, settings),
        }
    }
}
