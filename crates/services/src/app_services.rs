use std::sync::Arc;
use std::time::Duration;

use storage::repository::Storage;

use crate::Clock;
use crate::attempts::AttemptService;
use crate::config::AppConfig;
use crate::error::AppServicesError;
use crate::sessions::AttendanceService;

/// Assembles the app-facing attendance and attempt services.
#[derive(Clone)]
pub struct AppServices {
    attendance: Arc<AttendanceService>,
    attempts: Arc<AttemptService>,
}

impl AppServices {
    /// Build services backed by the REST API described in `config`.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError` if the HTTP client cannot be built.
    pub fn new_http(config: &AppConfig, clock: Clock) -> Result<Self, AppServicesError> {
        let storage = Storage::http(&config.remote)?;
        tracing::debug!(api = %config.remote.base_url, "remote storage ready");
        Ok(Self::from_storage(&storage, clock, config.autosave_delay))
    }

    #[must_use]
    pub fn from_storage(storage: &Storage, clock: Clock, quiet_period: Duration) -> Self {
        let attendance = Arc::new(
            AttendanceService::new(
                clock,
                Arc::clone(&storage.academics),
                Arc::clone(&storage.enrollment),
                Arc::clone(&storage.attendance),
            )
            .with_quiet_period(quiet_period),
        );
        let attempts = Arc::new(
            AttemptService::new(Arc::clone(&storage.assessments)).with_quiet_period(quiet_period),
        );

        Self {
            attendance,
            attempts,
        }
    }

    #[must_use]
    pub fn attendance(&self) -> Arc<AttendanceService> {
        Arc::clone(&self.attendance)
    }

    #[must_use]
    pub fn attempts(&self) -> Arc<AttemptService> {
        Arc::clone(&self.attempts)
    }
}
