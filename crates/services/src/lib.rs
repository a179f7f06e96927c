#![forbid(unsafe_code)]

pub mod app_services;
pub mod attempts;
pub mod config;
pub mod error;
pub mod persist;
pub mod sessions;

pub use rollcall_core::Clock;

pub use app_services::AppServices;
pub use attempts::{AttemptService, AttemptWorkflow};
pub use config::AppConfig;
pub use error::{AppServicesError, AttemptError, AttendanceError, ConfigError};
pub use persist::{DEFAULT_QUIET_PERIOD, DebouncedPersister, PersistEvent, PersistSink};
pub use sessions::{AttendanceService, AttendanceWorkflow, RosterMaterializer, SessionResolver};
