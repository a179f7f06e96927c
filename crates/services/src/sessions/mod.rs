mod resolver;
mod roster;
mod service;
mod workflow;

// Public API of the attendance subsystem.
pub use crate::error::AttendanceError;
pub use resolver::SessionResolver;
pub use roster::RosterMaterializer;
pub use service::AttendanceService;
pub use workflow::{AttendanceSink, AttendanceWorkflow};
