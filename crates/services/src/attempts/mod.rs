mod service;
mod workflow;

pub use crate::error::AttemptError;
pub use service::AttemptService;
pub use workflow::{AnswerSink, AttemptWorkflow};
