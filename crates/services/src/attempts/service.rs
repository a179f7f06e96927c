use std::sync::Arc;
use std::time::Duration;

use rollcall_core::model::AttemptId;
use storage::repository::{AnswerRecord, AssessmentRepository, StorageError};

use super::workflow::AttemptWorkflow;
use crate::error::AttemptError;
use crate::persist::DEFAULT_QUIET_PERIOD;

/// Opens quiz attempts for answering.
#[derive(Clone)]
pub struct AttemptService {
    assessments: Arc<dyn AssessmentRepository>,
    quiet_period: Duration,
}

impl AttemptService {
    #[must_use]
    pub fn new(assessments: Arc<dyn AssessmentRepository>) -> Self {
        Self {
            assessments,
            quiet_period: DEFAULT_QUIET_PERIOD,
        }
    }

    #[must_use]
    pub fn with_quiet_period(mut self, quiet_period: Duration) -> Self {
        self.quiet_period = quiet_period;
        self
    }

    /// Load the attempt, its quiz questions and any saved answers.
    ///
    /// An attempt with no saved answers yet (the server answers 404) opens with an
    /// empty sheet.
    ///
    /// # Errors
    ///
    /// Returns `AttemptError::Storage` if the attempt or its questions cannot be loaded,
    /// or if fetching saved answers fails for any reason other than "not found".
    pub async fn open(&self, attempt_id: &AttemptId) -> Result<AttemptWorkflow, AttemptError> {
        let attempt = self.assessments.get_attempt(attempt_id).await?;
        let questions = self.assessments.list_questions(&attempt.quiz_id).await?;
        let saved = match self.assessments.list_answers(attempt_id).await {
            Ok(answers) => answers,
            Err(StorageError::NotFound) => Vec::new(),
            Err(err) => return Err(err.into()),
        };

        tracing::debug!(
            attempt_id = %attempt.id,
            questions = questions.len(),
            saved = saved.len(),
            "attempt loaded"
        );
        Ok(AttemptWorkflow::new(
            attempt,
            &questions,
            saved.into_iter().map(
                |AnswerRecord {
                     question_id,
                     selected_option_ids,
                 }| (question_id, selected_option_ids),
            ),
            Arc::clone(&self.assessments),
            self.quiet_period,
        ))
    }
}
