use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use rollcall_core::model::{
    AnswerSheet, Attempt, AttemptId, AttemptResult, AttemptStatus, FinalizationGate, OptionId,
    Question, QuestionId,
};
use storage::repository::{AnswerRecord, AssessmentRepository, StorageError};

use crate::error::AttemptError;
use crate::persist::{DebouncedPersister, PersistEvent, PersistSink};

/// Answer autosave for one attempt.
pub struct AnswerSink {
    assessments: Arc<dyn AssessmentRepository>,
    attempt_id: AttemptId,
}

#[async_trait]
impl PersistSink for AnswerSink {
    type Payload = Vec<AnswerRecord>;

    async fn persist(&self, answers: Vec<AnswerRecord>) -> Result<(), StorageError> {
        if answers.is_empty() {
            return Ok(());
        }
        self.assessments.save_answers(&self.attempt_id, &answers).await
    }
}

/// Answering state for one quiz attempt.
pub struct AttemptWorkflow {
    attempt: Attempt,
    sheet: AnswerSheet,
    gate: FinalizationGate,
    result: Option<AttemptResult>,
    assessments: Arc<dyn AssessmentRepository>,
    persister: Option<DebouncedPersister<AnswerSink>>,
}

impl AttemptWorkflow {
    /// Must run inside a Tokio runtime unless the attempt is already closed.
    #[must_use]
    pub fn new(
        attempt: Attempt,
        questions: &[Question],
        saved: impl IntoIterator<Item = (QuestionId, Vec<OptionId>)>,
        assessments: Arc<dyn AssessmentRepository>,
        quiet_period: Duration,
    ) -> Self {
        let gate = FinalizationGate::from_remote(!attempt.status.is_open());
        let persister = (!gate.is_finalized()).then(|| {
            DebouncedPersister::spawn(
                AnswerSink {
                    assessments: Arc::clone(&assessments),
                    attempt_id: attempt.id.clone(),
                },
                quiet_period,
            )
        });

        Self {
            sheet: AnswerSheet::hydrate(questions, saved),
            attempt,
            gate,
            result: None,
            assessments,
            persister,
        }
    }

    #[must_use]
    pub fn attempt(&self) -> &Attempt {
        &self.attempt
    }

    #[must_use]
    pub fn sheet(&self) -> &AnswerSheet {
        &self.sheet
    }

    #[must_use]
    pub fn is_submitted(&self) -> bool {
        self.gate.is_finalized()
    }

    /// Score from a submit made through this workflow.
    #[must_use]
    pub fn result(&self) -> Option<&AttemptResult> {
        self.result.as_ref()
    }

    /// # Errors
    ///
    /// Returns `AttemptError::Submitted` once submitted, or
    /// `AttemptError::AnswerSheet` for an unknown question or option.
    pub fn toggle_option(
        &mut self,
        question_id: &QuestionId,
        option_id: &OptionId,
    ) -> Result<(), AttemptError> {
        self.gate.ensure_open()?;
        self.sheet.toggle_option(question_id, option_id)?;
        self.schedule();
        Ok(())
    }

    /// # Errors
    ///
    /// Returns `AttemptError::Submitted` once submitted, or
    /// `AttemptError::AnswerSheet` for an unknown question.
    pub fn clear(&mut self, question_id: &QuestionId) -> Result<(), AttemptError> {
        self.gate.ensure_open()?;
        self.sheet.clear(question_id)?;
        self.schedule();
        Ok(())
    }

    /// Write every answer now instead of waiting for the quiet period.
    ///
    /// # Errors
    ///
    /// Returns `AttemptError::Submitted` once submitted, or
    /// `AttemptError::Storage` if the write fails.
    pub async fn save(&mut self) -> Result<(), AttemptError> {
        self.gate.ensure_open()?;
        let Some(persister) = self.persister.as_ref() else {
            return Err(AttemptError::Submitted);
        };
        persister.flush(self.answers()).await?;
        Ok(())
    }

    /// Save the current answers, then submit. If either step fails the attempt stays
    /// open and can be retried.
    ///
    /// # Errors
    ///
    /// Returns `AttemptError::Submitted` if already submitted, or
    /// `AttemptError::Storage` if the final save or the submit fails.
    pub async fn submit(&mut self) -> Result<AttemptResult, AttemptError> {
        self.save().await?;
        let result = self.assessments.submit_attempt(&self.attempt.id).await?;

        self.attempt.status = AttemptStatus::Submitted;
        self.gate.finalize();
        self.persister = None;
        self.result = Some(result.clone());
        tracing::info!(
            attempt_id = %self.attempt.id,
            score = ?result.score,
            max_score = ?result.max_score,
            "attempt submitted"
        );
        Ok(result)
    }

    /// Wait for the next autosave outcome. Returns `None` once submitted.
    pub async fn next_persist_event(&mut self) -> Option<PersistEvent> {
        match self.persister.as_mut() {
            Some(persister) => persister.next_event().await,
            None => None,
        }
    }

    pub fn try_persist_event(&mut self) -> Option<PersistEvent> {
        self.persister.as_mut()?.try_next_event()
    }

    fn schedule(&self) {
        if let Some(persister) = &self.persister {
            persister.schedule(self.answers());
        }
    }

    fn answers(&self) -> Vec<AnswerRecord> {
        self.sheet
            .snapshot()
            .into_iter()
            .map(|(question_id, selected_option_ids)| AnswerRecord {
                question_id,
                selected_option_ids,
            })
            .collect()
    }
}
