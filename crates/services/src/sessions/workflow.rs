use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use rollcall_core::model::{
    AttendanceSheet, AttendanceStatus, FinalizationGate, RosterError, Session, SessionId,
    StudentId,
};
use storage::repository::{AttendanceRepository, MarkRecord, StorageError};

use crate::error::AttendanceError;
use crate::persist::{DebouncedPersister, PersistEvent, PersistSink};

/// Bulk-mark writes for one session.
pub struct AttendanceSink {
    attendance: Arc<dyn AttendanceRepository>,
    session_id: SessionId,
}

#[async_trait]
impl PersistSink for AttendanceSink {
    type Payload = Vec<MarkRecord>;

    async fn persist(&self, records: Vec<MarkRecord>) -> Result<(), StorageError> {
        if records.is_empty() {
            return Ok(());
        }
        self.attendance.bulk_mark(&self.session_id, &records).await
    }
}

/// Editing state for one attendance session, owned by the view that shows it.
///
/// Local edits apply immediately and are persisted in the background after a quiet
/// period; the local sheet stays authoritative for display even when a write fails.
pub struct AttendanceWorkflow {
    session: Session,
    sheet: AttendanceSheet,
    gate: FinalizationGate,
    attendance: Arc<dyn AttendanceRepository>,
    persister: Option<DebouncedPersister<AttendanceSink>>,
}

impl AttendanceWorkflow {
    /// Must run inside a Tokio runtime unless `session` is already finalized.
    #[must_use]
    pub fn new(
        session: Session,
        sheet: AttendanceSheet,
        attendance: Arc<dyn AttendanceRepository>,
        quiet_period: Duration,
    ) -> Self {
        let gate = FinalizationGate::from_remote(session.is_finalized());
        let persister = (!gate.is_finalized()).then(|| {
            DebouncedPersister::spawn(
                AttendanceSink {
                    attendance: Arc::clone(&attendance),
                    session_id: session.id().clone(),
                },
                quiet_period,
            )
        });

        Self {
            session,
            sheet,
            gate,
            attendance,
            persister,
        }
    }

    #[must_use]
    pub fn session(&self) -> &Session {
        &self.session
    }

    #[must_use]
    pub fn sheet(&self) -> &AttendanceSheet {
        &self.sheet
    }

    #[must_use]
    pub fn is_finalized(&self) -> bool {
        self.gate.is_finalized()
    }

    /// # Errors
    ///
    /// Returns `AttendanceError::Finalized` once finalized, or
    /// `AttendanceError::Roster` for a student outside the roster.
    pub fn set_status(
        &mut self,
        student_id: &StudentId,
        status: AttendanceStatus,
    ) -> Result<(), AttendanceError> {
        self.edit(|sheet| sheet.set_status(student_id, status))
    }

    /// # Errors
    ///
    /// Returns `AttendanceError::Finalized` once finalized, or
    /// `AttendanceError::Roster` for a student outside the roster.
    pub fn set_comment(
        &mut self,
        student_id: &StudentId,
        comment: impl Into<String>,
    ) -> Result<(), AttendanceError> {
        self.edit(|sheet| sheet.set_comment(student_id, comment))
    }

    /// # Errors
    ///
    /// Returns `AttendanceError::Finalized` once finalized, or
    /// `AttendanceError::Roster` for a student outside the roster.
    pub fn set_minutes_late(
        &mut self,
        student_id: &StudentId,
        minutes: Option<u32>,
    ) -> Result<(), AttendanceError> {
        self.edit(|sheet| sheet.set_minutes_late(student_id, minutes))
    }

    /// # Errors
    ///
    /// Returns `AttendanceError::Finalized` once finalized.
    pub fn mark_all(&mut self, status: AttendanceStatus) -> Result<(), AttendanceError> {
        self.edit(|sheet| {
            sheet.mark_all(status);
            Ok(())
        })
    }

    /// Write the whole sheet now instead of waiting for the quiet period.
    ///
    /// # Errors
    ///
    /// Returns `AttendanceError::Finalized` once finalized, or
    /// `AttendanceError::Storage` if the write fails (local edits are kept).
    pub async fn save(&mut self) -> Result<(), AttendanceError> {
        self.gate.ensure_open()?;
        let Some(persister) = self.persister.as_ref() else {
            return Err(AttendanceError::Finalized);
        };
        if self.sheet.is_empty() {
            return Ok(());
        }
        persister.flush(self.records()).await?;
        Ok(())
    }

    /// Save, then lock the session on the server. The gate closes only if both succeed.
    ///
    /// # Errors
    ///
    /// Returns `AttendanceError::Finalized` if already finalized, or
    /// `AttendanceError::Storage` if the final save or the finalize call fails.
    pub async fn finalize(&mut self) -> Result<&Session, AttendanceError> {
        self.save().await?;
        let session = self.attendance.finalize_session(self.session.id()).await?;

        self.session = session;
        self.gate.finalize();
        self.persister = None;
        tracing::info!(session_id = %self.session.id(), "attendance session finalized");
        Ok(&self.session)
    }

    /// Wait for the next background write outcome. Returns `None` once finalized.
    pub async fn next_persist_event(&mut self) -> Option<PersistEvent> {
        match self.persister.as_mut() {
            Some(persister) => persister.next_event().await,
            None => None,
        }
    }

    pub fn try_persist_event(&mut self) -> Option<PersistEvent> {
        self.persister.as_mut()?.try_next_event()
    }

    fn edit(
        &mut self,
        apply: impl FnOnce(&mut AttendanceSheet) -> Result<(), RosterError>,
    ) -> Result<(), AttendanceError> {
        self.gate.ensure_open()?;
        apply(&mut self.sheet)?;
        self.schedule();
        Ok(())
    }

    fn schedule(&self) {
        if self.sheet.is_empty() {
            return;
        }
        if let Some(persister) = &self.persister {
            persister.schedule(self.records());
        }
    }

    fn records(&self) -> Vec<MarkRecord> {
        self.sheet
            .snapshot()
            .into_iter()
            .map(|(student_id, mark)| MarkRecord::from_mark(student_id, &mark))
            .collect()
    }
}
