use std::sync::Arc;

use chrono::NaiveDate;
use rollcall_core::model::{SectionId, Session, SubjectId};
use storage::repository::{
    AcademicsRepository, AttendanceRepository, NewSessionRecord, SessionQuery,
};

use crate::Clock;
use crate::error::AttendanceError;

/// Finds the attendance session for a (section, subject, date) triple, creating it on
/// first use.
#[derive(Clone)]
pub struct SessionResolver {
    clock: Clock,
    academics: Arc<dyn AcademicsRepository>,
    attendance: Arc<dyn AttendanceRepository>,
}

impl SessionResolver {
    #[must_use]
    pub fn new(
        clock: Clock,
        academics: Arc<dyn AcademicsRepository>,
        attendance: Arc<dyn AttendanceRepository>,
    ) -> Self {
        Self {
            clock,
            academics,
            attendance,
        }
    }

    /// Return the first matching session, or create one in the active academic year
    /// starting now and lasting an hour.
    ///
    /// Two callers racing on the same triple may both create a session; the server
    /// decides whether that is allowed.
    ///
    /// # Errors
    ///
    /// Returns `AttendanceError::NoActiveYear` if a session must be created and no
    /// academic year is active, or `AttendanceError::Storage` for remote failures.
    pub async fn resolve(
        &self,
        section_id: &SectionId,
        subject_id: &SubjectId,
        date: NaiveDate,
    ) -> Result<Session, AttendanceError> {
        let query = SessionQuery {
            section_id: section_id.clone(),
            subject_id: subject_id.clone(),
            date,
        };
        if let Some(existing) = self.attendance.find_sessions(&query).await?.into_iter().next() {
            tracing::debug!(session_id = %existing.id(), "reusing attendance session");
            return Ok(existing);
        }

        let year = self
            .academics
            .list_academic_years()
            .await?
            .into_iter()
            .find(|year| year.is_active)
            .ok_or(AttendanceError::NoActiveYear)?;

        let (starts_at, ends_at) = self.clock.session_window();
        let created = self
            .attendance
            .create_session(&NewSessionRecord {
                section_id: query.section_id,
                subject_id: query.subject_id,
                academic_year_id: year.id,
                date,
                starts_at,
                ends_at,
            })
            .await?;

        tracing::info!(
            session_id = %created.id(),
            section = %section_id,
            subject = %subject_id,
            %date,
            "created attendance session"
        );
        Ok(created)
    }
}
