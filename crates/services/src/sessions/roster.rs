use std::sync::Arc;

use rollcall_core::model::{AttendanceSheet, RosterEntry, SectionId, Session};
use storage::repository::{AttendanceRepository, EnrollmentRepository, MarkRecord, StorageError};

use crate::error::AttendanceError;

/// Builds the editable sheet for a session from the section roster and saved marks.
#[derive(Clone)]
pub struct RosterMaterializer {
    enrollment: Arc<dyn EnrollmentRepository>,
    attendance: Arc<dyn AttendanceRepository>,
}

impl RosterMaterializer {
    #[must_use]
    pub fn new(
        enrollment: Arc<dyn EnrollmentRepository>,
        attendance: Arc<dyn AttendanceRepository>,
    ) -> Self {
        Self {
            enrollment,
            attendance,
        }
    }

    /// One entry per enrolled student, defaulted to present and overlaid with any
    /// marks already saved for `session`.
    ///
    /// A session with nothing recorded yet (`NotFound`) starts from defaults.
    ///
    /// # Errors
    ///
    /// Returns `AttendanceError::Storage` if the roster cannot be fetched or the saved
    /// marks fail for any reason other than `NotFound`.
    pub async fn materialize(
        &self,
        section_id: &SectionId,
        session: &Session,
    ) -> Result<AttendanceSheet, AttendanceError> {
        let students = self.enrollment.list_section_students(section_id).await?;

        let saved = match self.attendance.list_records(session.id()).await {
            Ok(records) => records,
            Err(StorageError::NotFound) => {
                tracing::debug!(session_id = %session.id(), "no marks recorded yet");
                Vec::new()
            }
            Err(err) => return Err(err.into()),
        };

        let sheet = AttendanceSheet::hydrate(
            students.iter().map(RosterEntry::from),
            saved.into_iter().map(MarkRecord::into_mark),
        );
        tracing::debug!(
            session_id = %session.id(),
            students = sheet.len(),
            "roster materialized"
        );
        Ok(sheet)
    }
}
