use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDate;
use rollcall_core::model::{SectionId, SubjectId};
use storage::repository::{AcademicsRepository, AttendanceRepository, EnrollmentRepository};

use super::resolver::SessionResolver;
use super::roster::RosterMaterializer;
use super::workflow::AttendanceWorkflow;
use crate::Clock;
use crate::error::AttendanceError;
use crate::persist::DEFAULT_QUIET_PERIOD;

/// Opens attendance sessions for editing.
#[derive(Clone)]
pub struct AttendanceService {
    resolver: SessionResolver,
    materializer: RosterMaterializer,
    attendance: Arc<dyn AttendanceRepository>,
    quiet_period: Duration,
}

impl AttendanceService {
    #[must_use]
    pub fn new(
        clock: Clock,
        academics: Arc<dyn AcademicsRepository>,
        enrollment: Arc<dyn EnrollmentRepository>,
        attendance: Arc<dyn AttendanceRepository>,
    ) -> Self {
        Self {
            resolver: SessionResolver::new(clock, academics, Arc::clone(&attendance)),
            materializer: RosterMaterializer::new(enrollment, Arc::clone(&attendance)),
            attendance,
            quiet_period: DEFAULT_QUIET_PERIOD,
        }
    }

    #[must_use]
    pub fn with_quiet_period(mut self, quiet_period: Duration) -> Self {
        self.quiet_period = quiet_period;
        self
    }

    /// Resolve (or create) the session and load its roster into an editable workflow.
    ///
    /// # Errors
    ///
    /// Returns `AttendanceError` if the session cannot be resolved or the roster
    /// cannot be loaded.
    pub async fn open(
        &self,
        section_id: &SectionId,
        subject_id: &SubjectId,
        date: NaiveDate,
    ) -> Result<AttendanceWorkflow, AttendanceError> {
        let session = self.resolver.resolve(section_id, subject_id, date).await?;
        let sheet = self.materializer.materialize(section_id, &session).await?;
        Ok(AttendanceWorkflow::new(
            session,
            sheet,
            Arc::clone(&self.attendance),
            self.quiet_period,
        ))
    }
}
