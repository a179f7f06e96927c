use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use rollcall_core::model::{
    AcademicYear, AcademicYearId, Attempt, AttemptId, AttemptResult, AttendanceMark,
    AttendanceStatus, OptionId, Question, QuestionId, QuizId, SectionId, Session, SessionId,
    Student, StudentId, SubjectId,
};
use std::sync::Arc;
use thiserror::Error;

pub use crate::memory::InMemoryRepository;

/// Errors surfaced by remote store adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    /// The resource does not exist (HTTP 404). Callers decide whether that is expected.
    #[error("not found")]
    NotFound,

    #[error("conflict: {0}")]
    Conflict(String),

    /// Any other non-2xx answer from the server.
    #[error("{message} (HTTP {status})")]
    Remote { status: u16, message: String },

    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),

    /// An id that cannot be used as a URL path segment.
    #[error("invalid path segment: {0:?}")]
    InvalidPath(String),
}

impl StorageError {
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, StorageError::NotFound)
    }
}

//
// ─── RECORDS ───────────────────────────────────────────────────────────────────
//

/// Lookup key for an attendance session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionQuery {
    pub section_id: SectionId,
    pub subject_id: SubjectId,
    pub date: NaiveDate,
}

/// Payload for creating a session that does not exist yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewSessionRecord {
    pub section_id: SectionId,
    pub subject_id: SubjectId,
    pub academic_year_id: AcademicYearId,
    pub date: NaiveDate,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
}

/// Persisted shape of one attendance mark; also the element of a bulk-mark write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarkRecord {
    pub student_id: StudentId,
    pub status: AttendanceStatus,
    pub comment: Option<String>,
    pub minutes_late: Option<u32>,
}

impl MarkRecord {
    /// Empty comments are sent as absent rather than as `""`.
    #[must_use]
    pub fn from_mark(student_id: StudentId, mark: &AttendanceMark) -> Self {
        let comment = Some(mark.comment.trim())
            .filter(|comment| !comment.is_empty())
            .map(str::to_string);
        Self {
            student_id,
            status: mark.status,
            comment,
            minutes_late: mark.minutes_late,
        }
    }

    #[must_use]
    pub fn into_mark(self) -> (StudentId, AttendanceMark) {
        (
            self.student_id,
            AttendanceMark {
                status: self.status,
                comment: self.comment.unwrap_or_default(),
                minutes_late: self.minutes_late,
            },
        )
    }
}

/// Persisted selection for one question of an attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnswerRecord {
    pub question_id: QuestionId,
    pub selected_option_ids: Vec<OptionId>,
}

//
// ─── CONTRACTS ─────────────────────────────────────────────────────────────────
//

#[async_trait]
pub trait AcademicsRepository: Send + Sync {
    /// List academic years, active or not.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the years cannot be fetched.
    async fn list_academic_years(&self) -> Result<Vec<AcademicYear>, StorageError>;
}

#[async_trait]
pub trait EnrollmentRepository: Send + Sync {
    /// List the students currently enrolled in a section.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if the section is unknown, or other storage errors.
    async fn list_section_students(
        &self,
        section_id: &SectionId,
    ) -> Result<Vec<Student>, StorageError>;
}

#[async_trait]
pub trait AttendanceRepository: Send + Sync {
    /// Find sessions for a (section, subject, date) triple.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the lookup fails.
    async fn find_sessions(&self, query: &SessionQuery) -> Result<Vec<Session>, StorageError>;

    /// Create a new session.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the session cannot be created.
    async fn create_session(&self, session: &NewSessionRecord) -> Result<Session, StorageError>;

    /// Fetch the marks already saved for a session.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if nothing was recorded yet, or other storage errors.
    async fn list_records(&self, session_id: &SessionId) -> Result<Vec<MarkRecord>, StorageError>;

    /// Overwrite every mark of a session with `records`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the write is rejected or fails.
    async fn bulk_mark(
        &self,
        session_id: &SessionId,
        records: &[MarkRecord],
    ) -> Result<(), StorageError>;

    /// Lock a session against further marks.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the session cannot be finalized.
    async fn finalize_session(&self, session_id: &SessionId) -> Result<Session, StorageError>;
}

#[async_trait]
pub trait AssessmentRepository: Send + Sync {
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if the attempt is unknown, or other storage errors.
    async fn get_attempt(&self, attempt_id: &AttemptId) -> Result<Attempt, StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError` if the questions cannot be fetched.
    async fn list_questions(&self, quiz_id: &QuizId) -> Result<Vec<Question>, StorageError>;

    /// Fetch answers already saved for an attempt.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if nothing was saved yet, or other storage errors.
    async fn list_answers(&self, attempt_id: &AttemptId) -> Result<Vec<AnswerRecord>, StorageError>;

    /// Overwrite the saved answers of an attempt.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the write is rejected or fails.
    async fn save_answers(
        &self,
        attempt_id: &AttemptId,
        answers: &[AnswerRecord],
    ) -> Result<(), StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError` if the attempt cannot be submitted.
    async fn submit_attempt(&self, attempt_id: &AttemptId) -> Result<AttemptResult, StorageError>;
}

/// Aggregates the remote contracts behind trait objects for easy backend swapping.
#[derive(Clone)]
pub struct Storage {
    pub academics: Arc<dyn AcademicsRepository>,
    pub enrollment: Arc<dyn EnrollmentRepository>,
    pub attendance: Arc<dyn AttendanceRepository>,
    pub assessments: Arc<dyn AssessmentRepository>,
}

impl Storage {
    #[must_use]
    pub fn in_memory() -> Self {
        Self::from_in_memory(&InMemoryRepository::new())
    }

    /// Share one in-memory repository across all contracts, keeping a handle for seeding.
    #[must_use]
    pub fn from_in_memory(repo: &InMemoryRepository) -> Self {
        Self {
            academics: Arc::new(repo.clone()),
            enrollment: Arc::new(repo.clone()),
            attendance: Arc::new(repo.clone()),
            assessments: Arc::new(repo.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mark_record_drops_blank_comment() {
        let mark = AttendanceMark {
            status: AttendanceStatus::Late,
            comment: "   ".into(),
            minutes_late: Some(10),
        };
        let record = MarkRecord::from_mark(StudentId::new("s1"), &mark);
        assert_eq!(record.comment, None);
        assert_eq!(record.minutes_late, Some(10));

        let (id, back) = record.into_mark();
        assert_eq!(id, StudentId::new("s1"));
        assert_eq!(back.status, AttendanceStatus::Late);
        assert!(back.comment.is_empty());
    }

    #[test]
    fn storage_error_messages() {
        let err = StorageError::Remote {
            status: 422,
            message: "Invalid date".into(),
        };
        assert_eq!(err.to_string(), "Invalid date (HTTP 422)");
        assert!(StorageError::NotFound.is_not_found());
        assert!(!err.is_not_found());
    }

    #[tokio::test]
    async fn in_memory_storage_shares_one_store() {
        let repo = InMemoryRepository::new();
        let storage = Storage::from_in_memory(&repo);
        repo.add_academic_year(rollcall_core::model::AcademicYear {
            id: rollcall_core::model::AcademicYearId::new("ay-1"),
            name: "2023-2024".into(),
            is_active: true,
        });

        let years = storage.academics.list_academic_years().await.unwrap();
        assert_eq!(years.len(), 1);
        assert!(
            Storage::in_memory()
                .academics
                .list_academic_years()
                .await
                .unwrap()
                .is_empty()
        );
    }
}
