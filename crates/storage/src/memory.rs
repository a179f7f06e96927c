use async_trait::async_trait;
use rollcall_core::model::{
    AcademicYear, Attempt, AttemptId, AttemptResult, AttemptStatus, Question, QuizId, SectionId,
    Session, SessionId, Student,
};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use crate::repository::{
    AcademicsRepository, AnswerRecord, AssessmentRepository, AttendanceRepository,
    EnrollmentRepository, MarkRecord, NewSessionRecord, SessionQuery, StorageError,
};

#[derive(Default)]
struct State {
    years: Vec<AcademicYear>,
    students: HashMap<SectionId, Vec<Student>>,
    sessions: Vec<Session>,
    records: HashMap<SessionId, Vec<MarkRecord>>,
    attempts: HashMap<AttemptId, Attempt>,
    questions: HashMap<QuizId, Vec<Question>>,
    answers: HashMap<AttemptId, Vec<AnswerRecord>>,
    bulk_mark_log: Vec<(SessionId, Vec<MarkRecord>)>,
    save_answers_log: Vec<(AttemptId, Vec<AnswerRecord>)>,
    sessions_created: usize,
    fail_writes: bool,
    write_delay: Option<Duration>,
}

/// In-memory stand-in for the REST API, used by tests and offline demos.
///
/// Writes follow the server contract: bulk writes replace every record of the
/// session/attempt, and a session or attempt without saved data reports `NotFound`.
#[derive(Clone, Default)]
pub struct InMemoryRepository {
    state: Arc<Mutex<State>>,
}

impl InMemoryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Every mutation leaves `State` consistent, so a panic elsewhere while the lock
    /// was held does not invalidate it.
    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn with_state<T>(&self, f: impl FnOnce(&mut State) -> T) -> T {
        f(&mut self.lock())
    }

    // ─── Seeding ───────────────────────────────────────────────────────────────

    pub fn add_academic_year(&self, year: AcademicYear) {
        self.with_state(|s| s.years.push(year));
    }

    pub fn set_section_students(&self, section_id: SectionId, students: Vec<Student>) {
        self.with_state(|s| {
            s.students.insert(section_id, students);
        });
    }

    pub fn add_session(&self, session: Session) {
        self.with_state(|s| s.sessions.push(session));
    }

    pub fn set_records(&self, session_id: SessionId, records: Vec<MarkRecord>) {
        self.with_state(|s| {
            s.records.insert(session_id, records);
        });
    }

    pub fn add_attempt(&self, attempt: Attempt) {
        self.with_state(|s| {
            s.attempts.insert(attempt.id.clone(), attempt);
        });
    }

    pub fn set_questions(&self, quiz_id: QuizId, questions: Vec<Question>) {
        self.with_state(|s| {
            s.questions.insert(quiz_id, questions);
        });
    }

    pub fn set_answers(&self, attempt_id: AttemptId, answers: Vec<AnswerRecord>) {
        self.with_state(|s| {
            s.answers.insert(attempt_id, answers);
        });
    }

    /// Make every subsequent write fail with a connection error until reset.
    pub fn fail_writes(&self, fail: bool) {
        self.with_state(|s| s.fail_writes = fail);
    }

    /// Delay every write by `delay` before it is applied, like a slow network.
    pub fn set_write_delay(&self, delay: Option<Duration>) {
        self.with_state(|s| s.write_delay = delay);
    }

    // ─── Inspection ────────────────────────────────────────────────────────────

    #[must_use]
    pub fn sessions(&self) -> Vec<Session> {
        self.with_state(|s| s.sessions.clone())
    }

    #[must_use]
    pub fn sessions_created(&self) -> usize {
        self.with_state(|s| s.sessions_created)
    }

    /// Records currently stored for a session.
    #[must_use]
    pub fn records(&self, session_id: &SessionId) -> Vec<MarkRecord> {
        self.with_state(|s| s.records.get(session_id).cloned().unwrap_or_default())
    }

    /// Every bulk-mark write that reached the store, in arrival order.
    #[must_use]
    pub fn bulk_mark_log(&self) -> Vec<(SessionId, Vec<MarkRecord>)> {
        self.with_state(|s| s.bulk_mark_log.clone())
    }

    #[must_use]
    pub fn answers(&self, attempt_id: &AttemptId) -> Vec<AnswerRecord> {
        self.with_state(|s| s.answers.get(attempt_id).cloned().unwrap_or_default())
    }

    #[must_use]
    pub fn save_answers_log(&self) -> Vec<(AttemptId, Vec<AnswerRecord>)> {
        self.with_state(|s| s.save_answers_log.clone())
    }

    #[must_use]
    pub fn attempt(&self, attempt_id: &AttemptId) -> Option<Attempt> {
        self.with_state(|s| s.attempts.get(attempt_id).cloned())
    }

    async fn before_write(&self) -> Result<(), StorageError> {
        let (fail, delay) = {
            let guard = self.lock();
            (guard.fail_writes, guard.write_delay)
        };
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if fail {
            return Err(StorageError::Connection("simulated network failure".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl AcademicsRepository for InMemoryRepository {
    async fn list_academic_years(&self) -> Result<Vec<AcademicYear>, StorageError> {
        Ok(self.lock().years.clone())
    }
}

#[async_trait]
impl EnrollmentRepository for InMemoryRepository {
    async fn list_section_students(
        &self,
        section_id: &SectionId,
    ) -> Result<Vec<Student>, StorageError> {
        self.lock()
            .students
            .get(section_id)
            .cloned()
            .ok_or(StorageError::NotFound)
    }
}

#[async_trait]
impl AttendanceRepository for InMemoryRepository {
    async fn find_sessions(&self, query: &SessionQuery) -> Result<Vec<Session>, StorageError> {
        let guard = self.lock();
        Ok(guard
            .sessions
            .iter()
            .filter(|s| s.matches(&query.section_id, &query.subject_id, query.date))
            .cloned()
            .collect())
    }

    async fn create_session(&self, new: &NewSessionRecord) -> Result<Session, StorageError> {
        self.before_write().await?;
        let session = Session::from_persisted(
            SessionId::new(uuid::Uuid::new_v4().to_string()),
            new.section_id.clone(),
            new.subject_id.clone(),
            new.date,
            new.starts_at,
            new.ends_at,
            false,
        )
        .map_err(|e| StorageError::Remote {
            status: 422,
            message: e.to_string(),
        })?;

        let mut guard = self.lock();
        guard.sessions.push(session.clone());
        guard.sessions_created += 1;
        Ok(session)
    }

    async fn list_records(&self, session_id: &SessionId) -> Result<Vec<MarkRecord>, StorageError> {
        self.lock()
            .records
            .get(session_id)
            .cloned()
            .ok_or(StorageError::NotFound)
    }

    async fn bulk_mark(
        &self,
        session_id: &SessionId,
        records: &[MarkRecord],
    ) -> Result<(), StorageError> {
        self.before_write().await?;
        let mut guard = self.lock();
        let session = guard
            .sessions
            .iter()
            .find(|s| s.id() == session_id)
            .ok_or(StorageError::NotFound)?;
        if session.is_finalized() {
            return Err(StorageError::Conflict("session is finalized".into()));
        }

        guard
            .bulk_mark_log
            .push((session_id.clone(), records.to_vec()));
        guard.records.insert(session_id.clone(), records.to_vec());
        Ok(())
    }

    async fn finalize_session(&self, session_id: &SessionId) -> Result<Session, StorageError> {
        self.before_write().await?;
        let mut guard = self.lock();
        let slot = guard
            .sessions
            .iter_mut()
            .find(|s| s.id() == session_id)
            .ok_or(StorageError::NotFound)?;
        let finalized = Session::from_persisted(
            slot.id().clone(),
            slot.section_id().clone(),
            slot.subject_id().clone(),
            slot.date(),
            slot.starts_at(),
            slot.ends_at(),
            true,
        )
        .map_err(|e| StorageError::Serialization(e.to_string()))?;
        *slot = finalized.clone();
        Ok(finalized)
    }
}

#[async_trait]
impl AssessmentRepository for InMemoryRepository {
    async fn get_attempt(&self, attempt_id: &AttemptId) -> Result<Attempt, StorageError> {
        self.lock()
            .attempts
            .get(attempt_id)
            .cloned()
            .ok_or(StorageError::NotFound)
    }

    async fn list_questions(&self, quiz_id: &QuizId) -> Result<Vec<Question>, StorageError> {
        self.lock()
            .questions
            .get(quiz_id)
            .cloned()
            .ok_or(StorageError::NotFound)
    }

    async fn list_answers(&self, attempt_id: &AttemptId) -> Result<Vec<AnswerRecord>, StorageError> {
        self.lock()
            .answers
            .get(attempt_id)
            .cloned()
            .ok_or(StorageError::NotFound)
    }

    async fn save_answers(
        &self,
        attempt_id: &AttemptId,
        answers: &[AnswerRecord],
    ) -> Result<(), StorageError> {
        self.before_write().await?;
        let mut guard = self.lock();
        let attempt = guard
            .attempts
            .get(attempt_id)
            .ok_or(StorageError::NotFound)?;
        if !attempt.status.is_open() {
            return Err(StorageError::Conflict("attempt already submitted".into()));
        }

        guard
            .save_answers_log
            .push((attempt_id.clone(), answers.to_vec()));
        guard.answers.insert(attempt_id.clone(), answers.to_vec());
        Ok(())
    }

    async fn submit_attempt(&self, attempt_id: &AttemptId) -> Result<AttemptResult, StorageError> {
        self.before_write().await?;
        let mut guard = self.lock();
        let answered = guard
            .answers
            .get(attempt_id)
            .map_or(0, |answers| {
                answers
                    .iter()
                    .filter(|a| !a.selected_option_ids.is_empty())
                    .count()
            });
        let attempt = guard
            .attempts
            .get_mut(attempt_id)
            .ok_or(StorageError::NotFound)?;
        if !attempt.status.is_open() {
            return Err(StorageError::Conflict("attempt already submitted".into()));
        }
        attempt.status = AttemptStatus::Submitted;
        let quiz_id = attempt.quiz_id.clone();
        let total = guard.questions.get(&quiz_id).map_or(0, Vec::len);

        // No answer key here: the score is the number of answered questions.
        let as_score = |n: usize| f64::from(u32::try_from(n).unwrap_or(u32::MAX));
        Ok(AttemptResult {
            score: Some(as_score(answered)),
            max_score: Some(as_score(total)),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rollcall_core::model::{AttendanceStatus, StudentId, SubjectId};
    use rollcall_core::time::fixed_now;

    fn new_session() -> NewSessionRecord {
        NewSessionRecord {
            section_id: SectionId::new("6A"),
            subject_id: SubjectId::new("MATH"),
            academic_year_id: rollcall_core::model::AcademicYearId::new("2023-2024"),
            date: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            starts_at: fixed_now(),
            ends_at: fixed_now() + chrono::Duration::hours(1),
        }
    }

    fn record(id: &str, status: AttendanceStatus) -> MarkRecord {
        MarkRecord {
            student_id: StudentId::new(id),
            status,
            comment: None,
            minutes_late: None,
        }
    }

    #[tokio::test]
    async fn records_are_not_found_until_first_write() {
        let repo = InMemoryRepository::new();
        let session = repo.create_session(&new_session()).await.unwrap();

        let err = repo.list_records(session.id()).await.unwrap_err();
        assert!(err.is_not_found());

        repo.bulk_mark(session.id(), &[record("s1", AttendanceStatus::Absent)])
            .await
            .unwrap();
        assert_eq!(repo.list_records(session.id()).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn bulk_mark_replaces_instead_of_appending() {
        let repo = InMemoryRepository::new();
        let session = repo.create_session(&new_session()).await.unwrap();
        let records = vec![
            record("s1", AttendanceStatus::Present),
            record("s2", AttendanceStatus::Late),
        ];

        repo.bulk_mark(session.id(), &records).await.unwrap();
        repo.bulk_mark(session.id(), &records).await.unwrap();

        assert_eq!(repo.records(session.id()), records);
        assert_eq!(repo.bulk_mark_log().len(), 2);
    }

    #[tokio::test]
    async fn finalized_session_rejects_writes() {
        let repo = InMemoryRepository::new();
        let session = repo.create_session(&new_session()).await.unwrap();
        let finalized = repo.finalize_session(session.id()).await.unwrap();
        assert!(finalized.is_finalized());

        let err = repo
            .bulk_mark(session.id(), &[record("s1", AttendanceStatus::Absent)])
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::Conflict(_)));
    }

    #[tokio::test]
    async fn a_poisoned_lock_does_not_break_the_store() {
        let repo = InMemoryRepository::new();
        let session = repo.create_session(&new_session()).await.unwrap();

        let state = Arc::clone(&repo.state);
        let panicked = std::thread::spawn(move || {
            let _guard = state.lock().unwrap();
            panic!("poison the store");
        })
        .join();
        assert!(panicked.is_err());
        assert!(repo.state.is_poisoned());

        assert!(repo.list_academic_years().await.is_ok());
        repo.bulk_mark(session.id(), &[record("s1", AttendanceStatus::Absent)])
            .await
            .unwrap();
        assert_eq!(repo.records(session.id()).len(), 1);

        repo.fail_writes(true);
        let err = repo
            .bulk_mark(session.id(), &[record("s1", AttendanceStatus::Present)])
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::Connection(_)));
    }

    #[tokio::test]
    async fn injected_failures_leave_store_untouched() {
        let repo = InMemoryRepository::new();
        let session = repo.create_session(&new_session()).await.unwrap();
        repo.fail_writes(true);

        let err = repo
            .bulk_mark(session.id(), &[record("s1", AttendanceStatus::Absent)])
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::Connection(_)));
        assert!(repo.bulk_mark_log().is_empty());
    }
}
