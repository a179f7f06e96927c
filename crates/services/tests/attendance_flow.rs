use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use rollcall_core::model::{
    AcademicYear, AcademicYearId, AttendanceStatus, RosterError, SectionId, Session, SessionId,
    Student, StudentId, SubjectId,
};
use rollcall_core::time::{fixed_clock, fixed_now};
use services::{AttendanceError, AttendanceService, PersistEvent};
use storage::repository::{
    AttendanceRepository, InMemoryRepository, MarkRecord, NewSessionRecord, SessionQuery,
    StorageError,
};
use tokio::time::Instant;

fn day() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 3, 1).unwrap()
}

fn section() -> SectionId {
    SectionId::new("6A")
}

fn subject() -> SubjectId {
    SubjectId::new("MATH")
}

fn student(n: u32) -> Student {
    Student {
        id: StudentId::new(format!("s{n}")),
        first_name: format!("First{n}"),
        last_name: format!("Last{n}"),
        display_name: None,
        roll_no: Some(n.to_string()),
        enrollment_id: Some(format!("enr-{n}")),
    }
}

fn seeded_repo(students: u32) -> InMemoryRepository {
    let repo = InMemoryRepository::new();
    repo.add_academic_year(AcademicYear {
        id: AcademicYearId::new("ay-2023"),
        name: "2023-2024".into(),
        is_active: true,
    });
    repo.set_section_students(section(), (1..=students).map(student).collect());
    repo
}

fn service(repo: &InMemoryRepository) -> AttendanceService {
    AttendanceService::new(
        fixed_clock(),
        Arc::new(repo.clone()),
        Arc::new(repo.clone()),
        Arc::new(repo.clone()),
    )
}

fn status_of(records: &[MarkRecord], id: &str) -> AttendanceStatus {
    records
        .iter()
        .find(|r| r.student_id.as_str() == id)
        .map(|r| r.status)
        .unwrap()
}

#[tokio::test(start_paused = true)]
async fn marking_a_fresh_session_writes_one_bulk_request() {
    let repo = seeded_repo(25);
    let mut workflow = service(&repo)
        .open(&section(), &subject(), day())
        .await
        .unwrap();

    assert_eq!(repo.sessions_created(), 1);
    assert_eq!(workflow.session().starts_at(), fixed_now());
    assert_eq!(workflow.sheet().len(), 25);
    assert_eq!(workflow.sheet().tally().present, 25);

    let start = Instant::now();
    workflow
        .set_status(&StudentId::new("s7"), AttendanceStatus::Absent)
        .unwrap();
    workflow
        .set_status(&StudentId::new("s12"), AttendanceStatus::Late)
        .unwrap();

    let event = workflow.next_persist_event().await.unwrap();
    assert!(event.is_saved());
    assert!(start.elapsed() >= Duration::from_millis(1200));

    let log = repo.bulk_mark_log();
    assert_eq!(log.len(), 1);
    let (session_id, records) = &log[0];
    assert_eq!(session_id, workflow.session().id());
    assert_eq!(records.len(), 25);
    assert_eq!(status_of(records, "s7"), AttendanceStatus::Absent);
    assert_eq!(status_of(records, "s12"), AttendanceStatus::Late);
    let present = records
        .iter()
        .filter(|r| r.status == AttendanceStatus::Present)
        .count();
    assert_eq!(present, 23);

    let session = workflow.finalize().await.unwrap();
    assert!(session.is_finalized());
    assert!(workflow.is_finalized());

    let err = workflow
        .set_status(&StudentId::new("s1"), AttendanceStatus::Excused)
        .unwrap_err();
    assert!(matches!(err, AttendanceError::Finalized));
    assert_eq!(
        workflow.sheet().mark(&StudentId::new("s1")).unwrap().status,
        AttendanceStatus::Present
    );
    assert!(matches!(workflow.save().await, Err(AttendanceError::Finalized)));
}

#[tokio::test(start_paused = true)]
async fn reopening_reuses_the_session_and_its_records() {
    let repo = seeded_repo(3);
    let svc = service(&repo);

    let mut first = svc.open(&section(), &subject(), day()).await.unwrap();
    first
        .set_status(&StudentId::new("s2"), AttendanceStatus::Absent)
        .unwrap();
    first
        .set_comment(&StudentId::new("s2"), "sick note")
        .unwrap();
    first.save().await.unwrap();
    let session_id = first.session().id().clone();
    drop(first);

    let second = svc.open(&section(), &subject(), day()).await.unwrap();
    assert_eq!(second.session().id(), &session_id);
    assert_eq!(repo.sessions_created(), 1);

    let mark = second.sheet().mark(&StudentId::new("s2")).unwrap();
    assert_eq!(mark.status, AttendanceStatus::Absent);
    assert_eq!(mark.comment, "sick note");
    assert_eq!(
        second.sheet().mark(&StudentId::new("s1")).unwrap().status,
        AttendanceStatus::Present
    );
}

#[tokio::test]
async fn creating_a_session_requires_an_active_year() {
    let repo = InMemoryRepository::new();
    repo.add_academic_year(AcademicYear {
        id: AcademicYearId::new("ay-2022"),
        name: "2022-2023".into(),
        is_active: false,
    });
    repo.set_section_students(section(), vec![student(1)]);

    let err = service(&repo)
        .open(&section(), &subject(), day())
        .await
        .err()
        .unwrap();
    assert!(matches!(err, AttendanceError::NoActiveYear));
    assert_eq!(repo.sessions_created(), 0);
}

#[tokio::test]
async fn finalized_session_opens_read_only() {
    let repo = seeded_repo(2);
    let starts = fixed_now();
    let session = Session::from_persisted(
        SessionId::new("sess-closed"),
        section(),
        subject(),
        day(),
        starts,
        starts + chrono::Duration::hours(1),
        true,
    )
    .unwrap();
    repo.add_session(session);
    repo.set_records(
        SessionId::new("sess-closed"),
        vec![MarkRecord {
            student_id: StudentId::new("s1"),
            status: AttendanceStatus::Excused,
            comment: None,
            minutes_late: None,
        }],
    );

    let mut workflow = service(&repo)
        .open(&section(), &subject(), day())
        .await
        .unwrap();
    assert!(workflow.is_finalized());
    assert_eq!(
        workflow.sheet().mark(&StudentId::new("s1")).unwrap().status,
        AttendanceStatus::Excused
    );
    assert!(matches!(
        workflow.mark_all(AttendanceStatus::Absent),
        Err(AttendanceError::Finalized)
    ));
    assert!(matches!(
        workflow.finalize().await,
        Err(AttendanceError::Finalized)
    ));
    assert!(workflow.try_persist_event().is_none());
    assert!(repo.bulk_mark_log().is_empty());
}

#[tokio::test(start_paused = true)]
async fn failed_background_write_keeps_edits_and_a_later_save_repairs_it() {
    let repo = seeded_repo(4);
    let mut workflow = service(&repo)
        .open(&section(), &subject(), day())
        .await
        .unwrap();

    repo.fail_writes(true);
    workflow
        .set_status(&StudentId::new("s3"), AttendanceStatus::Late)
        .unwrap();
    workflow
        .set_minutes_late(&StudentId::new("s3"), Some(10))
        .unwrap();

    let event = workflow.next_persist_event().await.unwrap();
    assert!(matches!(
        event,
        PersistEvent::Failed(StorageError::Connection(_))
    ));
    let mark = workflow.sheet().mark(&StudentId::new("s3")).unwrap();
    assert_eq!(mark.status, AttendanceStatus::Late);
    assert_eq!(mark.minutes_late, Some(10));
    assert!(repo.records(workflow.session().id()).is_empty());

    repo.fail_writes(false);
    workflow.save().await.unwrap();

    let stored = repo.records(workflow.session().id());
    assert_eq!(stored.len(), 4);
    assert_eq!(status_of(&stored, "s3"), AttendanceStatus::Late);
}

#[tokio::test]
async fn failed_finalize_leaves_the_session_editable() {
    let repo = seeded_repo(2);
    let mut workflow = service(&repo)
        .open(&section(), &subject(), day())
        .await
        .unwrap();

    repo.fail_writes(true);
    assert!(matches!(
        workflow.finalize().await,
        Err(AttendanceError::Storage(_))
    ));
    assert!(!workflow.is_finalized());

    repo.fail_writes(false);
    workflow.mark_all(AttendanceStatus::Absent).unwrap();
    workflow.finalize().await.unwrap();
    assert!(repo.sessions()[0].is_finalized());
    assert!(
        repo.records(workflow.session().id())
            .iter()
            .all(|r| r.status == AttendanceStatus::Absent)
    );
}

#[tokio::test(start_paused = true)]
async fn manual_save_during_a_slow_autosave_ends_with_the_later_write() {
    let repo = seeded_repo(2);
    let mut workflow = service(&repo)
        .open(&section(), &subject(), day())
        .await
        .unwrap();
    repo.set_write_delay(Some(Duration::from_millis(500)));

    workflow
        .set_status(&StudentId::new("s1"), AttendanceStatus::Absent)
        .unwrap();
    // The autosave fires at 1200 ms and lands at 1700 ms.
    tokio::time::sleep(Duration::from_millis(1300)).await;
    workflow
        .set_status(&StudentId::new("s1"), AttendanceStatus::Late)
        .unwrap();
    workflow.save().await.unwrap();

    let log = repo.bulk_mark_log();
    assert_eq!(log.len(), 2);
    assert_eq!(status_of(&log[0].1, "s1"), AttendanceStatus::Absent);
    assert_eq!(status_of(&log[1].1, "s1"), AttendanceStatus::Late);
    assert_eq!(
        status_of(&repo.records(workflow.session().id()), "s1"),
        AttendanceStatus::Late
    );
    assert!(workflow.next_persist_event().await.unwrap().is_saved());

    tokio::time::sleep(Duration::from_secs(5)).await;
    assert_eq!(repo.bulk_mark_log().len(), 2);
}

#[tokio::test(start_paused = true)]
async fn empty_roster_never_writes() {
    let repo = seeded_repo(0);
    let mut workflow = service(&repo)
        .open(&section(), &subject(), day())
        .await
        .unwrap();
    assert!(workflow.sheet().is_empty());

    workflow.mark_all(AttendanceStatus::Absent).unwrap();
    let err = workflow
        .set_status(&StudentId::new("s1"), AttendanceStatus::Late)
        .unwrap_err();
    assert!(matches!(
        err,
        AttendanceError::Roster(RosterError::UnknownStudent(_))
    ));
    workflow.save().await.unwrap();

    tokio::time::sleep(Duration::from_secs(5)).await;
    assert!(repo.bulk_mark_log().is_empty());
}

/// Serves everything from memory except attendance records, which always fail.
struct BrokenRecords(InMemoryRepository);

#[async_trait]
impl AttendanceRepository for BrokenRecords {
    async fn find_sessions(&self, query: &SessionQuery) -> Result<Vec<Session>, StorageError> {
        self.0.find_sessions(query).await
    }

    async fn create_session(&self, session: &NewSessionRecord) -> Result<Session, StorageError> {
        self.0.create_session(session).await
    }

    async fn list_records(&self, _session_id: &SessionId) -> Result<Vec<MarkRecord>, StorageError> {
        Err(StorageError::Remote {
            status: 500,
            message: "database unavailable".into(),
        })
    }

    async fn bulk_mark(
        &self,
        session_id: &SessionId,
        records: &[MarkRecord],
    ) -> Result<(), StorageError> {
        self.0.bulk_mark(session_id, records).await
    }

    async fn finalize_session(&self, session_id: &SessionId) -> Result<Session, StorageError> {
        self.0.finalize_session(session_id).await
    }
}

#[tokio::test]
async fn record_fetch_failures_other_than_not_found_propagate() {
    let repo = seeded_repo(2);
    let svc = AttendanceService::new(
        fixed_clock(),
        Arc::new(repo.clone()),
        Arc::new(repo.clone()),
        Arc::new(BrokenRecords(repo.clone())),
    );

    let err = svc
        .open(&section(), &subject(), day())
        .await
        .err()
        .unwrap();
    assert!(matches!(
        err,
        AttendanceError::Storage(StorageError::Remote { status: 500, .. })
    ));
}
