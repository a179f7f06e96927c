use chrono::{DateTime, NaiveDate, Utc};
use thiserror::Error;

use crate::model::{AcademicYearId, SectionId, SessionId, SubjectId};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SessionError {
    #[error("ends_at is before starts_at")]
    InvalidTimeRange,
}

/// An attendance session: one (section, subject, date) triple on the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    id: SessionId,
    section_id: SectionId,
    subject_id: SubjectId,
    date: NaiveDate,
    starts_at: DateTime<Utc>,
    ends_at: DateTime<Utc>,
    finalized: bool,
}

impl Session {
    /// Rehydrate a session as returned by the remote store.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::InvalidTimeRange` if `ends_at` is before `starts_at`.
    pub fn from_persisted(
        id: SessionId,
        section_id: SectionId,
        subject_id: SubjectId,
        date: NaiveDate,
        starts_at: DateTime<Utc>,
        ends_at: DateTime<Utc>,
        finalized: bool,
    ) -> Result<Self, SessionError> {
        if ends_at < starts_at {
            return Err(SessionError::InvalidTimeRange);
        }

        Ok(Self {
            id,
            section_id,
            subject_id,
            date,
            starts_at,
            ends_at,
            finalized,
        })
    }

    #[must_use]
    pub fn id(&self) -> &SessionId {
        &self.id
    }

    #[must_use]
    pub fn section_id(&self) -> &SectionId {
        &self.section_id
    }

    #[must_use]
    pub fn subject_id(&self) -> &SubjectId {
        &self.subject_id
    }

    #[must_use]
    pub fn date(&self) -> NaiveDate {
        self.date
    }

    #[must_use]
    pub fn starts_at(&self) -> DateTime<Utc> {
        self.starts_at
    }

    #[must_use]
    pub fn ends_at(&self) -> DateTime<Utc> {
        self.ends_at
    }

    #[must_use]
    pub fn is_finalized(&self) -> bool {
        self.finalized
    }

    /// Returns true if this session belongs to the given triple.
    #[must_use]
    pub fn matches(&self, section_id: &SectionId, subject_id: &SubjectId, date: NaiveDate) -> bool {
        &self.section_id == section_id && &self.subject_id == subject_id && self.date == date
    }
}

/// A school year; exactly one is expected to be active at a time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AcademicYear {
    pub id: AcademicYearId,
    pub name: String,
    pub is_active: bool,
}
