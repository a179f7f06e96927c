use rollcall_core::model::{Session, SessionId};

use super::HttpRemote;
use super::wire::{BulkMarkDto, MarkDto, NewSessionDto, SessionDto};
use crate::repository::{
    AttendanceRepository, MarkRecord, NewSessionRecord, SessionQuery, StorageError,
};

#[async_trait::async_trait]
impl AttendanceRepository for HttpRemote {
    async fn find_sessions(&self, query: &SessionQuery) -> Result<Vec<Session>, StorageError> {
        let params = [
            ("classSectionId", query.section_id.to_string()),
            ("subjectId", query.subject_id.to_string()),
            ("date", query.date.format("%Y-%m-%d").to_string()),
        ];
        let sessions: Vec<SessionDto> = self.get_json(&["attendance", "sessions"], &params).await?;
        sessions.into_iter().map(SessionDto::into_session).collect()
    }

    async fn create_session(&self, session: &NewSessionRecord) -> Result<Session, StorageError> {
        let body = NewSessionDto::from(session);
        let created: SessionDto = self.post_json(&["attendance", "sessions"], Some(&body)).await?;
        created.into_session()
    }

    async fn list_records(&self, session_id: &SessionId) -> Result<Vec<MarkRecord>, StorageError> {
        let path = ["attendance", "sessions", session_id.as_str(), "records"];
        let records: Vec<MarkDto> = self.get_json(&path, &[]).await?;
        Ok(records.into_iter().map(MarkRecord::from).collect())
    }

    async fn bulk_mark(
        &self,
        session_id: &SessionId,
        records: &[MarkRecord],
    ) -> Result<(), StorageError> {
        let path = ["attendance", "sessions", session_id.as_str(), "bulk-mark"];
        let body = BulkMarkDto {
            records: records.iter().map(MarkDto::from).collect(),
        };
        self.post_ack(&path, Some(&body)).await
    }

    async fn finalize_session(&self, session_id: &SessionId) -> Result<Session, StorageError> {
        let path = ["attendance", "sessions", session_id.as_str(), "finalize"];
        let session: SessionDto = self.post_json::<(), _>(&path, None).await?;
        session.into_session()
    }
}
