use rollcall_core::model::AcademicYear;

use super::HttpRemote;
use super::wire::AcademicYearDto;
use crate::repository::{AcademicsRepository, StorageError};

#[async_trait::async_trait]
impl AcademicsRepository for HttpRemote {
    async fn list_academic_years(&self) -> Result<Vec<AcademicYear>, StorageError> {
        let years: Vec<AcademicYearDto> = self.get_json(&["academics", "academic-years"], &[]).await?;
        Ok(years.into_iter().map(AcademicYear::from).collect())
    }
}
