use rollcall_core::model::{SectionId, Student};

use super::HttpRemote;
use super::wire::StudentDto;
use crate::repository::{EnrollmentRepository, StorageError};

#[async_trait::async_trait]
impl EnrollmentRepository for HttpRemote {
    async fn list_section_students(
        &self,
        section_id: &SectionId,
    ) -> Result<Vec<Student>, StorageError> {
        let path = ["enrollment", "class-sections", section_id.as_str(), "students"];
        let students: Vec<StudentDto> = self.get_json(&path, &[]).await?;
        Ok(students.into_iter().map(Student::from).collect())
    }
}
