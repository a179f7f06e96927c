//! JSON shapes exchanged with the REST API and their mapping to domain types.

use chrono::{DateTime, NaiveDate, Utc};
use rollcall_core::model::{
    AcademicYear, AcademicYearId, Attempt, AttemptId, AttemptResult, AttemptStatus,
    AttendanceStatus, OptionId, Question, QuestionId, QuestionOption, QuestionType, QuizId,
    SectionId, Session, SessionId, Student, StudentId, SubjectId,
};
use serde::{Deserialize, Serialize};

use crate::repository::{AnswerRecord, MarkRecord, NewSessionRecord, StorageError};

fn ser<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Serialization(e.to_string())
}

#[derive(Debug, Deserialize)]
pub(crate) struct ErrorEnvelope {
    pub error: ErrorBody,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ErrorBody {
    #[serde(default)]
    pub message: Option<String>,
}

// ─── Sessions ──────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct SessionDto {
    pub id: SessionId,
    pub class_section_id: SectionId,
    pub subject_id: SubjectId,
    pub date: String,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
    #[serde(default, alias = "isFinalized")]
    pub finalized: bool,
}

impl SessionDto {
    pub fn into_session(self) -> Result<Session, StorageError> {
        let date = parse_date(&self.date)?;
        Session::from_persisted(
            self.id,
            self.class_section_id,
            self.subject_id,
            date,
            self.starts_at,
            self.ends_at,
            self.finalized,
        )
        .map_err(ser)
    }
}

/// The server sends either a bare date or a full timestamp for `date`.
pub(crate) fn parse_date(raw: &str) -> Result<NaiveDate, StorageError> {
    let day = raw.get(..10).unwrap_or(raw);
    NaiveDate::parse_from_str(day, "%Y-%m-%d").map_err(ser)
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct NewSessionDto {
    pub class_section_id: SectionId,
    pub subject_id: SubjectId,
    pub academic_year_id: AcademicYearId,
    pub date: String,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
}

impl From<&NewSessionRecord> for NewSessionDto {
    fn from(record: &NewSessionRecord) -> Self {
        Self {
            class_section_id: record.section_id.clone(),
            subject_id: record.subject_id.clone(),
            academic_year_id: record.academic_year_id.clone(),
            date: record.date.format("%Y-%m-%d").to_string(),
            starts_at: record.starts_at,
            ends_at: record.ends_at,
        }
    }
}

// ─── Attendance records ────────────────────────────────────────────────────────

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub(crate) struct MarkDto {
    pub student_id: StudentId,
    pub status: AttendanceStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub minutes_late: Option<u32>,
}

impl From<&MarkRecord> for MarkDto {
    fn from(record: &MarkRecord) -> Self {
        Self {
            student_id: record.student_id.clone(),
            status: record.status,
            comment: record.comment.clone(),
            minutes_late: record.minutes_late,
        }
    }
}

impl From<MarkDto> for MarkRecord {
    fn from(dto: MarkDto) -> Self {
        Self {
            student_id: dto.student_id,
            status: dto.status,
            comment: dto.comment,
            minutes_late: dto.minutes_late,
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct BulkMarkDto {
    pub records: Vec<MarkDto>,
}

// ─── Enrollment & academics ────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct StudentDto {
    pub id: StudentId,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub roll_no: Option<String>,
    #[serde(default)]
    pub enrollment_id: Option<String>,
}

impl From<StudentDto> for Student {
    fn from(dto: StudentDto) -> Self {
        Self {
            id: dto.id,
            first_name: dto.first_name,
            last_name: dto.last_name,
            display_name: dto.display_name,
            roll_no: dto.roll_no,
            enrollment_id: dto.enrollment_id,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct AcademicYearDto {
    pub id: AcademicYearId,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub is_active: bool,
}

impl From<AcademicYearDto> for AcademicYear {
    fn from(dto: AcademicYearDto) -> Self {
        Self {
            id: dto.id,
            name: dto.name,
            is_active: dto.is_active,
        }
    }
}

// ─── Assessments ───────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct AttemptDto {
    pub id: AttemptId,
    pub quiz_id: QuizId,
    pub status: AttemptStatus,
}

impl From<AttemptDto> for Attempt {
    fn from(dto: AttemptDto) -> Self {
        Self {
            id: dto.id,
            quiz_id: dto.quiz_id,
            status: dto.status,
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct OptionDto {
    pub id: OptionId,
    #[serde(default)]
    pub label: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct QuestionDto {
    pub id: QuestionId,
    #[serde(rename = "type")]
    pub kind: QuestionType,
    #[serde(default)]
    pub prompt: String,
    #[serde(default)]
    pub options: Vec<OptionDto>,
}

impl From<QuestionDto> for Question {
    fn from(dto: QuestionDto) -> Self {
        Self {
            id: dto.id,
            kind: dto.kind,
            prompt: dto.prompt,
            options: dto
                .options
                .into_iter()
                .map(|option| QuestionOption {
                    id: option.id,
                    label: option.label,
                })
                .collect(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub(crate) struct AnswerDto {
    pub question_id: QuestionId,
    #[serde(default)]
    pub selected_option_ids: Vec<OptionId>,
}

impl From<&AnswerRecord> for AnswerDto {
    fn from(record: &AnswerRecord) -> Self {
        Self {
            question_id: record.question_id.clone(),
            selected_option_ids: record.selected_option_ids.clone(),
        }
    }
}

impl From<AnswerDto> for AnswerRecord {
    fn from(dto: AnswerDto) -> Self {
        Self {
            question_id: dto.question_id,
            selected_option_ids: dto.selected_option_ids,
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct SaveAnswersDto {
    pub answers: Vec<AnswerDto>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub(crate) struct AttemptResultDto {
    #[serde(default)]
    pub score: Option<f64>,
    #[serde(default)]
    pub max_score: Option<f64>,
}

impl From<AttemptResultDto> for AttemptResult {
    fn from(dto: AttemptResultDto) -> Self {
        Self {
            score: dto.score,
            max_score: dto.max_score,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn session_accepts_timestamp_date() {
        let dto: SessionDto = serde_json::from_value(json!({
            "id": "sess-1",
            "classSectionId": "6A",
            "subjectId": "MATH",
            "date": "2024-03-01T00:00:00.000Z",
            "startsAt": "2024-03-01T08:00:00Z",
            "endsAt": "2024-03-01T09:00:00Z",
            "isFinalized": true
        }))
        .unwrap();
        let session = dto.into_session().unwrap();
        assert_eq!(session.date(), NaiveDate::from_ymd_opt(2024, 3, 1).unwrap());
        assert!(session.is_finalized());
    }

    #[test]
    fn new_session_body_uses_api_field_names() {
        let record = NewSessionRecord {
            section_id: SectionId::new("6A"),
            subject_id: SubjectId::new("MATH"),
            academic_year_id: AcademicYearId::new("ay-24"),
            date: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            starts_at: "2024-03-01T08:00:00Z".parse().unwrap(),
            ends_at: "2024-03-01T09:00:00Z".parse().unwrap(),
        };
        let body = serde_json::to_value(NewSessionDto::from(&record)).unwrap();
        assert_eq!(body["classSectionId"], "6A");
        assert_eq!(body["academicYearId"], "ay-24");
        assert_eq!(body["date"], "2024-03-01");
    }

    #[test]
    fn bulk_mark_body_omits_empty_optionals() {
        let body = BulkMarkDto {
            records: vec![
                MarkDto {
                    student_id: StudentId::new("s7"),
                    status: AttendanceStatus::Absent,
                    comment: None,
                    minutes_late: None,
                },
                MarkDto {
                    student_id: StudentId::new("s12"),
                    status: AttendanceStatus::Late,
                    comment: Some("bus".into()),
                    minutes_late: Some(15),
                },
            ],
        };
        let value = serde_json::to_value(body).unwrap();
        assert_eq!(
            value,
            json!({
                "records": [
                    { "studentId": "s7", "status": "ABSENT" },
                    { "studentId": "s12", "status": "LATE", "comment": "bus", "minutesLate": 15 }
                ]
            })
        );
    }

    #[test]
    fn question_type_field_is_named_type() {
        let dto: QuestionDto = serde_json::from_value(json!({
            "id": "q1",
            "type": "MCQ_SINGLE",
            "prompt": "2 + 2?",
            "options": [{ "id": "a", "label": "4" }, { "id": "b", "label": "5" }]
        }))
        .unwrap();
        let question = Question::from(dto);
        assert_eq!(question.kind, QuestionType::McqSingle);
        assert_eq!(question.options.len(), 2);
    }

    #[test]
    fn answers_body_shape() {
        let body = SaveAnswersDto {
            answers: vec![AnswerDto {
                question_id: QuestionId::new("q1"),
                selected_option_ids: vec![OptionId::new("a")],
            }],
        };
        let value = serde_json::to_value(body).unwrap();
        assert_eq!(
            value,
            json!({ "answers": [{ "questionId": "q1", "selectedOptionIds": ["a"] }] })
        );
    }

    #[test]
    fn bad_date_is_a_serialization_error() {
        assert!(matches!(
            parse_date("03/01/2024"),
            Err(StorageError::Serialization(_))
        ));
    }
}
