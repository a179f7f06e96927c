use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::model::StudentId;

//
// ─── ERRORS ───────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AttendanceStatusError {
    #[error("invalid attendance status: {0}")]
    Invalid(String),
}

//
// ─── STATUS ───────────────────────────────────────────────────────────────────
//

/// Attendance status recorded for one student in one session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AttendanceStatus {
    #[default]
    Present,
    Absent,
    Late,
    Excused,
}

impl AttendanceStatus {
    pub const ALL: [AttendanceStatus; 4] = [
        AttendanceStatus::Present,
        AttendanceStatus::Absent,
        AttendanceStatus::Late,
        AttendanceStatus::Excused,
    ];

    /// Wire representation used by the remote API.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            AttendanceStatus::Present => "PRESENT",
            AttendanceStatus::Absent => "ABSENT",
            AttendanceStatus::Late => "LATE",
            AttendanceStatus::Excused => "EXCUSED",
        }
    }
}

impl fmt::Display for AttendanceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AttendanceStatus {
    type Err = AttendanceStatusError;

    /// Case-insensitive; accepts the wire names and their single-letter initials.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "PRESENT" | "P" => Ok(Self::Present),
            "ABSENT" | "A" => Ok(Self::Absent),
            "LATE" | "L" => Ok(Self::Late),
            "EXCUSED" | "E" => Ok(Self::Excused),
            _ => Err(AttendanceStatusError::Invalid(s.to_string())),
        }
    }
}

//
// ─── MARK ─────────────────────────────────────────────────────────────────────
//

/// Editable attendance mark for one student.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AttendanceMark {
    pub status: AttendanceStatus,
    pub comment: String,
    pub minutes_late: Option<u32>,
}

impl AttendanceMark {
    #[must_use]
    pub fn new(status: AttendanceStatus) -> Self {
        Self {
            status,
            ..Self::default()
        }
    }
}

//
// ─── STUDENTS ─────────────────────────────────────────────────────────────────
//

/// A student enrolled in a class section, as listed by the enrollment API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Student {
    pub id: StudentId,
    pub first_name: String,
    pub last_name: String,
    pub display_name: Option<String>,
    pub roll_no: Option<String>,
    pub enrollment_id: Option<String>,
}

impl Student {
    /// Preferred display name, falling back to "First Last".
    #[must_use]
    pub fn display_name(&self) -> String {
        if let Some(name) = self
            .display_name
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty())
        {
            return name.to_string();
        }
        format!("{} {}", self.first_name.trim(), self.last_name.trim())
            .trim()
            .to_string()
    }
}

/// One row of a roster: who the student is, independent of their mark.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RosterEntry {
    pub student_id: StudentId,
    pub display_name: String,
    pub roll_no: Option<String>,
    pub enrollment_id: Option<String>,
}

impl From<&Student> for RosterEntry {
    fn from(student: &Student) -> Self {
        Self {
            student_id: student.id.clone(),
            display_name: student.display_name(),
            roll_no: student.roll_no.clone(),
            enrollment_id: student.enrollment_id.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn student(display: Option<&str>) -> Student {
        Student {
            id: StudentId::new("stu-1"),
            first_name: "Amina".into(),
            last_name: "Benali".into(),
            display_name: display.map(str::to_string),
            roll_no: Some("07".into()),
            enrollment_id: None,
        }
    }

    #[test]
    fn default_mark_is_present_without_comment() {
        let mark = AttendanceMark::default();
        assert_eq!(mark.status, AttendanceStatus::Present);
        assert!(mark.comment.is_empty());
        assert_eq!(mark.minutes_late, None);
    }

    #[test]
    fn status_parses_names_and_initials() {
        assert_eq!("absent".parse(), Ok(AttendanceStatus::Absent));
        assert_eq!("L".parse(), Ok(AttendanceStatus::Late));
        assert_eq!(" Excused ".parse(), Ok(AttendanceStatus::Excused));
        assert!("sick".parse::<AttendanceStatus>().is_err());
    }

    #[test]
    fn status_uses_screaming_case_on_the_wire() {
        let json = serde_json::to_string(&AttendanceStatus::Late).unwrap();
        assert_eq!(json, "\"LATE\"");
    }

    #[test]
    fn display_name_falls_back_to_full_name() {
        assert_eq!(student(None).display_name(), "Amina Benali");
        assert_eq!(student(Some("  ")).display_name(), "Amina Benali");
        assert_eq!(student(Some("Mina")).display_name(), "Mina");
    }
}
