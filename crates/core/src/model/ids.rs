use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Error type for parsing an ID from a string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseIdError {
    kind: &'static str,
}

impl fmt::Display for ParseIdError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "failed to parse {} from string", self.kind)
    }
}

impl std::error::Error for ParseIdError {}

// Server ids are opaque strings; we never interpret them, only compare and echo.
macro_rules! opaque_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            #[must_use]
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Returns the raw id as sent by the server.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({:?})", stringify!($name), self.0)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl FromStr for $name {
            type Err = ParseIdError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let trimmed = s.trim();
                if trimmed.is_empty() {
                    return Err(ParseIdError {
                        kind: stringify!($name),
                    });
                }
                Ok(Self(trimmed.to_string()))
            }
        }
    };
}

opaque_id!(
    /// Identifier of a class section (e.g. "6A").
    SectionId
);
opaque_id!(SubjectId);
opaque_id!(StudentId);
opaque_id!(
    /// Identifier of an attendance session, assigned by the server.
    SessionId
);
opaque_id!(AcademicYearId);
opaque_id!(AttemptId);
opaque_id!(QuizId);
opaque_id!(QuestionId);
opaque_id!(OptionId);

// ─── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_section_id_display() {
        let id = SectionId::new("6A");
        assert_eq!(id.to_string(), "6A");
    }

    #[test]
    fn test_student_id_from_str_trims() {
        let id: StudentId = "  stu-7 ".parse().unwrap();
        assert_eq!(id, StudentId::new("stu-7"));
    }

    #[test]
    fn test_id_from_str_rejects_blank() {
        let result = "   ".parse::<SessionId>();
        assert!(result.is_err());
        assert_eq!(
            result.unwrap_err().to_string(),
            "failed to parse SessionId from string"
        );
    }

    #[test]
    fn test_id_debug_names_kind() {
        let id = OptionId::new("opt-1");
        assert_eq!(format!("{id:?}"), "OptionId(\"opt-1\")");
    }

    #[test]
    fn test_id_serializes_transparently() {
        let id = QuestionId::new("q1");
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"q1\"");
        let back: QuestionId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }
}
