mod answers;
mod assessment;
mod attendance;
mod gate;
mod ids;
mod roster;
mod session;

pub use ids::{
    AcademicYearId, AttemptId, OptionId, ParseIdError, QuestionId, QuizId, SectionId, SessionId,
    StudentId, SubjectId,
};

pub use answers::{AnswerSheet, AnswerSheetError};
pub use assessment::{
    Attempt, AttemptResult, AttemptStatus, Question, QuestionOption, QuestionType,
};
pub use attendance::{
    AttendanceMark, AttendanceStatus, AttendanceStatusError, RosterEntry, Student,
};
pub use gate::{FinalizationGate, GateError, GateState};
pub use roster::{AttendanceSheet, RosterError, StatusTally};
pub use session::{AcademicYear, Session, SessionError};
