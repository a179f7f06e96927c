use std::collections::{HashMap, HashSet};
use thiserror::Error;

use crate::model::{AttendanceMark, AttendanceStatus, RosterEntry, StudentId};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum RosterError {
    #[error("student {0} is not on this roster")]
    UnknownStudent(StudentId),
}

/// Per-status counts over a sheet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StatusTally {
    pub present: usize,
    pub absent: usize,
    pub late: usize,
    pub excused: usize,
}

impl StatusTally {
    #[must_use]
    pub fn total(&self) -> usize {
        self.present + self.absent + self.late + self.excused
    }

    #[must_use]
    pub fn count(&self, status: AttendanceStatus) -> usize {
        match status {
            AttendanceStatus::Present => self.present,
            AttendanceStatus::Absent => self.absent,
            AttendanceStatus::Late => self.late,
            AttendanceStatus::Excused => self.excused,
        }
    }
}

/// Editable attendance marks for one session, one entry per roster student.
///
/// The set of students is fixed at hydration; edits only replace mark fields.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AttendanceSheet {
    entries: Vec<RosterEntry>,
    marks: HashMap<StudentId, AttendanceMark>,
}

impl AttendanceSheet {
    /// Build a sheet from a roster and the marks already saved for the session.
    ///
    /// Every roster student starts at the default mark; duplicate roster rows collapse
    /// to the first occurrence and saved marks for students outside the roster are ignored.
    #[must_use]
    pub fn hydrate(
        roster: impl IntoIterator<Item = RosterEntry>,
        saved: impl IntoIterator<Item = (StudentId, AttendanceMark)>,
    ) -> Self {
        let mut seen = HashSet::new();
        let entries: Vec<RosterEntry> = roster
            .into_iter()
            .filter(|entry| seen.insert(entry.student_id.clone()))
            .collect();

        let mut marks: HashMap<StudentId, AttendanceMark> = entries
            .iter()
            .map(|entry| (entry.student_id.clone(), AttendanceMark::default()))
            .collect();

        for (student_id, mark) in saved {
            if let Some(slot) = marks.get_mut(&student_id) {
                *slot = mark;
            }
        }

        Self { entries, marks }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[must_use]
    pub fn entries(&self) -> &[RosterEntry] {
        &self.entries
    }

    #[must_use]
    pub fn mark(&self, student_id: &StudentId) -> Option<&AttendanceMark> {
        self.marks.get(student_id)
    }

    /// Replace the status for one student; the comment is left untouched.
    ///
    /// # Errors
    ///
    /// Returns `RosterError::UnknownStudent` if the student is not on the roster.
    pub fn set_status(
        &mut self,
        student_id: &StudentId,
        status: AttendanceStatus,
    ) -> Result<(), RosterError> {
        self.mark_mut(student_id)?.status = status;
        Ok(())
    }

    /// Replace the comment for one student; the status is left untouched.
    ///
    /// # Errors
    ///
    /// Returns `RosterError::UnknownStudent` if the student is not on the roster.
    pub fn set_comment(
        &mut self,
        student_id: &StudentId,
        comment: impl Into<String>,
    ) -> Result<(), RosterError> {
        self.mark_mut(student_id)?.comment = comment.into();
        Ok(())
    }

    /// # Errors
    ///
    /// Returns `RosterError::UnknownStudent` if the student is not on the roster.
    pub fn set_minutes_late(
        &mut self,
        student_id: &StudentId,
        minutes: Option<u32>,
    ) -> Result<(), RosterError> {
        self.mark_mut(student_id)?.minutes_late = minutes;
        Ok(())
    }

    /// Set every student to the same status, keeping comments.
    pub fn mark_all(&mut self, status: AttendanceStatus) {
        for mark in self.marks.values_mut() {
            mark.status = status;
        }
    }

    #[must_use]
    pub fn tally(&self) -> StatusTally {
        let mut tally = StatusTally::default();
        for mark in self.marks.values() {
            match mark.status {
                AttendanceStatus::Present => tally.present += 1,
                AttendanceStatus::Absent => tally.absent += 1,
                AttendanceStatus::Late => tally.late += 1,
                AttendanceStatus::Excused => tally.excused += 1,
            }
        }
        tally
    }

    /// Copy of every mark in roster order, ready for a bulk write.
    #[must_use]
    pub fn snapshot(&self) -> Vec<(StudentId, AttendanceMark)> {
        self.entries
            .iter()
            .filter_map(|entry| {
                self.marks
                    .get(&entry.student_id)
                    .map(|mark| (entry.student_id.clone(), mark.clone()))
            })
            .collect()
    }

    fn mark_mut(&mut self, student_id: &StudentId) -> Result<&mut AttendanceMark, RosterError> {
        self.marks
            .get_mut(student_id)
            .ok_or_else(|| RosterError::UnknownStudent(student_id.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(id: &str) -> RosterEntry {
        RosterEntry {
            student_id: StudentId::new(id),
            display_name: format!("Student {id}"),
            roll_no: None,
            enrollment_id: None,
        }
    }

    fn roster(n: usize) -> Vec<RosterEntry> {
        (1..=n).map(|i| entry(&format!("s{i}"))).collect()
    }

    #[test]
    fn hydrate_defaults_every_student_to_present() {
        let sheet = AttendanceSheet::hydrate(roster(5), Vec::new());
        assert_eq!(sheet.len(), 5);
        for entry in sheet.entries() {
            let mark = sheet.mark(&entry.student_id).unwrap();
            assert_eq!(mark, &AttendanceMark::default());
        }
    }

    #[test]
    fn hydrate_overlays_saved_marks_and_ignores_strangers() {
        let saved = vec![
            (StudentId::new("s2"), AttendanceMark::new(AttendanceStatus::Absent)),
            (StudentId::new("ghost"), AttendanceMark::new(AttendanceStatus::Late)),
        ];
        let sheet = AttendanceSheet::hydrate(roster(3), saved);

        assert_eq!(sheet.len(), 3);
        assert!(sheet.mark(&StudentId::new("ghost")).is_none());
        assert_eq!(
            sheet.mark(&StudentId::new("s2")).unwrap().status,
            AttendanceStatus::Absent
        );
        assert_eq!(sheet.tally().present, 2);
    }

    #[test]
    fn hydrate_collapses_duplicate_roster_rows() {
        let mut rows = roster(3);
        rows.push(entry("s1"));
        let sheet = AttendanceSheet::hydrate(rows, Vec::new());
        assert_eq!(sheet.len(), 3);
        assert_eq!(sheet.snapshot().len(), 3);
    }

    #[test]
    fn set_status_keeps_comment() {
        let mut sheet = AttendanceSheet::hydrate(roster(2), Vec::new());
        let id = StudentId::new("s1");
        sheet.set_comment(&id, "bus was late").unwrap();
        sheet.set_status(&id, AttendanceStatus::Late).unwrap();

        let mark = sheet.mark(&id).unwrap();
        assert_eq!(mark.status, AttendanceStatus::Late);
        assert_eq!(mark.comment, "bus was late");
    }

    #[test]
    fn set_comment_keeps_status() {
        let mut sheet = AttendanceSheet::hydrate(roster(1), Vec::new());
        let id = StudentId::new("s1");
        sheet.set_status(&id, AttendanceStatus::Excused).unwrap();
        sheet.set_comment(&id, "doctor").unwrap();
        assert_eq!(sheet.mark(&id).unwrap().status, AttendanceStatus::Excused);
    }

    #[test]
    fn unknown_student_is_rejected_without_change() {
        let mut sheet = AttendanceSheet::hydrate(roster(2), Vec::new());
        let before = sheet.clone();
        let err = sheet
            .set_status(&StudentId::new("nobody"), AttendanceStatus::Absent)
            .unwrap_err();
        assert_eq!(err, RosterError::UnknownStudent(StudentId::new("nobody")));
        assert_eq!(sheet, before);
    }

    #[test]
    fn mark_all_keeps_comments_and_tally_follows() {
        let mut sheet = AttendanceSheet::hydrate(roster(4), Vec::new());
        sheet.set_comment(&StudentId::new("s3"), "field trip").unwrap();
        sheet.mark_all(AttendanceStatus::Excused);

        let tally = sheet.tally();
        assert_eq!(tally.excused, 4);
        assert_eq!(tally.total(), 4);
        assert_eq!(sheet.mark(&StudentId::new("s3")).unwrap().comment, "field trip");
    }

    #[test]
    fn snapshot_follows_roster_order() {
        let sheet = AttendanceSheet::hydrate(roster(3), Vec::new());
        let ids: Vec<String> = sheet
            .snapshot()
            .into_iter()
            .map(|(id, _)| id.to_string())
            .collect();
        assert_eq!(ids, vec!["s1", "s2", "s3"]);
    }
}
