//! Marks joined with the student they belong to.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use common::RecordId;
use serde::Serialize;
use store::{Mark, Student};

pub const UNKNOWN_STUDENT: &str = "Unknown Student";
pub const UNKNOWN_EMAIL: &str = "Unknown Email";
pub const UNKNOWN_CODE: &str = "Unknown ID";

/// Students indexed by record id, loaded once per report.
#[derive(Debug, Clone, Default)]
pub struct StudentLookup {
    students: HashMap<RecordId, Student>,
}

impl StudentLookup {
    pub fn new(students: impl IntoIterator<Item = Student>) -> Self {
        Self {
            students: students.into_iter().map(|s| (s.id, s)).collect(),
        }
    }

    pub fn get(&self, id: RecordId) -> Option<&Student> {
        self.students.get(&id)
    }

    pub fn len(&self) -> usize {
        self.students.len()
    }

    pub fn is_empty(&self) -> bool {
        self.students.is_empty()
    }

    /// Joins each mark with its student's name and email.
    pub fn join(&self, marks: Vec<Mark>) -> Vec<MarkWithStudent> {
        marks
            .into_iter()
            .map(|mark| {
                let student = self.get(mark.student_id);
                MarkWithStudent {
                    student_name: student
                        .map_or(UNKNOWN_STUDENT, |s| s.name.as_str())
                        .to_string(),
                    student_email: student
                        .map_or(UNKNOWN_EMAIL, |s| s.email.as_str())
                        .to_string(),
                    mark,
                }
            })
            .collect()
    }
}

/// A mark flattened together with its student's name and email.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MarkWithStudent {
    #[serde(flatten)]
    pub mark: Mark,
    pub student_name: String,
    pub student_email: String,
}

/// `marks / max_marks` as a percentage with two decimals, e.g. `85.00%`.
pub fn format_percentage(marks: f64, max_marks: f64) -> String {
    let ratio = if max_marks == 0.0 {
        0.0
    } else {
        marks / max_marks * 100.0
    };
    format!("{ratio:.2}%")
}

/// `M/D/YYYY` in UTC.
pub fn format_date(at: DateTime<Utc>) -> String {
    at.format("%-m/%-d/%Y").to_string()
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn student(name: &str) -> Student {
        let now = Utc::now();
        Student {
            id: RecordId::new(),
            name: name.to_string(),
            email: format!("{}@student.com", name.to_lowercase()),
            student_id: "STU001".to_string(),
            created_at: now,
            updated_at: now,
        }
    }

    fn mark(student_id: RecordId) -> Mark {
        let now = Utc::now();
        Mark {
            id: RecordId::new(),
            student_id,
            subject: "English".to_string(),
            marks: 42.0,
            max_marks: 50.0,
            semester: "Fall 2023".to_string(),
            academic_year: "2023-2024".to_string(),
            teacher_id: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn join_fills_known_and_unknown_students() {
        let alice = student("Alice");
        let lookup = StudentLookup::new([alice.clone()]);

        let rows = lookup.join(vec![mark(alice.id), mark(RecordId::new())]);

        assert_eq!(rows[0].student_name, "Alice");
        assert_eq!(rows[0].student_email, "alice@student.com");
        assert_eq!(rows[1].student_name, UNKNOWN_STUDENT);
        assert_eq!(rows[1].student_email, UNKNOWN_EMAIL);
    }

    #[test]
    fn joined_row_serializes_flat() {
        let alice = student("Alice");
        let rows = StudentLookup::new([alice.clone()]).join(vec![mark(alice.id)]);

        let json = serde_json::to_value(&rows[0]).unwrap();
        assert_eq!(json["studentName"], "Alice");
        assert_eq!(json["subject"], "English");
        assert_eq!(json["maxMarks"], 50.0);
        assert_eq!(json["studentId"], alice.id.to_string());
    }

    #[test]
    fn percentage_has_two_decimals() {
        assert_eq!(format_percentage(85.0, 100.0), "85.00%");
        assert_eq!(format_percentage(2.0, 3.0), "66.67%");
        assert_eq!(format_percentage(5.0, 0.0), "0.00%");
    }

    #[test]
    fn date_has_no_padding() {
        let at = Utc.with_ymd_and_hms(2024, 3, 7, 23, 59, 0).unwrap();
        assert_eq!(format_date(at), "3/7/2024");
    }
}
