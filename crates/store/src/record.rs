//! Stored entities and their insert/patch payloads.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{RecordId, Role};

/// An account that can log in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[serde(rename = "_id")]
    pub id: RecordId,
    pub name: String,
    pub email: String,
    /// bcrypt hash, or a legacy plaintext password awaiting migration.
    #[serde(skip_serializing, default)]
    pub password_hash: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A student record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Student {
    #[serde(rename = "_id")]
    pub id: RecordId,
    pub name: String,
    pub email: String,
    /// School-issued code such as `STU001`.
    pub student_id: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A mark entry for one student, subject, semester and academic year.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Mark {
    #[serde(rename = "_id")]
    pub id: RecordId,
    /// Record id of the [`Student`] this mark belongs to.
    pub student_id: RecordId,
    pub subject: String,
    pub marks: f64,
    pub max_marks: f64,
    pub semester: String,
    pub academic_year: String,
    pub teacher_id: Option<RecordId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Mark {
    /// Score as a percentage of the maximum.
    pub fn percentage(&self) -> f64 {
        if self.max_marks == 0.0 {
            return 0.0;
        }
        self.marks / self.max_marks * 100.0
    }
}

#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub role: Role,
}

impl NewUser {
    pub(crate) fn into_user(self, now: DateTime<Utc>) -> User {
        User {
            id: RecordId::new(),
            name: self.name,
            email: self.email,
            password_hash: self.password_hash,
            role: self.role,
            created_at: now,
            updated_at: now,
        }
    }
}

#[derive(Debug, Clone)]
pub struct NewStudent {
    pub name: String,
    pub email: String,
    pub student_id: String,
}

impl NewStudent {
    pub(crate) fn into_student(self, now: DateTime<Utc>) -> Student {
        Student {
            id: RecordId::new(),
            name: self.name,
            email: self.email,
            student_id: self.student_id,
            created_at: now,
            updated_at: now,
        }
    }
}

#[derive(Debug, Clone)]
pub struct NewMark {
    pub student_id: RecordId,
    pub subject: String,
    pub marks: f64,
    pub max_marks: f64,
    pub semester: String,
    pub academic_year: String,
    pub teacher_id: Option<RecordId>,
}

impl NewMark {
    pub(crate) fn into_mark(self, now: DateTime<Utc>) -> Mark {
        Mark {
            id: RecordId::new(),
            student_id: self.student_id,
            subject: self.subject,
            marks: self.marks,
            max_marks: self.max_marks,
            semester: self.semester,
            academic_year: self.academic_year,
            teacher_id: self.teacher_id,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Partial update of a student. `None` fields are left untouched.
#[derive(Debug, Clone, Default)]
pub struct StudentUpdate {
    pub name: Option<String>,
    pub email: Option<String>,
    pub student_id: Option<String>,
}

impl StudentUpdate {
    pub(crate) fn apply(&self, student: &mut Student, now: DateTime<Utc>) {
        if let Some(name) = &self.name {
            student.name = name.clone();
        }
        if let Some(email) = &self.email {
            student.email = email.clone();
        }
        if let Some(code) = &self.student_id {
            student.student_id = code.clone();
        }
        student.updated_at = now;
    }
}

/// Partial update of a mark. `None` fields are left untouched.
#[derive(Debug, Clone, Default)]
pub struct MarkUpdate {
    pub marks: Option<f64>,
    pub max_marks: Option<f64>,
    pub subject: Option<String>,
    pub semester: Option<String>,
    pub academic_year: Option<String>,
}

impl MarkUpdate {
    pub(crate) fn apply(&self, mark: &mut Mark, now: DateTime<Utc>) {
        if let Some(marks) = self.marks {
            mark.marks = marks;
        }
        if let Some(max_marks) = self.max_marks {
            mark.max_marks = max_marks;
        }
        if let Some(subject) = &self.subject {
            mark.subject = subject.clone();
        }
        if let Some(semester) = &self.semester {
            mark.semester = semester.clone();
        }
        if let Some(year) = &self.academic_year {
            mark.academic_year = year.clone();
        }
        mark.updated_at = now;
    }
}
