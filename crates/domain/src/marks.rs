//! Mark entry, lookup and correction.

use common::{RecordId, Role};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use store::{
    Mark, MarkQuery, MarkUpdate, NewMark, SchoolStore, SchoolStoreExt, StoreError, Student,
};

use crate::auth::Principal;
use crate::error::{DomainError, Result};
use crate::validation::{Validator, numeric};

const MARK_EXISTS: &str =
    "Mark already exists for this student, subject, semester, and academic year";

/// Checks the score pair shared by add and update payloads.
fn check_scores(v: &mut Validator, marks: Option<f64>, max_marks: Option<f64>) {
    v.check("marks", marks.is_some(), "Marks must be a number")
        .check("maxMarks", max_marks.is_some(), "Max marks must be a number");

    if let Some(max) = max_marks {
        v.check("maxMarks", max > 0.0, "Max marks must be greater than 0");
    }
    if let (Some(marks), Some(max)) = (marks, max_marks) {
        v.check(
            "marks",
            (0.0..=max).contains(&marks),
            "Marks must be between 0 and max marks",
        );
    }
}

/// Payload for recording a mark. Scores may arrive as numbers or numeric strings.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AddMarkRequest {
    pub student_id: String,
    pub subject: String,
    pub marks: Option<Value>,
    pub max_marks: Option<Value>,
    pub semester: String,
    pub academic_year: String,
}

impl AddMarkRequest {
    /// Validates the payload, returning the student id and both scores.
    pub fn validate(&self) -> Result<(RecordId, f64, f64)> {
        let student_id = self.student_id.trim().parse::<RecordId>().ok();
        let marks = numeric(self.marks.as_ref());
        let max_marks = numeric(self.max_marks.as_ref());

        let mut v = Validator::new();
        v.required("studentId", &self.student_id, "Student ID is required");
        if !self.student_id.trim().is_empty() {
            v.check("studentId", student_id.is_some(), "Invalid student ID");
        }
        v.required("subject", &self.subject, "Subject is required");
        check_scores(&mut v, marks, max_marks);
        v.required("semester", &self.semester, "Semester is required")
            .required(
                "academicYear",
                &self.academic_year,
                "Academic year is required",
            );
        v.finish()?;

        match (student_id, marks, max_marks) {
            (Some(id), Some(marks), Some(max)) => Ok((id, marks, max)),
            _ => Err(DomainError::Validation(Vec::new())),
        }
    }
}

/// Payload for correcting a mark. Both scores are required.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct UpdateMarkRequest {
    pub marks: Option<Value>,
    pub max_marks: Option<Value>,
    pub subject: Option<String>,
    pub semester: Option<String>,
    pub academic_year: Option<String>,
}

impl UpdateMarkRequest {
    pub fn validate(&self) -> Result<MarkUpdate> {
        let marks = numeric(self.marks.as_ref());
        let max_marks = numeric(self.max_marks.as_ref());

        let mut v = Validator::new();
        check_scores(&mut v, marks, max_marks);
        if let Some(subject) = &self.subject {
            v.required("subject", subject, "Subject is required");
        }
        if let Some(semester) = &self.semester {
            v.required("semester", semester, "Semester is required");
        }
        if let Some(year) = &self.academic_year {
            v.required("academicYear", year, "Academic year is required");
        }
        v.finish()?;

        Ok(MarkUpdate {
            marks,
            max_marks,
            subject: self.subject.clone(),
            semester: self.semester.clone(),
            academic_year: self.academic_year.clone(),
        })
    }
}

/// A student together with every mark recorded for it.
#[derive(Debug, Clone, Serialize)]
pub struct StudentMarks {
    pub student: Student,
    pub marks: Vec<Mark>,
}

/// Service for recording and reading marks.
pub struct MarkService<S: SchoolStore> {
    store: S,
}

impl<S: SchoolStore> MarkService<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Records a mark, attributed to the calling teacher.
    #[tracing::instrument(skip(self, principal, request), fields(teacher_id = %principal.id))]
    pub async fn add(&self, principal: &Principal, request: AddMarkRequest) -> Result<Mark> {
        let (student_id, marks, max_marks) = request.validate()?;

        if self.store.find_student(student_id).await?.is_none() {
            return Err(DomainError::not_found("Student", student_id));
        }

        if self
            .store
            .find_mark_entry(
                student_id,
                &request.subject,
                &request.semester,
                &request.academic_year,
            )
            .await?
            .is_some()
        {
            return Err(DomainError::Conflict(MARK_EXISTS.to_string()));
        }

        let mark = self
            .store
            .insert_mark(NewMark {
                student_id,
                subject: request.subject,
                marks,
                max_marks,
                semester: request.semester,
                academic_year: request.academic_year,
                teacher_id: Some(principal.id),
            })
            .await
            .map_err(|e| match e {
                StoreError::Duplicate { .. } => DomainError::Conflict(MARK_EXISTS.to_string()),
                other => other.into(),
            })?;

        metrics::counter!("marks_recorded_total").increment(1);
        tracing::info!(mark_id = %mark.id, student_id = %student_id, "mark recorded");
        Ok(mark)
    }

    pub async fn list(&self) -> Result<Vec<Mark>> {
        Ok(self.store.all_marks().await?)
    }

    pub async fn get(&self, id: RecordId) -> Result<Mark> {
        self.store
            .find_mark(id)
            .await?
            .ok_or_else(|| DomainError::not_found("Mark", id))
    }

    /// Fails with [`DomainError::Forbidden`] if a student asks for another
    /// student's record. Staff pass unconditionally.
    pub async fn check_access(&self, principal: &Principal, student_id: RecordId) -> Result<()> {
        if !principal.is(Role::Student) {
            return Ok(());
        }

        match self.store.find_student_by_email(&principal.email).await? {
            Some(own) if own.id == student_id => Ok(()),
            _ => Err(DomainError::Forbidden),
        }
    }

    /// Returns a student and all of its marks.
    #[tracing::instrument(skip(self, principal))]
    pub async fn for_student(
        &self,
        principal: &Principal,
        student_id: RecordId,
    ) -> Result<StudentMarks> {
        self.check_access(principal, student_id).await?;

        let student = self
            .store
            .find_student(student_id)
            .await?
            .ok_or_else(|| DomainError::not_found("Student", student_id))?;
        let marks = self
            .store
            .query_marks(MarkQuery::for_student(student_id))
            .await?;

        Ok(StudentMarks { student, marks })
    }

    #[tracing::instrument(skip(self, request))]
    pub async fn update(&self, id: RecordId, request: UpdateMarkRequest) -> Result<Mark> {
        let update = request.validate()?;

        self.store
            .update_mark(id, update)
            .await
            .map_err(|e| match e {
                StoreError::Duplicate { .. } => DomainError::Conflict(MARK_EXISTS.to_string()),
                other => other.into(),
            })?
            .ok_or_else(|| DomainError::not_found("Mark", id))
    }

    #[tracing::instrument(skip(self))]
    pub async fn delete(&self, id: RecordId) -> Result<()> {
        if self.store.delete_mark(id).await? {
            Ok(())
        } else {
            Err(DomainError::not_found("Mark", id))
        }
    }
}
