//! Student records and their linked login accounts.

use common::{RecordId, Role};
use serde::Deserialize;
use store::{NewStudent, NewUser, SchoolStore, StoreError, Student, StudentUpdate, User};

use crate::auth::{PasswordHasher, Principal};
use crate::error::{DomainError, Result};
use crate::validation::Validator;

const STUDENT_EXISTS: &str = "Student with this email or ID already exists";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AddStudentRequest {
    pub name: String,
    pub email: String,
    pub student_id: String,
}

impl AddStudentRequest {
    pub fn validate(&self) -> Result<()> {
        let mut v = Validator::new();
        v.required("name", &self.name, "Name is required")
            .email("email", &self.email, "Please enter a valid email")
            .required("studentId", &self.student_id, "Student ID is required");
        v.finish()
    }
}

/// Partial student update. Absent fields are left unchanged.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct UpdateStudentRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub student_id: Option<String>,
}

impl UpdateStudentRequest {
    pub fn validate(&self) -> Result<()> {
        let mut v = Validator::new();
        if let Some(name) = &self.name {
            v.required("name", name, "Name is required");
        }
        if let Some(email) = &self.email {
            v.email("email", email, "Please enter a valid email");
        }
        if let Some(code) = &self.student_id {
            v.required("studentId", code, "Student ID is required");
        }
        v.finish()
    }
}

impl From<UpdateStudentRequest> for StudentUpdate {
    fn from(request: UpdateStudentRequest) -> Self {
        StudentUpdate {
            name: request.name,
            email: request.email,
            student_id: request.student_id,
        }
    }
}

fn conflict_on_duplicate(e: StoreError) -> DomainError {
    match e {
        StoreError::Duplicate { .. } => DomainError::Conflict(STUDENT_EXISTS.to_string()),
        other => other.into(),
    }
}

/// Service for managing students.
///
/// Every student gets a `student` login under the same email, created with
/// the configured default password and kept in step on rename and delete.
pub struct StudentService<S: SchoolStore> {
    store: S,
    hasher: PasswordHasher,
    default_password: String,
}

impl<S: SchoolStore> StudentService<S> {
    pub fn new(store: S, hasher: PasswordHasher, default_password: impl Into<String>) -> Self {
        Self {
            store,
            hasher,
            default_password: default_password.into(),
        }
    }

    /// Enrolls a student and provisions its login account.
    #[tracing::instrument(skip(self, request), fields(student_code = %request.student_id))]
    pub async fn add(&self, request: AddStudentRequest) -> Result<Student> {
        request.validate()?;

        if self
            .store
            .find_student_by_email_or_code(&request.email, &request.student_id)
            .await?
            .is_some()
        {
            return Err(DomainError::Conflict(STUDENT_EXISTS.to_string()));
        }

        let student = self
            .store
            .insert_student(NewStudent {
                name: request.name,
                email: request.email,
                student_id: request.student_id,
            })
            .await
            .map_err(conflict_on_duplicate)?;

        self.provision_login(&student).await?;

        metrics::counter!("students_enrolled_total").increment(1);
        tracing::info!(student_id = %student.id, "student enrolled");
        Ok(student)
    }

    async fn provision_login(&self, student: &Student) -> Result<()> {
        if self
            .store
            .find_user_by_email(&student.email)
            .await?
            .is_some()
        {
            tracing::debug!(email = %student.email, "login already exists for student");
            return Ok(());
        }

        let password_hash = self.hasher.hash(&self.default_password).await?;
        let inserted = self
            .store
            .insert_user(NewUser {
                name: student.name.clone(),
                email: student.email.clone(),
                password_hash,
                role: Role::Student,
            })
            .await;

        match inserted {
            Ok(_) | Err(StoreError::Duplicate { .. }) => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    pub async fn list(&self) -> Result<Vec<Student>> {
        Ok(self.store.list_students().await?)
    }

    pub async fn get(&self, id: RecordId) -> Result<Student> {
        self.store
            .find_student(id)
            .await?
            .ok_or_else(|| DomainError::not_found("Student", id))
    }

    /// Looks up a student by email. Students may only look up themselves.
    pub async fn get_by_email(&self, principal: &Principal, email: &str) -> Result<Student> {
        if principal.is(Role::Student) && principal.email != email {
            return Err(DomainError::Forbidden);
        }

        self.store
            .find_student_by_email(email)
            .await?
            .ok_or_else(|| DomainError::not_found("Student", email))
    }

    /// Applies a partial update, renaming the linked login when the email changes.
    #[tracing::instrument(skip(self, request))]
    pub async fn update(&self, id: RecordId, request: UpdateStudentRequest) -> Result<Student> {
        request.validate()?;

        let existing = self.get(id).await?;
        let updated = self
            .store
            .update_student(id, request.into())
            .await
            .map_err(conflict_on_duplicate)?
            .ok_or_else(|| DomainError::not_found("Student", id))?;

        if updated.email != existing.email {
            match self.rename_login(&existing.email, &updated.email).await {
                Ok(true) => tracing::info!(student_id = %id, "renamed student login"),
                Ok(false) => tracing::debug!(student_id = %id, "student had no login to rename"),
                Err(e) => {
                    tracing::warn!(student_id = %id, error = %e, "failed to rename student login")
                }
            }
        }

        Ok(updated)
    }

    /// Removes the student, its marks and its login account.
    #[tracing::instrument(skip(self))]
    pub async fn delete(&self, id: RecordId) -> Result<Student> {
        let student = self
            .store
            .delete_student(id)
            .await?
            .ok_or_else(|| DomainError::not_found("Student", id))?;

        let removed = match self.student_login(&student.email).await? {
            Some(_) => self.store.delete_user_by_email(&student.email).await?,
            None => false,
        };
        if !removed {
            tracing::debug!(student_id = %id, "student had no login to remove");
        }

        tracing::info!(student_id = %id, "student deleted");
        Ok(student)
    }

    /// The login sharing `email`, if it is a student account. Staff accounts
    /// that happen to share a student's email are never touched.
    async fn student_login(&self, email: &str) -> Result<Option<User>> {
        Ok(self
            .store
            .find_user_by_email(email)
            .await?
            .filter(|user| user.role == Role::Student))
    }

    async fn rename_login(&self, old: &str, new: &str) -> Result<bool> {
        if self.student_login(old).await?.is_none() {
            return Ok(false);
        }
        Ok(self.store.set_user_email(old, new).await?)
    }
}
