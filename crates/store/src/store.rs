use async_trait::async_trait;

use crate::{
    Mark, MarkQuery, MarkUpdate, NewMark, NewStudent, NewUser, RecordId, Result, Role, Student,
    StudentUpdate, User,
};

/// Core trait for gradebook persistence.
///
/// All implementations must be thread-safe (Send + Sync). Uniqueness rules
/// (user email, student email, student code, one mark per student, subject,
/// semester and academic year) are enforced by the store and surface as
/// [`StoreError::Duplicate`](crate::StoreError::Duplicate).
#[async_trait]
pub trait SchoolStore: Send + Sync {
    // -- Users --

    /// Inserts a new user account.
    async fn insert_user(&self, user: NewUser) -> Result<User>;

    async fn find_user(&self, id: RecordId) -> Result<Option<User>>;

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>>;

    /// Lists users, optionally restricted to one role, in creation order.
    async fn list_users(&self, role: Option<Role>) -> Result<Vec<User>>;

    async fn count_users(&self, role: Option<Role>) -> Result<u64>;

    /// Replaces a user's stored password hash.
    ///
    /// Returns false if the user does not exist.
    async fn set_user_password(&self, id: RecordId, password_hash: &str) -> Result<bool>;

    /// Renames the login email of an account.
    ///
    /// Returns false if no account has the old email.
    async fn set_user_email(&self, old_email: &str, new_email: &str) -> Result<bool>;

    async fn delete_user_by_email(&self, email: &str) -> Result<bool>;

    // -- Students --

    async fn insert_student(&self, student: NewStudent) -> Result<Student>;

    async fn find_student(&self, id: RecordId) -> Result<Option<Student>>;

    async fn find_student_by_email(&self, email: &str) -> Result<Option<Student>>;

    /// Finds a student holding either the email or the student code.
    async fn find_student_by_email_or_code(
        &self,
        email: &str,
        student_code: &str,
    ) -> Result<Option<Student>>;

    /// Lists all students in creation order.
    async fn list_students(&self) -> Result<Vec<Student>>;

    async fn count_students(&self) -> Result<u64>;

    /// Applies a partial update. Returns None if the student does not exist.
    async fn update_student(&self, id: RecordId, update: StudentUpdate)
    -> Result<Option<Student>>;

    /// Deletes a student together with all of its marks.
    ///
    /// Both deletions happen atomically. Returns the removed student, or
    /// None if it did not exist.
    async fn delete_student(&self, id: RecordId) -> Result<Option<Student>>;

    // -- Marks --

    async fn insert_mark(&self, mark: NewMark) -> Result<Mark>;

    async fn find_mark(&self, id: RecordId) -> Result<Option<Mark>>;

    async fn query_marks(&self, query: MarkQuery) -> Result<Vec<Mark>>;

    /// Counts marks matching the query (paging is ignored).
    async fn count_marks(&self, query: MarkQuery) -> Result<u64>;

    /// Applies a partial update. Returns None if the mark does not exist.
    async fn update_mark(&self, id: RecordId, update: MarkUpdate) -> Result<Option<Mark>>;

    async fn delete_mark(&self, id: RecordId) -> Result<bool>;

    /// Removes every user, student and mark.
    async fn clear(&self) -> Result<()>;
}

/// Extension trait providing convenience methods for stores.
#[async_trait]
pub trait SchoolStoreExt: SchoolStore {
    /// Lists every mark in the store.
    async fn all_marks(&self) -> Result<Vec<Mark>> {
        self.query_marks(MarkQuery::new()).await
    }

    /// Finds the mark entry for a student, subject, semester and academic year.
    async fn find_mark_entry(
        &self,
        student_id: RecordId,
        subject: &str,
        semester: &str,
        academic_year: &str,
    ) -> Result<Option<Mark>> {
        let query = MarkQuery::entry(student_id, subject, semester, academic_year).limit(1);
        Ok(self.query_marks(query).await?.into_iter().next())
    }

    async fn count_teachers(&self) -> Result<u64> {
        self.count_users(Some(Role::Teacher)).await
    }
}

// Blanket implementation for all SchoolStore implementations
impl<T: SchoolStore + ?Sized> SchoolStoreExt for T {}
