use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use crate::{
    Mark, MarkQuery, MarkUpdate, NewMark, NewStudent, NewUser, RecordId, Result, Role,
    SchoolStore, Student, StoreError, StudentUpdate, User,
};

#[derive(Default)]
struct Tables {
    users: Vec<User>,
    students: Vec<Student>,
    marks: Vec<Mark>,
}

impl Tables {
    fn student_clash(&self, except: Option<RecordId>, email: &str, code: &str) -> Option<String> {
        self.students
            .iter()
            .filter(|s| Some(s.id) != except)
            .find_map(|s| {
                if s.email == email {
                    Some(format!("email {email} already registered"))
                } else if s.student_id == code {
                    Some(format!("student id {code} already registered"))
                } else {
                    None
                }
            })
    }

    fn mark_clash(&self, except: Option<RecordId>, candidate: &Mark) -> bool {
        self.marks.iter().any(|m| {
            Some(m.id) != except
                && m.student_id == candidate.student_id
                && m.subject == candidate.subject
                && m.semester == candidate.semester
                && m.academic_year == candidate.academic_year
        })
    }
}

/// In-memory store implementation for testing and database-less runs.
///
/// Enforces the same uniqueness rules as the PostgreSQL schema. Records are
/// kept in insertion order, which is also creation order.
#[derive(Clone, Default)]
pub struct InMemorySchoolStore {
    tables: Arc<RwLock<Tables>>,
}

impl InMemorySchoolStore {
    /// Creates a new empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SchoolStore for InMemorySchoolStore {
    async fn insert_user(&self, user: NewUser) -> Result<User> {
        let mut tables = self.tables.write().await;
        if tables.users.iter().any(|u| u.email == user.email) {
            return Err(StoreError::duplicate(
                "user",
                format!("email {} already registered", user.email),
            ));
        }
        let user = user.into_user(Utc::now());
        tables.users.push(user.clone());
        Ok(user)
    }

    async fn find_user(&self, id: RecordId) -> Result<Option<User>> {
        let tables = self.tables.read().await;
        Ok(tables.users.iter().find(|u| u.id == id).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>> {
        let tables = self.tables.read().await;
        Ok(tables.users.iter().find(|u| u.email == email).cloned())
    }

    async fn list_users(&self, role: Option<Role>) -> Result<Vec<User>> {
        let tables = self.tables.read().await;
        Ok(tables
            .users
            .iter()
            .filter(|u| role.is_none_or(|r| u.role == r))
            .cloned()
            .collect())
    }

    async fn count_users(&self, role: Option<Role>) -> Result<u64> {
        let tables = self.tables.read().await;
        let count = tables
            .users
            .iter()
            .filter(|u| role.is_none_or(|r| u.role == r))
            .count();
        Ok(count as u64)
    }

    async fn set_user_password(&self, id: RecordId, password_hash: &str) -> Result<bool> {
        let mut tables = self.tables.write().await;
        match tables.users.iter_mut().find(|u| u.id == id) {
            Some(user) => {
                user.password_hash = password_hash.to_string();
                user.updated_at = Utc::now();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn set_user_email(&self, old_email: &str, new_email: &str) -> Result<bool> {
        let mut tables = self.tables.write().await;
        if old_email != new_email && tables.users.iter().any(|u| u.email == new_email) {
            return Err(StoreError::duplicate(
                "user",
                format!("email {new_email} already registered"),
            ));
        }
        match tables.users.iter_mut().find(|u| u.email == old_email) {
            Some(user) => {
                user.email = new_email.to_string();
                user.updated_at = Utc::now();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete_user_by_email(&self, email: &str) -> Result<bool> {
        let mut tables = self.tables.write().await;
        let before = tables.users.len();
        tables.users.retain(|u| u.email != email);
        Ok(tables.users.len() != before)
    }

    async fn insert_student(&self, student: NewStudent) -> Result<Student> {
        let mut tables = self.tables.write().await;
        if let Some(detail) = tables.student_clash(None, &student.email, &student.student_id) {
            return Err(StoreError::duplicate("student", detail));
        }
        let student = student.into_student(Utc::now());
        tables.students.push(student.clone());
        Ok(student)
    }

    async fn find_student(&self, id: RecordId) -> Result<Option<Student>> {
        let tables = self.tables.read().await;
        Ok(tables.students.iter().find(|s| s.id == id).cloned())
    }

    async fn find_student_by_email(&self, email: &str) -> Result<Option<Student>> {
        let tables = self.tables.read().await;
        Ok(tables.students.iter().find(|s| s.email == email).cloned())
    }

    async fn find_student_by_email_or_code(
        &self,
        email: &str,
        student_code: &str,
    ) -> Result<Option<Student>> {
        let tables = self.tables.read().await;
        Ok(tables
            .students
            .iter()
            .find(|s| s.email == email || s.student_id == student_code)
            .cloned())
    }

    async fn list_students(&self) -> Result<Vec<Student>> {
        Ok(self.tables.read().await.students.clone())
    }

    async fn count_students(&self) -> Result<u64> {
        Ok(self.tables.read().await.students.len() as u64)
    }

    async fn update_student(
        &self,
        id: RecordId,
        update: StudentUpdate,
    ) -> Result<Option<Student>> {
        let mut tables = self.tables.write().await;
        let Some(current) = tables.students.iter().find(|s| s.id == id).cloned() else {
            return Ok(None);
        };

        let mut updated = current;
        update.apply(&mut updated, Utc::now());
        if let Some(detail) = tables.student_clash(Some(id), &updated.email, &updated.student_id)
        {
            return Err(StoreError::duplicate("student", detail));
        }

        if let Some(slot) = tables.students.iter_mut().find(|s| s.id == id) {
            *slot = updated.clone();
        }
        Ok(Some(updated))
    }

    async fn delete_student(&self, id: RecordId) -> Result<Option<Student>> {
        let mut tables = self.tables.write().await;
        let Some(pos) = tables.students.iter().position(|s| s.id == id) else {
            return Ok(None);
        };
        let student = tables.students.remove(pos);
        tables.marks.retain(|m| m.student_id != id);
        Ok(Some(student))
    }

    async fn insert_mark(&self, mark: NewMark) -> Result<Mark> {
        let mut tables = self.tables.write().await;
        let mark = mark.into_mark(Utc::now());
        if tables.mark_clash(None, &mark) {
            return Err(StoreError::duplicate(
                "mark",
                format!(
                    "{} / {} / {} already recorded for student {}",
                    mark.subject, mark.semester, mark.academic_year, mark.student_id
                ),
            ));
        }
        tables.marks.push(mark.clone());
        Ok(mark)
    }

    async fn find_mark(&self, id: RecordId) -> Result<Option<Mark>> {
        let tables = self.tables.read().await;
        Ok(tables.marks.iter().find(|m| m.id == id).cloned())
    }

    async fn query_marks(&self, query: MarkQuery) -> Result<Vec<Mark>> {
        let tables = self.tables.read().await;
        let offset = query.offset.unwrap_or(0);
        let limit = query.limit.unwrap_or(usize::MAX);
        Ok(tables
            .marks
            .iter()
            .filter(|m| query.matches(m))
            .skip(offset)
            .take(limit)
            .cloned()
            .collect())
    }

    async fn count_marks(&self, query: MarkQuery) -> Result<u64> {
        let tables = self.tables.read().await;
        Ok(tables.marks.iter().filter(|m| query.matches(m)).count() as u64)
    }

    async fn update_mark(&self, id: RecordId, update: MarkUpdate) -> Result<Option<Mark>> {
        let mut tables = self.tables.write().await;
        let Some(current) = tables.marks.iter().find(|m| m.id == id).cloned() else {
            return Ok(None);
        };

        let mut updated = current;
        update.apply(&mut updated, Utc::now());
        if tables.mark_clash(Some(id), &updated) {
            return Err(StoreError::duplicate(
                "mark",
                format!(
                    "{} / {} / {} already recorded for student {}",
                    updated.subject, updated.semester, updated.academic_year, updated.student_id
                ),
            ));
        }

        if let Some(slot) = tables.marks.iter_mut().find(|m| m.id == id) {
            *slot = updated.clone();
        }
        Ok(Some(updated))
    }

    async fn delete_mark(&self, id: RecordId) -> Result<bool> {
        let mut tables = self.tables.write().await;
        let before = tables.marks.len();
        tables.marks.retain(|m| m.id != id);
        Ok(tables.marks.len() != before)
    }

    async fn clear(&self) -> Result<()> {
        let mut tables = self.tables.write().await;
        tables.users.clear();
        tables.students.clear();
        tables.marks.clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SchoolStoreExt;

    fn new_student(name: &str, email: &str, code: &str) -> NewStudent {
        NewStudent {
            name: name.to_string(),
            email: email.to_string(),
            student_id: code.to_string(),
        }
    }

    fn new_mark(student_id: RecordId, subject: &str, teacher_id: Option<RecordId>) -> NewMark {
        NewMark {
            student_id,
            subject: subject.to_string(),
            marks: 75.0,
            max_marks: 100.0,
            semester: "Fall 2023".to_string(),
            academic_year: "2023-2024".to_string(),
            teacher_id,
        }
    }

    #[tokio::test]
    async fn duplicate_user_email_is_rejected() {
        let store = InMemorySchoolStore::new();
        let user = NewUser {
            name: "John Smith".to_string(),
            email: "john.smith@school.com".to_string(),
            password_hash: "teacher123".to_string(),
            role: Role::Teacher,
        };

        store.insert_user(user.clone()).await.unwrap();
        let err = store.insert_user(user).await.unwrap_err();
        assert!(matches!(err, StoreError::Duplicate { entity: "user", .. }));
    }

    #[tokio::test]
    async fn students_unique_by_email_and_code() {
        let store = InMemorySchoolStore::new();
        store
            .insert_student(new_student("Alice", "alice@student.com", "STU001"))
            .await
            .unwrap();

        let same_email = store
            .insert_student(new_student("Alicia", "alice@student.com", "STU099"))
            .await;
        assert!(matches!(same_email, Err(StoreError::Duplicate { .. })));

        let same_code = store
            .insert_student(new_student("Bob", "bob@student.com", "STU001"))
            .await;
        assert!(matches!(same_code, Err(StoreError::Duplicate { .. })));

        assert_eq!(store.count_students().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn update_student_rejects_taking_another_students_code() {
        let store = InMemorySchoolStore::new();
        store
            .insert_student(new_student("Alice", "alice@student.com", "STU001"))
            .await
            .unwrap();
        let bob = store
            .insert_student(new_student("Bob", "bob@student.com", "STU002"))
            .await
            .unwrap();

        let result = store
            .update_student(
                bob.id,
                StudentUpdate {
                    student_id: Some("STU001".to_string()),
                    ..Default::default()
                },
            )
            .await;
        assert!(matches!(result, Err(StoreError::Duplicate { .. })));

        let unchanged = store.find_student(bob.id).await.unwrap().unwrap();
        assert_eq!(unchanged.student_id, "STU002");
    }

    #[tokio::test]
    async fn update_missing_student_returns_none() {
        let store = InMemorySchoolStore::new();
        let result = store
            .update_student(RecordId::new(), StudentUpdate::default())
            .await
            .unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn delete_student_cascades_to_marks() {
        let store = InMemorySchoolStore::new();
        let alice = store
            .insert_student(new_student("Alice", "alice@student.com", "STU001"))
            .await
            .unwrap();
        let bob = store
            .insert_student(new_student("Bob", "bob@student.com", "STU002"))
            .await
            .unwrap();
        store.insert_mark(new_mark(alice.id, "Science", None)).await.unwrap();
        store.insert_mark(new_mark(alice.id, "English", None)).await.unwrap();
        store.insert_mark(new_mark(bob.id, "Science", None)).await.unwrap();

        let removed = store.delete_student(alice.id).await.unwrap();
        assert_eq!(removed.map(|s| s.id), Some(alice.id));

        let remaining = store.all_marks().await.unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].student_id, bob.id);

        assert!(store.delete_student(alice.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn one_mark_per_student_subject_semester_year() {
        let store = InMemorySchoolStore::new();
        let student = RecordId::new();
        store.insert_mark(new_mark(student, "History", None)).await.unwrap();

        let err = store
            .insert_mark(new_mark(student, "History", None))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Duplicate { entity: "mark", .. }));

        let found = store
            .find_mark_entry(student, "History", "Fall 2023", "2023-2024")
            .await
            .unwrap();
        assert!(found.is_some());
    }

    #[tokio::test]
    async fn query_and_count_marks_by_teacher() {
        let store = InMemorySchoolStore::new();
        let teacher = RecordId::new();
        let s1 = RecordId::new();
        let s2 = RecordId::new();
        store.insert_mark(new_mark(s1, "Science", Some(teacher))).await.unwrap();
        store.insert_mark(new_mark(s1, "English", Some(teacher))).await.unwrap();
        store.insert_mark(new_mark(s2, "Science", Some(teacher))).await.unwrap();
        store.insert_mark(new_mark(s2, "English", None)).await.unwrap();

        let query = MarkQuery::for_teacher(teacher);
        assert_eq!(store.count_marks(query.clone()).await.unwrap(), 3);

        let page = store.query_marks(query.offset(1).limit(1)).await.unwrap();
        assert_eq!(page.len(), 1);
        assert_eq!(page[0].subject, "English");
        assert_eq!(page[0].student_id, s1);
    }

    #[tokio::test]
    async fn set_user_password_bumps_updated_at() {
        let store = InMemorySchoolStore::new();
        let user = store
            .insert_user(NewUser {
                name: "Admin User".to_string(),
                email: "admin@school.com".to_string(),
                password_hash: "admin123".to_string(),
                role: Role::Admin,
            })
            .await
            .unwrap();

        assert!(store.set_user_password(user.id, "$2b$04$x").await.unwrap());
        let reloaded = store.find_user(user.id).await.unwrap().unwrap();
        assert_eq!(reloaded.password_hash, "$2b$04$x");
        assert!(reloaded.updated_at >= user.updated_at);

        assert!(!store.set_user_password(RecordId::new(), "x").await.unwrap());
    }

    #[tokio::test]
    async fn counts_users_by_role() {
        let store = InMemorySchoolStore::new();
        for (i, role) in [Role::Admin, Role::Teacher, Role::Teacher, Role::Student]
            .into_iter()
            .enumerate()
        {
            store
                .insert_user(NewUser {
                    name: format!("User {i}"),
                    email: format!("user{i}@school.com"),
                    password_hash: String::new(),
                    role,
                })
                .await
                .unwrap();
        }

        assert_eq!(store.count_users(None).await.unwrap(), 4);
        assert_eq!(store.count_teachers().await.unwrap(), 2);
        assert_eq!(store.list_users(Some(Role::Student)).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn clear_empties_all_tables() {
        let store = InMemorySchoolStore::new();
        let s = store
            .insert_student(new_student("Alice", "alice@student.com", "STU001"))
            .await
            .unwrap();
        store.insert_mark(new_mark(s.id, "Science", None)).await.unwrap();

        store.clear().await.unwrap();
        assert_eq!(store.count_students().await.unwrap(), 0);
        assert_eq!(store.count_marks(MarkQuery::new()).await.unwrap(), 0);
    }
}
