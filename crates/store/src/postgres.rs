use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use sqlx::{PgPool, Row, postgres::PgPoolOptions, postgres::PgRow};
use uuid::Uuid;

use crate::{
    Mark, MarkQuery, MarkUpdate, NewMark, NewStudent, NewUser, RecordId, Result, Role,
    SchoolStore, Student, StoreError, StudentUpdate, User,
};

const USER_COLUMNS: &str = "id, name, email, password_hash, role, created_at, updated_at";
const STUDENT_COLUMNS: &str = "id, name, email, student_code, created_at, updated_at";
const MARK_COLUMNS: &str = "id, student_id, subject, marks, max_marks, semester, academic_year, teacher_id, created_at, updated_at";

/// Opens a connection pool, retrying failed attempts after `delay`.
///
/// Gives up and returns the last error once `attempts` connections have
/// failed.
pub async fn connect_with_retry(
    database_url: &str,
    attempts: u32,
    delay: Duration,
) -> Result<PgPool> {
    let attempts = attempts.max(1);
    let mut attempt = 1;
    loop {
        match PgPoolOptions::new()
            .max_connections(10)
            .connect(database_url)
            .await
        {
            Ok(pool) => {
                tracing::info!(attempt, "connected to database");
                return Ok(pool);
            }
            Err(e) if attempt < attempts => {
                tracing::warn!(
                    attempt,
                    error = %e,
                    retry_in_secs = delay.as_secs(),
                    "failed to connect to database, retrying"
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(e) => return Err(StoreError::Database(e)),
        }
    }
}

/// PostgreSQL-backed store implementation.
#[derive(Clone)]
pub struct PostgresSchoolStore {
    pool: PgPool,
}

impl PostgresSchoolStore {
    /// Creates a new PostgreSQL store over an existing pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Gets a reference to the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Runs the database migrations.
    pub async fn run_migrations(&self) -> Result<()> {
        sqlx::migrate!("../../migrations").run(&self.pool).await?;
        Ok(())
    }

    fn row_to_user(row: PgRow) -> Result<User> {
        let role: String = row.try_get("role")?;
        let role = role
            .parse::<Role>()
            .map_err(|e| StoreError::Corrupt(e.to_string()))?;

        Ok(User {
            id: RecordId::from_uuid(row.try_get::<Uuid, _>("id")?),
            name: row.try_get("name")?,
            email: row.try_get("email")?,
            password_hash: row.try_get("password_hash")?,
            role,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }

    fn row_to_student(row: PgRow) -> Result<Student> {
        Ok(Student {
            id: RecordId::from_uuid(row.try_get::<Uuid, _>("id")?),
            name: row.try_get("name")?,
            email: row.try_get("email")?,
            student_id: row.try_get("student_code")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }

    fn row_to_mark(row: PgRow) -> Result<Mark> {
        Ok(Mark {
            id: RecordId::from_uuid(row.try_get::<Uuid, _>("id")?),
            student_id: RecordId::from_uuid(row.try_get::<Uuid, _>("student_id")?),
            subject: row.try_get("subject")?,
            marks: row.try_get("marks")?,
            max_marks: row.try_get("max_marks")?,
            semester: row.try_get("semester")?,
            academic_year: row.try_get("academic_year")?,
            teacher_id: row
                .try_get::<Option<Uuid>, _>("teacher_id")?
                .map(RecordId::from_uuid),
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }

    /// Appends the WHERE clause for a mark query, returning the number of
    /// placeholders used.
    fn push_mark_filters(sql: &mut String, query: &MarkQuery) -> usize {
        let mut param_count = 0;
        sql.push_str(" WHERE 1=1");

        if query.student_id.is_some() {
            param_count += 1;
            sql.push_str(&format!(" AND student_id = ${param_count}"));
        }
        if query.teacher_id.is_some() {
            param_count += 1;
            sql.push_str(&format!(" AND teacher_id = ${param_count}"));
        }
        if query.subject.is_some() {
            param_count += 1;
            sql.push_str(&format!(" AND subject = ${param_count}"));
        }
        if query.semester.is_some() {
            param_count += 1;
            sql.push_str(&format!(" AND semester = ${param_count}"));
        }
        if query.academic_year.is_some() {
            param_count += 1;
            sql.push_str(&format!(" AND academic_year = ${param_count}"));
        }
        param_count
    }
}

/// Maps unique-constraint violations to [`StoreError::Duplicate`].
fn map_unique_violation(e: sqlx::Error) -> StoreError {
    let duplicate = match &e {
        sqlx::Error::Database(db_err) => match db_err.constraint() {
            Some("unique_user_email") => Some(("user", "email already registered")),
            Some("unique_student_email") => Some(("student", "email already registered")),
            Some("unique_student_code") => Some(("student", "student id already registered")),
            Some("unique_mark_entry") => Some((
                "mark",
                "subject, semester and academic year already recorded for student",
            )),
            _ => None,
        },
        _ => None,
    };

    match duplicate {
        Some((entity, detail)) => StoreError::duplicate(entity, detail),
        None => StoreError::Database(e),
    }
}

#[async_trait]
impl SchoolStore for PostgresSchoolStore {
    async fn insert_user(&self, user: NewUser) -> Result<User> {
        let user = user.into_user(Utc::now());

        sqlx::query(
            r#"
            INSERT INTO users (id, name, email, password_hash, role, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(user.id.as_uuid())
        .bind(&user.name)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(user.role.as_str())
        .bind(user.created_at)
        .bind(user.updated_at)
        .execute(&self.pool)
        .await
        .map_err(map_unique_violation)?;

        Ok(user)
    }

    async fn find_user(&self, id: RecordId) -> Result<Option<User>> {
        let row = sqlx::query(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1"))
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await?;

        row.map(Self::row_to_user).transpose()
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>> {
        let row = sqlx::query(&format!("SELECT {USER_COLUMNS} FROM users WHERE email = $1"))
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;

        row.map(Self::row_to_user).transpose()
    }

    async fn list_users(&self, role: Option<Role>) -> Result<Vec<User>> {
        let rows = sqlx::query(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE ($1::TEXT IS NULL OR role = $1) ORDER BY created_at ASC, id ASC"
        ))
        .bind(role.map(|r| r.as_str()))
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Self::row_to_user).collect()
    }

    async fn count_users(&self, role: Option<Role>) -> Result<u64> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE ($1::TEXT IS NULL OR role = $1)")
                .bind(role.map(|r| r.as_str()))
                .fetch_one(&self.pool)
                .await?;

        Ok(count as u64)
    }

    async fn set_user_password(&self, id: RecordId, password_hash: &str) -> Result<bool> {
        let result =
            sqlx::query("UPDATE users SET password_hash = $2, updated_at = $3 WHERE id = $1")
                .bind(id.as_uuid())
                .bind(password_hash)
                .bind(Utc::now())
                .execute(&self.pool)
                .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn set_user_email(&self, old_email: &str, new_email: &str) -> Result<bool> {
        let result = sqlx::query("UPDATE users SET email = $2, updated_at = $3 WHERE email = $1")
            .bind(old_email)
            .bind(new_email)
            .bind(Utc::now())
            .execute(&self.pool)
            .await
            .map_err(map_unique_violation)?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete_user_by_email(&self, email: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM users WHERE email = $1")
            .bind(email)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn insert_student(&self, student: NewStudent) -> Result<Student> {
        let student = student.into_student(Utc::now());

        sqlx::query(
            r#"
            INSERT INTO students (id, name, email, student_code, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(student.id.as_uuid())
        .bind(&student.name)
        .bind(&student.email)
        .bind(&student.student_id)
        .bind(student.created_at)
        .bind(student.updated_at)
        .execute(&self.pool)
        .await
        .map_err(map_unique_violation)?;

        Ok(student)
    }

    async fn find_student(&self, id: RecordId) -> Result<Option<Student>> {
        let row = sqlx::query(&format!(
            "SELECT {STUDENT_COLUMNS} FROM students WHERE id = $1"
        ))
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        row.map(Self::row_to_student).transpose()
    }

    async fn find_student_by_email(&self, email: &str) -> Result<Option<Student>> {
        let row = sqlx::query(&format!(
            "SELECT {STUDENT_COLUMNS} FROM students WHERE email = $1"
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Self::row_to_student).transpose()
    }

    async fn find_student_by_email_or_code(
        &self,
        email: &str,
        student_code: &str,
    ) -> Result<Option<Student>> {
        let row = sqlx::query(&format!(
            "SELECT {STUDENT_COLUMNS} FROM students WHERE email = $1 OR student_code = $2 LIMIT 1"
        ))
        .bind(email)
        .bind(student_code)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Self::row_to_student).transpose()
    }

    async fn list_students(&self) -> Result<Vec<Student>> {
        let rows = sqlx::query(&format!(
            "SELECT {STUDENT_COLUMNS} FROM students ORDER BY created_at ASC, id ASC"
        ))
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Self::row_to_student).collect()
    }

    async fn count_students(&self) -> Result<u64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM students")
            .fetch_one(&self.pool)
            .await?;

        Ok(count as u64)
    }

    async fn update_student(
        &self,
        id: RecordId,
        update: StudentUpdate,
    ) -> Result<Option<Student>> {
        let row = sqlx::query(&format!(
            r#"
            UPDATE students SET
                name = COALESCE($2, name),
                email = COALESCE($3, email),
                student_code = COALESCE($4, student_code),
                updated_at = $5
            WHERE id = $1
            RETURNING {STUDENT_COLUMNS}
            "#
        ))
        .bind(id.as_uuid())
        .bind(update.name)
        .bind(update.email)
        .bind(update.student_id)
        .bind(Utc::now())
        .fetch_optional(&self.pool)
        .await
        .map_err(map_unique_violation)?;

        row.map(Self::row_to_student).transpose()
    }

    async fn delete_student(&self, id: RecordId) -> Result<Option<Student>> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM marks WHERE student_id = $1")
            .bind(id.as_uuid())
            .execute(&mut *tx)
            .await?;

        let row = sqlx::query(&format!(
            "DELETE FROM students WHERE id = $1 RETURNING {STUDENT_COLUMNS}"
        ))
        .bind(id.as_uuid())
        .fetch_optional(&mut *tx)
        .await?;

        tx.commit().await?;
        row.map(Self::row_to_student).transpose()
    }

    async fn insert_mark(&self, mark: NewMark) -> Result<Mark> {
        let mark = mark.into_mark(Utc::now());

        sqlx::query(
            r#"
            INSERT INTO marks (id, student_id, subject, marks, max_marks, semester, academic_year, teacher_id, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
        .bind(mark.id.as_uuid())
        .bind(mark.student_id.as_uuid())
        .bind(&mark.subject)
        .bind(mark.marks)
        .bind(mark.max_marks)
        .bind(&mark.semester)
        .bind(&mark.academic_year)
        .bind(mark.teacher_id.map(|id| id.as_uuid()))
        .bind(mark.created_at)
        .bind(mark.updated_at)
        .execute(&self.pool)
        .await
        .map_err(map_unique_violation)?;

        Ok(mark)
    }

    async fn find_mark(&self, id: RecordId) -> Result<Option<Mark>> {
        let row = sqlx::query(&format!("SELECT {MARK_COLUMNS} FROM marks WHERE id = $1"))
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await?;

        row.map(Self::row_to_mark).transpose()
    }

    async fn query_marks(&self, query: MarkQuery) -> Result<Vec<Mark>> {
        let mut sql = format!("SELECT {MARK_COLUMNS} FROM marks");
        let mut param_count = Self::push_mark_filters(&mut sql, &query);

        sql.push_str(" ORDER BY created_at ASC, id ASC");

        if query.limit.is_some() {
            param_count += 1;
            sql.push_str(&format!(" LIMIT ${param_count}"));
        }
        if query.offset.is_some() {
            param_count += 1;
            sql.push_str(&format!(" OFFSET ${param_count}"));
        }

        let mut sqlx_query = sqlx::query(&sql);

        if let Some(id) = query.student_id {
            sqlx_query = sqlx_query.bind(id.as_uuid());
        }
        if let Some(id) = query.teacher_id {
            sqlx_query = sqlx_query.bind(id.as_uuid());
        }
        if let Some(subject) = query.subject {
            sqlx_query = sqlx_query.bind(subject);
        }
        if let Some(semester) = query.semester {
            sqlx_query = sqlx_query.bind(semester);
        }
        if let Some(year) = query.academic_year {
            sqlx_query = sqlx_query.bind(year);
        }
        if let Some(limit) = query.limit {
            sqlx_query = sqlx_query.bind(limit as i64);
        }
        if let Some(offset) = query.offset {
            sqlx_query = sqlx_query.bind(offset as i64);
        }

        let rows = sqlx_query.fetch_all(&self.pool).await?;
        rows.into_iter().map(Self::row_to_mark).collect()
    }

    async fn count_marks(&self, query: MarkQuery) -> Result<u64> {
        let mut sql = String::from("SELECT COUNT(*) FROM marks");
        Self::push_mark_filters(&mut sql, &query);

        let mut sqlx_query = sqlx::query_scalar::<_, i64>(&sql);

        if let Some(id) = query.student_id {
            sqlx_query = sqlx_query.bind(id.as_uuid());
        }
        if let Some(id) = query.teacher_id {
            sqlx_query = sqlx_query.bind(id.as_uuid());
        }
        if let Some(subject) = query.subject {
            sqlx_query = sqlx_query.bind(subject);
        }
        if let Some(semester) = query.semester {
            sqlx_query = sqlx_query.bind(semester);
        }
        if let Some(year) = query.academic_year {
            sqlx_query = sqlx_query.bind(year);
        }

        let count = sqlx_query.fetch_one(&self.pool).await?;
        Ok(count as u64)
    }

    async fn update_mark(&self, id: RecordId, update: MarkUpdate) -> Result<Option<Mark>> {
        let row = sqlx::query(&format!(
            r#"
            UPDATE marks SET
                marks = COALESCE($2, marks),
                max_marks = COALESCE($3, max_marks),
                subject = COALESCE($4, subject),
                semester = COALESCE($5, semester),
                academic_year = COALESCE($6, academic_year),
                updated_at = $7
            WHERE id = $1
            RETURNING {MARK_COLUMNS}
            "#
        ))
        .bind(id.as_uuid())
        .bind(update.marks)
        .bind(update.max_marks)
        .bind(update.subject)
        .bind(update.semester)
        .bind(update.academic_year)
        .bind(Utc::now())
        .fetch_optional(&self.pool)
        .await
        .map_err(map_unique_violation)?;

        row.map(Self::row_to_mark).transpose()
    }

    async fn delete_mark(&self, id: RecordId) -> Result<bool> {
        let result = sqlx::query("DELETE FROM marks WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn clear(&self) -> Result<()> {
        sqlx::query("TRUNCATE TABLE marks, students, users")
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}
