use crate::{Mark, RecordId};

/// Builder for constructing mark queries.
///
/// Every filter that is set must match; unset filters match anything.
/// Results are ordered by creation time, oldest first.
#[derive(Debug, Clone, Default)]
pub struct MarkQuery {
    /// Filter by the student record the mark belongs to.
    pub student_id: Option<RecordId>,

    /// Filter by the teacher who recorded the mark.
    pub teacher_id: Option<RecordId>,

    pub subject: Option<String>,
    pub semester: Option<String>,
    pub academic_year: Option<String>,

    /// Maximum number of marks to return.
    pub limit: Option<usize>,

    /// Number of marks to skip.
    pub offset: Option<usize>,
}

impl MarkQuery {
    /// Creates a new empty query matching every mark.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a query for the marks of one student.
    pub fn for_student(student_id: RecordId) -> Self {
        Self {
            student_id: Some(student_id),
            ..Default::default()
        }
    }

    /// Creates a query for the marks recorded by one teacher.
    pub fn for_teacher(teacher_id: RecordId) -> Self {
        Self {
            teacher_id: Some(teacher_id),
            ..Default::default()
        }
    }

    /// Creates a query for the single entry a student may hold per
    /// subject, semester and academic year.
    pub fn entry(
        student_id: RecordId,
        subject: impl Into<String>,
        semester: impl Into<String>,
        academic_year: impl Into<String>,
    ) -> Self {
        Self {
            student_id: Some(student_id),
            subject: Some(subject.into()),
            semester: Some(semester.into()),
            academic_year: Some(academic_year.into()),
            ..Default::default()
        }
    }

    pub fn student_id(mut self, id: RecordId) -> Self {
        self.student_id = Some(id);
        self
    }

    pub fn teacher_id(mut self, id: RecordId) -> Self {
        self.teacher_id = Some(id);
        self
    }

    pub fn subject(mut self, subject: impl Into<String>) -> Self {
        self.subject = Some(subject.into());
        self
    }

    pub fn semester(mut self, semester: impl Into<String>) -> Self {
        self.semester = Some(semester.into());
        self
    }

    pub fn academic_year(mut self, academic_year: impl Into<String>) -> Self {
        self.academic_year = Some(academic_year.into());
        self
    }

    /// Limits the number of marks returned.
    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Skips this many marks before returning results.
    pub fn offset(mut self, offset: usize) -> Self {
        self.offset = Some(offset);
        self
    }

    /// Returns true if the mark satisfies every filter (paging is ignored).
    pub fn matches(&self, mark: &Mark) -> bool {
        if let Some(id) = self.student_id
            && mark.student_id != id
        {
            return false;
        }
        if let Some(id) = self.teacher_id
            && mark.teacher_id != Some(id)
        {
            return false;
        }
        if let Some(ref subject) = self.subject
            && &mark.subject != subject
        {
            return false;
        }
        if let Some(ref semester) = self.semester
            && &mark.semester != semester
        {
            return false;
        }
        if let Some(ref year) = self.academic_year
            && &mark.academic_year != year
        {
            return false;
        }
        true
    }
}
