//! Aggregate statistics for the admin and teacher dashboards.

use std::collections::HashSet;

use common::{RecordId, Role};
use serde::Serialize;
use store::{Mark, MarkQuery, SchoolStore, SchoolStoreExt, User};

use crate::error::Result;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub total_students: u64,
    pub total_teachers: u64,
    pub total_marks: u64,
    /// Mean percentage over all marks, rounded to two decimals.
    pub average_marks: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TeacherStats {
    /// Distinct students this teacher has recorded marks for.
    pub students_handled: u64,
    pub marks_entries: u64,
}

/// Mean of each mark's percentage, rounded to two decimals. Zero when empty.
pub fn average_percentage(marks: &[Mark]) -> f64 {
    if marks.is_empty() {
        return 0.0;
    }
    let total: f64 = marks.iter().map(Mark::percentage).sum();
    let mean = total / marks.len() as f64;
    (mean * 100.0).round() / 100.0
}

pub struct DashboardService<S: SchoolStore> {
    store: S,
}

impl<S: SchoolStore> DashboardService<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    #[tracing::instrument(skip(self))]
    pub async fn stats(&self) -> Result<DashboardStats> {
        let marks = self.store.all_marks().await?;

        Ok(DashboardStats {
            total_students: self.store.count_students().await?,
            total_teachers: self.store.count_teachers().await?,
            total_marks: marks.len() as u64,
            average_marks: average_percentage(&marks),
        })
    }

    #[tracing::instrument(skip(self))]
    pub async fn teacher_stats(&self, teacher_id: RecordId) -> Result<TeacherStats> {
        let marks = self
            .store
            .query_marks(MarkQuery::for_teacher(teacher_id))
            .await?;
        let students: HashSet<RecordId> = marks.iter().map(|m| m.student_id).collect();

        Ok(TeacherStats {
            students_handled: students.len() as u64,
            marks_entries: marks.len() as u64,
        })
    }

    /// All teacher accounts. Password hashes never serialize.
    pub async fn teachers(&self) -> Result<Vec<User>> {
        Ok(self.store.list_users(Some(Role::Teacher)).await?)
    }
}
