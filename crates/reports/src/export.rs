//! Excel downloads of recorded marks.

use common::RecordId;
use domain::{MarkService, Principal};
use store::{SchoolStore, SchoolStoreExt};

use crate::error::Result;
use crate::sheet::Sheet;
use crate::view::{MarkWithStudent, StudentLookup};

pub const XLSX_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

const ALL_MARKS_FILE: &str = "student_marks.xlsx";

/// `<name>_marks.xlsx`, with control characters in the name replaced by `_`
/// so the result is always usable in a `Content-Disposition` header.
pub fn download_name(student_name: &str) -> String {
    let name: String = student_name
        .chars()
        .map(|c| if c.is_control() { '_' } else { c })
        .collect();
    format!("{name}_marks.xlsx")
}

/// A generated workbook ready to be sent as an attachment.
#[derive(Debug, Clone)]
pub struct Export {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

/// Service building mark listings and workbooks.
pub struct ExportService<S: SchoolStore> {
    marks: MarkService<S>,
}

impl<S: SchoolStore> ExportService<S> {
    pub fn new(store: S) -> Self {
        Self {
            marks: MarkService::new(store),
        }
    }

    async fn lookup(&self) -> Result<StudentLookup> {
        Ok(StudentLookup::new(self.marks.store().list_students().await?))
    }

    /// Every mark joined with its student's name and email.
    #[tracing::instrument(skip(self))]
    pub async fn marks_with_students(&self) -> Result<Vec<MarkWithStudent>> {
        let marks = self.marks.store().all_marks().await?;
        let lookup = self.lookup().await?;
        Ok(lookup.join(marks))
    }

    /// Workbook of every mark in the school.
    #[tracing::instrument(skip(self))]
    pub async fn all_marks(&self) -> Result<Export> {
        let marks = self.marks.store().all_marks().await?;
        let lookup = self.lookup().await?;
        let bytes = Sheet::all_marks(&marks, &lookup).to_xlsx()?;

        metrics::counter!("exports_generated_total", "kind" => "all").increment(1);
        tracing::info!(rows = marks.len(), "generated all-marks workbook");

        Ok(Export {
            file_name: ALL_MARKS_FILE.to_string(),
            bytes,
        })
    }

    /// Workbook of one student's marks. Students may only export their own.
    #[tracing::instrument(skip(self, principal))]
    pub async fn student_marks(
        &self,
        principal: &Principal,
        student_id: RecordId,
    ) -> Result<Export> {
        let record = self.marks.for_student(principal, student_id).await?;
        let bytes = Sheet::student_marks(&record.student, &record.marks).to_xlsx()?;

        metrics::counter!("exports_generated_total", "kind" => "student").increment(1);
        tracing::info!(rows = record.marks.len(), "generated student workbook");

        Ok(Export {
            file_name: download_name(&record.student.name),
            bytes,
        })
    }
}
