//! Tabular sheets and their `.xlsx` rendering.

use rust_xlsxwriter::{Format, Workbook};
use store::{Mark, Student};

use crate::error::Result;
use crate::view::{
    StudentLookup, UNKNOWN_CODE, UNKNOWN_EMAIL, UNKNOWN_STUDENT, format_date, format_percentage,
};

/// Excel's limit on worksheet name length.
pub const MAX_SHEET_NAME_LEN: usize = 31;

const ALL_MARKS_SHEET: &str = "Student Marks";

const ALL_MARKS_HEADERS: [&str; 10] = [
    "StudentName",
    "StudentEmail",
    "StudentID",
    "Subject",
    "Marks",
    "MaxMarks",
    "Percentage",
    "Semester",
    "AcademicYear",
    "DateAdded",
];

const STUDENT_HEADERS: [&str; 7] = [
    "Subject",
    "Marks",
    "MaxMarks",
    "Percentage",
    "Semester",
    "AcademicYear",
    "DateAdded",
];

#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Text(String),
    Number(f64),
    Empty,
}

impl Cell {
    fn text(value: impl Into<String>) -> Self {
        Cell::Text(value.into())
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Cell::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Cell::Number(n) => Some(*n),
            _ => None,
        }
    }
}

/// A single worksheet: a header row followed by data rows.
#[derive(Debug, Clone, PartialEq)]
pub struct Sheet {
    pub name: String,
    pub headers: Vec<&'static str>,
    pub rows: Vec<Vec<Cell>>,
}

impl Sheet {
    /// Every mark, one row each, with its student's name, email and code.
    pub fn all_marks(marks: &[Mark], students: &StudentLookup) -> Self {
        let rows = marks
            .iter()
            .map(|mark| {
                let student = students.get(mark.student_id);
                vec![
                    Cell::text(student.map_or(UNKNOWN_STUDENT, |s| s.name.as_str())),
                    Cell::text(student.map_or(UNKNOWN_EMAIL, |s| s.email.as_str())),
                    Cell::text(student.map_or(UNKNOWN_CODE, |s| s.student_id.as_str())),
                    Cell::text(&mark.subject),
                    Cell::Number(mark.marks),
                    Cell::Number(mark.max_marks),
                    Cell::Text(format_percentage(mark.marks, mark.max_marks)),
                    Cell::text(&mark.semester),
                    Cell::text(&mark.academic_year),
                    Cell::Text(format_date(mark.created_at)),
                ]
            })
            .collect();

        Self {
            name: ALL_MARKS_SHEET.to_string(),
            headers: ALL_MARKS_HEADERS.to_vec(),
            rows,
        }
    }

    /// One student's marks followed by a `TOTAL` row.
    pub fn student_marks(student: &Student, marks: &[Mark]) -> Self {
        let mut rows: Vec<Vec<Cell>> = marks
            .iter()
            .map(|mark| {
                vec![
                    Cell::text(&mark.subject),
                    Cell::Number(mark.marks),
                    Cell::Number(mark.max_marks),
                    Cell::Text(format_percentage(mark.marks, mark.max_marks)),
                    Cell::text(&mark.semester),
                    Cell::text(&mark.academic_year),
                    Cell::Text(format_date(mark.created_at)),
                ]
            })
            .collect();

        let total: f64 = marks.iter().map(|m| m.marks).sum();
        let total_max: f64 = marks.iter().map(|m| m.max_marks).sum();
        let percentage = if marks.is_empty() {
            "0%".to_string()
        } else {
            format_percentage(total, total_max)
        };
        rows.push(vec![
            Cell::text("TOTAL"),
            Cell::Number(total),
            Cell::Number(total_max),
            Cell::Text(percentage),
            Cell::Empty,
            Cell::Empty,
            Cell::Empty,
        ]);

        Self {
            name: sheet_name(&format!("{} Marks", student.name)),
            headers: STUDENT_HEADERS.to_vec(),
            rows,
        }
    }

    /// Renders the sheet as a single-sheet `.xlsx` workbook.
    pub fn to_xlsx(&self) -> Result<Vec<u8>> {
        let mut workbook = Workbook::new();
        let bold = Format::new().set_bold();

        let worksheet = workbook.add_worksheet();
        worksheet.set_name(&self.name)?;

        for (col, header) in (0u16..).zip(&self.headers) {
            worksheet.write_string_with_format(0, col, *header, &bold)?;
        }

        for (row, cells) in (1u32..).zip(&self.rows) {
            for (col, cell) in (0u16..).zip(cells) {
                match cell {
                    Cell::Text(s) => {
                        worksheet.write_string(row, col, s)?;
                    }
                    Cell::Number(n) => {
                        worksheet.write_number(row, col, *n)?;
                    }
                    Cell::Empty => {}
                }
            }
        }

        Ok(workbook.save_to_buffer()?)
    }
}

/// Makes `raw` acceptable as a worksheet name: characters Excel forbids
/// become `_` and the result is cut to 31 characters.
pub fn sheet_name(raw: &str) -> String {
    let cleaned: String = raw
        .chars()
        .map(|c| match c {
            '[' | ']' | ':' | '*' | '?' | '/' | '\\' => '_',
            c => c,
        })
        .take(MAX_SHEET_NAME_LEN)
        .collect();
    let trimmed = cleaned.trim_matches('\'');

    if trimmed.trim().is_empty() {
        "Marks".to_string()
    } else {
        trimmed.to_string()
    }
}
