//! Denormalized mark views and Excel exports.
//!
//! This crate provides the read side used by listings and downloads:
//! - [`MarkWithStudent`] rows joined through a [`StudentLookup`]
//! - [`Sheet`] tables for the all-marks and per-student workbooks
//! - [`ExportService`] producing ready-to-send `.xlsx` files

pub mod error;
pub mod export;
pub mod sheet;
pub mod view;

pub use error::{ReportError, Result};
pub use export::{Export, ExportService, XLSX_CONTENT_TYPE, download_name};
pub use sheet::{Cell, Sheet};
pub use view::{MarkWithStudent, StudentLookup, format_date, format_percentage};
