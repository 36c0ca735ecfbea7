//! Domain layer for the gradebook service.
//!
//! This crate provides:
//! - request validation with per-field error collection
//! - password hashing (with legacy plaintext migration) and JWT issuing
//! - services for authentication, students, marks and dashboard statistics

pub mod auth;
pub mod dashboard;
pub mod error;
pub mod marks;
pub mod students;
pub mod validation;

pub use auth::{
    AuthService, Claims, LoginOutcome, LoginRequest, PasswordCheck, PasswordHasher, Principal,
    RegisterRequest, TokenIssuer,
};
pub use dashboard::{DashboardService, DashboardStats, TeacherStats};
pub use error::{DomainError, Result};
pub use marks::{AddMarkRequest, MarkService, StudentMarks, UpdateMarkRequest};
pub use students::{AddStudentRequest, StudentService, UpdateStudentRequest};
pub use validation::{FieldError, Validator};
