//! Authentication: password hashing, JWT issuing and the login flow.

mod password;
mod principal;
mod service;
mod token;

pub use password::{PasswordCheck, PasswordHasher, is_bcrypt_hash};
pub use principal::Principal;
pub use service::{AuthService, LoginOutcome, LoginRequest, RegisterRequest};
pub use token::{Claims, TokenIssuer};
