use crate::error::Result;

const BCRYPT_PREFIXES: [&str; 3] = ["$2a$", "$2b$", "$2y$"];

/// Returns true if the stored value is a bcrypt hash rather than a legacy
/// plaintext password.
pub fn is_bcrypt_hash(stored: &str) -> bool {
    BCRYPT_PREFIXES.iter().any(|p| stored.starts_with(p))
}

/// Outcome of checking a password against its stored form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PasswordCheck {
    Invalid,
    /// Matched a bcrypt hash.
    Valid,
    /// Matched a legacy plaintext value; the caller should re-hash it.
    ValidLegacy,
}

impl PasswordCheck {
    pub fn is_valid(self) -> bool {
        !matches!(self, PasswordCheck::Invalid)
    }
}

/// bcrypt hashing on the blocking thread pool.
#[derive(Debug, Clone, Copy)]
pub struct PasswordHasher {
    cost: u32,
}

impl PasswordHasher {
    pub fn new(cost: u32) -> Self {
        Self { cost }
    }

    pub fn cost(&self) -> u32 {
        self.cost
    }

    pub async fn hash(&self, password: &str) -> Result<String> {
        let password = password.to_owned();
        let cost = self.cost;
        let hash = tokio::task::spawn_blocking(move || bcrypt::hash(password, cost)).await??;
        Ok(hash)
    }

    /// Checks `password` against a stored bcrypt hash or legacy plaintext.
    ///
    /// A malformed bcrypt hash counts as a mismatch.
    pub async fn verify(&self, password: &str, stored: &str) -> Result<PasswordCheck> {
        if !is_bcrypt_hash(stored) {
            return Ok(if password == stored {
                PasswordCheck::ValidLegacy
            } else {
                PasswordCheck::Invalid
            });
        }

        let password = password.to_owned();
        let stored = stored.to_owned();
        let outcome = tokio::task::spawn_blocking(move || bcrypt::verify(password, &stored)).await?;

        Ok(match outcome {
            Ok(true) => PasswordCheck::Valid,
            Ok(false) => PasswordCheck::Invalid,
            Err(e) => {
                tracing::warn!(error = %e, "stored password hash is malformed");
                PasswordCheck::Invalid
            }
        })
    }
}

impl Default for PasswordHasher {
    fn default() -> Self {
        Self::new(10)
    }
}
