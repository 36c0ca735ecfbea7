//! Application configuration loaded from environment variables.

use std::time::Duration;

const DEV_JWT_SECRET: &str = "gradebook-dev-secret-change-me";

/// Pause between database connection attempts.
pub const DB_RETRY_DELAY: Duration = Duration::from_secs(5);

/// Server configuration with sensible defaults.
///
/// Reads from environment variables:
/// - `HOST` — bind address (default: `"0.0.0.0"`)
/// - `PORT` — listen port (default: `5000`)
/// - `RUST_LOG` — tracing filter directive (default: `"info"`)
/// - `DATABASE_URL` — PostgreSQL URL; unset runs on the in-memory store
/// - `JWT_SECRET` — HS256 signing secret (default: a development secret)
/// - `JWT_TTL_HOURS` — token lifetime (default: `24`)
/// - `BCRYPT_COST` — bcrypt work factor (default: `10`)
/// - `STUDENT_DEFAULT_PASSWORD` — password for provisioned student logins (default: `"admin123"`)
/// - `DB_CONNECT_ATTEMPTS` — connection attempts before giving up (default: `10`)
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub log_level: String,
    pub database_url: Option<String>,
    pub jwt_secret: String,
    pub jwt_ttl_hours: i64,
    pub bcrypt_cost: u32,
    pub student_default_password: String,
    pub db_connect_attempts: u32,
}

fn var_or<T: std::str::FromStr>(name: &str, default: T) -> T {
    std::env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

impl Config {
    /// Loads configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            host: var_or("HOST", defaults.host),
            port: var_or("PORT", defaults.port),
            log_level: var_or("RUST_LOG", defaults.log_level),
            database_url: std::env::var("DATABASE_URL")
                .ok()
                .filter(|url| !url.trim().is_empty()),
            jwt_secret: var_or("JWT_SECRET", defaults.jwt_secret),
            jwt_ttl_hours: var_or("JWT_TTL_HOURS", defaults.jwt_ttl_hours),
            bcrypt_cost: var_or("BCRYPT_COST", defaults.bcrypt_cost),
            student_default_password: var_or(
                "STUDENT_DEFAULT_PASSWORD",
                defaults.student_default_password,
            ),
            db_connect_attempts: var_or("DB_CONNECT_ATTEMPTS", defaults.db_connect_attempts),
        }
    }

    /// Returns the `"host:port"` bind address string.
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Token lifetime. Values too large to add to the current time fall back
    /// to the default with a warning.
    pub fn jwt_ttl(&self) -> chrono::Duration {
        let ttl = chrono::Duration::try_hours(self.jwt_ttl_hours)
            .filter(|ttl| chrono::Utc::now().checked_add_signed(*ttl).is_some());

        ttl.unwrap_or_else(|| {
            let fallback = Self::default().jwt_ttl_hours;
            tracing::warn!(
                jwt_ttl_hours = self.jwt_ttl_hours,
                fallback,
                "JWT_TTL_HOURS out of range, using default"
            );
            chrono::Duration::hours(fallback)
        })
    }

    /// True when tokens are signed with the built-in development secret.
    pub fn uses_dev_secret(&self) -> bool {
        self.jwt_secret == DEV_JWT_SECRET
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 5000,
            log_level: "info".to_string(),
            database_url: None,
            jwt_secret: DEV_JWT_SECRET.to_string(),
            jwt_ttl_hours: 24,
            bcrypt_cost: 10,
            student_default_password: "admin123".to_string(),
            db_connect_attempts: 10,
        }
    }
}
