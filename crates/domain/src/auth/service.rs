use common::Role;
use serde::Deserialize;
use store::{NewUser, SchoolStore, StoreError, User};

use super::{PasswordCheck, PasswordHasher, Principal, TokenIssuer};
use crate::error::{DomainError, Result};
use crate::validation::{FieldError, Validator};

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

impl LoginRequest {
    pub fn validate(&self) -> Result<()> {
        let mut v = Validator::new();
        v.email("email", &self.email, "Please enter a valid email")
            .min_len(
                "password",
                &self.password,
                6,
                "Password must be at least 6 characters long",
            );
        v.finish()
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    pub role: String,
}

impl RegisterRequest {
    /// Validates the payload and returns the parsed role.
    pub fn validate(&self) -> Result<Role> {
        let role = self.role.parse::<Role>();

        let mut v = Validator::new();
        v.required("name", &self.name, "Name is required")
            .email("email", &self.email, "Please enter a valid email")
            .min_len(
                "password",
                &self.password,
                6,
                "Password must be at least 6 characters long",
            )
            .check("role", role.is_ok(), "Invalid role");
        v.finish()?;

        role.map_err(|_| {
            DomainError::Validation(vec![FieldError {
                field: "role",
                message: "Invalid role",
            }])
        })
    }
}

/// A successful login: the signed token and the account it belongs to.
#[derive(Debug, Clone)]
pub struct LoginOutcome {
    pub token: String,
    pub user: User,
}

/// Service for account registration, login and token verification.
pub struct AuthService<S: SchoolStore> {
    store: S,
    hasher: PasswordHasher,
    tokens: TokenIssuer,
}

impl<S: SchoolStore> AuthService<S> {
    pub fn new(store: S, hasher: PasswordHasher, tokens: TokenIssuer) -> Self {
        Self {
            store,
            hasher,
            tokens,
        }
    }

    pub fn tokens(&self) -> &TokenIssuer {
        &self.tokens
    }

    /// Verifies credentials and issues a token.
    ///
    /// Accounts still holding a plaintext password are migrated to a bcrypt
    /// hash on their first successful login. A failed migration is logged
    /// and does not block the login.
    #[tracing::instrument(skip(self, request), fields(email = %request.email))]
    pub async fn login(&self, request: LoginRequest) -> Result<LoginOutcome> {
        request.validate()?;

        let Some(user) = self.store.find_user_by_email(&request.email).await? else {
            metrics::counter!("auth_logins_total", "outcome" => "unknown_user").increment(1);
            return Err(DomainError::InvalidCredentials);
        };

        let check = self
            .hasher
            .verify(&request.password, &user.password_hash)
            .await?;

        if !check.is_valid() {
            metrics::counter!("auth_logins_total", "outcome" => "bad_password").increment(1);
            return Err(DomainError::InvalidCredentials);
        }

        if check == PasswordCheck::ValidLegacy {
            self.migrate_password(&user, &request.password).await;
        }

        let token = self.tokens.issue(&user)?;
        metrics::counter!("auth_logins_total", "outcome" => "success").increment(1);
        tracing::info!(user_id = %user.id, role = %user.role, "login succeeded");

        Ok(LoginOutcome { token, user })
    }

    async fn migrate_password(&self, user: &User, password: &str) {
        let migrated = match self.hasher.hash(password).await {
            Ok(hash) => self.store.set_user_password(user.id, &hash).await.map_err(DomainError::from),
            Err(e) => Err(e),
        };

        match migrated {
            Ok(_) => {
                metrics::counter!("password_migrations_total").increment(1);
                tracing::info!(user_id = %user.id, "migrated plaintext password to bcrypt");
            }
            Err(e) => {
                tracing::warn!(user_id = %user.id, error = %e, "password migration failed");
            }
        }
    }

    /// Creates an account with a hashed password.
    #[tracing::instrument(skip(self, request), fields(email = %request.email))]
    pub async fn register(&self, request: RegisterRequest) -> Result<User> {
        let role = request.validate()?;

        if self.store.find_user_by_email(&request.email).await?.is_some() {
            return Err(DomainError::Conflict("User already exists".to_string()));
        }

        let password_hash = self.hasher.hash(&request.password).await?;
        let user = self
            .store
            .insert_user(NewUser {
                name: request.name,
                email: request.email,
                password_hash,
                role,
            })
            .await
            .map_err(|e| match e {
                StoreError::Duplicate { .. } => {
                    DomainError::Conflict("User already exists".to_string())
                }
                other => other.into(),
            })?;

        tracing::info!(user_id = %user.id, role = %user.role, "user registered");
        Ok(user)
    }

    /// Returns the account behind a verified token.
    pub async fn me(&self, principal: &Principal) -> Result<User> {
        self.store
            .find_user(principal.id)
            .await?
            .ok_or_else(|| DomainError::not_found("User", principal.id))
    }

    /// Verifies a bearer token.
    pub fn authenticate(&self, token: &str) -> Result<Principal> {
        self.tokens.verify(token)
    }
}
