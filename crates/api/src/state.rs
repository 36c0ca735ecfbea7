//! Shared application state.

use domain::{
    AuthService, DashboardService, MarkService, PasswordHasher, StudentService, TokenIssuer,
};
use reports::ExportService;
use store::SchoolStore;

use crate::config::Config;

/// Shared application state accessible from all handlers.
pub struct AppState<S: SchoolStore> {
    pub auth: AuthService<S>,
    pub students: StudentService<S>,
    pub marks: MarkService<S>,
    pub dashboard: DashboardService<S>,
    pub exports: ExportService<S>,
}

impl<S: SchoolStore + Clone> AppState<S> {
    /// Wires every service over one store.
    pub fn new(store: S, config: &Config) -> Self {
        let hasher = PasswordHasher::new(config.bcrypt_cost);
        let tokens = TokenIssuer::new(&config.jwt_secret, config.jwt_ttl());

        Self {
            auth: AuthService::new(store.clone(), hasher, tokens),
            students: StudentService::new(
                store.clone(),
                hasher,
                config.student_default_password.clone(),
            ),
            marks: MarkService::new(store.clone()),
            dashboard: DashboardService::new(store.clone()),
            exports: ExportService::new(store),
        }
    }
}
