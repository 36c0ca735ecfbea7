use common::{RecordId, Role};

use crate::error::{DomainError, Result};

/// The authenticated caller, as decoded from a verified token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    pub id: RecordId,
    pub email: String,
    pub role: Role,
}

impl Principal {
    pub fn is(&self, role: Role) -> bool {
        self.role == role
    }

    /// Fails with [`DomainError::Forbidden`] unless the caller holds one of `roles`.
    pub fn require_any(&self, roles: &[Role]) -> Result<()> {
        if roles.contains(&self.role) {
            Ok(())
        } else {
            Err(DomainError::Forbidden)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn principal(role: Role) -> Principal {
        Principal {
            id: RecordId::new(),
            email: "someone@school.com".to_string(),
            role,
        }
    }

    #[test]
    fn require_any_accepts_listed_roles() {
        let teacher = principal(Role::Teacher);
        assert!(teacher.require_any(&[Role::Admin, Role::Teacher]).is_ok());
        assert!(teacher.is(Role::Teacher));
    }

    #[test]
    fn require_any_rejects_other_roles() {
        let student = principal(Role::Student);
        assert!(matches!(
            student.require_any(&[Role::Admin, Role::Teacher]),
            Err(DomainError::Forbidden)
        ));
        assert!(matches!(student.require_any(&[]), Err(DomainError::Forbidden)));
    }
}
