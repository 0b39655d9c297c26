//! Service error taxonomy.
//!
//! Every operation failure maps onto one of these variants; the HTTP layer
//! turns them into status codes and `{"error": ...}` bodies.

use std::fmt;

use crate::db::DbError;

#[derive(Debug)]
pub enum ServiceError {
    /// Missing or malformed request fields (400)
    Validation(String),
    /// Bad credentials or an invalid/expired token (401)
    Unauthorized(String),
    /// Valid identity, disallowed role or action (403)
    Forbidden(String),
    /// Referenced subject does not exist (404)
    NotFound(String),
    /// Unique-field collision on create (409)
    Conflict(String),
    /// Unexpected database or internal failure (500)
    Internal(String),
}

impl ServiceError {
    pub fn status(&self) -> u16 {
        match self {
            ServiceError::Validation(_) => 400,
            ServiceError::Unauthorized(_) => 401,
            ServiceError::Forbidden(_) => 403,
            ServiceError::NotFound(_) => 404,
            ServiceError::Conflict(_) => 409,
            ServiceError::Internal(_) => 500,
        }
    }

    pub fn message(&self) -> &str {
        match self {
            ServiceError::Validation(m)
            | ServiceError::Unauthorized(m)
            | ServiceError::Forbidden(m)
            | ServiceError::NotFound(m)
            | ServiceError::Conflict(m)
            | ServiceError::Internal(m) => m,
        }
    }
}

impl fmt::Display for ServiceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServiceError::Validation(m) => write!(f, "Validation error: {m}"),
            ServiceError::Unauthorized(m) => write!(f, "Unauthorized: {m}"),
            ServiceError::Forbidden(m) => write!(f, "Forbidden: {m}"),
            ServiceError::NotFound(m) => write!(f, "Not found: {m}"),
            ServiceError::Conflict(m) => write!(f, "Conflict: {m}"),
            ServiceError::Internal(m) => write!(f, "Internal error: {m}"),
        }
    }
}

impl std::error::Error for ServiceError {}

impl From<DbError> for ServiceError {
    fn from(err: DbError) -> Self {
        ServiceError::Internal(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(ServiceError::Validation("x".into()).status(), 400);
        assert_eq!(ServiceError::Unauthorized("x".into()).status(), 401);
        assert_eq!(ServiceError::Forbidden("x".into()).status(), 403);
        assert_eq!(ServiceError::NotFound("x".into()).status(), 404);
        assert_eq!(ServiceError::Conflict("x".into()).status(), 409);
        assert_eq!(ServiceError::Internal("x".into()).status(), 500);
    }

    #[test]
    fn test_message_passthrough() {
        let err = ServiceError::Forbidden("Customer accounts cannot access this dashboard".into());
        assert_eq!(err.message(), "Customer accounts cannot access this dashboard");
        assert!(err.to_string().contains("Forbidden"));
    }

    #[test]
    fn test_db_error_conversion() {
        let err: ServiceError = DbError::Other("boom".to_string()).into();
        assert_eq!(err.status(), 500);
    }
}
