//! Login, logout, refresh and current-user operations.

use serde::Deserialize;
use serde_json::{json, Value};

use crate::auth::{password, revocation, token_digest, TokenIssuer, TokenKind};
use crate::db::DbExecutor;
use crate::domain::{user, User};
use crate::service::accounts::identity_json;
use crate::service::ServiceError;

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    #[serde(default)]
    pub refresh: Option<String>,
}

/// Authenticate a credential pair and issue a token pair.
///
/// Customers are barred from this surface even with valid credentials; that
/// is a business rule, not an oversight.
pub fn login(
    db: &dyn DbExecutor,
    issuer: &TokenIssuer,
    req: LoginRequest,
) -> Result<Value, ServiceError> {
    let (email, password_plain) = match (req.email, req.password) {
        (Some(e), Some(p)) if !e.is_empty() && !p.is_empty() => (e, p),
        _ => {
            return Err(ServiceError::Validation(
                "Please provide both email and password".into(),
            ))
        }
    };

    let account = user::find_by_email(db, &email)?;
    let account = match account {
        Some(a) if a.is_active && password::verify_password(&password_plain, &a.password_hash) => a,
        _ => {
            return Err(ServiceError::Unauthorized(
                "Invalid email or password".into(),
            ))
        }
    };

    if account.is_customer() {
        return Err(ServiceError::Forbidden(
            "Customer accounts cannot access this dashboard".into(),
        ));
    }

    let pair = issuer
        .issue_pair(&account)
        .map_err(|e| ServiceError::Internal(e.to_string()))?;

    Ok(json!({
        "access": pair.access,
        "refresh": pair.refresh,
        "user": identity_json(&account),
    }))
}

/// Invalidate a refresh token.
///
/// Malformed, expired, wrong-kind and already-revoked tokens all surface as
/// the same client error; nothing here raises an unhandled fault.
pub fn logout(
    db: &dyn DbExecutor,
    issuer: &TokenIssuer,
    req: RefreshRequest,
) -> Result<Value, ServiceError> {
    let token = req
        .refresh
        .filter(|t| !t.is_empty())
        .ok_or_else(|| ServiceError::Validation("Invalid token".into()))?;

    let claims = issuer
        .verify(&token, TokenKind::Refresh)
        .map_err(|_| ServiceError::Validation("Invalid token".into()))?;

    let digest = token_digest(&token);
    let newly_revoked = revocation::revoke(db, &digest, &claims.jti, Some(claims.sub))?;
    if !newly_revoked {
        return Err(ServiceError::Validation("Invalid token".into()));
    }

    Ok(json!({ "detail": "Successfully logged out." }))
}

/// Exchange a valid refresh token for a new access token.
pub fn refresh(
    db: &dyn DbExecutor,
    issuer: &TokenIssuer,
    req: RefreshRequest,
) -> Result<Value, ServiceError> {
    let token = req
        .refresh
        .filter(|t| !t.is_empty())
        .ok_or_else(|| ServiceError::Validation("Refresh token is required".into()))?;

    let claims = issuer
        .verify(&token, TokenKind::Refresh)
        .map_err(|_| ServiceError::Unauthorized("Invalid or expired refresh token".into()))?;

    if revocation::is_revoked(db, &token_digest(&token))? {
        return Err(ServiceError::Unauthorized(
            "Invalid or expired refresh token".into(),
        ));
    }

    let account = user::find_by_id(db, claims.sub)?
        .ok_or_else(|| ServiceError::NotFound("User not found".into()))?;

    let access = issuer
        .issue_access(&account)
        .map_err(|e| ServiceError::Internal(e.to_string()))?;

    Ok(json!({
        "access": access,
        "user": {
            "id": account.id,
            "email": account.email,
            "role": account.effective_role(),
        }
    }))
}

/// Current authenticated identity.
pub fn me(account: &User) -> Value {
    identity_json(account)
}
