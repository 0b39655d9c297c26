//! Refresh-token revocation list.

use chrono::Utc;
use uuid::Uuid;

use crate::db::{DbError, DbExecutor};

/// Whether a token digest has been revoked.
pub fn is_revoked(db: &dyn DbExecutor, digest: &str) -> Result<bool, DbError> {
    let row = db.query_one(
        "SELECT EXISTS(SELECT 1 FROM revoked_tokens WHERE digest = $1)",
        &[&digest],
    )?;
    Ok(row.get(0))
}

/// Record a revocation. Returns false when the digest was already present.
pub fn revoke(
    db: &dyn DbExecutor,
    digest: &str,
    jti: &str,
    user_id: Option<Uuid>,
) -> Result<bool, DbError> {
    let inserted = db.execute(
        "INSERT INTO revoked_tokens (digest, jti, user_id, revoked_at) \
         VALUES ($1, $2, $3, $4) ON CONFLICT (digest) DO NOTHING",
        &[&digest, &jti, &user_id, &Utc::now()],
    )?;
    Ok(inserted > 0)
}
