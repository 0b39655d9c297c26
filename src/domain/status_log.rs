//! Append-only status audit trail.
//!
//! Rows are written once and never updated or deleted by application logic.

use chrono::{DateTime, Utc};
use may_postgres::Row;
use std::str::FromStr;
use uuid::Uuid;

use crate::db::{DbError, DbExecutor, FromRow};
use crate::domain::enums::EntityKind;

#[derive(Debug, Clone)]
pub struct StatusLog {
    pub id: Uuid,
    pub entity_type: EntityKind,
    pub entity_id: Uuid,
    pub status: String,
    pub note: Option<String>,
    pub changed_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

impl FromRow for StatusLog {
    fn from_row(row: &Row) -> Result<Self, DbError> {
        let kind_raw: String = row.try_get("entity_type")?;
        Ok(StatusLog {
            id: row.try_get("id")?,
            entity_type: EntityKind::from_str(&kind_raw)
                .map_err(|e| DbError::Parse(e.to_string()))?,
            entity_id: row.try_get("entity_id")?,
            status: row.try_get("status")?,
            note: row.try_get("note")?,
            changed_by: row.try_get("changed_by")?,
            created_at: row.try_get("created_at")?,
        })
    }
}

/// Append one audit row.
pub fn append(
    db: &dyn DbExecutor,
    entity_type: EntityKind,
    entity_id: Uuid,
    status: &str,
    note: Option<&str>,
    changed_by: Option<Uuid>,
) -> Result<StatusLog, DbError> {
    let log = StatusLog {
        id: Uuid::new_v4(),
        entity_type,
        entity_id,
        status: status.to_string(),
        note: note.map(str::to_string),
        changed_by,
        created_at: Utc::now(),
    };
    db.execute(
        "INSERT INTO status_logs (id, entity_type, entity_id, status, note, changed_by, created_at) \
         VALUES ($1, $2, $3, $4, $5, $6, $7)",
        &[
            &log.id,
            &log.entity_type.as_str(),
            &log.entity_id,
            &log.status,
            &log.note,
            &log.changed_by,
            &log.created_at,
        ],
    )?;
    Ok(log)
}

/// History for one entity, oldest first.
pub fn list_for_entity(
    db: &dyn DbExecutor,
    entity_type: EntityKind,
    entity_id: Uuid,
) -> Result<Vec<StatusLog>, DbError> {
    db.query_all(
        "SELECT id, entity_type, entity_id, status, note, changed_by, created_at \
         FROM status_logs WHERE entity_type = $1 AND entity_id = $2 ORDER BY created_at",
        &[&entity_type.as_str(), &entity_id],
    )?
    .iter()
    .map(StatusLog::from_row)
    .collect()
}
