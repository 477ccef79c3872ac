use chrono::{DateTime, Utc};
use ps_common::error::{AppError, AppResult};
use serde::Serialize;
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

use super::partner::{parse_timestamp, parse_uuid};

/// A channel partner's permanent referral invite. The code is issued once
/// and never rotated.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InviteRecord {
    pub invite_code: String,
    pub cp_id: Uuid,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone)]
pub struct InviteStore {
    pool: SqlitePool,
}

impl InviteStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Issue the permanent invite for a partner. The 1:1 unique index makes
    /// a second issue for the same partner a conflict.
    pub async fn issue(&self, cp_id: Uuid) -> AppResult<InviteRecord> {
        let invite_code = Uuid::new_v4().simple().to_string();

        let result = sqlx::query(
            "INSERT INTO invites (invite_code, cp_id, created_at) VALUES (?1, ?2, ?3)",
        )
        .bind(&invite_code)
        .bind(cp_id.to_string())
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await;

        if let Err(e) = result {
            let text = e.to_string();
            if text.contains("UNIQUE") {
                return Err(AppError::Conflict(format!(
                    "partner {cp_id} already has a permanent invite"
                )));
            }
            return Err(AppError::Storage(format!("failed to issue invite: {e}")));
        }

        self.get_for_partner(cp_id).await?.ok_or(AppError::NotFound)
    }

    pub async fn get_for_partner(&self, cp_id: Uuid) -> AppResult<Option<InviteRecord>> {
        let row = sqlx::query(
            "SELECT invite_code, cp_id, created_at FROM invites WHERE cp_id = ?1",
        )
        .bind(cp_id.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::Storage(format!("failed to fetch invite: {e}")))?;

        row.map(row_to_invite).transpose()
    }

    pub async fn resolve(&self, invite_code: &str) -> AppResult<Option<InviteRecord>> {
        let row = sqlx::query(
            "SELECT invite_code, cp_id, created_at FROM invites WHERE invite_code = ?1",
        )
        .bind(invite_code)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::Storage(format!("failed to resolve invite: {e}")))?;

        row.map(row_to_invite).transpose()
    }
}

fn row_to_invite(row: sqlx::sqlite::SqliteRow) -> AppResult<InviteRecord> {
    let invite_code: String = row
        .try_get("invite_code")
        .map_err(|e| AppError::Storage(format!("read invite_code failed: {e}")))?;
    let cp_id: String = row
        .try_get("cp_id")
        .map_err(|e| AppError::Storage(format!("read cp_id failed: {e}")))?;
    let created_at: String = row
        .try_get("created_at")
        .map_err(|e| AppError::Storage(format!("read created_at failed: {e}")))?;

    Ok(InviteRecord {
        invite_code,
        cp_id: parse_uuid(&cp_id, "cp_id")?,
        created_at: parse_timestamp(&created_at, "created_at")?,
    })
}
