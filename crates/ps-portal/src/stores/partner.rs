use chrono::{DateTime, Utc};
use ps_common::error::{AppError, AppResult};
use serde::Serialize;
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PartnerRecord {
    pub cp_id: Uuid,
    pub name: String,
    pub code: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone)]
pub struct PartnerStore {
    pool: SqlitePool,
}

impl PartnerStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, name: &str, code: &str, email: &str) -> AppResult<PartnerRecord> {
        let cp_id = Uuid::new_v4();
        let code = code.trim().to_ascii_uppercase();

        let result = sqlx::query(
            "INSERT INTO partners (cp_id, name, code, email, created_at) \
             VALUES (?1, ?2, ?3, ?4, ?5)",
        )
        .bind(cp_id.to_string())
        .bind(name)
        .bind(&code)
        .bind(email)
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await;

        if let Err(e) = result {
            let text = e.to_string();
            if text.contains("UNIQUE") {
                return Err(AppError::Conflict(format!(
                    "partner code {code} already exists"
                )));
            }
            return Err(AppError::Storage(format!("failed to create partner: {e}")));
        }

        self.get(cp_id).await?.ok_or(AppError::NotFound)
    }

    pub async fn get(&self, cp_id: Uuid) -> AppResult<Option<PartnerRecord>> {
        let row = sqlx::query(
            "SELECT cp_id, name, code, email, created_at FROM partners WHERE cp_id = ?1",
        )
        .bind(cp_id.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::Storage(format!("failed to fetch partner: {e}")))?;

        row.map(row_to_partner).transpose()
    }

    pub async fn list(&self) -> AppResult<Vec<PartnerRecord>> {
        let rows = sqlx::query(
            "SELECT cp_id, name, code, email, created_at FROM partners ORDER BY created_at DESC",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::Storage(format!("failed to list partners: {e}")))?;

        rows.into_iter().map(row_to_partner).collect()
    }
}

fn row_to_partner(row: sqlx::sqlite::SqliteRow) -> AppResult<PartnerRecord> {
    let cp_id: String = row
        .try_get("cp_id")
        .map_err(|e| AppError::Storage(format!("read cp_id failed: {e}")))?;
    let name: String = row
        .try_get("name")
        .map_err(|e| AppError::Storage(format!("read name failed: {e}")))?;
    let code: String = row
        .try_get("code")
        .map_err(|e| AppError::Storage(format!("read code failed: {e}")))?;
    let email: String = row
        .try_get("email")
        .map_err(|e| AppError::Storage(format!("read email failed: {e}")))?;
    let created_at: String = row
        .try_get("created_at")
        .map_err(|e| AppError::Storage(format!("read created_at failed: {e}")))?;

    Ok(PartnerRecord {
        cp_id: parse_uuid(&cp_id, "cp_id")?,
        name,
        code,
        email,
        created_at: parse_timestamp(&created_at, "created_at")?,
    })
}

pub(crate) fn parse_uuid(raw: &str, column: &str) -> AppResult<Uuid> {
    Uuid::parse_str(raw).map_err(|e| AppError::Storage(format!("invalid {column} uuid: {e}")))
}

pub(crate) fn parse_timestamp(raw: &str, column: &str) -> AppResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|ts| ts.with_timezone(&Utc))
        .map_err(|e| AppError::Storage(format!("invalid {column} timestamp: {e}")))
}
