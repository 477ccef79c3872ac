use chrono::{DateTime, Utc};
use ps_common::error::{AppError, AppResult};
use ps_common::money::CommissionBreakdown;
use ps_common::types::CommissionStatus;
use serde::Serialize;
use sqlx::{Row, Sqlite, SqlitePool};
use tracing::info;
use uuid::Uuid;

use super::partner::{parse_timestamp, parse_uuid};

/// One channel partner's entitlement on one investment. Derived amounts are
/// written once at creation and never recomputed; `payment_reference` is
/// populated only by the paid transition.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CommissionRecord {
    pub commission_id: Uuid,
    pub investment_id: String,
    pub cp_id: Uuid,
    pub customer_id: String,
    pub base_amount: i64,
    pub commission_rate: f64,
    pub commission_amount: i64,
    pub tds_amount: i64,
    pub net_amount: i64,
    pub status: CommissionStatus,
    pub payment_reference: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewCommission {
    pub investment_id: String,
    pub cp_id: Uuid,
    pub customer_id: String,
    pub base_amount: i64,
    pub commission_rate: f64,
    pub breakdown: CommissionBreakdown,
}

#[derive(Clone)]
pub struct CommissionStore {
    pool: SqlitePool,
}

impl CommissionStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, input: NewCommission) -> AppResult<CommissionRecord> {
        let commission_id = Uuid::new_v4();
        let now = Utc::now().to_rfc3339();

        sqlx::query(
            "INSERT INTO commissions (commission_id, investment_id, cp_id, customer_id, \
             base_amount, commission_rate, commission_amount, tds_amount, net_amount, \
             status, created_at, updated_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?11)",
        )
        .bind(commission_id.to_string())
        .bind(&input.investment_id)
        .bind(input.cp_id.to_string())
        .bind(&input.customer_id)
        .bind(input.base_amount)
        .bind(input.commission_rate)
        .bind(input.breakdown.commission_amount)
        .bind(input.breakdown.tds_amount)
        .bind(input.breakdown.net_amount)
        .bind(status_to_db(CommissionStatus::Pending))
        .bind(&now)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::Storage(format!("failed to create commission: {e}")))?;

        self.get(commission_id).await?.ok_or(AppError::NotFound)
    }

    pub async fn get(&self, commission_id: Uuid) -> AppResult<Option<CommissionRecord>> {
        fetch_commission(&self.pool, commission_id).await
    }

    /// List the ledger, optionally narrowed by status and by a free-text
    /// needle matched against commission id, investment id, CP code, and
    /// CP name.
    pub async fn list(
        &self,
        status: Option<CommissionStatus>,
        search: Option<&str>,
    ) -> AppResult<Vec<CommissionRecord>> {
        let pattern = search
            .map(str::trim)
            .filter(|q| !q.is_empty())
            .map(|q| format!("%{q}%"));

        let rows = sqlx::query(
            "SELECT c.commission_id, c.investment_id, c.cp_id, c.customer_id, c.base_amount, \
             c.commission_rate, c.commission_amount, c.tds_amount, c.net_amount, c.status, \
             c.payment_reference, c.created_at, c.updated_at \
             FROM commissions c JOIN partners p ON p.cp_id = c.cp_id \
             WHERE (?1 IS NULL OR c.status = ?1) \
               AND (?2 IS NULL OR c.commission_id LIKE ?2 OR c.investment_id LIKE ?2 \
                    OR p.code LIKE ?2 OR p.name LIKE ?2) \
             ORDER BY c.created_at DESC",
        )
        .bind(status.map(status_to_db))
        .bind(pattern)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::Storage(format!("failed to list commissions: {e}")))?;

        rows.into_iter().map(row_to_commission).collect()
    }

    /// pending -> approved. The update is conditioned on the observed status
    /// so one of two racing approvals loses with a zero-row result.
    pub async fn approve(&self, commission_id: Uuid) -> AppResult<CommissionRecord> {
        let result = sqlx::query(
            "UPDATE commissions SET status = ?1, updated_at = ?2 \
             WHERE commission_id = ?3 AND status = ?4",
        )
        .bind(status_to_db(CommissionStatus::Approved))
        .bind(Utc::now().to_rfc3339())
        .bind(commission_id.to_string())
        .bind(status_to_db(CommissionStatus::Pending))
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::Storage(format!("failed to approve commission: {e}")))?;

        if result.rows_affected() == 0 {
            return Err(self.transition_rejection(commission_id, "approve").await?);
        }

        info!(commission_id = %commission_id, "commission approved");
        self.get(commission_id).await?.ok_or(AppError::NotFound)
    }

    /// approved -> paid, with the supplied payment reference. Irreversible.
    /// The originating signup's pending subtotal rolls over to paid within
    /// the same transaction.
    pub async fn mark_paid(
        &self,
        commission_id: Uuid,
        payment_reference: &str,
    ) -> AppResult<CommissionRecord> {
        let payment_reference = payment_reference.trim();
        if payment_reference.is_empty() {
            return Err(AppError::validation(
                "payment_reference",
                "must not be blank",
            ));
        }

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| AppError::Storage(format!("failed to begin payout tx: {e}")))?;

        let record = fetch_commission(&mut *tx, commission_id)
            .await?
            .ok_or(AppError::NotFound)?;

        let result = sqlx::query(
            "UPDATE commissions SET status = ?1, payment_reference = ?2, updated_at = ?3 \
             WHERE commission_id = ?4 AND status = ?5",
        )
        .bind(status_to_db(CommissionStatus::Paid))
        .bind(payment_reference)
        .bind(Utc::now().to_rfc3339())
        .bind(commission_id.to_string())
        .bind(status_to_db(CommissionStatus::Approved))
        .execute(&mut *tx)
        .await
        .map_err(|e| AppError::Storage(format!("failed to mark commission paid: {e}")))?;

        if result.rows_affected() == 0 {
            return Err(AppError::transition(status_to_db(record.status), "pay"));
        }

        roll_subtotal_to_paid(&mut tx, &record).await?;

        tx.commit()
            .await
            .map_err(|e| AppError::Storage(format!("failed to commit payout tx: {e}")))?;

        info!(
            commission_id = %commission_id,
            net_amount = record.net_amount,
            payment_reference,
            "commission paid"
        );
        self.get(commission_id).await?.ok_or(AppError::NotFound)
    }

    /// pending | approved -> cancelled. A cancelled commission stays on the
    /// ledger; its net amount is removed from the signup's pending subtotal.
    pub async fn cancel(&self, commission_id: Uuid) -> AppResult<CommissionRecord> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| AppError::Storage(format!("failed to begin cancel tx: {e}")))?;

        let record = fetch_commission(&mut *tx, commission_id)
            .await?
            .ok_or(AppError::NotFound)?;

        let result = sqlx::query(
            "UPDATE commissions SET status = ?1, updated_at = ?2 \
             WHERE commission_id = ?3 AND status IN (?4, ?5)",
        )
        .bind(status_to_db(CommissionStatus::Cancelled))
        .bind(Utc::now().to_rfc3339())
        .bind(commission_id.to_string())
        .bind(status_to_db(CommissionStatus::Pending))
        .bind(status_to_db(CommissionStatus::Approved))
        .execute(&mut *tx)
        .await
        .map_err(|e| AppError::Storage(format!("failed to cancel commission: {e}")))?;

        if result.rows_affected() == 0 {
            return Err(AppError::transition(status_to_db(record.status), "cancel"));
        }

        sqlx::query(
            "UPDATE signups SET commission_pending = MAX(commission_pending - ?1, 0), \
             updated_at = ?2 WHERE customer_id = ?3 AND cp_id = ?4",
        )
        .bind(record.net_amount)
        .bind(Utc::now().to_rfc3339())
        .bind(&record.customer_id)
        .bind(record.cp_id.to_string())
        .execute(&mut *tx)
        .await
        .map_err(|e| AppError::Storage(format!("failed to release pending subtotal: {e}")))?;

        tx.commit()
            .await
            .map_err(|e| AppError::Storage(format!("failed to commit cancel tx: {e}")))?;

        info!(commission_id = %commission_id, "commission cancelled");
        self.get(commission_id).await?.ok_or(AppError::NotFound)
    }

    async fn transition_rejection(
        &self,
        commission_id: Uuid,
        requested: &str,
    ) -> AppResult<AppError> {
        Ok(match self.get(commission_id).await? {
            Some(record) => AppError::transition(status_to_db(record.status), requested),
            None => AppError::NotFound,
        })
    }
}

/// Move a paid commission's net amount from the attributed signup's pending
/// subtotal to its paid subtotal. A customer without a signup under this CP
/// matches no row, which is the non-referred case.
pub(crate) async fn roll_subtotal_to_paid(
    tx: &mut sqlx::Transaction<'_, Sqlite>,
    record: &CommissionRecord,
) -> AppResult<()> {
    sqlx::query(
        "UPDATE signups SET \
         commission_pending = MAX(commission_pending - ?1, 0), \
         commission_paid = commission_paid + ?1, \
         updated_at = ?2 \
         WHERE customer_id = ?3 AND cp_id = ?4",
    )
    .bind(record.net_amount)
    .bind(Utc::now().to_rfc3339())
    .bind(&record.customer_id)
    .bind(record.cp_id.to_string())
    .execute(&mut **tx)
    .await
    .map_err(|e| AppError::Storage(format!("failed to roll paid subtotal: {e}")))?;
    Ok(())
}

pub(crate) async fn fetch_commission<'e, E>(
    executor: E,
    commission_id: Uuid,
) -> AppResult<Option<CommissionRecord>>
where
    E: sqlx::Executor<'e, Database = Sqlite>,
{
    let row = sqlx::query(
        "SELECT commission_id, investment_id, cp_id, customer_id, base_amount, \
         commission_rate, commission_amount, tds_amount, net_amount, status, \
         payment_reference, created_at, updated_at \
         FROM commissions WHERE commission_id = ?1",
    )
    .bind(commission_id.to_string())
    .fetch_optional(executor)
    .await
    .map_err(|e| AppError::Storage(format!("failed to fetch commission: {e}")))?;

    row.map(row_to_commission).transpose()
}

pub(crate) fn row_to_commission(row: sqlx::sqlite::SqliteRow) -> AppResult<CommissionRecord> {
    let commission_id: String = row
        .try_get("commission_id")
        .map_err(|e| AppError::Storage(format!("read commission_id failed: {e}")))?;
    let investment_id: String = row
        .try_get("investment_id")
        .map_err(|e| AppError::Storage(format!("read investment_id failed: {e}")))?;
    let cp_id: String = row
        .try_get("cp_id")
        .map_err(|e| AppError::Storage(format!("read cp_id failed: {e}")))?;
    let customer_id: String = row
        .try_get("customer_id")
        .map_err(|e| AppError::Storage(format!("read customer_id failed: {e}")))?;
    let base_amount: i64 = row
        .try_get("base_amount")
        .map_err(|e| AppError::Storage(format!("read base_amount failed: {e}")))?;
    let commission_rate: f64 = row
        .try_get("commission_rate")
        .map_err(|e| AppError::Storage(format!("read commission_rate failed: {e}")))?;
    let commission_amount: i64 = row
        .try_get("commission_amount")
        .map_err(|e| AppError::Storage(format!("read commission_amount failed: {e}")))?;
    let tds_amount: i64 = row
        .try_get("tds_amount")
        .map_err(|e| AppError::Storage(format!("read tds_amount failed: {e}")))?;
    let net_amount: i64 = row
        .try_get("net_amount")
        .map_err(|e| AppError::Storage(format!("read net_amount failed: {e}")))?;
    let status: String = row
        .try_get("status")
        .map_err(|e| AppError::Storage(format!("read status failed: {e}")))?;
    let payment_reference: Option<String> = row
        .try_get("payment_reference")
        .map_err(|e| AppError::Storage(format!("read payment_reference failed: {e}")))?;
    let created_at: String = row
        .try_get("created_at")
        .map_err(|e| AppError::Storage(format!("read created_at failed: {e}")))?;
    let updated_at: String = row
        .try_get("updated_at")
        .map_err(|e| AppError::Storage(format!("read updated_at failed: {e}")))?;

    Ok(CommissionRecord {
        commission_id: parse_uuid(&commission_id, "commission_id")?,
        investment_id,
        cp_id: parse_uuid(&cp_id, "cp_id")?,
        customer_id,
        base_amount,
        commission_rate,
        commission_amount,
        tds_amount,
        net_amount,
        status: status_from_db(&status)?,
        payment_reference,
        created_at: parse_timestamp(&created_at, "created_at")?,
        updated_at: parse_timestamp(&updated_at, "updated_at")?,
    })
}

pub(crate) fn status_to_db(status: CommissionStatus) -> &'static str {
    match status {
        CommissionStatus::Pending => "pending",
        CommissionStatus::Approved => "approved",
        CommissionStatus::Paid => "paid",
        CommissionStatus::Cancelled => "cancelled",
    }
}

pub(crate) fn status_from_db(raw: &str) -> AppResult<CommissionStatus> {
    match raw {
        "pending" => Ok(CommissionStatus::Pending),
        "approved" => Ok(CommissionStatus::Approved),
        "paid" => Ok(CommissionStatus::Paid),
        "cancelled" => Ok(CommissionStatus::Cancelled),
        _ => Err(AppError::Storage(format!(
            "invalid commission status: {raw}"
        ))),
    }
}
