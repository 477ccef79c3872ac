//! Payout execution against the commission ledger.
//!
//! A bulk payout shares one payment reference, which in the real world is a
//! single bank transaction, so the batch settles all-or-nothing: one member
//! out of the approved state rejects the whole request with no state change.

use ps_common::error::{AppError, AppResult};
use ps_common::types::CommissionStatus;
use sqlx::SqlitePool;
use tracing::info;
use uuid::Uuid;

use crate::stores::commission::{
    fetch_commission, roll_subtotal_to_paid, status_to_db, CommissionRecord, CommissionStore,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BulkPayoutOutcome {
    pub paid_count: u64,
    pub total_net_amount: i64,
}

#[derive(Clone)]
pub struct PayoutService {
    pool: SqlitePool,
}

impl PayoutService {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn payout_single(
        &self,
        commission_id: Uuid,
        payment_reference: &str,
    ) -> AppResult<CommissionRecord> {
        CommissionStore::new(self.pool.clone())
            .mark_paid(commission_id, payment_reference)
            .await
    }

    pub async fn payout_bulk(
        &self,
        commission_ids: &[Uuid],
        payment_reference: &str,
    ) -> AppResult<BulkPayoutOutcome> {
        let payment_reference = payment_reference.trim();
        if payment_reference.is_empty() {
            return Err(AppError::validation(
                "payment_reference",
                "must not be blank",
            ));
        }

        let mut unique: Vec<Uuid> = Vec::with_capacity(commission_ids.len());
        for id in commission_ids {
            if !unique.contains(id) {
                unique.push(*id);
            }
        }
        if unique.is_empty() {
            return Err(AppError::validation(
                "commission_ids",
                "must not be empty",
            ));
        }

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| AppError::Storage(format!("failed to begin bulk payout tx: {e}")))?;

        // Precondition pass: every member must be approved before anything
        // is written.
        let mut members = Vec::with_capacity(unique.len());
        let mut blockers = Vec::new();
        for id in &unique {
            match fetch_commission(&mut *tx, *id).await? {
                None => blockers.push(format!("{id} is unknown")),
                Some(record) if record.status != CommissionStatus::Approved => {
                    blockers.push(format!("{id} is {}", status_to_db(record.status)));
                }
                Some(record) => members.push(record),
            }
        }
        if !blockers.is_empty() {
            return Err(AppError::BulkBlocked(blockers.join(", ")));
        }

        let now = chrono::Utc::now().to_rfc3339();
        let mut total_net_amount = 0_i64;
        for record in &members {
            let result = sqlx::query(
                "UPDATE commissions SET status = ?1, payment_reference = ?2, updated_at = ?3 \
                 WHERE commission_id = ?4 AND status = ?5",
            )
            .bind(status_to_db(CommissionStatus::Paid))
            .bind(payment_reference)
            .bind(&now)
            .bind(record.commission_id.to_string())
            .bind(status_to_db(CommissionStatus::Approved))
            .execute(&mut *tx)
            .await
            .map_err(|e| AppError::Storage(format!("failed to mark commission paid: {e}")))?;

            // A writer that slipped in after the precondition pass loses the
            // batch, not just the member.
            if result.rows_affected() == 0 {
                return Err(AppError::BulkBlocked(format!(
                    "{} changed state during payout",
                    record.commission_id
                )));
            }

            roll_subtotal_to_paid(&mut tx, record).await?;
            total_net_amount += record.net_amount;
        }

        tx.commit()
            .await
            .map_err(|e| AppError::Storage(format!("failed to commit bulk payout tx: {e}")))?;

        let paid_count = members.len() as u64;
        info!(
            paid_count,
            total_net_amount, payment_reference, "bulk payout settled"
        );
        Ok(BulkPayoutOutcome {
            paid_count,
            total_net_amount,
        })
    }
}
