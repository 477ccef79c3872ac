use chrono::{DateTime, Utc};
use ps_common::error::{AppError, AppResult};
use ps_common::types::SignupStatus;
use serde::Serialize;
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

use super::partner::{parse_timestamp, parse_uuid};

/// A customer who registered through a partner's invite link. Counters only
/// ever grow and the status never falls back from invested.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SignupRecord {
    pub customer_id: String,
    pub cp_id: Uuid,
    pub status: SignupStatus,
    pub investment_count: i64,
    pub total_invested: i64,
    pub commission_pending: i64,
    pub commission_paid: i64,
    pub signed_up_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Commission accrual carried by an investment, bucketed by the commission's
/// status at recording time.
#[derive(Debug, Clone, Copy, Default)]
pub struct CommissionAccrual {
    pub pending: i64,
    pub paid: i64,
}

#[derive(Clone)]
pub struct SignupStore {
    pool: SqlitePool,
}

impl SignupStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Create the signup if the customer has none yet; a repeat visit hands
    /// back the existing record untouched. Returns whether a row was created.
    pub async fn create_if_absent(
        &self,
        customer_id: &str,
        cp_id: Uuid,
    ) -> AppResult<(SignupRecord, bool)> {
        let now = Utc::now().to_rfc3339();
        let result = sqlx::query(
            "INSERT INTO signups (customer_id, cp_id, status, signed_up_at, updated_at) \
             VALUES (?1, ?2, ?3, ?4, ?4) \
             ON CONFLICT (customer_id) DO NOTHING",
        )
        .bind(customer_id)
        .bind(cp_id.to_string())
        .bind(status_to_db(SignupStatus::SignedUp))
        .bind(&now)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::Storage(format!("failed to create signup: {e}")))?;

        let created = result.rows_affected() > 0;
        let record = self.get(customer_id).await?.ok_or(AppError::NotFound)?;
        Ok((record, created))
    }

    pub async fn get(&self, customer_id: &str) -> AppResult<Option<SignupRecord>> {
        let row = sqlx::query(
            "SELECT customer_id, cp_id, status, investment_count, total_invested, \
             commission_pending, commission_paid, signed_up_at, updated_at \
             FROM signups WHERE customer_id = ?1",
        )
        .bind(customer_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::Storage(format!("failed to fetch signup: {e}")))?;

        row.map(row_to_signup).transpose()
    }

    pub async fn list_for_partner(
        &self,
        cp_id: Uuid,
        status: Option<SignupStatus>,
    ) -> AppResult<Vec<SignupRecord>> {
        let rows = sqlx::query(
            "SELECT customer_id, cp_id, status, investment_count, total_invested, \
             commission_pending, commission_paid, signed_up_at, updated_at \
             FROM signups WHERE cp_id = ?1 AND (?2 IS NULL OR status = ?2) \
             ORDER BY signed_up_at DESC",
        )
        .bind(cp_id.to_string())
        .bind(status.map(status_to_db))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::Storage(format!("failed to list signups: {e}")))?;

        rows.into_iter().map(row_to_signup).collect()
    }

    /// Apply one investment to the customer's signup in a single update:
    /// signed_up moves to invested, the counters grow, and the commission's
    /// net amount lands in the pending or paid bucket. Returns None when the
    /// customer never signed up through an invite.
    pub async fn record_investment(
        &self,
        customer_id: &str,
        investment_amount: i64,
        accrual: CommissionAccrual,
    ) -> AppResult<Option<SignupRecord>> {
        let result = sqlx::query(
            "UPDATE signups SET \
             status = ?1, \
             investment_count = investment_count + 1, \
             total_invested = total_invested + ?2, \
             commission_pending = commission_pending + ?3, \
             commission_paid = commission_paid + ?4, \
             updated_at = ?5 \
             WHERE customer_id = ?6",
        )
        .bind(status_to_db(SignupStatus::Invested))
        .bind(investment_amount)
        .bind(accrual.pending)
        .bind(accrual.paid)
        .bind(Utc::now().to_rfc3339())
        .bind(customer_id)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::Storage(format!("failed to record investment: {e}")))?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }
        self.get(customer_id).await
    }
}

fn row_to_signup(row: sqlx::sqlite::SqliteRow) -> AppResult<SignupRecord> {
    let customer_id: String = row
        .try_get("customer_id")
        .map_err(|e| AppError::Storage(format!("read customer_id failed: {e}")))?;
    let cp_id: String = row
        .try_get("cp_id")
        .map_err(|e| AppError::Storage(format!("read cp_id failed: {e}")))?;
    let status: String = row
        .try_get("status")
        .map_err(|e| AppError::Storage(format!("read status failed: {e}")))?;
    let investment_count: i64 = row
        .try_get("investment_count")
        .map_err(|e| AppError::Storage(format!("read investment_count failed: {e}")))?;
    let total_invested: i64 = row
        .try_get("total_invested")
        .map_err(|e| AppError::Storage(format!("read total_invested failed: {e}")))?;
    let commission_pending: i64 = row
        .try_get("commission_pending")
        .map_err(|e| AppError::Storage(format!("read commission_pending failed: {e}")))?;
    let commission_paid: i64 = row
        .try_get("commission_paid")
        .map_err(|e| AppError::Storage(format!("read commission_paid failed: {e}")))?;
    let signed_up_at: String = row
        .try_get("signed_up_at")
        .map_err(|e| AppError::Storage(format!("read signed_up_at failed: {e}")))?;
    let updated_at: String = row
        .try_get("updated_at")
        .map_err(|e| AppError::Storage(format!("read updated_at failed: {e}")))?;

    Ok(SignupRecord {
        customer_id,
        cp_id: parse_uuid(&cp_id, "cp_id")?,
        status: status_from_db(&status)?,
        investment_count,
        total_invested,
        commission_pending,
        commission_paid,
        signed_up_at: parse_timestamp(&signed_up_at, "signed_up_at")?,
        updated_at: parse_timestamp(&updated_at, "updated_at")?,
    })
}

pub(crate) fn status_to_db(status: SignupStatus) -> &'static str {
    match status {
        SignupStatus::SignedUp => "signed_up",
        SignupStatus::Invested => "invested",
    }
}

pub(crate) fn status_from_db(raw: &str) -> AppResult<SignupStatus> {
    match raw {
        "signed_up" => Ok(SignupStatus::SignedUp),
        "invested" => Ok(SignupStatus::Invested),
        _ => Err(AppError::Storage(format!("invalid signup status: {raw}"))),
    }
}

#[cfg(test)]
mod tests {
    use ps_common::types::SignupStatus;
    use sqlx::sqlite::SqlitePoolOptions;
    use uuid::Uuid;

    use crate::stores::partner::PartnerStore;

    use super::{CommissionAccrual, SignupStore};

    async fn test_pool() -> sqlx::SqlitePool {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .expect("pool");
        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .expect("migrate");
        pool
    }

    async fn seed_partner(pool: &sqlx::SqlitePool) -> Uuid {
        PartnerStore::new(pool.clone())
            .create("Skyline Realty", "SKY01", "ops@skyline.example")
            .await
            .expect("partner")
            .cp_id
    }

    #[tokio::test]
    async fn repeat_signup_is_idempotent() {
        let pool = test_pool().await;
        let cp_id = seed_partner(&pool).await;
        let store = SignupStore::new(pool);

        let (first, created) = store
            .create_if_absent("cust-1", cp_id)
            .await
            .expect("first signup");
        assert!(created);
        assert_eq!(first.status, SignupStatus::SignedUp);

        let (second, created) = store
            .create_if_absent("cust-1", cp_id)
            .await
            .expect("second signup");
        assert!(!created);
        assert_eq!(second.signed_up_at, first.signed_up_at);

        let all = store
            .list_for_partner(cp_id, None)
            .await
            .expect("list");
        assert_eq!(all.len(), 1);
    }

    #[tokio::test]
    async fn investment_transitions_and_accumulates() {
        let pool = test_pool().await;
        let cp_id = seed_partner(&pool).await;
        let store = SignupStore::new(pool);
        store
            .create_if_absent("cust-1", cp_id)
            .await
            .expect("signup");

        let updated = store
            .record_investment(
                "cust-1",
                100_000,
                CommissionAccrual {
                    pending: 4_500,
                    paid: 0,
                },
            )
            .await
            .expect("invest")
            .expect("signup exists");
        assert_eq!(updated.status, SignupStatus::Invested);
        assert_eq!(updated.investment_count, 1);
        assert_eq!(updated.total_invested, 100_000);
        assert_eq!(updated.commission_pending, 4_500);

        let again = store
            .record_investment(
                "cust-1",
                50_000,
                CommissionAccrual {
                    pending: 2_250,
                    paid: 0,
                },
            )
            .await
            .expect("invest again")
            .expect("signup exists");
        assert_eq!(again.status, SignupStatus::Invested);
        assert_eq!(again.investment_count, 2);
        assert_eq!(again.total_invested, 150_000);
        assert_eq!(again.commission_pending, 6_750);
    }

    #[tokio::test]
    async fn investment_without_signup_is_not_an_error() {
        let pool = test_pool().await;
        seed_partner(&pool).await;
        let store = SignupStore::new(pool);

        let outcome = store
            .record_investment("cust-unreferred", 25_000, CommissionAccrual::default())
            .await
            .expect("invest");
        assert!(outcome.is_none());
    }

    #[tokio::test]
    async fn status_filter_narrows_partner_listing() {
        let pool = test_pool().await;
        let cp_id = seed_partner(&pool).await;
        let store = SignupStore::new(pool);

        store
            .create_if_absent("cust-1", cp_id)
            .await
            .expect("signup 1");
        store
            .create_if_absent("cust-2", cp_id)
            .await
            .expect("signup 2");
        store
            .record_investment("cust-2", 10_000, CommissionAccrual::default())
            .await
            .expect("invest");

        let invested = store
            .list_for_partner(cp_id, Some(SignupStatus::Invested))
            .await
            .expect("list invested");
        assert_eq!(invested.len(), 1);
        assert_eq!(invested[0].customer_id, "cust-2");
    }
}
