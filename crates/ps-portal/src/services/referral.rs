//! Referral attribution: permanent invites, signups, and the link from a
//! customer's investments back to the originating channel partner.

use ps_common::error::{AppError, AppResult};
use ps_common::types::CommissionStatus;
use sqlx::SqlitePool;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use crate::services::email::{is_valid_address, EmailDispatcher, OutboundEmail};
use crate::stores::commission::CommissionRecord;
use crate::stores::invite::InviteStore;
use crate::stores::partner::PartnerStore;
use crate::stores::signup::{CommissionAccrual, SignupRecord, SignupStore};

#[derive(Clone)]
pub struct ReferralService {
    pool: SqlitePool,
    invite_base_url: String,
    mailer: Arc<dyn EmailDispatcher>,
}

impl ReferralService {
    pub fn new(pool: SqlitePool, invite_base_url: String, mailer: Arc<dyn EmailDispatcher>) -> Self {
        Self {
            pool,
            invite_base_url,
            mailer,
        }
    }

    pub fn invite_link(&self, invite_code: &str) -> String {
        format!(
            "{}/{invite_code}",
            self.invite_base_url.trim_end_matches('/')
        )
    }

    /// Attribute a customer signup to the partner owning the invite code.
    /// Safe to retry: the same customer re-visiting any invite link gets the
    /// existing record back and nothing is written.
    pub async fn record_signup(
        &self,
        invite_code: &str,
        customer_id: &str,
    ) -> AppResult<SignupRecord> {
        let customer_id = customer_id.trim();
        if customer_id.is_empty() {
            return Err(AppError::validation("customer_id", "must not be blank"));
        }

        let invite = InviteStore::new(self.pool.clone())
            .resolve(invite_code)
            .await?
            .ok_or(AppError::InvalidInviteCode)?;

        let (signup, created) = SignupStore::new(self.pool.clone())
            .create_if_absent(customer_id, invite.cp_id)
            .await?;
        if created {
            info!(customer_id, cp_id = %invite.cp_id, "referral signup recorded");
        }
        Ok(signup)
    }

    /// Fold one investment and its generated commission into the customer's
    /// signup. A customer who never came through an invite link simply has
    /// no signup; that is a normal investment, not an error.
    pub async fn record_investment(
        &self,
        customer_id: &str,
        investment_amount: i64,
        commission: &CommissionRecord,
    ) -> AppResult<Option<SignupRecord>> {
        let store = SignupStore::new(self.pool.clone());
        let Some(signup) = store.get(customer_id).await? else {
            return Ok(None);
        };

        // Commission earnings only accrue to the partner the signup is
        // attributed to.
        let accrual = if signup.cp_id == commission.cp_id {
            match commission.status {
                CommissionStatus::Paid => CommissionAccrual {
                    pending: 0,
                    paid: commission.net_amount,
                },
                CommissionStatus::Cancelled => CommissionAccrual::default(),
                _ => CommissionAccrual {
                    pending: commission.net_amount,
                    paid: 0,
                },
            }
        } else {
            CommissionAccrual::default()
        };

        let updated = store
            .record_investment(customer_id, investment_amount, accrual)
            .await?;
        if updated.is_some() {
            info!(
                customer_id,
                investment_amount,
                cp_id = %signup.cp_id,
                "referral conversion recorded"
            );
        }
        Ok(updated)
    }

    /// Send the partner's invite link to an address. Only the address syntax
    /// is checked here; delivery is the dispatcher's concern.
    pub async fn send_invite_email(&self, cp_id: Uuid, recipient: &str) -> AppResult<()> {
        let recipient = recipient.trim();
        if !is_valid_address(recipient) {
            return Err(AppError::validation(
                "recipient",
                "must be a valid email address",
            ));
        }

        let partner = PartnerStore::new(self.pool.clone())
            .get(cp_id)
            .await?
            .ok_or(AppError::NotFound)?;
        let invite = InviteStore::new(self.pool.clone())
            .get_for_partner(cp_id)
            .await?
            .ok_or(AppError::NotFound)?;

        let link = self.invite_link(&invite.invite_code);
        self.mailer
            .send(OutboundEmail {
                recipient: recipient.to_string(),
                subject: format!("{} invited you to invest", partner.name),
                body: format!(
                    "{} has invited you to start investing in fractional real estate. \
                     Sign up with their link: {link}",
                    partner.name
                ),
            })
            .await?;

        info!(recipient, cp_id = %cp_id, "invite email dispatched");
        Ok(())
    }
}
