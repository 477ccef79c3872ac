use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HealthResponse {
    pub ok: bool,
    pub version: String,
}

/// Commission source event: one investment attributed to one channel partner.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CommissionEventRequest {
    pub investment_id: String,
    pub cp_id: Uuid,
    pub customer_id: String,
    pub base_amount: i64,
    pub commission_rate: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PayoutRequest {
    pub payment_reference: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BulkPayoutRequest {
    pub commission_ids: Vec<Uuid>,
    pub payment_reference: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BulkPayoutResponse {
    pub paid_count: u64,
    pub total_net_amount: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RegisterPartnerRequest {
    pub name: String,
    pub code: String,
    pub email: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RegisterPartnerResponse {
    pub cp_id: Uuid,
    pub invite_code: String,
    pub invite_link: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SignupRequest {
    pub invite_code: String,
    pub customer_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct InviteEmailRequest {
    pub recipient: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct InviteResponse {
    pub invite_code: String,
    pub invite_link: String,
    pub stats: ReferralStatsResponse,
}

/// Per-status rollup over the commission ledger. `total_count` spans all
/// statuses, cancelled included.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct CommissionStatsResponse {
    pub pending_count: u64,
    pub pending_net_amount: i64,
    pub approved_count: u64,
    pub approved_net_amount: i64,
    pub paid_count: u64,
    pub paid_net_amount: i64,
    pub total_count: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct ReferralStatsResponse {
    pub total_signups: u64,
    pub invested_customers: u64,
    /// Percentage of signups that invested, rounded to two decimals.
    pub conversion_rate: f64,
    pub total_investment: i64,
    pub total_commission: i64,
    pub commission_paid: i64,
    pub commission_pending: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReturnsQuery {
    pub amount: f64,
    pub launch_price: f64,
    pub current_price: f64,
}
