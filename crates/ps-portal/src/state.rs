use ps_common::config::PortalConfig;
use sqlx::SqlitePool;

use crate::services::payout::PayoutService;
use crate::services::referral::ReferralService;

#[derive(Clone)]
pub struct AppState {
    pub config: PortalConfig,
    pub db_pool: SqlitePool,
    pub referral: ReferralService,
    pub payout: PayoutService,
}

impl AppState {
    pub fn new(
        config: PortalConfig,
        db_pool: SqlitePool,
        referral: ReferralService,
        payout: PayoutService,
    ) -> Self {
        Self {
            config,
            db_pool,
            referral,
            payout,
        }
    }
}
