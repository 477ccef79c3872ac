//! Rollups over ledger and attribution state. Always recomputed from the
//! records handed in; nothing here is cached or persisted.

use ps_common::api::{CommissionStatsResponse, ReferralStatsResponse};
use ps_common::types::{CommissionStatus, SignupStatus};

use crate::stores::commission::CommissionRecord;
use crate::stores::signup::SignupRecord;

pub fn commission_stats(commissions: &[CommissionRecord]) -> CommissionStatsResponse {
    let mut stats = CommissionStatsResponse {
        total_count: commissions.len() as u64,
        ..Default::default()
    };

    for c in commissions {
        match c.status {
            CommissionStatus::Pending => {
                stats.pending_count += 1;
                stats.pending_net_amount += c.net_amount;
            }
            CommissionStatus::Approved => {
                stats.approved_count += 1;
                stats.approved_net_amount += c.net_amount;
            }
            CommissionStatus::Paid => {
                stats.paid_count += 1;
                stats.paid_net_amount += c.net_amount;
            }
            CommissionStatus::Cancelled => {}
        }
    }
    stats
}

pub fn referral_stats(signups: &[SignupRecord]) -> ReferralStatsResponse {
    let total_signups = signups.len() as u64;
    let invested_customers = signups
        .iter()
        .filter(|s| s.status == SignupStatus::Invested)
        .count() as u64;

    let conversion_rate = if total_signups == 0 {
        0.0
    } else {
        let rate = invested_customers as f64 / total_signups as f64 * 100.0;
        (rate * 100.0).round() / 100.0
    };

    let mut stats = ReferralStatsResponse {
        total_signups,
        invested_customers,
        conversion_rate,
        ..Default::default()
    };
    for s in signups {
        stats.total_investment += s.total_invested;
        stats.commission_paid += s.commission_paid;
        stats.commission_pending += s.commission_pending;
    }
    stats.total_commission = stats.commission_paid + stats.commission_pending;
    stats
}
