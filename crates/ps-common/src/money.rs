use crate::error::{AppError, AppResult};
use serde::Serialize;

pub const DEFAULT_TDS_RATE_PERCENT: f64 = 10.0;

/// Gross commission, tax withholding, and the net payable remainder.
/// Amounts are whole currency units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CommissionBreakdown {
    pub commission_amount: i64,
    pub tds_amount: i64,
    pub net_amount: i64,
}

/// Derive the commission breakdown for a base amount at the given rates.
///
/// `commission_amount` and `tds_amount` are each rounded to the nearest
/// whole unit before `net_amount` is computed by subtraction; subtracting
/// first and rounding after would drift from reconciled totals.
pub fn commission_breakdown(
    base_amount: i64,
    rate_percent: f64,
    tds_rate_percent: f64,
) -> AppResult<CommissionBreakdown> {
    if base_amount < 0 {
        return Err(AppError::validation(
            "base_amount",
            "must be non-negative",
        ));
    }
    if !(0.0..=100.0).contains(&rate_percent) {
        return Err(AppError::validation(
            "commission_rate",
            "must be between 0 and 100",
        ));
    }
    if !(0.0..=100.0).contains(&tds_rate_percent) {
        return Err(AppError::validation(
            "tds_rate",
            "must be between 0 and 100",
        ));
    }

    let commission_amount = (base_amount as f64 * rate_percent / 100.0).round() as i64;
    let tds_amount = (commission_amount as f64 * tds_rate_percent / 100.0).round() as i64;

    Ok(CommissionBreakdown {
        commission_amount,
        tds_amount,
        net_amount: commission_amount - tds_amount,
    })
}

/// Valuation figures for the investment calculator.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct InvestmentReturns {
    pub current_value: f64,
    pub returns: f64,
    pub roi: f64,
    pub appreciation: f64,
}

impl InvestmentReturns {
    pub const ZERO: Self = Self {
        current_value: 0.0,
        returns: 0.0,
        roi: 0.0,
        appreciation: 0.0,
    };
}

/// Value an investment at today's unit price against its launch price.
/// Degrades to the all-zero result when either price is missing or
/// non-positive instead of dividing by zero.
pub fn investment_returns(
    investment_amount: f64,
    launch_price: f64,
    current_price: f64,
) -> InvestmentReturns {
    if launch_price <= 0.0 || current_price <= 0.0 {
        return InvestmentReturns::ZERO;
    }

    let units = investment_amount / launch_price;
    let current_value = units * current_price;
    let returns = current_value - investment_amount;
    let roi = if investment_amount > 0.0 {
        returns / investment_amount * 100.0
    } else {
        0.0
    };
    let appreciation = (current_price - launch_price) / launch_price * 100.0;

    InvestmentReturns {
        current_value,
        returns,
        roi,
        appreciation,
    }
}

#[cfg(test)]
mod tests {
    use super::{commission_breakdown, investment_returns, InvestmentReturns};

    #[test]
    fn breakdown_matches_rate_card() {
        let b = commission_breakdown(100_000, 5.0, 10.0).expect("breakdown");
        assert_eq!(b.commission_amount, 5_000);
        assert_eq!(b.tds_amount, 500);
        assert_eq!(b.net_amount, 4_500);
    }

    #[test]
    fn breakdown_rounds_each_amount_before_subtracting() {
        // 3% of 1234 = 37.02 -> 37; 10% of 37 = 3.7 -> 4; net = 33
        let b = commission_breakdown(1_234, 3.0, 10.0).expect("breakdown");
        assert_eq!(b.commission_amount, 37);
        assert_eq!(b.tds_amount, 4);
        assert_eq!(b.net_amount, 33);
    }

    #[test]
    fn breakdown_net_never_negative_at_full_withholding() {
        let b = commission_breakdown(99_999, 7.5, 100.0).expect("breakdown");
        assert_eq!(b.net_amount, 0);
    }

    #[test]
    fn breakdown_validates_inputs() {
        let err = commission_breakdown(-1, 5.0, 10.0).expect_err("negative base");
        assert!(err.to_string().contains("base_amount"));

        let err = commission_breakdown(1_000, 101.0, 10.0).expect_err("rate over 100");
        assert!(err.to_string().contains("commission_rate"));

        let err = commission_breakdown(1_000, 5.0, -2.0).expect_err("negative tds");
        assert!(err.to_string().contains("tds_rate"));
    }

    #[test]
    fn returns_track_unit_price_appreciation() {
        let r = investment_returns(50_000.0, 100.0, 125.0);
        assert_eq!(r.current_value, 62_500.0);
        assert_eq!(r.returns, 12_500.0);
        assert_eq!(r.roi, 25.0);
        assert_eq!(r.appreciation, 25.0);
    }

    #[test]
    fn returns_zero_out_on_missing_prices() {
        assert_eq!(investment_returns(50_000.0, 0.0, 125.0), InvestmentReturns::ZERO);
        assert_eq!(investment_returns(50_000.0, 100.0, 0.0), InvestmentReturns::ZERO);
    }
}
