pub mod calculator;
pub mod commissions;
pub mod health;
pub mod partners;
pub mod payouts;
pub mod referrals;

use axum::http::StatusCode;
use axum::{Json, Router};
use ps_common::error::{AppError, ErrorBody};

use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", axum::routing::get(health::health))
        .route(
            "/api/v1/commissions",
            axum::routing::post(commissions::create).get(commissions::list),
        )
        .route(
            "/api/v1/commissions/stats",
            axum::routing::get(commissions::stats),
        )
        .route(
            "/api/v1/commissions/{commission_id}",
            axum::routing::get(commissions::get),
        )
        .route(
            "/api/v1/commissions/{commission_id}/approve",
            axum::routing::post(commissions::approve),
        )
        .route(
            "/api/v1/commissions/{commission_id}/cancel",
            axum::routing::post(commissions::cancel),
        )
        .route(
            "/api/v1/commissions/{commission_id}/payout",
            axum::routing::post(payouts::payout_single),
        )
        .route(
            "/api/v1/payouts/bulk",
            axum::routing::post(payouts::payout_bulk),
        )
        .route(
            "/api/v1/partners",
            axum::routing::post(partners::register).get(partners::list),
        )
        .route(
            "/api/v1/partners/{cp_id}/invite",
            axum::routing::get(partners::invite),
        )
        .route(
            "/api/v1/partners/{cp_id}/invite/email",
            axum::routing::post(partners::invite_email),
        )
        .route(
            "/api/v1/partners/{cp_id}/signups",
            axum::routing::get(partners::signups),
        )
        .route(
            "/api/v1/referrals/signup",
            axum::routing::post(referrals::signup),
        )
        .route(
            "/api/v1/calculator/returns",
            axum::routing::get(calculator::returns),
        )
        .with_state(state)
}

pub(crate) fn error_response(err: AppError) -> (StatusCode, Json<ErrorBody>) {
    (err.status_code(), Json(err.to_error_body()))
}

pub(crate) fn parse_uuid_param(
    raw: &str,
    field: &str,
) -> Result<uuid::Uuid, (StatusCode, Json<ErrorBody>)> {
    uuid::Uuid::parse_str(raw)
        .map_err(|_| error_response(AppError::validation(field, "must be a uuid")))
}
