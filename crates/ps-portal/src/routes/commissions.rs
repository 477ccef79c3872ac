use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use ps_common::api::{CommissionEventRequest, CommissionStatsResponse};
use ps_common::error::{AppError, ErrorBody};
use ps_common::money::commission_breakdown;
use ps_common::types::CommissionStatus;
use serde::Deserialize;
use tracing::info;

use crate::routes::{error_response, parse_uuid_param};
use crate::state::AppState;
use crate::stores::commission::{CommissionRecord, CommissionStore, NewCommission};
use crate::stores::partner::PartnerStore;

#[derive(Debug, Clone, Deserialize)]
pub struct CommissionsQuery {
    pub status: Option<String>,
    pub q: Option<String>,
}

/// Commission source event: an investment closed and the sourcing partner's
/// entitlement is recorded as pending. The customer's referral signup, if
/// any, converts in the same request.
pub async fn create(
    State(state): State<AppState>,
    Json(payload): Json<CommissionEventRequest>,
) -> Result<Json<CommissionRecord>, (StatusCode, Json<ErrorBody>)> {
    if payload.investment_id.trim().is_empty() {
        return Err(error_response(AppError::validation(
            "investment_id",
            "must not be blank",
        )));
    }
    if payload.customer_id.trim().is_empty() {
        return Err(error_response(AppError::validation(
            "customer_id",
            "must not be blank",
        )));
    }

    let partners = PartnerStore::new(state.db_pool.clone());
    partners
        .get(payload.cp_id)
        .await
        .map_err(error_response)?
        .ok_or_else(|| error_response(AppError::NotFound))?;

    let breakdown = commission_breakdown(
        payload.base_amount,
        payload.commission_rate,
        state.config.tds_rate_percent,
    )
    .map_err(error_response)?;

    let store = CommissionStore::new(state.db_pool.clone());
    let commission = store
        .create(NewCommission {
            investment_id: payload.investment_id.clone(),
            cp_id: payload.cp_id,
            customer_id: payload.customer_id.clone(),
            base_amount: payload.base_amount,
            commission_rate: payload.commission_rate,
            breakdown,
        })
        .await
        .map_err(error_response)?;

    state
        .referral
        .record_investment(&payload.customer_id, payload.base_amount, &commission)
        .await
        .map_err(error_response)?;

    info!(
        commission_id = %commission.commission_id,
        cp_id = %commission.cp_id,
        net_amount = commission.net_amount,
        "commission recorded"
    );
    Ok(Json(commission))
}

pub async fn list(
    State(state): State<AppState>,
    Query(query): Query<CommissionsQuery>,
) -> Result<Json<Vec<CommissionRecord>>, (StatusCode, Json<ErrorBody>)> {
    let status = query.status.as_deref().and_then(status_from_string);
    let store = CommissionStore::new(state.db_pool.clone());
    let items = store
        .list(status, query.q.as_deref())
        .await
        .map_err(error_response)?;
    Ok(Json(items))
}

pub async fn stats(
    State(state): State<AppState>,
) -> Result<Json<CommissionStatsResponse>, (StatusCode, Json<ErrorBody>)> {
    let store = CommissionStore::new(state.db_pool.clone());
    let all = store.list(None, None).await.map_err(error_response)?;
    Ok(Json(crate::services::stats::commission_stats(&all)))
}

pub async fn get(
    Path(commission_id): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<CommissionRecord>, (StatusCode, Json<ErrorBody>)> {
    let commission_id = parse_uuid_param(&commission_id, "commission_id")?;
    let store = CommissionStore::new(state.db_pool.clone());
    let maybe = store.get(commission_id).await.map_err(error_response)?;
    match maybe {
        Some(record) => Ok(Json(record)),
        None => Err(error_response(AppError::NotFound)),
    }
}

pub async fn approve(
    Path(commission_id): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<CommissionRecord>, (StatusCode, Json<ErrorBody>)> {
    let commission_id = parse_uuid_param(&commission_id, "commission_id")?;
    let store = CommissionStore::new(state.db_pool.clone());
    let record = store.approve(commission_id).await.map_err(error_response)?;
    Ok(Json(record))
}

pub async fn cancel(
    Path(commission_id): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<CommissionRecord>, (StatusCode, Json<ErrorBody>)> {
    let commission_id = parse_uuid_param(&commission_id, "commission_id")?;
    let store = CommissionStore::new(state.db_pool.clone());
    let record = store.cancel(commission_id).await.map_err(error_response)?;
    Ok(Json(record))
}

fn status_from_string(raw: &str) -> Option<CommissionStatus> {
    match raw {
        "pending" => Some(CommissionStatus::Pending),
        "approved" => Some(CommissionStatus::Approved),
        "paid" => Some(CommissionStatus::Paid),
        "cancelled" => Some(CommissionStatus::Cancelled),
        _ => None,
    }
}
