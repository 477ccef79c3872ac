use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use ps_common::api::{
    InviteEmailRequest, InviteResponse, RegisterPartnerRequest, RegisterPartnerResponse,
};
use ps_common::error::{AppError, ErrorBody};
use ps_common::types::SignupStatus;
use serde::Deserialize;
use tracing::info;

use crate::routes::{error_response, parse_uuid_param};
use crate::services::email::is_valid_address;
use crate::services::stats::referral_stats;
use crate::state::AppState;
use crate::stores::invite::InviteStore;
use crate::stores::partner::{PartnerRecord, PartnerStore};
use crate::stores::signup::{SignupRecord, SignupStore};

#[derive(Debug, Clone, Deserialize)]
pub struct SignupsQuery {
    pub status: Option<String>,
}

/// Register a channel partner. The permanent invite is issued in the same
/// request; partners never exist without one.
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterPartnerRequest>,
) -> Result<Json<RegisterPartnerResponse>, (StatusCode, Json<ErrorBody>)> {
    if payload.name.trim().is_empty() {
        return Err(error_response(AppError::validation(
            "name",
            "must not be blank",
        )));
    }
    if payload.code.trim().is_empty() {
        return Err(error_response(AppError::validation(
            "code",
            "must not be blank",
        )));
    }
    if !is_valid_address(payload.email.trim()) {
        return Err(error_response(AppError::validation(
            "email",
            "must be a valid email address",
        )));
    }

    let partners = PartnerStore::new(state.db_pool.clone());
    let partner = partners
        .create(payload.name.trim(), &payload.code, payload.email.trim())
        .await
        .map_err(error_response)?;

    let invites = InviteStore::new(state.db_pool.clone());
    let invite = invites.issue(partner.cp_id).await.map_err(error_response)?;

    info!(cp_id = %partner.cp_id, code = %partner.code, "partner registered");
    Ok(Json(RegisterPartnerResponse {
        cp_id: partner.cp_id,
        invite_link: state.referral.invite_link(&invite.invite_code),
        invite_code: invite.invite_code,
    }))
}

pub async fn list(
    State(state): State<AppState>,
) -> Result<Json<Vec<PartnerRecord>>, (StatusCode, Json<ErrorBody>)> {
    let items = PartnerStore::new(state.db_pool.clone())
        .list()
        .await
        .map_err(error_response)?;
    Ok(Json(items))
}

/// A partner's permanent invite with its referral stats, recomputed from
/// current signup state on every read.
pub async fn invite(
    Path(cp_id): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<InviteResponse>, (StatusCode, Json<ErrorBody>)> {
    let cp_id = parse_uuid_param(&cp_id, "cp_id")?;

    let invite = InviteStore::new(state.db_pool.clone())
        .get_for_partner(cp_id)
        .await
        .map_err(error_response)?
        .ok_or_else(|| error_response(AppError::NotFound))?;

    let signups = SignupStore::new(state.db_pool.clone())
        .list_for_partner(cp_id, None)
        .await
        .map_err(error_response)?;

    Ok(Json(InviteResponse {
        invite_link: state.referral.invite_link(&invite.invite_code),
        invite_code: invite.invite_code,
        stats: referral_stats(&signups),
    }))
}

pub async fn signups(
    Path(cp_id): Path<String>,
    State(state): State<AppState>,
    Query(query): Query<SignupsQuery>,
) -> Result<Json<Vec<SignupRecord>>, (StatusCode, Json<ErrorBody>)> {
    let cp_id = parse_uuid_param(&cp_id, "cp_id")?;
    let status = query.status.as_deref().and_then(status_from_string);

    let items = SignupStore::new(state.db_pool.clone())
        .list_for_partner(cp_id, status)
        .await
        .map_err(error_response)?;
    Ok(Json(items))
}

pub async fn invite_email(
    Path(cp_id): Path<String>,
    State(state): State<AppState>,
    Json(payload): Json<InviteEmailRequest>,
) -> Result<Json<serde_json::Value>, (StatusCode, Json<ErrorBody>)> {
    let cp_id = parse_uuid_param(&cp_id, "cp_id")?;
    state
        .referral
        .send_invite_email(cp_id, &payload.recipient)
        .await
        .map_err(error_response)?;
    Ok(Json(serde_json::json!({"status": "sent"})))
}

fn status_from_string(raw: &str) -> Option<SignupStatus> {
    match raw {
        "signed_up" => Some(SignupStatus::SignedUp),
        "invested" => Some(SignupStatus::Invested),
        _ => None,
    }
}
