use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use ps_common::api::{BulkPayoutRequest, BulkPayoutResponse, PayoutRequest};
use ps_common::error::ErrorBody;

use crate::routes::{error_response, parse_uuid_param};
use crate::state::AppState;
use crate::stores::commission::CommissionRecord;

pub async fn payout_single(
    Path(commission_id): Path<String>,
    State(state): State<AppState>,
    Json(payload): Json<PayoutRequest>,
) -> Result<Json<CommissionRecord>, (StatusCode, Json<ErrorBody>)> {
    let commission_id = parse_uuid_param(&commission_id, "commission_id")?;
    let record = state
        .payout
        .payout_single(commission_id, &payload.payment_reference)
        .await
        .map_err(error_response)?;
    Ok(Json(record))
}

pub async fn payout_bulk(
    State(state): State<AppState>,
    Json(payload): Json<BulkPayoutRequest>,
) -> Result<Json<BulkPayoutResponse>, (StatusCode, Json<ErrorBody>)> {
    let outcome = state
        .payout
        .payout_bulk(&payload.commission_ids, &payload.payment_reference)
        .await
        .map_err(error_response)?;
    Ok(Json(BulkPayoutResponse {
        paid_count: outcome.paid_count,
        total_net_amount: outcome.total_net_amount,
    }))
}

#[cfg(test)]
mod tests {
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use crate::routes::testing::test_app;

    async fn seed_commission(app: &axum::Router, code: &str, investment_id: &str) -> String {
        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/v1/partners")
                    .header("content-type", "application/json")
                    .body(Body::from(
                        json!({
                            "name": "Skyline Realty",
                            "code": code,
                            "email": "ops@skyline.example"
                        })
                        .to_string(),
                    ))
                    .expect("request"),
            )
            .await
            .expect("partner response");
        assert_eq!(response.status(), StatusCode::OK);
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body");
        let partner: Value = serde_json::from_slice(&body).expect("json");
        let cp_id = partner["cp_id"].as_str().expect("cp_id");

        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/v1/commissions")
                    .header("content-type", "application/json")
                    .body(Body::from(
                        json!({
                            "investment_id": investment_id,
                            "cp_id": cp_id,
                            "customer_id": "cust-7",
                            "base_amount": 100_000,
                            "commission_rate": 5.0
                        })
                        .to_string(),
                    ))
                    .expect("request"),
            )
            .await
            .expect("commission response");
        assert_eq!(response.status(), StatusCode::OK);
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body");
        let commission: Value = serde_json::from_slice(&body).expect("json");
        commission["commission_id"].as_str().expect("id").to_string()
    }

    async fn approve(app: &axum::Router, id: &str) {
        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri(format!("/api/v1/commissions/{id}/approve"))
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("approve response");
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn single_payout_happy_path_and_blank_reference() {
        let app = test_app().await;
        let id = seed_commission(&app, "SKY01", "inv-1001").await;
        approve(&app, &id).await;

        let blank = app
            .clone()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri(format!("/api/v1/commissions/{id}/payout"))
                    .header("content-type", "application/json")
                    .body(Body::from(json!({"payment_reference": "  "}).to_string()))
                    .expect("request"),
            )
            .await
            .expect("blank response");
        assert_eq!(blank.status(), StatusCode::BAD_REQUEST);

        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri(format!("/api/v1/commissions/{id}/payout"))
                    .header("content-type", "application/json")
                    .body(Body::from(
                        json!({"payment_reference": "UTR-2026-0001"}).to_string(),
                    ))
                    .expect("request"),
            )
            .await
            .expect("payout response");
        assert_eq!(response.status(), StatusCode::OK);
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body");
        let json: Value = serde_json::from_slice(&body).expect("json");
        assert_eq!(json["status"], "paid");
        assert_eq!(json["payment_reference"], "UTR-2026-0001");
    }

    #[tokio::test]
    async fn single_payout_from_pending_conflicts() {
        let app = test_app().await;
        let id = seed_commission(&app, "SKY01", "inv-1001").await;

        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri(format!("/api/v1/commissions/{id}/payout"))
                    .header("content-type", "application/json")
                    .body(Body::from(
                        json!({"payment_reference": "UTR-2026-0002"}).to_string(),
                    ))
                    .expect("request"),
            )
            .await
            .expect("payout response");
        assert_eq!(response.status(), StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn bulk_payout_settles_whole_batch() {
        let app = test_app().await;
        let a = seed_commission(&app, "SKY01", "inv-1001").await;
        let b = seed_commission(&app, "SKY02", "inv-2002").await;
        approve(&app, &a).await;
        approve(&app, &b).await;

        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/v1/payouts/bulk")
                    .header("content-type", "application/json")
                    .body(Body::from(
                        json!({
                            "commission_ids": [a, b],
                            "payment_reference": "BATCH-2026-07"
                        })
                        .to_string(),
                    ))
                    .expect("request"),
            )
            .await
            .expect("bulk response");
        assert_eq!(response.status(), StatusCode::OK);
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body");
        let json: Value = serde_json::from_slice(&body).expect("json");
        assert_eq!(json["paid_count"], 2);
        assert_eq!(json["total_net_amount"], 9_000);
    }

    #[tokio::test]
    async fn bulk_payout_with_unapproved_member_changes_nothing() {
        let app = test_app().await;
        let a = seed_commission(&app, "SKY01", "inv-1001").await;
        let b = seed_commission(&app, "SKY02", "inv-2002").await;
        approve(&app, &a).await;
        // b stays pending

        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/v1/payouts/bulk")
                    .header("content-type", "application/json")
                    .body(Body::from(
                        json!({
                            "commission_ids": [a, b],
                            "payment_reference": "BATCH-2026-08"
                        })
                        .to_string(),
                    ))
                    .expect("request"),
            )
            .await
            .expect("bulk response");
        assert_eq!(response.status(), StatusCode::CONFLICT);
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body");
        let json: Value = serde_json::from_slice(&body).expect("json");
        assert_eq!(json["code"], "bulk_payout_blocked");
        assert!(json["message"].as_str().expect("message").contains(&b));

        let a_state = app
            .oneshot(
                Request::builder()
                    .uri(format!("/api/v1/commissions/{a}"))
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("get response");
        let body = axum::body::to_bytes(a_state.into_body(), usize::MAX)
            .await
            .expect("body");
        let json: Value = serde_json::from_slice(&body).expect("json");
        assert_eq!(json["status"], "approved");
        assert!(json["payment_reference"].is_null());
    }
}
