use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use ps_common::api::SignupRequest;
use ps_common::error::ErrorBody;

use crate::routes::error_response;
use crate::state::AppState;
use crate::stores::signup::SignupRecord;

/// A customer arrived through an invite link and registered. Retries and
/// repeat visits resolve to the same signup record.
pub async fn signup(
    State(state): State<AppState>,
    Json(payload): Json<SignupRequest>,
) -> Result<Json<SignupRecord>, (StatusCode, Json<ErrorBody>)> {
    let record = state
        .referral
        .record_signup(&payload.invite_code, &payload.customer_id)
        .await
        .map_err(error_response)?;
    Ok(Json(record))
}

#[cfg(test)]
mod tests {
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use crate::routes::testing::test_app;

    #[tokio::test]
    async fn signup_through_invite_is_idempotent() {
        let app = test_app().await;

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
                            "code": "SKY01",
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
        let invite_code = partner["invite_code"].as_str().expect("invite_code");

        for _ in 0..2 {
            let response = app
                .clone()
                .oneshot(
                    Request::builder()
                        .method("POST")
                        .uri("/api/v1/referrals/signup")
                        .header("content-type", "application/json")
                        .body(Body::from(
                            json!({"invite_code": invite_code, "customer_id": "cust-1"})
                                .to_string(),
                        ))
                        .expect("request"),
                )
                .await
                .expect("signup response");
            assert_eq!(response.status(), StatusCode::OK);
            let body = axum::body::to_bytes(response.into_body(), usize::MAX)
                .await
                .expect("body");
            let json: Value = serde_json::from_slice(&body).expect("json");
            assert_eq!(json["status"], "signed_up");
            assert_eq!(json["customer_id"], "cust-1");
        }

        let cp_id = partner["cp_id"].as_str().expect("cp_id");
        let listing = app
            .oneshot(
                Request::builder()
                    .uri(format!("/api/v1/partners/{cp_id}/signups"))
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("listing response");
        let body = axum::body::to_bytes(listing.into_body(), usize::MAX)
            .await
            .expect("body");
        let json: Value = serde_json::from_slice(&body).expect("json");
        assert_eq!(json.as_array().expect("array").len(), 1);
    }

    #[tokio::test]
    async fn unknown_invite_code_is_404_with_distinct_code() {
        let app = test_app().await;

        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/v1/referrals/signup")
                    .header("content-type", "application/json")
                    .body(Body::from(
                        json!({"invite_code": "deadbeef", "customer_id": "cust-1"}).to_string(),
                    ))
                    .expect("request"),
            )
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body");
        let json: Value = serde_json::from_slice(&body).expect("json");
        assert_eq!(json["code"], "invalid_invite_code");
    }
}
