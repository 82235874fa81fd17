use axum::body::{Body, Bytes};
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use tracing::{error, info};

use crate::bot::{self, Update};
use crate::error::Error;
use crate::AppState;

pub const SIGNATURE_HEADER: &str = "x-gift-roulette-signature";

/// Entry point for platform-pushed updates. The raw body must carry a valid
/// HMAC-SHA256 hex signature in the signature header. Rejections of the
/// request itself answer inline; dispatch failures surface as [`Error`].
#[axum::debug_handler]
pub async fn webhook_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<(StatusCode, String), Error> {
    let signature = match headers.get(SIGNATURE_HEADER).and_then(|h| h.to_str().ok()) {
        Some(s) => s,
        None => return Ok((StatusCode::BAD_REQUEST, "Missing signature header".to_string())),
    };

    if !verify_webhook_signature(&body, signature, &state.webhook_secret) {
        return Ok((StatusCode::UNAUTHORIZED, "Invalid webhook signature".to_string()));
    }

    let update: Update = match serde_json::from_slice(&body) {
        Ok(u) => u,
        Err(e) => return Ok((StatusCode::BAD_REQUEST, format!("Invalid payload: {}", e))),
    };

    info!("Received update {}", update.update_id);

    if let Err(e) = bot::dispatch(&state, update).await {
        error!("Dispatch failed: {}", e);
        return Err(e);
    }

    Ok((StatusCode::OK, "OK".to_string()))
}

pub async fn health_check() -> impl IntoResponse {
    Response::builder()
        .status(200)
        .body(Body::from("OK"))
        .unwrap()
}

fn verify_webhook_signature(payload: &[u8], signature: &str, secret: &str) -> bool {
    type HmacSha256 = Hmac<Sha256>;

    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .expect("HMAC can take key of any size");

    mac.update(payload);

    if let Ok(sig_bytes) = hex::decode(signature) {
        mac.verify_slice(&sig_bytes).is_ok()
    } else {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sign(payload: &[u8], secret: &str) -> String {
        type HmacSha256 = Hmac<Sha256>;
        let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).unwrap();
        mac.update(payload);
        hex::encode(mac.finalize().into_bytes())
    }

    #[test]
    fn signature_verification_round_trip() {
        let payload = br#"{"update_id":1}"#;
        let signature = sign(payload, "secret");
        assert!(verify_webhook_signature(payload, &signature, "secret"));
        assert!(!verify_webhook_signature(payload, &signature, "other-secret"));
        assert!(!verify_webhook_signature(b"tampered", &signature, "secret"));
        assert!(!verify_webhook_signature(payload, "not-hex", "secret"));
    }

    #[tokio::test]
    async fn webhook_rejects_missing_and_bad_signatures() {
        let (state, _platform) = crate::bot::testing::test_state(vec![]).await;
        let body = Bytes::from_static(br#"{"update_id":1}"#);

        let (status, _) = webhook_handler(State(state.clone()), HeaderMap::new(), body.clone())
            .await
            .unwrap();
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let mut headers = HeaderMap::new();
        headers.insert(SIGNATURE_HEADER, "deadbeef".parse().unwrap());
        let (status, _) = webhook_handler(State(state), headers, body).await.unwrap();
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn signed_update_is_dispatched() {
        let (state, platform) = crate::bot::testing::test_state(vec![]).await;
        let body = br#"{"update_id":7,"message":{"from":{"id":1,"username":"alice","first_name":"Alice"},"text":"/start"}}"#;
        let mut headers = HeaderMap::new();
        headers.insert(
            SIGNATURE_HEADER,
            sign(body, "test-secret").parse().unwrap(),
        );

        let (status, _) = webhook_handler(State(state), headers, Bytes::from_static(body))
            .await
            .unwrap();

        assert_eq!(status, StatusCode::OK);
        assert!(platform.texts_to(1).iter().any(|t| t.contains("Gift Roulette")));
    }

    #[tokio::test]
    async fn malformed_payload_is_a_bad_request() {
        let (state, _platform) = crate::bot::testing::test_state(vec![]).await;
        let body = b"not json";
        let mut headers = HeaderMap::new();
        headers.insert(
            SIGNATURE_HEADER,
            sign(body, "test-secret").parse().unwrap(),
        );

        let (status, _) = webhook_handler(State(state), headers, Bytes::from_static(body))
            .await
            .unwrap();
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn dispatch_failure_answers_with_a_server_error() {
        let (state, _platform) = crate::bot::testing::test_state(vec![]).await;
        sqlx::query("DROP TABLE users")
            .execute(&state.pool)
            .await
            .unwrap();

        let body = br#"{"update_id":9,"message":{"from":{"id":1,"username":"alice","first_name":"Alice"},"text":"/start"}}"#;
        let mut headers = HeaderMap::new();
        headers.insert(
            SIGNATURE_HEADER,
            sign(body, "test-secret").parse().unwrap(),
        );

        let err = webhook_handler(State(state), headers, Bytes::from_static(body))
            .await
            .unwrap_err();
        assert_eq!(err.into_response().status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
