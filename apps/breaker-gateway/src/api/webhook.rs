// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Webhook endpoint for tripping and resetting circuits.
//!
//! A call names a batch of message type URLs and one operation. The batch
//! goes to the chain client as a single call; the handler never splits it
//! or removes duplicates.

use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use std::fmt;

use serde::{
    de::{self, Visitor},
    Deserialize, Deserializer, Serialize,
};
use utoipa::ToSchema;

use crate::{
    breaker::{with_timeout, BreakerClientError},
    error::ApiError,
    state::AppState,
};

/// Body returned for every webhook call while the gateway runs in dry-run mode.
pub const DRY_RUN_MESSAGE: &str = "dry run, skipping transaction invocation";

/// Error message for operations other than trip and reset.
pub const UNSUPPORTED_MODE_MESSAGE: &str = "unsupported mode";

/// Operation applied to the circuit breaker.
///
/// Encoded on the wire as an integer: `0` trips, `1` resets. Any other
/// integer decodes to `Unknown` and is rejected before the chain is touched.
/// Integer literals beyond the `i64` range saturate into `Unknown`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(into = "i64")]
pub enum Mode {
    Trip,
    Reset,
    Unknown(i64),
}

impl Mode {
    /// Verb used in log lines and failure messages; `None` when unsupported.
    pub fn verb(&self) -> Option<&'static str> {
        match self {
            Mode::Trip => Some("trip"),
            Mode::Reset => Some("reset"),
            Mode::Unknown(_) => None,
        }
    }
}

impl From<i64> for Mode {
    fn from(value: i64) -> Self {
        match value {
            0 => Mode::Trip,
            1 => Mode::Reset,
            other => Mode::Unknown(other),
        }
    }
}

impl From<Mode> for i64 {
    fn from(mode: Mode) -> Self {
        match mode {
            Mode::Trip => 0,
            Mode::Reset => 1,
            Mode::Unknown(other) => other,
        }
    }
}

impl<'de> Deserialize<'de> for Mode {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_any(ModeVisitor)
    }
}

struct ModeVisitor;

impl<'de> Visitor<'de> for ModeVisitor {
    type Value = Mode;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("an integer operation")
    }

    fn visit_i64<E: de::Error>(self, value: i64) -> Result<Mode, E> {
        Ok(Mode::from(value))
    }

    fn visit_u64<E: de::Error>(self, value: u64) -> Result<Mode, E> {
        Ok(i64::try_from(value)
            .map(Mode::from)
            .unwrap_or(Mode::Unknown(i64::MAX)))
    }

    // serde_json hands integer literals below i64::MIN over as floats.
    fn visit_f64<E: de::Error>(self, value: f64) -> Result<Mode, E> {
        if value.is_finite() && value.fract() == 0.0 {
            if value >= 9_223_372_036_854_775_808.0 {
                return Ok(Mode::Unknown(i64::MAX));
            }
            if value <= -9_223_372_036_854_775_808.0 {
                return Ok(Mode::Unknown(i64::MIN));
            }
        }
        Err(E::invalid_type(de::Unexpected::Float(value), &self))
    }
}

/// The payload accepted by the v1 webhook.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct PayloadV1 {
    /// Reason for the call; logged, not interpreted.
    #[serde(rename = "Message", alias = "message")]
    pub message: String,
    /// Message type URLs to act on.
    #[serde(
        rename = "Urls",
        alias = "urls",
        default,
        deserialize_with = "null_as_empty"
    )]
    pub urls: Vec<String>,
    /// `0` to trip, `1` to reset.
    #[serde(rename = "Operation", alias = "operation", alias = "mode")]
    #[schema(value_type = i64)]
    pub operation: Mode,
}

/// Envelope returned once a webhook call reaches the chain client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct WebhookResponse {
    /// `"ok"` on success, otherwise the failure text.
    #[serde(rename = "Message", alias = "message")]
    pub message: String,
    #[serde(
        rename = "Urls",
        alias = "urls",
        default,
        deserialize_with = "null_as_empty"
    )]
    pub urls: Vec<String>,
    /// Transaction hash; empty when nothing was broadcast.
    #[serde(rename = "TxHash", alias = "txHash", alias = "tx_hash", default)]
    pub tx_hash: String,
    #[serde(rename = "Operation", alias = "operation", alias = "mode")]
    #[schema(value_type = i64)]
    pub operation: Mode,
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Vec<String>>::deserialize(deserializer)?.unwrap_or_default())
}

/// Trip or reset circuits for a batch of message type URLs.
///
/// Chain failures are reported inside a 200 envelope with an empty
/// `TxHash`; only malformed input, auth and missing configuration use
/// error statuses.
#[utoipa::path(
    post,
    path = "/v1/webhook",
    tag = "Webhook",
    security(("bearer_auth" = [])),
    request_body = PayloadV1,
    responses(
        (status = 200, description = "Call processed; inspect Message and TxHash", body = WebhookResponse),
        (status = 400, description = "Malformed payload or unsupported mode"),
        (status = 401, description = "Missing or invalid token"),
        (status = 500, description = "No breaker client configured")
    )
)]
pub async fn handle_webhook_v1(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Response, ApiError> {
    let payload: PayloadV1 =
        serde_json::from_slice(&body).map_err(|e| ApiError::bad_request(e.to_string()))?;

    let Some(verb) = payload.operation.verb() else {
        tracing::warn!(
            mode = i64::from(payload.operation),
            "Rejected webhook with unsupported mode"
        );
        return Err(ApiError::bad_request(UNSUPPORTED_MODE_MESSAGE));
    };

    tracing::info!(
        operation = verb,
        message = %payload.message,
        urls = ?payload.urls,
        dry_run = state.dry_run(),
        "Webhook received"
    );

    if state.dry_run() {
        return Ok(DRY_RUN_MESSAGE.into_response());
    }

    let client = state.breaker.as_ref().ok_or_else(ApiError::no_client)?;

    let call = match payload.operation {
        Mode::Trip => client.trip_circuit_breaker(&payload.urls),
        Mode::Reset => client.reset_circuit_breaker(&payload.urls),
        Mode::Unknown(_) => return Err(ApiError::bad_request(UNSUPPORTED_MODE_MESSAGE)),
    };
    let result = with_timeout(state.config.chain_call_timeout, call).await;

    match &result {
        Ok(tx_hash) => {
            tracing::info!(operation = verb, urls = ?payload.urls, %tx_hash, "Circuit updated")
        }
        Err(e) => {
            tracing::error!(operation = verb, urls = ?payload.urls, error = %e, "Circuit update failed")
        }
    }

    Ok(dispatch_outcome(verb, payload, result).into_response())
}

/// Build the response for a call that reached the chain client.
///
/// Both outcomes are answered with 200; this is the single place that
/// decides the status for chain results.
fn dispatch_outcome(
    verb: &str,
    payload: PayloadV1,
    result: Result<String, BreakerClientError>,
) -> (StatusCode, Json<WebhookResponse>) {
    let (message, tx_hash) = match result {
        Ok(tx_hash) => ("ok".to_string(), tx_hash),
        Err(e) => (format!("failed to {verb} circuit breaker {e}"), String::new()),
    };

    (
        StatusCode::OK,
        Json(WebhookResponse {
            message,
            urls: payload.urls,
            tx_hash,
            operation: payload.operation,
        }),
    )
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use axum::{body::{to_bytes, Body}, http::Request, Router};
    use serde_json::json;
    use tower::ServiceExt;

    use super::*;
    use crate::{api::router, breaker::mock::MockBreakerClient, config::GatewayConfig};

    const SECRET: &str = "password123";

    fn config() -> GatewayConfig {
        GatewayConfig::new(SECRET)
            .with_identifier_field("userId")
            .with_token_validity_secs(300)
    }

    fn app(config: GatewayConfig, client: Option<Arc<MockBreakerClient>>) -> (Router, String) {
        let mut state = AppState::new(config);
        if let Some(client) = client {
            state = state.with_breaker_client(client);
        }
        let token = state.tokens.issue("apiTest", None).unwrap();
        (router(state), token)
    }

    fn webhook_request(token: Option<&str>, body: serde_json::Value) -> Request<Body> {
        let mut builder = Request::builder().method("POST").uri("/v1/webhook");
        if let Some(token) = token {
            builder = builder.header("Authorization", format!("Bearer: {token}"));
        }
        builder.body(Body::from(body.to_string())).unwrap()
    }

    fn payload(urls: &[&str], mode: i64) -> serde_json::Value {
        json!({ "Message": "amount > 1000", "Urls": urls, "Operation": mode })
    }

    async fn body_string(response: Response) -> String {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn unsupported_mode_is_rejected_without_chain_call() {
        let client = Arc::new(MockBreakerClient::new());
        let (app, token) = app(config(), Some(client.clone()));

        for mode in [2, -1, 42] {
            let response = app
                .clone()
                .oneshot(webhook_request(Some(&token), payload(&["A"], mode)))
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::BAD_REQUEST);
            assert!(body_string(response).await.contains(UNSUPPORTED_MODE_MESSAGE));
        }
        assert_eq!(client.calls(), 0);
    }

    #[tokio::test]
    async fn unsupported_mode_is_rejected_even_in_dry_run() {
        let (app, token) = app(config().with_dry_run(true), None);
        let response = app
            .oneshot(webhook_request(Some(&token), payload(&["A"], 7)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn malformed_json_is_bad_request() {
        let client = Arc::new(MockBreakerClient::new());
        let (app, token) = app(config(), Some(client.clone()));

        let request = Request::builder()
            .method("POST")
            .uri("/v1/webhook")
            .header("Authorization", format!("Bearer: {token}"))
            .body(Body::from("{not json"))
            .unwrap();
        let response = app.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = app
            .oneshot(webhook_request(
                Some(&token),
                json!({ "Message": "m", "Urls": ["A"], "Operation": "trip" }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(client.calls(), 0);
    }

    #[tokio::test]
    async fn missing_or_bad_token_is_unauthorized() {
        let client = Arc::new(MockBreakerClient::new());
        let (app, _) = app(config(), Some(client.clone()));

        let response = app
            .clone()
            .oneshot(webhook_request(None, payload(&["A"], 0)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let response = app
            .clone()
            .oneshot(webhook_request(Some("garbage"), payload(&["A"], 0)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let foreign = crate::auth::TokenService::new("other-secret", Some("userId"), 300)
            .issue("apiTest", None)
            .unwrap();
        let response = app
            .oneshot(webhook_request(Some(&foreign), payload(&["A"], 0)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        assert_eq!(client.calls(), 0);
    }

    #[tokio::test]
    async fn token_without_identifier_claim_is_unauthorized() {
        let client = Arc::new(MockBreakerClient::new());
        let state = AppState::new(config()).with_breaker_client(client.clone());
        let token = state.tokens.issue("", None).unwrap();
        let app = router(state);

        let response = app
            .oneshot(webhook_request(Some(&token), payload(&["A"], 0)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(client.calls(), 0);
    }

    #[tokio::test]
    async fn dry_run_skips_chain_for_both_modes() {
        let client = Arc::new(MockBreakerClient::new());
        let (app, token) = app(config().with_dry_run(true), Some(client.clone()));

        for mode in [0, 1] {
            let response = app
                .clone()
                .oneshot(webhook_request(Some(&token), payload(&["A"], mode)))
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::OK);
            assert_eq!(body_string(response).await, DRY_RUN_MESSAGE);
        }
        assert_eq!(client.calls(), 0);
    }

    #[tokio::test]
    async fn dry_run_does_not_need_a_client() {
        let (app, token) = app(config().with_dry_run(true), None);
        let response = app
            .oneshot(webhook_request(Some(&token), payload(&["A"], 1)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_string(response).await, DRY_RUN_MESSAGE);
    }

    #[tokio::test]
    async fn missing_client_is_internal_error() {
        let (app, token) = app(config(), None);
        let response = app
            .oneshot(webhook_request(Some(&token), payload(&["A"], 0)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(body_string(response).await.contains("no initialized breaker client"));
    }

    #[tokio::test]
    async fn trip_success_echoes_batch_and_hash() {
        let client = Arc::new(MockBreakerClient::new());
        let (app, token) = app(config(), Some(client.clone()));

        let response = app
            .oneshot(webhook_request(Some(&token), payload(&["A", "B"], 0)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body: WebhookResponse = serde_json::from_str(&body_string(response).await).unwrap();
        assert_eq!(body.message, "ok");
        assert_eq!(body.urls, vec!["A", "B"]);
        assert_eq!(body.operation, Mode::Trip);
        assert!(!body.tx_hash.is_empty());

        assert_eq!(client.trip_calls(), 1);
        assert_eq!(client.reset_calls(), 0);
        assert_eq!(client.batches(), vec![vec!["A".to_string(), "B".to_string()]]);
    }

    #[tokio::test]
    async fn reset_success_reports_reset_mode() {
        let client = Arc::new(MockBreakerClient::new());
        let (app, token) = app(config(), Some(client.clone()));

        let response = app
            .oneshot(webhook_request(
                Some(&token),
                payload(&["/cosmos.circuit.v1.MsgAuthorizeCircuitBreaker"], 1),
            ))
            .await
            .unwrap();
        let body: WebhookResponse = serde_json::from_str(&body_string(response).await).unwrap();
        assert_eq!(body.message, "ok");
        assert_eq!(body.operation, Mode::Reset);
        assert!(!body.tx_hash.is_empty());
        assert_eq!(client.reset_calls(), 1);
    }

    #[tokio::test]
    async fn duplicates_and_order_pass_through() {
        let client = Arc::new(MockBreakerClient::new());
        let (app, token) = app(config(), Some(client.clone()));

        app.oneshot(webhook_request(Some(&token), payload(&["B", "A", "B"], 0)))
            .await
            .unwrap();
        assert_eq!(
            client.batches(),
            vec![vec!["B".to_string(), "A".to_string(), "B".to_string()]]
        );
    }

    #[tokio::test]
    async fn chain_failure_is_embedded_in_ok_envelope() {
        let client = Arc::new(MockBreakerClient::failing("insufficient fees"));
        let (app, token) = app(config(), Some(client.clone()));

        let response = app
            .oneshot(webhook_request(Some(&token), payload(&["A"], 0)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body: WebhookResponse = serde_json::from_str(&body_string(response).await).unwrap();
        assert!(body.message.starts_with("failed to trip circuit breaker"));
        assert!(body.message.contains("insufficient fees"));
        assert_eq!(body.urls, vec!["A"]);
        assert_eq!(body.operation, Mode::Trip);
        assert!(body.tx_hash.is_empty());
    }

    #[tokio::test]
    async fn slow_chain_call_times_out_into_failure_envelope() {
        let client = Arc::new(MockBreakerClient::slow(Duration::from_secs(5)));
        let config = config().with_chain_call_timeout(Duration::from_millis(50));
        let (app, token) = app(config, Some(client));

        let response = app
            .oneshot(webhook_request(Some(&token), payload(&["A"], 1)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body: WebhookResponse = serde_json::from_str(&body_string(response).await).unwrap();
        assert!(body.message.starts_with("failed to reset circuit breaker"));
        assert!(body.message.contains("timed out"));
        assert!(body.tx_hash.is_empty());
    }

    #[tokio::test]
    async fn lowercase_fields_and_plain_bearer_are_accepted() {
        let client = Arc::new(MockBreakerClient::new());
        let (app, token) = app(config(), Some(client.clone()));

        let request = Request::builder()
            .method("POST")
            .uri("/v1/webhook")
            .header("Authorization", format!("Bearer {token}"))
            .body(Body::from(
                json!({ "message": "m", "urls": null, "mode": 0 }).to_string(),
            ))
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(client.batches(), vec![Vec::<String>::new()]);
    }

    #[tokio::test]
    async fn out_of_range_mode_is_unsupported() {
        let client = Arc::new(MockBreakerClient::new());
        let (app, token) = app(config(), Some(client.clone()));

        for raw in ["9223372036854775808", "18446744073709551616", "-9223372036854775809"] {
            let request = Request::builder()
                .method("POST")
                .uri("/v1/webhook")
                .header("Authorization", format!("Bearer: {token}"))
                .body(Body::from(format!(
                    r#"{{"Message":"m","Urls":["A"],"Operation":{raw}}}"#
                )))
                .unwrap();
            let response = app.clone().oneshot(request).await.unwrap();
            assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{raw}");
            assert!(body_string(response).await.contains(UNSUPPORTED_MODE_MESSAGE), "{raw}");
        }
        assert_eq!(client.calls(), 0);
    }

    #[test]
    fn fractional_or_textual_mode_is_malformed() {
        for operation in [json!(1.5), json!(0.0), json!("trip"), json!(null)] {
            let body = json!({ "Message": "m", "Urls": [], "Operation": operation });
            assert!(serde_json::from_value::<PayloadV1>(body).is_err(), "{operation}");
        }
    }

    #[test]
    fn mode_maps_integers() {
        assert_eq!(Mode::from(0), Mode::Trip);
        assert_eq!(Mode::from(1), Mode::Reset);
        assert_eq!(Mode::from(2), Mode::Unknown(2));
        assert_eq!(i64::from(Mode::Unknown(-3)), -3);
        assert_eq!(Mode::Unknown(9).verb(), None);
    }

    #[test]
    fn payload_survives_encode_and_decode() {
        let original = PayloadV1 {
            message: "amount > 1000".to_string(),
            urls: vec!["/cosmos.bank.v1beta1.MsgSend".to_string(), "B".to_string()],
            operation: Mode::Reset,
        };
        let encoded = serde_json::to_string(&original).unwrap();
        assert!(encoded.contains(r#""Operation":1"#));
        assert!(encoded.contains(r#""Message":"amount > 1000""#));

        let decoded: PayloadV1 = serde_json::from_str(&encoded).unwrap();
        assert_eq!(decoded, original);
    }

    #[test]
    fn message_and_operation_are_required() {
        assert!(serde_json::from_value::<PayloadV1>(json!({ "Urls": ["A"], "Operation": 0 })).is_err());
        assert!(serde_json::from_value::<PayloadV1>(json!({ "Message": "m", "Urls": ["A"] })).is_err());
    }
}
