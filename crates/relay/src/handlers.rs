//! Boundary handlers adapting operator requests into agent calls.
//!
//! Each handler validates its input, performs at most one upstream call, and
//! normalizes the outcome: 200 with the agent snapshot, 400 when the caller
//! is at fault (agent never contacted), 502 when the upstream failed.

use autopilot_agent_client::{AgentClient, AgentError};
use autopilot_core::{BotStatus, ControlAction, RiskConfigUpdate};
use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;
use serde_json::Value;
use std::str::FromStr;
use std::sync::Arc;

const INVALID_ACTION: &str = "Invalid action.";
const INVALID_RISK_CONFIG: &str = "Risk configuration payload invalid.";

/// Error envelope returned for every non-success response.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
}

type ApiResult = Result<Json<BotStatus>, (StatusCode, Json<ErrorBody>)>;

/// Returns the current agent snapshot.
///
/// # Errors
/// Returns 502 with an error envelope if the agent call fails.
pub async fn get_status(State(agent): State<Arc<AgentClient>>) -> ApiResult {
    agent.fetch_status().await.map(Json).map_err(bad_gateway)
}

/// Relays a control command to the agent.
///
/// # Errors
/// Returns 400 if the body is missing a valid `action` literal (the agent
/// is not contacted), or 502 if the agent call fails.
pub async fn post_control(
    State(agent): State<Arc<AgentClient>>,
    body: Option<Json<Value>>,
) -> ApiResult {
    let action = body
        .as_ref()
        .and_then(|Json(value)| value.get("action"))
        .and_then(Value::as_str)
        .and_then(|raw| ControlAction::from_str(raw).ok());

    let Some(action) = action else {
        return Err(bad_request(INVALID_ACTION));
    };

    agent.send_control(action).await.map(Json).map_err(bad_gateway)
}

/// Relays a risk-configuration update to the agent.
///
/// # Errors
/// Returns 400 if any of the three risk fields is missing or non-numeric
/// (the agent is not contacted), or 502 if the agent call fails.
pub async fn post_config(
    State(agent): State<Arc<AgentClient>>,
    body: Option<Json<Value>>,
) -> ApiResult {
    let Some(update) = body.as_ref().and_then(|Json(value)| parse_risk_update(value)) else {
        return Err(bad_request(INVALID_RISK_CONFIG));
    };

    agent
        .update_risk_config(update)
        .await
        .map(Json)
        .map_err(bad_gateway)
}

/// Type-only validation; ranges are the agent's authority.
fn parse_risk_update(value: &Value) -> Option<RiskConfigUpdate> {
    let risk_per_trade = value.get("riskPerTrade")?.as_f64()?;
    let max_concurrent_trades = value.get("maxConcurrentTrades")?.as_f64()?;
    let max_daily_drawdown = value.get("maxDailyDrawdown")?.as_f64()?;

    Some(RiskConfigUpdate {
        risk_per_trade,
        max_concurrent_trades,
        max_daily_drawdown,
    })
}

fn bad_request(message: &str) -> (StatusCode, Json<ErrorBody>) {
    (
        StatusCode::BAD_REQUEST,
        Json(ErrorBody {
            error: message.to_string(),
        }),
    )
}

fn bad_gateway(err: AgentError) -> (StatusCode, Json<ErrorBody>) {
    tracing::warn!("upstream agent call failed: {err}");
    (
        StatusCode::BAD_GATEWAY,
        Json(ErrorBody {
            error: err.to_string(),
        }),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::server::RelayServer;
    use autopilot_agent_client::{AgentClientConfig, MOCK_MODE_NOTE};
    use axum::body::{to_bytes, Body};
    use axum::http::{header, Method, Request, StatusCode};
    use axum::Router;
    use tower::util::ServiceExt;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn router_for(base_url: Option<&str>) -> Router {
        let mut config = AgentClientConfig::default();
        if let Some(url) = base_url {
            config = config.with_base_url(url);
        }
        let agent = AgentClient::new(config).unwrap();
        RelayServer::new(Arc::new(agent)).router()
    }

    fn json_request(method: Method, uri: &str, body: &str) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn send(router: Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = router.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = serde_json::from_slice(&bytes).unwrap();
        (status, value)
    }

    // ==================== Status Tests ====================

    #[tokio::test]
    async fn test_status_returns_reconciled_snapshot() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/status"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"running": true})),
            )
            .mount(&server)
            .await;

        let router = router_for(Some(&server.uri()));
        let request = Request::builder()
            .method(Method::GET)
            .uri("/api/status")
            .body(Body::empty())
            .unwrap();
        let (status, body) = send(router, request).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["running"], serde_json::json!(true));
        // Fields the agent omitted are filled from the default snapshot.
        assert_eq!(body["maxConcurrentTrades"], serde_json::json!(3));
    }

    #[tokio::test]
    async fn test_status_maps_upstream_failure_to_bad_gateway() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/status"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .mount(&server)
            .await;

        let router = router_for(Some(&server.uri()));
        let request = Request::builder()
            .method(Method::GET)
            .uri("/api/status")
            .body(Body::empty())
            .unwrap();
        let (status, body) = send(router, request).await;

        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert!(!body["error"].as_str().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_status_without_configured_agent_serves_mock_snapshot() {
        let router = router_for(None);
        let request = Request::builder()
            .method(Method::GET)
            .uri("/api/status")
            .body(Body::empty())
            .unwrap();
        let (status, body) = send(router, request).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["notes"], serde_json::json!([MOCK_MODE_NOTE]));
    }

    // ==================== Control Tests ====================

    #[tokio::test]
    async fn test_control_forwards_valid_action() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/control"))
            .and(body_json(serde_json::json!({"action": "stop"})))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"running": false})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let router = router_for(Some(&server.uri()));
        let request = json_request(Method::POST, "/api/control", r#"{"action":"stop"}"#);
        let (status, body) = send(router, request).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["running"], serde_json::json!(false));
    }

    #[tokio::test]
    async fn test_control_unknown_action_short_circuits() {
        let server = MockServer::start().await;
        // The agent must never be contacted for invalid input.
        Mock::given(method("POST"))
            .and(path("/control"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let router = router_for(Some(&server.uri()));
        let request = json_request(Method::POST, "/api/control", r#"{"action":"explode"}"#);
        let (status, body) = send(router, request).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], serde_json::json!("Invalid action."));

        server.verify().await;
    }

    #[tokio::test]
    async fn test_control_missing_or_malformed_body_short_circuits() {
        for body_text in ["", "{}", r#"{"action": 7}"#, "not json"] {
            let router = router_for(Some("http://127.0.0.1:9"));
            let request = json_request(Method::POST, "/api/control", body_text);
            let (status, body) = send(router, request).await;

            assert_eq!(status, StatusCode::BAD_REQUEST, "body: {body_text:?}");
            assert_eq!(body["error"], serde_json::json!("Invalid action."));
        }
    }

    #[tokio::test]
    async fn test_control_upstream_failure_maps_to_bad_gateway() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/control"))
            .respond_with(ResponseTemplate::new(503).set_body_string("agent restarting"))
            .mount(&server)
            .await;

        let router = router_for(Some(&server.uri()));
        let request = json_request(Method::POST, "/api/control", r#"{"action":"start"}"#);
        let (status, body) = send(router, request).await;

        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert!(body["error"].as_str().unwrap().contains("503"));
    }

    // ==================== Config Tests ====================

    #[tokio::test]
    async fn test_config_forwards_numeric_payload() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/config"))
            .and(body_json(serde_json::json!({
                "riskPerTrade": 0.02,
                "maxConcurrentTrades": 5.0,
                "maxDailyDrawdown": 0.05
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "riskPerTrade": 0.02,
                "maxConcurrentTrades": 5,
                "maxDailyDrawdown": 0.05
            })))
            .expect(1)
            .mount(&server)
            .await;

        let router = router_for(Some(&server.uri()));
        let request = json_request(
            Method::POST,
            "/api/config",
            r#"{"riskPerTrade":0.02,"maxConcurrentTrades":5,"maxDailyDrawdown":0.05}"#,
        );
        let (status, body) = send(router, request).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["maxConcurrentTrades"], serde_json::json!(5));
    }

    #[tokio::test]
    async fn test_config_non_numeric_field_short_circuits() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/config"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let router = router_for(Some(&server.uri()));
        let request = json_request(
            Method::POST,
            "/api/config",
            r#"{"riskPerTrade":"a lot","maxConcurrentTrades":5,"maxDailyDrawdown":0.05}"#,
        );
        let (status, body) = send(router, request).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(
            body["error"],
            serde_json::json!("Risk configuration payload invalid.")
        );

        server.verify().await;
    }

    #[tokio::test]
    async fn test_config_missing_field_short_circuits() {
        let router = router_for(Some("http://127.0.0.1:9"));
        let request = json_request(
            Method::POST,
            "/api/config",
            r#"{"riskPerTrade":0.02,"maxDailyDrawdown":0.05}"#,
        );
        let (status, body) = send(router, request).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(
            body["error"],
            serde_json::json!("Risk configuration payload invalid.")
        );
    }
}
