use autopilot_agent_client::{AgentClient, AgentClientConfig};
use autopilot_core::ControlAction;
use autopilot_relay::RelayServer;
use autopilot_status_store::{RelayTransport, StatusStore, StorePhase};
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Serves a relay for the given agent on an ephemeral port and returns its
/// base URL.
async fn spawn_relay(agent_base_url: &str) -> String {
    let agent = AgentClient::new(AgentClientConfig::default().with_base_url(agent_base_url))
        .expect("failed to build agent client");
    let router = RelayServer::new(Arc::new(agent)).router();

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("failed to bind relay listener");
    let addr = listener.local_addr().expect("no local addr");
    tokio::spawn(async move {
        axum::serve(listener, router).await.expect("relay exited");
    });

    format!("http://{addr}")
}

#[tokio::test]
async fn store_sees_agent_status_through_relay() {
    let agent = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/status"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "running": true,
            "activeSymbol": "EURUSD",
            "openPositions": 1,
        })))
        .mount(&agent)
        .await;

    let relay_url = spawn_relay(&agent.uri()).await;
    let transport = Arc::new(RelayTransport::new(relay_url).expect("transport"));
    let store = StatusStore::new(transport, Duration::from_secs(60));
    let mut rx = store.subscribe();
    store.start();

    let view = tokio::time::timeout(
        Duration::from_secs(5),
        rx.wait_for(|v| v.phase == StorePhase::Ready),
    )
    .await
    .expect("store never became ready")
    .expect("store dropped")
    .clone();

    assert!(view.snapshot.running);
    assert_eq!(view.snapshot.active_symbol.as_deref(), Some("EURUSD"));
    assert_eq!(view.snapshot.open_positions, 1);
    // Fields the agent omitted come from the default snapshot.
    assert_eq!(view.snapshot.max_concurrent_trades, 3);

    store.stop();
}

#[tokio::test]
async fn control_command_round_trips_through_relay() {
    let agent = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/control"))
        .and(body_json(serde_json::json!({"action": "stop"})))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::json!({"running": false})),
        )
        .expect(1)
        .mount(&agent)
        .await;

    let relay_url = spawn_relay(&agent.uri()).await;
    let transport = Arc::new(RelayTransport::new(relay_url).expect("transport"));
    let store = StatusStore::new(transport, Duration::from_secs(60));

    store
        .send_control(ControlAction::Stop)
        .await
        .expect("command failed");

    let view = store.view();
    assert_eq!(view.phase, StorePhase::Ready);
    assert!(!view.snapshot.running);
    assert!(!view.saving);
}

#[tokio::test]
async fn agent_outage_surfaces_as_store_error_not_blank_view() {
    let agent = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/status"))
        .respond_with(ResponseTemplate::new(500).set_body_string("agent crashed"))
        .mount(&agent)
        .await;

    let relay_url = spawn_relay(&agent.uri()).await;
    let transport = Arc::new(RelayTransport::new(relay_url).expect("transport"));
    let store = StatusStore::new(transport, Duration::from_secs(60));
    let mut rx = store.subscribe();
    store.start();

    let view = tokio::time::timeout(
        Duration::from_secs(5),
        rx.wait_for(|v| v.last_error.is_some()),
    )
    .await
    .expect("store never recorded the failure")
    .expect("store dropped")
    .clone();

    // The relay's 502 envelope reaches the store; the snapshot stays intact.
    assert_eq!(view.phase, StorePhase::Loading);
    assert!(view.last_error.unwrap().contains("502"));

    store.stop();
}
