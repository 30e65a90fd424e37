use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use luzia_core::api::mock::{MockTransport, MOCK_BASE_URL};
use luzia_core::api::{DashboardApi, HttpClient};
use luzia_core::auth::{SessionEvent, SessionEvents, SessionStore};
use luzia_core::models::OrganizationDetail;
use luzia_core::resource::{
    AsyncResource, PollingOptions, PollingScheduler, ResourcePhase, Visibility, VisibilitySignal,
};
use reqwest::Method;
use serde_json::json;

#[derive(Default)]
struct RecordingStore {
    cleared: AtomicUsize,
}

impl SessionStore for RecordingStore {
    fn clear_stored(&self) -> anyhow::Result<()> {
        self.cleared.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

fn org(id: &str, name: &str) -> serde_json::Value {
    json!({"id": id, "cnpj": "12.345.678/0001-90", "nome": name})
}

fn org_path(id: &str) -> String {
    format!("/dashboard/organizacoes/{}", id)
}

fn org_resource(client: &HttpClient, org_id: &str) -> AsyncResource<String, OrganizationDetail> {
    let client = client.clone();
    AsyncResource::new(org_id.to_string(), move |org_id: String, cancel| {
        let client = client.clone();
        async move {
            DashboardApi::new(&client, "tok")
                .with_cancel(cancel)
                .organization(&org_id)
                .await
        }
    })
}

async fn wait_for_calls(mock: &MockTransport, n: usize) {
    while mock.total_calls() < n {
        tokio::task::yield_now().await;
    }
}

async fn settle() {
    for _ in 0..10 {
        tokio::task::yield_now().await;
    }
}

#[tokio::test]
async fn test_switching_back_shows_latest_selection() {
    let mock = MockTransport::new();
    let first_a = mock.defer(Method::GET, &org_path("A"));
    let second_a = mock.defer(Method::GET, &org_path("A"));
    let b = mock.defer(Method::GET, &org_path("B"));
    let client = HttpClient::builder(MOCK_BASE_URL)
        .transport(mock.clone())
        .build()
        .expect("mock client");

    let resource = org_resource(&client, "A");
    wait_for_calls(&mock, 1).await;
    resource.set_deps("B".to_string());
    wait_for_calls(&mock, 2).await;
    resource.set_deps("A".to_string());
    wait_for_calls(&mock, 3).await;

    b.respond_json(200, org("B", "Setor B"));
    settle().await;
    second_a.respond_json(200, org("A", "A, second request"));
    settle().await;
    first_a.respond_json(200, org("A", "A, first request"));
    settle().await;

    let state = resource.state();
    assert_eq!(state.phase, ResourcePhase::Success);
    assert_eq!(state.data.as_ref().map(|d| d.name.as_str()), Some("A, second request"));
    assert_eq!(state.error, None);
}

#[tokio::test]
async fn test_dispose_before_response_is_silent() {
    let mock = MockTransport::new();
    let gate = mock.defer(Method::GET, &org_path("A"));
    let client = HttpClient::builder(MOCK_BASE_URL)
        .transport(mock.clone())
        .build()
        .expect("mock client");

    let resource = org_resource(&client, "A");
    let rx = resource.subscribe();
    wait_for_calls(&mock, 1).await;

    drop(resource);
    gate.respond_json(200, org("A", "late"));
    settle().await;

    // Sender dropped with the resource; nothing was committed before that.
    assert!(rx.borrow().data.is_none());
    assert!(client.cache().store().is_empty());
}

#[tokio::test]
async fn test_expired_session_reaches_resource_and_listeners() {
    let mock = MockTransport::new();
    mock.respond_json(Method::GET, &org_path("A"), 200, org("A", "Hospital Central"));
    let store = Arc::new(RecordingStore::default());
    let events = SessionEvents::new();
    let mut expired = events.subscribe();
    let client = HttpClient::builder(MOCK_BASE_URL)
        .transport(mock.clone())
        .session_store(store.clone())
        .session_events(events)
        .build()
        .expect("mock client");

    let resource = org_resource(&client, "A");
    settle().await;
    assert!(resource.state().data.is_some());

    mock.respond_json(Method::GET, &org_path("B"), 401, json!({"detail": "Token expirado"}));
    resource.set_deps("B".to_string());
    settle().await;

    let state = resource.state();
    assert_eq!(state.phase, ResourcePhase::Error);
    assert_eq!(state.error.as_deref(), Some("Token expirado"));
    assert!(state.data.is_none());
    assert_eq!(store.cleared.load(Ordering::SeqCst), 1);
    assert!(client.cache().store().is_empty());
    assert_eq!(expired.try_recv(), Ok(SessionEvent::Expired));
}

#[tokio::test(start_paused = true)]
async fn test_polling_refreshes_in_background() {
    let mock = MockTransport::new();
    mock.respond_json(Method::GET, &org_path("A"), 200, org("A", "v1"));
    let client = HttpClient::builder(MOCK_BASE_URL)
        .transport(mock.clone())
        .build()
        .expect("mock client");
    let visibility = VisibilitySignal::default();

    let resource = org_resource(&client, "A");
    let _poller = PollingScheduler::for_resource(
        resource.refetch_handle(),
        visibility.subscribe(),
        PollingOptions {
            interval: Duration::from_secs(45),
            ..PollingOptions::default()
        },
    );
    settle().await;
    assert_eq!(mock.calls(Method::GET, &org_path("A")), 1);

    // Past the 30s detail TTL, so the poll reaches the network
    mock.respond_json(Method::GET, &org_path("A"), 200, org("A", "v2"));
    tokio::time::sleep(Duration::from_secs(46)).await;
    settle().await;

    assert_eq!(mock.calls(Method::GET, &org_path("A")), 2);
    let state = resource.state();
    assert_eq!(state.data.as_ref().map(|d| d.name.as_str()), Some("v2"));
    assert!(!state.refreshing);

    visibility.set(Visibility::Hidden);
    tokio::time::sleep(Duration::from_secs(90)).await;
    settle().await;
    assert_eq!(mock.calls(Method::GET, &org_path("A")), 2);
}
