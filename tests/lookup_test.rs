use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::{json, Value};
use tokio::sync::Notify;
use tripr::error::TripError;
use tripr::fetch::Transport;
use tripr::lookup::{
    normalize_query, LocationProvider, LookupOutcome, LookupService, LookupState,
    HOTEL_DESTINATIONS,
};
use tripr::route::Domain;

/// Answers hotel destination lookups with one record named after the query.
/// Queries registered with `hold` block until released.
#[derive(Default)]
struct FakeTransport {
    calls: AtomicUsize,
    held: Mutex<HashMap<String, Arc<Notify>>>,
}

impl FakeTransport {
    fn hold(&self, query: &str) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        self.held
            .lock()
            .unwrap()
            .insert(query.to_string(), Arc::clone(&gate));
        gate
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    async fn wait_for_calls(&self, n: usize) {
        while self.calls() < n {
            tokio::task::yield_now().await;
        }
    }
}

#[async_trait]
impl Transport for FakeTransport {
    async fn get_json(&self, path: &str, params: &[(String, String)]) -> Result<Value, TripError> {
        assert_eq!(path, "/hotels/searchDestination");
        self.calls.fetch_add(1, Ordering::SeqCst);
        let query = params
            .iter()
            .find(|(k, _)| k == "query")
            .map(|(_, v)| v.clone())
            .unwrap_or_default();

        let gate = self.held.lock().unwrap().get(&query).cloned();
        if let Some(gate) = gate {
            gate.notified().await;
        }

        match query.as_str() {
            "fail" => Err(TripError::HttpStatus(500)),
            "nowhere" => Ok(json!({ "status": true, "data": [] })),
            _ => Ok(json!({
                "status": true,
                "data": [{
                    "dest_id": "-2167973",
                    "search_type": "city",
                    "name": query,
                    "country": "Portugal"
                }]
            })),
        }
    }
}

fn service() -> (Arc<LookupService>, Arc<FakeTransport>) {
    let transport = Arc::new(FakeTransport::default());
    let service = LookupService::new(HOTEL_DESTINATIONS, Arc::clone(&transport) as Arc<dyn Transport>);
    (Arc::new(service), transport)
}

#[tokio::test]
async fn short_query_makes_no_request() {
    let (service, transport) = service();
    assert!(matches!(service.lookup("li").await, LookupOutcome::Empty));
    assert!(matches!(service.lookup("   li   ").await, LookupOutcome::Empty));
    assert!(matches!(service.lookup("").await, LookupOutcome::Empty));
    assert_eq!(transport.calls(), 0);
    assert_eq!(service.state(), LookupState::Idle);
}

#[tokio::test]
async fn three_characters_is_enough() {
    let (service, transport) = service();
    let outcome = service.lookup("rio").await;
    assert_eq!(outcome.records().len(), 1);
    assert_eq!(transport.calls(), 1);
}

#[tokio::test]
async fn repeated_query_is_served_from_cache() {
    let (service, transport) = service();
    let first = service.lookup("Lisbon").await;
    let second = service.lookup("  lisbon ").await;

    assert_eq!(transport.calls(), 1);
    assert_eq!(first.records(), second.records());
    assert_eq!(first.records()[0].name, "Lisbon");
    assert!(service.cached("LISBON").is_some());
}

#[tokio::test]
async fn empty_results_are_cached_too() {
    let (service, transport) = service();
    assert!(matches!(service.lookup("nowhere").await, LookupOutcome::Empty));
    assert!(matches!(service.lookup("nowhere").await, LookupOutcome::Empty));
    assert_eq!(transport.calls(), 1);
}

#[tokio::test]
async fn failure_is_reported_and_not_cached() {
    let (service, transport) = service();
    let outcome = service.lookup("fail").await;
    assert!(matches!(outcome, LookupOutcome::Failed(TripError::HttpStatus(500))));
    assert!(outcome.records().is_empty());
    assert!(service.cached("fail").is_none());
    assert_eq!(service.state(), LookupState::Idle);

    service.lookup("fail").await;
    assert_eq!(transport.calls(), 2);
}

#[tokio::test]
async fn newer_query_cancels_older_one() {
    let (service, transport) = service();
    let _gate = transport.hold("lisbon");

    let older = tokio::spawn({
        let service = Arc::clone(&service);
        async move { service.lookup("lisbon").await }
    });
    transport.wait_for_calls(1).await;
    assert_eq!(service.state(), LookupState::Searching);

    let newer = service.lookup("porto").await;
    assert_eq!(newer.records()[0].name, "porto");

    let older = older.await.unwrap();
    assert!(older.is_cancelled());
    assert!(older.records().is_empty());
    assert!(service.cached("lisbon").is_none());
    assert_eq!(service.state(), LookupState::Idle);
}

#[tokio::test]
async fn short_query_cancels_pending_lookup() {
    let (service, transport) = service();
    let _gate = transport.hold("lisbon");

    let pending = tokio::spawn({
        let service = Arc::clone(&service);
        async move { service.lookup("lisbon").await }
    });
    transport.wait_for_calls(1).await;

    assert!(matches!(service.lookup("li").await, LookupOutcome::Empty));
    assert!(pending.await.unwrap().is_cancelled());
    assert_eq!(service.state(), LookupState::Idle);
}

#[tokio::test]
async fn cached_query_cancels_pending_lookup() {
    let (service, transport) = service();
    service.lookup("porto").await;
    let _gate = transport.hold("lisbon");

    let pending = tokio::spawn({
        let service = Arc::clone(&service);
        async move { service.lookup("lisbon").await }
    });
    transport.wait_for_calls(2).await;

    let cached = service.lookup("Porto").await;
    assert_eq!(cached.records()[0].name, "porto");
    assert!(pending.await.unwrap().is_cancelled());
    assert_eq!(transport.calls(), 2);
}

#[tokio::test]
async fn released_request_completes_normally() {
    let (service, transport) = service();
    let gate = transport.hold("lisbon");

    let pending = tokio::spawn({
        let service = Arc::clone(&service);
        async move { service.lookup("lisbon").await }
    });
    transport.wait_for_calls(1).await;
    gate.notify_one();

    let outcome = pending.await.unwrap();
    assert_eq!(outcome.records()[0].name, "lisbon");
    assert!(service.cached("lisbon").is_some());
}

#[test]
fn providers_match_their_domains() {
    for domain in [Domain::Flights, Domain::Hotels, Domain::Activities] {
        let provider = LocationProvider::for_domain(domain);
        assert_eq!(provider.domain, domain);
        assert_eq!(provider.min_query_len, 3);
    }
    assert_eq!(
        LocationProvider::for_domain(Domain::Activities).endpoint,
        "/attraction/searchLocation"
    );
}

#[test]
fn queries_normalize_case_and_whitespace() {
    assert_eq!(normalize_query("  New York "), "new york");
}
