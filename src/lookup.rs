//! Free-text location lookup against the provider's destination endpoints.
//!
//! One [`LookupService`] exists per [`LocationProvider`]. Each keeps a cache of
//! normalized query → results for the life of the process and allows at most
//! one request in flight: starting a lookup cancels the previous one, and a
//! cancelled request can neither populate the cache nor reach its caller as a
//! result.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde_json::Value;
use tokio_util::sync::CancellationToken;

use crate::error::TripError;
use crate::fetch::Transport;
use crate::model::LocationRecord;
use crate::parse;
use crate::route::Domain;

pub const MIN_QUERY_LEN: usize = 3;

/// Describes one provider lookup endpoint and how its body maps to records.
#[derive(Clone, Copy)]
pub struct LocationProvider {
    pub domain: Domain,
    pub endpoint: &'static str,
    pub min_query_len: usize,
    pub map: fn(&Value) -> Result<Vec<LocationRecord>, TripError>,
}

pub const FLIGHT_DESTINATIONS: LocationProvider = LocationProvider {
    domain: Domain::Flights,
    endpoint: "/flights/searchDestination",
    min_query_len: MIN_QUERY_LEN,
    map: parse::parse_flight_destinations,
};

pub const HOTEL_DESTINATIONS: LocationProvider = LocationProvider {
    domain: Domain::Hotels,
    endpoint: "/hotels/searchDestination",
    min_query_len: MIN_QUERY_LEN,
    map: parse::parse_hotel_destinations,
};

pub const ATTRACTION_LOCATIONS: LocationProvider = LocationProvider {
    domain: Domain::Activities,
    endpoint: "/attraction/searchLocation",
    min_query_len: MIN_QUERY_LEN,
    map: parse::parse_attraction_locations,
};

impl LocationProvider {
    pub fn for_domain(domain: Domain) -> Self {
        match domain {
            Domain::Flights => FLIGHT_DESTINATIONS,
            Domain::Hotels => HOTEL_DESTINATIONS,
            Domain::Activities => ATTRACTION_LOCATIONS,
        }
    }
}

pub fn normalize_query(query: &str) -> String {
    query.trim().to_lowercase()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LookupState {
    Idle,
    Searching,
}

#[derive(Debug)]
pub enum LookupOutcome {
    Results(Arc<[LocationRecord]>),
    Empty,
    Cancelled,
    Failed(TripError),
}

impl LookupOutcome {
    fn from_records(records: Arc<[LocationRecord]>) -> Self {
        if records.is_empty() {
            Self::Empty
        } else {
            Self::Results(records)
        }
    }

    /// Records to show; failures and cancellations show nothing.
    pub fn records(&self) -> &[LocationRecord] {
        match self {
            Self::Results(records) => records,
            _ => &[],
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}

struct Inflight {
    generation: u64,
    token: CancellationToken,
}

pub struct LookupService {
    provider: LocationProvider,
    transport: Arc<dyn Transport>,
    cache: Mutex<HashMap<String, Arc<[LocationRecord]>>>,
    inflight: Mutex<Option<Inflight>>,
    generation: AtomicU64,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

// Clears the in-flight slot if the lookup future is dropped before finishing.
struct InflightGuard<'a> {
    service: &'a LookupService,
    generation: u64,
}

impl Drop for InflightGuard<'_> {
    fn drop(&mut self) {
        self.service.release(self.generation);
    }
}

impl LookupService {
    pub fn new(provider: LocationProvider, transport: Arc<dyn Transport>) -> Self {
        Self {
            provider,
            transport,
            cache: Mutex::new(HashMap::new()),
            inflight: Mutex::new(None),
            generation: AtomicU64::new(0),
        }
    }

    pub fn state(&self) -> LookupState {
        if lock(&self.inflight).is_some() {
            LookupState::Searching
        } else {
            LookupState::Idle
        }
    }

    pub fn cached(&self, query: &str) -> Option<Arc<[LocationRecord]>> {
        lock(&self.cache).get(&normalize_query(query)).cloned()
    }

    /// Cancels the request currently in flight, if any.
    pub fn cancel(&self) {
        if let Some(prev) = lock(&self.inflight).take() {
            tracing::debug!(domain = self.provider.domain.as_str(), "cancelling in-flight lookup");
            prev.token.cancel();
        }
    }

    fn begin(&self) -> (u64, CancellationToken) {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let token = CancellationToken::new();
        let mut slot = lock(&self.inflight);
        if let Some(prev) = slot.replace(Inflight {
            generation,
            token: token.clone(),
        }) {
            tracing::debug!(
                domain = self.provider.domain.as_str(),
                superseded = prev.generation,
                "cancelling superseded lookup"
            );
            prev.token.cancel();
        }
        (generation, token)
    }

    fn release(&self, generation: u64) {
        let mut slot = lock(&self.inflight);
        if slot.as_ref().is_some_and(|f| f.generation == generation) {
            *slot = None;
        }
    }

    pub async fn lookup(&self, query: &str) -> LookupOutcome {
        let trimmed = query.trim();
        if trimmed.chars().count() < self.provider.min_query_len {
            self.cancel();
            return LookupOutcome::Empty;
        }

        let key = normalize_query(trimmed);
        let hit = lock(&self.cache).get(&key).cloned();
        if let Some(hit) = hit {
            tracing::debug!(domain = self.provider.domain.as_str(), %key, "lookup cache hit");
            // A newer query supersedes whatever is still in flight, cached or not.
            self.cancel();
            return LookupOutcome::from_records(hit);
        }

        let (generation, token) = self.begin();
        let _guard = InflightGuard {
            service: self,
            generation,
        };

        let params = [("query".to_string(), trimmed.to_string())];
        let response = tokio::select! {
            _ = token.cancelled() => return LookupOutcome::Cancelled,
            response = self.transport.get_json(self.provider.endpoint, &params) => response,
        };

        // Decide under the in-flight lock so a newer lookup cannot slip in
        // between the cancellation check and the cache write.
        let slot = lock(&self.inflight);
        if token.is_cancelled() {
            return LookupOutcome::Cancelled;
        }

        match response.and_then(|body| (self.provider.map)(&body)) {
            Ok(records) => {
                let records: Arc<[LocationRecord]> = records.into();
                lock(&self.cache).insert(key, Arc::clone(&records));
                drop(slot);
                LookupOutcome::from_records(records)
            }
            Err(e) => {
                drop(slot);
                tracing::warn!(
                    domain = self.provider.domain.as_str(),
                    query = trimmed,
                    error = %e,
                    "location lookup failed"
                );
                LookupOutcome::Failed(e)
            }
        }
    }
}
