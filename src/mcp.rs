use std::collections::BTreeMap;
use std::sync::Arc;

use rmcp::handler::server::tool::ToolRouter;
use rmcp::handler::server::wrapper::Parameters;
use rmcp::model::*;
use rmcp::schemars;
use rmcp::{tool, tool_handler, tool_router, ErrorData as McpError, ServerHandler, ServiceExt};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::sync::Mutex;

use crate::config::Settings;
use crate::fetch::{ApiClient, Transport};
use crate::itinerary::{AddOutcome, Itinerary};
use crate::lookup::{LocationProvider, LookupOutcome, LookupService};
use crate::model::SearchResults;
use crate::notify::RecordingNotifier;
use crate::route::{Domain, SearchRoute};
use crate::storage::FileStore;
use crate::table;

#[derive(Debug, Deserialize, schemars::JsonSchema)]
struct LookupArgs {
    #[schemars(description = "One of: flights, hotels, activities")]
    domain: String,
    #[schemars(
        description = "Free-text place name, at least 3 characters. Examples: new york, lisbon, kyoto"
    )]
    query: String,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
struct SearchArgs {
    #[schemars(description = "One of: flights, hotels, activities")]
    domain: String,
    #[schemars(
        description = "Search parameters keyed exactly as in a results route. flights: fromId, toId, departDate (required), returnDate, stops, pageNo, adults, children, sort, cabinClass, currency_code. hotels: dest_id, search_type, arrival_date, departure_date (required), adults, children_age, room_qty, page_number, price_min, price_max, sort_by, categories_filter, currency_code. activities: id (required), startDate, endDate, sortBy, page, currency_code. Ids come from trip_lookup; dates are YYYY-MM-DD"
    )]
    params: BTreeMap<String, String>,
    #[schemars(description = "Return only the N cheapest results")]
    top: Option<usize>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
struct AddArgs {
    #[schemars(
        description = "1-based position of the result to add, from the most recent trip_search"
    )]
    position: usize,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
struct RemoveArgs {
    #[schemars(description = "Itinerary item id as returned by trip_itinerary or trip_add")]
    id: String,
}

#[derive(Debug, Serialize)]
struct Notification {
    title: String,
    message: String,
}

fn tool_error(msg: impl Into<String>) -> Result<CallToolResult, McpError> {
    Ok(CallToolResult::error(vec![Content::text(msg.into())]))
}

fn to_tool_result(result: Result<Value, String>) -> Result<CallToolResult, McpError> {
    match result {
        Ok(value) => match serde_json::to_string_pretty(&value) {
            Ok(json) => Ok(CallToolResult::success(vec![Content::text(json)])),
            Err(e) => tool_error(format!("failed to serialize result: {e}")),
        },
        Err(msg) => tool_error(msg),
    }
}

#[derive(Clone)]
struct TriprMcp {
    transport: Option<Arc<dyn Transport>>,
    lookups: Arc<BTreeMap<&'static str, LookupService>>,
    itinerary: Arc<Mutex<Itinerary>>,
    notifier: Arc<RecordingNotifier>,
    last_results: Arc<Mutex<Option<SearchResults>>>,
    tool_router: ToolRouter<Self>,
}

const DOMAINS: [Domain; 3] = [Domain::Flights, Domain::Hotels, Domain::Activities];

#[tool_router]
impl TriprMcp {
    fn new(
        transport: Option<Arc<dyn Transport>>,
        itinerary: Itinerary,
        notifier: Arc<RecordingNotifier>,
    ) -> Self {
        let lookups = match transport {
            Some(ref t) => DOMAINS
                .iter()
                .map(|&d| {
                    (
                        d.as_str(),
                        LookupService::new(LocationProvider::for_domain(d), Arc::clone(t)),
                    )
                })
                .collect(),
            None => BTreeMap::new(),
        };

        Self {
            transport,
            lookups: Arc::new(lookups),
            itinerary: Arc::new(Mutex::new(itinerary)),
            notifier,
            last_results: Arc::new(Mutex::new(None)),
            tool_router: Self::tool_router(),
        }
    }

    /// Callers hold the itinerary lock so only their own mutation is drained.
    fn drain_notifications(&self) -> Vec<Notification> {
        self.notifier
            .take()
            .into_iter()
            .map(|(title, message)| Notification { title, message })
            .collect()
    }

    async fn do_lookup(&self, domain: &str, query: &str) -> Result<Value, String> {
        let domain = Domain::from_str_loose(domain).map_err(|e| e.to_string())?;
        let service = self
            .lookups
            .get(domain.as_str())
            .ok_or_else(|| crate::error::TripError::MissingApiKey.to_string())?;

        match service.lookup(query).await {
            LookupOutcome::Failed(e) => Err(e.to_string()),
            outcome => Ok(json!(outcome.records())),
        }
    }

    async fn do_search(
        &self,
        domain: &str,
        params: &BTreeMap<String, String>,
        top: Option<usize>,
    ) -> Result<Value, String> {
        let domain = Domain::from_str_loose(domain).map_err(|e| e.to_string())?;
        let route = SearchRoute::from_query_map(domain, params).map_err(|e| e.to_string())?;
        route.validate().map_err(|e| e.to_string())?;

        let transport = self
            .transport
            .as_ref()
            .ok_or_else(|| crate::error::TripError::MissingApiKey.to_string())?;

        let mut results = crate::search(transport.as_ref(), &route)
            .await
            .map_err(|e| e.to_string())?;
        if let Some(n) = top {
            results.apply_top(n);
        }

        let body = json!({
            "route": route.to_url(),
            "count": results.len(),
            "results": results,
        });
        *self.last_results.lock().await = Some(results);
        Ok(body)
    }

    async fn do_add(&self, position: usize) -> Result<Value, String> {
        let payload = {
            let last = self.last_results.lock().await;
            let results = last
                .as_ref()
                .ok_or("no search results yet: call trip_search first")?;
            results.payload(position).ok_or_else(|| {
                format!(
                    "position {position} is out of range ({} results)",
                    results.len()
                )
            })?
        };

        let mut itinerary = self.itinerary.lock().await;
        self.notifier.take();
        let outcome = itinerary.add_payload(payload);
        let notifications = self.drain_notifications();
        drop(itinerary);
        Ok(match outcome {
            AddOutcome::Added { id } => json!({
                "status": "added",
                "id": id,
                "notifications": notifications,
            }),
            AddOutcome::Duplicate { existing_id } => json!({
                "status": "duplicate",
                "id": existing_id,
                "notifications": notifications,
            }),
        })
    }

    async fn do_itinerary(&self) -> Value {
        let itinerary = self.itinerary.lock().await;
        let totals: Vec<String> = table::totals(itinerary.list())
            .iter()
            .map(table::format_price)
            .collect();
        json!({
            "count": itinerary.len(),
            "totals": totals,
            "items": itinerary.list(),
        })
    }

    async fn do_remove(&self, id: &str) -> Value {
        let mut itinerary = self.itinerary.lock().await;
        self.notifier.take();
        let removed = itinerary.remove(id);
        let notifications = self.drain_notifications();
        drop(itinerary);
        match removed {
            Some(entry) => json!({
                "status": "removed",
                "item": entry,
                "notifications": notifications,
            }),
            None => json!({
                "status": "not_found",
                "id": id,
                "notifications": notifications,
            }),
        }
    }

    async fn do_clear(&self) -> Value {
        let mut itinerary = self.itinerary.lock().await;
        self.notifier.take();
        itinerary.clear();
        let notifications = self.drain_notifications();
        drop(itinerary);
        json!({
            "status": "cleared",
            "notifications": notifications,
        })
    }

    #[tool(
        description = "Look up destination or location ids for a free-text place name. Use domain=flights for fromId/toId values, hotels for dest_id plus search_type (the 'tag' field), activities for the activity 'id'. Queries shorter than 3 characters return an empty list without calling the provider."
    )]
    async fn trip_lookup(
        &self,
        Parameters(args): Parameters<LookupArgs>,
    ) -> Result<CallToolResult, McpError> {
        to_tool_result(self.do_lookup(&args.domain, &args.query).await)
    }

    #[tool(
        description = "Search flights, hotels or activities and return results as JSON, along with the results route that reproduces the search. Results are numbered from 1 in the order returned; pass a position to trip_add to save one."
    )]
    async fn trip_search(
        &self,
        Parameters(args): Parameters<SearchArgs>,
    ) -> Result<CallToolResult, McpError> {
        to_tool_result(self.do_search(&args.domain, &args.params, args.top).await)
    }

    #[tool(
        description = "Add one result from the most recent trip_search to the itinerary. Adding an item equivalent to one already saved is rejected with status 'duplicate'."
    )]
    async fn trip_add(
        &self,
        Parameters(args): Parameters<AddArgs>,
    ) -> Result<CallToolResult, McpError> {
        to_tool_result(self.do_add(args.position).await)
    }

    #[tool(description = "List saved itinerary items with per-currency totals")]
    async fn trip_itinerary(&self) -> Result<CallToolResult, McpError> {
        to_tool_result(Ok(self.do_itinerary().await))
    }

    #[tool(description = "Remove one itinerary item by id. Unknown ids are a no-op.")]
    async fn trip_remove(
        &self,
        Parameters(args): Parameters<RemoveArgs>,
    ) -> Result<CallToolResult, McpError> {
        to_tool_result(Ok(self.do_remove(&args.id).await))
    }

    #[tool(description = "Remove every item from the itinerary")]
    async fn trip_clear(&self) -> Result<CallToolResult, McpError> {
        to_tool_result(Ok(self.do_clear().await))
    }
}

#[tool_handler]
impl ServerHandler for TriprMcp {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::V_2024_11_05,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: "tripr".into(),
                version: env!("CARGO_PKG_VERSION").into(),
                ..Default::default()
            },
            instructions: Some(
                "Trip planning tool. Workflow: (1) trip_lookup to turn place names into ids. (2) trip_search with those ids. (3) trip_add with a result position to save it. (4) trip_itinerary, trip_remove and trip_clear manage saved items.".into(),
            ),
        }
    }
}

pub async fn run(settings: Settings) {
    let transport: Option<Arc<dyn Transport>> = match ApiClient::new(&settings.fetch_options()) {
        Ok(client) => Some(Arc::new(client)),
        Err(e) => {
            tracing::warn!(error = %e, "travel API unavailable, only itinerary tools will work");
            None
        }
    };

    let notifier = Arc::new(RecordingNotifier::new());
    let itinerary = Itinerary::load(
        Arc::new(FileStore::new(settings.data_dir())),
        Arc::clone(&notifier) as Arc<dyn crate::notify::Notifier>,
    );

    let service = match TriprMcp::new(transport, itinerary, notifier)
        .serve(rmcp::transport::stdio())
        .await
    {
        Ok(service) => service,
        Err(e) => {
            tracing::error!(error = %e, "failed to start MCP server");
            return;
        }
    };
    if let Err(e) = service.waiting().await {
        tracing::error!(error = %e, "MCP server error");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TripError;
    use crate::storage::MemoryStore;
    use async_trait::async_trait;

    struct CannedTransport;

    #[async_trait]
    impl Transport for CannedTransport {
        async fn get_json(
            &self,
            path: &str,
            _params: &[(String, String)],
        ) -> Result<Value, TripError> {
            match path {
                "/attraction/searchAttractions" => Ok(json!({
                    "status": true,
                    "data": { "products": [
                        {
                            "id": "PRHJ1",
                            "name": "Tram 28 tour",
                            "shortDescription": "Ride through Alfama",
                            "representativePrice": { "chargeAmount": 25.0, "currency": "EUR" },
                            "reviewsStats": { "combinedNumericStats": { "average": 4.6, "total": 120 } },
                            "ufiDetails": { "bCityName": "Lisbon" }
                        }
                    ]}
                })),
                _ => Ok(json!({ "status": true, "data": [] })),
            }
        }
    }

    fn server(transport: Option<Arc<dyn Transport>>) -> TriprMcp {
        let notifier = Arc::new(RecordingNotifier::new());
        let itinerary = Itinerary::load(
            Arc::new(MemoryStore::new()),
            Arc::clone(&notifier) as Arc<dyn crate::notify::Notifier>,
        );
        TriprMcp::new(transport, itinerary, notifier)
    }

    fn activity_params() -> BTreeMap<String, String> {
        BTreeMap::from([("id".to_string(), "eyJ1ZmkiOi0yMTY3OTczfQ==".to_string())])
    }

    #[tokio::test]
    async fn add_requires_a_prior_search() {
        let mcp = server(Some(Arc::new(CannedTransport)));
        let err = mcp.do_add(1).await.unwrap_err();
        assert!(err.contains("trip_search"));
    }

    #[tokio::test]
    async fn search_then_add_then_duplicate() {
        let mcp = server(Some(Arc::new(CannedTransport)));
        let found = mcp
            .do_search("activities", &activity_params(), None)
            .await
            .unwrap();
        assert_eq!(found["count"], 1);
        assert!(found["route"]
            .as_str()
            .unwrap()
            .starts_with("/activities/results?"));

        let added = mcp.do_add(1).await.unwrap();
        assert_eq!(added["status"], "added");
        assert_eq!(added["notifications"][0]["title"], "Activity Added!");

        let again = mcp.do_add(1).await.unwrap();
        assert_eq!(again["status"], "duplicate");
        assert_eq!(again["id"], added["id"]);
        assert_eq!(again["notifications"][0]["title"], "Already Added!");

        let listed = mcp.do_itinerary().await;
        assert_eq!(listed["count"], 1);
    }

    #[tokio::test]
    async fn out_of_range_position_is_an_error() {
        let mcp = server(Some(Arc::new(CannedTransport)));
        mcp.do_search("activities", &activity_params(), None)
            .await
            .unwrap();
        let err = mcp.do_add(5).await.unwrap_err();
        assert!(err.contains("out of range"));
    }

    #[tokio::test]
    async fn search_reports_missing_params() {
        let mcp = server(Some(Arc::new(CannedTransport)));
        let err = mcp
            .do_search("flights", &BTreeMap::new(), None)
            .await
            .unwrap_err();
        assert!(err.contains("fromId"));
    }

    #[tokio::test]
    async fn lookup_without_api_key_is_an_error() {
        let mcp = server(None);
        let err = mcp.do_lookup("hotels", "lisbon").await.unwrap_err();
        assert!(err.contains("RAPIDAPI_KEY"));
    }

    #[tokio::test]
    async fn remove_unknown_id_is_not_found() {
        let mcp = server(None);
        let removed = mcp.do_remove("itinerary-missing").await;
        assert_eq!(removed["status"], "not_found");
        assert_eq!(removed["notifications"].as_array().unwrap().len(), 0);
    }

    #[tokio::test]
    async fn remove_reports_only_its_own_notifications() {
        let mcp = server(Some(Arc::new(CannedTransport)));
        mcp.do_search("activities", &activity_params(), None)
            .await
            .unwrap();
        let payload = mcp.last_results.lock().await.as_ref().unwrap().payload(1).unwrap();
        mcp.itinerary.lock().await.add_payload(payload);

        let removed = mcp.do_remove("itinerary-missing").await;
        assert_eq!(removed["status"], "not_found");
        assert_eq!(removed["notifications"], json!([]));
    }

    #[tokio::test]
    async fn concurrent_adds_each_get_their_own_notification() {
        let mcp = server(Some(Arc::new(CannedTransport)));
        mcp.do_search("activities", &activity_params(), None)
            .await
            .unwrap();

        let (first, second) = tokio::join!(mcp.do_add(1), mcp.do_add(1));
        let mut titles: Vec<String> = [first.unwrap(), second.unwrap()]
            .iter()
            .map(|r| {
                let notes = r["notifications"].as_array().unwrap();
                assert_eq!(notes.len(), 1);
                notes[0]["title"].as_str().unwrap().to_string()
            })
            .collect();
        titles.sort();
        assert_eq!(titles, vec!["Activity Added!", "Already Added!"]);
    }

    #[tokio::test]
    async fn clear_notifies() {
        let mcp = server(None);
        let cleared = mcp.do_clear().await;
        assert_eq!(cleared["notifications"][0]["title"], "Itinerary Cleared!");
    }
}
