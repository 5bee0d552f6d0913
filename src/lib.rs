pub mod config;
pub mod error;
pub mod fetch;
pub mod itinerary;
pub mod lookup;
pub mod mcp;
pub mod model;
pub mod notify;
pub mod parse;
pub mod query;
pub mod route;
pub mod storage;
pub mod table;
pub mod watch;

use error::TripError;
use fetch::Transport;
use model::{ActivityView, FlightView, HotelView, SearchResults};
use query::{ActivitySearchParams, FlightSearchParams, HotelSearchParams};
use route::SearchRoute;

pub async fn search_flights(
    transport: &dyn Transport,
    params: &FlightSearchParams,
) -> Result<Vec<FlightView>, TripError> {
    let body = transport
        .get_json("/flights/searchFlights", &params.to_api_params())
        .await?;
    parse::parse_flights(&body)
}

pub async fn search_hotels(
    transport: &dyn Transport,
    params: &HotelSearchParams,
) -> Result<Vec<HotelView>, TripError> {
    let body = transport
        .get_json("/hotels/searchHotels", &params.to_api_params())
        .await?;
    parse::parse_hotels(&body, params)
}

pub async fn search_activities(
    transport: &dyn Transport,
    params: &ActivitySearchParams,
) -> Result<Vec<ActivityView>, TripError> {
    let body = transport
        .get_json("/attraction/searchAttractions", &params.to_api_params())
        .await?;
    parse::parse_activities(&body)
}

/// Validates the route and runs the search it describes.
pub async fn search(
    transport: &dyn Transport,
    route: &SearchRoute,
) -> Result<SearchResults, TripError> {
    route.validate()?;
    Ok(match route {
        SearchRoute::Flights(p) => SearchResults::Flights(search_flights(transport, p).await?),
        SearchRoute::Hotels(p) => SearchResults::Hotels(search_hotels(transport, p).await?),
        SearchRoute::Activities(p) => {
            SearchResults::Activities(search_activities(transport, p).await?)
        }
    })
}
