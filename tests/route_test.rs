use std::collections::BTreeMap;

use tripr::error::TripError;
use tripr::query::{ActivitySearchParams, ActivitySort, CabinClass, FlightSearchParams, HotelSearchParams, Stops};
use tripr::route::{Domain, SearchRoute};

#[test]
fn flight_route_round_trips() {
    let mut p = FlightSearchParams::new("JFK.AIRPORT", "LHR.AIRPORT", "2026-03-01");
    p.return_date = Some("2026-03-08".into());
    p.stops = Stops::Nonstop;
    p.cabin_class = CabinClass::Business;
    p.adults = 2;
    let route = SearchRoute::Flights(p);

    let url = route.to_url();
    assert!(url.starts_with("/flights/results?fromId=JFK.AIRPORT&toId=LHR.AIRPORT"));
    assert_eq!(SearchRoute::parse(&url).unwrap(), route);
}

#[test]
fn hotel_route_round_trips_with_price_filter() {
    let mut p = HotelSearchParams::new("-2167973", "city", "2026-03-01", "2026-03-05");
    p.price_min = Some(50);
    p.price_max = Some(250);
    p.children_age = Some("4,9".into());
    let route = SearchRoute::Hotels(p);

    let url = route.to_url();
    assert!(url.contains("children_age=4%2C9"));
    assert_eq!(SearchRoute::parse(&url).unwrap(), route);
}

#[test]
fn activity_id_survives_encoding() {
    let mut p = ActivitySearchParams::new("eyJ1ZmkiOi0yMTY3OTczfQ==");
    p.sort_by = ActivitySort::LowestPrice;
    let route = SearchRoute::Activities(p);

    let url = route.to_url();
    assert!(url.contains("id=eyJ1ZmkiOi0yMTY3OTczfQ%3D%3D"));
    match SearchRoute::parse(&url).unwrap() {
        SearchRoute::Activities(parsed) => {
            assert_eq!(parsed.id, "eyJ1ZmkiOi0yMTY3OTczfQ==");
            assert_eq!(parsed.sort_by, ActivitySort::LowestPrice);
        }
        other => panic!("unexpected route {other:?}"),
    }
}

#[test]
fn absent_optionals_are_not_written() {
    let route = SearchRoute::Flights(FlightSearchParams::new("A.CITY", "B.CITY", "2026-03-01"));
    let url = route.to_url();
    assert!(!url.contains("returnDate"));
    assert!(!url.contains("children"));
}

#[test]
fn missing_keys_default_when_parsing() {
    let route =
        SearchRoute::parse("/flights/results?fromId=A.CITY&toId=B.CITY&departDate=2026-03-01")
            .unwrap();
    assert_eq!(
        route,
        SearchRoute::Flights(FlightSearchParams::new("A.CITY", "B.CITY", "2026-03-01"))
    );
}

#[test]
fn full_url_is_accepted() {
    let route = SearchRoute::parse(
        "https://trips.example.com/hotels/results?dest_id=-1&search_type=city&arrival_date=2026-03-01&departure_date=2026-03-02",
    )
    .unwrap();
    assert_eq!(route.domain(), Domain::Hotels);
}

#[test]
fn missing_required_keys_are_listed() {
    let err = SearchRoute::parse("/hotels/results?dest_id=-1").unwrap_err();
    match err {
        TripError::MissingParams(names) => {
            assert_eq!(names, vec!["search_type", "arrival_date", "departure_date"]);
        }
        other => panic!("expected MissingParams, got {other:?}"),
    }
}

#[test]
fn empty_values_count_as_missing() {
    let map = BTreeMap::from([("id".to_string(), String::new())]);
    assert!(matches!(
        SearchRoute::from_query_map(Domain::Activities, &map),
        Err(TripError::MissingParams(_))
    ));
}

#[test]
fn non_numeric_count_is_rejected() {
    let err = SearchRoute::parse(
        "/flights/results?fromId=A.CITY&toId=B.CITY&departDate=2026-03-01&adults=two",
    )
    .unwrap_err();
    assert!(matches!(err, TripError::Validation(_)));
}

#[test]
fn path_names_the_domain() {
    let route = SearchRoute::Activities(ActivitySearchParams::new("x"));
    assert_eq!(route.path(), "/activities/results");
}

#[test]
fn domain_parsing_is_loose() {
    assert_eq!(Domain::from_str_loose("Hotel").unwrap(), Domain::Hotels);
    assert_eq!(Domain::from_str_loose("attractions").unwrap(), Domain::Activities);
    assert!(Domain::from_str_loose("cars").is_err());
}
