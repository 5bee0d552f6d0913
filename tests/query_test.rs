use tripr::error::TripError;
use tripr::query::{
    parse_date, ActivitySearchParams, ActivitySort, CabinClass, FlightSearchParams, FlightSort,
    HotelSearchParams, Stops,
};

fn make_valid_flight() -> FlightSearchParams {
    FlightSearchParams::new("JFK.AIRPORT", "LHR.AIRPORT", "2026-03-01")
}

fn make_valid_hotel() -> HotelSearchParams {
    HotelSearchParams::new("-2167973", "city", "2026-03-01", "2026-03-05")
}

fn param<'a>(params: &'a [(String, String)], key: &str) -> Option<&'a str> {
    params
        .iter()
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.as_str())
}

#[test]
fn valid_flight_passes() {
    assert!(make_valid_flight().validate().is_ok());
}

#[test]
fn flight_reports_every_missing_field() {
    let q = FlightSearchParams::new("", " ", "");
    match q.validate() {
        Err(TripError::MissingParams(names)) => {
            assert_eq!(names, vec!["fromId", "toId", "departDate"]);
        }
        other => panic!("expected MissingParams, got {other:?}"),
    }
}

#[test]
fn missing_params_message_names_fields() {
    let err = FlightSearchParams::new("JFK.AIRPORT", "", "").validate().unwrap_err();
    assert_eq!(
        err.to_string(),
        "missing required search parameters: toId, departDate"
    );
}

#[test]
fn rejects_same_origin_and_destination() {
    let q = FlightSearchParams::new("JFK.AIRPORT", "JFK.AIRPORT", "2026-03-01");
    assert!(matches!(q.validate(), Err(TripError::Validation(_))));
}

#[test]
fn rejects_bad_date_format() {
    let mut q = make_valid_flight();
    q.depart_date = "03/01/2026".into();
    assert!(matches!(q.validate(), Err(TripError::InvalidDate(_))));
}

#[test]
fn rejects_impossible_date() {
    let mut q = make_valid_flight();
    q.depart_date = "2026-02-30".into();
    assert!(matches!(q.validate(), Err(TripError::InvalidDate(_))));
}

#[test]
fn rejects_return_before_departure() {
    let mut q = make_valid_flight();
    q.return_date = Some("2026-02-27".into());
    assert!(matches!(q.validate(), Err(TripError::Validation(_))));
}

#[test]
fn same_day_return_is_allowed() {
    let mut q = make_valid_flight();
    q.return_date = Some("2026-03-01".into());
    assert!(q.validate().is_ok());
}

#[test]
fn rejects_zero_adults() {
    let mut q = make_valid_flight();
    q.adults = 0;
    assert!(q.validate().is_err());
}

#[test]
fn flight_api_params_fill_defaults() {
    let params = make_valid_flight().to_api_params();
    assert_eq!(param(&params, "fromId"), Some("JFK.AIRPORT"));
    assert_eq!(param(&params, "returnDate"), Some(""));
    assert_eq!(param(&params, "stops"), Some("none"));
    assert_eq!(param(&params, "pageNo"), Some("1"));
    assert_eq!(param(&params, "adults"), Some("1"));
    assert_eq!(param(&params, "children"), Some(""));
    assert_eq!(param(&params, "sort"), Some("BEST"));
    assert_eq!(param(&params, "cabinClass"), Some("ECONOMY"));
    assert_eq!(param(&params, "currency_code"), Some("USD"));
}

#[test]
fn flight_api_params_carry_overrides() {
    let mut q = make_valid_flight();
    q.stops = Stops::Nonstop;
    q.sort = FlightSort::Cheapest;
    q.cabin_class = CabinClass::Business;
    q.children = Some("4,9".into());
    let params = q.to_api_params();
    assert_eq!(param(&params, "stops"), Some("0"));
    assert_eq!(param(&params, "sort"), Some("CHEAPEST"));
    assert_eq!(param(&params, "cabinClass"), Some("BUSINESS"));
    assert_eq!(param(&params, "children"), Some("4,9"));
}

#[test]
fn valid_hotel_passes() {
    assert!(make_valid_hotel().validate().is_ok());
}

#[test]
fn hotel_reports_missing_fields() {
    let q = HotelSearchParams::new("", "city", "2026-03-01", "");
    match q.validate() {
        Err(TripError::MissingParams(names)) => {
            assert_eq!(names, vec!["dest_id", "departure_date"]);
        }
        other => panic!("expected MissingParams, got {other:?}"),
    }
}

#[test]
fn hotel_rejects_checkout_before_checkin() {
    let mut q = make_valid_hotel();
    q.departure_date = "2026-02-28".into();
    assert!(matches!(q.validate(), Err(TripError::Validation(_))));
}

#[test]
fn hotel_rejects_inverted_price_range() {
    let mut q = make_valid_hotel();
    q.price_min = Some(300);
    q.price_max = Some(100);
    assert!(q.validate().is_err());
}

#[test]
fn hotel_price_max_zero_means_unbounded() {
    let mut q = make_valid_hotel();
    q.price_min = Some(300);
    q.price_max = Some(0);
    assert!(q.validate().is_ok());
}

#[test]
fn hotel_rejects_zero_rooms() {
    let mut q = make_valid_hotel();
    q.room_qty = 0;
    assert!(q.validate().is_err());
}

#[test]
fn hotel_api_params_fill_defaults() {
    let params = make_valid_hotel().to_api_params();
    assert_eq!(param(&params, "dest_id"), Some("-2167973"));
    assert_eq!(param(&params, "search_type"), Some("city"));
    assert_eq!(param(&params, "room_qty"), Some("1"));
    assert_eq!(param(&params, "page_number"), Some("1"));
    assert_eq!(param(&params, "price_min"), Some("0"));
    assert_eq!(param(&params, "price_max"), Some("0"));
    assert_eq!(param(&params, "units"), Some("metric"));
    assert_eq!(param(&params, "temperature_unit"), Some("c"));
    assert_eq!(param(&params, "languagecode"), Some("en-us"));
    assert_eq!(param(&params, "currency_code"), Some("USD"));
    assert_eq!(param(&params, "location"), Some("US"));
}

#[test]
fn activity_requires_id() {
    let q = ActivitySearchParams::new("");
    assert!(matches!(q.validate(), Err(TripError::MissingParams(names)) if names == vec!["id"]));
}

#[test]
fn activity_dates_are_optional() {
    assert!(ActivitySearchParams::new("eyJ1ZmkiOi0yMTY3OTczfQ==").validate().is_ok());
}

#[test]
fn activity_rejects_end_before_start() {
    let mut q = ActivitySearchParams::new("eyJ1ZmkiOi0yMTY3OTczfQ==");
    q.start_date = Some("2026-03-05".into());
    q.end_date = Some("2026-03-01".into());
    assert!(q.validate().is_err());
}

#[test]
fn activity_api_params_fill_defaults() {
    let params = ActivitySearchParams::new("abc").to_api_params();
    assert_eq!(param(&params, "id"), Some("abc"));
    assert_eq!(param(&params, "startDate"), Some(""));
    assert_eq!(param(&params, "sortBy"), Some("trending"));
    assert_eq!(param(&params, "page"), Some("1"));
    assert_eq!(param(&params, "currency_code"), Some("USD"));
    assert_eq!(param(&params, "languagecode"), Some("en-us"));
}

#[test]
fn loose_parsers() {
    assert_eq!(Stops::from_str_loose("none").unwrap(), Stops::Any);
    assert_eq!(Stops::from_str_loose("0").unwrap(), Stops::Nonstop);
    assert!(Stops::from_str_loose("3").is_err());

    assert_eq!(FlightSort::from_str_loose("fastest").unwrap(), FlightSort::Fastest);
    assert!(FlightSort::from_str_loose("random").is_err());

    assert_eq!(
        CabinClass::from_str_loose("premium-economy").unwrap(),
        CabinClass::PremiumEconomy
    );
    assert_eq!(CabinClass::from_str_loose("first").unwrap(), CabinClass::First);
    assert!(CabinClass::from_str_loose("coach").is_err());

    assert_eq!(
        ActivitySort::from_str_loose("lowest_price").unwrap(),
        ActivitySort::LowestPrice
    );
    assert!(ActivitySort::from_str_loose("cheapest").is_err());
}

#[test]
fn parse_date_accepts_iso_only() {
    assert!(parse_date("2026-12-31").is_ok());
    assert!(parse_date("2026-13-01").is_err());
    assert!(parse_date("2026-1-01").is_err());
    assert!(parse_date("").is_err());
}
