use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde_json::Value;

use crate::error::TripError;
use crate::model::*;
use crate::query::HotelSearchParams;

fn get_path<'a>(val: &'a Value, path: &[&str]) -> Option<&'a Value> {
    path.iter()
        .try_fold(val, |v, key| v.get(*key))
        .filter(|v| !v.is_null())
}

fn get_str(val: &Value, path: &[&str]) -> Option<String> {
    get_path(val, path).and_then(|v| match v {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    })
}

fn get_f64(val: &Value, path: &[&str]) -> Option<f64> {
    get_path(val, path).and_then(Value::as_f64)
}

fn get_u32(val: &Value, path: &[&str]) -> Option<u32> {
    get_path(val, path)
        .and_then(Value::as_u64)
        .and_then(|v| u32::try_from(v).ok())
}

fn get_decimal(val: &Value, path: &[&str]) -> Option<Decimal> {
    match get_path(val, path)? {
        Value::Number(n) => n.to_string().parse().ok(),
        Value::String(s) => s.parse().ok(),
        _ => None,
    }
}

fn get_strings(val: &Value, path: &[&str]) -> Vec<String> {
    get_path(val, path)
        .and_then(Value::as_array)
        .map(|arr| arr.iter().filter_map(|v| v.as_str().map(String::from)).collect())
        .unwrap_or_default()
}

fn list<'a>(body: &'a Value, path: &[&str]) -> &'a [Value] {
    get_path(body, path)
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default()
}

// Provider responses wrap everything in `{status, message, data}`.
fn expect_object(body: &Value) -> Result<(), TripError> {
    if body.is_object() {
        Ok(())
    } else {
        Err(TripError::Decode("response body is not a JSON object".into()))
    }
}

fn location_id(val: &Value, key: &str) -> Option<LocationId> {
    match get_path(val, &[key])? {
        Value::Number(n) => n.as_i64().map(LocationId::Number),
        Value::String(s) if !s.is_empty() => Some(
            s.parse::<i64>()
                .map(LocationId::Number)
                .unwrap_or_else(|_| LocationId::Text(s.clone())),
        ),
        _ => None,
    }
}

fn parse_flight_destination(item: &Value) -> Option<LocationRecord> {
    Some(LocationRecord {
        id: LocationId::Text(get_str(item, &["id"])?),
        name: get_str(item, &["name"])?,
        country: get_str(item, &["countryName"])
            .or_else(|| get_str(item, &["country"]))
            .unwrap_or_default(),
        region: get_str(item, &["regionName"]),
        tag: get_str(item, &["code"]),
    })
}

pub fn parse_flight_destinations(body: &Value) -> Result<Vec<LocationRecord>, TripError> {
    expect_object(body)?;
    Ok(list(body, &["data"])
        .iter()
        .filter_map(parse_flight_destination)
        .collect())
}

fn parse_hotel_destination(item: &Value) -> Option<LocationRecord> {
    Some(LocationRecord {
        id: location_id(item, "dest_id")?,
        name: get_str(item, &["name"]).or_else(|| get_str(item, &["label"]))?,
        country: get_str(item, &["country"]).unwrap_or_default(),
        region: get_str(item, &["region"]),
        tag: get_str(item, &["search_type"]),
    })
}

pub fn parse_hotel_destinations(body: &Value) -> Result<Vec<LocationRecord>, TripError> {
    expect_object(body)?;
    Ok(list(body, &["data"])
        .iter()
        .filter_map(parse_hotel_destination)
        .collect())
}

fn parse_attraction_location(item: &Value) -> Option<LocationRecord> {
    Some(LocationRecord {
        id: LocationId::Text(get_str(item, &["id"])?),
        name: get_str(item, &["cityName"])?,
        country: get_str(item, &["country"]).unwrap_or_default(),
        region: get_str(item, &["cc1"]),
        tag: None,
    })
}

pub fn parse_attraction_locations(body: &Value) -> Result<Vec<LocationRecord>, TripError> {
    expect_object(body)?;
    Ok(list(body, &["data", "destinations"])
        .iter()
        .filter_map(parse_attraction_location)
        .collect())
}

fn parse_timestamp(s: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S")
        .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M"))
        .ok()
}

fn parse_endpoint(segment: &Value, airport_key: &str, time_key: &str) -> Option<FlightEndpoint> {
    let raw_time = get_str(segment, &[time_key])?;
    let at = parse_timestamp(&raw_time)?;
    Some(FlightEndpoint {
        time: at.format("%H:%M").to_string(),
        date: at.format("%a, %b %-d").to_string(),
        airport_name: get_str(segment, &[airport_key, "cityName"]).unwrap_or_default(),
        airport_code: get_str(segment, &[airport_key, "code"])?,
    })
}

pub fn format_duration(total_seconds: u64) -> String {
    format!("{}h {}m", total_seconds / 3600, (total_seconds % 3600) / 60)
}

fn luggage(segment: &Value, key: &str) -> String {
    let allowance = get_path(segment, &[key])
        .and_then(Value::as_array)
        .and_then(|arr| arr.first())
        .and_then(|first| first.get("luggageAllowance"));
    let weight = allowance.and_then(|a| get_str(a, &["maxWeightPerPiece"]));
    let unit = allowance
        .and_then(|a| get_str(a, &["massUnit"]))
        .unwrap_or_default();
    match weight {
        Some(w) => format!("{w}{unit}"),
        None => "N/A".to_string(),
    }
}

fn parse_flight_offer(offer: &Value) -> Option<FlightView> {
    let segment = get_path(offer, &["segments"])?.as_array()?.first()?;
    let leg = get_path(segment, &["legs"])?.as_array()?.first()?;
    let carrier = get_path(leg, &["carriersData"])?.as_array()?.first()?;

    let airline = get_str(carrier, &["name"])?;
    let airline_code = get_str(carrier, &["code"]);
    let flight_number = get_str(leg, &["flightInfo", "flightNumber"])?;
    let departure = parse_endpoint(segment, "departureAirport", "departureTime")?;
    let arrival = parse_endpoint(segment, "arrivalAirport", "arrivalTime")?;
    let departure_raw = get_str(segment, &["departureTime"])?;

    let total = get_path(offer, &["priceBreakdown", "total"])?;
    let units = get_path(total, &["units"]).and_then(Value::as_i64).unwrap_or(0);
    let nanos = get_path(total, &["nanos"]).and_then(Value::as_i64).unwrap_or(0);
    let price = Price {
        amount: (Decimal::from(units) + Decimal::new(nanos, 9)).normalize(),
        currency_code: get_str(total, &["currencyCode"])?,
    };

    let stop_count = get_path(leg, &["flightStops"])
        .and_then(Value::as_array)
        .map(|stops| stops.len() as u32)
        .unwrap_or(0);

    let unique_id = format!(
        "{}{}-{}",
        airline_code.as_deref().unwrap_or(&airline),
        flight_number,
        departure_raw
    );

    Some(FlightView {
        id: get_str(offer, &["token"]).unwrap_or_else(|| unique_id.clone()),
        unique_id,
        airline,
        airline_code,
        airline_logo_url: get_str(carrier, &["logo"]).filter(|l| !l.is_empty()),
        flight_number,
        departure,
        arrival,
        duration_text: format_duration(
            get_path(segment, &["totalTime"])
                .and_then(Value::as_u64)
                .unwrap_or(0),
        ),
        stop_count,
        price,
        cabin_class: get_str(leg, &["cabinClass"]).unwrap_or_else(|| "ECONOMY".to_string()),
        facilities: vec![
            format!("Baggage: {}", luggage(segment, "travellerCheckedLuggage")),
            format!("Cabin Baggage: {}", luggage(segment, "travellerCabinLuggage")),
            "In flight entertainment".to_string(),
            "In flight meal".to_string(),
        ],
    })
}

pub fn parse_flights(body: &Value) -> Result<Vec<FlightView>, TripError> {
    expect_object(body)?;
    let offers = list(body, &["data", "flightOffers"]);
    let flights: Vec<FlightView> = offers.iter().filter_map(parse_flight_offer).collect();
    if flights.len() < offers.len() {
        tracing::debug!(
            skipped = offers.len() - flights.len(),
            "dropped flight offers with missing fields"
        );
    }
    Ok(flights)
}

fn parse_hotel(hotel: &Value, params: &HotelSearchParams) -> Option<HotelView> {
    let property = get_path(hotel, &["property"])?;
    let name = get_str(property, &["name"])?;
    let gross = get_path(property, &["priceBreakdown", "grossPrice"])?;

    Some(HotelView {
        id: get_str(property, &["id"]).or_else(|| get_str(hotel, &["hotel_id"]))?,
        address: get_str(property, &["wishlistName"]).unwrap_or_else(|| name.clone()),
        name,
        rating: get_f64(property, &["reviewScore"]).unwrap_or(0.0),
        review_count: get_u32(property, &["reviewCount"]).unwrap_or(0),
        price: Price {
            amount: get_decimal(gross, &["value"])?,
            currency_code: get_str(gross, &["currency"])?,
        },
        images: get_strings(property, &["photoUrls"]),
        check_in: params.arrival_date.clone(),
        check_out: params.departure_date.clone(),
        property_class: get_u32(property, &["propertyClass"]).filter(|c| *c > 0),
        facilities: get_path(property, &["facilities"]).map(|_| get_strings(property, &["facilities"])),
    })
}

pub fn parse_hotels(body: &Value, params: &HotelSearchParams) -> Result<Vec<HotelView>, TripError> {
    expect_object(body)?;
    Ok(list(body, &["data", "hotels"])
        .iter()
        .filter_map(|h| parse_hotel(h, params))
        .collect())
}

fn parse_activity(product: &Value) -> Option<ActivityView> {
    let price = get_path(product, &["representativePrice"])?;
    let stats = get_path(product, &["reviewsStats", "combinedNumericStats"]);

    Some(ActivityView {
        id: get_str(product, &["id"])?,
        name: get_str(product, &["name"])?,
        slug: get_str(product, &["slug"]).unwrap_or_default(),
        description: get_str(product, &["shortDescription"]).unwrap_or_default(),
        price: Price {
            amount: get_decimal(price, &["chargeAmount"])?,
            currency_code: get_str(price, &["currency"])?,
        },
        images: get_str(product, &["primaryPhoto", "small"]).into_iter().collect(),
        rating: stats.and_then(|s| get_f64(s, &["average"])).unwrap_or(0.0),
        review_count: stats.and_then(|s| get_u32(s, &["total"])).unwrap_or(0),
        location_name: get_str(product, &["ufiDetails", "bCityName"]).unwrap_or_default(),
        free_cancellation: get_path(product, &["cancellationPolicy", "hasFreeCancellation"])
            .and_then(Value::as_bool)
            .unwrap_or(false),
    })
}

pub fn parse_activities(body: &Value) -> Result<Vec<ActivityView>, TripError> {
    expect_object(body)?;
    Ok(list(body, &["data", "products"])
        .iter()
        .filter_map(parse_activity)
        .collect())
}
