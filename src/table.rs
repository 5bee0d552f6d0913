use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use rust_decimal::Decimal;

use crate::itinerary::Itinerary;
use crate::model::*;

pub fn currency_symbol(code: &str) -> Option<&'static str> {
    match code {
        "USD" => Some("$"),
        "EUR" => Some("€"),
        "GBP" => Some("£"),
        "INR" => Some("₹"),
        "AED" => Some("د.إ"),
        _ => None,
    }
}

pub fn format_price(price: &Price) -> String {
    let amount: Decimal = price.amount.round_dp(2);
    match currency_symbol(&price.currency_code) {
        Some(symbol) => format!("{symbol}{amount}"),
        None => format!("{amount} {}", price.currency_code),
    }
}

fn new_table(header: Vec<&str>) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(header);
    table
}

fn marker(itinerary: Option<&Itinerary>, payload: Payload) -> &'static str {
    match itinerary {
        Some(it) if it.contains_equivalent(&payload) => "✓",
        _ => "",
    }
}

pub fn render_locations(records: &[LocationRecord]) -> String {
    let mut table = new_table(vec!["#", "Name", "Country", "Region", "Code", "Id"]);
    for (i, r) in records.iter().enumerate() {
        table.add_row(vec![
            (i + 1).to_string(),
            r.name.clone(),
            r.country.clone(),
            r.region.clone().unwrap_or_default(),
            r.tag.clone().unwrap_or_default(),
            r.id.to_string(),
        ]);
    }
    table.to_string()
}

pub fn render_flights(flights: &[FlightView], itinerary: Option<&Itinerary>) -> String {
    let mut table = new_table(vec![
        "#", "Airline", "Flight", "Depart", "Arrive", "Duration", "Stops", "Cabin", "Price", "",
    ]);

    for (i, f) in flights.iter().enumerate() {
        let depart = format!(
            "{} {}\n{} ({})",
            f.departure.date, f.departure.time, f.departure.airport_name, f.departure.airport_code
        );
        let arrive = format!(
            "{} {}\n{} ({})",
            f.arrival.date, f.arrival.time, f.arrival.airport_name, f.arrival.airport_code
        );
        let stops = match f.stop_count {
            0 => "Nonstop".to_string(),
            1 => "1 stop".to_string(),
            n => format!("{n} stops"),
        };

        table.add_row(vec![
            (i + 1).to_string(),
            f.airline.clone(),
            f.flight_number.clone(),
            depart,
            arrive,
            f.duration_text.clone(),
            stops,
            f.cabin_class.clone(),
            format_price(&f.price),
            marker(itinerary, Payload::Flight(f.clone())).to_string(),
        ]);
    }

    table.to_string()
}

fn rating_label(rating: f64) -> &'static str {
    if rating >= 9.0 {
        "Wonderful"
    } else if rating >= 8.0 {
        "Very good"
    } else if rating >= 7.0 {
        "Good"
    } else {
        "Pleasant"
    }
}

const MAX_STARS: u32 = 5;

pub fn render_hotels(hotels: &[HotelView], itinerary: Option<&Itinerary>) -> String {
    let mut table = new_table(vec![
        "#", "Hotel", "Class", "Rating", "Stay", "Price", "",
    ]);

    for (i, h) in hotels.iter().enumerate() {
        let class = h
            .property_class
            .map(|c| "★".repeat(c.min(MAX_STARS) as usize))
            .unwrap_or_default();
        let rating = if h.review_count == 0 {
            "—".to_string()
        } else {
            format!("{:.1} {} ({} reviews)", h.rating, rating_label(h.rating), h.review_count)
        };
        let name = if h.address == h.name {
            h.name.clone()
        } else {
            format!("{}\n{}", h.name, h.address)
        };

        table.add_row(vec![
            (i + 1).to_string(),
            name,
            class,
            rating,
            format!("{} → {}", h.check_in, h.check_out),
            format_price(&h.price),
            marker(itinerary, Payload::Hotel(h.clone())).to_string(),
        ]);
    }

    table.to_string()
}

pub fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() > max_chars {
        let head: String = text.chars().take(max_chars).collect();
        format!("{head}...")
    } else {
        text.to_string()
    }
}

pub fn render_activities(activities: &[ActivityView], itinerary: Option<&Itinerary>) -> String {
    let mut table = new_table(vec![
        "#", "Activity", "Location", "Rating", "Cancellation", "Price", "",
    ]);

    for (i, a) in activities.iter().enumerate() {
        let rating = if a.review_count == 0 {
            "—".to_string()
        } else {
            format!("{:.1} ({} reviews)", a.rating, a.review_count)
        };
        let name = if a.description.is_empty() {
            a.name.clone()
        } else {
            format!("{}\n{}", a.name, truncate(&a.description, 80))
        };

        table.add_row(vec![
            (i + 1).to_string(),
            name,
            a.location_name.clone(),
            rating,
            if a.free_cancellation { "Free" } else { "—" }.to_string(),
            format_price(&a.price),
            marker(itinerary, Payload::Activity(a.clone())).to_string(),
        ]);
    }

    table.to_string()
}

pub fn render_results(results: &SearchResults, itinerary: Option<&Itinerary>) -> String {
    match results {
        SearchResults::Flights(v) => render_flights(v, itinerary),
        SearchResults::Hotels(v) => render_hotels(v, itinerary),
        SearchResults::Activities(v) => render_activities(v, itinerary),
    }
}

fn entry_details(payload: &Payload) -> String {
    match payload {
        Payload::Flight(f) => format!(
            "{} {} → {} {} ({}, {})",
            f.departure.airport_code,
            f.departure.date,
            f.arrival.airport_code,
            f.arrival.time,
            f.duration_text,
            f.cabin_class
        ),
        Payload::Hotel(h) => format!("{} → {}", h.check_in, h.check_out),
        Payload::Activity(a) => a.location_name.clone(),
    }
}

pub fn render_itinerary(entries: &[ItineraryEntry]) -> String {
    let mut table = new_table(vec!["Id", "Type", "Item", "Details", "Price", "Added"]);

    for e in entries {
        table.add_row(vec![
            e.id.clone(),
            e.kind().title().to_string(),
            e.payload.label(),
            entry_details(&e.payload),
            format_price(e.payload.price()),
            e.added_at.format("%Y-%m-%d %H:%M").to_string(),
        ]);
    }

    table.to_string()
}

/// Sums entry prices per currency, in first-seen order.
pub fn totals(entries: &[ItineraryEntry]) -> Vec<Price> {
    let mut out: Vec<Price> = Vec::new();
    for e in entries {
        let price = e.payload.price();
        match out.iter_mut().find(|p| p.currency_code == price.currency_code) {
            Some(total) => total.amount += price.amount,
            None => out.push(price.clone()),
        }
    }
    out
}
