//! Results routes: `/{domain}/results?<flat query map>`.
//!
//! A route carries everything needed to re-run a search, so it is what the
//! CLI prints with `--url` and what `tripr results` accepts back. Only keys
//! that differ from absent are written; defaults are applied when parsing.

use std::collections::BTreeMap;

use url::form_urlencoded;

use crate::error::TripError;
use crate::query::{
    ActivitySearchParams, ActivitySort, CabinClass, FlightSearchParams, FlightSort,
    HotelSearchParams, Stops,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Domain {
    Flights,
    Hotels,
    Activities,
}

impl Domain {
    pub fn from_str_loose(s: &str) -> Result<Self, TripError> {
        match s.to_ascii_lowercase().as_str() {
            "flights" | "flight" => Ok(Self::Flights),
            "hotels" | "hotel" => Ok(Self::Hotels),
            "activities" | "activity" | "attractions" => Ok(Self::Activities),
            _ => Err(TripError::Validation(format!(
                "invalid domain: {s} (expected flights, hotels or activities)"
            ))),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Flights => "flights",
            Self::Hotels => "hotels",
            Self::Activities => "activities",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SearchRoute {
    Flights(FlightSearchParams),
    Hotels(HotelSearchParams),
    Activities(ActivitySearchParams),
}

pub type QueryMap = BTreeMap<String, String>;

fn get<'a>(map: &'a QueryMap, key: &str) -> Option<&'a str> {
    map.get(key).map(String::as_str).filter(|v| !v.is_empty())
}

fn get_owned(map: &QueryMap, key: &str) -> Option<String> {
    get(map, key).map(String::from)
}

fn get_num(map: &QueryMap, key: &str) -> Result<Option<u32>, TripError> {
    get(map, key)
        .map(|v| {
            v.parse::<u32>()
                .map_err(|_| TripError::Validation(format!("{key} must be a number, got \"{v}\"")))
        })
        .transpose()
}

fn required(map: &QueryMap, keys: &[&'static str]) -> Result<(), TripError> {
    let missing: Vec<&'static str> = keys
        .iter()
        .copied()
        .filter(|k| get(map, k).is_none())
        .collect();
    if missing.is_empty() {
        Ok(())
    } else {
        Err(TripError::MissingParams(missing))
    }
}

fn put(out: &mut Vec<(String, String)>, key: &str, value: impl ToString) {
    out.push((key.to_string(), value.to_string()));
}

fn put_opt(out: &mut Vec<(String, String)>, key: &str, value: Option<impl ToString>) {
    if let Some(v) = value {
        put(out, key, v);
    }
}

impl SearchRoute {
    pub fn domain(&self) -> Domain {
        match self {
            Self::Flights(_) => Domain::Flights,
            Self::Hotels(_) => Domain::Hotels,
            Self::Activities(_) => Domain::Activities,
        }
    }

    pub fn path(&self) -> String {
        format!("/{}/results", self.domain().as_str())
    }

    pub fn validate(&self) -> Result<(), TripError> {
        match self {
            Self::Flights(p) => p.validate(),
            Self::Hotels(p) => p.validate(),
            Self::Activities(p) => p.validate(),
        }
    }

    pub fn to_query_map(&self) -> Vec<(String, String)> {
        let mut out = Vec::new();
        match self {
            Self::Flights(p) => {
                put(&mut out, "fromId", &p.from_id);
                put(&mut out, "toId", &p.to_id);
                put(&mut out, "departDate", &p.depart_date);
                put_opt(&mut out, "returnDate", p.return_date.as_ref());
                put(&mut out, "adults", p.adults);
                put_opt(&mut out, "children", p.children.as_ref());
                put(&mut out, "cabinClass", p.cabin_class.as_param());
                put(&mut out, "sort", p.sort.as_param());
                put(&mut out, "stops", p.stops.as_param());
                put(&mut out, "pageNo", p.page_no);
                put(&mut out, "currency_code", &p.currency);
            }
            Self::Hotels(p) => {
                put(&mut out, "dest_id", &p.dest_id);
                put(&mut out, "search_type", &p.search_type);
                put(&mut out, "arrival_date", &p.arrival_date);
                put(&mut out, "departure_date", &p.departure_date);
                put(&mut out, "adults", p.adults);
                put_opt(&mut out, "children_age", p.children_age.as_ref());
                put(&mut out, "room_qty", p.room_qty);
                put(&mut out, "page_number", p.page_number);
                put_opt(&mut out, "price_min", p.price_min);
                put_opt(&mut out, "price_max", p.price_max);
                put_opt(&mut out, "sort_by", p.sort_by.as_ref());
                put_opt(&mut out, "categories_filter", p.categories_filter.as_ref());
                put(&mut out, "units", &p.units);
                put(&mut out, "temperature_unit", &p.temperature_unit);
                put(&mut out, "languagecode", &p.language);
                put(&mut out, "currency_code", &p.currency);
                put(&mut out, "location", &p.location);
            }
            Self::Activities(p) => {
                put(&mut out, "id", &p.id);
                put_opt(&mut out, "startDate", p.start_date.as_ref());
                put_opt(&mut out, "endDate", p.end_date.as_ref());
                put(&mut out, "sortBy", p.sort_by.as_param());
                put(&mut out, "page", p.page);
                put(&mut out, "currency_code", &p.currency);
                put(&mut out, "languagecode", &p.language);
            }
        }
        out
    }

    pub fn to_url(&self) -> String {
        let query = form_urlencoded::Serializer::new(String::new())
            .extend_pairs(self.to_query_map())
            .finish();
        format!("{}?{query}", self.path())
    }

    pub fn from_query_map(domain: Domain, map: &QueryMap) -> Result<Self, TripError> {
        match domain {
            Domain::Flights => {
                required(map, &["fromId", "toId", "departDate"])?;
                let mut p = FlightSearchParams::new(
                    get(map, "fromId").unwrap_or_default(),
                    get(map, "toId").unwrap_or_default(),
                    get(map, "departDate").unwrap_or_default(),
                );
                p.return_date = get_owned(map, "returnDate");
                p.children = get_owned(map, "children");
                if let Some(v) = get_num(map, "adults")? {
                    p.adults = v;
                }
                if let Some(v) = get_num(map, "pageNo")? {
                    p.page_no = v;
                }
                if let Some(v) = get(map, "stops") {
                    p.stops = Stops::from_str_loose(v)?;
                }
                if let Some(v) = get(map, "sort") {
                    p.sort = FlightSort::from_str_loose(v)?;
                }
                if let Some(v) = get(map, "cabinClass") {
                    p.cabin_class = CabinClass::from_str_loose(v)?;
                }
                if let Some(v) = get_owned(map, "currency_code") {
                    p.currency = v;
                }
                Ok(Self::Flights(p))
            }
            Domain::Hotels => {
                required(map, &["dest_id", "search_type", "arrival_date", "departure_date"])?;
                let mut p = HotelSearchParams::new(
                    get(map, "dest_id").unwrap_or_default(),
                    get(map, "search_type").unwrap_or_default(),
                    get(map, "arrival_date").unwrap_or_default(),
                    get(map, "departure_date").unwrap_or_default(),
                );
                if let Some(v) = get_num(map, "adults")? {
                    p.adults = v;
                }
                p.children_age = get_owned(map, "children_age");
                if let Some(v) = get_num(map, "room_qty")? {
                    p.room_qty = v;
                }
                if let Some(v) = get_num(map, "page_number")? {
                    p.page_number = v;
                }
                p.price_min = get_num(map, "price_min")?;
                p.price_max = get_num(map, "price_max")?;
                p.sort_by = get_owned(map, "sort_by");
                p.categories_filter = get_owned(map, "categories_filter");
                if let Some(v) = get_owned(map, "units") {
                    p.units = v;
                }
                if let Some(v) = get_owned(map, "temperature_unit") {
                    p.temperature_unit = v;
                }
                if let Some(v) = get_owned(map, "languagecode") {
                    p.language = v;
                }
                if let Some(v) = get_owned(map, "currency_code") {
                    p.currency = v;
                }
                if let Some(v) = get_owned(map, "location") {
                    p.location = v;
                }
                Ok(Self::Hotels(p))
            }
            Domain::Activities => {
                required(map, &["id"])?;
                let mut p = ActivitySearchParams::new(get(map, "id").unwrap_or_default());
                p.start_date = get_owned(map, "startDate");
                p.end_date = get_owned(map, "endDate");
                if let Some(v) = get(map, "sortBy") {
                    p.sort_by = ActivitySort::from_str_loose(v)?;
                }
                if let Some(v) = get_num(map, "page")? {
                    p.page = v;
                }
                if let Some(v) = get_owned(map, "currency_code") {
                    p.currency = v;
                }
                if let Some(v) = get_owned(map, "languagecode") {
                    p.language = v;
                }
                Ok(Self::Activities(p))
            }
        }
    }

    /// Accepts a bare path (`/hotels/results?...`) or a full URL whose path
    /// ends in a results route.
    pub fn parse(route: &str) -> Result<Self, TripError> {
        let trimmed = route.trim();
        let after_scheme = trimmed
            .split_once("://")
            .map(|(_, rest)| rest.find('/').map(|i| &rest[i..]).unwrap_or(""))
            .unwrap_or(trimmed);

        let (path, query) = after_scheme.split_once('?').unwrap_or((after_scheme, ""));
        let query = query.split('#').next().unwrap_or_default();

        let domain = path
            .trim_end_matches('/')
            .strip_suffix("/results")
            .and_then(|prefix| prefix.rsplit('/').next())
            .ok_or_else(|| TripError::InvalidRoute(trimmed.to_string()))
            .and_then(|d| {
                Domain::from_str_loose(d).map_err(|_| TripError::InvalidRoute(trimmed.to_string()))
            })?;

        let map: QueryMap = form_urlencoded::parse(query.as_bytes())
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();

        Self::from_query_map(domain, &map)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_ignores_fragment() {
        let route = SearchRoute::parse("/activities/results?id=eyJ1Zm&page=2#top").unwrap();
        match route {
            SearchRoute::Activities(p) => assert_eq!(p.page, 2),
            other => panic!("unexpected route {other:?}"),
        }
    }

    #[test]
    fn parse_rejects_unknown_path() {
        assert!(matches!(
            SearchRoute::parse("/cars/results?id=1"),
            Err(TripError::InvalidRoute(_))
        ));
        assert!(matches!(
            SearchRoute::parse("/flights/search?fromId=A"),
            Err(TripError::InvalidRoute(_))
        ));
    }
}
