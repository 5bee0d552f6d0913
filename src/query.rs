use chrono::NaiveDate;

use crate::error::TripError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Stops {
    #[default]
    Any,
    Nonstop,
    One,
    Two,
}

impl Stops {
    pub fn from_str_loose(s: &str) -> Result<Self, TripError> {
        match s {
            "none" | "any" => Ok(Self::Any),
            "0" | "nonstop" => Ok(Self::Nonstop),
            "1" => Ok(Self::One),
            "2" => Ok(Self::Two),
            _ => Err(TripError::Validation(format!("invalid stops filter: {s}"))),
        }
    }

    pub fn as_param(&self) -> &'static str {
        match self {
            Self::Any => "none",
            Self::Nonstop => "0",
            Self::One => "1",
            Self::Two => "2",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FlightSort {
    #[default]
    Best,
    Cheapest,
    Fastest,
}

impl FlightSort {
    pub fn from_str_loose(s: &str) -> Result<Self, TripError> {
        match s.to_ascii_uppercase().as_str() {
            "BEST" => Ok(Self::Best),
            "CHEAPEST" => Ok(Self::Cheapest),
            "FASTEST" => Ok(Self::Fastest),
            _ => Err(TripError::Validation(format!("invalid sort order: {s}"))),
        }
    }

    pub fn as_param(&self) -> &'static str {
        match self {
            Self::Best => "BEST",
            Self::Cheapest => "CHEAPEST",
            Self::Fastest => "FASTEST",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CabinClass {
    #[default]
    Economy,
    PremiumEconomy,
    Business,
    First,
}

impl CabinClass {
    pub fn from_str_loose(s: &str) -> Result<Self, TripError> {
        match s.to_ascii_uppercase().replace('-', "_").as_str() {
            "ECONOMY" => Ok(Self::Economy),
            "PREMIUM_ECONOMY" => Ok(Self::PremiumEconomy),
            "BUSINESS" => Ok(Self::Business),
            "FIRST" => Ok(Self::First),
            _ => Err(TripError::Validation(format!("invalid cabin class: {s}"))),
        }
    }

    pub fn as_param(&self) -> &'static str {
        match self {
            Self::Economy => "ECONOMY",
            Self::PremiumEconomy => "PREMIUM_ECONOMY",
            Self::Business => "BUSINESS",
            Self::First => "FIRST",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ActivitySort {
    #[default]
    Trending,
    BookScore,
    LowestPrice,
}

impl ActivitySort {
    pub fn from_str_loose(s: &str) -> Result<Self, TripError> {
        match s {
            "trending" => Ok(Self::Trending),
            "attr_book_score" => Ok(Self::BookScore),
            "lowest_price" => Ok(Self::LowestPrice),
            _ => Err(TripError::Validation(format!("invalid activity sort: {s}"))),
        }
    }

    pub fn as_param(&self) -> &'static str {
        match self {
            Self::Trending => "trending",
            Self::BookScore => "attr_book_score",
            Self::LowestPrice => "lowest_price",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FlightSearchParams {
    pub from_id: String,
    pub to_id: String,
    pub depart_date: String,
    pub return_date: Option<String>,
    pub stops: Stops,
    pub page_no: u32,
    pub adults: u32,
    pub children: Option<String>,
    pub sort: FlightSort,
    pub cabin_class: CabinClass,
    pub currency: String,
}

impl FlightSearchParams {
    pub fn new(from_id: &str, to_id: &str, depart_date: &str) -> Self {
        Self {
            from_id: from_id.to_string(),
            to_id: to_id.to_string(),
            depart_date: depart_date.to_string(),
            return_date: None,
            stops: Stops::Any,
            page_no: 1,
            adults: 1,
            children: None,
            sort: FlightSort::Best,
            cabin_class: CabinClass::Economy,
            currency: "USD".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct HotelSearchParams {
    pub dest_id: String,
    pub search_type: String,
    pub arrival_date: String,
    pub departure_date: String,
    pub adults: u32,
    pub children_age: Option<String>,
    pub room_qty: u32,
    pub page_number: u32,
    pub price_min: Option<u32>,
    pub price_max: Option<u32>,
    pub sort_by: Option<String>,
    pub categories_filter: Option<String>,
    pub units: String,
    pub temperature_unit: String,
    pub language: String,
    pub currency: String,
    pub location: String,
}

impl HotelSearchParams {
    pub fn new(dest_id: &str, search_type: &str, arrival_date: &str, departure_date: &str) -> Self {
        Self {
            dest_id: dest_id.to_string(),
            search_type: search_type.to_string(),
            arrival_date: arrival_date.to_string(),
            departure_date: departure_date.to_string(),
            adults: 1,
            children_age: None,
            room_qty: 1,
            page_number: 1,
            price_min: None,
            price_max: None,
            sort_by: None,
            categories_filter: None,
            units: "metric".to_string(),
            temperature_unit: "c".to_string(),
            language: "en-us".to_string(),
            currency: "USD".to_string(),
            location: "US".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ActivitySearchParams {
    pub id: String,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub sort_by: ActivitySort,
    pub page: u32,
    pub currency: String,
    pub language: String,
}

impl ActivitySearchParams {
    pub fn new(id: &str) -> Self {
        Self {
            id: id.to_string(),
            start_date: None,
            end_date: None,
            sort_by: ActivitySort::Trending,
            page: 1,
            currency: "USD".to_string(),
            language: "en-us".to_string(),
        }
    }
}

pub fn parse_date(date: &str) -> Result<NaiveDate, TripError> {
    if date.len() != 10 {
        return Err(TripError::InvalidDate(date.to_string()));
    }
    NaiveDate::parse_from_str(date, "%Y-%m-%d").map_err(|_| TripError::InvalidDate(date.to_string()))
}

fn require(value: &str, name: &'static str, missing: &mut Vec<&'static str>) {
    if value.trim().is_empty() {
        missing.push(name);
    }
}

fn validate_range(start: &str, end: Option<&str>, what: &str) -> Result<(), TripError> {
    let start = parse_date(start)?;
    if let Some(end) = end {
        let end = parse_date(end)?;
        if end < start {
            return Err(TripError::Validation(format!(
                "{what} cannot be before {start}"
            )));
        }
    }
    Ok(())
}

fn at_least_one(value: u32, what: &str) -> Result<(), TripError> {
    if value == 0 {
        return Err(TripError::Validation(format!("{what} must be at least 1")));
    }
    Ok(())
}

fn push_opt(params: &mut Vec<(String, String)>, key: &str, value: Option<&str>) {
    params.push((key.to_string(), value.unwrap_or_default().to_string()));
}

impl FlightSearchParams {
    pub fn validate(&self) -> Result<(), TripError> {
        let mut missing = Vec::new();
        require(&self.from_id, "fromId", &mut missing);
        require(&self.to_id, "toId", &mut missing);
        require(&self.depart_date, "departDate", &mut missing);
        if !missing.is_empty() {
            return Err(TripError::MissingParams(missing));
        }

        if self.from_id == self.to_id {
            return Err(TripError::Validation(
                "origin and destination must differ".into(),
            ));
        }

        validate_range(&self.depart_date, self.return_date.as_deref(), "return date")?;
        at_least_one(self.adults, "adults")?;
        at_least_one(self.page_no, "page number")?;
        Ok(())
    }

    /// Provider request parameters with every default filled in.
    pub fn to_api_params(&self) -> Vec<(String, String)> {
        let mut params = vec![
            ("fromId".to_string(), self.from_id.clone()),
            ("toId".to_string(), self.to_id.clone()),
            ("departDate".to_string(), self.depart_date.clone()),
        ];
        push_opt(&mut params, "returnDate", self.return_date.as_deref());
        params.push(("stops".to_string(), self.stops.as_param().to_string()));
        params.push(("pageNo".to_string(), self.page_no.to_string()));
        params.push(("adults".to_string(), self.adults.to_string()));
        push_opt(&mut params, "children", self.children.as_deref());
        params.push(("sort".to_string(), self.sort.as_param().to_string()));
        params.push(("cabinClass".to_string(), self.cabin_class.as_param().to_string()));
        params.push(("currency_code".to_string(), self.currency.clone()));
        params
    }
}

impl HotelSearchParams {
    pub fn validate(&self) -> Result<(), TripError> {
        let mut missing = Vec::new();
        require(&self.dest_id, "dest_id", &mut missing);
        require(&self.search_type, "search_type", &mut missing);
        require(&self.arrival_date, "arrival_date", &mut missing);
        require(&self.departure_date, "departure_date", &mut missing);
        if !missing.is_empty() {
            return Err(TripError::MissingParams(missing));
        }

        validate_range(
            &self.arrival_date,
            Some(self.departure_date.as_str()),
            "departure date",
        )?;
        at_least_one(self.adults, "adults")?;
        at_least_one(self.room_qty, "rooms")?;
        at_least_one(self.page_number, "page number")?;

        if let (Some(min), Some(max)) = (self.price_min, self.price_max) {
            if max > 0 && min > max {
                return Err(TripError::Validation(format!(
                    "minimum price ({min}) exceeds maximum price ({max})"
                )));
            }
        }
        Ok(())
    }

    pub fn to_api_params(&self) -> Vec<(String, String)> {
        let mut params = vec![
            ("dest_id".to_string(), self.dest_id.clone()),
            ("search_type".to_string(), self.search_type.clone()),
            ("arrival_date".to_string(), self.arrival_date.clone()),
            ("departure_date".to_string(), self.departure_date.clone()),
            ("adults".to_string(), self.adults.to_string()),
        ];
        push_opt(&mut params, "children_age", self.children_age.as_deref());
        params.push(("room_qty".to_string(), self.room_qty.to_string()));
        params.push(("page_number".to_string(), self.page_number.to_string()));
        params.push(("price_min".to_string(), self.price_min.unwrap_or(0).to_string()));
        params.push(("price_max".to_string(), self.price_max.unwrap_or(0).to_string()));
        push_opt(&mut params, "sort_by", self.sort_by.as_deref());
        push_opt(&mut params, "categories_filter", self.categories_filter.as_deref());
        params.push(("units".to_string(), self.units.clone()));
        params.push(("temperature_unit".to_string(), self.temperature_unit.clone()));
        params.push(("languagecode".to_string(), self.language.clone()));
        params.push(("currency_code".to_string(), self.currency.clone()));
        params.push(("location".to_string(), self.location.clone()));
        params
    }
}

impl ActivitySearchParams {
    pub fn validate(&self) -> Result<(), TripError> {
        if self.id.trim().is_empty() {
            return Err(TripError::MissingParams(vec!["id"]));
        }

        match (&self.start_date, &self.end_date) {
            (Some(start), end) => validate_range(start, end.as_deref(), "end date")?,
            (None, Some(end)) => {
                parse_date(end)?;
            }
            (None, None) => {}
        }
        at_least_one(self.page, "page number")?;
        Ok(())
    }

    pub fn to_api_params(&self) -> Vec<(String, String)> {
        let mut params = vec![("id".to_string(), self.id.clone())];
        push_opt(&mut params, "startDate", self.start_date.as_deref());
        push_opt(&mut params, "endDate", self.end_date.as_deref());
        params.push(("sortBy".to_string(), self.sort_by.as_param().to_string()));
        params.push(("page".to_string(), self.page.to_string()));
        params.push(("currency_code".to_string(), self.currency.clone()));
        params.push(("languagecode".to_string(), self.language.clone()));
        params
    }
}
