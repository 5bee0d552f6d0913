use std::fmt;

#[derive(Debug)]
pub enum TripError {
    Timeout,
    ConnectionFailed(String),
    DnsResolution(String),
    ProxyError(String),
    RateLimited,
    Unauthorized(u16),
    HttpStatus(u16),
    TlsError(String),
    Decode(String),
    ProviderRejected(String),
    MissingApiKey,
    MissingParams(Vec<&'static str>),
    InvalidDate(String),
    InvalidRoute(String),
    Validation(String),
    Storage(String),
}

impl fmt::Display for TripError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Timeout => write!(
                f,
                "request timed out — the travel API may be slow or unreachable. \
                 Try increasing --timeout or check your connection"
            ),
            Self::ConnectionFailed(detail) => write!(
                f,
                "connection failed — check your internet connection ({detail})"
            ),
            Self::DnsResolution(host) => write!(
                f,
                "DNS resolution failed for {host} — check your internet connection"
            ),
            Self::ProxyError(detail) => write!(
                f,
                "proxy error — check your --proxy URL is correct ({detail})"
            ),
            Self::RateLimited => write!(
                f,
                "rate limited by the travel API (HTTP 429) — your RapidAPI plan quota \
                 may be exhausted, wait before retrying"
            ),
            Self::Unauthorized(status) => write!(
                f,
                "the travel API refused the request (HTTP {status}) — check that \
                 RAPIDAPI_KEY is valid and subscribed to booking-com15"
            ),
            Self::HttpStatus(status) => write!(
                f,
                "unexpected HTTP status {status} from the travel API"
            ),
            Self::TlsError(detail) => write!(
                f,
                "TLS/SSL error — connection to the travel API failed ({detail})"
            ),
            Self::Decode(detail) => write!(
                f,
                "failed to decode travel API response — {detail}"
            ),
            Self::ProviderRejected(message) => write!(
                f,
                "the travel API reported an error — {message}"
            ),
            Self::MissingApiKey => write!(
                f,
                "no API key configured — set RAPIDAPI_KEY or pass --api-key"
            ),
            Self::MissingParams(names) => write!(
                f,
                "missing required search parameters: {}",
                names.join(", ")
            ),
            Self::InvalidDate(date) => write!(
                f,
                "invalid date \"{date}\" — must be YYYY-MM-DD format (e.g. 2026-03-01)"
            ),
            Self::InvalidRoute(route) => write!(
                f,
                "unrecognised results route \"{route}\" — expected \
                 /flights/results, /hotels/results or /activities/results"
            ),
            Self::Validation(msg) => write!(f, "{msg}"),
            Self::Storage(detail) => write!(f, "itinerary storage error — {detail}"),
        }
    }
}

impl std::error::Error for TripError {}

pub fn from_http_error(err: wreq::Error) -> TripError {
    let msg = err.to_string();
    let lower = msg.to_lowercase();

    if err.is_timeout() {
        return TripError::Timeout;
    }

    if err.is_connect() {
        if lower.contains("dns") || lower.contains("resolve") || lower.contains("getaddrinfo") {
            return TripError::DnsResolution(msg);
        }
        return TripError::ConnectionFailed(msg);
    }

    if lower.contains("proxy") || lower.contains("socks") {
        return TripError::ProxyError(msg);
    }

    if lower.contains("tls") || lower.contains("ssl") || lower.contains("certificate") {
        return TripError::TlsError(msg);
    }

    if lower.contains("builder error") && lower.contains("uri") {
        return TripError::ProxyError(msg);
    }

    TripError::ConnectionFailed(msg)
}
