use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use wreq::Client;

use crate::error::{self, TripError};

pub const BASE_URL: &str = "https://booking-com15.p.rapidapi.com/api/v1";
const RAPIDAPI_HOST: &str = "booking-com15.p.rapidapi.com";

/// The narrow view of the travel provider the rest of the crate depends on.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn get_json(&self, path: &str, params: &[(String, String)]) -> Result<Value, TripError>;
}

#[derive(Clone)]
pub struct FetchOptions {
    pub api_key: Option<String>,
    pub base_url: String,
    pub proxy: Option<String>,
    pub timeout: u64,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: BASE_URL.to_string(),
            proxy: None,
            timeout: 30,
        }
    }
}

pub struct ApiClient {
    client: Client,
    base_url: String,
    api_key: String,
}

impl ApiClient {
    pub fn new(options: &FetchOptions) -> Result<Self, TripError> {
        let api_key = options
            .api_key
            .clone()
            .filter(|k| !k.trim().is_empty())
            .ok_or(TripError::MissingApiKey)?;

        let mut builder = Client::builder().timeout(Duration::from_secs(options.timeout));

        if let Some(ref proxy) = options.proxy {
            builder = builder.proxy(wreq::Proxy::all(proxy).map_err(error::from_http_error)?);
        }

        let client = builder.build().map_err(error::from_http_error)?;

        Ok(Self {
            client,
            base_url: options.base_url.trim_end_matches('/').to_string(),
            api_key,
        })
    }
}

#[async_trait]
impl Transport for ApiClient {
    async fn get_json(&self, path: &str, params: &[(String, String)]) -> Result<Value, TripError> {
        let url = format!("{}{path}", self.base_url);
        tracing::debug!(%url, params = params.len(), "requesting travel API");

        let response = self
            .client
            .get(url.as_str())
            .header("x-rapidapi-host", RAPIDAPI_HOST)
            .header("x-rapidapi-key", self.api_key.as_str())
            .query(params)
            .send()
            .await
            .map_err(error::from_http_error)?;

        let status = response.status().as_u16();
        match status {
            200 => {}
            429 => return Err(TripError::RateLimited),
            401 | 403 => return Err(TripError::Unauthorized(status)),
            _ if status >= 400 => return Err(TripError::HttpStatus(status)),
            _ => {}
        }

        let body = response.text().await.map_err(error::from_http_error)?;
        let json: Value =
            serde_json::from_str(&body).map_err(|e| TripError::Decode(e.to_string()))?;

        if json.get("status").and_then(Value::as_bool) == Some(false) {
            let message = json
                .get("message")
                .map(|m| match m {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                })
                .unwrap_or_else(|| "request rejected".to_string());
            tracing::warn!(%url, %message, "travel API returned status=false");
            return Err(TripError::ProviderRejected(message));
        }

        Ok(json)
    }
}
