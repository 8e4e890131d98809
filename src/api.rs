// API client module: a small blocking HTTP client that talks to the
// shop's Admin API. Everything else in the crate goes through the
// `ThemeApi` trait so the theme operations can run against a fake.

use crate::credentials::Auth;
use crate::error::ApiError;
use crate::model::{Asset, NewTheme, Theme, ThemeUpdate};
use log::{debug, warn};
use reqwest::blocking::{Client, RequestBuilder, Response};
use reqwest::header::RETRY_AFTER;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use std::thread;
use std::time::Duration;

pub const DEFAULT_API_VERSION: &str = "2024-01";
const MAX_ATTEMPTS: u32 = 3;
const DEFAULT_RETRY_AFTER: Duration = Duration::from_secs(2);
const MAX_RETRY_AFTER: Duration = Duration::from_secs(60);

/// Operations on themes and their assets.
pub trait ThemeApi {
    fn list_themes(&self) -> Result<Vec<Theme>, ApiError>;
    fn get_theme(&self, id: u64) -> Result<Theme, ApiError>;
    fn update_theme(&self, id: u64, update: &ThemeUpdate) -> Result<Theme, ApiError>;
    fn create_theme(&self, theme: &NewTheme) -> Result<Theme, ApiError>;
    fn delete_theme(&self, id: u64) -> Result<Theme, ApiError>;
    fn list_assets(&self, theme_id: u64) -> Result<Vec<Asset>, ApiError>;
    fn get_asset(&self, theme_id: u64, key: &str) -> Result<Asset, ApiError>;
    fn put_asset(&self, theme_id: u64, asset: &Asset) -> Result<Asset, ApiError>;
}

/// Blocking Admin API client authenticated with a private app's key and
/// password.
#[derive(Clone)]
pub struct ShopifyClient {
    client: Client,
    base_url: String,
    api_key: String,
    password: String,
}

impl ShopifyClient {
    /// Create a client for the shop named in `auth`. The API version
    /// comes from `SHOPIFY_API_VERSION` or falls back to
    /// [`DEFAULT_API_VERSION`].
    pub fn new(auth: &Auth) -> Result<Self, ApiError> {
        let version =
            std::env::var("SHOPIFY_API_VERSION").unwrap_or_else(|_| DEFAULT_API_VERSION.into());
        let base_url = format!(
            "https://{}.myshopify.com/admin/api/{}",
            auth.shop_name(),
            version
        );
        Self::with_base_url(auth, base_url)
    }

    /// Create a client pointed at an explicit base URL.
    pub fn with_base_url(auth: &Auth, base_url: impl Into<String>) -> Result<Self, ApiError> {
        let client = Client::builder()
            .user_agent(concat!("shopify-cli/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(ShopifyClient {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: auth.api_key.clone(),
            password: auth.password.clone(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    /// Send a request, retrying while the API answers 429.
    fn send(&self, build: impl Fn(&Client) -> RequestBuilder) -> Result<Response, ApiError> {
        for attempt in 1..=MAX_ATTEMPTS {
            let res = build(&self.client)
                .basic_auth(&self.api_key, Some(&self.password))
                .send()?;
            let status = res.status();
            debug!("{} {}", status.as_u16(), res.url().path());

            if status == StatusCode::TOO_MANY_REQUESTS {
                let wait = retry_after(&res);
                warn!("rate limited (attempt {attempt}/{MAX_ATTEMPTS}), waiting {wait:?}");
                if attempt < MAX_ATTEMPTS {
                    thread::sleep(wait);
                }
                continue;
            }
            if !status.is_success() {
                let body = res.text().unwrap_or_default();
                return Err(ApiError::Status {
                    status: status.as_u16(),
                    body,
                });
            }
            return Ok(res);
        }
        Err(ApiError::RateLimited {
            attempts: MAX_ATTEMPTS,
        })
    }

    /// Decode the resource wrapped under `key` in the response body.
    fn decode<T: DeserializeOwned>(res: Response, key: &str) -> Result<T, ApiError> {
        let body: Value = res.json()?;
        unwrap_value(body, key)
    }
}

fn unwrap_value<T: DeserializeOwned>(mut body: Value, key: &str) -> Result<T, ApiError> {
    // Some endpoints return the bare resource instead of `{key: ..}`.
    let inner = match body.get_mut(key).map(Value::take) {
        Some(v) => v,
        None => body,
    };
    serde_json::from_value(inner).map_err(|e| ApiError::Decode(format!("{key}: {e}")))
}

fn retry_after(res: &Response) -> Duration {
    res.headers()
        .get(RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(parse_retry_after)
        .unwrap_or(DEFAULT_RETRY_AFTER)
}

/// Seconds from a `Retry-After` header, capped at [`MAX_RETRY_AFTER`].
/// Negative, non-finite and out of range values are ignored.
fn parse_retry_after(value: &str) -> Option<Duration> {
    let secs = value.trim().parse::<f64>().ok()?;
    Duration::try_from_secs_f64(secs)
        .ok()
        .map(|wait| wait.min(MAX_RETRY_AFTER))
}

impl ThemeApi for ShopifyClient {
    fn list_themes(&self) -> Result<Vec<Theme>, ApiError> {
        let url = self.url("themes.json");
        let res = self.send(|c| c.get(&url))?;
        Self::decode(res, "themes")
    }

    fn get_theme(&self, id: u64) -> Result<Theme, ApiError> {
        let url = self.url(&format!("themes/{id}.json"));
        let res = self.send(|c| c.get(&url))?;
        Self::decode(res, "theme")
    }

    fn update_theme(&self, id: u64, update: &ThemeUpdate) -> Result<Theme, ApiError> {
        let url = self.url(&format!("themes/{id}.json"));
        let body = json!({ "theme": update });
        let res = self.send(|c| c.put(&url).json(&body))?;
        Self::decode(res, "theme")
    }

    fn create_theme(&self, theme: &NewTheme) -> Result<Theme, ApiError> {
        let url = self.url("themes.json");
        let body = json!({ "theme": theme });
        let res = self.send(|c| c.post(&url).json(&body))?;
        Self::decode(res, "theme")
    }

    fn delete_theme(&self, id: u64) -> Result<Theme, ApiError> {
        let url = self.url(&format!("themes/{id}.json"));
        let res = self.send(|c| c.delete(&url))?;
        Self::decode(res, "theme")
    }

    fn list_assets(&self, theme_id: u64) -> Result<Vec<Asset>, ApiError> {
        let url = self.url(&format!("themes/{theme_id}/assets.json"));
        let res = self.send(|c| c.get(&url))?;
        Self::decode(res, "assets")
    }

    fn get_asset(&self, theme_id: u64, key: &str) -> Result<Asset, ApiError> {
        let url = self.url(&format!("themes/{theme_id}/assets.json"));
        let res = self.send(|c| c.get(&url).query(&[("asset[key]", key)]))?;
        Self::decode(res, "asset")
    }

    fn put_asset(&self, theme_id: u64, asset: &Asset) -> Result<Asset, ApiError> {
        let url = self.url(&format!("themes/{theme_id}/assets.json"));
        let body = json!({ "asset": asset });
        let res = self.send(|c| c.put(&url).json(&body))?;
        Self::decode(res, "asset")
    }
}
