//! Authenticated HTTP access to the MOCO REST API.

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, Level};
use url::Url;

use crate::config::MocoConfig;
use crate::error::{MocoError, Result};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Pagination metadata declared by MOCO response headers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
  /// `X-Page`
  pub page: u64,
  /// `X-Total`
  pub total: u64,
  /// `X-Per-Page`
  pub per_page: u64,
}

impl Pagination {
  /// Read the three pagination headers. Any missing or unparsable header
  /// means the response is not paginated.
  pub fn from_headers(headers: &HeaderMap) -> Option<Self> {
    let number =
      |name: &str| -> Option<u64> { headers.get(name)?.to_str().ok()?.trim().parse().ok() };

    Some(Self {
      page: number("x-page")?,
      total: number("x-total")?,
      per_page: number("x-per-page")?,
    })
  }

  pub fn total_pages(&self) -> u64 {
    if self.per_page == 0 {
      return 0;
    }
    self.total.div_ceil(self.per_page)
  }

  pub fn has_next(&self) -> bool {
    self.page < self.total_pages()
  }
}

/// A parsed response body together with its pagination headers.
struct Page<T> {
  body: T,
  pagination: Option<Pagination>,
}

/// MOCO API client
#[derive(Clone)]
pub struct MocoClient {
  http: reqwest::Client,
  base_url: String,
  headers: HeaderMap,
}

impl MocoClient {
  pub fn new(config: &MocoConfig) -> Result<Self> {
    let mut auth = HeaderValue::from_str(&format!("Token token={}", config.api_key))
      .map_err(|_| MocoError::Config("API key contains invalid header characters".to_string()))?;
    auth.set_sensitive(true);

    let mut headers = HeaderMap::new();
    headers.insert(AUTHORIZATION, auth);
    headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

    let http = reqwest::Client::builder()
      .timeout(REQUEST_TIMEOUT)
      .user_agent(concat!("moco/", env!("CARGO_PKG_VERSION")))
      .build()
      .map_err(|e| MocoError::Config(format!("Failed to create HTTP client: {}", e)))?;

    Ok(Self {
      http,
      base_url: config.base_url.trim_end_matches('/').to_string(),
      headers,
    })
  }

  fn url(&self, endpoint: &str, params: &[(&str, String)]) -> Result<Url> {
    let raw = format!("{}/{}", self.base_url, endpoint.trim_start_matches('/'));
    Url::parse_with_params(&raw, params)
      .map_err(|e| MocoError::Config(format!("Invalid request URL {}: {}", raw, e)))
  }

  /// Issue one GET and parse its body. An empty body parses as JSON `null`.
  async fn request<T: DeserializeOwned>(
    &self,
    endpoint: &str,
    params: &[(&str, String)],
  ) -> Result<Page<T>> {
    let url = self.url(endpoint, params)?;

    if tracing::enabled!(Level::DEBUG) {
      debug!(url = %url, headers = ?redact_headers(&self.headers), "MOCO request");
    }

    let response = self
      .http
      .get(url.clone())
      .headers(self.headers.clone())
      .send()
      .await?;

    let status = response.status();
    let pagination = Pagination::from_headers(response.headers());
    let text = response.text().await?;

    if tracing::enabled!(Level::DEBUG) {
      debug!(
        url = %url,
        status = status.as_u16(),
        ?pagination,
        bytes = text.len(),
        "MOCO response"
      );
    }

    if !status.is_success() {
      return Err(MocoError::http(
        status.as_u16(),
        status.canonical_reason().unwrap_or_default(),
      ));
    }

    let parsed = if text.trim().is_empty() {
      serde_json::from_value(serde_json::Value::Null)
    } else {
      serde_json::from_str(&text)
    };
    let body = parsed.map_err(|e| MocoError::Parse(format!("{} from {}", e, endpoint)))?;

    Ok(Page { body, pagination })
  }

  /// GET a single resource or page.
  #[allow(dead_code)]
  pub async fn get<T: DeserializeOwned>(
    &self,
    endpoint: &str,
    params: &[(&str, String)],
  ) -> Result<T> {
    Ok(self.request(endpoint, params).await?.body)
  }

  /// GET every page of a list endpoint.
  ///
  /// Follows `X-Page`/`X-Total`/`X-Per-Page` until the last page and returns
  /// the items in server order. A response without those headers is the only
  /// page. Progress is measured against the page we asked for as well as the
  /// one reported, so a server that ignores `page` cannot loop us forever.
  pub async fn get_all_pages<T: DeserializeOwned>(
    &self,
    endpoint: &str,
    params: &[(&str, String)],
  ) -> Result<Vec<T>> {
    let mut all_items = Vec::new();
    let mut page = 1u64;

    loop {
      let mut page_params = params.to_vec();
      page_params.push(("page", page.to_string()));

      let response: Page<Option<Vec<T>>> = self.request(endpoint, &page_params).await?;
      all_items.extend(response.body.unwrap_or_default());

      let Some(pagination) = response.pagination else {
        break;
      };
      let reached = Pagination {
        page: pagination.page.max(page),
        ..pagination
      };
      if !reached.has_next() {
        break;
      }
      page += 1;
    }

    Ok(all_items)
  }
}

/// Mask a secret for logging.
///
/// Longer than 8 characters keeps the first and last 4; anything shorter is
/// masked completely.
pub fn redact_secret(secret: &str) -> String {
  let chars: Vec<char> = secret.chars().collect();
  if chars.len() > 8 {
    let prefix: String = chars[..4].iter().collect();
    let suffix: String = chars[chars.len() - 4..].iter().collect();
    format!("{}...{}", prefix, suffix)
  } else {
    "*".repeat(chars.len())
  }
}

/// Header name/value pairs safe to log.
fn redact_headers(headers: &HeaderMap) -> Vec<(String, String)> {
  headers
    .iter()
    .map(|(name, value)| {
      let value = value.to_str().unwrap_or("<binary>");
      let value = if *name == AUTHORIZATION {
        redact_secret(value)
      } else {
        value.to_string()
      };
      (name.to_string(), value)
    })
    .collect()
}
