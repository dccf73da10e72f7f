use std::time::Duration;

use reqwest::header::{HeaderMap, LINK};
use reqwest::{Client, Response, StatusCode};
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::{HomeroomError, Result};

/// Upper bound on followed `rel="next"` links for a single list call.
const MAX_PAGES: usize = 100;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// HTTP client for the Canvas LMS REST API using a bearer access token.
///
/// List endpoints are paginated through `Link` headers. The pages are
/// concatenated into one JSON array, but a first page that is not an array
/// is handed back untouched so the mapper can decide how to degrade.
pub struct CanvasClient {
    base_url: String,
    token: String,
    per_page: u32,
    http: Client,
}

impl CanvasClient {
    pub fn new(base_url: &str, token: &str, per_page: u32) -> Result<Self> {
        let http = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .user_agent(concat!("homeroom/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self::with_http_client(base_url, token, per_page, http))
    }

    /// Create a client with a custom reqwest::Client (useful for testing).
    pub fn with_http_client(base_url: &str, token: &str, per_page: u32, http: Client) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.to_string(),
            per_page: per_page.max(1),
            http,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Fetch every page of a list endpoint.
    ///
    /// `path` is relative to the base URL (e.g. "/api/v1/users/self/observees").
    pub async fn get_list(&self, path: &str, query: &[(&str, &str)]) -> Result<Value> {
        let mut query: Vec<(String, String)> = query
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        query.push(("per_page".to_string(), self.per_page.to_string()));

        let mut url = format!("{}{path}", self.base_url);
        let mut items: Vec<Value> = Vec::new();

        for page in 0..MAX_PAGES {
            debug!(url = %url, page, "Fetching page");

            let mut request = self.http.get(&url).bearer_auth(&self.token);
            if page == 0 {
                request = request.query(&query);
            }
            let response = check_status(request.send().await?, path).await?;
            let next = next_link(response.headers());

            let body = response.text().await?;
            let value: Value = serde_json::from_str(&body).map_err(|e| {
                HomeroomError::Upstream(format!("failed to parse response from {path}: {e}"))
            })?;

            match value {
                Value::Array(mut page_items) => items.append(&mut page_items),
                other if page == 0 => return Ok(other),
                _ => {
                    warn!(endpoint = %path, page, "Non-list page in paginated response, stopping");
                    return Ok(Value::Array(items));
                }
            }

            match next {
                Some(next_url) => url = next_url,
                None => {
                    debug!(endpoint = %path, count = items.len(), "Pagination complete");
                    return Ok(Value::Array(items));
                }
            }
        }

        warn!(
            endpoint = %path,
            pages = MAX_PAGES,
            count = items.len(),
            "Page limit reached, returning a truncated list"
        );
        Ok(Value::Array(items))
    }

    /// Fetch a single JSON document.
    pub async fn get_one(&self, path: &str) -> Result<Value> {
        let url = format!("{}{path}", self.base_url);
        debug!(url = %url, "Fetching document");
        let response = self.http.get(&url).bearer_auth(&self.token).send().await?;
        let response = check_status(response, path).await?;
        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|e| {
            HomeroomError::Upstream(format!("failed to parse response from {path}: {e}"))
        })
    }
}

async fn check_status(response: Response, endpoint: &str) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    warn!(status = %status, endpoint = %endpoint, "Canvas request failed");
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(HomeroomError::Auth(format!(
            "Canvas rejected the access token for {endpoint} with status {status}"
        ))),
        _ => Err(HomeroomError::Upstream(format!(
            "Canvas request to {endpoint} failed with status {status}: {body}"
        ))),
    }
}

fn next_link(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(LINK)?.to_str().ok()?;
    parse_next_link(value)
}

/// Extract the `rel="next"` target from a `Link` header value.
pub(crate) fn parse_next_link(value: &str) -> Option<String> {
    value.split(',').find_map(|part| {
        let mut pieces = part.split(';');
        let target = pieces.next()?.trim();
        if !pieces.any(|p| p.trim() == "rel=\"next\"") {
            return None;
        }
        target
            .strip_prefix('<')?
            .strip_suffix('>')
            .map(str::to_string)
    })
}
