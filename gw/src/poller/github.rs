//! GitHub REST implementation of EventApi

use std::sync::LazyLock;
use std::time::Duration;

use async_trait::async_trait;
use regex::Regex;
use reqwest::header::{ACCEPT, AUTHORIZATION, ETAG, HeaderMap, IF_NONE_MATCH, LINK};
use reqwest::{Client, StatusCode};
use serde_json::Value;
use tracing::debug;

use super::{EventApi, PageBody, PageResponse, PollError};
use crate::config::ApiConfig;

const ACCEPT_GITHUB_JSON: &str = "application/vnd.github+json";
const POLL_INTERVAL_HEADER: &str = "x-poll-interval";

/// `<url>; rel="next"` entries of a Link header
static LINK_NEXT_RE: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r#"<([^>]+)>\s*;\s*rel="?next"?"#).ok());

/// GitHub API client
pub struct GitHubClient {
    base_url: String,
    token: String,
    http: Client,
    timeout: Duration,
}

impl GitHubClient {
    /// Create a client from the api section of the configuration
    pub fn new(config: &ApiConfig, token: impl Into<String>) -> Result<Self, PollError> {
        debug!(base_url = %config.base_url, timeout_ms = config.timeout_ms, "GitHubClient::new: called");
        let timeout = config.timeout();
        let http = Client::builder()
            .timeout(timeout)
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| PollError::transport(e.to_string()))?;

        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            token: token.into(),
            http,
            timeout,
        })
    }

    /// Absolute URL for an endpoint path or a next-page URL
    pub fn url(&self, target: &str) -> String {
        if target.starts_with("https://") || target.starts_with("http://") {
            target.to_string()
        } else if target.starts_with('/') {
            format!("{}{}", self.base_url, target)
        } else {
            format!("{}/{}", self.base_url, target)
        }
    }

    fn get(&self, target: &str) -> reqwest::RequestBuilder {
        self.http
            .get(self.url(target))
            .header(AUTHORIZATION, format!("Bearer {}", self.token))
            .header(ACCEPT, ACCEPT_GITHUB_JSON)
    }
}

/// Extract the `rel="next"` target from a Link header
pub fn parse_next_link(header: &str) -> Option<String> {
    let re = LINK_NEXT_RE.as_ref()?;
    header
        .split(',')
        .find_map(|part| re.captures(part.trim()))
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

/// Parse an `X-Poll-Interval` value (integer seconds)
pub fn parse_poll_interval(value: &str) -> Option<u64> {
    value.trim().parse().ok()
}

fn header_str<'a>(headers: &'a HeaderMap, name: impl reqwest::header::AsHeaderName) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

fn page_metadata(headers: &HeaderMap) -> (Option<String>, Option<u64>, Option<String>) {
    let etag = header_str(headers, ETAG).map(str::to_string);
    let interval = header_str(headers, POLL_INTERVAL_HEADER).and_then(parse_poll_interval);
    let next = header_str(headers, LINK).and_then(parse_next_link);
    (etag, interval, next)
}

#[async_trait]
impl EventApi for GitHubClient {
    async fn fetch_page(&self, url: &str, etag: Option<&str>) -> Result<PageResponse, PollError> {
        debug!(%url, ?etag, "fetch_page: called");
        let mut request = self.get(url);
        if let Some(etag) = etag {
            request = request.header(IF_NONE_MATCH, etag);
        }

        let response = request
            .send()
            .await
            .map_err(|e| PollError::from_reqwest(e, self.timeout))?;

        let status = response.status();
        let (etag, poll_interval, next) = page_metadata(response.headers());
        debug!(status = status.as_u16(), ?etag, ?poll_interval, ?next, "fetch_page: response");

        if status == StatusCode::NOT_MODIFIED {
            return Ok(PageResponse {
                body: PageBody::NotModified,
                etag,
                poll_interval,
                next: None,
            });
        }

        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            debug!(status = status.as_u16(), "fetch_page: API error");
            return Err(PollError::Api {
                status: status.as_u16(),
                message: text,
            });
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| PollError::from_reqwest(e, self.timeout))?;

        match body {
            Value::Array(envelopes) => {
                debug!(count = envelopes.len(), "fetch_page: fresh page");
                Ok(PageResponse {
                    body: PageBody::Fresh(envelopes),
                    etag,
                    poll_interval,
                    next,
                })
            }
            other => Err(PollError::Decode(format!(
                "expected an array of events, got {}",
                json_kind(&other)
            ))),
        }
    }

    async fn current_user(&self) -> Result<String, PollError> {
        debug!("current_user: called");
        let response = self
            .get("/user")
            .send()
            .await
            .map_err(|e| PollError::from_reqwest(e, self.timeout))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(PollError::Api {
                status: status.as_u16(),
                message: text,
            });
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| PollError::from_reqwest(e, self.timeout))?;

        body.get("login")
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| PollError::Decode("user response has no login".to_string()))
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
