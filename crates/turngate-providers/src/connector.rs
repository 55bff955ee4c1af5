// turngate-providers/src/connector.rs
// ============================================================================
// Module: HTTP Connector
// Description: Connector backed by blocking HTTP calls to an issue tracker
//              and arbitrary API-spec URLs.
// Purpose: Back fetch_jira_ticket and fetch_api_spec with a real, but
//          bounded and fail-closed, external fetch.
// Dependencies: turngate-core, reqwest, serde_json, serde_yaml
// ============================================================================

//! ## Overview
//! [`HttpConnector`] issues bounded, non-redirecting GET requests with a
//! per-call timeout and a response-size cap, mirroring the posture the rest
//! of this corpus takes with untrusted network input: fail closed, never
//! silently truncate, never follow a redirect without being asked to.

use std::collections::BTreeSet;
use std::io::Read;
use std::time::Duration;

use reqwest::Url;
use reqwest::blocking::Client;
use reqwest::redirect::Policy;
use turngate_core::Artifact;
use turngate_core::ConnectorError;

/// Configuration for [`HttpConnector`].
#[derive(Debug, Clone)]
pub struct HttpConnectorConfig {
    /// Base URL for issue-tracker REST calls, e.g. `https://issues.example.com`.
    /// `fetch_ticket` appends `/rest/api/2/issue/{key}`.
    pub jira_base_url: String,
    /// Allow cleartext HTTP (disabled by default).
    pub allow_http: bool,
    /// Request timeout in milliseconds.
    pub timeout_ms: u64,
    /// Maximum response size allowed, in bytes.
    pub max_response_bytes: usize,
    /// Optional host allowlist applied to `fetch_api_spec`'s caller-supplied URL.
    pub allowed_hosts: Option<BTreeSet<String>>,
    /// User agent string for outbound requests.
    pub user_agent: String,
}

impl Default for HttpConnectorConfig {
    fn default() -> Self {
        Self {
            jira_base_url: String::new(),
            allow_http: false,
            timeout_ms: 5_000,
            max_response_bytes: 1024 * 1024,
            allowed_hosts: None,
            user_agent: "turngate/0.1".to_owned(),
        }
    }
}

/// Connector implementation backed by blocking HTTP calls.
pub struct HttpConnector {
    config: HttpConnectorConfig,
    client: Client,
}

impl HttpConnector {
    /// Builds a connector from the given configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ConnectorError::Unavailable`] when the HTTP client cannot
    /// be constructed.
    pub fn new(config: HttpConnectorConfig) -> Result<Self, ConnectorError> {
        let client = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .user_agent(config.user_agent.clone())
            .redirect(Policy::none())
            .build()
            .map_err(|err| ConnectorError::Unavailable(format!("http client build failed: {err}")))?;
        Ok(Self { config, client })
    }

    fn validate_url(&self, url: &Url) -> Result<(), ConnectorError> {
        match url.scheme() {
            "https" => {}
            "http" if self.config.allow_http => {}
            other => return Err(ConnectorError::Unavailable(format!("unsupported url scheme: {other}"))),
        }
        if let Some(allowlist) = &self.config.allowed_hosts {
            let host = url
                .host_str()
                .ok_or_else(|| ConnectorError::Unavailable("url host required".to_owned()))?;
            if !allowlist.contains(host) {
                return Err(ConnectorError::Unavailable(format!("url host not allowed: {host}")));
            }
        }
        Ok(())
    }

    fn get_bounded(&self, url: &Url) -> Result<Vec<u8>, ConnectorError> {
        self.validate_url(url)?;
        let mut response = self
            .client
            .get(url.clone())
            .send()
            .map_err(|err| ConnectorError::Unavailable(format!("request failed: {err}")))?;
        if response.status().as_u16() == 404 {
            return Err(ConnectorError::NotFound(url.to_string()));
        }
        if !response.status().is_success() {
            return Err(ConnectorError::Unavailable(format!("unexpected status: {}", response.status())));
        }
        let max_bytes = self.config.max_response_bytes;
        let limit = u64::try_from(max_bytes.saturating_add(1))
            .map_err(|_| ConnectorError::Unavailable("response size limit exceeds u64".to_owned()))?;
        let mut buf = Vec::new();
        response
            .by_ref()
            .take(limit)
            .read_to_end(&mut buf)
            .map_err(|err| ConnectorError::Unavailable(format!("failed to read response: {err}")))?;
        if buf.len() > max_bytes {
            return Err(ConnectorError::Unavailable("response exceeds size limit".to_owned()));
        }
        Ok(buf)
    }
}

impl turngate_core::Connector for HttpConnector {
    fn fetch_ticket(&self, key: &str) -> Result<Artifact, ConnectorError> {
        if key.is_empty() {
            return Err(ConnectorError::Unavailable("ticket key must not be empty".to_owned()));
        }
        let url = format!("{}/rest/api/2/issue/{key}", self.config.jira_base_url.trim_end_matches('/'));
        let url = Url::parse(&url).map_err(|err| ConnectorError::Unavailable(format!("invalid ticket url: {err}")))?;
        let body = self.get_bounded(&url)?;
        let document: serde_json::Value = serde_json::from_slice(&body)
            .map_err(|err| ConnectorError::Unavailable(format!("ticket response is not json: {err}")))?;
        let summary = document
            .get("fields")
            .and_then(|fields| fields.get("summary"))
            .and_then(serde_json::Value::as_str)
            .unwrap_or(key)
            .to_owned();
        Ok(Artifact {
            id: key.to_owned(),
            kind: "jira_issue".to_owned(),
            content_ref: url.to_string(),
            summary,
        })
    }

    fn fetch_api_spec(&self, url: &str) -> Result<Artifact, ConnectorError> {
        let parsed = Url::parse(url).map_err(|err| ConnectorError::Unavailable(format!("invalid spec url: {err}")))?;
        let body = self.get_bounded(&parsed)?;
        let document: serde_json::Value = serde_json::from_slice(&body)
            .or_else(|_| serde_yaml::from_slice(&body))
            .map_err(|err| ConnectorError::Unavailable(format!("spec is not valid json or yaml: {err}")))?;
        let summary = document
            .get("info")
            .and_then(|info| info.get("title"))
            .and_then(serde_json::Value::as_str)
            .unwrap_or(url)
            .to_owned();
        Ok(Artifact {
            id: url.to_owned(),
            kind: "api_spec".to_owned(),
            content_ref: url.to_owned(),
            summary,
        })
    }
}
