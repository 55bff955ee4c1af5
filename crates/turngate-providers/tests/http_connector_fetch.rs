// turngate-providers/tests/http_connector_fetch.rs
// ============================================================================
// Module: HTTP Connector Fetch Integration Tests
// Description: Exercises the happy paths for fetch_ticket and fetch_api_spec
//              against a real, local, plaintext HTTP server.
// ============================================================================

//! Exercises the happy paths for fetch_ticket and fetch_api_spec against a real, local, plaintext HTTP server.

#![allow(clippy::unwrap_used, reason = "Test-only assertions are permitted.")]

use std::thread;

use tiny_http::Response;
use tiny_http::Server;
use turngate_core::Connector as _;
use turngate_providers::HttpConnector;
use turngate_providers::HttpConnectorConfig;

#[test]
fn fetch_ticket_parses_the_issue_summary() {
    let server = Server::http("127.0.0.1:0").unwrap();
    let addr = server.server_addr();
    let handle = thread::spawn(move || {
        if let Ok(Some(request)) = server.recv_timeout(std::time::Duration::from_secs(5)) {
            let body = r#"{"fields": {"summary": "Fix the thing"}}"#;
            let response = Response::from_string(body);
            let _ = request.respond(response);
        }
    });

    let connector = HttpConnector::new(HttpConnectorConfig {
        jira_base_url: format!("http://{addr}"),
        allow_http: true,
        timeout_ms: 2_000,
        ..HttpConnectorConfig::default()
    })
    .unwrap();

    let artifact = connector.fetch_ticket("PROJ-1").unwrap();
    handle.join().unwrap();

    assert_eq!(artifact.kind, "jira_issue");
    assert_eq!(artifact.summary, "Fix the thing");
}

#[test]
fn fetch_api_spec_falls_back_to_the_url_when_no_title_is_present() {
    let server = Server::http("127.0.0.1:0").unwrap();
    let addr = server.server_addr();
    let handle = thread::spawn(move || {
        if let Ok(Some(request)) = server.recv_timeout(std::time::Duration::from_secs(5)) {
            let response = Response::from_string("{\"paths\": {}}");
            let _ = request.respond(response);
        }
    });

    let connector = HttpConnector::new(HttpConnectorConfig {
        allow_http: true,
        timeout_ms: 2_000,
        ..HttpConnectorConfig::default()
    })
    .unwrap();
    let url = format!("http://{addr}/openapi.json");

    let artifact = connector.fetch_api_spec(&url).unwrap();
    handle.join().unwrap();

    assert_eq!(artifact.kind, "api_spec");
    assert_eq!(artifact.summary, url);
}
