//! Integration tests for the service-account grant and the reporting calls,
//! run against a mock Google API server.

use ga_dashlet::backend::{
    analytics::{AnalyticsClient, ProfileId},
    auth::{self, ANALYTICS_READONLY_SCOPE},
    connect,
    error::AnalyticsError,
    refresh::refresh,
};
use ga_dashlet::snapshot::RangeKey;
use std::path::PathBuf;
use wiremock::{
    matchers::{body_string_contains, header, method, path, query_param},
    Mock, MockServer, ResponseTemplate,
};

const FIXTURE: &str = include_str!("fixtures/service_account.json");

/// Write the fixture key with its token endpoint pointed at `server`.
fn key_file(server: &MockServer, dir: &tempfile::TempDir) -> PathBuf {
    let mut key: serde_json::Value = serde_json::from_str(FIXTURE).unwrap();
    key["token_uri"] = serde_json::Value::String(format!("{}/token", server.uri()));
    let path = dir.path().join("client_secrets.json");
    std::fs::write(&path, key.to_string()).unwrap();
    path
}

async fn mount_token(server: &MockServer, expected_calls: u64) {
    Mock::given(method("POST"))
        .and(path("/token"))
        .and(body_string_contains("jwt-bearer"))
        .and(body_string_contains("assertion="))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "access_token": "ya29.test-token",
            "expires_in": 3600,
            "token_type": "Bearer"
        })))
        .expect(expected_calls)
        .mount(server)
        .await;
}

async fn mount_list(server: &MockServer, route: &str, ids: &[&str]) {
    let items: Vec<_> = ids.iter().map(|id| serde_json::json!({ "id": id })).collect();
    Mock::given(method("GET"))
        .and(path(route))
        .and(header("authorization", "Bearer ya29.test-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({ "items": items })))
        .mount(server)
        .await;
}

async fn mount_hierarchy(server: &MockServer) {
    mount_list(server, "/management/accounts", &["1111", "2222"]).await;
    mount_list(server, "/management/accounts/1111/webproperties", &["UA-1111-1"]).await;
    mount_list(
        server,
        "/management/accounts/1111/webproperties/UA-1111-1/profiles",
        &["98765", "55555"],
    )
    .await;
}

async fn mount_report(server: &MockServer, start: &str, end: &str, views: &str, revenue: &str) {
    Mock::given(method("GET"))
        .and(path("/data/ga"))
        .and(query_param("ids", "ga:98765"))
        .and(query_param("start-date", start))
        .and(query_param("end-date", end))
        .and(query_param("metrics", "ga:pageviews,ga:adsenseRevenue"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "profileInfo": { "profileId": "98765", "profileName": "Site A" },
            "rows": [[views, revenue]]
        })))
        .expect(1)
        .mount(server)
        .await;
}

async fn client(server: &MockServer, dir: &tempfile::TempDir) -> AnalyticsClient {
    let session = auth::authenticate(
        reqwest::Client::new(),
        &key_file(server, dir),
        &[ANALYTICS_READONLY_SCOPE],
    )
    .await
    .unwrap();
    AnalyticsClient::new(session, server.uri())
}

#[tokio::test]
async fn resolves_first_profile_of_first_property_of_first_account() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();
    mount_token(&server, 1).await;
    mount_hierarchy(&server).await;

    let client = client(&server, &dir).await;

    assert_eq!(client.resolve_profile().await.unwrap(), Some(ProfileId("98765".into())));
}

#[tokio::test]
async fn zero_accounts_resolves_to_no_profile() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();
    mount_token(&server, 1).await;
    mount_list(&server, "/management/accounts", &[]).await;

    let client = client(&server, &dir).await;

    assert_eq!(client.resolve_profile().await.unwrap(), None);
}

#[tokio::test]
async fn property_without_profiles_resolves_to_no_profile() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();
    mount_token(&server, 1).await;
    mount_list(&server, "/management/accounts", &["1111"]).await;
    mount_list(&server, "/management/accounts/1111/webproperties", &["UA-1111-1"]).await;
    mount_list(&server, "/management/accounts/1111/webproperties/UA-1111-1/profiles", &[]).await;

    let client = client(&server, &dir).await;

    assert_eq!(client.resolve_profile().await.unwrap(), None);
}

#[tokio::test]
async fn refresh_queries_each_range_once_and_reuses_the_token() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();
    mount_token(&server, 1).await;
    mount_report(&server, "today", "today", "42", "1.5").await;
    mount_report(&server, "yesterday", "yesterday", "30", "1.0").await;
    mount_report(&server, "7daysAgo", "today", "300", "12.34").await;

    let client = client(&server, &dir).await;
    let snapshot = refresh(&client, &ProfileId("98765".into())).await.unwrap();

    assert_eq!(snapshot.profile_name(), "Site A");
    assert_eq!(snapshot.get(RangeKey::Today).views, "42");
    assert_eq!(snapshot.get(RangeKey::Yesterday).revenue, 1.0);
    assert_eq!(snapshot.get(RangeKey::Week).revenue, 12.34);
}

#[tokio::test]
async fn http_error_from_report_is_surfaced() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();
    mount_token(&server, 1).await;
    Mock::given(method("GET"))
        .and(path("/data/ga"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let client = client(&server, &dir).await;
    let result = client.query(&ProfileId("98765".into()), RangeKey::Today).await;

    assert!(matches!(result, Err(AnalyticsError::Status(401))));
}

#[tokio::test]
async fn rejected_assertion_fails_authentication() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();
    Mock::given(method("POST"))
        .and(path("/token"))
        .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
            "error": "invalid_grant"
        })))
        .mount(&server)
        .await;

    let result = auth::authenticate(
        reqwest::Client::new(),
        &key_file(&server, &dir),
        &[ANALYTICS_READONLY_SCOPE],
    )
    .await;

    assert!(matches!(result, Err(AnalyticsError::Auth(_))));
}

#[tokio::test]
async fn connect_authenticates_and_resolves_profile() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();
    mount_token(&server, 1).await;
    mount_hierarchy(&server).await;

    let connection = connect(&key_file(&server, &dir), &server.uri()).await.unwrap();

    assert_eq!(connection.profile, Some(ProfileId("98765".into())));
}

#[tokio::test]
async fn connect_reports_missing_key_file() {
    let dir = tempfile::tempdir().unwrap();

    let err = connect(&dir.path().join("missing.json"), "http://127.0.0.1:9")
        .await
        .unwrap_err();

    assert!(format!("{err:#}").contains("missing.json"));
}
