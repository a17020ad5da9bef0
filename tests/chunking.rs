//! Date-range chunking against a mock API.

mod common;

use chrono::NaiveDate;
use common::{cached_enterprise_client, enterprise_config, token};
use coppercloud::auth::{MemoryTokenStore, NoPrompt};
use coppercloud::chunking::{fetch_readings_chunked, fetch_usage_chunked, DateRange, UsageOptions};
use coppercloud::progress::{Silent, TickCounter};
use coppercloud::{parse_timezone, CopperClient, CopperError, ErrorPolicy, Meter};
use serde_json::json;
use wiremock::matchers::{method, path_regex, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const USAGE_PATH: &str = r"^/api/v2/partner/ent-1/meter/elec(:|%3A)1/usage$";
const READINGS_PATH: &str = r"^/api/v2/partner/ent-1/meter/elec(:|%3A)1/readings$";
const LOCATION_PATH: &str = r"^/api/v2/partner/meter/elec(:|%3A)1/location$";

fn meter(created_at: Option<&str>) -> Meter {
    serde_json::from_value(json!({
        "id": "elec:1",
        "meter_type": "power_net",
        "created_at": created_at,
    }))
    .unwrap()
}

fn range(start: &str, end: &str) -> DateRange {
    DateRange::new(
        NaiveDate::parse_from_str(start, "%Y-%m-%d").unwrap(),
        NaiveDate::parse_from_str(end, "%Y-%m-%d").unwrap(),
    )
}

fn denver_client(mock_server: &MockServer) -> CopperClient {
    let config = enterprise_config(mock_server)
        .with_timezone(Some(parse_timezone("America/Denver").unwrap()));
    CopperClient::new(
        &config,
        Box::new(MemoryTokenStore::with_token(token("token", None))),
        Box::new(NoPrompt),
    )
    .unwrap()
}

/// Usage window whose samples sit on both of its boundaries.
async fn mount_usage_window(mock_server: &MockServer, start: &str, end: &str, sum: f64) {
    Mock::given(method("GET"))
        .and(path_regex(USAGE_PATH))
        .and(query_param("granularity", "hour"))
        .and(query_param("start", start))
        .and(query_param("end", end))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "meter_id": "elec:1",
            "meter_type": "power_net",
            "sum_usage": sum,
            "results": [
                {"time": start, "value": sum, "power": 0.5},
                {"time": end, "value": sum, "power": 0.5}
            ]
        })))
        .expect(1)
        .mount(mock_server)
        .await;
}

#[tokio::test]
async fn test_three_day_range_issues_three_local_midnight_windows() {
    let mock_server = MockServer::start().await;
    mount_usage_window(&mock_server, "2024-01-01T07:00:00Z", "2024-01-02T07:00:00Z", 1.0).await;
    mount_usage_window(&mock_server, "2024-01-02T07:00:00Z", "2024-01-03T07:00:00Z", 2.0).await;
    mount_usage_window(&mock_server, "2024-01-03T07:00:00Z", "2024-01-04T07:00:00Z", 3.0).await;

    // The timezone override means no location lookup.
    Mock::given(method("GET"))
        .and(path_regex(LOCATION_PATH))
        .respond_with(ResponseTemplate::new(500))
        .expect(0)
        .mount(&mock_server)
        .await;

    let client = denver_client(&mock_server);
    let progress = TickCounter::default();
    let usage = fetch_usage_chunked(
        &client,
        &meter(None),
        range("2024-01-01", "2024-01-04"),
        &UsageOptions::default(),
        &progress,
    )
    .await
    .unwrap();

    assert_eq!(progress.count(), 3);
    assert_eq!(usage.sum_usage, 6.0);
    assert_eq!(usage.skipped_windows, 0);
    assert_eq!(usage.tz, "America/Denver");
    assert_eq!(usage.tz_offset, -7 * 3600);

    let times: Vec<_> = usage.results.iter().map(|s| s.time.to_rfc3339()).collect();
    assert_eq!(
        times,
        vec![
            "2024-01-01T07:00:00+00:00",
            "2024-01-02T07:00:00+00:00",
            "2024-01-03T07:00:00+00:00",
            "2024-01-04T07:00:00+00:00",
        ]
    );
}

#[tokio::test]
async fn test_location_timezone_and_creation_clamp() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path_regex(LOCATION_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "street_address": "1 Main St",
            "city_town": "Boulder",
            "postal_code": "80302",
            "timezone": "UTC"
        })))
        .expect(1)
        .mount(&mock_server)
        .await;
    mount_usage_window(&mock_server, "2024-01-02T00:00:00Z", "2024-01-03T00:00:00Z", 1.5).await;
    mount_usage_window(&mock_server, "2024-01-03T00:00:00Z", "2024-01-04T00:00:00Z", 2.5).await;

    let (client, _store) = cached_enterprise_client(&mock_server, "token");
    let usage = fetch_usage_chunked(
        &client,
        &meter(Some("2024-01-02T12:00:00Z")),
        range("2024-01-01", "2024-01-04"),
        &UsageOptions::default(),
        &Silent,
    )
    .await
    .unwrap();

    assert_eq!(usage.tz, "UTC");
    assert_eq!(usage.sum_usage, 4.0);
    assert_eq!(usage.results.len(), 3);
}

#[tokio::test]
async fn test_usage_continue_skips_failed_window() {
    let mock_server = MockServer::start().await;
    mount_usage_window(&mock_server, "2024-01-01T07:00:00Z", "2024-01-02T07:00:00Z", 1.0).await;
    mount_usage_window(&mock_server, "2024-01-03T07:00:00Z", "2024-01-04T07:00:00Z", 3.0).await;

    Mock::given(method("GET"))
        .and(path_regex(USAGE_PATH))
        .and(query_param("start", "2024-01-02T07:00:00Z"))
        .respond_with(ResponseTemplate::new(503).set_body_string("try later"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = denver_client(&mock_server);
    let usage = fetch_usage_chunked(
        &client,
        &meter(None),
        range("2024-01-01", "2024-01-04"),
        &UsageOptions::default(),
        &Silent,
    )
    .await
    .unwrap();

    assert_eq!(usage.sum_usage, 4.0);
    assert_eq!(usage.results.len(), 4);
    assert_eq!(usage.skipped_windows, 1);
}

#[tokio::test]
async fn test_usage_abort_stops_at_failed_window() {
    let mock_server = MockServer::start().await;
    mount_usage_window(&mock_server, "2024-01-01T07:00:00Z", "2024-01-02T07:00:00Z", 1.0).await;

    Mock::given(method("GET"))
        .and(path_regex(USAGE_PATH))
        .and(query_param("start", "2024-01-02T07:00:00Z"))
        .respond_with(ResponseTemplate::new(503).set_body_string("try later"))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path_regex(USAGE_PATH))
        .and(query_param("start", "2024-01-03T07:00:00Z"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(0)
        .mount(&mock_server)
        .await;

    let client = denver_client(&mock_server);
    let options = UsageOptions {
        policy: ErrorPolicy::Abort,
        ..UsageOptions::default()
    };
    let err = fetch_usage_chunked(
        &client,
        &meter(None),
        range("2024-01-01", "2024-01-04"),
        &options,
        &Silent,
    )
    .await
    .unwrap_err();

    assert!(matches!(err, CopperError::RequestError(ref r) if r.status == 503));
}

#[tokio::test]
async fn test_multi_day_steps() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path_regex(USAGE_PATH))
        .and(query_param("granularity", "day"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "sum_usage": 10.0,
            "results": []
        })))
        .expect(2)
        .mount(&mock_server)
        .await;

    let client = denver_client(&mock_server);
    let options = UsageOptions {
        granularity: "day".to_string(),
        step_days: 3,
        policy: ErrorPolicy::Abort,
    };
    let usage = fetch_usage_chunked(
        &client,
        &meter(None),
        range("2024-01-01", "2024-01-05"),
        &options,
        &Silent,
    )
    .await
    .unwrap();

    assert_eq!(usage.sum_usage, 20.0);
    assert_eq!(usage.meter_type.as_deref(), Some("power_net"));
}

async fn mount_readings_day(mock_server: &MockServer, start: &str, body: serde_json::Value) {
    Mock::given(method("GET"))
        .and(path_regex(READINGS_PATH))
        .and(query_param("start", start))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .expect(1)
        .mount(mock_server)
        .await;
}

#[tokio::test]
async fn test_readings_sorted_within_each_day() {
    let mock_server = MockServer::start().await;
    mount_readings_day(
        &mock_server,
        "2024-01-01T07:00:00Z",
        json!({"results": [
            {"time": "2024-01-01T09:00:00Z", "value": 3.0},
            {"time": "2024-01-01T08:00:00Z", "value": 2.0}
        ]}),
    )
    .await;
    mount_readings_day(
        &mock_server,
        "2024-01-02T07:00:00Z",
        json!([
            {"time": "2024-01-02T10:00:00Z", "value": 5.0},
            {"time": "2024-01-02T08:00:00Z", "value": 4.0}
        ]),
    )
    .await;

    let client = denver_client(&mock_server);
    let series = fetch_readings_chunked(
        &client,
        &meter(None),
        range("2024-01-01", "2024-01-03"),
        ErrorPolicy::Abort,
        &Silent,
    )
    .await
    .unwrap();

    let values: Vec<_> = series.readings.iter().map(|r| r.value.unwrap()).collect();
    assert_eq!(values, vec![2.0, 3.0, 4.0, 5.0]);
    assert_eq!(series.tz.name(), "America/Denver");
}

#[tokio::test]
async fn test_readings_abort_on_failed_day() {
    let mock_server = MockServer::start().await;
    mount_readings_day(&mock_server, "2024-01-01T07:00:00Z", json!([])).await;

    Mock::given(method("GET"))
        .and(path_regex(READINGS_PATH))
        .and(query_param("start", "2024-01-02T07:00:00Z"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path_regex(READINGS_PATH))
        .and(query_param("start", "2024-01-03T07:00:00Z"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(0)
        .mount(&mock_server)
        .await;

    let client = denver_client(&mock_server);
    let result = fetch_readings_chunked(
        &client,
        &meter(None),
        range("2024-01-01", "2024-01-04"),
        ErrorPolicy::Abort,
        &Silent,
    )
    .await;

    assert!(matches!(result, Err(CopperError::RequestError(_))));
}

#[tokio::test]
async fn test_unknown_location_timezone_is_rejected() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path_regex(LOCATION_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"timezone": "Mars/Olympus"})))
        .expect(1)
        .mount(&mock_server)
        .await;

    let (client, _store) = cached_enterprise_client(&mock_server, "token");
    let err = fetch_usage_chunked(
        &client,
        &meter(None),
        range("2024-01-01", "2024-01-02"),
        &UsageOptions::default(),
        &Silent,
    )
    .await
    .unwrap_err();

    assert!(matches!(err, CopperError::InvalidArgument(_)));
}
