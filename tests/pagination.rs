//! Cursor and offset/limit pagination against a mock API.

mod common;

use common::cached_enterprise_client;
use coppercloud::{BulkMeter, CopperError, ErrorPolicy, List, Meter};
use serde_json::json;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn mount_first_bulk_page(mock_server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/api/v2/partner/ent-1/bulk"))
        .and(query_param("limit", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "results": [
                {"meter_id": "a", "meter_type": "power_net", "value": 1.0},
                {"meter_id": "b", "meter_type": "gas", "value": 2.0}
            ],
            "next": "/p2"
        })))
        .expect(1)
        .mount(mock_server)
        .await;
}

#[tokio::test]
async fn test_cursor_follows_next_until_absent() {
    let mock_server = MockServer::start().await;
    mount_first_bulk_page(&mock_server).await;

    Mock::given(method("GET"))
        .and(path("/p2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "results": [{"meter_id": "c", "meter_type": "water_indoor", "value": 3.0}],
            "next": null
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let (client, _store) = cached_enterprise_client(&mock_server, "token");
    let meters = BulkMeter::snapshot(&client, 2, ErrorPolicy::Continue)
        .await
        .unwrap();

    let ids: Vec<_> = meters.iter().map(|m| m.meter_id.as_str()).collect();
    assert_eq!(ids, vec!["a", "b", "c"]);
}

#[tokio::test]
async fn test_cursor_continue_keeps_partial_results() {
    let mock_server = MockServer::start().await;
    mount_first_bulk_page(&mock_server).await;

    Mock::given(method("GET"))
        .and(path("/p2"))
        .respond_with(ResponseTemplate::new(502).set_body_string("bad gateway"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let (client, _store) = cached_enterprise_client(&mock_server, "token");
    let meters = BulkMeter::snapshot(&client, 2, ErrorPolicy::Continue)
        .await
        .unwrap();

    assert_eq!(meters.len(), 2);
}

#[tokio::test]
async fn test_cursor_abort_propagates() {
    let mock_server = MockServer::start().await;
    mount_first_bulk_page(&mock_server).await;

    Mock::given(method("GET"))
        .and(path("/p2"))
        .respond_with(ResponseTemplate::new(502).set_body_string("bad gateway"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let (client, _store) = cached_enterprise_client(&mock_server, "token");
    let err = BulkMeter::snapshot(&client, 2, ErrorPolicy::Abort)
        .await
        .unwrap_err();

    assert!(matches!(err, CopperError::RequestError(ref r) if r.status == 502));
}

async fn mount_meter_page(mock_server: &MockServer, offset: &str, body: serde_json::Value) {
    Mock::given(method("GET"))
        .and(path("/api/v2/partner/ent-1/meter"))
        .and(query_param("limit", "2"))
        .and(query_param("offset", offset))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .expect(1)
        .mount(mock_server)
        .await;
}

#[tokio::test]
async fn test_offset_stops_on_short_page() {
    let mock_server = MockServer::start().await;
    // Bare array and wrapped shapes are both accepted.
    mount_meter_page(&mock_server, "0", json!([{"id": "x"}, {"id": "y"}])).await;
    mount_meter_page(&mock_server, "2", json!({"results": [{"id": "z"}]})).await;

    let (client, _store) = cached_enterprise_client(&mock_server, "token");
    let meters = Meter::list_all_with(&client, &Default::default(), 2, ErrorPolicy::Abort)
        .await
        .unwrap();

    let ids: Vec<_> = meters.iter().map(|m| m.id.as_str()).collect();
    assert_eq!(ids, vec!["x", "y", "z"]);
}

#[tokio::test]
async fn test_offset_abort_propagates() {
    let mock_server = MockServer::start().await;
    mount_meter_page(&mock_server, "0", json!([{"id": "x"}, {"id": "y"}])).await;

    Mock::given(method("GET"))
        .and(path("/api/v2/partner/ent-1/meter"))
        .and(query_param("offset", "2"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let (client, _store) = cached_enterprise_client(&mock_server, "token");
    let err = Meter::list_all_with(&client, &Default::default(), 2, ErrorPolicy::Abort)
        .await
        .unwrap_err();
    assert!(matches!(err, CopperError::RequestError(_)));
}

#[tokio::test]
async fn test_offset_continue_keeps_gathered_pages() {
    let mock_server = MockServer::start().await;
    mount_meter_page(&mock_server, "0", json!([{"id": "x"}, {"id": "y"}])).await;

    Mock::given(method("GET"))
        .and(path("/api/v2/partner/ent-1/meter"))
        .and(query_param("offset", "2"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let (client, _store) = cached_enterprise_client(&mock_server, "token");
    let meters = Meter::list_all_with(&client, &Default::default(), 2, ErrorPolicy::Continue)
        .await
        .unwrap();
    assert_eq!(meters.len(), 2);
}

#[tokio::test]
async fn test_postal_code_filter_is_sent() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/v2/partner/ent-1/meter"))
        .and(query_param("postal_code", "80302"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&mock_server)
        .await;

    let (client, _store) = cached_enterprise_client(&mock_server, "token");
    let query = coppercloud::EntityListQuery {
        postal_code: Some("80302".to_string()),
    };
    let meters = Meter::list_all(&client, &query).await.unwrap();
    assert!(meters.is_empty());
}

#[tokio::test]
async fn test_offset_accepts_entities_with_both_key_spellings() {
    let mock_server = MockServer::start().await;
    mount_meter_page(
        &mock_server,
        "0",
        json!([
            {"id": "elec:1", "meter_id": "elec:1", "meter_type": "power_net", "type": "power_net"},
            {"meter_id": "gas:2", "type": "gas"}
        ]),
    )
    .await;
    mount_meter_page(&mock_server, "2", json!([])).await;

    let (client, _store) = cached_enterprise_client(&mock_server, "token");
    let meters = Meter::list_all_with(&client, &Default::default(), 2, ErrorPolicy::Abort)
        .await
        .unwrap();

    let ids: Vec<_> = meters.iter().map(|m| m.id.as_str()).collect();
    assert_eq!(ids, vec!["elec:1", "gas:2"]);
    assert_eq!(meters[1].meter_type.as_deref(), Some("gas"));
}
