//! End-to-end cache-aside behaviour over the in-memory store and a mock
//! upstream server.

use cachegate_cache::message::HttpMethod;
use cachegate_cache::{
    AccessorSettings, CacheAccessor, CacheAccessorImpl, ConnectionRegistry, DefaultConnector,
    ReqwestFetcher, SerializedRequest, SerializedResponse,
};
use cachegate_core::PageRequest;
use chrono::{TimeDelta, Utc};
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const STORE: &str = "memory://integration";

fn accessor() -> CacheAccessorImpl {
    let registry = Arc::new(ConnectionRegistry::new(Arc::new(DefaultConnector::default())));
    let fetcher = ReqwestFetcher::with_client(reqwest::Client::new(), Duration::from_secs(5));
    CacheAccessorImpl::new(registry, Arc::new(fetcher), AccessorSettings::default())
}

#[tokio::test]
async fn second_read_is_served_from_the_store() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/report"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "application/json")
                .set_body_string("{\"rows\":3}"),
        )
        .expect(1)
        .mount(&server)
        .await;

    let accessor = accessor();
    let url = format!("{}/report", server.uri());

    let first = accessor.get_or_fetch_url(STORE, "report", &url, None).await.unwrap();
    let second = accessor
        .get_or_fetch_url(STORE, "report", "http://never.called/", None)
        .await
        .unwrap();

    assert_eq!(first.content(), second.content());
    assert_eq!(second.text(), Some("{\"rows\":3}"));
    assert_eq!(second.content_type(), "application/json");
}

#[tokio::test]
async fn request_descriptor_is_replayed_upstream() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/search"))
        .and(header("x-tenant", "acme"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![0u8, 1, 2, 254]))
        .expect(1)
        .mount(&server)
        .await;

    let request = SerializedRequest::new(HttpMethod::Post, format!("{}/search", server.uri()))
        .with_header("X-Tenant", "acme")
        .with_content("{\"q\":\"x\"}", "application/json");

    let response = accessor()
        .get_or_fetch(STORE, "search", request, Some(Duration::from_secs(30)))
        .await
        .unwrap();

    assert_eq!(response.content(), &[0, 1, 2, 254]);
    assert!(response.text().is_none());
    assert_eq!(response.original_expiration(), Duration::from_secs(30));
}

#[tokio::test]
async fn unreachable_upstream_yields_not_found_and_stores_nothing() {
    let accessor = accessor();

    let response = accessor
        .get_or_fetch_url(STORE, "dead", "http://127.0.0.1:1/", None)
        .await
        .unwrap();

    assert_eq!(response.status_code(), 404);
    assert!(accessor.list_keys(STORE, "dead").await.unwrap().is_empty());
}

#[tokio::test]
async fn hits_do_not_refresh_the_creation_stamp() {
    let accessor = accessor();

    let stored = accessor
        .get_or_fetch_constant(STORE, "ttl", "v", None, Some(Duration::from_secs(10)))
        .await
        .unwrap();
    let hit = accessor
        .get_or_fetch_constant(STORE, "ttl", "v", None, Some(Duration::from_secs(999)))
        .await
        .unwrap();

    assert_eq!(hit.created_date_time(), stored.created_date_time());
    assert_eq!(hit.original_expiration(), Duration::from_secs(10));

    let five_seconds_later = stored.created_date_time() + TimeDelta::seconds(5);
    assert_eq!(hit.time_to_live_at(five_seconds_later), Duration::from_secs(5));
    assert!(hit.time_to_live() <= Duration::from_secs(10));
    assert!(hit.expiration_date_time() > Utc::now());
}

#[tokio::test]
async fn constant_value_is_written_once() {
    let accessor = accessor();

    accessor
        .get_or_fetch_constant(STORE, "k", "hello", Some("text/plain"), None)
        .await
        .unwrap();
    let again = accessor
        .get_or_fetch_constant(STORE, "k", "different", Some("text/plain"), None)
        .await
        .unwrap();

    assert_eq!(again.text(), Some("hello"));
}

#[tokio::test]
async fn delete_reports_whether_a_key_was_removed() {
    let accessor = accessor();

    assert!(!accessor.delete(STORE, "gone").await.unwrap());

    accessor
        .get_or_fetch_constant(STORE, "gone", "v", None, None)
        .await
        .unwrap();
    assert!(accessor.delete(STORE, "gone").await.unwrap());
    assert!(accessor.key_expiration(STORE, "gone").await.unwrap().is_none());
}

#[tokio::test]
async fn pattern_listing_and_paging() {
    let accessor = accessor();
    for key in ["a:1", "a:2", "b:1"] {
        accessor
            .get_or_fetch_constant(STORE, key, key, None, None)
            .await
            .unwrap();
    }

    let mut a = accessor.list_keys(STORE, "a:*").await.unwrap();
    a.sort();
    assert_eq!(a, vec!["a:1".to_string(), "a:2".to_string()]);
    assert_eq!(accessor.list_keys(STORE, "*").await.unwrap().len(), 3);

    let empty = accessor
        .list_keys_page(STORE, "zzz*", PageRequest::first())
        .await
        .unwrap();
    assert!(empty.is_not_found());
    assert_eq!(empty.total_count, 0);
}

#[tokio::test]
async fn stores_are_isolated_by_identity() {
    let accessor = accessor();

    accessor
        .get_or_fetch_constant("memory://one", "k", "one", None, None)
        .await
        .unwrap();
    let other = accessor
        .get_or_fetch_constant("memory://two", "k", "two", None, None)
        .await
        .unwrap();

    assert_eq!(other.text(), Some("two"));
}

#[tokio::test]
async fn synthesized_not_found_round_trips() {
    let response = SerializedResponse::not_found();
    let decoded = SerializedResponse::decode(&response.encode().unwrap()).unwrap();
    assert_eq!(decoded, response);
}
