#![allow(clippy::unwrap_used)]
// Integration tests for `StoreClient` using wiremock.

use serde_json::json;
use url::Url;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use showroom_api::{DocumentQuery, Error, SortDirection, StoreClient, TokenStore};

// ── Helpers ─────────────────────────────────────────────────────────

async fn setup() -> (MockServer, StoreClient) {
    let server = MockServer::start().await;
    let base_url = Url::parse(&server.uri()).unwrap();
    let client = StoreClient::with_client(reqwest::Client::new(), base_url, TokenStore::new());
    (server, client)
}

fn docs_path(collection: &str) -> String {
    format!("/v1/collections/{collection}/documents")
}

// ── Read tests ──────────────────────────────────────────────────────

#[tokio::test]
async fn test_get_document() {
    let (server, client) = setup().await;

    let envelope = json!({
        "data": {
            "id": "car-1",
            "data": { "name": "Aventador", "manufacturer": "Lamborghini", "year": 2021 }
        }
    });

    Mock::given(method("GET"))
        .and(path(format!("{}/car-1", docs_path("cars"))))
        .respond_with(ResponseTemplate::new(200).set_body_json(&envelope))
        .mount(&server)
        .await;

    let doc = client.get("cars", "car-1").await.unwrap().unwrap();
    assert_eq!(doc.id, "car-1");
    assert_eq!(doc.data["name"], "Aventador");
}

#[tokio::test]
async fn test_get_missing_document_is_none() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path(format!("{}/ghost", docs_path("cars"))))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let doc = client.get("cars", "ghost").await.unwrap();
    assert!(doc.is_none());
}

#[tokio::test]
async fn test_list_with_filter_and_sort() {
    let (server, client) = setup().await;

    let envelope = json!({
        "data": [
            { "id": "r2", "data": { "carId": "car-1", "rating": 5 } },
            { "id": "r1", "data": { "carId": "car-1", "rating": 3 } }
        ]
    });

    Mock::given(method("GET"))
        .and(path(docs_path("reviews")))
        .and(query_param("filter_field", "carId"))
        .and(query_param("filter_value", "car-1"))
        .and(query_param("order_by", "rating"))
        .and(query_param("direction", "desc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(&envelope))
        .mount(&server)
        .await;

    let query = DocumentQuery::new()
        .where_eq("carId", "car-1")
        .order_by("rating", SortDirection::Descending);
    let docs = client.list("reviews", &query).await.unwrap();

    assert_eq!(docs.len(), 2);
    assert_eq!(docs[0].id, "r2");
    assert_eq!(docs[1].data["rating"], 3);
}

// ── Write tests ─────────────────────────────────────────────────────

#[tokio::test]
async fn test_put_overwrites_document() {
    let (server, client) = setup().await;

    let envelope = json!({
        "data": { "id": "car-7", "data": { "name": "Model S", "year": 2024 } }
    });

    Mock::given(method("PUT"))
        .and(path(format!("{}/car-7", docs_path("cars"))))
        .respond_with(ResponseTemplate::new(200).set_body_json(&envelope))
        .mount(&server)
        .await;

    let body = json!({ "name": "Model S", "year": 2024 });
    let doc = client.put("cars", "car-7", &body).await.unwrap();
    assert_eq!(doc.id, "car-7");
}

#[tokio::test]
async fn test_delete_missing_document_is_ok() {
    let (server, client) = setup().await;

    Mock::given(method("DELETE"))
        .and(path(format!("{}/gone", docs_path("reviews"))))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    client.delete("reviews", "gone").await.unwrap();
}

// ── Error tests ─────────────────────────────────────────────────────

#[tokio::test]
async fn test_session_expired() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let result = client.list("cars", &DocumentQuery::new()).await;
    assert!(
        matches!(result, Err(Error::SessionExpired)),
        "expected SessionExpired, got: {result:?}"
    );
}

#[tokio::test]
async fn test_store_envelope_error() {
    let (server, client) = setup().await;

    let envelope = json!({
        "error": { "code": "store/invalid-document", "message": "year must be a number" }
    });

    Mock::given(method("PUT"))
        .and(path(format!("{}/car-1", docs_path("cars"))))
        .respond_with(ResponseTemplate::new(400).set_body_json(&envelope))
        .mount(&server)
        .await;

    let result = client.put("cars", "car-1", &json!({ "year": "nope" })).await;

    match result {
        Err(Error::Store {
            ref message,
            ref code,
            status,
        }) => {
            assert!(message.contains("year"), "unexpected message: {message}");
            assert_eq!(code.as_deref(), Some("store/invalid-document"));
            assert_eq!(status, 400);
        }
        other => panic!("expected Store error, got: {other:?}"),
    }
}

#[tokio::test]
async fn test_bearer_token_is_attached() {
    let server = MockServer::start().await;
    let base_url = Url::parse(&server.uri()).unwrap();
    let tokens = TokenStore::new();
    tokens.set(secrecy::SecretString::from("tok-42".to_owned()));
    let client = StoreClient::with_client(reqwest::Client::new(), base_url, tokens);

    let envelope = json!({ "data": [] });

    Mock::given(method("GET"))
        .and(path(docs_path("cars")))
        .and(wiremock::matchers::header("authorization", "Bearer tok-42"))
        .respond_with(ResponseTemplate::new(200).set_body_json(&envelope))
        .mount(&server)
        .await;

    let docs = client.list("cars", &DocumentQuery::new()).await.unwrap();
    assert!(docs.is_empty());
}
