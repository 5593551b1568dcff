#![allow(clippy::unwrap_used)]
// Integration tests for `AuthClient` using wiremock.

use secrecy::SecretString;
use serde_json::json;
use url::Url;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use showroom_api::{AuthClient, Error, TokenStore};

async fn setup() -> (MockServer, AuthClient, TokenStore) {
    let server = MockServer::start().await;
    let base_url = Url::parse(&server.uri()).unwrap();
    let tokens = TokenStore::new();
    let client = AuthClient::with_client(reqwest::Client::new(), base_url, tokens.clone());
    (server, client, tokens)
}

#[tokio::test]
async fn test_sign_in_installs_token() {
    let (server, client, tokens) = setup().await;

    let body = json!({
        "user": { "uid": "u1", "email": "alice@example.com", "display_name": "Alice" },
        "token": "session-token-1"
    });

    Mock::given(method("POST"))
        .and(path("/v1/auth/sign-in"))
        .and(body_partial_json(json!({ "email": "alice@example.com" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(&body))
        .mount(&server)
        .await;

    let password = SecretString::from("secret".to_owned());
    let session = client.sign_in("alice@example.com", &password).await.unwrap();

    assert_eq!(session.user.uid, "u1");
    assert_eq!(session.user.display_name.as_deref(), Some("Alice"));
    assert!(tokens.is_set(), "sign-in must install the session token");
}

#[tokio::test]
async fn test_sign_in_failure() {
    let (server, client, tokens) = setup().await;

    Mock::given(method("POST"))
        .and(path("/v1/auth/sign-in"))
        .respond_with(
            ResponseTemplate::new(403).set_body_json(json!({ "message": "wrong password" })),
        )
        .mount(&server)
        .await;

    let password = SecretString::from("bad".to_owned());
    let result = client.sign_in("alice@example.com", &password).await;

    match result {
        Err(Error::Authentication { ref message }) => {
            assert!(message.contains("wrong password"), "got: {message}");
        }
        other => panic!("expected Authentication error, got: {other:?}"),
    }
    assert!(!tokens.is_set());
}

#[tokio::test]
async fn test_sign_up() {
    let (server, client, _tokens) = setup().await;

    let body = json!({
        "user": { "uid": "u2", "email": "bob@example.com", "display_name": "Bob" },
        "token": "session-token-2"
    });

    Mock::given(method("POST"))
        .and(path("/v1/auth/sign-up"))
        .and(body_partial_json(json!({ "displayName": "Bob" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(&body))
        .mount(&server)
        .await;

    let password = SecretString::from("secret6".to_owned());
    let session = client.sign_up("bob@example.com", &password, "Bob").await.unwrap();
    assert_eq!(session.user.uid, "u2");
}

#[tokio::test]
async fn test_sign_out_clears_token_even_on_server_error() {
    let (server, client, tokens) = setup().await;
    tokens.set(SecretString::from("stale".to_owned()));

    Mock::given(method("POST"))
        .and(path("/v1/auth/sign-out"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    // Status is ignored for sign-out; only transport failures propagate.
    client.sign_out().await.unwrap();
    assert!(!tokens.is_set(), "token must be cleared locally");
}
