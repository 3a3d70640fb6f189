use axum::http::{Method, StatusCode};
use chrono::{Duration, Utc};
use jsonwebtoken::{EncodingKey, Header, encode};
use serde_json::json;

use recall_middleware::{Claims, TokenPurpose};

use crate::support::{
    TEST_SECRET, registration_body, request_json, setup_app, unique_username,
};

#[tokio::test]
async fn missing_authorization_header_is_403() {
    let test = setup_app().await;

    let (status, error) =
        request_json(&test.app, Method::GET, "/api/users", None, None).await;

    assert_eq!(status, StatusCode::FORBIDDEN);
    assert!(error["message"].as_str().unwrap().contains("No authorization"));
}

#[tokio::test]
async fn expired_token_is_401_with_expired_reason() {
    let test = setup_app().await;

    // Craft a token whose window elapsed an hour ago
    let now = Utc::now();
    let claims = Claims {
        sub: "ghost".to_string(),
        iat: (now - Duration::hours(2)).timestamp(),
        exp: (now - Duration::hours(1)).timestamp(),
        purpose: TokenPurpose::Session,
    };
    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(TEST_SECRET),
    )
    .unwrap();

    let (status, error) =
        request_json(&test.app, Method::GET, "/api/users", None, Some(&token)).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(error["message"].as_str().unwrap().contains("expired"));
}

#[tokio::test]
async fn token_for_unknown_user_is_401_invalid() {
    let test = setup_app().await;

    // Structurally valid token whose subject was never registered
    let token = test
        .jwt_service
        .generate_token("nonexistent", TokenPurpose::Session)
        .unwrap();

    let (status, error) =
        request_json(&test.app, Method::GET, "/api/users", None, Some(&token)).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(error["message"].as_str().unwrap().contains("Invalid token"));
}

#[tokio::test]
async fn malformed_bearer_token_is_401() {
    let test = setup_app().await;

    let (status, _) = request_json(
        &test.app,
        Method::GET,
        "/api/users",
        None,
        Some("not.a.jwt"),
    )
    .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn valid_session_token_reaches_the_protected_handler() {
    let test = setup_app().await;
    let username = unique_username("gate");

    let (_, preview) = request_json(
        &test.app,
        Method::POST,
        "/api/sentences/validate",
        Some(json!([
            "the quick brown fox jumps today",
            "my grandmother baked bread every sunday",
            "rain falls hardest in early april"
        ])),
        None,
    )
    .await;

    let body = registration_body(&username, &preview["questions"], "Skippy");
    let (status, registered) =
        request_json(&test.app, Method::POST, "/api/users", Some(body), None).await;
    assert_eq!(status, StatusCode::CREATED);

    let token = registered["token"].as_str().unwrap();

    let (status, profile) =
        request_json(&test.app, Method::GET, "/api/users", None, Some(token)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(profile["username"].as_str().unwrap(), username);
    // The profile never carries the hash
    assert!(profile.get("password").is_none());

    // Logout is stateless but still gated
    let (status, goodbye) = request_json(
        &test.app,
        Method::GET,
        "/api/users/logout",
        None,
        Some(token),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(
        goodbye["message"]
            .as_str()
            .unwrap()
            .contains("Successfully logged out")
    );
}
