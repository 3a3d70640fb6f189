use axum::http::{Method, StatusCode};
use serde_json::json;

use crate::support::{
    extract_token, registration_body, request_json, setup_app, unique_username,
};

const ANSWER: &str = "Skippy";

/// The whole journey: sentence preview, registration (with welcome mail),
/// two-step login, forgot-password (with reset mail), and password reset
/// from the mailed token.
#[tokio::test]
async fn full_recovery_flow() {
    let test = setup_app().await;
    let username = unique_username("flow");

    // Sentence preview: three candidate passwords plus the question catalogue
    let (status, preview) = request_json(
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
    assert_eq!(status, StatusCode::OK);
    assert_eq!(preview["passwords"].as_array().unwrap().len(), 3);
    assert!(!preview["questions"].as_array().unwrap().is_empty());

    // Register, answering every seeded question
    let body = registration_body(&username, &preview["questions"], ANSWER);
    let (status, registered) =
        request_json(&test.app, Method::POST, "/api/users", Some(body), None).await;
    assert_eq!(status, StatusCode::CREATED);
    let session_token = registered["token"].as_str().unwrap().to_string();
    assert!(!session_token.is_empty());

    // Welcome mail went out exactly once
    assert_eq!(test.mailer.sent_count(), 1);
    let welcome = test.mailer.last_mail().unwrap();
    assert_eq!(welcome.to, format!("{}@example.com", username));

    // First login step answers with a random question challenge
    let (status, challenge) = request_json(
        &test.app,
        Method::POST,
        "/api/users/validate-login",
        Some(json!({
            "identity": username,
            "password": "w0rd$)(9@sleet+cloud"
        })),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let user_id = challenge["userId"].as_str().unwrap().to_string();
    let question_id = challenge["question"]["id"].as_str().unwrap().to_string();

    // Second step: the security-question answer yields a session token
    let (status, logged_in) = request_json(
        &test.app,
        Method::POST,
        "/api/users/login",
        Some(json!({
            "userId": user_id,
            "questionId": question_id,
            "answer": ANSWER
        })),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(!logged_in["token"].as_str().unwrap().is_empty());

    // Forgot-password verifies the answer and sends exactly one reset mail
    let mails_before = test.mailer.sent_count();
    let (status, body) = request_json(
        &test.app,
        Method::POST,
        "/api/users/forgot-password",
        Some(json!({
            "email": format!("{}@example.com", username),
            "questionId": question_id,
            "answer": ANSWER
        })),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body["message"].as_str().unwrap(),
        "A message has been sent to your email"
    );
    assert_eq!(test.mailer.sent_count(), mails_before + 1);

    // The reset mail carries a tokened link; redeem it for a new password
    let reset_token = extract_token(&test.mailer.last_mail().unwrap().html);
    let (status, reset) = request_json(
        &test.app,
        Method::POST,
        "/api/users/password",
        Some(json!({
            "token": reset_token,
            "questionId": question_id,
            "answer": ANSWER
        })),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let new_password = reset["password"].as_str().unwrap().to_string();
    assert!(!new_password.is_empty());

    // The regenerated password now passes the first login step
    let (status, _) = request_json(
        &test.app,
        Method::POST,
        "/api/users/validate-login",
        Some(json!({
            "identity": username,
            "password": new_password
        })),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    // And the old one no longer does
    let (status, _) = request_json(
        &test.app,
        Method::POST,
        "/api/users/validate-login",
        Some(json!({
            "identity": username,
            "password": "w0rd$)(9@sleet+cloud"
        })),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn duplicate_username_is_field_keyed_and_skips_email_check() {
    let test = setup_app().await;
    let username = unique_username("dup");

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

    let body = registration_body(&username, &preview["questions"], ANSWER);
    let (status, _) =
        request_json(&test.app, Method::POST, "/api/users", Some(body), None).await;
    assert_eq!(status, StatusCode::CREATED);

    // Same username, different email: the duplicate must key on `username`
    let mut body = registration_body(&username, &preview["questions"], ANSWER);
    body["email"] = json!(format!("{}@elsewhere.com", unique_username("mail")));

    let (status, error) =
        request_json(&test.app, Method::POST, "/api/users", Some(body), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error["code"].as_str().unwrap(), "DUPLICATE");
    assert_eq!(error["errors"][0]["field"].as_str().unwrap(), "username");
}

#[tokio::test]
async fn sentence_validation_rejects_bad_sets() {
    let test = setup_app().await;

    // Wrong count
    let (status, _) = request_json(
        &test.app,
        Method::POST,
        "/api/sentences/validate",
        Some(json!(["only one sentence given here"])),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // Word count outside 5..=10
    let (status, error) = request_json(
        &test.app,
        Method::POST,
        "/api/sentences/validate",
        Some(json!([
            "too short",
            "my grandmother baked bread every sunday",
            "rain falls hardest in early april"
        ])),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(
        error["message"]
            .as_str()
            .unwrap()
            .contains("between 5 and 10 words")
    );
}

#[tokio::test]
async fn registration_validation_aggregates_field_errors() {
    let test = setup_app().await;

    let (status, error) = request_json(
        &test.app,
        Method::POST,
        "/api/users/validate",
        Some(json!({
            "username": "a!",
            "email": "not-an-email",
            "age": 12,
            "password_reminder": 30
        })),
        None,
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    let fields: Vec<&str> = error["errors"]
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["field"].as_str().unwrap())
        .collect();
    assert!(fields.contains(&"username"));
    assert!(fields.contains(&"email"));
    assert!(fields.contains(&"age"));
}

#[tokio::test]
async fn wrong_answer_is_rejected_with_401() {
    let test = setup_app().await;
    let username = unique_username("wrong");

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

    let body = registration_body(&username, &preview["questions"], ANSWER);
    let (status, _) =
        request_json(&test.app, Method::POST, "/api/users", Some(body), None).await;
    assert_eq!(status, StatusCode::CREATED);

    let (_, challenge) = request_json(
        &test.app,
        Method::POST,
        "/api/users/validate-login",
        Some(json!({
            "identity": username,
            "password": "w0rd$)(9@sleet+cloud"
        })),
        None,
    )
    .await;

    // Case-sensitive exact match: the lowercased answer must fail
    let (status, _) = request_json(
        &test.app,
        Method::POST,
        "/api/users/login",
        Some(json!({
            "userId": challenge["userId"],
            "questionId": challenge["question"]["id"],
            "answer": ANSWER.to_lowercase()
        })),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn unknown_identity_gets_generic_invalid_credentials() {
    let test = setup_app().await;

    let (status, error) = request_json(
        &test.app,
        Method::POST,
        "/api/users/validate-login",
        Some(json!({
            "identity": "nobody_here",
            "password": "whatever-goes"
        })),
        None,
    )
    .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(error["message"].as_str().unwrap().contains("Invalid credentials"));
}
