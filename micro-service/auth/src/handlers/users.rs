use axum::{
    Extension, Json,
    http::{StatusCode, header},
    response::IntoResponse,
};
use serde_json::{Value, json};
use std::sync::Arc;

use recall_error::AppResult;
use recall_middleware::AuthUser;
use recall_models::{
    question::QuestionView,
    user::{
        AuthResponse, ChangeEmailInput, EmailInput, ForgotPasswordInput, LoginInput,
        LoginStartInput, RegisterInput, ResetPasswordInput, UserProfile,
    },
};

use crate::service::{AccountService, AccountServiceTrait, LoginChallenge};

pub async fn ping() -> Json<Value> {
    Json(json!({ "message": "Users Route!" }))
}

pub async fn register(
    Extension(service): Extension<Arc<AccountService>>,
    Json(input): Json<RegisterInput>,
) -> AppResult<impl IntoResponse> {
    let auth = service.register(input).await?;

    Ok((
        StatusCode::CREATED,
        [(header::LOCATION, "/api/users")],
        Json(auth),
    ))
}

pub async fn validate_user(
    Extension(service): Extension<Arc<AccountService>>,
    Json(input): Json<RegisterInput>,
) -> AppResult<Json<Value>> {
    service.validate_new_user(input).await?;
    Ok(Json(json!({})))
}

pub async fn validate_login(
    Extension(service): Extension<Arc<AccountService>>,
    Json(input): Json<LoginStartInput>,
) -> AppResult<Json<LoginChallenge>> {
    let challenge = service.validate_login(input).await?;
    Ok(Json(challenge))
}

pub async fn login(
    Extension(service): Extension<Arc<AccountService>>,
    Json(input): Json<LoginInput>,
) -> AppResult<Json<AuthResponse>> {
    let auth = service.login(input).await?;
    Ok(Json(auth))
}

pub async fn validate_user_email(
    Extension(service): Extension<Arc<AccountService>>,
    Json(input): Json<EmailInput>,
) -> AppResult<Json<QuestionView>> {
    let question = service.question_for_email(&input.email).await?;
    Ok(Json(question))
}

pub async fn forgot_password(
    Extension(service): Extension<Arc<AccountService>>,
    Json(input): Json<ForgotPasswordInput>,
) -> AppResult<Json<Value>> {
    service.forgot_password(input).await?;
    Ok(Json(json!({
        "message": "A message has been sent to your email"
    })))
}

pub async fn get_question(
    Extension(service): Extension<Arc<AccountService>>,
) -> AppResult<Json<Value>> {
    let question = service.random_question().await?;
    Ok(Json(json!({ "question": question })))
}

pub async fn reset_password(
    Extension(service): Extension<Arc<AccountService>>,
    Json(input): Json<ResetPasswordInput>,
) -> AppResult<Json<Value>> {
    let password = service.reset_password(input).await?;
    Ok(Json(json!({ "password": password })))
}

pub async fn validate_email(
    AuthUser(_user): AuthUser,
    Extension(service): Extension<Arc<AccountService>>,
    Json(input): Json<EmailInput>,
) -> AppResult<Json<QuestionView>> {
    let question = service.check_email_available(&input.email).await?;
    Ok(Json(question))
}

pub async fn change_email(
    AuthUser(user): AuthUser,
    Extension(service): Extension<Arc<AccountService>>,
    Json(input): Json<ChangeEmailInput>,
) -> AppResult<Json<UserProfile>> {
    let profile = service.change_email(user, input).await?;
    Ok(Json(profile))
}

pub async fn logout(AuthUser(_user): AuthUser) -> Json<Value> {
    Json(json!({ "message": "Successfully logged out." }))
}

pub async fn get_user(AuthUser(user): AuthUser) -> Json<UserProfile> {
    Json(UserProfile::from(user))
}
