use crate::{
    handlers::{self, sentences, users},
    service::AccountService,
};
use std::{sync::Arc, time::Duration};
use tower::ServiceBuilder;
use tower_http::{
    compression::CompressionLayer, cors::CorsLayer, limit::RequestBodyLimitLayer,
    timeout::TimeoutLayer, trace::TraceLayer,
};

use axum::{
    Router,
    extract::Extension,
    routing::{get, post},
};

use recall_config::AppConfig;
use recall_error::middleware_handling::error_handling_middleware;
use recall_middleware::AuthState;

/// Build the application router. Protected handlers gate themselves through
/// the `AuthUser` extractor backed by `auth_state`.
pub fn create_routes(
    service: Arc<AccountService>,
    auth_state: AuthState,
    config: &AppConfig,
) -> Router {
    let cors_config = &config.security.cors;

    // Configure CORS with settings from config
    let cors = CorsLayer::new()
        .allow_origin(
            if cors_config.allowed_origins.contains(&"*".to_string()) {
                tower_http::cors::AllowOrigin::any()
            } else {
                tower_http::cors::AllowOrigin::list(
                    cors_config
                        .allowed_origins
                        .iter()
                        .filter_map(|origin| origin.parse().ok())
                        .collect::<Vec<_>>(),
                )
            },
        )
        .allow_methods(
            cors_config
                .allowed_methods
                .iter()
                .filter_map(|method| method.parse().ok())
                .collect::<Vec<axum::http::Method>>(),
        )
        .allow_headers(
            cors_config
                .allowed_headers
                .iter()
                .filter_map(|header| header.parse().ok())
                .collect::<Vec<axum::http::HeaderName>>(),
        );

    // Global middleware stack WITHOUT the body limit
    let middleware_stack = ServiceBuilder::new()
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(TimeoutLayer::new(Duration::from_secs(30)))
        .layer(cors);

    let app = Router::new()
        .route("/health", get(handlers::health_check))
        .route("/api/ping", get(handlers::ping))
        .route("/api/users/ping", get(users::ping))
        .route(
            "/api/users",
            post(users::register)
                .get(users::get_user)
                .put(users::change_email),
        )
        .route("/api/users/validate", post(users::validate_user))
        .route("/api/users/validate-login", post(users::validate_login))
        .route("/api/users/login", post(users::login))
        .route("/api/users/validate-user", post(users::validate_user_email))
        .route("/api/users/forgot-password", post(users::forgot_password))
        .route("/api/users/question", get(users::get_question))
        .route("/api/users/password", post(users::reset_password))
        .route("/api/users/validate-email", post(users::validate_email))
        .route("/api/users/logout", get(users::logout))
        .route("/api/sentences/ping", get(sentences::ping))
        .route("/api/sentences/validate", post(sentences::validate_sentences));

    let app = app
        .layer(Extension(service))
        .layer(axum::middleware::from_fn(error_handling_middleware))
        .layer(RequestBodyLimitLayer::new(config.server.body_limit));

    app.layer(middleware_stack).with_state(auth_state)
}
