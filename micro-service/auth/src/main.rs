use anyhow::Context;
use micro_auth::{reminder, routes, seed, service::AccountService};
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{Level, error, info};
use tracing_subscriber::{FmtSubscriber, layer::SubscriberExt};

use recall_config::AppConfig;
use recall_database::{DB_ARC, db_connect::initialize_db, service::DbService};
use recall_error::AppError;
use recall_mailer::{HttpMailer, MailTransport};
use recall_middleware::{AuthState, JwtService};
use recall_models::{
    question::{Answer, Question},
    sentence::Sentence,
    user::User,
};

#[tokio::main]
async fn main() -> Result<(), AppError> {
    // Configuration is read exactly once, here, and passed down explicitly
    let config = AppConfig::load()?;

    let _guard = if config.monitoring.sentry.dsn.is_empty() {
        None
    } else {
        Some(sentry::init((
            config.monitoring.sentry.dsn.clone(),
            sentry::ClientOptions {
                release: sentry::release_name!(),
                ..Default::default()
            },
        )))
    };

    // Initialize the logger
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .finish();

    let subscriber = subscriber.with(sentry_tracing::layer());
    tracing::subscriber::set_global_default(subscriber).expect("Failed to set tracing subscriber");

    info!("Starting application at {}", chrono::Utc::now());

    // Initialize the database connection
    let db_arc = DB_ARC
        .get_or_init(|| async {
            initialize_db(&config.database).await.unwrap_or_else(|e| {
                error!("Database initialization failed: {}", e);
                panic!("Database initialization failed");
            })
        })
        .await;

    let users = Arc::new(DbService::<User>::new(db_arc, "users"));
    let questions = Arc::new(DbService::<Question>::new(db_arc, "questions"));
    let answers = Arc::new(DbService::<Answer>::new(db_arc, "answers"));
    let sentences = Arc::new(DbService::<Sentence>::new(db_arc, "sentences"));

    let available = seed::ensure_questions(&questions).await?;
    info!("{} security questions available", available);

    let jwt_config = &config.security.jwt;
    let jwt_service = Arc::new(JwtService::new(
        jwt_config.secret.as_bytes(),
        jwt_config.session_expiry_days,
        jwt_config.reset_expiry_secs,
    ));

    let mailer: Arc<dyn MailTransport> = Arc::new(HttpMailer::new(config.mail.clone()));

    let account_service = Arc::new(AccountService::new(
        Arc::clone(&jwt_service),
        Arc::clone(&users),
        questions,
        answers,
        sentences,
        mailer,
        config.mail.web_client_base_url.clone(),
    ));

    // Rebuild the fire-and-forget reminder loops lost on the last shutdown
    let restarted = reminder::spawn_all(&users, account_service.reminder_context()).await?;
    info!("Password reminder loops running for {} users", restarted);

    let auth_state = AuthState::new(jwt_service, users);
    let app = routes::create_routes(account_service, auth_state, &config);

    // Bind server to address and start it
    let address = format!("{}:{}", config.server.host, config.server.port);
    let listener = TcpListener::bind(&address)
        .await
        .context(format!("Failed to bind to address: {}", address))?;

    info!("Server starting on http://{}", address);
    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}
