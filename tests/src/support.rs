use async_trait::async_trait;
use axum::{
    Router,
    body::Body,
    extract::Request,
    http::{Method, StatusCode},
};
use serde_json::{Value, json};
use std::sync::{Arc, Mutex};
use tokio::sync::OnceCell;
use tower::ServiceExt;

use micro_auth::{routes::create_routes, seed, service::AccountService};
use recall_config::AppConfig;
use recall_database::{DB_ARC, Database, db_connect::initialize_memory_db, service::DbService};
use recall_mailer::{MailError, MailTransport};
use recall_middleware::{AuthState, JwtService};
use recall_models::{
    question::{Answer, Question},
    sentence::Sentence,
    user::User,
};

pub const TEST_SECRET: &[u8] = b"test_secret_key_for_system_testing_only";
pub const WEB_CLIENT: &str = "http://localhost:8080";

static SEEDED: OnceCell<()> = OnceCell::const_new();

#[derive(Debug, Clone)]
pub struct SentMail {
    pub to: String,
    pub subject: String,
    pub html: String,
}

/// Recording mail transport; nothing leaves the process
#[derive(Default)]
pub struct MockMailer {
    sent: Mutex<Vec<SentMail>>,
}

impl MockMailer {
    pub fn sent_count(&self) -> usize {
        self.sent.lock().unwrap().len()
    }

    pub fn last_mail(&self) -> Option<SentMail> {
        self.sent.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl MailTransport for MockMailer {
    async fn send(&self, to: &str, subject: &str, html: &str) -> Result<(), MailError> {
        self.sent.lock().unwrap().push(SentMail {
            to: to.to_string(),
            subject: subject.to_string(),
            html: html.to_string(),
        });
        Ok(())
    }
}

pub struct TestApp {
    pub app: Router,
    pub mailer: Arc<MockMailer>,
    pub jwt_service: Arc<JwtService>,
}

async fn test_db() -> &'static Arc<Database> {
    let db = DB_ARC
        .get_or_init(|| async {
            initialize_memory_db()
                .await
                .expect("memory database should initialize")
        })
        .await;

    SEEDED
        .get_or_init(|| async {
            let questions = DbService::<Question>::new(db, "questions");
            seed::ensure_questions(&questions)
                .await
                .expect("question seeding should succeed");
        })
        .await;

    db
}

/// Build a full application against the shared in-memory database. Tests
/// isolate themselves with unique usernames/emails.
pub async fn setup_app() -> TestApp {
    let db = test_db().await;

    let users = Arc::new(DbService::<User>::new(db, "users"));
    let questions = Arc::new(DbService::<Question>::new(db, "questions"));
    let answers = Arc::new(DbService::<Answer>::new(db, "answers"));
    let sentences = Arc::new(DbService::<Sentence>::new(db, "sentences"));

    let jwt_service = Arc::new(JwtService::new(TEST_SECRET, 3, 3600));
    let mailer = Arc::new(MockMailer::default());

    let account_service = Arc::new(AccountService::new(
        Arc::clone(&jwt_service),
        Arc::clone(&users),
        questions,
        answers,
        sentences,
        Arc::clone(&mailer) as Arc<dyn MailTransport>,
        WEB_CLIENT.to_string(),
    ));

    let auth_state = AuthState::new(Arc::clone(&jwt_service), users);
    let config = AppConfig::default();
    let app = create_routes(account_service, auth_state, &config);

    TestApp {
        app,
        mailer,
        jwt_service,
    }
}

/// Helper to make JSON requests against the router
pub async fn request_json(
    app: &Router,
    method: Method,
    uri: &str,
    body: Option<Value>,
    auth_token: Option<&str>,
) -> (StatusCode, Value) {
    let mut req_builder = Request::builder()
        .uri(uri)
        .method(method)
        .header("Content-Type", "application/json");

    if let Some(token) = auth_token {
        req_builder = req_builder.header("Authorization", format!("Bearer {}", token));
    }

    let request_body = match body {
        Some(value) => Body::from(serde_json::to_string(&value).unwrap()),
        None => Body::empty(),
    };

    let request = req_builder.body(request_body).unwrap();

    let response = app.clone().oneshot(request).await.unwrap();

    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body_json: Value = serde_json::from_slice(&bytes).unwrap_or_else(|_| json!({}));

    (status, body_json)
}

/// Pull the tokened password-view link out of a recorded mail body
pub fn extract_token(html: &str) -> String {
    let start = html.find("qs=").expect("mail should carry a tokened link") + 3;
    html[start..]
        .chars()
        .take_while(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'))
        .collect()
}

/// A registration payload answering every seeded question, so any random
/// challenge is answerable
pub fn registration_body(username: &str, questions: &Value, answer: &str) -> Value {
    let answers: Vec<Value> = questions
        .as_array()
        .expect("questions should be an array")
        .iter()
        .map(|q| json!({ "text": answer, "questionId": q["id"] }))
        .collect();

    json!({
        "username": username,
        "email": format!("{}@example.com", username),
        "password": "w0rd$)(9@sleet+cloud",
        "sex": "female",
        "age": 27,
        "location": "Lagos",
        "password_reminder": 30,
        "sentences": [
            { "text": "the quick brown fox jumps today" },
            { "text": "my grandmother baked bread every sunday" },
            { "text": "rain falls hardest in early april" }
        ],
        "answers": answers
    })
}

pub fn unique_username(prefix: &str) -> String {
    // Keep within the 32-character username limit
    let suffix = uuid::Uuid::new_v4().simple().to_string();
    format!("{}_{}", prefix, &suffix[..12])
}
