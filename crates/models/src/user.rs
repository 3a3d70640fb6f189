use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use surrealdb::sql::Thing;
use uuid::Uuid;

use crate::{question::AnswerInput, sentence::SentenceInput};

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct User {
    #[serde(default = "User::generate_id")]
    pub id: Thing,
    pub username: String,
    pub email: String,
    /// Argon2 hash; never plaintext. Absent until the user picks one of the
    /// generated candidates.
    pub password: Option<String>,
    pub sex: Option<String>,
    pub age: Option<u32>,
    pub location: Option<String>,
    /// Days between password-reminder emails
    pub password_reminder: u32,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
}

impl User {
    // Helper to generate a new ID
    fn generate_id() -> Thing {
        Thing::from(("users".to_string(), Uuid::new_v4().to_string()))
    }

    pub fn new(
        username: String,
        email: String,
        password: Option<String>,
        sex: Option<String>,
        age: Option<u32>,
        location: Option<String>,
        password_reminder: u32,
    ) -> Self {
        Self {
            id: Self::generate_id(),
            username,
            email,
            password,
            sex,
            age,
            location,
            password_reminder,
            created_at: Utc::now(),
        }
    }

    /// The bare record key, as carried in token claims. `to_raw` avoids the
    /// bracket escaping `Display` adds around UUID keys.
    pub fn record_id(&self) -> String {
        self.id.id.to_raw()
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: String,
    pub username: String,
    pub email: String,
    pub sex: Option<String>,
    pub age: Option<u32>,
    pub location: Option<String>,
    pub password_reminder: u32,
    pub created_at: DateTime<Utc>,
}

// Convert User to UserProfile (hiding sensitive data)
impl From<User> for UserProfile {
    fn from(user: User) -> Self {
        Self {
            id: user.id.id.to_raw(),
            username: user.username,
            email: user.email,
            sex: user.sex,
            age: user.age,
            location: user.location,
            password_reminder: user.password_reminder,
            created_at: user.created_at,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct RegisterInput {
    pub username: String,
    pub email: String,
    pub password: Option<String>,
    pub sex: Option<String>,
    pub age: Option<u32>,
    pub location: Option<String>,
    pub password_reminder: u32,
    #[serde(default)]
    pub sentences: Vec<SentenceInput>,
    #[serde(default)]
    pub answers: Vec<AnswerInput>,
}

/// First login step: identity (username or email) plus the chosen password
#[derive(Debug, Deserialize)]
pub struct LoginStartInput {
    pub identity: String,
    pub password: String,
}

/// Second login step: the security-question challenge
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginInput {
    pub user_id: String,
    pub question_id: String,
    pub answer: String,
}

#[derive(Debug, Deserialize)]
pub struct EmailInput {
    pub email: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ForgotPasswordInput {
    pub email: String,
    pub question_id: String,
    pub answer: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResetPasswordInput {
    pub token: String,
    pub question_id: String,
    pub answer: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeEmailInput {
    pub email: String,
    pub question_id: String,
    pub answer: String,
}

#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub token: String,
}
