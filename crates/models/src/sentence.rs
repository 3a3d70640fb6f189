use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use surrealdb::sql::Thing;
use uuid::Uuid;

/// A short user-composed phrase used only as entropy for password
/// derivation. Immutable after creation.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Sentence {
    #[serde(default = "Sentence::generate_id")]
    pub id: Thing,
    pub text: String,
    pub user_id: String,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
}

impl Sentence {
    fn generate_id() -> Thing {
        Thing::from(("sentences".to_string(), Uuid::new_v4().to_string()))
    }

    pub fn new(text: String, user_id: String) -> Self {
        Self {
            id: Self::generate_id(),
            text,
            user_id,
            created_at: Utc::now(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct SentenceInput {
    pub text: String,
}
