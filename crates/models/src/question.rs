use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use surrealdb::sql::Thing;
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Question {
    #[serde(default = "Question::generate_id")]
    pub id: Thing,
    pub text: String,
}

impl Question {
    fn generate_id() -> Thing {
        Thing::from(("questions".to_string(), Uuid::new_v4().to_string()))
    }

    pub fn new(text: impl Into<String>) -> Self {
        Self {
            id: Self::generate_id(),
            text: text.into(),
        }
    }

    pub fn record_id(&self) -> String {
        self.id.id.to_raw()
    }
}

/// Wire shape of a question; record ids travel as bare strings
#[derive(Debug, Serialize, Deserialize)]
pub struct QuestionView {
    pub id: String,
    pub text: String,
}

impl From<Question> for QuestionView {
    fn from(question: Question) -> Self {
        Self {
            id: question.id.id.to_raw(),
            text: question.text,
        }
    }
}

/// A user's response to one security question. Linked to its owner and
/// question by bare record keys. Nothing enforces one row per
/// (user, question) pair; lookups order by creation time and take the oldest.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Answer {
    #[serde(default = "Answer::generate_id")]
    pub id: Thing,
    pub text: String,
    pub user_id: String,
    pub question_id: String,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
}

impl Answer {
    fn generate_id() -> Thing {
        Thing::from(("answers".to_string(), Uuid::new_v4().to_string()))
    }

    pub fn new(text: String, user_id: String, question_id: String) -> Self {
        Self {
            id: Self::generate_id(),
            text,
            user_id,
            question_id,
            created_at: Utc::now(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerInput {
    pub text: String,
    pub question_id: String,
}
