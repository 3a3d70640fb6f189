use axum::{Extension, Json};
use serde_json::{Value, json};
use std::sync::Arc;

use recall_error::AppResult;

use crate::service::{AccountService, AccountServiceTrait, SentencePreview};

pub async fn ping() -> Json<Value> {
    Json(json!({ "message": "Sentences Route!" }))
}

/// Registration preview: the submitted sentences are validated and answered
/// with candidate passwords plus the question catalogue
pub async fn validate_sentences(
    Extension(service): Extension<Arc<AccountService>>,
    Json(sentences): Json<Vec<String>>,
) -> AppResult<Json<SentencePreview>> {
    let preview = service.preview_passwords(sentences).await?;
    Ok(Json(preview))
}
