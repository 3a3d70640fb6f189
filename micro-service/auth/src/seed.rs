use tracing::info;

use recall_database::service::DbService;
use recall_error::AppResult;
use recall_models::question::Question;

/// The fixed security-question catalogue. Answers reference these by id, so
/// the set only ever grows.
const QUESTIONS: [&str; 2] = [
    "What was the happiest moment of your life",
    "What was your first nickname",
];

/// Seed the questions table on first start; later starts are a no-op
pub async fn ensure_questions(questions: &DbService<'static, Question>) -> AppResult<usize> {
    let existing = questions.get_all_records().await?;
    if !existing.is_empty() {
        return Ok(existing.len());
    }

    for text in QUESTIONS {
        questions.create_record(Question::new(text)).await?;
    }

    info!("Seeded {} security questions", QUESTIONS.len());
    Ok(QUESTIONS.len())
}
