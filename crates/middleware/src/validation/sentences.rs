use lazy_static::lazy_static;
use recall_error::{AppError, AppResult};
use regex::Regex;

/// How many sentences a registration must carry, and the word range each
/// one has to stay memorable without collapsing the entropy pool.
pub const REQUIRED_SENTENCES: usize = 3;
pub const MIN_WORDS: usize = 5;
pub const MAX_WORDS: usize = 10;

lazy_static! {
    static ref WORD_REGEX: Regex = Regex::new(r"\w+").unwrap();
}

/// Counts words the way the validation rules define them
pub fn word_count(sentence: &str) -> usize {
    WORD_REGEX.find_iter(sentence).count()
}

/// Rule for the full sentence set; returns the failure message, or `None`
pub fn sentence_set_rule(sentences: &[String]) -> Option<String> {
    if sentences.len() != REQUIRED_SENTENCES {
        return Some(format!("You must enter {} sentences", REQUIRED_SENTENCES));
    }

    for sentence in sentences {
        let count = word_count(sentence);
        if count < MIN_WORDS || count > MAX_WORDS {
            return Some(format!(
                "All the sentences must be between {} and {} words",
                MIN_WORDS, MAX_WORDS
            ));
        }
    }

    None
}

/// Validates the sentence set submitted for the registration preview
pub fn validate_sentence_set(sentences: &[String]) -> AppResult<()> {
    if let Some(message) = sentence_set_rule(sentences) {
        return Err(AppError::ValidationError(message));
    }

    Ok(())
}
