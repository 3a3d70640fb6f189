mod sentences;
mod user_account;

pub use sentences::*;
pub use user_account::*;

/// Sanitizes a string input by trimming whitespace
pub fn sanitize_string(input: &str) -> String {
    input.trim().to_string()
}
