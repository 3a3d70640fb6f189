/// Provides a convenient way to add context to database errors
///
/// # Example
/// ```ignore
/// with_context!(db_operation, "Failed to fetch user data")
/// ```
#[macro_export]
macro_rules! with_context {
    ($result:expr, $context:expr) => {
        $result.map_err(|e| {
            tracing::error!("{}: {}", $context, e);
            recall_error::AppError::DatabaseError(anyhow::anyhow!("{}: {}", $context, e))
        })
    };

    ($result:expr, $error_type:ident, $context:expr) => {
        $result.map_err(|e| {
            tracing::error!("{}: {}", $context, e);
            recall_error::AppError::$error_type(anyhow::anyhow!("{}: {}", $context, e))
        })
    };
}

/// Simplifies creating field-keyed validation errors
///
/// # Example
/// ```ignore
/// validation_error!("username", "Username must be at least 3 characters long")
/// ```
#[macro_export]
macro_rules! validation_error {
    ($field:expr, $message:expr) => {
        Err(recall_error::AppError::FieldErrors(vec![
            recall_error::FieldError::new($field, $message),
        ]))
    };
}

/// Simplifies creating not found errors
///
/// # Example
/// ```ignore
/// not_found_error!("User", user_id)
/// ```
#[macro_export]
macro_rules! not_found_error {
    ($resource_type:expr, $identifier:expr) => {
        Err(recall_error::AppError::NotFoundError(format!(
            "{} with identifier '{}' was not found.",
            $resource_type, $identifier
        )))
    };
}

/// Simplifies creating authentication errors
///
/// # Example
/// ```ignore
/// auth_error!("Invalid credentials.")
/// ```
#[macro_export]
macro_rules! auth_error {
    ($message:expr) => {
        Err(recall_error::AppError::AuthenticationError(
            $message.to_string(),
        ))
    };
}
