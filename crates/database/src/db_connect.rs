use anyhow::Context;
use recall_config::SurrealDbConfig;
use recall_error::AppError;
use std::sync::Arc;

use crate::{Database, service::DbCredentials};

/// Unique-index names; their appearance in a storage error identifies which
/// field collided on a concurrent insert.
const UNIQUE_USERNAME_INDEX: &str = "idx_users_username";
const UNIQUE_EMAIL_INDEX: &str = "idx_users_email";

pub async fn initialize_db(db_config: &SurrealDbConfig) -> Result<Arc<Database>, AppError> {
    tracing::debug!("Connecting to SurrealDB: {}", db_config.endpoint);

    let is_secure = db_config.endpoint.starts_with("wss://");

    if is_secure {
        tracing::info!("Using secure TLS connection to database");
    } else if !db_config.endpoint.contains("memory") {
        tracing::warn!("Using non-secure database connection");
    }

    let max_connections = db_config.pool.size;

    tracing::info!(
        "Initializing database connection pool with {} connections",
        max_connections
    );

    let credentials = DbCredentials::new(db_config.username.clone(), db_config.password.clone());

    let db = Database::initialize(
        &db_config.endpoint,
        max_connections,
        &db_config.namespace,
        &db_config.database,
        &credentials,
    )
    .await?;

    ensure_schema(&db).await?;

    tracing::info!("Successfully connected to SurrealDB with connection pool");

    Ok(Arc::new(db))
}

pub async fn initialize_memory_db() -> Result<Arc<Database>, AppError> {
    let db = Database::initialize_memory_db(10, "recallDb", "recall").await?;

    ensure_schema(&db).await?;

    tracing::info!("Successfully connected to in-memory SurrealDB with connection pool");

    Ok(Arc::new(db))
}

/// Define the unique indexes the registration flow relies on. Concurrent
/// inserts of the same username or email fail here even when both requests
/// pass the pre-write duplicate checks.
pub async fn ensure_schema(db: &Database) -> Result<(), AppError> {
    let statements = [
        format!(
            "DEFINE INDEX IF NOT EXISTS {} ON TABLE users COLUMNS username UNIQUE",
            UNIQUE_USERNAME_INDEX
        ),
        format!(
            "DEFINE INDEX IF NOT EXISTS {} ON TABLE users COLUMNS email UNIQUE",
            UNIQUE_EMAIL_INDEX
        ),
    ];

    let conn = db.get_connection().await?;
    for statement in &statements {
        conn.get_ref()
            .query(statement.as_str())
            .await
            .context("Failed to define schema")
            .map_err(AppError::DatabaseError)?
            .check()
            .context("Schema definition rejected")
            .map_err(AppError::DatabaseError)?;
    }

    Ok(())
}

/// Translate a unique-index violation into the field-keyed duplicate error;
/// any other storage failure passes through untouched.
pub fn map_unique_violation(err: AppError) -> AppError {
    let message = err.to_string();

    if message.contains(UNIQUE_USERNAME_INDEX) {
        AppError::duplicate("username", "A user with that username already exists")
    } else if message.contains(UNIQUE_EMAIL_INDEX) {
        AppError::duplicate("email", "A user with that email already exists")
    } else {
        err
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn index_violations_map_to_field_keyed_duplicates() {
        let err = AppError::DatabaseError(anyhow::anyhow!(
            "Database index `idx_users_username` already contains 'alice'"
        ));
        match map_unique_violation(err) {
            AppError::DuplicateError(field_error) => assert_eq!(field_error.field, "username"),
            other => panic!("expected DuplicateError, got {:?}", other),
        }
    }

    #[test]
    fn unrelated_errors_pass_through() {
        let err = AppError::DatabaseError(anyhow::anyhow!("connection reset"));
        assert!(matches!(
            map_unique_violation(err),
            AppError::DatabaseError(_)
        ));
    }
}
