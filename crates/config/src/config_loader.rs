use anyhow::Result;
use dotenv::dotenv;
use serde::{Deserialize, Serialize};
use std::{env, fs, path::Path};
use tracing::{debug, info, warn};

use recall_error::{AppError, AppResult};

/// Complete application configuration loaded from a JSON file
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct AppConfig {
    pub environment: String,
    pub database: SurrealDbConfig,
    pub server: ServerConfig,
    pub security: SecurityConfig,
    pub mail: MailConfig,
    pub monitoring: MonitoringConfig,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct SurrealDbConfig {
    pub endpoint: String,
    pub username: String,
    pub password: String,
    pub namespace: String,
    pub database: String,
    pub pool: DbPoolConfig,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct DbPoolConfig {
    pub size: usize,
    pub connection_timeout: u64,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub body_limit: usize,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct SecurityConfig {
    pub jwt: JwtConfig,
    pub cors: CorsConfig,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct JwtConfig {
    pub secret: String,
    pub algorithm: String,
    /// Standard login-session window, in days
    pub session_expiry_days: u64,
    /// Password-reset window, in seconds
    pub reset_expiry_secs: u64,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct CorsConfig {
    pub allowed_origins: Vec<String>,
    pub allowed_methods: Vec<String>,
    pub allowed_headers: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct MailConfig {
    /// Mailgun-compatible messages endpoint
    pub api_url: String,
    pub api_key: String,
    pub domain: String,
    pub sender: String,
    /// Base URL of the web client; password-view links are built against it
    pub web_client_base_url: String,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct MonitoringConfig {
    pub sentry: SentryConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct SentryConfig {
    pub dsn: String,
    pub environment: String,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String,
}

impl AppConfig {
    /// Load configuration from a JSON file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let config: AppConfig = serde_json::from_str(&fs::read_to_string(path)?)?;
        debug!("Configuration loaded from file");
        Ok(config)
    }

    /// Load configuration from the embedded default, then apply environment
    /// overrides for secrets
    pub fn load() -> AppResult<Self> {
        let config_content =
            std::str::from_utf8(include_bytes!("../res/app-config.json")).expect("Invalid UTF-8");

        let mut config = match serde_json::from_str::<AppConfig>(config_content) {
            Ok(conf) => {
                info!("Loaded configuration for environment: {}", conf.environment);
                conf
            }
            Err(e) => {
                warn!(
                    "Failed to load config file: {}. Using default configuration.",
                    e
                );
                Self::default()
            }
        };

        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Secrets come from the environment when present; the JSON file only
    /// carries development defaults
    fn apply_env_overrides(&mut self) {
        dotenv().ok();

        if let Ok(secret) = env::var("SECRET_KEY") {
            self.security.jwt.secret = secret;
        }
        if let Ok(key) = env::var("MAIL_SERVER_API_KEY") {
            self.mail.api_key = key;
        }
        if let Ok(url) = env::var("MAIL_SERVER") {
            self.mail.api_url = url;
        }
        if let Ok(dsn) = env::var("SENTRY_DSN") {
            self.monitoring.sentry.dsn = dsn;
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> AppResult<()> {
        let mut errors = Vec::new();
        let is_production = self.environment == "production";

        // Database
        if self.database.endpoint.trim().is_empty() {
            errors.push("Database endpoint cannot be empty".to_string());
        } else if is_production
            && !self.database.endpoint.starts_with("wss://")
            && !self.database.endpoint.contains("memory")
        {
            errors.push("Production should use a secure 'wss://' database connection".to_string());
        }

        if self.database.namespace.trim().is_empty() {
            errors.push("Database namespace cannot be empty".to_string());
        }

        if self.database.database.trim().is_empty() {
            errors.push("Database name cannot be empty".to_string());
        }

        if is_production && self.database.username == "root" {
            errors.push("Using the default 'root' database username in production is insecure".to_string());
        }

        if is_production && self.database.password == "root" {
            errors.push("Using the default 'root' database password in production is insecure".to_string());
        }

        // Server
        if self.server.host.trim().is_empty() {
            errors.push("Server host cannot be empty".to_string());
        }

        if self.server.port == 0 {
            errors.push("Server port cannot be 0".to_string());
        }

        // Security
        if is_production
            && (self.security.jwt.secret.len() < 32
                || self.security.jwt.secret == "an-extremely-long-key")
        {
            errors.push("JWT secret is not secure for production use".to_string());
        }

        if self.security.jwt.session_expiry_days == 0 {
            errors.push("Session token expiry must be at least one day".to_string());
        }

        if self.security.jwt.reset_expiry_secs == 0 {
            errors.push("Reset token expiry must be greater than zero".to_string());
        }

        // Mail
        if is_production && self.mail.api_url.trim().is_empty() {
            errors.push("Mail server URL should be configured in production".to_string());
        }

        if is_production && self.mail.api_key.trim().is_empty() {
            errors.push("Mail server API key should be configured in production".to_string());
        }

        if !errors.is_empty() {
            return Err(AppError::ConfigError(anyhow::anyhow!(
                "Invalid configuration: {}",
                errors.join(", ")
            )));
        }
        Ok(())
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            environment: "development".to_string(),
            database: SurrealDbConfig {
                endpoint: "ws://localhost:8000".to_string(),
                username: "root".to_string(),
                password: "root".to_string(),
                namespace: "recallDb".to_string(),
                database: "recall".to_string(),
                pool: DbPoolConfig {
                    size: 5,
                    connection_timeout: 5000,
                },
            },
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 3000,
                body_limit: 1048576, // 1MB
            },
            security: SecurityConfig {
                jwt: JwtConfig {
                    secret: "an-extremely-long-key".to_string(),
                    algorithm: "HS256".to_string(),
                    session_expiry_days: 3,
                    reset_expiry_secs: 3600,
                },
                cors: CorsConfig {
                    allowed_origins: vec!["*".to_string()],
                    allowed_methods: vec![
                        "GET".to_string(),
                        "POST".to_string(),
                        "PUT".to_string(),
                        "OPTIONS".to_string(),
                    ],
                    allowed_headers: vec!["Content-Type".to_string(), "Authorization".to_string()],
                },
            },
            mail: MailConfig {
                api_url: "".to_string(),
                api_key: "".to_string(),
                domain: "recall".to_string(),
                sender: "Recall".to_string(),
                web_client_base_url: "http://localhost:8080".to_string(),
            },
            monitoring: MonitoringConfig {
                sentry: SentryConfig {
                    dsn: "".to_string(),
                    environment: "development".to_string(),
                },
                logging: LoggingConfig {
                    level: "info".to_string(),
                    format: "text".to_string(),
                },
            },
        }
    }
}
