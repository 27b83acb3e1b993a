use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub security: SecurityConfig,
    pub cache: CacheConfig,
    pub telegram: TelegramConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub port: u16,
    pub dashboard_dir: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub connection_timeout: u64,
    pub run_migrations: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    #[serde(skip_serializing)]
    pub jwt_secret: String,
    pub jwt_expiry_hours: u64,
    pub secure_cookies: bool,
    pub cors_origins: Vec<String>,
    #[serde(skip_serializing)]
    pub registration_secret: Option<String>,
    #[serde(skip_serializing)]
    pub cron_secret: Option<String>,
    pub bcrypt_cost: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    pub enabled: bool,
    pub redis_url: Option<String>,
    pub default_ttl_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelegramConfig {
    pub api_base: String,
    #[serde(skip_serializing)]
    pub bot_token: Option<String>,
    pub chat_id: Option<String>,
}

impl TelegramConfig {
    pub fn is_configured(&self) -> bool {
        self.bot_token.as_deref().is_some_and(|t| !t.is_empty())
            && self.chat_id.as_deref().is_some_and(|c| !c.is_empty())
    }
}

/// Outcome of [`AppConfig::validate`]: errors block startup in production,
/// warnings are only logged.
#[derive(Debug, Default, Clone)]
pub struct ConfigReport {
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid configuration: {}", .0.join("; "))]
    Invalid(Vec<String>),
}

impl ConfigReport {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn ensure_valid(&self) -> Result<(), ConfigError> {
        if self.is_valid() {
            Ok(())
        } else {
            Err(ConfigError::Invalid(self.errors.clone()))
        }
    }
}

const MIN_JWT_SECRET_LEN: usize = 32;
const KNOWN_EXAMPLE_SECRET: &str = "hr-analytics-super-secret-jwt-key-2024";

impl AppConfig {
    pub fn from_env() -> Self {
        let environment = match env::var("APP_ENV").as_deref() {
            Ok("production") | Ok("prod") => Environment::Production,
            Ok("staging") | Ok("stage") => Environment::Staging,
            _ => Environment::Development,
        };

        // Set defaults based on environment, then override with specific env vars
        match environment {
            Environment::Production => Self::production(),
            Environment::Staging => Self::staging(),
            Environment::Development => Self::development(),
        }
        .with_env_overrides()
    }

    fn with_env_overrides(mut self) -> Self {
        if let Some(port) = env::var("PORT").ok().and_then(|v| v.parse().ok()) {
            self.server.port = port;
        }
        if let Ok(v) = env::var("DASHBOARD_DIR") {
            self.server.dashboard_dir = PathBuf::from(v);
        }

        // Database overrides
        if let Ok(v) = env::var("DATABASE_URL") {
            self.database.url = v;
        }
        if let Ok(v) = env::var("DATABASE_MAX_CONNECTIONS") {
            self.database.max_connections = v.parse().unwrap_or(self.database.max_connections);
        }
        if let Ok(v) = env::var("DATABASE_CONNECTION_TIMEOUT") {
            self.database.connection_timeout = v.parse().unwrap_or(self.database.connection_timeout);
        }
        if let Ok(v) = env::var("DATABASE_RUN_MIGRATIONS") {
            self.database.run_migrations = v.parse().unwrap_or(self.database.run_migrations);
        }

        // Security overrides
        if let Ok(v) = env::var("JWT_SECRET") {
            self.security.jwt_secret = v.trim().to_string();
        }
        if let Ok(v) = env::var("SECURITY_JWT_EXPIRY_HOURS") {
            self.security.jwt_expiry_hours = v.parse().unwrap_or(self.security.jwt_expiry_hours);
        }
        if let Ok(v) = env::var("SECURITY_SECURE_COOKIES") {
            self.security.secure_cookies = v.parse().unwrap_or(self.security.secure_cookies);
        }
        if let Ok(v) = env::var("SECURITY_CORS_ORIGINS") {
            self.security.cors_origins = v.split(',').map(|s| s.trim().to_string()).collect();
        }
        if let Ok(v) = env::var("SECURITY_BCRYPT_COST") {
            self.security.bcrypt_cost = v.parse().unwrap_or(self.security.bcrypt_cost);
        }
        self.security.registration_secret = non_empty_var("REGISTRATION_SECRET");
        // Cron secrets pasted into hosting dashboards tend to carry a trailing newline
        self.security.cron_secret = non_empty_var("CRON_SECRET");

        // Cache overrides
        if let Ok(v) = env::var("CACHE_ENABLED") {
            self.cache.enabled = v.parse().unwrap_or(self.cache.enabled);
        }
        if let Ok(v) = env::var("CACHE_DEFAULT_TTL_SECS") {
            self.cache.default_ttl_secs = v.parse().unwrap_or(self.cache.default_ttl_secs);
        }
        self.cache.redis_url = non_empty_var("REDIS_URL");

        // Telegram overrides
        if let Ok(v) = env::var("TELEGRAM_API_BASE") {
            self.telegram.api_base = v.trim_end_matches('/').to_string();
        }
        self.telegram.bot_token = non_empty_var("TELEGRAM_BOT_TOKEN");
        self.telegram.chat_id = non_empty_var("TELEGRAM_CHAT_ID");

        self
    }

    pub fn development() -> Self {
        Self {
            environment: Environment::Development,
            server: ServerConfig {
                port: 3000,
                dashboard_dir: PathBuf::from("public"),
            },
            database: DatabaseConfig {
                url: String::new(),
                max_connections: 10,
                connection_timeout: 30,
                run_migrations: true,
            },
            security: SecurityConfig {
                jwt_secret: String::new(),
                jwt_expiry_hours: 24 * 7, // 1 week
                secure_cookies: false,
                cors_origins: vec!["http://localhost:3000".to_string(), "http://localhost:5173".to_string()],
                registration_secret: None,
                cron_secret: None,
                bcrypt_cost: 10,
            },
            cache: CacheConfig {
                enabled: true,
                redis_url: None,
                default_ttl_secs: 60,
            },
            telegram: TelegramConfig {
                api_base: "https://api.telegram.org".to_string(),
                bot_token: None,
                chat_id: None,
            },
        }
    }

    pub fn staging() -> Self {
        let mut config = Self::development();
        config.environment = Environment::Staging;
        config.database.max_connections = 20;
        config.database.connection_timeout = 10;
        config.security.secure_cookies = true;
        config.security.cors_origins = vec!["https://staging.cleanwhale.pl".to_string()];
        config.security.bcrypt_cost = 12;
        config
    }

    pub fn production() -> Self {
        let mut config = Self::development();
        config.environment = Environment::Production;
        config.database.max_connections = 20;
        config.database.connection_timeout = 5;
        config.security.secure_cookies = true;
        config.security.cors_origins = vec!["https://analytics.cleanwhale.pl".to_string()];
        config.security.bcrypt_cost = 12;
        config
    }

    pub fn is_production(&self) -> bool {
        self.environment == Environment::Production
    }

    /// Check the settings the service cannot run safely without.
    pub fn validate(&self) -> ConfigReport {
        let mut report = ConfigReport::default();

        let url = self.database.url.trim();
        if url.is_empty() {
            report.errors.push("Missing required environment variable: DATABASE_URL".to_string());
        } else if looks_like_placeholder(url) {
            report.errors.push("DATABASE_URL contains a placeholder value".to_string());
        } else {
            match url::Url::parse(url) {
                Ok(parsed) if matches!(parsed.scheme(), "postgres" | "postgresql") => {
                    if self.is_production()
                        && matches!(parsed.host_str(), Some("localhost") | Some("127.0.0.1"))
                    {
                        report.warnings.push("DATABASE_URL points to localhost in production mode".to_string());
                    }
                }
                Ok(_) => report.errors.push("DATABASE_URL must start with postgres:// or postgresql://".to_string()),
                Err(_) => report.errors.push("DATABASE_URL is not a valid URL".to_string()),
            }
        }

        let secret = self.security.jwt_secret.as_str();
        if secret.is_empty() {
            report.errors.push("Missing required environment variable: JWT_SECRET".to_string());
        } else {
            if secret == "fallback-secret" {
                report.errors.push("JWT_SECRET cannot be \"fallback-secret\"".to_string());
            }
            if looks_like_placeholder(secret) {
                report.errors.push("JWT_SECRET contains a placeholder value".to_string());
            }
            if secret.len() < MIN_JWT_SECRET_LEN {
                report.errors.push(format!("JWT_SECRET must be at least {MIN_JWT_SECRET_LEN} characters long"));
            }
            if secret == KNOWN_EXAMPLE_SECRET {
                report.warnings.push("JWT_SECRET is the example value; change it for production".to_string());
            }
        }

        if !self.telegram.is_configured() {
            report.warnings.push("TELEGRAM_BOT_TOKEN / TELEGRAM_CHAT_ID not set; weekly reports are disabled".to_string());
        }
        if self.security.cron_secret.is_none() {
            report.warnings.push("CRON_SECRET not set; the weekly report endpoint rejects every call".to_string());
        }
        if self.cache.redis_url.is_some() && !self.is_production() {
            report.warnings.push("REDIS_URL is ignored outside production; using in-memory cache".to_string());
        }

        report
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn looks_like_placeholder(value: &str) -> bool {
    value.contains("CHANGE_THIS") || value.contains("your-")
}

// Global singleton config - initialized once at startup
pub static CONFIG: Lazy<AppConfig> = Lazy::new(AppConfig::from_env);

// Convenience function for accessing config
pub fn config() -> &'static AppConfig {
    &CONFIG
}
