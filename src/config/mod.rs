use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::env;
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub security: SecurityConfig,
    pub quota: QuotaConfig,
    pub bulk: BulkConfig,
    pub generation: GenerationConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// When unset the server falls back to in-memory stores (development only)
    pub url: Option<String>,
    pub max_connections: u32,
    pub connection_timeout: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    pub jwt_secret: String,
    pub cors_origins: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuotaConfig {
    pub free_monthly_limit: u32,
    /// Internal ceiling for the "unlimited" paid tiers
    pub paid_monthly_soft_cap: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BulkConfig {
    pub max_rows_per_job: usize,
    pub max_upload_bytes: usize,
    pub generation_timeout_secs: u64,
    pub job_retention_secs: u64,
    pub stale_job_secs: u64,
    pub reaper_interval_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationConfig {
    pub api_url: String,
    pub api_key: Option<String>,
    pub model: String,
    pub max_tokens: u32,
    pub temperature: f32,
}

impl BulkConfig {
    pub fn generation_timeout(&self) -> Duration {
        Duration::from_secs(self.generation_timeout_secs)
    }

    pub fn job_retention(&self) -> Duration {
        Duration::from_secs(self.job_retention_secs)
    }

    pub fn stale_job_after(&self) -> Duration {
        Duration::from_secs(self.stale_job_secs)
    }

    pub fn reaper_interval(&self) -> Duration {
        Duration::from_secs(self.reaper_interval_secs)
    }
}

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
        // Server overrides
        if let Some(port) = env::var("LISTING_API_PORT")
            .ok()
            .or_else(|| env::var("PORT").ok())
            .and_then(|v| v.parse().ok())
        {
            self.server.port = port;
        }

        // Database overrides
        if let Ok(v) = env::var("DATABASE_URL") {
            if !v.trim().is_empty() {
                self.database.url = Some(v);
            }
        }
        if let Ok(v) = env::var("DATABASE_MAX_CONNECTIONS") {
            self.database.max_connections = v.parse().unwrap_or(self.database.max_connections);
        }
        if let Ok(v) = env::var("DATABASE_CONNECTION_TIMEOUT") {
            self.database.connection_timeout = v.parse().unwrap_or(self.database.connection_timeout);
        }

        // Security overrides
        if let Ok(v) = env::var("JWT_SECRET") {
            self.security.jwt_secret = v;
        }
        if let Ok(v) = env::var("SECURITY_CORS_ORIGINS") {
            self.security.cors_origins = v.split(',').map(|s| s.trim().to_string()).collect();
        }

        // Quota overrides
        if let Ok(v) = env::var("QUOTA_FREE_MONTHLY_LIMIT") {
            self.quota.free_monthly_limit = v.parse().unwrap_or(self.quota.free_monthly_limit);
        }
        if let Ok(v) = env::var("QUOTA_PAID_MONTHLY_SOFT_CAP") {
            self.quota.paid_monthly_soft_cap = v.parse().unwrap_or(self.quota.paid_monthly_soft_cap);
        }

        // Bulk overrides
        if let Ok(v) = env::var("BULK_MAX_ROWS_PER_JOB") {
            self.bulk.max_rows_per_job = v.parse().unwrap_or(self.bulk.max_rows_per_job);
        }
        if let Ok(v) = env::var("BULK_MAX_UPLOAD_BYTES") {
            self.bulk.max_upload_bytes = v.parse().unwrap_or(self.bulk.max_upload_bytes);
        }
        if let Ok(v) = env::var("BULK_GENERATION_TIMEOUT_SECS") {
            self.bulk.generation_timeout_secs = v.parse().unwrap_or(self.bulk.generation_timeout_secs);
        }
        if let Ok(v) = env::var("BULK_JOB_RETENTION_SECS") {
            self.bulk.job_retention_secs = v.parse().unwrap_or(self.bulk.job_retention_secs);
        }
        if let Ok(v) = env::var("BULK_STALE_JOB_SECS") {
            self.bulk.stale_job_secs = v.parse().unwrap_or(self.bulk.stale_job_secs);
        }
        if let Ok(v) = env::var("BULK_REAPER_INTERVAL_SECS") {
            self.bulk.reaper_interval_secs = v.parse().unwrap_or(self.bulk.reaper_interval_secs);
        }

        // Generation overrides
        if let Ok(v) = env::var("GENERATION_API_URL") {
            self.generation.api_url = v;
        }
        if let Ok(v) = env::var("GENERATION_API_KEY") {
            if !v.trim().is_empty() {
                self.generation.api_key = Some(v);
            }
        }
        if let Ok(v) = env::var("GENERATION_MODEL") {
            self.generation.model = v;
        }
        if let Ok(v) = env::var("GENERATION_MAX_TOKENS") {
            self.generation.max_tokens = v.parse().unwrap_or(self.generation.max_tokens);
        }
        if let Ok(v) = env::var("GENERATION_TEMPERATURE") {
            self.generation.temperature = v.parse().unwrap_or(self.generation.temperature);
        }

        self
    }

    fn base(environment: Environment) -> Self {
        Self {
            environment,
            server: ServerConfig { port: 3000 },
            database: DatabaseConfig {
                url: None,
                max_connections: 10,
                connection_timeout: 30,
            },
            security: SecurityConfig {
                jwt_secret: String::new(),
                cors_origins: Vec::new(),
            },
            quota: QuotaConfig {
                free_monthly_limit: 10,
                paid_monthly_soft_cap: 1000,
            },
            bulk: BulkConfig {
                max_rows_per_job: 100,
                max_upload_bytes: 5 * 1024 * 1024, // 5MB
                generation_timeout_secs: 30,
                job_retention_secs: 60 * 60,
                stale_job_secs: 6 * 60 * 60,
                reaper_interval_secs: 60,
            },
            generation: GenerationConfig {
                api_url: "https://api.openai.com/v1/chat/completions".to_string(),
                api_key: None,
                model: "gpt-4o-mini".to_string(),
                max_tokens: 2000,
                temperature: 0.7,
            },
        }
    }

    pub fn development() -> Self {
        let mut config = Self::base(Environment::Development);
        config.security.jwt_secret = "development-secret-change-me".to_string();
        config.security.cors_origins = vec![
            "http://localhost:3000".to_string(),
            "http://localhost:5173".to_string(),
        ];
        config
    }

    pub fn staging() -> Self {
        let mut config = Self::base(Environment::Staging);
        config.database.max_connections = 20;
        config.database.connection_timeout = 10;
        config.security.cors_origins = vec!["https://staging.example.com".to_string()];
        config
    }

    pub fn production() -> Self {
        let mut config = Self::base(Environment::Production);
        config.database.max_connections = 50;
        config.database.connection_timeout = 5;
        config.security.cors_origins = vec!["https://app.example.com".to_string()];
        config.bulk.reaper_interval_secs = 30;
        config
    }
}

// Global singleton config - initialized once at startup
pub static CONFIG: Lazy<AppConfig> = Lazy::new(AppConfig::from_env);

// Convenience function for accessing config
pub fn config() -> &'static AppConfig {
    &CONFIG
}

#[macro_export]
macro_rules! is_development {
    () => {
        matches!($crate::config::CONFIG.environment, $crate::config::Environment::Development)
    };
}
