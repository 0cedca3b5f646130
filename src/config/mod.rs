use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::env;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub api: ApiConfig,
    pub security: SecurityConfig,
    pub notify: NotifyConfig,
    pub storage: StorageConfig,
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
    pub max_connections: u32,
    pub acquire_timeout_secs: u64,
    /// Run pending migrations on startup.
    pub auto_migrate: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    pub enable_rate_limiting: bool,
    pub rate_limit_requests: u32,
    pub rate_limit_window_secs: u64,
    pub default_page_size: i64,
    pub max_page_size: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    pub jwt_secret: String,
    pub jwt_expiry_hours: u64,
    /// How long after expiry a token may still be exchanged via /api/auth/refresh.
    pub refresh_window_hours: u64,
    pub enable_cors: bool,
    pub cors_origins: Vec<String>,
    pub enable_audit_logging: bool,
    /// Accept the built-in development user list at login. Never honored
    /// outside the development preset.
    pub enable_dev_login: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotifyConfig {
    pub smtp_host: Option<String>,
    pub smtp_port: u16,
    pub smtp_username: Option<String>,
    pub smtp_password: Option<String>,
    pub smtp_from: Option<String>,
    pub sms_gateway_url: Option<String>,
    pub sms_api_key: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    pub endpoint: Option<String>,
    pub bucket: Option<String>,
    pub api_key: Option<String>,
    pub max_upload_bytes: usize,
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
        if let Ok(v) = env::var("PORT") {
            self.server.port = v.parse().unwrap_or(self.server.port);
        }

        // Database overrides
        if let Ok(v) = env::var("DATABASE_MAX_CONNECTIONS") {
            self.database.max_connections = v.parse().unwrap_or(self.database.max_connections);
        }
        if let Ok(v) = env::var("DATABASE_ACQUIRE_TIMEOUT_SECS") {
            self.database.acquire_timeout_secs = v.parse().unwrap_or(self.database.acquire_timeout_secs);
        }
        if let Ok(v) = env::var("DATABASE_AUTO_MIGRATE") {
            self.database.auto_migrate = v.parse().unwrap_or(self.database.auto_migrate);
        }

        // API overrides
        if let Ok(v) = env::var("API_ENABLE_RATE_LIMITING") {
            self.api.enable_rate_limiting = v.parse().unwrap_or(self.api.enable_rate_limiting);
        }
        if let Ok(v) = env::var("API_RATE_LIMIT_REQUESTS") {
            self.api.rate_limit_requests = v.parse().unwrap_or(self.api.rate_limit_requests);
        }
        if let Ok(v) = env::var("API_RATE_LIMIT_WINDOW_SECS") {
            self.api.rate_limit_window_secs = v.parse().unwrap_or(self.api.rate_limit_window_secs);
        }
        if let Ok(v) = env::var("API_DEFAULT_PAGE_SIZE") {
            self.api.default_page_size = v.parse().unwrap_or(self.api.default_page_size);
        }
        if let Ok(v) = env::var("API_MAX_PAGE_SIZE") {
            self.api.max_page_size = v.parse().unwrap_or(self.api.max_page_size);
        }

        // Security overrides
        if let Ok(v) = env::var("JWT_SECRET") {
            if !v.is_empty() {
                self.security.jwt_secret = v;
            }
        }
        if let Ok(v) = env::var("SECURITY_JWT_EXPIRY_HOURS") {
            self.security.jwt_expiry_hours = v.parse().unwrap_or(self.security.jwt_expiry_hours);
        }
        if let Ok(v) = env::var("SECURITY_REFRESH_WINDOW_HOURS") {
            self.security.refresh_window_hours = v.parse().unwrap_or(self.security.refresh_window_hours);
        }
        if let Ok(v) = env::var("SECURITY_ENABLE_CORS") {
            self.security.enable_cors = v.parse().unwrap_or(self.security.enable_cors);
        }
        if let Ok(v) = env::var("SECURITY_CORS_ORIGINS") {
            self.security.cors_origins = v.split(',').map(|s| s.trim().to_string()).collect();
        }
        if let Ok(v) = env::var("SECURITY_ENABLE_AUDIT_LOGGING") {
            self.security.enable_audit_logging = v.parse().unwrap_or(self.security.enable_audit_logging);
        }
        if let Ok(v) = env::var("SECURITY_ENABLE_DEV_LOGIN") {
            if matches!(self.environment, Environment::Development) {
                self.security.enable_dev_login = v.parse().unwrap_or(self.security.enable_dev_login);
            }
        }

        // Notification overrides
        if let Ok(v) = env::var("SMTP_HOST") {
            self.notify.smtp_host = Some(v);
        }
        if let Ok(v) = env::var("SMTP_PORT") {
            self.notify.smtp_port = v.parse().unwrap_or(self.notify.smtp_port);
        }
        if let Ok(v) = env::var("SMTP_USERNAME") {
            self.notify.smtp_username = Some(v);
        }
        if let Ok(v) = env::var("SMTP_PASSWORD") {
            self.notify.smtp_password = Some(v);
        }
        if let Ok(v) = env::var("SMTP_FROM") {
            self.notify.smtp_from = Some(v);
        }
        if let Ok(v) = env::var("SMS_GATEWAY_URL") {
            self.notify.sms_gateway_url = Some(v);
        }
        if let Ok(v) = env::var("SMS_API_KEY") {
            self.notify.sms_api_key = Some(v);
        }

        // Storage overrides
        if let Ok(v) = env::var("STORAGE_ENDPOINT") {
            self.storage.endpoint = Some(v);
        }
        if let Ok(v) = env::var("STORAGE_BUCKET") {
            self.storage.bucket = Some(v);
        }
        if let Ok(v) = env::var("STORAGE_API_KEY") {
            self.storage.api_key = Some(v);
        }
        if let Ok(v) = env::var("STORAGE_MAX_UPLOAD_BYTES") {
            self.storage.max_upload_bytes = v.parse().unwrap_or(self.storage.max_upload_bytes);
        }

        self
    }

    fn development() -> Self {
        Self {
            environment: Environment::Development,
            server: ServerConfig { port: 3000 },
            database: DatabaseConfig {
                max_connections: 10,
                acquire_timeout_secs: 30,
                auto_migrate: true,
            },
            api: ApiConfig {
                enable_rate_limiting: false,
                rate_limit_requests: 1000,
                rate_limit_window_secs: 60,
                default_page_size: 25,
                max_page_size: 1000,
            },
            security: SecurityConfig {
                jwt_secret: "churchflow-dev-secret".to_string(),
                jwt_expiry_hours: 24 * 7, // 1 week
                refresh_window_hours: 24 * 7,
                enable_cors: true,
                cors_origins: vec![
                    "http://localhost:3000".to_string(),
                    "http://localhost:5173".to_string(),
                ],
                enable_audit_logging: true,
                enable_dev_login: true,
            },
            notify: NotifyConfig {
                smtp_host: None,
                smtp_port: 587,
                smtp_username: None,
                smtp_password: None,
                smtp_from: None,
                sms_gateway_url: None,
                sms_api_key: None,
            },
            storage: StorageConfig {
                endpoint: None,
                bucket: None,
                api_key: None,
                max_upload_bytes: 10 * 1024 * 1024, // 10MB
            },
        }
    }

    fn staging() -> Self {
        Self {
            environment: Environment::Staging,
            server: ServerConfig { port: 3000 },
            database: DatabaseConfig {
                max_connections: 20,
                acquire_timeout_secs: 10,
                auto_migrate: true,
            },
            api: ApiConfig {
                enable_rate_limiting: true,
                rate_limit_requests: 300,
                rate_limit_window_secs: 15 * 60,
                default_page_size: 25,
                max_page_size: 500,
            },
            security: SecurityConfig {
                jwt_secret: String::new(), // must come from JWT_SECRET
                jwt_expiry_hours: 24,
                refresh_window_hours: 72,
                enable_cors: true,
                cors_origins: vec!["https://staging.churchflow.app".to_string()],
                enable_audit_logging: true,
                enable_dev_login: false,
            },
            notify: NotifyConfig {
                smtp_host: None,
                smtp_port: 587,
                smtp_username: None,
                smtp_password: None,
                smtp_from: None,
                sms_gateway_url: None,
                sms_api_key: None,
            },
            storage: StorageConfig {
                endpoint: None,
                bucket: None,
                api_key: None,
                max_upload_bytes: 5 * 1024 * 1024, // 5MB
            },
        }
    }

    fn production() -> Self {
        Self {
            environment: Environment::Production,
            server: ServerConfig { port: 3000 },
            database: DatabaseConfig {
                max_connections: 50,
                acquire_timeout_secs: 5,
                auto_migrate: false,
            },
            api: ApiConfig {
                enable_rate_limiting: true,
                rate_limit_requests: 100,
                rate_limit_window_secs: 15 * 60,
                default_page_size: 25,
                max_page_size: 100,
            },
            security: SecurityConfig {
                jwt_secret: String::new(), // must come from JWT_SECRET
                jwt_expiry_hours: 4,
                refresh_window_hours: 24,
                enable_cors: true,
                cors_origins: vec!["https://app.churchflow.app".to_string()],
                enable_audit_logging: true,
                enable_dev_login: false,
            },
            notify: NotifyConfig {
                smtp_host: None,
                smtp_port: 587,
                smtp_username: None,
                smtp_password: None,
                smtp_from: None,
                sms_gateway_url: None,
                sms_api_key: None,
            },
            storage: StorageConfig {
                endpoint: None,
                bucket: None,
                api_key: None,
                max_upload_bytes: 2 * 1024 * 1024, // 2MB
            },
        }
    }
}

// Global singleton config - initialized once at startup
pub static CONFIG: Lazy<AppConfig> = Lazy::new(AppConfig::from_env);

// Convenience function for accessing config
pub fn config() -> &'static AppConfig {
    &CONFIG
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn development_defaults() {
        let config = AppConfig::development();
        assert!(!config.api.enable_rate_limiting);
        assert!(config.security.enable_dev_login);
        assert!(!config.security.jwt_secret.is_empty());
        assert!(config.database.auto_migrate);
    }

    #[test]
    fn production_defaults() {
        let config = AppConfig::production();
        assert!(config.api.enable_rate_limiting);
        assert_eq!(config.api.rate_limit_window_secs, 15 * 60);
        assert!(!config.security.enable_dev_login);
        assert!(config.security.jwt_secret.is_empty());
        assert!(!config.database.auto_migrate);
    }

    #[test]
    fn staging_pages_are_capped_tighter_than_dev() {
        let dev = AppConfig::development();
        let staging = AppConfig::staging();
        assert!(staging.api.max_page_size < dev.api.max_page_size);
    }
}
