use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub server: ServerConfig,
    pub filter: FilterConfig,
    pub database: DatabaseConfig,
    pub session: SessionConfig,
    pub uploads: UploadConfig,
    pub geocoder: GeocoderConfig,
    pub mail: MailConfig,
    pub security: SecurityConfig,
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
    /// Base URL used when building links sent out of band (password reset mails)
    pub public_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilterConfig {
    pub default_limit: u32,
    pub max_limit: u32,
    pub debug_logging: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: Option<String>,
    pub max_connections: u32,
    pub connection_timeout: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    #[serde(skip_serializing)]
    pub jwt_secret: String,
    pub jwt_expiry_days: i64,
    pub reset_token_expiry_minutes: i64,
    pub bcrypt_cost: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadConfig {
    pub directory: PathBuf,
    pub max_bytes: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeocoderConfig {
    pub base_url: String,
    #[serde(skip_serializing)]
    pub api_key: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MailConfig {
    pub from_name: String,
    pub from_email: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    pub enable_cors: bool,
    pub cors_origins: Vec<String>,
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
        if let Ok(v) = env::var("PUBLIC_URL") {
            self.server.public_url = v.trim_end_matches('/').to_string();
        }

        // Filter overrides
        if let Ok(v) = env::var("FILTER_DEFAULT_LIMIT") {
            self.filter.default_limit = v.parse().unwrap_or(self.filter.default_limit);
        }
        if let Ok(v) = env::var("FILTER_MAX_LIMIT") {
            self.filter.max_limit = v.parse().unwrap_or(self.filter.max_limit);
        }
        if let Ok(v) = env::var("FILTER_DEBUG_LOGGING") {
            self.filter.debug_logging = v.parse().unwrap_or(self.filter.debug_logging);
        }

        // Database overrides
        if let Ok(v) = env::var("DATABASE_URL") {
            self.database.url = Some(v);
        }
        if let Ok(v) = env::var("DATABASE_MAX_CONNECTIONS") {
            self.database.max_connections = v.parse().unwrap_or(self.database.max_connections);
        }
        if let Ok(v) = env::var("DATABASE_CONNECTION_TIMEOUT") {
            self.database.connection_timeout = v.parse().unwrap_or(self.database.connection_timeout);
        }

        // Session overrides
        if let Ok(v) = env::var("JWT_SECRET") {
            self.session.jwt_secret = v;
        }
        if let Ok(v) = env::var("JWT_EXPIRE_DAYS") {
            self.session.jwt_expiry_days = v.parse().unwrap_or(self.session.jwt_expiry_days);
        }
        if let Ok(v) = env::var("RESET_TOKEN_EXPIRE_MINUTES") {
            self.session.reset_token_expiry_minutes =
                v.parse().unwrap_or(self.session.reset_token_expiry_minutes);
        }
        if let Ok(v) = env::var("BCRYPT_COST") {
            self.session.bcrypt_cost = v.parse().unwrap_or(self.session.bcrypt_cost);
        }

        // Upload overrides
        if let Ok(v) = env::var("FILE_UPLOAD_PATH") {
            self.uploads.directory = PathBuf::from(v);
        }
        if let Ok(v) = env::var("MAX_FILE_UPLOAD") {
            self.uploads.max_bytes = v.parse().unwrap_or(self.uploads.max_bytes);
        }

        // Geocoder overrides
        if let Ok(v) = env::var("GEOCODER_API_KEY") {
            self.geocoder.api_key = v;
        }
        if let Ok(v) = env::var("GEOCODER_BASE_URL") {
            self.geocoder.base_url = v.trim_end_matches('/').to_string();
        }

        // Mail overrides
        if let Ok(v) = env::var("MAIL_FROM_NAME") {
            self.mail.from_name = v;
        }
        if let Ok(v) = env::var("MAIL_FROM") {
            self.mail.from_email = v;
        }

        // Security overrides
        if let Ok(v) = env::var("SECURITY_ENABLE_CORS") {
            self.security.enable_cors = v.parse().unwrap_or(self.security.enable_cors);
        }
        if let Ok(v) = env::var("SECURITY_CORS_ORIGINS") {
            self.security.cors_origins = v.split(',').map(|s| s.trim().to_string()).collect();
        }

        self
    }

    pub fn development() -> Self {
        Self {
            environment: Environment::Development,
            server: ServerConfig {
                port: 5000,
                public_url: "http://localhost:5000".to_string(),
            },
            filter: FilterConfig {
                default_limit: 25,
                max_limit: 1000,
                debug_logging: true,
            },
            database: DatabaseConfig {
                url: None,
                max_connections: 10,
                connection_timeout: 30,
            },
            session: SessionConfig {
                jwt_secret: "development-secret-change-me".to_string(),
                jwt_expiry_days: 30,
                reset_token_expiry_minutes: 10,
                bcrypt_cost: 10,
            },
            uploads: UploadConfig {
                directory: PathBuf::from("./public/uploads"),
                max_bytes: 1_000_000,
            },
            geocoder: GeocoderConfig {
                base_url: "https://www.mapquestapi.com".to_string(),
                api_key: String::new(),
            },
            mail: MailConfig {
                from_name: "DevCamper".to_string(),
                from_email: "noreply@devcamper.io".to_string(),
            },
            security: SecurityConfig {
                enable_cors: true,
                cors_origins: vec!["http://localhost:3000".to_string(), "http://localhost:5173".to_string()],
            },
        }
    }

    fn staging() -> Self {
        let mut config = Self::development();
        config.environment = Environment::Staging;
        config.filter = FilterConfig {
            default_limit: 25,
            max_limit: 500,
            debug_logging: false,
        };
        config.database.max_connections = 20;
        config.database.connection_timeout = 10;
        config.session.jwt_expiry_days = 7;
        config.session.bcrypt_cost = 12;
        config.security.cors_origins = vec!["https://staging.devcamper.io".to_string()];
        config
    }

    fn production() -> Self {
        let mut config = Self::development();
        config.environment = Environment::Production;
        config.server.public_url = "https://devcamper.io".to_string();
        config.filter = FilterConfig {
            default_limit: 25,
            max_limit: 100,
            debug_logging: false,
        };
        config.database.max_connections = 50;
        config.database.connection_timeout = 5;
        // No usable default secret outside development; JWT_SECRET must be provided.
        config.session.jwt_secret = String::new();
        config.session.jwt_expiry_days = 1;
        config.session.bcrypt_cost = 12;
        config.security.cors_origins = vec!["https://devcamper.io".to_string()];
        config
    }
}

// Global singleton config - read once by the binaries at startup and then
// handed to the library explicitly through AppState.
pub static CONFIG: Lazy<AppConfig> = Lazy::new(AppConfig::from_env);

// Convenience function for accessing config
pub fn config() -> &'static AppConfig {
    &CONFIG
}
