use std::env;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct Config {
    pub app: AppConfig,
    pub database: DatabaseConfig,
    pub trigger: TriggerConfig,
    pub match_worker: MatchWorkerConfig,
    pub push: PushConfig,
    pub swagger: SwaggerConfig,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub cors_allowed_origins: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    pub acquire_timeout_secs: u64,
    pub idle_timeout_secs: u64,
    pub max_lifetime_secs: u64,
}

/// Shared secret expected on trigger webhook calls
#[derive(Debug, Clone, Default)]
pub struct TriggerConfig {
    pub secret: Option<String>,
}

/// Background match job worker settings
#[derive(Debug, Clone)]
pub struct MatchWorkerConfig {
    pub enabled: bool,
    pub interval: Duration,
    pub batch_size: i64,
    pub max_retries: i32,
    /// A job left in `processing` longer than this is picked up again
    pub processing_timeout: Duration,
}

/// Push gateway configuration
#[derive(Debug, Clone)]
pub struct PushConfig {
    /// Gateway send endpoint
    pub gateway_url: String,
    /// Server key; when absent notifications are only logged
    pub server_key: Option<String>,
    pub request_timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct SwaggerConfig {
    pub username: Option<String>,
    pub password: Option<String>,
    pub title: String,
    pub version: String,
    pub description: String,
}

impl Config {
    pub fn from_env() -> Result<Self, String> {
        // Load .env file if exists, ignore if not found (optional for production)
        if let Err(e) = dotenvy::dotenv() {
            if !e.to_string().contains("not found") {
                eprintln!("Warning: Error loading .env file: {}", e);
            }
        }

        Ok(Config {
            app: AppConfig::from_env()?,
            database: DatabaseConfig::from_env()?,
            trigger: TriggerConfig::from_env(),
            match_worker: MatchWorkerConfig::from_env()?,
            push: PushConfig::from_env()?,
            swagger: SwaggerConfig::from_env()?,
        })
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self, String> {
        let host = env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse::<u16>()
            .map_err(|e| format!("Invalid PORT: {}", e))?;

        // Parse CORS allowed origins from comma-separated string
        let cors_allowed_origins = env::var("CORS_ALLOWED_ORIGINS")
            .unwrap_or_else(|_| "*".to_string())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        Ok(Self {
            host,
            port,
            cors_allowed_origins,
        })
    }

    pub fn server_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl DatabaseConfig {
    const DEFAULT_MAX_CONNECTIONS: u32 = 10;
    const DEFAULT_MIN_CONNECTIONS: u32 = 1;
    const DEFAULT_ACQUIRE_TIMEOUT_SECS: u64 = 5;
    const DEFAULT_IDLE_TIMEOUT_SECS: u64 = 600; // 10 minutes
    const DEFAULT_MAX_LIFETIME_SECS: u64 = 1800; // 30 minutes

    pub fn from_env() -> Result<Self, String> {
        let url = env::var("DATABASE_URL").map_err(|_| "DATABASE_URL must be set".to_string())?;

        let max_connections = env::var("DB_MAX_CONNECTIONS")
            .unwrap_or_else(|_| Self::DEFAULT_MAX_CONNECTIONS.to_string())
            .parse::<u32>()
            .map_err(|_| "DB_MAX_CONNECTIONS must be a valid number".to_string())?;

        let min_connections = env::var("DB_MIN_CONNECTIONS")
            .unwrap_or_else(|_| Self::DEFAULT_MIN_CONNECTIONS.to_string())
            .parse::<u32>()
            .map_err(|_| "DB_MIN_CONNECTIONS must be a valid number".to_string())?;

        let acquire_timeout_secs = env::var("DB_ACQUIRE_TIMEOUT_SECS")
            .unwrap_or_else(|_| Self::DEFAULT_ACQUIRE_TIMEOUT_SECS.to_string())
            .parse::<u64>()
            .map_err(|_| "DB_ACQUIRE_TIMEOUT_SECS must be a valid number".to_string())?;

        let idle_timeout_secs = env::var("DB_IDLE_TIMEOUT_SECS")
            .unwrap_or_else(|_| Self::DEFAULT_IDLE_TIMEOUT_SECS.to_string())
            .parse::<u64>()
            .map_err(|_| "DB_IDLE_TIMEOUT_SECS must be a valid number".to_string())?;

        let max_lifetime_secs = env::var("DB_MAX_LIFETIME_SECS")
            .unwrap_or_else(|_| Self::DEFAULT_MAX_LIFETIME_SECS.to_string())
            .parse::<u64>()
            .map_err(|_| "DB_MAX_LIFETIME_SECS must be a valid number".to_string())?;

        Ok(Self {
            url,
            max_connections,
            min_connections,
            acquire_timeout_secs,
            idle_timeout_secs,
            max_lifetime_secs,
        })
    }
}

impl TriggerConfig {
    pub fn from_env() -> Self {
        Self {
            secret: env::var("TRIGGER_SECRET").ok().filter(|s| !s.is_empty()),
        }
    }
}

impl MatchWorkerConfig {
    const DEFAULT_INTERVAL_SECS: u64 = 10;
    const DEFAULT_BATCH_SIZE: i64 = 20;
    const DEFAULT_MAX_RETRIES: i32 = 3;
    const DEFAULT_PROCESSING_TIMEOUT_SECS: u64 = 300;

    pub fn from_env() -> Result<Self, String> {
        let enabled = env::var("MATCH_WORKER_ENABLED")
            .map(|v| !matches!(v.trim().to_lowercase().as_str(), "false" | "0" | "no"))
            .unwrap_or(true);

        let interval_secs = env::var("MATCH_WORKER_INTERVAL_SECS")
            .unwrap_or_else(|_| Self::DEFAULT_INTERVAL_SECS.to_string())
            .parse::<u64>()
            .map_err(|_| "MATCH_WORKER_INTERVAL_SECS must be a valid number".to_string())?;

        let batch_size = env::var("MATCH_WORKER_BATCH_SIZE")
            .unwrap_or_else(|_| Self::DEFAULT_BATCH_SIZE.to_string())
            .parse::<i64>()
            .map_err(|_| "MATCH_WORKER_BATCH_SIZE must be a valid number".to_string())?;

        let max_retries = env::var("MATCH_WORKER_MAX_RETRIES")
            .unwrap_or_else(|_| Self::DEFAULT_MAX_RETRIES.to_string())
            .parse::<i32>()
            .map_err(|_| "MATCH_WORKER_MAX_RETRIES must be a valid number".to_string())?;

        let processing_timeout_secs = env::var("MATCH_WORKER_PROCESSING_TIMEOUT_SECS")
            .unwrap_or_else(|_| Self::DEFAULT_PROCESSING_TIMEOUT_SECS.to_string())
            .parse::<u64>()
            .map_err(|_| {
                "MATCH_WORKER_PROCESSING_TIMEOUT_SECS must be a valid number".to_string()
            })?;

        Ok(Self {
            enabled,
            interval: Duration::from_secs(interval_secs.max(1)),
            batch_size: batch_size.max(1),
            max_retries: max_retries.max(1),
            processing_timeout: Duration::from_secs(processing_timeout_secs.max(1)),
        })
    }
}

impl PushConfig {
    const DEFAULT_GATEWAY_URL: &'static str = "https://fcm.googleapis.com/fcm/send";
    const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;

    pub fn from_env() -> Result<Self, String> {
        let gateway_url =
            env::var("PUSH_GATEWAY_URL").unwrap_or_else(|_| Self::DEFAULT_GATEWAY_URL.to_string());

        let server_key = env::var("PUSH_SERVER_KEY").ok().filter(|s| !s.is_empty());

        let request_timeout_secs = env::var("PUSH_REQUEST_TIMEOUT_SECS")
            .unwrap_or_else(|_| Self::DEFAULT_REQUEST_TIMEOUT_SECS.to_string())
            .parse::<u64>()
            .map_err(|_| "PUSH_REQUEST_TIMEOUT_SECS must be a valid number".to_string())?;

        Ok(Self {
            gateway_url,
            server_key,
            request_timeout: Duration::from_secs(request_timeout_secs),
        })
    }
}

impl SwaggerConfig {
    pub fn from_env() -> Result<Self, String> {
        // Only use credentials if they are non-empty
        let username = env::var("SWAGGER_USERNAME").ok().filter(|s| !s.is_empty());
        let password = env::var("SWAGGER_PASSWORD").ok().filter(|s| !s.is_empty());
        let title = env::var("SWAGGER_TITLE").unwrap_or_else(|_| "Lost & Found Core API".to_string());
        let version = env::var("SWAGGER_VERSION").unwrap_or_else(|_| "0.1.0".to_string());
        let description = env::var("SWAGGER_DESCRIPTION")
            .unwrap_or_else(|_| "Match detection service for lost and found reports".to_string());

        Ok(Self {
            username,
            password,
            title,
            version,
            description,
        })
    }

    /// Returns credentials in "username:password" format if auth is enabled
    pub fn credentials(&self) -> Option<String> {
        match (&self.username, &self.password) {
            (Some(user), Some(pass)) => Some(format!("{}:{}", user, pass)),
            _ => None,
        }
    }
}
