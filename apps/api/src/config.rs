use anyhow::{Context, Result};

/// Application configuration loaded from environment variables.
/// Startup fails if required variables are missing or malformed.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    /// `None` selects the in-process cache backend.
    pub redis_url: Option<String>,
    pub jwt_secret: String,
    pub rawg_api_key: String,
    pub rawg_base_url: String,
    pub frontend_url: String,
    pub app_env: String,
    pub port: u16,
    pub rust_log: String,
    pub rate_limit_max: u64,
    pub rate_limit_window_secs: u64,
    pub job_workers: usize,
    pub token_ttl_hours: i64,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            database_url: require_env("DATABASE_URL")?,
            redis_url: std::env::var("REDIS_URL").ok().filter(|v| !v.is_empty()),
            jwt_secret: require_env("JWT_SECRET")?,
            rawg_api_key: require_env("RAWG_API_KEY")?,
            rawg_base_url: std::env::var("RAWG_BASE_URL")
                .unwrap_or_else(|_| "https://api.rawg.io/api".to_string()),
            frontend_url: std::env::var("FRONTEND_URL")
                .unwrap_or_else(|_| "http://localhost:3000".to_string()),
            app_env: std::env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
            port: parse_env("PORT", 3001)?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            rate_limit_max: parse_env("RATE_LIMIT_MAX", 100)?,
            rate_limit_window_secs: parse_env("RATE_LIMIT_WINDOW_SECS", 15 * 60)?,
            job_workers: parse_env("JOB_WORKERS", 2)?,
            token_ttl_hours: parse_env("TOKEN_TTL_HOURS", 24 * 7)?,
        })
    }

    pub fn is_development(&self) -> bool {
        self.app_env == "development"
    }

    #[cfg(test)]
    pub fn test_default() -> Self {
        Config {
            database_url: "postgres://localhost/gamevault_test".to_string(),
            redis_url: None,
            jwt_secret: "test-secret-do-not-use".to_string(),
            rawg_api_key: "test-key".to_string(),
            rawg_base_url: "http://127.0.0.1:9".to_string(),
            frontend_url: "http://localhost:3000".to_string(),
            app_env: "test".to_string(),
            port: 0,
            rust_log: "debug".to_string(),
            rate_limit_max: 100,
            rate_limit_window_secs: 900,
            job_workers: 1,
            token_ttl_hours: 1,
        }
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

fn parse_env<T>(key: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .parse::<T>()
            .with_context(|| format!("Environment variable '{key}' has an invalid value: {raw}")),
        Err(_) => Ok(default),
    }
}
