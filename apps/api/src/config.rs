use anyhow::{Context, Result};

/// A `(window, quota)` pair for one rate-limited endpoint class.
#[derive(Debug, Clone, Copy)]
pub struct LimitSettings {
    pub window_secs: u64,
    pub max_requests: u32,
}

impl LimitSettings {
    pub const fn new(window_secs: u64, max_requests: u32) -> Self {
        Self {
            window_secs,
            max_requests,
        }
    }

    /// Reads `RATE_LIMIT_{prefix}_MAX` / `RATE_LIMIT_{prefix}_WINDOW_SECS`,
    /// falling back to the given defaults.
    fn from_env(prefix: &str, default: Self) -> Self {
        Self {
            window_secs: env_parse(
                &format!("RATE_LIMIT_{prefix}_WINDOW_SECS"),
                default.window_secs,
            ),
            max_requests: env_parse(&format!("RATE_LIMIT_{prefix}_MAX"), default.max_requests),
        }
    }
}

/// Per-endpoint-class limiter settings. Each class is independent state,
/// not a shared global counter.
#[derive(Debug, Clone, Copy)]
pub struct LimitConfig {
    pub general: LimitSettings,
    pub auth: LimitSettings,
    pub ai: LimitSettings,
    pub resume: LimitSettings,
    pub job_search: LimitSettings,
    pub contact: LimitSettings,
}

impl LimitConfig {
    fn from_env() -> Self {
        Self {
            general: LimitSettings::from_env("GENERAL", LimitSettings::new(60, 60)),
            auth: LimitSettings::from_env("AUTH", LimitSettings::new(900, 5)),
            ai: LimitSettings::from_env("AI", LimitSettings::new(60, 10)),
            resume: LimitSettings::from_env("RESUME", LimitSettings::new(60, 3)),
            job_search: LimitSettings::from_env("JOB_SEARCH", LimitSettings::new(60, 10)),
            contact: LimitSettings::from_env("CONTACT", LimitSettings::new(60, 3)),
        }
    }
}

/// Application configuration loaded from environment variables.
///
/// Only `DATABASE_URL` is hard-required. Every integration credential is
/// optional: an absent key disables its feature at call time with a
/// structured configuration error instead of crashing at startup.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub redis_url: Option<String>,
    pub anthropic_api_key: Option<String>,
    pub openai_api_key: Option<String>,
    pub adzuna_app_id: Option<String>,
    pub adzuna_app_key: Option<String>,
    pub admin_token: Option<String>,
    pub limits: LimitConfig,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            database_url: require_env("DATABASE_URL")?,
            redis_url: optional_env("REDIS_URL"),
            anthropic_api_key: optional_env("ANTHROPIC_API_KEY"),
            openai_api_key: optional_env("OPENAI_API_KEY"),
            adzuna_app_id: optional_env("ADZUNA_APP_ID"),
            adzuna_app_key: optional_env("ADZUNA_APP_KEY"),
            admin_token: optional_env("ADMIN_TOKEN"),
            limits: LimitConfig::from_env(),
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        })
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

/// Returns `None` for unset or empty variables so a blank `.env` line does
/// not count as a configured credential.
fn optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn env_parse<T>(key: &str, default: T) -> T
where
    T: std::str::FromStr + Copy,
{
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse::<T>().ok())
        .unwrap_or(default)
}
