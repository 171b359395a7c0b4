use std::time::Duration;

#[derive(Debug, Clone)]
pub struct Config {
    /// Port the relay listens on
    pub port: u16,
    /// Base URL of the remote actor platform API
    pub platform_base_url: String,
    /// Per-request timeout for outbound platform calls
    pub platform_request_timeout: Duration,
    /// Maximum number of status checks per execution
    pub poll_max_attempts: u32,
    /// Fixed delay before each status check, including the first
    pub poll_interval: Duration,
    /// Catalog strategies keep running until this many actors are known
    pub catalog_target: usize,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        Ok(Self {
            port: env_parse("RELAY_PORT", 8080)?,
            platform_base_url: env_str("PLATFORM_BASE_URL", "https://api.apify.com/v2"),
            platform_request_timeout: Duration::from_secs(env_parse(
                "PLATFORM_REQUEST_TIMEOUT_SECS",
                30,
            )?),
            poll_max_attempts: env_parse("EXECUTION_POLL_MAX_ATTEMPTS", 60)?,
            poll_interval: Duration::from_secs(env_parse("EXECUTION_POLL_INTERVAL_SECS", 5)?),
            catalog_target: env_parse("CATALOG_TARGET", 6)?,
        })
    }
}

fn env_str(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> anyhow::Result<T>
where
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(val) => val
            .parse::<T>()
            .map_err(|e| anyhow::anyhow!("Failed to parse env var {key}={val}: {e}")),
        Err(_) => Ok(default),
    }
}
