use anyhow::{anyhow, bail, Context};
use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

/// Where sessions live
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionBackend {
    Memory,
    Redis,
}

impl FromStr for SessionBackend {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "memory" => Ok(SessionBackend::Memory),
            "redis" => Ok(SessionBackend::Redis),
            other => Err(anyhow!("unknown session backend '{other}' (expected memory or redis)")),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    /// Unset means the in-memory user repository
    pub database_url: Option<String>,
    pub database_max_connections: u32,
    pub session_backend: SessionBackend,
    pub redis_url: String,
    pub session_ttl: chrono::Duration,
    /// Zero disables the in-memory session sweeper
    pub session_sweep_interval: Duration,
    pub request_timeout: Duration,
    pub cookie_secure: bool,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from any key lookup, applying defaults for missing keys
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let session_ttl_secs: i64 = parse_or(&get, "SESSION_TTL_SECONDS", 86_400)?;
        if session_ttl_secs <= 0 {
            bail!("SESSION_TTL_SECONDS must be greater than zero");
        }
        let session_ttl = chrono::Duration::try_seconds(session_ttl_secs)
            .filter(|ttl| chrono::Utc::now().checked_add_signed(*ttl).is_some())
            .ok_or_else(|| anyhow!("SESSION_TTL_SECONDS is too large: {session_ttl_secs}"))?;

        Ok(Self {
            host: get("APP_HOST").unwrap_or_else(|| "0.0.0.0".into()),
            port: parse_or(&get, "APP_PORT", 8080)?,
            database_url: get("DATABASE_URL"),
            database_max_connections: parse_or(&get, "DATABASE_MAX_CONNECTIONS", 10)?,
            session_backend: parse_or(&get, "SESSION_BACKEND", SessionBackend::Memory)?,
            redis_url: get("REDIS_URL").unwrap_or_else(|| "redis://127.0.0.1:6379".into()),
            session_ttl,
            session_sweep_interval: Duration::from_secs(parse_or(
                &get,
                "SESSION_SWEEP_INTERVAL_SECONDS",
                0,
            )?),
            request_timeout: Duration::from_secs(parse_or(&get, "REQUEST_TIMEOUT_SECONDS", 10)?),
            cookie_secure: parse_or(&get, "COOKIE_SECURE", false)?,
        })
    }

    pub fn bind_address(&self) -> anyhow::Result<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .with_context(|| format!("invalid bind address {}:{}", self.host, self.port))
    }
}

fn parse_or<T, G>(get: &G, key: &str, default: T) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    G: Fn(&str) -> Option<String>,
{
    match get(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e| anyhow!("invalid value for {key}: {e}")),
        None => Ok(default),
    }
}
