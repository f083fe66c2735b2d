use std::env;
use std::fmt;
use std::str::FromStr;
use std::ops::RangeInclusive;
use std::time::Duration;

/// bcrypt 接受的成本范围
const BCRYPT_COST_RANGE: RangeInclusive<u32> = 4..=31;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("JWT_SECRET is not set: {0}")]
    MissingSecret(#[from] env::VarError),
    #[error("BCRYPT_COST must be between 4 and 31, got {0}")]
    BcryptCost(u32),
}

#[derive(Clone, serde::Deserialize)]
pub struct Config {
    pub database_url: Option<String>,
    pub redis_url: Option<String>,
    pub jwt_secret: String,
    pub jwt_expiration_secs: u64,
    pub users_cache_ttl_secs: u64,
    pub store_timeout_ms: u64,
    pub cache_timeout_ms: u64,
    pub bcrypt_cost: u32,
    pub server_host: String,
    pub server_port: u16,
    pub api_base_uri: String,
}

// 签名密钥不进日志
impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("database_configured", &self.database_url.is_some())
            .field("redis_configured", &self.redis_url.is_some())
            .field("jwt_secret", &"<redacted>")
            .field("jwt_expiration_secs", &self.jwt_expiration_secs)
            .field("users_cache_ttl_secs", &self.users_cache_ttl_secs)
            .field("store_timeout_ms", &self.store_timeout_ms)
            .field("cache_timeout_ms", &self.cache_timeout_ms)
            .field("bcrypt_cost", &self.bcrypt_cost)
            .field("server_host", &self.server_host)
            .field("server_port", &self.server_port)
            .field("api_base_uri", &self.api_base_uri)
            .finish()
    }
}

fn parsed_or<T: FromStr>(name: &str, default: T) -> T {
    env::var(name)
        .ok()
        .and_then(|value| value.trim().parse().ok())
        .unwrap_or(default)
}

fn optional(name: &str) -> Option<String> {
    env::var(name).ok().filter(|value| !value.trim().is_empty())
}

/// 越界的成本会让之后每次哈希都失败，启动时直接拒绝
fn checked_bcrypt_cost(cost: u32) -> Result<u32, ConfigError> {
    if BCRYPT_COST_RANGE.contains(&cost) {
        Ok(cost)
    } else {
        Err(ConfigError::BcryptCost(cost))
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenv::dotenv().ok();

        let jwt_expiration = env::var("JWT_EXPIRATION")
            .ok()
            .and_then(|value| value.trim_end_matches('h').parse::<u64>().ok())
            .unwrap_or(24);

        Ok(Config {
            database_url: optional("DATABASE_URL"),
            redis_url: optional("REDIS_URL"),
            jwt_secret: env::var("JWT_SECRET")?,
            jwt_expiration_secs: jwt_expiration * 3600,
            users_cache_ttl_secs: parsed_or("USERS_CACHE_TTL", 3600),
            store_timeout_ms: parsed_or("STORE_TIMEOUT_MS", 5000),
            cache_timeout_ms: parsed_or("CACHE_TIMEOUT_MS", 500),
            bcrypt_cost: checked_bcrypt_cost(parsed_or("BCRYPT_COST", bcrypt::DEFAULT_COST))?,
            server_host: env::var("SERVER_HOST").unwrap_or_else(|_| "0.0.0.0".into()),
            server_port: parsed_or("SERVER_PORT", 3000),
            api_base_uri: env::var("API_BASE_URI").unwrap_or_else(|_| "/api".into()),
        })
    }

    pub fn jwt_expiration(&self) -> Duration {
        Duration::from_secs(self.jwt_expiration_secs)
    }

    pub fn users_cache_ttl(&self) -> Duration {
        Duration::from_secs(self.users_cache_ttl_secs)
    }

    pub fn store_timeout(&self) -> Duration {
        Duration::from_millis(self.store_timeout_ms)
    }

    pub fn cache_timeout(&self) -> Duration {
        Duration::from_millis(self.cache_timeout_ms)
    }
}
