/**
 * Server Configuration
 *
 * This module handles loading and validation of server configuration
 * from environment variables, and the optional PostgreSQL connection.
 *
 * # Configuration Sources
 *
 * | variable | default |
 * |---|---|
 * | `PORT` | `8080` |
 * | `DATABASE_URL` | unset (database features disabled) |
 * | `JWT_SECRET` | required |
 * | `JWT_TTL_HOURS` | `24` |
 * | `APP_ENV` | `dev` |
 * | `HUB_TICK_SECS` | `300` |
 * | `HUB_IDLE_TIMEOUT_SECS` | `600` (`0` disables idle retirement) |
 * | `HUB_MAILBOX_CAPACITY` | `64` |
 * | `OUTBOUND_QUEUE_CAPACITY` | `256` |
 *
 * # Error Handling
 *
 * A missing secret or an unparsable value is a `ConfigError` and stops
 * startup. A database that cannot be reached only disables the
 * database-backed routes.
 */

use std::str::FromStr;
use std::time::Duration;

use sqlx::PgPool;
use thiserror::Error;

use crate::backend::realtime::HubSettings;

/// Configuration errors
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("{name} has an invalid value '{value}'")]
    Invalid { name: &'static str, value: String },
}

/// Everything the server reads from its environment
#[derive(Clone)]
pub struct ServerConfig {
    pub port: u16,
    pub database_url: Option<String>,
    pub jwt_secret: String,
    pub jwt_ttl_hours: i64,
    pub app_env: String,
    pub hub: HubSettings,
}

impl ServerConfig {
    /// Read configuration from the process environment
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build configuration from any variable lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());

        let jwt_secret = get("JWT_SECRET").ok_or(ConfigError::Missing("JWT_SECRET"))?;
        let defaults = HubSettings::default();

        let idle_secs: u64 = parse_or(&get, "HUB_IDLE_TIMEOUT_SECS", 600)?;
        let hub = HubSettings {
            tick_interval: Duration::from_secs(positive(
                "HUB_TICK_SECS",
                parse_or(&get, "HUB_TICK_SECS", defaults.tick_interval.as_secs())?,
            )?),
            idle_timeout: (idle_secs > 0).then(|| Duration::from_secs(idle_secs)),
            mailbox_capacity: positive(
                "HUB_MAILBOX_CAPACITY",
                parse_or(&get, "HUB_MAILBOX_CAPACITY", defaults.mailbox_capacity)?,
            )?,
            outbound_capacity: positive(
                "OUTBOUND_QUEUE_CAPACITY",
                parse_or(&get, "OUTBOUND_QUEUE_CAPACITY", defaults.outbound_capacity)?,
            )?,
        };

        Ok(Self {
            port: parse_or(&get, "PORT", 8080)?,
            database_url: get("DATABASE_URL"),
            jwt_secret,
            jwt_ttl_hours: positive("JWT_TTL_HOURS", parse_or(&get, "JWT_TTL_HOURS", 24)?)?,
            app_env: get("APP_ENV").unwrap_or_else(|| "dev".to_string()),
            hub,
        })
    }

    pub fn is_production(&self) -> bool {
        self.app_env.eq_ignore_ascii_case("prod") || self.app_env.eq_ignore_ascii_case("production")
    }
}

// Keep secrets out of logs.
impl std::fmt::Debug for ServerConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServerConfig")
            .field("port", &self.port)
            .field("database_url", &self.database_url.as_ref().map(|_| "<set>"))
            .field("jwt_ttl_hours", &self.jwt_ttl_hours)
            .field("app_env", &self.app_env)
            .field("hub", &self.hub)
            .finish_non_exhaustive()
    }
}

fn parse_or<T, G>(get: &G, name: &'static str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    G: Fn(&str) -> Option<String>,
{
    match get(name) {
        None => Ok(default),
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { name, value }),
    }
}

fn positive<T>(name: &'static str, value: T) -> Result<T, ConfigError>
where
    T: PartialOrd + Default + ToString,
{
    if value > T::default() {
        Ok(value)
    } else {
        Err(ConfigError::Invalid {
            name,
            value: value.to_string(),
        })
    }
}

/// Load and initialize database connection pool
///
/// This function:
/// 1. Creates a PostgreSQL connection pool
/// 2. Runs database migrations
///
/// # Returns
///
/// - `Some(PgPool)` if database is successfully configured
/// - `None` if no URL is configured or connection fails
///
/// Errors are logged but do not prevent server startup.
pub async fn load_database(database_url: Option<&str>) -> Option<PgPool> {
    let Some(database_url) = database_url else {
        tracing::warn!("[Server] DATABASE_URL not set. Database features will be disabled.");
        return None;
    };

    tracing::info!("[Server] Connecting to database...");

    let pool = match PgPool::connect(database_url).await {
        Ok(pool) => pool,
        Err(e) => {
            tracing::error!("[Server] Failed to create database connection pool: {:?}", e);
            tracing::warn!("[Server] Database features will be disabled.");
            return None;
        }
    };

    tracing::info!("[Server] Running database migrations...");
    match sqlx::migrate!().run(&pool).await {
        Ok(()) => tracing::info!("[Server] Database migrations completed successfully"),
        Err(e) => {
            tracing::error!("[Server] Failed to run database migrations: {}", e);
            tracing::warn!("[Server] Continuing without migrations - database might not be up to date");
        }
    }

    Some(pool)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> Result<ServerConfig, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ServerConfig::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config(&[("JWT_SECRET", "s3cret")]).unwrap();
        assert_eq!(config.port, 8080);
        assert_eq!(config.database_url, None);
        assert_eq!(config.jwt_ttl_hours, 24);
        assert_eq!(config.app_env, "dev");
        assert_eq!(config.hub.tick_interval, Duration::from_secs(300));
        assert_eq!(config.hub.idle_timeout, Some(Duration::from_secs(600)));
        assert_eq!(config.hub.mailbox_capacity, 64);
        assert_eq!(config.hub.outbound_capacity, 256);
        assert!(!config.is_production());
    }

    #[test]
    fn test_missing_secret() {
        assert_eq!(config(&[]).unwrap_err(), ConfigError::Missing("JWT_SECRET"));
        assert_eq!(
            config(&[("JWT_SECRET", "  ")]).unwrap_err(),
            ConfigError::Missing("JWT_SECRET")
        );
    }

    #[test]
    fn test_overrides() {
        let config = config(&[
            ("JWT_SECRET", "s3cret"),
            ("PORT", "9000"),
            ("DATABASE_URL", "postgres://localhost/roomchat"),
            ("JWT_TTL_HOURS", "2"),
            ("APP_ENV", "production"),
            ("HUB_TICK_SECS", "30"),
            ("HUB_IDLE_TIMEOUT_SECS", "0"),
            ("OUTBOUND_QUEUE_CAPACITY", "8"),
        ])
        .unwrap();
        assert_eq!(config.port, 9000);
        assert_eq!(config.database_url.as_deref(), Some("postgres://localhost/roomchat"));
        assert_eq!(config.jwt_ttl_hours, 2);
        assert!(config.is_production());
        assert_eq!(config.hub.tick_interval, Duration::from_secs(30));
        assert_eq!(config.hub.idle_timeout, None);
        assert_eq!(config.hub.outbound_capacity, 8);
    }

    #[test]
    fn test_invalid_values() {
        assert_eq!(
            config(&[("JWT_SECRET", "s"), ("PORT", "eighty")]).unwrap_err(),
            ConfigError::Invalid {
                name: "PORT",
                value: "eighty".to_string()
            }
        );
        assert!(config(&[("JWT_SECRET", "s"), ("HUB_MAILBOX_CAPACITY", "0")]).is_err());
        assert!(config(&[("JWT_SECRET", "s"), ("HUB_TICK_SECS", "0")]).is_err());
    }

    #[test]
    fn test_debug_hides_secrets() {
        let config = config(&[("JWT_SECRET", "s3cret"), ("DATABASE_URL", "postgres://u:pw@h/db")]).unwrap();
        let printed = format!("{:?}", config);
        assert!(!printed.contains("s3cret"));
        assert!(!printed.contains("pw@h"));
    }

    #[tokio::test]
    async fn test_load_database_without_url() {
        assert!(load_database(None).await.is_none());
    }
}
