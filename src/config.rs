// src/config.rs
use std::net::IpAddr;
use crate::error::AppError;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub host: IpAddr,
    pub port: u16,
    pub db_max_connections: u32,
}

const DEFAULT_HOST: &str = "127.0.0.1";
const DEFAULT_PORT: u16 = 3000;
const DEFAULT_MAX_CONNECTIONS: u32 = 5;

impl AppConfig {
    /// Reads configuration from the process environment (after `.env` is loaded).
    pub fn from_env() -> Result<Self, AppError> {
        let database_url = std::env::var("DATABASE_URL")
            .map_err(|_| AppError::internal("DATABASE_URL must be set"))?;

        Ok(Self::from_parts(
            database_url,
            std::env::var("HOST").ok().as_deref(),
            std::env::var("PORT").ok().as_deref(),
            std::env::var("DB_MAX_CONNECTIONS").ok().as_deref(),
        ))
    }

    fn from_parts(
        database_url: String,
        host: Option<&str>,
        port: Option<&str>,
        max_connections: Option<&str>,
    ) -> Self {
        let host = match host {
            Some(h) => h.parse().unwrap_or_else(|_| {
                tracing::warn!(host = h, "Invalid HOST, falling back to {}", DEFAULT_HOST);
                default_host()
            }),
            None => default_host(),
        };

        let port = match port {
            Some(p) => p.parse::<u16>().unwrap_or_else(|_| {
                tracing::warn!(port = p, "Invalid PORT, falling back to {}", DEFAULT_PORT);
                DEFAULT_PORT
            }),
            None => DEFAULT_PORT,
        };

        let db_max_connections = max_connections
            .and_then(|m| m.parse::<u32>().ok())
            .filter(|m| *m > 0)
            .unwrap_or(DEFAULT_MAX_CONNECTIONS);

        AppConfig { database_url, host, port, db_max_connections }
    }
}

fn default_host() -> IpAddr {
    IpAddr::from([127, 0, 0, 1])
}

pub fn jwt_secret() -> Result<String, AppError> {
    std::env::var("JWT_SECRET").map_err(|_| AppError::internal("JWT secret not configured"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply_when_unset() {
        let cfg = AppConfig::from_parts("postgres://localhost/resto".into(), None, None, None);
        assert_eq!(cfg.host, default_host());
        assert_eq!(cfg.port, 3000);
        assert_eq!(cfg.db_max_connections, 5);
    }

    #[test]
    fn malformed_values_degrade_to_defaults() {
        let cfg = AppConfig::from_parts(
            "postgres://localhost/resto".into(),
            Some("not-an-ip"),
            Some("99999"),
            Some("0"),
        );
        assert_eq!(cfg.host, default_host());
        assert_eq!(cfg.port, 3000);
        assert_eq!(cfg.db_max_connections, 5);
    }

    #[test]
    fn explicit_values_are_used() {
        let cfg = AppConfig::from_parts(
            "postgres://db/resto".into(),
            Some("0.0.0.0"),
            Some("8080"),
            Some("12"),
        );
        assert_eq!(cfg.host.to_string(), "0.0.0.0");
        assert_eq!(cfg.port, 8080);
        assert_eq!(cfg.db_max_connections, 12);
    }
}
