use anyhow::Result;
use dotenvy::dotenv;
use secrecy::Secret;
use serde::Deserialize;
use std::env;

#[derive(Deserialize, Clone, Debug)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub webhook: WebhookConfig,
    pub app: AppConfig,
    pub service_name: String,
}

#[derive(Deserialize, Clone, Debug)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Deserialize, Clone, Debug)]
pub struct DatabaseConfig {
    pub url: Secret<String>,
    pub max_connections: u32,
    pub min_connections: u32,
}

/// Payment gateway webhook settings.
#[derive(Deserialize, Clone, Debug)]
pub struct WebhookConfig {
    pub secret: Secret<String>,
}

/// Settings for user-facing output (deep links in notifications).
#[derive(Deserialize, Clone, Debug)]
pub struct AppConfig {
    pub base_url: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenv().ok();

        let host = env::var("FAKTURA_HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let port = env::var("FAKTURA_PORT")
            .unwrap_or_else(|_| "3007".to_string())
            .parse()?;

        let db_url =
            env::var("DATABASE_URL").map_err(|_| anyhow::anyhow!("DATABASE_URL must be set"))?;
        let max_connections = env::var("FAKTURA_DB_MAX_CONNECTIONS")
            .unwrap_or_else(|_| "5".to_string())
            .parse()?;
        let min_connections = env::var("FAKTURA_DB_MIN_CONNECTIONS")
            .unwrap_or_else(|_| "1".to_string())
            .parse()?;

        let webhook_secret = env::var("FAKTURA_WEBHOOK_SECRET").unwrap_or_default();

        let base_url =
            env::var("FAKTURA_APP_BASE_URL").unwrap_or_else(|_| "http://localhost:3000".to_string());

        Ok(Self {
            server: ServerConfig { host, port },
            database: DatabaseConfig {
                url: Secret::new(db_url),
                max_connections,
                min_connections,
            },
            webhook: WebhookConfig {
                secret: Secret::new(webhook_secret),
            },
            app: AppConfig { base_url },
            service_name: "faktura-service".to_string(),
        })
    }
}
