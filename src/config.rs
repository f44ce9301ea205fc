// src/config.rs

use std::env;

use dotenvy::dotenv;
use thiserror::Error;

const DEFAULT_CORS_ORIGINS: &str = "http://localhost:3000,http://127.0.0.1:3000";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("invalid value for {key}: {value:?}")]
    Invalid { key: &'static str, value: String },
}

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    /// Secret shared with the external auth service that issues student tokens.
    pub jwt_secret: String,
    pub rust_log: String,
    pub port: u16,
    pub cors_origins: Vec<String>,
    /// When false, a student cannot resubmit an activity already marked completed.
    pub allow_resubmission: bool,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenv().ok();

        let database_url = required("DATABASE_URL")?;
        let jwt_secret = required("JWT_SECRET")?;

        let rust_log = env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());

        let port = match env::var("PORT") {
            Ok(raw) => raw
                .parse::<u16>()
                .map_err(|_| ConfigError::Invalid { key: "PORT", value: raw })?,
            Err(_) => 3000,
        };

        let cors_origins = env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| DEFAULT_CORS_ORIGINS.to_string())
            .split(',')
            .map(str::trim)
            .filter(|origin| !origin.is_empty())
            .map(String::from)
            .collect();

        let allow_resubmission = match env::var("ALLOW_RESUBMISSION") {
            Ok(raw) => parse_flag(&raw).ok_or(ConfigError::Invalid {
                key: "ALLOW_RESUBMISSION",
                value: raw,
            })?,
            Err(_) => true,
        };

        Ok(Self {
            database_url,
            jwt_secret,
            rust_log,
            port,
            cors_origins,
            allow_resubmission,
        })
    }
}

fn required(key: &'static str) -> Result<String, ConfigError> {
    env::var(key).map_err(|_| ConfigError::Missing(key))
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
