use serde::{Deserialize, Serialize};
use std::net::IpAddr;
use std::path::PathBuf;

use super::ConfigError;

/// Root configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: IpAddr,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> IpAddr {
    "0.0.0.0".parse().unwrap()
}

fn default_port() -> u16 {
    8080
}

/// Database configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_db_path")]
    pub path: PathBuf,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

fn default_db_path() -> PathBuf {
    PathBuf::from("/data/helios.db")
}

/// Owner credentials and the subscription feed, taken from the
/// environment. Shipped placeholder values are rejected outright.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub username: String,
    pub password: String,
    pub subscription_url: String,
}

impl Credentials {
    pub fn from_env() -> Result<Self, ConfigError> {
        let username = required_env("USERNAME", "your_username")?;
        let password = required_env("PASSWORD", "your_password")?;
        let subscription_url =
            required_env("SUBSCRIPTION_URL", "https://your_subscription_url.com")?;

        Ok(Self {
            username,
            password,
            subscription_url,
        })
    }
}

fn required_env(name: &str, placeholder: &str) -> Result<String, ConfigError> {
    let value = std::env::var(name).map_err(|_| ConfigError::MissingEnv(name.to_string()))?;
    if value.is_empty() {
        return Err(ConfigError::MissingEnv(name.to_string()));
    }
    if value == placeholder {
        return Err(ConfigError::ValidationError(format!(
            "{} is still set to its placeholder value",
            name
        )));
    }
    Ok(value)
}
