use std::{env, fmt::Display, net::SocketAddr, str::FromStr};

use anyhow::{Context, Result};
use tracing::{info, warn};

const DEFAULT_BIND_ADDRESS: &str = "127.0.0.1:3001";

/// Credentials for the admin account created on first start.
#[derive(Debug, Clone)]
pub struct AdminSeed {
    pub username: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    pub bind_address: SocketAddr,
    pub admin_seed: Option<AdminSeed>,
}

impl Config {
    pub fn load() -> Result<Self> {
        Ok(Self {
            database_url: env::var("DATABASE_URL").context("DATABASE_URL must be set")?,
            jwt_secret: env::var("JWT_SECRET").context("JWT_SECRET must be set")?,
            bind_address: try_load("BIND_ADDRESS", DEFAULT_BIND_ADDRESS)?,
            admin_seed: load_admin_seed(),
        })
    }
}

fn load_admin_seed() -> Option<AdminSeed> {
    let email = env::var("ADMIN_EMAIL").ok()?;
    let password = match env::var("ADMIN_PASSWORD") {
        Ok(password) => password,
        Err(_) => {
            warn!("ADMIN_EMAIL is set without ADMIN_PASSWORD, skipping admin seed");
            return None;
        }
    };
    let username = env::var("ADMIN_USERNAME").unwrap_or_else(|_| "admin".to_owned());
    Some(AdminSeed {
        username,
        email,
        password,
    })
}

/// Reads `key`, falling back to `default` when unset or unparsable.
pub fn try_load<T: FromStr>(key: &str, default: &str) -> Result<T>
where
    T::Err: Display,
{
    let raw = env::var(key).unwrap_or_else(|_| {
        info!("{key} not set, using default: {default}");
        default.to_owned()
    });
    match raw.parse() {
        Ok(value) => Ok(value),
        Err(e) => {
            warn!("Invalid {key} value {raw:?}: {e}, using default: {default}");
            default
                .parse()
                .map_err(|e| anyhow::anyhow!("default for {key} is invalid: {e}"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn falls_back_on_garbage() {
        env::set_var("ATLSFW_TEST_TTL", "not-a-number");
        let ttl: u64 = try_load("ATLSFW_TEST_TTL", "300").unwrap();
        assert_eq!(ttl, 300);
        env::set_var("ATLSFW_TEST_TTL", "42");
        let ttl: u64 = try_load("ATLSFW_TEST_TTL", "300").unwrap();
        assert_eq!(ttl, 42);
    }

    #[test]
    fn missing_key_uses_default() {
        let addr: SocketAddr = try_load("ATLSFW_TEST_UNSET_ADDR", DEFAULT_BIND_ADDRESS).unwrap();
        assert_eq!(addr.port(), 3001);
    }
}
