//! Server configuration.
//!
//! Layered with figment: built-in defaults, then `itero.toml` in the working
//! directory if present, then `ITERO_*` environment variables
//! (`ITERO_PORT=8080`, `ITERO_DATABASE_PATH=/var/lib/itero.db`, ...).

use std::net::SocketAddr;
use std::path::PathBuf;

use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};

pub const CONFIG_FILE: &str = "itero.toml";
pub const ENV_PREFIX: &str = "ITERO_";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    pub host: String,
    pub port: u16,
    /// SQLite file, or `:memory:`
    pub database_path: PathBuf,
    pub upload_dir: PathBuf,
    /// Compiled frontend served at `/`
    pub static_dir: PathBuf,
    pub max_upload_bytes: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            database_path: PathBuf::from("itero.db"),
            upload_dir: PathBuf::from("uploads"),
            static_dir: PathBuf::from("frontend/dist"),
            max_upload_bytes: 10 * 1024 * 1024,
        }
    }
}

impl Config {
    pub fn figment() -> Figment {
        Figment::from(Serialized::defaults(Config::default()))
            .merge(Toml::file(CONFIG_FILE))
            .merge(Env::prefixed(ENV_PREFIX))
    }

    pub fn load() -> Result<Self, figment::Error> {
        Self::figment().extract()
    }

    pub fn bind_addr(&self) -> Result<SocketAddr, std::net::AddrParseError> {
        format!("{}:{}", self.host, self.port).parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use figment::Jail;

    #[test]
    fn test_defaults() {
        Jail::expect_with(|_jail| {
            let config = Config::load()?;
            assert_eq!(config, Config::default());
            assert_eq!(config.bind_addr().unwrap().port(), 3000);
            Ok(())
        });
    }

    #[test]
    fn test_file_then_env_override() {
        Jail::expect_with(|jail| {
            jail.create_file(
                CONFIG_FILE,
                r#"
                port = 4000
                upload_dir = "/tmp/files"
                "#,
            )?;
            jail.set_env("ITERO_PORT", "8080");

            let config = Config::load()?;
            assert_eq!(config.port, 8080);
            assert_eq!(config.upload_dir, PathBuf::from("/tmp/files"));
            assert_eq!(config.database_path, PathBuf::from("itero.db"));
            Ok(())
        });
    }
}
