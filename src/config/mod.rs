use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Debug, Clone, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub email: EmailConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            data_dir: default_data_dir(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("./data")
}

#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    /// Admin account created at startup when no admin exists.
    #[serde(default = "default_admin_email")]
    pub admin_email: String,
    /// Admin bootstrap is skipped when no password is configured.
    pub admin_password: Option<String>,
    /// Session lifetime in days.
    #[serde(default = "default_session_days")]
    pub session_days: i64,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            admin_email: default_admin_email(),
            admin_password: None,
            session_days: default_session_days(),
        }
    }
}

fn default_admin_email() -> String {
    "admin@uniplan.local".to_string()
}

fn default_session_days() -> i64 {
    7
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct EmailConfig {
    pub smtp_host: Option<String>,
    #[serde(default = "default_smtp_port")]
    pub smtp_port: u16,
    #[serde(default = "default_smtp_tls")]
    pub smtp_tls: bool,
    pub smtp_username: Option<String>,
    pub smtp_password: Option<String>,
    pub from_address: Option<String>,
    #[serde(default = "default_from_name")]
    pub from_name: String,
}

impl EmailConfig {
    /// Sending requires at least a host and a from address.
    pub fn is_configured(&self) -> bool {
        self.smtp_host.is_some() && self.from_address.is_some()
    }
}

fn default_smtp_port() -> u16 {
    587
}

fn default_smtp_tls() -> bool {
    true
}

fn default_from_name() -> String {
    "Uniplan".to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        if path.exists() {
            info!("Loading configuration from {}", path.display());
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file: {}", path.display()))?;
            let config: Config = toml::from_str(&content)
                .with_context(|| "Failed to parse configuration file")?;
            Ok(config)
        } else {
            info!("No config file found, using defaults");
            Ok(Config::default())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.auth.session_days, 7);
        // no silent admin account with an unknowable password
        assert!(config.auth.admin_password.is_none());
        assert_eq!(config.logging.level, "info");
        assert!(!config.email.is_configured());
    }

    #[test]
    fn test_parse_admin_credentials() {
        let config: Config = toml::from_str(
            r#"
            [auth]
            admin_email = "root@uni.example"
            admin_password = "hunter2hunter2"
            "#,
        )
        .unwrap();
        assert_eq!(config.auth.admin_email, "root@uni.example");
        assert_eq!(config.auth.admin_password.as_deref(), Some("hunter2hunter2"));
    }

    #[test]
    fn test_parse_partial_config() {
        let config: Config = toml::from_str(
            r#"
            [server]
            port = 9000

            [email]
            smtp_host = "smtp.example.com"
            from_address = "noreply@example.com"
            "#,
        )
        .unwrap();
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.server.host, "0.0.0.0");
        assert!(config.email.is_configured());
        assert_eq!(config.email.smtp_port, 587);
    }

    #[test]
    fn test_load_missing_file_uses_defaults() {
        let config = Config::load(Path::new("/nonexistent/uniplan.toml")).unwrap();
        assert_eq!(config.server.port, 8080);
    }
}
