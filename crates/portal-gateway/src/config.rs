use portal_proto::{AuthMethod, ProtocolVersion};
use serde::{Deserialize, Serialize};
use std::fs;
use std::net::{IpAddr, SocketAddr};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Parse error: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// User configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub username: String,
    pub password: String,
    /// Session timeout in seconds, 0 for unlimited
    #[serde(default)]
    pub session_timeout: u32,
}

/// Gateway configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Portal listen address
    #[serde(default = "default_listen_address")]
    pub listen_address: String,

    /// Portal listen port; the NAS sends responses and notifications here
    #[serde(default = "default_listen_port")]
    pub listen_port: u16,

    /// Shared secret with the NAS
    #[serde(default = "default_secret")]
    pub secret: String,

    /// Default NAS address for CLI operations
    #[serde(default)]
    pub nas_ip: Option<String>,

    /// Port the NAS listens on for portal requests
    #[serde(default = "default_nas_port")]
    pub nas_port: u16,

    /// Protocol version: 1 or 2
    #[serde(default = "default_version")]
    pub version: u8,

    /// Seconds to wait for a response
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// "chap" or "pap"
    #[serde(default = "default_auth_method")]
    pub auth_method: String,

    /// Log level: "trace", "debug", "info", "warn", "error" (default: "info")
    #[serde(default)]
    pub log_level: Option<String>,

    /// Local users for credential verification
    #[serde(default)]
    pub users: Vec<User>,
}

fn default_listen_address() -> String {
    "0.0.0.0".to_string()
}

fn default_listen_port() -> u16 {
    50100
}

fn default_secret() -> String {
    "testing123".to_string()
}

fn default_nas_port() -> u16 {
    2000
}

fn default_version() -> u8 {
    1
}

fn default_timeout_secs() -> u64 {
    8
}

fn default_auth_method() -> String {
    AuthMethod::Chap.to_string()
}

impl Default for Config {
    fn default() -> Self {
        Config {
            listen_address: default_listen_address(),
            listen_port: default_listen_port(),
            secret: default_secret(),
            nas_ip: None,
            nas_port: default_nas_port(),
            version: default_version(),
            timeout_secs: default_timeout_secs(),
            auth_method: default_auth_method(),
            log_level: None,
            users: vec![],
        }
    }
}

impl Config {
    /// Load configuration from a JSON file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a JSON file
    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let contents = serde_json::to_string_pretty(self)?;
        fs::write(path, contents)?;
        Ok(())
    }

    /// Get socket address for binding
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        let addr: IpAddr = self.listen_address.parse().map_err(|_| {
            ConfigError::Invalid(format!("Invalid IP address: {}", self.listen_address))
        })?;
        Ok(SocketAddr::new(addr, self.listen_port))
    }

    /// The configured NAS address, if any
    pub fn nas_ip(&self) -> Result<Option<IpAddr>, ConfigError> {
        self.nas_ip
            .as_deref()
            .map(|ip| {
                ip.parse()
                    .map_err(|_| ConfigError::Invalid(format!("Invalid NAS address: {}", ip)))
            })
            .transpose()
    }

    /// Socket address of the configured NAS
    pub fn nas_addr(&self) -> Result<Option<SocketAddr>, ConfigError> {
        Ok(self.nas_ip()?.map(|ip| SocketAddr::new(ip, self.nas_port)))
    }

    pub fn protocol_version(&self) -> Result<ProtocolVersion, ConfigError> {
        ProtocolVersion::from_u8(self.version).ok_or_else(|| {
            ConfigError::Invalid(format!("Unsupported protocol version: {}", self.version))
        })
    }

    pub fn auth_method(&self) -> Result<AuthMethod, ConfigError> {
        self.auth_method.parse().map_err(ConfigError::Invalid)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Look up a configured user by name
    pub fn find_user(&self, username: &str) -> Option<&User> {
        self.users.iter().find(|user| user.username == username)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.socket_addr()?;
        self.nas_ip()?;
        self.protocol_version()?;
        self.auth_method()?;

        if self.listen_port == 0 || self.nas_port == 0 {
            return Err(ConfigError::Invalid("Port cannot be 0".to_string()));
        }

        if self.secret.is_empty() {
            return Err(ConfigError::Invalid("Secret cannot be empty".to_string()));
        }

        if self.timeout_secs == 0 {
            return Err(ConfigError::Invalid("Timeout cannot be 0".to_string()));
        }

        for user in &self.users {
            if user.username.is_empty() {
                return Err(ConfigError::Invalid("User has empty username".to_string()));
            }
        }

        Ok(())
    }

    /// Create an example configuration file
    pub fn example() -> Self {
        Config {
            listen_address: "0.0.0.0".to_string(),
            listen_port: 50100,
            secret: "testing123".to_string(),
            nas_ip: Some("192.168.1.1".to_string()),
            nas_port: 2000,
            version: 2,
            timeout_secs: 8,
            auth_method: "chap".to_string(),
            log_level: Some("info".to_string()),
            users: vec![
                User {
                    username: "admin".to_string(),
                    password: "admin123".to_string(),
                    session_timeout: 0,
                },
                User {
                    username: "user1".to_string(),
                    password: "password1".to_string(),
                    session_timeout: 3600,
                },
            ],
        }
    }
}
