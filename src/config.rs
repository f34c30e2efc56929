//! Configuration management for Disk Model
//!
//! Every option defaults to the constants the management service expects for
//! a local, impersonating hardware query, so an absent config file behaves
//! exactly like an empty one.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Disk Model configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Session security and namespace options
    #[serde(default)]
    pub session: SessionConfig,
    /// Query options
    #[serde(default)]
    pub query: QueryConfig,
    /// Console output options
    #[serde(default)]
    pub output: OutputConfig,
}

/// Authentication level used for process security and the proxy blanket
///
/// Discriminants match `RPC_C_AUTHN_LEVEL_*`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AuthenticationLevel {
    Default = 0,
    None = 1,
    Connect = 2,
    Call = 3,
    Packet = 4,
    PacketIntegrity = 5,
    PacketPrivacy = 6,
}

impl AuthenticationLevel {
    pub fn as_raw(self) -> u32 {
        self as u32
    }
}

/// Impersonation level granted to the service
///
/// Discriminants match `RPC_C_IMP_LEVEL_*`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ImpersonationLevel {
    Default = 0,
    Anonymous = 1,
    Identify = 2,
    Impersonate = 3,
    Delegate = 4,
}

impl ImpersonationLevel {
    pub fn as_raw(self) -> u32 {
        self as u32
    }
}

/// Session configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Management namespace holding the hardware classes
    #[serde(default = "default_namespace")]
    pub namespace: String,
    /// Authentication level for process-wide security initialization
    #[serde(default = "default_security_authentication")]
    pub security_authentication: AuthenticationLevel,
    /// Authentication level negotiated on the service proxy
    #[serde(default = "default_proxy_authentication")]
    pub proxy_authentication: AuthenticationLevel,
    /// Impersonation level for both security steps
    #[serde(default = "default_impersonation")]
    pub impersonation: ImpersonationLevel,
}

/// Query configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryConfig {
    /// Query language understood by the service
    #[serde(default = "default_language")]
    pub language: String,
    /// Query selecting the disk drive records
    #[serde(default = "default_query_text")]
    pub text: String,
    /// Record field holding the disk model
    #[serde(default = "default_field")]
    pub field: String,
}

/// Console output configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Colorize labels and values
    #[serde(default = "default_true")]
    pub color: bool,
    /// Label printed before each model
    #[serde(default = "default_label")]
    pub label: String,
}

// Default value functions
fn default_namespace() -> String {
    "ROOT\\CIMV2".to_string()
}

fn default_security_authentication() -> AuthenticationLevel {
    AuthenticationLevel::Default
}

fn default_proxy_authentication() -> AuthenticationLevel {
    AuthenticationLevel::Call
}

fn default_impersonation() -> ImpersonationLevel {
    ImpersonationLevel::Impersonate
}

fn default_language() -> String {
    "WQL".to_string()
}

fn default_query_text() -> String {
    "SELECT * FROM Win32_DiskDrive".to_string()
}

fn default_field() -> String {
    "Model".to_string()
}

fn default_true() -> bool {
    true
}

fn default_label() -> String {
    "Disk Model: ".to_string()
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            namespace: default_namespace(),
            security_authentication: default_security_authentication(),
            proxy_authentication: default_proxy_authentication(),
            impersonation: default_impersonation(),
        }
    }
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            language: default_language(),
            text: default_query_text(),
            field: default_field(),
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            color: true,
            label: default_label(),
        }
    }
}

impl Config {
    /// Get the default configuration directory
    ///
    /// Returns `~/.config/diskmodel` on Unix-like systems,
    /// or `%APPDATA%\diskmodel` on Windows.
    pub fn default_path() -> PathBuf {
        let config_dir = if cfg!(windows) {
            std::env::var("APPDATA")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("."))
        } else {
            std::env::var("HOME")
                .map(|home| PathBuf::from(home).join(".config"))
                .unwrap_or_else(|_| PathBuf::from(".config"))
        };

        config_dir.join("diskmodel")
    }

    /// Load configuration from the default path, falling back to defaults
    pub fn load() -> Result<Self> {
        let config_file = Self::default_path().join("config.toml");

        if !config_file.exists() {
            return Ok(Self::default());
        }

        Self::load_from(&config_file)
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml(&contents)
    }

    /// Parse and validate a TOML document
    pub fn from_toml(contents: &str) -> Result<Self> {
        let config: Config = toml::from_str(contents)
            .map_err(|e| Error::Config(format!("Failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject settings the service can never accept
    pub fn validate(&self) -> Result<()> {
        let required = [
            ("session.namespace", &self.session.namespace),
            ("query.language", &self.query.language),
            ("query.text", &self.query.text),
            ("query.field", &self.query.field),
        ];

        for (key, value) in required {
            if value.trim().is_empty() {
                return Err(Error::Config(format!("{} must not be empty", key)));
            }
        }

        Ok(())
    }

    /// Save configuration to the default path
    pub fn save(&self) -> Result<()> {
        let config_dir = Self::default_path();
        std::fs::create_dir_all(&config_dir)?;
        self.save_to(&config_dir.join("config.toml"))
    }

    /// Save configuration to a specific path
    pub fn save_to(&self, path: &Path) -> Result<()> {
        let contents = toml::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path, contents)?;
        Ok(())
    }
}
