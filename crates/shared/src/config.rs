//! Application configuration management.

use serde::Deserialize;

/// Application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Server configuration.
    #[serde(default)]
    pub server: ServerConfig,
    /// Database configuration.
    pub database: DatabaseConfig,
    /// Export defaults (lowest precedence when resolving an export).
    #[serde(default)]
    pub export: ExportSettings,
    /// User management policy.
    #[serde(default)]
    pub users: UserPolicyConfig,
}

/// Server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host to bind to.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to listen on.
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

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

/// Database configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Database connection URL.
    pub url: String,
    /// Maximum number of connections in the pool.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Minimum number of connections in the pool.
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
}

fn default_max_connections() -> u32 {
    10
}

fn default_min_connections() -> u32 {
    1
}

/// System-wide export defaults.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ExportSettings {
    /// Output format name (`xlsx`, `csv`, `tsv`).
    pub format: String,
    /// Filename base used when the caller gives none.
    pub filename_base: String,
    /// Emit a header row.
    pub with_headings: bool,
    /// Size spreadsheet columns to their content.
    pub auto_size_columns: bool,
    /// Treat only real nulls as empty cells.
    pub strict_null_comparison: bool,
}

impl Default for ExportSettings {
    fn default() -> Self {
        Self {
            format: "xlsx".to_string(),
            filename_base: "export".to_string(),
            with_headings: true,
            auto_size_columns: true,
            strict_null_comparison: true,
        }
    }
}

/// Rules for user management.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct UserPolicyConfig {
    /// Role names whose holders can never be deleted or deactivated.
    pub protected_roles: Vec<String>,
}

impl Default for UserPolicyConfig {
    fn default() -> Self {
        Self {
            protected_roles: vec!["super-admin".to_string()],
        }
    }
}

impl AppConfig {
    /// Loads configuration from environment and config files.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be loaded.
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{run_mode}")).required(false))
            .add_source(config::Environment::with_prefix("BROKERAGE").separator("__"))
            .build()?;

        config.try_deserialize()
    }
}
