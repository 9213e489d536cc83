//! Configuration file management.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::{Deserialize, Serialize};

/// Complete daemon configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DaemonConfig {
    /// HTTP / WebSocket listener settings.
    #[serde(default)]
    pub server: ServerConfig,
    /// Storage settings.
    #[serde(default)]
    pub storage: StorageConfig,
    /// List query bounds.
    #[serde(default)]
    pub query: QueryConfig,
    /// Real-time fan-out settings.
    #[serde(default)]
    pub events: EventsConfig,
    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Address the HTTP server binds to. `PORT` in the environment
    /// replaces the port.
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,
}

/// Storage configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Data directory. Empty = platform default.
    #[serde(default)]
    pub data_dir: String,
}

/// Pagination bounds for list queries.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryConfig {
    /// Page size when the request gives none.
    #[serde(default = "default_limit")]
    pub default_limit: u32,
    /// Largest page size a request may ask for.
    #[serde(default = "default_max_limit")]
    pub max_limit: u32,
}

/// Event fan-out configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventsConfig {
    /// Per-subscriber buffer. A session further behind than this skips events.
    #[serde(default = "default_event_capacity")]
    pub capacity: usize,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level: "trace" | "debug" | "info" | "warn" | "error".
    /// `RUST_LOG` takes precedence when set.
    #[serde(default = "default_log_level")]
    pub level: String,
}

// Default value functions

fn default_bind_addr() -> String {
    "127.0.0.1:4000".to_string()
}

fn default_limit() -> u32 {
    charter_types::DEFAULT_PAGE_LIMIT
}

fn default_max_limit() -> u32 {
    100
}

fn default_event_capacity() -> usize {
    1000
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
        }
    }
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            default_limit: default_limit(),
            max_limit: default_max_limit(),
        }
    }
}

impl Default for EventsConfig {
    fn default() -> Self {
        Self {
            capacity: default_event_capacity(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl DaemonConfig {
    /// Load configuration from the default config file location.
    ///
    /// Falls back to defaults if file does not exist.
    pub fn load() -> anyhow::Result<Self> {
        let config_path = Self::config_path();
        if config_path.exists() {
            Self::load_from(&config_path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load and check a specific config file.
    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        let config: DaemonConfig = toml::from_str(&content)
            .with_context(|| format!("parsing config {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject settings the daemon cannot run with.
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.query.default_limit == 0 {
            anyhow::bail!("query.default_limit must be positive");
        }
        if self.query.max_limit < self.query.default_limit {
            anyhow::bail!(
                "query.max_limit ({}) is below query.default_limit ({})",
                self.query.max_limit,
                self.query.default_limit
            );
        }
        if self.events.capacity == 0 {
            anyhow::bail!("events.capacity must be positive");
        }
        Ok(())
    }

    /// Get the data directory path.
    pub fn data_dir(&self) -> PathBuf {
        if self.storage.data_dir.is_empty() {
            Self::default_data_dir()
        } else {
            PathBuf::from(&self.storage.data_dir)
        }
    }

    /// Path of the SQLite database file.
    pub fn db_path(&self) -> PathBuf {
        self.data_dir().join("charter.db")
    }

    /// Listener address, honouring a `PORT` environment override.
    pub fn bind_addr(&self) -> anyhow::Result<SocketAddr> {
        self.resolve_bind_addr(std::env::var("PORT").ok().as_deref())
    }

    fn resolve_bind_addr(&self, port_override: Option<&str>) -> anyhow::Result<SocketAddr> {
        let mut addr: SocketAddr = self
            .server
            .bind_addr
            .parse()
            .with_context(|| format!("invalid server.bind_addr '{}'", self.server.bind_addr))?;
        if let Some(port) = port_override {
            let port: u16 = port
                .trim()
                .parse()
                .with_context(|| format!("invalid PORT '{port}'"))?;
            addr.set_port(port);
        }
        Ok(addr)
    }

    /// Get the config file path.
    fn config_path() -> PathBuf {
        Self::default_data_dir().join("config.toml")
    }

    /// Platform-specific default data directory.
    fn default_data_dir() -> PathBuf {
        if let Ok(dir) = std::env::var("CHARTER_DATA_DIR") {
            return PathBuf::from(dir);
        }
        #[cfg(target_os = "macos")]
        {
            dirs_fallback("Library/Application Support/Charter")
        }
        #[cfg(target_os = "windows")]
        {
            dirs_fallback("Charter")
        }
        #[cfg(not(any(target_os = "macos", target_os = "windows")))]
        {
            dirs_fallback(".charter")
        }
    }
}

/// Fallback home directory resolution.
fn dirs_fallback(subpath: &str) -> PathBuf {
    std::env::var("HOME")
        .map(|h| PathBuf::from(h).join(subpath))
        .unwrap_or_else(|_| PathBuf::from("/tmp/charter"))
}
