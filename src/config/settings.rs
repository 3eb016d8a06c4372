use std::fs;
use std::path::PathBuf;

use serde::Deserialize;

use crate::util::paths::config_path;

/// Example configuration file contents (bundled with the binary)
pub const EXAMPLE_CONFIG: &str = include_str!("config.toml.example");

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL of the thread gateway the client talks to
    pub gateway_url: String,
    /// Sidebar width in columns
    pub sidebar_width: u16,
    /// Settings for gateway (serve) mode
    pub serve: ServeConfig,
}

/// Configuration for `threadbook serve`
#[derive(Debug, Clone)]
pub struct ServeConfig {
    /// Base URL of the upstream assistant API
    pub assistant_url: String,
    /// Assistant id used to run replies
    pub assistant_id: String,
    /// Upstream API key, read from THREADBOOK_ASSISTANT_KEY
    pub assistant_key: Option<String>,
    /// Poll interval for in-flight runs, in milliseconds
    pub poll_interval_ms: u64,
    /// Give up on a run after this many polls
    pub poll_max_attempts: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            gateway_url: "http://127.0.0.1:8787".to_string(),
            sidebar_width: 34,
            serve: ServeConfig {
                assistant_url: "https://api.example.com/v1".to_string(),
                assistant_id: "asst_default".to_string(),
                assistant_key: None,
                poll_interval_ms: 750,
                poll_max_attempts: 120,
            },
        }
    }
}

/// TOML representation of the [client] section
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
struct TomlClientConfig {
    gateway_url: Option<String>,
    sidebar_width: Option<u16>,
}

/// TOML representation of the [serve] section
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
struct TomlServeConfig {
    assistant_url: Option<String>,
    assistant_id: Option<String>,
    poll_interval_ms: Option<u64>,
    poll_max_attempts: Option<u32>,
}

/// TOML representation of the config file
#[derive(Debug, Clone, Default, Deserialize)]
struct TomlConfig {
    client: Option<TomlClientConfig>,
    serve: Option<TomlServeConfig>,
}

impl Config {
    /// Load configuration from file, merging with defaults
    pub fn load() -> Self {
        let mut config = Config::default();

        let config_file = config_path();

        // Create example config on first run
        if !config_file.exists() {
            Self::create_default_config(&config_file);
        }

        if config_file.exists() {
            if let Ok(contents) = fs::read_to_string(&config_file) {
                if let Ok(toml_config) = toml::from_str::<TomlConfig>(&contents) {
                    if let Some(client) = toml_config.client {
                        if let Some(url) = client.gateway_url {
                            config.gateway_url = url;
                        }
                        if let Some(width) = client.sidebar_width {
                            config.sidebar_width = width;
                        }
                    }

                    if let Some(serve) = toml_config.serve {
                        if let Some(url) = serve.assistant_url {
                            config.serve.assistant_url = url;
                        }
                        if let Some(id) = serve.assistant_id {
                            config.serve.assistant_id = id;
                        }
                        if let Some(interval) = serve.poll_interval_ms {
                            config.serve.poll_interval_ms = interval;
                        }
                        if let Some(attempts) = serve.poll_max_attempts {
                            config.serve.poll_max_attempts = attempts;
                        }
                    }
                }
            }
        }

        config.serve.assistant_key = std::env::var("THREADBOOK_ASSISTANT_KEY").ok();

        config
    }

    /// Create the default config file from the bundled example
    fn create_default_config(path: &PathBuf) {
        if let Some(parent) = path.parent() {
            if !parent.exists() {
                if let Err(e) = fs::create_dir_all(parent) {
                    eprintln!("Failed to create config directory: {}", e);
                    return;
                }
            }
        }

        if let Err(e) = fs::write(path, EXAMPLE_CONFIG) {
            eprintln!("Failed to write default config: {}", e);
        }
    }

    pub fn with_gateway_url(mut self, url: impl Into<String>) -> Self {
        self.gateway_url = url.into();
        self
    }
}
