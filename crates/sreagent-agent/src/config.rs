use crate::plugin::DEFAULT_PLUGIN_CONFIG;
use anyhow::Context;
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Clone, Deserialize)]
pub struct AgentConfig {
    /// Address the metrics endpoint listens on
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,
    #[serde(default = "default_metrics_path")]
    pub metrics_path: String,
    #[serde(default = "default_tick_interval")]
    pub tick_interval_secs: u64,
    /// Number of ticks to run; 0 runs until interrupted
    #[serde(default = "default_iterations")]
    pub iterations: u64,
    /// JSON threshold document handed to the plugin's `init`
    pub plugin_config_path: Option<String>,
}

fn default_listen_addr() -> String {
    "0.0.0.0:8999".to_string()
}

fn default_metrics_path() -> String {
    "/metrics".to_string()
}

fn default_tick_interval() -> u64 {
    10
}

fn default_iterations() -> u64 {
    12
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            listen_addr: default_listen_addr(),
            metrics_path: default_metrics_path(),
            tick_interval_secs: default_tick_interval(),
            iterations: default_iterations(),
            plugin_config_path: None,
        }
    }
}

impl AgentConfig {
    pub fn load(path: &str) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read agent config '{path}'"))?;
        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse agent config '{path}'"))?;
        config.validate()?;
        Ok(config)
    }

    /// Like [`load`](Self::load), but falls back to defaults when the file
    /// does not exist.
    pub fn load_or_default(path: &str) -> anyhow::Result<Self> {
        if Path::new(path).exists() {
            Self::load(path)
        } else {
            tracing::info!(path, "Agent config not found, using defaults");
            Ok(Self::default())
        }
    }

    fn validate(&self) -> anyhow::Result<()> {
        anyhow::ensure!(self.tick_interval_secs > 0, "tick_interval_secs must be at least 1");
        anyhow::ensure!(
            self.metrics_path.starts_with('/'),
            "metrics_path must start with '/', got '{}'",
            self.metrics_path
        );
        Ok(())
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_secs(self.tick_interval_secs)
    }

    /// Reads the plugin's threshold document, or returns the built-in one.
    pub fn plugin_config(&self) -> anyhow::Result<String> {
        match &self.plugin_config_path {
            Some(path) => std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read plugin config '{path}'")),
            None => Ok(DEFAULT_PLUGIN_CONFIG.to_string()),
        }
    }
}
