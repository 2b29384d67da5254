/// Configuration management for the lineage graph store
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Every section and field falls back to its default, so a file only
/// needs the settings it changes.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub store: StoreSettings,
    pub traversal: TraversalSettings,
    pub queries: QuerySettings,
    pub metrics: MetricsSettings,
}

/// Descriptive connection labels reported by `get_status`.
/// The store always runs in memory; nothing connects to these.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreSettings {
    pub host: String,
    pub port: u16,
    pub database: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TraversalSettings {
    pub default_max_depth: usize,
    pub sovereignty_depth: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QuerySettings {
    pub default_limit: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricsSettings {
    /// Scalability contributed by each direct outgoing relationship
    pub link_weight: f64,
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 7687,
            database: "scrollverse".to_string(),
        }
    }
}

impl Default for TraversalSettings {
    fn default() -> Self {
        Self {
            default_max_depth: 5,
            sovereignty_depth: 10,
        }
    }
}

impl Default for QuerySettings {
    fn default() -> Self {
        Self { default_limit: 100 }
    }
}

impl Default for MetricsSettings {
    fn default() -> Self {
        Self { link_weight: 0.5 }
    }
}

impl Config {
    /// Load configuration from file
    pub async fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = tokio::fs::read_to_string(path).await?;
        let config: Config = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to file
    pub async fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = serde_yaml::to_string(self)?;
        tokio::fs::write(path, content).await?;
        Ok(())
    }

    /// Override fields from `LINEAGE_*` environment variables
    pub fn apply_env_overrides(&mut self) -> Result<()> {
        self.apply_env(|key| std::env::var(key).ok())
    }

    /// Override fields from a variable lookup
    fn apply_env<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(host) = lookup("LINEAGE_STORE_HOST") {
            self.store.host = host;
        }

        if let Some(port) = lookup("LINEAGE_STORE_PORT") {
            self.store.port = port.parse()?;
        }

        if let Some(database) = lookup("LINEAGE_STORE_DATABASE") {
            self.store.database = database;
        }

        if let Some(depth) = lookup("LINEAGE_TRAVERSAL_DEPTH") {
            self.traversal.default_max_depth = depth.parse()?;
        }

        if let Some(depth) = lookup("LINEAGE_SOVEREIGNTY_DEPTH") {
            self.traversal.sovereignty_depth = depth.parse()?;
        }

        if let Some(limit) = lookup("LINEAGE_QUERY_LIMIT") {
            self.queries.default_limit = limit.parse()?;
        }

        if let Some(weight) = lookup("LINEAGE_LINK_WEIGHT") {
            self.metrics.link_weight = weight.parse()?;
        }

        Ok(())
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.store.database.is_empty() {
            return Err(anyhow::anyhow!("Database name must not be empty"));
        }

        if self.traversal.sovereignty_depth == 0 {
            return Err(anyhow::anyhow!("Sovereignty traversal depth must be greater than 0"));
        }

        if self.queries.default_limit == 0 {
            return Err(anyhow::anyhow!("Default query limit must be greater than 0"));
        }

        if !self.metrics.link_weight.is_finite() || self.metrics.link_weight <= 0.0 {
            return Err(anyhow::anyhow!("Link weight must be a positive number"));
        }

        Ok(())
    }
}
