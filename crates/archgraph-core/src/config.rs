use std::{
    env,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use config as cfg;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing::info;

pub const ENV_PREFIX: &str = "ARCHGRAPH";

/// Thresholds used by the dependency analyzer.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct AnalysisConfig {
    /// A component with more outgoing dependencies than this is highly coupled.
    #[serde(default = "AnalysisConfig::default_coupling_threshold")]
    pub coupling_threshold: usize,
    /// A component with more incoming dependencies than this is central.
    #[serde(default = "AnalysisConfig::default_centrality_threshold")]
    pub centrality_threshold: usize,
}

impl AnalysisConfig {
    fn default_coupling_threshold() -> usize {
        5
    }

    fn default_centrality_threshold() -> usize {
        5
    }
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            coupling_threshold: Self::default_coupling_threshold(),
            centrality_threshold: Self::default_centrality_threshold(),
        }
    }
}

/// Which source supplies the edge description when both declare the same relationship.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum DescriptionPrecedence {
    #[default]
    Structural,
    Diagram,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct BuilderConfig {
    #[serde(default)]
    pub precedence: DescriptionPrecedence,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct DriftConfig {
    /// Treat warnings as failures.
    #[serde(default)]
    pub strict: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct CacheConfig {
    /// Entry lifetime in seconds. `None` keeps entries until invalidated.
    #[serde(default)]
    pub ttl_secs: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct LoggingConfig {
    #[serde(default = "LoggingConfig::default_level")]
    pub level: String,
}

impl LoggingConfig {
    fn default_level() -> String {
        "info".to_string()
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: Self::default_level(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct EngineConfig {
    #[serde(default)]
    pub analysis: AnalysisConfig,
    #[serde(default)]
    pub builder: BuilderConfig,
    #[serde(default)]
    pub drift: DriftConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl EngineConfig {
    pub fn validate(&self) -> Result<()> {
        anyhow::ensure!(
            !self.logging.level.trim().is_empty(),
            "logging.level cannot be empty"
        );
        anyhow::ensure!(
            self.analysis.coupling_threshold <= 10_000,
            "analysis.coupling_threshold must be <= 10000"
        );
        anyhow::ensure!(
            self.analysis.centrality_threshold <= 10_000,
            "analysis.centrality_threshold must be <= 10000"
        );
        if let Some(ttl) = self.cache.ttl_secs {
            anyhow::ensure!(ttl > 0, "cache.ttl_secs must be > 0 when set");
        }
        Ok(())
    }

    pub fn json_schema() -> schemars::Schema {
        schemars::schema_for!(EngineConfig)
    }
}

/// Layered configuration loading: files in a config directory, then environment.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Directories searched for configuration files, most specific first:
    /// `~/.archgraph`, then `./config`.
    pub fn search_dirs() -> Vec<PathBuf> {
        let cwd = env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
        dirs::home_dir()
            .map(|home| home.join(".archgraph"))
            .into_iter()
            .chain(std::iter::once(cwd.join("config")))
            .collect()
    }

    /// First existing directory in `candidates`, or `fallback` when none exist.
    pub fn locate_config_dir<I>(candidates: I, fallback: PathBuf) -> PathBuf
    where
        I: IntoIterator<Item = PathBuf>,
    {
        let dir = candidates
            .into_iter()
            .find(|dir| dir.is_dir())
            .unwrap_or(fallback);
        info!(dir = %dir.display(), "resolved config directory");
        dir
    }

    pub fn default_env() -> String {
        env::var("ARCHGRAPH_ENV")
            .ok()
            .or_else(|| env::var("APP_ENV").ok())
            .unwrap_or_else(|| "development".to_string())
    }

    pub fn load() -> Result<EngineConfig> {
        let cwd = env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
        let dir = Self::locate_config_dir(Self::search_dirs(), cwd);
        Self::load_from_dir(&dir, &Self::default_env())
    }

    pub fn load_from_dir(config_dir: &Path, env_name: &str) -> Result<EngineConfig> {
        let settings: EngineConfig = cfg::Config::builder()
            .add_source(cfg::File::from(config_dir.join("default.toml")).required(false))
            .add_source(cfg::File::from(config_dir.join("default.yaml")).required(false))
            .add_source(cfg::File::from(config_dir.join("default.json")).required(false))
            .add_source(
                cfg::File::from(config_dir.join(format!("{}.toml", env_name))).required(false),
            )
            .add_source(cfg::File::from(config_dir.join("local.toml")).required(false))
            .add_source(cfg::Environment::with_prefix(ENV_PREFIX).separator("__"))
            .build()
            .context("building configuration")?
            .try_deserialize()
            .context("deserializing configuration")?;
        settings.validate()?;
        Ok(settings)
    }
}
