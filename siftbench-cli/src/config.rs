//! Configuration loading from sift.toml
//!
//! Siftbench configuration can be specified in a `sift.toml` file in the
//! project root. The configuration is automatically discovered by walking
//! up from the current directory.

use serde::{Deserialize, Serialize};
use siftbench_core::DEFAULT_PREFIX;
use std::path::Path;

/// Siftbench configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct SiftConfig {
    /// Result file layout configuration
    #[serde(default)]
    pub paths: PathsConfig,
    /// Reporting configuration
    #[serde(default)]
    pub report: ReportConfig,
}

/// Where results live on disk
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathsConfig {
    /// Root directory that holds the run directories
    #[serde(default = "default_results_root")]
    pub results_root: String,
    /// Shared command log file name, relative to the results root
    #[serde(default = "default_runlog")]
    pub runlog: String,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            results_root: default_results_root(),
            runlog: default_runlog(),
        }
    }
}

fn default_results_root() -> String {
    "results".to_string()
}
fn default_runlog() -> String {
    "commands.log".to_string()
}

/// Reporting configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    /// Metadata line prefix tag
    #[serde(default = "default_prefix")]
    pub prefix: String,
    /// Default rendering mode: "brief", "full", "csv", "json"
    #[serde(default = "default_mode")]
    pub mode: String,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            prefix: default_prefix(),
            mode: default_mode(),
        }
    }
}

fn default_prefix() -> String {
    DEFAULT_PREFIX.to_string()
}
fn default_mode() -> String {
    "brief".to_string()
}

impl SiftConfig {
    /// Load configuration from a TOML file
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }

    /// Try to discover and load configuration by walking up from current directory
    pub fn discover() -> Option<Self> {
        let mut dir = std::env::current_dir().ok()?;
        loop {
            let config_path = dir.join("sift.toml");
            if config_path.exists() {
                return Self::load(&config_path).ok();
            }
            if !dir.pop() {
                break;
            }
        }
        None
    }

    /// Generate a default configuration as TOML string
    pub fn default_toml() -> String {
        r#"# Siftbench Configuration

[paths]
# Root directory that holds the run directories
results_root = "results"
# Shared command log, relative to the results root
runlog = "commands.log"

[report]
# Tag prepended to every metadata line in command output
prefix = "[sift-report]"
# Default rendering mode: brief, full, csv, json
mode = "brief"
"#
        .to_string()
    }
}
