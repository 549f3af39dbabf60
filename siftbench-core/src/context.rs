//! Reporting Context
//!
//! The prefix token and run timestamp behave like tool-wide state, but they
//! are carried as explicit fields here so multiple runs (and tests) can
//! coexist in one process.

use chrono::{DateTime, Local};
use std::path::PathBuf;

/// Environment variable set for every command launched through the
/// reporting harness, so child processes can detect it.
pub const REPORT_ENV_MARKER: &str = "SIFT_REPORT";

/// Default prefix token tagging metadata lines inside result files.
///
/// Chosen for a low probability of colliding with ordinary benchmark
/// output; decoders treat any line starting with it as metadata.
pub const DEFAULT_PREFIX: &str = "[sift-report]";

/// Filesystem locations shared by one tool invocation
#[derive(Debug, Clone)]
pub struct ReportPaths {
    /// Root directory under which timestamped run directories are created
    pub results_root: PathBuf,
    /// Shared log receiving metadata of jobs without their own result file
    pub runlog: PathBuf,
}

/// Per-invocation reporting context passed to every operation
#[derive(Debug, Clone)]
pub struct ReportContext {
    /// Prefix token for metadata lines
    pub prefix: String,
    /// Reference timestamp naming this invocation's run directory
    pub timestamp: DateTime<Local>,
    /// Shared filesystem locations
    pub paths: ReportPaths,
}

impl ReportContext {
    /// Create a context rooted at `results_root` with the default prefix,
    /// the current local time, and a `commands.log` run log under the root.
    pub fn new(results_root: impl Into<PathBuf>) -> Self {
        let results_root = results_root.into();
        let runlog = results_root.join("commands.log");
        Self {
            prefix: DEFAULT_PREFIX.to_string(),
            timestamp: Local::now(),
            paths: ReportPaths {
                results_root,
                runlog,
            },
        }
    }

    /// Override the prefix token (mainly for tests and embedding tools)
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    /// Override the run timestamp
    pub fn with_timestamp(mut self, timestamp: DateTime<Local>) -> Self {
        self.timestamp = timestamp;
        self
    }
}
