//! Result Aggregation
//!
//! Read-only discovery and collection over run directory trees produced by
//! prior (possibly long-gone) writer processes. Both operations are
//! stateless and safe to run concurrently with each other; aggregating
//! while a flush is still in flight is an accepted race and callers should
//! only aggregate after all writers finished.

use serde::Serialize;
use siftbench_core::{MetadataRecord, ReportContext, decode};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::warn;

/// Errors raised during collection
#[derive(Debug, Error)]
pub enum AggregateError {
    /// Reading an existing directory or file failed; no retries
    #[error("failed to read {path}: {source}")]
    Io {
        /// The path that failed
        path: PathBuf,
        /// Underlying error
        source: std::io::Error,
    },
}

/// Non-fatal notice that a run root holds nothing for the target
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveryWarning {
    /// The run root that was skipped
    pub run_root: PathBuf,
    /// The target that had no subdirectory there
    pub target: String,
}

impl std::fmt::Display for DiscoveryWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "run directory {} contains no results for target {}",
            self.run_root.display(),
            self.target
        )
    }
}

/// Outcome of a discovery pass
#[derive(Debug, Default)]
pub struct Discovery {
    /// Qualifying instance directories, in per-root listing order.
    /// Cross-root ordering is not guaranteed and must not be relied on.
    pub instance_dirs: Vec<PathBuf>,
    /// One warning per run root lacking the target subdirectory
    pub warnings: Vec<DiscoveryWarning>,
}

/// One decoded result file.
///
/// Transient: produced during a reporting pass, never persisted.
#[derive(Debug, Serialize)]
pub struct ReportEntry {
    /// Source result file
    pub path: PathBuf,
    /// Decoded metadata; may be empty
    pub metadata: MetadataRecord,
}

/// Find instance directories for `target` under each run root.
///
/// A root without a `target` subdirectory contributes nothing and yields
/// a warning; aggregation across many roots tolerates some empty roots.
/// An instance directory qualifies when `instance_filter` is empty or
/// contains its name.
pub fn discover(
    run_roots: &[PathBuf],
    target: &str,
    instance_filter: &[String],
) -> Result<Discovery, AggregateError> {
    let mut discovery = Discovery::default();

    for run_root in run_roots {
        let target_dir = run_root.join(target);
        if !target_dir.exists() {
            let warning = DiscoveryWarning {
                run_root: run_root.clone(),
                target: target.to_string(),
            };
            warn!("{}", warning);
            discovery.warnings.push(warning);
            continue;
        }

        for entry in read_dir_sorted(&target_dir)? {
            if !entry.is_dir() {
                continue;
            }
            if instance_filter.is_empty() || contains_name(instance_filter, &entry) {
                discovery.instance_dirs.push(entry);
            }
        }
    }

    Ok(discovery)
}

/// Decode every regular file directly inside each instance directory
/// (non-recursive) into one entry per file, empty records included.
pub fn collect(
    ctx: &ReportContext,
    instance_dirs: &[PathBuf],
) -> Result<Vec<ReportEntry>, AggregateError> {
    let mut entries = Vec::new();

    for dir in instance_dirs {
        for path in read_dir_sorted(dir)? {
            if !path.is_file() {
                continue;
            }
            let text = std::fs::read_to_string(&path).map_err(|source| AggregateError::Io {
                path: path.clone(),
                source,
            })?;
            let decoded = decode(&ctx.prefix, &text, &path.display().to_string());
            entries.push(ReportEntry {
                path,
                metadata: decoded.record,
            });
        }
    }

    Ok(entries)
}

/// List a directory's immediate children in name order, for deterministic
/// per-root output.
fn read_dir_sorted(dir: &Path) -> Result<Vec<PathBuf>, AggregateError> {
    let io_err = |source| AggregateError::Io {
        path: dir.to_path_buf(),
        source,
    };

    let mut children = Vec::new();
    for entry in std::fs::read_dir(dir).map_err(io_err)? {
        children.push(entry.map_err(io_err)?.path());
    }
    children.sort();
    Ok(children)
}

fn contains_name(filter: &[String], path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|name| filter.iter().any(|f| f == name))
}
