//! Run Directory Naming
//!
//! Deterministic, idempotent computation of a run's output directory:
//! `<results_root>/run-<YYYY-MM-DD>.<HH:MM:SS>/<target>/<instance>`.
//! The layout is part of the persisted interface and must not change.

use crate::context::ReportContext;
use chrono::{DateTime, Local};
use std::path::PathBuf;

/// Name of the run directory for the given reference timestamp
pub fn run_dir_name(timestamp: &DateTime<Local>) -> String {
    timestamp.format("run-%Y-%m-%d.%H:%M:%S").to_string()
}

/// Compute `<results_root>/<run dir>/<target>/<instance>` and create all
/// intermediate directories.
///
/// Idempotent: repeated calls with identical inputs succeed. The only
/// failure mode is an underlying storage failure.
pub fn create_run_dir(
    ctx: &ReportContext,
    target: &str,
    instance: &str,
) -> std::io::Result<PathBuf> {
    let path = ctx
        .paths
        .results_root
        .join(run_dir_name(&ctx.timestamp))
        .join(target)
        .join(instance);
    std::fs::create_dir_all(&path)?;
    Ok(path)
}
