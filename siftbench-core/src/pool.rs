//! Job Pool Contract
//!
//! The concrete parallel scheduler lives outside this subsystem; only its
//! contract is consumed here. A pool may run many jobs concurrently across
//! independent workers or machines. It guarantees the completion
//! continuation fires exactly once per job, after the job's process exited
//! and, when an output file was declared, after that file's content is
//! fully flushed.

use crate::context::ReportContext;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;

/// Identity of one scheduled unit of work within a pool
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct JobId(pub u64);

/// Back-reference stored on a completed job by the [`ResultWriter`] that
/// launched it, so caller continuations can tell jobs apart.
///
/// [`ResultWriter`]: crate::ResultWriter
#[derive(Debug, Clone)]
pub struct RunAnnotation {
    /// Target the job belongs to
    pub target: String,
    /// Instance the job belongs to
    pub instance: String,
    /// Declared result file of the launching writer
    pub outfile: PathBuf,
}

/// A completed (or completing) execution job as reported by a pool.
///
/// Exactly one of `outfile` and live-tee `stdout` is meaningful per job;
/// both may be absent, in which case metadata lands in the shared run log.
#[derive(Debug, Default)]
pub struct Job {
    /// Declared output file the pool wrote the command's output to
    pub outfile: Option<PathBuf>,
    /// Captured standard output, when no output file was declared
    pub stdout: Option<String>,
    /// Whether stdout was teed live to the invoking terminal
    pub teeout: bool,
    /// Extension slot filled by the launching writer
    pub annotation: Option<RunAnnotation>,
}

/// Completion continuation invoked exactly once per job.
///
/// Runs on whatever worker the pool completes the job on, so it must be
/// shareable and sendable.
pub type OnComplete = Arc<dyn Fn(&mut Job) + Send + Sync>;

/// Errors surfaced by a pool on submission
#[derive(Debug, Error)]
pub enum PoolError {
    /// The pool rejected or failed to schedule the command
    #[error("job submission failed: {0}")]
    Submit(String),
}

/// Execution options shared by the synchronous and delegated regimes
#[derive(Debug, Clone, Default)]
pub struct ExecOptions {
    /// Tee captured stdout live to the invoking terminal
    pub teeout: bool,
    /// Working directory for the command
    pub cwd: Option<PathBuf>,
    /// Additional environment entries for the command
    pub env: Vec<(String, String)>,
}

/// External job scheduler contract.
///
/// One submission may fan out to several jobs (for example one per
/// node or iteration); `submit` returns the identities of all of them.
pub trait JobPool {
    /// Schedule `command` with the given environment, writing its output
    /// to `outfile`, and invoke `on_complete` exactly once per job after
    /// process exit and output flush.
    fn submit(
        &self,
        ctx: &ReportContext,
        command: &[String],
        env: &[(String, String)],
        outfile: &Path,
        on_complete: OnComplete,
        options: &ExecOptions,
    ) -> Result<Vec<JobId>, PoolError>;
}
