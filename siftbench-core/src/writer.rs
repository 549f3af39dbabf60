//! Result Writer
//!
//! Drives one job's execution, directly or delegated to an external pool,
//! and guarantees a metadata block is appended to exactly one destination,
//! exactly once, after completion.
//!
//! Destination selection is a pure function of two immutable job
//! attributes:
//!
//! 1. Declared output file present → block is appended to that file.
//! 2. Live-tee flag set → block goes inline onto the live output stream.
//! 3. Otherwise → block is appended to the shared run log.
//!
//! Run-log appends from concurrently completing jobs rely on the storage
//! layer's atomic-append guarantee: each flush stages the whole block in
//! memory and writes it with a single `write_all` on an append-mode
//! handle.

use crate::codec::{self, CodecError};
use crate::context::{REPORT_ENV_MARKER, ReportContext};
use crate::exec::{self, ExecError};
use crate::pool::{ExecOptions, Job, JobPool, OnComplete, PoolError, RunAnnotation};
use crate::record::MetadataRecord;
use crate::rundir;
use crate::target::Target;
use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

/// Errors raised while placing, running, or flushing a job
#[derive(Debug, Error)]
pub enum WriteError {
    /// The run directory could not be created
    #[error("failed to create run directory {path}: {source}")]
    RunDir {
        /// Directory that could not be created
        path: PathBuf,
        /// Underlying storage failure
        source: io::Error,
    },

    /// A declared result file could not be reopened during flush.
    /// Fatal: metadata must never be silently dropped.
    #[error("failed to reopen result file {path}: {source}")]
    ResultFile {
        /// The declared result file
        path: PathBuf,
        /// Underlying storage failure
        source: io::Error,
    },

    /// The shared run log could not be appended to
    #[error("failed to append to run log {path}: {source}")]
    RunLog {
        /// The shared run log
        path: PathBuf,
        /// Underlying storage failure
        source: io::Error,
    },

    /// The metadata block violated the wire format
    #[error(transparent)]
    Codec(#[from] CodecError),

    /// Synchronous execution failed
    #[error(transparent)]
    Exec(#[from] ExecError),

    /// The pool rejected the submission
    #[error(transparent)]
    Pool(#[from] PoolError),

    /// Other I/O failure, e.g. writing to the live output stream
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Sink handed to [`Target::report_result`] for emitting the metadata
/// block of one job.
///
/// `emit` writes the block; the emitter also implements [`io::Write`] so
/// targets can interleave free-form text, which lands at the same
/// destination as the block.
pub struct ResultEmitter<'a> {
    prefix: &'a str,
    target: &'a str,
    instance: &'a str,
    sink: &'a mut dyn Write,
}

impl<'a> ResultEmitter<'a> {
    /// Create an emitter writing to `sink`
    pub fn new(
        ctx: &'a ReportContext,
        target: &'a str,
        instance: &'a str,
        sink: &'a mut dyn Write,
    ) -> Self {
        Self {
            prefix: &ctx.prefix,
            target,
            instance,
            sink,
        }
    }

    /// Emit the metadata block for `record`.
    ///
    /// `target` and `instance` entries are injected at the head of the
    /// block, so every record produced through this path carries them.
    pub fn emit(&mut self, record: &MetadataRecord) -> Result<(), CodecError> {
        let mut full = MetadataRecord::new();
        full.set("target", self.target);
        full.set("instance", self.instance);
        for (key, value) in record.iter() {
            full.set(key, value);
        }
        codec::encode(self.prefix, &full, self.sink)
    }
}

impl Write for ResultEmitter<'_> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.sink.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.sink.flush()
    }
}

/// Where a completed job's metadata block goes
#[derive(Debug, PartialEq, Eq)]
enum Destination<'a> {
    ResultFile(&'a Path),
    LiveStdout,
    RunLog,
}

/// Pure destination selection from the job's two immutable attributes
fn select_destination(job: &Job) -> Destination<'_> {
    match (&job.outfile, job.teeout) {
        (Some(path), _) => Destination::ResultFile(path),
        (None, true) => Destination::LiveStdout,
        (None, false) => Destination::RunLog,
    }
}

/// Drives one command execution and flushes its metadata once complete.
///
/// Cloning is cheap; clones share the target collaborator and are used to
/// move the writer into pool completion continuations.
#[derive(Clone)]
pub struct ResultWriter {
    target: Arc<dyn Target>,
    instance: String,
    outfile: PathBuf,
}

impl ResultWriter {
    /// Resolve the run directory for `target`/`instance` and store the
    /// absolute output path `<run dir>/<filename>`.
    pub fn new(
        ctx: &ReportContext,
        target: Arc<dyn Target>,
        instance: &str,
        filename: &str,
    ) -> Result<Self, WriteError> {
        let dir = rundir::create_run_dir(ctx, target.name(), instance).map_err(|source| {
            WriteError::RunDir {
                path: ctx.paths.results_root.clone(),
                source,
            }
        })?;
        Ok(Self {
            outfile: dir.join(filename),
            target,
            instance: instance.to_string(),
        })
    }

    /// Absolute path of this writer's declared result file
    pub fn outfile(&self) -> &Path {
        &self.outfile
    }

    /// Run `command`, directly or via `pool`, and flush a metadata block
    /// exactly once per completed job.
    ///
    /// With a pool, the command is submitted with the stored output path
    /// pre-declared and the `SIFT_REPORT=1` environment marker; for every
    /// job the pool reports complete, a wrapping continuation annotates
    /// the job, performs the flush, and then invokes `on_success`, so the
    /// caller always observes flushed, complete output. Without a pool the
    /// command runs synchronously and the flush happens inline.
    pub fn execute(
        &self,
        ctx: &ReportContext,
        command: &[String],
        pool: Option<&dyn JobPool>,
        on_success: Option<OnComplete>,
        options: &ExecOptions,
    ) -> Result<(), WriteError> {
        let env = [(REPORT_ENV_MARKER.to_string(), "1".to_string())];

        match pool {
            Some(pool) => {
                let writer = self.clone();
                let flush_ctx = ctx.clone();
                let wrapped: OnComplete = Arc::new(move |job: &mut Job| {
                    job.annotation = Some(writer.annotation());
                    // Completion continuations have no error channel and
                    // metadata must never be silently dropped: a failing
                    // flush aborts the run.
                    if let Err(e) = writer.flush(&flush_ctx, job) {
                        panic!("aborting run: {}", e);
                    }
                    if let Some(on_success) = &on_success {
                        on_success(job);
                    }
                });
                pool.submit(ctx, command, &env, &self.outfile, wrapped, options)?;
            }
            None => {
                let mut job = exec::run_command(ctx, command, &env, options)?;
                job.annotation = Some(self.annotation());
                self.flush(ctx, &job)?;
                if let Some(on_success) = on_success {
                    on_success(&mut job);
                }
            }
        }
        Ok(())
    }

    /// Append this job's metadata block to its resolved destination.
    ///
    /// Executed exactly once per completed job. The block is staged in
    /// memory and written with a single append so concurrent flushes to
    /// the shared run log never interleave partial lines.
    pub fn flush(&self, ctx: &ReportContext, job: &Job) -> Result<(), WriteError> {
        match select_destination(job) {
            Destination::ResultFile(path) => {
                debug!("appending metadata to {}", path.display());
                // Scoped read; the handle is released before the append.
                let output =
                    std::fs::read_to_string(path).map_err(|source| WriteError::ResultFile {
                        path: path.to_path_buf(),
                        source,
                    })?;
                let staged = self.staged_block(ctx, &output)?;
                let mut file = OpenOptions::new().append(true).open(path).map_err(
                    |source| WriteError::ResultFile {
                        path: path.to_path_buf(),
                        source,
                    },
                )?;
                file.write_all(&staged)
                    .map_err(|source| WriteError::ResultFile {
                        path: path.to_path_buf(),
                        source,
                    })?;
            }
            Destination::LiveStdout => {
                let staged = self.staged_block(ctx, job.stdout.as_deref().unwrap_or(""))?;
                io::stdout().lock().write_all(&staged)?;
            }
            Destination::RunLog => {
                let staged = self.staged_block(ctx, job.stdout.as_deref().unwrap_or(""))?;
                let runlog = &ctx.paths.runlog;
                let mut file = OpenOptions::new()
                    .create(true)
                    .append(true)
                    .open(runlog)
                    .map_err(|source| WriteError::RunLog {
                        path: runlog.clone(),
                        source,
                    })?;
                file.write_all(&staged)
                    .map_err(|source| WriteError::RunLog {
                        path: runlog.clone(),
                        source,
                    })?;
            }
        }
        Ok(())
    }

    /// Run the target's parser over `output`, collecting everything it
    /// writes into one in-memory buffer.
    fn staged_block(&self, ctx: &ReportContext, output: &str) -> Result<Vec<u8>, WriteError> {
        let mut staged = Vec::new();
        let name = self.target.name().to_string();
        let mut emitter = ResultEmitter::new(ctx, &name, &self.instance, &mut staged);
        self.target
            .report_result(ctx, output, &self.instance, &mut emitter)?;
        Ok(staged)
    }

    fn annotation(&self) -> RunAnnotation {
        RunAnnotation {
            target: self.target.name().to_string(),
            instance: self.instance.clone(),
            outfile: self.outfile.clone(),
        }
    }
}
