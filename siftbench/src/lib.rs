#![warn(missing_docs)]
//! # Siftbench
//!
//! Result reporting for benchmark harnesses: capture tagged metadata from
//! command output, file it into timestamped run directories, and aggregate
//! it back into reports.
//!
//! - **Tagged metadata**: benchmarked commands print `<prefix> key: value`
//!   lines anywhere in their output; the codec sifts them out later
//! - **Run directories**: one timestamped directory per run, one result
//!   file per target/instance/benchmark
//! - **Three destinations**: a declared result file, live stdout when
//!   teeing, or the shared command log as the fallback
//! - **Aggregation**: discover run directories, decode result files, and
//!   render with a pluggable set of modes (`brief`, `full`, `csv`, `json`)
//!
//! ## Quick Start
//!
//! ```ignore
//! use siftbench::prelude::*;
//!
//! let ctx = ReportContext::new("results");
//! let writer = ResultWriter::new(&ctx, my_target, "baseline", "600.perlbench")?;
//! writer.execute(&ctx, &command, None, None, &ExecOptions::default())?;
//! ```

// Re-export core types
pub use siftbench_core::{
    CodecError, DEFAULT_PREFIX, DecodeWarning, Decoded, ExecError, ExecOptions, Job, JobId,
    JobPool, MetadataRecord, OnComplete, PoolError, REPORT_ENV_MARKER, ReportContext, ReportPaths,
    ResultEmitter, ResultWriter, RunAnnotation, Target, WriteError, create_run_dir, decode, encode,
    encode_to_string, run_command, run_dir_name,
};

// Re-export aggregation and rendering
pub use siftbench_report::{
    AggregateError, Discovery, DiscoveryWarning, Render, RenderError, RendererRegistry,
    ReportEntry, collect, discover,
};

// Re-export the CLI entry point and configuration
pub use siftbench_cli::{Cli, SiftConfig, run, run_with_cli};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::{
        ExecOptions, MetadataRecord, RendererRegistry, ReportContext, ResultEmitter, ResultWriter,
        Target, collect, discover,
    };
}
