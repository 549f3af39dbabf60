#![warn(missing_docs)]
//! SiftBench Core - Result Reporting Primitives
//!
//! This crate provides the reporting machinery shared by the whole tool:
//! - `MetadataRecord` and the line-oriented metadata codec
//! - `ReportContext` carrying the prefix token, run timestamp and paths
//! - Run directory naming and creation
//! - `ResultWriter` driving one command execution and guaranteeing a
//!   single metadata flush per completed job
//! - The `JobPool` and `Target` collaborator traits

mod codec;
mod context;
mod exec;
mod pool;
mod record;
mod rundir;
mod target;
mod writer;

pub use codec::{CodecError, DecodeWarning, Decoded, decode, encode, encode_to_string};
pub use context::{DEFAULT_PREFIX, REPORT_ENV_MARKER, ReportContext, ReportPaths};
pub use exec::{ExecError, run_command};
pub use pool::{ExecOptions, Job, JobId, JobPool, OnComplete, PoolError, RunAnnotation};
pub use record::MetadataRecord;
pub use rundir::{create_run_dir, run_dir_name};
pub use target::Target;
pub use writer::{ResultEmitter, ResultWriter, WriteError};
