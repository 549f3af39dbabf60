//! Target Collaborator Contract
//!
//! Benchmark suites implement [`Target`] outside this subsystem. The
//! destination algorithm hands a target the fully captured output text of
//! one job; the target derives whatever key/value pairs it understands and
//! emits them through the provided [`ResultEmitter`]. This is the sole
//! path by which metadata records are populated; the core never invents
//! keys itself, only transports them.
//!
//! [`ResultEmitter`]: crate::ResultEmitter

use crate::context::ReportContext;
use crate::writer::{ResultEmitter, WriteError};

/// A benchmark suite known to the orchestration tool
pub trait Target: Send + Sync {
    /// Name of the target, used in the persisted directory layout
    fn name(&self) -> &str;

    /// Parse one job's raw output and emit its metadata record.
    ///
    /// `output` is the complete captured text of the job. Free-form text
    /// written to the emitter goes to the same destination as the block.
    fn report_result(
        &self,
        ctx: &ReportContext,
        output: &str,
        instance: &str,
        emitter: &mut ResultEmitter<'_>,
    ) -> Result<(), WriteError>;
}
