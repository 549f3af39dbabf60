#![warn(missing_docs)]
//! SiftBench Report - Aggregation and Rendering
//!
//! Walks one or more run-root directories, discovers matching
//! target/instance subtrees, decodes each result file's embedded metadata,
//! and renders the aggregate through a pluggable set of output modes:
//! - brief (terse per-file summary)
//! - full (complete dump of every decoded record)
//! - csv (tabular export with a unioned column set)
//! - json (machine-readable)

mod aggregate;
mod render;

pub use aggregate::{AggregateError, Discovery, DiscoveryWarning, ReportEntry, collect, discover};
pub use render::{Render, RenderError, RendererRegistry};
