//! Report Rendering
//!
//! Dispatches by name to one of an extensible set of rendering modes.
//! The registry is an explicit map from mode name to renderer, with an
//! explicit unknown-mode error path. All renderer output goes to the
//! caller's sink and nowhere else.

use crate::aggregate::ReportEntry;
use std::collections::BTreeMap;
use std::io::Write;
use thiserror::Error;

/// Errors raised while rendering aggregated entries
#[derive(Debug, Error)]
pub enum RenderError {
    /// Configuration error: the requested mode is not registered
    #[error("unknown reporting mode {mode:?}")]
    UnknownMode {
        /// The unrecognized mode name
        mode: String,
    },

    /// Sink failure
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization failure
    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

/// One rendering mode
pub trait Render {
    /// Render `entries` onto `out`
    fn render(&self, entries: &[ReportEntry], out: &mut dyn Write) -> Result<(), RenderError>;
}

/// Explicit name-to-renderer mapping.
///
/// `default()` seeds the built-in modes (`brief`, `full`, `csv`, `json`);
/// embedding tools can register additional ones.
pub struct RendererRegistry {
    modes: BTreeMap<String, Box<dyn Render>>,
}

impl Default for RendererRegistry {
    fn default() -> Self {
        let mut registry = Self {
            modes: BTreeMap::new(),
        };
        registry.register("brief", Box::new(BriefRenderer));
        registry.register("full", Box::new(FullRenderer));
        registry.register("csv", Box::new(CsvRenderer));
        registry.register("json", Box::new(JsonRenderer));
        registry
    }
}

impl RendererRegistry {
    /// Register (or replace) a mode
    pub fn register(&mut self, name: impl Into<String>, renderer: Box<dyn Render>) {
        self.modes.insert(name.into(), renderer);
    }

    /// Registered mode names, sorted
    pub fn mode_names(&self) -> Vec<&str> {
        self.modes.keys().map(|k| k.as_str()).collect()
    }

    /// Render `entries` with the named mode onto `out`.
    ///
    /// An unrecognized name is a configuration error, surfaced
    /// immediately and non-retryable.
    pub fn render(
        &self,
        mode: &str,
        entries: &[ReportEntry],
        out: &mut dyn Write,
    ) -> Result<(), RenderError> {
        let renderer = self.modes.get(mode).ok_or_else(|| RenderError::UnknownMode {
            mode: mode.to_string(),
        })?;
        renderer.render(entries, out)
    }
}

/// Terse summary: one line per result file
struct BriefRenderer;

impl Render for BriefRenderer {
    fn render(&self, entries: &[ReportEntry], out: &mut dyn Write) -> Result<(), RenderError> {
        for entry in entries {
            if entry.metadata.is_empty() {
                writeln!(out, "{}: no metadata", entry.path.display())?;
            } else {
                writeln!(
                    out,
                    "{}: {} entries",
                    entry.path.display(),
                    entry.metadata.len()
                )?;
            }
        }
        Ok(())
    }
}

/// Complete dump of every decoded record
struct FullRenderer;

impl Render for FullRenderer {
    fn render(&self, entries: &[ReportEntry], out: &mut dyn Write) -> Result<(), RenderError> {
        for entry in entries {
            writeln!(out, "file: {}", entry.path.display())?;
            for (key, value) in entry.metadata.iter() {
                writeln!(out, "  {}: {}", key, value)?;
            }
        }
        Ok(())
    }
}

/// Tabular export over the union of all keys
struct CsvRenderer;

impl Render for CsvRenderer {
    fn render(&self, entries: &[ReportEntry], out: &mut dyn Write) -> Result<(), RenderError> {
        // Union of keys across entries, in first-seen order
        let mut columns: Vec<&str> = Vec::new();
        for entry in entries {
            for (key, _) in entry.metadata.iter() {
                if !columns.contains(&key) {
                    columns.push(key);
                }
            }
        }

        write!(out, "file")?;
        for column in &columns {
            write!(out, ",{}", csv_escape(column))?;
        }
        writeln!(out)?;

        for entry in entries {
            write!(out, "{}", csv_escape(&entry.path.display().to_string()))?;
            for column in &columns {
                write!(
                    out,
                    ",{}",
                    csv_escape(entry.metadata.get(column).unwrap_or(""))
                )?;
            }
            writeln!(out)?;
        }
        Ok(())
    }
}

fn csv_escape(field: &str) -> String {
    if field.contains(',') || field.contains('"') || field.contains('\n') {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

/// Machine-readable JSON array of entries
struct JsonRenderer;

impl Render for JsonRenderer {
    fn render(&self, entries: &[ReportEntry], out: &mut dyn Write) -> Result<(), RenderError> {
        let json = serde_json::to_string_pretty(entries)?;
        writeln!(out, "{}", json)?;
        Ok(())
    }
}
