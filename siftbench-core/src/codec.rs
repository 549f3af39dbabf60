//! Metadata Codec
//!
//! Reversible encoding of a [`MetadataRecord`] into prefixed text lines,
//! and decoding of records back out of result files that mix raw command
//! output with a metadata block.
//!
//! Wire format, one line each:
//!
//! ```text
//! <prefix> begin
//! <prefix> <key>: <value>
//! ...
//! <prefix> end
//! ```
//!
//! Any line not starting with the prefix token is ordinary output and is
//! ignored by the decoder. Decoding deliberately does not require the
//! begin/end markers: it harvests every qualifying line anywhere in the
//! text. A known limitation of this embedded-protocol design is that
//! benchmark stdout which coincidentally produces a prefix-matching line
//! is misread as metadata.

use crate::record::MetadataRecord;
use std::io::Write;
use thiserror::Error;
use tracing::warn;

/// Marker line content opening a metadata block
pub(crate) const BEGIN_MARKER: &str = "begin";
/// Marker line content closing a metadata block
pub(crate) const END_MARKER: &str = "end";

/// Errors raised while encoding a metadata block
#[derive(Debug, Error)]
pub enum CodecError {
    /// Keys containing `": "` would be ambiguous to split on decode
    #[error("metadata key {key:?} contains the reserved separator \": \"")]
    KeySeparator {
        /// The offending key
        key: String,
    },

    /// Values must stay on one line
    #[error("metadata value for key {key:?} contains a newline")]
    ValueNewline {
        /// The key whose value is invalid
        key: String,
    },

    /// Underlying sink failure
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Non-fatal duplicate-key notice produced while decoding.
///
/// Input text is uncontrolled benchmark output, so duplicates are
/// tolerated; the later value wins.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodeWarning {
    /// Where the duplicate was seen (typically a file path)
    pub source: String,
    /// The duplicated key
    pub key: String,
}

impl std::fmt::Display for DecodeWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "duplicate metadata entry for {:?} in {}, using the last one",
            self.key, self.source
        )
    }
}

/// Result of a decoding pass
#[derive(Debug, Default)]
pub struct Decoded {
    /// The harvested record; empty means "no metadata", which is valid
    pub record: MetadataRecord,
    /// One warning per duplicated key occurrence
    pub warnings: Vec<DecodeWarning>,
}

/// Encode a record as a metadata block onto `out`.
///
/// Fails fast on wire-format violations rather than emitting lines a
/// decoder could not split back apart.
pub fn encode(prefix: &str, record: &MetadataRecord, out: &mut dyn Write) -> Result<(), CodecError> {
    for (key, value) in record.iter() {
        if key.contains(": ") {
            return Err(CodecError::KeySeparator {
                key: key.to_string(),
            });
        }
        if value.contains('\n') {
            return Err(CodecError::ValueNewline {
                key: key.to_string(),
            });
        }
    }

    writeln!(out, "{} {}", prefix, BEGIN_MARKER)?;
    for (key, value) in record.iter() {
        writeln!(out, "{} {}: {}", prefix, key, value)?;
    }
    writeln!(out, "{} {}", prefix, END_MARKER)?;
    Ok(())
}

/// Encode a record into a freshly allocated string
pub fn encode_to_string(prefix: &str, record: &MetadataRecord) -> Result<String, CodecError> {
    let mut buf = Vec::new();
    encode(prefix, record, &mut buf)?;
    // encode only writes UTF-8 it was given
    String::from_utf8(buf).map_err(|e| CodecError::Io(std::io::Error::other(e)))
}

/// Scan `text` for prefix-tagged lines and harvest them into a record.
///
/// `source` names the origin of the text in duplicate warnings. Every
/// line is considered; begin/end markers and prefixed lines without a
/// `": "` separator are skipped as non-records.
pub fn decode(prefix: &str, text: &str, source: &str) -> Decoded {
    let mut decoded = Decoded::default();

    for line in text.lines() {
        let line = line.trim_end();
        let Some(rest) = line
            .strip_prefix(prefix)
            .and_then(|r| r.strip_prefix(' '))
        else {
            continue;
        };

        if rest == BEGIN_MARKER || rest == END_MARKER {
            continue;
        }

        let Some((key, value)) = rest.split_once(": ") else {
            continue;
        };

        if decoded.record.contains_key(key) {
            let warning = DecodeWarning {
                source: source.to_string(),
                key: key.to_string(),
            };
            warn!("{}", warning);
            decoded.warnings.push(warning);
        }
        decoded.record.set(key, value);
    }

    decoded
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roundtrip() {
        let record: MetadataRecord = [
            ("target", "spec2006"),
            ("instance", "clang-lto"),
            ("runtime", "42.7"),
            ("status", "success"),
        ]
        .into_iter()
        .collect();

        let text = encode_to_string("[sift-report]", &record).unwrap();
        let decoded = decode("[sift-report]", &text, "<test>");

        assert_eq!(decoded.record, record);
        assert!(decoded.warnings.is_empty());
    }

    #[test]
    fn harvests_lines_interleaved_with_noise() {
        let text = "\
starting benchmark...
[sift-report] begin
[sift-report] a: 1
some raw output line
[sift-report] b: 2
[sift-report] a: 3
[sift-report] end
done.
";
        let decoded = decode("[sift-report]", text, "job.out");

        assert_eq!(decoded.record.get("a"), Some("3"));
        assert_eq!(decoded.record.get("b"), Some("2"));
        assert_eq!(decoded.record.len(), 2);
        assert_eq!(decoded.warnings.len(), 1);
        assert_eq!(decoded.warnings[0].key, "a");
        assert_eq!(decoded.warnings[0].source, "job.out");
    }

    #[test]
    fn no_qualifying_lines_is_empty_not_an_error() {
        let decoded = decode("[sift-report]", "plain output\nmore output\n", "empty.out");
        assert!(decoded.record.is_empty());
        assert!(decoded.warnings.is_empty());
    }

    #[test]
    fn markers_and_malformed_prefixed_lines_are_skipped() {
        let text = "\
[sift-report] begin
[sift-report] not-a-record-line
[sift-report] k: v
[sift-report] end
";
        let decoded = decode("[sift-report]", text, "<test>");
        assert_eq!(decoded.record.len(), 1);
        assert_eq!(decoded.record.get("k"), Some("v"));
    }

    #[test]
    fn values_may_contain_colons_and_separator() {
        let record: MetadataRecord = [("cmd", "ls: -la: /tmp")].into_iter().collect();
        let text = encode_to_string("[sift-report]", &record).unwrap();
        let decoded = decode("[sift-report]", &text, "<test>");
        assert_eq!(decoded.record.get("cmd"), Some("ls: -la: /tmp"));
    }

    #[test]
    fn encode_rejects_separator_in_key() {
        let record: MetadataRecord = [("bad: key", "v")].into_iter().collect();
        let err = encode_to_string("[sift-report]", &record).unwrap_err();
        assert!(matches!(err, CodecError::KeySeparator { key } if key == "bad: key"));
    }

    #[test]
    fn encode_rejects_newline_in_value() {
        let record: MetadataRecord = [("k", "line1\nline2")].into_iter().collect();
        let err = encode_to_string("[sift-report]", &record).unwrap_err();
        assert!(matches!(err, CodecError::ValueNewline { key } if key == "k"));
    }

    #[test]
    fn prefix_must_be_followed_by_a_space() {
        let decoded = decode("[sift-report]", "[sift-report]x: y\n", "<test>");
        assert!(decoded.record.is_empty());
    }

    // Preserved limitation: coincidental prefix-matching stdout is
    // harvested as metadata, markers or not.
    #[test]
    fn stray_prefixed_line_outside_markers_is_harvested() {
        let decoded = decode("[sift-report]", "[sift-report] stray: value\n", "<test>");
        assert_eq!(decoded.record.get("stray"), Some("value"));
    }
}
