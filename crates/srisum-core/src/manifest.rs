//! Manifest decoding: one `<integrity-text> <target>` pair per line.

use std::io;

use thiserror::Error;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};

use crate::algorithm::Algorithm;
use crate::integrity::Integrity;
use crate::parse::{parse, ParseOptions};
use crate::target::{Target, TargetError};

/// The manifest stream itself failed; fatal for that manifest.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("{name}: {source}")]
    Open { name: String, source: TargetError },

    #[error("{name}: {source}")]
    Read { name: String, source: TargetError },

    #[error("{name}: manifest task failed")]
    Task { name: String },
}

/// A line split into its integrity text and target token, before parsing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawLine {
    Pair { integrity: String, target: String },
    Malformed,
}

/// A decoded and parsed manifest line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ManifestLine {
    Check { expected: Integrity, target: Target },
    /// No separator, trailing whitespace, or no usable digest.
    Malformed,
    /// Manifest read from the input stream names the input stream as its target.
    SelfReference,
}

/// Split a line at its last whitespace run: the final token is the target,
/// everything before it is integrity text.
pub fn decode_line(line: &str) -> RawLine {
    match line.chars().last() {
        None => return RawLine::Malformed,
        Some(c) if c.is_whitespace() => return RawLine::Malformed,
        Some(_) => {}
    }
    let Some((idx, sep)) = line.char_indices().rev().find(|(_, c)| c.is_whitespace()) else {
        return RawLine::Malformed;
    };
    RawLine::Pair {
        integrity: line[..idx].to_string(),
        target: line[idx + sep.len_utf8()..].to_string(),
    }
}

/// Parse the integrity text of a decoded line and classify it.
pub fn classify(raw: RawLine, opts: &ParseOptions, manifest_is_stdin: bool) -> ManifestLine {
    let RawLine::Pair { integrity, target } = raw else {
        return ManifestLine::Malformed;
    };
    let target = Target::parse(&target);
    // Decided before the integrity text is looked at.
    if manifest_is_stdin && target.is_stdin() {
        return ManifestLine::SelfReference;
    }
    let expected = parse(&integrity, opts);
    // Lines that only name algorithms this build cannot hash are unusable.
    if expected.pick().and_then(Algorithm::from_name).is_none() {
        return ManifestLine::Malformed;
    }
    ManifestLine::Check { expected, target }
}

/// Lazy line reader over one manifest stream.
///
/// Lines end at `\n` with an optional preceding `\r`. The empty piece after
/// a final newline is not a line; empty lines elsewhere are reported as-is.
pub struct ManifestReader<R> {
    reader: R,
    buf: Vec<u8>,
}

impl<R: AsyncBufRead + Unpin> ManifestReader<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            buf: Vec::new(),
        }
    }

    /// Next raw line, decoded lossily as UTF-8.
    pub async fn next_line(&mut self) -> io::Result<Option<String>> {
        self.buf.clear();
        let n = self.reader.read_until(b'\n', &mut self.buf).await?;
        if n == 0 {
            return Ok(None);
        }
        if self.buf.last() == Some(&b'\n') {
            self.buf.pop();
            if self.buf.last() == Some(&b'\r') {
                self.buf.pop();
            }
        }
        Ok(Some(String::from_utf8_lossy(&self.buf).into_owned()))
    }

    /// Next line split into integrity text and target.
    pub async fn next_raw(&mut self) -> io::Result<Option<RawLine>> {
        Ok(self.next_line().await?.as_deref().map(decode_line))
    }
}
