//! Integrity data model: hash entries grouped by algorithm, serialized as
//! `algorithm-base64digest?opt` tokens, weakest algorithm first.

use std::collections::BTreeMap;
use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;

use crate::algorithm::AlgorithmName;
use crate::parse::{parse, ParseOptions};

/// One `(algorithm, digest, options)` unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HashEntry {
    algorithm: AlgorithmName,
    digest: Vec<u8>,
    options: Vec<String>,
}

impl HashEntry {
    /// Build an entry; the algorithm is lowercased and empty option strings are dropped.
    pub fn new(algorithm: &str, digest: Vec<u8>, options: Vec<String>) -> Self {
        Self {
            algorithm: AlgorithmName::new(algorithm),
            digest,
            options: options.into_iter().filter(|o| !o.is_empty()).collect(),
        }
    }

    pub fn algorithm(&self) -> &str {
        self.algorithm.as_str()
    }

    /// Raw digest bytes.
    pub fn digest(&self) -> &[u8] {
        &self.digest
    }

    pub fn options(&self) -> &[String] {
        &self.options
    }

    /// Digest as padded standard base64, the form used on the wire.
    pub fn base64_digest(&self) -> String {
        STANDARD.encode(&self.digest)
    }

    /// Digest as lowercase hex, for logs.
    pub fn hex_digest(&self) -> String {
        hex::encode(&self.digest)
    }
}

impl fmt::Display for HashEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.algorithm, self.base64_digest())?;
        for opt in &self.options {
            write!(f, "?{}", opt)?;
        }
        Ok(())
    }
}

/// Hash entries keyed by algorithm, buckets in strength order.
///
/// Entries keep insertion order within a bucket; duplicates are kept.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Integrity {
    hashes: BTreeMap<AlgorithmName, Vec<HashEntry>>,
}

impl Integrity {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an entry to the bucket of its own algorithm.
    pub fn push(&mut self, entry: HashEntry) {
        self.hashes
            .entry(entry.algorithm.clone())
            .or_default()
            .push(entry);
    }

    /// True when there is no usable digest at all.
    pub fn is_empty(&self) -> bool {
        self.hashes.values().all(Vec::is_empty)
    }

    /// Total number of entries across all algorithms.
    pub fn len(&self) -> usize {
        self.hashes.values().map(Vec::len).sum()
    }

    /// Algorithm names present, weakest first.
    pub fn algorithms(&self) -> impl Iterator<Item = &str> {
        self.hashes.keys().map(AlgorithmName::as_str)
    }

    /// Entries stored under `algorithm` (case-insensitive), in insertion order.
    pub fn get(&self, algorithm: &str) -> &[HashEntry] {
        self.hashes
            .get(&AlgorithmName::new(algorithm))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// All entries in serialization order.
    pub fn entries(&self) -> impl Iterator<Item = &HashEntry> {
        self.hashes.values().flatten()
    }

    /// Strongest algorithm present, or `None` when empty.
    pub fn pick(&self) -> Option<&str> {
        self.hashes
            .iter()
            .rev()
            .find(|(_, entries)| !entries.is_empty())
            .map(|(name, _)| name.as_str())
    }

    /// OR-match: does any entry under `algorithm` carry exactly `digest`?
    pub fn matches(&self, algorithm: &str, digest: &[u8]) -> bool {
        self.get(algorithm).iter().any(|e| e.digest() == digest)
    }
}

impl fmt::Display for Integrity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for entry in self.entries() {
            if !first {
                f.write_str(" ")?;
            }
            write!(f, "{}", entry)?;
            first = false;
        }
        Ok(())
    }
}

/// Lenient parse; never fails.
impl FromStr for Integrity {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(parse(s, &ParseOptions::default()))
    }
}
