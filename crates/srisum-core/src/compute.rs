//! Streaming digest computation.
//!
//! Reads in chunks to keep memory use bounded and feeds every chunk to all
//! requested hashers before reading the next one, so the input is read once
//! regardless of how many algorithms are requested.

use thiserror::Error;
use tokio::io::{AsyncRead, AsyncReadExt};

use crate::algorithm::{Algorithm, DEFAULT_ALGORITHM, STRICT_ALGORITHMS};
use crate::integrity::{HashEntry, Integrity};
use crate::parse::is_printable_option;

pub const BUF_SIZE: usize = 64 * 1024;

#[derive(Debug, Error)]
pub enum DigestError {
    #[error("unsupported algorithm: {0}")]
    UnsupportedAlgorithm(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComputeOptions {
    /// Requested algorithms; duplicates are hashed once.
    pub algorithms: Vec<String>,
    /// Option tags attached verbatim to every produced entry.
    pub options: Vec<String>,
    pub strict: bool,
    /// Algorithms kept in strict mode.
    pub allowed_algorithms: Vec<String>,
    pub buffer_size: usize,
}

impl Default for ComputeOptions {
    fn default() -> Self {
        Self {
            algorithms: vec![DEFAULT_ALGORITHM.to_string()],
            options: Vec::new(),
            strict: false,
            allowed_algorithms: STRICT_ALGORITHMS.iter().map(|s| s.to_string()).collect(),
            buffer_size: BUF_SIZE,
        }
    }
}

impl ComputeOptions {
    /// Options hashing exactly one algorithm, as used by verification.
    pub fn single(algorithm: Algorithm, buffer_size: usize) -> Self {
        Self {
            algorithms: vec![algorithm.name().to_string()],
            buffer_size,
            ..Self::default()
        }
    }

    /// Resolve the requested names into hashable algorithms, deduplicated in
    /// request order. In strict mode names outside the allow-set are skipped,
    /// and option tags that are not visible ASCII disqualify every entry.
    pub fn selected(&self) -> Result<Vec<Algorithm>, DigestError> {
        let mut out: Vec<Algorithm> = Vec::new();
        if self.strict && !self.options.iter().all(|o| is_printable_option(o)) {
            return Ok(out);
        }
        for name in &self.algorithms {
            if self.strict
                && !self
                    .allowed_algorithms
                    .iter()
                    .any(|a| a.eq_ignore_ascii_case(name))
            {
                continue;
            }
            let alg = Algorithm::from_name(name)
                .ok_or_else(|| DigestError::UnsupportedAlgorithm(name.clone()))?;
            if !out.contains(&alg) {
                out.push(alg);
            }
        }
        Ok(out)
    }
}

/// Hash `reader` to its end and return one entry per selected algorithm.
///
/// An empty result is only possible in strict mode when every requested
/// algorithm was filtered out; callers report that as a generation failure.
pub async fn compute<R>(reader: &mut R, opts: &ComputeOptions) -> Result<Integrity, DigestError>
where
    R: AsyncRead + Unpin + ?Sized,
{
    let algorithms = opts.selected()?;
    let mut hashers: Vec<_> = algorithms.iter().map(|alg| (*alg, alg.hasher())).collect();

    let mut buf = vec![0u8; opts.buffer_size.max(1)];
    let mut total = 0u64;
    loop {
        let n = reader.read(&mut buf).await?;
        if n == 0 {
            break;
        }
        total += n as u64;
        for (_, hasher) in hashers.iter_mut() {
            hasher.update(&buf[..n]);
        }
    }

    let mut integrity = Integrity::new();
    for (alg, hasher) in hashers {
        integrity.push(HashEntry::new(
            alg.name(),
            hasher.finalize().into_vec(),
            opts.options.clone(),
        ));
    }
    tracing::debug!(bytes = total, algorithms = algorithms.len(), "computed digests");
    Ok(integrity)
}
