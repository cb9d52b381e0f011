//! Concurrent compute and check pipelines.
//!
//! Every input (compute) and every manifest (check) is its own task; every
//! manifest line is its own verification task. Tasks report
//! `(position, result)` and the aggregators put results back in discovery
//! order, whatever order they complete in.

use std::sync::Arc;

use tokio::io::BufReader;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use crate::aggregate::{CheckAggregator, Slots};
use crate::compute::{compute, ComputeOptions, DigestError, BUF_SIZE};
use crate::integrity::Integrity;
use crate::manifest::{classify, ManifestLine, ManifestReader, RawLine, SourceError};
use crate::parse::ParseOptions;
use crate::report::{CheckEntry, CheckReport, ComputeEntry, ComputeFailure, ComputeReport, Counts};
use crate::target::{Claim, Target, TargetError, TargetSource, Targets};
use crate::verify::{verify_claim, Outcome};

pub const DEFAULT_MAX_OPEN_FILES: usize = 64;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckOptions {
    pub parse: ParseOptions,
    pub buffer_size: usize,
    /// Upper bound on targets being hashed at once.
    pub max_open_files: usize,
}

impl Default for CheckOptions {
    fn default() -> Self {
        Self {
            parse: ParseOptions::default(),
            buffer_size: BUF_SIZE,
            max_open_files: DEFAULT_MAX_OPEN_FILES,
        }
    }
}

/// Compute an integrity for every input, reported in argument order.
pub async fn run_compute<S: TargetSource>(
    inputs: &[Target],
    targets: Arc<Targets<S>>,
    opts: ComputeOptions,
    max_open_files: usize,
) -> ComputeReport {
    let opts = Arc::new(opts);
    let permits = Arc::new(Semaphore::new(max_open_files.max(1)));
    let mut names = Vec::with_capacity(inputs.len());
    let mut slots = Slots::new();
    let mut tasks = JoinSet::new();

    for input in inputs {
        let position = slots.reserve();
        names.push(input.to_string());
        let claim = targets.claim(input);
        let targets = Arc::clone(&targets);
        let opts = Arc::clone(&opts);
        let permits = Arc::clone(&permits);
        tasks.spawn(async move {
            let _permit = permits.acquire_owned().await.ok();
            (position, compute_claim(&targets, claim, &opts).await)
        });
    }

    while let Some(res) = tasks.join_next().await {
        match res {
            Ok((position, result)) => slots.insert(position, result),
            Err(e) => tracing::warn!("compute task failed: {}", e),
        }
    }

    let entries = names
        .into_iter()
        .zip(slots.into_ordered())
        .map(|(target, result)| ComputeEntry {
            target,
            result: result.unwrap_or(Err(ComputeFailure::Task)),
        })
        .collect();
    ComputeReport { entries }
}

async fn compute_claim<S: TargetSource>(
    targets: &Targets<S>,
    claim: Claim,
    opts: &ComputeOptions,
) -> Result<Integrity, ComputeFailure> {
    let mut reader = targets.open(claim).await?;
    let integrity = compute(&mut reader, opts).await.map_err(|e| match e {
        DigestError::Io(e) => ComputeFailure::Target(TargetError::from_io(&e)),
        DigestError::UnsupportedAlgorithm(name) => ComputeFailure::UnsupportedAlgorithm(name),
    })?;
    if integrity.is_empty() {
        return Err(ComputeFailure::Empty);
    }
    Ok(integrity)
}

/// Verify every line of every manifest. Manifests are reported in argument
/// order; a manifest that cannot be read contributes only its failure.
pub async fn run_check<S: TargetSource>(
    manifests: &[Target],
    targets: Arc<Targets<S>>,
    opts: CheckOptions,
) -> CheckReport {
    let opts = Arc::new(opts);
    let permits = Arc::new(Semaphore::new(opts.max_open_files.max(1)));
    let mut names = Vec::with_capacity(manifests.len());
    let mut slots = Slots::new();
    let mut tasks = JoinSet::new();

    // Manifests read from `-` take the input stream before any line target can.
    let claims: Vec<Claim> = manifests.iter().map(|m| targets.claim(m)).collect();

    for (manifest, claim) in manifests.iter().zip(claims) {
        let position = slots.reserve();
        names.push(manifest.to_string());
        let manifest = manifest.clone();
        let targets = Arc::clone(&targets);
        let opts = Arc::clone(&opts);
        let permits = Arc::clone(&permits);
        tasks.spawn(async move {
            let section = check_manifest(&manifest, claim, targets, opts, permits).await;
            (position, section)
        });
    }

    while let Some(res) = tasks.join_next().await {
        match res {
            Ok((position, section)) => slots.insert(position, section),
            Err(e) => tracing::warn!("manifest task failed: {}", e),
        }
    }

    let mut report = CheckReport::default();
    for (name, section) in names.into_iter().zip(slots.into_ordered()) {
        match section {
            Some(Ok((entries, counts))) => {
                report.entries.extend(entries);
                report.counts.merge(&counts);
            }
            Some(Err(err)) => {
                tracing::warn!(error = %err, "manifest dropped");
                report.failures.push(err);
            }
            None => report.failures.push(SourceError::Task { name }),
        }
    }
    report
}

async fn check_manifest<S: TargetSource>(
    manifest: &Target,
    claim: Claim,
    targets: Arc<Targets<S>>,
    opts: Arc<CheckOptions>,
    permits: Arc<Semaphore>,
) -> Result<(Vec<CheckEntry>, Counts), SourceError> {
    let name = manifest.to_string();
    let stream = targets
        .open(claim)
        .await
        .map_err(|source| SourceError::Open {
            name: name.clone(),
            source,
        })?;
    let mut reader = ManifestReader::new(BufReader::with_capacity(opts.buffer_size.max(1), stream));
    let mut agg = CheckAggregator::new();
    let mut tasks = JoinSet::new();

    loop {
        let raw = match reader.next_raw().await {
            Ok(Some(raw)) => raw,
            Ok(None) => break,
            Err(e) => {
                return Err(SourceError::Read {
                    name,
                    source: TargetError::from_io(&e),
                })
            }
        };
        let target_name = match &raw {
            RawLine::Pair { target, .. } => target.clone(),
            RawLine::Malformed => String::new(),
        };
        let position = agg.reserve(target_name);

        match classify(raw, &opts.parse, manifest.is_stdin()) {
            ManifestLine::Malformed => agg.insert(position, Outcome::MalformedLine),
            ManifestLine::SelfReference => agg.insert(position, Outcome::Mismatch),
            ManifestLine::Check { expected, target } => {
                let claim = targets.claim(&target);
                let targets = Arc::clone(&targets);
                let permits = Arc::clone(&permits);
                let buffer_size = opts.buffer_size;
                tasks.spawn(async move {
                    let _permit = permits.acquire_owned().await.ok();
                    let outcome = verify_claim(&targets, claim, &expected, buffer_size).await;
                    tracing::debug!(file = %target, ?outcome, "verified");
                    (position, outcome)
                });
            }
        }
    }

    while let Some(res) = tasks.join_next().await {
        match res {
            Ok((position, outcome)) => agg.insert(position, outcome),
            Err(e) => tracing::warn!(manifest = %name, "verification task failed: {}", e),
        }
    }

    let (entries, counts) = agg.finish();
    tracing::debug!(manifest = %name, lines = entries.len(), "manifest checked");
    Ok((entries, counts))
}
