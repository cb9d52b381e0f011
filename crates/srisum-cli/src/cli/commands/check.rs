//! Check mode: verify every target listed in the given manifests.

use anyhow::Result;
use srisum_core::report::OutputPolicy;
use srisum_core::run::{run_check, CheckOptions};
use srisum_core::target::{Target, Targets};
use std::sync::Arc;

use super::print_lines;

pub async fn run_check_files(
    manifests: &[Target],
    opts: CheckOptions,
    policy: &OutputPolicy,
) -> Result<i32> {
    let report = run_check(manifests, Arc::new(Targets::system()), opts).await;
    print_lines(&report.render(policy))?;
    tracing::debug!(
        entries = report.entries.len(),
        failures = report.failures.len(),
        "check finished"
    );
    Ok(report.exit_code(policy.ignore_missing))
}
