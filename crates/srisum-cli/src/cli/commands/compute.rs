//! Compute mode: print an integrity string for each input.

use anyhow::Result;
use srisum_core::compute::ComputeOptions;
use srisum_core::report::OutputPolicy;
use srisum_core::run::run_compute;
use srisum_core::target::{Target, Targets};
use std::sync::Arc;

use super::print_lines;

pub async fn run_compute_files(
    inputs: &[Target],
    opts: ComputeOptions,
    max_open_files: usize,
    policy: &OutputPolicy,
) -> Result<i32> {
    let report = run_compute(inputs, Arc::new(Targets::system()), opts, max_open_files).await;
    print_lines(&report.render(policy))?;
    Ok(report.exit_code())
}
