//! CLI for srisum: compute or check Subresource Integrity digests.

mod commands;

use anyhow::Result;
use clap::Parser;
use srisum_core::compute::ComputeOptions;
use srisum_core::config::{self, SrisumConfig};
use srisum_core::parse::ParseOptions;
use srisum_core::report::OutputPolicy;
use srisum_core::run::CheckOptions;
use srisum_core::target::Target;

use commands::{run_check_files, run_compute_files};

/// Top-level CLI. Without `--check` every file is hashed; with it every file
/// is read as a manifest of `<integrity> <target>` lines.
#[derive(Debug, Parser)]
#[command(name = "srisum", version)]
#[command(
    about = "Compute and check Subresource Integrity digests",
    long_about = None
)]
pub struct Cli {
    /// Files to hash or manifests to check. `-` (the default) reads standard input.
    #[arg(value_name = "FILE")]
    pub files: Vec<String>,

    /// Hash algorithms to compute (default from config, sha512).
    #[arg(short, long, value_name = "ALG", num_args = 1.., value_delimiter = ',')]
    pub algorithms: Vec<String>,

    /// Option tags appended to every computed entry.
    #[arg(short, long, value_name = "OPT", num_args = 1..)]
    pub options: Vec<String>,

    /// Only accept and produce sha256, sha384 and sha512 digests.
    #[arg(short, long)]
    pub strict: bool,

    /// Read manifests from FILEs and verify the targets they list.
    #[arg(short, long)]
    pub check: bool,

    /// Don't fail or report for listed files that don't exist.
    #[arg(long)]
    pub ignore_missing: bool,

    /// Don't print OK for each verified file.
    #[arg(long)]
    pub quiet: bool,

    /// Print nothing; the exit status reports success.
    #[arg(long)]
    pub status: bool,

    /// Warn about improperly formatted manifest lines.
    #[arg(short, long)]
    pub warn: bool,

    /// Print only the integrity string, without the file name.
    #[arg(short, long)]
    pub digest_only: bool,
}

impl Cli {
    /// Parse the process arguments and run. Returns the exit code.
    pub async fn run_from_args() -> Result<i32> {
        Cli::parse().run().await
    }

    pub async fn run(self) -> Result<i32> {
        let cfg = config::load()?;
        tracing::debug!("loaded config: {:?}", cfg);
        let inputs = self.inputs();
        let policy = self.output_policy();

        if self.check {
            run_check_files(&inputs, self.check_options(&cfg), &policy).await
        } else {
            let max_open_files = cfg.max_open_files;
            run_compute_files(&inputs, self.compute_options(&cfg), max_open_files, &policy).await
        }
    }

    /// Positional files as targets; none means standard input.
    pub fn inputs(&self) -> Vec<Target> {
        if self.files.is_empty() {
            return vec![Target::Stdin];
        }
        self.files.iter().map(|f| Target::from_arg(f)).collect()
    }

    pub fn output_policy(&self) -> OutputPolicy {
        OutputPolicy {
            quiet: self.quiet,
            status: self.status,
            warn: self.warn,
            ignore_missing: self.ignore_missing,
            digest_only: self.digest_only,
            ..OutputPolicy::default()
        }
    }

    pub fn compute_options(&self, cfg: &SrisumConfig) -> ComputeOptions {
        let algorithms = if self.algorithms.is_empty() {
            cfg.default_algorithms.clone()
        } else {
            self.algorithms.clone()
        };
        ComputeOptions {
            algorithms,
            options: self.options.clone(),
            strict: self.strict,
            allowed_algorithms: cfg.strict_algorithms.clone(),
            buffer_size: cfg.read_buffer_bytes,
        }
    }

    pub fn check_options(&self, cfg: &SrisumConfig) -> CheckOptions {
        CheckOptions {
            parse: ParseOptions {
                strict: self.strict,
                allowed_algorithms: cfg.strict_algorithms.clone(),
            },
            buffer_size: cfg.read_buffer_bytes,
            max_open_files: cfg.max_open_files,
        }
    }
}
