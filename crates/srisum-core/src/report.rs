//! Final reports for both modes, their exit status, and the exact output
//! lines printed for them.

use thiserror::Error;

use crate::integrity::Integrity;
use crate::manifest::SourceError;
use crate::target::TargetError;
use crate::verify::Outcome;

/// Output switches from the command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputPolicy {
    /// Prefix for diagnostics, normally the binary name.
    pub prog: String,
    pub quiet: bool,
    pub status: bool,
    pub warn: bool,
    pub ignore_missing: bool,
    pub digest_only: bool,
}

impl Default for OutputPolicy {
    fn default() -> Self {
        Self {
            prog: "srisum".to_string(),
            quiet: false,
            status: false,
            warn: false,
            ignore_missing: false,
            digest_only: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stream {
    Stdout,
    Stderr,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Line {
    pub stream: Stream,
    pub text: String,
}

impl Line {
    fn out(text: String) -> Self {
        Self {
            stream: Stream::Stdout,
            text,
        }
    }

    fn err(text: String) -> Self {
        Self {
            stream: Stream::Stderr,
            text,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Counts {
    pub bad_lines: usize,
    pub mismatches: usize,
    pub missing: usize,
    pub other_io: usize,
}

impl Counts {
    pub fn record(&mut self, outcome: &Outcome) {
        match outcome {
            Outcome::Ok(_) => {}
            Outcome::Mismatch => self.mismatches += 1,
            Outcome::Missing => self.missing += 1,
            Outcome::OtherIoError(_) => self.other_io += 1,
            Outcome::MalformedLine => self.bad_lines += 1,
        }
    }

    pub fn merge(&mut self, other: &Counts) {
        self.bad_lines += other.bad_lines;
        self.mismatches += other.mismatches;
        self.missing += other.missing;
        self.other_io += other.other_io;
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckEntry {
    pub target: String,
    pub outcome: Outcome,
}

/// Everything produced by a check run, in manifest order then line order.
#[derive(Debug, Default)]
pub struct CheckReport {
    pub entries: Vec<CheckEntry>,
    pub counts: Counts,
    /// Manifests that could not be read; their lines are not reported.
    pub failures: Vec<SourceError>,
}

impl CheckReport {
    pub fn is_success(&self, ignore_missing: bool) -> bool {
        self.failures.is_empty()
            && self.counts.bad_lines == 0
            && self.counts.mismatches == 0
            && (ignore_missing || self.counts.missing == 0)
    }

    pub fn exit_code(&self, ignore_missing: bool) -> i32 {
        if self.is_success(ignore_missing) {
            0
        } else {
            1
        }
    }

    pub fn render(&self, policy: &OutputPolicy) -> Vec<Line> {
        if policy.status {
            return Vec::new();
        }
        let prog = &policy.prog;
        let mut lines = Vec::new();
        for CheckEntry { target, outcome } in &self.entries {
            match outcome {
                Outcome::Ok(algorithm) => {
                    if !policy.quiet {
                        lines.push(Line::out(format!("{target}: OK ({algorithm})")));
                    }
                }
                Outcome::Mismatch => lines.push(Line::err(format!("{target}: FAILED"))),
                Outcome::Missing => {
                    if !policy.ignore_missing {
                        lines.push(Line::err(format!(
                            "{prog}: {target}: No such file or directory"
                        )));
                        lines.push(Line::out(format!("{target}: FAILED open or read")));
                    }
                }
                Outcome::OtherIoError(err) => {
                    lines.push(Line::err(format!("{prog}: {target}: {err}")));
                    lines.push(Line::out(format!("{target}: FAILED {}", err.code())));
                }
                Outcome::MalformedLine => {}
            }
        }
        lines.extend(self.warnings(policy));
        for failure in &self.failures {
            lines.push(Line::err(format!("{prog}: ERROR: {failure}")));
        }
        lines
    }

    fn warnings(&self, policy: &OutputPolicy) -> Vec<Line> {
        let prog = &policy.prog;
        let c = &self.counts;
        let mut lines = Vec::new();
        if policy.warn && c.bad_lines > 0 {
            let verb = if c.bad_lines > 1 { "lines are" } else { "line is" };
            lines.push(Line::err(format!(
                "{prog}: WARNING: {} {verb} improperly formatted or invalid",
                c.bad_lines
            )));
        }
        if !policy.ignore_missing && c.missing > 0 {
            let noun = if c.missing > 1 { "files" } else { "file" };
            lines.push(Line::err(format!(
                "{prog}: WARNING: {} listed {noun} could not be read",
                c.missing
            )));
        }
        if c.mismatches > 0 {
            let noun = if c.mismatches > 1 { "checksums" } else { "checksum" };
            lines.push(Line::err(format!(
                "{prog}: WARNING: {} computed {noun} did NOT match",
                c.mismatches
            )));
        }
        lines
    }
}

/// Why no integrity could be produced for one compute input.
#[derive(Debug, Error)]
pub enum ComputeFailure {
    #[error("{0}")]
    Target(#[from] TargetError),

    #[error("unsupported algorithm: {0}")]
    UnsupportedAlgorithm(String),

    /// Strict mode filtered out every requested algorithm.
    #[error("Valid SRI digest could not be generated")]
    Empty,

    #[error("computation task failed")]
    Task,
}

#[derive(Debug)]
pub struct ComputeEntry {
    pub target: String,
    pub result: Result<Integrity, ComputeFailure>,
}

/// One entry per input, in argument order.
#[derive(Debug, Default)]
pub struct ComputeReport {
    pub entries: Vec<ComputeEntry>,
}

impl ComputeReport {
    pub fn is_success(&self) -> bool {
        self.entries.iter().all(|e| e.result.is_ok())
    }

    pub fn exit_code(&self) -> i32 {
        if self.is_success() {
            0
        } else {
            1
        }
    }

    pub fn render(&self, policy: &OutputPolicy) -> Vec<Line> {
        if policy.status {
            return Vec::new();
        }
        let prog = &policy.prog;
        self.entries
            .iter()
            .map(|ComputeEntry { target, result }| match result {
                Ok(integrity) if policy.digest_only => Line::out(integrity.to_string()),
                Ok(integrity) => Line::out(format!("{integrity} {target}")),
                Err(ComputeFailure::Empty) => Line::err(format!(
                    "Valid SRI digest could not be generated for {target}"
                )),
                Err(err) => Line::err(format!("{prog}: {target}: {err}")),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse::{parse, ParseOptions};
    use std::io;

    fn entry(target: &str, outcome: Outcome) -> CheckEntry {
        CheckEntry {
            target: target.to_string(),
            outcome,
        }
    }

    fn report(entries: Vec<CheckEntry>) -> CheckReport {
        let mut counts = Counts::default();
        for e in &entries {
            counts.record(&e.outcome);
        }
        CheckReport {
            entries,
            counts,
            failures: Vec::new(),
        }
    }

    fn texts(lines: &[Line], stream: Stream) -> Vec<&str> {
        lines
            .iter()
            .filter(|l| l.stream == stream)
            .map(|l| l.text.as_str())
            .collect()
    }

    #[test]
    fn all_ok_is_success() {
        let r = report(vec![
            entry("foo.txt", Outcome::Ok("sha512".to_string())),
            entry("bar.txt", Outcome::Ok("sha256".to_string())),
        ]);
        assert_eq!(r.exit_code(false), 0);
        let lines = r.render(&OutputPolicy::default());
        assert_eq!(
            texts(&lines, Stream::Stdout),
            ["foo.txt: OK (sha512)", "bar.txt: OK (sha256)"]
        );
        assert!(texts(&lines, Stream::Stderr).is_empty());
    }

    #[test]
    fn quiet_hides_ok_and_status_hides_everything() {
        let r = report(vec![
            entry("foo.txt", Outcome::Ok("sha512".to_string())),
            entry("bar.txt", Outcome::Mismatch),
        ]);
        let quiet = OutputPolicy {
            quiet: true,
            ..OutputPolicy::default()
        };
        let lines = r.render(&quiet);
        assert!(texts(&lines, Stream::Stdout).is_empty());
        assert_eq!(
            texts(&lines, Stream::Stderr),
            ["bar.txt: FAILED", "srisum: WARNING: 1 computed checksum did NOT match"]
        );

        let status = OutputPolicy {
            status: true,
            ..OutputPolicy::default()
        };
        assert!(r.render(&status).is_empty());
        assert_eq!(r.exit_code(false), 1);
    }

    #[test]
    fn missing_reported_unless_ignored() {
        let r = report(vec![
            entry("foo.txt", Outcome::Missing),
            entry("bar.txt", Outcome::Ok("sha512".to_string())),
        ]);
        assert_eq!(r.exit_code(false), 1);
        assert_eq!(r.exit_code(true), 0);

        let lines = r.render(&OutputPolicy::default());
        assert_eq!(
            texts(&lines, Stream::Stdout),
            ["foo.txt: FAILED open or read", "bar.txt: OK (sha512)"]
        );
        assert_eq!(
            texts(&lines, Stream::Stderr),
            [
                "srisum: foo.txt: No such file or directory",
                "srisum: WARNING: 1 listed file could not be read"
            ]
        );

        let ignore = OutputPolicy {
            ignore_missing: true,
            ..OutputPolicy::default()
        };
        let lines = r.render(&ignore);
        assert_eq!(texts(&lines, Stream::Stdout), ["bar.txt: OK (sha512)"]);
        assert!(texts(&lines, Stream::Stderr).is_empty());
    }

    #[test]
    fn other_io_error_prints_code_without_failing() {
        let err = TargetError::from_io(&io::Error::from(io::ErrorKind::PermissionDenied));
        let r = report(vec![entry("secret", Outcome::OtherIoError(err))]);
        let lines = r.render(&OutputPolicy::default());
        assert_eq!(texts(&lines, Stream::Stdout), ["secret: FAILED EACCES"]);
        assert_eq!(
            texts(&lines, Stream::Stderr),
            ["srisum: secret: Permission denied"]
        );
        assert_eq!(r.counts.other_io, 1);
        assert_eq!(r.exit_code(false), 0);
    }

    #[test]
    fn bad_lines_warn_only_with_warn_and_pluralize() {
        let r = report(vec![
            entry("", Outcome::MalformedLine),
            entry("", Outcome::MalformedLine),
            entry("foo.txt", Outcome::Ok("sha512".to_string())),
        ]);
        assert_eq!(r.exit_code(true), 1);
        let lines = r.render(&OutputPolicy::default());
        assert!(texts(&lines, Stream::Stderr).is_empty());

        let warn = OutputPolicy {
            warn: true,
            ..OutputPolicy::default()
        };
        let lines = r.render(&warn);
        assert_eq!(
            texts(&lines, Stream::Stderr),
            ["srisum: WARNING: 2 lines are improperly formatted or invalid"]
        );
    }

    #[test]
    fn compute_render_modes() {
        let integrity = parse(
            "sha256-LCa0a2j/xo/5m0U8HTBBNBNCLXBkg7+g+YpeiGJm564=",
            &ParseOptions::default(),
        );
        let r = ComputeReport {
            entries: vec![
                ComputeEntry {
                    target: "foo.txt".to_string(),
                    result: Ok(integrity),
                },
                ComputeEntry {
                    target: "gone.txt".to_string(),
                    result: Err(TargetError::from_io(&io::Error::from(io::ErrorKind::NotFound)).into()),
                },
                ComputeEntry {
                    target: "-".to_string(),
                    result: Err(ComputeFailure::Empty),
                },
            ],
        };
        assert_eq!(r.exit_code(), 1);
        let lines = r.render(&OutputPolicy::default());
        assert_eq!(
            texts(&lines, Stream::Stdout),
            ["sha256-LCa0a2j/xo/5m0U8HTBBNBNCLXBkg7+g+YpeiGJm564= foo.txt"]
        );
        assert_eq!(
            texts(&lines, Stream::Stderr),
            [
                "srisum: gone.txt: No such file or directory",
                "Valid SRI digest could not be generated for -"
            ]
        );

        let digest_only = OutputPolicy {
            digest_only: true,
            ..OutputPolicy::default()
        };
        let lines = r.render(&digest_only);
        assert_eq!(
            texts(&lines, Stream::Stdout),
            ["sha256-LCa0a2j/xo/5m0U8HTBBNBNCLXBkg7+g+YpeiGJm564="]
        );
    }
}
