//! Integrity string parser.
//!
//! The parser never fails: tokens that do not have the shape
//! `algorithm-base64payload?opt...` (or, in strict mode, that name a
//! disallowed algorithm, carry a digest of the wrong length or non-printable
//! options) are dropped, so malformed input degrades to a smaller, possibly
//! empty, [`Integrity`].

use base64::alphabet;
use base64::engine::general_purpose::{GeneralPurpose, GeneralPurposeConfig, STANDARD};
use base64::engine::DecodePaddingMode;
use base64::Engine;

use crate::algorithm::{Algorithm, STRICT_ALGORITHMS};
use crate::integrity::{HashEntry, Integrity};

/// Lenient decoder: padding optional, trailing bits tolerated.
const LENIENT: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new()
        .with_decode_padding_mode(DecodePaddingMode::Indifferent)
        .with_decode_allow_trailing_bits(true),
);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseOptions {
    pub strict: bool,
    /// Algorithm names accepted in strict mode (lowercase).
    pub allowed_algorithms: Vec<String>,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            strict: false,
            allowed_algorithms: STRICT_ALGORITHMS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl ParseOptions {
    /// Strict parsing with the default allow-set.
    pub fn strict() -> Self {
        Self {
            strict: true,
            ..Self::default()
        }
    }

    pub fn allows(&self, algorithm: &str) -> bool {
        self.allowed_algorithms
            .iter()
            .any(|a| a.eq_ignore_ascii_case(algorithm))
    }
}

/// Parse whitespace-separated integrity tokens.
pub fn parse(text: &str, opts: &ParseOptions) -> Integrity {
    let mut integrity = Integrity::new();
    for token in text.split_whitespace() {
        if let Some(entry) = parse_token(token, opts) {
            integrity.push(entry);
        }
    }
    integrity
}

/// Option tags in strict mode must be visible ASCII (`!` through `~`).
pub(crate) fn is_printable_option(option: &str) -> bool {
    option.bytes().all(|b| (0x21..=0x7e).contains(&b))
}

fn parse_token(token: &str, opts: &ParseOptions) -> Option<HashEntry> {
    let (algorithm, rest) = token.split_once('-')?;
    if algorithm.is_empty() || !algorithm.bytes().all(|b| b.is_ascii_alphanumeric()) {
        return None;
    }
    let mut parts = rest.split('?');
    let payload = parts.next().filter(|p| !p.is_empty())?;
    let options: Vec<String> = parts.map(str::to_string).collect();

    let digest = if opts.strict {
        if !opts.allows(algorithm) {
            return None;
        }
        let expected_len = Algorithm::from_name(algorithm)?.digest_len();
        let digest = STANDARD.decode(payload).ok()?;
        if digest.len() != expected_len {
            return None;
        }
        if !options.iter().all(|o| is_printable_option(o)) {
            return None;
        }
        digest
    } else {
        LENIENT.decode(payload).ok()?
    };

    Some(HashEntry::new(algorithm, digest, options))
}
