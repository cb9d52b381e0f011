//! Verification of a target stream against an expected integrity.
//!
//! Only the strongest algorithm in the expectation is hashed; the target
//! passes if that digest equals any of the expected digests for it.

use tokio::io::AsyncRead;

use crate::algorithm::Algorithm;
use crate::compute::{compute, ComputeOptions, DigestError};
use crate::integrity::Integrity;
use crate::target::{Claim, IoKind, TargetError, TargetSource, Targets};

/// Result of checking one manifest line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Verified with the named algorithm.
    Ok(String),
    Mismatch,
    Missing,
    OtherIoError(TargetError),
    MalformedLine,
}

impl From<TargetError> for Outcome {
    fn from(err: TargetError) -> Self {
        match err.kind {
            IoKind::NotFound => Outcome::Missing,
            // The input stream cannot be re-read; treat it as failed verification.
            IoKind::AlreadyConsumed => Outcome::Mismatch,
            _ => Outcome::OtherIoError(err),
        }
    }
}

/// Hash `reader` with the strongest algorithm in `expected` and OR-match.
pub async fn verify<R>(expected: &Integrity, reader: &mut R, buffer_size: usize) -> Outcome
where
    R: AsyncRead + Unpin + ?Sized,
{
    let Some(algorithm) = expected.pick().and_then(Algorithm::from_name) else {
        return Outcome::MalformedLine;
    };
    let opts = ComputeOptions::single(algorithm, buffer_size);
    let actual = match compute(reader, &opts).await {
        Ok(actual) => actual,
        Err(DigestError::Io(e)) => return TargetError::from_io(&e).into(),
        Err(DigestError::UnsupportedAlgorithm(_)) => return Outcome::MalformedLine,
    };
    let Some(entry) = actual.get(algorithm.name()).first() else {
        return Outcome::MalformedLine;
    };
    if expected.matches(algorithm.name(), entry.digest()) {
        Outcome::Ok(algorithm.name().to_string())
    } else {
        tracing::debug!(
            algorithm = algorithm.name(),
            actual = %entry.hex_digest(),
            "digest mismatch"
        );
        Outcome::Mismatch
    }
}

/// Open a claimed target and verify it; open failures become outcomes.
pub async fn verify_claim<S: TargetSource>(
    targets: &Targets<S>,
    claim: Claim,
    expected: &Integrity,
    buffer_size: usize,
) -> Outcome {
    match targets.open(claim).await {
        Ok(mut reader) => verify(expected, &mut reader, buffer_size).await,
        Err(err) => err.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compute::BUF_SIZE;
    use crate::integrity::HashEntry;
    use crate::parse::{parse, ParseOptions};
    use crate::target::{FsTargets, SharedInput, Target};

    const SHA512_FOO: &str =
        "sha512-9/u6bgY2+JDlb7vzKD5STG+jIErimDgtYkdB0NxmODJuKCxBvl5CVNiCB3LFUYosWowMf37aGVlKfrU5RT4e1w==";
    const SHA512_BAR: &str =
        "sha512-2CxOtSYcuciqmFXt1n0b0QSC9BUphY2SUJTRc/pmKqkf85vFsYhhUnNIQCHfsW/YKEz2hMzw/Hlb46ovwebBgQ==";
    const SHA256_FOO: &str = "sha256-LCa0a2j/xo/5m0U8HTBBNBNCLXBkg7+g+YpeiGJm564=";

    fn expected(text: &str) -> Integrity {
        parse(text, &ParseOptions::default())
    }

    #[tokio::test]
    async fn matching_bytes_verify_ok() {
        let outcome = verify(&expected(SHA512_FOO), &mut &b"foo"[..], BUF_SIZE).await;
        assert_eq!(outcome, Outcome::Ok("sha512".to_string()));
    }

    #[tokio::test]
    async fn differing_bytes_mismatch() {
        let outcome = verify(&expected(SHA512_FOO), &mut &b"foo!"[..], BUF_SIZE).await;
        assert_eq!(outcome, Outcome::Mismatch);
    }

    #[tokio::test]
    async fn any_of_several_digests_matches() {
        let text = format!("{SHA512_BAR} {SHA512_FOO}");
        let outcome = verify(&expected(&text), &mut &b"foo"[..], BUF_SIZE).await;
        assert_eq!(outcome, Outcome::Ok("sha512".to_string()));
    }

    #[tokio::test]
    async fn only_strongest_algorithm_is_checked() {
        // sha256 matches "foo" but the stronger sha512 entry is for "bar".
        let text = format!("{SHA256_FOO} {SHA512_BAR}");
        let outcome = verify(&expected(&text), &mut &b"foo"[..], BUF_SIZE).await;
        assert_eq!(outcome, Outcome::Mismatch);

        // A bad weaker entry is ignored when the strongest matches.
        let mut i = expected(SHA512_FOO);
        i.push(HashEntry::new("sha256", vec![0u8; 32], Vec::new()));
        let outcome = verify(&i, &mut &b"foo"[..], BUF_SIZE).await;
        assert_eq!(outcome, Outcome::Ok("sha512".to_string()));
    }

    #[tokio::test]
    async fn empty_expectation_is_malformed() {
        let outcome = verify(&Integrity::new(), &mut &b"foo"[..], BUF_SIZE).await;
        assert_eq!(outcome, Outcome::MalformedLine);
    }

    #[tokio::test]
    async fn missing_file_is_missing() {
        let dir = tempfile::tempdir().unwrap();
        let targets = Targets::new(FsTargets, SharedInput::from_reader(&b""[..]));
        let claim = targets.claim(&Target::Path(dir.path().join("absent")));
        let outcome = verify_claim(&targets, claim, &expected(SHA512_FOO), BUF_SIZE).await;
        assert_eq!(outcome, Outcome::Missing);
    }

    #[tokio::test]
    async fn consumed_input_is_mismatch() {
        let targets = Targets::new(FsTargets, SharedInput::from_reader(&b"foo"[..]));
        let first = targets.claim(&Target::Stdin);
        let second = targets.claim(&Target::Stdin);
        let expected = expected(SHA512_FOO);
        assert_eq!(
            verify_claim(&targets, first, &expected, BUF_SIZE).await,
            Outcome::Ok("sha512".to_string())
        );
        assert_eq!(
            verify_claim(&targets, second, &expected, BUF_SIZE).await,
            Outcome::Mismatch
        );
    }

    #[tokio::test]
    async fn directory_is_other_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let targets = Targets::new(FsTargets, SharedInput::from_reader(&b""[..]));
        let claim = targets.claim(&Target::Path(dir.path().to_path_buf()));
        let outcome = verify_claim(&targets, claim, &expected(SHA512_FOO), BUF_SIZE).await;
        match outcome {
            Outcome::OtherIoError(e) => assert_ne!(e.kind, IoKind::NotFound),
            other => panic!("expected OtherIoError, got {other:?}"),
        }
    }
}
