//! Known hash algorithms and the strength ranking shared by selection,
//! serialization order and strict filtering.

use std::cmp::Ordering;
use std::fmt;

use digest::DynDigest;

/// Algorithms this build can hash, declared weakest first. The declaration
/// order is the strength ranking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Algorithm {
    Md5,
    Whirlpool,
    Sha1,
    Sha224,
    Sha256,
    Sha384,
    Sha512,
}

/// Default allow-set for strict mode.
pub const STRICT_ALGORITHMS: [&str; 3] = ["sha256", "sha384", "sha512"];

/// Algorithm used for compute when none is requested.
pub const DEFAULT_ALGORITHM: &str = "sha512";

impl Algorithm {
    pub const ALL: [Algorithm; 7] = [
        Algorithm::Md5,
        Algorithm::Whirlpool,
        Algorithm::Sha1,
        Algorithm::Sha224,
        Algorithm::Sha256,
        Algorithm::Sha384,
        Algorithm::Sha512,
    ];

    /// Look up a known algorithm by name, ignoring ASCII case.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|alg| alg.name().eq_ignore_ascii_case(name))
    }

    pub fn name(self) -> &'static str {
        match self {
            Algorithm::Md5 => "md5",
            Algorithm::Whirlpool => "whirlpool",
            Algorithm::Sha1 => "sha1",
            Algorithm::Sha224 => "sha224",
            Algorithm::Sha256 => "sha256",
            Algorithm::Sha384 => "sha384",
            Algorithm::Sha512 => "sha512",
        }
    }

    /// Digest length in bytes.
    pub fn digest_len(self) -> usize {
        match self {
            Algorithm::Md5 => 16,
            Algorithm::Whirlpool => 64,
            Algorithm::Sha1 => 20,
            Algorithm::Sha224 => 28,
            Algorithm::Sha256 => 32,
            Algorithm::Sha384 => 48,
            Algorithm::Sha512 => 64,
        }
    }

    /// Fresh incremental hasher for this algorithm.
    pub fn hasher(self) -> Box<dyn DynDigest + Send> {
        match self {
            Algorithm::Md5 => Box::new(md5::Md5::default()),
            Algorithm::Whirlpool => Box::new(whirlpool::Whirlpool::default()),
            Algorithm::Sha1 => Box::new(sha1::Sha1::default()),
            Algorithm::Sha224 => Box::new(sha2::Sha224::default()),
            Algorithm::Sha256 => Box::new(sha2::Sha256::default()),
            Algorithm::Sha384 => Box::new(sha2::Sha384::default()),
            Algorithm::Sha512 => Box::new(sha2::Sha512::default()),
        }
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Lowercased algorithm name as stored in an [`Integrity`](crate::integrity::Integrity).
///
/// Ordered by strength: known names follow [`Algorithm`] order and rank above
/// every unknown name; unknown names compare lexically among themselves.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AlgorithmName(String);

impl AlgorithmName {
    pub fn new(name: &str) -> Self {
        Self(name.to_ascii_lowercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The hashable algorithm behind this name, if this build knows it.
    pub fn known(&self) -> Option<Algorithm> {
        Algorithm::from_name(&self.0)
    }
}

impl Ord for AlgorithmName {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self.known(), other.known()) {
            (Some(a), Some(b)) => a.cmp(&b),
            (Some(_), None) => Ordering::Greater,
            (None, Some(_)) => Ordering::Less,
            (None, None) => self.0.cmp(&other.0),
        }
    }
}

impl PartialOrd for AlgorithmName {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for AlgorithmName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_name_is_case_insensitive() {
        assert_eq!(Algorithm::from_name("SHA256"), Some(Algorithm::Sha256));
        assert_eq!(Algorithm::from_name("md5"), Some(Algorithm::Md5));
        assert_eq!(Algorithm::from_name("blake3"), None);
    }

    #[test]
    fn hasher_output_matches_digest_len() {
        for alg in Algorithm::ALL {
            let mut h = alg.hasher();
            h.update(b"abc");
            assert_eq!(h.finalize().len(), alg.digest_len(), "{alg}");
        }
    }

    #[test]
    fn ranking_weakest_to_strongest() {
        let mut names: Vec<AlgorithmName> = ["sha512", "md5", "sha256", "whirlpool", "sha1", "sha384", "sha224"]
            .iter()
            .map(|n| AlgorithmName::new(n))
            .collect();
        names.sort();
        let sorted: Vec<&str> = names.iter().map(AlgorithmName::as_str).collect();
        assert_eq!(
            sorted,
            ["md5", "whirlpool", "sha1", "sha224", "sha256", "sha384", "sha512"]
        );
    }

    #[test]
    fn unknown_names_rank_below_known_and_lexically() {
        let mut names = vec![
            AlgorithmName::new("md5"),
            AlgorithmName::new("zzz"),
            AlgorithmName::new("blake3"),
        ];
        names.sort();
        let sorted: Vec<&str> = names.iter().map(AlgorithmName::as_str).collect();
        assert_eq!(sorted, ["blake3", "zzz", "md5"]);
    }
}
