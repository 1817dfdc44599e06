//! Registry fingerprints.
//!
//! A SHA-256 digest over the sorted set of registered host types, failed
//! families and direct calls that failed to bind. Two initializations
//! against different runtimes or configurations can be compared by
//! fingerprint alone.

use std::collections::BTreeSet;
use std::fmt;

use braid_core::HostType;
use sha2::{Digest, Sha256};

/// A registry fingerprint (SHA-256 hex digest).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Fingerprint(String);

impl Fingerprint {
    pub fn compute<'a, T, F, U>(types: T, failed: F, unbound: U) -> Self
    where
        T: IntoIterator<Item = &'a HostType>,
        F: IntoIterator<Item = &'a str>,
        U: IntoIterator<Item = &'a str>,
    {
        let mut lines: BTreeSet<String> = types.into_iter().map(|t| format!("type {t}\n")).collect();
        lines.extend(failed.into_iter().map(|f| format!("failed {f}\n")));
        lines.extend(unbound.into_iter().map(|c| format!("unbound {c}\n")));

        let mut hasher = Sha256::new();
        for line in &lines {
            hasher.update(line.as_bytes());
        }
        Fingerprint(hex_encode(&hasher.finalize()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The first 12 hex digits, for display.
    pub fn short(&self) -> &str {
        &self.0[..12]
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

fn hex_encode(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn types(names: &[&str]) -> Vec<HostType> {
        names.iter().map(|n| HostType::parse(n).unwrap()).collect()
    }

    #[test]
    fn order_does_not_matter() {
        let a = Fingerprint::compute(&types(&["Int", "Array<Int>"]), ["Rational"], ["cube"]);
        let b = Fingerprint::compute(&types(&["Array<Int>", "Int"]), ["Rational"], ["cube"]);
        assert_eq!(a, b);
        assert_eq!(a.as_str().len(), 64);
        assert_eq!(a.short().len(), 12);
    }

    #[test]
    fn failures_change_the_fingerprint() {
        let ok = Fingerprint::compute(&types(&["Int"]), Vec::<&str>::new(), Vec::<&str>::new());
        let failed = Fingerprint::compute(&types(&["Int"]), ["Rational"], Vec::<&str>::new());
        let unbound = Fingerprint::compute(&types(&["Int"]), Vec::<&str>::new(), ["Rational"]);
        assert_ne!(ok, failed);
        assert_ne!(failed, unbound);
    }

    #[test]
    fn empty_registry_hashes_empty_input() {
        let empty = Fingerprint::compute(&types(&[]), Vec::<&str>::new(), Vec::<&str>::new());
        assert_eq!(
            empty.as_str(),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }
}
