//! # Unlock Code Generation
//!
//! Every key carries a fixed-size set of secondary unlock codes generated
//! at mint time. The set is immutable for the life of the key.
//!
//! ## Security Invariant
//!
//! Codes come from a CSPRNG — the `CryptoRng` bound on
//! [`UnlockCodeSet::generate`] makes a non-cryptographic generator a
//! compile error. Uniqueness is scoped to the single key: two keys minted
//! in the same batch get independently generated sets.

use std::collections::HashSet;

use rand::{CryptoRng, Rng};
use serde::{Deserialize, Serialize};

/// Number of unlock codes generated per key.
pub const UNLOCK_CODES_PER_KEY: usize = 12;

/// Smallest valid unlock code (inclusive).
pub const UNLOCK_CODE_MIN: u32 = 100_000;

/// Largest valid unlock code (inclusive).
pub const UNLOCK_CODE_MAX: u32 = 999_999;

/// A key's fixed set of 12 distinct 6-digit unlock codes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UnlockCodeSet(Vec<u32>);

impl UnlockCodeSet {
    /// Generate a fresh set of [`UNLOCK_CODES_PER_KEY`] distinct codes.
    ///
    /// Draws uniformly from `[UNLOCK_CODE_MIN, UNLOCK_CODE_MAX]` and
    /// retries on collision until the set is full.
    pub fn generate<R: Rng + CryptoRng>(rng: &mut R) -> Self {
        let mut codes = Vec::with_capacity(UNLOCK_CODES_PER_KEY);
        let mut seen = HashSet::with_capacity(UNLOCK_CODES_PER_KEY);
        while codes.len() < UNLOCK_CODES_PER_KEY {
            let code = rng.gen_range(UNLOCK_CODE_MIN..=UNLOCK_CODE_MAX);
            if seen.insert(code) {
                codes.push(code);
            }
        }
        Self(codes)
    }

    /// The codes in generation order.
    pub fn codes(&self) -> &[u32] {
        &self.0
    }

    /// Whether `code` is a member of this set.
    pub fn contains(&self, code: u32) -> bool {
        self.0.contains(&code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::OsRng;
    use rand::SeedableRng;

    #[test]
    fn test_generates_exact_count() {
        let set = UnlockCodeSet::generate(&mut OsRng);
        assert_eq!(set.codes().len(), UNLOCK_CODES_PER_KEY);
    }

    #[test]
    fn test_codes_are_distinct() {
        let set = UnlockCodeSet::generate(&mut OsRng);
        let unique: HashSet<u32> = set.codes().iter().copied().collect();
        assert_eq!(unique.len(), UNLOCK_CODES_PER_KEY);
    }

    #[test]
    fn test_codes_are_six_digits() {
        let set = UnlockCodeSet::generate(&mut OsRng);
        for &code in set.codes() {
            assert!((UNLOCK_CODE_MIN..=UNLOCK_CODE_MAX).contains(&code), "out of range: {code}");
        }
    }

    #[test]
    fn test_independent_sets_per_key() {
        // Seeded generators at different positions produce different sets;
        // with OsRng two consecutive sets colliding entirely is astronomically
        // unlikely, so distinct sets are the expected observable.
        let a = UnlockCodeSet::generate(&mut OsRng);
        let b = UnlockCodeSet::generate(&mut OsRng);
        assert_ne!(a, b);
    }

    #[test]
    fn test_deterministic_under_seeded_rng() {
        let mut r1 = rand::rngs::StdRng::seed_from_u64(7);
        let mut r2 = rand::rngs::StdRng::seed_from_u64(7);
        assert_eq!(UnlockCodeSet::generate(&mut r1), UnlockCodeSet::generate(&mut r2));
    }

    #[test]
    fn test_contains() {
        let set = UnlockCodeSet::generate(&mut OsRng);
        let first = set.codes()[0];
        assert!(set.contains(first));
        assert!(!set.contains(UNLOCK_CODE_MIN.wrapping_sub(1)));
    }

    #[test]
    fn test_serde_roundtrip() {
        let set = UnlockCodeSet::generate(&mut OsRng);
        let json = serde_json::to_string(&set).unwrap();
        let parsed: UnlockCodeSet = serde_json::from_str(&json).unwrap();
        assert_eq!(set, parsed);
    }
}
