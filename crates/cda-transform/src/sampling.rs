//! Seeded subject sampling.

use rand::SeedableRng;
use rand::seq::index::sample;
use rand_chacha::ChaCha8Rng;

/// Pick `n` of `len` indices uniformly without replacement, stable for a
/// fixed seed. Returned indices are sorted so selection preserves the
/// caller's traversal order.
pub fn sample_indices(len: usize, n: usize, seed: u64) -> Vec<usize> {
    if n >= len {
        return (0..len).collect();
    }
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut picked = sample(&mut rng, len, n).into_vec();
    picked.sort_unstable();
    picked
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_seed_same_selection() {
        assert_eq!(sample_indices(50, 10, 7), sample_indices(50, 10, 7));
    }

    #[test]
    fn different_seeds_usually_differ() {
        assert_ne!(sample_indices(1000, 10, 1), sample_indices(1000, 10, 2));
    }

    #[test]
    fn oversized_request_returns_everything() {
        assert_eq!(sample_indices(3, 10, 0), vec![0, 1, 2]);
    }

    #[test]
    fn selection_is_sorted_and_distinct() {
        let picked = sample_indices(100, 20, 42);
        assert_eq!(picked.len(), 20);
        assert!(picked.windows(2).all(|w| w[0] < w[1]));
    }
}
