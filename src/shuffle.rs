//! Random source abstraction and shuffling
//!
//! Every random decision in the crate (chunk order, item sampling, lit-set
//! seeding and rotation) goes through [`RandomSource`], so a seeded generator
//! or a scripted source can be swapped in to reproduce exact sequences.

/// A source of uniformly distributed indices.
pub trait RandomSource {
    /// Returns a uniformly random integer in `0..n`.
    ///
    /// `n` must be non-zero.
    fn below(&mut self, n: usize) -> usize;
}

impl<R: rand::RngCore> RandomSource for R {
    fn below(&mut self, n: usize) -> usize {
        use rand::Rng;
        self.gen_range(0..n)
    }
}

/// Shuffle a slice in place with the Fisher–Yates algorithm.
///
/// Walks from the last element down, swapping each position `i` with a
/// uniformly chosen `j` in `0..=i`.
pub fn shuffle<T, R: RandomSource + ?Sized>(items: &mut [T], rng: &mut R) {
    for i in (1..items.len()).rev() {
        let j = rng.below(i + 1);
        items.swap(i, j);
    }
}

/// Return a shuffled copy of `items`, leaving the input untouched.
pub fn shuffled<T: Clone, R: RandomSource + ?Sized>(items: &[T], rng: &mut R) -> Vec<T> {
    let mut copy = items.to_vec();
    shuffle(&mut copy, rng);
    copy
}

/// Choose `min(count, domain)` distinct indices from `0..domain`, uniformly
/// without replacement.
///
/// Uses a partial Fisher–Yates pass over the index range, so it terminates
/// in `count` draws regardless of how full the domain is.
pub fn sample_distinct<R: RandomSource + ?Sized>(domain: usize, count: usize, rng: &mut R) -> Vec<usize> {
    let take = count.min(domain);
    let mut pool: Vec<usize> = (0..domain).collect();
    for i in 0..take {
        let j = i + rng.below(domain - i);
        pool.swap(i, j);
    }
    pool.truncate(take);
    pool
}

/// A random source that replays a fixed script, for deterministic tests.
///
/// Each draw returns the next scripted value modulo `n`; once the script is
/// exhausted every draw returns `0`.
#[derive(Debug, Clone, Default)]
pub struct ScriptedRandom {
    script: std::collections::VecDeque<usize>,
}

impl ScriptedRandom {
    pub fn new(script: impl IntoIterator<Item = usize>) -> Self {
        Self { script: script.into_iter().collect() }
    }

    /// Number of scripted values not yet consumed.
    pub fn remaining(&self) -> usize {
        self.script.len()
    }
}

impl RandomSource for ScriptedRandom {
    fn below(&mut self, n: usize) -> usize {
        self.script.pop_front().map(|v| v % n).unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::collections::HashSet;

    #[test]
    fn test_shuffle_is_permutation() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut items: Vec<u32> = (0..256).collect();
        shuffle(&mut items, &mut rng);

        let mut sorted = items.clone();
        sorted.sort_unstable();
        assert_eq!(sorted, (0..256).collect::<Vec<_>>());
    }

    #[test]
    fn test_shuffle_scripted_swaps() {
        // i=3 swaps with 0, i=2 stays, i=1 swaps with 0
        let mut rng = ScriptedRandom::new([0, 2, 0]);
        let mut items = vec!['a', 'b', 'c', 'd'];
        shuffle(&mut items, &mut rng);
        assert_eq!(items, vec!['b', 'd', 'c', 'a']);
        assert_eq!(rng.remaining(), 0);
    }

    #[test]
    fn test_shuffle_empty_and_single() {
        let mut rng = ScriptedRandom::default();
        let mut empty: Vec<u8> = vec![];
        shuffle(&mut empty, &mut rng);
        assert!(empty.is_empty());

        let mut single = vec![9];
        shuffle(&mut single, &mut rng);
        assert_eq!(single, vec![9]);
    }

    #[test]
    fn test_shuffled_leaves_input_untouched() {
        let mut rng = StdRng::seed_from_u64(1);
        let input = vec![1, 2, 3, 4, 5];
        let out = shuffled(&input, &mut rng);
        assert_eq!(input, vec![1, 2, 3, 4, 5]);
        assert_eq!(out.len(), 5);
    }

    #[test]
    fn test_sample_distinct_bounds() {
        let mut rng = StdRng::seed_from_u64(99);
        for domain in 0..12 {
            let picked = sample_distinct(domain, 3, &mut rng);
            assert_eq!(picked.len(), 3.min(domain));
            let unique: HashSet<_> = picked.iter().copied().collect();
            assert_eq!(unique.len(), picked.len());
            assert!(picked.iter().all(|&i| i < domain));
        }
    }

    #[test]
    fn test_sample_distinct_scripted() {
        // pool [0,1,2,3,4]: i=0 swaps 0<->4, i=1 swaps 1<->1
        let mut rng = ScriptedRandom::new([4, 0]);
        assert_eq!(sample_distinct(5, 2, &mut rng), vec![4, 1]);
    }

    #[test]
    fn test_scripted_random_wraps_and_defaults() {
        let mut rng = ScriptedRandom::new([7]);
        assert_eq!(rng.below(5), 2);
        assert_eq!(rng.below(5), 0);
    }

    #[test]
    fn test_works_through_dyn_source() {
        let mut rng = StdRng::seed_from_u64(3);
        let source: &mut dyn RandomSource = &mut rng;
        let mut items = vec![1, 2, 3];
        shuffle(&mut items, source);
        assert_eq!(items.len(), 3);
    }
}
