//! Shared sort primitives.
//!
//! `build`, `wait` and `extractTuples` all need the same thing: sort a key
//! array and permute one or more parallel payload arrays identically.
//! Rather than hand-rolling a merge sort, `argsort_stable` computes a
//! stable permutation with `rayon`'s parallel sort (itself a parallel
//! merge sort) and `apply_permutation` replays it over any number of
//! payload arrays — this is the one building block `qsort_1a`/`qsort_1b`/
//! `msort_2`/`msort_3` all reduce to.

use rayon::prelude::*;

/// Sort `int64[n]` in place. No payload to permute — matches `qsort_1a`.
pub fn qsort_1a(keys: &mut [i64]) {
    keys.par_sort_unstable();
}

/// Sort `int64[n]` as the primary key while permuting a parallel payload
/// array identically — matches `qsort_1b`.
pub fn qsort_1b<T: Clone + Send>(keys: &mut [i64], payload: &mut [T]) {
    assert_eq!(keys.len(), payload.len());
    let perm = argsort_stable(keys);
    apply_permutation(keys, &perm);
    apply_permutation(payload, &perm);
}

/// Stable lexicographic sort over 2-key tuples, permuting one payload
/// array identically — matches `msort_2`.
pub fn msort_2<T: Clone + Send>(keys: &mut [(i64, i64)], payload: &mut [T]) {
    assert_eq!(keys.len(), payload.len());
    let perm = argsort_stable(keys);
    apply_permutation(keys, &perm);
    apply_permutation(payload, &perm);
}

/// Stable lexicographic sort over 3-key tuples, permuting one payload
/// array identically — matches `msort_3`.
pub fn msort_3<T: Clone + Send>(keys: &mut [(i64, i64, i64)], payload: &mut [T]) {
    assert_eq!(keys.len(), payload.len());
    let perm = argsort_stable(keys);
    apply_permutation(keys, &perm);
    apply_permutation(payload, &perm);
}

/// Compute the permutation that stably sorts `keys` ascending, without
/// moving `keys` itself. `rayon`'s parallel sort is stable, so ties keep
/// their relative (arrival) order — the property `build`'s
/// duplicate-reduction and `wait`'s pending-merge both rely on.
pub fn argsort_stable<K: Ord + Copy + Sync>(keys: &[K]) -> Vec<usize> {
    let mut idx: Vec<usize> = (0..keys.len()).collect();
    idx.par_sort_by_key(|&i| keys[i]);
    idx
}

/// Reorder `data` according to `perm` (as produced by [`argsort_stable`]):
/// `data[k] <- data[perm[k]]` for all `k`.
pub fn apply_permutation<T: Clone>(data: &mut [T], perm: &[usize]) {
    assert_eq!(data.len(), perm.len());
    let reordered: Vec<T> = perm.iter().map(|&i| data[i].clone()).collect();
    data.clone_from_slice(&reordered);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn qsort_1b_permutes_payload_with_keys() {
        let mut keys = vec![3, 1, 2];
        let mut payload = vec!["c", "a", "b"];
        qsort_1b(&mut keys, &mut payload);
        assert_eq!(keys, vec![1, 2, 3]);
        assert_eq!(payload, vec!["a", "b", "c"]);
    }

    #[test]
    fn msort_2_is_lexicographic_and_stable_on_ties() {
        let mut keys = vec![(1, 2), (0, 9), (1, 1), (1, 1)];
        let mut payload = vec!["first-1-2", "first-0-9", "first-1-1-a", "second-1-1-b"];
        msort_2(&mut keys, &mut payload);
        assert_eq!(keys, vec![(0, 9), (1, 1), (1, 1), (1, 2)]);
        assert_eq!(payload, vec!["first-0-9", "first-1-1-a", "second-1-1-b", "first-1-2"]);
    }

    #[test]
    fn argsort_then_apply_round_trips_identity() {
        let keys = vec![5, 3, 4, 1, 2];
        let perm = argsort_stable(&keys);
        let mut sorted_keys = keys.clone();
        apply_permutation(&mut sorted_keys, &perm);
        assert_eq!(sorted_keys, vec![1, 2, 3, 4, 5]);
    }
}
