//! Partition relabelling helpers.

use std::collections::HashMap;

use sbm_core::Block;

/// Relabels `labels` in place by order of first appearance.
///
/// Labels already present in `map` keep their image; unseen labels receive
/// the next unused index, starting at `map.len()`. The map is extended, so
/// several vectors can be relabelled consistently.
pub fn vector_map(labels: &mut [Block], map: &mut HashMap<Block, Block>) {
    for label in labels.iter_mut() {
        let next = map.len();
        *label = *map.entry(*label).or_insert(next);
    }
}

/// Relabels `labels` to `0..k` by first appearance and returns `k`.
pub fn continuous_map(labels: &mut [Block]) -> usize {
    let mut map = HashMap::new();
    vector_map(labels, &mut map);
    map.len()
}

/// Inverse of a label vector: entry `x` holds the last position carrying
/// label `x`, or `None` when `x` does not occur.
pub fn vector_rmap(labels: &[Block]) -> Vec<Option<usize>> {
    let size = labels.iter().max().map_or(0, |&m| m + 1);
    let mut rmap = vec![None; size];
    for (i, &x) in labels.iter().enumerate() {
        rmap[x] = Some(i);
    }
    rmap
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn continuous_map_uses_first_appearance() {
        let mut labels = vec![7, 3, 7, 9, 3];
        assert_eq!(continuous_map(&mut labels), 3);
        assert_eq!(labels, vec![0, 1, 0, 2, 1]);
    }

    #[test]
    fn shared_map_keeps_images() {
        let mut map = HashMap::new();
        let mut first = vec![5, 2];
        let mut second = vec![2, 8, 5];
        vector_map(&mut first, &mut map);
        vector_map(&mut second, &mut map);
        assert_eq!(first, vec![0, 1]);
        assert_eq!(second, vec![1, 2, 0]);
    }

    #[test]
    fn rmap_inverts_permutations() {
        let rmap = vector_rmap(&[2, 0, 1]);
        assert_eq!(rmap, vec![Some(1), Some(2), Some(0)]);
        assert_eq!(vector_rmap(&[3]), vec![None, None, None, Some(0)]);
        assert!(vector_rmap(&[]).is_empty());
    }
}
