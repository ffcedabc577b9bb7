use std::collections::HashMap;

use sbm_core::Block;

/// Sparse-to-dense translation of block labels.
///
/// External labels may be arbitrary; internal statistics are stored in dense
/// vectors. Released dense slots go to a freelist and are handed out again
/// before the dense space grows.
#[derive(Debug, Clone, Default)]
pub struct BlockMap {
    forward: HashMap<Block, usize>,
    reverse: Vec<Option<Block>>,
    free: Vec<usize>,
}

impl BlockMap {
    /// Creates an empty map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Dense index of `block`, if mapped.
    #[inline]
    pub fn lookup(&self, block: Block) -> Option<usize> {
        self.forward.get(&block).copied()
    }

    /// Dense index of `block`, mapping it first if needed.
    pub fn get_or_insert(&mut self, block: Block) -> usize {
        if let Some(&dense) = self.forward.get(&block) {
            return dense;
        }
        let dense = match self.free.pop() {
            Some(dense) => {
                self.reverse[dense] = Some(block);
                dense
            }
            None => {
                self.reverse.push(Some(block));
                self.reverse.len() - 1
            }
        };
        self.forward.insert(block, dense);
        dense
    }

    /// Unmaps `block` and returns its dense slot to the freelist.
    pub fn release(&mut self, block: Block) -> Option<usize> {
        let dense = self.forward.remove(&block)?;
        self.reverse[dense] = None;
        self.free.push(dense);
        Some(dense)
    }

    /// External label stored at a dense index.
    pub fn label(&self, dense: usize) -> Option<Block> {
        self.reverse.get(dense).copied().flatten()
    }

    /// Number of mapped labels.
    pub fn len(&self) -> usize {
        self.forward.len()
    }

    /// Whether no label is mapped.
    pub fn is_empty(&self) -> bool {
        self.forward.is_empty()
    }

    /// Size of the dense index space, including freed slots.
    pub fn dense_len(&self) -> usize {
        self.reverse.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn freed_slots_are_reused() {
        let mut map = BlockMap::new();
        assert_eq!(map.get_or_insert(40), 0);
        assert_eq!(map.get_or_insert(7), 1);
        assert_eq!(map.get_or_insert(40), 0);
        assert_eq!(map.release(40), Some(0));
        assert_eq!(map.lookup(40), None);
        assert_eq!(map.get_or_insert(99), 0);
        assert_eq!(map.label(0), Some(99));
        assert_eq!(map.len(), 2);
        assert_eq!(map.dense_len(), 2);
        assert_eq!(map.release(12345), None);
    }
}
