use std::hash::{BuildHasher, Hasher};

use fleece_hash::HashAlgorithm;

/// Hasher that feeds written bytes through a [`HashAlgorithm`], for maps keyed
/// by [`Slice`](crate::Slice) or [`AllocSlice`](crate::AllocSlice).
///
/// Hashing one of those keys is a single write, so `finish` returns the same
/// value as [`Slice::hash_with`](crate::Slice::hash_with) widened to `u64`.
#[derive(Debug, Clone)]
pub struct SliceHasher {
    algorithm: HashAlgorithm,
    state: u64,
}

impl SliceHasher {
    pub fn new(algorithm: HashAlgorithm) -> SliceHasher {
        SliceHasher {
            algorithm,
            state: 0,
        }
    }
}

impl Default for SliceHasher {
    fn default() -> Self {
        SliceHasher::new(HashAlgorithm::DEFAULT)
    }
}

impl Hasher for SliceHasher {
    fn write(&mut self, bytes: &[u8]) {
        let hash = u64::from(self.algorithm.hash(bytes));
        self.state = self.state.rotate_left(32) ^ hash;
    }

    fn finish(&self) -> u64 {
        self.state
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct BuildSliceHasher {
    algorithm: HashAlgorithm,
}

impl BuildSliceHasher {
    pub fn new(algorithm: HashAlgorithm) -> BuildSliceHasher {
        BuildSliceHasher { algorithm }
    }
}

impl BuildHasher for BuildSliceHasher {
    type Hasher = SliceHasher;

    fn build_hasher(&self) -> SliceHasher {
        SliceHasher::new(self.algorithm)
    }
}
