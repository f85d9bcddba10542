use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

use ir_tensor::{PackedMatrix, Shape, Tensor};

use crate::error::Result;
use crate::kernel::OpKernel;

/// How a kernel holds its packed right operand.
///
/// Starts `Unpacked` and moves at most once, to `Owned` (packed privately)
/// or `Borrowed` (shared through a [`PrepackedWeight`]). Only the cache entry
/// decides when a borrowed buffer is released.
#[derive(Debug, Default)]
pub enum PackState {
    #[default]
    Unpacked,
    Owned {
        matrix: PackedMatrix,
        shape: Shape,
    },
    Borrowed {
        matrix: Arc<PackedMatrix>,
        shape: Shape,
    },
}

impl PackState {
    /// The packed matrix and the shape of the operand it was built from.
    pub fn packed(&self) -> Option<(&PackedMatrix, &Shape)> {
        match self {
            PackState::Unpacked => None,
            PackState::Owned { matrix, shape } => Some((matrix, shape)),
            PackState::Borrowed { matrix, shape } => Some((matrix.as_ref(), shape)),
        }
    }

    pub fn is_resolved(&self) -> bool {
        !matches!(self, PackState::Unpacked)
    }

    pub fn is_owned(&self) -> bool {
        matches!(self, PackState::Owned { .. })
    }

    pub fn is_borrowed(&self) -> bool {
        matches!(self, PackState::Borrowed { .. })
    }
}

/// Contents of a filled cache entry.
///
/// `trans_b` is the transpose setting absorbed into the packed layout; the
/// pack is only usable by kernels with the same setting.
#[derive(Debug, Clone)]
pub struct CachedPack {
    pub matrix: Arc<PackedMatrix>,
    pub shape: Shape,
    pub trans_b: bool,
}

/// One shared packed weight, filled at most once.
#[derive(Debug, Default)]
pub struct PrepackedWeight {
    slot: Mutex<Option<CachedPack>>,
}

impl PrepackedWeight {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_filled(&self) -> bool {
        self.slot.lock().is_some()
    }

    /// The stored pack, if the entry has been filled.
    pub fn get(&self) -> Option<CachedPack> {
        self.slot.lock().clone()
    }

    /// Store `matrix` unless the entry is already filled, and return what the
    /// entry holds afterwards. A losing publisher gets its own buffer back.
    pub fn publish(
        &self,
        matrix: PackedMatrix,
        shape: Shape,
        trans_b: bool,
    ) -> (CachedPack, Option<PackedMatrix>) {
        let mut slot = self.slot.lock();
        if let Some(existing) = slot.as_ref() {
            log::debug!(
                "prepacked weight {} (trans_b={}) already filled",
                existing.shape,
                existing.trans_b
            );
            return (existing.clone(), Some(matrix));
        }
        let cached = CachedPack {
            matrix: Arc::new(matrix),
            shape,
            trans_b,
        };
        log::debug!(
            "published prepacked weight {} trans_b={} ({} values)",
            cached.shape,
            cached.trans_b,
            cached.matrix.len()
        );
        *slot = Some(cached.clone());
        (cached, None)
    }
}

/// Session-wide map from constant operand identity to its shared pack.
#[derive(Debug, Default)]
pub struct PrepackCache {
    entries: Mutex<HashMap<String, Arc<PrepackedWeight>>>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl PrepackCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// The entry for `key`, created empty on first request.
    pub fn entry(&self, key: &str) -> Arc<PrepackedWeight> {
        let mut entries = self.entries.lock();
        if let Some(existing) = entries.get(key) {
            self.hits.fetch_add(1, Ordering::Relaxed);
            log::debug!("prepack_cache hit key={}", key);
            return existing.clone();
        }
        self.misses.fetch_add(1, Ordering::Relaxed);
        log::debug!("prepack_cache miss key={}", key);
        let entry = Arc::new(PrepackedWeight::new());
        entries.insert(key.to_string(), entry.clone());
        entry
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.lock().contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// (hits, misses) of [`PrepackCache::entry`].
    pub fn counters(&self) -> (u64, u64) {
        (
            self.hits.load(Ordering::Relaxed),
            self.misses.load(Ordering::Relaxed),
        )
    }

    /// Hand constant input `input_idx` of `kernel` to the cache under `key`:
    /// adopt the shared pack if one exists, otherwise let the kernel pack and
    /// publish it. Returns whether the kernel now reads the input packed.
    pub fn prepack<K: OpKernel + ?Sized>(
        &self,
        key: &str,
        kernel: &mut K,
        tensor: &Tensor,
        input_idx: usize,
    ) -> Result<bool> {
        let entry = self.entry(key);
        if entry.is_filled() {
            kernel.use_cached_prepacked_weight(&entry, input_idx)
        } else {
            kernel.pre_pack(tensor, input_idx, Some(&entry))
        }
    }
}
