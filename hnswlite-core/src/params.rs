//! Construction-time configuration for [`crate::VectorIndex`].
//!
//! There is no external configuration crate here (no `figment`/`toml`): every
//! tunable is a plain constructor parameter, mirroring the way the rest of
//! this codebase keeps its small config structs (e.g. the graph core's own
//! internal parameters) next to the type they configure.

/// Which [`crate::store::VectorStore`] backend to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StorageBackend {
    /// A single contiguous allocation addressed by `id * dims`.
    #[default]
    Contiguous,
    /// One owned boxed slice per id.
    PerSlot,
}

/// Which neighbor-list pruning rule to use when an existing node's adjacency
/// list overflows its per-layer cap after a new bidirectional link.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ShrinkStrategy {
    /// Re-apply the diversity heuristic over the combined candidate set.
    /// Slower, but the one the recall-correctness tests are written against.
    #[default]
    Heuristic,
    /// Keep the `cap - 1` nearest existing neighbors, then always keep the
    /// new link regardless of diversity. A speed/quality knob for callers
    /// that can tolerate lower recall in exchange for cheaper inserts.
    Greedy,
}

/// Construction parameters for an HNSW index.
#[derive(Debug, Clone, Copy)]
pub struct IndexOptions {
    /// Maximum connections per node at layers >= 1 (M). Layer 0 uses `2*M`.
    pub max_connections: u16,

    /// Candidate-list width used during insertion (`ef_construction`).
    pub ef_construction: u32,

    /// Default candidate-list width used during search (`ef_search`),
    /// reported via [`crate::IndexStats`]. `search` also accepts an explicit
    /// per-call `ef_search` argument; this value is only a convenience
    /// default for callers that want one place to configure it.
    pub ef_search: u32,

    /// Which vector storage backend to allocate.
    pub storage: StorageBackend,

    /// Which shrink strategy to use when pruning overflowing neighbor lists.
    pub shrink_strategy: ShrinkStrategy,

    /// Seed for the level generator's random source. `None` draws from
    /// system entropy once at construction, giving a different (but still
    /// internally consistent) level assignment on every run.
    pub rng_seed: Option<u64>,
}

impl Default for IndexOptions {
    fn default() -> Self {
        Self {
            max_connections: 16,
            ef_construction: 100,
            ef_search: 50,
            storage: StorageBackend::Contiguous,
            shrink_strategy: ShrinkStrategy::Heuristic,
            rng_seed: None,
        }
    }
}

impl IndexOptions {
    /// Per-layer-0 neighbor cap (`2*M`).
    #[must_use]
    pub fn cap_layer0(&self) -> usize {
        usize::from(self.max_connections) * 2
    }

    /// Per-layer neighbor cap for layers >= 1 (`M`).
    #[must_use]
    pub fn cap_upper_layer(&self) -> usize {
        usize::from(self.max_connections)
    }

    /// Neighbor cap for the given layer.
    #[must_use]
    pub fn cap(&self, layer: usize) -> usize {
        if layer == 0 {
            self.cap_layer0()
        } else {
            self.cap_upper_layer()
        }
    }

    /// Validates this configuration, panicking on programmer error.
    ///
    /// # Panics
    ///
    /// Panics if `max_connections <= 1` or `ef_construction == 0`.
    pub fn validate(&self) {
        assert!(
            self.max_connections > 1,
            "max_connections must be > 1, got {}",
            self.max_connections
        );
        assert!(self.ef_construction > 0, "ef_construction must be > 0");
    }
}
