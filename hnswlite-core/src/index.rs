//! The public index façade (§4.6, §6): the only type application code
//! touches. Wraps [`crate::hnsw::HnswGraph`] and adds the two pieces the
//! graph core itself has no business tracking — construction-time options
//! it was built from, and cumulative insert timing for [`IndexStats`].

use std::time::Instant;

use crate::hnsw::{HnswGraph, SearchResult as GraphSearchResult};
use crate::params::IndexOptions;

/// One search result: a node id and its squared distance to the query.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SearchResult {
    /// Node id.
    pub id: u64,
    /// Squared Euclidean distance to the query.
    pub distance: f32,
}

/// A snapshot of index configuration and size, per §6.
#[derive(Debug, Clone, Copy)]
pub struct IndexStats {
    /// Maximum connections per node at upper layers (M).
    pub max_connections: u16,
    /// Candidate-list width used during insertion.
    pub ef_construction: u32,
    /// Configured default candidate-list width for search.
    pub ef_search: u32,
    /// Dimensionality of stored vectors.
    pub dimensions: u32,
    /// Number of vectors inserted so far.
    pub node_count: u64,
    /// Top layer of the current entry point (0 if empty).
    pub max_layer: usize,
    /// Current entry point id, if any node has been inserted.
    pub entry_point: Option<u64>,
    /// Cumulative wall-clock time spent inside [`VectorIndex::insert`],
    /// in milliseconds, since construction.
    pub cumulative_insert_time_ms: f64,
}

/// An in-memory HNSW approximate nearest neighbor index.
///
/// Not safe to share across threads concurrently: insertions are strictly
/// serial and search must not overlap with a concurrent insert on the same
/// instance (§5). `VectorIndex` is `Send` but deliberately does not
/// implement `Sync`-granting concurrency beyond what the compiler gives
/// for free — callers are responsible for external synchronization.
#[derive(Debug)]
pub struct VectorIndex {
    graph: HnswGraph,
    options: IndexOptions,
    cumulative_insert_time_ms: f64,
}

impl VectorIndex {
    /// Constructs a new, empty index for `dimensions`-dimensional vectors
    /// with room for `capacity` of them.
    ///
    /// # Panics
    ///
    /// Panics if `options` fails validation (`max_connections <= 1` or
    /// `ef_construction == 0`), or if `dimensions == 0` or `capacity == 0`.
    #[must_use]
    pub fn new(dimensions: u32, capacity: u32, options: IndexOptions) -> Self {
        let graph = HnswGraph::new(dimensions, capacity, options);
        Self { graph, options, cumulative_insert_time_ms: 0.0 }
    }

    /// Inserts `vector`, returning the id it was assigned (equal to the
    /// previous node count).
    ///
    /// # Panics
    ///
    /// Panics if `vector.len() != dimensions` or the index is already at
    /// capacity (§4.5.6).
    pub fn insert(&mut self, vector: &[f32]) -> u64 {
        let start = Instant::now();
        let id = self.graph.insert(vector);
        self.cumulative_insert_time_ms += start.elapsed().as_secs_f64() * 1000.0;
        u64::from(id)
    }

    /// Finds up to `k` nearest neighbors of `query` (§4.5.5).
    ///
    /// Returns an empty vector if the index has no nodes yet. Does not
    /// error if `ef_search < k`; it simply returns what it found.
    #[must_use]
    pub fn search(&self, query: &[f32], k: usize, ef_search: usize) -> Vec<SearchResult> {
        self.graph
            .search(query, k, ef_search)
            .into_iter()
            .map(|GraphSearchResult { id, distance }| SearchResult { id: u64::from(id), distance })
            .collect()
    }

    /// Number of vectors inserted so far.
    #[must_use]
    pub fn len(&self) -> u64 {
        self.graph.len()
    }

    /// Whether no vectors have been inserted yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.graph.is_empty()
    }

    /// Dimensionality of vectors this index stores.
    #[must_use]
    pub fn dimensions(&self) -> u32 {
        self.graph.dimensions()
    }

    /// A snapshot of current configuration and size.
    #[must_use]
    pub fn stats(&self) -> IndexStats {
        IndexStats {
            max_connections: self.options.max_connections,
            ef_construction: self.options.ef_construction,
            ef_search: self.options.ef_search,
            dimensions: self.graph.dimensions(),
            node_count: self.graph.len(),
            max_layer: self.graph.max_layer,
            entry_point: self.graph.entry_point.map(u64::from),
            cumulative_insert_time_ms: self.cumulative_insert_time_ms,
        }
    }
}
