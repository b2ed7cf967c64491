//! The HNSW graph: node table, entry point/max-layer bookkeeping, and the
//! insertion algorithm (§4.5.3) that ties the vector store, level generator,
//! beam search and diversity heuristic together.

use std::cell::RefCell;

use crate::hnsw::adjacency::AdjacencyList;
use crate::hnsw::level::LevelGenerator;
use crate::hnsw::search::{Scratch, SearchScratch};
use crate::params::IndexOptions;
use crate::store::VectorStore;

/// One inserted node: its assigned top layer and one neighbor list per
/// layer in `0..=top_layer`.
#[derive(Debug)]
pub(crate) struct NodeEntry {
    pub(crate) top_layer: usize,
    pub(crate) layers: Vec<AdjacencyList>,
}

/// The HNSW graph core.
///
/// Owns the vector store, the per-node adjacency table, the level
/// generator, and the scratch space `search_layer` reuses across calls.
/// Mirrors the "index façade glues graph core" split: this type is the
/// graph core; [`crate::index::VectorIndex`] is the façade wrapping it.
#[derive(Debug)]
pub struct HnswGraph {
    pub(crate) store: VectorStore,
    pub(crate) options: IndexOptions,
    levels: LevelGenerator,
    nodes: Vec<NodeEntry>,
    pub(crate) entry_point: Option<u32>,
    pub(crate) max_layer: usize,
    pub(crate) scratch: Scratch,
}

impl HnswGraph {
    /// Builds an empty graph over a freshly allocated vector store.
    #[must_use]
    pub fn new(dimensions: u32, capacity: u32, options: IndexOptions) -> Self {
        options.validate();
        let store = VectorStore::new(options.storage, dimensions, capacity);
        let levels = LevelGenerator::new(options.max_connections, options.rng_seed);
        Self {
            store,
            options,
            levels,
            nodes: Vec::with_capacity(capacity as usize),
            entry_point: None,
            max_layer: 0,
            scratch: RefCell::new(SearchScratch::new(capacity as usize)),
        }
    }

    /// Number of nodes inserted so far.
    #[must_use]
    pub fn len(&self) -> u64 {
        self.store.len()
    }

    /// Whether no nodes have been inserted yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Dimensionality of stored vectors.
    #[must_use]
    pub fn dimensions(&self) -> u32 {
        self.store.dimensions()
    }

    /// A node's assigned top layer.
    ///
    /// # Panics
    ///
    /// Panics if `id` does not refer to an inserted node.
    #[must_use]
    pub(crate) fn top_layer(&self, id: u32) -> usize {
        self.nodes[id as usize].top_layer
    }

    /// Read-only view of `id`'s neighbor ids at `layer`. Empty if `id` has
    /// no adjacency list at that layer (i.e. `layer > top_layer(id)`).
    #[must_use]
    pub(crate) fn neighbors(&self, id: u32, layer: usize) -> &[u32] {
        self.nodes[id as usize]
            .layers
            .get(layer)
            .map_or(&[], |list| list.as_slice())
    }

    /// Squared Euclidean distance from `query` to the vector stored at `id`.
    #[must_use]
    pub(crate) fn distance_to(&self, query: &[f32], id: u32) -> f32 {
        crate::distance::squared_euclidean(query, self.store.get(u64::from(id)))
    }

    /// Squared Euclidean distance between two stored vectors.
    #[must_use]
    pub(crate) fn distance_between(&self, a: u32, b: u32) -> f32 {
        crate::distance::squared_euclidean(self.store.get(u64::from(a)), self.store.get(u64::from(b)))
    }

    /// Mutable access to `id`'s per-layer adjacency lists, for [`crate::hnsw::link`].
    pub(crate) fn node_layers_mut(&mut self, id: u32) -> &mut Vec<AdjacencyList> {
        &mut self.nodes[id as usize].layers
    }

    /// Inserts `vector`, returning its newly assigned id (§4.5.3).
    ///
    /// # Panics
    ///
    /// Panics if `vector.len()` does not match [`Self::dimensions`] or if
    /// the store is already at capacity (both are [`VectorStore::put`]
    /// preconditions).
    pub fn insert(&mut self, vector: &[f32]) -> u32 {
        let new_id = u32::try_from(self.store.put(vector))
            .expect("vector store capacity is u32, id must fit");
        let new_top = self.levels.sample_level();

        self.nodes.push(NodeEntry {
            top_layer: new_top,
            layers: (0..=new_top)
                .map(|layer| {
                    let hint = if layer == 0 { self.options.cap_layer0() + 1 } else { 4 };
                    AdjacencyList::with_capacity(hint)
                })
                .collect(),
        });

        let Some(entry_point) = self.entry_point else {
            self.entry_point = Some(new_id);
            self.max_layer = new_top;
            return new_id;
        };

        let mut cur = entry_point;
        let mut layer = self.max_layer;
        while layer > new_top {
            cur = self.search_layer(vector, cur, 1, layer)[0].id;
            layer -= 1;
        }

        let top = new_top.min(self.max_layer);
        let mut layer = top;
        loop {
            let cands = self.search_layer(vector, cur, self.options.ef_construction as usize, layer);
            cur = cands[0].id;

            // The new node's own list is always capped at M, even at layer
            // 0 where existing nodes' backlink-driven cap is 2M (§3: "During
            // neighbor selection for a new node's own list, the cap is M at
            // every layer").
            let own_cap = self.options.cap_upper_layer();
            let chosen = self.select_neighbors(&cands, new_id, own_cap);

            for &nb in &chosen {
                self.nodes[new_id as usize].layers[layer].push(nb);
                self.link_back(nb, new_id, layer);
            }

            if layer == 0 {
                break;
            }
            layer -= 1;
        }

        if new_top > self.max_layer {
            self.entry_point = Some(new_id);
            self.max_layer = new_top;
        }

        new_id
    }

    /// Appends `new_id` to `nb`'s layer-`layer` adjacency list, shrinking it
    /// back to cap via the configured [`crate::params::ShrinkStrategy`] if
    /// the append would overflow (§4.5.4).
    fn link_back(&mut self, nb: u32, new_id: u32, layer: usize) {
        let cap = self.options.cap(layer);
        let nb_layer = &mut self.nodes[nb as usize].layers[layer];
        if nb_layer.len() < cap {
            nb_layer.push(new_id);
            return;
        }
        self.shrink(nb, new_id, layer, cap);
    }
}
