//! The diversity heuristic (§4.5.2) and bidirectional-link shrinking
//! (§4.5.4).
//!
//! Grounded on the lazy, symmetric pairwise-distance-cache technique the
//! teacher's original linking module used to avoid recomputing distances
//! between the same pair of candidates twice during a single selection
//! pass — kept here as a plain `HashMap`-backed cache rather than a fixed
//! stack array, since candidate counts are no longer bounded by an
//! on-disk record's compile-time `MAX_M`.

use std::collections::HashMap;

use crate::hnsw::graph::HnswGraph;
use crate::hnsw::search::SearchResult;
use crate::params::ShrinkStrategy;

/// Lazily-memoized, symmetric pairwise distance cache keyed by an unordered
/// id pair.
struct PairwiseDistanceCache<'g> {
    graph: &'g HnswGraph,
    cache: HashMap<(u32, u32), f32>,
}

impl<'g> PairwiseDistanceCache<'g> {
    fn new(graph: &'g HnswGraph) -> Self {
        Self { graph, cache: HashMap::new() }
    }

    fn distance(&mut self, a: u32, b: u32) -> f32 {
        let key = if a < b { (a, b) } else { (b, a) };
        *self.cache.entry(key).or_insert_with(|| self.graph.distance_between(a, b))
    }
}

impl HnswGraph {
    /// Diversity heuristic (§4.5.2): from `candidates` (already sorted
    /// ascending by distance to `target`), select up to `cap` ids such that
    /// each is closer to `target` than to any previously selected id,
    /// refilling from the discards (in original order) if the diverse pass
    /// doesn't fill the cap.
    pub(crate) fn select_neighbors(
        &self,
        candidates: &[SearchResult],
        target: u32,
        cap: usize,
    ) -> Vec<u32> {
        let mut cache = PairwiseDistanceCache::new(self);
        let mut selected: Vec<u32> = Vec::with_capacity(cap);
        let mut discarded: Vec<u32> = Vec::new();

        for c in candidates {
            if c.id == target {
                continue;
            }
            if selected.len() >= cap {
                discarded.push(c.id);
                continue;
            }

            let is_diverse = selected.iter().all(|&s| cache.distance(s, c.id) >= c.distance);

            if is_diverse {
                selected.push(c.id);
            } else {
                discarded.push(c.id);
            }
        }

        if selected.len() < cap {
            for id in discarded {
                if selected.len() >= cap {
                    break;
                }
                selected.push(id);
            }
        }

        selected
    }

    /// Bidirectional shrinking (§4.5.4): re-prune `nb`'s layer-`layer`
    /// adjacency list back to `cap` after incorporating `new_id` as a
    /// candidate, using the configured [`ShrinkStrategy`].
    pub(crate) fn shrink(&mut self, nb: u32, new_id: u32, layer: usize, cap: usize) {
        let mut candidate_ids: Vec<u32> = self.nodes_layer(nb, layer).to_vec();
        if !candidate_ids.contains(&new_id) {
            candidate_ids.push(new_id);
        }

        let mut sorted: Vec<SearchResult> = candidate_ids
            .into_iter()
            .map(|id| SearchResult { id, distance: self.distance_between(nb, id) })
            .collect();
        sorted.sort_by(SearchResult::cmp);

        let new_list = match self.options.shrink_strategy {
            ShrinkStrategy::Heuristic => self.select_neighbors(&sorted, nb, cap),
            ShrinkStrategy::Greedy => {
                let mut kept: Vec<u32> =
                    sorted.iter().filter(|c| c.id != new_id).take(cap - 1).map(|c| c.id).collect();
                kept.push(new_id);
                kept
            }
        };

        self.nodes_layer_mut(nb, layer).replace_all(new_list);
    }

    fn nodes_layer(&self, id: u32, layer: usize) -> &[u32] {
        self.neighbors(id, layer)
    }

    fn nodes_layer_mut(&mut self, id: u32, layer: usize) -> &mut crate::hnsw::adjacency::AdjacencyList {
        &mut self.node_layers_mut(id)[layer]
    }
}
