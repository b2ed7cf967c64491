//! Layer-local beam search (§4.5.1) and the top-level greedy-descent search
//! (§4.5.5), with a scratch structure (heaps + visited bitset) reused across
//! calls instead of allocated fresh each time.

use crate::hnsw::graph::HnswGraph;
use std::cell::RefCell;
use std::cmp::Reverse;
use std::collections::BinaryHeap;

/// One candidate/result entry: a node id and its distance to the query.
#[derive(Debug, Clone, Copy)]
pub struct SearchResult {
    /// Node id.
    pub id: u32,
    /// Distance (squared Euclidean) to the query.
    pub distance: f32,
}

impl PartialEq for SearchResult {
    fn eq(&self, other: &Self) -> bool {
        self.distance == other.distance
    }
}

impl Eq for SearchResult {}

impl PartialOrd for SearchResult {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for SearchResult {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.distance
            .partial_cmp(&other.distance)
            .unwrap_or(std::cmp::Ordering::Equal)
    }
}

/// Reusable scratch space for [`HnswGraph::search_layer`], avoiding a fresh
/// heap/bitset allocation on every call. Not safe to share across threads
/// (the whole graph isn't — see the concurrency notes on [`HnswGraph`]),
/// hence a plain `RefCell` rather than a `Mutex`.
#[derive(Debug)]
pub(crate) struct SearchScratch {
    visited: Vec<bool>,
    touched: Vec<u32>,
    candidates: BinaryHeap<Reverse<SearchResult>>,
    results: BinaryHeap<SearchResult>,
}

impl SearchScratch {
    pub(crate) fn new(capacity: usize) -> Self {
        Self {
            visited: vec![false; capacity],
            touched: Vec::new(),
            candidates: BinaryHeap::new(),
            results: BinaryHeap::new(),
        }
    }

    fn reset(&mut self) {
        for &id in &self.touched {
            self.visited[id as usize] = false;
        }
        self.touched.clear();
        self.candidates.clear();
        self.results.clear();
    }

    fn mark_visited(&mut self, id: u32) -> bool {
        let slot = &mut self.visited[id as usize];
        if *slot {
            false
        } else {
            *slot = true;
            self.touched.push(id);
            true
        }
    }
}

pub(crate) type Scratch = RefCell<SearchScratch>;

impl HnswGraph {
    /// Top-level search (§4.5.5): greedy-descend the upper layers with beam
    /// width 1, then beam-search layer 0 with width `ef_search`, returning
    /// up to `k` ids sorted by ascending distance.
    ///
    /// Returns an empty vector if the graph has no nodes yet. Does not
    /// error if `ef_search < k` or if fewer than `k` nodes exist — it simply
    /// returns what it found (§4.5.5, §7).
    ///
    /// # Panics
    ///
    /// Panics if `k == 0` (a programmer error per §7, not a runtime
    /// failure).
    pub fn search(&self, query: &[f32], k: usize, ef_search: usize) -> Vec<SearchResult> {
        assert!(k > 0, "k must be > 0");

        let Some(entry_point) = self.entry_point else {
            return Vec::new();
        };

        let mut current = entry_point;
        let mut layer = self.max_layer;
        while layer > 0 {
            current = self.search_layer(query, current, 1, layer)[0].id;
            layer -= 1;
        }

        let mut results = self.search_layer(query, current, ef_search.max(1), 0);
        results.truncate(k);
        results
    }

    /// Beam search within a single layer (§4.5.1): dual-heap search bounded
    /// to `ef` results, starting from `entry`.
    pub(crate) fn search_layer(
        &self,
        query: &[f32],
        entry: u32,
        ef: usize,
        layer: usize,
    ) -> Vec<SearchResult> {
        let mut scratch = self.scratch.borrow_mut();
        scratch.reset();

        let entry_dist = self.distance_to(query, entry);
        scratch
            .candidates
            .push(Reverse(SearchResult { id: entry, distance: entry_dist }));
        scratch.results.push(SearchResult { id: entry, distance: entry_dist });
        scratch.mark_visited(entry);

        while let Some(Reverse(current)) = scratch.candidates.pop() {
            let worst = scratch.results.peek().copied();
            if let Some(worst) = worst {
                if scratch.results.len() >= ef && current.distance > worst.distance {
                    break;
                }
            }

            for neighbor in self.neighbors(current.id, layer) {
                if !scratch.mark_visited(neighbor) {
                    continue;
                }
                let dist = self.distance_to(query, neighbor);
                let worst = scratch.results.peek().copied();
                let should_insert =
                    scratch.results.len() < ef || worst.is_none_or(|w| dist < w.distance);
                if should_insert {
                    scratch
                        .candidates
                        .push(Reverse(SearchResult { id: neighbor, distance: dist }));
                    scratch.results.push(SearchResult { id: neighbor, distance: dist });
                    if scratch.results.len() > ef {
                        scratch.results.pop();
                    }
                }
            }
        }

        let mut sorted: Vec<_> = scratch.results.iter().copied().collect();
        sorted.sort_by(SearchResult::cmp);
        sorted
    }
}
