//! hnswlite-core - An embeddable, in-memory HNSW approximate nearest
//! neighbor index.
//!
//! Implements the Hierarchical Navigable Small World algorithm of Malkov &
//! Yashunin (arXiv:1603.09320): a layered proximity graph supporting
//! incremental insertion and approximate k-nearest-neighbor search under
//! squared Euclidean distance.
//!
//! # Features
//!
//! - SIMD-accelerated squared-L2 distance kernel with scalar fallback
//! - Two vector storage back-ends (contiguous or per-slot), chosen at
//!   construction
//! - Diversity-heuristic neighbor selection and bidirectional-link
//!   shrinking, per the original paper
//! - Single-threaded, in-memory only: no persistence, no concurrent
//!   mutation
//!
//! # Example
//!
//! ```
//! use hnswlite_core::{IndexOptions, VectorIndex};
//!
//! let mut index = VectorIndex::new(4, 1000, IndexOptions::default());
//!
//! let id = index.insert(&[0.1, 0.2, 0.3, 0.4]);
//! let results = index.search(&[0.1, 0.2, 0.3, 0.4], 5, 50);
//! assert_eq!(results[0].id, id);
//! ```
//!
//! # Design Philosophy
//!
//! hnswlite-core is intentionally narrow. It does not aim to be:
//! - A vector database with persistence or replication
//! - A metric-agnostic library supporting arbitrary distance functions
//! - A concurrent or distributed index
//!
//! These concerns are left to the application layer; this crate is an
//! in-memory index primitive.

mod distance;
mod hnsw;
mod index;
mod params;
mod store;

pub use distance::squared_euclidean;
pub use index::{IndexStats, SearchResult, VectorIndex};
pub use params::{IndexOptions, ShrinkStrategy, StorageBackend};

#[cfg(feature = "internals")]
pub use distance::squared_euclidean_scalar;
#[cfg(feature = "internals")]
pub use hnsw::{AdjacencyList, HnswGraph, LevelGenerator};
#[cfg(feature = "internals")]
pub use store::VectorStore;
