//! In-memory, fixed-capacity storage for the vectors backing the index.
//!
//! Two back-ends are available, selected once at construction via
//! [`StorageBackend`]:
//!
//! - [`VectorStore::Contiguous`]: a single `Vec<f32>` of `capacity * dims`
//!   elements, slot `id` living at element offset `id * dims`. Best for large
//!   capacities: one allocation, no per-slot overhead.
//! - [`VectorStore::PerSlot`]: a `Vec<Box<[f32]>>`, one boxed slice per id.
//!   Best for smaller capacities: avoids committing one giant allocation up
//!   front.
//!
//! Both back-ends expose the same zero-copy accessor surface; the graph core
//! never needs to know which one is active.

use crate::params::StorageBackend;

/// Fixed-capacity, heap-resident storage for `dims`-dimensional `f32`
/// vectors, addressed by a dense integer id.
#[derive(Debug)]
pub enum VectorStore {
    /// Single contiguous allocation, slot `id` at `id * dims`.
    Contiguous {
        /// Packed `capacity * dims` elements.
        data: Vec<f32>,
        /// Vectors written so far.
        len: u64,
        /// Dimensionality of every vector.
        dims: u32,
        /// Maximum number of vectors this store can hold.
        capacity: u32,
    },
    /// One owned boxed slice per id.
    PerSlot {
        /// `capacity` boxed slices, only the first `len` populated.
        slots: Vec<Box<[f32]>>,
        /// Vectors written so far.
        len: u64,
        /// Dimensionality of every vector.
        dims: u32,
        /// Maximum number of vectors this store can hold.
        capacity: u32,
    },
}

impl VectorStore {
    /// Creates a new, empty store with the given backend, dimensionality and
    /// capacity.
    ///
    /// # Panics
    ///
    /// Panics if `dims == 0` or `capacity == 0`.
    #[must_use]
    pub fn new(backend: StorageBackend, dims: u32, capacity: u32) -> Self {
        assert!(dims > 0, "vector store requires dims > 0");
        assert!(capacity > 0, "vector store requires capacity > 0");

        match backend {
            StorageBackend::Contiguous => {
                let total = dims as usize * capacity as usize;
                VectorStore::Contiguous {
                    data: vec![0.0; total],
                    len: 0,
                    dims,
                    capacity,
                }
            }
            StorageBackend::PerSlot => VectorStore::PerSlot {
                slots: (0..capacity)
                    .map(|_| vec![0.0_f32; dims as usize].into_boxed_slice())
                    .collect(),
                len: 0,
                dims,
                capacity,
            },
        }
    }

    /// Dimensionality of every stored vector.
    #[must_use]
    pub fn dimensions(&self) -> u32 {
        match self {
            VectorStore::Contiguous { dims, .. } | VectorStore::PerSlot { dims, .. } => *dims,
        }
    }

    /// Maximum number of vectors this store can hold.
    #[must_use]
    pub fn capacity(&self) -> u32 {
        match self {
            VectorStore::Contiguous { capacity, .. } | VectorStore::PerSlot { capacity, .. } => {
                *capacity
            }
        }
    }

    /// Number of vectors written so far.
    #[must_use]
    pub fn len(&self) -> u64 {
        match self {
            VectorStore::Contiguous { len, .. } | VectorStore::PerSlot { len, .. } => *len,
        }
    }

    /// Whether no vectors have been written yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Writes `vector` into the next free slot and returns its id.
    ///
    /// # Panics
    ///
    /// Panics if `vector.len() != dimensions()` (dimension mismatch is a
    /// caller bug, not a recoverable error) or if the store is already at
    /// capacity.
    pub fn put(&mut self, vector: &[f32]) -> u64 {
        let dims = self.dimensions() as usize;
        assert_eq!(
            vector.len(),
            dims,
            "vector dimension mismatch: expected {dims}, got {}",
            vector.len()
        );
        assert!(
            self.len() < u64::from(self.capacity()),
            "vector store capacity ({}) exceeded",
            self.capacity()
        );

        let id = self.len();
        match self {
            VectorStore::Contiguous { data, len, .. } => {
                let offset = id as usize * dims;
                data[offset..offset + dims].copy_from_slice(vector);
                *len += 1;
            }
            VectorStore::PerSlot { slots, len, .. } => {
                slots[id as usize].copy_from_slice(vector);
                *len += 1;
            }
        }
        id
    }

    /// Returns a zero-copy view of the vector stored at `id`.
    ///
    /// # Panics
    ///
    /// Panics if `id >= len()`.
    #[must_use]
    pub fn get(&self, id: u64) -> &[f32] {
        assert!(
            id < self.len(),
            "vector store index out of bounds: {id} (len is {})",
            self.len()
        );
        match self {
            VectorStore::Contiguous { data, dims, .. } => {
                let dims = *dims as usize;
                let offset = id as usize * dims;
                &data[offset..offset + dims]
            }
            VectorStore::PerSlot { slots, .. } => &slots[id as usize],
        }
    }
}
