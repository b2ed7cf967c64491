//! FFI bindings for the in-memory HNSW vector index.
//!
//! This module provides a C-compatible interface over [`hnswlite_core::VectorIndex`].
//! All functions are panic-safe and use thread-local error reporting.
//!
//! # Safety Guarantees
//!
//! - No panic may cross the FFI boundary (enforced by `ffi_guard`)
//! - Null pointer checks on all pointer arguments
//! - ABI stability via `#[repr(C)]` and `extern "C"`
//!
//! # Error Handling
//!
//! Errors are reported through:
//! - Return values: `u64::MAX` for insert, `0` for search
//! - Thread-local error message: `hnswlite_last_error_message()`
//!
//! # Thread Safety
//!
//! - Single-writer: `hnswlite_insert` requires exclusive access
//! - Multi-reader: `hnswlite_search`/`hnswlite_stats` allow concurrent readers
//! - Each thread has its own error message storage
//!
//! There is no file-based lifecycle here (no `open`/`flush`): the index is
//! purely in-memory, so construction takes dimensions and capacity directly
//! rather than a path.

use anyhow::anyhow;
use hnswlite_core::{IndexOptions, ShrinkStrategy, StorageBackend, VectorIndex};
use libc::{c_char, c_float, size_t};
use std::cell::RefCell;
use std::ffi::{CStr, CString};
use std::ptr;
use std::slice;

/// Internal state holder (not exposed to C).
struct HnswliteIndexState {
    inner: VectorIndex,
}

/// Opaque handle to an index (C-compatible).
///
/// This is a zero-sized type that serves as an opaque handle for C. C code
/// only sees pointers to this type, never the actual struct. The real data
/// is stored in `HnswliteIndexState`.
#[repr(C)]
pub struct HnswliteIndex {
    _private: [u8; 0],
}

/// Configuration snapshot returned by `hnswlite_stats`.
///
/// `entry_point` uses `u64::MAX` as the "no entry point yet" sentinel since
/// an empty index has none.
#[repr(C)]
pub struct HnswliteStats {
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
    pub max_layer: u64,
    /// Current entry point id, or `u64::MAX` if the index is empty.
    pub entry_point: u64,
    /// Cumulative wall-clock time spent inserting, in milliseconds.
    pub cumulative_insert_time_ms: f64,
}

thread_local! {
    /// Thread-local storage for error messages.
    ///
    /// Each thread maintains its own error message to ensure thread safety
    /// without requiring locks. The `RefCell` allows interior mutability.
    static LAST_ERROR: RefCell<Option<CString>> = RefCell::new(None);
}

/// Set the last error message for the current thread.
///
/// Handles interior NULs gracefully to prevent panics during error
/// reporting: NUL bytes are replaced with the escaped sequence `\0`.
fn set_last_error(err: impl std::fmt::Display) {
    LAST_ERROR.with(|cell| {
        let safe_msg = err.to_string().replace('\0', "\\0");
        let c_str = CString::new(safe_msg).unwrap_or_default();
        *cell.borrow_mut() = Some(c_str);
    });
}

/// Clear the last error message for the current thread.
fn clear_last_error() {
    LAST_ERROR.with(|cell| {
        *cell.borrow_mut() = None;
    });
}

/// Panic barrier that catches all panics at the FFI boundary.
///
/// # Critical Safety Invariant
///
/// No Rust panic may EVER unwind across the FFI boundary. This would cause
/// undefined behavior as C code cannot handle Rust panics. The core library
/// is panic-based by design (§7), so every entry point here wraps its call
/// in this guard.
///
/// `AssertUnwindSafe` is permitted because the operation is abandoned on
/// panic rather than resumed, and the error is reported via thread-local
/// storage rather than shared mutable state.
fn ffi_guard<F, R>(f: F) -> Option<R>
where
    F: FnOnce() -> R,
{
    match std::panic::catch_unwind(std::panic::AssertUnwindSafe(f)) {
        Ok(result) => Some(result),
        Err(e) => {
            let err = if let Some(s) = e.downcast_ref::<&str>() {
                anyhow!("Panic: {s}")
            } else if let Some(s) = e.downcast_ref::<String>() {
                anyhow!("Panic: {s}")
            } else {
                anyhow!("Unknown panic")
            };
            set_last_error(err);
            None
        }
    }
}

//
// === LIFECYCLE MANAGEMENT ===
//

/// Create a new in-memory index with default options.
///
/// # Arguments
///
/// - `dimensions`: Number of dimensions per vector (must be > 0)
/// - `capacity`: Maximum number of vectors the index will ever hold (must be > 0)
///
/// # Returns
///
/// - Non-NULL pointer on success
/// - NULL on failure (check `hnswlite_last_error_message()`)
///
/// # Safety
///
/// Caller must free the returned pointer with `hnswlite_free()`.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn hnswlite_new(dimensions: u32, capacity: u32) -> *mut HnswliteIndex {
    // SAFETY: forwards to hnswlite_new_with_options with defaults; no raw
    // pointers of our own to uphold invariants for.
    unsafe { hnswlite_new_with_options(dimensions, capacity, 16, 100, 50, 0, 0, 0, 0) }
}

/// Create a new in-memory index with custom options.
///
/// # Arguments
///
/// - `dimensions`: Number of dimensions per vector (must be > 0)
/// - `capacity`: Maximum number of vectors the index will ever hold (must be > 0)
/// - `max_connections`: Maximum connections per node (M parameter, typically 8-64)
/// - `ef_construction`: Construction quality (typically 100-400)
/// - `ef_search`: Default search quality (typically 50-200)
/// - `per_slot_storage`: Non-zero selects the per-slot vector store backend
///   instead of the contiguous one
/// - `greedy_shrink`: Non-zero selects the greedy shrink strategy instead of
///   the diversity heuristic
/// - `rng_seed`: Seed for the level generator; only used if `has_rng_seed` is non-zero
/// - `has_rng_seed`: Non-zero to honor `rng_seed`; zero to seed from system entropy
///
/// # Returns
///
/// - Non-NULL pointer on success
/// - NULL on failure (check `hnswlite_last_error_message()`)
///
/// # Safety
///
/// Caller must free the returned pointer with `hnswlite_free()`.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn hnswlite_new_with_options(
    dimensions: u32,
    capacity: u32,
    max_connections: u32,
    ef_construction: u32,
    ef_search: u32,
    per_slot_storage: u8,
    greedy_shrink: u8,
    rng_seed: u64,
    has_rng_seed: u8,
) -> *mut HnswliteIndex {
    ffi_guard(|| {
        if dimensions == 0 {
            set_last_error("Dimensions must be > 0");
            return ptr::null_mut();
        }

        if capacity == 0 {
            set_last_error("Capacity must be > 0");
            return ptr::null_mut();
        }

        if max_connections > u32::from(u16::MAX) {
            set_last_error(format!("max_connections must be <= {}", u16::MAX));
            return ptr::null_mut();
        }

        let options = IndexOptions {
            max_connections: max_connections as u16,
            ef_construction,
            ef_search,
            storage: if per_slot_storage != 0 { StorageBackend::PerSlot } else { StorageBackend::Contiguous },
            shrink_strategy: if greedy_shrink != 0 { ShrinkStrategy::Greedy } else { ShrinkStrategy::Heuristic },
            rng_seed: if has_rng_seed != 0 { Some(rng_seed) } else { None },
        };

        let index = VectorIndex::new(dimensions, capacity, options);
        clear_last_error();
        let state = Box::new(HnswliteIndexState { inner: index });
        Box::into_raw(state).cast::<HnswliteIndex>()
    })
    .unwrap_or(ptr::null_mut())
}

/// Free an index and release all resources.
///
/// # Safety
///
/// - `ptr` must be NULL or a valid pointer from `hnswlite_new()`/`hnswlite_new_with_options()`
/// - After this call, `ptr` is invalid and must not be used
/// - Safe to call with NULL (no-op)
#[unsafe(no_mangle)]
pub unsafe extern "C" fn hnswlite_free(ptr: *mut HnswliteIndex) {
    if !ptr.is_null() {
        ffi_guard(|| {
            // SAFETY: Caller guarantees ptr is valid (from hnswlite_new).
            let _ = unsafe { Box::from_raw(ptr.cast::<HnswliteIndexState>()) };
        });
    }
}

//
// === VECTOR OPERATIONS ===
//

/// Insert a vector into the index.
///
/// # Returns
///
/// - Vector id (0-based) on success
/// - `UINT64_MAX` on failure (check `hnswlite_last_error_message()`)
///
/// # Thread Safety
///
/// **SINGLE-WRITER**: only one thread may call this function at a time for
/// a given index.
///
/// # Safety
///
/// - `ptr` must be non-NULL and valid
/// - `vector` must point to `len` valid f32 values
/// - `len` must match the dimensions the index was created with
/// - No other thread may access `ptr` during this call
#[unsafe(no_mangle)]
pub unsafe extern "C" fn hnswlite_insert(
    ptr: *mut HnswliteIndex,
    vector: *const c_float,
    len: size_t,
) -> u64 {
    ffi_guard(|| {
        // SAFETY: Caller guarantees ptr is valid and has exclusive access.
        let state = unsafe { ptr.cast::<HnswliteIndexState>().as_mut() };
        let index = match state {
            Some(s) => &mut s.inner,
            None => {
                set_last_error("Null index pointer");
                return u64::MAX;
            }
        };

        if vector.is_null() {
            set_last_error("Null vector pointer");
            return u64::MAX;
        }

        if len == 0 {
            set_last_error("Vector length must be > 0");
            return u64::MAX;
        }

        // SAFETY: Caller guarantees vector points to len valid f32 values.
        let slice = unsafe { slice::from_raw_parts(vector, len) };

        if slice.len() != index.dimensions() as usize {
            set_last_error(format!(
                "dimension mismatch: expected {}, got {}",
                index.dimensions(),
                slice.len()
            ));
            return u64::MAX;
        }

        let id = index.insert(slice);
        clear_last_error();
        id
    })
    .unwrap_or(u64::MAX)
}

/// Search for k nearest neighbors.
///
/// # Arguments
///
/// - `ptr`: Non-NULL pointer to index (shared access allowed)
/// - `query`: Pointer to query vector (must not be NULL)
/// - `len`: Number of elements in query (must match index dimensions)
/// - `k`: Number of neighbors to find (must be > 0)
/// - `ef_search`: Candidate-list width to search with
/// - `out_ids`: Output buffer for vector ids (must have space for `k` elements)
/// - `out_dists`: Output buffer for distances (must have space for `k` elements)
///
/// # Returns
///
/// - Number of results found (<= k) on success
/// - 0 on failure or if the index is empty (check `hnswlite_last_error_message()`)
///
/// # Output Format
///
/// Results are sorted by distance (ascending).
///
/// # Safety
///
/// - `ptr` must be non-NULL and valid
/// - `query` must point to `len` valid f32 values
/// - `out_ids` must have space for at least `k` u64 values
/// - `out_dists` must have space for at least `k` float values
/// - Buffers must not overlap
#[unsafe(no_mangle)]
pub unsafe extern "C" fn hnswlite_search(
    ptr: *const HnswliteIndex,
    query: *const c_float,
    len: size_t,
    k: size_t,
    ef_search: size_t,
    out_ids: *mut u64,
    out_dists: *mut c_float,
) -> size_t {
    ffi_guard(|| {
        // SAFETY: Caller guarantees ptr is valid (shared access).
        let state = unsafe { ptr.cast::<HnswliteIndexState>().as_ref() };
        let index = match state {
            Some(s) => &s.inner,
            None => {
                set_last_error("Null index pointer");
                return 0;
            }
        };

        if query.is_null() || out_ids.is_null() || out_dists.is_null() {
            set_last_error("Null buffer pointers");
            return 0;
        }

        if k == 0 {
            set_last_error("k must be > 0");
            return 0;
        }

        if index.is_empty() {
            clear_last_error();
            return 0;
        }

        // SAFETY: Caller guarantees query points to len valid f32 values.
        let query_slice = unsafe { slice::from_raw_parts(query, len) };

        let results = index.search(query_slice, k, ef_search);
        let count = results.len();

        // SAFETY: Caller guarantees out_ids and out_dists have space for k elements.
        for (i, result) in results.iter().enumerate() {
            unsafe {
                *out_ids.add(i) = result.id;
                *out_dists.add(i) = result.distance;
            }
        }

        clear_last_error();
        count
    })
    .unwrap_or(0)
}

//
// === INTROSPECTION ===
//

/// Snapshot the index's current configuration and size.
///
/// Returns a zeroed `HnswliteStats` (with `entry_point == u64::MAX`) if
/// `ptr` is NULL.
///
/// # Safety
///
/// - `ptr` must be non-NULL and valid
#[unsafe(no_mangle)]
pub unsafe extern "C" fn hnswlite_stats(ptr: *const HnswliteIndex) -> HnswliteStats {
    ffi_guard(|| {
        // SAFETY: Caller guarantees ptr is valid (shared access).
        let state = unsafe { ptr.cast::<HnswliteIndexState>().as_ref() };
        let Some(state) = state else {
            set_last_error("Null index pointer");
            return HnswliteStats {
                max_connections: 0,
                ef_construction: 0,
                ef_search: 0,
                dimensions: 0,
                node_count: 0,
                max_layer: 0,
                entry_point: u64::MAX,
                cumulative_insert_time_ms: 0.0,
            };
        };

        let stats = state.inner.stats();
        clear_last_error();
        HnswliteStats {
            max_connections: stats.max_connections,
            ef_construction: stats.ef_construction,
            ef_search: stats.ef_search,
            dimensions: stats.dimensions,
            node_count: stats.node_count,
            max_layer: stats.max_layer as u64,
            entry_point: stats.entry_point.unwrap_or(u64::MAX),
            cumulative_insert_time_ms: stats.cumulative_insert_time_ms,
        }
    })
    .unwrap_or(HnswliteStats {
        max_connections: 0,
        ef_construction: 0,
        ef_search: 0,
        dimensions: 0,
        node_count: 0,
        max_layer: 0,
        entry_point: u64::MAX,
        cumulative_insert_time_ms: 0.0,
    })
}

//
// === ERROR HANDLING ===
//

/// Get the last error message for the current thread.
///
/// # Returns
///
/// - Pointer to NUL-terminated error string
/// - NULL if no error occurred
///
/// # Lifetime
///
/// The returned pointer is valid until the next FFI call on this thread, or
/// until the thread exits. Do not free it.
#[unsafe(no_mangle)]
pub extern "C" fn hnswlite_last_error_message() -> *const c_char {
    LAST_ERROR.with(|cell| cell.borrow().as_ref().map_or(ptr::null(), |s| s.as_ptr()))
}

//
// === VERSIONING ===
//

/// Get the library version.
///
/// # Returns
///
/// Pointer to a NUL-terminated version string (e.g., "0.1.0"), valid for
/// the lifetime of the program. Do not free it.
#[unsafe(no_mangle)]
pub extern "C" fn hnswlite_version() -> *const c_char {
    static VERSION: &str = concat!(env!("CARGO_PKG_VERSION"), "\0");
    VERSION.as_ptr().cast::<c_char>()
}

//
// === TESTS ===
//

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::CStr;

    #[test]
    fn test_ffi_lifecycle() {
        let ptr = unsafe { hnswlite_new(128, 16) };
        assert!(!ptr.is_null(), "Failed to create index");

        let vec = vec![0.1f32; 128];
        let id = unsafe { hnswlite_insert(ptr, vec.as_ptr(), 128) };
        assert_eq!(id, 0, "First insert should have id 0");

        let vec2 = vec![0.2f32; 128];
        let id2 = unsafe { hnswlite_insert(ptr, vec2.as_ptr(), 128) };
        assert_eq!(id2, 1, "Second insert should have id 1");

        let mut ids = vec![0u64; 5];
        let mut dists = vec![0.0f32; 5];
        let count = unsafe {
            hnswlite_search(ptr, vec.as_ptr(), 128, 5, 50, ids.as_mut_ptr(), dists.as_mut_ptr())
        };
        assert!(count > 0, "Search should return results");
        assert!(count <= 2, "Should not return more than 2 results");

        unsafe { hnswlite_free(ptr) };
    }

    #[test]
    fn test_ffi_null_safety() {
        let vec = vec![0.1f32; 128];
        let id = unsafe { hnswlite_insert(ptr::null_mut(), vec.as_ptr(), 128) };
        assert_eq!(id, u64::MAX);

        let mut ids = vec![0u64; 5];
        let mut dists = vec![0.0f32; 5];
        let count = unsafe {
            hnswlite_search(ptr::null(), vec.as_ptr(), 128, 5, 50, ids.as_mut_ptr(), dists.as_mut_ptr())
        };
        assert_eq!(count, 0);

        // Double free should be safe (no-op second time).
        unsafe { hnswlite_free(ptr::null_mut()) };
    }

    #[test]
    fn test_ffi_dimension_mismatch() {
        let ptr = unsafe { hnswlite_new(128, 8) };
        assert!(!ptr.is_null());

        let vec = vec![0.1f32; 64];
        let id = unsafe { hnswlite_insert(ptr, vec.as_ptr(), 64) };
        assert_eq!(id, u64::MAX, "Should fail with dimension mismatch");

        let error = unsafe { CStr::from_ptr(hnswlite_last_error_message()) };
        let error_str = error.to_string_lossy();
        assert!(error_str.contains("dimension"), "Error should mention dimensions");

        unsafe { hnswlite_free(ptr) };
    }

    #[test]
    fn test_ffi_introspection() {
        let ptr = unsafe { hnswlite_new(256, 8) };
        assert!(!ptr.is_null());

        let stats = unsafe { hnswlite_stats(ptr) };
        assert_eq!(stats.node_count, 0);
        assert_eq!(stats.dimensions, 256);
        assert_eq!(stats.entry_point, u64::MAX);

        let vec = vec![0.5f32; 256];
        let id = unsafe { hnswlite_insert(ptr, vec.as_ptr(), 256) };
        assert_eq!(id, 0);

        let stats = unsafe { hnswlite_stats(ptr) };
        assert_eq!(stats.node_count, 1);
        assert_eq!(stats.entry_point, 0);

        unsafe { hnswlite_free(ptr) };
    }

    #[test]
    fn test_ffi_version() {
        let version = unsafe { CStr::from_ptr(hnswlite_version()) };
        let version_str = version.to_string_lossy();
        let expected = env!("CARGO_PKG_VERSION");
        assert_eq!(version_str, expected, "FFI version should match Cargo.toml version");
    }

    #[test]
    fn test_ffi_with_custom_options() {
        let ptr = unsafe {
            hnswlite_new_with_options(128, 8, 32, 100, 75, 0, 0, 7, 1)
        };
        assert!(!ptr.is_null(), "Should create index with custom options");

        let vec = vec![0.3f32; 128];
        let id = unsafe { hnswlite_insert(ptr, vec.as_ptr(), 128) };
        assert_eq!(id, 0);

        let mut ids = vec![0u64; 5];
        let mut dists = vec![0.0f32; 5];
        let count = unsafe {
            hnswlite_search(ptr, vec.as_ptr(), 128, 5, 75, ids.as_mut_ptr(), dists.as_mut_ptr())
        };
        assert_eq!(count, 1);

        unsafe { hnswlite_free(ptr) };
    }

    #[test]
    fn test_ffi_capacity_zero_rejected() {
        let ptr = unsafe { hnswlite_new(128, 0) };
        assert!(ptr.is_null());

        let error = unsafe { CStr::from_ptr(hnswlite_last_error_message()) };
        assert!(error.to_string_lossy().contains("Capacity"));
    }

    #[test]
    fn test_ffi_error_thread_local() {
        use std::thread;

        set_last_error("Main thread error");
        let main_error = unsafe { CStr::from_ptr(hnswlite_last_error_message()) };
        assert_eq!(main_error.to_string_lossy(), "Main thread error");

        let handle = thread::spawn(|| {
            let error_ptr = hnswlite_last_error_message();
            assert!(error_ptr.is_null(), "New thread should have no error");

            set_last_error("Spawned thread error");
            let spawned_error = unsafe { CStr::from_ptr(hnswlite_last_error_message()) };
            assert_eq!(spawned_error.to_string_lossy(), "Spawned thread error");
        });

        handle.join().unwrap();

        let main_error_again = unsafe { CStr::from_ptr(hnswlite_last_error_message()) };
        assert_eq!(main_error_again.to_string_lossy(), "Main thread error");
    }
}
