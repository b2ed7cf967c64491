// A `VectorStore::get()` view must not outlive a subsequent mutating
// `put()` call: `put` can reallocate (Contiguous backend) or otherwise
// invalidate earlier borrows, so the borrow checker must reject this.

use hnswlite_core::{StorageBackend, VectorStore};

fn main() {
    let mut store = VectorStore::new(StorageBackend::Contiguous, 2, 4);
    store.put(&[1.0, 2.0]);

    let view = store.get(0);
    store.put(&[3.0, 4.0]);
    println!("{:?}", view);
}
