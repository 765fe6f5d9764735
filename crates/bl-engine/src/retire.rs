//! Deferred destruction of objects the render thread may still hold.
//!
//! When the control side swaps out a shared object, the render thread can
//! still be inside a block that loaded the old pointer. Replaced objects are
//! parked here and dropped on the control thread once nobody else holds
//! them, so the render thread only ever decrements a reference count.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

pub(crate) struct RetireList<T> {
    pending: Mutex<Vec<Arc<T>>>,
}

impl<T> RetireList<T> {
    pub(crate) fn new() -> Self {
        Self {
            pending: Mutex::new(Vec::new()),
        }
    }

    /// Park a replaced object until it is unreferenced. An object already
    /// parked is not parked twice, so `collect` sees one list reference at
    /// most.
    pub(crate) fn retire(&self, item: Arc<T>) {
        let mut pending = self.lock();
        if !pending.iter().any(|p| Arc::ptr_eq(p, &item)) {
            pending.push(item);
        }
    }

    /// Drop every parked object that only this list still references.
    /// Returns how many were dropped.
    pub(crate) fn collect(&self) -> usize {
        let mut pending = self.lock();
        let before = pending.len();
        pending.retain(|item| Arc::strong_count(item) > 1);
        before - pending.len()
    }

    pub(crate) fn len(&self) -> usize {
        self.lock().len()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<Arc<T>>> {
        // Only control threads take this lock; a panic there leaves the
        // list itself consistent.
        self.pending.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_objects_until_last_outside_reference_drops() {
        let list = RetireList::new();
        let held = Arc::new(5);
        list.retire(Arc::clone(&held));

        assert_eq!(list.collect(), 0);
        assert_eq!(list.len(), 1);

        drop(held);
        assert_eq!(list.collect(), 1);
        assert_eq!(list.len(), 0);
    }

    #[test]
    fn retiring_the_same_object_twice_parks_it_once() {
        let list = RetireList::new();
        let held = Arc::new(7);
        for _ in 0..5 {
            list.retire(Arc::clone(&held));
        }
        assert_eq!(list.len(), 1);

        drop(held);
        assert_eq!(list.collect(), 1);
        assert_eq!(list.len(), 0);
    }
}
