use async_trait::async_trait;

use crate::error::StoreError;
use crate::smoothie::{NewSmoothie, OrderBy, Smoothie, SmoothieId};

/// Client of the data service holding the smoothies table.
///
/// Every call is a single request; nothing is cached or retried.
#[async_trait]
pub trait SmoothieStore: Send + Sync {
    /// All rows sorted descending by `order`.
    async fn list(&self, order: OrderBy) -> Result<Vec<Smoothie>, StoreError>;
    /// Exactly one row, or [`StoreError::NotFound`].
    async fn fetch(&self, id: SmoothieId) -> Result<Smoothie, StoreError>;
    async fn insert(&self, smoothie: &NewSmoothie) -> Result<Smoothie, StoreError>;
    /// Overwrites all editable fields and returns the updated rows.
    async fn update(
        &self,
        id: SmoothieId,
        smoothie: &NewSmoothie,
    ) -> Result<Vec<Smoothie>, StoreError>;
    /// Returns the deleted rows, empty when nothing matched.
    async fn delete(&self, id: SmoothieId) -> Result<Vec<Smoothie>, StoreError>;
}

#[cfg(test)]
pub mod testing {
    use super::*;
    use crate::db::SqliteStore;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    /// In-memory store that counts calls and fails on demand.
    pub struct FlakyStore {
        pub inner: SqliteStore,
        calls: AtomicUsize,
        failing: AtomicBool,
    }

    impl FlakyStore {
        pub fn new() -> Self {
            FlakyStore {
                inner: SqliteStore::open_in_memory("smoothies").unwrap(),
                calls: AtomicUsize::new(0),
                failing: AtomicBool::new(false),
            }
        }

        pub async fn with(rows: &[(&str, &str, i64)]) -> Self {
            let store = FlakyStore::new();
            for (title, method, rating) in rows {
                store
                    .inner
                    .insert(&NewSmoothie {
                        title: title.to_string(),
                        method: method.to_string(),
                        rating: *rating,
                    })
                    .await
                    .unwrap();
            }
            store
        }

        pub fn fail(&self, failing: bool) {
            self.failing.store(failing, Ordering::SeqCst);
        }

        pub fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }

        fn enter(&self) -> Result<(), StoreError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.failing.load(Ordering::SeqCst) {
                Err(StoreError::Network("connection reset by peer".to_string()))
            } else {
                Ok(())
            }
        }
    }

    #[async_trait]
    impl SmoothieStore for FlakyStore {
        async fn list(&self, order: OrderBy) -> Result<Vec<Smoothie>, StoreError> {
            self.enter()?;
            self.inner.list(order).await
        }

        async fn fetch(&self, id: SmoothieId) -> Result<Smoothie, StoreError> {
            self.enter()?;
            self.inner.fetch(id).await
        }

        async fn insert(&self, smoothie: &NewSmoothie) -> Result<Smoothie, StoreError> {
            self.enter()?;
            self.inner.insert(smoothie).await
        }

        async fn update(
            &self,
            id: SmoothieId,
            smoothie: &NewSmoothie,
        ) -> Result<Vec<Smoothie>, StoreError> {
            self.enter()?;
            self.inner.update(id, smoothie).await
        }

        async fn delete(&self, id: SmoothieId) -> Result<Vec<Smoothie>, StoreError> {
            self.enter()?;
            self.inner.delete(id).await
        }
    }
}
