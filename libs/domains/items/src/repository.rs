use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::error::ItemResult;
use crate::models::{CreateItem, Item, UpdateItem};

/// Repository trait for Item persistence
///
/// Absence is reported as `None` or `false`, never as an error.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ItemRepository: Send + Sync {
    /// Count all items
    async fn count(&self) -> ItemResult<u64>;

    /// Up to `limit` items after skipping `offset`, newest (highest id) first
    async fn list(&self, offset: u64, limit: u64) -> ItemResult<Vec<Item>>;

    /// Get an item by ID
    async fn get_by_id(&self, id: i64) -> ItemResult<Option<Item>>;

    /// Persist a new item; storage assigns the id
    async fn create(&self, input: CreateItem) -> ItemResult<Item>;

    /// Apply a partial update
    async fn update(&self, id: i64, input: UpdateItem) -> ItemResult<Option<Item>>;

    /// Delete an item by ID
    async fn delete(&self, id: i64) -> ItemResult<bool>;
}

#[derive(Debug, Default)]
struct Store {
    last_id: i64,
    items: BTreeMap<i64, Item>,
}

/// In-memory implementation of ItemRepository (for development/testing)
#[derive(Debug, Default, Clone)]
pub struct InMemoryItemRepository {
    store: Arc<RwLock<Store>>,
}

impl InMemoryItemRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ItemRepository for InMemoryItemRepository {
    async fn count(&self) -> ItemResult<u64> {
        let store = self.store.read().await;
        Ok(store.items.len() as u64)
    }

    async fn list(&self, offset: u64, limit: u64) -> ItemResult<Vec<Item>> {
        let store = self.store.read().await;

        Ok(store
            .items
            .values()
            .rev()
            .skip(usize::try_from(offset).unwrap_or(usize::MAX))
            .take(usize::try_from(limit).unwrap_or(usize::MAX))
            .cloned()
            .collect())
    }

    async fn get_by_id(&self, id: i64) -> ItemResult<Option<Item>> {
        let store = self.store.read().await;
        Ok(store.items.get(&id).cloned())
    }

    async fn create(&self, input: CreateItem) -> ItemResult<Item> {
        let mut store = self.store.write().await;

        // ids are never reused, even after a delete
        store.last_id += 1;
        let item = Item::new(store.last_id, input);
        store.items.insert(item.id, item.clone());

        tracing::info!(item_id = item.id, "Created item");
        Ok(item)
    }

    async fn update(&self, id: i64, input: UpdateItem) -> ItemResult<Option<Item>> {
        let mut store = self.store.write().await;

        let Some(item) = store.items.get_mut(&id) else {
            return Ok(None);
        };
        item.apply_update(input);

        tracing::info!(item_id = id, "Updated item");
        Ok(Some(item.clone()))
    }

    async fn delete(&self, id: i64) -> ItemResult<bool> {
        let mut store = self.store.write().await;

        if store.items.remove(&id).is_some() {
            tracing::info!(item_id = id, "Deleted item");
            Ok(true)
        } else {
            Ok(false)
        }
    }
}
