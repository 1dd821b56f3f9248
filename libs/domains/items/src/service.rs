use axum_helpers::{PageParams, Paginated};
use std::sync::Arc;
use tracing::instrument;
use validator::Validate;

use crate::error::{ItemError, ItemResult};
use crate::models::{CreateItem, Item, UpdateItem};
use crate::repository::ItemRepository;

/// Service layer for Item CRUD semantics and pagination
///
/// Not-found is reported as `None`/`false`; turning it into a 404 is the
/// handler's job.
#[derive(Clone)]
pub struct ItemService<R: ItemRepository> {
    repository: Arc<R>,
}

impl<R: ItemRepository> ItemService<R> {
    pub fn new(repository: R) -> Self {
        Self {
            repository: Arc::new(repository),
        }
    }

    /// A window of items, newest first, plus the count of all items.
    ///
    /// The count and the window are separate reads; no snapshot ties them together.
    /// A window starting at or past `total` is empty and skips the list query.
    #[instrument(skip(self))]
    pub async fn list_items(&self, skip: u64, limit: u64) -> ItemResult<(Vec<Item>, u64)> {
        if limit == 0 {
            return Err(ItemError::Validation("limit must be at least 1".to_string()));
        }

        let total = self.repository.count().await?;
        if skip >= total {
            return Ok((Vec::new(), total));
        }
        let items = self.repository.list(skip, limit).await?;

        Ok((items, total))
    }

    /// One page of items with page metadata.
    #[instrument(skip(self))]
    pub async fn list_page(&self, params: PageParams) -> ItemResult<Paginated<Item>> {
        params
            .validate()
            .map_err(|e| ItemError::Validation(e.to_string()))?;

        let (items, total) = self.list_items(params.offset(), params.size).await?;
        Ok(Paginated::new(items, total, params))
    }

    #[instrument(skip(self))]
    pub async fn get_item(&self, id: i64) -> ItemResult<Option<Item>> {
        self.repository.get_by_id(id).await
    }

    #[instrument(skip(self, input))]
    pub async fn create_item(&self, input: CreateItem) -> ItemResult<Item> {
        input
            .validate()
            .map_err(|e| ItemError::Validation(e.to_string()))?;

        self.repository.create(input).await
    }

    #[instrument(skip(self, input))]
    pub async fn update_item(&self, id: i64, input: UpdateItem) -> ItemResult<Option<Item>> {
        input
            .validate()
            .map_err(|e| ItemError::Validation(e.to_string()))?;

        self.repository.update(id, input).await
    }

    #[instrument(skip(self))]
    pub async fn delete_item(&self, id: i64) -> ItemResult<bool> {
        self.repository.delete(id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Patch;
    use crate::repository::MockItemRepository;
    use mockall::predicate::eq;

    fn items(ids: impl Iterator<Item = i64>) -> Vec<Item> {
        ids.map(|id| Item::new(id, CreateItem::new(format!("item-{}", id))))
            .collect()
    }

    #[tokio::test]
    async fn test_list_page_computes_offset_and_pages() {
        let mut mock_repo = MockItemRepository::new();
        mock_repo.expect_count().returning(|| Ok(25));
        mock_repo
            .expect_list()
            .with(eq(10), eq(10))
            .returning(|_, _| Ok(items((6..=15).rev())));

        let service = ItemService::new(mock_repo);
        let page = service.list_page(PageParams::new(2, 10)).await.unwrap();

        assert_eq!(page.total, 25);
        assert_eq!(page.pages, 3);
        assert_eq!(page.page, 2);
        assert_eq!(page.size, 10);
        assert_eq!(page.items.first().map(|i| i.id), Some(15));
    }

    #[tokio::test]
    async fn test_list_page_empty_has_zero_pages() {
        let mut mock_repo = MockItemRepository::new();
        mock_repo.expect_count().returning(|| Ok(0));
        mock_repo.expect_list().never();

        let service = ItemService::new(mock_repo);
        let page = service.list_page(PageParams::default()).await.unwrap();

        assert_eq!(page.pages, 0);
        assert!(page.items.is_empty());
    }

    #[tokio::test]
    async fn test_list_page_past_the_end_skips_list_query() {
        let mut mock_repo = MockItemRepository::new();
        mock_repo.expect_count().returning(|| Ok(3));
        mock_repo.expect_list().never();

        let service = ItemService::new(mock_repo);
        for page in [2, 100_000_000_000_000_000, u64::MAX] {
            let result = service.list_page(PageParams::new(page, 100)).await.unwrap();
            assert!(result.items.is_empty());
            assert_eq!(result.total, 3);
            assert_eq!(result.pages, 1);
            assert_eq!(result.page, page);
        }
    }

    #[tokio::test]
    async fn test_list_items_rejects_zero_limit() {
        // no expectations: any repository call would panic
        let service = ItemService::new(MockItemRepository::new());

        let result = service.list_items(0, 0).await;
        assert!(matches!(result, Err(ItemError::Validation(_))));
    }

    #[tokio::test]
    async fn test_list_page_rejects_oversized_page() {
        let service = ItemService::new(MockItemRepository::new());

        let result = service.list_page(PageParams::new(1, 101)).await;
        assert!(matches!(result, Err(ItemError::Validation(_))));
    }

    #[tokio::test]
    async fn test_create_with_empty_name_never_reaches_storage() {
        let service = ItemService::new(MockItemRepository::new());

        let result = service.create_item(CreateItem::new("")).await;
        assert!(matches!(result, Err(ItemError::Validation(_))));
    }

    #[tokio::test]
    async fn test_create_delegates_to_repository() {
        let mut mock_repo = MockItemRepository::new();
        mock_repo
            .expect_create()
            .with(eq(CreateItem::new("widget")))
            .times(1)
            .returning(|input| Ok(Item::new(1, input)));

        let service = ItemService::new(mock_repo);
        let item = service.create_item(CreateItem::new("widget")).await.unwrap();
        assert_eq!(item.id, 1);
    }

    #[tokio::test]
    async fn test_update_with_null_name_never_reaches_storage() {
        let service = ItemService::new(MockItemRepository::new());

        let input = UpdateItem {
            name: Patch::Null,
            ..UpdateItem::default()
        };
        let result = service.update_item(1, input).await;
        assert!(matches!(result, Err(ItemError::Validation(_))));
    }

    #[tokio::test]
    async fn test_update_missing_item_is_none() {
        let mut mock_repo = MockItemRepository::new();
        mock_repo
            .expect_update()
            .with(eq(404), eq(UpdateItem::description("x")))
            .returning(|_, _| Ok(None));

        let service = ItemService::new(mock_repo);
        let result = service
            .update_item(404, UpdateItem::description("x"))
            .await
            .unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_get_and_delete_missing_item_are_not_errors() {
        let mut mock_repo = MockItemRepository::new();
        mock_repo.expect_get_by_id().with(eq(7)).returning(|_| Ok(None));
        mock_repo.expect_delete().with(eq(7)).returning(|_| Ok(false));

        let service = ItemService::new(mock_repo);
        assert!(service.get_item(7).await.unwrap().is_none());
        assert!(!service.delete_item(7).await.unwrap());
    }

    #[tokio::test]
    async fn test_storage_error_propagates() {
        let mut mock_repo = MockItemRepository::new();
        mock_repo
            .expect_count()
            .returning(|| Err(ItemError::Database(sea_orm::DbErr::Custom("down".into()))));

        let service = ItemService::new(mock_repo);
        let result = service.list_items(0, 10).await;
        assert!(matches!(result, Err(ItemError::Database(_))));
    }
}
