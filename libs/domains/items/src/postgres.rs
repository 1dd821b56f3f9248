use async_trait::async_trait;
use database::postgres::UnitOfWork;
use sea_orm::ActiveValue::{Set, Unchanged};
use sea_orm::{
    ActiveModelTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryOrder, QuerySelect,
};

use crate::{
    entity,
    error::ItemResult,
    models::{CreateItem, Item, UpdateItem},
    repository::ItemRepository,
};

/// Largest OFFSET/LIMIT Postgres accepts; both are bound as `BIGINT`.
const MAX_SQL_BOUND: u64 = i64::MAX as u64;

/// Postgres-backed [`ItemRepository`].
///
/// Reads run directly on the pool. Each mutation runs in its own
/// [`UnitOfWork`]; update and delete first take a row lock with
/// `SELECT ... FOR UPDATE`, so concurrent writers to one item serialize.
#[derive(Clone)]
pub struct PgItemRepository {
    db: DatabaseConnection,
}

impl PgItemRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl ItemRepository for PgItemRepository {
    async fn count(&self) -> ItemResult<u64> {
        Ok(entity::Entity::find().count(&self.db).await?)
    }

    async fn list(&self, offset: u64, limit: u64) -> ItemResult<Vec<Item>> {
        // no table holds more rows than fit in BIGINT
        if offset > MAX_SQL_BOUND {
            return Ok(Vec::new());
        }

        let models = entity::Entity::find()
            .order_by_desc(entity::Column::Id)
            .offset(offset)
            .limit(limit.min(MAX_SQL_BOUND))
            .all(&self.db)
            .await?;

        Ok(models.into_iter().map(Item::from).collect())
    }

    async fn get_by_id(&self, id: i64) -> ItemResult<Option<Item>> {
        let model = entity::Entity::find_by_id(id).one(&self.db).await?;
        Ok(model.map(Item::from))
    }

    async fn create(&self, input: CreateItem) -> ItemResult<Item> {
        let uow = UnitOfWork::begin(&self.db).await?;

        let active_model: entity::ActiveModel = input.into();
        let model = active_model.insert(uow.connection()).await?;

        uow.commit().await?;

        tracing::info!(item_id = model.id, "Created item");
        Ok(model.into())
    }

    async fn update(&self, id: i64, input: UpdateItem) -> ItemResult<Option<Item>> {
        let uow = UnitOfWork::begin(&self.db).await?;

        let Some(model) = entity::Entity::find_by_id(id)
            .lock_exclusive()
            .one(uow.connection())
            .await?
        else {
            uow.rollback().await?;
            return Ok(None);
        };

        let mut item: Item = model.into();
        item.apply_update(input);

        let active_model = entity::ActiveModel {
            id: Unchanged(item.id),
            name: Set(item.name),
            description: Set(item.description),
            created_at: Unchanged(item.created_at.fixed_offset()),
            updated_at: Set(item.updated_at.fixed_offset()),
        };
        let updated = active_model.update(uow.connection()).await?;

        uow.commit().await?;

        tracing::info!(item_id = id, "Updated item");
        Ok(Some(updated.into()))
    }

    async fn delete(&self, id: i64) -> ItemResult<bool> {
        let uow = UnitOfWork::begin(&self.db).await?;

        let locked = entity::Entity::find_by_id(id)
            .lock_exclusive()
            .one(uow.connection())
            .await?;
        if locked.is_none() {
            uow.rollback().await?;
            return Ok(false);
        }

        entity::Entity::delete_by_id(id)
            .exec(uow.connection())
            .await?;
        uow.commit().await?;

        tracing::info!(item_id = id, "Deleted item");
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ItemError;
    use crate::models::now_micros;
    use sea_orm::{DatabaseBackend, DbErr, MockDatabase, MockExecResult, Value};

    fn logged_sql(db: DatabaseConnection) -> Vec<String> {
        db.into_transaction_log()
            .iter()
            .flat_map(|txn| txn.statements().iter().map(|stmt| stmt.sql.clone()))
            .collect()
    }

    fn model(id: i64, name: &str) -> entity::Model {
        let now = now_micros().fixed_offset();
        entity::Model {
            id,
            name: name.to_string(),
            description: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn test_get_by_id_maps_model() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![model(3, "widget")]])
            .into_connection();
        let repo = PgItemRepository::new(db);

        let item = repo.get_by_id(3).await.unwrap().unwrap();
        assert_eq!(item.id, 3);
        assert_eq!(item.name, "widget");
    }

    #[tokio::test]
    async fn test_list_maps_all_rows() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![model(2, "b"), model(1, "a")]])
            .into_connection();
        let repo = PgItemRepository::new(db);

        let items = repo.list(0, 10).await.unwrap();
        let ids: Vec<i64> = items.iter().map(|i| i.id).collect();
        assert_eq!(ids, vec![2, 1]);
    }

    #[tokio::test]
    async fn test_create_returns_inserted_row() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![model(1, "widget")]])
            .into_connection();
        let repo = PgItemRepository::new(db);

        let item = repo.create(CreateItem::new("widget")).await.unwrap();
        assert_eq!(item.id, 1);
    }

    #[tokio::test]
    async fn test_update_missing_row_returns_none() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<entity::Model>::new()])
            .into_connection();
        let repo = PgItemRepository::new(db);

        let result = repo.update(9, UpdateItem::name("x")).await.unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_delete_locks_then_removes() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![model(5, "gone")]])
            .append_exec_results([MockExecResult {
                last_insert_id: 0,
                rows_affected: 1,
            }])
            .into_connection();
        let repo = PgItemRepository::new(db);

        assert!(repo.delete(5).await.unwrap());
    }

    #[tokio::test]
    async fn test_list_offset_beyond_bigint_runs_no_query() {
        let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();
        let repo = PgItemRepository::new(db.clone());

        assert!(repo.list(u64::MAX, 10).await.unwrap().is_empty());
        assert!(repo.list(MAX_SQL_BOUND + 1, 10).await.unwrap().is_empty());
        assert!(db.into_transaction_log().is_empty());
    }

    #[tokio::test]
    async fn test_list_limit_is_clamped_to_bigint() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![model(1, "a")]])
            .into_connection();
        let repo = PgItemRepository::new(db.clone());

        repo.list(0, u64::MAX).await.unwrap();

        let log = db.into_transaction_log();
        let values = log[0].statements()[0].values.clone().unwrap().0;
        assert!(values.contains(&Value::BigUnsigned(Some(MAX_SQL_BOUND))));
        assert!(!values.contains(&Value::BigUnsigned(Some(u64::MAX))));
    }

    #[tokio::test]
    async fn test_failed_update_rolls_back() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![model(4, "locked")]])
            .append_query_errors([DbErr::Custom("check constraint violated".to_string())])
            .into_connection();
        let repo = PgItemRepository::new(db.clone());

        let result = repo.update(4, UpdateItem::name("renamed")).await;
        assert!(matches!(result, Err(ItemError::Database(_))));

        let sql = logged_sql(db);
        assert_eq!(sql.first().map(String::as_str), Some("BEGIN"));
        assert!(sql[1].contains("FOR UPDATE"));
        assert!(sql[2].starts_with("UPDATE"));
        assert_eq!(sql.last().map(String::as_str), Some("ROLLBACK"));
        assert!(!sql.iter().any(|s| s == "COMMIT"));
    }

    #[tokio::test]
    async fn test_failed_delete_rolls_back() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![model(6, "locked")]])
            .append_exec_errors([DbErr::Custom("connection reset".to_string())])
            .into_connection();
        let repo = PgItemRepository::new(db.clone());

        assert!(repo.delete(6).await.is_err());

        let sql = logged_sql(db);
        assert_eq!(sql.first().map(String::as_str), Some("BEGIN"));
        assert!(sql[2].starts_with("DELETE"));
        assert_eq!(sql.last().map(String::as_str), Some("ROLLBACK"));
        assert!(!sql.iter().any(|s| s == "COMMIT"));
    }

    #[tokio::test]
    async fn test_storage_failure_propagates() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_errors([DbErr::Custom("connection reset".to_string())])
            .into_connection();
        let repo = PgItemRepository::new(db);

        assert!(repo.get_by_id(1).await.is_err());
    }
}
