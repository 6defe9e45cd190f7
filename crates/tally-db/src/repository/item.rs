//! # Item Repository
//!
//! Catalog lookups for the create-sale form and the recorder.
//!
//! ## Key Operations
//! - `list_for_sale` - items the form offers, ordered by name
//! - `find_existing_ids` - which submitted item ids exist at all

use chrono::Utc;
use sqlx::{FromRow, QueryBuilder, Sqlite, SqlitePool};
use std::str::FromStr;
use tracing::debug;

use crate::error::{DbError, DbResult};
use tally_core::{CatalogItem, CoreError, ItemId, ItemType, Money};

#[derive(Debug, FromRow)]
struct ItemRow {
    id: i64,
    name: String,
    price: String,
    item_type: ItemType,
}

impl TryFrom<ItemRow> for CatalogItem {
    type Error = CoreError;

    fn try_from(row: ItemRow) -> Result<Self, Self::Error> {
        let price = Money::from_str(&row.price).map_err(|_| CoreError::InvalidStoredValue {
            field: "price".to_string(),
            value: row.price.clone(),
        })?;

        Ok(CatalogItem {
            id: row.id,
            name: row.name,
            price,
            item_type: row.item_type,
        })
    }
}

/// Repository for catalog item operations.
#[derive(Debug, Clone)]
pub struct ItemRepository {
    pool: SqlitePool,
}

impl ItemRepository {
    /// Creates a new ItemRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ItemRepository { pool }
    }

    /// Inserts a catalog item and returns its generated id.
    pub async fn insert(&self, name: &str, price: Money, item_type: ItemType) -> DbResult<ItemId> {
        debug!(name, price = %price, "Inserting item");

        let id = sqlx::query(
            "INSERT INTO items (name, price, type, created_at) VALUES (?1, ?2, ?3, ?4)",
        )
        .bind(name)
        .bind(price.to_storage())
        .bind(item_type)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?
        .last_insert_rowid();

        Ok(id)
    }

    /// Gets an item by id.
    pub async fn get_by_id(&self, id: ItemId) -> DbResult<Option<CatalogItem>> {
        let row: Option<ItemRow> = sqlx::query_as(
            "SELECT id, name, price, type AS item_type FROM items WHERE id = ?1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(CatalogItem::try_from).transpose()?)
    }

    /// Items of type `ForSale`, ordered by name.
    pub async fn list_for_sale(&self) -> DbResult<Vec<CatalogItem>> {
        let rows: Vec<ItemRow> = sqlx::query_as(
            r#"
            SELECT id, name, price, type AS item_type
            FROM items
            WHERE type = ?1
            ORDER BY name ASC, id ASC
            "#,
        )
        .bind(ItemType::ForSale)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(|r| CatalogItem::try_from(r).map_err(DbError::from))
            .collect()
    }

    /// Total number of catalog items.
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM items")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    /// Returns the subset of `ids` that exist in the catalog.
    pub async fn find_existing_ids(&self, ids: &[ItemId]) -> DbResult<Vec<ItemId>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut builder: QueryBuilder<Sqlite> =
            QueryBuilder::new("SELECT id FROM items WHERE id IN (");
        let mut separated = builder.separated(", ");
        for id in ids {
            separated.push_bind(*id);
        }
        separated.push_unseparated(")");

        let found: Vec<i64> = builder
            .build_query_scalar::<i64>()
            .fetch_all(&self.pool)
            .await?;

        Ok(found)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Database, DbConfig};
    use rust_decimal_macros::dec;

    #[tokio::test]
    async fn test_list_for_sale_filters_and_orders() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let items = db.items();
        items.insert("Zinc", Money::new(dec!(3)), ItemType::ForSale).await.unwrap();
        items.insert("Apple", Money::new(dec!(1.25)), ItemType::ForSale).await.unwrap();
        items.insert("Flour", Money::new(dec!(9)), ItemType::ForPurchase).await.unwrap();

        let listed = items.list_for_sale().await.unwrap();
        let names: Vec<&str> = listed.iter().map(|i| i.name.as_str()).collect();
        assert_eq!(names, vec!["Apple", "Zinc"]);
        assert_eq!(listed[0].price, Money::new(dec!(1.25)));
    }

    #[tokio::test]
    async fn test_find_existing_ids() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let a = db
            .items()
            .insert("A", Money::new(dec!(1)), ItemType::ForSale)
            .await
            .unwrap();

        let mut found = db.items().find_existing_ids(&[a, 404]).await.unwrap();
        found.sort();
        assert_eq!(found, vec![a]);
        assert!(db.items().find_existing_ids(&[]).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_get_by_id() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let id = db
            .items()
            .insert("Bolt", Money::new(dec!(0.5)), ItemType::ForSale)
            .await
            .unwrap();

        let item = db.items().get_by_id(id).await.unwrap().unwrap();
        assert_eq!(item.item_type, ItemType::ForSale);
        assert!(db.items().get_by_id(id + 1).await.unwrap().is_none());
    }
}
