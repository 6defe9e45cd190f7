//! # Sale Repository
//!
//! Database operations for sale headers and their line items.
//!
//! ## Write Path
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                  insert_with_items (one transaction)                    │
//! │                                                                         │
//! │  BEGIN                                                                 │
//! │    INSERT INTO sales ...            → last_insert_rowid() = sale_id    │
//! │    INSERT INTO sale_items VALUES    (sale_id, ...), (sale_id, ...)     │
//! │  COMMIT                                                                │
//! │                                                                         │
//! │  Any failure before COMMIT → transaction dropped → ROLLBACK            │
//! │  (no header without its lines, no lines without their header)          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sqlx::{FromRow, QueryBuilder, Sqlite, SqlitePool};
use std::str::FromStr;
use tracing::{debug, info};

use crate::error::{DbError, DbResult};
use tally_core::{
    CoreError, Money, NewSale, SaleDetail, SaleHeader, SaleId, SaleLineItem, SaleStatus,
    SaleSummary, SaleType, UserId,
};

// =============================================================================
// Row Types
// =============================================================================

#[derive(Debug, FromRow)]
struct SaleRow {
    id: i64,
    sales_date: NaiveDate,
    amount: String,
    discount: String,
    total: String,
    sale_type: SaleType,
    status: SaleStatus,
    added_by: UserId,
    created_at: DateTime<Utc>,
}

#[derive(Debug, FromRow)]
struct SaleItemRow {
    id: i64,
    sale_id: i64,
    product_id: i64,
    price: String,
    quantity: String,
    total: String,
}

#[derive(Debug, FromRow)]
struct SaleSummaryRow {
    id: i64,
    sales_date: NaiveDate,
    sale_type: SaleType,
    status: SaleStatus,
    amount: String,
    discount: String,
    total: String,
    added_by_name: String,
    line_count: i64,
}

fn decode_money(field: &str, raw: &str) -> Result<Money, CoreError> {
    Money::from_str(raw).map_err(|_| CoreError::InvalidStoredValue {
        field: field.to_string(),
        value: raw.to_string(),
    })
}

fn decode_quantity(raw: &str) -> Result<Decimal, CoreError> {
    Decimal::from_str(raw).map_err(|_| CoreError::InvalidStoredValue {
        field: "quantity".to_string(),
        value: raw.to_string(),
    })
}

impl TryFrom<SaleRow> for SaleHeader {
    type Error = CoreError;

    fn try_from(row: SaleRow) -> Result<Self, Self::Error> {
        Ok(SaleHeader {
            id: row.id,
            sales_date: row.sales_date,
            amount: decode_money("amount", &row.amount)?,
            discount: decode_money("discount", &row.discount)?,
            total: decode_money("total", &row.total)?,
            sale_type: row.sale_type,
            status: row.status,
            added_by: row.added_by,
            created_at: row.created_at,
        })
    }
}

impl TryFrom<SaleItemRow> for SaleLineItem {
    type Error = CoreError;

    fn try_from(row: SaleItemRow) -> Result<Self, Self::Error> {
        Ok(SaleLineItem {
            id: row.id,
            sale_id: row.sale_id,
            product_id: row.product_id,
            price: decode_money("price", &row.price)?,
            quantity: decode_quantity(&row.quantity)?,
            total: decode_money("total", &row.total)?,
        })
    }
}

impl TryFrom<SaleSummaryRow> for SaleSummary {
    type Error = CoreError;

    fn try_from(row: SaleSummaryRow) -> Result<Self, Self::Error> {
        Ok(SaleSummary {
            id: row.id,
            sales_date: row.sales_date,
            sale_type: row.sale_type,
            status: row.status,
            amount: decode_money("amount", &row.amount)?,
            discount: decode_money("discount", &row.discount)?,
            total: decode_money("total", &row.total)?,
            added_by_name: row.added_by_name,
            line_count: row.line_count,
        })
    }
}

// =============================================================================
// Repository
// =============================================================================

/// Filter condition shared by the listing and page-count queries.
///
/// `?1` is the raw query (empty = no filter), `?2` the pattern built by
/// [`contains_pattern`].
const LISTING_FILTER: &str = r#"
    FROM sales s
    JOIN users u ON u.id = s.added_by
    WHERE ?1 = ''
       OR s.type LIKE ?2 ESCAPE '\'
       OR s.status LIKE ?2 ESCAPE '\'
       OR s.sales_date LIKE ?2 ESCAPE '\'
       OR u.name LIKE ?2 ESCAPE '\'
"#;

/// LIKE pattern matching `query` literally anywhere in a column.
fn contains_pattern(query: &str) -> String {
    let mut pattern = String::with_capacity(query.len() + 2);
    pattern.push('%');
    for c in query.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

/// Repository for sale database operations.
#[derive(Debug, Clone)]
pub struct SaleRepository {
    pool: SqlitePool,
}

impl SaleRepository {
    /// Creates a new SaleRepository.
    pub fn new(pool: SqlitePool) -> Self {
        SaleRepository { pool }
    }

    /// Writes a sale header and all of its lines in one transaction.
    ///
    /// The header id is generated by SQLite and stamped on every line
    /// before the commit. On any error the transaction is rolled back and
    /// nothing from this sale is visible.
    ///
    /// ## Returns
    /// The generated sale id.
    pub async fn insert_with_items(&self, sale: &NewSale) -> DbResult<SaleId> {
        debug!(
            added_by = sale.added_by,
            lines = sale.lines.len(),
            total = %sale.total,
            "Inserting sale"
        );

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| DbError::Transaction(e.to_string()))?;

        let sale_id = sqlx::query(
            r#"
            INSERT INTO sales (
                sales_date, amount, discount, total,
                type, status, added_by, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
        )
        .bind(sale.sales_date)
        .bind(sale.amount.to_storage())
        .bind(sale.discount.to_storage())
        .bind(sale.total.to_storage())
        .bind(sale.sale_type)
        .bind(sale.status)
        .bind(sale.added_by)
        .bind(Utc::now())
        .execute(&mut *tx)
        .await?
        .last_insert_rowid();

        if !sale.lines.is_empty() {
            let mut builder: QueryBuilder<Sqlite> = QueryBuilder::new(
                "INSERT INTO sale_items (sale_id, product_id, price, quantity, total) ",
            );
            builder.push_values(&sale.lines, |mut row, line| {
                row.push_bind(sale_id)
                    .push_bind(line.product_id)
                    .push_bind(line.price.to_storage())
                    .push_bind(line.quantity.normalize().to_string())
                    .push_bind(line.total.to_storage());
            });
            builder.build().execute(&mut *tx).await?;
        }

        tx.commit()
            .await
            .map_err(|e| DbError::Transaction(e.to_string()))?;

        info!(sale_id, lines = sale.lines.len(), "Sale recorded");
        Ok(sale_id)
    }

    /// Gets a sale header by ID.
    pub async fn get_by_id(&self, id: SaleId) -> DbResult<Option<SaleHeader>> {
        let row: Option<SaleRow> = sqlx::query_as(
            r#"
            SELECT
                id, sales_date, amount, discount, total,
                type AS sale_type, status, added_by, created_at
            FROM sales
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(SaleHeader::try_from).transpose()?)
    }

    /// Gets all lines of a sale, in insertion order.
    pub async fn get_items(&self, sale_id: SaleId) -> DbResult<Vec<SaleLineItem>> {
        let rows: Vec<SaleItemRow> = sqlx::query_as(
            r#"
            SELECT id, sale_id, product_id, price, quantity, total
            FROM sale_items
            WHERE sale_id = ?1
            ORDER BY id
            "#,
        )
        .bind(sale_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(|r| SaleLineItem::try_from(r).map_err(DbError::from))
            .collect()
    }

    /// Gets a sale header together with its lines.
    pub async fn get_detail(&self, id: SaleId) -> DbResult<SaleDetail> {
        let header = self
            .get_by_id(id)
            .await?
            .ok_or_else(|| DbError::not_found("Sale", id))?;
        let items = self.get_items(id).await?;

        Ok(SaleDetail { header, items })
    }

    /// Lists one page of sales matching `query`, newest first.
    ///
    /// `page` is 1-based; values below 1 are treated as 1. The match is
    /// case-insensitive over type, status, date and the recording user's
    /// name.
    pub async fn list_filtered(
        &self,
        query: &str,
        page: u32,
        page_size: u32,
    ) -> DbResult<Vec<SaleSummary>> {
        let query = query.trim();
        let offset = i64::from(page.max(1) - 1) * i64::from(page_size);

        let sql = format!(
            r#"
            SELECT
                s.id, s.sales_date, s.type AS sale_type, s.status,
                s.amount, s.discount, s.total,
                u.name AS added_by_name,
                (SELECT COUNT(*) FROM sale_items si WHERE si.sale_id = s.id) AS line_count
            {LISTING_FILTER}
            ORDER BY s.sales_date DESC, s.id DESC
            LIMIT ?3 OFFSET ?4
            "#
        );

        let rows: Vec<SaleSummaryRow> = sqlx::query_as(&sql)
            .bind(query)
            .bind(contains_pattern(query))
            .bind(i64::from(page_size))
            .bind(offset)
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter()
            .map(|r| SaleSummary::try_from(r).map_err(DbError::from))
            .collect()
    }

    /// Number of pages `list_filtered` can return for `query`.
    pub async fn count_pages(&self, query: &str, page_size: u32) -> DbResult<u32> {
        let query = query.trim();
        let sql = format!("SELECT COUNT(*) {LISTING_FILTER}");

        let count: i64 = sqlx::query_scalar(&sql)
            .bind(query)
            .bind(contains_pattern(query))
            .fetch_one(&self.pool)
            .await?;

        let page_size = i64::from(page_size.max(1));
        Ok(((count + page_size - 1) / page_size) as u32)
    }

    /// Total number of sale headers.
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM sales")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ConstraintKind, Database, DbConfig};
    use rust_decimal_macros::dec;
    use tally_core::{ItemType, NewSaleLine};

    struct Fixture {
        db: Database,
        user_id: UserId,
        widget: i64,
        gadget: i64,
    }

    async fn fixture() -> Fixture {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let user_id = db.users().insert("Ada Admin", "ada@example.com").await.unwrap();
        let widget = db
            .items()
            .insert("Widget", Money::new(dec!(10)), ItemType::ForSale)
            .await
            .unwrap();
        let gadget = db
            .items()
            .insert("Gadget", Money::new(dec!(5)), ItemType::ForSale)
            .await
            .unwrap();

        Fixture {
            db,
            user_id,
            widget,
            gadget,
        }
    }

    fn new_sale(added_by: UserId, lines: Vec<NewSaleLine>) -> NewSale {
        let amount: Money = lines.iter().map(|l| l.total).sum();
        let discount = Money::new(dec!(5));
        NewSale {
            sales_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            amount,
            discount,
            total: amount - discount,
            sale_type: SaleType::Customer,
            status: SaleStatus::Completed,
            added_by,
            lines,
        }
    }

    fn line(product_id: i64, price: Decimal, quantity: Decimal) -> NewSaleLine {
        NewSaleLine {
            product_id,
            price: Money::new(price),
            quantity,
            total: Money::new(price * quantity),
        }
    }

    #[tokio::test]
    async fn test_insert_with_items_round_trip() {
        let f = fixture().await;
        let sale = new_sale(
            f.user_id,
            vec![line(f.widget, dec!(10), dec!(2)), line(f.gadget, dec!(5), dec!(1.5))],
        );

        let id = f.db.sales().insert_with_items(&sale).await.unwrap();
        let detail = f.db.sales().get_detail(id).await.unwrap();

        assert_eq!(detail.header.amount, Money::new(dec!(27.5)));
        assert_eq!(detail.header.total, Money::new(dec!(22.5)));
        assert_eq!(detail.header.status, SaleStatus::Completed);
        assert_eq!(detail.header.sale_type, SaleType::Customer);
        assert_eq!(detail.items.len(), 2);
        assert!(detail.items.iter().all(|i| i.sale_id == id));
        assert_eq!(detail.items[1].quantity, dec!(1.5));
        assert_eq!(detail.items[1].total, Money::new(dec!(7.5)));
    }

    #[tokio::test]
    async fn test_failed_line_insert_leaves_no_header() {
        let f = fixture().await;
        let sale = new_sale(
            f.user_id,
            vec![line(f.widget, dec!(10), dec!(2)), line(9_999, dec!(1), dec!(1))],
        );

        let err = f.db.sales().insert_with_items(&sale).await.unwrap_err();
        assert!(matches!(
            err,
            DbError::Constraint {
                kind: ConstraintKind::ForeignKey,
                ..
            }
        ));

        assert_eq!(f.db.sales().count().await.unwrap(), 0);
        let lines: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM sale_items")
            .fetch_one(f.db.pool())
            .await
            .unwrap();
        assert_eq!(lines, 0);
    }

    #[tokio::test]
    async fn test_unknown_user_rejected() {
        let f = fixture().await;
        let sale = new_sale(f.user_id + 100, vec![line(f.widget, dec!(10), dec!(1))]);

        assert!(f.db.sales().insert_with_items(&sale).await.is_err());
        assert_eq!(f.db.sales().count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_sale_without_lines() {
        let f = fixture().await;
        let mut sale = new_sale(f.user_id, vec![]);
        sale.discount = Money::zero();
        sale.total = Money::zero();

        let id = f.db.sales().insert_with_items(&sale).await.unwrap();
        let detail = f.db.sales().get_detail(id).await.unwrap();
        assert!(detail.items.is_empty());
        assert_eq!(detail.header.amount, Money::zero());
    }

    #[tokio::test]
    async fn test_get_detail_missing() {
        let f = fixture().await;
        let err = f.db.sales().get_detail(42).await.unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_list_filtered_and_pages() {
        let f = fixture().await;
        for _ in 0..7 {
            let sale = new_sale(f.user_id, vec![line(f.widget, dec!(10), dec!(1))]);
            f.db.sales().insert_with_items(&sale).await.unwrap();
        }
        let mut partner = new_sale(f.user_id, vec![line(f.gadget, dec!(5), dec!(2))]);
        partner.sale_type = SaleType::Partner;
        f.db.sales().insert_with_items(&partner).await.unwrap();

        let repo = f.db.sales();
        assert_eq!(repo.list_filtered("", 1, 6).await.unwrap().len(), 6);
        assert_eq!(repo.list_filtered("", 2, 6).await.unwrap().len(), 2);
        assert_eq!(repo.count_pages("", 6).await.unwrap(), 2);

        let partners = repo.list_filtered("partner", 1, 6).await.unwrap();
        assert_eq!(partners.len(), 1);
        assert_eq!(partners[0].sale_type, SaleType::Partner);
        assert_eq!(partners[0].line_count, 1);
        assert_eq!(partners[0].added_by_name, "Ada Admin");

        assert_eq!(repo.list_filtered("ada", 1, 6).await.unwrap().len(), 6);
        assert_eq!(repo.count_pages("nobody", 6).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_search_wildcards_match_literally() {
        let f = fixture().await;
        let sale = new_sale(f.user_id, vec![line(f.widget, dec!(10), dec!(1))]);
        f.db.sales().insert_with_items(&sale).await.unwrap();

        let repo = f.db.sales();
        assert!(repo.list_filtered("_", 1, 6).await.unwrap().is_empty());
        assert!(repo.list_filtered("%", 1, 6).await.unwrap().is_empty());
        assert_eq!(repo.count_pages("_", 6).await.unwrap(), 0);
        assert_eq!(repo.list_filtered("2024-01", 1, 6).await.unwrap().len(), 1);
    }

    #[test]
    fn test_contains_pattern_escapes() {
        assert_eq!(contains_pattern("ada"), "%ada%");
        assert_eq!(contains_pattern("50%_off"), "%50\\%\\_off%");
        assert_eq!(contains_pattern("a\\b"), "%a\\\\b%");
    }
}
