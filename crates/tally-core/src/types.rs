//! # Domain Types
//!
//! Core domain types used throughout the dashboard.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │  CatalogItem    │   │   SaleHeader    │   │  SaleLineItem   │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id (i64)       │   │  id (i64)       │   │  sale_id (FK)   │       │
//! │  │  name           │   │  sales_date     │   │  product_id(FK) │       │
//! │  │  price          │   │  amount         │   │  price          │       │
//! │  │  item_type      │   │  discount/total │   │  quantity/total │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    SaleType     │   │   SaleStatus    │   │    ItemType     │       │
//! │  │  Customer       │   │  Completed      │   │  ForSale        │       │
//! │  │  Partner        │   │  Pending        │   │  ForPurchase    │       │
//! │  └─────────────────┘   │  Cancelled      │   └─────────────────┘       │
//! │                        └─────────────────┘                              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Identity
//! Every row is keyed by a store-generated integer id. A sale header's id
//! does not exist until the header row is inserted; see [`NewSale`].

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::money::Money;

/// Identifier of a dashboard user.
pub type UserId = i64;

/// Identifier of a catalog item.
pub type ItemId = i64;

/// Identifier of a sale header.
pub type SaleId = i64;

// =============================================================================
// Sale Type
// =============================================================================

/// Who the sale was made to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "PascalCase"))]
#[ts(export)]
pub enum SaleType {
    Customer,
    Partner,
}

impl SaleType {
    /// All accepted values, in form order.
    pub const ALL: [SaleType; 2] = [SaleType::Customer, SaleType::Partner];

    /// Wire/storage spelling.
    pub fn as_str(&self) -> &'static str {
        match self {
            SaleType::Customer => "Customer",
            SaleType::Partner => "Partner",
        }
    }
}

impl std::fmt::Display for SaleType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for SaleType {
    type Err = ();

    /// Exact, case-sensitive match; the form posts the literal values.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SaleType::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or(())
    }
}

// =============================================================================
// Sale Status
// =============================================================================

/// The status of a sale.
///
/// Sales recorded through the dashboard are always `Completed`; the other
/// states exist in the schema for sales imported from elsewhere.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "PascalCase"))]
#[ts(export)]
pub enum SaleStatus {
    Completed,
    Pending,
    Cancelled,
}

impl SaleStatus {
    /// Wire/storage spelling.
    pub fn as_str(&self) -> &'static str {
        match self {
            SaleStatus::Completed => "Completed",
            SaleStatus::Pending => "Pending",
            SaleStatus::Cancelled => "Cancelled",
        }
    }
}

impl std::fmt::Display for SaleStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Item Type
// =============================================================================

/// Whether a catalog item is sold or purchased.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "PascalCase"))]
pub enum ItemType {
    ForSale,
    ForPurchase,
}

// =============================================================================
// Form Field
// =============================================================================

/// Input names of the create-sale form.
///
/// Used as keys of [`crate::error::FormErrors`] so every message lands next
/// to the input that caused it.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS,
)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub enum FormField {
    SalesDate,
    Amount,
    Discount,
    Total,
    Type,
    Items,
}

// =============================================================================
// Catalog Item
// =============================================================================

/// An entry of the item catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogItem {
    pub id: ItemId,
    pub name: String,
    /// List price; the form pre-fills it but the user may override it.
    pub price: Money,
    pub item_type: ItemType,
}

// =============================================================================
// Sale Header
// =============================================================================

/// A persisted sale.
///
/// ## Invariant
/// `total == amount - discount`, computed server-side.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaleHeader {
    pub id: SaleId,
    pub sales_date: NaiveDate,
    /// Sum of line totals.
    pub amount: Money,
    pub discount: Money,
    pub total: Money,
    #[serde(rename = "type")]
    pub sale_type: SaleType,
    pub status: SaleStatus,
    pub added_by: UserId,
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Sale Line Item
// =============================================================================

/// A persisted line of a sale.
///
/// ## Invariant
/// `total == price × quantity`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaleLineItem {
    pub id: i64,
    pub sale_id: SaleId,
    pub product_id: ItemId,
    pub price: Money,
    pub quantity: Decimal,
    pub total: Money,
}

// =============================================================================
// New Sale (write model)
// =============================================================================

/// A fully validated and recomputed sale ready to be written.
///
/// Has no id: the store generates the header id inside the write transaction
/// and stamps it on every line.
#[derive(Debug, Clone, PartialEq)]
pub struct NewSale {
    pub sales_date: NaiveDate,
    pub amount: Money,
    pub discount: Money,
    pub total: Money,
    pub sale_type: SaleType,
    pub status: SaleStatus,
    pub added_by: UserId,
    pub lines: Vec<NewSaleLine>,
}

/// One line of a [`NewSale`].
#[derive(Debug, Clone, PartialEq)]
pub struct NewSaleLine {
    pub product_id: ItemId,
    pub price: Money,
    pub quantity: Decimal,
    pub total: Money,
}

// =============================================================================
// Sale Summary (read model)
// =============================================================================

/// One row of the sales listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaleSummary {
    pub id: SaleId,
    pub sales_date: NaiveDate,
    #[serde(rename = "type")]
    pub sale_type: SaleType,
    pub status: SaleStatus,
    pub amount: Money,
    pub discount: Money,
    pub total: Money,
    pub added_by_name: String,
    pub line_count: i64,
}

/// A sale header together with its lines.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaleDetail {
    #[serde(flatten)]
    pub header: SaleHeader,
    pub items: Vec<SaleLineItem>,
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sale_type_parse_is_exact() {
        assert_eq!("Customer".parse::<SaleType>(), Ok(SaleType::Customer));
        assert_eq!("Partner".parse::<SaleType>(), Ok(SaleType::Partner));
        assert!("customer".parse::<SaleType>().is_err());
        assert!("".parse::<SaleType>().is_err());
    }

    #[test]
    fn test_enum_wire_names() {
        assert_eq!(
            serde_json::to_string(&SaleStatus::Completed).unwrap(),
            "\"Completed\""
        );
        assert_eq!(
            serde_json::to_string(&FormField::SalesDate).unwrap(),
            "\"salesDate\""
        );
        assert_eq!(serde_json::to_string(&FormField::Type).unwrap(), "\"type\"");
    }
}
