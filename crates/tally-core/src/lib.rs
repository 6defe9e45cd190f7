//! # tally-core: Pure Business Logic for the Tally Dashboard
//!
//! Validation and arithmetic for recording sales. No I/O of any kind.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Tally Dashboard Architecture                      │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    Browser (create-sale form)                   │   │
//! │  │    pick items ──► running totals ──► POST /dashboard/sales/create   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │ HTTP                                   │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                 dashboard (axum routes + recorder)              │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ tally-core (THIS CRATE) ★                       │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │   types   │  │   money   │  │   sale    │  │ validation│  │   │
//! │  │   │ SaleHeader│  │   Money   │  │ SaleForm  │  │  parsers  │  │   │
//! │  │   │ NewSale   │  │  Decimal  │  │ recompute │  │   rules   │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    tally-db (Database Layer)                    │   │
//! │  │              SQLite queries, migrations, repositories           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (SaleHeader, SaleLineItem, CatalogItem, etc.)
//! - [`money`] - Money type over exact decimals
//! - [`error`] - Domain error types and per-field form errors
//! - [`validation`] - Field parsers and rules
//! - [`sale`] - Sale form validation and server-side totals
//! - [`draft`] - Client-side running state of a sale being composed
//!
//! ## Example Usage
//!
//! ```rust
//! use tally_core::sale::SaleForm;
//! use tally_core::types::SaleStatus;
//!
//! let form = SaleForm {
//!     sales_date: Some("2024-01-01".into()),
//!     amount: Some("20".into()),
//!     discount: Some("5".into()),
//!     total: Some("15".into()),
//!     sale_type: Some("Customer".into()),
//!     items: Some(r#"[{"itemId":"1","quantity":2,"price":10,"total":20}]"#.into()),
//! };
//!
//! let sale = form.validate().unwrap().into_new_sale(1);
//! assert_eq!(sale.total.to_string(), "$15.00");
//! assert_eq!(sale.status, SaleStatus::Completed);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod draft;
pub mod error;
pub mod money;
pub mod sale;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use error::{CoreError, CoreResult, FormErrors, ValidationError};
pub use money::Money;
pub use sale::{SaleForm, SalesFormState, ValidatedSale};
pub use types::*;
