//! # Repository Module
//!
//! Database repository implementations for the Tally dashboard.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Repository Pattern                                   │
//! │                                                                         │
//! │  HTTP handler / SaleRecorder                                           │
//! │       │                                                                 │
//! │       │  db.sales().insert_with_items(&new_sale)                       │
//! │       ▼                                                                 │
//! │  SaleRepository                                                        │
//! │  ├── insert_with_items(&self, sale)                                    │
//! │  ├── get_detail(&self, id)                                             │
//! │  └── list_filtered(&self, query, page, page_size)                      │
//! │       │                                                                 │
//! │       │  SQL Query                                                      │
//! │       ▼                                                                 │
//! │  SQLite Database                                                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`SaleRepository`](sale::SaleRepository) - Sale headers and line items
//! - [`ItemRepository`](item::ItemRepository) - Catalog items
//! - [`UserRepository`](user::UserRepository) - Users

pub mod item;
pub mod sale;
pub mod user;
