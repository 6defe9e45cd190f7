//! # Tally Dashboard
//!
//! HTTP backend of the sales admin dashboard.
//!
//! ## Module Organization
//!
//! - [`config`] - Layered configuration (defaults, file, `TALLY_*` env)
//! - [`session`] - Session tokens and request identity
//! - [`state`] - Shared state and the sales listing cache
//! - [`recorder`] - The create-sale command
//! - [`routes`] - axum handlers
//! - [`error`] - API error type and HTTP mapping

pub mod config;
pub mod error;
pub mod recorder;
pub mod routes;
pub mod session;
pub mod state;

pub use config::DashboardConfig;
pub use error::{ApiError, ErrorCode};
pub use recorder::{RecordError, RecordedSale, SaleRecorder};
pub use routes::router;
pub use session::{Identity, JwtSessionProvider, SessionProvider};
pub use state::{AppState, SalesListingCache};
