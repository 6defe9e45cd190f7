//! # Sale Recorder
//!
//! The create-sale command: one submission in, one committed sale (or
//! nothing at all) out.
//!
//! ## Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  record(identity, form)                                                │
//! │       │                                                                 │
//! │       ├── no identity? ──────────────► RecordError::Authentication      │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SaleForm::validate() ─── errors? ───► RecordError::Validation         │
//! │       │   (totals recomputed here)                                      │
//! │       ▼                                                                 │
//! │  catalog lookup ──── unknown id? ────► RecordError::Validation         │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  insert_with_items (one transaction) ─ fails? ─► RecordError::Persistence
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  invalidate listing cache → RecordedSale                               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::collections::HashSet;
use std::sync::Arc;

use serde::Serialize;
use tally_core::error::ValidationError;
use tally_core::{FormErrors, FormField, Money, SaleForm, SaleId, SalesFormState};
use tally_db::{Database, DbError};
use thiserror::Error;
use tracing::{debug, error, info, warn};

use crate::session::Identity;
use crate::state::SalesListingCache;

pub use tally_core::sale::DATABASE_ERROR_MESSAGE;

/// Message of the authentication failure.
pub const NO_IDENTITY_MESSAGE: &str = "no identity found";

/// Why a submission was not recorded.
#[derive(Debug, Error)]
pub enum RecordError {
    /// No session identity; nothing was validated or written.
    #[error("Authentication error: {0}")]
    Authentication(String),

    /// One or more fields failed; nothing was written.
    #[error("Validation failed on {} field(s)", .0.fields().count())]
    Validation(FormErrors),

    /// The write transaction did not commit; nothing was written.
    #[error("Persistence error: {0}")]
    Persistence(#[from] DbError),
}

impl RecordError {
    /// The form state shown to the user for this failure.
    ///
    /// Persistence details are never included.
    pub fn form_state(&self) -> SalesFormState {
        match self {
            RecordError::Validation(errors) => SalesFormState::invalid(errors.clone()),
            RecordError::Persistence(_) => SalesFormState::message(DATABASE_ERROR_MESSAGE),
            RecordError::Authentication(reason) => {
                SalesFormState::message(format!("Authentication error: {reason}"))
            }
        }
    }
}

/// A committed sale.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordedSale {
    pub sale_id: SaleId,
    pub total: Money,
    pub line_count: usize,
}

/// Records sales submitted through the create-sale form.
#[derive(Clone)]
pub struct SaleRecorder {
    db: Database,
    listing_cache: Arc<SalesListingCache>,
}

impl SaleRecorder {
    pub fn new(db: Database, listing_cache: Arc<SalesListingCache>) -> Self {
        SaleRecorder { db, listing_cache }
    }

    /// Validates, recomputes and atomically persists one submission.
    ///
    /// The identity check runs first; without one, the form is not even
    /// looked at.
    pub async fn record(
        &self,
        identity: Option<&Identity>,
        form: &SaleForm,
    ) -> Result<RecordedSale, RecordError> {
        let Some(identity) = identity else {
            warn!("Sale submission without a session identity");
            return Err(RecordError::Authentication(NO_IDENTITY_MESSAGE.to_string()));
        };

        let validated = form.validate().map_err(|errors| {
            debug!(user_id = identity.user_id, ?errors, "Sale form rejected");
            RecordError::Validation(errors)
        })?;

        self.check_catalog(&validated.item_ids()).await?;

        let new_sale = validated.into_new_sale(identity.user_id);
        let line_count = new_sale.lines.len();
        let total = new_sale.total;

        let sale_id = self
            .db
            .sales()
            .insert_with_items(&new_sale)
            .await
            .map_err(|e| {
                error!(user_id = identity.user_id, error = %e, "Failed to create sale");
                RecordError::Persistence(e)
            })?;

        self.listing_cache.invalidate().await;

        info!(
            sale_id,
            user_id = identity.user_id,
            lines = line_count,
            total = %total,
            "Sale created"
        );

        Ok(RecordedSale {
            sale_id,
            total,
            line_count,
        })
    }

    /// Every submitted item must exist in the catalog.
    async fn check_catalog(&self, item_ids: &[i64]) -> Result<(), RecordError> {
        let existing: HashSet<i64> = self
            .db
            .items()
            .find_existing_ids(item_ids)
            .await
            .map_err(|e| {
                error!(error = %e, "Catalog lookup failed");
                RecordError::Persistence(e)
            })?
            .into_iter()
            .collect();

        let mut errors = FormErrors::new();
        for id in item_ids.iter().filter(|id| !existing.contains(id)) {
            errors.push(
                FormField::Items,
                ValidationError::Unknown {
                    field: "item".to_string(),
                    value: id.to_string(),
                },
            );
        }

        errors.into_result(()).map_err(RecordError::Validation)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
