//! # Sale Form
//!
//! Turns a raw create-sale submission into a [`NewSale`] whose every total
//! was computed here, not by the browser.
//!
//! ## Pipeline
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     Create Sale Submission                              │
//! │                                                                         │
//! │  SaleForm (raw strings)                                                │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  validate() ─── every field checked, errors grouped per field          │
//! │       │            │                                                    │
//! │       │            └──► Err(FormErrors) → redisplay form               │
//! │       ▼                                                                 │
//! │  ValidatedSale                                                         │
//! │  ├── lines: quantity × price per line (client line total ignored)      │
//! │  ├── amount = Σ line totals       (client amount ignored)              │
//! │  └── total  = amount − discount   (client total ignored)               │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  into_new_sale(added_by) ─── status forced to Completed                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::collections::HashSet;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use ts_rs::TS;

use crate::error::{FormErrors, ValidationError};
use crate::money::Money;
use crate::types::{FormField, ItemId, NewSale, NewSaleLine, SaleStatus, SaleType, UserId};
use crate::validation::{
    json_decimal, json_item_id, non_blank, parse_discount, parse_positive_money,
    parse_present_money, parse_sale_type, parse_sales_date, validate_price, validate_quantity,
};

/// Message shown above the form when any field failed.
pub const MISSING_FIELDS_MESSAGE: &str = "Missing Fields. Failed to Create Sale.";

/// Message shown when the write transaction did not commit.
pub const DATABASE_ERROR_MESSAGE: &str = "Database Error: Failed to Create Sale.";

// =============================================================================
// Raw Submission
// =============================================================================

/// The create-sale form exactly as posted.
///
/// Every field is optional text; nothing here is trusted.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaleForm {
    pub sales_date: Option<String>,
    /// Client subtotal. Shape-checked only.
    pub amount: Option<String>,
    pub discount: Option<String>,
    /// Client grand total. Shape-checked only.
    pub total: Option<String>,
    #[serde(rename = "type")]
    pub sale_type: Option<String>,
    /// JSON array of `{itemId, quantity, price, total?}`.
    pub items: Option<String>,
}

// =============================================================================
// Validated Sale
// =============================================================================

/// One validated, recomputed line.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedLine {
    pub item_id: ItemId,
    pub quantity: Decimal,
    pub price: Money,
    pub total: Money,
}

/// A submission that passed validation, with server-side totals.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedSale {
    pub sales_date: NaiveDate,
    pub sale_type: SaleType,
    pub lines: Vec<ValidatedLine>,
    pub amount: Money,
    pub discount: Money,
    pub total: Money,
}

impl ValidatedSale {
    /// Item ids referenced by the lines, in submission order.
    pub fn item_ids(&self) -> Vec<ItemId> {
        self.lines.iter().map(|l| l.item_id).collect()
    }

    /// Builds the write model for the acting user.
    ///
    /// Status is always `Completed`.
    pub fn into_new_sale(self, added_by: UserId) -> NewSale {
        NewSale {
            sales_date: self.sales_date,
            amount: self.amount,
            discount: self.discount,
            total: self.total,
            sale_type: self.sale_type,
            status: SaleStatus::Completed,
            added_by,
            lines: self
                .lines
                .into_iter()
                .map(|l| NewSaleLine {
                    product_id: l.item_id,
                    price: l.price,
                    quantity: l.quantity,
                    total: l.total,
                })
                .collect(),
        }
    }
}

// =============================================================================
// Recomputation
// =============================================================================

/// Header totals derived from lines and discount.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SaleTotals {
    pub amount: Money,
    pub discount: Money,
    pub total: Money,
}

/// Computes a line total as exactly `price × quantity`.
///
/// A product that would have to be rounded is rejected, never stored.
pub fn line_total(price: Money, quantity: Decimal) -> Result<Money, ValidationError> {
    if price.exceeds_precision(quantity) {
        return Err(ValidationError::TooPrecise {
            field: "total".to_string(),
        });
    }

    let total = price
        .checked_mul_quantity(quantity)
        .ok_or_else(|| ValidationError::TooLarge {
            field: "total".to_string(),
        })?;

    if !total.is_positive() {
        return Err(ValidationError::MustBePositive {
            field: "total".to_string(),
        });
    }

    Ok(total)
}

/// Computes `amount = Σ line totals` and `total = amount − discount`.
///
/// ## Example
/// ```rust
/// use tally_core::money::Money;
/// use tally_core::sale::recompute_totals;
///
/// let totals = recompute_totals(&[Money::from_cents(2000)], Money::from_cents(500)).unwrap();
/// assert_eq!(totals.total, Money::from_cents(1500));
/// ```
pub fn recompute_totals(line_totals: &[Money], discount: Money) -> Result<SaleTotals, ValidationError> {
    let amount = line_totals
        .iter()
        .try_fold(Money::zero(), |acc, t| acc.checked_add(*t))
        .ok_or_else(|| ValidationError::TooLarge {
            field: "sub total".to_string(),
        })?;

    if discount > amount {
        return Err(ValidationError::Exceeds {
            field: "discount".to_string(),
            limit: "sub total".to_string(),
        });
    }

    let total = amount
        .checked_sub(discount)
        .ok_or_else(|| ValidationError::TooLarge {
            field: "total".to_string(),
        })?;

    Ok(SaleTotals {
        amount,
        discount,
        total,
    })
}

// =============================================================================
// Validation
// =============================================================================

impl SaleForm {
    /// Validates every field and recomputes all totals.
    ///
    /// ## Rules
    /// - `type` must be `Customer` or `Partner`
    /// - `salesDate` must be a `YYYY-MM-DD` date
    /// - `amount` must be a number greater than 0 (value then ignored)
    /// - `total` must be present and numeric (value then ignored)
    /// - `discount` defaults to 0 and may not be negative or exceed the
    ///   recomputed subtotal
    /// - `items` rows with quantity exactly 0 are unselected and dropped;
    ///   every other row needs quantity > 0, price > 0 and a unique item id
    ///
    /// All failures are collected; the result carries every message.
    pub fn validate(&self) -> Result<ValidatedSale, FormErrors> {
        let mut errors = FormErrors::new();

        let sale_type = parse_sale_type(self.sale_type.as_deref())
            .map_err(|e| errors.push(FormField::Type, e))
            .ok();

        let sales_date = parse_sales_date(self.sales_date.as_deref())
            .map_err(|e| errors.push(FormField::SalesDate, e))
            .ok();

        if let Err(e) = parse_positive_money("sub total", self.amount.as_deref()) {
            errors.push(FormField::Amount, e);
        }

        if let Err(e) = parse_present_money("total", self.total.as_deref()) {
            errors.push(FormField::Total, e);
        }

        let discount = parse_discount(self.discount.as_deref())
            .map_err(|e| errors.push(FormField::Discount, e))
            .ok();

        let lines = parse_lines(self.items.as_deref(), &mut errors);

        let totals = match (&lines, discount) {
            (Some(lines), Some(discount)) => {
                let line_totals: Vec<Money> = lines.iter().map(|l| l.total).collect();
                match recompute_totals(&line_totals, discount) {
                    Ok(totals) => Some(totals),
                    Err(e @ ValidationError::Exceeds { .. }) => {
                        errors.push(FormField::Discount, e);
                        None
                    }
                    Err(e) => {
                        errors.push(FormField::Items, e);
                        None
                    }
                }
            }
            _ => None,
        };

        match (sale_type, sales_date, lines, totals) {
            (Some(sale_type), Some(sales_date), Some(lines), Some(totals)) if errors.is_empty() => {
                Ok(ValidatedSale {
                    sales_date,
                    sale_type,
                    lines,
                    amount: totals.amount,
                    discount: totals.discount,
                    total: totals.total,
                })
            }
            _ => Err(errors),
        }
    }
}

/// Parses the `items` JSON, pushing every row error into `errors`.
///
/// Returns `None` when any row failed.
fn parse_lines(raw: Option<&str>, errors: &mut FormErrors) -> Option<Vec<ValidatedLine>> {
    let Some(raw) = non_blank(raw) else {
        errors.push(
            FormField::Items,
            ValidationError::Required {
                field: "list of items".to_string(),
            },
        );
        return None;
    };

    let rows = match serde_json::from_str::<Value>(raw) {
        Ok(Value::Array(rows)) => rows,
        _ => {
            errors.push(
                FormField::Items,
                ValidationError::InvalidFormat {
                    field: "list of items".to_string(),
                    reason: "expected a JSON array of {itemId, quantity, price}".to_string(),
                },
            );
            return None;
        }
    };

    let mut lines = Vec::with_capacity(rows.len());
    let mut seen = HashSet::new();
    let mut failed = false;

    for (index, row) in rows.iter().enumerate() {
        let row_number = index + 1;
        match parse_line(row) {
            Ok(None) => {}
            Ok(Some(line)) => {
                if seen.insert(line.item_id) {
                    lines.push(line);
                } else {
                    failed = true;
                    errors.push(
                        FormField::Items,
                        ValidationError::Duplicate {
                            field: "item".to_string(),
                            value: line.item_id.to_string(),
                        }
                        .at_row(row_number),
                    );
                }
            }
            Err(row_errors) => {
                failed = true;
                for e in row_errors {
                    errors.push(FormField::Items, e.at_row(row_number));
                }
            }
        }
    }

    if failed {
        None
    } else {
        Some(lines)
    }
}

/// Parses one row. `Ok(None)` means the row is unselected (quantity 0).
fn parse_line(row: &Value) -> Result<Option<ValidatedLine>, Vec<ValidationError>> {
    let Value::Object(fields) = row else {
        return Err(vec![ValidationError::InvalidFormat {
            field: "item".to_string(),
            reason: "expected an object".to_string(),
        }]);
    };
    let field = |name: &str| fields.get(name).unwrap_or(&Value::Null);

    let mut row_errors = Vec::new();

    let quantity = json_decimal("quantity", field("quantity"))
        .map_err(|e| row_errors.push(e))
        .ok();
    if quantity == Some(Decimal::ZERO) {
        return Ok(None);
    }
    let quantity = quantity.and_then(|q| {
        validate_quantity(q).map_err(|e| row_errors.push(e)).ok()?;
        Some(q)
    });

    let item_id = json_item_id(field("itemId")).map_err(|e| row_errors.push(e)).ok();

    let price = json_decimal("price", field("price"))
        .map(Money::new)
        .map_err(|e| row_errors.push(e))
        .ok()
        .and_then(|p| {
            validate_price(p).map_err(|e| row_errors.push(e)).ok()?;
            Some(p)
        });

    // The client line total is a display value; only its shape is checked.
    if let Some(client_total) = fields.get("total").filter(|v| !v.is_null()) {
        if let Err(e) = json_decimal("total", client_total) {
            row_errors.push(e);
        }
    }

    let total = match (price, quantity) {
        (Some(price), Some(quantity)) => line_total(price, quantity)
            .map_err(|e| row_errors.push(e))
            .ok(),
        _ => None,
    };

    match (item_id, quantity, price, total) {
        (Some(item_id), Some(quantity), Some(price), Some(total)) if row_errors.is_empty() => {
            Ok(Some(ValidatedLine {
                item_id,
                quantity,
                price,
                total,
            }))
        }
        _ => Err(row_errors),
    }
}

// =============================================================================
// Form State
// =============================================================================

/// What the form renderer receives after a failed submission.
///
/// ```json
/// { "errors": { "items": ["Item 2: Please enter a price greater than 0."] },
///   "message": "Missing Fields. Failed to Create Sale." }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, TS)]
#[ts(export)]
pub struct SalesFormState {
    #[serde(skip_serializing_if = "Option::is_none")]
    #[ts(optional, type = "Record<string, Array<string>>")]
    pub errors: Option<FormErrors>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[ts(optional)]
    pub message: Option<String>,
}

impl SalesFormState {
    /// State for a submission that failed field validation.
    pub fn invalid(errors: FormErrors) -> Self {
        SalesFormState {
            errors: Some(errors),
            message: Some(MISSING_FIELDS_MESSAGE.to_string()),
        }
    }

    /// State carrying only a message (persistence failures).
    pub fn message(message: impl Into<String>) -> Self {
        SalesFormState {
            errors: None,
            message: Some(message.into()),
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
