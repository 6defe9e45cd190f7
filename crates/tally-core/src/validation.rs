//! # Validation Module
//!
//! Field-level parsers and rules for raw form input.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Form renderer (browser)                                      │
//! │  ├── Running totals, drops rows with quantity 0                        │
//! │  └── Advisory only - never trusted                                     │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: Sale form (tally-core::sale)                                 │
//! │  ├── THIS MODULE: one field, one rule, one ValidationError             │
//! │  └── Recomputes every total from validated lines                       │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                            │
//! │  ├── NOT NULL / CHECK constraints                                      │
//! │  └── Foreign keys to users and items                                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde_json::Value;

use crate::error::ValidationError;
use crate::money::Money;
use crate::types::{ItemId, SaleType};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Date format posted by `<input type="date">`.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

// =============================================================================
// Text Parsers
// =============================================================================

/// Trims a raw field, mapping blank input to `None`.
pub fn non_blank(raw: Option<&str>) -> Option<&str> {
    raw.map(str::trim).filter(|s| !s.is_empty())
}

/// Parses a decimal number from form text.
///
/// Accepts plain (`"12.5"`) and scientific (`"1e3"`) notation.
pub fn parse_decimal(field: &str, raw: &str) -> ValidationResult<Decimal> {
    let raw = raw.trim();
    Decimal::from_str_exact(raw)
        .or_else(|_| Decimal::from_scientific(raw))
        .map_err(|_| ValidationError::InvalidFormat {
            field: field.to_string(),
            reason: "must be a number".to_string(),
        })
}

/// Parses a calendar date in `YYYY-MM-DD` form.
///
/// ## Example
/// ```rust
/// use tally_core::validation::parse_sales_date;
///
/// assert!(parse_sales_date(Some("2024-01-01")).is_ok());
/// assert!(parse_sales_date(Some("2024-02-30")).is_err());
/// assert!(parse_sales_date(None).is_err());
/// ```
pub fn parse_sales_date(raw: Option<&str>) -> ValidationResult<NaiveDate> {
    let raw = non_blank(raw).ok_or_else(|| ValidationError::Required {
        field: "sales date".to_string(),
    })?;

    NaiveDate::parse_from_str(raw, DATE_FORMAT).map_err(|_| ValidationError::InvalidFormat {
        field: "sales date".to_string(),
        reason: "use the YYYY-MM-DD format".to_string(),
    })
}

/// Parses the sale type radio value.
pub fn parse_sale_type(raw: Option<&str>) -> ValidationResult<SaleType> {
    raw.map(str::trim)
        .and_then(|s| s.parse::<SaleType>().ok())
        .ok_or_else(|| ValidationError::NotAllowed {
            field: "sales type".to_string(),
            allowed: SaleType::ALL.iter().map(|t| t.to_string()).collect(),
        })
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Parses a required amount that must be strictly positive.
///
/// Blank input is reported as "greater than 0" because an empty number
/// input submits as zero.
pub fn parse_positive_money(field: &str, raw: Option<&str>) -> ValidationResult<Money> {
    let value = match non_blank(raw) {
        Some(raw) => parse_decimal(field, raw)?,
        None => Decimal::ZERO,
    };

    if value <= Decimal::ZERO {
        return Err(ValidationError::MustBePositive {
            field: field.to_string(),
        });
    }

    Ok(Money::new(value))
}

/// Parses a required amount whose value is not constrained.
pub fn parse_present_money(field: &str, raw: Option<&str>) -> ValidationResult<Money> {
    let raw = non_blank(raw).ok_or_else(|| ValidationError::Required {
        field: field.to_string(),
    })?;

    parse_decimal(field, raw).map(Money::new)
}

/// Parses the optional discount.
///
/// ## Rules
/// - Absent or blank → zero
/// - Zero is allowed
/// - Negative is rejected
///
/// ## Example
/// ```rust
/// use tally_core::money::Money;
/// use tally_core::validation::parse_discount;
///
/// assert_eq!(parse_discount(None).unwrap(), Money::zero());
/// assert_eq!(parse_discount(Some("5")).unwrap(), Money::from_cents(500));
/// assert!(parse_discount(Some("-1")).is_err());
/// ```
pub fn parse_discount(raw: Option<&str>) -> ValidationResult<Money> {
    let Some(raw) = non_blank(raw) else {
        return Ok(Money::zero());
    };

    let value = parse_decimal("discount", raw)?;
    if value < Decimal::ZERO {
        return Err(ValidationError::Negative {
            field: "discount".to_string(),
        });
    }

    Ok(Money::new(value))
}

/// Validates a line quantity that has already been selected.
///
/// Zero-quantity rows never reach this check; see
/// [`crate::sale::SaleForm::validate`].
pub fn validate_quantity(quantity: Decimal) -> ValidationResult<()> {
    if quantity <= Decimal::ZERO {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }

    Ok(())
}

/// Validates a line price.
///
/// ## Rules
/// - Must be strictly positive; free lines are not recorded
pub fn validate_price(price: Money) -> ValidationResult<()> {
    if !price.is_positive() {
        return Err(ValidationError::MustBePositive {
            field: "price".to_string(),
        });
    }

    Ok(())
}

// =============================================================================
// JSON Parsers
// =============================================================================

/// Reads a decimal out of a JSON number or numeric string.
pub fn json_decimal(field: &str, value: &Value) -> ValidationResult<Decimal> {
    match value {
        Value::Number(n) => parse_decimal(field, &n.to_string()),
        Value::String(s) if !s.trim().is_empty() => parse_decimal(field, s),
        Value::Null => Err(ValidationError::Required {
            field: field.to_string(),
        }),
        Value::String(_) => Err(ValidationError::Required {
            field: field.to_string(),
        }),
        _ => Err(ValidationError::InvalidFormat {
            field: field.to_string(),
            reason: "must be a number".to_string(),
        }),
    }
}

/// Reads a catalog item id out of a JSON string or integer.
///
/// ## Rules
/// - `"1"` and `1` are both accepted
/// - Must be a positive integer
pub fn json_item_id(value: &Value) -> ValidationResult<ItemId> {
    let invalid = || ValidationError::InvalidFormat {
        field: "item id".to_string(),
        reason: "must be a catalog item id".to_string(),
    };

    let id = match value {
        Value::Number(n) => n.as_i64().ok_or_else(invalid)?,
        Value::String(s) if s.trim().is_empty() => {
            return Err(ValidationError::Required {
                field: "item id".to_string(),
            })
        }
        Value::String(s) => s.trim().parse::<i64>().map_err(|_| invalid())?,
        Value::Null => {
            return Err(ValidationError::Required {
                field: "item id".to_string(),
            })
        }
        _ => return Err(invalid()),
    };

    if id <= 0 {
        return Err(invalid());
    }

    Ok(id)
}

// =============================================================================
// Unit Tests
// =============================================================================
