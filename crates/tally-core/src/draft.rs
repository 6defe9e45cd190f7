//! # Sale Draft
//!
//! The running state of the create-sale form while the user picks items.
//!
//! The draft mirrors what the form renderer keeps client-side: a list of
//! selected items with display totals, a discount, and the derived subtotal
//! and grand total. It serializes into the same fields the browser posts,
//! so [`SaleDraft::to_form`] yields a [`SaleForm`] that goes through the
//! normal validation path. None of its totals are trusted by the recorder.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::sale::SaleForm;
use crate::types::{ItemId, SaleType};
use crate::validation::DATE_FORMAT;

/// One selected catalog item with its display total.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectedItemDraft {
    /// Posted as a string, the way an `<input>` value arrives.
    pub item_id: String,
    pub quantity: Decimal,
    pub price: Money,
    pub total: Money,
}

/// Client-side running state of a sale being composed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SaleDraft {
    items: Vec<SelectedItemDraft>,
    discount: Money,
}

impl SaleDraft {
    pub fn new() -> Self {
        SaleDraft::default()
    }

    /// Sets the quantity and price of an item.
    ///
    /// A quantity of zero or less removes the item; otherwise the item is
    /// inserted or replaced in place with `total = quantity × price`.
    ///
    /// A total that cannot be computed exactly leaves the draft unchanged.
    pub fn update_item(&mut self, item_id: ItemId, quantity: Decimal, price: Money) -> CoreResult<()> {
        let key = item_id.to_string();

        if quantity <= Decimal::ZERO {
            self.items.retain(|i| i.item_id != key);
            return Ok(());
        }

        let total = price
            .checked_mul_quantity(quantity)
            .ok_or_else(|| CoreError::Overflow(format!("line total of item {key}")))?;
        let entry = SelectedItemDraft {
            item_id: key,
            quantity,
            price,
            total,
        };

        match self.items.iter_mut().find(|i| i.item_id == entry.item_id) {
            Some(existing) => *existing = entry,
            None => self.items.push(entry),
        }
        Ok(())
    }

    pub fn set_discount(&mut self, discount: Money) {
        self.discount = discount;
    }

    pub fn items(&self) -> &[SelectedItemDraft] {
        &self.items
    }

    pub fn discount(&self) -> Money {
        self.discount
    }

    /// Sum of display totals.
    pub fn subtotal(&self) -> CoreResult<Money> {
        self.items
            .iter()
            .try_fold(Money::zero(), |acc, i| acc.checked_add(i.total))
            .ok_or_else(|| CoreError::Overflow("sub total".to_string()))
    }

    /// Subtotal minus discount.
    pub fn grand_total(&self) -> CoreResult<Money> {
        self.subtotal()?
            .checked_sub(self.discount)
            .ok_or_else(|| CoreError::Overflow("total".to_string()))
    }

    /// The hidden `items` field value.
    pub fn items_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(&self.items)
    }

    /// Builds the form submission for this draft.
    pub fn to_form(&self, sales_date: NaiveDate, sale_type: SaleType) -> CoreResult<SaleForm> {
        Ok(SaleForm {
            sales_date: Some(sales_date.format(DATE_FORMAT).to_string()),
            amount: Some(self.subtotal()?.amount().to_string()),
            discount: Some(self.discount.amount().to_string()),
            total: Some(self.grand_total()?.amount().to_string()),
            sale_type: Some(sale_type.to_string()),
            items: Some(self.items_json()?),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::FormField;
    use rust_decimal_macros::dec;

    #[test]
    fn test_update_item_upserts_and_removes() {
        let mut draft = SaleDraft::new();
        draft.update_item(1, dec!(2), Money::new(dec!(10))).unwrap();
        draft.update_item(2, dec!(1), Money::new(dec!(5))).unwrap();
        assert_eq!(draft.subtotal().unwrap(), Money::new(dec!(25)));

        draft.update_item(1, dec!(3), Money::new(dec!(10))).unwrap();
        assert_eq!(draft.items().len(), 2);
        assert_eq!(draft.items()[0].total, Money::new(dec!(30)));

        draft.update_item(2, dec!(0), Money::new(dec!(5))).unwrap();
        assert_eq!(draft.items().len(), 1);
        assert_eq!(draft.subtotal().unwrap(), Money::new(dec!(30)));
    }

    #[test]
    fn test_grand_total_applies_discount() {
        let mut draft = SaleDraft::new();
        draft.update_item(1, dec!(2), Money::new(dec!(10))).unwrap();
        draft.set_discount(Money::new(dec!(5)));
        assert_eq!(draft.grand_total().unwrap(), Money::new(dec!(15)));
    }

    #[test]
    fn test_overflowing_line_is_refused() {
        let mut draft = SaleDraft::new();
        draft.update_item(1, dec!(1), Money::new(dec!(10))).unwrap();

        let result = draft.update_item(2, dec!(2), Money::new(Decimal::MAX));
        assert!(matches!(result, Err(CoreError::Overflow(_))));
        assert_eq!(draft.items().len(), 1);
        assert_eq!(draft.subtotal().unwrap(), Money::new(dec!(10)));
    }

    #[test]
    fn test_subtotal_overflow_is_an_error() {
        let mut draft = SaleDraft::new();
        draft.update_item(1, dec!(1), Money::new(Decimal::MAX)).unwrap();
        draft.update_item(2, dec!(1), Money::new(Decimal::MAX)).unwrap();

        assert!(matches!(draft.subtotal(), Err(CoreError::Overflow(_))));
        assert!(draft.grand_total().is_err());
    }

    #[test]
    fn test_items_json_shape() {
        let mut draft = SaleDraft::new();
        draft.update_item(1, dec!(2), Money::new(dec!(10))).unwrap();

        let json: serde_json::Value = serde_json::from_str(&draft.items_json().unwrap()).unwrap();
        assert_eq!(json[0]["itemId"], "1");
        assert!(json[0].get("quantity").is_some());
        assert!(json[0].get("total").is_some());
    }

    #[test]
    fn test_draft_submits_through_validation() {
        let mut draft = SaleDraft::new();
        draft.update_item(1, dec!(2), Money::new(dec!(10))).unwrap();
        draft.set_discount(Money::new(dec!(5)));

        let form = draft
            .to_form(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(), SaleType::Customer)
            .unwrap();
        let sale = form.validate().unwrap();

        assert_eq!(sale.amount, Money::new(dec!(20)));
        assert_eq!(sale.total, Money::new(dec!(15)));
    }

    #[test]
    fn test_empty_draft_fails_amount_check() {
        let form = SaleDraft::new()
            .to_form(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(), SaleType::Partner)
            .unwrap();
        let errors = form.validate().unwrap_err();
        assert_eq!(errors.fields().collect::<Vec<_>>(), vec![FormField::Amount]);
    }
}
