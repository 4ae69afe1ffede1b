//! Section totals: subtotal, VAT per rate and total.
//!
//! Amounts are exact decimals and are never rounded here. Every rate that
//! occurs on at least one item gets a `vat_details` entry, including 0%.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};

use crate::models::amount::{decimal_number, lenient_decimal};
use crate::models::invoice::{LineItem, VatRate};

/// Aggregate figures for a list of line items.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalculationResult {
    /// Sum of `quantity * price` over all items.
    #[serde(
        default,
        serialize_with = "decimal_number",
        deserialize_with = "lenient_decimal"
    )]
    pub subtotal: Decimal,

    /// Accumulated VAT per rate.
    #[serde(default, serialize_with = "vat_details_numbers")]
    pub vat_details: BTreeMap<VatRate, Decimal>,

    /// `subtotal` plus every VAT amount.
    #[serde(
        default,
        serialize_with = "decimal_number",
        deserialize_with = "lenient_decimal"
    )]
    pub total: Decimal,
}

/// JSON object keys are strings, so rates become `"21"` while the amounts
/// stay numbers.
fn vat_details_numbers<S>(
    details: &BTreeMap<VatRate, Decimal>,
    serializer: S,
) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    struct Amount<'a>(&'a Decimal);

    impl Serialize for Amount<'_> {
        fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
            decimal_number(self.0, serializer)
        }
    }

    let mut map = serializer.serialize_map(Some(details.len()))?;
    for (rate, amount) in details {
        map.serialize_entry(&rate.to_string(), &Amount(amount))?;
    }
    map.end()
}

impl CalculationResult {
    /// Sum of all VAT amounts.
    pub fn vat_total(&self) -> Decimal {
        self.vat_details
            .values()
            .fold(Decimal::ZERO, |acc, v| acc.saturating_add(*v))
    }
}

/// `quantity * price` for one item.
pub fn line_subtotal(item: &LineItem) -> Decimal {
    item.quantity.saturating_mul(item.price)
}

/// VAT owed on one item.
pub fn vat_amount(item: &LineItem) -> Decimal {
    line_subtotal(item).saturating_mul(item.vat_rate.as_fraction())
}

/// Calculate subtotal, VAT per rate and total for a list of items.
pub fn calculate_section_totals(items: &[LineItem]) -> CalculationResult {
    let subtotal = items
        .iter()
        .fold(Decimal::ZERO, |acc, item| acc.saturating_add(line_subtotal(item)));

    let mut vat_details: BTreeMap<VatRate, Decimal> = BTreeMap::new();
    for item in items {
        let entry = vat_details.entry(item.vat_rate).or_insert(Decimal::ZERO);
        *entry = entry.saturating_add(vat_amount(item));
    }

    let total = vat_details
        .values()
        .fold(subtotal, |acc, vat| acc.saturating_add(*vat));

    CalculationResult {
        subtotal,
        vat_details,
        total,
    }
}
