//! Fail-closed numeric coercion for user-entered amounts.
//!
//! Form inputs arrive as JSON numbers, numeric strings, empty strings, `null`
//! or not at all. Anything that does not denote a finite number becomes zero.

use std::fmt;
use std::str::FromStr;

use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use serde::de::{self, IgnoredAny, MapAccess, SeqAccess, Visitor};
use serde::{Deserializer, Serializer};

/// Convert an `f64` into a decimal, mapping NaN and infinities to zero.
pub fn coerce_f64(value: f64) -> Decimal {
    if !value.is_finite() {
        return Decimal::ZERO;
    }
    Decimal::from_str(&value.to_string())
        .ok()
        .or_else(|| Decimal::from_f64(value))
        .unwrap_or(Decimal::ZERO)
}

/// Parse a user-entered string into a decimal.
///
/// Accepts a comma as decimal separator. Returns zero when the text is not a
/// finite number.
pub fn coerce_str(text: &str) -> Decimal {
    let s = text.trim().replace(',', ".");
    if s.is_empty() {
        return Decimal::ZERO;
    }

    Decimal::from_str(&s)
        .or_else(|_| Decimal::from_scientific(&s))
        .ok()
        .or_else(|| s.parse::<f64>().ok().map(coerce_f64))
        .unwrap_or(Decimal::ZERO)
}

/// Visitor accepting any JSON shape and producing a decimal.
///
/// Numbers and numeric strings are converted; everything else is zero.
pub struct LenientDecimalVisitor;

impl<'de> Visitor<'de> for LenientDecimalVisitor {
    type Value = Decimal;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a number or numeric string")
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Decimal, E> {
        Ok(Decimal::from(v))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Decimal, E> {
        Ok(Decimal::from(v))
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<Decimal, E> {
        Ok(coerce_f64(v))
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Decimal, E> {
        Ok(coerce_str(v))
    }

    fn visit_bool<E: de::Error>(self, _: bool) -> Result<Decimal, E> {
        Ok(Decimal::ZERO)
    }

    fn visit_unit<E: de::Error>(self) -> Result<Decimal, E> {
        Ok(Decimal::ZERO)
    }

    fn visit_none<E: de::Error>(self) -> Result<Decimal, E> {
        Ok(Decimal::ZERO)
    }

    fn visit_some<D: Deserializer<'de>>(self, deserializer: D) -> Result<Decimal, D::Error> {
        deserializer.deserialize_any(self)
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Decimal, A::Error> {
        while seq.next_element::<IgnoredAny>()?.is_some() {}
        Ok(Decimal::ZERO)
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Decimal, A::Error> {
        while map.next_entry::<IgnoredAny, IgnoredAny>()?.is_some() {}
        Ok(Decimal::ZERO)
    }
}

/// Serde helper: deserialize a decimal leniently.
///
/// Use together with `#[serde(default)]` so that absent fields also become zero.
pub fn lenient_decimal<'de, D>(deserializer: D) -> Result<Decimal, D::Error>
where
    D: Deserializer<'de>,
{
    deserializer.deserialize_any(LenientDecimalVisitor)
}

/// Serde helper: serialize a decimal as a JSON number.
pub fn decimal_number<S>(value: &Decimal, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    rust_decimal::serde::float::serialize(&value.normalize(), serializer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_coerce_f64_non_finite() {
        assert_eq!(coerce_f64(f64::NAN), Decimal::ZERO);
        assert_eq!(coerce_f64(f64::INFINITY), Decimal::ZERO);
        assert_eq!(coerce_f64(f64::NEG_INFINITY), Decimal::ZERO);
        assert_eq!(coerce_f64(2.5), Decimal::new(25, 1));
    }

    #[test]
    fn test_coerce_str() {
        assert_eq!(coerce_str("12.50"), Decimal::new(1250, 2));
        assert_eq!(coerce_str(" 3,75 "), Decimal::new(375, 2));
        assert_eq!(coerce_str(""), Decimal::ZERO);
        assert_eq!(coerce_str("abc"), Decimal::ZERO);
        assert_eq!(coerce_str("NaN"), Decimal::ZERO);
        assert_eq!(coerce_str("1e3"), Decimal::from(1000));
    }

    #[derive(Debug, serde::Deserialize)]
    struct Row {
        #[serde(default, deserialize_with = "lenient_decimal")]
        amount: Decimal,
    }

    fn amount(value: serde_json::Value) -> Decimal {
        serde_json::from_value::<Row>(value).unwrap().amount
    }

    #[test]
    fn test_lenient_decimal() {
        assert_eq!(amount(json!({ "amount": 21 })), Decimal::from(21));
        assert_eq!(amount(json!({ "amount": 0.1 })), Decimal::new(1, 1));
        assert_eq!(amount(json!({ "amount": "9" })), Decimal::from(9));
        assert_eq!(amount(json!({ "amount": null })), Decimal::ZERO);
        assert_eq!(amount(json!({ "amount": true })), Decimal::ZERO);
        assert_eq!(amount(json!({ "amount": [1, 2] })), Decimal::ZERO);
        assert_eq!(amount(json!({ "amount": { "x": 1 } })), Decimal::ZERO);
        assert_eq!(amount(json!({})), Decimal::ZERO);
    }

    #[derive(serde::Serialize)]
    struct Out {
        #[serde(serialize_with = "decimal_number")]
        amount: Decimal,
    }

    #[test]
    fn test_decimal_number_is_json_number() {
        let value = serde_json::to_value(Out { amount: Decimal::new(29650, 2) }).unwrap();
        assert_eq!(value["amount"].as_f64(), Some(296.5));

        let back = amount(value);
        assert_eq!(back, Decimal::new(2965, 1));
    }
}
