//! Display rounding and lenient numeric decoding.
//!
//! Upstream exchange payloads mix JSON numbers and numeric strings
//! (`"0.5"`, `2.1`), and every figure the dashboard shows is written at a
//! fixed number of decimals.

use serde::de::{self, Deserializer};
use serde::Deserialize;

/// Decimals used for asset quantities.
pub const AMOUNT_DECIMALS: usize = 8;
/// Decimals used for USD values.
pub const VALUE_DECIMALS: usize = 2;
/// Decimals used for unit prices.
pub const PRICE_DECIMALS: usize = 8;

/// Enough fractional digits to print any finite `f64` exactly.
const EXACT_FRACTION_DIGITS: usize = 1100;

/// Round to a fixed number of decimals the way the dashboard's fixed-point
/// display strings do, then read the number back.
///
/// Rounding works on the exact binary value, and exact ties round away from
/// zero: `0.125` becomes `0.13` and `2.5` becomes `3`.
pub fn round_to(value: f64, decimals: usize) -> f64 {
    if !value.is_finite() {
        return value;
    }
    let decimals = decimals.min(EXACT_FRACTION_DIGITS);

    let exact = format!("{:.*}", EXACT_FRACTION_DIGITS, value.abs());
    let Some((int_part, fraction)) = exact.split_once('.') else {
        return value;
    };

    let mut digits: Vec<u8> = int_part
        .bytes()
        .chain(fraction.bytes().take(decimals))
        .map(|b| b - b'0')
        .collect();
    if fraction.as_bytes().get(decimals).is_some_and(|&b| b >= b'5') {
        increment_digits(&mut digits);
    }

    let split = digits.len() - decimals;
    let mut text = String::with_capacity(digits.len() + 2);
    if value.is_sign_negative() {
        text.push('-');
    }
    text.extend(digits[..split].iter().map(|&d| char::from(b'0' + d)));
    if decimals > 0 {
        text.push('.');
        text.extend(digits[split..].iter().map(|&d| char::from(b'0' + d)));
    }
    text.parse().unwrap_or(value)
}

/// Add one unit in the last place of a decimal digit string, carrying left.
fn increment_digits(digits: &mut Vec<u8>) {
    for d in digits.iter_mut().rev() {
        if *d == 9 {
            *d = 0;
        } else {
            *d += 1;
            return;
        }
    }
    digits.insert(0, 1);
}

/// Truncate toward negative infinity at 2-decimal granularity.
pub fn floor_to_cents(value: f64) -> f64 {
    (value * 100.0).floor() / 100.0
}

#[derive(Deserialize)]
#[serde(untagged)]
enum NumberOrString {
    Number(f64),
    Text(String),
}

/// Deserialize an optional `f64` that may arrive as a number, a numeric
/// string, an empty string or `null`. Non-finite values are rejected.
pub fn deserialize_optional_f64<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<NumberOrString> = Option::deserialize(deserializer)?;
    let value = match raw {
        None => return Ok(None),
        Some(NumberOrString::Number(n)) => n,
        Some(NumberOrString::Text(s)) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                return Ok(None);
            }
            trimmed
                .parse::<f64>()
                .map_err(|e| de::Error::custom(format!("invalid number {trimmed:?}: {e}")))?
        }
    };
    if !value.is_finite() {
        return Err(de::Error::custom(format!("non-finite number {value}")));
    }
    Ok(Some(value))
}

/// Like [`deserialize_optional_f64`], but the value must be present.
pub fn deserialize_f64<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    deserialize_optional_f64(deserializer)?.ok_or_else(|| de::Error::custom("missing number"))
}

/// Deserialize a time label that may be either a string or a number.
pub fn deserialize_label<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Label {
        Text(String),
        Integer(i64),
        Float(f64),
    }

    Ok(match Label::deserialize(deserializer)? {
        Label::Text(s) => s,
        Label::Integer(n) => n.to_string(),
        Label::Float(n) => n.to_string(),
    })
}
