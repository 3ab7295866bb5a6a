//! Conversions between gateway decimal strings and minor units.

use crate::error::{PaymentError, PaymentResult};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use std::str::FromStr;

/// Parse a major-unit decimal string ("199.00") into minor units (19900).
///
/// Amounts with more than two decimal places or a negative sign are rejected
/// rather than rounded.
pub fn minor_units_from_major(amount: &str) -> PaymentResult<i64> {
    let parsed = Decimal::from_str(amount.trim())
        .map_err(|e| PaymentError::MalformedPayload(format!("Invalid amount '{}': {}", amount, e)))?;

    if parsed.is_sign_negative() {
        return Err(PaymentError::MalformedPayload(format!(
            "Negative amount '{}'",
            amount
        )));
    }

    let minor = parsed
        .checked_mul(Decimal::ONE_HUNDRED)
        .ok_or_else(|| PaymentError::MalformedPayload(format!("Amount '{}' out of range", amount)))?;
    if minor.fract() != Decimal::ZERO {
        return Err(PaymentError::MalformedPayload(format!(
            "Amount '{}' has more than two decimal places",
            amount
        )));
    }

    minor
        .to_i64()
        .ok_or_else(|| PaymentError::MalformedPayload(format!("Amount '{}' out of range", amount)))
}

/// Format minor units as a two-decimal major-unit string ("199.00")
pub fn format_major(minor: i64) -> String {
    Decimal::new(minor, 2).to_string()
}
