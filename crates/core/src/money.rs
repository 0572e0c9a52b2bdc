//! # Money Module
//!
//! Số tiền trong Ledgerline là fixed-point với 2 chữ số thập phân.
//! Ở tầng store, tiền được lưu dưới dạng minor units (cents, `i64`) để
//! phép cộng `balance = balance + ?` trong SQL luôn chính xác.

use crate::error::{CoreError, CoreResult};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Số chữ số thập phân của đơn vị tiền tệ
pub const CURRENCY_SCALE: u32 = 2;

/// Chuyển Decimal sang minor units (cents).
///
/// Rejects values with more than [`CURRENCY_SCALE`] fractional digits and
/// values that do not fit in an `i64`.
pub fn to_minor_units(value: Decimal) -> CoreResult<i64> {
    let normalized = value.normalize();
    if normalized.scale() > CURRENCY_SCALE {
        return Err(CoreError::InvalidAmount(format!(
            "{} has more than {} decimal places",
            value, CURRENCY_SCALE
        )));
    }

    let factor = Decimal::from(10_i64.pow(CURRENCY_SCALE));
    normalized
        .checked_mul(factor)
        .and_then(|cents| cents.to_i64())
        .ok_or_else(|| CoreError::InvalidAmount(format!("{} is out of range", value)))
}

/// Chuyển minor units về Decimal với scale cố định
pub fn from_minor_units(units: i64) -> Decimal {
    Decimal::new(units, CURRENCY_SCALE)
}

/// A strictly positive monetary amount, exact to the cent.
///
/// # Example
/// ```
/// use ledgerline_core::Amount;
/// use rust_decimal::Decimal;
///
/// let amount = Amount::new(Decimal::new(5000, 2)).unwrap();
/// assert_eq!(amount.minor_units(), 5000);
///
/// assert!(Amount::new(Decimal::ZERO).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "Decimal", into = "Decimal")]
pub struct Amount {
    units: i64,
}

impl Amount {
    /// Tạo Amount mới, chỉ chấp nhận giá trị > 0
    pub fn new(value: Decimal) -> CoreResult<Self> {
        if value <= Decimal::ZERO {
            return Err(CoreError::InvalidAmount(format!(
                "amount must be positive: {}",
                value
            )));
        }
        let units = to_minor_units(value)?;
        Ok(Self { units })
    }

    /// Tạo Amount từ minor units đã lưu trong store
    pub fn from_minor_units(units: i64) -> CoreResult<Self> {
        if units <= 0 {
            return Err(CoreError::InvalidAmount(format!(
                "stored amount must be positive: {} minor units",
                units
            )));
        }
        Ok(Self { units })
    }

    #[inline]
    pub fn minor_units(&self) -> i64 {
        self.units
    }

    #[inline]
    pub fn value(&self) -> Decimal {
        from_minor_units(self.units)
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.value())
    }
}

impl TryFrom<Decimal> for Amount {
    type Error = CoreError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Amount> for Decimal {
    fn from(amount: Amount) -> Self {
        amount.value()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_minor_units_conversion() {
        assert_eq!(to_minor_units(dec!(50.00)).unwrap(), 5000);
        assert_eq!(to_minor_units(dec!(0.01)).unwrap(), 1);
        assert_eq!(to_minor_units(dec!(12)).unwrap(), 1200);
        assert_eq!(from_minor_units(10050), dec!(100.50));
    }

    #[test]
    fn test_trailing_zeros_are_not_extra_precision() {
        assert_eq!(to_minor_units(dec!(1.2500)).unwrap(), 125);
    }

    #[test]
    fn test_sub_cent_rejected() {
        assert!(to_minor_units(dec!(0.001)).is_err());
        assert!(Amount::new(dec!(10.005)).is_err());
    }

    #[test]
    fn test_amount_must_be_positive() {
        assert!(Amount::new(dec!(0)).is_err());
        assert!(Amount::new(dec!(-5)).is_err());
        assert!(Amount::from_minor_units(0).is_err());

        let amount = Amount::new(dec!(50.00)).unwrap();
        assert_eq!(amount.value(), dec!(50.00));
        assert_eq!(amount.to_string(), "50.00");
    }
}
