//! Fixed-point column definitions for currency and share quantities.
//!
//! Money never passes through binary floating point. Every decimal column
//! has a [`FixedPoint`] describing its precision and scale, and values are
//! checked against it before they reach storage. Values with more
//! fractional digits than the column allows are rejected rather than
//! rounded.

use rust_decimal::Decimal;

use crate::error::CrmError;

/// Precision/scale pair of a `NUMERIC(p, s)` column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedPoint {
    precision: u32,
    scale: u32,
    signed: bool,
}

/// `goals.target_amount`: NUMERIC(12, 2), non-negative.
pub const GOAL_AMOUNT: FixedPoint = FixedPoint::unsigned(12, 2);

/// `portfolios.total_value`: NUMERIC(15, 2), non-negative.
pub const PORTFOLIO_VALUE: FixedPoint = FixedPoint::unsigned(15, 2);

/// `positions.quantity`: NUMERIC(18, 4). Negative for short positions.
pub const POSITION_QUANTITY: FixedPoint = FixedPoint::signed(18, 4);

/// `positions.cost_basis`: NUMERIC(18, 2), non-negative.
pub const COST_BASIS: FixedPoint = FixedPoint::unsigned(18, 2);

impl FixedPoint {
    /// Column that only accepts values `>= 0`.
    #[must_use]
    pub const fn unsigned(precision: u32, scale: u32) -> Self {
        Self {
            precision,
            scale,
            signed: false,
        }
    }

    /// Column that accepts negative values.
    #[must_use]
    pub const fn signed(precision: u32, scale: u32) -> Self {
        Self {
            precision,
            scale,
            signed: true,
        }
    }

    /// Number of fractional digits stored.
    #[must_use]
    pub const fn scale(&self) -> u32 {
        self.scale
    }

    /// Checks `value` against the column and rescales it to exactly
    /// [`Self::scale`] fractional digits.
    ///
    /// # Errors
    ///
    /// Returns [`CrmError::Validation`] naming `field` if the value has too
    /// many fractional digits, too many integer digits, or is negative on
    /// an unsigned column.
    pub fn normalize(&self, field: &'static str, value: Decimal) -> Result<Decimal, CrmError> {
        let mut value = value.normalize();
        if value.scale() > self.scale {
            return Err(CrmError::validation(
                field,
                format!("at most {} decimal places allowed", self.scale),
            ));
        }
        if !self.signed && value.is_sign_negative() && !value.is_zero() {
            return Err(CrmError::validation(field, "must not be negative"));
        }
        let integer_digits = self.precision - self.scale;
        let limit = Decimal::from(10_i64.pow(integer_digits));
        if value.trunc().abs() >= limit {
            return Err(CrmError::validation(
                field,
                format!("at most {integer_digits} integer digits allowed"),
            ));
        }
        if value.is_zero() {
            value.set_sign_positive(true);
        }
        value.rescale(self.scale);
        Ok(value)
    }

    /// Parses a stored TEXT value back into a [`Decimal`].
    ///
    /// # Errors
    ///
    /// Returns [`CrmError::Storage`] if the column holds a malformed value.
    pub fn decode(&self, column: &'static str, raw: &str) -> Result<Decimal, CrmError> {
        let mut value: Decimal = raw
            .parse()
            .map_err(|e| CrmError::Storage(format!("malformed decimal in `{column}`: {e}")))?;
        value.rescale(self.scale);
        Ok(value)
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    fn dec(s: &str) -> Decimal {
        let Ok(d) = s.parse() else {
            panic!("bad literal {s}");
        };
        d
    }

    #[test]
    fn whole_amounts_gain_scale() {
        let Ok(v) = GOAL_AMOUNT.normalize("target_amount", dec("500000")) else {
            panic!("valid amount rejected");
        };
        assert_eq!(v.to_string(), "500000.00");
    }

    #[test]
    fn trailing_zeros_beyond_scale_are_accepted() {
        let Ok(v) = GOAL_AMOUNT.normalize("target_amount", dec("12.5000")) else {
            panic!("valid amount rejected");
        };
        assert_eq!(v.to_string(), "12.50");
    }

    #[test]
    fn excess_fraction_is_rejected_not_rounded() {
        let err = GOAL_AMOUNT.normalize("target_amount", dec("10.005"));
        assert!(matches!(
            err,
            Err(CrmError::Validation {
                field: "target_amount",
                ..
            })
        ));
    }

    #[test]
    fn quantity_keeps_four_places() {
        let Ok(v) = POSITION_QUANTITY.normalize("quantity", dec("0.1234")) else {
            panic!("fractional shares rejected");
        };
        assert_eq!(v.to_string(), "0.1234");
        assert!(POSITION_QUANTITY.normalize("quantity", dec("0.12345")).is_err());
    }

    #[test]
    fn sign_rules() {
        assert!(COST_BASIS.normalize("cost_basis", dec("-1.00")).is_err());
        assert!(POSITION_QUANTITY.normalize("quantity", dec("-25")).is_ok());
        let Ok(zero) = COST_BASIS.normalize("cost_basis", dec("-0.00")) else {
            panic!("negative zero rejected");
        };
        assert_eq!(zero.to_string(), "0.00");
    }

    #[test]
    fn integer_digit_limit() {
        assert!(GOAL_AMOUNT.normalize("target_amount", dec("9999999999.99")).is_ok());
        assert!(
            GOAL_AMOUNT
                .normalize("target_amount", dec("10000000000"))
                .is_err()
        );
    }

    #[test]
    fn decode_restores_scale() {
        let Ok(v) = PORTFOLIO_VALUE.decode("total_value", "1250.5") else {
            panic!("decode failed");
        };
        assert_eq!(v.to_string(), "1250.50");
        assert!(PORTFOLIO_VALUE.decode("total_value", "abc").is_err());
    }
}
