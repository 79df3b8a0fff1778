//! Fixed-point money type.
//!
//! `Money` wraps [`rust_decimal::Decimal`] rescaled to exactly two
//! fractional digits, the storage choice for every monetary amount in this
//! crate. Unlike the gateway crate's `StrictDecimal` (which only validates
//! *input* format), `Money` also
//! normalizes scale on every arithmetic operation so that two values
//! computed via different paths (e.g. `price * qty` vs. a running sum)
//! never compare unequal purely because of trailing-zero scale drift.

use rust_decimal::Decimal;
use rust_decimal::prelude::*;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Mul, Neg, Sub, SubAssign};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Money(Decimal);

impl Money {
    pub const ZERO: Money = Money(Decimal::ZERO);

    /// One cent — the rounding tolerance used when comparing two amounts
    /// computed along different paths (e.g. a running sum vs. a recomputed
    /// total).
    pub fn epsilon() -> Money {
        Money(Decimal::new(1, 2))
    }

    pub fn new(value: Decimal) -> Self {
        Self(value.round_dp(2))
    }

    pub fn from_major_minor(major: i64, minor: i64) -> Self {
        Self::new(Decimal::new(major * 100 + minor, 2))
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    pub fn is_negative(&self) -> bool {
        self.0.is_sign_negative() && !self.0.is_zero()
    }

    pub fn as_decimal(&self) -> Decimal {
        self.0
    }

    /// True if `self` and `other` differ by no more than one cent. Used
    /// when comparing a split payment's recomputed sum against an order
    /// total, where independent roundings can drift by a cent.
    pub fn approx_eq(&self, other: Money) -> bool {
        (self.0 - other.0).abs() <= Money::epsilon().0
    }

    pub fn checked_sub(&self, other: Money) -> Option<Money> {
        let result = self.0 - other.0;
        if result.is_sign_negative() && !result.is_zero() {
            None
        } else {
            Some(Money::new(result))
        }
    }
}

impl Default for Money {
    fn default() -> Self {
        Money::ZERO
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}

impl Add for Money {
    type Output = Money;
    fn add(self, rhs: Money) -> Money {
        Money::new(self.0 + rhs.0)
    }
}

impl AddAssign for Money {
    fn add_assign(&mut self, rhs: Money) {
        *self = *self + rhs;
    }
}

impl Sub for Money {
    type Output = Money;
    fn sub(self, rhs: Money) -> Money {
        Money::new(self.0 - rhs.0)
    }
}

impl SubAssign for Money {
    fn sub_assign(&mut self, rhs: Money) {
        *self = *self - rhs;
    }
}

impl Neg for Money {
    type Output = Money;
    fn neg(self) -> Money {
        Money::new(-self.0)
    }
}

impl Mul<u32> for Money {
    type Output = Money;
    fn mul(self, rhs: u32) -> Money {
        Money::new(self.0 * Decimal::from(rhs))
    }
}

impl Mul<Decimal> for Money {
    type Output = Money;
    fn mul(self, rhs: Decimal) -> Money {
        Money::new(self.0 * rhs)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Money {
        iter.fold(Money::ZERO, |acc, m| acc + m)
    }
}

impl From<Decimal> for Money {
    fn from(d: Decimal) -> Self {
        Money::new(d)
    }
}

impl Serialize for Money {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Money {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        use serde::de::Error;
        let s = String::deserialize(deserializer)?;
        let d = Decimal::from_str(&s).map_err(|e| D::Error::custom(format!("invalid money: {e}")))?;
        if d.is_sign_negative() {
            return Err(D::Error::custom("money amount cannot be negative"));
        }
        Ok(Money::new(d))
    }
}

impl sqlx::Type<sqlx::Postgres> for Money {
    fn type_info() -> <sqlx::Postgres as sqlx::Database>::TypeInfo {
        <Decimal as sqlx::Type<sqlx::Postgres>>::type_info()
    }
}

impl<'q> sqlx::Encode<'q, sqlx::Postgres> for Money {
    fn encode_by_ref(
        &self,
        buf: &mut <sqlx::Postgres as sqlx::Database>::ArgumentBuffer<'q>,
    ) -> Result<sqlx::encode::IsNull, Box<dyn std::error::Error + Send + Sync>> {
        <Decimal as sqlx::Encode<sqlx::Postgres>>::encode_by_ref(&self.0, buf)
    }
}

impl<'r> sqlx::Decode<'r, sqlx::Postgres> for Money {
    fn decode(
        value: <sqlx::Postgres as sqlx::Database>::ValueRef<'r>,
    ) -> Result<Self, Box<dyn std::error::Error + Send + Sync>> {
        Ok(Money::new(<Decimal as sqlx::Decode<sqlx::Postgres>>::decode(value)?))
    }
}

/// A signed money delta, used for cash-drawer ledger entries where the
/// sign carries meaning (a paid-out is negative, a paid-in is positive)
/// and `Money`'s non-negative deserialization would reject half the
/// event kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SignedMoney(#[serde(with = "rust_decimal::serde::str")] Decimal);

impl SignedMoney {
    pub fn new(value: Decimal) -> Self {
        Self(value.round_dp(2))
    }

    pub fn positive(amount: Money) -> Self {
        Self::new(amount.as_decimal())
    }

    pub fn negative(amount: Money) -> Self {
        Self::new(-amount.as_decimal())
    }

    pub fn as_decimal(&self) -> Decimal {
        self.0
    }
}

impl Add for SignedMoney {
    type Output = SignedMoney;
    fn add(self, rhs: SignedMoney) -> SignedMoney {
        SignedMoney::new(self.0 + rhs.0)
    }
}

impl sqlx::Type<sqlx::Postgres> for SignedMoney {
    fn type_info() -> <sqlx::Postgres as sqlx::Database>::TypeInfo {
        <Decimal as sqlx::Type<sqlx::Postgres>>::type_info()
    }
}

impl<'q> sqlx::Encode<'q, sqlx::Postgres> for SignedMoney {
    fn encode_by_ref(
        &self,
        buf: &mut <sqlx::Postgres as sqlx::Database>::ArgumentBuffer<'q>,
    ) -> Result<sqlx::encode::IsNull, Box<dyn std::error::Error + Send + Sync>> {
        <Decimal as sqlx::Encode<sqlx::Postgres>>::encode_by_ref(&self.0, buf)
    }
}

impl<'r> sqlx::Decode<'r, sqlx::Postgres> for SignedMoney {
    fn decode(
        value: <sqlx::Postgres as sqlx::Database>::ValueRef<'r>,
    ) -> Result<Self, Box<dyn std::error::Error + Send + Sync>> {
        Ok(SignedMoney::new(<Decimal as sqlx::Decode<sqlx::Postgres>>::decode(value)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn approx_eq_tolerates_one_cent() {
        let a = Money::new(Decimal::new(2000, 2));
        let b = Money::new(Decimal::new(2001, 2));
        assert!(a.approx_eq(b));
        let c = Money::new(Decimal::new(2002, 2));
        assert!(!a.approx_eq(c));
    }

    #[test]
    fn checked_sub_rejects_negative_result() {
        let a = Money::from_major_minor(10, 0);
        let b = Money::from_major_minor(20, 0);
        assert!(a.checked_sub(b).is_none());
        assert_eq!(b.checked_sub(a), Some(Money::from_major_minor(10, 0)));
    }

    #[test]
    fn serde_round_trips_as_string() {
        let m = Money::from_major_minor(15, 50);
        let json = serde_json::to_string(&m).unwrap();
        assert_eq!(json, "\"15.50\"");
        let back: Money = serde_json::from_str(&json).unwrap();
        assert_eq!(back, m);
    }

    #[test]
    fn serde_rejects_negative_money() {
        let err = serde_json::from_str::<Money>("\"-1.00\"");
        assert!(err.is_err());
    }
}
