use std::{
    fmt::Display,
    iter::Sum,
    ops::{Add, Mul, Neg, Sub, SubAssign},
};

use serde::{Deserialize, Serialize};
use sqlx::Type;
use thiserror::Error;

use crate::op;

pub const DEFAULT_CURRENCY_CODE: &str = "EUR";

//--------------------------------------       Money       -----------------------------------------------------------
/// An amount of money, stored in minor units (cents). The currency itself is carried alongside the amount on the
/// records that use it.
#[derive(Debug, Clone, Copy, Default, Type, Ord, PartialOrd, Serialize, Deserialize)]
#[sqlx(transparent)]
pub struct Money(i64);

op!(binary Money, Add, add);
op!(binary Money, Sub, sub);
op!(inplace Money, SubAssign, sub_assign);
op!(unary Money, Neg, neg);

impl Mul<i64> for Money {
    type Output = Self;

    fn mul(self, rhs: i64) -> Self::Output {
        Self::from(self.value() * rhs)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::default(), Add::add)
    }
}

#[derive(Debug, Clone, Error)]
#[error("Value cannot be represented in cents: {0}")]
pub struct MoneyConversionError(String);

impl From<i64> for Money {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

impl PartialEq for Money {
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0
    }
}

impl Eq for Money {}

impl TryFrom<u64> for Money {
    type Error = MoneyConversionError;

    fn try_from(value: u64) -> Result<Self, Self::Error> {
        if value > i64::MAX as u64 {
            Err(MoneyConversionError(format!("Value {} is too large to convert to Money", value)))
        } else {
            #[allow(clippy::cast_possible_wrap)]
            Ok(Self(value as i64))
        }
    }
}

impl Display for Money {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let cents = self.0.unsigned_abs();
        write!(f, "{sign}{}.{:02}", cents / 100, cents % 100)
    }
}

impl Money {
    pub fn value(&self) -> i64 {
        self.0
    }

    pub fn from_major(units: i64) -> Self {
        Self(units * 100)
    }

    /// Multiplication that returns `None` on overflow, for use on amounts that come from the outside world.
    pub fn checked_mul(self, rhs: i64) -> Option<Self> {
        self.0.checked_mul(rhs).map(Self)
    }

    /// Renders the amount as a plain decimal string ("1234.50"), the format Sage X3 expects in numeric fields.
    pub fn to_decimal_string(&self) -> String {
        self.to_string()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn display_formats_minor_units() {
        assert_eq!(Money::from(123450).to_string(), "1234.50");
        assert_eq!(Money::from(5).to_string(), "0.05");
        assert_eq!(Money::from(0).to_string(), "0.00");
        assert_eq!(Money::from(-995).to_string(), "-9.95");
    }

    #[test]
    fn arithmetic() {
        let a = Money::from_major(10);
        let b = Money::from(250);
        assert_eq!((a + b).value(), 1250);
        assert_eq!((a - b).value(), 750);
        assert_eq!((-b).value(), -250);
        assert_eq!((b * 3).value(), 750);
        let total: Money = [a, b, b].into_iter().sum();
        assert_eq!(total.value(), 1500);
    }

    #[test]
    fn checked_mul_catches_overflow() {
        assert_eq!(Money::from(250).checked_mul(3), Some(Money::from(750)));
        assert!(Money::from(i64::MAX).checked_mul(2).is_none());
    }
}
