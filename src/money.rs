//! Fixed-precision INR amounts and the rounding policy shared by every component

use bigdecimal::{BigDecimal, ParseBigDecimalError, RoundingMode};
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Neg, Sub, SubAssign};
use std::str::FromStr;

/// Number of fractional digits carried by every stored or emitted amount
pub const MONEY_SCALE: i64 = 2;

/// Round an exact intermediate to the two-digit boundary, ties away from zero
pub fn round_half_up(value: &BigDecimal) -> BigDecimal {
    value.with_scale_round(MONEY_SCALE, RoundingMode::HalfUp)
}

/// `base * rate / 100` without rounding
pub fn percent_of(base: &BigDecimal, rate: &BigDecimal) -> BigDecimal {
    base * rate / BigDecimal::from(100)
}

/// A monetary amount in rupees, always held at scale 2.
///
/// Construction goes through [`Money::from_decimal`], which applies
/// round-half-up, so two `Money` values compare and sum exactly. Deserialized
/// values take the same path. Serialized form is the display string.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize)]
#[serde(from = "BigDecimal")]
pub struct Money(BigDecimal);

impl Money {
    /// Zero rupees
    pub fn zero() -> Self {
        Self(BigDecimal::from(0).with_scale(MONEY_SCALE))
    }

    /// Round an arbitrary-precision value to a persisted amount
    pub fn from_decimal(value: &BigDecimal) -> Self {
        Self(round_half_up(value))
    }

    /// Build an amount from a whole number of paise
    pub fn from_paise(paise: i64) -> Self {
        Self(BigDecimal::new(paise.into(), MONEY_SCALE))
    }

    /// Whole rupees
    pub fn from_rupees(rupees: i64) -> Self {
        Self(BigDecimal::from(rupees).with_scale(MONEY_SCALE))
    }

    pub fn as_decimal(&self) -> &BigDecimal {
        &self.0
    }

    pub fn into_decimal(self) -> BigDecimal {
        self.0
    }

    pub fn abs(&self) -> Self {
        Self(self.0.abs())
    }

    pub fn is_zero(&self) -> bool {
        self.0 == BigDecimal::from(0)
    }

    pub fn is_positive(&self) -> bool {
        self.0 > BigDecimal::from(0)
    }

    pub fn is_negative(&self) -> bool {
        self.0 < BigDecimal::from(0)
    }
}

impl Default for Money {
    fn default() -> Self {
        Self::zero()
    }
}

impl From<BigDecimal> for Money {
    fn from(value: BigDecimal) -> Self {
        Self::from_decimal(&value)
    }
}

impl From<i64> for Money {
    fn from(rupees: i64) -> Self {
        Self::from_rupees(rupees)
    }
}

impl FromStr for Money {
    type Err = ParseBigDecimalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value = BigDecimal::from_str(s.trim())?;
        Ok(Self::from_decimal(&value))
    }
}

impl fmt::Display for Money {
    /// Always `[-]rupees.paise` with exactly two fractional digits, zero included
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let paise = (round_half_up(&self.0) * BigDecimal::from(100)).with_scale(0);
        let sign = if paise < BigDecimal::from(0) { "-" } else { "" };
        let digits = format!("{:0>3}", paise.abs().to_string());
        let (rupees, fraction) = digits.split_at(digits.len() - 2);
        write!(f, "{sign}{rupees}.{fraction}")
    }
}

impl Serialize for Money {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl Add for Money {
    type Output = Money;

    fn add(self, rhs: Money) -> Money {
        Money(self.0 + rhs.0)
    }
}

impl<'a> Add<&'a Money> for &'a Money {
    type Output = Money;

    fn add(self, rhs: &'a Money) -> Money {
        Money(&self.0 + &rhs.0)
    }
}

impl Sub for Money {
    type Output = Money;

    fn sub(self, rhs: Money) -> Money {
        Money(self.0 - rhs.0)
    }
}

impl<'a> Sub<&'a Money> for &'a Money {
    type Output = Money;

    fn sub(self, rhs: &'a Money) -> Money {
        Money(&self.0 - &rhs.0)
    }
}

impl Neg for Money {
    type Output = Money;

    fn neg(self) -> Money {
        Money(-self.0)
    }
}

impl AddAssign<&Money> for Money {
    fn add_assign(&mut self, rhs: &Money) {
        self.0 += &rhs.0;
    }
}

impl AddAssign for Money {
    fn add_assign(&mut self, rhs: Money) {
        self.0 += rhs.0;
    }
}

impl SubAssign<&Money> for Money {
    fn sub_assign(&mut self, rhs: &Money) {
        self.0 -= &rhs.0;
    }
}

impl SubAssign for Money {
    fn sub_assign(&mut self, rhs: Money) {
        self.0 -= rhs.0;
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Money {
        iter.fold(Money::zero(), |acc, m| acc + m)
    }
}

impl<'a> Sum<&'a Money> for Money {
    fn sum<I: Iterator<Item = &'a Money>>(iter: I) -> Money {
        iter.fold(Money::zero(), |mut acc, m| {
            acc += m;
            acc
        })
    }
}
