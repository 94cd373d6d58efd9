use std::{
    fmt::Display,
    iter::Sum,
    ops::{Add, Mul, Neg, Sub, SubAssign},
};

use serde::{Deserialize, Serialize};
use sqlx::Type;

use crate::op;

//--------------------------------------       Paise        ----------------------------------------------------------
/// An amount of money in hundredths of a rupee. All monetary values in the gateway are stored and transmitted as
/// integer paise, which keeps tax arithmetic exact and sidesteps floating point entirely.
#[derive(Debug, Clone, Copy, Default, Type, Ord, PartialOrd, Serialize, Deserialize)]
#[sqlx(transparent)]
pub struct Paise(i64);

op!(binary Paise, Add, add);
op!(binary Paise, Sub, sub);
op!(inplace Paise, SubAssign, sub_assign);
op!(unary Paise, Neg, neg);

impl Mul<i64> for Paise {
    type Output = Self;

    fn mul(self, rhs: i64) -> Self::Output {
        Self::from(self.value() * rhs)
    }
}

impl Sum for Paise {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::default(), Add::add)
    }
}

impl From<i64> for Paise {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

impl PartialEq for Paise {
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0
    }
}

impl Eq for Paise {}

impl Display for Paise {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        write!(f, "{sign}₹{}.{:02}", (self.0 / 100).abs(), (self.0 % 100).abs())
    }
}

impl Paise {
    /// The whole amount expressed in paise.
    pub fn value(&self) -> i64 {
        self.0
    }

    /// Convenience constructor for whole-rupee amounts.
    pub fn from_rupees(rupees: i64) -> Self {
        Self(rupees * 100)
    }

    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Overflow-aware multiplication. Amounts are priced from client-supplied quantities, so the
    /// pricing path must not wrap on hostile input.
    pub fn checked_mul(self, rhs: i64) -> Option<Self> {
        self.0.checked_mul(rhs).map(Self)
    }

    /// Overflow-aware addition. See [`Self::checked_mul`].
    pub fn checked_add(self, rhs: Self) -> Option<Self> {
        self.0.checked_add(rhs.0).map(Self)
    }
}

//--------------------------------------      GstRate       ----------------------------------------------------------
/// A GST rate in basis points. 500 basis points is 5%.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
#[sqlx(transparent)]
pub struct GstRate(i64);

/// The slab applied when the catalog does not carry a rate for a product.
pub const DEFAULT_GST_RATE: GstRate = GstRate(500);

impl GstRate {
    pub fn from_basis_points(bp: i64) -> Self {
        Self(bp)
    }

    pub fn basis_points(&self) -> i64 {
        self.0
    }

    /// The GST due on `quantity` units at `unit_price`, rounded half-up to the nearest paise.
    /// Each line item is rounded independently.
    pub fn gst_on(&self, unit_price: Paise, quantity: i64) -> Paise {
        let raw = unit_price.value() as i128 * quantity as i128 * self.0 as i128;
        // round-half-up of raw / 10_000
        let rounded = (raw + 5_000) / 10_000;
        Paise::from(rounded as i64)
    }
}

impl Display for GstRate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.0 % 100 == 0 {
            write!(f, "{}%", self.0 / 100)
        } else {
            write!(f, "{}.{:02}%", self.0 / 100, self.0 % 100)
        }
    }
}
