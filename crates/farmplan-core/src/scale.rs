//! Compile-time unit safety for the engine's two scaled integer quantities.
//!
//! Continuous area and labor-hour quantities are integerized before they
//! ever reach a decision variable, so that every constraint is an exact
//! integer (in)equality rather than a floating-point one. Mixing an area
//! unit with an hour unit is a type error here the same way mixing `Megawatts`
//! and `Megavars` is a type error in the teacher crate's `units` module; the
//! newtypes below follow that module's `impl_unit_ops!` treatment.
//!
//! - 1 [`AreaUnits`] = `1 / AREA_SCALE` of an area unit ("a", are).
//! - 1 [`HourUnits`] = `1 / TIME_SCALE` of an hour.

use serde::{Deserialize, Serialize};
use std::ops::{Add, AddAssign, Sub};

/// Scale factor applied to continuous area quantities: 1 unit = 0.1 a.
pub const AREA_SCALE: i64 = 10;

/// Scale factor applied to continuous hour quantities: 1 unit = 0.1 h.
pub const TIME_SCALE: i64 = 10;

macro_rules! impl_scaled_ops {
    ($type:ty) => {
        impl Add for $type {
            type Output = Self;
            fn add(self, rhs: Self) -> Self::Output {
                Self(self.0 + rhs.0)
            }
        }

        impl Sub for $type {
            type Output = Self;
            fn sub(self, rhs: Self) -> Self::Output {
                Self(self.0 - rhs.0)
            }
        }

        impl AddAssign for $type {
            fn add_assign(&mut self, rhs: Self) {
                self.0 += rhs.0;
            }
        }
    };
}

/// A land/crop area quantity in scaled integer units (1 unit = 0.1 a).
#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct AreaUnits(pub i64);

impl AreaUnits {
    /// Scale a continuous area (in "a") up to integer units, rounding to
    /// the nearest unit the same way the original `int(round(area * scale))`
    /// conversion does.
    pub fn from_area(area: f64) -> Self {
        Self((area * AREA_SCALE as f64).round() as i64)
    }

    /// Convert back to a continuous area in "a".
    pub fn as_area(self) -> f64 {
        self.0 as f64 / AREA_SCALE as f64
    }
}

impl_scaled_ops!(AreaUnits);

/// A worker/resource time quantity in scaled integer units (1 unit = 0.1 h).
#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct HourUnits(pub i64);

impl HourUnits {
    /// Scale a continuous hour quantity up to integer units.
    pub fn from_hours(hours: f64) -> Self {
        Self((hours * TIME_SCALE as f64).round() as i64)
    }

    /// Convert back to continuous hours.
    pub fn as_hours(self) -> f64 {
        self.0 as f64 / TIME_SCALE as f64
    }
}

impl_scaled_ops!(HourUnits);

/// An exact rational `numerator / denominator`, reduced to lowest terms.
///
/// Used by the labor constraint to express `hours-per-area-unit` exactly, so
/// that `q * sum(h) == p * sum(x)` holds as an exact integer equality instead
/// of a rounded floating-point one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rational {
    pub numerator: i64,
    pub denominator: i64,
}

impl Rational {
    /// Build `numerator / denominator`, reducing by their GCD. Panics if
    /// `denominator` is zero; callers always supply a non-zero scale
    /// constant as the denominator.
    pub fn new(numerator: i64, denominator: i64) -> Self {
        assert!(denominator != 0, "rational denominator must be non-zero");
        let (mut n, mut d) = (numerator, denominator);
        if d < 0 {
            n = -n;
            d = -d;
        }
        let g = gcd(n.unsigned_abs(), d.unsigned_abs()).max(1);
        Self {
            numerator: n / g as i64,
            denominator: d / g as i64,
        }
    }

    /// `labor_total_per_area (h/a) * TIME_SCALE / AREA_SCALE` as an exact
    /// fraction, matching the original's
    /// `Fraction(str(L)) * TIME_SCALE_UNITS_PER_HOUR / AREA_SCALE_UNITS_PER_A`.
    pub fn labor_per_area_unit(labor_total_per_area: f64) -> Self {
        // Represent the f64 as a fraction over a large power of ten rather
        // than trusting its binary fraction bits, then fold in the two
        // integer scale constants.
        const DECIMAL_DENOM: i64 = 1_000_000;
        let scaled = (labor_total_per_area * DECIMAL_DENOM as f64).round() as i64;
        Self::new(scaled * TIME_SCALE, DECIMAL_DENOM * AREA_SCALE)
    }
}

fn gcd(a: u64, b: u64) -> u64 {
    if b == 0 {
        a
    } else {
        gcd(b, a % b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn area_round_trips() {
        let a = AreaUnits::from_area(12.3);
        assert_eq!(a.0, 123);
        assert!((a.as_area() - 12.3).abs() < 1e-9);
    }

    #[test]
    fn hour_round_trips() {
        let h = HourUnits::from_hours(4.5);
        assert_eq!(h.0, 45);
    }

    #[test]
    fn rational_reduces() {
        let r = Rational::new(10, 20);
        assert_eq!((r.numerator, r.denominator), (1, 2));
    }

    #[test]
    fn rational_negative_denominator_normalizes_sign() {
        let r = Rational::new(3, -6);
        assert_eq!((r.numerator, r.denominator), (-1, 2));
    }

    #[test]
    fn labor_per_area_unit_exact() {
        // 2.0 h/a, TIME_SCALE=10, AREA_SCALE=10 => p/q == 2/1
        let r = Rational::labor_per_area_unit(2.0);
        assert_eq!((r.numerator, r.denominator), (2, 1));
    }
}
