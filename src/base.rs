// SPDX-License-Identifier: EPL-2.0 OR GPL-2.0-or-later
// SPDX-FileCopyrightText: Bradley M. Bell <bradbell@seanet.com>
// SPDX-FileContributor: 2026 Bradley M. Bell
// ---------------------------------------------------------------------------
//! This pub module defines the `Base` trait
//!
//! Unifies what used to be two near-duplicate teacher traits
//! (`SimpleFloat`, `FloatCore`) into the one scalar trait the forward,
//! reverse, and sparsity sweeps need: arithmetic, the elementary math
//! functions, comparison, and NaN handling. `AD<V>` is generic over any
//! `V: Base`, including another `AD<W>` for nested differentiation.
use std::fmt::{Debug, Display};
use std::ops::{Add, Div, Mul, Neg, Sub};

/// The scalar arithmetic type every recording and active scalar is
/// parameterized by.
pub trait Base:
    Clone
    + Copy
    + PartialEq
    + PartialOrd
    + Debug
    + Display
    + Default
    + Add<Output = Self>
    + Sub<Output = Self>
    + Mul<Output = Self>
    + Div<Output = Self>
    + Neg<Output = Self>
    + 'static
{
    fn nan() -> Self;
    fn zero() -> Self;
    fn one() -> Self;
    fn two() -> Self {
        Self::one() + Self::one()
    }
    fn is_nan(&self) -> bool;
    /// Bit pattern used for constant-pool interning; bit-identity, not
    /// numeric equality, so NaN literals still intern.
    fn to_bits_u64(&self) -> u64;
    fn from_f64(v: f64) -> Self;
    fn to_f64(&self) -> f64;

    fn sqrt(self) -> Self;
    fn exp(self) -> Self;
    fn expm1(self) -> Self;
    fn ln(self) -> Self;
    fn ln_1p(self) -> Self;
    fn sin(self) -> Self;
    fn cos(self) -> Self;
    fn tan(self) -> Self;
    fn sinh(self) -> Self;
    fn cosh(self) -> Self;
    fn tanh(self) -> Self;
    fn asin(self) -> Self;
    fn acos(self) -> Self;
    fn atan(self) -> Self;
    fn abs(self) -> Self;
    fn sign(self) -> Self;
    fn powf(self, y: Self) -> Self;
    fn erf(self) -> Self;
    fn erfc(self) -> Self;
}

impl Base for f64 {
    fn nan() -> Self {
        f64::NAN
    }
    fn zero() -> Self {
        0.0
    }
    fn one() -> Self {
        1.0
    }
    fn is_nan(&self) -> bool {
        f64::is_nan(*self)
    }
    fn to_bits_u64(&self) -> u64 {
        self.to_bits()
    }
    fn from_f64(v: f64) -> Self {
        v
    }
    fn to_f64(&self) -> f64 {
        *self
    }
    fn sqrt(self) -> Self {
        f64::sqrt(self)
    }
    fn exp(self) -> Self {
        f64::exp(self)
    }
    fn expm1(self) -> Self {
        f64::exp_m1(self)
    }
    fn ln(self) -> Self {
        f64::ln(self)
    }
    fn ln_1p(self) -> Self {
        f64::ln_1p(self)
    }
    fn sin(self) -> Self {
        f64::sin(self)
    }
    fn cos(self) -> Self {
        f64::cos(self)
    }
    fn tan(self) -> Self {
        f64::tan(self)
    }
    fn sinh(self) -> Self {
        f64::sinh(self)
    }
    fn cosh(self) -> Self {
        f64::cosh(self)
    }
    fn tanh(self) -> Self {
        f64::tanh(self)
    }
    fn asin(self) -> Self {
        f64::asin(self)
    }
    fn acos(self) -> Self {
        f64::acos(self)
    }
    fn atan(self) -> Self {
        f64::atan(self)
    }
    fn abs(self) -> Self {
        f64::abs(self)
    }
    fn sign(self) -> Self {
        if self > 0.0 {
            1.0
        } else if self < 0.0 {
            -1.0
        } else {
            0.0
        }
    }
    fn powf(self, y: Self) -> Self {
        f64::powf(self, y)
    }
    fn erf(self) -> Self {
        erf_abramowitz_stegun(self)
    }
    fn erfc(self) -> Self {
        1.0 - erf_abramowitz_stegun(self)
    }
}

/// Abramowitz & Stegun 7.1.26 approximation, |error| < 1.5e-7.
///
/// `f64` has no `erf` in std; this avoids pulling in `libm` solely for
/// two rarely used elementary functions.
fn erf_abramowitz_stegun(x: f64) -> f64 {
    let sign = x.sign();
    let x = x.abs();
    let a1 = 0.254829592;
    let a2 = -0.284496736;
    let a3 = 1.421413741;
    let a4 = -1.453152027;
    let a5 = 1.061405429;
    let p = 0.3275911;
    let t = 1.0 / (1.0 + p * x);
    let y = 1.0 - (((((a5 * t + a4) * t) + a3) * t + a2) * t + a1) * t * (-x * x).exp();
    sign * y
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn erf_matches_known_values() {
        assert!((f64::erf(0.0)).abs() < 1e-12);
        assert!((f64::erf(1.0) - 0.8427007929497149).abs() < 1e-6);
        assert!((f64::erfc(1.0) - 0.1572992070502851).abs() < 1e-6);
    }

    #[test]
    fn bits_intern_nan_consistently() {
        let a = f64::nan();
        let b = f64::nan();
        assert_eq!(a.to_bits_u64(), b.to_bits_u64());
    }
}
