// SPDX-License-Identifier: EPL-2.0 OR GPL-2.0-or-later
// SPDX-FileCopyrightText: Bradley M. Bell <bradbell@seanet.com>
// SPDX-FileContributor: 2026 Bradley M. Bell
// ---------------------------------------------------------------------------
//! Per-operator Taylor-coefficient recurrences, order `k` in terms of
//! orders `0..k` already computed for the same variable and orders `0..=k`
//! of its arguments (always available: arguments precede their op in tape
//! order, and every order up to the sweep's upper bound is completed for
//! an op before its dependents are visited).
//!
//! `add`/`sub`/`mul`/`div`/`neg`/`abs`/`sign`/`sqrt`/`exp`/`expm1`/`ln`/
//! `ln_1p`/`sin`/`cos` hold for any order `k`. The remaining transcendental
//! ops (`tan`, `sinh`, `cosh`, `tanh`, `asin`, `acos`, `atan`, `erf`,
//! `erfc`) are only implemented through order 1: [requires_low_order]
//! marks them, and [forward::sweep] panics if asked for order 2 or higher.
//!
//! Link to [parent module](super)
// ----------------------------------------------------------------------------
use super::id;
use crate::base::Base;

/// `true` for ops whose recurrence here only covers orders 0 and 1.
pub(crate) fn requires_low_order(op_id: u8) -> bool {
    matches!(
        op_id,
        id::TAN_OP
            | id::SINH_OP
            | id::COSH_OP
            | id::TANH_OP
            | id::ASIN_OP
            | id::ACOS_OP
            | id::ATAN_OP
            | id::ERF_OP
            | id::ERFC_OP
    )
}

fn dot_lo_hi<V: Base>(k: usize, a: &[V], b: &[V]) -> V {
    let mut s = V::zero();
    for j in 0..=k {
        s = s + a[j] * b[k - j];
    }
    s
}

/// Fills `z[k]` for a binary elementary op from `x[0..=k]`, `y[0..=k]`,
/// `z[0..k]`.
pub(crate) fn binary_forward<V: Base>(op_id: u8, k: usize, x: &[V], y: &[V], z: &mut [V]) {
    z[k] = match op_id {
        id::ADD_OP => x[k] + y[k],
        id::SUB_OP => x[k] - y[k],
        id::MUL_OP => dot_lo_hi(k, x, y),
        id::DIV_OP => {
            let mut rhs = x[k];
            for j in 0..k {
                rhs = rhs - z[j] * y[k - j];
            }
            rhs / y[0]
        }
        id::POW_OP => {
            // y is a fixed (constant or dynamic) parameter: y[j] == 0 for
            // j > 0, so only y[0] is used. Zero-base special case mirrors
            // CppAD's pow_vp recurrence instead of differentiating through
            // a ln/mul/exp decomposition (which is singular at x0 == 0).
            let y0 = y[0];
            if k == 0 {
                x[0].powf(y0)
            } else if x[0] == V::zero() {
                V::zero()
            } else {
                let mut sum = V::zero();
                for j in 1..k {
                    let bj = V::from_f64(j as f64);
                    sum = sum + bj * (y0 * x[j] * z[k - j] - z[j] * x[k - j]);
                }
                let bk = V::from_f64(k as f64);
                (y0 * z[0] * x[k] + sum / bk) / x[0]
            }
        }
        _ => unreachable!("not a binary elementary op: {op_id}"),
    };
}

/// Fills `z[k]` (primary) and, for the companion-slot ops, `w[k]` from
/// `x[0..=k]`, `z[0..k]`, `w[0..k]`.
pub(crate) fn unary_forward<V: Base>(op_id: u8, k: usize, x: &[V], z: &mut [V], w: &mut [V]) {
    match op_id {
        id::NEG_OP => z[k] = -x[k],
        id::ABS_OP => {
            if k == 0 {
                z[0] = x[0].abs();
            } else {
                z[k] = x[0].sign() * x[k];
            }
        }
        id::SIGN_OP => z[k] = if k == 0 { x[0].sign() } else { V::zero() },
        id::SQRT_OP => {
            if k == 0 {
                z[0] = x[0].sqrt();
            } else {
                let mut s = x[k];
                for j in 1..k {
                    s = s - z[j] * z[k - j];
                }
                z[k] = s / (z[0] + z[0]);
            }
        }
        id::EXP_OP => {
            if k == 0 {
                z[0] = x[0].exp();
            } else {
                let mut s = V::zero();
                for j in 1..=k {
                    s = s + V::from_f64(j as f64) * x[j] * z[k - j];
                }
                z[k] = s / V::from_f64(k as f64);
            }
        }
        id::EXPM1_OP => {
            if k == 0 {
                z[0] = x[0].expm1();
            } else {
                // same slope as exp; z[0] differs from w (= exp(x0)) by one.
                // w[j] for j >= 1 equals z[j] (d/dx expm1 == d/dx exp), so
                // reconstruct w on the fly instead of keeping a second slot.
                let w0 = x[0].exp();
                let mut acc = V::zero();
                for j in 1..=k {
                    let wj_lo = if k - j == 0 { w0 } else { z[k - j] };
                    acc = acc + V::from_f64(j as f64) * x[j] * wj_lo;
                }
                z[k] = acc / V::from_f64(k as f64);
            }
        }
        id::LN_OP => {
            if k == 0 {
                z[0] = x[0].ln();
            } else {
                let mut s = x[k];
                for j in 1..k {
                    s = s - V::from_f64(j as f64) * z[j] * x[k - j];
                }
                z[k] = s / (V::from_f64(k as f64) * x[0]);
            }
        }
        id::LOG1P_OP => {
            if k == 0 {
                z[0] = x[0].ln_1p();
            } else {
                let y0 = V::one() + x[0];
                let mut s = x[k];
                for j in 1..k {
                    s = s - V::from_f64(j as f64) * z[j] * x[k - j];
                }
                z[k] = s / (V::from_f64(k as f64) * y0);
            }
        }
        id::SIN_OP | id::COS_OP => {
            // z: sin, w: cos when op_id == SIN_OP; swapped for COS_OP.
            if k == 0 {
                let (s0, c0) = (x[0].sin(), x[0].cos());
                if op_id == id::SIN_OP {
                    z[0] = s0;
                    w[0] = c0;
                } else {
                    z[0] = c0;
                    w[0] = s0;
                }
            } else {
                // s_k = (1/k) sum j x_j c_{k-j}; c_k = -(1/k) sum j x_j s_{k-j}
                let (s_prev, c_prev) = if op_id == id::SIN_OP { (&*z, &*w) } else { (&*w, &*z) };
                let mut s_acc = V::zero();
                let mut c_acc = V::zero();
                for j in 1..=k {
                    s_acc = s_acc + V::from_f64(j as f64) * x[j] * c_prev[k - j];
                    c_acc = c_acc + V::from_f64(j as f64) * x[j] * s_prev[k - j];
                }
                let s_k = s_acc / V::from_f64(k as f64);
                let c_k = -(c_acc / V::from_f64(k as f64));
                if op_id == id::SIN_OP {
                    z[k] = s_k;
                    w[k] = c_k;
                } else {
                    z[k] = c_k;
                    w[k] = s_k;
                }
            }
        }
        id::TAN_OP => {
            if k == 0 {
                z[0] = x[0].tan();
            } else {
                z[1] = x[1] * (V::one() + z[0] * z[0]);
            }
        }
        id::SINH_OP | id::COSH_OP => {
            if k == 0 {
                let (sh0, ch0) = (x[0].sinh(), x[0].cosh());
                if op_id == id::SINH_OP {
                    z[0] = sh0;
                    w[0] = ch0;
                } else {
                    z[0] = ch0;
                    w[0] = sh0;
                }
            } else {
                let (sh0, ch0) = if op_id == id::SINH_OP { (z[0], w[0]) } else { (w[0], z[0]) };
                let sh1 = x[1] * ch0;
                let ch1 = x[1] * sh0;
                if op_id == id::SINH_OP {
                    z[1] = sh1;
                    w[1] = ch1;
                } else {
                    z[1] = ch1;
                    w[1] = sh1;
                }
            }
        }
        id::TANH_OP => {
            if k == 0 {
                z[0] = x[0].tanh();
            } else {
                z[1] = x[1] * (V::one() - z[0] * z[0]);
            }
        }
        id::ASIN_OP => {
            if k == 0 {
                z[0] = x[0].asin();
                w[0] = (V::one() - x[0] * x[0]).sqrt();
            } else {
                z[1] = x[1] / w[0];
                w[1] = -(x[0] * x[1]) / w[0];
            }
        }
        id::ACOS_OP => {
            if k == 0 {
                z[0] = x[0].acos();
                w[0] = (V::one() - x[0] * x[0]).sqrt();
            } else {
                z[1] = -(x[1] / w[0]);
                w[1] = -(x[0] * x[1]) / w[0];
            }
        }
        id::ATAN_OP => {
            if k == 0 {
                z[0] = x[0].atan();
                w[0] = V::one() + x[0] * x[0];
            } else {
                z[1] = x[1] / w[0];
                w[1] = (x[0] + x[0]) * x[1];
            }
        }
        id::ERF_OP | id::ERFC_OP => {
            if k == 0 {
                z[0] = if op_id == id::ERF_OP { x[0].erf() } else { x[0].erfc() };
            } else {
                const TWO_OVER_SQRT_PI: f64 = 1.1283791670955126;
                let slope = V::from_f64(TWO_OVER_SQRT_PI) * (-(x[0] * x[0])).exp();
                let d = x[1] * slope;
                z[1] = if op_id == id::ERF_OP { d } else { -d };
            }
        }
        _ => unreachable!("not a unary elementary op: {op_id}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mul_order_two_matches_product_rule() {
        // x(t) = 2 + 3t + t^2, y(t) = 1 + t ; z = x*y, check order 2 coeff.
        let x = [2.0, 3.0, 1.0];
        let y = [1.0, 1.0, 0.0];
        let mut z = [0.0; 3];
        for k in 0..3 {
            binary_forward::<f64>(id::MUL_OP, k, &x, &y, &mut z);
        }
        // z0=2, z1=3+2=5, z2 = x0*y2+x1*y1+x2*y0 = 0+3+1=4
        assert_eq!(z, [2.0, 5.0, 4.0]);
    }

    #[test]
    fn pow_zero_base_special_case() {
        // x0 == 0 forces every higher coefficient to 0 by definition of
        // the recurrence (matches CppAD's pow_vp zero-base branch), even
        // though x(t) = t here so the true z2 would be 1.
        let x = [0.0, 1.0, 0.0];
        let y = [2.0, 0.0, 0.0];
        let mut z = [0.0; 3];
        for k in 0..3 {
            binary_forward::<f64>(id::POW_OP, k, &x, &y, &mut z);
        }
        assert_eq!(z, [0.0, 0.0, 0.0]);
    }

    #[test]
    fn pow_nonzero_base_matches_value() {
        let x = [0.5, 1.0, 0.0];
        let y = [2.0, 0.0, 0.0];
        let mut z = [0.0; 3];
        for k in 0..3 {
            binary_forward::<f64>(id::POW_OP, k, &x, &y, &mut z);
        }
        assert!((z[0] - 0.25).abs() < 1e-12);
        assert!((z[1] - 1.0).abs() < 1e-12); // d/dx x^2 = 2x = 1.0 at x=0.5
    }

    #[test]
    fn sin_cos_companion_order_two() {
        let x = [0.0, 1.0, 0.0];
        let mut s = [0.0; 3];
        let mut c = [0.0; 3];
        for k in 0..3 {
            unary_forward::<f64>(id::SIN_OP, k, &x, &mut s, &mut c);
        }
        assert!((s[0] - 0.0).abs() < 1e-12);
        assert!((s[1] - 1.0).abs() < 1e-12);
        assert!((c[0] - 1.0).abs() < 1e-12);
    }
}
