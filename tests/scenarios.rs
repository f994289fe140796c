// SPDX-License-Identifier: EPL-2.0 OR GPL-2.0-or-later
// SPDX-FileCopyrightText: Bradley M. Bell <bradbell@seanet.com>
// SPDX-FileContributor: 2026 Bradley M. Bell
// ---------------------------------------------------------------------------
//! End-to-end scenarios exercising recording, forward/reverse sweeps,
//! `CondExp`, `pow`'s two branches, atomic functions, and indexed vectors
//! together, as opposed to the per-module unit tests living next to each
//! implementation.

use rustad::atom::{call_atom, register_atom, AtomInfo};
use rustad::function::forward::forward;
use rustad::function::reverse::reverse;
use rustad::{cond_exp, pow, start_recording, stop_recording, CompareOp, VecAD, AD};

/// S1: `y = x0*x1 + x1`.
#[test]
fn polynomial() {
    let x = start_recording(vec![2.0_f64, 3.0]);
    let y = &(&x[0] * &x[1]) + &x[1];
    let mut f = stop_recording(vec![y]).unwrap();

    let y0 = forward(&mut f, 0, 0, &[2.0, 3.0], false);
    assert!((y0[0] - 9.0).abs() < 1e-12);

    let dy = forward(&mut f, 1, 1, &[1.0, 0.0], false);
    assert!((dy[0] - 3.0).abs() < 1e-12);

    let dw = reverse(&f, 0, &[1.0], false);
    assert!((dw[0] - 3.0).abs() < 1e-12);
    assert!((dw[1] - 3.0).abs() < 1e-12);
}

/// S2: `y = CondExp(Lt, x, 0, -x, x) = |x|`; `compare_change_count` stays
/// 0 since `cond_exp` never touches it (only `compare` does).
#[test]
fn cond_exp_abs_value() {
    let x = start_recording(vec![-1.5_f64]);
    let zero = AD::constant(0.0_f64);
    let neg_x = -&x[0];
    let y = cond_exp(CompareOp::Lt, &x[0], &zero, &neg_x, &x[0]);
    let mut f = stop_recording(vec![y]).unwrap();

    let y0 = forward(&mut f, 0, 0, &[-1.5], false);
    assert!((y0[0] - 1.5).abs() < 1e-12);
    let dy = forward(&mut f, 1, 1, &[1.0], false);
    assert!((dy[0] - (-1.0)).abs() < 1e-12);
    assert_eq!(f.compare_change_count(), 0);

    f.capacity_order(0);
    let y0b = forward(&mut f, 0, 0, &[2.0], false);
    assert!((y0b[0] - 2.0).abs() < 1e-12);
    let dyb = forward(&mut f, 1, 1, &[1.0], false);
    assert!((dyb[0] - 1.0).abs() < 1e-12);
    assert_eq!(f.compare_change_count(), 0);
}

/// S3: `pow` branches. A fixed exponent takes `POW_OP`'s own recurrence,
/// including the zero-base special case; a variable exponent falls back
/// to `exp(y*ln(x))`, well-defined away from `x <= 0`.
#[test]
fn pow_branches() {
    let x = start_recording(vec![0.5_f64]);
    let exponent = AD::constant(2.0_f64);
    let z = pow(&x[0], &exponent);
    let mut f = stop_recording(vec![z]).unwrap();

    let z0 = forward(&mut f, 0, 0, &[0.5], false);
    assert!((z0[0] - 0.25).abs() < 1e-12);
    let dz = forward(&mut f, 1, 1, &[1.0], false);
    assert!((dz[0] - 1.0).abs() < 1e-12);

    f.capacity_order(0);
    let z0b = forward(&mut f, 0, 0, &[0.0], false);
    assert!(z0b[0].abs() < 1e-12);
    let dzb = forward(&mut f, 1, 1, &[1.0], false);
    assert!(dzb[0].abs() < 1e-12);

    let y = start_recording(vec![2.0_f64]);
    let base = AD::constant(0.5_f64);
    let z2 = pow(&base, &y[0]);
    let mut g = stop_recording(vec![z2]).unwrap();
    let _ = forward(&mut g, 0, 0, &[2.0], false);
    let dz_dy = forward(&mut g, 1, 1, &[1.0], false);
    let expected = 0.25 * 0.5_f64.ln();
    assert!((dz_dy[0] - expected).abs() < 1e-9);
}

fn g_forward(x: &[Vec<f64>], _order_lo: usize, order_up: usize) -> Vec<Vec<f64>> {
    let (x0, x1) = (&x[0], &x[1]);
    let mut z = vec![0.0; order_up + 1];
    for k in 0..=order_up {
        let mut conv = 0.0;
        for i in 0..=k {
            conv += x0[i] * x1[k - i];
        }
        z[k] = conv + x1[k];
    }
    vec![z]
}

fn g_reverse(x: &[Vec<f64>], _y: &[Vec<f64>], weight: &[Vec<f64>], _order_up: usize) -> Vec<Vec<f64>> {
    let (x0, x1, w) = (x[0][0], x[1][0], weight[0][0]);
    vec![vec![w * x1], vec![w * (x0 + 1.0)]]
}

fn g_jac_sparsity(_n_x: usize, _n_y: usize, pattern_x: &rustad::SparsityPattern) -> rustad::SparsityPattern {
    let mut out: Vec<[usize; 2]> = pattern_x.iter().map(|p| [0, p[1]]).collect();
    out.sort();
    out.dedup();
    out
}

fn g_hes_sparsity(
    _n_x: usize,
    pattern_x: &rustad::SparsityPattern,
    select_y: &[bool],
) -> rustad::SparsityPattern {
    if !select_y.first().copied().unwrap_or(false) {
        return Vec::new();
    }
    let cols: Vec<usize> = pattern_x.iter().map(|p| p[1]).collect();
    let mut out = Vec::new();
    for &a in &cols {
        for &b in &cols {
            out.push([a, b]);
        }
    }
    out.sort();
    out.dedup();
    out
}

/// `g` has a single output depending on both inputs, so it takes the
/// maximum of the two domain types.
fn g_for_type(domain_ad_type: &[rustad::ADType]) -> Vec<rustad::ADType> {
    vec![domain_ad_type.iter().copied().max().unwrap()]
}

/// S4: `g(u) = x0*x1 + x1`, built once as plain ops and once inside an
/// atomic block, must agree on value, first-order forward, and gradient
/// at 10 points.
#[test]
fn atomic_equivalence() {
    let atom_id = register_atom::<f64>(AtomInfo {
        name: "g",
        n_x: 2,
        n_y: 1,
        forward: g_forward,
        reverse: g_reverse,
        jac_sparsity: g_jac_sparsity,
        hes_sparsity: g_hes_sparsity,
        for_type: g_for_type,
    });

    // Deterministic points in place of a true RNG, so this test is
    // reproducible without pulling in a `rand` dependency for ten numbers.
    let mut seed: u64 = 88172645463325252;
    let mut next_unit = || {
        seed ^= seed << 13;
        seed ^= seed >> 7;
        seed ^= seed << 17;
        (seed >> 11) as f64 / (1u64 << 53) as f64
    };
    let points: Vec<(f64, f64)> = (0..10)
        .map(|_| (next_unit() * 4.0 - 2.0, next_unit() * 4.0 - 2.0))
        .collect();

    for (a, b) in points {
        let x = start_recording(vec![a, b]);
        let y_plain = &(&x[0] * &x[1]) + &x[1];
        let mut f_plain = stop_recording(vec![y_plain]).unwrap();

        let u = start_recording(vec![a, b]);
        let y_atom = call_atom::<f64>(atom_id, vec![u[0].clone(), u[1].clone()]).unwrap();
        let mut f_atom = stop_recording(y_atom).unwrap();

        let dx = [1.3_f64, -0.7];
        let row = [a, b, dx[0], dx[1]];
        let y_plain_vals = forward(&mut f_plain, 0, 1, &row, false);
        let y_atom_vals = forward(&mut f_atom, 0, 1, &row, false);
        assert!(
            (y_plain_vals[0] - y_atom_vals[0]).abs() < 1e-9,
            "value mismatch at ({a}, {b})"
        );
        assert!(
            (y_plain_vals[1] - y_atom_vals[1]).abs() < 1e-9,
            "directional derivative mismatch at ({a}, {b})"
        );

        let grad_plain = reverse(&f_plain, 0, &[1.0], false);
        let grad_atom = reverse(&f_atom, 0, &[1.0], false);
        assert!((grad_plain[0] - grad_atom[0]).abs() < 1e-9, "d/dx0 mismatch at ({a}, {b})");
        assert!((grad_plain[1] - grad_atom[1]).abs() < 1e-9, "d/dx1 mismatch at ({a}, {b})");
    }
}

/// S6: a length-2 indexed vector, `a*b` stored into slot 0, loaded back
/// through an index that rounds to either slot depending on `x`. Only a
/// vector's stores get an op-by-op adjoint in this crate (see
/// `function::reverse`'s module doc), so sensitivities are checked with
/// directional forward sweeps rather than `reverse`.
#[test]
fn indexed_vector_load_selects_by_index() {
    let x = start_recording(vec![5.0_f64, 7.0, 0.3]);
    let (a, b, idx) = (x[0].clone(), x[1].clone(), x[2].clone());
    let v = VecAD::new(vec![a.clone(), b.clone()]);
    v.store(&AD::constant(0.0), &(&a * &b));
    let y = v.load(&idx);
    let mut f = stop_recording(vec![y]).unwrap();

    let y0 = forward(&mut f, 0, 0, &[5.0, 7.0, 0.3], false);
    assert!((y0[0] - 35.0).abs() < 1e-12);
    let dy_da = forward(&mut f, 1, 1, &[1.0, 0.0, 0.0], false);
    assert!((dy_da[0] - 7.0).abs() < 1e-9);

    f.capacity_order(0);
    let _ = forward(&mut f, 0, 0, &[5.0, 7.0, 0.3], false);
    let dy_db = forward(&mut f, 1, 1, &[0.0, 1.0, 0.0], false);
    assert!((dy_db[0] - 5.0).abs() < 1e-9);

    let x2 = start_recording(vec![5.0_f64, 7.0, 1.3]);
    let (a2, b2, idx2) = (x2[0].clone(), x2[1].clone(), x2[2].clone());
    let v2 = VecAD::new(vec![a2.clone(), b2.clone()]);
    v2.store(&AD::constant(0.0), &(&a2 * &b2));
    let y2 = v2.load(&idx2);
    let mut f2 = stop_recording(vec![y2]).unwrap();

    let y2_0 = forward(&mut f2, 0, 0, &[5.0, 7.0, 1.3], false);
    assert!((y2_0[0] - 7.0).abs() < 1e-12);
    let dy2_da = forward(&mut f2, 1, 1, &[1.0, 0.0, 0.0], false);
    assert!(dy2_da[0].abs() < 1e-9);

    f2.capacity_order(0);
    let _ = forward(&mut f2, 0, 0, &[5.0, 7.0, 1.3], false);
    let dy2_db = forward(&mut f2, 1, 1, &[0.0, 1.0, 0.0], false);
    assert!((dy2_db[0] - 1.0).abs() < 1e-9);
}
