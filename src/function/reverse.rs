// SPDX-License-Identifier: EPL-2.0 OR GPL-2.0-or-later
// SPDX-FileCopyrightText: Bradley M. Bell <bradbell@seanet.com>
// SPDX-FileContributor: 2026 Bradley M. Bell
// ---------------------------------------------------------------------------
//! Reverse sweep: propagates adjoints (partial derivatives of a scalar
//! weighted sum of the dependents' Taylor coefficients) backwards through
//! the recorded operation sequence to the independent variables.
//!
//! Walks ops in reverse tape order; by the time an op is reached every op
//! that uses its result as an argument has already contributed its share
//! of the adjoint to that result. `add`/`sub`/`mul`/`div` propagate through
//! every requested order; `pow`, every other unary elementary op, and
//! atomic/checkpoint calls only ever propagate an order-0 adjoint, so
//! `order_up` must be `0` whenever the recording contains one of those —
//! asserted at the point each is visited rather than silently dropping the
//! higher-order contribution (see [crate::op::recur::requires_low_order]
//! for the subset of those that [super::forward] itself only carries
//! through order 1 anyway).
//!
//! Link to [parent module](super)
// ----------------------------------------------------------------------------
use super::forward::arg_coeff;
use super::{ADfn, PartialMat};
use crate::ad::ADType;
use crate::atom::AtomRegistry;
use crate::base::Base;
use crate::checkpoint::CheckpointRegistry;
use crate::op::id;

/// Computes `d/dx[sum_k w[k] . y^(k)]` for weights `w` given per dependent,
/// per order `0..=order_up`, where `y^(k)` is the order-`k` Taylor
/// coefficient vector of the dependents. `weight` is flattened the same
/// way `forward`'s `x_p_to_q`/return value are:
/// `weight[k * range_len() + i]`.
///
/// Requires `forward` to have already been called through `order_up`.
///
/// If `trace` is set, prints one line per visited op to stdout, matching
/// the teacher's `reverse_one` convention.
pub fn reverse<V: Base + AtomRegistry + CheckpointRegistry>(
    f: &ADfn<V>,
    order_up: usize,
    weight: &[V],
    trace: bool,
) -> Vec<V> {
    let n_range = f.range_len();
    assert_eq!(weight.len(), (order_up + 1) * n_range, "reverse: wrong size weight");
    assert!(
        f.taylor.order_current.is_some_and(|c| c >= order_up),
        "reverse: forward has not been run through order_up"
    );

    let n_var = f.n_var();
    let mut partial = PartialMat::new(n_var, order_up + 1);
    for i in 0..n_range {
        if f.range_ad_type[i] == ADType::Variable {
            let var = f.range_index[i] as usize;
            for k in 0..=order_up {
                partial.add(var, k, weight[k * n_range + i]);
            }
        }
    }

    if trace {
        println!("Begin Trace: reverse, order_up = {order_up}");
        println!("var_index, partial, op_name, arg");
    }

    for op in (0..f.var.n_op()).rev() {
        let op_id = f.var.id_all[op];
        if op_id == id::NO_OP {
            continue;
        }
        let res = f.var.res_start[op] as usize;

        if id::is_binary(op_id) {
            let args = f.var.args(op);
            let types = f.var.arg_types(op);
            let (xt, xi) = (types[0], args[0]);
            let (yt, yi) = (types[1], args[1]);
            if op_id == id::POW_OP {
                assert!(
                    order_up == 0,
                    "reverse: order {order_up} adjoint not implemented for pow; only order 0 is propagated"
                );
            }
            for k in (0..=order_up).rev() {
                let bar_z = partial.get(res, k);
                if bar_z == V::zero() {
                    continue;
                }
                propagate_binary(f, &mut partial, op_id, res, k, xt, xi, yt, yi, bar_z);
            }
            if trace {
                println!("{res}, {}, {}, {args:?}", partial.get(res, 0), crate::function::to_src::op_name(op_id));
            }
            continue;
        }

        if id::is_unary(op_id) {
            assert!(
                order_up == 0,
                "reverse: order {order_up} adjoint not implemented for unary op {op_id}; only order 0 is propagated"
            );
            let args = f.var.args(op);
            let types = f.var.arg_types(op);
            let (xt, xi) = (types[0], args[0]);
            if xt == ADType::Variable {
                let bar_z0 = partial.get(res, 0);
                if bar_z0 != V::zero() {
                    propagate_unary(f, &mut partial, op_id, xi, bar_z0);
                }
            }
            if trace {
                println!("{res}, {}, {}, {args:?}", partial.get(res, 0), crate::function::to_src::op_name(op_id));
            }
            continue;
        }

        match op_id {
            id::COND_EXP_OP => {
                let args = f.var.args(op);
                let types = f.var.arg_types(op);
                let meta = f.var.meta(op);
                let l = arg_coeff(f, types[0], args[0], 0).to_f64();
                let r = arg_coeff(f, types[1], args[1], 0).to_f64();
                let now = crate::ad::CompareOp::holds_from_code(meta[0], l, r);
                let (wt, wi) = if now { (types[2], args[2]) } else { (types[3], args[3]) };
                if wt == ADType::Variable {
                    for k in 0..=order_up {
                        let bar = partial.get(res, k);
                        partial.add(wi as usize, k, bar);
                    }
                }
                if trace {
                    println!("{res}, {}, cond_exp, {args:?}", partial.get(res, 0));
                }
            }
            id::CALL_OP => {
                assert!(
                    order_up == 0,
                    "reverse: order {order_up} adjoint not implemented for atomic/checkpoint calls; only order 0 is propagated"
                );
                let args = f.var.args(op).to_vec();
                let types = f.var.arg_types(op).to_vec();
                let meta = f.var.meta(op);
                let call_id = meta[0];
                let is_checkpoint = meta[1] != 0;
                let res_range = f.var.res_range(op);
                let n_y = res_range.len();
                let bar: Vec<V> = (0..n_y).map(|j| partial.get(res_range.start + j, 0)).collect();
                if bar.iter().all(|b| *b == V::zero()) {
                    continue;
                }
                let x0: Vec<Vec<V>> =
                    args.iter().zip(types.iter()).map(|(&a, &t)| vec![arg_coeff(f, t, a, 0)]).collect();
                let weight0: Vec<Vec<V>> = bar.iter().map(|b| vec![*b]).collect();
                let adj_x: Vec<V> = if is_checkpoint {
                    crate::checkpoint::call_forward::<V>(call_id, &x0, 0);
                    crate::checkpoint::call_reverse::<V>(call_id, 0, &weight0)
                } else {
                    let y0: Vec<Vec<V>> =
                        (0..n_y).map(|j| vec![f.taylor.get(res_range.start + j, 0)]).collect();
                    let rows = crate::atom::with_atom::<V, _>(call_id, |info| {
                        (info.reverse)(&x0, &y0, &weight0, 0)
                    });
                    rows.into_iter().map(|row| row[0]).collect()
                };
                for (j, (t, a)) in types.iter().zip(args.iter()).enumerate() {
                    if *t == ADType::Variable {
                        partial.add(*a as usize, 0, adj_x[j]);
                    }
                }
                if trace {
                    println!("{res}, call(id={call_id}), {args:?}");
                }
            }
            _ => {
                // LOAD_OP/STORE_OP/PRINT_OP/CUMSUM_OP/CSKIP_OP: no adjoint
                // contribution modeled here. A load's element may have come
                // from several stores along different control-flow paths,
                // and picking one to charge the adjoint to is not modeled
                // (see DESIGN.md).
                if trace {
                    println!("{res}, (no adjoint), {}, {:?}", crate::function::to_src::op_name(op_id), f.var.args(op));
                }
            }
        }
    }
    if trace {
        println!("End Trace: reverse");
    }

    let mut grad = vec![V::zero(); f.domain_len()];
    for j in 0..f.domain_len() {
        grad[j] = partial.get(f.ind_addr[j] as usize, 0);
    }
    grad
}

#[allow(clippy::too_many_arguments)]
fn propagate_binary<V: Base>(
    f: &ADfn<V>,
    partial: &mut PartialMat<V>,
    op_id: u8,
    res: usize,
    k: usize,
    xt: ADType,
    xi: u32,
    yt: ADType,
    yi: u32,
    bar_z: V,
) {
    match op_id {
        id::ADD_OP => {
            if xt == ADType::Variable {
                partial.add(xi as usize, k, bar_z);
            }
            if yt == ADType::Variable {
                partial.add(yi as usize, k, bar_z);
            }
        }
        id::SUB_OP => {
            if xt == ADType::Variable {
                partial.add(xi as usize, k, bar_z);
            }
            if yt == ADType::Variable {
                partial.add(yi as usize, k, -bar_z);
            }
        }
        id::MUL_OP => {
            if xt == ADType::Variable {
                for j in 0..=k {
                    let y_j = arg_coeff(f, yt, yi, k - j);
                    partial.add(xi as usize, j, bar_z * y_j);
                }
            }
            if yt == ADType::Variable {
                for j in 0..=k {
                    let x_j = arg_coeff(f, xt, xi, k - j);
                    partial.add(yi as usize, j, bar_z * x_j);
                }
            }
        }
        id::DIV_OP => {
            let y0 = arg_coeff(f, yt, yi, 0);
            if xt == ADType::Variable {
                partial.add(xi as usize, k, bar_z / y0);
            }
            if yt == ADType::Variable {
                let z_k = f.taylor.get(res, k);
                partial.add(yi as usize, k, -(bar_z * z_k) / y0);
            }
        }
        id::POW_OP => {
            // y is always a fixed (constant/dynamic) parameter for this
            // opcode, see ad::pow; only order 0 is propagated, like the
            // other transcendentals this crate doesn't reverse at
            // arbitrary order.
            if k == 0 && xt == ADType::Variable {
                let x0 = arg_coeff(f, xt, xi, 0);
                if x0 != V::zero() {
                    let y0 = arg_coeff(f, yt, yi, 0);
                    let z0 = f.taylor.get(res, 0);
                    partial.add(xi as usize, 0, bar_z * y0 * z0 / x0);
                }
            }
        }
        _ => unreachable!("not a binary elementary op: {op_id}"),
    }
}

fn propagate_unary<V: Base>(f: &ADfn<V>, partial: &mut PartialMat<V>, op_id: u8, xi: u32, bar_z: V) {
    let x0 = f.taylor.get(xi as usize, 0);
    match op_id {
        id::NEG_OP => partial.add(xi as usize, 0, -bar_z),
        id::ABS_OP => partial.add(xi as usize, 0, bar_z * x0.sign()),
        id::SIGN_OP => {}
        _ => {
            let slope = unary_slope(op_id, x0);
            partial.add(xi as usize, 0, bar_z * slope);
        }
    }
}

fn unary_slope<V: Base>(op_id: u8, x0: V) -> V {
    match op_id {
        id::SQRT_OP => V::one() / (V::two() * x0.sqrt()),
        id::EXP_OP | id::EXPM1_OP => x0.exp(),
        id::LN_OP => V::one() / x0,
        id::LOG1P_OP => V::one() / (V::one() + x0),
        id::SIN_OP => x0.cos(),
        id::COS_OP => -x0.sin(),
        id::TAN_OP => {
            let t = x0.tan();
            V::one() + t * t
        }
        id::SINH_OP => x0.cosh(),
        id::COSH_OP => x0.sinh(),
        id::TANH_OP => {
            let t = x0.tanh();
            V::one() - t * t
        }
        id::ASIN_OP => V::one() / (V::one() - x0 * x0).sqrt(),
        id::ACOS_OP => -(V::one() / (V::one() - x0 * x0).sqrt()),
        id::ATAN_OP => V::one() / (V::one() + x0 * x0),
        id::ERF_OP => V::from_f64(1.1283791670955126) * (-(x0 * x0)).exp(),
        id::ERFC_OP => -(V::from_f64(1.1283791670955126) * (-(x0 * x0)).exp()),
        _ => unreachable!("not a unary elementary op: {op_id}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::function::forward::forward;
    use crate::tape::{start_recording, stop_recording};

    #[test]
    fn reverse_gradient_of_product() {
        let x = start_recording(vec![2.0_f64, 3.0]);
        let y = &x[0] * &x[1];
        let mut f = stop_recording(vec![y]).unwrap();
        let _ = forward(&mut f, 0, 0, &[2.0, 3.0], false);
        let grad = reverse(&f, 0, &[1.0], false);
        assert!((grad[0] - 3.0).abs() < 1e-12);
        assert!((grad[1] - 2.0).abs() < 1e-12);
    }

    #[test]
    fn reverse_gradient_through_sin() {
        let x = start_recording(vec![0.5_f64]);
        let y = crate::ad::sin(&x[0]);
        let mut f = stop_recording(vec![y]).unwrap();
        let _ = forward(&mut f, 0, 0, &[0.5], false);
        let grad = reverse(&f, 0, &[1.0], false);
        assert!((grad[0] - 0.5_f64.cos()).abs() < 1e-9);
    }

    #[test]
    #[should_panic(expected = "adjoint not implemented")]
    fn reverse_order_one_through_sin_panics_instead_of_silently_truncating() {
        let x = start_recording(vec![0.5_f64]);
        let y = crate::ad::sin(&x[0]);
        let mut f = stop_recording(vec![y]).unwrap();
        let _ = forward(&mut f, 0, 1, &[0.5, 1.0], false);
        let _ = reverse(&f, 1, &[1.0, 1.0], false);
    }
}
