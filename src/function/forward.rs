// SPDX-License-Identifier: EPL-2.0 OR GPL-2.0-or-later
// SPDX-FileCopyrightText: Bradley M. Bell <bradbell@seanet.com>
// SPDX-FileContributor: 2026 Bradley M. Bell
// ---------------------------------------------------------------------------
//! Forward sweep: propagates Taylor coefficients of the independent
//! variables through the recorded operation sequence to compute Taylor
//! coefficients of every variable, in particular the dependent (range)
//! variables.
//!
//! The sweep walks ops in tape order (outer loop) and, for each op, fills
//! orders `order_lo..=order_up` (inner loop). This ordering is valid
//! because every argument of an op precedes it in tape order and has
//! therefore already finished its entire `order_lo..=order_up` range by
//! the time the op using it is reached.
//!
//! Link to [parent module](super)
// ----------------------------------------------------------------------------
use super::ADfn;
use crate::ad::ADType;
use crate::atom::AtomRegistry;
use crate::base::Base;
use crate::checkpoint::CheckpointRegistry;
use crate::indexed_vec;
use crate::op::{id, recur};

#[inline]
pub(crate) fn arg_coeff<V: Base>(f: &ADfn<V>, t: ADType, idx: u32, order: usize) -> V {
    match t {
        ADType::ConstantP => {
            if order == 0 {
                f.cop[idx as usize]
            } else {
                V::zero()
            }
        }
        ADType::DynamicP => {
            if order == 0 {
                f.dyn_val[idx as usize]
            } else {
                V::zero()
            }
        }
        ADType::Variable => f.taylor.get(idx as usize, order),
        ADType::Empty => V::zero(),
    }
}

/// Runs the forward sweep for orders `order_lo..=order_up` given the
/// independents' Taylor coefficients, flattened row-major as
/// `x_p_to_q[(order - order_lo) * domain_len() + j]`. Returns the
/// dependents' coefficients in the same layout.
///
/// `order_lo` must not skip past what has already been computed: it must
/// equal `0` on the very first call, or `taylor.order_current + 1` on a
/// later call extending the order range.
///
/// If `trace` is set, prints one line per visited op (`var_index, value,
/// op_name, arg`) to stdout, the same convention the teacher's
/// `forward_zero`/`forward_one` use.
pub fn forward<V: Base + AtomRegistry + CheckpointRegistry>(
    f: &mut ADfn<V>,
    order_lo: usize,
    order_up: usize,
    x_p_to_q: &[V],
    trace: bool,
) -> Vec<V> {
    assert!(order_lo <= order_up);
    let n_k = order_up - order_lo + 1;
    let n_dom = f.domain_len();
    assert_eq!(x_p_to_q.len(), n_k * n_dom, "forward: wrong size x_p_to_q");
    let next_expected = f.taylor.order_current.map_or(0, |c| c + 1);
    assert_eq!(order_lo, next_expected, "forward: order_lo skips unfilled orders");
    if f.taylor.cap() <= order_up {
        f.taylor.capacity_order(order_up + 1);
        f.vec_store.capacity_order(order_up + 1);
    }

    for j in 0..n_dom {
        let var = f.ind_addr[j] as usize;
        for k_rel in 0..n_k {
            f.taylor.set(var, order_lo + k_rel, x_p_to_q[k_rel * n_dom + j]);
        }
    }

    seed_vec_initial(f, order_lo, order_up);
    sweep(f, order_lo, order_up, trace);
    f.taylor.order_current = Some(order_up);

    let n_range = f.range_len();
    let mut y = vec![V::zero(); n_k * n_range];
    for i in 0..n_range {
        let t = f.range_ad_type[i];
        let idx = f.range_index[i];
        for k_rel in 0..n_k {
            y[k_rel * n_range + i] = arg_coeff(f, t, idx, order_lo + k_rel);
        }
    }
    y
}

/// Replays the `dyp` sub-recording at order 0 only, writing freshly
/// computed dynamic-parameter values back into `dyn_val`. Dynamic
/// parameters never carry higher Taylor orders: they are ordinary values
/// that can be rebound without re-recording the `var` sequence.
pub fn replay_dyp<V: Base>(f: &mut ADfn<V>) {
    for op in 0..f.dyp.n_op() {
        let op_id = f.dyp.id_all[op];
        if op_id == id::NO_OP {
            continue;
        }
        let args = f.dyp.args(op);
        let types = f.dyp.arg_types(op);
        let res = f.dyp.res_start[op] as usize;
        let get = |k: usize| -> V {
            match types[k] {
                ADType::ConstantP => f.cop[args[k] as usize],
                ADType::DynamicP => f.dyn_val[args[k] as usize],
                _ => unreachable!("dyp sequence cannot reference a variable"),
            }
        };
        let value = if id::is_binary(op_id) {
            let x = [get(0), V::zero()];
            let y = [get(1), V::zero()];
            let mut z = [V::zero(), V::zero()];
            recur::binary_forward(op_id, 0, &x, &y, &mut z);
            z[0]
        } else if id::is_unary(op_id) {
            let x = [get(0), V::zero()];
            let mut z = [V::zero(), V::zero()];
            let mut w = [V::zero(), V::zero()];
            recur::unary_forward(op_id, 0, &x, &mut z, &mut w);
            z[0]
        } else {
            continue;
        };
        f.dyn_val[res] = value;
    }
}

/// Seeds every declared indexed vector's elements from their recorded
/// initial value for the newly-requested orders, before the sweep's own
/// `STORE_OP`s get a chance to overwrite specific elements. Re-running this
/// on every order-extension call only touches the new `order_lo..=order_up`
/// columns, so it never disturbs an element a prior call's sweep already
/// wrote (see [crate::indexed_vec]).
fn seed_vec_initial<V: Base>(f: &mut ADfn<V>, order_lo: usize, order_up: usize) {
    for vec_id in 0..f.vec_ad.len() {
        let initial = f.vec_ad[vec_id].initial.clone();
        for (elem, (t, idx)) in initial.iter().enumerate() {
            for k in order_lo..=order_up {
                let v = arg_coeff(f, *t, *idx, k);
                f.vec_store.set(vec_id, elem, k, v);
            }
        }
    }
}

/// Records `v` as a numeric anomaly if [ADfn::set_check_for_nan] is on.
/// Never aborts the sweep; the driver inspects `nan_detected()` after it
/// finishes (spec.md §4.C propagation policy).
#[inline]
fn check_nan<V: Base>(f: &mut ADfn<V>, v: V) {
    if f.check_for_nan && v.is_nan() {
        f.nan_detected = true;
    }
}

fn trace_line<V: Base>(trace: bool, res: usize, value: V, op_id: u8, args: &[u32]) {
    if trace {
        println!("{}, {}, {}, {:?}", res, value, crate::function::to_src::op_name(op_id), args);
    }
}

fn sweep<V: Base + AtomRegistry + CheckpointRegistry>(
    f: &mut ADfn<V>,
    order_lo: usize,
    order_up: usize,
    trace: bool,
) {
    if trace {
        println!("Begin Trace: forward, order_lo = {order_lo}, order_up = {order_up}");
        println!("var_index, value, op_name, arg");
    }
    for op in 0..f.var.n_op() {
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
            for k in order_lo..=order_up {
                let x_row: Vec<V> = (0..=k).map(|j| arg_coeff(f, xt, xi, j)).collect();
                let y_row: Vec<V> = (0..=k).map(|j| arg_coeff(f, yt, yi, j)).collect();
                let mut z_row: Vec<V> = (0..=k).map(|j| f.taylor.get(res, j)).collect();
                recur::binary_forward(op_id, k, &x_row, &y_row, &mut z_row);
                f.taylor.set(res, k, z_row[k]);
                check_nan(f, z_row[k]);
            }
            trace_line(trace, res, f.taylor.get(res, order_up), op_id, args);
            continue;
        }

        if id::is_unary(op_id) {
            if recur::requires_low_order(op_id) {
                assert!(order_up <= 1, "forward: order {order_up} not implemented for this op");
            }
            let args = f.var.args(op);
            let types = f.var.arg_types(op);
            let (xt, xi) = (types[0], args[0]);
            let companion = res + 1;
            for k in order_lo..=order_up {
                let x_row: Vec<V> = (0..=k).map(|j| arg_coeff(f, xt, xi, j)).collect();
                let mut z_row: Vec<V> = (0..=k).map(|j| f.taylor.get(res, j)).collect();
                let mut w_row: Vec<V> = (0..=k).map(|j| f.taylor.get(companion, j)).collect();
                recur::unary_forward(op_id, k, &x_row, &mut z_row, &mut w_row);
                f.taylor.set(res, k, z_row[k]);
                check_nan(f, z_row[k]);
                if id::n_res(op_id) == 2 {
                    f.taylor.set(companion, k, w_row[k]);
                    check_nan(f, w_row[k]);
                }
            }
            trace_line(trace, res, f.taylor.get(res, order_up), op_id, args);
            continue;
        }

        match op_id {
            id::LT_OP | id::LE_OP | id::EQ_OP | id::NE_OP | id::GE_OP | id::GT_OP => {
                let args = f.var.args(op);
                let types = f.var.arg_types(op);
                let meta = f.var.meta(op);
                let a = arg_coeff(f, types[0], args[0], 0).to_f64();
                let b = arg_coeff(f, types[1], args[1], 0).to_f64();
                let recorded = meta[1] != 0;
                let now = crate::ad::CompareOp::holds_from_code(meta[0], a, b);
                if now != recorded {
                    f.compare_change_count += 1;
                    if f.compare_change_op_index.is_none() {
                        f.compare_change_op_index = Some(op);
                    }
                }
                if trace {
                    println!("{res}, (compare), now={now}, recorded={recorded}, {args:?}");
                }
            }
            id::COND_EXP_OP => {
                let args = f.var.args(op);
                let types = f.var.arg_types(op);
                let meta = f.var.meta(op);
                let l = arg_coeff(f, types[0], args[0], 0).to_f64();
                let r = arg_coeff(f, types[1], args[1], 0).to_f64();
                let now = crate::ad::CompareOp::holds_from_code(meta[0], l, r);
                let (wt, wi) = if now { (types[2], args[2]) } else { (types[3], args[3]) };
                for k in order_lo..=order_up {
                    f.taylor.set(res, k, arg_coeff(f, wt, wi, k));
                }
                trace_line(trace, res, f.taylor.get(res, order_up), op_id, args);
            }
            id::LOAD_OP => {
                let args = f.var.args(op);
                let types = f.var.arg_types(op);
                let meta = f.var.meta(op);
                let vec_id = meta[0] as usize;
                let length = f.vec_ad[vec_id].length;
                let index = indexed_vec::resolve_index(
                    arg_coeff(f, types[0], args[0], 0).to_f64(),
                    length,
                );
                for k in order_lo..=order_up {
                    f.taylor.set(res, k, f.vec_store.get(vec_id, index, k));
                }
                trace_line(trace, res, f.taylor.get(res, order_up), op_id, args);
            }
            id::STORE_OP => {
                let args = f.var.args(op);
                let types = f.var.arg_types(op);
                let meta = f.var.meta(op);
                let vec_id = meta[0] as usize;
                let length = f.vec_ad[vec_id].length;
                let index = indexed_vec::resolve_index(
                    arg_coeff(f, types[0], args[0], 0).to_f64(),
                    length,
                );
                for k in order_lo..=order_up {
                    let v = arg_coeff(f, types[1], args[1], k);
                    f.vec_store.set(vec_id, index, k, v);
                }
                if trace {
                    let v = f.vec_store.get(vec_id, index, order_up);
                    println!("{res}, {v}, store(vec_id={vec_id}, index={index}), {args:?}");
                }
            }
            id::CALL_OP => {
                let args = f.var.args(op).to_vec();
                let types = f.var.arg_types(op).to_vec();
                let meta = f.var.meta(op);
                let call_id = meta[0];
                let is_checkpoint = meta[1] != 0;
                let res_range = f.var.res_range(op);
                let x_full: Vec<Vec<V>> = args
                    .iter()
                    .zip(types.iter())
                    .map(|(&a, &t)| (0..=order_up).map(|k| arg_coeff(f, t, a, k)).collect())
                    .collect();
                let y_rows: Vec<Vec<V>> = if is_checkpoint {
                    crate::checkpoint::call_forward::<V>(call_id, &x_full, order_up)
                } else {
                    let x_window: Vec<Vec<V>> =
                        x_full.iter().map(|row| row[order_lo..=order_up].to_vec()).collect();
                    crate::atom::with_atom::<V, _>(call_id, |info| {
                        (info.forward)(&x_window, order_lo, order_up)
                    })
                };
                for (j, row) in y_rows.iter().enumerate() {
                    let var = res_range.start + j;
                    for k in order_lo..=order_up {
                        let v = if is_checkpoint { row[k] } else { row[k - order_lo] };
                        f.taylor.set(var, k, v);
                        check_nan(f, v);
                    }
                }
                if trace {
                    for (j, _) in y_rows.iter().enumerate() {
                        let var = res_range.start + j;
                        println!("{}, {}, call(id={call_id}), {:?}", var, f.taylor.get(var, order_up), args);
                    }
                }
            }
            id::PRINT_OP | id::CUMSUM_OP | id::CSKIP_OP => {
                // trace-only / optimizer-introduced ops: no-ops here.
                if trace {
                    println!("{res}, (no-op), {}, {:?}", crate::function::to_src::op_name(op_id), f.var.args(op));
                }
            }
            _ => unreachable!("unhandled opcode {op_id} in forward sweep"),
        }
    }
    if trace {
        println!("End Trace: forward");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tape::{start_recording, stop_recording};

    #[test]
    fn forward_order_zero_matches_recorded_value() {
        let x = start_recording(vec![2.0_f64, 3.0]);
        let y = &x[0] * &x[1] + crate::ad::sin(&x[0]);
        let mut f = stop_recording(vec![y]).unwrap();
        let out = forward(&mut f, 0, 0, &[2.0, 3.0], false);
        assert!((out[0] - (2.0 * 3.0 + 2.0_f64.sin())).abs() < 1e-12);
    }

    #[test]
    fn check_for_nan_flags_without_aborting() {
        let x = start_recording(vec![-1.0_f64]);
        let y = crate::ad::ln(&x[0]);
        let mut f = stop_recording(vec![y]).unwrap();
        f.set_check_for_nan(true);
        let out = forward(&mut f, 0, 0, &[-1.0], false);
        assert!(out[0].is_nan());
        assert!(f.nan_detected());
    }

    #[test]
    fn forward_order_one_is_directional_derivative() {
        let x = start_recording(vec![2.0_f64, 3.0]);
        let y = &x[0] * &x[1];
        let mut f = stop_recording(vec![y]).unwrap();
        let _ = forward(&mut f, 0, 0, &[2.0, 3.0], false);
        let out = forward(&mut f, 1, 1, &[1.0, 0.0], false);
        assert!((out[0] - 3.0).abs() < 1e-12);
    }

    #[test]
    fn forward_trace_does_not_change_the_result() {
        let x = start_recording(vec![2.0_f64, 3.0]);
        let y = &x[0] * &x[1] + crate::ad::sin(&x[0]);
        let mut f = stop_recording(vec![y]).unwrap();
        let out = forward(&mut f, 0, 0, &[2.0, 3.0], true);
        assert!((out[0] - (2.0 * 3.0 + 2.0_f64.sin())).abs() < 1e-12);
    }
}
