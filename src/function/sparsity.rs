// SPDX-License-Identifier: EPL-2.0 OR GPL-2.0-or-later
// SPDX-FileCopyrightText: Bradley M. Bell <bradbell@seanet.com>
// SPDX-FileContributor: 2026 Bradley M. Bell
// ---------------------------------------------------------------------------
//! Sparsity sweeps: propagate a [crate::sparsity::Pattern] forward (which
//! independents can affect a given variable) or backward (which variables
//! can affect a given dependent) through the recorded operation sequence,
//! without touching any Taylor coefficient.
//!
//! Indexed-vector loads/stores use the conservative union over every store
//! to the vector, not a last-store-only (replay-order-dependent) rule:
//! this stays sound without tracking which store actually reached a given
//! load.
//!
//! Link to [parent module](super)
// ----------------------------------------------------------------------------
use super::ADfn;
use crate::ad::ADType;
use crate::base::Base;
use crate::op::id;
use crate::sparsity::Pattern;

/// Forward Jacobian sparsity: `pattern_out.row(v)` holds the independent
/// indices that may affect variable `v`'s value, for every recorded
/// variable `v` (seeded from `pattern_in`, one row per independent).
fn stored_vars_by_vec<V: Base>(f: &ADfn<V>) -> Vec<Vec<usize>> {
    let mut stored: Vec<Vec<usize>> = vec![Vec::new(); f.vec_ad.len()];
    for op in 0..f.var.n_op() {
        if f.var.id_all[op] != id::STORE_OP {
            continue;
        }
        let args = f.var.args(op);
        let types = f.var.arg_types(op);
        let meta = f.var.meta(op);
        if types[1] == ADType::Variable {
            stored[meta[0] as usize].push(args[1] as usize);
        }
    }
    stored
}

pub fn for_jac<V: Base>(f: &ADfn<V>, pattern_in: &Pattern, trace: bool) -> Pattern {
    assert_eq!(pattern_in.n_row(), f.domain_len());
    if trace {
        println!("Begin Trace: for_jac, n_dom = {}", f.domain_len());
    }
    let n_var = f.n_var();
    let mut out = Pattern::new(n_var, pattern_in.n_col());
    for j in 0..f.domain_len() {
        let var = f.ind_addr[j] as usize;
        for &col in pattern_in.row(j) {
            out.insert(var, col);
        }
    }
    let stored_vars = stored_vars_by_vec(f);

    for op in 0..f.var.n_op() {
        let op_id = f.var.id_all[op];
        if op_id == id::NO_OP {
            continue;
        }
        let res = f.var.res_start[op] as usize;
        let args = f.var.args(op);
        let types = f.var.arg_types(op);

        if op_id == id::LOAD_OP {
            let meta = f.var.meta(op);
            let vec_id = meta[0] as usize;
            for store_var in &stored_vars[vec_id] {
                out.union_row_into(res, *store_var);
            }
            if trace {
                println!("{res}, load(vec_id={vec_id}), {:?}", out.row(res));
            }
            continue;
        }
        for (t, a) in types.iter().zip(args.iter()) {
            if *t == ADType::Variable {
                out.union_row_into(res, *a as usize);
            }
        }
        if id::n_res(op_id) == 2 {
            for (t, a) in types.iter().zip(args.iter()) {
                if *t == ADType::Variable {
                    out.union_row_into(res + 1, *a as usize);
                }
            }
        }
        if trace {
            println!("{res}, {}, {:?}", crate::function::to_src::op_name(op_id), out.row(res));
        }
    }
    if trace {
        println!("End Trace: for_jac");
    }
    out
}

/// Reverse Jacobian sparsity: `pattern_out.row(j)` holds which requested
/// dependent rows (positions in `select_range`) independent `j` may
/// affect.
pub fn rev_jac<V: Base>(f: &ADfn<V>, select_range: &[bool], trace: bool) -> Pattern {
    assert_eq!(select_range.len(), f.range_len());
    if trace {
        println!("Begin Trace: rev_jac, n_select = {}", select_range.len());
    }
    let n_var = f.n_var();
    let n_select = select_range.len();
    let mut var_pat = Pattern::new(n_var, n_select);
    for (i, want) in select_range.iter().enumerate() {
        if *want && f.range_ad_type[i] == ADType::Variable {
            var_pat.insert(f.range_index[i] as usize, i);
        }
    }

    // Every load from a vector conservatively depends on every variable
    // ever stored to it (see module doc); fold that into the loads before
    // walking backward so LOAD_OP's dependency on earlier STORE_OPs is
    // visible to the per-op reverse union below.
    let stored_vars = stored_vars_by_vec(f);
    let mut load_extra: Vec<(usize, usize)> = Vec::new();
    for op in 0..f.var.n_op() {
        if f.var.id_all[op] == id::LOAD_OP {
            let vec_id = f.var.meta(op)[0] as usize;
            let res = f.var.res_start[op] as usize;
            for store_var in &stored_vars[vec_id] {
                load_extra.push((res, *store_var));
            }
        }
    }

    for op in (0..f.var.n_op()).rev() {
        let op_id = f.var.id_all[op];
        if op_id == id::NO_OP || op_id == id::STORE_OP {
            continue;
        }
        let res = f.var.res_start[op] as usize;
        let args = f.var.args(op);
        let types = f.var.arg_types(op);

        if op_id == id::LOAD_OP {
            for (load_res, store_var) in &load_extra {
                if *load_res == res {
                    var_pat.union_row_into(*store_var, res);
                }
            }
        }
        for (t, a) in types.iter().zip(args.iter()) {
            if *t == ADType::Variable {
                var_pat.union_row_into(*a as usize, res);
            }
        }
        if id::n_res(op_id) == 2 {
            for (t, a) in types.iter().zip(args.iter()) {
                if *t == ADType::Variable {
                    var_pat.union_row_into(*a as usize, res + 1);
                }
            }
        }
        if trace {
            println!("{res}, {}", crate::function::to_src::op_name(op_id));
        }
    }

    let mut result = Pattern::new(f.domain_len(), n_select);
    for j in 0..f.domain_len() {
        for &col in var_pat.row(f.ind_addr[j] as usize) {
            result.insert(j, col);
        }
    }
    if trace {
        println!("End Trace: rev_jac");
    }
    result
}

/// Forward Hessian sparsity for one dependent `y_i`: `(r, c)` is in the
/// result if independents `r` and `c` can both affect a *nonlinear*
/// operation on a path to `y_i`.
pub fn for_hes<V: Base>(
    f: &ADfn<V>,
    jac_forward: &Pattern,
    select_y: &[bool],
    trace: bool,
) -> crate::SparsityPattern {
    assert_eq!(select_y.len(), f.range_len());
    if trace {
        println!("Begin Trace: for_hes, n_select_y = {}", select_y.len());
    }
    let n_dom = f.domain_len();
    let mut hes = Pattern::new(n_dom, n_dom);
    for op in 0..f.var.n_op() {
        let op_id = f.var.id_all[op];
        if op_id == id::NO_OP || !id::is_nonlinear(op_id) {
            continue;
        }
        let res = f.var.res_start[op] as usize;
        let reachable = select_y.iter().enumerate().any(|(i, want)| {
            *want && f.range_ad_type[i] == ADType::Variable && f.range_index[i] as usize == res
        });
        if !reachable {
            continue;
        }
        let args = f.var.args(op);
        let types = f.var.arg_types(op);
        let mut dom_rows: Vec<usize> = Vec::new();
        for (t, a) in types.iter().zip(args.iter()) {
            if *t == ADType::Variable {
                for j in 0..n_dom {
                    if jac_forward.row(f.ind_addr[j] as usize).contains(&(*a as usize)) {
                        dom_rows.push(j);
                    }
                }
            }
        }
        for &r in &dom_rows {
            for &c in &dom_rows {
                hes.insert(r, c);
            }
        }
        if trace {
            println!("{res}, {}, dom_rows = {:?}", crate::function::to_src::op_name(op_id), dom_rows);
        }
    }
    if trace {
        println!("End Trace: for_hes, n_pair = {}", hes.to_pairs().len());
    }
    hes.to_pairs()
}

/// Reverse Hessian sparsity, computed as `for_hes` restricted by a
/// caller-supplied column selection (kept simple: delegates to
/// [for_hes] and filters, since both sweeps ultimately need the same
/// per-op nonlinearity scan).
pub fn rev_hes<V: Base>(
    f: &ADfn<V>,
    jac_forward: &Pattern,
    select_y: &[bool],
    select_x: &[bool],
    trace: bool,
) -> crate::SparsityPattern {
    assert_eq!(select_x.len(), f.domain_len());
    let pairs = for_hes(f, jac_forward, select_y, trace)
        .into_iter()
        .filter(|rc| select_x[rc[0]] && select_x[rc[1]])
        .collect();
    if trace {
        println!("rev_hes: filtered to {:?}", &pairs);
    }
    pairs
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tape::{start_recording, stop_recording};

    /// `f(x) = [x2, x0*x1]`: `for_jac_sparsity(I_3)` must reproduce each
    /// dependent's own argument list, and `rev_hes_sparsity` restricted to
    /// `y1` must find exactly the `x0`/`x1` cross term.
    #[test]
    fn sparsity_identity_and_cross_term() {
        let x = start_recording(vec![1.0_f64, 2.0, 3.0]);
        let y0 = x[2].clone();
        let y1 = &x[0] * &x[1];
        let f = stop_recording(vec![y0, y1]).unwrap();

        let mut pattern_in = Pattern::new(3, 3);
        for j in 0..3 {
            pattern_in.insert(j, j);
        }
        let jac = for_jac(&f, &pattern_in, false);

        let mut got_jac: Vec<[usize; 2]> = Vec::new();
        for i in 0..f.range_len() {
            let var = f.range_index[i] as usize;
            for &col in jac.row(var) {
                got_jac.push([i, col]);
            }
        }
        got_jac.sort();
        got_jac.dedup();
        assert_eq!(got_jac, vec![[0, 2], [1, 0], [1, 1]]);

        let select_y = [false, true];
        let select_x = [true, true, true];
        let mut got_hes = rev_hes(&f, &jac, &select_y, &select_x, false);
        got_hes.sort();
        got_hes.dedup();
        assert_eq!(got_hes, vec![[0, 1], [1, 0]]);
    }

    #[test]
    fn sparsity_trace_does_not_change_the_result() {
        let x = start_recording(vec![1.0_f64, 2.0]);
        let y = &x[0] * &x[1];
        let f = stop_recording(vec![y]).unwrap();
        let mut pattern_in = Pattern::new(2, 2);
        pattern_in.insert(0, 0);
        pattern_in.insert(1, 1);

        let jac_quiet = for_jac(&f, &pattern_in, false);
        let jac_traced = for_jac(&f, &pattern_in, true);
        let var = f.range_index[0] as usize;
        assert_eq!(jac_quiet.row(var), jac_traced.row(var));

        let select_range = [true];
        let rev_quiet = rev_jac(&f, &select_range, false);
        let rev_traced = rev_jac(&f, &select_range, true);
        assert_eq!(rev_quiet.row(0), rev_traced.row(0));

        let hes_quiet = for_hes(&f, &jac_quiet, &[true], false);
        let hes_traced = for_hes(&f, &jac_quiet, &[true], true);
        assert_eq!(hes_quiet, hes_traced);

        let select_x = [true, true];
        let rh_quiet = rev_hes(&f, &jac_quiet, &[true], &select_x, false);
        let rh_traced = rev_hes(&f, &jac_quiet, &[true], &select_x, true);
        assert_eq!(rh_quiet, rh_traced);
    }
}
