// SPDX-License-Identifier: EPL-2.0 OR GPL-2.0-or-later
// SPDX-FileCopyrightText: Bradley M. Bell <bradbell@seanet.com>
// SPDX-FileContributor: 2026 Bradley M. Bell
// ---------------------------------------------------------------------------
//! Removes `var` ops whose result never reaches a dependent, directly or
//! through another kept op's arguments. Independent declarations (`NO_OP`)
//! are always kept so [crate::function::ADfn::domain_len] and `ind_addr`
//! stay valid even when a particular independent turns out to be unused.
//!
//! The `dyp` sub-recording is left untouched (see DESIGN.md).
//!
//! Link to [parent module](super)
// ----------------------------------------------------------------------------
use crate::ad::ADType;
use crate::base::Base;
use crate::function::ADfn;
use crate::op::id;
use crate::tape::{IndexT, OpSequence};

pub fn eliminate_dead_code<V: Base>(f: &mut ADfn<V>) {
    let n_var = f.n_var();
    let n_op = f.var.n_op();
    let mut op_live = vec![false; n_op];
    let mut var_live = vec![false; n_var];

    for (i, ty) in f.range_ad_type.iter().enumerate() {
        if *ty == ADType::Variable {
            var_live[f.range_index[i] as usize] = true;
        }
    }

    for op in (0..n_op).rev() {
        let op_id = f.var.id_all[op];
        let range = f.var.res_range(op);
        let keep = op_id == id::NO_OP || range.clone().any(|v| var_live[v]);
        if !keep {
            continue;
        }
        op_live[op] = true;
        for (t, a) in f.var.arg_types(op).iter().zip(f.var.args(op).iter()) {
            if *t == ADType::Variable {
                var_live[*a as usize] = true;
            }
        }
    }

    let mut new_seq = OpSequence::new();
    new_seq.n_dom = f.var.n_dom;
    let mut remap = vec![0 as IndexT; n_var];
    let mut new_ind_addr = Vec::with_capacity(f.ind_addr.len());

    for op in 0..n_op {
        if !op_live[op] {
            continue;
        }
        let op_id = f.var.id_all[op];
        let args: Vec<(ADType, IndexT)> = f
            .var
            .arg_types(op)
            .iter()
            .zip(f.var.args(op).iter())
            .map(|(t, a)| if *t == ADType::Variable { (*t, remap[*a as usize]) } else { (*t, *a) })
            .collect();
        let meta = f.var.meta(op).to_vec();
        let n_res = (f.var.res_range(op).len()) as u8;
        let old_res = f.var.res_start[op] as usize;
        let new_res = new_seq.push_op(op_id, &args, &meta, n_res);
        for k in 0..n_res as usize {
            remap[old_res + k] = new_res + k as IndexT;
        }
    }
    for &old in &f.ind_addr {
        new_ind_addr.push(remap[old as usize]);
    }

    let new_range_index: Vec<IndexT> = f
        .range_ad_type
        .iter()
        .zip(f.range_index.iter())
        .map(|(t, idx)| if *t == ADType::Variable { remap[*idx as usize] } else { *idx })
        .collect();

    let new_n_var = new_seq.n_res();
    f.var = new_seq;
    f.ind_addr = new_ind_addr;
    f.range_index = new_range_index;
    f.taylor = crate::function::TaylorMat::new(new_n_var, f.taylor.cap().max(1));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::function::forward::forward;
    use crate::tape::{start_recording, stop_recording};

    #[test]
    fn unused_intermediate_is_removed() {
        let x = start_recording(vec![2.0_f64, 3.0]);
        let _unused = &x[0] + &x[1];
        let y = &x[0] * &x[1];
        let mut f = stop_recording(vec![y]).unwrap();
        let before = f.var.n_op();
        eliminate_dead_code(&mut f);
        assert!(f.var.n_op() < before);
        let out = forward(&mut f, 0, 0, &[2.0, 3.0], false);
        assert!((out[0] - 6.0).abs() < 1e-12);
    }
}
