// SPDX-License-Identifier: EPL-2.0 OR GPL-2.0-or-later
// SPDX-FileCopyrightText: Bradley M. Bell <bradbell@seanet.com>
// SPDX-FileContributor: 2026 Bradley M. Bell
// ---------------------------------------------------------------------------
//! This pub module defines [ADfn], the sealed recording plus its mutable
//! per-call workspace.
//!
//! Link to [parent module](super)
// ----------------------------------------------------------------------------
use crate::ad::ADType;
use crate::base::Base;
use crate::tape::{IndexT, OpSequence, VecAdDecl};

pub mod forward;
pub mod optimize;
pub mod reverse;
pub mod sparsity;
pub mod to_src;

/// Row-major matrix of Taylor coefficients, one row per variable, one
/// column per order. Single direction (`n_dir == 1`): extending the
/// column layout to `(cap-1)*n_dir+1` for the multi-direction variant is
/// not implemented in this crate (see DESIGN.md).
#[derive(Clone, Debug, Default)]
pub struct TaylorMat<V> {
    data: Vec<V>,
    n_var: usize,
    cap: usize,
    pub order_current: Option<usize>,
}

impl<V: Base> TaylorMat<V> {
    pub fn new(n_var: usize, cap: usize) -> Self {
        TaylorMat {
            data: vec![V::zero(); n_var * cap],
            n_var,
            cap,
            order_current: None,
        }
    }

    pub fn cap(&self) -> usize {
        self.cap
    }

    pub fn n_var(&self) -> usize {
        self.n_var
    }

    #[inline]
    pub fn get(&self, var: usize, order: usize) -> V {
        if order >= self.cap {
            return V::zero();
        }
        self.data[var * self.cap + order]
    }

    #[inline]
    pub fn set(&mut self, var: usize, order: usize, v: V) {
        self.data[var * self.cap + order] = v;
    }

    /// Contracts or extends the column dimension to `c`, without
    /// touching row count. `c == 0` frees the buffer.
    pub fn capacity_order(&mut self, c: usize) {
        if c == 0 {
            self.data.clear();
            self.cap = 0;
            self.order_current = None;
            return;
        }
        let mut new_data = vec![V::zero(); self.n_var * c];
        let keep = c.min(self.cap);
        for i in 0..self.n_var {
            for k in 0..keep {
                new_data[i * c + k] = self.data[i * self.cap + k];
            }
        }
        self.data = new_data;
        self.cap = c;
        if let Some(cur) = self.order_current {
            self.order_current = Some(cur.min(c.saturating_sub(1)));
        }
    }
}

/// Adjoint matrix used by the reverse sweep: one row per variable, one
/// column per order 0..=d.
#[derive(Clone, Debug)]
pub struct PartialMat<V> {
    data: Vec<V>,
    n_var: usize,
    n_col: usize,
}

impl<V: Base> PartialMat<V> {
    pub fn new(n_var: usize, n_col: usize) -> Self {
        PartialMat {
            data: vec![V::zero(); n_var * n_col],
            n_var,
            n_col,
        }
    }

    pub fn n_var(&self) -> usize {
        self.n_var
    }

    pub fn n_col(&self) -> usize {
        self.n_col
    }

    #[inline]
    pub fn get(&self, var: usize, order: usize) -> V {
        self.data[var * self.n_col + order]
    }

    #[inline]
    pub fn set(&mut self, var: usize, order: usize, v: V) {
        self.data[var * self.n_col + order] = v;
    }

    #[inline]
    pub fn add(&mut self, var: usize, order: usize, v: V) {
        let i = var * self.n_col + order;
        self.data[i] = self.data[i] + v;
    }
}

/// Immutable snapshot of a finished recording, plus mutable per-call
/// workspace. `V` is the *Base* type; see [crate::base::Base].
#[derive(Clone)]
pub struct ADfn<V> {
    pub(crate) dyp: OpSequence,
    pub(crate) var: OpSequence,
    pub(crate) cop: Vec<V>,
    pub(crate) vec_ad: Vec<VecAdDecl>,
    pub(crate) ind_addr: Vec<IndexT>,

    pub(crate) range_ad_type: Vec<ADType>,
    pub(crate) range_index: Vec<IndexT>,

    // mutable workspace
    pub(crate) dyn_val: Vec<V>,
    pub(crate) taylor: TaylorMat<V>,
    pub(crate) sparsity: Option<crate::sparsity::Pattern>,
    pub(crate) compare_change_count: usize,
    pub(crate) compare_change_op_index: Option<usize>,
    pub(crate) check_for_nan: bool,
    pub(crate) nan_detected: bool,
    /// Current contents of every declared indexed vector.
    pub(crate) vec_store: crate::indexed_vec::VecStore<V>,
}

impl<V: Base> ADfn<V> {
    pub(crate) fn new(
        dyp: OpSequence,
        var: OpSequence,
        cop: Vec<V>,
        dyn_val: Vec<V>,
        vec_ad: Vec<VecAdDecl>,
        ind_addr: Vec<IndexT>,
        range_ad_type: Vec<ADType>,
        range_index: Vec<IndexT>,
    ) -> Self {
        let n_var = var.n_res();
        let vec_store = crate::indexed_vec::VecStore::init(&vec_ad, 1);
        ADfn {
            dyp,
            var,
            cop,
            vec_ad,
            ind_addr,
            range_ad_type,
            range_index,
            dyn_val,
            taylor: TaylorMat::new(n_var, 1),
            sparsity: None,
            compare_change_count: 0,
            compare_change_op_index: None,
            check_for_nan: false,
            nan_detected: false,
            vec_store,
        }
    }

    pub fn domain_len(&self) -> usize {
        self.var.n_dom
    }

    pub fn range_len(&self) -> usize {
        self.range_ad_type.len()
    }

    pub fn n_var(&self) -> usize {
        self.var.n_res()
    }

    pub fn range_ad_type(&self, i: usize) -> ADType {
        self.range_ad_type[i]
    }

    pub fn compare_change_count(&self) -> usize {
        self.compare_change_count
    }

    pub fn compare_change_op_index(&self) -> Option<usize> {
        self.compare_change_op_index
    }

    pub fn set_check_for_nan(&mut self, on: bool) {
        self.check_for_nan = on;
    }

    pub fn nan_detected(&self) -> bool {
        self.nan_detected
    }

    /// Resizes the Taylor-coefficient workspace's column capacity to `c`
    /// without touching any other state. `c == 0` frees the buffer.
    pub fn capacity_order(&mut self, c: usize) {
        self.taylor.capacity_order(c);
        self.vec_store.capacity_order(c);
    }

    /// Updates the cached values of every dynamic parameter and replays
    /// the `dyp` sub-recording so dependent dynamic values are current.
    pub fn new_dynamic(&mut self, p: Vec<V>) {
        assert_eq!(
            p.len(),
            self.dyp.n_dom,
            "new_dynamic: wrong number of dynamic parameters"
        );
        self.dyn_val[..p.len()].copy_from_slice(&p);
        crate::function::forward::replay_dyp(self);
    }

    /// Returns an optimized copy of this recording. `options` is a
    /// space-separated list of tokens from a fixed set; an unrecognized
    /// token fails with [crate::error::Error::BadOption] rather than being
    /// silently ignored.
    ///
    /// Every token is currently accepted (each names a pass this crate
    /// either always runs or never runs), but only dead-code elimination
    /// is actually implemented; the rest are no-ops reserved for a future
    /// optimizer pass (see DESIGN.md).
    pub fn optimize(&self, options: &str) -> crate::error::Result<Self> {
        const KNOWN: &[&str] = &[
            "no_conditional_skip",
            "no_compare_op",
            "no_print_for_op",
            "no_cumulative_sum_op",
            "val_graph",
        ];
        for tok in options.split_whitespace() {
            if !KNOWN.contains(&tok) {
                return Err(crate::error::Error::BadOption(tok.to_string()));
            }
        }
        let mut out = self.clone();
        crate::function::optimize::eliminate_dead_code(&mut out);
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn taylor_mat_capacity_order_preserves_lower_orders() {
        let mut m: TaylorMat<f64> = TaylorMat::new(2, 1);
        m.set(0, 0, 3.0);
        m.set(1, 0, 4.0);
        m.capacity_order(3);
        assert_eq!(m.get(0, 0), 3.0);
        assert_eq!(m.get(1, 0), 4.0);
        assert_eq!(m.get(0, 1), 0.0);
        m.capacity_order(0);
        assert_eq!(m.cap(), 0);
    }

    #[test]
    fn optimize_rejects_unknown_token() {
        let x = crate::tape::start_recording(vec![2.0_f64, 3.0]);
        let y = &x[0] * &x[1];
        let f = crate::tape::stop_recording(vec![y]).unwrap();
        let err = f.optimize("no_conditional_skip made_up_token").unwrap_err();
        assert_eq!(err, crate::error::Error::BadOption("made_up_token".to_string()));
    }

    #[test]
    fn optimize_runs_dead_code_elimination() {
        let x = crate::tape::start_recording(vec![2.0_f64, 3.0]);
        let _unused = &x[0] + &x[1];
        let y = &x[0] * &x[1];
        let f = crate::tape::stop_recording(vec![y]).unwrap();
        let before = f.var.n_op();
        let mut g = f.optimize("no_conditional_skip no_compare_op").unwrap();
        assert!(g.var.n_op() < before);
        let out = crate::function::forward::forward(&mut g, 0, 0, &[2.0, 3.0], false);
        assert!((out[0] - 6.0).abs() < 1e-12);
    }
}
