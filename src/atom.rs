// SPDX-License-Identifier: EPL-2.0 OR GPL-2.0-or-later
// SPDX-FileCopyrightText: Bradley M. Bell <bradbell@seanet.com>
// SPDX-FileContributor: 2026 Bradley M. Bell
// ---------------------------------------------------------------------------
//! Atomic functions: user-supplied forward/reverse/sparsity callbacks that
//! extend the elementary operator set, recorded onto a tape as a single
//! [crate::op::id::CALL_OP] instead of being traced operation by operation.
//!
//! Registration is process-global (a `RwLock`, not thread-local): an
//! atomic, once registered, can be called from any thread's recording.
//!
//! Link to [parent module](super)
// ----------------------------------------------------------------------------
use crate::ad::{ADType, AD};
use crate::base::Base;
use crate::error::{Error, Result};
use crate::op::id;
use crate::tape::ThisThreadTape;
use crate::SparsityPattern;
use std::sync::RwLock;

/// `forward(x_p_to_q, order_lo, order_up)`: `x_p_to_q[i]` is the `i`-th
/// input's Taylor row for orders `order_lo..=order_up`; returns the same
/// shape for outputs.
pub type ForwardFn<V> = fn(x: &[Vec<V>], order_lo: usize, order_up: usize) -> Vec<Vec<V>>;

/// `reverse(x, y, weight, order_up)`: `x`/`y` are the full Taylor rows
/// (orders `0..=order_up`) recorded on the last `forward` call; `weight[j]`
/// is the adjoint row for output `j`. Returns the adjoint row for every
/// input.
pub type ReverseFn<V> = fn(x: &[Vec<V>], y: &[Vec<V>], weight: &[Vec<V>], order_up: usize) -> Vec<Vec<V>>;

pub type JacSparsityFn = fn(n_x: usize, n_y: usize, pattern_x: &SparsityPattern) -> SparsityPattern;

pub type HesSparsityFn =
    fn(n_x: usize, pattern_x: &SparsityPattern, select_y: &[bool]) -> SparsityPattern;

/// `for_type(domain_ad_type)`: given each input's [ADType], returns each
/// output's. The usual rule is that an output depending on several inputs
/// takes the maximum of their types (`Variable` dominates `DynamicP`
/// dominates `ConstantP`), matching how a plain elementary op's result type
/// is resolved when its operands disagree.
pub type ForwardTypeFn = fn(domain_ad_type: &[ADType]) -> Vec<ADType>;

pub struct AtomInfo<V> {
    pub name: &'static str,
    pub n_x: usize,
    pub n_y: usize,
    pub forward: ForwardFn<V>,
    pub reverse: ReverseFn<V>,
    pub jac_sparsity: JacSparsityFn,
    pub hes_sparsity: HesSparsityFn,
    pub for_type: ForwardTypeFn,
}

pub(crate) mod sealed {
    use super::AtomInfo;
    use std::sync::RwLock;

    pub trait AtomRegistry: Sized + 'static {
        fn registry() -> &'static RwLock<Vec<AtomInfo<Self>>>;
    }
}
pub use sealed::AtomRegistry;

macro_rules! impl_atom_registry {
    ($V:ty) => {
        static ATOM_REGISTRY: RwLock<Vec<AtomInfo<$V>>> = RwLock::new(Vec::new());
        impl $crate::atom::sealed::AtomRegistry for $V {
            fn registry() -> &'static RwLock<Vec<AtomInfo<$V>>> {
                &ATOM_REGISTRY
            }
        }
    };
}
pub(crate) use impl_atom_registry;

impl_atom_registry!(f64);

/// Registers an atomic function, returning its `atom_id` for use with
/// [call_atom].
pub fn register_atom<V: AtomRegistry>(info: AtomInfo<V>) -> u32 {
    let mut reg = V::registry().write().unwrap();
    reg.push(info);
    (reg.len() - 1) as u32
}

pub(crate) fn with_atom<V: AtomRegistry, R>(atom_id: u32, f: impl FnOnce(&AtomInfo<V>) -> R) -> R {
    let reg = V::registry().read().unwrap();
    f(&reg[atom_id as usize])
}

/// Records a call to a previously [register_atom]'d atomic function.
pub fn call_atom<V>(atom_id: u32, x: Vec<AD<V>>) -> Result<Vec<AD<V>>>
where
    V: Base + ThisThreadTape + AtomRegistry,
{
    let (n_x, n_y, name) = with_atom::<V, _>(atom_id, |info| (info.n_x, info.n_y, info.name));
    if x.len() != n_x {
        return Err(Error::AtomicFailed { atom_id, name });
    }
    let x_val: Vec<Vec<V>> = x.iter().map(|a| vec![a.to_value()]).collect();
    let y_val = with_atom::<V, _>(atom_id, |info| (info.forward)(&x_val, 0, 0));
    if y_val.len() != n_y {
        return Err(Error::AtomicFailed { atom_id, name });
    }

    let results = V::get().with(|cell| -> Vec<AD<V>> {
        let mut tape = cell.borrow_mut();
        if !tape.recording {
            return y_val.iter().map(|row| AD::constant(row[0])).collect();
        }
        let mut args = Vec::with_capacity(n_x);
        let mut any_var = false;
        for a in &x {
            let resolved = crate::ad::resolve_operand(&mut tape, a);
            any_var |= resolved.0 == ADType::Variable;
            args.push(resolved);
        }
        let tape_id = tape.tape_id;
        let range_ad_type = if any_var {
            let domain_ad_type: Vec<ADType> = args.iter().map(|(t, _)| *t).collect();
            let types = with_atom::<V, _>(atom_id, |info| (info.for_type)(&domain_ad_type));
            assert_eq!(types.len(), n_y, "atomic '{name}': for_type returned {} types for {n_y} outputs", types.len());
            types
        } else {
            vec![ADType::DynamicP; n_y]
        };
        let seq = if any_var { &mut tape.var } else { &mut tape.dyp };
        let meta = [atom_id, 0];
        let res = seq.push_op(id::CALL_OP, &args, &meta, n_y as u8);
        (0..n_y)
            .map(|j| AD::new(tape_id, res + j as u32, range_ad_type[j], y_val[j][0]))
            .collect()
    });
    Ok(results)
}
