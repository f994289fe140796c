// SPDX-License-Identifier: EPL-2.0 OR GPL-2.0-or-later
// SPDX-FileCopyrightText: Bradley M. Bell <bradbell@seanet.com>
// SPDX-FileContributor: 2026 Bradley M. Bell
// ---------------------------------------------------------------------------
//! Checkpointing: wraps a sealed [crate::function::ADfn] as a single
//! [crate::op::id::CALL_OP] on an enclosing recording, so its internal
//! operation sequence never has to be retraced (or kept in memory
//! alongside the outer tape) every time it is called.
//!
//! Grounded the same way [crate::atom] extends the elementary operator
//! set, but the callback state is an owned `ADfn` rather than a pair of
//! free functions, so checkpoints get their own process-global registry
//! instead of reusing `atom::AtomInfo`'s function-pointer slots.
//!
//! Link to [parent module](super)
// ----------------------------------------------------------------------------
use crate::ad::{resolve_operand, ADType, AD};
use crate::atom::AtomRegistry;
use crate::base::Base;
use crate::error::{Error, Result};
use crate::function::ADfn;
use crate::op::id;
use crate::tape::ThisThreadTape;
use std::sync::{Mutex, RwLock};

pub(crate) mod sealed {
    use super::ADfn;
    use std::sync::RwLock;

    pub trait CheckpointRegistry: Sized + 'static {
        fn registry() -> &'static RwLock<Vec<std::sync::Mutex<ADfn<Self>>>>;
    }
}
pub use sealed::CheckpointRegistry;

macro_rules! impl_checkpoint_registry {
    ($V:ty) => {
        static CHECKPOINT_REGISTRY: RwLock<Vec<Mutex<ADfn<$V>>>> = RwLock::new(Vec::new());
        impl $crate::checkpoint::sealed::CheckpointRegistry for $V {
            fn registry() -> &'static RwLock<Vec<Mutex<ADfn<$V>>>> {
                &CHECKPOINT_REGISTRY
            }
        }
    };
}
pub(crate) use impl_checkpoint_registry;

impl_checkpoint_registry!(f64);

/// Registers `f` as a checkpoint, returning the id later passed to
/// [call_checkpoint].
pub fn register_checkpoint<V: CheckpointRegistry>(f: ADfn<V>) -> u32 {
    let mut reg = V::registry().write().unwrap();
    reg.push(Mutex::new(f));
    (reg.len() - 1) as u32
}

/// Records a call to a previously [register_checkpoint]'d function.
pub fn call_checkpoint<V>(check_id: u32, x: Vec<AD<V>>) -> Result<Vec<AD<V>>>
where
    V: Base + ThisThreadTape + CheckpointRegistry + AtomRegistry,
{
    let (n_x, n_y) = {
        let reg = V::registry().read().unwrap();
        let f = reg[check_id as usize].lock().unwrap();
        (f.domain_len(), f.range_len())
    };
    if x.len() != n_x {
        return Err(Error::AtomicFailed { atom_id: check_id, name: "checkpoint" });
    }
    let x_val: Vec<V> = x.iter().map(|a| a.to_value()).collect();
    let y_val = {
        let reg = V::registry().read().unwrap();
        let mut f = reg[check_id as usize].lock().unwrap();
        f.capacity_order(0);
        f.capacity_order(1);
        crate::function::forward::forward(&mut f, 0, 0, &x_val, false)
    };
    if y_val.len() != n_y {
        return Err(Error::AtomicFailed { atom_id: check_id, name: "checkpoint" });
    }

    let results = V::get().with(|cell| -> Vec<AD<V>> {
        let mut tape = cell.borrow_mut();
        if !tape.recording {
            return y_val.iter().map(|v| AD::constant(*v)).collect();
        }
        let mut args = Vec::with_capacity(n_x);
        let mut any_var = false;
        for a in &x {
            let resolved = resolve_operand(&mut tape, a);
            any_var |= resolved.0 == ADType::Variable;
            args.push(resolved);
        }
        let tape_id = tape.tape_id;
        let ad_type = if any_var { ADType::Variable } else { ADType::DynamicP };
        let seq = if any_var { &mut tape.var } else { &mut tape.dyp };
        let meta = [check_id, 1];
        let res = seq.push_op(id::CALL_OP, &args, &meta, n_y as u8);
        (0..n_y)
            .map(|j| AD::new(tape_id, res + j as u32, ad_type, y_val[j]))
            .collect()
    });
    Ok(results)
}

/// Re-runs the checkpointed `ADfn`'s own forward sweep from order 0
/// through `order_up` for `x_rows` (full `0..=order_up` history, one row
/// per input), returning the outputs in the same layout.
///
/// The registry holds one shared instance per `check_id`, so every call
/// starts over at order 0 rather than trying to extend whatever order
/// range a previous, unrelated call site left behind.
pub(crate) fn call_forward<V>(check_id: u32, x_rows: &[Vec<V>], order_up: usize) -> Vec<Vec<V>>
where
    V: Base + CheckpointRegistry + AtomRegistry,
{
    let reg = V::registry().read().unwrap();
    let mut f = reg[check_id as usize].lock().unwrap();
    f.capacity_order(0);
    f.capacity_order(order_up + 1);
    let n_dom = x_rows.len();
    let mut x_flat = vec![V::zero(); (order_up + 1) * n_dom];
    for k in 0..=order_up {
        for (j, row) in x_rows.iter().enumerate() {
            x_flat[k * n_dom + j] = row[k];
        }
    }
    let y_flat = crate::function::forward::forward(&mut f, 0, order_up, &x_flat, false);
    let n_y = f.range_len();
    (0..n_y).map(|i| (0..=order_up).map(|k| y_flat[k * n_y + i]).collect()).collect()
}

/// Runs the checkpointed `ADfn`'s own reverse sweep against `weight_rows`
/// (one row per output, orders `0..=order_up`). Must be called immediately
/// after [call_forward] refreshed this `check_id`'s shared instance with
/// the matching `x_rows`, since nothing else protects that instance's
/// internal Taylor state from a concurrent or later caller.
pub(crate) fn call_reverse<V>(check_id: u32, order_up: usize, weight_rows: &[Vec<V>]) -> Vec<V>
where
    V: Base + CheckpointRegistry + AtomRegistry,
{
    let reg = V::registry().read().unwrap();
    let f = reg[check_id as usize].lock().unwrap();
    let n_y = weight_rows.len();
    let mut weight_flat = vec![V::zero(); (order_up + 1) * n_y];
    for k in 0..=order_up {
        for (i, row) in weight_rows.iter().enumerate() {
            weight_flat[k * n_y + i] = row[k];
        }
    }
    crate::function::reverse::reverse(&f, order_up, &weight_flat, false)
}
