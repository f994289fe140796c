// SPDX-License-Identifier: EPL-2.0 OR GPL-2.0-or-later
// SPDX-FileCopyrightText: Bradley M. Bell <bradbell@seanet.com>
// SPDX-FileContributor: 2026 Bradley M. Bell
// ---------------------------------------------------------------------------
//! This pub module defines the per-thread recording (the *tape*).
//!
//! Link to [parent module](super)
// ----------------------------------------------------------------------------
use crate::ad::{AD, ADType};
use crate::error::{Error, Result};
use crate::function::ADfn;
use rustc_hash::FxHashMap;
use std::sync::Mutex;

pub use crate::types::IndexT;

/// Declares an indexed vector's initial contents; see [crate::indexed_vec].
#[derive(Clone, Debug)]
pub struct VecAdDecl {
    pub length: usize,
    pub initial: Vec<(ADType, IndexT)>,
}

/// One recorded operation sequence: either the dynamic-parameter
/// sub-recording (`dyp`) or the variable recording (`var`) of a [Tape].
#[derive(Clone, Debug, Default)]
pub struct OpSequence {
    /// Number of `Independent`/dynamic inputs this sequence was opened with.
    pub n_dom: usize,
    /// Opcode of every recorded op, in tape order.
    pub id_all: Vec<u8>,
    /// `arg_start[k] .. arg_start[k+1]` indexes `arg_all`/`arg_type_all`
    /// for op `k`. Length is `id_all.len() + 1`.
    pub arg_start: Vec<IndexT>,
    /// Flat argument slot indices; meaning of each entry is given by the
    /// parallel `arg_type_all` entry.
    pub arg_all: Vec<IndexT>,
    /// Parallel to `arg_all`: where that argument's value lives.
    pub arg_type_all: Vec<ADType>,
    /// `meta_start[k] .. meta_start[k+1]` indexes `meta_all` for op `k`.
    /// Small per-op integers whose meaning is opcode-specific: a
    /// `CompareOp` relation code, an atomic `atom_id`/`call_id` pair, an
    /// indexed-vector id, a recorded compare outcome (0/1). Length is
    /// `id_all.len() + 1`.
    pub meta_start: Vec<IndexT>,
    pub meta_all: Vec<u32>,
    /// `res_start[k] .. res_start[k+1]` is the range of result slots op
    /// `k` produced (0, 1, or 2 slots). Length is `id_all.len() + 1`.
    pub res_start: Vec<IndexT>,
}

impl OpSequence {
    pub fn new() -> Self {
        OpSequence {
            n_dom: 0,
            id_all: Vec::new(),
            arg_start: vec![0],
            arg_all: Vec::new(),
            arg_type_all: Vec::new(),
            meta_start: vec![0],
            meta_all: Vec::new(),
            res_start: vec![0],
        }
    }

    pub fn n_op(&self) -> usize {
        self.id_all.len()
    }

    pub fn n_res(&self) -> usize {
        *self.res_start.last().unwrap() as usize
    }

    /// Records one operation; returns the index of its first result slot.
    pub fn push_op(
        &mut self,
        id: u8,
        args: &[(ADType, IndexT)],
        meta: &[u32],
        n_res: u8,
    ) -> IndexT {
        self.id_all.push(id);
        for (t, idx) in args {
            self.arg_type_all.push(*t);
            self.arg_all.push(*idx);
        }
        self.arg_start.push(self.arg_all.len() as IndexT);
        self.meta_all.extend_from_slice(meta);
        self.meta_start.push(self.meta_all.len() as IndexT);
        let res = *self.res_start.last().unwrap();
        self.res_start.push(res + n_res as IndexT);
        res
    }

    pub fn args(&self, op: usize) -> &[IndexT] {
        let lo = self.arg_start[op] as usize;
        let hi = self.arg_start[op + 1] as usize;
        &self.arg_all[lo..hi]
    }

    pub fn arg_types(&self, op: usize) -> &[ADType] {
        let lo = self.arg_start[op] as usize;
        let hi = self.arg_start[op + 1] as usize;
        &self.arg_type_all[lo..hi]
    }

    pub fn meta(&self, op: usize) -> &[u32] {
        let lo = self.meta_start[op] as usize;
        let hi = self.meta_start[op + 1] as usize;
        &self.meta_all[lo..hi]
    }

    pub fn res_range(&self, op: usize) -> std::ops::Range<usize> {
        self.res_start[op] as usize..self.res_start[op + 1] as usize
    }
}

/// A live per-thread recording. One instance exists per thread per
/// concrete `Base` type, owned by that thread's [sealed::ThisThreadTape]
/// storage.
pub struct Tape<V> {
    pub dyp: OpSequence,
    pub var: OpSequence,
    pub recording: bool,
    pub tape_id: usize,
    pub cop: Vec<V>,
    cop_index: FxHashMap<u64, IndexT>,
    pub dyn_val: Vec<V>,
    pub vec_ad: Vec<VecAdDecl>,
    pub ind_addr: Vec<IndexT>,
    pub compare_change_count: usize,
}

impl<V: crate::base::Base> Tape<V> {
    pub fn new() -> Self {
        Tape {
            dyp: OpSequence::new(),
            var: OpSequence::new(),
            recording: false,
            tape_id: 0,
            cop: Vec::new(),
            cop_index: FxHashMap::default(),
            dyn_val: Vec::new(),
            vec_ad: Vec::new(),
            ind_addr: Vec::new(),
            compare_change_count: 0,
        }
    }

    /// Interns `v` into the constant pool by bit pattern, not numeric
    /// equality, so `NaN` is still recordable. Returns an existing index
    /// if a bit-identical value is already present.
    pub fn put_con_par(&mut self, v: V) -> IndexT {
        let bits = v.to_bits_u64();
        if let Some(&idx) = self.cop_index.get(&bits) {
            return idx;
        }
        let idx = self.cop.len() as IndexT;
        self.cop.push(v);
        self.cop_index.insert(bits, idx);
        idx
    }
}

impl<V: crate::base::Base> Default for Tape<V> {
    fn default() -> Self {
        Self::new()
    }
}

static NEXT_TAPE_ID: Mutex<usize> = Mutex::new(1);

pub(crate) mod sealed {
    use super::Tape;
    use std::cell::RefCell;
    use std::thread::LocalKey;

    /// Implemented once per concrete `Base` type via
    /// [super::impl_this_thread_tape]; gives access to that type's
    /// thread-local tape slot.
    pub trait ThisThreadTape: Sized + 'static {
        fn get() -> &'static LocalKey<RefCell<Tape<Self>>>;
    }
}
pub use sealed::ThisThreadTape;

/// Declares the thread-local tape storage for one concrete `Base` type.
///
/// ```ignore
/// impl_this_thread_tape!(f64);
/// ```
macro_rules! impl_this_thread_tape {
    ($V:ty) => {
        thread_local! {
            static THIS_THREAD_TAPE: std::cell::RefCell<$crate::tape::Tape<$V>> =
                std::cell::RefCell::new($crate::tape::Tape::new());
        }
        impl $crate::tape::sealed::ThisThreadTape for $V {
            fn get() -> &'static std::thread::LocalKey<std::cell::RefCell<$crate::tape::Tape<$V>>> {
                &THIS_THREAD_TAPE
            }
        }
    };
}
pub(crate) use impl_this_thread_tape;

impl_this_thread_tape!(f64);

/// Begins recording: marks the calling thread's tape active and returns
/// the independent variables `x` promoted to [AD] with `ADType::Variable`.
pub fn start_recording<V>(domain: Vec<V>) -> Vec<AD<V>>
where
    V: crate::base::Base + ThisThreadTape,
{
    let (_dyp, var) = start_recording_dyp(Vec::new(), domain);
    var
}

/// Same as [start_recording] but also declares dynamic parameters, whose
/// values can later be rebound without re-recording via `new_dynamic`.
pub fn start_recording_dyp<V>(dyp_dom: Vec<V>, var_dom: Vec<V>) -> (Vec<AD<V>>, Vec<AD<V>>)
where
    V: crate::base::Base + ThisThreadTape,
{
    let tape_id = {
        let mut next = NEXT_TAPE_ID.lock().unwrap();
        let id = *next;
        *next += 1;
        id
    };
    V::get().with(|cell| {
        let mut tape = cell.borrow_mut();
        assert!(!tape.recording, "a recording is already active on this thread");
        assert!(
            tape.var.n_op() == 0 && tape.dyp.n_op() == 0,
            "tape must be empty before starting a new recording"
        );
        tape.recording = true;
        tape.tape_id = tape_id;
        crate::ad::mark_tape_live(tape_id);
        tape.dyp.n_dom = dyp_dom.len();
        tape.var.n_dom = var_dom.len();

        let mut dyp_ad = Vec::with_capacity(dyp_dom.len());
        for v in dyp_dom {
            let res = tape.dyp.push_op(crate::op::id::NO_OP, &[], &[], 1);
            tape.dyn_val.push(v);
            dyp_ad.push(AD::new(tape_id, res, ADType::DynamicP, v));
        }
        let mut var_ad = Vec::with_capacity(var_dom.len());
        for v in var_dom {
            let res = tape.var.push_op(crate::op::id::NO_OP, &[], &[], 1);
            tape.ind_addr.push(res);
            var_ad.push(AD::new(tape_id, res, ADType::Variable, v));
        }
        (dyp_ad, var_ad)
    })
}

/// Stops recording and seals the tape into an immutable [ADfn].
pub fn stop_recording<V>(range: Vec<AD<V>>) -> Result<ADfn<V>>
where
    V: crate::base::Base + ThisThreadTape,
{
    V::get().with(|cell| {
        let mut tape = cell.borrow_mut();
        assert!(tape.recording, "no recording is active on this thread");

        let n_var = tape.var.n_res();
        let n_dyp = tape.dyp.n_res();
        let max = IndexT::MAX as u64;
        if n_var as u64 > max || n_dyp as u64 > max {
            return Err(Error::CapacityExceeded {
                requested: n_var.max(n_dyp) as u64,
                max,
            });
        }

        let mut range_ad_type = Vec::with_capacity(range.len());
        let mut range_index = Vec::with_capacity(range.len());
        for ad in &range {
            if ad.tape_id() == tape.tape_id && ad.ad_type() != ADType::ConstantP {
                range_ad_type.push(ad.ad_type());
                range_index.push(ad.index());
            } else {
                // Value from a different (or no) tape: treat as a constant.
                let idx = tape.put_con_par(ad.to_value());
                range_ad_type.push(ADType::ConstantP);
                range_index.push(idx);
            }
        }

        let dyp = std::mem::take(&mut tape.dyp);
        let var = std::mem::take(&mut tape.var);
        let cop = std::mem::take(&mut tape.cop);
        let dyn_val = std::mem::take(&mut tape.dyn_val);
        let vec_ad = std::mem::take(&mut tape.vec_ad);
        let ind_addr = std::mem::take(&mut tape.ind_addr);

        tape.recording = false;
        crate::ad::mark_tape_dead(tape.tape_id);
        *tape = Tape::new();

        Ok(ADfn::new(
            dyp,
            var,
            cop,
            dyn_val,
            vec_ad,
            ind_addr,
            range_ad_type,
            range_index,
        ))
    })
}

/// Abandons a recording in progress: discards the tape so any
/// outstanding active scalars from it become constants on next use.
pub fn abort_recording<V>()
where
    V: crate::base::Base + ThisThreadTape,
{
    V::get().with(|cell| {
        let mut tape = cell.borrow_mut();
        crate::ad::mark_tape_dead(tape.tape_id);
        *tape = Tape::new();
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn con_par_interns_by_bit_pattern() {
        let mut tape: Tape<f64> = Tape::new();
        let i0 = tape.put_con_par(1.0);
        let i1 = tape.put_con_par(1.0);
        assert_eq!(i0, i1);
        let nan0 = tape.put_con_par(f64::NAN);
        let nan1 = tape.put_con_par(f64::NAN);
        assert_eq!(nan0, nan1);
        assert_ne!(i0, nan0);
    }

    #[test]
    fn start_stop_recording_roundtrip() {
        let x = start_recording(vec![2.0_f64, 3.0]);
        let y = &x[0] * &x[1];
        let f = stop_recording(vec![y]).unwrap();
        assert_eq!(f.domain_len(), 2);
        assert_eq!(f.range_len(), 1);
    }
}
