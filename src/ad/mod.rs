// SPDX-License-Identifier: EPL-2.0 OR GPL-2.0-or-later
// SPDX-FileCopyrightText: Bradley M. Bell <bradbell@seanet.com>
// SPDX-FileContributor: 2026 Bradley M. Bell
// ---------------------------------------------------------------------------
//! This pub module defines [AD], the active scalar type operator
//! overloading records onto the calling thread's tape.
//!
//! Link to [parent module](super)
// ----------------------------------------------------------------------------
use crate::base::Base;
use crate::op::id;
use crate::tape::{Tape, ThisThreadTape};
use rustc_hash::FxHashSet;
use std::fmt;
use std::ops::{Add, Div, Mul, Neg, Sub};
use std::sync::Mutex;

pub use crate::types::ADType;

/// Registry of tape ids whose recording is still open on some thread.
/// Consulted when an [AD] operand's `tape_id` does not match the
/// currently-active tape: if its id is still live, the operand belongs to
/// a *different* live recording and mixing it in is a cross-tape usage
/// error; if its id is not live, the recording it came from has already
/// finished and the operand is treated as an ordinary constant.
static LIVE_TAPE_IDS: Mutex<Option<FxHashSet<usize>>> = Mutex::new(None);

pub(crate) fn mark_tape_live(tape_id: usize) {
    let mut guard = LIVE_TAPE_IDS.lock().unwrap();
    guard.get_or_insert_with(FxHashSet::default).insert(tape_id);
}

pub(crate) fn mark_tape_dead(tape_id: usize) {
    let mut guard = LIVE_TAPE_IDS.lock().unwrap();
    if let Some(set) = guard.as_mut() {
        set.remove(&tape_id);
    }
}

fn tape_is_live(tape_id: usize) -> bool {
    let guard = LIVE_TAPE_IDS.lock().unwrap();
    guard.as_ref().is_some_and(|set| set.contains(&tape_id))
}

/// An active scalar: a plain value `V` plus, while a recording is open on
/// the calling thread, a location on that thread's tape.
#[derive(Clone, Copy, Debug)]
pub struct AD<V> {
    tape_id: usize,
    index: crate::tape::IndexT,
    ad_type: ADType,
    value: V,
}

impl<V: Base> AD<V> {
    pub(crate) fn new(
        tape_id: usize,
        index: crate::tape::IndexT,
        ad_type: ADType,
        value: V,
    ) -> Self {
        AD { tape_id, index, ad_type, value }
    }

    /// An `AD` not attached to any recording.
    pub fn constant(value: V) -> Self {
        AD { tape_id: 0, index: 0, ad_type: ADType::ConstantP, value }
    }

    pub fn to_value(&self) -> V {
        self.value
    }

    pub fn tape_id(&self) -> usize {
        self.tape_id
    }

    pub fn index(&self) -> crate::tape::IndexT {
        self.index
    }

    pub fn ad_type(&self) -> ADType {
        self.ad_type
    }

    pub fn is_constant(&self) -> bool {
        self.ad_type == ADType::ConstantP
    }

    pub fn is_dynamic(&self) -> bool {
        self.ad_type == ADType::DynamicP
    }

    pub fn is_variable(&self) -> bool {
        self.ad_type == ADType::Variable
    }
}

impl<V: fmt::Display> fmt::Display for AD<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.value, f)
    }
}

/// Resolves one operand against the thread's currently open tape (if any),
/// deciding whether it should be recorded as a live operand or folded in
/// as a constant because it is stale (belongs to a finished recording on
/// this same thread).
///
/// Returns `(ad_type, index)` suitable for `arg_type_all`/`arg_all`, after
/// interning the value as a fresh constant when needed.
pub(crate) fn resolve_operand<V: Base>(tape: &mut Tape<V>, a: &AD<V>) -> (ADType, crate::tape::IndexT) {
    if tape.recording && a.tape_id == tape.tape_id && a.ad_type != ADType::ConstantP {
        return (a.ad_type, a.index);
    }
    assert!(
        !(tape.recording
            && a.tape_id != 0
            && a.tape_id != tape.tape_id
            && tape_is_live(a.tape_id)),
        "cross-tape usage: operand belongs to a different recording that is still open"
    );
    let idx = tape.put_con_par(a.value);
    (ADType::ConstantP, idx)
}

macro_rules! impl_binary_elementary {
    ($Trait:ident, $method:ident, $op_id:path, $fallback:expr) => {
        impl<V> $Trait<&AD<V>> for &AD<V>
        where
            V: Base + ThisThreadTape,
        {
            type Output = AD<V>;
            fn $method(self, rhs: &AD<V>) -> AD<V> {
                binary_record(self, rhs, $op_id, $fallback)
            }
        }
        impl<V> $Trait<AD<V>> for AD<V>
        where
            V: Base + ThisThreadTape,
        {
            type Output = AD<V>;
            fn $method(self, rhs: AD<V>) -> AD<V> {
                (&self).$method(&rhs)
            }
        }
        impl<V> $Trait<&AD<V>> for AD<V>
        where
            V: Base + ThisThreadTape,
        {
            type Output = AD<V>;
            fn $method(self, rhs: &AD<V>) -> AD<V> {
                (&self).$method(rhs)
            }
        }
        impl<V> $Trait<AD<V>> for &AD<V>
        where
            V: Base + ThisThreadTape,
        {
            type Output = AD<V>;
            fn $method(self, rhs: AD<V>) -> AD<V> {
                self.$method(&rhs)
            }
        }
    };
}

fn binary_record<V>(lhs: &AD<V>, rhs: &AD<V>, op_id: u8, fallback: fn(V, V) -> V) -> AD<V>
where
    V: Base + ThisThreadTape,
{
    let value = fallback(lhs.value, rhs.value);
    V::get().with(|cell| {
        let mut tape = cell.borrow_mut();
        if !tape.recording {
            return AD::constant(value);
        }
        let l = resolve_operand(&mut tape, lhs);
        let r = resolve_operand(&mut tape, rhs);
        if l.0 == ADType::ConstantP && r.0 == ADType::ConstantP {
            return AD::constant(value);
        }
        let tape_id = tape.tape_id;
        let seq_is_var = l.0 == ADType::Variable || r.0 == ADType::Variable;
        let ad_type = if seq_is_var { ADType::Variable } else { ADType::DynamicP };
        let seq = if seq_is_var { &mut tape.var } else { &mut tape.dyp };
        let res = seq.push_op(op_id, &[l, r], &[], 1);
        AD::new(tape_id, res, ad_type, value)
    })
}

impl_binary_elementary!(Add, add, id::ADD_OP, |a: V, b: V| a + b);
impl_binary_elementary!(Sub, sub, id::SUB_OP, |a: V, b: V| a - b);
impl_binary_elementary!(Mul, mul, id::MUL_OP, |a: V, b: V| a * b);
impl_binary_elementary!(Div, div, id::DIV_OP, |a: V, b: V| a / b);

macro_rules! impl_binary_assign {
    ($Name:ident, $method:ident) => {
        paste::paste! {
            impl<V> std::ops::[<$Name Assign>]<&AD<V>> for AD<V>
            where
                V: Base + ThisThreadTape,
            {
                fn [<$method _assign>](&mut self, rhs: &AD<V>) {
                    *self = (&*self).$method(rhs);
                }
            }
            impl<V> std::ops::[<$Name Assign>]<AD<V>> for AD<V>
            where
                V: Base + ThisThreadTape,
            {
                fn [<$method _assign>](&mut self, rhs: AD<V>) {
                    *self = (&*self).$method(&rhs);
                }
            }
        }
    };
}

impl_binary_assign!(Add, add);
impl_binary_assign!(Sub, sub);
impl_binary_assign!(Mul, mul);
impl_binary_assign!(Div, div);

impl<V> Neg for &AD<V>
where
    V: Base + ThisThreadTape,
{
    type Output = AD<V>;
    fn neg(self) -> AD<V> {
        unary_record(self, id::NEG_OP, |v| -v)
    }
}
impl<V> Neg for AD<V>
where
    V: Base + ThisThreadTape,
{
    type Output = AD<V>;
    fn neg(self) -> AD<V> {
        -&self
    }
}

fn unary_record<V>(a: &AD<V>, op_id: u8, f: fn(V) -> V) -> AD<V>
where
    V: Base + ThisThreadTape,
{
    let value = f(a.value);
    V::get().with(|cell| {
        let mut tape = cell.borrow_mut();
        if !tape.recording {
            return AD::constant(value);
        }
        let x = resolve_operand(&mut tape, a);
        if x.0 == ADType::ConstantP {
            return AD::constant(value);
        }
        let tape_id = tape.tape_id;
        let n_res = id::n_res(op_id);
        let ad_type = x.0;
        let seq = if ad_type == ADType::Variable { &mut tape.var } else { &mut tape.dyp };
        let res = seq.push_op(op_id, &[x], &[], n_res);
        AD::new(tape_id, res, ad_type, value)
    })
}

macro_rules! unary_fn {
    ($name:ident, $op_id:path) => {
        pub fn $name<V>(a: &AD<V>) -> AD<V>
        where
            V: Base + ThisThreadTape,
        {
            unary_record(a, $op_id, |v| v.$name())
        }
    };
}

unary_fn!(sqrt, id::SQRT_OP);
unary_fn!(exp, id::EXP_OP);
unary_fn!(expm1, id::EXPM1_OP);
unary_fn!(ln, id::LN_OP);
unary_fn!(sin, id::SIN_OP);
unary_fn!(cos, id::COS_OP);
unary_fn!(tan, id::TAN_OP);
unary_fn!(sinh, id::SINH_OP);
unary_fn!(cosh, id::COSH_OP);
unary_fn!(tanh, id::TANH_OP);
unary_fn!(asin, id::ASIN_OP);
unary_fn!(acos, id::ACOS_OP);
unary_fn!(atan, id::ATAN_OP);
unary_fn!(abs, id::ABS_OP);
unary_fn!(sign, id::SIGN_OP);
unary_fn!(erf, id::ERF_OP);
unary_fn!(erfc, id::ERFC_OP);

pub fn ln_1p<V>(a: &AD<V>) -> AD<V>
where
    V: Base + ThisThreadTape,
{
    unary_record(a, id::LOG1P_OP, |v| v.ln_1p())
}

/// `x` raised to the power `y`. When `y` is a fixed (constant or dynamic)
/// parameter this records a single [id::POW_OP] with its own zero-base
/// recurrence (see [crate::op::recur]); when `y` is itself a variable it
/// is decomposed into `exp(y * ln(x))`, since a variable exponent's
/// sensitivity can only be expressed that way. Both forms match CppAD's
/// `pow_vp`/`pow_pv` split (see DESIGN.md Open Question 1).
pub fn pow<V>(x: &AD<V>, y: &AD<V>) -> AD<V>
where
    V: Base + ThisThreadTape,
{
    if y.ad_type() == ADType::Variable {
        let value = x.value.powf(y.value);
        let lx = ln(x);
        let prod = &lx * y;
        let mut r = exp(&prod);
        r.value = value;
        r
    } else {
        binary_record(x, y, id::POW_OP, |a: V, b: V| a.powf(b))
    }
}

/// Relations recorded by a comparison or a [cond_exp]; encoded as the op's
/// single `meta` entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u32)]
pub enum CompareOp {
    Lt = 0,
    Le = 1,
    Eq = 2,
    Ne = 3,
    Ge = 4,
    Gt = 5,
}

impl CompareOp {
    fn op_id(self) -> u8 {
        match self {
            CompareOp::Lt => id::LT_OP,
            CompareOp::Le => id::LE_OP,
            CompareOp::Eq => id::EQ_OP,
            CompareOp::Ne => id::NE_OP,
            CompareOp::Ge => id::GE_OP,
            CompareOp::Gt => id::GT_OP,
        }
    }
    fn holds(self, a: f64, b: f64) -> bool {
        match self {
            CompareOp::Lt => a < b,
            CompareOp::Le => a <= b,
            CompareOp::Eq => a == b,
            CompareOp::Ne => a != b,
            CompareOp::Ge => a >= b,
            CompareOp::Gt => a > b,
        }
    }

    pub(crate) fn from_code(code: u32) -> Self {
        match code {
            0 => CompareOp::Lt,
            1 => CompareOp::Le,
            2 => CompareOp::Eq,
            3 => CompareOp::Ne,
            4 => CompareOp::Ge,
            5 => CompareOp::Gt,
            _ => unreachable!("bad CompareOp code {code}"),
        }
    }

    /// Decodes a relation stored as a raw `meta` entry and evaluates it,
    /// used by the forward sweep to recheck a recorded comparison/`CondExp`
    /// without going through the `AD` recording path.
    pub(crate) fn holds_from_code(code: u32, a: f64, b: f64) -> bool {
        Self::from_code(code).holds(a, b)
    }
}

/// Records a comparison: evaluates it now and, while recording, appends a
/// `Compare` op whose outcome is rechecked on every later replay so
/// [crate::function::ADfn::compare_change_count] can report how many
/// comparisons would now go the other way.
pub fn compare<V>(rel: CompareOp, a: &AD<V>, b: &AD<V>) -> bool
where
    V: Base + ThisThreadTape,
{
    let outcome = rel.holds(a.value.to_f64(), b.value.to_f64());
    V::get().with(|cell| {
        let mut tape = cell.borrow_mut();
        if !tape.recording {
            return outcome;
        }
        let l = resolve_operand(&mut tape, a);
        let r = resolve_operand(&mut tape, b);
        if l.0 == ADType::ConstantP && r.0 == ADType::ConstantP {
            return outcome;
        }
        let seq_is_var = l.0 == ADType::Variable || r.0 == ADType::Variable;
        let seq = if seq_is_var { &mut tape.var } else { &mut tape.dyp };
        let meta = [rel as u32, outcome as u32];
        seq.push_op(rel.op_id(), &[l, r], &meta, 0);
        outcome
    })
}

/// Records `if rel(left, right) { if_true } else { if_false }`: both
/// branches are always recorded and evaluated; which one is "live" for a
/// given replay is decided by `rel` at replay time, not baked in.
#[allow(clippy::too_many_arguments)]
pub fn cond_exp<V>(
    rel: CompareOp,
    left: &AD<V>,
    right: &AD<V>,
    if_true: &AD<V>,
    if_false: &AD<V>,
) -> AD<V>
where
    V: Base + ThisThreadTape,
{
    let outcome = rel.holds(left.value.to_f64(), right.value.to_f64());
    let value = if outcome { if_true.value } else { if_false.value };
    V::get().with(|cell| {
        let mut tape = cell.borrow_mut();
        if !tape.recording {
            return AD::constant(value);
        }
        let l = resolve_operand(&mut tape, left);
        let r = resolve_operand(&mut tape, right);
        let t = resolve_operand(&mut tape, if_true);
        let e = resolve_operand(&mut tape, if_false);
        if [l.0, r.0, t.0, e.0].iter().all(|ty| *ty == ADType::ConstantP) {
            return AD::constant(value);
        }
        let tape_id = tape.tape_id;
        let seq_is_var = [l.0, r.0, t.0, e.0].iter().any(|ty| *ty == ADType::Variable);
        let ad_type = if seq_is_var { ADType::Variable } else { ADType::DynamicP };
        let seq = if seq_is_var { &mut tape.var } else { &mut tape.dyp };
        let meta = [rel as u32];
        let res = seq.push_op(id::COND_EXP_OP, &[l, r, t, e], &meta, 1);
        AD::new(tape_id, res, ad_type, value)
    })
}

/// A vector recorded on the tape whose elements are loaded and stored
/// with an index computed at replay time (see [crate::indexed_vec]).
/// Outside an active recording it behaves as an ordinary mutable vector:
/// `load`/`store` just read and write `local` without touching any tape.
pub struct VecAD<V> {
    tape_id: usize,
    vec_id: usize,
    local: std::cell::RefCell<Vec<V>>,
}

impl<V> VecAD<V>
where
    V: Base + ThisThreadTape,
{
    /// Declares a vector of length `initial.len()`. If a recording is
    /// active, each initial element is recorded as that element's value
    /// at index 0 in tape order (a constant, dynamic parameter, or
    /// variable, whichever `initial[i]` resolves to).
    pub fn new(initial: Vec<AD<V>>) -> Self {
        let values: Vec<V> = initial.iter().map(AD::to_value).collect();
        let (tape_id, vec_id) = V::get().with(|cell| {
            let mut tape = cell.borrow_mut();
            if !tape.recording {
                return (0usize, 0usize);
            }
            let decl_initial: Vec<(ADType, crate::tape::IndexT)> =
                initial.iter().map(|a| resolve_operand(&mut tape, a)).collect();
            let length = decl_initial.len();
            let vec_id = tape.vec_ad.len();
            tape.vec_ad.push(crate::tape::VecAdDecl { length, initial: decl_initial });
            (tape.tape_id, vec_id)
        });
        VecAD { tape_id, vec_id, local: std::cell::RefCell::new(values) }
    }

    pub fn len(&self) -> usize {
        self.local.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.local.borrow().is_empty()
    }

    /// Belongs to the tape currently recording, if any; i.e. whether
    /// `load`/`store` will actually append an op instead of just
    /// updating `local`.
    fn is_live_on_current_tape(&self, tape: &Tape<V>) -> bool {
        self.tape_id != 0 && tape.recording && tape.tape_id == self.tape_id
    }

    /// Loads `self[index]`. `index`'s order-0 value at the moment of the
    /// call selects the element; later forward/reverse sweeps re-resolve
    /// the index the same way from their own order-0 coefficient, so the
    /// element actually read can change across replays.
    pub fn load(&self, index: &AD<V>) -> AD<V> {
        let i = crate::indexed_vec::resolve_index(index.to_value().to_f64(), self.len());
        let value = self.local.borrow()[i];
        V::get().with(|cell| {
            let mut tape = cell.borrow_mut();
            if !self.is_live_on_current_tape(&tape) {
                return AD::constant(value);
            }
            let idx_op = resolve_operand(&mut tape, index);
            let tape_id = tape.tape_id;
            let meta = [self.vec_id as u32];
            let res = tape.var.push_op(id::LOAD_OP, &[idx_op], &meta, 1);
            AD::new(tape_id, res, ADType::Variable, value)
        })
    }

    /// Stores `value` into `self[index]`, resolved the same way as
    /// [VecAD::load].
    pub fn store(&self, index: &AD<V>, value: &AD<V>) {
        let i = crate::indexed_vec::resolve_index(index.to_value().to_f64(), self.len());
        self.local.borrow_mut()[i] = value.to_value();
        V::get().with(|cell| {
            let mut tape = cell.borrow_mut();
            if !self.is_live_on_current_tape(&tape) {
                return;
            }
            let idx_op = resolve_operand(&mut tape, index);
            let val_op = resolve_operand(&mut tape, value);
            let meta = [self.vec_id as u32];
            tape.var.push_op(id::STORE_OP, &[idx_op, val_op], &meta, 0);
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tape::{start_recording, stop_recording};

    #[test]
    fn constant_fold_when_not_recording() {
        let a = AD::constant(2.0_f64);
        let b = AD::constant(3.0_f64);
        let c = &a + &b;
        assert_eq!(c.to_value(), 5.0);
        assert!(c.is_constant());
    }

    #[test]
    fn arithmetic_records_variable_ops() {
        let x = start_recording(vec![2.0_f64, 3.0]);
        let y = &x[0] * &x[1] + &x[0];
        assert_eq!(y.to_value(), 8.0);
        assert!(y.is_variable());
        let f = stop_recording(vec![y]).unwrap();
        assert_eq!(f.domain_len(), 2);
        assert_eq!(f.range_len(), 1);
    }

    #[test]
    fn compare_records_and_counts_changes() {
        let x = start_recording(vec![1.0_f64, 2.0]);
        let outcome = compare(CompareOp::Lt, &x[0], &x[1]);
        assert!(outcome);
        let y = cond_exp(CompareOp::Lt, &x[0], &x[1], &x[0], &x[1]);
        assert_eq!(y.to_value(), 1.0);
        let _f = stop_recording(vec![y]).unwrap();
    }

    #[test]
    fn vec_ad_load_after_store_records_dependency() {
        let x = start_recording(vec![2.0_f64, 3.0, 0.3]);
        let (a, b, idx) = (x[0].clone(), x[1].clone(), x[2].clone());
        let v = VecAD::new(vec![a.clone(), b.clone()]);
        v.store(&AD::constant(0.0), &(&a * &b));
        let y = v.load(&idx);
        assert_eq!(y.to_value(), 6.0);
        assert!(y.is_variable());
        let f = stop_recording(vec![y]).unwrap();
        assert_eq!(f.domain_len(), 3);
    }
}
