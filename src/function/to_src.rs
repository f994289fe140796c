// SPDX-License-Identifier: EPL-2.0 OR GPL-2.0-or-later
// SPDX-FileCopyrightText: Bradley M. Bell <bradbell@seanet.com>
// SPDX-FileContributor: 2026 Bradley M. Bell
// ---------------------------------------------------------------------------
//! Minimal textual dumps of a recording: a C source file evaluating it at
//! order 0, and a JSON description of its operation sequence. Neither
//! feeds a compiler or external tool from this crate; generating and
//! loading compiled code from the dump is a Non-goal (see DESIGN.md).
//!
//! Link to [parent module](super)
// ----------------------------------------------------------------------------
use super::ADfn;
use crate::ad::ADType;
use crate::base::Base;
use crate::op::id;
use std::fmt::Write as _;

pub(crate) fn op_name(op_id: u8) -> &'static str {
    match op_id {
        id::ADD_OP => "add",
        id::SUB_OP => "sub",
        id::MUL_OP => "mul",
        id::DIV_OP => "div",
        id::POW_OP => "pow",
        id::NEG_OP => "neg",
        id::ABS_OP => "abs",
        id::SIGN_OP => "sign",
        id::SQRT_OP => "sqrt",
        id::EXP_OP => "exp",
        id::EXPM1_OP => "expm1",
        id::LN_OP => "ln",
        id::LOG1P_OP => "log1p",
        id::SIN_OP => "sin",
        id::COS_OP => "cos",
        id::TAN_OP => "tan",
        id::SINH_OP => "sinh",
        id::COSH_OP => "cosh",
        id::TANH_OP => "tanh",
        id::ASIN_OP => "asin",
        id::ACOS_OP => "acos",
        id::ATAN_OP => "atan",
        id::ERF_OP => "erf",
        id::ERFC_OP => "erfc",
        id::LT_OP => "lt",
        id::LE_OP => "le",
        id::EQ_OP => "eq",
        id::NE_OP => "ne",
        id::GE_OP => "ge",
        id::GT_OP => "gt",
        id::COND_EXP_OP => "cond_exp",
        id::LOAD_OP => "load",
        id::STORE_OP => "store",
        id::CALL_OP => "call",
        id::PRINT_OP => "print",
        id::CUMSUM_OP => "cumsum",
        id::CSKIP_OP => "cskip",
        _ => "no_op",
    }
}

fn c_ref(t: ADType, idx: u32) -> String {
    match t {
        ADType::ConstantP => format!("cop[{idx}]"),
        ADType::DynamicP => format!("dyn_val[{idx}]"),
        ADType::Variable => format!("v[{idx}]"),
        ADType::Empty => "0.0".to_string(),
    }
}

fn c_expr(op_id: u8, args: &[(ADType, u32)]) -> String {
    let a: Vec<String> = args.iter().map(|(t, i)| c_ref(*t, *i)).collect();
    match op_id {
        id::ADD_OP => format!("{} + {}", a[0], a[1]),
        id::SUB_OP => format!("{} - {}", a[0], a[1]),
        id::MUL_OP => format!("{} * {}", a[0], a[1]),
        id::DIV_OP => format!("{} / {}", a[0], a[1]),
        id::POW_OP => format!("pow({}, {})", a[0], a[1]),
        id::NEG_OP => format!("-{}", a[0]),
        _ if id::is_unary(op_id) => format!("{}({})", op_name(op_id), a[0]),
        _ => format!("/* {} */ 0.0", op_name(op_id)),
    }
}

/// Dumps a C function `void eval_fn(const double *x, double *y)` computing
/// the recording's order-0 value. Scalar-only (`V = f64`); a generic `V`
/// emits a comment noting C generation is `f64`-only.
pub fn to_csrc<V: Base>(f: &ADfn<V>) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "#include <math.h>");
    let _ = writeln!(out, "void eval_fn(const double *x, double *y) {{");
    let _ = writeln!(out, "    double cop[{}];", f.cop.len().max(1));
    for (i, c) in f.cop.iter().enumerate() {
        let _ = writeln!(out, "    cop[{i}] = {:?};", c.to_f64());
    }
    let _ = writeln!(out, "    double dyn_val[{}];", f.dyn_val.len().max(1));
    for (i, d) in f.dyn_val.iter().enumerate() {
        let _ = writeln!(out, "    dyn_val[{i}] = {:?};", d.to_f64());
    }
    let _ = writeln!(out, "    double v[{}];", f.n_var().max(1));
    for j in 0..f.domain_len() {
        let _ = writeln!(out, "    v[{}] = x[{j}];", f.ind_addr[j]);
    }
    for op in 0..f.var.n_op() {
        let op_id = f.var.id_all[op];
        if op_id == id::NO_OP {
            continue;
        }
        let res = f.var.res_start[op];
        let args: Vec<(ADType, u32)> =
            f.var.arg_types(op).iter().copied().zip(f.var.args(op).iter().copied()).collect();
        let _ = writeln!(out, "    v[{res}] = {};", c_expr(op_id, &args));
    }
    for (i, t) in f.range_ad_type.iter().enumerate() {
        let _ = writeln!(out, "    y[{i}] = {};", c_ref(*t, f.range_index[i]));
        let _ = t;
    }
    let _ = writeln!(out, "}}");
    out
}

/// Dumps the `var` operation sequence as a JSON array, one object per op.
pub fn to_json<V: Base>(f: &ADfn<V>) -> String {
    let mut out = String::from("[");
    for op in 0..f.var.n_op() {
        if op > 0 {
            out.push(',');
        }
        let op_id = f.var.id_all[op];
        let args: Vec<String> = f
            .var
            .arg_types(op)
            .iter()
            .zip(f.var.args(op).iter())
            .map(|(t, i)| format!("[\"{t:?}\",{i}]"))
            .collect();
        let _ = write!(
            out,
            "{{\"op\":\"{}\",\"args\":[{}],\"res\":{}}}",
            op_name(op_id),
            args.join(","),
            f.var.res_start[op]
        );
    }
    out.push(']');
    out
}
