// SPDX-License-Identifier: EPL-2.0 OR GPL-2.0-or-later
// SPDX-FileCopyrightText: Bradley M. Bell <bradbell@seanet.com>
// SPDX-FileContributor: 2026 Bradley M. Bell
// ---------------------------------------------------------------------------
//! Define operator identifiers as `pub(crate) u8` constants.
//!
//! Every elementary operator has exactly one opcode here; there is no
//! separate variable/parameter-suffixed variant (`_vv`, `_pv`, ...) the
//! way the original recording format packed them, because
//! [crate::tape::OpSequence] tags each argument's location with an
//! explicit [crate::ad::ADType] in `arg_type_all` instead of folding that
//! information into the opcode. One opcode per operator is simpler to
//! dispatch on and costs one byte per argument, which this crate accepts.
//!
//! Link to [parent module](super)
// ----------------------------------------------------------------------------

/// Auto-assigns sequential `pub(crate) const NAME: u8` values in
/// declaration order, and a final `NUMBER_OP` sentinel equal to the
/// count.
macro_rules! set_operator_ids {
    ( $( $name:ident ),* $(,)? ) => {
        set_operator_ids!(@count 0; $( $name ),* );
    };
    (@count $n:expr; $head:ident $(, $tail:ident )* ) => {
        pub(crate) const $head: u8 = $n;
        set_operator_ids!(@count $n + 1; $( $tail ),* );
    };
    (@count $n:expr; ) => {
        pub(crate) const NUMBER_OP: u8 = $n;
    };
}

set_operator_ids!(
    NO_OP,
    // binary elementary
    ADD_OP,
    SUB_OP,
    MUL_OP,
    DIV_OP,
    // x raised to a fixed (constant or dynamic parameter) power; has its
    // own recurrence with a zero-base special case instead of the
    // ln/mul/exp decomposition used when the exponent is itself a
    // variable (see ad::pow)
    POW_OP,
    // unary elementary
    NEG_OP,
    ABS_OP,
    SIGN_OP,
    SQRT_OP,
    EXP_OP,
    EXPM1_OP,
    LN_OP,
    LOG1P_OP,
    SIN_OP,
    COS_OP,
    TAN_OP,
    SINH_OP,
    COSH_OP,
    TANH_OP,
    ASIN_OP,
    ACOS_OP,
    ATAN_OP,
    ERF_OP,
    ERFC_OP,
    // comparisons (record outcome, never control flow)
    LT_OP,
    LE_OP,
    EQ_OP,
    NE_OP,
    GE_OP,
    GT_OP,
    // conditional expression
    COND_EXP_OP,
    // indexed vector
    LOAD_OP,
    STORE_OP,
    // atomic function call
    CALL_OP,
    // trace-only
    PRINT_OP,
    // optimizer-introduced
    CUMSUM_OP,
    CSKIP_OP,
);

/// `true` for the companion-slot unary ops that allocate two result
/// slots (primary value, then the auxiliary its recurrence needs every
/// order): `sin`+cos companion, `cos`+sin companion,
/// `asin`/`acos`+`sqrt(1-x^2)` companion, `atan`+`1+x^2` companion.
pub(crate) fn n_res(id: u8) -> u8 {
    match id {
        SIN_OP | COS_OP | ASIN_OP | ACOS_OP | ATAN_OP => 2,
        STORE_OP | PRINT_OP | CSKIP_OP => 0,
        _ => 1,
    }
}

pub(crate) fn is_unary(id: u8) -> bool {
    matches!(
        id,
        NEG_OP
            | ABS_OP
            | SIGN_OP
            | SQRT_OP
            | EXP_OP
            | EXPM1_OP
            | LN_OP
            | LOG1P_OP
            | SIN_OP
            | COS_OP
            | TAN_OP
            | SINH_OP
            | COSH_OP
            | TANH_OP
            | ASIN_OP
            | ACOS_OP
            | ATAN_OP
            | ERF_OP
            | ERFC_OP
    )
}

pub(crate) fn is_binary(id: u8) -> bool {
    matches!(id, ADD_OP | SUB_OP | MUL_OP | DIV_OP | POW_OP)
}

/// Nonlinear ops contribute an outer product to Hessian sparsity;
/// linear ops (`add`/`sub`/`neg`) contribute nothing.
pub(crate) fn is_nonlinear(id: u8) -> bool {
    !matches!(id, ADD_OP | SUB_OP | NEG_OP | NO_OP)
}

pub(crate) fn is_commutative(id: u8) -> bool {
    matches!(id, ADD_OP | MUL_OP)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_sequential_and_distinct() {
        let ids = [
            NO_OP, ADD_OP, SUB_OP, MUL_OP, DIV_OP, POW_OP, NEG_OP, ABS_OP, SIGN_OP, SQRT_OP,
            EXP_OP, EXPM1_OP, LN_OP, LOG1P_OP, SIN_OP, COS_OP, TAN_OP, SINH_OP, COSH_OP, TANH_OP,
            ASIN_OP, ACOS_OP, ATAN_OP, ERF_OP, ERFC_OP, LT_OP, LE_OP, EQ_OP, NE_OP, GE_OP, GT_OP,
            COND_EXP_OP, LOAD_OP, STORE_OP, CALL_OP, PRINT_OP, CUMSUM_OP, CSKIP_OP,
        ];
        for (k, id) in ids.iter().enumerate() {
            assert_eq!(*id as usize, k);
        }
        assert_eq!(NUMBER_OP as usize, ids.len());
    }
}
