// SPDX-License-Identifier: EPL-2.0 OR GPL-2.0-or-later
// SPDX-FileCopyrightText: Bradley M. Bell <bradbell@seanet.com>
// SPDX-FileContributor: 2026 Bradley M. Bell
// ---------------------------------------------------------------------------
//! Optimizer passes over a sealed [crate::function::ADfn]'s `var`
//! sequence, driven through the public [crate::function::ADfn::optimize]
//! entry point. Only dead-code elimination is implemented; constant
//! subexpression elimination, conditional-skip insertion, and sum fusion
//! are Non-goals (see DESIGN.md) — their option tokens still parse, they
//! just run no pass.
//!
//! Link to [parent module](super)
// ----------------------------------------------------------------------------
mod dead_code;
pub use dead_code::eliminate_dead_code;
