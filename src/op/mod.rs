// SPDX-License-Identifier: EPL-2.0 OR GPL-2.0-or-later
// SPDX-FileCopyrightText: Bradley M. Bell <bradbell@seanet.com>
// SPDX-FileContributor: 2026 Bradley M. Bell
// ---------------------------------------------------------------------------
//! Operator identifiers and their per-order Taylor-coefficient recurrences.
//!
//! Link to [parent module](super)
// ----------------------------------------------------------------------------
pub(crate) mod id;
pub(crate) mod recur;
