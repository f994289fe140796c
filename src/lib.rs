// SPDX-License-Identifier: EPL-2.0 OR GPL-2.0-or-later
// SPDX-FileCopyrightText: Bradley M. Bell <bradbell@seanet.com>
// SPDX-FileContributor: 2026 Bradley M. Bell
// ---------------------------------------------------------------------------
//! `rustad` records arithmetic on [ad::AD] active scalars onto a per-thread
//! tape, seals a recording into an [function::ADfn], then replays that
//! recording to compute Taylor coefficients ([function::forward]),
//! adjoints ([function::reverse]), and sparsity patterns
//! ([function::sparsity]) of arbitrary order.
// ----------------------------------------------------------------------------

pub mod ad;
pub mod atom;
pub mod base;
pub mod checkpoint;
pub mod error;
pub mod function;
pub mod indexed_vec;
pub(crate) mod op;
pub mod sparse;
pub mod sparsity;
pub mod tape;
pub mod types;
pub(crate) mod vec_set;

pub use ad::{cond_exp, pow, CompareOp, VecAD, AD};
pub use base::Base;
pub use error::{Error, Result};
pub use function::ADfn;
pub use tape::{abort_recording, start_recording, start_recording_dyp, stop_recording};
pub use types::{ADType, IndexT};

/// A sparsity pattern as a flat list of `(row, col)` index pairs; the
/// representation [sparse::coloring] operates on.
pub type SparsityPattern = Vec<[usize; 2]>;

/// The date corresponding to this version of the software as year.month.day
pub const YEAR_MONTH_DAY: std::sync::LazyLock<&str> = std::sync::LazyLock::new(|| "2026.7.27");
