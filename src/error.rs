// SPDX-License-Identifier: EPL-2.0 OR GPL-2.0-or-later
// SPDX-FileCopyrightText: Bradley M. Bell <bradbell@seanet.com>
// SPDX-FileContributor: 2026 Bradley M. Bell
// ---------------------------------------------------------------------------
//! Error type returned at the recoverable API boundaries.
//!
//! Contract violations that are only ever a programming error in the
//! caller (mixing tapes, out of range indexed-vector access, driving a
//! tape from the wrong thread) are not represented here; they are
//! `assert!`/`debug_assert!` panics at the point of violation instead,
//! matching this crate's `tape` and `adfn` modules.
use std::fmt;

/// Recoverable error kinds produced by public driver operations.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Error {
    /// Unknown optimizer option token, or a numeric option out of range.
    BadOption(String),
    /// More distinct tape slots were recorded than `IndexT` can address.
    CapacityExceeded { requested: u64, max: u64 },
    /// A registered atomic callback reported failure for one call.
    AtomicFailed { atom_id: u32, name: &'static str },
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::BadOption(tok) => write!(f, "unknown or out of range optimizer option: {tok}"),
            Error::CapacityExceeded { requested, max } => write!(
                f,
                "tape requires {requested} slots, address type can only represent {max}"
            ),
            Error::AtomicFailed { atom_id, name } => {
                write!(f, "atomic callback '{name}' failed for atom_id {atom_id}")
            }
        }
    }
}

impl std::error::Error for Error {}

pub type Result<T> = std::result::Result<T, Error>;
