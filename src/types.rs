// SPDX-License-Identifier: EPL-2.0 OR GPL-2.0-or-later
// SPDX-FileCopyrightText: Bradley M. Bell <bradbell@seanet.com>
// SPDX-FileContributor: 2026 Bradley M. Bell
// ---------------------------------------------------------------------------
//! Shared small types used by both [crate::tape] and [crate::ad].
//!
//! Link to [parent module](super)

/// Index type used for every slot address on a tape.
pub type IndexT = u32;

/// Classifies where a scalar's value lives relative to the current
/// recording.
///
/// Derive order matters: `ConstantP < DynamicP < Variable < Empty` is
/// relied on by the optimizer when picking a canonical representative
/// among operands that compare equal.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ADType {
    /// Value not traced on any tape.
    ConstantP,
    /// Marked dynamic at `Independent` time; can be rebound without
    /// re-recording via `new_dynamic`.
    DynamicP,
    /// A recorded intermediate, identified by a slot index on the tape.
    Variable,
    /// Sentinel for an unused companion slot.
    Empty,
}

#[cfg(test)]
mod tests {
    use super::ADType::*;

    #[test]
    fn ad_type_ordering() {
        assert!(ConstantP < DynamicP);
        assert!(DynamicP < Variable);
        assert!(Variable < Empty);
    }
}
