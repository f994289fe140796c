// SPDX-License-Identifier: EPL-2.0 OR GPL-2.0-or-later
// SPDX-FileCopyrightText: Bradley M. Bell <bradbell@seanet.com>
// SPDX-FileContributor: 2026 Bradley M. Bell
// ---------------------------------------------------------------------------
//! Dynamically-indexed vectors (`VecAD`): a vector recorded on a tape whose
//! elements can be loaded and stored with an index that is itself computed
//! at replay time, rather than fixed when the operation was recorded.
//!
//! Grounded on the reference implementation's `val_graph/vec_op.hpp`
//! `store_op_t`/`load_op_t`: an index is always resolved from the order-0
//! (primal) coefficient of its controlling argument, never differentiated
//! through, and a store overwrites every order of the target element so a
//! later load sees the element's full Taylor row.
//!
//! Link to [parent module](super)
// ----------------------------------------------------------------------------
use crate::base::Base;

/// Floors a replay-time order-0 coefficient to a concrete element index.
/// Panics (bad usage) if it is out of range; indices are never negative by
/// construction of how they were recorded.
pub(crate) fn resolve_index(value: f64, length: usize) -> usize {
    let i = value.floor() as i64;
    assert!(
        i >= 0 && (i as usize) < length,
        "indexed vector access out of range: index {i} not in 0..{length}"
    );
    i as usize
}

/// Per-vector-id storage: `contents[vec_id][element]` is that element's
/// Taylor row, one column per order, resized alongside the owning
/// [crate::function::ADfn]'s `taylor` workspace.
#[derive(Clone, Debug, Default)]
pub struct VecStore<V> {
    pub(crate) contents: Vec<Vec<Vec<V>>>,
}

impl<V: Base> VecStore<V> {
    pub fn new() -> Self {
        VecStore { contents: Vec::new() }
    }

    /// Seeds storage for every declared vector with `cap` columns,
    /// `length` rows of zero (the initial contents are written in by
    /// replaying the recorded stores, not by this constructor).
    pub fn init(decls: &[crate::tape::VecAdDecl], cap: usize) -> Self {
        let contents = decls
            .iter()
            .map(|d| vec![vec![V::zero(); cap]; d.length])
            .collect();
        VecStore { contents }
    }

    pub fn capacity_order(&mut self, cap: usize) {
        for vec in &mut self.contents {
            for row in vec {
                row.resize(cap, V::zero());
            }
        }
    }

    #[inline]
    pub fn get(&self, vec_id: usize, element: usize, order: usize) -> V {
        self.contents[vec_id][element][order]
    }

    #[inline]
    pub fn set(&mut self, vec_id: usize, element: usize, order: usize, v: V) {
        self.contents[vec_id][element][order] = v;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_index_floors_and_bounds_checks() {
        assert_eq!(resolve_index(2.49, 5), 2);
        // floor, not round: 2.6 stays in slot 2, where round(2.6) would be 3.
        assert_eq!(resolve_index(2.6, 5), 2);
        assert_eq!(resolve_index(2.99, 5), 2);
    }

    #[test]
    #[should_panic]
    fn resolve_index_out_of_range_panics() {
        resolve_index(5.0, 5);
    }
}
