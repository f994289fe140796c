// SPDX-License-Identifier: EPL-2.0 OR GPL-2.0-or-later
// SPDX-FileCopyrightText: Bradley M. Bell <bradbell@seanet.com>
// SPDX-FileContributor: 2026 Bradley M. Bell
// ---------------------------------------------------------------------------
//! Sparsity patterns: one ordered set of column indices per row, built on
//! [crate::vec_set::VecSet] the same way the reference implementation's
//! `sparse_pack`/`sparse_list` representations are, minus the packed-bit
//! variant (this crate keeps only the set-of-lists representation; see
//! DESIGN.md).
//!
//! Link to [parent module](super)
// ----------------------------------------------------------------------------
use crate::vec_set::VecSet;

/// A `n_row` x `n_col` 0/1 sparsity pattern, one [VecSet] id per row.
#[derive(Clone, Debug)]
pub struct Pattern {
    n_row: usize,
    n_col: usize,
    set: VecSet,
    /// `row_id[i]` is the `VecSet` id holding row `i`'s nonzero columns.
    row_id: Vec<usize>,
}

impl Pattern {
    pub fn new(n_row: usize, n_col: usize) -> Self {
        let mut set = VecSet::new();
        let row_id = (0..n_row).map(|_| set.union(&Vec::new())).collect();
        Pattern { n_row, n_col, set, row_id }
    }

    pub fn n_row(&self) -> usize {
        self.n_row
    }

    pub fn n_col(&self) -> usize {
        self.n_col
    }

    pub fn row(&self, i: usize) -> &[usize] {
        self.set.get(self.row_id[i])
    }

    /// Adds `col` to row `i`'s set.
    pub fn insert(&mut self, i: usize, col: usize) {
        debug_assert!(col < self.n_col);
        let singleton = self.set.singleton(col);
        self.row_id[i] = self.set.union(&vec![self.row_id[i], singleton]);
    }

    /// Unions row `from` into row `i` (used to propagate sparsity along an
    /// elementary operator's dependency edges).
    pub fn union_row_into(&mut self, i: usize, from: usize) {
        let from_id = self.row_id[from];
        self.row_id[i] = self.set.union(&vec![self.row_id[i], from_id]);
    }

    /// Flattens the pattern to `(row, col)` pairs, the representation
    /// [crate::sparse::coloring] consumes.
    pub fn to_pairs(&self) -> crate::SparsityPattern {
        let mut pairs = Vec::new();
        for i in 0..self.n_row {
            for &j in self.row(i) {
                pairs.push([i, j]);
            }
        }
        pairs
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_and_union_row() {
        let mut p = Pattern::new(3, 4);
        p.insert(0, 1);
        p.insert(0, 2);
        p.union_row_into(1, 0);
        p.insert(1, 3);
        let mut row1: Vec<usize> = p.row(1).to_vec();
        row1.sort_unstable();
        assert_eq!(row1, vec![1, 2, 3]);
        assert!(p.row(2).is_empty());
    }
}
