/*
 * Copyright (c) 2022 Frank Fischer <frank-fischer@shadow-soft.de>
 *
 * This program is free software: you can redistribute it and/or
 * modify it under the terms of the GNU General Public License as
 * published by the Free Software Foundation, either version 3 of the
 * License, or (at your option) any later version.
 *
 * This program is distributed in the hope that it will be useful, but
 * WITHOUT ANY WARRANTY; without even the implied warranty of
 * MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the GNU
 * General Public License for more details.
 *
 * You should have received a copy of the GNU General Public License
 * along with this program.  If not, see  <http://www.gnu.org/licenses/>
 */

//! Row-parallel execution of the expensive matrix operations.
//!
//! The rows of the cost matrix are split into contiguous blocks, one
//! block per worker, such that each block contains (roughly) the same
//! number of uncovered rows. Each worker only touches the cost entries
//! and zero lists of its own rows, hence no synchronization is needed
//! until all workers are joined.

use super::Cost;

use rayon::prelude::*;

/// The row partition and per-worker scratch data.
pub(super) struct Workers<T> {
    /// Start row of each worker, the last entry is the number of rows.
    bounds: Vec<usize>,
    /// The minimal uncovered cost found by each worker.
    mins: Vec<T>,
}

impl<T> Workers<T>
where
    T: Cost,
{
    /// Create `nworkers` workers for an `n x n` matrix.
    ///
    /// Initially all rows are assigned to the first worker.
    pub fn new(nworkers: usize, n: usize) -> Self {
        let nworkers = nworkers.max(1);
        let mut bounds = vec![n; nworkers + 1];
        bounds[0] = 0;
        Workers {
            bounds,
            mins: vec![T::infinity(); nworkers],
        }
    }

    pub fn num_workers(&self) -> usize {
        self.mins.len()
    }

    /// The row range of worker `i`.
    #[cfg(test)]
    pub fn rows(&self, i: usize) -> std::ops::Range<usize> {
        self.bounds[i]..self.bounds[i + 1]
    }

    /// Distribute the uncovered rows evenly over the workers.
    ///
    /// Covered rows are attached to the block of the preceding uncovered
    /// row (or the first block).
    pub fn rebalance(&mut self, row_covered: &[bool]) {
        let n = row_covered.len();
        let nworkers = self.num_workers();
        let nuncovered = row_covered.iter().filter(|&&covered| !covered).count();
        let rows_per_worker = ((nuncovered + nworkers - 1) / nworkers).max(1);

        self.bounds[0] = 0;
        let mut k = 1;
        let mut cnt = 0;
        for (row, _) in row_covered.iter().enumerate().filter(|&(_, &covered)| !covered) {
            if cnt == rows_per_worker {
                self.bounds[k] = row;
                k += 1;
                cnt = 0;
            }
            cnt += 1;
        }
        // for small numbers of rows some workers remain idle
        for b in &mut self.bounds[k..] {
            *b = n;
        }
    }

    /// Return the minimal cost over all uncovered rows and the columns in `col_inds`.
    ///
    /// Returns `T::infinity()` if all these entries are infinite.
    pub fn min_uncovered_cost(&mut self, cost: &[T], n: usize, row_covered: &[bool], col_inds: &[usize]) -> T {
        let bounds = &self.bounds;
        if self.mins.len() == 1 {
            self.mins[0] = min_uncovered_in_rows(bounds[0], bounds[1], cost, n, row_covered, col_inds);
        } else {
            self.mins
                .par_iter_mut()
                .zip(bounds.par_windows(2))
                .for_each(|(m, w)| *m = min_uncovered_in_rows(w[0], w[1], cost, n, row_covered, col_inds));
        }

        self.mins
            .iter()
            .fold(T::infinity(), |acc, &m| if m < acc { m } else { acc })
    }

    /// Add `h` to all covered rows and subtract `h` from all columns in `col_inds`.
    ///
    /// The zero lists of all touched rows are updated accordingly.
    pub fn update_costs(
        &self,
        h: T,
        cost: &mut [T],
        zeros: &mut [Vec<usize>],
        n: usize,
        row_covered: &[bool],
        col_inds: &[usize],
    ) {
        if self.num_workers() == 1 {
            update_rows(h, 0, cost, zeros, n, row_covered, col_inds);
            return;
        }

        let mut blocks = Vec::with_capacity(self.num_workers());
        let mut cost_rest = cost;
        let mut zeros_rest = zeros;
        for w in self.bounds.windows(2) {
            let nrows = w[1] - w[0];
            let (cost_block, crest) = std::mem::take(&mut cost_rest).split_at_mut(nrows * n);
            let (zeros_block, zrest) = std::mem::take(&mut zeros_rest).split_at_mut(nrows);
            cost_rest = crest;
            zeros_rest = zrest;
            blocks.push((w[0], cost_block, zeros_block));
        }

        blocks
            .into_par_iter()
            .for_each(|(first, cost_block, zeros_block)| {
                update_rows(h, first, cost_block, zeros_block, n, row_covered, col_inds)
            });
    }
}

fn min_uncovered_in_rows<T>(
    start: usize,
    end: usize,
    cost: &[T],
    n: usize,
    row_covered: &[bool],
    col_inds: &[usize],
) -> T
where
    T: Cost,
{
    let mut m = T::infinity();
    for row in (start..end).filter(|&row| !row_covered[row]) {
        let row_cost = &cost[row * n..(row + 1) * n];
        for &col in col_inds {
            if row_cost[col] < m {
                m = row_cost[col];
            }
        }
    }
    m
}

/// Update the block of rows starting at row `first`.
///
/// `cost` and `zeros` contain exactly the rows of this block.
fn update_rows<T>(
    h: T,
    first: usize,
    cost: &mut [T],
    zeros: &mut [Vec<usize>],
    n: usize,
    row_covered: &[bool],
    col_inds: &[usize],
) where
    T: Cost,
{
    for (i, (row_cost, row_zeros)) in cost.chunks_mut(n).zip(zeros.iter_mut()).enumerate() {
        if row_covered[first + i] {
            for c in row_cost.iter_mut().filter(|c| !c.is_infinity()) {
                *c += h;
            }
            row_zeros.clear();
        }
        for &col in col_inds {
            let c = &mut row_cost[col];
            if !c.is_infinity() {
                *c -= h;
                if c.is_zero() {
                    row_zeros.push(col);
                }
            }
        }
    }
}
