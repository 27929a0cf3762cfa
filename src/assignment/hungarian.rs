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

//! The Hungarian method (Kuhn-Munkres algorithm) for the linear assignment problem.
//!
//! The implementation works on the (padded) square cost matrix and
//! maintains the usual starred/primed zeros and row/column covers. The
//! two most expensive operations, the search for the minimal uncovered
//! cost and the update of the reduced costs, are distributed over the
//! rows of the matrix and executed in parallel.
//!
//! # Example
//!
//! ```
//! use rs_hungarian::assignment::hungarian;
//!
//! let costs = [[4, 1, 3], [2, 0, 5], [3, 2, 2]];
//! let (value, assignment) = hungarian(3, 3, |i, j| costs[i][j]);
//!
//! assert_eq!(value, 5);
//! assert_eq!(assignment, vec![Some(1), Some(0), Some(2)]);
//! ```
//!
//! Rectangular problems leave some rows or columns unassigned:
//!
//! ```
//! use rs_hungarian::assignment::Hungarian;
//!
//! let mut h = Hungarian::new(3, 2);
//! h.set_costs(|i, j| [[1.0, 2.0], [0.5, 4.0], [3.0, 1.5]][i][j]);
//! assert_eq!(h.dim(), 3);
//! assert_eq!(h.compute(), vec![None, Some(0), Some(1)]);
//! ```

use super::parallel::Workers;
use super::{total_cost, Cost, Error, Parallelism, Result};

use log::{debug, trace};

/// Outcome of a single iteration of the main loop.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
enum Step {
    /// An augmenting path has been found, one more row is assigned.
    Augmented,
    /// No uncovered zero exists, the reduced costs have been updated.
    CostsUpdated,
    /// All uncovered entries are infinite, no further assignment is possible.
    Infeasible,
}

/// The Hungarian method.
///
/// The solver owns the (padded) cost matrix and reduces it in place, so
/// each instance can be solved exactly once, see [`Hungarian::compute`].
pub struct Hungarian<T> {
    /// Number of rows of the original matrix.
    rows: usize,
    /// Number of columns of the original matrix.
    cols: usize,
    /// Dimension of the square matrix.
    n: usize,

    /// The cost matrix in row major order.
    cost: Vec<T>,
    row_covered: Vec<bool>,
    col_covered: Vec<bool>,
    /// The columns of the zero entries in each row.
    zeros: Vec<Vec<usize>>,
    /// Column of the starred zero in each row.
    starred: Vec<Option<usize>>,
    /// Column of the primed zero in each row, only valid during a path search.
    primed: Vec<usize>,
    /// The alternating path of primed and starred zeros.
    path: Vec<(usize, usize)>,
    /// The uncovered columns.
    col_inds: Vec<usize>,
    /// Rows without any finite cost, including padding rows.
    infinite_rows: Vec<bool>,
    /// Columns without any finite cost, including padding columns.
    infinite_cols: Vec<bool>,

    workers: Workers<T>,
}

impl<T> Hungarian<T>
where
    T: Cost,
{
    /// Create a solver for a `rows x cols` cost matrix.
    ///
    /// All costs are initially infinite. The expensive operations are run
    /// with the default parallelism.
    pub fn new(rows: usize, cols: usize) -> Self {
        Hungarian::with_parallelism(rows, cols, Parallelism::default())
    }

    /// Create a solver for a `rows x cols` cost matrix with given parallelism.
    pub fn with_parallelism(rows: usize, cols: usize, par: Parallelism) -> Self {
        let n = rows.max(cols);
        Hungarian {
            rows,
            cols,
            n,
            cost: vec![T::infinity(); n * n],
            row_covered: vec![false; n],
            col_covered: vec![false; n],
            zeros: vec![vec![]; n],
            starred: vec![None; n],
            primed: vec![0; n],
            path: vec![],
            col_inds: Vec::with_capacity(n),
            infinite_rows: vec![false; n],
            infinite_cols: vec![false; n],
            workers: Workers::new(par.num_workers(), n),
        }
    }

    /// Number of rows of the original matrix.
    pub fn num_rows(&self) -> usize {
        self.rows
    }

    /// Number of columns of the original matrix.
    pub fn num_cols(&self) -> usize {
        self.cols
    }

    /// Dimension of the padded square matrix, i.e. the length of the assignment.
    pub fn dim(&self) -> usize {
        self.n
    }

    /// Number of workers used for the parallel operations.
    pub fn num_workers(&self) -> usize {
        self.workers.num_workers()
    }

    /// Return the cost of assigning `row` to `col`.
    ///
    /// # Panics
    ///
    /// Panics if `row` or `col` is out of range.
    pub fn cost(&self, row: usize, col: usize) -> T {
        if let Err(err) = self.check_index(row, col) {
            panic!("{}", err);
        }
        self.cost[row * self.n + col]
    }

    /// Set the cost of assigning `row` to `col`.
    ///
    /// An infinite cost forbids the pair.
    ///
    /// # Panics
    ///
    /// Panics if `row` or `col` is out of range of the original matrix.
    pub fn set_cost(&mut self, row: usize, col: usize, cost: T) {
        if let Err(err) = self.try_set_cost(row, col, cost) {
            panic!("{}", err);
        }
    }

    /// Set the cost of assigning `row` to `col`.
    ///
    /// Returns an error if `row` or `col` is out of range of the original matrix.
    pub fn try_set_cost(&mut self, row: usize, col: usize, cost: T) -> Result<()> {
        self.check_index(row, col)?;
        self.cost[row * self.n + col] = cost;
        Ok(())
    }

    /// Set all costs of the original matrix.
    pub fn set_costs<C>(&mut self, cost: C)
    where
        C: Fn(usize, usize) -> T,
    {
        for row in 0..self.rows {
            for col in 0..self.cols {
                self.cost[row * self.n + col] = (cost)(row, col);
            }
        }
    }

    fn check_index(&self, row: usize, col: usize) -> Result<()> {
        if row < self.rows && col < self.cols {
            Ok(())
        } else {
            Err(Error::OutOfRange {
                row,
                col,
                rows: self.rows,
                cols: self.cols,
            })
        }
    }

    /// Solve the assignment problem.
    ///
    /// Returns the assigned column for each row of the padded square
    /// matrix. An entry is `None` if the row could not be assigned, this
    /// happens for padding rows, for rows assigned to padding columns, for
    /// rows or columns whose costs are all infinite and if all remaining
    /// pairs are forbidden.
    ///
    /// If all rows with some finite cost (or all such columns, whichever
    /// are fewer) can be assigned to non-forbidden pairs, the assignment
    /// has minimal total cost. Otherwise the search stops as soon as only
    /// forbidden pairs are left. The result then contains the maximal
    /// number of assigned pairs, but its cost is not necessarily minimal.
    ///
    /// The cost matrix is reduced in place, hence the solver is consumed.
    pub fn compute(mut self) -> Vec<Option<usize>> {
        debug!(
            "Solve {}x{} assignment problem (dimension {}, {} workers)",
            self.rows,
            self.cols,
            self.n,
            self.num_workers()
        );

        if self.n == 0 {
            return vec![];
        }

        self.initial_reduce();

        let mut naugment = 0;
        let mut nupdate = 0;
        while !self.col_covered.iter().all(|&covered| covered) {
            match self.iterate() {
                Step::Augmented => naugment += 1,
                Step::CostsUpdated => nupdate += 1,
                Step::Infeasible => {
                    trace!("All uncovered costs are infinite, stop");
                    for covered in &mut self.col_covered {
                        *covered = true;
                    }
                }
            }
        }

        debug!(
            "Assignment problem solved ({} augmentations, {} cost updates)",
            naugment, nupdate
        );

        self.assignment()
    }

    /// Extract the final assignment, hiding dummy and forbidden pairs.
    fn assignment(&self) -> Vec<Option<usize>> {
        self.starred
            .iter()
            .enumerate()
            .map(|(row, &col)| col.filter(|&col| !self.infinite_rows[row] && !self.infinite_cols[col]))
            .collect()
    }

    /// Turn the rows or the columns without any finite cost into dummies.
    ///
    /// Dummy lines can be assigned to anything at no cost. Only the side
    /// with more infinite lines is turned into dummies, otherwise dummy
    /// rows could take columns that real rows need (and vice versa).
    /// Padding is infinite at this point, so it is handled the same way.
    fn make_dummies(&mut self) {
        let n = self.n;

        for (row, row_cost) in self.cost.chunks(n).enumerate() {
            self.infinite_rows[row] = row_cost.iter().all(|c| c.is_infinity());
        }
        for (col, infinite) in self.infinite_cols.iter_mut().enumerate() {
            *infinite = self.cost[col..].iter().step_by(n).all(|c| c.is_infinity());
        }

        let nrows = self.infinite_rows.iter().filter(|&&inf| inf).count();
        let ncols = self.infinite_cols.iter().filter(|&&inf| inf).count();
        trace!("{} infinite rows, {} infinite columns", nrows, ncols);

        for (row, row_cost) in self.cost.chunks_mut(n).enumerate() {
            for (c, &col_inf) in row_cost.iter_mut().zip(self.infinite_cols.iter()) {
                let dummy = if nrows >= ncols { self.infinite_rows[row] } else { col_inf };
                if dummy {
                    *c = T::zero();
                }
            }
        }
    }

    /// Subtract row and column minima and compute an initial matching.
    fn initial_reduce(&mut self) {
        let n = self.n;

        self.make_dummies();

        // subtract the minimum of each row and compute the minimum of each column
        let mut col_min = vec![T::infinity(); n];
        for row_cost in self.cost.chunks_mut(n) {
            let h = row_cost
                .iter()
                .fold(T::infinity(), |acc, &c| if c < acc { c } else { acc });
            if !h.is_infinity() {
                for c in row_cost.iter_mut().filter(|c| !c.is_infinity()) {
                    *c -= h;
                }
            }
            for (m, &c) in col_min.iter_mut().zip(row_cost.iter()) {
                if c < *m {
                    *m = c;
                }
            }
        }

        // subtract the minimum of each column, infinite columns stay untouched
        for m in col_min.iter_mut().filter(|m| m.is_infinity()) {
            *m = T::zero();
        }
        for row_cost in self.cost.chunks_mut(n) {
            for (c, &m) in row_cost.iter_mut().zip(col_min.iter()) {
                if !c.is_infinity() {
                    *c -= m;
                }
            }
        }

        // star the first zero in each row whose column has no star, yet
        for (row, row_cost) in self.cost.chunks(n).enumerate() {
            for (col, c) in row_cost.iter().enumerate() {
                if c.is_zero() {
                    self.zeros[row].push(col);
                    if self.starred[row].is_none() && !self.col_covered[col] {
                        self.starred[row] = Some(col);
                        self.col_covered[col] = true;
                    }
                }
            }
        }

        self.cover_starred_columns();
    }

    /// Uncover all rows and cover exactly the columns with a starred zero.
    fn cover_starred_columns(&mut self) {
        for covered in self.row_covered.iter_mut().chain(self.col_covered.iter_mut()) {
            *covered = false;
        }
        for &col in self.starred.iter().flatten() {
            self.col_covered[col] = true;
        }
    }

    fn find_uncovered_zero(&self) -> Option<(usize, usize)> {
        // This is run after each change of the covers.
        for (row, zeros) in self.zeros.iter().enumerate() {
            if !self.row_covered[row] {
                if let Some(&col) = zeros.iter().find(|&&col| !self.col_covered[col]) {
                    return Some((row, col));
                }
            }
        }
        None
    }

    fn find_starred_zero_in_col(&self, col: usize) -> Option<usize> {
        self.starred.iter().position(|&c| c == Some(col))
    }

    fn fill_col_inds(&mut self) {
        self.col_inds.clear();
        for (col, &covered) in self.col_covered.iter().enumerate() {
            if !covered {
                self.col_inds.push(col);
            }
        }
    }

    /// One iteration of the main loop.
    ///
    /// Primes uncovered zeros until an augmenting path is found. If no
    /// uncovered zero is left, the reduced costs are updated.
    fn iterate(&mut self) -> Step {
        while let Some((row, col)) = self.find_uncovered_zero() {
            self.primed[row] = col;
            match self.starred[row] {
                None => {
                    self.augment(row, col);
                    return Step::Augmented;
                }
                Some(star) => {
                    // cover the row, uncover the column of its star
                    self.row_covered[row] = true;
                    self.col_covered[star] = false;
                }
            }
        }

        self.fill_col_inds();
        self.workers.rebalance(&self.row_covered);

        let h = self
            .workers
            .min_uncovered_cost(&self.cost, self.n, &self.row_covered, &self.col_inds);
        if h.is_infinity() {
            return Step::Infeasible;
        }

        trace!(
            "Update costs by {:?} ({} covered rows, {} uncovered columns)",
            h,
            self.row_covered.iter().filter(|&&covered| covered).count(),
            self.col_inds.len()
        );
        self.workers.update_costs(
            h,
            &mut self.cost,
            &mut self.zeros,
            self.n,
            &self.row_covered,
            &self.col_inds,
        );

        Step::CostsUpdated
    }

    /// Augment along the alternating path starting at the primed zero `(row, col)`.
    fn augment(&mut self, row: usize, col: usize) {
        self.path.clear();
        self.path.push((row, col));

        // The row of a starred zero in the column of a primed zero has
        // been covered in this search, so it contains a primed zero, too.
        let mut col = col;
        while let Some(row) = self.find_starred_zero_in_col(col) {
            col = self.primed[row];
            self.path.push((row, col));
        }

        for &(row, col) in &self.path {
            self.starred[row] = Some(col);
        }

        self.cover_starred_columns();
    }
}

/// Solve the assignment problem for a `rows x cols` matrix.
///
/// The cost of assigning row `i` to column `j` is `costs(i, j)`.
/// Returns the total cost of all assigned pairs and the assignment as
/// returned by [`Hungarian::compute`].
pub fn hungarian<T, C>(rows: usize, cols: usize, costs: C) -> (T, Vec<Option<usize>>)
where
    T: Cost,
    C: Fn(usize, usize) -> T,
{
    let mut h = Hungarian::new(rows, cols);
    h.set_costs(&costs);
    let assignment = h.compute();
    (total_cost(&assignment, &costs), assignment)
}
