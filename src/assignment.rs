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

//! Linear assignment algorithms.
//!
//! The linear assignment problem asks for a one-to-one matching between
//! the rows and the columns of a cost matrix such that the total cost of
//! the matched pairs is minimal. Rectangular matrices are padded to a
//! square matrix with "infinite" costs, i.e. pairs that cannot be
//! assigned. Only minimization is supported, maximization problems must
//! negate their costs.

pub mod hungarian;
pub use self::hungarian::{hungarian, Hungarian};

mod parallel;

use crate::num::traits::{Bounded, Float, NumAssign};

use std::error;
use std::fmt;

/// A numeric type usable as assignment cost.
///
/// The type must provide an "infinite" value that is larger than any
/// cost that is actually used. This value marks forbidden pairs and the
/// padding of rectangular matrices. The solver never does arithmetic
/// with infinite cells, so the infinite value survives all reductions.
///
/// For floating-point types this is the IEEE infinity, for integer types
/// it is the largest representable value. Cost types without such a
/// value cannot be used.
pub trait Cost: NumAssign + PartialOrd + Copy + Send + Sync + fmt::Debug {
    /// The value marking a forbidden pair.
    fn infinity() -> Self;

    /// Return `true` iff `self` is the infinite value.
    fn is_infinity(&self) -> bool {
        *self >= Self::infinity()
    }
}

macro_rules! float_cost {
    ($($t:ty),*) => {
        $(
            impl Cost for $t {
                fn infinity() -> Self {
                    Float::infinity()
                }
            }
        )*
    };
}

macro_rules! integer_cost {
    ($($t:ty),*) => {
        $(
            impl Cost for $t {
                fn infinity() -> Self {
                    Bounded::max_value()
                }
            }
        )*
    };
}

float_cost!(f32, f64);
integer_cost!(i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize);

/// Parallelism strategy for the expensive parts of an assignment solver.
///
/// The solver distributes the rows of the cost matrix over a fixed
/// number of workers. The workers are executed on the current rayon
/// thread pool.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Parallelism {
    /// No parallelism, everything runs on the calling thread.
    None,
    /// Rayon parallelism with the given number of workers.
    ///
    /// A value of `0` is treated as equivalent to
    /// `rayon::current_num_threads()`.
    Rayon(usize),
}

impl Default for Parallelism {
    fn default() -> Self {
        Parallelism::Rayon(0)
    }
}

impl Parallelism {
    /// Return the number of workers, which is always at least 1.
    pub fn num_workers(self) -> usize {
        match self {
            Parallelism::None => 1,
            Parallelism::Rayon(0) => rayon::current_num_threads().max(1),
            Parallelism::Rayon(n) => n,
        }
    }
}

/// Error when setting up an assignment problem.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// A cost entry outside of the original matrix has been accessed.
    OutOfRange {
        row: usize,
        col: usize,
        rows: usize,
        cols: usize,
    },
}

impl fmt::Display for Error {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> std::result::Result<(), fmt::Error> {
        match self {
            Error::OutOfRange { row, col, rows, cols } => write!(
                fmt,
                "cost entry ({}, {}) out of range for {}x{} matrix",
                row, col, rows, cols
            ),
        }
    }
}

impl error::Error for Error {}

pub type Result<T> = std::result::Result<T, Error>;

/// Return the total cost of an assignment.
///
/// `costs` returns the cost of assigning some row to some column. Only
/// rows that are actually assigned contribute.
pub fn total_cost<T, C>(assignment: &[Option<usize>], costs: C) -> T
where
    T: Cost,
    C: Fn(usize, usize) -> T,
{
    assignment
        .iter()
        .enumerate()
        .filter_map(|(row, &col)| col.map(|col| (costs)(row, col)))
        .fold(T::zero(), |acc, c| acc + c)
}
