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

//! This module implements read and write functions for the DIMACS
//! assignment format. A DIMACS file must look as follows.
//!
//! 1. empty lines are allowed and ignored
//! 2. a line starting with `c` is a comment line and is ignored
//! 3. the first non-comment line must have the form `p asn <n> <m>`,
//!    where `<n>` is the number of nodes and `<m>` the number of arcs.
//! 4. after the problem line there must follow node lines of the form
//!    `n <node>` where `<node>` is a node number between `1..n`. These
//!    are the source nodes, all other nodes are sink nodes.
//! 5. after the node lines there must be exactly `m` arc lines `a <u>
//!    <v> <c>` denoting an arc from source node `<u>` to sink node `<v>`
//!    with cost `<c>`.
//!
//! The source nodes are the rows of the assignment problem (in the
//! order of their node lines), the sink nodes are the columns (in
//! increasing order of their node numbers). Pairs without an arc
//! cannot be assigned. For parallel arcs the cheapest one is used.
//!
//! A solution file contains a line `s <value>` with the total cost and
//! one line `f <u> <v> 1` for each assigned pair.

use super::{Error, Record, Records, Result};
use crate::assignment::{total_cost, Cost, Hungarian, Parallelism};

#[cfg(feature = "serialize")]
use serde_derive::{Deserialize, Serialize};

use std::fmt::Display;
use std::io::{Read, Write};
use std::str::FromStr;

/// An assignment problem instance.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
pub struct Instance<T> {
    /// The (0-based) node numbers of the rows.
    pub row_nodes: Vec<usize>,
    /// The (0-based) node numbers of the columns.
    pub col_nodes: Vec<usize>,
    /// The arcs as `(row, column, cost)`.
    pub arcs: Vec<(usize, usize, T)>,
}

impl<T> Instance<T>
where
    T: Cost,
{
    pub fn num_rows(&self) -> usize {
        self.row_nodes.len()
    }

    pub fn num_cols(&self) -> usize {
        self.col_nodes.len()
    }

    /// Return the dense cost matrix in row major order.
    ///
    /// Missing pairs have infinite cost.
    pub fn cost_matrix(&self) -> Vec<T> {
        let ncols = self.num_cols();
        let mut costs = vec![T::infinity(); self.num_rows() * ncols];
        for &(i, j, c) in &self.arcs {
            let cij = &mut costs[i * ncols + j];
            if c < *cij {
                *cij = c;
            }
        }
        costs
    }

    /// Return a solver for this instance.
    pub fn solver(&self, par: Parallelism) -> Hungarian<T> {
        let ncols = self.num_cols();
        let costs = self.cost_matrix();
        let mut h = Hungarian::with_parallelism(self.num_rows(), ncols, par);
        h.set_costs(|i, j| costs[i * ncols + j]);
        h
    }

    /// Solve the instance.
    ///
    /// Returns the total cost and the assigned `(source, sink)` node pairs.
    pub fn solve(&self, par: Parallelism) -> (T, Vec<(usize, usize)>) {
        let ncols = self.num_cols();
        let costs = self.cost_matrix();
        let assignment = self.solver(par).compute();
        let value = total_cost(&assignment, |i, j| costs[i * ncols + j]);
        let pairs = assignment
            .iter()
            .enumerate()
            .filter_map(|(i, &j)| j.map(|j| (self.row_nodes[i], self.col_nodes[j])))
            .collect();
        (value, pairs)
    }
}

/// Read an assignment instance.
pub fn read<R, T>(r: R) -> Result<Instance<T>>
where
    R: Read,
    T: FromStr,
    T::Err: Display,
{
    let mut records = Records::new(r);

    let (nnodes, narcs) = match records.next().transpose()? {
        Some((_, Record::Problem { nodes, arcs })) => (nodes, arcs),
        Some((line, _)) => {
            return Err(Error::Invalid {
                line,
                msg: "expected problem line 'p asn <nodes> <arcs>'".to_string(),
            })
        }
        None => {
            return Err(Error::Invalid {
                line: records.line(),
                msg: "missing problem line".to_string(),
            })
        }
    };

    let mut is_source = vec![false; nnodes];
    let mut row_nodes = vec![];
    let mut arcs: Vec<(usize, usize, T)> = Vec::with_capacity(narcs);

    for record in records.by_ref() {
        let (line, record) = record?;
        let invalid = |msg: String| Err(Error::Invalid { line, msg });
        match record {
            Record::Source(_) if !arcs.is_empty() => return invalid("node lines must precede all arc lines".to_string()),
            Record::Source(u) if u >= nnodes => return invalid(format!("node {} does not exist", u + 1)),
            Record::Source(u) if is_source[u] => return invalid(format!("duplicate source node {}", u + 1)),
            Record::Source(u) => {
                is_source[u] = true;
                row_nodes.push(u);
            }
            Record::Arc(u, _, _) if u >= nnodes || !is_source[u] => {
                return invalid(format!("arc must start at a source node, got {}", u + 1))
            }
            Record::Arc(_, v, _) if v >= nnodes || is_source[v] => {
                return invalid(format!("arc must end at a sink node, got {}", v + 1))
            }
            Record::Arc(..) if arcs.len() == narcs => return invalid(format!("more than {} arcs", narcs)),
            Record::Arc(u, v, c) => arcs.push((u, v, c)),
            _ => return invalid("unexpected line in assignment problem".to_string()),
        }
    }

    if arcs.len() != narcs {
        return Err(Error::Invalid {
            line: records.line(),
            msg: format!("expected {} arcs, got {}", narcs, arcs.len()),
        });
    }

    // map node numbers to row and column indices
    let col_nodes = (0..nnodes).filter(|&u| !is_source[u]).collect::<Vec<_>>();
    let mut index = vec![0; nnodes];
    for (i, &u) in row_nodes.iter().enumerate() {
        index[u] = i;
    }
    for (j, &v) in col_nodes.iter().enumerate() {
        index[v] = j;
    }

    Ok(Instance {
        arcs: arcs.into_iter().map(|(u, v, c)| (index[u], index[v], c)).collect(),
        row_nodes,
        col_nodes,
    })
}

pub fn read_from_file<T>(filename: &str) -> Result<Instance<T>>
where
    T: FromStr,
    T::Err: Display,
{
    read(std::fs::File::open(filename)?)
}

/// Write an assignment instance.
pub fn write<W, T>(mut w: W, instance: &Instance<T>) -> std::io::Result<()>
where
    W: Write,
    T: Display,
{
    writeln!(
        w,
        "p asn {} {}",
        instance.row_nodes.len() + instance.col_nodes.len(),
        instance.arcs.len()
    )?;
    for &u in &instance.row_nodes {
        writeln!(w, "n {}", u + 1)?;
    }
    for (i, j, c) in &instance.arcs {
        writeln!(
            w,
            "a {} {} {}",
            instance.row_nodes[*i] + 1,
            instance.col_nodes[*j] + 1,
            c
        )?;
    }

    Ok(())
}

/// Write an assignment instance to a named file.
pub fn write_to_file<T>(filename: &str, instance: &Instance<T>) -> std::io::Result<()>
where
    T: Display,
{
    write(&mut std::fs::File::create(filename)?, instance)
}

/// Write a solution of an assignment problem.
///
/// `pairs` are the assigned (0-based) `(source, sink)` node pairs.
pub fn write_solution<W, T>(mut w: W, value: T, pairs: &[(usize, usize)]) -> std::io::Result<()>
where
    W: Write,
    T: Display,
{
    writeln!(w, "s {}", value)?;
    for &(u, v) in pairs {
        writeln!(w, "f {} {} 1", u + 1, v + 1)?;
    }

    Ok(())
}

/// Write a solution of an assignment problem to a named file.
pub fn write_solution_to_file<T>(filename: &str, value: T, pairs: &[(usize, usize)]) -> std::io::Result<()>
where
    T: Display,
{
    write_solution(&mut std::fs::File::create(filename)?, value, pairs)
}

/// Read a solution of an assignment problem.
///
/// Returns the solution value and the assigned (0-based) node pairs.
pub fn read_solution<R, T>(r: R) -> Result<(T, Vec<(usize, usize)>)>
where
    R: Read,
    T: FromStr,
    T::Err: Display,
{
    let mut records = Records::new(r);
    let mut pairs = vec![];
    let mut value = None;

    for record in records.by_ref() {
        match record? {
            (_, Record::Flow(u, v)) => pairs.push((u, v)),
            (line, Record::Value(_)) if value.is_some() => {
                return Err(Error::Invalid {
                    line,
                    msg: "solution value must be given exactly once".to_string(),
                })
            }
            (_, Record::Value(v)) => value = Some(v),
            (line, _) => {
                return Err(Error::Invalid {
                    line,
                    msg: "unexpected line in solution".to_string(),
                })
            }
        }
    }

    let value = value.ok_or_else(|| Error::Invalid {
        line: records.line(),
        msg: "missing solution value".to_string(),
    })?;
    Ok((value, pairs))
}

/// Read a solution of an assignment problem from a named file.
pub fn read_solution_from_file<T>(filename: &str) -> Result<(T, Vec<(usize, usize)>)>
where
    T: FromStr,
    T::Err: Display,
{
    read_solution(std::fs::File::open(filename)?)
}
