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

use rs_hungarian::assignment::{hungarian, total_cost, Cost, Hungarian, Parallelism};

/// Deterministic pseudo random cost matrices.
struct Lcg(u64);

impl Lcg {
    fn next(&mut self, bound: u64) -> u64 {
        self.0 = self
            .0
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        (self.0 >> 33) % bound
    }

    fn matrix(&mut self, rows: usize, cols: usize, bound: u64) -> Vec<Vec<i64>> {
        (0..rows)
            .map(|_| (0..cols).map(|_| self.next(bound) as i64).collect())
            .collect()
    }
}

/// Call `f` for each permutation of `perm[k..]`.
fn permutations<F: FnMut(&[usize])>(perm: &mut Vec<usize>, k: usize, f: &mut F) {
    if k == perm.len() {
        f(perm);
        return;
    }
    for i in k..perm.len() {
        perm.swap(k, i);
        permutations(perm, k + 1, f);
        perm.swap(k, i);
    }
}

/// Minimal total cost over all assignments of the rows to distinct columns.
///
/// Requires `rows <= cols`.
fn brute_force(costs: &[Vec<i64>]) -> i64 {
    let rows = costs.len();
    let cols = costs[0].len();
    assert!(rows <= cols);
    let mut best = i64::max_value();
    permutations(&mut (0..cols).collect(), 0, &mut |perm: &[usize]| {
        let value: i64 = (0..rows).map(|i| costs[i][perm[i]]).sum();
        if value < best {
            best = value;
        }
    });
    best
}

fn transpose(costs: &[Vec<i64>]) -> Vec<Vec<i64>> {
    (0..costs[0].len())
        .map(|j| costs.iter().map(|row| row[j]).collect())
        .collect()
}

fn solve<T: Cost>(rows: usize, cols: usize, par: Parallelism, costs: impl Fn(usize, usize) -> T) -> Vec<Option<usize>> {
    let mut h = Hungarian::with_parallelism(rows, cols, par);
    h.set_costs(costs);
    h.compute()
}

/// Check that the assigned columns are distinct and in range.
fn check_matching(assignment: &[Option<usize>], rows: usize, cols: usize) {
    assert_eq!(assignment.len(), rows.max(cols));
    let mut used = vec![false; cols];
    for (i, &j) in assignment.iter().enumerate() {
        if let Some(j) = j {
            assert!(i < rows);
            assert!(j < cols);
            assert!(!used[j], "column {} assigned twice", j);
            used[j] = true;
        }
    }
}

#[test]
fn test_small_example() {
    let costs = vec![vec![4, 1, 3], vec![2, 0, 5], vec![3, 2, 2]];
    let (value, assignment) = hungarian(3, 3, |i, j| costs[i][j]);
    check_matching(&assignment, 3, 3);
    assert!(assignment.iter().all(Option::is_some));
    assert_eq!(value, brute_force(&costs));
}

#[test]
fn test_square_brute_force() {
    let mut rng = Lcg(42);
    for n in 1..=8 {
        for &bound in &[3, 10, 100] {
            let costs = rng.matrix(n, n, bound);
            for &par in &[Parallelism::None, Parallelism::Rayon(3)] {
                let assignment = solve(n, n, par, |i, j| costs[i][j]);
                check_matching(&assignment, n, n);
                assert!(assignment.iter().all(Option::is_some));
                assert_eq!(
                    total_cost(&assignment, |i, j| costs[i][j]),
                    brute_force(&costs),
                    "n={} costs={:?}",
                    n,
                    costs
                );
            }
        }
    }
}

#[test]
fn test_negative_costs() {
    let mut rng = Lcg(7);
    for n in 2..=6 {
        let costs = rng
            .matrix(n, n, 50)
            .into_iter()
            .map(|row| row.into_iter().map(|c| c - 25).collect())
            .collect::<Vec<Vec<i64>>>();
        let (value, assignment) = hungarian(n, n, |i, j| costs[i][j]);
        check_matching(&assignment, n, n);
        assert_eq!(value, brute_force(&costs));
    }
}

#[test]
fn test_float_costs() {
    let mut rng = Lcg(1234);
    for n in 1..=6 {
        let costs = rng.matrix(n, n, 400);
        // quarters are exact, so the sums can be compared exactly
        let fcosts = |i: usize, j: usize| costs[i][j] as f64 * 0.25;
        let assignment = solve(n, n, Parallelism::Rayon(4), fcosts);
        check_matching(&assignment, n, n);
        assert_eq!(total_cost(&assignment, fcosts), brute_force(&costs) as f64 * 0.25);
    }
}

#[test]
fn test_unsigned_costs() {
    let mut rng = Lcg(99);
    let costs = rng.matrix(6, 6, 1000);
    let (value, assignment) = hungarian(6, 6, |i, j| costs[i][j] as u32);
    check_matching(&assignment, 6, 6);
    assert_eq!(value as i64, brute_force(&costs));
}

#[test]
fn test_rectangular() {
    let mut rng = Lcg(5);
    for &(rows, cols) in &[(1, 4), (2, 5), (3, 7), (4, 6), (4, 1), (5, 2), (7, 3), (6, 5)] {
        let costs = rng.matrix(rows, cols, 30);
        let expected = if rows <= cols {
            brute_force(&costs)
        } else {
            brute_force(&transpose(&costs))
        };

        for &par in &[Parallelism::None, Parallelism::Rayon(2), Parallelism::Rayon(0)] {
            let assignment = solve(rows, cols, par, |i, j| costs[i][j]);
            check_matching(&assignment, rows, cols);

            // the smaller dimension is matched completely
            assert_eq!(assignment.iter().filter(|j| j.is_some()).count(), rows.min(cols));
            // padding rows are never assigned
            assert!(assignment[rows..].iter().all(Option::is_none));
            assert_eq!(total_cost(&assignment, |i, j| costs[i][j]), expected);
        }
    }
}

#[test]
fn test_number_of_workers() {
    let mut rng = Lcg(2022);
    for &(rows, cols) in &[(30, 30), (25, 40), (40, 17)] {
        let costs = rng.matrix(rows, cols, 100);
        let values = [
            Parallelism::None,
            Parallelism::Rayon(1),
            Parallelism::Rayon(2),
            Parallelism::Rayon(7),
            Parallelism::Rayon(64),
            Parallelism::Rayon(0),
        ]
        .iter()
        .map(|&par| {
            let assignment = solve(rows, cols, par, |i, j| costs[i][j]);
            check_matching(&assignment, rows, cols);
            total_cost(&assignment, |i, j| costs[i][j])
        })
        .collect::<Vec<_>>();
        assert!(values.iter().all(|&v| v == values[0]), "{:?}", values);
    }
}

#[test]
fn test_one_by_one() {
    let (value, assignment) = hungarian(1, 1, |_, _| 3.5);
    assert_eq!(value, 3.5);
    assert_eq!(assignment, vec![Some(0)]);
}

#[test]
fn test_all_equal() {
    let n = 8;
    let (value, assignment) = hungarian(n, n, |_, _| 3);
    check_matching(&assignment, n, n);
    assert!(assignment.iter().all(Option::is_some));
    assert_eq!(value, 3 * n as i32);
}

#[test]
fn test_infinite_row() {
    let inf = std::f64::INFINITY;
    let mut rng = Lcg(17);
    for n in 2..=6 {
        let costs = rng.matrix(n, n, 20);
        for r in 0..n {
            let fcosts = |i: usize, j: usize| if i == r { inf } else { costs[i][j] as f64 };
            // the remaining rows are assigned optimally
            let others = costs
                .iter()
                .enumerate()
                .filter(|&(i, _)| i != r)
                .map(|(_, row)| row.clone())
                .collect::<Vec<_>>();
            let expected = brute_force(&others) as f64;

            for &par in &[Parallelism::None, Parallelism::Rayon(2)] {
                let assignment = solve(n, n, par, fcosts);
                check_matching(&assignment, n, n);
                assert_eq!(assignment[r], None);
                assert_eq!(assignment.iter().filter(|j| j.is_some()).count(), n - 1);
                assert_eq!(total_cost(&assignment, fcosts), expected, "n={} r={} costs={:?}", n, r, costs);
            }
        }
    }
}

#[test]
fn test_infinite_row_and_column() {
    let inf = i64::max_value();
    let mut rng = Lcg(23);
    for n in 2..=6 {
        let costs = rng.matrix(n, n, 20);
        let (r, s) = (n / 2, n - 1);
        let icosts = |i: usize, j: usize| if i == r || j == s { inf } else { costs[i][j] };

        let others = (0..n)
            .filter(|&i| i != r)
            .map(|i| (0..n - 1).map(|j| costs[i][j]).collect())
            .collect::<Vec<Vec<i64>>>();
        let expected = brute_force(&others);

        let assignment = solve(n, n, Parallelism::Rayon(3), icosts);
        check_matching(&assignment, n, n);
        assert_eq!(assignment[r], None);
        assert!(assignment.iter().all(|&j| j != Some(s)));
        assert_eq!(assignment.iter().filter(|j| j.is_some()).count(), n - 1);
        assert_eq!(total_cost(&assignment, icosts), expected, "n={} costs={:?}", n, costs);
    }
}

#[test]
fn test_forbidden_pairs() {
    let inf = i32::max_value();
    // the only perfect matching uses the expensive pairs
    #[rustfmt::skip]
    let costs = [
        [  1, inf, 100],
        [  2, inf, inf],
        [inf,   5,   1],
    ];
    let (value, assignment) = hungarian(3, 3, |i, j| costs[i][j]);
    assert_eq!(assignment, vec![Some(2), Some(0), Some(1)]);
    assert_eq!(value, 107);

    // two real columns cannot be used, the third goes to the cheaper row
    let (value, assignment) = hungarian(2, 3, |i, j| if j < 2 { inf } else { i as i32 + 1 });
    assert_eq!(assignment, vec![Some(2), None, None]);
    assert_eq!(value, 1);

    // no pair is allowed at all
    let (value, assignment) = hungarian(3, 2, |_, _| inf);
    assert_eq!(value, 0);
    assert_eq!(assignment, vec![None, None, None]);
}
