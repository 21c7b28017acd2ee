//! Elo win probability and the overall-rating solver.
//!
//! The overall rating of a vote is the rating `m` of a hypothetical solver
//! whose chance of beating both the thinking score and the implementing score
//! (treated as two independent opponents) crosses a target probability.

use crate::constants::{ELO_SCALE, MAX_RATING_BOUND, MIN_RATING_BOUND, SOLVER_EPS};

/// Target product at which `m` is an even match against both opponents
/// (0.5 × 0.5). With this target `overall_rating(x, x) ≈ x`.
pub const BALANCED_TARGET: f64 = 0.25;

/// Expected score of a player rated `a` against a player rated `b`.
pub fn win_probability(a: f64, b: f64) -> f64 {
    1.0 / (1.0 + 10.0_f64.powf((b - a) / ELO_SCALE))
}

/// Composite difficulty of a (thinking, implementing) pair.
pub fn overall_rating(thinking: f64, implementing: f64) -> f64 {
    solve_overall(thinking, implementing, BALANCED_TARGET)
}

/// Bisection over `[MIN_RATING_BOUND, MAX_RATING_BOUND]` for the crossing
/// point of `win_probability(m, x) * win_probability(m, y) > target`.
///
/// Each step moves one bound past `mid` by `SOLVER_EPS`, so the interval
/// halves every iteration and the loop ends after ~25 steps for any input.
/// The result is within `2 * SOLVER_EPS` of the true crossing point when it
/// lies inside the search interval, and clamps to the nearest bound otherwise.
pub fn solve_overall(x: f64, y: f64, target: f64) -> f64 {
    let mut left = MIN_RATING_BOUND;
    let mut right = MAX_RATING_BOUND;

    while right - left > SOLVER_EPS {
        let mid = (left + right) / 2.0;
        if win_probability(mid, x) * win_probability(mid, y) > target {
            right = mid - SOLVER_EPS;
        } else {
            left = mid + SOLVER_EPS;
        }
    }

    left
}
