//! Decision engine — all reasoning passes. Contains:
//! - Pass 1: Direct deduction (single-cell counting rules)
//! - Pass 2: Pairwise constraints (subset/difference reasoning in a 5x5 window)
//! - Pass 3: Risk estimation (probabilistic fallback guess)
//! - Top-level `decide()`
//!
//! One call to `decide()` issues at most one move. All passes scan cells
//! row-major and pick the first satisfying cell, so identical snapshots
//! always produce identical moves.

use crate::types::{Cell, GridState, Move, NeighborCache};

/// Risk sentinel returned for cells that are not Unknown. Real estimates
/// always lie in [0, 1].
pub const RISK_NOT_UNKNOWN: f64 = 2.0;

// ─── Pass 1: Direct Deduction ───────────────────────────────────────────────

/// Single-cell reasoning over every revealed cell with hint `h`:
/// - marked == h and unknowns remain: every unknown neighbor is safe,
///   batch-reveal them via AutoExplore on this cell.
/// - unknown + marked == h: every unknown neighbor is a mine, mark the
///   first one in neighbor order.
///
/// Returns after the first deduction found.
pub fn direct_pass(grid: &GridState, nc: &NeighborCache) -> Option<Move> {
    for row in 0..grid.rows {
        for col in 0..grid.cols {
            let Some(hint) = grid.get(row, col).hint() else {
                continue;
            };
            let counts = grid.neighbor_counts(nc, row, col);
            if counts.unknown == 0 {
                continue;
            }

            if counts.marked == hint {
                return Some(Move::AutoExplore { row, col });
            }

            if counts.unknown + counts.marked == hint {
                for &(nr, ncol) in nc.get(row, col) {
                    if grid.get(nr, ncol).is_unknown() {
                        return Some(Move::Mark { row: nr, col: ncol });
                    }
                }
            }
        }
    }
    None
}

// ─── Pass 2: Pairwise Constraints ───────────────────────────────────────────

/// The mine-count obligation one revealed cell places on its unknown
/// neighbors. Ephemeral: recomputed each decision cycle, never persisted.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Constraint {
    pub row: usize,
    pub col: usize,
    /// Mines still unaccounted for: hint minus marked neighbors.
    pub remaining: i32,
    /// Unknown neighbor coordinates in fixed row-major neighbor order.
    pub unknowns: Vec<(usize, usize)>,
}

impl Constraint {
    /// Build the constraint for `(row, col)`, or None if the cell is not
    /// revealed or has no unknown neighbors.
    pub fn at(grid: &GridState, nc: &NeighborCache, row: usize, col: usize) -> Option<Constraint> {
        let hint = grid.get(row, col).hint()?;
        let mut marked = 0i32;
        let mut unknowns = Vec::new();
        for &(nr, ncol) in nc.get(row, col) {
            match grid.get(nr, ncol) {
                Cell::Unknown => unknowns.push((nr, ncol)),
                Cell::Marked => marked += 1,
                Cell::Revealed(_) => {}
            }
        }
        if unknowns.is_empty() {
            return None;
        }
        Some(Constraint {
            row,
            col,
            remaining: hint as i32 - marked,
            unknowns,
        })
    }
}

/// Split two constraints' unknown sets into shared and exclusive parts.
/// Each part keeps the row-major order of the side it came from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Partition {
    pub common: Vec<(usize, usize)>,
    pub unique_a: Vec<(usize, usize)>,
    pub unique_b: Vec<(usize, usize)>,
}

pub fn partition(a: &Constraint, b: &Constraint) -> Partition {
    let mut common = Vec::new();
    let mut unique_a = Vec::new();
    for &cell in &a.unknowns {
        if b.unknowns.contains(&cell) {
            common.push(cell);
        } else {
            unique_a.push(cell);
        }
    }
    let unique_b: Vec<(usize, usize)> = b
        .unknowns
        .iter()
        .filter(|cell| !a.unknowns.contains(cell))
        .copied()
        .collect();
    Partition {
        common,
        unique_a,
        unique_b,
    }
}

/// Outcome of the pairwise rule table.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PairDeduction {
    /// Cells unique to A are safe.
    SafeUniqueA,
    /// Cells unique to B are safe.
    SafeUniqueB,
    /// Cells unique to A are mines.
    MineUniqueA,
    /// Cells unique to B are mines.
    MineUniqueB,
    /// Unique cells on both sides are safe.
    SafeAllUnique,
}

/// Pure rule table for a pair of overlapping constraints. Pairwise policy
/// lives here, separated from the window scan; rules are evaluated in a
/// fixed order and the first match wins.
pub fn pair_rule(
    rem_a: i32,
    rem_b: i32,
    common: usize,
    unique_a: usize,
    unique_b: usize,
) -> Option<PairDeduction> {
    if rem_a == common as i32 && unique_a > 0 {
        return Some(PairDeduction::SafeUniqueA);
    }
    if rem_b == common as i32 && unique_b > 0 {
        return Some(PairDeduction::SafeUniqueB);
    }
    if unique_a == 0 && unique_b > 0 {
        // A's unknowns are a subset of B's
        if rem_a == common as i32 {
            return Some(PairDeduction::SafeUniqueB);
        }
        if rem_a == 0 && rem_b == unique_b as i32 {
            return Some(PairDeduction::MineUniqueB);
        }
        return None;
    }
    if unique_b == 0 && unique_a > 0 {
        if rem_b == common as i32 {
            return Some(PairDeduction::SafeUniqueA);
        }
        if rem_b == 0 && rem_a == unique_a as i32 {
            return Some(PairDeduction::MineUniqueA);
        }
        return None;
    }
    if unique_a > 0 && unique_b > 0 && common > 0 {
        let diff = rem_b - rem_a;
        if diff == unique_b as i32 && diff > 0 {
            return Some(PairDeduction::MineUniqueB);
        }
        if diff == 0 && unique_a == unique_b {
            return Some(PairDeduction::SafeAllUnique);
        }
    }
    None
}

/// Subset/difference reasoning between pairs of revealed cells whose
/// neighborhoods overlap. For each revealed cell A (row-major) every
/// revealed cell B within a 5x5 window is considered; both must carry at
/// least one unknown neighbor. The A==B offset is harmless: identical
/// unknown sets match no rule.
///
/// Bounded-window approximation of general subset reasoning: the pass
/// stops at the first deduction rather than propagating maximally, which
/// caps the cost at O(rows * cols * 25 * 9) per cycle.
pub fn pairwise_pass(grid: &GridState, nc: &NeighborCache) -> Option<Move> {
    for row in 0..grid.rows {
        for col in 0..grid.cols {
            let Some(a) = Constraint::at(grid, nc, row, col) else {
                continue;
            };

            for dr in -2i32..=2 {
                for dc in -2i32..=2 {
                    let br = row as i32 + dr;
                    let bc = col as i32 + dc;
                    if br < 0 || br >= grid.rows as i32 || bc < 0 || bc >= grid.cols as i32 {
                        continue;
                    }
                    let Some(b) = Constraint::at(grid, nc, br as usize, bc as usize) else {
                        continue;
                    };

                    let parts = partition(&a, &b);
                    let rule = pair_rule(
                        a.remaining,
                        b.remaining,
                        parts.common.len(),
                        parts.unique_a.len(),
                        parts.unique_b.len(),
                    );

                    if let Some(deduction) = rule {
                        let mv = match deduction {
                            PairDeduction::SafeUniqueA => {
                                let (r, c) = parts.unique_a[0];
                                Move::Reveal { row: r, col: c }
                            }
                            PairDeduction::SafeUniqueB => {
                                let (r, c) = parts.unique_b[0];
                                Move::Reveal { row: r, col: c }
                            }
                            PairDeduction::MineUniqueA => {
                                let (r, c) = parts.unique_a[0];
                                Move::Mark { row: r, col: c }
                            }
                            PairDeduction::MineUniqueB => {
                                let (r, c) = parts.unique_b[0];
                                Move::Mark { row: r, col: c }
                            }
                            PairDeduction::SafeAllUnique => {
                                // Each unique list is already row-major, so
                                // the union's first cell is the lesser head.
                                let (r, c) = parts.unique_a[0].min(parts.unique_b[0]);
                                Move::Reveal { row: r, col: c }
                            }
                        };
                        return Some(mv);
                    }
                }
            }
        }
    }
    None
}

// ─── Pass 3: Risk Estimation ────────────────────────────────────────────────

/// Estimated mine probability for an Unknown cell, from its locally
/// visible constraints.
///
/// Each revealed numeric neighbor contributes `(hint - marked) / unknown`;
/// the estimate is the maximum across them — the most pessimistic local
/// view, not an average. Cells with no constraining neighbor fall back to
/// the global ratio `(total_mines - marked) / unknown_cells` (0.5 on a
/// grid with no unknowns at all). Non-Unknown cells get the
/// `RISK_NOT_UNKNOWN` sentinel.
pub fn risk(grid: &GridState, nc: &NeighborCache, row: usize, col: usize) -> f64 {
    if !grid.get(row, col).is_unknown() {
        return RISK_NOT_UNKNOWN;
    }

    let mut worst: Option<f64> = None;
    for &(nr, ncol) in nc.get(row, col) {
        let Some(hint) = grid.get(nr, ncol).hint() else {
            continue;
        };
        let counts = grid.neighbor_counts(nc, nr, ncol);
        if counts.unknown == 0 {
            continue;
        }
        let local = (hint as f64 - counts.marked as f64) / counts.unknown as f64;
        worst = Some(worst.map_or(local, |w: f64| w.max(local)));
    }

    match worst {
        Some(p) => p,
        None => global_risk(grid),
    }
}

fn global_risk(grid: &GridState) -> f64 {
    let unknown = grid.unknown_count();
    if unknown == 0 {
        return 0.5;
    }
    (grid.total_mines as f64 - grid.marked_count() as f64) / unknown as f64
}

/// Least-risky guess when no deduction applies.
///
/// Among Unknown cells with at least one adjacent revealed number: minimum
/// risk wins, ties prefer more adjacent revealed numbers (more future
/// information), remaining ties keep the first cell in row-major order.
/// With no constrained Unknown cell (pure opening move) the choice is
/// positional: the first corner found, else the first edge cell, else the
/// first Unknown cell. Returns None only when no Unknown cell exists.
pub fn best_guess(grid: &GridState, nc: &NeighborCache) -> Option<Move> {
    let mut best: Option<(f64, usize, usize, usize)> = None;

    for row in 0..grid.rows {
        for col in 0..grid.cols {
            if !grid.get(row, col).is_unknown() {
                continue;
            }
            let numbered = nc
                .get(row, col)
                .iter()
                .filter(|&&(nr, ncol)| grid.get(nr, ncol).hint().is_some())
                .count();
            if numbered == 0 {
                continue;
            }
            let estimate = risk(grid, nc, row, col);
            let better = match best {
                None => true,
                Some((best_risk, best_numbered, _, _)) => {
                    estimate < best_risk || (estimate == best_risk && numbered > best_numbered)
                }
            };
            if better {
                best = Some((estimate, numbered, row, col));
            }
        }
    }

    if let Some((_, _, row, col)) = best {
        return Some(Move::Reveal { row, col });
    }

    // Opening move: no revealed number constrains anything yet.
    let mut edge = None;
    let mut any = None;
    for row in 0..grid.rows {
        for col in 0..grid.cols {
            if !grid.get(row, col).is_unknown() {
                continue;
            }
            let corner_row = row == 0 || row == grid.rows - 1;
            let corner_col = col == 0 || col == grid.cols - 1;
            if corner_row && corner_col {
                return Some(Move::Reveal { row, col });
            }
            if (corner_row || corner_col) && edge.is_none() {
                edge = Some((row, col));
            }
            if any.is_none() {
                any = Some((row, col));
            }
        }
    }
    edge.or(any).map(|(row, col)| Move::Reveal { row, col })
}

// ─── Top-level: decide ──────────────────────────────────────────────────────

/// One decision cycle: direct deduction, then pairwise constraints, then
/// the risk-based guess. Exactly one move is returned while any Unknown
/// cell exists; None means the grid is fully resolved and the game is
/// presumed complete.
pub fn decide(grid: &GridState, nc: &NeighborCache) -> Option<Move> {
    direct_pass(grid, nc)
        .or_else(|| pairwise_pass(grid, nc))
        .or_else(|| best_guess(grid, nc))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid_and_cache(total_mines: usize, lines: &str) -> (GridState, NeighborCache) {
        let grid = GridState::from_lines(total_mines, lines);
        let nc = NeighborCache::new(grid.rows, grid.cols);
        (grid, nc)
    }

    // ── direct deduction ──

    #[test]
    fn test_direct_auto_explore_when_satisfied() {
        // (0,0)="1" has its single mine marked at (0,1); (1,0),(1,1) are safe
        let (grid, nc) = grid_and_cache(1, "1@\n??");
        assert_eq!(direct_pass(&grid, &nc), Some(Move::AutoExplore { row: 0, col: 0 }));
    }

    #[test]
    fn test_direct_zero_hint_triggers_auto_explore() {
        // A "0" with unknown neighbors must immediately classify them safe
        let (grid, nc) = grid_and_cache(0, "0?\n??");
        assert_eq!(decide(&grid, &nc), Some(Move::AutoExplore { row: 0, col: 0 }));
    }

    #[test]
    fn test_direct_marks_forced_mine() {
        // (0,0)="1" with exactly one unknown neighbor left
        let (grid, nc) = grid_and_cache(1, "11\n1?");
        assert_eq!(direct_pass(&grid, &nc), Some(Move::Mark { row: 1, col: 1 }));
    }

    #[test]
    fn test_direct_mark_picks_first_in_neighbor_order() {
        // (1,1)="8": every neighbor is a mine; first in offset order is (0,0)
        let (grid, nc) = grid_and_cache(8, "???\n?8?\n???");
        assert_eq!(direct_pass(&grid, &nc), Some(Move::Mark { row: 0, col: 0 }));
    }

    #[test]
    fn test_direct_no_deduction() {
        let (grid, nc) = grid_and_cache(1, "???\n12?\n01?");
        assert_eq!(direct_pass(&grid, &nc), None);
    }

    // ── constraints and partition ──

    #[test]
    fn test_constraint_at() {
        let (grid, nc) = grid_and_cache(1, "???\n12?\n01?");
        let a = Constraint::at(&grid, &nc, 1, 0).unwrap();
        assert_eq!(a.remaining, 1);
        assert_eq!(a.unknowns, vec![(0, 0), (0, 1)]);

        // Unknown cell has no constraint; neither does a hint cell with
        // no unknown neighbors
        assert!(Constraint::at(&grid, &nc, 0, 0).is_none());
        assert!(Constraint::at(&grid, &nc, 2, 0).is_none());
    }

    #[test]
    fn test_constraint_discounts_marked() {
        let (grid, nc) = grid_and_cache(2, "2@\n??");
        let c = Constraint::at(&grid, &nc, 0, 0).unwrap();
        assert_eq!(c.remaining, 1);
        assert_eq!(c.unknowns, vec![(1, 0), (1, 1)]);
    }

    #[test]
    fn test_partition_splits_sets() {
        let a = Constraint {
            row: 1,
            col: 0,
            remaining: 1,
            unknowns: vec![(0, 0), (0, 1)],
        };
        let b = Constraint {
            row: 1,
            col: 1,
            remaining: 2,
            unknowns: vec![(0, 0), (0, 1), (0, 2), (1, 2), (2, 2)],
        };
        let parts = partition(&a, &b);
        assert_eq!(parts.common, vec![(0, 0), (0, 1)]);
        assert!(parts.unique_a.is_empty());
        assert_eq!(parts.unique_b, vec![(0, 2), (1, 2), (2, 2)]);
    }

    // ── rule table ──

    #[test]
    fn test_rule_safe_when_mines_fit_common() {
        assert_eq!(pair_rule(2, 3, 2, 1, 2), Some(PairDeduction::SafeUniqueA));
        assert_eq!(pair_rule(3, 2, 2, 2, 1), Some(PairDeduction::SafeUniqueB));
    }

    #[test]
    fn test_rule_subset_mines() {
        // A ⊆ B, A needs nothing, B's remainder fills its unique cells
        assert_eq!(pair_rule(0, 2, 1, 0, 2), Some(PairDeduction::MineUniqueB));
        assert_eq!(pair_rule(2, 0, 1, 2, 0), Some(PairDeduction::MineUniqueA));
    }

    #[test]
    fn test_rule_difference_mines() {
        // diff = remB - remA equals |uniqueB|
        assert_eq!(pair_rule(1, 4, 2, 1, 3), Some(PairDeduction::MineUniqueB));
    }

    #[test]
    fn test_rule_equal_remainders_safe() {
        assert_eq!(pair_rule(2, 2, 1, 2, 2), Some(PairDeduction::SafeAllUnique));
    }

    #[test]
    fn test_rule_order_first_match_wins() {
        // remA == |common| fires before the general-overlap branch
        assert_eq!(pair_rule(1, 1, 1, 1, 1), Some(PairDeduction::SafeUniqueA));
    }

    #[test]
    fn test_rule_no_match() {
        assert_eq!(pair_rule(1, 2, 3, 2, 3), None);
        // identical unknown sets (A paired with itself) match nothing
        assert_eq!(pair_rule(1, 1, 2, 0, 0), None);
    }

    // ── pairwise pass ──

    #[test]
    fn test_pairwise_reveals_outside_common() {
        // A=(1,0)"1" unknowns {(0,0),(0,1)}; B=(1,1)"2" adds {(0,2),(1,2),(2,2)}.
        // remB == |common| → uniqueB is safe, first row-major is (0,2).
        let (grid, nc) = grid_and_cache(1, "???\n12?\n01?");
        assert_eq!(pairwise_pass(&grid, &nc), Some(Move::Reveal { row: 0, col: 2 }));
    }

    #[test]
    fn test_pairwise_marks_subset_mine() {
        // A=(1,1)"2" is satisfied by the two marks, so its unknowns
        // {(0,1),(0,2)} hold no mines. B=(1,2)"1" adds (0,3) and still
        // needs one mine: (0,3) must be it.
        let (grid, nc) = grid_and_cache(4, "@????\n@2122");
        assert_eq!(pairwise_pass(&grid, &nc), Some(Move::Mark { row: 0, col: 3 }));
    }

    #[test]
    fn test_pairwise_no_deduction_without_overlap_information() {
        // Single lonely constraint: nothing to pair against but itself.
        let (grid, nc) = grid_and_cache(1, "1?\n??");
        assert_eq!(pairwise_pass(&grid, &nc), None);
    }

    // ── risk estimation ──

    #[test]
    fn test_risk_sentinel_for_non_unknown() {
        let (grid, nc) = grid_and_cache(1, "???\n12?\n01?");
        assert_eq!(risk(&grid, &nc, 1, 0), RISK_NOT_UNKNOWN);
        assert_eq!(risk(&grid, &nc, 2, 0), RISK_NOT_UNKNOWN);
    }

    #[test]
    fn test_risk_is_pessimistic_maximum() {
        // (0,0) is constrained by (0,1)="1" (4 unknowns → 0.25) and
        // (1,1)="3" (7 unknowns → 3/7); the estimate takes the maximum.
        let (grid, nc) = grid_and_cache(3, "?1?\n?3?\n???");
        let estimate = risk(&grid, &nc, 0, 0);
        assert!((estimate - 3.0 / 7.0).abs() < 1e-9);
    }

    #[test]
    fn test_risk_bounds_on_constrained_cells() {
        let (grid, nc) = grid_and_cache(1, "???\n12?\n01?");
        for row in 0..3 {
            for col in 0..3 {
                if grid.get(row, col).is_unknown() {
                    let estimate = risk(&grid, &nc, row, col);
                    assert!((0.0..=1.0).contains(&estimate), "risk {estimate} at ({row},{col})");
                }
            }
        }
    }

    #[test]
    fn test_risk_global_fallback() {
        // Unconstrained unknown cells fall back to the global ratio.
        let (grid, nc) = grid_and_cache(2, "????\n????\n????\n????");
        let estimate = risk(&grid, &nc, 2, 2);
        assert!((estimate - 2.0 / 16.0).abs() < 1e-9);
    }

    #[test]
    fn test_guess_prefers_more_informative_tie() {
        // All unknowns share the pessimistic 3/7 estimate from (1,1)="3";
        // (0,0) is first among those with the most adjacent numbers.
        let (grid, nc) = grid_and_cache(3, "?1?\n?3?\n???");
        assert_eq!(best_guess(&grid, &nc), Some(Move::Reveal { row: 0, col: 0 }));
    }

    #[test]
    fn test_opening_guess_takes_first_corner() {
        let (grid, nc) = grid_and_cache(10, "????\n????\n????\n????");
        assert_eq!(best_guess(&grid, &nc), Some(Move::Reveal { row: 0, col: 0 }));
    }

    #[test]
    fn test_opening_guess_falls_back_to_edge() {
        // Corners marked: the first edge cell (0,1) is next in preference.
        let (grid, nc) = grid_and_cache(4, "@?@\n???\n@?@");
        assert_eq!(best_guess(&grid, &nc), Some(Move::Reveal { row: 0, col: 1 }));
    }

    // ── orchestrator ──

    #[test]
    fn test_decide_priority_order() {
        // Direct deduction outranks everything
        let (grid, nc) = grid_and_cache(1, "1@\n??");
        assert_eq!(decide(&grid, &nc), Some(Move::AutoExplore { row: 0, col: 0 }));
    }

    #[test]
    fn test_decide_partial_corner_scenario() {
        // 3x3, mines=1:   ???
        //                 12?
        //                 01?
        // No direct deduction anywhere; the pairwise pass pairs (1,0) with
        // (1,1) and reveals the first cell unique to (1,1).
        let (grid, nc) = grid_and_cache(1, "???\n12?\n01?");
        let mv = decide(&grid, &nc);
        assert_eq!(mv, Some(Move::Reveal { row: 0, col: 2 }));
    }

    #[test]
    fn test_decide_is_deterministic() {
        let (grid, nc) = grid_and_cache(1, "???\n12?\n01?");
        let first = decide(&grid, &nc);
        for _ in 0..5 {
            assert_eq!(decide(&grid, &nc), first);
        }
    }

    #[test]
    fn test_decide_none_when_fully_resolved() {
        let (grid, nc) = grid_and_cache(1, "1@\n11");
        assert_eq!(decide(&grid, &nc), None);
    }

    #[test]
    fn test_decide_guesses_when_nothing_deducible() {
        let (grid, nc) = grid_and_cache(10, "????\n????\n????\n????");
        assert_eq!(decide(&grid, &nc), Some(Move::Reveal { row: 0, col: 0 }));
    }
}
