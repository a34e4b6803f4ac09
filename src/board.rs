//! Ground-truth board support: mine placement, hint calculation, and a
//! game session that plays the server/executor role against the engine.
//!
//! The engine itself never sees a `MineField`; it only reads the
//! `GridState` snapshot the session maintains. The session exists so the
//! crate can self-play (and so tests can check deductions against ground
//! truth).

use crate::rng::GameRng;
use crate::solver;
use crate::types::{Cell, GridState, Move, NeighborCache};
use serde::Serialize;

/// True mine layout for one game. Flat row-major storage, 1 = mine.
#[derive(Clone)]
pub struct MineField {
    pub rows: usize,
    pub cols: usize,
    cells: Vec<u8>,
}

impl MineField {
    pub fn new(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            cells: vec![0; rows * cols],
        }
    }

    /// Build a field from a flat row-major mask (any nonzero byte = mine).
    pub fn from_flat(rows: usize, cols: usize, flat: &[u8]) -> Self {
        Self {
            rows,
            cols,
            cells: flat.iter().map(|&b| (b != 0) as u8).collect(),
        }
    }

    #[inline(always)]
    pub fn get(&self, row: usize, col: usize) -> bool {
        self.cells[row * self.cols + col] != 0
    }

    #[inline(always)]
    pub fn set(&mut self, row: usize, col: usize, val: bool) {
        self.cells[row * self.cols + col] = val as u8;
    }

    /// Count total mines on the field.
    pub fn count(&self) -> usize {
        self.cells.iter().filter(|&&v| v != 0).count()
    }

    pub fn as_flat(&self) -> &[u8] {
        &self.cells
    }

    /// Place `mine_count` mines randomly, skipping cells within
    /// `safe_radius` (Chebyshev distance) of `(safe_row, safe_col)`.
    pub fn place_random(
        rows: usize,
        cols: usize,
        mine_count: usize,
        safe_row: usize,
        safe_col: usize,
        safe_radius: usize,
        rng: &mut GameRng,
    ) -> Self {
        let mut field = MineField::new(rows, cols);
        let mut placed = 0;
        let mut attempts = 0;
        let max_placement_attempts = 100_000;

        while placed < mine_count && attempts < max_placement_attempts {
            attempts += 1;
            let row = rng.gen_range(rows);
            let col = rng.gen_range(cols);

            // Check exclusion zone
            let dr = safe_row.abs_diff(row);
            let dc = safe_col.abs_diff(col);
            if dr <= safe_radius && dc <= safe_radius {
                continue;
            }

            if !field.get(row, col) {
                field.set(row, col, true);
                placed += 1;
            }
        }

        field
    }
}

/// Hint value (0-8) for every cell: count of mines among its 8 neighbors.
/// Mine cells keep value 0; the engine never reads their hints.
pub fn calculate_hints(field: &MineField, nc: &NeighborCache) -> Vec<u8> {
    let mut hints = vec![0u8; field.rows * field.cols];
    for row in 0..field.rows {
        for col in 0..field.cols {
            if field.get(row, col) {
                continue;
            }
            let mut count = 0u8;
            for &(nr, ncol) in nc.get(row, col) {
                if field.get(nr, ncol) {
                    count += 1;
                }
            }
            hints[row * field.cols + col] = count;
        }
    }
    hints
}

/// Stand-in for the external feed and executor: applies the engine's
/// moves to a ground-truth field and keeps the `GridState` snapshot in
/// sync, exactly one move per decision cycle.
pub struct GameSession {
    field: MineField,
    hints: Vec<u8>,
    grid: GridState,
    exploded: bool,
}

impl GameSession {
    pub fn new(field: MineField, nc: &NeighborCache) -> Self {
        let hints = calculate_hints(&field, nc);
        let grid = GridState::new(field.rows, field.cols, field.count());
        Self {
            field,
            hints,
            grid,
            exploded: false,
        }
    }

    /// The snapshot the engine reasons over.
    pub fn grid(&self) -> &GridState {
        &self.grid
    }

    pub fn field(&self) -> &MineField {
        &self.field
    }

    pub fn exploded(&self) -> bool {
        self.exploded
    }

    /// All non-mine cells revealed and nothing detonated.
    pub fn is_won(&self) -> bool {
        !self.exploded
            && self.grid.revealed_count() == self.field.rows * self.field.cols - self.field.count()
    }

    /// Reveal a cell. Detonates on a mine; zeros cascade to their whole
    /// connected region, as the server would.
    pub fn reveal(&mut self, nc: &NeighborCache, row: usize, col: usize) {
        if self.field.get(row, col) {
            self.exploded = true;
            return;
        }

        let mut stack = vec![(row, col)];
        while let Some((r, c)) = stack.pop() {
            if !self.grid.get(r, c).is_unknown() {
                continue;
            }
            let hint = self.hints[r * self.field.cols + c];
            self.grid.set(r, c, Cell::Revealed(hint));
            if hint == 0 {
                for &(nr, ncol) in nc.get(r, c) {
                    if self.grid.get(nr, ncol).is_unknown() && !self.field.get(nr, ncol) {
                        stack.push((nr, ncol));
                    }
                }
            }
        }
    }

    /// Mark a cell as a mine in the snapshot. The session does not police
    /// wrong marks; soundness tests check them against the field.
    pub fn mark(&mut self, row: usize, col: usize) {
        if self.grid.get(row, col).is_unknown() {
            self.grid.set(row, col, Cell::Marked);
        }
    }

    /// Reveal every unknown, unmarked neighbor of `(row, col)`.
    pub fn auto_explore(&mut self, nc: &NeighborCache, row: usize, col: usize) {
        for &(nr, ncol) in nc.get(row, col) {
            if self.grid.get(nr, ncol).is_unknown() {
                self.reveal(nc, nr, ncol);
                if self.exploded {
                    return;
                }
            }
        }
    }

    /// Execute one move from the engine.
    pub fn apply(&mut self, nc: &NeighborCache, mv: Move) {
        match mv {
            Move::Reveal { row, col } => self.reveal(nc, row, col),
            Move::Mark { row, col } => self.mark(row, col),
            Move::AutoExplore { row, col } => self.auto_explore(nc, row, col),
        }
    }
}

/// Outcome of a self-played game.
#[derive(Clone, Copy, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayOutcome {
    pub won: bool,
    pub exploded: bool,
    pub moves: u32,
}

/// Self-play driver: reveal the start cell, then run decide/apply cycles
/// until the game is won, a mine detonates, the engine has nothing left
/// to do, or the move budget runs out.
pub fn play(
    session: &mut GameSession,
    nc: &NeighborCache,
    start_row: usize,
    start_col: usize,
    max_moves: u32,
) -> PlayOutcome {
    session.reveal(nc, start_row, start_col);

    let mut moves = 0u32;
    while !session.exploded() && !session.is_won() && moves < max_moves {
        let Some(mv) = solver::decide(session.grid(), nc) else {
            break;
        };
        session.apply(nc, mv);
        moves += 1;
    }

    PlayOutcome {
        won: session.is_won(),
        exploded: session.exploded(),
        moves,
    }
}
