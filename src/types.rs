//! Core data types for the decision engine.
//!
//! The grid uses flat `Vec` storage with row-major layout:
//! `cells[row * cols + col]`, matching the feed's top-to-bottom,
//! left-to-right snapshot order. That order doubles as the engine's
//! tie-break contract: every scan walks cells row-major and every
//! neighborhood walks its offsets row-major, so "first found" is a
//! deterministic, documented choice rather than an iteration accident.

use serde::{Deserialize, Serialize};

/// State of a single cell as known to the engine.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Cell {
    /// Not yet revealed or marked (`?` in the feed).
    Unknown,
    /// Deduced or reported mine (`@` in the feed). Not "revealed" in the
    /// hint sense.
    Marked,
    /// Revealed with a hint: count of mines among the 8 neighbors.
    Revealed(u8),
}

impl Cell {
    /// Decode a feed symbol. Anything outside the feed alphabet degrades
    /// to `Unknown`; the feed is assumed well-formed.
    #[inline]
    pub fn from_symbol(symbol: u8) -> Cell {
        match symbol {
            b'0'..=b'8' => Cell::Revealed(symbol - b'0'),
            b'@' => Cell::Marked,
            _ => Cell::Unknown,
        }
    }

    #[inline(always)]
    pub fn is_unknown(self) -> bool {
        matches!(self, Cell::Unknown)
    }

    #[inline(always)]
    pub fn is_marked(self) -> bool {
        matches!(self, Cell::Marked)
    }

    /// The numeric hint, if this cell is revealed.
    #[inline(always)]
    pub fn hint(self) -> Option<u8> {
        match self {
            Cell::Revealed(h) => Some(h),
            _ => None,
        }
    }
}

/// One action sent to the executor. At most one is issued per decision
/// cycle, always within `[0, rows) x [0, cols)`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Move {
    /// Reveal a single cell.
    Reveal { row: usize, col: usize },
    /// Mark a cell as a mine.
    Mark { row: usize, col: usize },
    /// Batch-reveal all unknown neighbors of a satisfied revealed cell.
    AutoExplore { row: usize, col: usize },
}

impl Move {
    #[inline]
    pub fn row(&self) -> usize {
        match *self {
            Move::Reveal { row, .. } | Move::Mark { row, .. } | Move::AutoExplore { row, .. } => row,
        }
    }

    #[inline]
    pub fn col(&self) -> usize {
        match *self {
            Move::Reveal { col, .. } | Move::Mark { col, .. } | Move::AutoExplore { col, .. } => col,
        }
    }

    /// Wire code used by the classic executor protocol:
    /// 0 = reveal, 1 = mark, 2 = auto-explore.
    #[inline]
    pub fn kind_code(&self) -> u8 {
        match self {
            Move::Reveal { .. } => 0,
            Move::Mark { .. } => 1,
            Move::AutoExplore { .. } => 2,
        }
    }
}

/// Neighborhood classification for one cell: how many of its in-bounds
/// 8-neighbors are unknown, marked, and how many exist at all.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct NeighborCounts {
    pub unknown: u8,
    pub marked: u8,
    pub total: u8,
}

/// The engine's knowledge base for one game.
///
/// Owns the cell matrix plus two derived caches, `known_mine` and
/// `known_safe`, recording conclusions already reflected in the feed.
/// Once a cell is Revealed or Marked it never reverts to Unknown
/// (caller contract; not validated). Out-of-range coordinates are a
/// caller contract violation.
#[derive(Clone)]
pub struct GridState {
    pub rows: usize,
    pub cols: usize,
    pub total_mines: usize,
    cells: Vec<Cell>,
    known_mine: Vec<u8>,
    known_safe: Vec<u8>,
}

impl GridState {
    /// Create a fresh grid with every cell Unknown.
    pub fn new(rows: usize, cols: usize, total_mines: usize) -> Self {
        Self {
            rows,
            cols,
            total_mines,
            cells: vec![Cell::Unknown; rows * cols],
            known_mine: vec![0; rows * cols],
            known_safe: vec![0; rows * cols],
        }
    }

    #[inline(always)]
    fn idx(&self, row: usize, col: usize) -> usize {
        row * self.cols + col
    }

    #[inline(always)]
    pub fn get(&self, row: usize, col: usize) -> Cell {
        self.cells[self.idx(row, col)]
    }

    /// Set a cell's value and refresh the derived known-mine/known-safe
    /// caches for it.
    #[inline]
    pub fn set(&mut self, row: usize, col: usize, cell: Cell) {
        let i = self.idx(row, col);
        self.cells[i] = cell;
        match cell {
            Cell::Revealed(_) => self.known_safe[i] = 1,
            Cell::Marked => self.known_mine[i] = 1,
            Cell::Unknown => {}
        }
    }

    #[inline(always)]
    pub fn in_bounds(&self, row: usize, col: usize) -> bool {
        row < self.rows && col < self.cols
    }

    #[inline(always)]
    pub fn known_mine(&self, row: usize, col: usize) -> bool {
        self.known_mine[self.idx(row, col)] != 0
    }

    #[inline(always)]
    pub fn known_safe(&self, row: usize, col: usize) -> bool {
        self.known_safe[self.idx(row, col)] != 0
    }

    /// Ingest a full row-major feed snapshot (`?`, `0`-`8`, `@`), one
    /// symbol per cell. The snapshot length must be `rows * cols`.
    pub fn update_from_feed(&mut self, symbols: &[u8]) {
        for row in 0..self.rows {
            for col in 0..self.cols {
                let symbol = symbols[row * self.cols + col];
                let cell = Cell::from_symbol(symbol);
                if !cell.is_unknown() {
                    self.set(row, col, cell);
                }
            }
        }
    }

    /// Build a grid from newline-separated feed rows. Test convenience.
    pub fn from_lines(total_mines: usize, lines: &str) -> Self {
        let rows: Vec<&str> = lines.lines().filter(|l| !l.is_empty()).collect();
        let height = rows.len();
        let width = rows.first().map_or(0, |r| r.len());
        let mut grid = GridState::new(height, width, total_mines);
        let flat: Vec<u8> = rows.concat().into_bytes();
        grid.update_from_feed(&flat);
        grid
    }

    pub fn unknown_count(&self) -> usize {
        self.cells.iter().filter(|c| c.is_unknown()).count()
    }

    pub fn marked_count(&self) -> usize {
        self.cells.iter().filter(|c| c.is_marked()).count()
    }

    pub fn revealed_count(&self) -> usize {
        self.cells.iter().filter(|c| c.hint().is_some()).count()
    }

    /// Classify the 8-neighborhood of `(row, col)`. Pure query: revealed
    /// neighbors count toward `total` only.
    pub fn neighbor_counts(&self, nc: &NeighborCache, row: usize, col: usize) -> NeighborCounts {
        let mut counts = NeighborCounts {
            unknown: 0,
            marked: 0,
            total: 0,
        };
        for &(nr, ncol) in nc.get(row, col) {
            counts.total += 1;
            match self.get(nr, ncol) {
                Cell::Unknown => counts.unknown += 1,
                Cell::Marked => counts.marked += 1,
                Cell::Revealed(_) => {}
            }
        }
        counts
    }
}

/// Pre-computed neighbor cache for all cells.
///
/// Stores the 8-directional neighbors (clipped to grid bounds) for every
/// cell, in fixed row-major offset order (`dr` outer, `dc` inner). Indexed
/// by `row * cols + col`; each entry is a slice of `(row, col)` pairs.
pub struct NeighborCache {
    pub rows: usize,
    pub cols: usize,
    /// Flat storage of all neighbor pairs.
    data: Vec<(usize, usize)>,
    /// offsets[i] = start index in `data` for cell i.
    /// offsets[i+1] - offsets[i] = number of neighbors for cell i.
    offsets: Vec<usize>,
}

impl NeighborCache {
    /// Build the neighbor cache for a grid of the given dimensions.
    pub fn new(rows: usize, cols: usize) -> Self {
        let total = rows * cols;
        let mut data = Vec::with_capacity(total * 8);
        let mut offsets = Vec::with_capacity(total + 1);

        for row in 0..rows {
            for col in 0..cols {
                offsets.push(data.len());
                for dr in -1i32..=1 {
                    for dc in -1i32..=1 {
                        if dr == 0 && dc == 0 {
                            continue;
                        }
                        let nr = row as i32 + dr;
                        let ncol = col as i32 + dc;
                        if nr >= 0 && nr < rows as i32 && ncol >= 0 && ncol < cols as i32 {
                            data.push((nr as usize, ncol as usize));
                        }
                    }
                }
            }
        }
        offsets.push(data.len()); // sentinel

        Self {
            rows,
            cols,
            data,
            offsets,
        }
    }

    /// Get the pre-computed neighbors for cell (row, col).
    #[inline(always)]
    pub fn get(&self, row: usize, col: usize) -> &[(usize, usize)] {
        let idx = row * self.cols + col;
        let start = self.offsets[idx];
        let end = self.offsets[idx + 1];
        &self.data[start..end]
    }
}
