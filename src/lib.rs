//! Automated Minesweeper decision engine.
//!
//! The core (`types` + `solver`) turns a partially revealed grid of hints
//! into one move per decision cycle: direct deduction first, then pairwise
//! constraint reasoning, then a risk-based guess. `board` supplies the
//! ground-truth side (placement, hints, a session that plays the
//! server/executor role) for self-play and testing.
//!
//! The WASM surface exports high-level functions callable from JavaScript
//! via wasm-bindgen; the JS host acts as the feed/executor. Grid snapshots
//! cross the boundary as flat row-major `Uint8Array`s of feed symbols:
//! `?` = unknown, `0`-`8` = revealed hint, `@` = marked mine.

pub mod board;
pub mod rng;
pub mod solver;
pub mod types;

// ─── WASM Exports (only compiled for wasm32 target) ─────────────────────────

#[cfg(target_arch = "wasm32")]
mod wasm_exports {
    use crate::board::{self, GameSession, MineField};
    use crate::rng::GameRng;
    use crate::solver;
    use crate::types::{GridState, NeighborCache};
    use wasm_bindgen::prelude::*;

    /// Decide the next move for a feed snapshot.
    /// Returns `{ type, row, col }` or `null` when the grid is resolved.
    #[wasm_bindgen(js_name = "decideMove")]
    pub fn wasm_decide_move(
        rows: usize,
        cols: usize,
        total_mines: usize,
        map_flat: &[u8],
    ) -> JsValue {
        let mut grid = GridState::new(rows, cols, total_mines);
        grid.update_from_feed(map_flat);
        let nc = NeighborCache::new(rows, cols);

        match solver::decide(&grid, &nc) {
            Some(mv) => serde_wasm_bindgen::to_value(&mv).unwrap_or(JsValue::NULL),
            None => JsValue::NULL,
        }
    }

    /// Generate a random mine field with a safe zone.
    /// Returns `{ mines: Uint8Array, hints: Uint8Array }`; seed 0 draws
    /// from system entropy.
    #[wasm_bindgen(js_name = "generateField")]
    pub fn wasm_generate_field(
        rows: usize,
        cols: usize,
        mine_count: usize,
        safe_row: usize,
        safe_col: usize,
        safe_radius: usize,
        seed: u64,
    ) -> JsValue {
        let mut rng = if seed == 0 {
            GameRng::new()
        } else {
            GameRng::from_seed(seed)
        };
        let field = MineField::place_random(
            rows, cols, mine_count, safe_row, safe_col, safe_radius, &mut rng,
        );
        let nc = NeighborCache::new(rows, cols);
        let hints = board::calculate_hints(&field, &nc);

        let obj = js_sys::Object::new();

        let mines_arr = js_sys::Uint8Array::new_with_length(field.as_flat().len() as u32);
        mines_arr.copy_from(field.as_flat());
        js_sys::Reflect::set(&obj, &"mines".into(), &mines_arr.into()).unwrap();

        let hints_arr = js_sys::Uint8Array::new_with_length(hints.len() as u32);
        hints_arr.copy_from(&hints);
        js_sys::Reflect::set(&obj, &"hints".into(), &hints_arr.into()).unwrap();

        obj.into()
    }

    /// Self-play a full game on the given mine layout.
    /// Returns `{ won, exploded, moves }`.
    #[wasm_bindgen(js_name = "playGame")]
    pub fn wasm_play_game(
        rows: usize,
        cols: usize,
        mines_flat: &[u8],
        start_row: usize,
        start_col: usize,
        max_moves: u32,
    ) -> JsValue {
        let field = MineField::from_flat(rows, cols, mines_flat);
        let nc = NeighborCache::new(rows, cols);
        let mut session = GameSession::new(field, &nc);

        let outcome = board::play(&mut session, &nc, start_row, start_col, max_moves);
        serde_wasm_bindgen::to_value(&outcome).unwrap_or(JsValue::NULL)
    }

    /// Ping function to verify WASM is loaded.
    #[wasm_bindgen(js_name = "ping")]
    pub fn wasm_ping() -> String {
        "autosweeper ready".to_string()
    }
}
