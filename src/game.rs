//! Game state: board, pieces, rotation and kicks, line clears, scoring, gravity.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::VecDeque;
use std::time::Duration;

/// Board width in columns.
pub const COLS: usize = 10;
/// Board height in rows.
pub const ROWS: usize = 20;

/// Gravity interval at level 1.
const BASE_DROP_MS: u64 = 1000;
/// Gravity interval floor; from level 10 on every level drops at this speed.
const MIN_DROP_MS: u64 = 100;
/// Interval reduction per level above 1.
const DROP_STEP_MS: u64 = 100;

/// Base score for clearing 1..=4 rows with one lock (index = rows cleared).
const CLEAR_SCORES: [u32; 5] = [0, 100, 300, 500, 800];
/// Flat bonus for a hard drop, on top of any clear score.
const HARD_DROP_BONUS: u32 = 20;
/// A level is gained every this many cleared lines.
const LINES_PER_LEVEL: u32 = 10;

/// Tetromino kinds (I, J, L, O, S, T, Z).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PieceKind {
    I,
    J,
    L,
    O,
    S,
    T,
    Z,
}

impl PieceKind {
    pub const ALL: [Self; 7] = [Self::I, Self::J, Self::L, Self::O, Self::S, Self::T, Self::Z];

    /// Template matrix; non-zero cells carry the kind's colour index (1..=7).
    pub fn template(&self) -> &'static [&'static [u8]] {
        match self {
            Self::I => &[&[1, 1, 1, 1]],
            Self::J => &[&[2, 0, 0], &[2, 2, 2]],
            Self::L => &[&[0, 0, 3], &[3, 3, 3]],
            Self::O => &[&[4, 4], &[4, 4]],
            Self::S => &[&[0, 5, 5], &[5, 5, 0]],
            Self::T => &[&[0, 6, 0], &[6, 6, 6]],
            Self::Z => &[&[7, 7, 0], &[0, 7, 7]],
        }
    }

    /// Colour index 1..=7 for theme.piece_color(); 0 is the empty cell.
    pub fn color_index(&self) -> u8 {
        match self {
            Self::I => 1,
            Self::J => 2,
            Self::L => 3,
            Self::O => 4,
            Self::S => 5,
            Self::T => 6,
            Self::Z => 7,
        }
    }
}

/// Falling piece: its own copy of the shape matrix plus a board position.
/// Rotation replaces the matrix wholesale, so templates stay pristine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Piece {
    pub kind: PieceKind,
    /// shape[row][col]; non-zero cells carry the colour index.
    pub shape: Vec<Vec<u8>>,
    pub x: i32,
    pub y: i32,
}

impl Piece {
    /// New piece at the spawn position: horizontally centred (rounding
    /// left), top row at y = 0.
    pub fn spawn(kind: PieceKind) -> Self {
        let shape: Vec<Vec<u8>> = kind.template().iter().map(|row| row.to_vec()).collect();
        let width = shape[0].len() as i32;
        Self {
            kind,
            x: COLS as i32 / 2 - width / 2,
            y: 0,
            shape,
        }
    }

    /// Matrix width in columns.
    #[inline]
    pub fn width(&self) -> usize {
        self.shape.first().map_or(0, Vec::len)
    }

    /// Matrix height in rows.
    #[inline]
    pub fn height(&self) -> usize {
        self.shape.len()
    }
}

/// Clockwise rotation: transpose, then reverse each row.
/// An h×w matrix becomes w×h with new[i][j] = old[h-1-j][i].
fn rotate_clockwise(shape: &[Vec<u8>]) -> Vec<Vec<u8>> {
    let h = shape.len();
    let w = shape.first().map_or(0, Vec::len);
    (0..w)
        .map(|i| (0..h).map(|j| shape[h - 1 - j][i]).collect())
        .collect()
}

/// Board of settled cells. y = 0 is the top; rows[0] is the top row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Board {
    pub width: usize,
    pub height: usize,
    /// rows[y][x] = colour index, 0 = empty.
    rows: VecDeque<Vec<u8>>,
}

impl Board {
    pub fn new(height: usize, width: usize) -> Self {
        let rows = (0..height).map(|_| vec![0; width]).collect();
        Self {
            width,
            height,
            rows,
        }
    }

    /// Cell at (x, y); out-of-range reads as empty.
    #[inline]
    pub fn get(&self, x: usize, y: usize) -> u8 {
        self.rows
            .get(y)
            .and_then(|row| row.get(x))
            .copied()
            .unwrap_or(0)
    }

    #[inline]
    fn set(&mut self, x: usize, y: usize, cell: u8) {
        if let Some(c) = self.rows.get_mut(y).and_then(|row| row.get_mut(x)) {
            *c = cell;
        }
    }

    /// True if any filled cell of the piece overlaps a wall, the floor, or
    /// a settled cell. Rows above the top (y < 0) are only checked against
    /// the side walls, never against contents.
    pub fn collides(&self, piece: &Piece) -> bool {
        for (dy, row) in piece.shape.iter().enumerate() {
            for (dx, &cell) in row.iter().enumerate() {
                if cell == 0 {
                    continue;
                }
                let x = piece.x + dx as i32;
                let y = piece.y + dy as i32;
                if x < 0 || x >= self.width as i32 || y >= self.height as i32 {
                    return true;
                }
                if y >= 0 && self.get(x as usize, y as usize) != 0 {
                    return true;
                }
            }
        }
        false
    }

    /// Write the piece's filled cells into the grid. Cells above the top
    /// are silently dropped.
    pub fn merge(&mut self, piece: &Piece) {
        for (dy, row) in piece.shape.iter().enumerate() {
            for (dx, &cell) in row.iter().enumerate() {
                if cell == 0 {
                    continue;
                }
                let x = piece.x + dx as i32;
                let y = piece.y + dy as i32;
                if x >= 0 && y >= 0 {
                    self.set(x as usize, y as usize, cell);
                }
            }
        }
    }

    /// Remove every full row, sliding the rows above down and refilling the
    /// top with empty rows. Returns how many rows were removed.
    pub fn clear_full_rows(&mut self) -> u32 {
        let mut cleared = 0;
        let mut y = self.height;
        // Bottom-up; a removed row pulls the rows above into the same index,
        // so that index is tested again.
        while y > 0 {
            y -= 1;
            if self.rows[y].iter().all(|&c| c != 0) {
                self.rows.remove(y);
                self.rows.push_front(vec![0; self.width]);
                cleared += 1;
                y += 1;
            }
        }
        cleared
    }
}

/// What a gravity step did; drives sounds and screen changes in the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropOutcome {
    /// Piece moved down one row.
    Descended,
    /// Piece locked into the grid; `cleared` rows were removed.
    Locked { cleared: u32 },
    /// Piece locked and the next piece has no room to spawn.
    GameOver { cleared: u32 },
}

impl DropOutcome {
    /// Rows removed by this step.
    pub fn cleared(&self) -> u32 {
        match self {
            Self::Descended => 0,
            Self::Locked { cleared } | Self::GameOver { cleared } => *cleared,
        }
    }
}

/// One game session: board, pieces, score, and drop timing.
#[derive(Debug)]
pub struct GameState {
    pub board: Board,
    pub current: Option<Piece>,
    pub next: Option<Piece>,
    pub score: u32,
    pub lines: u32,
    pub level: u32,
    pub drop_interval: Duration,
    pub running: bool,
    pub paused: bool,
    /// Time accumulated toward the next gravity step.
    drop_counter: Duration,
    rng: StdRng,
}

impl GameState {
    pub fn new() -> Self {
        Self::with_rng(StdRng::seed_from_u64(rand::rng().random()))
    }

    /// Deterministic piece sequence for tests.
    #[cfg(test)]
    pub fn with_seed(seed: u64) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed))
    }

    fn with_rng(rng: StdRng) -> Self {
        Self {
            board: Board::new(ROWS, COLS),
            current: None,
            next: None,
            score: 0,
            lines: 0,
            level: 1,
            drop_interval: Duration::from_millis(BASE_DROP_MS),
            running: false,
            paused: false,
            drop_counter: Duration::ZERO,
            rng,
        }
    }

    /// Start or restart a session: fresh board and stats, new pieces,
    /// gravity armed. The RNG stream carries over between games.
    pub fn start(&mut self) {
        self.board = Board::new(ROWS, COLS);
        self.score = 0;
        self.lines = 0;
        self.level = 1;
        self.drop_interval = Duration::from_millis(BASE_DROP_MS);
        self.drop_counter = Duration::ZERO;
        self.current = Some(self.spawn_piece());
        self.next = Some(self.spawn_piece());
        self.running = true;
        self.paused = false;
    }

    fn spawn_piece(&mut self) -> Piece {
        let kind = PieceKind::ALL[self.rng.random_range(0..PieceKind::ALL.len())];
        Piece::spawn(kind)
    }

    /// Flip pause. Only meaningful while a game is running.
    pub fn toggle_pause(&mut self) {
        if self.running {
            self.paused = !self.paused;
        }
    }

    /// Advance the gravity clock by `elapsed`; performs at most one drop
    /// step per call, once the accumulated time exceeds the interval.
    pub fn tick(&mut self, elapsed: Duration) -> Option<DropOutcome> {
        if !self.running || self.paused {
            return None;
        }
        self.drop_counter += elapsed;
        if self.drop_counter > self.drop_interval {
            return self.soft_drop();
        }
        None
    }

    /// One gravity step: move the piece down, or lock it and bring in the
    /// next one. Both descending and locking reset the gravity clock, so a
    /// held soft drop keeps the piece moving at the player's rate.
    pub fn soft_drop(&mut self) -> Option<DropOutcome> {
        if !self.running || self.paused {
            return None;
        }
        let piece = self.current.as_mut()?;
        piece.y += 1;
        if !self.board.collides(piece) {
            self.drop_counter = Duration::ZERO;
            return Some(DropOutcome::Descended);
        }
        piece.y -= 1;
        if let Some(locked) = self.current.take() {
            self.board.merge(&locked);
        }
        let cleared = self.board.clear_full_rows();
        self.apply_line_clears(cleared);
        self.current = self.next.take();
        self.next = Some(self.spawn_piece());
        // Top-out: the promoted piece has no room. It stays unmerged so the
        // final board shows only settled cells.
        if self.current.as_ref().is_some_and(|p| self.board.collides(p)) {
            self.running = false;
            return Some(DropOutcome::GameOver { cleared });
        }
        self.drop_counter = Duration::ZERO;
        Some(DropOutcome::Locked { cleared })
    }

    /// Drop the piece straight down and lock it. The flat bonus applies
    /// even when that lock ends the game.
    pub fn hard_drop(&mut self) -> Option<DropOutcome> {
        if !self.running || self.paused {
            return None;
        }
        {
            let piece = self.current.as_mut()?;
            piece.y += 1;
            while !self.board.collides(piece) {
                piece.y += 1;
            }
            piece.y -= 1;
        }
        let outcome = self.soft_drop();
        if outcome.is_some() {
            self.score += HARD_DROP_BONUS;
        }
        outcome
    }

    /// Shift the piece one column left (-1) or right (+1). Returns whether
    /// the move stuck.
    pub fn move_piece(&mut self, dir: i32) -> bool {
        if !self.running || self.paused {
            return false;
        }
        let Some(piece) = self.current.as_mut() else {
            return false;
        };
        piece.x += dir;
        if self.board.collides(piece) {
            piece.x -= dir;
            return false;
        }
        true
    }

    /// Rotate the piece clockwise, kicking it sideways when the turned
    /// shape overlaps something. Offsets grow outward (+1, -2, +3, -4, ...)
    /// and the search gives up once the magnitude passes the rotated
    /// width; on failure the piece is restored exactly as it was. Returns
    /// whether the rotation stuck.
    pub fn rotate(&mut self) -> bool {
        if !self.running || self.paused {
            return false;
        }
        let Some(piece) = self.current.as_mut() else {
            return false;
        };
        let original_shape = std::mem::take(&mut piece.shape);
        let original_x = piece.x;
        piece.shape = rotate_clockwise(&original_shape);
        let width = piece.width() as i32;
        let mut offset = 0;
        while self.board.collides(piece) {
            piece.x += offset;
            offset = -(offset + if offset > 0 { 1 } else { -1 });
            if offset.abs() > width {
                piece.shape = original_shape;
                piece.x = original_x;
                return false;
            }
        }
        true
    }

    /// Score and speed bookkeeping after a lock. The multiplier uses the
    /// level as it was before these lines are counted.
    fn apply_line_clears(&mut self, cleared: u32) {
        if cleared == 0 {
            return;
        }
        let idx = (cleared as usize).min(CLEAR_SCORES.len() - 1);
        self.score += CLEAR_SCORES[idx] * self.level;
        self.lines += cleared;
        self.level = self.lines / LINES_PER_LEVEL + 1;
        let ms = BASE_DROP_MS
            .saturating_sub(u64::from(self.level - 1) * DROP_STEP_MS)
            .max(MIN_DROP_MS);
        self.drop_interval = Duration::from_millis(ms);
    }
}

impl Default for GameState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Piece with an explicit shape and position, for targeted scenarios.
    fn piece_at(kind: PieceKind, shape: &[&[u8]], x: i32, y: i32) -> Piece {
        Piece {
            kind,
            shape: shape.iter().map(|row| row.to_vec()).collect(),
            x,
            y,
        }
    }

    fn fill_row(board: &mut Board, y: usize) {
        for x in 0..board.width {
            board.set(x, y, 7);
        }
    }

    /// Running session with a known board and current piece.
    fn session_with(current: Piece) -> GameState {
        let mut gs = GameState::with_seed(42);
        gs.start();
        gs.board = Board::new(ROWS, COLS);
        gs.current = Some(current);
        gs
    }

    mod board {
        use super::*;

        #[test]
        fn new_board_is_empty() {
            let board = Board::new(ROWS, COLS);
            assert_eq!(board.width, COLS);
            assert_eq!(board.height, ROWS);
            for y in 0..ROWS {
                for x in 0..COLS {
                    assert_eq!(board.get(x, y), 0);
                }
            }
        }

        #[test]
        fn collides_with_left_wall() {
            let board = Board::new(ROWS, COLS);
            let piece = piece_at(PieceKind::O, &[&[4, 4], &[4, 4]], -1, 5);
            assert!(board.collides(&piece));
        }

        #[test]
        fn collides_with_right_wall() {
            let board = Board::new(ROWS, COLS);
            let piece = piece_at(PieceKind::O, &[&[4, 4], &[4, 4]], COLS as i32 - 1, 5);
            assert!(board.collides(&piece));
        }

        #[test]
        fn collides_with_floor() {
            let board = Board::new(ROWS, COLS);
            let piece = piece_at(PieceKind::O, &[&[4, 4], &[4, 4]], 4, ROWS as i32 - 1);
            assert!(board.collides(&piece));
        }

        #[test]
        fn collides_with_settled_cell() {
            let mut board = Board::new(ROWS, COLS);
            board.set(4, 10, 1);
            let piece = piece_at(PieceKind::O, &[&[4, 4], &[4, 4]], 4, 9);
            assert!(board.collides(&piece));
        }

        #[test]
        fn empty_template_cells_do_not_collide() {
            let mut board = Board::new(ROWS, COLS);
            // S's bottom-right template cell is empty; a settled block there
            // must not count as contact.
            board.set(2, 11, 1);
            let piece = piece_at(PieceKind::S, &[&[0, 5, 5], &[5, 5, 0]], 0, 10);
            assert!(!board.collides(&piece));
        }

        #[test]
        fn rows_above_top_only_hit_walls() {
            let mut board = Board::new(ROWS, COLS);
            board.set(0, 0, 1);
            // Vertical I entirely above the board sits over a settled cell,
            // but off-grid rows never test contents.
            let piece = piece_at(PieceKind::I, &[&[1], &[1], &[1], &[1]], 0, -4);
            assert!(!board.collides(&piece));
            let out_left = piece_at(PieceKind::I, &[&[1], &[1], &[1], &[1]], -1, -4);
            assert!(board.collides(&out_left));
        }

        #[test]
        fn merge_writes_colour_indices() {
            let mut board = Board::new(ROWS, COLS);
            let piece = piece_at(PieceKind::T, &[&[0, 6, 0], &[6, 6, 6]], 4, 18);
            board.merge(&piece);
            assert_eq!(board.get(5, 18), 6);
            assert_eq!(board.get(4, 19), 6);
            assert_eq!(board.get(5, 19), 6);
            assert_eq!(board.get(6, 19), 6);
            assert_eq!(board.get(4, 18), 0);
        }

        #[test]
        fn merge_drops_cells_above_top() {
            let mut board = Board::new(ROWS, COLS);
            let piece = piece_at(PieceKind::I, &[&[1], &[1], &[1], &[1]], 3, -2);
            board.merge(&piece);
            assert_eq!(board.get(3, 0), 1);
            assert_eq!(board.get(3, 1), 1);
            // The two off-grid cells vanish without wrapping anywhere.
            for y in 2..ROWS {
                assert_eq!(board.get(3, y), 0);
            }
        }

        #[test]
        fn clear_single_full_row() {
            let mut board = Board::new(ROWS, COLS);
            fill_row(&mut board, 19);
            board.set(0, 18, 3);
            assert_eq!(board.clear_full_rows(), 1);
            // The marker above slides into the cleared row.
            assert_eq!(board.get(0, 19), 3);
            assert_eq!(board.get(1, 19), 0);
            for x in 0..COLS {
                assert_eq!(board.get(x, 0), 0);
            }
        }

        #[test]
        fn clear_adjacent_full_rows_in_one_pass() {
            let mut board = Board::new(ROWS, COLS);
            fill_row(&mut board, 18);
            fill_row(&mut board, 19);
            board.set(0, 17, 5);
            assert_eq!(board.clear_full_rows(), 2);
            assert_eq!(board.get(0, 19), 5);
            assert_eq!(board.get(0, 18), 0);
        }

        #[test]
        fn clear_rows_with_gap_between() {
            let mut board = Board::new(ROWS, COLS);
            fill_row(&mut board, 17);
            fill_row(&mut board, 19);
            board.set(0, 18, 2);
            assert_eq!(board.clear_full_rows(), 2);
            assert_eq!(board.get(0, 19), 2);
            assert_eq!(board.get(0, 18), 0);
        }

        #[test]
        fn partial_rows_survive() {
            let mut board = Board::new(ROWS, COLS);
            for x in 0..COLS - 1 {
                board.set(x, 19, 4);
            }
            assert_eq!(board.clear_full_rows(), 0);
            assert_eq!(board.get(0, 19), 4);
        }
    }

    mod spawning {
        use super::*;

        #[test]
        fn pieces_spawn_centred_at_top() {
            // floor(10/2) - floor(w/2) for each template width.
            assert_eq!(Piece::spawn(PieceKind::I).x, 3);
            assert_eq!(Piece::spawn(PieceKind::O).x, 4);
            for kind in [
                PieceKind::J,
                PieceKind::L,
                PieceKind::S,
                PieceKind::T,
                PieceKind::Z,
            ] {
                let piece = Piece::spawn(kind);
                assert_eq!(piece.x, 4, "{kind:?}");
                assert_eq!(piece.y, 0, "{kind:?}");
            }
        }

        #[test]
        fn spawned_shape_matches_template() {
            let piece = Piece::spawn(PieceKind::Z);
            assert_eq!(piece.shape, vec![vec![7, 7, 0], vec![0, 7, 7]]);
        }

        #[test]
        fn spawned_shape_is_a_copy() {
            let mut piece = Piece::spawn(PieceKind::L);
            piece.shape[0][0] = 9;
            let fresh = Piece::spawn(PieceKind::L);
            assert_eq!(fresh.shape[0][0], 0);
        }

        #[test]
        fn seeded_sessions_agree() {
            let mut a = GameState::with_seed(7);
            let mut b = GameState::with_seed(7);
            let kinds_a: Vec<PieceKind> = (0..8).map(|_| a.spawn_piece().kind).collect();
            let kinds_b: Vec<PieceKind> = (0..8).map(|_| b.spawn_piece().kind).collect();
            assert_eq!(kinds_a, kinds_b);
        }
    }

    mod rotation {
        use super::*;

        #[test]
        fn transpose_reverse_turns_i_upright() {
            let flat = vec![vec![1, 1, 1, 1]];
            assert_eq!(
                rotate_clockwise(&flat),
                vec![vec![1], vec![1], vec![1], vec![1]]
            );
        }

        #[test]
        fn transpose_reverse_turns_t_right() {
            let t = vec![vec![0, 6, 0], vec![6, 6, 6]];
            assert_eq!(rotate_clockwise(&t), vec![vec![6, 0], vec![6, 6], vec![6, 0]]);
        }

        #[test]
        fn four_rotations_restore_any_template() {
            for kind in PieceKind::ALL {
                let original = Piece::spawn(kind).shape;
                let mut shape = original.clone();
                for _ in 0..4 {
                    shape = rotate_clockwise(&shape);
                }
                assert_eq!(shape, original, "{kind:?}");
            }
        }

        #[test]
        fn rotation_in_open_space_keeps_position() {
            let mut gs = session_with(piece_at(PieceKind::T, &[&[0, 6, 0], &[6, 6, 6]], 4, 5));
            assert!(gs.rotate());
            let piece = gs.current.as_ref().unwrap();
            assert_eq!(piece.x, 4);
            assert_eq!(piece.shape, vec![vec![6, 0], vec![6, 6], vec![6, 0]]);
        }

        #[test]
        fn wall_kick_shifts_upright_i_off_the_wall() {
            // Upright I one column short of the right wall: the flat shape
            // needs a net -1 kick to fit (probes 0, 0, +1, -1).
            let mut gs = session_with(piece_at(PieceKind::I, &[&[1], &[1], &[1], &[1]], 7, 5));
            assert!(gs.rotate());
            let piece = gs.current.as_ref().unwrap();
            assert_eq!(piece.x, 6);
            assert_eq!(piece.shape, vec![vec![1, 1, 1, 1]]);
        }

        #[test]
        fn failed_kick_restores_shape_and_position() {
            // Upright I flush against the right wall: the search aborts
            // before reaching a fitting column.
            let before = piece_at(PieceKind::I, &[&[1], &[1], &[1], &[1]], 9, 5);
            let mut gs = session_with(before.clone());
            assert!(!gs.rotate());
            assert_eq!(gs.current.as_ref().unwrap(), &before);
        }

        #[test]
        fn blocked_rotation_restores_against_settled_cells() {
            let before = piece_at(PieceKind::I, &[&[1], &[1], &[1], &[1]], 4, 10);
            let mut gs = session_with(before.clone());
            // Box the piece in so every probed column is occupied.
            for x in 0..COLS {
                if x != 4 {
                    gs.board.set(x, 10, 2);
                }
            }
            assert!(!gs.rotate());
            assert_eq!(gs.current.as_ref().unwrap(), &before);
        }
    }

    mod gravity {
        use super::*;

        #[test]
        fn tick_accumulates_until_interval_passes() {
            let mut gs = session_with(Piece::spawn(PieceKind::O));
            // Exactly the interval is not enough; the threshold is strict.
            assert_eq!(gs.tick(Duration::from_millis(1000)), None);
            assert_eq!(
                gs.tick(Duration::from_millis(1)),
                Some(DropOutcome::Descended)
            );
            assert_eq!(gs.current.as_ref().unwrap().y, 1);
        }

        #[test]
        fn manual_soft_drop_resets_the_clock() {
            let mut gs = session_with(Piece::spawn(PieceKind::O));
            assert_eq!(gs.tick(Duration::from_millis(600)), None);
            assert_eq!(gs.soft_drop(), Some(DropOutcome::Descended));
            // Without the reset 600 + 600 would exceed the interval.
            assert_eq!(gs.tick(Duration::from_millis(600)), None);
            assert_eq!(
                gs.tick(Duration::from_millis(500)),
                Some(DropOutcome::Descended)
            );
        }

        #[test]
        fn paused_session_ignores_time_and_input() {
            let mut gs = session_with(Piece::spawn(PieceKind::T));
            gs.toggle_pause();
            assert_eq!(gs.tick(Duration::from_millis(5000)), None);
            assert!(!gs.move_piece(-1));
            assert!(!gs.rotate());
            assert_eq!(gs.soft_drop(), None);
            assert_eq!(gs.hard_drop(), None);
            assert_eq!(gs.current.as_ref().unwrap().x, 4);
            gs.toggle_pause();
            assert_eq!(gs.soft_drop(), Some(DropOutcome::Descended));
        }

        #[test]
        fn descending_changes_no_score() {
            let mut gs = session_with(Piece::spawn(PieceKind::S));
            gs.soft_drop();
            assert_eq!(gs.score, 0);
            assert_eq!(gs.lines, 0);
            assert_eq!(gs.level, 1);
        }

        #[test]
        fn lock_on_floor_promotes_next_piece() {
            let mut gs = session_with(piece_at(
                PieceKind::O,
                &[&[4, 4], &[4, 4]],
                0,
                ROWS as i32 - 2,
            ));
            let upcoming = gs.next.clone().unwrap();
            let outcome = gs.soft_drop();
            assert_eq!(outcome, Some(DropOutcome::Locked { cleared: 0 }));
            assert_eq!(gs.board.get(0, 19), 4);
            assert_eq!(gs.board.get(1, 18), 4);
            assert_eq!(gs.current.as_ref().unwrap().kind, upcoming.kind);
            assert!(gs.next.is_some());
        }
    }

    mod dropping {
        use super::*;

        #[test]
        fn hard_drop_locks_on_the_floor_with_bonus() {
            let mut gs = session_with(Piece::spawn(PieceKind::O));
            let outcome = gs.hard_drop();
            assert_eq!(outcome, Some(DropOutcome::Locked { cleared: 0 }));
            // O spawns at x = 4 and falls to the bottom two rows.
            for (x, y) in [(4, 18), (5, 18), (4, 19), (5, 19)] {
                assert_eq!(gs.board.get(x, y), 4);
            }
            assert_eq!(gs.score, 20);
        }

        #[test]
        fn hard_drop_onto_stack_rests_on_top() {
            let mut gs = session_with(Piece::spawn(PieceKind::O));
            fill_row(&mut gs.board, 19);
            gs.board.set(0, 19, 0); // keep the row incomplete
            gs.hard_drop();
            assert_eq!(gs.board.get(4, 17), 4);
            assert_eq!(gs.board.get(4, 18), 4);
            assert_eq!(gs.board.get(4, 19), 7);
        }

        #[test]
        fn hard_drop_completing_a_row_scores_line_plus_bonus() {
            let mut gs = session_with(Piece::spawn(PieceKind::I));
            for x in 0..COLS {
                if !(3..=6).contains(&x) {
                    gs.board.set(x, 19, 2);
                }
            }
            let outcome = gs.hard_drop();
            assert_eq!(outcome, Some(DropOutcome::Locked { cleared: 1 }));
            assert_eq!(gs.score, 100 + 20);
            assert_eq!(gs.lines, 1);
            assert_eq!(gs.level, 1);
            assert_eq!(gs.drop_interval, Duration::from_millis(1000));
            // The cleared row is empty again.
            for x in 0..COLS {
                assert_eq!(gs.board.get(x, 19), 0);
            }
        }

        #[test]
        fn upright_i_finishing_four_rows_scores_a_tetris() {
            let mut gs = session_with(piece_at(PieceKind::I, &[&[1], &[1], &[1], &[1]], 0, 0));
            gs.lines = 9;
            for y in 16..20 {
                for x in 1..COLS {
                    gs.board.set(x, y, 3);
                }
            }
            let outcome = gs.hard_drop();
            assert_eq!(outcome, Some(DropOutcome::Locked { cleared: 4 }));
            // 800 × level 1: the multiplier predates the level-up below.
            assert_eq!(gs.score, 800 + 20);
            assert_eq!(gs.lines, 13);
            assert_eq!(gs.level, 2);
            assert_eq!(gs.drop_interval, Duration::from_millis(900));
        }
    }

    mod scoring {
        use super::*;

        #[test]
        fn clear_table_scales_with_level() {
            let mut gs = GameState::with_seed(1);
            gs.start();
            gs.level = 3;
            gs.apply_line_clears(2);
            assert_eq!(gs.score, 300 * 3);
        }

        #[test]
        fn more_than_four_rows_score_as_four() {
            let mut gs = GameState::with_seed(1);
            gs.start();
            gs.apply_line_clears(5);
            assert_eq!(gs.score, 800);
            assert_eq!(gs.lines, 5);
        }

        #[test]
        fn level_grows_every_ten_lines() {
            let mut gs = GameState::with_seed(1);
            gs.start();
            gs.lines = 9;
            gs.apply_line_clears(1);
            assert_eq!(gs.level, 2);
            assert_eq!(gs.drop_interval, Duration::from_millis(900));
        }

        #[test]
        fn drop_interval_never_goes_below_the_floor() {
            let mut gs = GameState::with_seed(1);
            gs.start();
            gs.lines = 99;
            gs.apply_line_clears(1);
            assert_eq!(gs.level, 11);
            assert_eq!(gs.drop_interval, Duration::from_millis(100));

            gs.lines = 199;
            gs.apply_line_clears(1);
            assert_eq!(gs.level, 21);
            assert_eq!(gs.drop_interval, Duration::from_millis(100));
        }
    }

    mod session {
        use super::*;

        #[test]
        fn start_arms_a_fresh_game() {
            let mut gs = GameState::with_seed(3);
            gs.start();
            assert!(gs.running);
            assert!(!gs.paused);
            assert_eq!(gs.score, 0);
            assert_eq!(gs.lines, 0);
            assert_eq!(gs.level, 1);
            assert_eq!(gs.drop_interval, Duration::from_millis(1000));
            assert!(gs.current.is_some());
            assert!(gs.next.is_some());
        }

        #[test]
        fn blocked_spawn_ends_the_game() {
            let mut gs = session_with(piece_at(
                PieceKind::O,
                &[&[4, 4], &[4, 4]],
                0,
                ROWS as i32 - 2,
            ));
            gs.next = Some(Piece::spawn(PieceKind::O));
            // The next O spawns over (4..=5, 0..=1); occupy one of its cells.
            gs.board.set(4, 0, 7);
            let outcome = gs.soft_drop();
            assert_eq!(outcome, Some(DropOutcome::GameOver { cleared: 0 }));
            assert!(!gs.running);
            // The dead piece is not merged.
            assert_eq!(gs.board.get(4, 0), 7);
            assert_eq!(gs.board.get(5, 0), 0);
        }

        #[test]
        fn hard_drop_bonus_applies_even_on_game_over() {
            let mut gs = session_with(piece_at(
                PieceKind::O,
                &[&[4, 4], &[4, 4]],
                0,
                ROWS as i32 - 2,
            ));
            gs.next = Some(Piece::spawn(PieceKind::O));
            gs.board.set(4, 0, 7);
            let outcome = gs.hard_drop();
            assert_eq!(outcome, Some(DropOutcome::GameOver { cleared: 0 }));
            assert_eq!(gs.score, 20);
        }

        #[test]
        fn finished_game_ignores_input_until_restarted() {
            let mut gs = session_with(piece_at(
                PieceKind::O,
                &[&[4, 4], &[4, 4]],
                0,
                ROWS as i32 - 2,
            ));
            gs.next = Some(Piece::spawn(PieceKind::O));
            gs.board.set(4, 0, 7);
            gs.soft_drop();
            assert!(!gs.running);
            assert!(!gs.move_piece(1));
            assert!(!gs.rotate());
            assert_eq!(gs.soft_drop(), None);
            assert_eq!(gs.tick(Duration::from_millis(5000)), None);

            gs.start();
            assert!(gs.running);
            assert_eq!(gs.board.get(4, 0), 0);
            assert_eq!(gs.score, 0);
        }

        #[test]
        fn movement_stops_at_walls() {
            let mut gs = session_with(Piece::spawn(PieceKind::O));
            for _ in 0..4 {
                assert!(gs.move_piece(-1));
            }
            assert_eq!(gs.current.as_ref().unwrap().x, 0);
            assert!(!gs.move_piece(-1));
            assert_eq!(gs.current.as_ref().unwrap().x, 0);
            for _ in 0..8 {
                assert!(gs.move_piece(1));
            }
            assert_eq!(gs.current.as_ref().unwrap().x, 8);
            assert!(!gs.move_piece(1));
        }
    }
}
