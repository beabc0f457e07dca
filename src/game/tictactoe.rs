use serde::{Deserialize, Serialize};

/// Player mark. X always opens a fresh board.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Mark {
    X,
    O,
}

impl Mark {
    pub fn opponent(self) -> Self {
        match self {
            Mark::X => Mark::O,
            Mark::O => Mark::X,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type")]
pub enum TicTacToeError {
    OutOfBounds { row: usize, col: usize },
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type")]
pub enum TicTacToeStatus {
    InProgress,
    Won { winner: Mark },
    Draw,
}

impl Default for TicTacToeStatus {
    fn default() -> Self {
        TicTacToeStatus::InProgress
    }
}

/// What to do with a full board that has no winner.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DrawPolicy {
    /// Silently start a fresh round, as the frontend has always done.
    AutoReset,
    /// Stop on a terminal `Draw` status until the next reset.
    Explicit,
}

impl Default for DrawPolicy {
    fn default() -> Self {
        DrawPolicy::AutoReset
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type")]
pub enum TicTacToeAction {
    Reset,
    Play { row: usize, col: usize },
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type")]
pub enum TicTacToeEvent {
    MarkPlaced { row: usize, col: usize, mark: Mark },
    GameWon { winner: Mark },
    GameDrawn,
    BoardReset,
}

const GRID_SIDE: usize = 3;

/// The 8 winning lines over row-major cell indices.
const LINES: [[usize; 3]; 8] = [
    [0, 1, 2],
    [3, 4, 5],
    [6, 7, 8],
    [0, 3, 6],
    [1, 4, 7],
    [2, 5, 8],
    [0, 4, 8],
    [2, 4, 6],
];

/// 3x3 board, row-major.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Grid {
    cells: [Option<Mark>; 9],
}

impl Grid {
    pub fn new() -> Self {
        Self { cells: [None; 9] }
    }

    pub fn get(&self, row: usize, col: usize) -> Option<Mark> {
        self.cells[row * GRID_SIDE + col]
    }

    pub fn set(&mut self, row: usize, col: usize, mark: Mark) {
        self.cells[row * GRID_SIDE + col] = Some(mark);
    }

    pub fn in_bounds(row: usize, col: usize) -> bool {
        row < GRID_SIDE && col < GRID_SIDE
    }

    pub fn is_full(&self) -> bool {
        self.cells.iter().all(Option::is_some)
    }

    /// Scans the 8 lines; a line wins when all three cells hold the same mark.
    pub fn winner(&self) -> Option<Mark> {
        for [a, b, c] in LINES {
            if let Some(mark) = self.cells[a] {
                if self.cells[b] == Some(mark) && self.cells[c] == Some(mark) {
                    return Some(mark);
                }
            }
        }
        None
    }

    pub fn cells(&self) -> &[Option<Mark>; 9] {
        &self.cells
    }
}

impl Default for Grid {
    fn default() -> Self {
        Self::new()
    }
}

/// Tic-tac-toe game state, reduced by [`TicTacToeAction`]s.
///
/// A marked cell is never overwritten until the board resets, and a won or
/// drawn board accepts no further plays. On a win `turn` is left on the
/// winning mark, so the winner is readable both from the status and from
/// `turn`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TicTacToeState {
    pub grid: Grid,
    pub turn: Mark,
    pub status: TicTacToeStatus,
    #[serde(default)]
    pub draw_policy: DrawPolicy,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub event_log: Vec<TicTacToeEvent>,
}

impl TicTacToeState {
    pub fn new(draw_policy: DrawPolicy) -> Self {
        Self {
            grid: Grid::new(),
            turn: Mark::X,
            status: TicTacToeStatus::InProgress,
            draw_policy,
            event_log: Vec::new(),
        }
    }

    pub fn record_event(&mut self, event: TicTacToeEvent) {
        self.event_log.push(event);
    }

    pub fn is_finished(&self) -> bool {
        self.status != TicTacToeStatus::InProgress
    }

    /// Reducer dispatch.
    pub fn apply(&mut self, action: TicTacToeAction) -> Result<Vec<TicTacToeEvent>, TicTacToeError> {
        match action {
            TicTacToeAction::Reset => Ok(self.reset()),
            TicTacToeAction::Play { row, col } => self.play(row, col),
        }
    }

    /// Unconditionally starts a fresh round: empty grid, X to move.
    pub fn reset(&mut self) -> Vec<TicTacToeEvent> {
        self.fresh_board();
        self.event_log.clear();
        let events = vec![TicTacToeEvent::BoardReset];
        self.record_event(TicTacToeEvent::BoardReset);
        events
    }

    /// Plays the current mark at `(row, col)`.
    ///
    /// Out-of-bounds coordinates are an error; plays on an occupied cell or
    /// after the game ended are silent no-ops.
    pub fn play(&mut self, row: usize, col: usize) -> Result<Vec<TicTacToeEvent>, TicTacToeError> {
        if !Grid::in_bounds(row, col) {
            return Err(TicTacToeError::OutOfBounds { row, col });
        }
        if self.is_finished() || self.grid.get(row, col).is_some() {
            return Ok(Vec::new());
        }

        let mark = self.turn;
        self.grid.set(row, col, mark);
        let mut events = vec![TicTacToeEvent::MarkPlaced { row, col, mark }];
        self.record_event(TicTacToeEvent::MarkPlaced { row, col, mark });

        if let Some(winner) = self.grid.winner() {
            // The winning mark just played; turn stays on the winner.
            self.status = TicTacToeStatus::Won { winner };
            events.push(TicTacToeEvent::GameWon { winner });
            self.record_event(TicTacToeEvent::GameWon { winner });
        } else if self.grid.is_full() {
            events.push(TicTacToeEvent::GameDrawn);
            self.record_event(TicTacToeEvent::GameDrawn);
            match self.draw_policy {
                DrawPolicy::AutoReset => {
                    self.fresh_board();
                    self.event_log.clear();
                    events.push(TicTacToeEvent::BoardReset);
                    self.record_event(TicTacToeEvent::BoardReset);
                }
                DrawPolicy::Explicit => {
                    self.status = TicTacToeStatus::Draw;
                }
            }
        } else {
            self.turn = self.turn.opponent();
        }

        Ok(events)
    }

    fn fresh_board(&mut self) {
        self.grid = Grid::new();
        self.turn = Mark::X;
        self.status = TicTacToeStatus::InProgress;
    }
}

impl Default for TicTacToeState {
    fn default() -> Self {
        Self::new(DrawPolicy::default())
    }
}
