//! Pure game engines (state machines and reducers), host-testable and free
//! of any wasm or rendering concern.

pub mod deck;
pub mod memory;
pub mod tictactoe;

pub use deck::{deal, shuffle, DeckError, Symbol, SymbolPool};
pub use memory::{
    MemoryError,
    MemoryEvent,
    MemoryIntegrityError,
    MemorySnapshot,
    MemoryState,
    ResolutionTicket,
    ResolveOutcome,
    RevealOutcome,
};
pub use tictactoe::{
    DrawPolicy,
    Grid,
    Mark,
    TicTacToeAction,
    TicTacToeError,
    TicTacToeEvent,
    TicTacToeState,
    TicTacToeStatus,
};
