pub mod game;

use std::cell::RefCell;
use std::rc::Rc;

use gloo_timers::future::TimeoutFuture;
use rand::rngs::SmallRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use serde_wasm_bindgen::{from_value, to_value};
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::future_to_promise;
use web_sys::js_sys::Promise;

pub use game::{
    deal, shuffle, DeckError, DrawPolicy, Grid, Mark, MemoryError, MemoryEvent,
    MemoryIntegrityError, MemorySnapshot, MemoryState, ResolutionTicket, ResolveOutcome,
    RevealOutcome, Symbol, SymbolPool, TicTacToeAction, TicTacToeError, TicTacToeEvent,
    TicTacToeState, TicTacToeStatus,
};

#[cfg(feature = "wee_alloc")]
#[global_allocator]
static ALLOC: wee_alloc::WeeAlloc = wee_alloc::WeeAlloc::INIT;

/// Delay between the second card flip and its comparison. Long enough to see
/// both cards, short enough to feel responsive.
pub const DEFAULT_REVEAL_DELAY_MS: u32 = 300;

#[wasm_bindgen(start)]
pub fn start() {
    set_panic_hook();
    web_sys::console::log_1(&"wasm_minigames core initialised".into());
}

fn to_js_error<E: Serialize>(error: &E) -> JsValue {
    to_value(error).unwrap_or_else(|serialize_err| JsValue::from_str(&serialize_err.to_string()))
}

fn serde_to_js_error<E: std::fmt::Display>(error: E) -> JsValue {
    JsValue::from_str(&error.to_string())
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct MemoryOptions {
    seed: Option<u64>,
    delay_ms: Option<u32>,
    symbols: Option<Vec<Symbol>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct TicTacToeOptions {
    draw_policy: Option<DrawPolicy>,
}

/// Payload resolved by [`MemoryGame::reveal`] promises: the display snapshot
/// after the step, the immediate reveal outcome, and the deferred comparison
/// result when one was due.
#[derive(Debug, Serialize)]
struct MemoryResolution {
    snapshot: MemorySnapshot,
    outcome: RevealOutcome,
    #[serde(skip_serializing_if = "Option::is_none")]
    resolution: Option<ResolveOutcome>,
}

#[derive(Debug, Serialize)]
struct TicTacToeResolution {
    state: TicTacToeState,
    events: Vec<TicTacToeEvent>,
}

fn rng_from_seed(seed: Option<u64>) -> SmallRng {
    match seed {
        Some(seed) => SmallRng::seed_from_u64(seed),
        None => SmallRng::from_entropy(),
    }
}

/// Stateful memory-match engine for the frontend. The deal, the reveal cycle
/// and the win condition live here; rendering and click translation stay in
/// JavaScript.
#[wasm_bindgen]
pub struct MemoryGame {
    state: Rc<RefCell<MemoryState>>,
    pool: SymbolPool,
    rng: SmallRng,
    delay_ms: u32,
}

#[wasm_bindgen]
impl MemoryGame {
    /// Deals a new game with `pairs` distinct symbols. `options_json` may
    /// carry `{ seed, delay_ms, symbols }`.
    #[wasm_bindgen(constructor)]
    pub fn new(pairs: usize, options_json: Option<String>) -> Result<MemoryGame, JsValue> {
        let options: MemoryOptions = match options_json {
            Some(json) => serde_json::from_str(&json).map_err(serde_to_js_error)?,
            None => MemoryOptions::default(),
        };
        let pool = match options.symbols {
            Some(symbols) => SymbolPool::new(symbols),
            None => SymbolPool::emoji(),
        };
        let mut rng = rng_from_seed(options.seed);
        let state =
            MemoryState::deal(pairs, &pool, &mut rng).map_err(|error| to_js_error(&error))?;
        Ok(MemoryGame {
            state: Rc::new(RefCell::new(state)),
            pool,
            rng,
            delay_ms: options.delay_ms.unwrap_or(DEFAULT_REVEAL_DELAY_MS),
        })
    }

    /// Flips card `index` face-up and returns a promise for the step's
    /// resolution. The flip itself is synchronous and already visible through
    /// `snapshot_json` when this returns; when the flip completes a pair, the
    /// promise settles after the reveal delay with the comparison applied.
    /// A reset issued while the delay runs makes the comparison stale; it
    /// then resolves without touching the fresh round.
    pub fn reveal(&mut self, index: usize) -> Result<Promise, JsValue> {
        let outcome = self
            .state
            .borrow_mut()
            .reveal(index)
            .map_err(|error| to_js_error(&error))?;

        match outcome {
            RevealOutcome::Comparing { ticket } => {
                let state = Rc::clone(&self.state);
                let delay = self.delay_ms;
                Ok(future_to_promise(async move {
                    TimeoutFuture::new(delay).await;
                    let resolution = state.borrow_mut().resolve(&ticket);
                    let payload = MemoryResolution {
                        snapshot: state.borrow().snapshot(),
                        outcome: RevealOutcome::Comparing { ticket },
                        resolution: Some(resolution),
                    };
                    let json = serde_json::to_string(&payload).map_err(serde_to_js_error)?;
                    Ok(JsValue::from_str(&json))
                }))
            }
            outcome => {
                let payload = MemoryResolution {
                    snapshot: self.state.borrow().snapshot(),
                    outcome,
                    resolution: None,
                };
                let json = serde_json::to_string(&payload).map_err(serde_to_js_error)?;
                Ok(Promise::resolve(&JsValue::from_str(&json)))
            }
        }
    }

    /// Replaces the round with a fresh deal of `pairs` pairs.
    pub fn reset(&mut self, pairs: usize) -> Result<String, JsValue> {
        self.state
            .borrow_mut()
            .reset(pairs, &self.pool, &mut self.rng)
            .map_err(|error| to_js_error(&error))?;
        self.snapshot_json()
    }

    /// Display view: revealed faces, pending card, lock and solved flags.
    pub fn snapshot_json(&self) -> Result<String, JsValue> {
        serde_json::to_string(&self.state.borrow().snapshot()).map_err(serde_to_js_error)
    }

    pub fn is_solved(&self) -> bool {
        self.state.borrow().is_solved()
    }

    pub fn delay_ms(&self) -> u32 {
        self.delay_ms
    }

    /// Full engine state, including face-down cards. For debugging and hot
    /// reload, not for rendering.
    pub fn state_json(&self) -> Result<String, JsValue> {
        serde_json::to_string(&*self.state.borrow()).map_err(serde_to_js_error)
    }

    pub fn set_state_json(&mut self, json: &str) -> Result<(), JsValue> {
        let state: MemoryState = serde_json::from_str(json).map_err(serde_to_js_error)?;
        state
            .integrity_check()
            .map_err(|error| to_js_error(&MemoryError::IntegrityViolation { error }))?;
        *self.state.borrow_mut() = state;
        Ok(())
    }
}

/// Stateful tic-tac-toe engine for the frontend.
#[wasm_bindgen]
pub struct TicTacToeGame {
    state: TicTacToeState,
}

#[wasm_bindgen]
impl TicTacToeGame {
    /// `options_json` may carry `{ draw_policy: "auto_reset" | "explicit" }`.
    #[wasm_bindgen(constructor)]
    pub fn new(options_json: Option<String>) -> Result<TicTacToeGame, JsValue> {
        let options: TicTacToeOptions = match options_json {
            Some(json) => serde_json::from_str(&json).map_err(serde_to_js_error)?,
            None => TicTacToeOptions::default(),
        };
        Ok(TicTacToeGame {
            state: TicTacToeState::new(options.draw_policy.unwrap_or_default()),
        })
    }

    /// Plays the current mark at `(row, col)` and returns the resulting state
    /// and events as JSON. Occupied cells and finished boards are no-ops with
    /// an empty event list.
    pub fn play(&mut self, row: usize, col: usize) -> Result<String, JsValue> {
        let events = self
            .state
            .play(row, col)
            .map_err(|error| to_js_error(&error))?;
        self.resolution_json(events)
    }

    pub fn reset(&mut self) -> Result<String, JsValue> {
        let events = self.state.reset();
        self.resolution_json(events)
    }

    pub fn state_json(&self) -> Result<String, JsValue> {
        serde_json::to_string(&self.state).map_err(serde_to_js_error)
    }

    pub fn set_state_json(&mut self, json: &str) -> Result<(), JsValue> {
        let state: TicTacToeState = serde_json::from_str(json).map_err(serde_to_js_error)?;
        self.state = state;
        Ok(())
    }

    fn resolution_json(&self, events: Vec<TicTacToeEvent>) -> Result<String, JsValue> {
        let payload = TicTacToeResolution {
            state: self.state.clone(),
            events,
        };
        serde_json::to_string(&payload).map_err(serde_to_js_error)
    }
}

#[derive(Debug, Serialize)]
struct MemoryTransition {
    state: MemoryState,
    outcome: RevealOutcome,
}

#[derive(Debug, Serialize)]
struct MemoryResolveTransition {
    state: MemoryState,
    resolution: ResolveOutcome,
}

#[derive(Debug, Serialize)]
struct TicTacToeTransition {
    state: TicTacToeState,
    events: Vec<TicTacToeEvent>,
}

/// Deals a fresh memory state the frontend can own directly.
#[wasm_bindgen(js_name = "createMemoryState")]
pub fn create_memory_state(pairs: usize, seed: Option<u64>) -> Result<JsValue, JsValue> {
    let mut rng = rng_from_seed(seed);
    let state = MemoryState::deal(pairs, &SymbolPool::emoji(), &mut rng)
        .map_err(|error| to_js_error(&error))?;
    to_value(&state).map_err(JsValue::from)
}

/// Stateless reveal over a frontend-owned state. When the outcome carries a
/// ticket the caller schedules the delay itself and redeems the ticket with
/// `resolveReveal`.
#[wasm_bindgen(js_name = "revealCard")]
pub fn reveal_card(state: JsValue, index: usize) -> Result<JsValue, JsValue> {
    let mut state: MemoryState = from_value(state).map_err(JsValue::from)?;
    let outcome = state.reveal(index).map_err(|error| to_js_error(&error))?;
    to_value(&MemoryTransition { state, outcome }).map_err(JsValue::from)
}

/// Redeems a comparison ticket against a frontend-owned state. Stale tickets
/// leave the state untouched.
#[wasm_bindgen(js_name = "resolveReveal")]
pub fn resolve_reveal(state: JsValue, ticket: JsValue) -> Result<JsValue, JsValue> {
    let mut state: MemoryState = from_value(state).map_err(JsValue::from)?;
    let ticket: ResolutionTicket = from_value(ticket).map_err(JsValue::from)?;
    let resolution = state.resolve(&ticket);
    to_value(&MemoryResolveTransition { state, resolution }).map_err(JsValue::from)
}

/// Projects a full memory state to its display snapshot.
#[wasm_bindgen(js_name = "memorySnapshot")]
pub fn memory_snapshot(state: JsValue) -> Result<JsValue, JsValue> {
    let state: MemoryState = from_value(state).map_err(JsValue::from)?;
    to_value(&state.snapshot()).map_err(JsValue::from)
}

/// Fresh tic-tac-toe state; `options` may carry `{ draw_policy }`.
#[wasm_bindgen(js_name = "createTicTacToeState")]
pub fn create_tictactoe_state(options: JsValue) -> Result<JsValue, JsValue> {
    let options: Option<TicTacToeOptions> = from_value(options).map_err(JsValue::from)?;
    let policy = options
        .and_then(|options| options.draw_policy)
        .unwrap_or_default();
    to_value(&TicTacToeState::new(policy)).map_err(JsValue::from)
}

/// Reducer entry point over a frontend-owned tic-tac-toe state.
#[wasm_bindgen(js_name = "applyTicTacToeAction")]
pub fn apply_tictactoe_action(state: JsValue, action: JsValue) -> Result<JsValue, JsValue> {
    let mut state: TicTacToeState = from_value(state).map_err(JsValue::from)?;
    let action: TicTacToeAction = from_value(action).map_err(JsValue::from)?;
    let events = state.apply(action).map_err(|error| to_js_error(&error))?;
    to_value(&TicTacToeTransition { state, events }).map_err(JsValue::from)
}

#[cfg(feature = "console_error_panic_hook")]
fn set_panic_hook() {
    console_error_panic_hook::set_once();
}

#[cfg(not(feature = "console_error_panic_hook"))]
fn set_panic_hook() {}
