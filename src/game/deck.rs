use once_cell::sync::Lazy;
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Displayable card face. Compared for equality only.
pub type Symbol = String;

/// Default face pool for the memory game. Single-scalar glyphs only, so
/// one pool entry is always one rendered character.
static EMOJI: Lazy<Vec<Symbol>> = Lazy::new(|| {
    [
        "🍎", "🍌", "🍒", "🍇", "🍋", "🍉", "🍓", "🍑", "🥝", "🍍", "🥥", "🍊",
        "🐶", "🐱", "🐭", "🐹", "🐰", "🦊", "🐻", "🐼", "🐨", "🐯", "🦁", "🐸",
        "⚽", "🏀", "🎲", "🎯", "🚗", "🚀", "🌵", "🌙",
    ]
    .iter()
    .map(|glyph| glyph.to_string())
    .collect()
});

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type")]
pub enum DeckError {
    InvalidPairCount,
    PoolExhausted { requested: usize, available: usize },
}

/// Source of pairwise-distinct card faces.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SymbolPool {
    symbols: Vec<Symbol>,
}

impl SymbolPool {
    /// Builds a pool from the given symbols, dropping duplicates while
    /// keeping first-occurrence order.
    pub fn new(symbols: Vec<Symbol>) -> Self {
        let mut seen = Vec::with_capacity(symbols.len());
        for symbol in symbols {
            if !seen.contains(&symbol) {
                seen.push(symbol);
            }
        }
        Self { symbols: seen }
    }

    /// The built-in emoji pool.
    pub fn emoji() -> Self {
        Self {
            symbols: EMOJI.clone(),
        }
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    /// Draws `n` pairwise-distinct symbols, uniformly at random.
    pub fn draw_distinct(&self, n: usize, rng: &mut impl Rng) -> Result<Vec<Symbol>, DeckError> {
        if n > self.symbols.len() {
            return Err(DeckError::PoolExhausted {
                requested: n,
                available: self.symbols.len(),
            });
        }
        Ok(self
            .symbols
            .choose_multiple(rng, n)
            .cloned()
            .collect())
    }
}

impl Default for SymbolPool {
    fn default() -> Self {
        Self::emoji()
    }
}

/// Uniform in-place Fisher–Yates shuffle.
pub fn shuffle<T>(items: &mut [T], rng: &mut impl Rng) {
    items.shuffle(rng);
}

/// Deals a memory deck: `pairs` distinct symbols from the pool, each
/// duplicated once, shuffled. The result has length `2 * pairs`.
pub fn deal(pairs: usize, pool: &SymbolPool, rng: &mut impl Rng) -> Result<Vec<Symbol>, DeckError> {
    if pairs == 0 {
        return Err(DeckError::InvalidPairCount);
    }
    let symbols = pool.draw_distinct(pairs, rng)?;
    let mut deck: Vec<Symbol> = symbols
        .into_iter()
        .flat_map(|symbol| [symbol.clone(), symbol])
        .collect();
    shuffle(&mut deck, rng);
    Ok(deck)
}
