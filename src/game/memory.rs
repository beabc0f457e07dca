use rand::Rng;
use serde::{Deserialize, Serialize};

use super::deck::{deal, DeckError, Symbol, SymbolPool};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type")]
pub enum MemoryError {
    IndexOutOfBounds { index: usize, deck_len: usize },
    IntegrityViolation { error: MemoryIntegrityError },
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type")]
pub enum MemoryIntegrityError {
    MisalignedReveal { deck_len: usize, revealed_len: usize },
    UnpairedSymbol { symbol: Symbol, count: usize },
    PendingOutOfRange { index: usize },
    PendingNotRevealed { index: usize },
    PendingDuringResolution,
    TicketOutOfRange { index: usize },
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type")]
pub enum MemoryEvent {
    CardRevealed { index: usize },
    PairMatched { first: usize, second: usize },
    PairHidden { first: usize, second: usize },
    DeckSolved,
}

/// Handle for a deferred pair comparison. Issued when the second card of a
/// pair flips face-up; redeemed via [`MemoryState::resolve`] once the
/// presentation layer's reveal delay has elapsed. The generation stamp makes
/// tickets from before a reset harmless.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ResolutionTicket {
    pub first: usize,
    pub second: usize,
    pub generation: u64,
}

/// Immediate result of a reveal.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type")]
pub enum RevealOutcome {
    /// Click on a face-up card, or while a comparison is still outstanding.
    Ignored,
    /// First card of a pair is now face-up.
    Flipped { index: usize },
    /// Second card is face-up; compare after the delay by redeeming the ticket.
    Comparing { ticket: ResolutionTicket },
}

/// Deferred result of a pair comparison.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type")]
pub enum ResolveOutcome {
    /// Ticket predates a reset or is not the outstanding one; state untouched.
    Stale,
    /// Both cards stay face-up permanently.
    Matched {
        first: usize,
        second: usize,
        solved: bool,
    },
    /// No match; both cards returned face-down.
    Hidden { first: usize, second: usize },
}

/// Display view handed to the presentation layer. Face-down cards carry no
/// symbol, so the deck never leaks through a render.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MemorySnapshot {
    pub cards: Vec<Option<Symbol>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pending: Option<usize>,
    pub locked: bool,
    pub solved: bool,
}

/// Memory-match game state.
///
/// One round owns a fixed deck of `2 * pairs` symbols, each appearing exactly
/// twice. `revealed` is positionally aligned with `deck`; `revealed[i]` is
/// `Some` iff card `i` is face-up. At most two cards are face-up outside a
/// matched pair, and while a comparison is outstanding (`awaiting`) further
/// reveals are ignored.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MemoryState {
    pub deck: Vec<Symbol>,
    pub revealed: Vec<Option<Symbol>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pending: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub awaiting: Option<ResolutionTicket>,
    #[serde(default)]
    pub generation: u64,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub event_log: Vec<MemoryEvent>,
}

impl MemoryState {
    /// Deals a fresh round with `pairs` distinct symbols from the pool.
    pub fn deal(pairs: usize, pool: &SymbolPool, rng: &mut impl Rng) -> Result<Self, DeckError> {
        let deck = deal(pairs, pool, rng)?;
        let revealed = vec![None; deck.len()];
        Ok(Self {
            deck,
            revealed,
            pending: None,
            awaiting: None,
            generation: 0,
            event_log: Vec::new(),
        })
    }

    /// Replaces the round wholesale. Bumps the generation so any resolution
    /// ticket issued before the reset resolves as [`ResolveOutcome::Stale`].
    pub fn reset(
        &mut self,
        pairs: usize,
        pool: &SymbolPool,
        rng: &mut impl Rng,
    ) -> Result<(), DeckError> {
        let deck = deal(pairs, pool, rng)?;
        self.revealed = vec![None; deck.len()];
        self.deck = deck;
        self.pending = None;
        self.awaiting = None;
        self.generation += 1;
        self.event_log.clear();
        Ok(())
    }

    pub fn record_event(&mut self, event: MemoryEvent) {
        self.event_log.push(event);
    }

    /// Flips card `index` face-up.
    ///
    /// The flip itself is synchronous; when it completes a pair, the
    /// comparison is deferred behind the returned ticket. Clicks on face-up
    /// cards, and clicks while a comparison is outstanding, are ignored.
    pub fn reveal(&mut self, index: usize) -> Result<RevealOutcome, MemoryError> {
        if index >= self.deck.len() {
            return Err(MemoryError::IndexOutOfBounds {
                index,
                deck_len: self.deck.len(),
            });
        }

        self.ensure_integrity()?;

        if self.awaiting.is_some() || self.revealed[index].is_some() {
            return Ok(RevealOutcome::Ignored);
        }

        self.revealed[index] = Some(self.deck[index].clone());
        self.record_event(MemoryEvent::CardRevealed { index });

        match self.pending.take() {
            None => {
                self.pending = Some(index);
                Ok(RevealOutcome::Flipped { index })
            }
            Some(first) => {
                let ticket = ResolutionTicket {
                    first,
                    second: index,
                    generation: self.generation,
                };
                self.awaiting = Some(ticket.clone());
                Ok(RevealOutcome::Comparing { ticket })
            }
        }
    }

    /// Redeems a comparison ticket: a matched pair stays face-up, a
    /// mismatched pair flips back face-down. Tickets from a previous
    /// generation, or any ticket other than the outstanding one, are
    /// discarded without touching state.
    pub fn resolve(&mut self, ticket: &ResolutionTicket) -> ResolveOutcome {
        if ticket.generation != self.generation {
            return ResolveOutcome::Stale;
        }
        match &self.awaiting {
            Some(current) if current == ticket => {}
            _ => return ResolveOutcome::Stale,
        }
        if ticket.first >= self.deck.len() || ticket.second >= self.deck.len() {
            return ResolveOutcome::Stale;
        }

        self.awaiting = None;
        let (first, second) = (ticket.first, ticket.second);

        if self.deck[first] == self.deck[second] {
            self.record_event(MemoryEvent::PairMatched { first, second });
            let solved = self.is_solved();
            if solved {
                self.record_event(MemoryEvent::DeckSolved);
            }
            ResolveOutcome::Matched {
                first,
                second,
                solved,
            }
        } else {
            self.revealed[first] = None;
            self.revealed[second] = None;
            self.record_event(MemoryEvent::PairHidden { first, second });
            ResolveOutcome::Hidden { first, second }
        }
    }

    /// True iff every card is face-up and no comparison is outstanding.
    /// A mismatched final pair in its reveal window does not count as solved.
    pub fn is_solved(&self) -> bool {
        self.awaiting.is_none() && self.revealed.iter().all(Option::is_some)
    }

    pub fn snapshot(&self) -> MemorySnapshot {
        MemorySnapshot {
            cards: self.revealed.clone(),
            pending: self.pending,
            locked: self.awaiting.is_some(),
            solved: self.is_solved(),
        }
    }

    fn ensure_integrity(&self) -> Result<(), MemoryError> {
        self.integrity_check()
            .map_err(|error| MemoryError::IntegrityViolation { error })
    }

    /// Structural validation, mainly for state injected from the frontend.
    pub fn integrity_check(&self) -> Result<(), MemoryIntegrityError> {
        if self.deck.len() != self.revealed.len() {
            return Err(MemoryIntegrityError::MisalignedReveal {
                deck_len: self.deck.len(),
                revealed_len: self.revealed.len(),
            });
        }

        for symbol in &self.deck {
            let count = self.deck.iter().filter(|other| *other == symbol).count();
            if count != 2 {
                return Err(MemoryIntegrityError::UnpairedSymbol {
                    symbol: symbol.clone(),
                    count,
                });
            }
        }

        if let Some(index) = self.pending {
            if index >= self.deck.len() {
                return Err(MemoryIntegrityError::PendingOutOfRange { index });
            }
            if self.revealed[index].is_none() {
                return Err(MemoryIntegrityError::PendingNotRevealed { index });
            }
            if self.awaiting.is_some() {
                return Err(MemoryIntegrityError::PendingDuringResolution);
            }
        }

        if let Some(ticket) = &self.awaiting {
            for index in [ticket.first, ticket.second] {
                if index >= self.deck.len() {
                    return Err(MemoryIntegrityError::TicketOutOfRange { index });
                }
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    fn rng() -> SmallRng {
        SmallRng::seed_from_u64(42)
    }

    fn deal_state(pairs: usize) -> MemoryState {
        MemoryState::deal(pairs, &SymbolPool::emoji(), &mut rng())
            .expect("deal should succeed")
    }

    /// Indices of a matching pair and of a third card from neither symbol.
    fn pair_and_outsider(state: &MemoryState) -> (usize, usize, usize) {
        let first = 0;
        let partner = state.deck[1..]
            .iter()
            .position(|symbol| *symbol == state.deck[first])
            .map(|offset| offset + 1)
            .expect("every symbol has a partner");
        let outsider = state
            .deck
            .iter()
            .position(|symbol| *symbol != state.deck[first])
            .expect("a deck with 2+ pairs has another symbol");
        (first, partner, outsider)
    }

    #[test]
    fn reveal_flips_card_face_up_immediately() {
        let mut state = deal_state(4);

        let outcome = state.reveal(3).expect("reveal should succeed");

        assert_eq!(outcome, RevealOutcome::Flipped { index: 3 });
        assert_eq!(state.revealed[3].as_ref(), Some(&state.deck[3]));
        assert_eq!(state.pending, Some(3));
    }

    #[test]
    fn reveal_out_of_bounds_is_an_error() {
        let mut state = deal_state(2);
        let result = state.reveal(4);
        assert_eq!(
            result,
            Err(MemoryError::IndexOutOfBounds {
                index: 4,
                deck_len: 4,
            })
        );
    }

    #[test]
    fn revealing_a_face_up_card_is_a_no_op() {
        let mut state = deal_state(4);
        state.reveal(0).expect("reveal should succeed");
        let before = state.clone();

        let outcome = state.reveal(0).expect("reveal should succeed");

        assert_eq!(outcome, RevealOutcome::Ignored);
        assert_eq!(state, before, "re-click must not change state");
    }

    #[test]
    fn matching_pair_stays_face_up() {
        let mut state = deal_state(4);
        let (first, partner, _) = pair_and_outsider(&state);

        state.reveal(first).expect("reveal should succeed");
        let ticket = match state.reveal(partner).expect("reveal should succeed") {
            RevealOutcome::Comparing { ticket } => ticket,
            other => panic!("expected a comparison ticket, got {other:?}"),
        };

        let outcome = state.resolve(&ticket);
        assert_eq!(
            outcome,
            ResolveOutcome::Matched {
                first,
                second: partner,
                solved: false,
            }
        );
        assert!(state.revealed[first].is_some());
        assert!(state.revealed[partner].is_some());
        assert_eq!(state.pending, None);
        assert!(!state.is_solved(), "4 pairs are not solved by one match");
    }

    #[test]
    fn mismatched_pair_returns_face_down() {
        let mut state = deal_state(4);
        let (first, _, outsider) = pair_and_outsider(&state);

        state.reveal(first).expect("reveal should succeed");
        let ticket = match state.reveal(outsider).expect("reveal should succeed") {
            RevealOutcome::Comparing { ticket } => ticket,
            other => panic!("expected a comparison ticket, got {other:?}"),
        };

        let outcome = state.resolve(&ticket);
        assert_eq!(
            outcome,
            ResolveOutcome::Hidden {
                first,
                second: outsider,
            }
        );
        assert!(state.revealed[first].is_none());
        assert!(state.revealed[outsider].is_none());
        assert_eq!(state.pending, None);
    }

    #[test]
    fn third_reveal_is_locked_while_comparison_is_outstanding() {
        let mut state = deal_state(4);
        let (first, _, outsider) = pair_and_outsider(&state);

        state.reveal(first).expect("reveal should succeed");
        state.reveal(outsider).expect("reveal should succeed");

        let face_down = state
            .revealed
            .iter()
            .position(Option::is_none)
            .expect("some card is still face-down");
        let outcome = state.reveal(face_down).expect("reveal should succeed");

        assert_eq!(outcome, RevealOutcome::Ignored);
        assert!(state.revealed[face_down].is_none());
    }

    #[test]
    fn solving_the_whole_deck_reports_solved() {
        let mut state = deal_state(2);

        while !state.is_solved() {
            let first = state
                .revealed
                .iter()
                .position(Option::is_none)
                .expect("unsolved deck has a face-down card");
            state.reveal(first).expect("reveal should succeed");

            let partner = state
                .deck
                .iter()
                .enumerate()
                .position(|(i, symbol)| i != first && *symbol == state.deck[first] && state.revealed[i].is_none())
                .expect("partner card is still face-down");
            let ticket = match state.reveal(partner).expect("reveal should succeed") {
                RevealOutcome::Comparing { ticket } => ticket,
                other => panic!("expected a comparison ticket, got {other:?}"),
            };
            state.resolve(&ticket);
        }

        assert!(state.is_solved());
        assert!(state
            .event_log
            .iter()
            .any(|event| matches!(event, MemoryEvent::DeckSolved)));
        assert_eq!(
            state.reveal(0).expect("reveal should succeed"),
            RevealOutcome::Ignored,
            "clicks on a solved deck are ignored"
        );
    }

    #[test]
    fn is_solved_waits_for_the_outstanding_resolution() {
        let mut state = MemoryState {
            deck: vec!["🍎".into(), "🍌".into(), "🍎".into(), "🍌".into()],
            revealed: vec![None; 4],
            pending: None,
            awaiting: None,
            generation: 0,
            event_log: Vec::new(),
        };

        // Match the two apples.
        state.reveal(0).expect("reveal should succeed");
        let ticket = match state.reveal(2).expect("reveal should succeed") {
            RevealOutcome::Comparing { ticket } => ticket,
            other => panic!("expected a comparison ticket, got {other:?}"),
        };
        assert!(matches!(state.resolve(&ticket), ResolveOutcome::Matched { .. }));

        // Flip the two bananas but inspect before resolution lands.
        state.reveal(1).expect("reveal should succeed");
        let ticket = match state.reveal(3).expect("reveal should succeed") {
            RevealOutcome::Comparing { ticket } => ticket,
            other => panic!("expected a comparison ticket, got {other:?}"),
        };
        assert!(state.revealed.iter().all(Option::is_some));
        assert!(
            !state.is_solved(),
            "solved must wait for the outstanding resolution"
        );

        assert!(matches!(state.resolve(&ticket), ResolveOutcome::Matched { .. }));
        assert!(state.is_solved());
    }

    #[test]
    fn stale_ticket_after_reset_is_discarded() {
        let mut state = deal_state(4);
        let (first, _, outsider) = pair_and_outsider(&state);

        state.reveal(first).expect("reveal should succeed");
        let ticket = match state.reveal(outsider).expect("reveal should succeed") {
            RevealOutcome::Comparing { ticket } => ticket,
            other => panic!("expected a comparison ticket, got {other:?}"),
        };

        state
            .reset(4, &SymbolPool::emoji(), &mut rng())
            .expect("reset should succeed");
        let after_reset = state.clone();

        assert_eq!(state.resolve(&ticket), ResolveOutcome::Stale);
        assert_eq!(state, after_reset, "stale timer must not mutate fresh round");
        assert_eq!(state.generation, 1);
    }

    #[test]
    fn redeeming_a_ticket_twice_is_stale() {
        let mut state = deal_state(4);
        let (first, partner, _) = pair_and_outsider(&state);

        state.reveal(first).expect("reveal should succeed");
        let ticket = match state.reveal(partner).expect("reveal should succeed") {
            RevealOutcome::Comparing { ticket } => ticket,
            other => panic!("expected a comparison ticket, got {other:?}"),
        };

        assert!(matches!(state.resolve(&ticket), ResolveOutcome::Matched { .. }));
        assert_eq!(state.resolve(&ticket), ResolveOutcome::Stale);
    }

    #[test]
    fn snapshot_hides_face_down_cards() {
        let mut state = deal_state(3);
        state.reveal(2).expect("reveal should succeed");

        let snapshot = state.snapshot();

        assert_eq!(snapshot.cards.len(), 6);
        assert_eq!(snapshot.cards[2].as_ref(), Some(&state.deck[2]));
        assert!(snapshot.cards.iter().filter(|card| card.is_some()).count() == 1);
        assert_eq!(snapshot.pending, Some(2));
        assert!(!snapshot.locked);
        assert!(!snapshot.solved);
    }

    #[test]
    fn integrity_check_rejects_unpaired_deck() {
        let state = MemoryState {
            deck: vec!["🍎".into(), "🍎".into(), "🍌".into()],
            revealed: vec![None; 3],
            pending: None,
            awaiting: None,
            generation: 0,
            event_log: Vec::new(),
        };

        assert_eq!(
            state.integrity_check(),
            Err(MemoryIntegrityError::UnpairedSymbol {
                symbol: "🍌".into(),
                count: 1,
            })
        );
    }

    #[test]
    fn integrity_check_rejects_misaligned_reveal() {
        let state = MemoryState {
            deck: vec!["🍎".into(), "🍎".into()],
            revealed: vec![None; 3],
            pending: None,
            awaiting: None,
            generation: 0,
            event_log: Vec::new(),
        };

        assert_eq!(
            state.integrity_check(),
            Err(MemoryIntegrityError::MisalignedReveal {
                deck_len: 2,
                revealed_len: 3,
            })
        );
    }

    #[test]
    fn state_round_trips_through_json() {
        let mut state = deal_state(3);
        state.reveal(0).expect("reveal should succeed");

        let json = serde_json::to_string(&state).expect("state should serialize");
        let decoded: MemoryState = serde_json::from_str(&json).expect("state should deserialize");

        assert_eq!(decoded, state);
    }
}
