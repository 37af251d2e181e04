use crate::{
    Card, Deck, DieSpec, Directive, DirectiveKind, Event, EventBus, HitLocation, RngState,
    SavedRolls,
};
use std::collections::HashSet;
use std::time::Duration;
use thiserror::Error;

mod deck_ops;
mod dice_ops;

/// Fixed reveal window between `begin_roll` and `complete_roll`. The engine
/// does not wait itself; the caller holds the preview for this long before
/// committing.
pub const REVEAL_WINDOW: Duration = Duration::from_millis(500);

/// Maximum number of cards a selection may hold; older picks are evicted.
pub const MAX_SELECTED: usize = 5;

/// Invalid-action preconditions. Every variant is a user-visible status
/// message; the operation that raised it is a no-op and the working state is
/// unchanged.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ResolveError {
    #[error("No directive selected.")]
    NoCurrent,
    #[error("No directive at that position.")]
    InvalidIndex,
    #[error("Current directive does not roll dice.")]
    NotDice,
    #[error("Current directive does not use the deck.")]
    NotDeck,
    #[error("Roll already in progress.")]
    RollInProgress,
    #[error("No roll in progress.")]
    NoRollInProgress,
    #[error("This roll type is not Exploding.")]
    NotExploding,
    #[error("No explosion available (highest die not at max).")]
    NoExplosion,
    #[error("Draw cards first.")]
    NothingDrawn,
    #[error("Draw 1 card first (Trick).")]
    TrickNeedsOneCard,
    #[error("Select cards to play (or use Auto-Play).")]
    NothingSelected,
    #[error("No drawn card at that position.")]
    InvalidCard,
    #[error("No playable 5-card hand from current draw.")]
    NoPlayableHand,
    #[error("Hex Draw for {0}: no saved Hex Roll — cannot draw.")]
    HexNotSaved(String),
    #[error("Hex Draw for {0}: last Hex Roll failed — cannot draw.")]
    HexRollFailed(String),
    #[error("Manual override only applies to non-user actors.")]
    OverrideNotApplicable,
}

/// Working state for a current dice directive. Destroyed and rebuilt when
/// the current directive changes.
#[derive(Debug, Clone)]
pub struct DiceWorking {
    pub die: DieSpec,
    pub exploding: bool,
    pub modifier: i32,
    pub tn: i32,
    pub rolls: Vec<u32>,
    pub high_index: usize,
    pub chain: Vec<u32>,
    pub hit: Option<HitLocation>,
    pub last_label: Option<String>,
    pub(crate) preview: Option<Vec<u32>>,
}

impl DiceWorking {
    fn for_directive(directive: &Directive) -> Option<Self> {
        let (die, exploding, modifier, tn) = match &directive.kind {
            DirectiveKind::Roll {
                die,
                tn,
                modifier,
                exploding,
                combat,
            } => (*die, *exploding || *combat, *modifier, *tn),
            DirectiveKind::QuicknessRoll {
                die,
                tn,
                modifier,
                exploding,
            }
            | DirectiveKind::HexRoll {
                die,
                tn,
                modifier,
                exploding,
            } => (*die, *exploding, *modifier, *tn),
            _ => return None,
        };
        Some(Self {
            die,
            exploding,
            modifier,
            tn,
            rolls: Vec::new(),
            high_index: 0,
            chain: Vec::new(),
            hit: None,
            last_label: None,
            preview: None,
        })
    }

    pub fn chain_sum(&self) -> u32 {
        self.chain.iter().sum()
    }

    pub fn effective(&self) -> i32 {
        self.chain_sum() as i32 + self.modifier
    }

    pub fn raises(&self) -> i32 {
        crate::raises(self.effective(), self.tn)
    }

    /// True while the reveal window is open; only placeholder values exist.
    pub fn is_rolling(&self) -> bool {
        self.preview.is_some()
    }

    pub fn preview(&self) -> Option<&[u32]> {
        self.preview.as_deref()
    }

    pub fn can_explode(&self) -> bool {
        self.exploding && self.chain.last().copied() == Some(self.die.sides) && self.die.sides > 0
    }
}

/// Working state for a current deck-backed directive. The deck is owned
/// exclusively by this state.
#[derive(Debug, Clone)]
pub struct DeckWorking {
    pub deck: Deck,
    pub drawn: Vec<Card>,
    pub selected: Vec<usize>,
    pub trick_done: bool,
    pub manual_override: bool,
    pub last_label: Option<String>,
}

impl DeckWorking {
    fn new(rng: &mut RngState) -> Self {
        Self {
            deck: Deck::shuffled(rng),
            drawn: Vec::new(),
            selected: Vec::new(),
            trick_done: false,
            manual_override: false,
            last_label: None,
        }
    }

    pub fn selected_cards(&self) -> Vec<Card> {
        self.selected
            .iter()
            .filter_map(|&idx| self.drawn.get(idx).copied())
            .collect()
    }
}

#[derive(Debug, Clone)]
pub enum Working {
    Dice(DiceWorking),
    Deck(DeckWorking),
}

/// The live resolution session: the scanned directive list (newest first),
/// the current selection with its working state, the saved-roll store and
/// the RNG. Single-threaded; every operation resolves synchronously.
#[derive(Debug)]
pub struct Session {
    pub store: SavedRolls,
    pub rng: RngState,
    items: Vec<Directive>,
    current: Option<usize>,
    working: Option<Working>,
    last_summary: Option<String>,
}

impl Session {
    pub fn new(rng: RngState) -> Self {
        Self {
            store: SavedRolls::default(),
            rng,
            items: Vec::new(),
            current: None,
            working: None,
            last_summary: None,
        }
    }

    pub fn from_seed(seed: u64) -> Self {
        Self::new(RngState::from_seed(seed))
    }

    pub fn items(&self) -> &[Directive] {
        &self.items
    }

    pub fn current_index(&self) -> Option<usize> {
        self.current
    }

    pub fn current_directive(&self) -> Option<&Directive> {
        self.current.and_then(|idx| self.items.get(idx))
    }

    pub fn working(&self) -> Option<&Working> {
        self.working.as_ref()
    }

    pub fn dice_working(&self) -> Option<&DiceWorking> {
        match self.working.as_ref() {
            Some(Working::Dice(state)) => Some(state),
            _ => None,
        }
    }

    pub fn deck_working(&self) -> Option<&DeckWorking> {
        match self.working.as_ref() {
            Some(Working::Deck(state)) => Some(state),
            _ => None,
        }
    }

    /// "[name] label" of the most recently resolved action, for copy pads
    /// and external logs.
    pub fn last_summary(&self) -> Option<&str> {
        self.last_summary.as_deref()
    }

    /// Re-parses the scan text. Occurrences are de-duplicated by raw span and
    /// ordered newest first (the last occurrence on the page is assumed
    /// newest). The current directive and its in-progress working state
    /// survive whenever its raw span is still present; otherwise selection
    /// falls back to the newest starred directive, then the newest overall.
    pub fn rescan(&mut self, text: &str, events: &mut EventBus) -> usize {
        let mut seen = HashSet::new();
        let mut fresh: Vec<Directive> = Vec::new();
        for directive in crate::parse(text) {
            if seen.insert(directive.raw.clone()) {
                fresh.push(directive);
            }
        }
        fresh.reverse();

        let old_raw = self.current_directive().map(|d| d.raw.clone());
        self.items = fresh;
        events.push(Event::Rescanned {
            directives: self.items.len(),
        });

        if self.items.is_empty() {
            self.current = None;
            self.working = None;
            return 0;
        }
        if let Some(raw) = old_raw {
            if let Some(idx) = self.items.iter().position(|d| d.raw == raw) {
                self.current = Some(idx);
                return self.items.len();
            }
        }
        let idx = self
            .items
            .iter()
            .position(|d| d.starred)
            .unwrap_or(0);
        self.current = Some(idx);
        self.rebuild_working();
        events.push(Event::DirectiveSelected { index: idx });
        self.items.len()
    }

    /// Switches the current directive. Any in-flight reveal is discarded
    /// without committing and the working state is rebuilt from scratch.
    pub fn select(&mut self, index: usize, events: &mut EventBus) -> Result<(), ResolveError> {
        if index >= self.items.len() {
            return Err(ResolveError::InvalidIndex);
        }
        self.current = Some(index);
        self.rebuild_working();
        events.push(Event::DirectiveSelected { index });
        Ok(())
    }

    pub fn select_by_raw(&mut self, raw: &str, events: &mut EventBus) -> Result<(), ResolveError> {
        let idx = self
            .items
            .iter()
            .position(|d| d.raw == raw)
            .ok_or(ResolveError::InvalidIndex)?;
        self.select(idx, events)
    }

    /// Steps to the chronologically older neighbour (the list is newest
    /// first), wrapping around.
    pub fn select_older(&mut self, events: &mut EventBus) -> Result<(), ResolveError> {
        let len = self.items.len();
        if len == 0 {
            return Err(ResolveError::NoCurrent);
        }
        let idx = (self.current.unwrap_or(0) + 1) % len;
        self.select(idx, events)
    }

    pub fn select_newer(&mut self, events: &mut EventBus) -> Result<(), ResolveError> {
        let len = self.items.len();
        if len == 0 {
            return Err(ResolveError::NoCurrent);
        }
        let idx = (self.current.unwrap_or(0) + len - 1) % len;
        self.select(idx, events)
    }

    fn rebuild_working(&mut self) {
        let directive = self.current_directive().cloned();
        self.working = match directive {
            Some(directive) if directive.uses_deck() => {
                Some(Working::Deck(DeckWorking::new(&mut self.rng)))
            }
            Some(directive) => DiceWorking::for_directive(&directive).map(Working::Dice),
            None => None,
        };
    }

    /// Deletes a saved quickness roll by subject. Deletion is the one
    /// explicit user action on the store; reads never mutate it.
    pub fn delete_quickness(&mut self, subject: &str, events: &mut EventBus) -> bool {
        let deleted = self.store.delete_quickness(subject);
        if deleted {
            events.push(Event::SavedDeleted {
                subject: subject.to_string(),
            });
        }
        deleted
    }

    pub fn delete_hex(&mut self, subject: &str, events: &mut EventBus) -> bool {
        let deleted = self.store.delete_hex(subject);
        if deleted {
            events.push(Event::SavedDeleted {
                subject: subject.to_string(),
            });
        }
        deleted
    }

    pub(crate) fn set_summary(&mut self, name: &str, label: &str) {
        self.last_summary = Some(format!("[{name}] {label}"));
    }
}

pub(crate) fn success_text(pass: bool) -> &'static str {
    if pass {
        "SUCCESS"
    } else {
        "FAIL"
    }
}
