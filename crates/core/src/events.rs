use crate::HitLocation;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum Event {
    Rescanned { directives: usize },
    DirectiveSelected { index: usize },
    RollStarted { dice: u32 },
    RollCommitted { rolls: Vec<u32>, highest: u32 },
    ChainExtended { roll: u32, chain_sum: u32 },
    HitAssigned { location: HitLocation },
    QuicknessSaved { subject: String, cards: u32 },
    HexSaved { subject: String, success: bool },
    DeckReshuffled { auto: bool },
    CardsDrawn { count: usize },
    TrickResolved { success: bool },
    HandPlayed { hand: String, passed: bool },
    SavedDeleted { subject: String },
}

#[derive(Debug, Default)]
pub struct EventBus {
    queue: Vec<Event>,
}

impl EventBus {
    pub fn push(&mut self, event: Event) {
        self.queue.push(event);
    }

    pub fn drain(&mut self) -> impl Iterator<Item = Event> + '_ {
        self.queue.drain(..)
    }
}
