use crate::{Card, Rank, RngState, Suit};

pub const DECK_SIZE: usize = 54;

/// A draw pile. Always built as the full 54 cards (52 standard plus two
/// jokers); callers that run low replace it with a fresh shuffled deck rather
/// than drawing short.
#[derive(Debug, Clone)]
pub struct Deck {
    cards: Vec<Card>,
}

impl Deck {
    pub fn fresh54() -> Self {
        let mut cards = Vec::with_capacity(DECK_SIZE);
        for suit in Suit::ALL {
            for rank in Rank::ALL {
                cards.push(Card::standard(suit, rank));
            }
        }
        cards.push(Card::Joker);
        cards.push(Card::Joker);
        Self { cards }
    }

    pub fn shuffled(rng: &mut RngState) -> Self {
        let mut deck = Self::fresh54();
        deck.shuffle(rng);
        deck
    }

    pub fn shuffle(&mut self, rng: &mut RngState) {
        rng.shuffle(&mut self.cards);
    }

    /// Removes and returns up to `count` cards from the front of the pile.
    pub fn draw(&mut self, count: usize) -> Vec<Card> {
        let take = count.min(self.cards.len());
        self.cards.drain(..take).collect()
    }

    pub fn remaining(&self) -> usize {
        self.cards.len()
    }

    pub fn cards(&self) -> &[Card] {
        &self.cards
    }
}
