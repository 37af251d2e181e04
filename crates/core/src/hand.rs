use crate::{Card, Rank, Suit};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Nine-tier hand classification, weakest first so derived ordering matches
/// strength. Jokers are wildcards with a shared budget: a check may spend
/// each joker once, never on two conditions at the same time.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum HandRank {
    HighCard,
    Pair,
    TwoPair,
    Trips,
    Straight,
    Flush,
    FullHouse,
    Quads,
    StraightFlush,
}

impl HandRank {
    pub fn tier(self) -> u8 {
        match self {
            HandRank::HighCard => 1,
            HandRank::Pair => 2,
            HandRank::TwoPair => 3,
            HandRank::Trips => 4,
            HandRank::Straight => 5,
            HandRank::Flush => 6,
            HandRank::FullHouse => 7,
            HandRank::Quads => 8,
            HandRank::StraightFlush => 9,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            HandRank::HighCard => "High Card",
            HandRank::Pair => "Pair",
            HandRank::TwoPair => "Two Pair",
            HandRank::Trips => "Three of a Kind",
            HandRank::Straight => "Straight",
            HandRank::Flush => "Flush",
            HandRank::FullHouse => "Full House",
            HandRank::Quads => "Four of a Kind",
            HandRank::StraightFlush => "Straight Flush",
        }
    }
}

/// One classified 5-card combination out of a larger draw.
#[derive(Debug, Clone)]
pub struct RankedHand {
    pub rank: HandRank,
    pub cards: Vec<Card>,
}

#[derive(Debug, Default)]
pub struct RankCounts {
    pub counts: HashMap<Rank, usize>,
    pub jokers: usize,
}

impl RankCounts {
    pub fn max_count(&self) -> usize {
        self.counts.values().copied().max().unwrap_or(0)
    }
}

pub fn count_ranks(cards: &[Card]) -> RankCounts {
    let mut out = RankCounts::default();
    for card in cards {
        match card.rank() {
            Some(rank) => *out.counts.entry(rank).or_insert(0) += 1,
            None => out.jokers += 1,
        }
    }
    out
}

pub fn count_suits(cards: &[Card]) -> (HashMap<Suit, usize>, usize) {
    let mut counts = HashMap::new();
    let mut jokers = 0;
    for card in cards {
        match card.suit() {
            Some(suit) => *counts.entry(suit).or_insert(0) += 1,
            None => jokers += 1,
        }
    }
    (counts, jokers)
}

fn can_make_kind(ranks: &RankCounts, n: usize) -> bool {
    if ranks.jokers >= n {
        return true;
    }
    ranks
        .counts
        .values()
        .any(|&count| n.saturating_sub(count) <= ranks.jokers)
}

fn can_make_flush(cards: &[Card]) -> bool {
    let (suits, jokers) = count_suits(cards);
    if jokers >= 5 {
        return true;
    }
    suits.values().any(|&count| count + jokers >= 5)
}

fn can_make_straight(cards: &[Card]) -> bool {
    let ranks = count_ranks(cards);
    let jokers = ranks.jokers;
    let values: Vec<u8> = ranks.counts.keys().map(|rank| rank.value()).collect();
    for start in 2..=10u8 {
        let missing = (start..start + 5)
            .filter(|value| !values.contains(value))
            .count();
        if missing <= jokers {
            return true;
        }
    }
    // Ace-low: A counts as 1 in A-2-3-4-5.
    let low = [14u8, 2, 3, 4, 5];
    let missing = low
        .into_iter()
        .filter(|value| !values.contains(value))
        .count();
    missing <= jokers
}

/// Exact shared-budget assignment: a triple of one rank plus a pair of a
/// different rank (pure-joker groups allowed), total joker spend within
/// budget.
fn can_make_full_house(ranks: &RankCounts) -> bool {
    let jokers = ranks.jokers;
    let mut triple_options: Vec<(Option<Rank>, usize)> = ranks
        .counts
        .iter()
        .map(|(&rank, &count)| (Some(rank), 3usize.saturating_sub(count)))
        .collect();
    triple_options.push((None, 3));
    for (triple_rank, triple_cost) in triple_options {
        if triple_cost > jokers {
            continue;
        }
        let left = jokers - triple_cost;
        if left >= 2 {
            return true;
        }
        let pair_ok = ranks
            .counts
            .iter()
            .filter(|(&rank, _)| Some(rank) != triple_rank)
            .any(|(_, &count)| 2usize.saturating_sub(count) <= left);
        if pair_ok {
            return true;
        }
    }
    false
}

fn can_make_two_pair(ranks: &RankCounts) -> bool {
    // Joker cost to complete a pair of each existing rank, plus pure-joker
    // pairs at cost 2; the two cheapest distinct groups must fit the budget.
    let mut costs: Vec<usize> = ranks
        .counts
        .values()
        .map(|&count| 2usize.saturating_sub(count))
        .collect();
    costs.push(2);
    costs.push(2);
    costs.sort_unstable();
    costs[0] + costs[1] <= ranks.jokers
}

fn can_make_pair(ranks: &RankCounts) -> bool {
    if ranks.jokers >= 2 {
        return true;
    }
    ranks.max_count() + ranks.jokers >= 2
}

/// Classifies exactly five cards into one of the nine tiers.
pub fn classify_five(cards: &[Card]) -> HandRank {
    debug_assert_eq!(cards.len(), 5);
    let ranks = count_ranks(cards);
    let flush = can_make_flush(cards);
    let straight = can_make_straight(cards);

    if straight && flush {
        return HandRank::StraightFlush;
    }
    if can_make_kind(&ranks, 4) {
        return HandRank::Quads;
    }
    if can_make_full_house(&ranks) {
        return HandRank::FullHouse;
    }
    if flush {
        return HandRank::Flush;
    }
    if straight {
        return HandRank::Straight;
    }
    if can_make_kind(&ranks, 3) {
        return HandRank::Trips;
    }
    if can_make_two_pair(&ranks) {
        return HandRank::TwoPair;
    }
    if can_make_pair(&ranks) {
        return HandRank::Pair;
    }
    HandRank::HighCard
}

/// Every 5-card combination of `cards`, classified and sorted strongest
/// first (stable for equal tiers). Empty when fewer than five cards are
/// available: there is no playable hand to rank.
pub fn best_hands(cards: &[Card]) -> Vec<RankedHand> {
    if cards.len() < 5 {
        return Vec::new();
    }
    let mut hands: Vec<RankedHand> = combinations_of_five(cards)
        .into_iter()
        .map(|combo| RankedHand {
            rank: classify_five(&combo),
            cards: combo,
        })
        .collect();
    hands.sort_by(|a, b| b.rank.cmp(&a.rank));
    hands
}

fn combinations_of_five(cards: &[Card]) -> Vec<Vec<Card>> {
    let n = cards.len();
    let k = 5;
    let mut out = Vec::new();
    let mut indices: Vec<usize> = (0..k).collect();
    loop {
        out.push(indices.iter().map(|&i| cards[i]).collect());
        let mut i = k;
        loop {
            if i == 0 {
                return out;
            }
            i -= 1;
            if indices[i] != i + n - k {
                break;
            }
        }
        indices[i] += 1;
        for j in i + 1..k {
            indices[j] = indices[j - 1] + 1;
        }
    }
}

/// Approximate classifier for an in-progress selection of up to five cards.
/// Uses rank multiplicity plus the wildcard count only, biased optimistic
/// (a pair plus a joker already reports full-house potential). Preview only;
/// final adjudication always goes through [`classify_five`].
pub fn quick_classify(cards: &[Card]) -> HandRank {
    if cards.is_empty() {
        return HandRank::HighCard;
    }
    if cards.len() >= 5 {
        return classify_five(&cards[..5]);
    }
    let ranks = count_ranks(cards);
    let max = ranks.max_count();
    let jokers = ranks.jokers;
    if max + jokers >= 4 {
        return HandRank::Quads;
    }
    if (max >= 2 && jokers >= 1) || jokers >= 2 {
        return HandRank::FullHouse;
    }
    if max + jokers >= 3 {
        return HandRank::Trips;
    }
    if max + jokers >= 2 {
        return HandRank::Pair;
    }
    HandRank::HighCard
}
