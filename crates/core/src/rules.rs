use crate::{count_ranks, Card, Rank};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

static ACE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\bace\b").unwrap());

/// Outcome of a minimum-hand requirement check. `reason` is empty on a pass.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Requirement {
    pub pass: bool,
    pub reason: String,
}

impl Requirement {
    pub fn pass() -> Self {
        Self {
            pass: true,
            reason: String::new(),
        }
    }

    fn fail(reason: &str) -> Self {
        Self {
            pass: false,
            reason: reason.to_string(),
        }
    }
}

/// Checks a free-text minimum spec against the selected cards. Recognized
/// phrasings: anything mentioning an ace, "pair ... jack(s)", and "none".
/// Unrecognized specs pass unconditionally; a requirement never blocks play
/// on its own.
pub fn check_requirement(min_spec: Option<&str>, selected: &[Card]) -> Requirement {
    let Some(spec) = min_spec else {
        return Requirement::pass();
    };
    let spec = spec.trim().to_lowercase();
    if spec.is_empty() {
        return Requirement::pass();
    }

    if ACE_RE.is_match(&spec) || (spec.contains("high card") && spec.contains("ace")) {
        if has_ace_or_joker(selected) {
            return Requirement::pass();
        }
        return Requirement::fail("Must include an Ace (Joker counts)");
    }

    if spec.contains("pair") && spec.contains("jack") {
        if has_pair_of_rank_or_higher(selected, Rank::Jack) {
            return Requirement::pass();
        }
        return Requirement::fail("Must include at least a Pair of Jacks (Jokers can complete)");
    }

    // "None" and anything unrecognized both pass.
    Requirement::pass()
}

fn has_ace_or_joker(cards: &[Card]) -> bool {
    cards
        .iter()
        .any(|card| card.is_joker() || card.rank() == Some(Rank::Ace))
}

fn has_pair_of_rank_or_higher(cards: &[Card], min_rank: Rank) -> bool {
    let ranks = count_ranks(cards);
    if ranks.jokers >= 2 {
        return true;
    }
    ranks
        .counts
        .iter()
        .filter(|(rank, _)| rank.value() >= min_rank.value())
        .any(|(_, &count)| 2usize.saturating_sub(count) <= ranks.jokers)
}

/// A trick draw succeeds on a red suit; jokers count as success.
pub fn trick_success(card: Card) -> bool {
    card.is_joker() || card.is_red()
}
