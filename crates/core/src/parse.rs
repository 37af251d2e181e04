use crate::DieSpec;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

static DECK_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\[\[\s*deck\s*\|\s*([^\]]+?)\s*\]\]").unwrap());
static ROLL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\[\[\s*roll\s*\|\s*([^\]]+?)\s*\]\]").unwrap());
static QUICKNESS_ROLL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\[\[\s*quickness\s+roll\s*\|\s*([^\]]+?)\s*\]\]").unwrap());
static QUICKNESS_DRAW_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\[\[\s*quickness\s+draw\s*\|\s*([^\]]+?)\s*\]\]").unwrap());
static HEX_ROLL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\[\[\s*hex\s+roll\s*\|\s*([^\]]+?)\s*\]\]").unwrap());
static HEX_DRAW_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\[\[\s*hex\s+draw\s*\|\s*([^\]]+?)\s*\]\]").unwrap());

static BARE_DIE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)^(\d+)d(\d+)$").unwrap());
static SIGNED_INT_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"([+-]?)\s*(\d+)").unwrap());

pub const DEFAULT_SUBJECT: &str = "User";
const STAR: char = '⭐';

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Actor {
    User,
    NonUser,
}

/// One parsed bracketed directive. `raw` is the exact matched span and serves
/// as the occurrence's identity key within a scan.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Directive {
    pub raw: String,
    pub name: String,
    pub starred: bool,
    pub for_whom: String,
    pub actor: Actor,
    pub kind: DirectiveKind,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum DirectiveKind {
    Roll {
        die: DieSpec,
        tn: i32,
        modifier: i32,
        exploding: bool,
        combat: bool,
    },
    Deck {
        hand_size: u32,
        trick: bool,
        min: Option<String>,
    },
    QuicknessRoll {
        die: DieSpec,
        tn: i32,
        modifier: i32,
        exploding: bool,
    },
    QuicknessDraw,
    HexRoll {
        die: DieSpec,
        tn: i32,
        modifier: i32,
        exploding: bool,
    },
    HexDraw {
        hand_size: u32,
        min: Option<String>,
    },
}

impl Directive {
    /// Deck-backed kinds build a [`crate::DeckWorking`]; the rest roll dice.
    pub fn uses_deck(&self) -> bool {
        matches!(
            self.kind,
            DirectiveKind::Deck { .. } | DirectiveKind::QuicknessDraw | DirectiveKind::HexDraw { .. }
        )
    }

    pub fn kind_label(&self) -> &'static str {
        match self.kind {
            DirectiveKind::Roll { .. } => "Roll",
            DirectiveKind::Deck { .. } => "Deck",
            DirectiveKind::QuicknessRoll { .. } => "Quickness Roll",
            DirectiveKind::QuicknessDraw => "Quickness Draw",
            DirectiveKind::HexRoll { .. } => "Hex Roll",
            DirectiveKind::HexDraw { .. } => "Hex Draw",
        }
    }

    pub fn min_spec(&self) -> Option<&str> {
        match &self.kind {
            DirectiveKind::Deck { min, .. } | DirectiveKind::HexDraw { min, .. } => min.as_deref(),
            _ => None,
        }
    }
}

/// Scans `text` for all six directive families and returns them in order of
/// discovery in the text. Malformed fields fall back to their defaults; a
/// directive is never rejected for one bad field.
pub fn parse(text: &str) -> Vec<Directive> {
    let mut found: Vec<(usize, Directive)> = Vec::new();

    for m in DECK_RE.captures_iter(text) {
        let fields = parse_fields(&m[1]);
        let hand_size = to_int(fields.get("hand size"), 5);
        found.push((
            m.get(0).map(|g| g.start()).unwrap_or(0),
            build(
                &m[0],
                &fields,
                DirectiveKind::Deck {
                    hand_size: if hand_size > 0 { hand_size as u32 } else { 5 },
                    trick: yes(fields.get("trick")),
                    min: min_spec(&fields),
                },
            ),
        ));
    }

    for m in ROLL_RE.captures_iter(text) {
        let fields = parse_fields(&m[1]);
        let type_field = fields
            .get("type")
            .map(|value| value.to_lowercase())
            .unwrap_or_default();
        let combat = type_field.contains("combat");
        found.push((
            m.get(0).map(|g| g.start()).unwrap_or(0),
            build(
                &m[0],
                &fields,
                DirectiveKind::Roll {
                    die: fields
                        .get("die")
                        .map(|value| DieSpec::parse(value))
                        .unwrap_or(DieSpec::D6),
                    tn: to_int(fields.get("tn"), 0),
                    modifier: to_signed_int(fields.get("mod"), 0),
                    // Combat rolls always explode.
                    exploding: combat || type_field.contains("explod"),
                    combat,
                },
            ),
        ));
    }

    for m in QUICKNESS_ROLL_RE.captures_iter(text) {
        let fields = parse_fields(&m[1]);
        found.push((
            m.get(0).map(|g| g.start()).unwrap_or(0),
            build(
                &m[0],
                &fields,
                DirectiveKind::QuicknessRoll {
                    die: die_for_roll(&fields, &m[1], DieSpec::new(1, 4)),
                    tn: to_int(fields.get("tn"), 5),
                    modifier: to_signed_int(fields.get("mod"), 0),
                    exploding: exploding_default_on(&fields),
                },
            ),
        ));
    }

    for m in QUICKNESS_DRAW_RE.captures_iter(text) {
        let fields = parse_fields(&m[1]);
        found.push((
            m.get(0).map(|g| g.start()).unwrap_or(0),
            build(&m[0], &fields, DirectiveKind::QuicknessDraw),
        ));
    }

    for m in HEX_ROLL_RE.captures_iter(text) {
        let fields = parse_fields(&m[1]);
        found.push((
            m.get(0).map(|g| g.start()).unwrap_or(0),
            build(
                &m[0],
                &fields,
                DirectiveKind::HexRoll {
                    die: die_for_roll(&fields, &m[1], DieSpec::new(1, 8)),
                    tn: to_int(fields.get("tn"), 5),
                    modifier: to_signed_int(fields.get("mod"), 0),
                    exploding: exploding_default_on(&fields),
                },
            ),
        ));
    }

    for m in HEX_DRAW_RE.captures_iter(text) {
        let fields = parse_fields(&m[1]);
        let hand_size = to_int(fields.get("hand size"), 5);
        found.push((
            m.get(0).map(|g| g.start()).unwrap_or(0),
            build(
                &m[0],
                &fields,
                DirectiveKind::HexDraw {
                    hand_size: hand_size.max(0) as u32,
                    min: min_spec(&fields),
                },
            ),
        ));
    }

    found.sort_by_key(|(start, _)| *start);
    found.into_iter().map(|(_, directive)| directive).collect()
}

fn build(raw: &str, fields: &HashMap<String, String>, kind: DirectiveKind) -> Directive {
    let name = fields
        .get("name")
        .map(|value| value.trim().to_string())
        .unwrap_or_default();
    let for_whom = fields
        .get("for")
        .map(|value| value.trim().to_string())
        .unwrap_or_else(|| DEFAULT_SUBJECT.to_string());
    let actor = if for_whom.trim().eq_ignore_ascii_case("user") {
        Actor::User
    } else {
        Actor::NonUser
    };
    Directive {
        raw: raw.to_string(),
        starred: name.contains(STAR),
        name,
        for_whom,
        actor,
        kind,
    }
}

/// Pipe-separated `key:value` fields; keys are lowercased. A bare `NdM`
/// token is captured as the die spec without requiring a key.
fn parse_fields(inner: &str) -> HashMap<String, String> {
    let mut out = HashMap::new();
    for part in inner.split('|').map(str::trim).filter(|part| !part.is_empty()) {
        if let Some((key, value)) = part.split_once(':') {
            let key = key.trim().to_lowercase();
            let value = value.trim();
            if !key.is_empty() && !value.is_empty() {
                out.insert(key, value.to_string());
                continue;
            }
        }
        if let Some(caps) = BARE_DIE_RE.captures(part) {
            out.insert("die".to_string(), format!("{}d{}", &caps[1], &caps[2]));
        }
    }
    out
}

fn die_for_roll(fields: &HashMap<String, String>, inner: &str, default: DieSpec) -> DieSpec {
    match fields.get("die") {
        // An explicit but malformed die field degrades to 1d6, not to the
        // kind default.
        Some(value) => DieSpec::parse(value),
        None => DieSpec::find(inner).unwrap_or(default),
    }
}

fn exploding_default_on(fields: &HashMap<String, String>) -> bool {
    fields
        .get("type")
        .map(|value| value.to_lowercase().contains("explod"))
        .unwrap_or(true)
}

fn min_spec(fields: &HashMap<String, String>) -> Option<String> {
    fields
        .get("min hand/tn")
        .or_else(|| fields.get("min"))
        .cloned()
}

fn to_int(value: Option<&String>, default: i32) -> i32 {
    let Some(value) = value else {
        return default;
    };
    let digits: String = value
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '-')
        .collect();
    digits.parse().unwrap_or(default)
}

fn to_signed_int(value: Option<&String>, default: i32) -> i32 {
    let Some(value) = value else {
        return default;
    };
    let Some(caps) = SIGNED_INT_RE.captures(value) else {
        return default;
    };
    let sign = if &caps[1] == "-" { -1 } else { 1 };
    caps[2].parse::<i32>().map(|n| sign * n).unwrap_or(default)
}

fn yes(value: Option<&String>) -> bool {
    value
        .map(|v| v.trim_start().to_lowercase().starts_with('y'))
        .unwrap_or(false)
}
