use crate::{quickness_cards, raises, DieSpec};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Normalized subject key: lowercased, whitespace collapsed. Empty names
/// fall back to the default subject "user".
pub fn subject_key(name: &str) -> String {
    let normalized = name
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase();
    if normalized.is_empty() {
        "user".to_string()
    } else {
        normalized
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct QuicknessEntry {
    pub subject: String,
    pub die: DieSpec,
    pub modifier: i32,
    pub tn: i32,
    pub base: u32,
    pub chain: Vec<u32>,
    pub raises: i32,
    pub cards: u32,
    pub ts: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HexEntry {
    pub subject: String,
    pub die: DieSpec,
    pub modifier: i32,
    pub tn: i32,
    pub base: u32,
    pub chain: Vec<u32>,
    pub success: bool,
    pub raises: i32,
    pub ts: DateTime<Utc>,
}

/// Session-scoped saved-roll store. Written once per resolved quickness or
/// hex roll (overwriting any previous entry for the subject), read by later
/// draw directives, and never mutated by a read.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct SavedRolls {
    quickness: HashMap<String, QuicknessEntry>,
    hex: HashMap<String, HexEntry>,
}

impl SavedRolls {
    pub fn save_quickness(
        &mut self,
        subject: &str,
        die: DieSpec,
        modifier: i32,
        tn: i32,
        chain: &[u32],
    ) -> QuicknessEntry {
        let sum: u32 = chain.iter().sum();
        let entry = QuicknessEntry {
            subject: subject.to_string(),
            die,
            modifier,
            tn,
            base: chain.first().copied().unwrap_or(0),
            chain: chain.to_vec(),
            raises: raises(sum as i32 + modifier, tn),
            cards: quickness_cards(sum, modifier, tn),
            ts: Utc::now(),
        };
        self.quickness.insert(subject_key(subject), entry.clone());
        entry
    }

    pub fn save_hex(
        &mut self,
        subject: &str,
        die: DieSpec,
        modifier: i32,
        tn: i32,
        chain: &[u32],
    ) -> HexEntry {
        let sum: u32 = chain.iter().sum();
        let effective = sum as i32 + modifier;
        let success = effective >= tn;
        let entry = HexEntry {
            subject: subject.to_string(),
            die,
            modifier,
            tn,
            base: chain.first().copied().unwrap_or(0),
            chain: chain.to_vec(),
            success,
            raises: if success { raises(effective, tn) } else { 0 },
            ts: Utc::now(),
        };
        self.hex.insert(subject_key(subject), entry.clone());
        entry
    }

    pub fn quickness(&self, subject: &str) -> Option<&QuicknessEntry> {
        self.quickness.get(&subject_key(subject))
    }

    pub fn hex(&self, subject: &str) -> Option<&HexEntry> {
        self.hex.get(&subject_key(subject))
    }

    pub fn delete_quickness(&mut self, subject: &str) -> bool {
        self.quickness.remove(&subject_key(subject)).is_some()
    }

    pub fn delete_hex(&mut self, subject: &str) -> bool {
        self.hex.remove(&subject_key(subject)).is_some()
    }

    /// Quickness entries, newest first.
    pub fn quickness_entries(&self) -> Vec<&QuicknessEntry> {
        let mut entries: Vec<&QuicknessEntry> = self.quickness.values().collect();
        entries.sort_by(|a, b| b.ts.cmp(&a.ts));
        entries
    }

    /// Hex entries, newest first.
    pub fn hex_entries(&self) -> Vec<&HexEntry> {
        let mut entries: Vec<&HexEntry> = self.hex.values().collect();
        entries.sort_by(|a, b| b.ts.cmp(&a.ts));
        entries
    }

    pub fn is_empty(&self) -> bool {
        self.quickness.is_empty() && self.hex.is_empty()
    }
}
