use crate::RngState;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;

static DIE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)(\d+)\s*d\s*(\d+)").unwrap());

/// An "NdM" dice specification.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct DieSpec {
    pub count: u32,
    pub sides: u32,
}

impl DieSpec {
    pub const D6: DieSpec = DieSpec { count: 1, sides: 6 };

    pub fn new(count: u32, sides: u32) -> Self {
        Self { count, sides }
    }

    /// Extracts the first `N d M` pattern from `text`; falls back to 1d6 when
    /// absent or malformed.
    pub fn parse(text: &str) -> Self {
        Self::find(text).unwrap_or(Self::D6)
    }

    pub fn find(text: &str) -> Option<Self> {
        let caps = DIE_RE.captures(text)?;
        let count = caps[1].parse().ok()?;
        let sides = caps[2].parse().ok()?;
        Some(Self { count, sides })
    }
}

impl fmt::Display for DieSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}d{}", self.count, self.sides)
    }
}

/// `count` independent faces, each uniform over [1, sides].
pub fn roll_dice(rng: &mut RngState, count: u32, sides: u32) -> Vec<u32> {
    (0..count).map(|_| rng.die(sides)).collect()
}

/// Degrees of success past the target number, one per full 5 over it.
/// Shared by plain rolls, quickness rolls and hex rolls.
pub fn raises(total: i32, tn: i32) -> i32 {
    if total < tn {
        return 0;
    }
    (total - tn) / 5
}

/// Card yield of a resolved quickness roll: a single card on a miss,
/// otherwise two plus one per raise.
pub fn quickness_cards(chain_sum: u32, modifier: i32, tn: i32) -> u32 {
    let effective = chain_sum as i32 + modifier;
    if effective < tn {
        return 1;
    }
    (2 + raises(effective, tn)) as u32
}

/// Combat hit location, assigned once per combat roll from a d20 band.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum HitLocation {
    Head,
    Guts,
    LeftArm,
    RightArm,
    LeftLeg,
    RightLeg,
}

impl HitLocation {
    pub fn from_d20(value: u32) -> Self {
        match value {
            1..=3 => HitLocation::Head,
            4..=7 => HitLocation::Guts,
            8..=10 => HitLocation::LeftArm,
            11..=13 => HitLocation::RightArm,
            14..=16 => HitLocation::LeftLeg,
            _ => HitLocation::RightLeg,
        }
    }

    pub fn pick(rng: &mut RngState) -> Self {
        Self::from_d20(rng.die(20))
    }
}

impl fmt::Display for HitLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            HitLocation::Head => "Head",
            HitLocation::Guts => "Guts",
            HitLocation::LeftArm => "Left Arm",
            HitLocation::RightArm => "Right Arm",
            HitLocation::LeftLeg => "Left Leg",
            HitLocation::RightLeg => "Right Leg",
        };
        f.write_str(text)
    }
}
