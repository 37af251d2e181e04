use super::{DiceWorking, ResolveError, Session, Working};
use crate::{
    raises, roll_dice, Directive, DirectiveKind, Event, EventBus, HitLocation, RngState, SavedRolls,
};

impl Session {
    /// First phase of a roll: stores placeholder values and opens the reveal
    /// window. Rejected while a reveal is already open; no concurrent rolls
    /// on one working state.
    pub fn begin_roll(&mut self, events: &mut EventBus) -> Result<Vec<u32>, ResolveError> {
        if self.current_directive().is_none() {
            return Err(ResolveError::NoCurrent);
        }
        let Some(Working::Dice(state)) = self.working.as_mut() else {
            return Err(ResolveError::NotDice);
        };
        if state.is_rolling() {
            return Err(ResolveError::RollInProgress);
        }
        let preview = roll_dice(&mut self.rng, state.die.count, state.die.sides);
        state.preview = Some(preview.clone());
        state.last_label = None;
        events.push(Event::RollStarted {
            dice: state.die.count,
        });
        Ok(preview)
    }

    /// Discards an open reveal without committing anything. Idempotent.
    pub fn cancel_roll(&mut self) {
        if let Some(Working::Dice(state)) = self.working.as_mut() {
            state.preview = None;
        }
    }

    /// Second phase of a roll: commits the final values, seeds the exploding
    /// chain with the highest die, and resolves quickness/hex saves and the
    /// combat hit location.
    pub fn complete_roll(&mut self, events: &mut EventBus) -> Result<String, ResolveError> {
        let item = self
            .current_directive()
            .cloned()
            .ok_or(ResolveError::NoCurrent)?;
        let Some(Working::Dice(state)) = self.working.as_mut() else {
            return Err(ResolveError::NotDice);
        };
        if state.preview.take().is_none() {
            return Err(ResolveError::NoRollInProgress);
        }
        state.rolls = roll_dice(&mut self.rng, state.die.count, state.die.sides);
        let highest = state.rolls.iter().copied().max().unwrap_or(0);
        state.high_index = state
            .rolls
            .iter()
            .position(|&roll| roll == highest)
            .unwrap_or(0);
        state.chain = vec![highest];
        events.push(Event::RollCommitted {
            rolls: state.rolls.clone(),
            highest,
        });

        let mut label = format!(
            "Rolled {}{} → [{}]  Highest={}  TN={}  Raises={}",
            state.die,
            if state.exploding { " (Exploding)" } else { "" },
            join(&state.rolls),
            highest,
            state.tn,
            raises(highest as i32 + state.modifier, state.tn),
        );
        resolve_roll_outcomes(&item, state, &mut self.store, &mut self.rng, events, &mut label);
        state.last_label = Some(label.clone());
        self.set_summary(&item.name, &label);
        Ok(label)
    }

    /// Appends one die to the exploding chain. Only permitted when the chain
    /// is live at the maximum face and the directive explodes at all.
    pub fn explode(&mut self, events: &mut EventBus) -> Result<String, ResolveError> {
        let item = self
            .current_directive()
            .cloned()
            .ok_or(ResolveError::NoCurrent)?;
        let Some(Working::Dice(state)) = self.working.as_mut() else {
            return Err(ResolveError::NotDice);
        };
        if state.is_rolling() {
            return Err(ResolveError::RollInProgress);
        }
        if !state.exploding {
            return Err(ResolveError::NotExploding);
        }
        if state.chain.last().copied().unwrap_or(0) != state.die.sides || state.die.sides == 0 {
            return Err(ResolveError::NoExplosion);
        }
        let roll = self.rng.die(state.die.sides);
        state.chain.push(roll);
        let chain_sum = state.chain_sum();
        events.push(Event::ChainExtended { roll, chain_sum });

        let mut label = format!(
            "Explosion added [{roll}] → Highest-chain={chain_sum}  TN={}  Raises={}",
            state.tn,
            raises(chain_sum as i32 + state.modifier, state.tn),
        );
        resolve_roll_outcomes(&item, state, &mut self.store, &mut self.rng, events, &mut label);
        state.last_label = Some(label.clone());
        self.set_summary(&item.name, &label);
        Ok(label)
    }
}

/// Shared tail of `complete_roll` and `explode`: saves quickness/hex results
/// under the directive's subject and pins the combat hit location the first
/// time a combat roll resolves.
fn resolve_roll_outcomes(
    item: &Directive,
    state: &mut DiceWorking,
    store: &mut SavedRolls,
    rng: &mut RngState,
    events: &mut EventBus,
    label: &mut String,
) {
    match item.kind {
        DirectiveKind::QuicknessRoll { .. } => {
            let entry = store.save_quickness(
                &item.for_whom,
                state.die,
                state.modifier,
                state.tn,
                &state.chain,
            );
            events.push(Event::QuicknessSaved {
                subject: item.for_whom.clone(),
                cards: entry.cards,
            });
            label.push_str(&format!(
                " • Quickness saved: {} card(s) for {}",
                entry.cards, item.for_whom
            ));
        }
        DirectiveKind::HexRoll { .. } => {
            let entry = store.save_hex(
                &item.for_whom,
                state.die,
                state.modifier,
                state.tn,
                &state.chain,
            );
            events.push(Event::HexSaved {
                subject: item.for_whom.clone(),
                success: entry.success,
            });
            if entry.success {
                label.push_str(&format!(" • Hex SUCCESS (Raises: {})", entry.raises));
            } else {
                label.push_str(" • Hex FAIL");
            }
        }
        DirectiveKind::Roll { combat: true, .. } => {
            let hit = match state.hit {
                Some(hit) => hit,
                None => {
                    let hit = HitLocation::pick(rng);
                    state.hit = Some(hit);
                    events.push(Event::HitAssigned { location: hit });
                    hit
                }
            };
            label.push_str(&format!(" • Hit: {hit}"));
        }
        _ => {}
    }
}

fn join(values: &[u32]) -> String {
    values
        .iter()
        .map(|value| value.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}
