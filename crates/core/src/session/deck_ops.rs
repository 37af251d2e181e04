use super::{success_text, DeckWorking, ResolveError, Session, Working, MAX_SELECTED};
use crate::{
    best_hands, card_list, check_requirement, quick_classify, trick_success, Actor, Card, Deck,
    Directive, DirectiveKind, Event, EventBus, RankedHand, Requirement, RngState,
};

impl Session {
    /// Draws this turn's cards. The count depends on the directive kind:
    /// tricks draw one, decks draw the hand size, quickness draws use the
    /// saved card count, hex draws require a successful saved hex roll and
    /// add two cards per raise. A short deck is replaced by a fresh shuffled
    /// 54 before drawing. NonUser actors without manual override resolve
    /// their play immediately.
    pub fn draw(&mut self, events: &mut EventBus) -> Result<String, ResolveError> {
        let item = self
            .current_directive()
            .cloned()
            .ok_or(ResolveError::NoCurrent)?;
        let (count, drawn_label) = self.draw_count(&item)?;
        let Some(Working::Deck(state)) = self.working.as_mut() else {
            return Err(ResolveError::NotDeck);
        };

        let mut notice = String::new();
        if state.deck.remaining() < count {
            state.deck = Deck::shuffled(&mut self.rng);
            events.push(Event::DeckReshuffled { auto: true });
            notice.push_str("Auto-reshuffled (low deck). ");
        }
        state.drawn = state.deck.draw(count);
        state.selected.clear();
        state.trick_done = matches!(item.kind, DirectiveKind::Deck { trick: true, .. });
        state.last_label = None;
        events.push(Event::CardsDrawn {
            count: state.drawn.len(),
        });

        if item.actor == Actor::NonUser && !state.manual_override {
            let label = enemy_resolve(&item, state, &mut self.rng, events)?;
            state.last_label = Some(label.clone());
            self.set_summary(&item.name, &label);
            return Ok(format!("{notice}{label}"));
        }

        let label = match item.kind {
            DirectiveKind::QuicknessDraw => match drawn_label {
                Some(text) => text,
                None => format!(
                    "Quickness Draw — Actions: {} (hand ignored).",
                    state.drawn.len()
                ),
            },
            DirectiveKind::HexDraw { .. } => drawn_label.unwrap_or_default(),
            _ => "Select up to 5 cards (your selection is your hand).".to_string(),
        };
        Ok(format!("{notice}{label}"))
    }

    /// Draw count and, for the saved-roll kinds, the explanatory label. The
    /// second value is `Some` when the count came from (or missed) a saved
    /// roll.
    fn draw_count(&self, item: &Directive) -> Result<(usize, Option<String>), ResolveError> {
        match &item.kind {
            DirectiveKind::Deck {
                hand_size, trick, ..
            } => {
                let count = if *trick { 1 } else { (*hand_size).max(1) as usize };
                Ok((count, None))
            }
            DirectiveKind::QuicknessDraw => match self.store.quickness(&item.for_whom) {
                Some(saved) => Ok((saved.cards as usize, None)),
                None => Ok((
                    1,
                    Some(format!(
                        "Quickness Draw for {}: no saved roll — drawing 1 card.",
                        item.for_whom
                    )),
                )),
            },
            DirectiveKind::HexDraw { hand_size, .. } => {
                let saved = self
                    .store
                    .hex(&item.for_whom)
                    .ok_or_else(|| ResolveError::HexNotSaved(item.for_whom.clone()))?;
                if !saved.success {
                    return Err(ResolveError::HexRollFailed(item.for_whom.clone()));
                }
                let bonus = saved.raises * 2;
                let count = (*hand_size as i32 + bonus).max(1) as usize;
                Ok((
                    count,
                    Some(format!(
                        "Hex Draw for {}: base {} + {} (raises) = {} card(s).",
                        saved.subject, hand_size, bonus, count
                    )),
                ))
            }
            _ => Err(ResolveError::NotDeck),
        }
    }

    /// Toggles one drawn card in or out of the selection. The selection holds
    /// at most five; the oldest pick is evicted on overflow. Returns the live
    /// preview label for the new selection.
    pub fn toggle_card(&mut self, index: usize) -> Result<String, ResolveError> {
        let item = self
            .current_directive()
            .cloned()
            .ok_or(ResolveError::NoCurrent)?;
        let Some(Working::Deck(state)) = self.working.as_mut() else {
            return Err(ResolveError::NotDeck);
        };
        if index >= state.drawn.len() {
            return Err(ResolveError::InvalidCard);
        }
        state.last_label = None;
        if let Some(pos) = state.selected.iter().position(|&i| i == index) {
            state.selected.remove(pos);
        } else {
            if state.selected.len() >= MAX_SELECTED {
                state.selected.remove(0);
            }
            state.selected.push(index);
        }

        if matches!(item.kind, DirectiveKind::QuicknessDraw) {
            return Ok(format!(
                "Quickness Draw — Actions: {} (hand ignored).",
                state.drawn.len()
            ));
        }
        if state.selected.is_empty() {
            return Ok("Select up to 5 cards (your selection is your hand).".to_string());
        }
        let selected = state.selected_cards();
        Ok(format!(
            "{} — [{}]",
            quick_classify(&selected).name(),
            card_list(&selected)
        ))
    }

    /// Plays the current selection (or resolves the trick / reports the
    /// action count). NonUser actors in auto mode route through the enemy
    /// policy instead.
    pub fn play(&mut self, events: &mut EventBus) -> Result<String, ResolveError> {
        let item = self
            .current_directive()
            .cloned()
            .ok_or(ResolveError::NoCurrent)?;
        let Some(Working::Deck(state)) = self.working.as_mut() else {
            return Err(ResolveError::NotDeck);
        };

        if item.actor == Actor::NonUser && !state.manual_override {
            let label = enemy_resolve(&item, state, &mut self.rng, events)?;
            state.last_label = Some(label.clone());
            self.set_summary(&item.name, &label);
            return Ok(label);
        }

        let label = match &item.kind {
            DirectiveKind::Deck { trick: true, .. } => {
                if state.drawn.len() != 1 {
                    return Err(ResolveError::TrickNeedsOneCard);
                }
                let success = trick_success(state.drawn[0]);
                events.push(Event::TrickResolved { success });
                format!(
                    "Trick result: {} → {}",
                    state.drawn[0],
                    success_text(success)
                )
            }
            DirectiveKind::QuicknessDraw => {
                if state.drawn.is_empty() {
                    return Err(ResolveError::NothingDrawn);
                }
                format!(
                    "You play • Actions: {} [{}]",
                    state.drawn.len(),
                    card_list(&state.drawn)
                )
            }
            _ => {
                if state.drawn.is_empty() {
                    return Err(ResolveError::NothingDrawn);
                }
                if state.selected.is_empty() {
                    return Err(ResolveError::NothingSelected);
                }
                let selected = state.selected_cards();
                let hand = quick_classify(&selected);
                let req = check_requirement(item.min_spec(), &selected);
                events.push(Event::HandPlayed {
                    hand: hand.name().to_string(),
                    passed: req.pass,
                });
                let mut label = format!(
                    "You play: {} [{}] — {}{}",
                    hand.name(),
                    card_list(&selected),
                    success_text(req.pass),
                    reason_suffix(&req),
                );
                if matches!(item.kind, DirectiveKind::HexDraw { .. }) {
                    label.push_str(&format!(" • Actions: {}", state.drawn.len()));
                }
                label
            }
        };
        state.last_label = Some(label.clone());
        self.set_summary(&item.name, &label);
        Ok(label)
    }

    /// Plays the best 5-card hand out of the full draw, selecting its cards.
    pub fn auto_play(&mut self, events: &mut EventBus) -> Result<String, ResolveError> {
        let item = self
            .current_directive()
            .cloned()
            .ok_or(ResolveError::NoCurrent)?;
        let Some(Working::Deck(state)) = self.working.as_mut() else {
            return Err(ResolveError::NotDeck);
        };

        let label = match &item.kind {
            DirectiveKind::Deck { trick: true, .. } => {
                if state.drawn.len() != 1 {
                    return Err(ResolveError::TrickNeedsOneCard);
                }
                let success = trick_success(state.drawn[0]);
                events.push(Event::TrickResolved { success });
                format!(
                    "Trick result: {} → {}",
                    state.drawn[0],
                    success_text(success)
                )
            }
            DirectiveKind::QuicknessDraw => {
                if state.drawn.is_empty() {
                    return Err(ResolveError::NothingDrawn);
                }
                format!(
                    "You auto-play • Actions: {} [{}]",
                    state.drawn.len(),
                    card_list(&state.drawn)
                )
            }
            _ => {
                if state.drawn.is_empty() {
                    return Err(ResolveError::NothingDrawn);
                }
                let ranked = best_hands(&state.drawn);
                let Some(best) = ranked.first() else {
                    return Err(ResolveError::NoPlayableHand);
                };
                state.selected = indices_for(&state.drawn, &best.cards);
                let req = check_requirement(item.min_spec(), &best.cards);
                events.push(Event::HandPlayed {
                    hand: best.rank.name().to_string(),
                    passed: req.pass,
                });
                let mut label = format!(
                    "You auto-play: {} [{}] — {}{}",
                    best.rank.name(),
                    card_list(&best.cards),
                    success_text(req.pass),
                    reason_suffix(&req),
                );
                if matches!(item.kind, DirectiveKind::HexDraw { .. }) {
                    label.push_str(&format!(" • Actions: {}", state.drawn.len()));
                }
                label
            }
        };
        state.last_label = Some(label.clone());
        self.set_summary(&item.name, &label);
        Ok(label)
    }

    /// Lets a human take over a NonUser actor's turn (and hand it back).
    /// Returning to automatic does not replay past actions.
    pub fn toggle_override(&mut self) -> Result<String, ResolveError> {
        let item = self
            .current_directive()
            .cloned()
            .ok_or(ResolveError::NoCurrent)?;
        let Some(Working::Deck(state)) = self.working.as_mut() else {
            return Err(ResolveError::NotDeck);
        };
        if item.actor == Actor::User {
            return Err(ResolveError::OverrideNotApplicable);
        }
        state.manual_override = !state.manual_override;
        Ok(if state.manual_override {
            "Manual mode.".to_string()
        } else {
            "Auto mode. Draw to auto-play.".to_string()
        })
    }

    /// Replaces the deck with a fresh shuffled 54 and clears the turn.
    pub fn shuffle_deck(&mut self, events: &mut EventBus) -> Result<String, ResolveError> {
        if self.current_directive().is_none() {
            return Err(ResolveError::NoCurrent);
        }
        let Some(Working::Deck(state)) = self.working.as_mut() else {
            return Err(ResolveError::NotDeck);
        };
        state.deck = Deck::shuffled(&mut self.rng);
        state.drawn.clear();
        state.selected.clear();
        state.last_label = None;
        events.push(Event::DeckReshuffled { auto: false });
        Ok("Shuffled new deck.".to_string())
    }
}

/// Automatic resolution for a NonUser actor: tricks and quickness draws
/// resolve mechanically; everything else plays a hand picked by the weighted
/// policy.
fn enemy_resolve(
    item: &Directive,
    state: &mut DeckWorking,
    rng: &mut RngState,
    events: &mut EventBus,
) -> Result<String, ResolveError> {
    match &item.kind {
        DirectiveKind::QuicknessDraw => Ok(format!(
            "Auto plays • Actions: {} [{}]",
            state.drawn.len(),
            card_list(&state.drawn)
        )),
        DirectiveKind::Deck { trick: true, .. } => {
            if state.drawn.len() != 1 {
                return Err(ResolveError::TrickNeedsOneCard);
            }
            let success = trick_success(state.drawn[0]);
            events.push(Event::TrickResolved { success });
            Ok(format!(
                "Auto Trick: {} → {}",
                state.drawn[0],
                success_text(success)
            ))
        }
        _ => {
            let ranked = best_hands(&state.drawn);
            if ranked.is_empty() {
                return Err(ResolveError::NoPlayableHand);
            }
            let (chosen, why) = enemy_pick(&ranked, rng);
            let req = check_requirement(item.min_spec(), &chosen.cards);
            events.push(Event::HandPlayed {
                hand: chosen.rank.name().to_string(),
                passed: req.pass,
            });
            let mut label = format!(
                "Auto plays: {} — {}{}; {} [{}]",
                chosen.rank.name(),
                success_text(req.pass),
                reason_suffix(&req),
                why,
                card_list(&chosen.cards),
            );
            if matches!(item.kind, DirectiveKind::HexDraw { .. }) {
                label.push_str(&format!(" • Actions: {}", state.drawn.len()));
            }
            Ok(label)
        }
    }
}

/// Weighted pick over the ranked hand list: 2.5% take the second best, 2.5%
/// take the worst, otherwise the best.
fn enemy_pick<'a>(ranked: &'a [RankedHand], rng: &mut RngState) -> (&'a RankedHand, &'static str) {
    let roll = rng.chance();
    if roll < 0.025 && ranked.len() >= 2 {
        (&ranked[1], "Missed best (2nd best)")
    } else if roll < 0.05 {
        (&ranked[ranked.len() - 1], "Blundered (worst hand)")
    } else {
        (&ranked[0], "Best hand")
    }
}

/// Maps the chosen combination back to indices into the drawn cards, using
/// each drawn card at most once.
fn indices_for(drawn: &[Card], chosen: &[Card]) -> Vec<usize> {
    let mut used = vec![false; drawn.len()];
    let mut out = Vec::new();
    for card in chosen {
        let found = drawn
            .iter()
            .enumerate()
            .position(|(idx, candidate)| !used[idx] && candidate == card);
        if let Some(idx) = found {
            used[idx] = true;
            out.push(idx);
        }
    }
    out.truncate(MAX_SELECTED);
    out
}

fn reason_suffix(req: &Requirement) -> String {
    if req.reason.is_empty() {
        String::new()
    } else {
        format!(" ({})", req.reason)
    }
}
