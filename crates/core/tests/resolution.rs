use macrodeck_core::{DieSpec, Event, EventBus, ResolveError, Session};

fn session_with(seed: u64, text: &str) -> (Session, EventBus) {
    let mut session = Session::from_seed(seed);
    let mut events = EventBus::default();
    session.rescan(text, &mut events);
    (session, events)
}

#[test]
fn rescan_orders_newest_first_and_prefers_starred() {
    let text = "[[Roll | Name: A ]] [[Roll | Name: B ⭐ ]] [[Roll | Name: C ]]";
    let (session, _) = session_with(1, text);
    let names: Vec<&str> = session
        .items()
        .iter()
        .map(|item| item.name.as_str())
        .collect();
    assert_eq!(names, ["C", "B ⭐", "A"]);
    assert_eq!(session.current_directive().map(|d| d.name.as_str()), Some("B ⭐"));
}

#[test]
fn rescan_deduplicates_identical_raw_spans() {
    let text = "[[Roll | Name: A ]] and again [[Roll | Name: A ]]";
    let (session, _) = session_with(1, text);
    assert_eq!(session.items().len(), 1);
}

#[test]
fn rescan_preserves_working_state_while_raw_survives() {
    let text = "[[Roll | Name: Keeper | 1d1 | Type: Exploding ]] [[Roll | Name: Other ]]";
    let (mut session, mut events) = session_with(2, text);
    session.select_by_raw("[[Roll | Name: Keeper | 1d1 | Type: Exploding ]]", &mut events)
        .unwrap();
    session.begin_roll(&mut events).unwrap();
    session.complete_roll(&mut events).unwrap();
    assert_eq!(session.dice_working().unwrap().chain, vec![1]);

    session.rescan(text, &mut events);
    assert_eq!(session.dice_working().unwrap().chain, vec![1]);

    session.rescan("[[Roll | Name: Other ]]", &mut events);
    assert!(session.dice_working().unwrap().chain.is_empty());
}

#[test]
fn reveal_window_blocks_reentry_and_cancel_discards() {
    let (mut session, mut events) = session_with(3, "[[Roll | Name: R | 2d6 ]]");
    assert_eq!(
        session.complete_roll(&mut events),
        Err(ResolveError::NoRollInProgress)
    );
    let preview = session.begin_roll(&mut events).unwrap();
    assert_eq!(preview.len(), 2);
    assert!(session.dice_working().unwrap().is_rolling());
    assert_eq!(
        session.begin_roll(&mut events),
        Err(ResolveError::RollInProgress)
    );
    session.cancel_roll();
    assert!(!session.dice_working().unwrap().is_rolling());
    assert!(session.dice_working().unwrap().rolls.is_empty());
    assert_eq!(
        session.complete_roll(&mut events),
        Err(ResolveError::NoRollInProgress)
    );
}

#[test]
fn switching_directives_discards_the_reveal() {
    let text = "[[Roll | Name: A ]] [[Roll | Name: B ]]";
    let (mut session, mut events) = session_with(4, text);
    session.begin_roll(&mut events).unwrap();
    session.select_older(&mut events).unwrap();
    assert!(!session.dice_working().unwrap().is_rolling());
    assert_eq!(
        session.complete_roll(&mut events),
        Err(ResolveError::NoRollInProgress)
    );
}

#[test]
fn exploding_chain_grows_only_at_max_face() {
    let (mut session, mut events) =
        session_with(5, "[[Roll | Name: Burst | 1d1 | Type: Exploding ]]");
    assert_eq!(session.explode(&mut events), Err(ResolveError::NoExplosion));
    session.begin_roll(&mut events).unwrap();
    session.complete_roll(&mut events).unwrap();
    assert_eq!(session.dice_working().unwrap().chain, vec![1]);
    session.explode(&mut events).unwrap();
    session.explode(&mut events).unwrap();
    let state = session.dice_working().unwrap();
    assert_eq!(state.chain, vec![1, 1, 1]);
    assert_eq!(state.chain_sum(), 3);
}

#[test]
fn exploding_respects_the_rolled_face() {
    let (mut session, mut events) =
        session_with(6, "[[Roll | Name: Maybe | 1d2 | Type: Exploding ]]");
    session.begin_roll(&mut events).unwrap();
    session.complete_roll(&mut events).unwrap();
    let last = *session.dice_working().unwrap().chain.last().unwrap();
    let result = session.explode(&mut events);
    if last == 2 {
        assert!(result.is_ok());
    } else {
        assert_eq!(result, Err(ResolveError::NoExplosion));
    }
}

#[test]
fn non_exploding_roll_refuses_to_explode() {
    let (mut session, mut events) = session_with(7, "[[Roll | Name: Flat | 1d1 ]]");
    session.begin_roll(&mut events).unwrap();
    session.complete_roll(&mut events).unwrap();
    assert_eq!(session.explode(&mut events), Err(ResolveError::NotExploding));
}

#[test]
fn combat_hit_location_sticks_across_explosions() {
    let (mut session, mut events) =
        session_with(8, "[[Roll | Name: Smash | 1d1 | Type: Combat ]]");
    session.begin_roll(&mut events).unwrap();
    let label = session.complete_roll(&mut events).unwrap();
    assert!(label.contains("Hit:"));
    let hit = session.dice_working().unwrap().hit;
    assert!(hit.is_some());
    for _ in 0..5 {
        session.explode(&mut events).unwrap();
        assert_eq!(session.dice_working().unwrap().hit, hit);
    }
}

#[test]
fn quickness_round_trip_draws_the_saved_count() {
    let text = "[[Quickness Roll | Name: Init | 1d1 | TN: 1 | Mod: +1 | For: Bob ]] \
                [[Quickness Draw | Name: Act | For: bob ]]";
    let (mut session, mut events) = session_with(9, text);
    session
        .select_by_raw("[[Quickness Roll | Name: Init | 1d1 | TN: 1 | Mod: +1 | For: Bob ]]", &mut events)
        .unwrap();
    session.begin_roll(&mut events).unwrap();
    let label = session.complete_roll(&mut events).unwrap();
    // Chain [1] + 1 meets TN 1 with no raise: two cards.
    assert!(label.contains("Quickness saved: 2 card(s) for Bob"));
    let entry = session.store.quickness("BOB").unwrap().clone();
    assert_eq!(entry.cards, 2);
    assert_eq!(entry.base, 1);

    session
        .select_by_raw("[[Quickness Draw | Name: Act | For: bob ]]", &mut events)
        .unwrap();
    session.draw(&mut events).unwrap();
    assert_eq!(session.deck_working().unwrap().drawn.len(), 2);
}

#[test]
fn saved_quickness_matches_worked_example() {
    let mut session = Session::from_seed(10);
    let entry = session
        .store
        .save_quickness("Ada", DieSpec::new(1, 4), 1, 5, &[7]);
    assert_eq!(entry.raises, 0);
    assert_eq!(entry.cards, 2);
}

#[test]
fn saved_rolls_overwrite_per_subject() {
    let mut session = Session::from_seed(11);
    session
        .store
        .save_quickness("Ada", DieSpec::new(1, 4), 0, 5, &[2]);
    session
        .store
        .save_quickness(" ada ", DieSpec::new(1, 4), 0, 5, &[9]);
    let entry = session.store.quickness("Ada").unwrap();
    assert_eq!(entry.chain, vec![9]);
    assert_eq!(session.store.quickness_entries().len(), 1);
    assert!(session.store.delete_quickness("ADA"));
    assert!(session.store.quickness("Ada").is_none());
}

#[test]
fn deleting_a_saved_roll_emits_an_event() {
    let mut session = Session::from_seed(25);
    let mut events = EventBus::default();
    session
        .store
        .save_quickness("Ada", DieSpec::new(1, 4), 0, 5, &[2]);
    assert!(session.delete_quickness("ADA", &mut events));
    let drained: Vec<Event> = events.drain().collect();
    assert!(matches!(
        drained.as_slice(),
        [Event::SavedDeleted { subject }] if subject == "ADA"
    ));
    // A second delete finds nothing and stays silent.
    assert!(!session.delete_quickness("ADA", &mut events));
    assert_eq!(events.drain().count(), 0);
}

#[test]
fn hex_draw_requires_a_successful_saved_roll() {
    let text = "[[Hex Roll | Name: Curse | 1d1 | TN: 99 | For: Mira ]] \
                [[Hex Draw | Name: Lash | For: Mira ]]";
    let (mut session, mut events) = session_with(12, text);
    session
        .select_by_raw("[[Hex Draw | Name: Lash | For: Mira ]]", &mut events)
        .unwrap();
    assert_eq!(
        session.draw(&mut events),
        Err(ResolveError::HexNotSaved("Mira".to_string()))
    );

    session
        .select_by_raw("[[Hex Roll | Name: Curse | 1d1 | TN: 99 | For: Mira ]]", &mut events)
        .unwrap();
    session.begin_roll(&mut events).unwrap();
    let label = session.complete_roll(&mut events).unwrap();
    assert!(label.contains("Hex FAIL"));
    session
        .select_by_raw("[[Hex Draw | Name: Lash | For: Mira ]]", &mut events)
        .unwrap();
    assert_eq!(
        session.draw(&mut events),
        Err(ResolveError::HexRollFailed("Mira".to_string()))
    );
}

#[test]
fn hex_draw_adds_two_cards_per_raise() {
    let text = "[[Hex Roll | Name: Curse | 1d1 | TN: 1 | Mod: +5 | For: Mira ]] \
                [[Hex Draw | Name: Lash | Hand Size: 3 | For: Mira ]]";
    let (mut session, mut events) = session_with(13, text);
    session
        .select_by_raw("[[Hex Roll | Name: Curse | 1d1 | TN: 1 | Mod: +5 | For: Mira ]]", &mut events)
        .unwrap();
    session.begin_roll(&mut events).unwrap();
    let label = session.complete_roll(&mut events).unwrap();
    // Effective 6 against TN 1: success with one raise.
    assert!(label.contains("Hex SUCCESS (Raises: 1)"));
    session
        .select_by_raw("[[Hex Draw | Name: Lash | Hand Size: 3 | For: Mira ]]", &mut events)
        .unwrap();
    let label = session.draw(&mut events).unwrap();
    assert!(label.contains("base 3 + 2 (raises) = 5 card(s)"));
    assert_eq!(session.deck_working().unwrap().drawn.len(), 5);
}

#[test]
fn deck_draw_selection_eviction_and_play() {
    let (mut session, mut events) = session_with(14, "[[Deck | Name: G | Hand Size: 7 ]]");
    assert_eq!(session.play(&mut events), Err(ResolveError::NothingDrawn));
    session.draw(&mut events).unwrap();
    assert_eq!(session.deck_working().unwrap().drawn.len(), 7);
    assert_eq!(
        session.play(&mut events),
        Err(ResolveError::NothingSelected)
    );
    for idx in 0..6 {
        session.toggle_card(idx).unwrap();
    }
    let state = session.deck_working().unwrap();
    assert_eq!(state.selected.len(), 5);
    assert_eq!(state.selected, vec![1, 2, 3, 4, 5]);

    let label = session.play(&mut events).unwrap();
    assert!(label.starts_with("You play:"));
    assert!(session.last_summary().unwrap().starts_with("[G] You play:"));

    let label = session.auto_play(&mut events).unwrap();
    assert!(label.starts_with("You auto-play:"));
    assert_eq!(session.deck_working().unwrap().selected.len(), 5);
}

#[test]
fn toggle_card_out_of_range_is_rejected() {
    let (mut session, mut events) = session_with(15, "[[Deck | Name: G ]]");
    session.draw(&mut events).unwrap();
    assert_eq!(session.toggle_card(40), Err(ResolveError::InvalidCard));
}

#[test]
fn short_deck_is_reshuffled_before_drawing() {
    let (mut session, mut events) = session_with(16, "[[Deck | Name: Big | Hand Size: 50 ]]");
    session.draw(&mut events).unwrap();
    assert_eq!(session.deck_working().unwrap().deck.remaining(), 4);
    let label = session.draw(&mut events).unwrap();
    assert!(label.starts_with("Auto-reshuffled (low deck)."));
    let state = session.deck_working().unwrap();
    assert_eq!(state.drawn.len(), 50);
    assert_eq!(state.deck.remaining(), 4);
}

#[test]
fn trick_draws_one_and_resolves_by_color() {
    let (mut session, mut events) = session_with(17, "[[Deck | Name: T | Trick: yes ]]");
    assert_eq!(
        session.play(&mut events),
        Err(ResolveError::TrickNeedsOneCard)
    );
    session.draw(&mut events).unwrap();
    let card = session.deck_working().unwrap().drawn[0];
    let expected = macrodeck_core::trick_success(card);
    let label = session.play(&mut events).unwrap();
    assert!(label.starts_with("Trick result:"));
    assert_eq!(label.ends_with("SUCCESS"), expected);
}

#[test]
fn non_user_deck_auto_plays_on_draw() {
    let (mut session, mut events) =
        session_with(18, "[[Deck | Name: E | Hand Size: 7 | For: Goblin ]]");
    let label = session.draw(&mut events).unwrap();
    assert!(label.starts_with("Auto plays:"), "label was {label}");
    assert!(session.last_summary().unwrap().starts_with("[E] Auto plays:"));
}

#[test]
fn manual_override_hands_control_to_the_user() {
    let (mut session, mut events) =
        session_with(19, "[[Deck | Name: E | Hand Size: 5 | For: Goblin ]]");
    assert_eq!(session.toggle_override().unwrap(), "Manual mode.");
    let label = session.draw(&mut events).unwrap();
    assert!(label.starts_with("Select up to 5 cards"));
    assert_eq!(
        session.toggle_override().unwrap(),
        "Auto mode. Draw to auto-play."
    );
}

#[test]
fn override_is_only_for_non_user_actors() {
    let (mut session, mut events) = session_with(20, "[[Deck | Name: Mine ]]");
    session.draw(&mut events).unwrap();
    assert_eq!(
        session.toggle_override(),
        Err(ResolveError::OverrideNotApplicable)
    );
}

#[test]
fn non_user_quickness_draw_reports_actions_only() {
    let (mut session, mut events) =
        session_with(21, "[[Quickness Draw | Name: EQ | For: Goblin ]]");
    let label = session.draw(&mut events).unwrap();
    assert!(label.starts_with("Auto plays • Actions: 1"));
}

#[test]
fn user_quickness_draw_without_saved_roll_draws_one() {
    let (mut session, mut events) = session_with(22, "[[Quickness Draw | Name: QD ]]");
    let label = session.draw(&mut events).unwrap();
    assert!(label.contains("no saved roll — drawing 1 card."));
    assert_eq!(session.deck_working().unwrap().drawn.len(), 1);
    let label = session.play(&mut events).unwrap();
    assert!(label.starts_with("You play • Actions: 1"));
}

#[test]
fn operations_demand_the_matching_working_state() {
    let text = "[[Roll | Name: R ]] [[Deck | Name: D ]]";
    let (mut session, mut events) = session_with(23, text);
    session.select_by_raw("[[Roll | Name: R ]]", &mut events).unwrap();
    assert_eq!(session.draw(&mut events), Err(ResolveError::NotDeck));
    session.select_by_raw("[[Deck | Name: D ]]", &mut events).unwrap();
    assert_eq!(session.begin_roll(&mut events), Err(ResolveError::NotDice));
    assert_eq!(session.select(9, &mut events), Err(ResolveError::InvalidIndex));
}

#[test]
fn manual_shuffle_resets_the_turn() {
    let (mut session, mut events) = session_with(24, "[[Deck | Name: G ]]");
    session.draw(&mut events).unwrap();
    session.toggle_card(0).unwrap();
    let label = session.shuffle_deck(&mut events).unwrap();
    assert_eq!(label, "Shuffled new deck.");
    let state = session.deck_working().unwrap();
    assert!(state.drawn.is_empty());
    assert!(state.selected.is_empty());
    assert_eq!(state.deck.remaining(), 54);
}
