use macrodeck_core::{parse, Actor, DieSpec, DirectiveKind};

#[test]
fn roll_with_every_field() {
    let text = "[[ Roll | Name: Strike ⭐ | 2d8 | TN: 12 | Mod: +3 | Type: Exploding | For: Grak ]]";
    let items = parse(text);
    assert_eq!(items.len(), 1);
    let item = &items[0];
    assert_eq!(item.name, "Strike ⭐");
    assert!(item.starred);
    assert_eq!(item.for_whom, "Grak");
    assert_eq!(item.actor, Actor::NonUser);
    assert_eq!(item.raw, text.trim());
    match item.kind {
        DirectiveKind::Roll {
            die,
            tn,
            modifier,
            exploding,
            combat,
        } => {
            assert_eq!(die, DieSpec::new(2, 8));
            assert_eq!(tn, 12);
            assert_eq!(modifier, 3);
            assert!(exploding);
            assert!(!combat);
        }
        _ => panic!("expected a roll"),
    }
}

#[test]
fn roll_defaults() {
    let items = parse("[[roll| Name: Basic ]]");
    let item = &items[0];
    assert!(!item.starred);
    assert_eq!(item.for_whom, "User");
    assert_eq!(item.actor, Actor::User);
    match item.kind {
        DirectiveKind::Roll {
            die,
            tn,
            modifier,
            exploding,
            combat,
        } => {
            assert_eq!(die, DieSpec::D6);
            assert_eq!(tn, 0);
            assert_eq!(modifier, 0);
            assert!(!exploding);
            assert!(!combat);
        }
        _ => panic!("expected a roll"),
    }
}

#[test]
fn combat_type_forces_exploding() {
    let items = parse("[[ Roll | Name: Swing | Type: Combat ]]");
    match items[0].kind {
        DirectiveKind::Roll {
            exploding, combat, ..
        } => {
            assert!(combat);
            assert!(exploding);
        }
        _ => panic!("expected a roll"),
    }
}

#[test]
fn malformed_fields_fall_back_to_defaults() {
    let items = parse("[[ Roll | Name: X | TN: soon | Mod: lots | Die: banana ]]");
    match items[0].kind {
        DirectiveKind::Roll {
            die, tn, modifier, ..
        } => {
            assert_eq!(die, DieSpec::D6);
            assert_eq!(tn, 0);
            assert_eq!(modifier, 0);
        }
        _ => panic!("expected a roll"),
    }
}

#[test]
fn negative_modifier() {
    let items = parse("[[ Roll | Name: X | Mod: -2 ]]");
    match items[0].kind {
        DirectiveKind::Roll { modifier, .. } => assert_eq!(modifier, -2),
        _ => panic!("expected a roll"),
    }
}

#[test]
fn quickness_roll_defaults() {
    let items = parse("[[Quickness Roll | Name: Init ]]");
    match items[0].kind {
        DirectiveKind::QuicknessRoll {
            die,
            tn,
            modifier,
            exploding,
        } => {
            assert_eq!(die, DieSpec::new(1, 4));
            assert_eq!(tn, 5);
            assert_eq!(modifier, 0);
            assert!(exploding);
        }
        _ => panic!("expected a quickness roll"),
    }
}

#[test]
fn quickness_roll_picks_up_embedded_die_token() {
    let items = parse("[[Quickness Roll | Name: Init 1d10 ]]");
    match items[0].kind {
        DirectiveKind::QuicknessRoll { die, .. } => assert_eq!(die, DieSpec::new(1, 10)),
        _ => panic!("expected a quickness roll"),
    }
}

#[test]
fn hex_roll_defaults_and_plain_type() {
    let items = parse("[[Hex Roll | Name: Curse | Type: Plain ]]");
    match items[0].kind {
        DirectiveKind::HexRoll {
            die,
            tn,
            exploding,
            ..
        } => {
            assert_eq!(die, DieSpec::new(1, 8));
            assert_eq!(tn, 5);
            assert!(!exploding);
        }
        _ => panic!("expected a hex roll"),
    }
}

#[test]
fn deck_with_every_field() {
    let items =
        parse("[[ Deck | Name: Gamble | Hand Size: 7 | Trick: No | Min Hand/TN: Pair of Jacks | For: Vex ]]");
    let item = &items[0];
    assert_eq!(item.actor, Actor::NonUser);
    match &item.kind {
        DirectiveKind::Deck {
            hand_size,
            trick,
            min,
        } => {
            assert_eq!(*hand_size, 7);
            assert!(!trick);
            assert_eq!(min.as_deref(), Some("Pair of Jacks"));
        }
        _ => panic!("expected a deck"),
    }
}

#[test]
fn deck_defaults_and_trick_yes() {
    let items = parse("[[Deck | Name: T | Trick: yes ]]");
    match &items[0].kind {
        DirectiveKind::Deck {
            hand_size, trick, min,
        } => {
            assert_eq!(*hand_size, 5);
            assert!(trick);
            assert!(min.is_none());
        }
        _ => panic!("expected a deck"),
    }
}

#[test]
fn deck_rejects_zero_hand_size() {
    let items = parse("[[Deck | Name: Z | Hand Size: 0 ]]");
    match items[0].kind {
        DirectiveKind::Deck { hand_size, .. } => assert_eq!(hand_size, 5),
        _ => panic!("expected a deck"),
    }
}

#[test]
fn hex_draw_fields() {
    let items = parse("[[Hex Draw | Name: HD | Hand Size: 4 | Min: ace high ]]");
    match &items[0].kind {
        DirectiveKind::HexDraw { hand_size, min } => {
            assert_eq!(*hand_size, 4);
            assert_eq!(min.as_deref(), Some("ace high"));
        }
        _ => panic!("expected a hex draw"),
    }
}

#[test]
fn quickness_draw_carries_subject() {
    let items = parse("[[Quickness Draw | Name: Act | For: Bob ]]");
    let item = &items[0];
    assert!(matches!(item.kind, DirectiveKind::QuicknessDraw));
    assert_eq!(item.for_whom, "Bob");
    assert_eq!(item.actor, Actor::NonUser);
}

#[test]
fn actor_matches_user_case_insensitively() {
    let items = parse("[[Roll | Name: A | For: USER ]]");
    assert_eq!(items[0].actor, Actor::User);
}

#[test]
fn discovery_order_follows_the_text() {
    let text = "\
        [[Deck | Name: First ]] chatter \
        [[Roll | Name: Second ]] chatter \
        [[Quickness Roll | Name: Third ]] \
        [[Hex Draw | Name: Fourth ]]";
    let parsed = parse(text);
    let names: Vec<&str> = parsed.iter().map(|item| item.name.as_str()).collect();
    assert_eq!(names, ["First", "Second", "Third", "Fourth"]);
}

#[test]
fn keywords_are_case_insensitive() {
    assert_eq!(parse("[[DECK | name: x]]").len(), 1);
    assert_eq!(parse("[[QUICKNESS DRAW | name: x]]").len(), 1);
}

#[test]
fn plain_roll_does_not_match_quickness_roll() {
    let items = parse("[[Quickness Roll | Name: Q ]]");
    assert_eq!(items.len(), 1);
    assert!(matches!(items[0].kind, DirectiveKind::QuicknessRoll { .. }));
}

#[test]
fn text_without_directives_parses_empty() {
    assert!(parse("no brackets here [single] [[unclosed").is_empty());
}
