use anyhow::{bail, Context, Result};
use macrodeck_core::{
    Directive, DirectiveKind, Event, EventBus, ResolveError, RngState, SavedRolls, Session,
    REVEAL_WINDOW,
};
use std::fs;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::thread;

#[derive(Debug, Clone)]
struct CliOptions {
    file: Option<PathBuf>,
    seed: Option<u64>,
    store: Option<PathBuf>,
    events: bool,
}

fn parse_args() -> Result<CliOptions> {
    let mut options = CliOptions {
        file: None,
        seed: None,
        store: None,
        events: false,
    };
    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--seed" => {
                let value = args.next().context("--seed needs a value")?;
                options.seed = Some(value.parse().context("--seed needs an integer")?);
            }
            "--store" => {
                let value = args.next().context("--store needs a path")?;
                options.store = Some(PathBuf::from(value));
            }
            "--events" => options.events = true,
            "--help" | "-h" => {
                print_help();
                std::process::exit(0);
            }
            other if other.starts_with('-') => bail!("unknown option: {other}"),
            other => options.file = Some(PathBuf::from(other)),
        }
    }
    Ok(options)
}

fn default_store_path() -> Option<PathBuf> {
    if let Some(path) = std::env::var_os("MACRODECK_SAVE") {
        return Some(PathBuf::from(path));
    }
    std::env::var_os("HOME").map(|home| PathBuf::from(home).join(".macrodeck_saved.json"))
}

fn main() -> Result<()> {
    let options = parse_args()?;
    let rng = match options.seed {
        Some(seed) => RngState::from_seed(seed),
        None => RngState::from_entropy(),
    };
    let mut session = Session::new(rng);
    let mut events = EventBus::default();
    let mut pad: Vec<String> = Vec::new();

    if let Some(path) = &options.file {
        let count = rescan_file(&mut session, path, &mut events)?;
        println!("Scanned {}: {count} directive(s).", path.display());
    } else {
        println!("No scan file given; use `rescan <file>` to load one.");
    }
    flush_events(&mut events, options.events);
    print_current(&session);

    let stdin = io::stdin();
    loop {
        print!("> ");
        io::stdout().flush()?;
        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }
        let parts: Vec<&str> = line.split_whitespace().collect();
        let Some(&command) = parts.first() else {
            continue;
        };
        match command {
            "quit" | "exit" | "q" => break,
            "help" | "?" => print_help(),
            "ls" => list_directives(&session),
            "info" => print_current(&session),
            "sel" => {
                let result = parts
                    .get(1)
                    .and_then(|raw| raw.parse::<usize>().ok())
                    .and_then(|n| n.checked_sub(1))
                    .map(|idx| session.select(idx, &mut events))
                    .unwrap_or(Err(ResolveError::InvalidIndex));
                report(result.map(|_| String::new()));
                print_current(&session);
            }
            "older" | "prev" => {
                report(session.select_older(&mut events).map(|_| String::new()));
                print_current(&session);
            }
            "newer" | "next" => {
                report(session.select_newer(&mut events).map(|_| String::new()));
                print_current(&session);
            }
            "roll" => match session.begin_roll(&mut events) {
                Ok(preview) => {
                    println!("Rolling… {:?}", preview);
                    thread::sleep(REVEAL_WINDOW);
                    report(session.complete_roll(&mut events));
                }
                Err(err) => println!("{err}"),
            },
            "explode" | "x" => report(session.explode(&mut events)),
            "draw" | "d" => {
                report(session.draw(&mut events));
                print_drawn(&session);
            }
            "pick" => {
                for raw in &parts[1..] {
                    let result = raw
                        .parse::<usize>()
                        .ok()
                        .and_then(|n| n.checked_sub(1))
                        .map(|idx| session.toggle_card(idx))
                        .unwrap_or(Err(ResolveError::InvalidCard));
                    report(result);
                }
                print_drawn(&session);
            }
            "play" | "p" => report(session.play(&mut events)),
            "auto" | "a" => report(session.auto_play(&mut events)),
            "take" => report(session.toggle_override()),
            "shuffle" => report(session.shuffle_deck(&mut events)),
            "saved" => print_saved(&session),
            "unsave" => match (parts.get(1), parts.get(2)) {
                (Some(&"q"), Some(subject)) => {
                    let deleted = session.delete_quickness(subject, &mut events);
                    println!("{}", if deleted { "Deleted." } else { "(no entry)" });
                }
                (Some(&"h"), Some(subject)) => {
                    let deleted = session.delete_hex(subject, &mut events);
                    println!("{}", if deleted { "Deleted." } else { "(no entry)" });
                }
                _ => println!("usage: unsave q|h <subject>"),
            },
            "copy" => match session.last_summary() {
                Some(summary) => println!("{summary}"),
                None => println!("(nothing resolved yet)"),
            },
            "pad" => match parts.get(1).copied() {
                Some("add") => match session.last_summary() {
                    Some(summary) => {
                        pad.push(summary.to_string());
                        println!("Added.");
                    }
                    None => println!("(nothing resolved yet)"),
                },
                Some("clear") => {
                    pad.clear();
                    println!("Cleared.");
                }
                Some("all") => {
                    if pad.is_empty() {
                        println!("(empty)");
                    } else {
                        println!("{}", pad.join("\n"));
                    }
                }
                _ => {
                    if pad.is_empty() {
                        println!("(empty)");
                    } else {
                        for (idx, entry) in pad.iter().enumerate() {
                            println!("{}. {entry}", idx + 1);
                        }
                    }
                }
            },
            "rescan" => {
                let path = parts
                    .get(1)
                    .map(|p| PathBuf::from(*p))
                    .or_else(|| options.file.clone());
                match path {
                    Some(path) => match rescan_file(&mut session, &path, &mut events) {
                        Ok(count) => {
                            println!("Scanned {}: {count} directive(s).", path.display());
                            print_current(&session);
                        }
                        Err(err) => println!("{err:#}"),
                    },
                    None => println!("usage: rescan <file>"),
                }
            }
            "save" => {
                let path = parts
                    .get(1)
                    .map(|p| PathBuf::from(*p))
                    .or_else(|| options.store.clone())
                    .or_else(default_store_path);
                match path {
                    Some(path) => match save_store(&session.store, &path) {
                        Ok(()) => println!("Saved rolls written to {}.", path.display()),
                        Err(err) => println!("{err:#}"),
                    },
                    None => println!("No store path available."),
                }
            }
            "load" => {
                let path = parts
                    .get(1)
                    .map(|p| PathBuf::from(*p))
                    .or_else(|| options.store.clone())
                    .or_else(default_store_path);
                match path {
                    Some(path) => match load_store(&path) {
                        Ok(store) => {
                            session.store = store;
                            println!("Saved rolls loaded from {}.", path.display());
                        }
                        Err(err) => println!("{err:#}"),
                    },
                    None => println!("No store path available."),
                }
            }
            "seed" => println!("Seed: {}", session.rng.seed()),
            other => println!("Unknown command: {other} (try `help`)"),
        }
        flush_events(&mut events, options.events);
    }
    Ok(())
}

fn rescan_file(session: &mut Session, path: &Path, events: &mut EventBus) -> Result<usize> {
    let text = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    Ok(session.rescan(&text, events))
}

fn save_store(store: &SavedRolls, path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(store)?;
    fs::write(path, json).with_context(|| format!("write {}", path.display()))?;
    Ok(())
}

fn load_store(path: &Path) -> Result<SavedRolls> {
    let raw = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let store = serde_json::from_str(&raw).with_context(|| format!("parse {}", path.display()))?;
    Ok(store)
}

fn report(result: Result<String, ResolveError>) {
    match result {
        Ok(label) if label.is_empty() => {}
        Ok(label) => println!("{label}"),
        Err(err) => println!("{err}"),
    }
}

fn flush_events(events: &mut EventBus, show: bool) {
    for event in events.drain() {
        if show {
            println!("  · {}", event_line(&event));
        }
    }
}

fn event_line(event: &Event) -> String {
    match event {
        Event::Rescanned { directives } => format!("rescanned: {directives} directive(s)"),
        Event::DirectiveSelected { index } => format!("selected #{}", index + 1),
        Event::RollStarted { dice } => format!("rolling {dice} dice"),
        Event::RollCommitted { rolls, highest } => {
            format!("roll committed {rolls:?}, highest {highest}")
        }
        Event::ChainExtended { roll, chain_sum } => {
            format!("chain +{roll} = {chain_sum}")
        }
        Event::HitAssigned { location } => format!("hit location: {location}"),
        Event::QuicknessSaved { subject, cards } => {
            format!("quickness saved for {subject}: {cards} card(s)")
        }
        Event::HexSaved { subject, success } => {
            format!(
                "hex saved for {subject}: {}",
                if *success { "success" } else { "fail" }
            )
        }
        Event::DeckReshuffled { auto } => {
            format!("deck reshuffled{}", if *auto { " (auto)" } else { "" })
        }
        Event::CardsDrawn { count } => format!("{count} card(s) drawn"),
        Event::TrickResolved { success } => {
            format!("trick {}", if *success { "succeeded" } else { "failed" })
        }
        Event::HandPlayed { hand, passed } => {
            format!("played {hand} ({})", if *passed { "pass" } else { "fail" })
        }
        Event::SavedDeleted { subject } => format!("deleted saved roll for {subject}"),
    }
}

fn list_directives(session: &Session) {
    if session.items().is_empty() {
        println!("No directives found. Waiting for [[...]] text.");
        return;
    }
    for (idx, item) in session.items().iter().enumerate() {
        let marker = if session.current_index() == Some(idx) {
            ">"
        } else {
            " "
        };
        println!(
            "{marker} {}. {} {} (For {})",
            idx + 1,
            item.kind_label(),
            item.name,
            item.for_whom
        );
    }
}

fn print_current(session: &Session) {
    let Some(item) = session.current_directive() else {
        println!("No directive selected.");
        return;
    };
    let total = session.items().len();
    let index = session.current_index().unwrap_or(0);
    println!("{}", item.name);
    println!("{}", meta_line(item, index, total));
}

fn meta_line(item: &Directive, index: usize, total: usize) -> String {
    let pos = format!("{}/{total}", index + 1);
    match &item.kind {
        DirectiveKind::Deck { min, .. } => format!(
            "Min: {} • For: {} • {pos}",
            min.as_deref().unwrap_or("—"),
            item.for_whom
        ),
        DirectiveKind::Roll {
            die,
            tn,
            modifier,
            exploding,
            combat,
        } => {
            let mut flags = Vec::new();
            if *exploding {
                flags.push("Exploding");
            }
            if *combat {
                flags.push("Combat");
            }
            let flags = if flags.is_empty() {
                String::new()
            } else {
                format!(" ({})", flags.join(", "))
            };
            format!(
                "Die: {die}{flags} • TN: {tn} Mod: {} • {pos}",
                signed(*modifier)
            )
        }
        DirectiveKind::QuicknessRoll {
            die,
            tn,
            modifier,
            exploding,
        } => format!(
            "Quickness Roll — Die: {die}{} • TN: {tn} Mod: {} • {pos}",
            if *exploding { " Exploding" } else { "" },
            signed(*modifier)
        ),
        DirectiveKind::QuicknessDraw => {
            format!("Quickness Draw • For: {} • {pos}", item.for_whom)
        }
        DirectiveKind::HexRoll {
            die,
            tn,
            modifier,
            exploding,
        } => format!(
            "Hex Roll — Die: {die}{} • TN: {tn} Mod: {} • {pos}",
            if *exploding { " Exploding" } else { "" },
            signed(*modifier)
        ),
        DirectiveKind::HexDraw { min, .. } => format!(
            "Hex Draw • Min: {} • For: {} • {pos}",
            min.as_deref().unwrap_or("—"),
            item.for_whom
        ),
    }
}

fn print_drawn(session: &Session) {
    let Some(state) = session.deck_working() else {
        return;
    };
    if state.drawn.is_empty() {
        return;
    }
    for (idx, card) in state.drawn.iter().enumerate() {
        let marker = if state.selected.contains(&idx) { "*" } else { " " };
        print!(" {marker}{}. {card} ", idx + 1);
    }
    println!();
    println!(
        "Deck: {} cards remaining (54 with Jokers)",
        state.deck.remaining()
    );
}

fn print_saved(session: &Session) {
    println!("Quickness Saved");
    let quickness = session.store.quickness_entries();
    if quickness.is_empty() {
        println!("  (none)");
    }
    for entry in quickness {
        println!(
            "  {} — Cards: {} • Die: {} • TN: {} • Mod: {} • Raises: {} • Chain: {:?}",
            entry.subject,
            entry.cards,
            entry.die,
            entry.tn,
            signed(entry.modifier),
            entry.raises,
            entry.chain
        );
    }
    println!("Hex Saved");
    let hex = session.store.hex_entries();
    if hex.is_empty() {
        println!("  (none)");
    }
    for entry in hex {
        println!(
            "  {}{} — Raises: {} • Die: {} • TN: {} • Mod: {} • Chain: {:?}",
            entry.subject,
            if entry.success { "" } else { " (fail)" },
            entry.raises,
            entry.die,
            entry.tn,
            signed(entry.modifier),
            entry.chain
        );
    }
}

fn signed(n: i32) -> String {
    if n >= 0 {
        format!("+{n}")
    } else {
        n.to_string()
    }
}

fn print_help() {
    println!("macrodeck [file] [--seed N] [--store PATH] [--events]");
    println!();
    println!("  ls                 list scanned directives (newest first)");
    println!("  sel <n>            switch the current directive");
    println!("  older / newer      step through the list");
    println!("  info               show the current directive");
    println!("  roll               roll the dice (reveals after the animation window)");
    println!("  explode            roll one more die while the chain is at max");
    println!("  draw               draw this turn's cards");
    println!("  pick <n...>        toggle drawn cards in the selection (max 5)");
    println!("  play               play the selection / resolve the trick");
    println!("  auto               auto-play the best 5-card hand");
    println!("  take               toggle manual control of a non-user actor");
    println!("  shuffle            replace the deck with a fresh shuffled 54");
    println!("  saved              list saved quickness/hex rolls");
    println!("  unsave q|h <name>  delete a saved roll");
    println!("  copy               print the latest result summary");
    println!("  pad [add|all|clear]  manage the copy pad");
    println!("  rescan [file]      re-read the scan file");
    println!("  save / load [path] persist the saved-roll store as JSON");
    println!("  seed               show the RNG seed");
    println!("  quit               exit");
}
