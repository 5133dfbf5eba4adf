//! GGP Player demo
//!
//! Plays one local match between two gamers with a referee engine standing in
//! for the game manager. Halfway through, the first gamer switches to a cached
//! engine; at the end both gamers' states are checked against the referee.

use std::time::{Duration, Instant};
use anyhow::{bail, Context};
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use ggp_player::{
    core::short_hex,
    machine::{decode_joint_move, LedgerMachine, MachineKind},
    GamerConfig, GamerStrategy, LegalStrategy, Match, RandomStrategy, RuleSet, Sentence,
    StateMachine, StateMachineGamer, VERSION,
};

/// Two-player demo game.
const DEMO_RULES: &str = r#"[
    {"role": {"name": "white"}},
    {"role": {"name": "black"}},
    {"init": {"fact": "(board empty)"}},
    {"legal": {"role": "white", "action": "(mark 1 1)"}},
    {"legal": {"role": "white", "action": "(mark 1 2)"}},
    {"legal": {"role": "white", "action": "noop"}},
    {"legal": {"role": "black", "action": "(mark 2 1)"}},
    {"legal": {"role": "black", "action": "(mark 2 2)"}},
    {"legal": {"role": "black", "action": "noop"}},
    {"step_limit": {"steps": 10}}
]"#;

/// Turn at which white switches engines.
const SWITCH_TURN: usize = 5;

fn main() -> anyhow::Result<()> {
    let config = GamerConfig::from_env();

    // Initialize logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.log_level));
    let subscriber = FmtSubscriber::builder().with_env_filter(filter).finish();
    tracing::subscriber::set_global_default(subscriber)
        .expect("Failed to set tracing subscriber");

    info!("GGP Player v{}", VERSION);
    info!("Engine: {}, seed: {}", config.machine, config.seed);

    demo_match(&config)
}

/// Run the demo match.
fn demo_match(config: &GamerConfig) -> anyhow::Result<()> {
    info!("=== Starting Demo Match ===");

    let rules = RuleSet::from_json(DEMO_RULES).context("parsing demo rules")?;
    let game_match = Match::new("demo", rules.clone(), Duration::from_secs(10), Duration::from_secs(5));

    let mut referee = LedgerMachine::new();
    referee.initialize(&rules)?;
    let mut state = referee.initial_state()?;

    let mut white = StateMachineGamer::new(LegalStrategy::new(GamerConfig {
        name: "White".to_string(),
        ..config.clone()
    }));
    white.set_match(game_match.clone());
    white.set_role_name("white");

    let mut black = StateMachineGamer::new(RandomStrategy::new(GamerConfig {
        name: "Black".to_string(),
        ..config.clone()
    }));
    black.set_match(game_match.clone());
    black.set_role_name("black");

    let start_deadline = Instant::now() + game_match.start_clock;
    white.meta_game(start_deadline)?;
    black.meta_game(start_deadline)?;

    let mut turn = 0;
    while !referee.is_terminal(&state)? {
        let deadline = Instant::now() + game_match.play_clock;
        let white_move = white.select_move(deadline)?;
        if turn == SWITCH_TURN {
            // white has just advanced, so its state matches the recorded history
            let mut cached = MachineKind::Cached.build(config.cache_capacity);
            cached.initialize(&rules)?;
            white.switch_state_machine(cached);
            info!(
                "{} now on {}",
                white.name(),
                white.state_machine().map(|m| m.name()).unwrap_or("no engine")
            );
        }
        let joint: Vec<Sentence> = vec![white_move, black.select_move(deadline)?];

        let moves = decode_joint_move(&referee, &joint)?;
        state = referee.next_state(&state, &moves)?;
        info!(
            "Turn {}: {} -> {}",
            turn,
            joint.iter().map(Sentence::as_str).collect::<Vec<_>>().join(" "),
            short_hex(&state.fingerprint())
        );

        record_moves(&mut white, &joint)?;
        record_moves(&mut black, &joint)?;
        turn += 1;
    }

    // Apply the final joint move
    white.stop()?;
    black.stop()?;

    info!("=== Match Results ===");
    let expected = state.fingerprint();
    info!("Referee State Hash: {}", hex::encode(expected));

    let mut in_sync = true;
    for (name, current) in [
        (white.name().to_string(), white.current_state()),
        (black.name().to_string(), black.current_state()),
    ] {
        let Some(current) = current else {
            bail!("{} has no current state", name);
        };
        let hash = current.fingerprint();
        info!("{} State Hash: {}", name, hex::encode(hash));
        if hash != expected {
            warn!("{} diverged from the referee", name);
            in_sync = false;
        }
    }

    if in_sync {
        info!("SYNC VERIFIED: all states match the referee after {} turns", turn);
    } else {
        bail!("gamer state diverged from the referee");
    }

    white.cleanup_after_match();
    black.cleanup_after_match();
    Ok(())
}

/// Hand a completed turn to a gamer's match record.
fn record_moves<S: GamerStrategy>(
    gamer: &mut StateMachineGamer<S>,
    joint: &[Sentence],
) -> anyhow::Result<()> {
    let name = gamer.name().to_string();
    match gamer.game_match_mut() {
        Some(game_match) => {
            game_match.append_moves(joint.to_vec());
            Ok(())
        }
        None => bail!("{} has no match attached", name),
    }
}
