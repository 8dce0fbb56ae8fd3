//! Headless scenario runner.
//!
//! Walks a scripted player through the demo courtyard with every engine
//! service replaced by a headless backend, then prints the gameplay
//! counters and tick timings.
//!
//! ```text
//! shade-sim [CONFIG.toml] [--seconds <N>] [--json]
//! ```

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use shade_core::collab::{Collaborators, Target};
use shade_core::spell::SpellKind;
use shade_core::types::Vec3;
use shade_core::ShadeConfig;
use shade_engine::components::WorldContent;
use shade_engine::headless::{
    OpenField, RecordingAudio, RecordingPresentation, RecordingScene, ScriptedTarget,
};
use shade_engine::hooks;
use shade_engine::session::GameSession;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Headless SHADE scenario runner
#[derive(Parser)]
#[command(name = "shade-sim")]
#[command(about = "Walk a scripted player past the demo guards", long_about = None)]
#[command(version)]
struct Cli {
    /// TOML config file (defaults are used when omitted)
    config: Option<PathBuf>,

    /// Simulated seconds to run
    #[arg(long, default_value_t = 60.0)]
    seconds: f32,

    /// Emit logs as JSON lines
    #[arg(long)]
    json: bool,
}

fn setup_logging(level: &str, json: bool) {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let registry = tracing_subscriber::registry().with(env_filter);
    if json {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

fn main() -> Result<()> {
    let args = Cli::parse();
    let config = match &args.config {
        Some(path) => ShadeConfig::from_file(path)
            .with_context(|| format!("loading config from {}", path.display()))?,
        None => ShadeConfig::default(),
    };
    setup_logging(&config.general.log_level, args.json);
    if args.config.is_none() {
        warn!("No config file given, using defaults");
    }

    run(config, args.seconds)
}

#[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn run(config: ShadeConfig, seconds: f32) -> Result<()> {
    let dt = 1.0 / config.sim.tick_rate.max(1) as f32;
    let steps = (seconds / dt).ceil() as u64;
    let content = WorldContent::demo();

    let start = Vec3::ZERO;
    let mut player = ScriptedTarget::new(
        start,
        vec![
            Vec3::new(0.0, 0.0, 5.0),
            Vec3::new(3.0, 0.0, 8.0),
            Vec3::new(0.0, 0.0, 18.0),
            Vec3::new(8.0, 0.0, 28.0),
            Vec3::new(0.0, 0.0, 35.0),
            Vec3::new(-15.0, 0.0, 45.0),
        ],
        3.0,
    );
    let mut field = OpenField::new(Vec3::new(-50.0, 0.0, -10.0), Vec3::new(50.0, 0.0, 60.0))
        .with_occluder(Vec3::new(5.0, 1.0, 25.0), 2.0)
        .with_occluder(Vec3::new(-8.0, 1.0, 38.0), 1.5);
    field.set_target(start);
    let mut scene = RecordingScene::default();
    let mut audio = RecordingAudio::default();
    let mut ui = RecordingPresentation::default();

    let mut session = GameSession::start(config, &content);
    session.ledger_mut().set_location(start);
    session.ledger_mut().save_game();

    macro_rules! collab {
        () => {
            Collaborators {
                scene: &mut scene,
                audio: &mut audio,
                target: &player,
                space: &field,
                presentation: &mut ui,
            }
        };
    }

    session.load_room(&mut scene);
    info!(steps, dt, "Running scenario");

    for step in 0..steps {
        player.advance(dt, session.world().player_speed_multiplier());
        field.set_target(player.position());

        for point in &content.save_points {
            if player.position().distance(point.transform.location) < 1.0 {
                session.handle_event(hooks::on_save_point_entered(point.index), &mut collab!())?;
            }
        }

        let gold = session.ledger().player_gold();
        if !session.ledger().is_spell_purchased(SpellKind::Invisibility) && gold >= 10 {
            session.handle_event(hooks::on_spell_purchase(SpellKind::Invisibility), &mut collab!())?;
        }
        let pressed = session.world().guards().iter().any(|g| g.detection_fraction() > 0.5);
        if pressed && !session.world().spell(SpellKind::Invisibility).is_active() {
            session.handle_event(hooks::on_spell_key(SpellKind::Invisibility), &mut collab!())?;
        }

        let report = session.tick(dt, &mut collab!());
        session.update_interaction(dt, true, &mut collab!());

        if report.restored {
            let respawn = session.ledger().location();
            player.place(respawn, Vec3::FORWARD);
            field.set_target(respawn);
            info!(step, at = %respawn, "Player respawned");
        }
        if player.finished() {
            info!(step, "Route finished");
            break;
        }
    }

    let world = session.world();
    let counters = world.counters().snapshot();
    let timings = world.monitor().timings();
    println!("{}", counters.to_prometheus());
    println!("{}", timings.summary());

    let ledger = session.return_to_main_menu();
    println!(
        "gold={} saves_reached={} alignment={}",
        ledger.player_gold(),
        ledger.next_save(),
        ledger.morality_alignment()
    );
    println!("cues played: {}", audio.cues.len());
    Ok(())
}
