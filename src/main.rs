/// Entry point and game loop.

mod config;
mod domain;
mod sim;
mod ui;

use std::fs::File;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use crossterm::event::KeyCode;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use config::GameConfig;
use domain::rules::MoveDir;
use sim::event::{dispatch, PlayerEvent};
use sim::step;
use sim::world::{Phase, WorldState};
use ui::hud::Hud;
use ui::input::InputState;
use ui::renderer::Renderer;
use ui::sound::SoundEngine;

const FRAME_SLEEP: Duration = Duration::from_millis(5);

/// Environment variable naming the log file. The terminal belongs to the
/// renderer, so logs never go to stdout.
const LOG_ENV_VAR: &str = "HOPPER_LOG";
const DEFAULT_LOG_FILE: &str = "hopper.log";

const KEYS_CONFIRM: &[KeyCode] = &[KeyCode::Enter, KeyCode::Char(' ')];
const KEYS_PAUSE: &[KeyCode] = &[KeyCode::Char('p'), KeyCode::F(1)];

fn main() -> Result<()> {
    init_tracing()?;

    let config = GameConfig::load();
    let mut world = WorldState::new(&config).context("invalid board configuration")?;
    info!(
        rows = world.board.lanes.total_rows(),
        width = world.board.width,
        "board ready"
    );

    let sound = SoundEngine::new();
    if sound.is_none() {
        warn!("no audio output; cues are muted");
    }
    let mut hud = Hud::new(world.player.total_lives(), sound);

    let mut renderer = Renderer::new();
    renderer.init().context("terminal init failed")?;

    let result = game_loop(&mut world, &mut hud, &mut renderer, &config);

    if let Err(e) = renderer.cleanup() {
        warn!(error = %e, "terminal cleanup failed");
    }
    result?;

    println!();
    println!("Thanks for playing Hopper!");
    println!("Final Score: {}", hud.score);
    Ok(())
}

fn init_tracing() -> Result<()> {
    let path = std::env::var(LOG_ENV_VAR).unwrap_or_else(|_| DEFAULT_LOG_FILE.to_string());
    let file = File::create(&path).with_context(|| format!("cannot open log file {path}"))?;
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_target(false)
        .compact()
        .init();
    Ok(())
}

fn game_loop(
    world: &mut WorldState,
    hud: &mut Hud,
    renderer: &mut Renderer,
    config: &GameConfig,
) -> Result<()> {
    let mut kb = InputState::new();
    let tick_rate = Duration::from_millis(config.tick_rate_ms);
    let dt = tick_rate.as_secs_f32();
    let mut last_tick = Instant::now();

    // A press between ticks is held for the next tick.
    let mut pending_move: Option<MoveDir> = None;

    loop {
        kb.drain_events();

        if kb.ctrl_c_pressed() {
            break;
        }
        if handle_meta(world, hud, &kb) {
            break;
        }

        if world.phase == Phase::Playing && !world.paused {
            if let Some(dir) = kb.move_command() {
                pending_move = Some(dir);
            }
        }

        if last_tick.elapsed() >= tick_rate {
            let events = step::step(world, pending_move.take(), dt);
            dispatch(&events, world, hud);
            last_tick = Instant::now();
        }

        renderer.render(world, hud).context("render failed")?;
        std::thread::sleep(FRAME_SLEEP);
    }

    Ok(())
}

// ══════════════════════════════════════════════════════════════
// Meta input: phase changes, pause, quit
// ══════════════════════════════════════════════════════════════

/// Returns true when the player asked to quit.
fn handle_meta(world: &mut WorldState, hud: &mut Hud, kb: &InputState) -> bool {
    let confirm = kb.any_pressed(KEYS_CONFIRM);
    let esc = kb.any_pressed(&[KeyCode::Esc]);

    match world.phase {
        Phase::Title => {
            if confirm {
                start_run(world, hud);
            } else if esc || kb.any_pressed(&[KeyCode::Char('q')]) {
                return true;
            }
        }
        Phase::Playing => {
            if kb.any_pressed(KEYS_PAUSE) {
                world.paused = !world.paused;
                info!(paused = world.paused, "pause toggled");
            } else if esc {
                return_to_title(world);
            }
        }
        Phase::Victory | Phase::GameOver => {
            if confirm {
                start_run(world, hud);
            } else if esc {
                return_to_title(world);
            }
        }
    }
    false
}

fn start_run(world: &mut WorldState, hud: &mut Hud) {
    let mut events: Vec<PlayerEvent> = Vec::new();
    world.start_run(&mut events);
    dispatch(&events, world, hud);
    info!("run started");
}

fn return_to_title(world: &mut WorldState) {
    info!(score = world.player.score, "back to title");
    world.player.active = false;
    world.paused = false;
    world.phase = Phase::Title;
    world.message.clear();
    world.message_timer = 0;
}
