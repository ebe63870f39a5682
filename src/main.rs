/// Entry point and game loop.

use std::fs::OpenOptions;
use std::io;
use std::path::PathBuf;
use std::sync::Mutex;
use std::time::Instant;

use anyhow::{Context, Result};
use crossterm::event::{KeyboardEnhancementFlags, PopKeyboardEnhancementFlags, PushKeyboardEnhancementFlags};
use crossterm::{execute, terminal};
use tracing::{debug, error, info};
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::EnvFilter;

use rollsplat::config::GameConfig;
use rollsplat::sim::event::GameEvent;
use rollsplat::sim::game::{GameState, Phase};
use rollsplat::sim::level::{self, load_levels};
use rollsplat::sim::step::{self, FrameInput};
use rollsplat::ui::gamepad::GamepadState;
use rollsplat::ui::input::{InputState, BACK_KEYS, CONFIRM_KEYS, RESTART_KEYS};
use rollsplat::ui::renderer::Renderer;

const LOG_ENV_VAR: &str = "ROLLSPLAT_LOG";

fn main() {
    init_tracing();

    let config = GameConfig::load();
    let levels = load_levels(&config);
    info!(pack = %levels.info.name, levels = levels.levels.len(), "starting");

    let mut game = GameState::new(&config, levels);
    let mut renderer = Renderer::new(config.colors);

    if let Err(e) = renderer.init() {
        error!(error = %e, "terminal init failed");
        eprintln!("Terminal init failed: {e}");
        return;
    }
    let enhanced = enable_key_release();

    let result = game_loop(&mut game, &mut renderer, &config, enhanced);

    if enhanced {
        let _ = execute!(io::stdout(), PopKeyboardEnhancementFlags);
    }
    if let Err(e) = renderer.cleanup() {
        eprintln!("Terminal cleanup failed: {e}");
    }

    if let Err(e) = result {
        error!(error = %e, "game loop failed");
        eprintln!("Game error: {e:#}");
    }

    println!();
    println!("Thanks for playing Roll Splat!");
}

/// Log to a file: stdout belongs to the TUI.
fn init_tracing() {
    let path = std::env::var_os(LOG_ENV_VAR)
        .map(PathBuf::from)
        .unwrap_or_else(|| std::env::temp_dir().join("rollsplat.log"));
    let writer = match OpenOptions::new().create(true).append(true).open(&path) {
        Ok(file) => BoxMakeWriter::new(Mutex::new(file)),
        Err(_) => BoxMakeWriter::new(io::sink),
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_ansi(false)
        .with_target(false)
        .compact()
        .init();
}

/// Ask the terminal for key Release events so held keys are tracked exactly.
fn enable_key_release() -> bool {
    if !terminal::supports_keyboard_enhancement().unwrap_or(false) {
        return false;
    }
    execute!(
        io::stdout(),
        PushKeyboardEnhancementFlags(KeyboardEnhancementFlags::REPORT_EVENT_TYPES)
    )
    .is_ok()
}

fn game_loop(game: &mut GameState, renderer: &mut Renderer, config: &GameConfig, enhanced: bool) -> Result<()> {
    let mut kb = InputState::new();
    kb.honor_release = enhanced;
    let mut gp = GamepadState::new();
    gp.load_button_config(&config.gamepad);
    let mut last_frame = Instant::now();

    loop {
        kb.drain_events();
        gp.update();

        if kb.ctrl_c_pressed() {
            break;
        }
        if handle_meta(game, &kb, &gp) {
            break;
        }

        let now = Instant::now();
        let dt = now.duration_since(last_frame);
        last_frame = now;

        let input = FrameInput {
            movement: kb.direction().or_else(|| gp.direction()),
        };
        let events = step::step(game, input, dt);
        process_events(game, &events);

        renderer.render(game).context("rendering frame")?;

        let spent = last_frame.elapsed();
        if spent < config.frame {
            std::thread::sleep(config.frame - spent);
        }
    }

    Ok(())
}

/// Menu-level keys. Returns true when the player quits.
fn handle_meta(game: &mut GameState, kb: &InputState, gp: &GamepadState) -> bool {
    let confirm = kb.any_pressed(CONFIRM_KEYS) || gp.confirm_pressed();
    let back = kb.any_pressed(BACK_KEYS) || gp.cancel_pressed();
    let restart = kb.any_pressed(RESTART_KEYS) || gp.restart_pressed();

    match game.phase {
        Phase::Title => {
            if back {
                return true;
            }
            if confirm {
                level::load_level(game, 0);
            }
        }
        Phase::Playing => {
            if back {
                return_to_title(game);
            } else if restart {
                step::restart_level(game);
            }
        }
        Phase::LevelComplete => {
            if back {
                return_to_title(game);
            } else if confirm {
                step::next_level(game);
            } else if restart {
                step::restart_level(game);
            }
        }
        Phase::GameOver => {
            if back {
                return_to_title(game);
            } else if confirm || restart {
                step::restart_level(game);
            }
        }
        Phase::GameComplete => {
            if back || confirm {
                return_to_title(game);
            }
        }
    }
    false
}

fn return_to_title(game: &mut GameState) {
    game.phase = Phase::Title;
    game.anim_tick = 0;
    game.message.clear();
    game.message_timer = 0;
}

fn process_events(game: &mut GameState, events: &[GameEvent]) {
    for event in events {
        debug!(?event, "game_event");
        match event {
            GameEvent::ActorRecolored { color } => {
                game.set_message(&format!("Now painting {color}"), 45);
            }
            GameEvent::TeleportStarted { to, .. } => {
                game.set_message(&format!("Warping to {to}"), 30);
            }
            _ => {}
        }
    }
}
