/// The step function: advances the game by one frame.
///
/// Processing order:
///   1. HUD timers
///   2. Move submission (at most one per frame)
///   3. Session time advance (roll, brake, teleport)
///   4. Event drain → phase transitions
///
/// Only `Phase::Playing` feeds the session. Title and end screens are
/// driven by `main` through `restart_level` / `next_level`.

use std::time::Duration;

use tracing::debug;

use crate::domain::direction::Direction;
use super::event::GameEvent;
use super::game::{GameState, Phase};
use super::level;
use super::session::MoveOutcome;

/// Gameplay input for one frame.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FrameInput {
    pub movement: Option<Direction>,
}

// ══════════════════════════════════════════════════════════════
// Main entry point
// ══════════════════════════════════════════════════════════════

pub fn step(game: &mut GameState, input: FrameInput, dt: Duration) -> Vec<GameEvent> {
    game.anim_tick = game.anim_tick.wrapping_add(1);
    if game.message_timer > 0 {
        game.message_timer -= 1;
        if game.message_timer == 0 { game.message.clear(); }
    }

    if game.phase != Phase::Playing { return vec![]; }

    if let Some(dir) = input.movement {
        if let MoveOutcome::Rejected(reason) = game.session.submit_move(dir) {
            debug!(?dir, ?reason, "input ignored");
        }
    }
    game.session.advance(dt);

    let events = game.session.take_events();
    resolve_phase(game, &events);
    events
}

// ══════════════════════════════════════════════════════════════
// Phase transitions
// ══════════════════════════════════════════════════════════════

fn resolve_phase(game: &mut GameState, events: &[GameEvent]) {
    for event in events {
        match event {
            GameEvent::LevelComplete => {
                game.phase = Phase::LevelComplete;
                game.anim_tick = 0;
                let left = game.session.moves_left();
                game.set_message(&format!("Level {} clear! {} moves to spare", game.current_level + 1, left), 90);
            }
            GameEvent::GameOver => {
                game.phase = Phase::GameOver;
                game.anim_tick = 0;
                game.set_message("Out of moves", 90);
            }
            _ => {}
        }
    }
}

// ══════════════════════════════════════════════════════════════
// Level flow
// ══════════════════════════════════════════════════════════════

/// Replay the current level from scratch.
pub fn restart_level(game: &mut GameState) {
    if game.session.restart() {
        game.phase = Phase::Playing;
        game.anim_tick = 0;
        game.set_message("Retry", 30);
    } else {
        let current = game.current_level;
        level::load_level(game, current);
    }
}

/// Move on after a cleared level; past the last one the game is complete.
pub fn next_level(game: &mut GameState) {
    let next = game.current_level + 1;
    level::load_level(game, next);
}
