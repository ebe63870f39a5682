/// GameState: everything the frame loop owns between frames.
///
/// The level session holds the rules; this wraps it with the level list,
/// the app phase and HUD message timers.

use crate::config::GameConfig;
use crate::domain::grid::LevelData;
use super::level::{LevelSet, PackInfo};
use super::session::LevelSession;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Phase {
    Title,
    Playing,
    LevelComplete,
    GameOver,
    GameComplete,
}

pub struct GameState {
    pub session: LevelSession,
    pub levels: Vec<LevelData>,
    pub pack: PackInfo,
    pub current_level: usize,
    pub phase: Phase,

    // ── UI ──
    pub message: String,
    /// Frames left before `message` clears.
    pub message_timer: u32,

    /// Frames since the phase last changed; drives blinking prompts.
    pub anim_tick: u32,
}

impl GameState {
    pub fn new(config: &GameConfig, levels: LevelSet) -> Self {
        GameState {
            session: LevelSession::new(config.timing, config.colors.actor),
            levels: levels.levels,
            pack: levels.info,
            current_level: 0,
            phase: Phase::Title,
            message: String::new(),
            message_timer: 0,
            anim_tick: 0,
        }
    }

    pub fn set_message(&mut self, msg: &str, duration: u32) {
        self.message = msg.to_string();
        self.message_timer = duration;
    }

    pub fn level_name(&self) -> &str {
        self.session.grid().map_or("", |g| g.name())
    }

    pub fn is_last_level(&self) -> bool {
        self.current_level + 1 >= self.levels.len()
    }
}
