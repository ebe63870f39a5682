/// Events emitted by the level session.
/// The presentation layer consumes these for HUD messages, logging and
/// redraw decisions; the session never calls into presentation itself.

use crate::domain::color::Color;
use crate::domain::direction::{Coord, Direction};

#[derive(Clone, Debug, PartialEq)]
pub enum GameEvent {
    LevelLoaded { name: String, moves: u32 },
    MoveStarted { direction: Direction, cells: usize },
    ActorMoved { at: Coord, facing: Direction },
    TilePainted { at: Coord, color: Color },
    ActorRecolored { color: Color },
    /// The roll hit a wall; the brake window starts.
    ActorBraking { at: Coord },
    /// A roll was cut short (teleport engagement, level complete, external stop).
    ActorStopped { at: Coord },
    TeleportStarted { from: Coord, to: Coord },
    ActorTeleported { from: Coord, to: Coord },
    /// The actor is idle again and accepts commands.
    ActorSettled { at: Coord },
    MovesChanged { left: u32, total: u32 },
    LevelComplete,
    GameOver,
}
