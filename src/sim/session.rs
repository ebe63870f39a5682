/// Level session: one playthrough of one level.
///
/// Owns the validated grid, the tile paint layer, the actor and the move
/// budget, and is the only thing that mutates them. Every observable change
/// is recorded as a `GameEvent`; callers drain them with `take_events()`.
///
/// ## Move lifecycle
///
///   1. `submit_move` checks the guards (loaded, not complete, not over,
///      actor idle, budget left) and resolves the path.
///   2. An empty path is rejected. Nothing changes and no budget is spent.
///   3. Otherwise the roll begins: budget −1, the starting cell is painted.
///   4. `advance(dt)` moves the actor cell by cell. Each Ground cell entered
///      is painted (after any painter-tile recolor); a Teleport cell stops
///      the roll and starts the teleport.
///   5. Completion is checked after every paint. Exhaustion (budget 0, not
///      complete) is checked whenever the actor settles to Idle.
///
/// Rejections are plain values, never errors. Only `load_level` can fail.

use std::time::Duration;

use tracing::{debug, error, info, warn};

use crate::domain::actor::{Actor, ActorStep, Timing};
use crate::domain::cell::Cell;
use crate::domain::color::Color;
use crate::domain::direction::{Coord, Direction};
use crate::domain::grid::{Grid, LevelData, LevelError};
use crate::domain::resolver;
use crate::domain::tiles::TileBoard;
use super::event::GameEvent;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Rejection {
    NoLevel,
    Busy,
    OutOfMoves,
    LevelComplete,
    GameOver,
    Blocked,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum MoveOutcome {
    Accepted { cells: usize },
    Rejected(Rejection),
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Status {
    NotLoaded,
    Playing,
    Complete,
    GameOver,
}

#[derive(Clone, Debug)]
pub struct LevelSession {
    timing: Timing,
    actor_color: Color,
    play: Option<Play>,
    events: Vec<GameEvent>,
}

/// Mutable state of the level currently loaded.
#[derive(Clone, Debug)]
struct Play {
    grid: Grid,
    tiles: TileBoard,
    actor: Actor,
    moves_left: u32,
    complete: bool,
    game_over: bool,
}

// ══════════════════════════════════════════════════════════════
// Public API
// ══════════════════════════════════════════════════════════════

impl LevelSession {
    pub fn new(timing: Timing, actor_color: Color) -> Self {
        LevelSession {
            timing,
            actor_color,
            play: None,
            events: Vec::new(),
        }
    }

    /// Validate `data` and start it from scratch. On failure the session is
    /// left without a playable level.
    pub fn load_level(&mut self, data: &LevelData) -> Result<(), LevelError> {
        self.events.clear();
        match Grid::new(data) {
            Ok(grid) => {
                self.begin(grid);
                Ok(())
            }
            Err(e) => {
                warn!(level = %data.name, error = %e, "level_rejected");
                self.play = None;
                Err(e)
            }
        }
    }

    /// Replay the current level from its initial state.
    pub fn restart(&mut self) -> bool {
        match self.play.take() {
            Some(play) => {
                self.events.clear();
                self.begin(play.grid);
                true
            }
            None => false,
        }
    }

    pub fn submit_move(&mut self, direction: Direction) -> MoveOutcome {
        let Some(play) = self.play.as_mut() else {
            return MoveOutcome::Rejected(Rejection::NoLevel);
        };

        let rejection = if play.complete {
            Some(Rejection::LevelComplete)
        } else if play.game_over {
            Some(Rejection::GameOver)
        } else if !play.actor.is_idle() {
            Some(Rejection::Busy)
        } else if play.moves_left == 0 {
            Some(Rejection::OutOfMoves)
        } else {
            None
        };
        if let Some(r) = rejection {
            debug!(?direction, reason = ?r, "move_rejected");
            return MoveOutcome::Rejected(r);
        }

        let resolution = resolver::resolve(&play.grid, play.actor.at, direction);
        let cells = resolution.distance();
        let from = play.actor.at;
        if !play.actor.begin_roll(direction, resolution.path, &self.timing) {
            debug!(?direction, at = %from, "move_rejected_blocked");
            return MoveOutcome::Rejected(Rejection::Blocked);
        }

        play.moves_left = play.moves_left.saturating_sub(1);
        debug!(?direction, cells, outcome = ?resolution.outcome, moves_left = play.moves_left, "move_started");
        self.events.push(GameEvent::MoveStarted { direction, cells });
        self.events.push(GameEvent::MovesChanged {
            left: play.moves_left,
            total: play.grid.moves(),
        });
        if play.grid.cell_at(from).map_or(false, Cell::is_ground) {
            play.paint(from, &mut self.events);
        }

        self.advance(Duration::ZERO);
        MoveOutcome::Accepted { cells }
    }

    /// Let `dt` of time pass: roll, brake and teleport phases progress.
    pub fn advance(&mut self, dt: Duration) {
        let Some(play) = self.play.as_mut() else { return };
        let mut budget = dt;

        while let Some(step) = play.actor.next_step(&mut budget, &self.timing) {
            match step {
                ActorStep::Entered(at) => {
                    self.events.push(GameEvent::ActorMoved { at, facing: play.actor.facing });
                    play.arrive(at, &self.timing, &mut self.events);
                }
                ActorStep::Stopped(at) => {
                    self.events.push(GameEvent::ActorBraking { at });
                }
                ActorStep::Relocated { from, to } => {
                    debug!(from = %from, to = %to, "teleported");
                    self.events.push(GameEvent::ActorTeleported { from, to });
                    play.arrive(to, &self.timing, &mut self.events);
                    play.settle(&mut self.events);
                }
                ActorStep::Settled(_) => {
                    play.settle(&mut self.events);
                }
            }
        }
    }

    /// External stop request: end an in-flight roll on the cell reached so
    /// far, without braking. Cells not yet reached stay unpainted.
    pub fn stop(&mut self) -> bool {
        let Some(play) = self.play.as_mut() else { return false };
        if !play.actor.stop() {
            return false;
        }
        self.events.push(GameEvent::ActorStopped { at: play.actor.at });
        play.settle(&mut self.events);
        true
    }

    /// Put the actor straight onto a traversable cell, as a teleport does.
    pub fn place_on_tile(&mut self, at: Coord) -> bool {
        let Some(play) = self.play.as_mut() else { return false };
        if !play.grid.cell_at(at).map_or(false, Cell::is_traversable) {
            return false;
        }
        let from = play.actor.at;
        play.actor.place_on(at);
        self.events.push(GameEvent::ActorTeleported { from, to: at });
        play.arrive(at, &self.timing, &mut self.events);
        play.settle(&mut self.events);
        true
    }

    pub fn take_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn status(&self) -> Status {
        match &self.play {
            None => Status::NotLoaded,
            Some(p) if p.complete => Status::Complete,
            Some(p) if p.game_over => Status::GameOver,
            Some(_) => Status::Playing,
        }
    }

    pub fn grid(&self) -> Option<&Grid> {
        self.play.as_ref().map(|p| &p.grid)
    }

    pub fn tiles(&self) -> Option<&TileBoard> {
        self.play.as_ref().map(|p| &p.tiles)
    }

    pub fn actor(&self) -> Option<&Actor> {
        self.play.as_ref().map(|p| &p.actor)
    }

    pub fn moves_left(&self) -> u32 {
        self.play.as_ref().map_or(0, |p| p.moves_left)
    }

    pub fn moves_total(&self) -> u32 {
        self.play.as_ref().map_or(0, |p| p.grid.moves())
    }

    pub fn is_complete(&self) -> bool {
        self.status() == Status::Complete
    }

    pub fn is_game_over(&self) -> bool {
        self.status() == Status::GameOver
    }

    fn begin(&mut self, grid: Grid) {
        info!(
            level = grid.name(),
            width = grid.width(),
            height = grid.height(),
            moves = grid.moves(),
            ground = grid.ground_count(),
            "level_loaded",
        );
        self.events.push(GameEvent::LevelLoaded {
            name: grid.name().to_string(),
            moves: grid.moves(),
        });
        self.events.push(GameEvent::MovesChanged {
            left: grid.moves(),
            total: grid.moves(),
        });
        self.play = Some(Play::new(grid, self.actor_color));
    }
}

// ══════════════════════════════════════════════════════════════
// Internal: per-level rules
// ══════════════════════════════════════════════════════════════

impl Play {
    fn new(grid: Grid, color: Color) -> Self {
        Play {
            tiles: TileBoard::new(&grid),
            actor: Actor::new(grid.start(), color),
            moves_left: grid.moves(),
            complete: false,
            game_over: false,
            grid,
        }
    }

    /// The actor now occupies `at`, by rolling in or by placement.
    fn arrive(&mut self, at: Coord, timing: &Timing, events: &mut Vec<GameEvent>) {
        match self.grid.cell_at(at) {
            Some(Cell::Ground { recolor }) => {
                if let Some(color) = recolor.filter(|&c| c != self.actor.color) {
                    self.actor.color = color;
                    events.push(GameEvent::ActorRecolored { color });
                }
                self.paint(at, events);
            }
            Some(Cell::Teleport { destination }) => {
                // Landing here from a teleport must not bounce straight back.
                if self.actor.was_teleported {
                    return;
                }
                if self.actor.stop() {
                    events.push(GameEvent::ActorStopped { at });
                }
                self.actor.begin_teleport(destination, timing);
                events.push(GameEvent::TeleportStarted { from: at, to: destination });
            }
            Some(Cell::Wall) | None => {
                error!(at = %at, "actor_entered_blocking_cell");
                debug_assert!(false, "actor entered blocking cell {at}");
            }
        }
    }

    fn paint(&mut self, at: Coord, events: &mut Vec<GameEvent>) {
        let color = self.actor.color;
        match self.tiles.paint(at, color) {
            Ok(true) => events.push(GameEvent::TilePainted { at, color }),
            Ok(false) => {}
            Err(e) => {
                error!(error = %e, "invalid_paint");
                debug_assert!(false, "{e}");
                return;
            }
        }
        // Game over is final until the level is reloaded.
        if !self.complete && !self.game_over && self.tiles.is_fully_painted_with(self.actor.color) {
            self.mark_complete(events);
        }
    }

    fn mark_complete(&mut self, events: &mut Vec<GameEvent>) {
        debug_assert!(!self.complete, "level completed twice");
        self.complete = true;
        info!(level = self.grid.name(), moves_left = self.moves_left, "level_complete");
        events.push(GameEvent::LevelComplete);

        // Finished levels stop the ball where it is.
        if self.actor.stop() {
            events.push(GameEvent::ActorStopped { at: self.actor.at });
            self.settle(events);
        }
    }

    /// The actor is idle again; this is where running out of moves ends the level.
    fn settle(&mut self, events: &mut Vec<GameEvent>) {
        events.push(GameEvent::ActorSettled { at: self.actor.at });
        if !self.complete && !self.game_over && self.moves_left == 0 {
            self.game_over = true;
            info!(level = self.grid.name(), "game_over");
            events.push(GameEvent::GameOver);
        }
    }
}
