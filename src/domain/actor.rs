/// The rolling actor and its movement state machine.
///
/// ```text
///   Idle ──begin_roll──▶ Moving ──last cell──▶ Braking ──brake time──▶ Idle
///                          │
///                          └──stop()──────────────────────────────────▶ Idle
///   Idle ──begin_teleport──▶ Teleporting ──teleport time──▶ (placed) Idle
///   any  ──place_on──────────────────────────────────────────────────▶ Idle
/// ```
///
/// Only `Idle` accepts move commands. Time is fed in by the caller:
/// `next_step` consumes part of a time budget and yields at most one
/// discrete step, so the session can react to every cell entered
/// (paint, completion, teleport) before time moves on.

use std::time::Duration;

use super::color::Color;
use super::direction::{Coord, Direction};

/// Durations of the time-bounded phases.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Timing {
    /// Time to roll from one cell into the next.
    pub roll_cell: Duration,
    /// Settle window after a roll hits a wall.
    pub brake: Duration,
    /// Delay between engaging a teleport and landing on its destination.
    pub teleport: Duration,
}

impl Timing {
    /// Every phase completes immediately.
    pub const INSTANT: Timing = Timing {
        roll_cell: Duration::ZERO,
        brake: Duration::ZERO,
        teleport: Duration::ZERO,
    };
}

/// An in-flight straight-line roll.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Roll {
    path: Vec<Coord>,
    /// Index into `path` of the next cell to enter.
    next: usize,
    /// Time left before `path[next]` is entered.
    until_next: Duration,
}

impl Roll {
    /// Cells still ahead of the actor.
    pub fn remaining(&self) -> &[Coord] {
        &self.path[self.next.min(self.path.len())..]
    }
}

#[derive(Clone, PartialEq, Eq, Debug)]
pub enum Motion {
    Idle,
    Moving(Roll),
    Braking { remaining: Duration },
    Teleporting { destination: Coord, remaining: Duration },
}

/// One discrete thing that happened while time advanced.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum ActorStep {
    /// The actor rolled into `at`.
    Entered(Coord),
    /// The roll ended against a blocking cell; braking begins.
    Stopped(Coord),
    /// A teleport finished; the actor now stands on `to`.
    Relocated { from: Coord, to: Coord },
    /// Braking finished; the actor accepts commands again.
    Settled(Coord),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Actor {
    pub at: Coord,
    pub facing: Direction,
    pub color: Color,
    pub was_teleported: bool,
    motion: Motion,
}

impl Actor {
    pub fn new(at: Coord, color: Color) -> Self {
        Actor {
            at,
            facing: Direction::default(),
            color,
            was_teleported: false,
            motion: Motion::Idle,
        }
    }

    pub fn motion(&self) -> &Motion {
        &self.motion
    }

    pub fn is_idle(&self) -> bool {
        matches!(self.motion, Motion::Idle)
    }

    /// Start rolling along `path`, whose first entry is the current cell.
    /// Refused unless idle and the path goes somewhere.
    pub fn begin_roll(&mut self, dir: Direction, path: Vec<Coord>, timing: &Timing) -> bool {
        if !self.is_idle() || path.len() < 2 || path[0] != self.at {
            return false;
        }
        self.facing = dir;
        self.was_teleported = false;
        self.motion = Motion::Moving(Roll { path, next: 1, until_next: timing.roll_cell });
        true
    }

    /// External stop: abandon the rest of a roll and go idle on the cell
    /// actually reached, skipping the brake. Returns false if not moving.
    pub fn stop(&mut self) -> bool {
        if !matches!(self.motion, Motion::Moving(_)) {
            return false;
        }
        self.motion = Motion::Idle;
        true
    }

    pub fn begin_teleport(&mut self, destination: Coord, timing: &Timing) {
        self.motion = Motion::Teleporting { destination, remaining: timing.teleport };
    }

    /// Instant placement. Marks the actor as teleported so that landing on
    /// a teleport cell does not engage it again.
    pub fn place_on(&mut self, at: Coord) {
        self.at = at;
        self.motion = Motion::Idle;
        self.was_teleported = true;
    }

    /// Consume up to `budget` of time and report the next step, if one
    /// happens within it. Call repeatedly until it returns `None`.
    pub fn next_step(&mut self, budget: &mut Duration, timing: &Timing) -> Option<ActorStep> {
        match &mut self.motion {
            Motion::Idle => None,
            Motion::Moving(roll) => {
                if roll.next >= roll.path.len() {
                    self.motion = Motion::Braking { remaining: timing.brake };
                    return Some(ActorStep::Stopped(self.at));
                }
                if *budget < roll.until_next {
                    roll.until_next -= *budget;
                    *budget = Duration::ZERO;
                    return None;
                }
                *budget -= roll.until_next;
                roll.until_next = timing.roll_cell;
                self.at = roll.path[roll.next];
                roll.next += 1;
                Some(ActorStep::Entered(self.at))
            }
            Motion::Braking { remaining } => {
                if *budget < *remaining {
                    *remaining -= *budget;
                    *budget = Duration::ZERO;
                    return None;
                }
                *budget -= *remaining;
                self.motion = Motion::Idle;
                Some(ActorStep::Settled(self.at))
            }
            Motion::Teleporting { destination, remaining } => {
                if *budget < *remaining {
                    *remaining -= *budget;
                    *budget = Duration::ZERO;
                    return None;
                }
                *budget -= *remaining;
                let (from, to) = (self.at, *destination);
                self.place_on(to);
                Some(ActorStep::Relocated { from, to })
            }
        }
    }
}
