/// Cell types and their properties.
/// Properties are queried via methods, not stored as flags,
/// so cell semantics are centralized here.

use super::color::Color;
use super::direction::Coord;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Cell {
    /// Blocks the actor; never painted.
    Wall,
    /// Paintable floor. A painter tile (`recolor` set) changes the
    /// actor's color before it is painted.
    Ground { recolor: Option<Color> },
    /// Traversable; entering it relocates the actor to `destination`.
    Teleport { destination: Coord },
}

impl Cell {
    pub const GROUND: Cell = Cell::Ground { recolor: None };

    /// Can the actor roll into this cell?
    pub fn is_traversable(self) -> bool {
        !matches!(self, Cell::Wall)
    }

    /// Does this cell carry a tile state?
    pub fn is_ground(self) -> bool {
        matches!(self, Cell::Ground { .. })
    }

    pub fn teleport_destination(self) -> Option<Coord> {
        match self {
            Cell::Teleport { destination } => Some(destination),
            _ => None,
        }
    }
}
