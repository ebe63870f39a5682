/// Tile state: the mutable paint layer over a grid's ground cells.
///
/// One `TileState` per Ground cell, created unpainted when a level loads.
/// Walls and teleports have no slot; painting them is a programming error.

use thiserror::Error;

use super::color::Color;
use super::direction::Coord;
use super::grid::{index_of, Grid};

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default)]
pub struct TileState {
    pub paint: Option<Color>,
    pub painted_by_actor: bool,
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum TileError {
    #[error("cannot paint {0}: not a ground tile")]
    NotGround(Coord),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TileBoard {
    width: usize,
    height: usize,
    /// Row-major; `None` for non-ground cells.
    tiles: Vec<Option<TileState>>,
}

impl TileBoard {
    pub fn new(grid: &Grid) -> Self {
        TileBoard {
            width: grid.width(),
            height: grid.height(),
            tiles: grid
                .cells()
                .map(|(_, cell)| cell.is_ground().then(TileState::default))
                .collect(),
        }
    }

    pub fn get(&self, at: Coord) -> Option<&TileState> {
        index_of(at, self.width, self.height).and_then(|idx| self.tiles[idx].as_ref())
    }

    /// Paint the tile at `at`. Returns whether its visible color changed.
    pub fn paint(&mut self, at: Coord, color: Color) -> Result<bool, TileError> {
        let tile = index_of(at, self.width, self.height)
            .and_then(|idx| self.tiles[idx].as_mut())
            .ok_or(TileError::NotGround(at))?;
        let changed = tile.paint != Some(color);
        tile.paint = Some(color);
        tile.painted_by_actor = true;
        Ok(changed)
    }

    /// Every ground tile painted by the actor, all with `color`.
    pub fn is_fully_painted_with(&self, color: Color) -> bool {
        self.ground().all(|t| t.painted_by_actor && t.paint == Some(color))
    }

    /// The single color shared by every ground tile, if there is one.
    pub fn shared_color(&self) -> Option<Color> {
        let mut tiles = self.ground();
        let first = tiles.next()?;
        let color = first.paint.filter(|_| first.painted_by_actor)?;
        tiles
            .all(|t| t.painted_by_actor && t.paint == Some(color))
            .then_some(color)
    }

    pub fn painted_count(&self) -> usize {
        self.ground().filter(|t| t.painted_by_actor).count()
    }

    pub fn ground_count(&self) -> usize {
        self.ground().count()
    }

    fn ground(&self) -> impl Iterator<Item = &TileState> {
        self.tiles.iter().flatten()
    }
}
