/// Movement resolver: where does a roll in a given direction end?
///
/// Starting from the actor's cell, step one cell at a time while the next
/// cell is Ground. The roll stops:
///   - before a Wall or the grid edge        → `Outcome::Blocked`
///   - on entering a Teleport cell           → `Outcome::Teleport`
/// If the very first step is blocked the path is empty (`Outcome::NoMove`)
/// and the move must be rejected without consuming budget.
///
/// The returned path includes the starting cell as its first entry.

use super::cell::Cell;
use super::direction::{Coord, Direction};
use super::grid::Grid;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Outcome {
    NoMove,
    Blocked,
    Teleport { at: Coord, destination: Coord },
}

#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Resolution {
    pub path: Vec<Coord>,
    pub outcome: Outcome,
}

impl Resolution {
    /// Number of cells the actor will travel.
    pub fn distance(&self) -> usize {
        self.path.len().saturating_sub(1)
    }
}

pub fn resolve(grid: &Grid, from: Coord, dir: Direction) -> Resolution {
    let mut path = vec![from];
    let mut here = from;

    let outcome = loop {
        let next = here.step(dir);
        match grid.cell_at(next) {
            None | Some(Cell::Wall) => break Outcome::Blocked,
            Some(Cell::Ground { .. }) => {
                path.push(next);
                here = next;
            }
            Some(Cell::Teleport { destination }) => {
                path.push(next);
                break Outcome::Teleport { at: next, destination };
            }
        }
    };

    if path.len() < 2 {
        return Resolution { path: Vec::new(), outcome: Outcome::NoMove };
    }
    Resolution { path, outcome }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::grid::{data_from, LevelData};

    fn grid(rows: &[&str]) -> Grid {
        Grid::new(&data_from(rows, 1)).unwrap()
    }

    fn with_teleport(mut data: LevelData, at: Coord, destination: Coord) -> LevelData {
        for (c, cell) in data.cells.iter_mut() {
            if *c == at {
                *cell = Cell::Teleport { destination };
            }
        }
        data
    }

    fn row(y: i32, xs: &[i32]) -> Vec<Coord> {
        xs.iter().map(|&x| Coord::new(x, y)).collect()
    }

    // ── Straight runs ──

    #[test]
    fn rolls_until_wall() {
        let g = grid(&[
            "######",
            "#S...#",
            "######",
        ]);
        let r = resolve(&g, Coord::new(1, 1), Direction::Right);
        assert_eq!(r.outcome, Outcome::Blocked);
        assert_eq!(r.path, row(1, &[1, 2, 3, 4]));
        assert_eq!(r.distance(), 3);
    }

    #[test]
    fn grid_edge_acts_as_wall() {
        let g = grid(&["S.."]);
        let r = resolve(&g, Coord::new(0, 0), Direction::Right);
        assert_eq!(r.outcome, Outcome::Blocked);
        assert_eq!(r.path, row(0, &[0, 1, 2]));
    }

    #[test]
    fn vertical_rolls() {
        let g = grid(&[
            "#.#",
            "#S#",
            "#.#",
            "#.#",
        ]);
        let down = resolve(&g, Coord::new(1, 1), Direction::Down);
        assert_eq!(down.path, vec![Coord::new(1, 1), Coord::new(1, 2), Coord::new(1, 3)]);
        let up = resolve(&g, Coord::new(1, 1), Direction::Up);
        assert_eq!(up.path, vec![Coord::new(1, 1), Coord::new(1, 0)]);
    }

    #[test]
    fn painter_tiles_do_not_block() {
        let g = grid(&["S.r.#"]);
        let r = resolve(&g, Coord::new(0, 0), Direction::Right);
        assert_eq!(r.path, row(0, &[0, 1, 2, 3]));
    }

    // ── Blocked immediately ──

    #[test]
    fn adjacent_wall_is_no_move() {
        let g = grid(&["#S.#"]);
        let r = resolve(&g, Coord::new(1, 0), Direction::Left);
        assert_eq!(r.outcome, Outcome::NoMove);
        assert!(r.path.is_empty());
        assert_eq!(r.distance(), 0);
    }

    #[test]
    fn adjacent_edge_is_no_move() {
        let g = grid(&["S."]);
        for dir in [Direction::Up, Direction::Down, Direction::Left] {
            let r = resolve(&g, Coord::new(0, 0), dir);
            assert_eq!(r.outcome, Outcome::NoMove, "{dir:?}");
        }
    }

    // ── Teleports ──

    #[test]
    fn teleport_ends_the_path() {
        let data = with_teleport(data_from(&["S....", "....."], 1), Coord::new(2, 0), Coord::new(4, 1));
        let g = Grid::new(&data).unwrap();
        let r = resolve(&g, Coord::new(0, 0), Direction::Right);
        assert_eq!(r.path, row(0, &[0, 1, 2]));
        assert_eq!(
            r.outcome,
            Outcome::Teleport { at: Coord::new(2, 0), destination: Coord::new(4, 1) },
        );
    }

    #[test]
    fn teleport_right_next_to_actor_is_a_move() {
        let data = with_teleport(data_from(&["S.", ".."], 1), Coord::new(1, 0), Coord::new(1, 1));
        let g = Grid::new(&data).unwrap();
        let r = resolve(&g, Coord::new(0, 0), Direction::Right);
        assert_eq!(r.distance(), 1);
        assert!(matches!(r.outcome, Outcome::Teleport { .. }));
    }

    #[test]
    fn standing_on_a_teleport_does_not_engage_it() {
        let data = with_teleport(data_from(&["S..."], 1), Coord::new(1, 0), Coord::new(0, 0));
        let g = Grid::new(&data).unwrap();
        let r = resolve(&g, Coord::new(1, 0), Direction::Right);
        assert_eq!(r.outcome, Outcome::Blocked);
        assert_eq!(r.path, row(0, &[1, 2, 3]));
    }
}
