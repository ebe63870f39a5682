/// Grid coordinates and the four cardinal move directions.
///
/// Row 0 is the top row of a level: `Up` decreases `y`, `Right` increases `x`.
/// Coordinates are signed so stepping off the edge of the grid is just
/// another coordinate that `Grid::cell_at` reports as missing.

use std::fmt;

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default, PartialOrd, Ord)]
pub struct Coord {
    pub x: i32,
    pub y: i32,
}

impl Coord {
    pub const fn new(x: i32, y: i32) -> Self {
        Coord { x, y }
    }

    /// The neighbouring coordinate one cell away in `dir`.
    pub fn step(self, dir: Direction) -> Coord {
        let (dx, dy) = dir.delta();
        Coord { x: self.x + dx, y: self.y + dy }
    }
}

impl fmt::Display for Coord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default)]
pub enum Direction {
    Up,
    #[default]
    Down,
    Left,
    Right,
}

impl Direction {
    pub const ALL: [Direction; 4] = [
        Direction::Up,
        Direction::Down,
        Direction::Left,
        Direction::Right,
    ];

    pub fn delta(self) -> (i32, i32) {
        match self {
            Direction::Up => (0, -1),
            Direction::Down => (0, 1),
            Direction::Left => (-1, 0),
            Direction::Right => (1, 0),
        }
    }
}

/// Resolve an analog vector (stick, drag) to a single cardinal direction.
///
/// `dy` grows upward, as analog sticks report it. Vectors shorter than
/// `threshold` on both axes are ignored; otherwise the dominant axis wins,
/// and it must itself clear the threshold.
pub fn dominant_direction(dx: f32, dy: f32, threshold: f32) -> Option<Direction> {
    if dx.abs() < threshold && dy.abs() < threshold {
        return None;
    }

    if dx.abs() > dy.abs() {
        if dx >= threshold {
            Some(Direction::Right)
        } else if dx <= -threshold {
            Some(Direction::Left)
        } else {
            None
        }
    } else if dy >= threshold {
        Some(Direction::Up)
    } else if dy <= -threshold {
        Some(Direction::Down)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn step_moves_one_cell() {
        let c = Coord::new(3, 3);
        assert_eq!(c.step(Direction::Up), Coord::new(3, 2));
        assert_eq!(c.step(Direction::Down), Coord::new(3, 4));
        assert_eq!(c.step(Direction::Left), Coord::new(2, 3));
        assert_eq!(c.step(Direction::Right), Coord::new(4, 3));
    }

    #[test]
    fn fresh_actors_face_down() {
        assert_eq!(Direction::default(), Direction::Down);
    }

    #[test]
    fn step_off_the_edge_goes_negative() {
        assert_eq!(Coord::new(0, 0).step(Direction::Left), Coord::new(-1, 0));
    }

    #[test]
    fn dominant_axis_wins() {
        assert_eq!(dominant_direction(0.9, 0.3, 0.25), Some(Direction::Right));
        assert_eq!(dominant_direction(-0.9, 0.3, 0.25), Some(Direction::Left));
        assert_eq!(dominant_direction(0.2, 0.8, 0.25), Some(Direction::Up));
        assert_eq!(dominant_direction(0.2, -0.8, 0.25), Some(Direction::Down));
    }

    #[test]
    fn small_vectors_are_ignored() {
        assert_eq!(dominant_direction(0.1, -0.1, 0.25), None);
        assert_eq!(dominant_direction(0.0, 0.0, 0.25), None);
    }

    #[test]
    fn equal_axes_prefer_vertical() {
        assert_eq!(dominant_direction(0.5, 0.5, 0.25), Some(Direction::Up));
    }
}
