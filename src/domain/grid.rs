/// Grid model: the static, validated description of one level.
///
/// `LevelData` is what a level provider hands over (parsed from a file,
/// built in code). `Grid::new` validates it once at load time; after that
/// the grid is read-only and every query is total.
///
/// Validation rules:
///   - non-empty bounds and a positive move budget
///   - every in-bounds coordinate has exactly one cell (no gaps, no
///     duplicates), and no cell lies outside the bounds
///   - the start cell is Ground
///   - teleport destinations are in bounds and not walls

use thiserror::Error;

use super::cell::Cell;
use super::direction::Coord;

/// Unvalidated level description.
#[derive(Clone, Debug, PartialEq)]
pub struct LevelData {
    pub name: String,
    pub width: usize,
    pub height: usize,
    pub cells: Vec<(Coord, Cell)>,
    pub start: Coord,
    pub moves: u32,
}

/// Malformed level data. Fatal to the load, never to the process.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum LevelError {
    #[error("level has no cells")]
    EmptyGrid,
    #[error("level size {width}x{height} is too large")]
    TooLarge { width: usize, height: usize },
    #[error("move budget must be positive")]
    NoMoves,
    #[error("cell {0} lies outside the level bounds")]
    CellOutOfBounds(Coord),
    #[error("cell {0} is defined more than once")]
    DuplicateCell(Coord),
    #[error("no cell defined at {0}")]
    MissingCell(Coord),
    #[error("start {0} lies outside the level bounds")]
    StartOutOfBounds(Coord),
    #[error("start {0} is not a ground cell")]
    StartNotGround(Coord),
    #[error("teleport at {at} leads outside the level ({destination})")]
    TeleportOutOfBounds { at: Coord, destination: Coord },
    #[error("teleport at {at} leads into a wall at {destination}")]
    TeleportIntoWall { at: Coord, destination: Coord },

    // Text format
    #[error("unknown tile '{ch}' at {at}")]
    UnknownTile { ch: char, at: Coord },
    #[error("missing or invalid '@ moves' line")]
    MissingMoves,
    #[error("no start tile 'S'")]
    NoStart,
    #[error("more than one start tile 'S'")]
    MultipleStarts,
    #[error("teleport '{0}' has no destination")]
    MissingWarp(char),
    #[error("malformed metadata line: {0}")]
    BadMetadata(String),
}

#[derive(Clone, Debug)]
pub struct Grid {
    name: String,
    width: usize,
    height: usize,
    /// Row-major, `width * height` entries.
    cells: Vec<Cell>,
    start: Coord,
    moves: u32,
}

impl Grid {
    pub fn new(data: &LevelData) -> Result<Grid, LevelError> {
        if data.width == 0 || data.height == 0 {
            return Err(LevelError::EmptyGrid);
        }
        if data.moves == 0 {
            return Err(LevelError::NoMoves);
        }

        let area = checked_area(data.width, data.height).ok_or(LevelError::TooLarge {
            width: data.width,
            height: data.height,
        })?;
        // More slots than cells means a gap somewhere; find it without
        // allocating the whole area.
        if area > data.cells.len() {
            return Err(first_gap(data));
        }

        let mut slots: Vec<Option<Cell>> = vec![None; area];
        for &(at, cell) in &data.cells {
            let idx = index_of(at, data.width, data.height).ok_or(LevelError::CellOutOfBounds(at))?;
            if slots[idx].is_some() {
                return Err(LevelError::DuplicateCell(at));
            }
            slots[idx] = Some(cell);
        }

        let mut cells = Vec::with_capacity(slots.len());
        for (idx, slot) in slots.into_iter().enumerate() {
            let at = Coord::new((idx % data.width) as i32, (idx / data.width) as i32);
            cells.push(slot.ok_or(LevelError::MissingCell(at))?);
        }

        let grid = Grid {
            name: data.name.clone(),
            width: data.width,
            height: data.height,
            cells,
            start: data.start,
            moves: data.moves,
        };

        match grid.cell_at(grid.start) {
            None => return Err(LevelError::StartOutOfBounds(grid.start)),
            Some(cell) if !cell.is_ground() => return Err(LevelError::StartNotGround(grid.start)),
            Some(_) => {}
        }

        for (at, cell) in grid.cells() {
            if let Some(destination) = cell.teleport_destination() {
                match grid.cell_at(destination) {
                    None => return Err(LevelError::TeleportOutOfBounds { at, destination }),
                    Some(Cell::Wall) => return Err(LevelError::TeleportIntoWall { at, destination }),
                    Some(_) => {}
                }
            }
        }

        Ok(grid)
    }

    /// Cell at `at`, or `None` outside the bounds.
    #[inline]
    pub fn cell_at(&self, at: Coord) -> Option<Cell> {
        index_of(at, self.width, self.height).map(|idx| self.cells[idx])
    }

    #[inline]
    pub fn is_within_bounds(&self, at: Coord) -> bool {
        index_of(at, self.width, self.height).is_some()
    }

    /// All cells in row-major order.
    pub fn cells(&self) -> impl Iterator<Item = (Coord, Cell)> + '_ {
        let width = self.width;
        self.cells
            .iter()
            .enumerate()
            .map(move |(idx, &cell)| (Coord::new((idx % width) as i32, (idx / width) as i32), cell))
    }

    pub fn ground_count(&self) -> usize {
        self.cells.iter().filter(|c| c.is_ground()).count()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn start(&self) -> Coord {
        self.start
    }

    pub fn moves(&self) -> u32 {
        self.moves
    }
}

/// `width * height`, if both axes fit a `Coord` and the product fits memory.
fn checked_area(width: usize, height: usize) -> Option<usize> {
    let max_axis = i32::MAX as usize;
    if width > max_axis || height > max_axis {
        return None;
    }
    width.checked_mul(height)
}

/// The error for cells that cannot cover the whole area: a stray or
/// duplicate cell if there is one, otherwise the first missing coordinate.
fn first_gap(data: &LevelData) -> LevelError {
    let mut seen = Vec::with_capacity(data.cells.len());
    for &(at, _) in &data.cells {
        match index_of(at, data.width, data.height) {
            Some(idx) => seen.push((idx, at)),
            None => return LevelError::CellOutOfBounds(at),
        }
    }
    seen.sort_unstable_by_key(|&(idx, _)| idx);
    if let Some(pair) = seen.windows(2).find(|w| w[0].0 == w[1].0) {
        return LevelError::DuplicateCell(pair[1].1);
    }
    let missing = seen
        .iter()
        .enumerate()
        .find(|&(expected, &(idx, _))| idx != expected)
        .map_or(seen.len(), |(expected, _)| expected);
    LevelError::MissingCell(Coord::new((missing % data.width) as i32, (missing / data.width) as i32))
}

/// Row-major index of `at`, if it lies inside `width x height`.
#[inline]
pub(crate) fn index_of(at: Coord, width: usize, height: usize) -> Option<usize> {
    if at.x < 0 || at.y < 0 {
        return None;
    }
    let (x, y) = (at.x as usize, at.y as usize);
    if x >= width || y >= height {
        return None;
    }
    Some(y * width + x)
}

/// Test helper: build level data from a diagram.
/// Legend: '#'=Wall  '.'=Ground  'S'=Ground start  palette letter=painter
#[cfg(test)]
pub(crate) fn data_from(rows: &[&str], moves: u32) -> LevelData {
    use super::color::Color;

    let height = rows.len();
    let width = rows.iter().map(|r| r.len()).max().unwrap_or(0);
    let mut cells = Vec::new();
    let mut start = Coord::default();
    for (y, row) in rows.iter().enumerate() {
        for (x, ch) in row.chars().enumerate() {
            let at = Coord::new(x as i32, y as i32);
            let cell = match ch {
                '.' => Cell::GROUND,
                'S' => {
                    start = at;
                    Cell::GROUND
                }
                c if Color::is_palette_char(c) => Cell::Ground { recolor: Color::from_palette(c) },
                _ => Cell::Wall,
            };
            cells.push((at, cell));
        }
    }
    LevelData { name: "test".to_string(), width, height, cells, start, moves }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_level_builds() {
        let grid = Grid::new(&data_from(&["#####", "#S..#", "#####"], 3)).unwrap();
        assert_eq!(grid.width(), 5);
        assert_eq!(grid.height(), 3);
        assert_eq!(grid.start(), Coord::new(1, 1));
        assert_eq!(grid.ground_count(), 3);
        assert_eq!(grid.cell_at(Coord::new(0, 0)), Some(Cell::Wall));
        assert_eq!(grid.cell_at(Coord::new(2, 1)), Some(Cell::GROUND));
    }

    #[test]
    fn out_of_bounds_is_not_found() {
        let grid = Grid::new(&data_from(&["S."], 1)).unwrap();
        assert_eq!(grid.cell_at(Coord::new(-1, 0)), None);
        assert_eq!(grid.cell_at(Coord::new(2, 0)), None);
        assert_eq!(grid.cell_at(Coord::new(0, 1)), None);
        assert!(grid.is_within_bounds(Coord::new(1, 0)));
        assert!(!grid.is_within_bounds(Coord::new(0, -1)));
    }

    #[test]
    fn gap_is_rejected() {
        let mut data = data_from(&["S.."], 1);
        data.cells.retain(|(at, _)| *at != Coord::new(1, 0));
        assert_eq!(Grid::new(&data).unwrap_err(), LevelError::MissingCell(Coord::new(1, 0)));
    }

    #[test]
    fn oversized_dimensions_are_rejected_without_allocating() {
        let mut data = data_from(&["S."], 1);
        data.width = usize::MAX;
        data.height = 2;
        assert_eq!(
            Grid::new(&data).unwrap_err(),
            LevelError::TooLarge { width: usize::MAX, height: 2 },
        );

        data.width = 1 << 20;
        data.height = 1 << 20;
        assert_eq!(Grid::new(&data).unwrap_err(), LevelError::MissingCell(Coord::new(2, 0)));
    }

    #[test]
    fn gap_in_a_short_cell_list_is_found() {
        let mut data = data_from(&["S..", "..."], 1);
        data.cells.retain(|(at, _)| *at != Coord::new(0, 1));
        assert_eq!(Grid::new(&data).unwrap_err(), LevelError::MissingCell(Coord::new(0, 1)));

        data.cells.push((Coord::new(1, 0), Cell::Wall));
        data.cells.retain(|(at, _)| *at != Coord::new(2, 1));
        assert_eq!(Grid::new(&data).unwrap_err(), LevelError::DuplicateCell(Coord::new(1, 0)));
    }

    #[test]
    fn duplicate_is_rejected() {
        let mut data = data_from(&["S.."], 1);
        data.cells.push((Coord::new(2, 0), Cell::Wall));
        assert_eq!(Grid::new(&data).unwrap_err(), LevelError::DuplicateCell(Coord::new(2, 0)));
    }

    #[test]
    fn stray_cell_is_rejected() {
        let mut data = data_from(&["S.."], 1);
        data.cells.push((Coord::new(3, 0), Cell::GROUND));
        assert_eq!(Grid::new(&data).unwrap_err(), LevelError::CellOutOfBounds(Coord::new(3, 0)));
    }

    #[test]
    fn start_must_be_ground_and_in_bounds() {
        let mut data = data_from(&["#S."], 1);
        data.start = Coord::new(0, 0);
        assert_eq!(Grid::new(&data).unwrap_err(), LevelError::StartNotGround(Coord::new(0, 0)));

        data.start = Coord::new(5, 0);
        assert_eq!(Grid::new(&data).unwrap_err(), LevelError::StartOutOfBounds(Coord::new(5, 0)));
    }

    #[test]
    fn zero_moves_and_empty_grid_are_rejected() {
        assert_eq!(Grid::new(&data_from(&["S."], 0)).unwrap_err(), LevelError::NoMoves);
        assert_eq!(Grid::new(&data_from(&[], 3)).unwrap_err(), LevelError::EmptyGrid);
    }

    #[test]
    fn teleport_destinations_are_checked() {
        let mut data = data_from(&["S..#"], 1);
        data.cells[2].1 = Cell::Teleport { destination: Coord::new(3, 0) };
        assert_eq!(
            Grid::new(&data).unwrap_err(),
            LevelError::TeleportIntoWall { at: Coord::new(2, 0), destination: Coord::new(3, 0) },
        );

        data.cells[2].1 = Cell::Teleport { destination: Coord::new(9, 9) };
        assert_eq!(
            Grid::new(&data).unwrap_err(),
            LevelError::TeleportOutOfBounds { at: Coord::new(2, 0), destination: Coord::new(9, 9) },
        );
    }
}
