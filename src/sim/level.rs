/// Level loader with pack support.
///
/// ## Sources (priority order):
///   1. Configured pack file (`.rlp` format)
///   2. `levels/` directory (individual `.txt` files, filename order)
///   3. Built-in embedded levels
///
/// ## Pack format (`.rlp`, Roll Splat Level Pack):
///   ```text
///   ## Pack Name
///   ## Author: name
///   ## Description: blah blah
///   ---
///   # First Roll
///   @ moves 4
///   <map rows>
///   ---
///   # Second Level
///   <map rows>
///   ```
///
/// Levels are separated by a line containing only `---`.
/// Pack metadata lines start with `##`.
///
/// ## Single-level format (`.txt`):
///   Line 1: `# Level Name` (metadata lines follow it)
///   `@ moves N`        move budget (required)
///   `@ warp D x,y`     teleport `D` sends the ball to `(x, y)`
///   Lines: map rows (short rows are padded with wall)
///
/// ## Tile legend:
///   '#' / ' ' = Wall             '.' = Ground
///   'S' = Start (ground)         '1'-'9' = Teleport
///   r g b y c m o p = Painter ground (recolors the ball)
///
/// A teleport digit without a `@ warp` line must appear exactly twice;
/// the two cells then send to each other.

use std::collections::BTreeMap;
use std::path::Path;

use tracing::{error, info, warn};

use crate::config::GameConfig;
use crate::domain::cell::Cell;
use crate::domain::color::Color;
use crate::domain::direction::Coord;
use crate::domain::grid::{LevelData, LevelError};
use super::game::{GameState, Phase};

/// Pack metadata from the `##` header.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PackInfo {
    pub name: String,
    pub author: String,
    pub description: String,
}

/// The ordered list of levels the game plays through.
#[derive(Clone, Debug)]
pub struct LevelSet {
    pub info: PackInfo,
    pub levels: Vec<LevelData>,
}

// ══════════════════════════════════════════════════════════════
// Public API
// ══════════════════════════════════════════════════════════════

/// Load level `level_idx` into the game's session. Levels that fail
/// validation are skipped; running past the end completes the game.
pub fn load_level(game: &mut GameState, level_idx: usize) {
    let mut idx = level_idx;
    while let Some(data) = game.levels.get(idx) {
        match game.session.load_level(data) {
            Ok(()) => {
                game.current_level = idx;
                game.phase = Phase::Playing;
                game.anim_tick = 0;
                let title = format!("{} / {}: {}", idx + 1, game.levels.len(), data.name);
                game.set_message(&title, 60);
                return;
            }
            Err(e) => {
                warn!(level = idx + 1, name = %data.name, error = %e, "skipping broken level");
                idx += 1;
            }
        }
    }
    info!(levels = game.levels.len(), "all levels cleared");
    game.phase = Phase::GameComplete;
}

/// Pick the level source per the priority order above.
pub fn load_levels(config: &GameConfig) -> LevelSet {
    if let Some(pack_path) = &config.pack {
        match std::fs::read_to_string(pack_path) {
            Ok(content) => {
                let (mut info, levels) = parse_pack(&content);
                if !levels.is_empty() {
                    if info.name.is_empty() {
                        info.name = file_stem(pack_path);
                    }
                    info!(pack = %info.name, levels = levels.len(), "pack loaded");
                    return LevelSet { info, levels };
                }
                warn!(path = %pack_path.display(), "pack has no playable levels");
            }
            Err(e) => warn!(path = %pack_path.display(), error = %e, "could not read pack"),
        }
    }

    let dir = &config.levels_dir;
    if dir.is_dir() {
        let levels: Vec<LevelData> = load_from_directory(dir)
            .into_iter()
            .map(|(_, data)| data)
            .collect();
        if !levels.is_empty() {
            let name = file_stem(dir);
            info!(dir = %dir.display(), levels = levels.len(), "levels directory loaded");
            return LevelSet {
                info: PackInfo {
                    description: format!("{} levels from {}/", levels.len(), name),
                    name: format!("{}/", name),
                    author: String::new(),
                },
                levels,
            };
        }
    }

    let levels = embedded_levels();
    LevelSet {
        info: PackInfo {
            name: "Built-in Levels".to_string(),
            author: "Roll Splat".to_string(),
            description: format!("{} levels included with the game", levels.len()),
        },
        levels,
    }
}

// ══════════════════════════════════════════════════════════════
// Pack parsing
// ══════════════════════════════════════════════════════════════

/// Parse a `.rlp` pack. Broken levels are logged and left out.
pub fn parse_pack(content: &str) -> (PackInfo, Vec<LevelData>) {
    let mut info = PackInfo::default();
    let mut levels = vec![];
    let mut current_section = String::new();
    let mut in_levels = false;
    let mut section_no = 0;

    for line in content.lines() {
        let trimmed = line.trim();

        if trimmed == "---" {
            if in_levels {
                flush_section(&current_section, section_no, &mut levels);
            }
            current_section.clear();
            in_levels = true;
            section_no += 1;
            continue;
        }

        if !in_levels {
            if let Some(rest) = trimmed.strip_prefix("## Author:") {
                info.author = rest.trim().to_string();
            } else if let Some(rest) = trimmed.strip_prefix("## Description:") {
                info.description = rest.trim().to_string();
            } else if let Some(rest) = trimmed.strip_prefix("##") {
                if info.name.is_empty() {
                    info.name = rest.trim().to_string();
                }
            }
            continue;
        }

        current_section.push_str(line);
        current_section.push('\n');
    }

    flush_section(&current_section, section_no, &mut levels);

    (info, levels)
}

fn flush_section(section: &str, section_no: usize, levels: &mut Vec<LevelData>) {
    if section.trim().is_empty() {
        return;
    }
    match parse_level_str(section) {
        Ok(data) => levels.push(data),
        Err(e) => warn!(section = section_no, error = %e, "pack level rejected"),
    }
}

// ══════════════════════════════════════════════════════════════
// Single-level parsing
// ══════════════════════════════════════════════════════════════

/// Parse one level from text. The result still has to pass `Grid::new`.
pub fn parse_level_str(content: &str) -> Result<LevelData, LevelError> {
    let mut name = String::new();
    let mut moves = None;
    let mut warps: BTreeMap<char, Coord> = BTreeMap::new();
    let mut rows: Vec<&str> = vec![];

    let lines: Vec<&str> = content.lines().collect();
    for (i, &line) in lines.iter().enumerate() {
        if rows.is_empty() && name.is_empty() && is_name_line(line, &lines[i + 1..]) {
            name = line[1..].trim().to_string();
        } else if let Some(meta) = line.strip_prefix('@') {
            parse_metadata(meta, &mut moves, &mut warps)
                .ok_or_else(|| LevelError::BadMetadata(line.trim().to_string()))?;
        } else if rows.is_empty() && line.trim().is_empty() {
            continue;
        } else {
            rows.push(line);
        }
    }

    while rows.last().map_or(false, |r| r.trim().is_empty()) {
        rows.pop();
    }

    let moves = moves.ok_or(LevelError::MissingMoves)?;
    let width = rows.iter().map(|r| r.chars().count()).max().unwrap_or(0);
    let height = rows.len();

    let mut cells = Vec::with_capacity(width * height);
    let mut start = None;
    let mut teleports: BTreeMap<char, Vec<Coord>> = BTreeMap::new();

    for (y, row) in rows.iter().enumerate() {
        let padded = row.chars().chain(std::iter::repeat(' ')).take(width);
        for (x, ch) in padded.enumerate() {
            let at = Coord::new(x as i32, y as i32);
            let cell = match ch {
                '#' | ' ' => Cell::Wall,
                '.' => Cell::GROUND,
                'S' => {
                    if start.replace(at).is_some() {
                        return Err(LevelError::MultipleStarts);
                    }
                    Cell::GROUND
                }
                '1'..='9' => {
                    teleports.entry(ch).or_default().push(at);
                    // destination filled in below
                    Cell::Teleport { destination: at }
                }
                c => match Color::from_palette(c) {
                    Some(color) => Cell::Ground { recolor: Some(color) },
                    None => return Err(LevelError::UnknownTile { ch: c, at }),
                },
            };
            cells.push((at, cell));
        }
    }

    let start = start.ok_or(LevelError::NoStart)?;

    for (digit, spots) in &teleports {
        let destinations: Vec<(Coord, Coord)> = match (warps.get(digit), spots.as_slice()) {
            (Some(&dest), _) => spots.iter().map(|&at| (at, dest)).collect(),
            (None, &[a, b]) => vec![(a, b), (b, a)],
            (None, _) => return Err(LevelError::MissingWarp(*digit)),
        };
        for (at, destination) in destinations {
            if let Some((_, cell)) = cells.iter_mut().find(|(c, _)| *c == at) {
                *cell = Cell::Teleport { destination };
            }
        }
    }

    if name.is_empty() {
        name = "Unnamed Level".to_string();
    }

    Ok(LevelData { name, width, height, cells, start, moves })
}

/// `moves N` or `warp D x,y`. `None` for anything malformed.
fn parse_metadata(meta: &str, moves: &mut Option<u32>, warps: &mut BTreeMap<char, Coord>) -> Option<()> {
    let mut words = meta.split_whitespace();
    match words.next()? {
        "moves" => {
            *moves = Some(words.next()?.parse().ok()?);
        }
        "warp" => {
            let mut digit = words.next()?.chars();
            let d = digit.next().filter(|c| ('1'..='9').contains(c))?;
            if digit.next().is_some() {
                return None;
            }
            let (x, y) = words.next()?.split_once(',')?;
            warps.insert(d, Coord::new(x.trim().parse().ok()?, y.trim().parse().ok()?));
        }
        _ => return None,
    }
    words.next().is_none().then_some(())
}

/// Distinguish `# Level Name` from `#.....#` (level data).
/// A name line starts with `#` and either contains a character that is not
/// a tile or is directly followed by an `@` metadata line. Names spelled
/// only with tile characters (`# by`) therefore need the metadata after them.
fn is_name_line(line: &str, rest_of_level: &[&str]) -> bool {
    let Some(text) = line.strip_prefix('#') else { return false };
    if text.chars().any(|c| !is_tile_char(c)) {
        return true;
    }
    rest_of_level
        .iter()
        .find(|l| !l.trim().is_empty())
        .map_or(false, |l| l.starts_with('@'))
}

fn is_tile_char(c: char) -> bool {
    matches!(c, '#' | ' ' | '.' | 'S' | '1'..='9') || Color::is_palette_char(c)
}

// ══════════════════════════════════════════════════════════════
// Directory loading (individual .txt files)
// ══════════════════════════════════════════════════════════════

/// Every parseable `.txt` in `dir`, sorted by filename.
fn load_from_directory(dir: &Path) -> Vec<(String, LevelData)> {
    let mut results = vec![];

    let entries = match std::fs::read_dir(dir) {
        Ok(e) => e,
        Err(e) => {
            warn!(dir = %dir.display(), error = %e, "could not read levels directory");
            return results;
        }
    };

    for entry in entries.flatten() {
        let path = entry.path();
        if path.extension().map_or(false, |e| e == "txt") {
            let filename = path.file_name().unwrap_or_default().to_string_lossy().to_string();
            match std::fs::read_to_string(&path) {
                Ok(content) => match parse_level_str(&content) {
                    Ok(data) => results.push((filename, data)),
                    Err(e) => warn!(file = %filename, error = %e, "level file rejected"),
                },
                Err(e) => warn!(file = %filename, error = %e, "could not read level file"),
            }
        }
    }

    results.sort_by(|a, b| a.0.cmp(&b.0));
    results
}

fn file_stem(path: &Path) -> String {
    path.file_stem().unwrap_or_default().to_string_lossy().to_string()
}

// ══════════════════════════════════════════════════════════════
// Embedded fallback levels
// ══════════════════════════════════════════════════════════════

const EMBEDDED: &[&str] = &[
    "\
# First Roll
@ moves 4
#######
#S....#
#####.#
#.....#
#######
",
    "\
# Corners
@ moves 10
#########
#S......#
#.#####.#
#.#...#.#
#.#.#.#.#
#...#...#
#########
",
    "\
# Side Door
@ moves 13
##########
#S....#..#
#.###.#..#
#.#1..#.1#
#.#####..#
#........#
##########
",
    "\
# Red Shift
@ moves 10
#########
#S....r##
#.####.##
#.......#
#.#####.#
#.......#
#########
",
    "\
# Switchback
@ moves 17
##########
#S...#...#
#.##.#.#.#
#...1#.#.#
####.#...#
#....#1###
##########
",
];

pub fn embedded_levels() -> Vec<LevelData> {
    EMBEDDED
        .iter()
        .filter_map(|text| match parse_level_str(text) {
            Ok(data) => Some(data),
            Err(e) => {
                error!(error = %e, "embedded level failed to parse");
                None
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::{HashSet, VecDeque};

    use crate::domain::actor::Timing;
    use crate::domain::direction::Direction;
    use crate::domain::grid::Grid;
    use crate::sim::session::{LevelSession, MoveOutcome, Status};

    fn cell(data: &LevelData, x: i32, y: i32) -> Cell {
        data.cells
            .iter()
            .find(|(c, _)| *c == Coord::new(x, y))
            .map(|&(_, cell)| cell)
            .unwrap()
    }

    // ── Single levels ──

    #[test]
    fn parses_name_moves_and_rows() {
        let data = parse_level_str("# Tiny\n@ moves 3\n####\n#S.#\n####\n").unwrap();
        assert_eq!(data.name, "Tiny");
        assert_eq!(data.moves, 3);
        assert_eq!((data.width, data.height), (4, 3));
        assert_eq!(data.start, Coord::new(1, 1));
        assert_eq!(cell(&data, 2, 1), Cell::GROUND);
        assert_eq!(cell(&data, 0, 1), Cell::Wall);
        assert!(Grid::new(&data).is_ok());
    }

    #[test]
    fn names_spelled_with_tile_letters_stay_names() {
        let data = parse_level_str("# by\n@ moves 1\n#S.#\n").unwrap();
        assert_eq!(data.name, "by");
        assert_eq!(data.height, 1);

        let data = parse_level_str("# 1 2\n\n@ moves 1\n#S.#\n").unwrap();
        assert_eq!(data.name, "1 2");

        // A wall row followed by more rows is still map data.
        let data = parse_level_str("####\n#S.#\n@ moves 1\n").unwrap();
        assert_eq!(data.name, "Unnamed Level");
        assert_eq!(data.height, 2);
    }

    #[test]
    fn wall_row_is_not_a_name() {
        let data = parse_level_str("@ moves 1\n#S.#\n").unwrap();
        assert_eq!(data.name, "Unnamed Level");
        assert_eq!(data.height, 1);
        assert!(is_name_line("# Red Shift", &[]));
        assert!(!is_name_line("#.r.#", &[]));
        assert!(!is_name_line("#### ###", &[]));
    }

    #[test]
    fn short_rows_are_padded_with_wall() {
        let data = parse_level_str("@ moves 1\nS...\n.\n").unwrap();
        assert_eq!(data.width, 4);
        assert_eq!(data.cells.len(), 8);
        assert_eq!(cell(&data, 0, 1), Cell::GROUND);
        assert_eq!(cell(&data, 3, 1), Cell::Wall);
    }

    #[test]
    fn painter_letters() {
        let data = parse_level_str("@ moves 1\nS.g\n").unwrap();
        assert_eq!(cell(&data, 2, 0), Cell::Ground { recolor: Color::from_palette('g') });
    }

    #[test]
    fn digits_pair_up() {
        let data = parse_level_str("@ moves 1\nS1..\n...1\n").unwrap();
        assert_eq!(cell(&data, 1, 0), Cell::Teleport { destination: Coord::new(3, 1) });
        assert_eq!(cell(&data, 3, 1), Cell::Teleport { destination: Coord::new(1, 0) });
    }

    #[test]
    fn warp_line_overrides_pairing() {
        let data = parse_level_str("@ moves 2\n@ warp 4 0,1\nS.4\n...\n").unwrap();
        assert_eq!(cell(&data, 2, 0), Cell::Teleport { destination: Coord::new(0, 1) });
    }

    #[test]
    fn parse_errors() {
        assert_eq!(parse_level_str("S..\n"), Err(LevelError::MissingMoves));
        assert_eq!(parse_level_str("@ moves 1\n...\n"), Err(LevelError::NoStart));
        assert_eq!(parse_level_str("@ moves 1\nS.S\n"), Err(LevelError::MultipleStarts));
        assert_eq!(parse_level_str("@ moves 1\nS.1\n"), Err(LevelError::MissingWarp('1')));
        assert_eq!(
            parse_level_str("@ moves 1\nS.X\n"),
            Err(LevelError::UnknownTile { ch: 'X', at: Coord::new(2, 0) }),
        );
        assert_eq!(
            parse_level_str("@ moves lots\nS.\n"),
            Err(LevelError::BadMetadata("@ moves lots".to_string())),
        );
        assert_eq!(
            parse_level_str("@ warp 0 1,1\nS.\n"),
            Err(LevelError::BadMetadata("@ warp 0 1,1".to_string())),
        );
    }

    #[test]
    fn zero_moves_parse_but_do_not_validate() {
        let data = parse_level_str("@ moves 0\nS.\n").unwrap();
        assert_eq!(Grid::new(&data).unwrap_err(), LevelError::NoMoves);
    }

    // ── Packs ──

    #[test]
    fn pack_metadata_and_levels() {
        let pack = "\
## Starter Pack
## Author: someone
## Description: two small rooms
---
# One
@ moves 1
S.
---
# Broken
S.
---
# Two
@ moves 2
S..
";
        let (info, levels) = parse_pack(pack);
        assert_eq!(info.name, "Starter Pack");
        assert_eq!(info.author, "someone");
        assert_eq!(info.description, "two small rooms");
        let names: Vec<&str> = levels.iter().map(|l| l.name.as_str()).collect();
        assert_eq!(names, vec!["One", "Two"]);
    }

    #[test]
    fn pack_without_levels() {
        let (info, levels) = parse_pack("## Empty\n");
        assert_eq!(info.name, "Empty");
        assert!(levels.is_empty());
    }

    // ── Embedded levels ──

    #[test]
    fn embedded_levels_all_validate() {
        let levels = embedded_levels();
        assert_eq!(levels.len(), EMBEDDED.len());
        for data in &levels {
            assert!(Grid::new(data).is_ok(), "{}", data.name);
        }
    }

    /// Breadth-first search over cloned sessions; states are keyed on
    /// actor position, color and the paint layer.
    fn solvable(data: &LevelData) -> bool {
        let mut root = LevelSession::new(Timing::INSTANT, Color::rgb(255, 255, 255));
        root.load_level(data).unwrap();

        let key = |s: &LevelSession| {
            let grid = s.grid().unwrap();
            let tiles = s.tiles().unwrap();
            let actor = s.actor().unwrap();
            let paint: Vec<_> = grid.cells().map(|(c, _)| tiles.get(c).copied()).collect();
            (actor.at, actor.color, paint)
        };

        let mut seen = HashSet::new();
        seen.insert(key(&root));
        let mut queue = VecDeque::from([root]);

        while let Some(session) = queue.pop_front() {
            for dir in Direction::ALL {
                let mut next = session.clone();
                if !matches!(next.submit_move(dir), MoveOutcome::Accepted { .. }) {
                    continue;
                }
                match next.status() {
                    Status::Complete => return true,
                    Status::Playing => {
                        if seen.insert(key(&next)) {
                            queue.push_back(next);
                        }
                    }
                    _ => {}
                }
            }
        }
        false
    }

    #[test]
    fn embedded_levels_are_solvable() {
        for data in embedded_levels() {
            assert!(solvable(&data), "{} cannot be solved in {} moves", data.name, data.moves);
        }
    }

    #[test]
    fn tight_budget_is_not_solvable() {
        let mut data = embedded_levels().remove(0);
        assert!(solvable(&data));
        data.moves = 2;
        assert!(!solvable(&data));
    }
}
