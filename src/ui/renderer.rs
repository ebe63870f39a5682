/// Presentation layer: double-buffered, diff-based terminal renderer.
///
/// How it works:
///   1. Build the next frame into `front` buffer (array of Cell)
///   2. Compare each cell with `back` buffer (previous frame)
///   3. Only emit terminal commands for cells that changed
///   4. All commands are batched with `queue!`, flushed once at the end
///   5. Swap front/back
///
/// Reads the session through its accessors only; never mutates it.

use std::io::{self, BufWriter, Write};

use crossterm::{
    cursor::{self, MoveTo},
    execute, queue,
    style::{Color, Print, ResetColor, SetBackgroundColor, SetForegroundColor},
    terminal::{self, Clear, ClearType},
};

use crate::config::ColorConfig;
use crate::domain::actor::Motion;
use crate::domain::cell::Cell as MapCell;
use crate::domain::color::Color as Paint;
use crate::domain::direction::Direction;
use crate::sim::game::{GameState, Phase};

// ── Cell: the unit of the back-buffer ──

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
struct Cell {
    ch: char,
    fg: Color,
    bg: Color,
}

impl Cell {
    /// Explicit background for all "empty" terminal cells, so the gaps
    /// between rows match the cells on VTE terminals.
    const BASE_BG: Color = Color::Rgb { r: 18, g: 20, b: 28 };

    const BLANK: Cell = Cell { ch: ' ', fg: Color::White, bg: Cell::BASE_BG };

    /// Sentinel cell used to invalidate the back buffer.
    const INVALID: Cell = Cell { ch: '?', fg: Color::Magenta, bg: Color::Magenta };

    fn new(ch: char, fg: Color, bg: Color) -> Self {
        let bg = match bg {
            Color::Reset => Self::BASE_BG,
            other => other,
        };
        Cell { ch, fg, bg }
    }
}

// ── FrameBuffer: a 2D grid of Cells ──

struct FrameBuffer {
    width: usize,
    height: usize,
    cells: Vec<Cell>,
}

impl FrameBuffer {
    fn new(w: usize, h: usize) -> Self {
        FrameBuffer { width: w, height: h, cells: vec![Cell::BLANK; w * h] }
    }

    fn resize(&mut self, w: usize, h: usize) {
        if self.width != w || self.height != h {
            self.width = w;
            self.height = h;
            self.cells = vec![Cell::BLANK; w * h];
        }
    }

    fn clear(&mut self) {
        self.cells.fill(Cell::BLANK);
    }

    fn set(&mut self, x: usize, y: usize, cell: Cell) {
        if x < self.width && y < self.height {
            self.cells[y * self.width + x] = cell;
        }
    }

    fn get(&self, x: usize, y: usize) -> Cell {
        if x < self.width && y < self.height {
            self.cells[y * self.width + x]
        } else {
            Cell::BLANK
        }
    }

    fn put_str(&mut self, x: usize, y: usize, s: &str, fg: Color, bg: Color) {
        for (i, ch) in s.chars().enumerate() {
            if x + i >= self.width { break; }
            self.set(x + i, y, Cell::new(ch, fg, bg));
        }
    }

    /// `put_str` centered horizontally.
    fn put_centered(&mut self, y: usize, s: &str, fg: Color, bg: Color) {
        let x = self.width.saturating_sub(s.chars().count()) / 2;
        self.put_str(x, y, s, fg, bg);
    }

    fn fill_row(&mut self, y: usize, bg: Color) {
        for x in 0..self.width {
            self.set(x, y, Cell::new(' ', Color::White, bg));
        }
    }
}

// ── Renderer ──

/// Each grid cell is two terminal columns wide so cells look square.
const CELL_W: usize = 2;

/// Vertical offsets
const HUD_ROW: usize = 0;
const MAP_ROW: usize = 2;

const HUD_BG: Color = Color::Rgb { r: 30, g: 34, b: 64 };
const MSG_BG: Color = Color::Rgb { r: 200, g: 180, b: 50 };
const ACCENT: Color = Color::Rgb { r: 255, g: 200, b: 50 };
const GOOD: Color = Color::Rgb { r: 80, g: 230, b: 120 };
const BAD: Color = Color::Rgb { r: 255, g: 80, b: 80 };
const TELEPORT_FG: Color = Color::Rgb { r: 120, g: 220, b: 255 };

pub struct Renderer {
    writer: BufWriter<io::Stdout>,
    front: FrameBuffer,
    back: FrameBuffer,
    term_w: usize,
    term_h: usize,
    last_phase: Option<Phase>,
    colors: ColorConfig,
}

impl Renderer {
    pub fn new(colors: ColorConfig) -> Self {
        Renderer {
            writer: BufWriter::with_capacity(16384, io::stdout()),
            front: FrameBuffer::new(0, 0),
            back: FrameBuffer::new(0, 0),
            term_w: 0,
            term_h: 0,
            last_phase: None,
            colors,
        }
    }

    pub fn init(&mut self) -> io::Result<()> {
        terminal::enable_raw_mode()?;
        execute!(
            self.writer,
            terminal::EnterAlternateScreen,
            cursor::Hide,
            SetBackgroundColor(Cell::BASE_BG),
            Clear(ClearType::All)
        )?;

        let (tw, th) = terminal::size().unwrap_or((80, 24));
        self.term_w = tw as usize;
        self.term_h = th as usize;
        self.front.resize(self.term_w, self.term_h);
        self.back.resize(self.term_w, self.term_h);
        // Force full repaint on first frame.
        self.back.cells.fill(Cell::INVALID);

        Ok(())
    }

    pub fn cleanup(&mut self) -> io::Result<()> {
        execute!(
            self.writer,
            ResetColor,
            cursor::Show,
            terminal::LeaveAlternateScreen
        )?;
        terminal::disable_raw_mode()
    }

    pub fn render(&mut self, game: &GameState) -> io::Result<()> {
        let (tw, th) = terminal::size().unwrap_or((80, 24));
        if tw as usize != self.term_w || th as usize != self.term_h {
            self.term_w = tw as usize;
            self.term_h = th as usize;
            self.front.resize(self.term_w, self.term_h);
            self.back.resize(self.term_w, self.term_h);
            self.back.cells.fill(Cell::INVALID);
            queue!(self.writer, SetBackgroundColor(Cell::BASE_BG), Clear(ClearType::All))?;
        }

        if self.last_phase != Some(game.phase) {
            self.back.cells.fill(Cell::INVALID);
            queue!(self.writer, SetBackgroundColor(Cell::BASE_BG), Clear(ClearType::All))?;
            self.last_phase = Some(game.phase);
        }

        self.compose(game);
        self.flush_diff()?;

        // Swap: current front becomes next back
        std::mem::swap(&mut self.front, &mut self.back);

        Ok(())
    }

    fn compose(&mut self, game: &GameState) {
        self.front.clear();
        match game.phase {
            Phase::Title => self.compose_title(game),
            Phase::Playing => self.compose_game(game),
            Phase::LevelComplete => {
                self.compose_game(game);
                self.compose_level_clear(game);
            }
            Phase::GameOver => {
                self.compose_game(game);
                self.compose_game_over(game);
            }
            Phase::GameComplete => self.compose_game_complete(game),
        }
    }

    // ── Diff flush: only write changed cells ──

    fn flush_diff(&mut self) -> io::Result<()> {
        let mut last_fg = Color::White;
        let mut last_bg = Cell::BASE_BG;
        let mut need_move = true;
        let mut last_x: usize = 0;
        let mut last_y: usize = 0;

        // Explicit base colors; ResetColor would fall back to the terminal default.
        queue!(self.writer,
            SetForegroundColor(Color::White),
            SetBackgroundColor(Cell::BASE_BG),
        )?;

        for y in 0..self.front.height {
            for x in 0..self.front.width {
                let cell = self.front.get(x, y);
                if cell == self.back.get(x, y) {
                    need_move = true;
                    continue;
                }

                if need_move || x != last_x + 1 || y != last_y {
                    queue!(self.writer, MoveTo(x as u16, y as u16))?;
                    need_move = false;
                }
                if cell.fg != last_fg {
                    queue!(self.writer, SetForegroundColor(cell.fg))?;
                    last_fg = cell.fg;
                }
                if cell.bg != last_bg {
                    queue!(self.writer, SetBackgroundColor(cell.bg))?;
                    last_bg = cell.bg;
                }

                queue!(self.writer, Print(cell.ch))?;
                last_x = x;
                last_y = y;
            }
        }

        self.writer.flush()
    }

    // ── Compose: build front buffer content ──

    fn compose_game(&mut self, game: &GameState) {
        let session = &game.session;
        let (Some(grid), Some(tiles), Some(actor)) = (session.grid(), session.tiles(), session.actor()) else {
            return;
        };

        // ── HUD row ──
        let left = session.moves_left();
        let total = session.moves_total();
        let gauge: String = (0..total.min(20))
            .map(|i| if i < left { '■' } else { '·' })
            .collect();
        let painted = tiles.painted_count() * 100 / tiles.ground_count().max(1);
        let hud = format!(
            " {}/{}  {}   Moves {:>2}/{:<2} {}   Painted {:>3}% ",
            game.current_level + 1, game.levels.len(), game.level_name(),
            left, total, gauge, painted,
        );
        self.front.fill_row(HUD_ROW, HUD_BG);
        self.front.put_str(0, HUD_ROW, &hud, Color::White, HUD_BG);

        // ── Map (centered) ──
        let map_cols = grid.width() * CELL_W;
        let origin_x = self.front.width.saturating_sub(map_cols) / 2;
        let unpainted = term_color(self.colors.unpainted);
        let wall = term_color(self.colors.wall);

        for (at, cell) in grid.cells() {
            let col = origin_x + at.x as usize * CELL_W;
            let row = MAP_ROW + at.y as usize;
            let (glyph, fg, bg) = match cell {
                MapCell::Wall => ([' ', ' '], Color::White, wall),
                MapCell::Ground { recolor } => {
                    let bg = tiles
                        .get(at)
                        .and_then(|t| t.paint)
                        .map_or(unpainted, term_color);
                    match recolor {
                        Some(color) => (['◆', ' '], term_color(color), bg),
                        None => ([' ', ' '], Color::White, bg),
                    }
                }
                MapCell::Teleport { .. } => (['(', ')'], TELEPORT_FG, Cell::BASE_BG),
            };
            self.front.set(col, row, Cell::new(glyph[0], fg, bg));
            self.front.set(col + 1, row, Cell::new(glyph[1], fg, bg));
        }

        // ── Path still ahead of a rolling ball ──
        if let Motion::Moving(roll) = actor.motion() {
            for &at in roll.remaining() {
                let col = origin_x + at.x as usize * CELL_W + 1;
                let row = MAP_ROW + at.y as usize;
                let bg = self.front.get(col, row).bg;
                self.front.set(col, row, Cell::new('·', term_color(actor.color), bg));
            }
        }

        // ── Actor ──
        let col = origin_x + actor.at.x as usize * CELL_W;
        let row = MAP_ROW + actor.at.y as usize;
        let under = self.front.get(col, row).bg;
        let trail = match actor.motion() {
            Motion::Moving(_) => facing_glyph(actor.facing),
            Motion::Teleporting { .. } => '*',
            Motion::Idle | Motion::Braking { .. } => ' ',
        };
        let ball = term_color(actor.color);
        self.front.set(col, row, Cell::new('●', ball, under));
        self.front.set(col + 1, row, Cell::new(trail, ball, under));

        // ── Message bar ──
        let msg_row = MAP_ROW + grid.height() + 1;
        if !game.message.is_empty() {
            self.front.fill_row(msg_row, MSG_BG);
            self.front.put_str(0, msg_row, &format!(" ◈ {} ", game.message), Color::Black, MSG_BG);
        }

        // ── Help bar ──
        let help = " ←→↑↓ / WASD: Roll   R: Restart   ESC: Title";
        self.front.put_str(0, msg_row + 2, help, Color::DarkGrey, Color::Reset);
    }

    fn compose_title(&mut self, game: &GameState) {
        let title = [
            r"  ___       _ _   ___      _      _   ",
            r" | _ \ ___ | | | / __| _ __| |__ _| |_ ",
            r" |   // _ \| | | \__ \| '_ \ / _` |  _|",
            r" |_|_\\___/|_|_| |___/| .__/_\__,_|\__|",
            r"                      |_|              ",
        ];
        for (i, line) in title.iter().enumerate() {
            self.front.put_centered(2 + i, line, ACCENT, Color::Reset);
        }

        let actor = term_color(self.colors.actor);
        self.front.put_centered(8, "Roll the ball. Paint every tile.", actor, Color::Reset);

        let blink = (game.anim_tick / 15) % 2 == 0;
        if blink {
            self.front.put_centered(11, "▸ ENTER  Start", GOOD, Color::Reset);
        }
        self.front.put_centered(12, "  ESC    Quit ", Color::White, Color::Reset);

        let pack = format!("{}  ({} levels)", game.pack.name, game.levels.len());
        self.front.put_centered(14, &pack, Color::DarkGrey, Color::Reset);
        if !game.pack.author.is_empty() {
            self.front.put_centered(15, &format!("by {}", game.pack.author), Color::DarkGrey, Color::Reset);
        }

        let help = [
            "Controls",
            "←→↑↓ / WASD   Roll until something stops you",
            "R             Restart level",
            "ESC           Back to title",
        ];
        for (i, line) in help.iter().enumerate() {
            let color = if i == 0 { ACCENT } else { Color::White };
            self.front.put_str(8, 18 + i, line, color, Color::Reset);
        }
    }

    /// Dark box over the middle of the map with a few lines of text.
    fn compose_overlay(&mut self, lines: &[(&str, Color)]) {
        let box_w = lines.iter().map(|(l, _)| l.chars().count()).max().unwrap_or(0) + 6;
        let box_h = lines.len() + 2;
        let box_x = self.front.width.saturating_sub(box_w) / 2;
        let box_y = MAP_ROW + 1;
        let dim = Color::Rgb { r: 40, g: 40, b: 48 };

        for y in box_y..box_y + box_h {
            for x in box_x..box_x + box_w {
                self.front.set(x, y, Cell::new(' ', Color::White, dim));
            }
        }
        for (i, (line, color)) in lines.iter().enumerate() {
            self.front.put_str(box_x + 3, box_y + 1 + i, line, *color, dim);
        }
    }

    fn compose_level_clear(&mut self, game: &GameState) {
        let spare = format!("{} moves to spare", game.session.moves_left());
        let next = if game.is_last_level() { "ENTER: Finish" } else { "ENTER: Next level" };
        self.compose_overlay(&[
            ("★ LEVEL CLEAR ★", ACCENT),
            (spare.as_str(), Color::White),
            ("", Color::White),
            (next, GOOD),
            ("R: Replay   ESC: Title", Color::DarkGrey),
        ]);
    }

    fn compose_game_over(&mut self, game: &GameState) {
        let painted = game.session.tiles().map_or(0, |t| t.painted_count());
        let total = game.session.tiles().map_or(0, |t| t.ground_count());
        let progress = format!("{painted} of {total} tiles painted");
        self.compose_overlay(&[
            ("✕ OUT OF MOVES ✕", BAD),
            (progress.as_str(), Color::White),
            ("", Color::White),
            ("ENTER / R: Retry", GOOD),
            ("ESC: Title", Color::DarkGrey),
        ]);
    }

    fn compose_game_complete(&mut self, game: &GameState) {
        let box_art = [
            "╔══════════════════════════════╗",
            "║   ★ EVERY TILE PAINTED! ★    ║",
            "╚══════════════════════════════╝",
        ];
        for (i, l) in box_art.iter().enumerate() {
            self.front.put_centered(4 + i, l, ACCENT, Color::Reset);
        }
        let levels = format!("◈ All {} levels of {} cleared", game.levels.len(), game.pack.name);
        self.front.put_centered(9, &levels, GOOD, Color::Reset);
        self.front.put_centered(11, "▸ ENTER / ESC: Back to Title", Color::White, Color::Reset);
    }
}

fn term_color(c: Paint) -> Color {
    Color::Rgb { r: c.r, g: c.g, b: c.b }
}

fn facing_glyph(dir: Direction) -> char {
    match dir {
        Direction::Up => '↑',
        Direction::Down => '↓',
        Direction::Left => '←',
        Direction::Right => '→',
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GameConfig;
    use crate::domain::actor::Timing;
    use crate::sim::level::{self, parse_level_str, LevelSet, PackInfo};

    fn renderer_for(text: &str) -> (Renderer, GameState) {
        let config = GameConfig { timing: Timing::INSTANT, ..GameConfig::default() };
        let set = LevelSet {
            info: PackInfo { name: "Test".into(), ..PackInfo::default() },
            levels: vec![parse_level_str(text).unwrap()],
        };
        let mut game = GameState::new(&config, set);
        level::load_level(&mut game, 0);
        let mut r = Renderer::new(config.colors);
        r.front.resize(60, 20);
        (r, game)
    }

    fn row_text(r: &Renderer, y: usize) -> String {
        (0..r.front.width).map(|x| r.front.get(x, y).ch).collect()
    }

    #[test]
    fn hud_shows_level_and_moves() {
        let (mut r, game) = renderer_for("# Hall\n@ moves 3\nS..\n");
        r.compose(&game);
        let hud = row_text(&r, HUD_ROW);
        assert!(hud.contains("1/1  Hall"), "{hud}");
        assert!(hud.contains("Moves  3/3"), "{hud}");
        assert!(hud.contains("Painted   0%"), "{hud}");
    }

    #[test]
    fn actor_drawn_on_start_and_paint_shows() {
        let (mut r, mut game) = renderer_for("# Hall\n@ moves 3\nS..\n...\n");
        r.compose(&game);
        let origin = (60 - 3 * CELL_W) / 2;
        assert_eq!(r.front.get(origin, MAP_ROW).ch, '●');

        game.session.submit_move(Direction::Right);
        r.compose(&game);
        let actor_col = origin + 2 * CELL_W;
        assert_eq!(r.front.get(actor_col, MAP_ROW).ch, '●');
        let painted_bg = term_color(game.session.actor().unwrap().color);
        assert_eq!(r.front.get(origin, MAP_ROW).bg, painted_bg);
        assert_eq!(r.front.get(origin, MAP_ROW + 1).bg, term_color(r.colors.unpainted));
    }

    #[test]
    fn rolling_ball_marks_the_path_ahead() {
        let mut config = GameConfig::default();
        config.timing.roll_cell = std::time::Duration::from_millis(50);
        let set = LevelSet {
            info: PackInfo::default(),
            levels: vec![parse_level_str("# Hall\n@ moves 3\nS...\n").unwrap()],
        };
        let mut game = GameState::new(&config, set);
        level::load_level(&mut game, 0);
        let mut r = Renderer::new(config.colors);
        r.front.resize(60, 20);

        game.session.submit_move(Direction::Right);
        r.compose(&game);
        let origin = (60 - 4 * CELL_W) / 2;
        assert_eq!(r.front.get(origin, MAP_ROW).ch, '●');
        for x in 1..4 {
            assert_eq!(r.front.get(origin + x * CELL_W + 1, MAP_ROW).ch, '·');
        }
    }

    #[test]
    fn title_lists_the_pack() {
        let (mut r, mut game) = renderer_for("# Hall\n@ moves 3\nS..\n");
        game.phase = Phase::Title;
        r.compose(&game);
        let found = (0..r.front.height).any(|y| row_text(&r, y).contains("Test  (1 levels)"));
        assert!(found);
    }
}
