/// Presentation layer: double-buffered, diff-based terminal renderer.
///
/// How it works:
///   1. Build the next frame into `front` buffer (array of Cell)
///   2. Compare each cell with `back` buffer (previous frame)
///   3. Only emit terminal commands for cells that changed
///   4. All commands are batched with `queue!`, flushed once at the end
///   5. Swap front/back
///
/// ## Layout
///
///   row 0        HUD: score, life icons, time bar
///   row 2..      lanes, top row of the view first
///   below        message bar, help line
///
/// One world unit of x is `COLS_PER_UNIT` terminal columns; x = 0 is
/// the centre of the board.

use std::io::{self, BufWriter, Write};

use crossterm::{
    cursor::{self, MoveTo},
    execute, queue,
    style::{Color, Print, ResetColor, SetBackgroundColor, SetForegroundColor},
    terminal::{self, Clear, ClearType},
};

use crate::domain::lane::{RowClassifier, RowKind};
use crate::domain::player::LifeState;
use crate::domain::rules::MoveDir;
use crate::domain::vehicle::VehicleKind;
use crate::sim::world::{Phase, WorldState};

use super::hud::Hud;

// ── Cell: the unit of the back-buffer ──

#[derive(Clone, Copy, PartialEq, Eq)]
struct Cell {
    ch: char,
    fg: Color,
    bg: Color,
}

impl Cell {
    /// Explicit dark background for every "empty" terminal cell, so the
    /// gaps between rows match the cells on VTE terminals.
    const BASE_BG: Color = Color::Rgb { r: 22, g: 22, b: 35 };

    const BLANK: Cell = Cell { ch: ' ', fg: Color::White, bg: Cell::BASE_BG };

    /// Sentinel used to invalidate the back buffer.
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

    fn fill_row(&mut self, y: usize, bg: Color) {
        for x in 0..self.width {
            self.set(x, y, Cell::new(' ', Color::White, bg));
        }
    }
}

// ── Renderer ──

const COLS_PER_UNIT: f32 = 4.0;

const HUD_ROW: usize = 0;
const MAP_ROW: usize = 2;

const HUD_BG: Color = Color::Rgb { r: 20, g: 20, b: 60 };
const MSG_BG: Color = Color::Rgb { r: 200, g: 180, b: 50 };
const ACCENT: Color = Color::Rgb { r: 80, g: 255, b: 80 };

pub struct Renderer {
    writer: BufWriter<io::Stdout>,
    front: FrameBuffer,
    back: FrameBuffer,
    term_w: usize,
    term_h: usize,
    last_phase: Option<Phase>,
}

impl Renderer {
    pub fn new() -> Self {
        Renderer {
            writer: BufWriter::with_capacity(16384, io::stdout()),
            front: FrameBuffer::new(0, 0),
            back: FrameBuffer::new(0, 0),
            term_w: 0,
            term_h: 0,
            last_phase: None,
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

    pub fn render(&mut self, world: &mut WorldState, hud: &Hud) -> io::Result<()> {
        let (tw, th) = terminal::size().unwrap_or((80, 24));
        if tw as usize != self.term_w || th as usize != self.term_h {
            self.term_w = tw as usize;
            self.term_h = th as usize;
            self.front.resize(self.term_w, self.term_h);
            self.back.resize(self.term_w, self.term_h);
            self.back.cells.fill(Cell::INVALID);
            queue!(self.writer, SetBackgroundColor(Cell::BASE_BG), Clear(ClearType::All))?;
        }

        // HUD + gap + message + help
        let reserved_rows = MAP_ROW + 4;
        let row_count = world.board.lanes.len();
        world.camera.view_rows = self.term_h.saturating_sub(reserved_rows).max(1).min(row_count);

        if self.last_phase != Some(world.phase) {
            self.back.cells.fill(Cell::INVALID);
            queue!(self.writer, SetBackgroundColor(Cell::BASE_BG), Clear(ClearType::All))?;
            self.last_phase = Some(world.phase);
        }

        if world.phase == Phase::Playing {
            let target = world.player.y.round() as i32;
            world.camera.follow(target, row_count);
        }

        self.front.clear();
        match world.phase {
            Phase::Title => self.compose_title(world),
            Phase::Playing => self.compose_game(world, hud),
            Phase::Victory | Phase::GameOver => {
                self.compose_game(world, hud);
                self.compose_result(world, hud);
            }
        }
        if world.paused {
            self.compose_pause_overlay(world);
        }

        self.flush_diff()?;
        std::mem::swap(&mut self.front, &mut self.back);
        Ok(())
    }

    // ── Diff flush: only write changed cells ──

    fn flush_diff(&mut self) -> io::Result<()> {
        let mut last_fg = Color::White;
        let mut last_bg = Cell::BASE_BG;
        let mut cursor_at: Option<(usize, usize)> = None;

        // Explicit base colors; ResetColor would fall back to the terminal default.
        queue!(self.writer,
            SetForegroundColor(Color::White),
            SetBackgroundColor(Cell::BASE_BG),
        )?;

        for y in 0..self.front.height {
            for x in 0..self.front.width {
                let cell = self.front.get(x, y);
                if cell == self.back.get(x, y) { continue; }

                if cursor_at != Some((x, y)) {
                    queue!(self.writer, MoveTo(x as u16, y as u16))?;
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
                cursor_at = Some((x + 1, y));
            }
        }

        self.writer.flush()
    }

    // ── Compose: build front buffer content ──

    fn compose_game(&mut self, w: &WorldState, hud: &Hud) {
        let board_cols = board_columns(w.board.width);
        self.compose_hud(hud, board_cols);

        let cam = &w.camera;
        for row in cam.bottom..cam.bottom + cam.view_rows as i32 {
            let Some(line) = cam.row_to_view(row) else { continue };
            let y = MAP_ROW + line;
            if y >= self.front.height { break; }
            self.compose_lane(w, row, y, board_cols);
        }

        let msg_row = MAP_ROW + cam.view_rows + 1;
        if msg_row < self.front.height && !w.message.is_empty() {
            self.front.fill_row(msg_row, MSG_BG);
            self.front.put_str(0, msg_row, &format!(" {} ", w.message), Color::Black, MSG_BG);
        }

        let help_row = MAP_ROW + cam.view_rows + 3;
        if help_row < self.front.height {
            let help = " ←→↑↓ / WASD / HJKL: Hop   P: Pause   ESC: Title";
            self.front.put_str(0, help_row, help, Color::DarkGrey, Color::Reset);
        }
    }

    fn compose_hud(&mut self, hud: &Hud, board_cols: usize) {
        self.front.fill_row(HUD_ROW, HUD_BG);
        let score = format!(" Score:{:<7} ", hud.score);
        self.front.put_str(0, HUD_ROW, &score, Color::White, HUD_BG);

        let mut x = score.chars().count();
        for &on in &hud.life_icons {
            let (ch, fg) = if on { ('♥', Color::Rgb { r: 255, g: 80, b: 80 }) } else { ('·', Color::DarkGrey) };
            self.front.set(x, HUD_ROW, Cell::new(ch, fg, HUD_BG));
            x += 1;
        }

        // Time bar fills whatever is left of the board width.
        let bar_x = x + 2;
        let bar_w = board_cols.saturating_sub(bar_x).max(10);
        let filled = (hud.time_ratio * bar_w as f32).round() as usize;
        let fg = if hud.time_ratio < 0.25 { Color::Red } else { ACCENT };
        for i in 0..bar_w {
            let ch = if i < filled { '█' } else { '░' };
            self.front.set(bar_x + i, HUD_ROW, Cell::new(ch, fg, HUD_BG));
        }
    }

    fn compose_lane(&mut self, w: &WorldState, row: i32, y: usize, board_cols: usize) {
        let kind = w.board.kind_of(row).unwrap_or(RowKind::Unknown);
        let (bg, texture) = lane_style(kind);
        for x in 0..board_cols {
            let ch = if texture != ' ' && x % 6 == (row as usize * 3) % 6 { texture } else { ' ' };
            self.front.set(x, y, Cell::new(ch, Color::Rgb { r: 90, g: 90, b: 110 }, bg));
        }

        for v in w.board.vehicles.iter().filter(|v| v.row == row) {
            let (ch, fg, vbg) = match v.kind {
                VehicleKind::Car => ('▆', Color::Rgb { r: 255, g: 200, b: 50 }, bg),
                VehicleKind::Log => ('═', Color::Rgb { r: 230, g: 200, b: 160 }, Color::Rgb { r: 110, g: 70, b: 30 }),
                VehicleKind::PredatorHead => ('▼', Color::Rgb { r: 255, g: 255, b: 255 }, Color::Rgb { r: 30, g: 120, b: 40 }),
            };
            let Some((from, to)) = columns_spanned(v.left(), v.right(), w.board.width, board_cols) else { continue };
            for x in from..to {
                self.front.set(x, y, Cell::new(ch, fg, vbg));
            }
        }

        let p = &w.player;
        if p.y.round() as i32 == row {
            if let Some(x) = column_of(p.x, w.board.width, board_cols) {
                let ch = match p.facing {
                    MoveDir::Up => '▲',
                    MoveDir::Down => '▼',
                    MoveDir::Left => '◀',
                    MoveDir::Right => '▶',
                };
                let under = self.front.get(x, y).bg;
                let fg = match p.state() {
                    LifeState::Respawning | LifeState::Idle => Color::DarkGrey,
                    _ if p.is_moving() => Color::White,
                    _ => ACCENT,
                };
                self.front.set(x, y, Cell::new(ch, fg, under));
            }
        }
    }

    fn compose_title(&mut self, w: &WorldState) {
        let title = [
            r"  _  _                              ",
            r" | || | ___  _ __  _ __  ___  _ _  ",
            r" | __ |/ _ \| '_ \| '_ \/ -_)| '_| ",
            r" |_||_|\___/| .__/| .__/\___||_|   ",
            r"            |_|   |_|              ",
        ];
        for (i, line) in title.iter().enumerate() {
            self.front.put_str(2, 2 + i, line, Color::Rgb { r: 255, g: 200, b: 50 }, Color::Reset);
        }

        let lanes = format!("{} rows to cross", w.board.lanes.total_rows());
        self.front.put_str(8, 8, &lanes, Color::DarkGrey, Color::Reset);

        // Lane preview strip, start row at the bottom.
        let strip_x = 44;
        let strip_bottom = 8 + w.board.lanes.len();
        for (row, kind) in w.board.lanes.iter() {
            let (bg, texture) = lane_style(kind);
            let y = strip_bottom - row as usize;
            for x in strip_x..strip_x + 6 {
                self.front.set(x, y, Cell::new(texture, Color::Rgb { r: 90, g: 90, b: 110 }, bg));
            }
        }

        self.front.put_str(8, 10, "ENTER   Start", ACCENT, Color::Reset);
        self.front.put_str(8, 11, "  Q     Quit", Color::White, Color::Reset);

        let help = [
            "Controls",
            "  ←→↑↓ / WASD / HJKL   Hop",
            "  P                    Pause",
            "  ESC                  Title",
            "",
            "Ride the logs, dodge the cars,",
            "mind the jaws in the river.",
        ];
        for (i, line) in help.iter().enumerate() {
            let color = if i == 0 { Color::Rgb { r: 255, g: 200, b: 50 } } else { Color::White };
            self.front.put_str(8, 13 + i, line, color, Color::Reset);
        }
    }

    fn compose_result(&mut self, w: &WorldState, hud: &Hud) {
        let (headline, color) = match w.phase {
            Phase::Victory => ("  ★  SAFE ACROSS!  ★  ", Color::Rgb { r: 255, g: 220, b: 50 }),
            _ => ("  ✕  OUT OF LIVES  ✕  ", Color::Rgb { r: 255, g: 60, b: 60 }),
        };
        let box_bg = Color::Rgb { r: 40, g: 40, b: 40 };
        let top = MAP_ROW + 1;
        for y in top..top + 5 {
            for x in 2..30 {
                self.front.set(x, y, Cell::new(' ', Color::White, box_bg));
            }
        }
        self.front.put_str(4, top + 1, headline, color, box_bg);
        self.front.put_str(4, top + 2, &format!("Final Score: {}", hud.score), Color::White, box_bg);
        self.front.put_str(4, top + 3, "ENTER: Again  ESC: Title", ACCENT, box_bg);
    }

    fn compose_pause_overlay(&mut self, w: &WorldState) {
        let dim = Color::Rgb { r: 40, g: 40, b: 40 };
        let y = MAP_ROW + w.camera.view_rows / 2;
        for x in 2..26 {
            self.front.set(x, y, Cell::new(' ', Color::White, dim));
        }
        self.front.put_str(3, y, "  ▶  PAUSED  ◀  (P)", Color::Rgb { r: 255, g: 220, b: 50 }, dim);
    }
}

// ── Geometry ──

fn board_columns(world_width: f32) -> usize {
    (world_width * COLS_PER_UNIT).round() as usize
}

/// Terminal column for world x, or `None` when it falls off the board.
fn column_of(x: f32, world_width: f32, board_cols: usize) -> Option<usize> {
    let col = ((x + world_width / 2.0) * COLS_PER_UNIT).floor();
    if col < 0.0 || col as usize >= board_cols {
        None
    } else {
        Some(col as usize)
    }
}

/// Half-open column range covered by `[left, right]`, clipped to the board.
fn columns_spanned(left: f32, right: f32, world_width: f32, board_cols: usize) -> Option<(usize, usize)> {
    let from = ((left + world_width / 2.0) * COLS_PER_UNIT).floor().max(0.0);
    let to = ((right + world_width / 2.0) * COLS_PER_UNIT).ceil().min(board_cols as f32);
    if to <= from {
        None
    } else {
        Some((from as usize, to as usize))
    }
}

fn lane_style(kind: RowKind) -> (Color, char) {
    match kind {
        RowKind::Road => (Color::Rgb { r: 45, g: 45, b: 50 }, '-'),
        RowKind::Water => (Color::Rgb { r: 20, g: 60, b: 140 }, '~'),
        RowKind::Safe => (Color::Rgb { r: 30, g: 90, b: 40 }, ' '),
        RowKind::Finish => (Color::Rgb { r: 120, g: 100, b: 20 }, '*'),
        RowKind::Unknown => (Color::Rgb { r: 90, g: 20, b: 90 }, '?'),
    }
}
