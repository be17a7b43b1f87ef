/// Presentation layer: double-buffered, diff-based terminal renderer.
///
/// How it works:
///   1. Build the next frame into the `front` buffer (grid of Cell)
///   2. Compare each cell with the `back` buffer (previous frame)
///   3. Only emit terminal commands for cells that changed
///   4. All commands are batched with `queue!`, flushed once at the end
///   5. Swap front/back
///
/// Every tile is two terminal columns wide so rooms look square.

use std::io::{self, BufWriter, Write};

use crossterm::{
    cursor::{self, MoveTo},
    execute, queue,
    style::{Color, Print, ResetColor, SetBackgroundColor, SetForegroundColor},
    terminal::{self, Clear, ClearType},
};

use conmaze::domain::meta::Meta;
use conmaze::domain::tile::Tile;

use crate::app::{App, Phase, PromptFor};

// ── Cell: the unit of the back-buffer ──

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
struct Cell {
    ch: char,
    fg: Color,
    bg: Color,
}

impl Cell {
    /// Explicit background for every "empty" terminal cell, also used for
    /// `Clear`, so gaps between rows never show the terminal's own default.
    const BASE_BG: Color = Color::Black;

    const BLANK: Cell = Cell { ch: ' ', fg: Color::Grey, bg: Cell::BASE_BG };

    /// Sentinel used to invalidate the back buffer. Differs from any real
    /// cell, so every position will be diff'd.
    const INVALID: Cell = Cell { ch: '\0', fg: Color::Magenta, bg: Color::Magenta };

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

    /// Write a string at (x, y), one column per char. Returns the column
    /// after the last char written.
    fn put_str(&mut self, x: usize, y: usize, s: &str, fg: Color, bg: Color) -> usize {
        let mut cx = x;
        for ch in s.chars() {
            if cx >= self.width { break; }
            self.set(cx, y, Cell::new(ch, fg, bg));
            cx += 1;
        }
        cx
    }

    #[cfg(test)]
    fn row_text(&self, y: usize) -> String {
        (0..self.width).map(|x| self.get(x, y).ch).collect::<String>().trim_end().to_string()
    }
}

// ══════════════════════════════════════════════════════════════
// Tile appearance
// ══════════════════════════════════════════════════════════════

/// Terminal columns per tile.
const CELL_W: usize = 2;

/// Vertical offsets
const HUD_ROW: usize = 0;
const MAP_ROW: usize = 2;

const HINT: Color = Color::DarkGrey;
const BORDER: (Color, Color) = (Color::Grey, Color::DarkGrey);

/// Glyph pair and colours for one tile given its live metadata.
///
/// Opened doors, collected keys and the start tile leave residue; flagged
/// tiles show `??` whatever they are.
fn tile_style(tile: Tile, meta: Meta) -> ([char; 2], Color, Color) {
    let residue = (Color::DarkGrey, Color::Black);
    if meta.is_error() {
        return (['?', '?'], Color::Black, Color::Magenta);
    }
    let (glyph, (fg, bg)) = match tile {
        Tile::Void => ([' ', ' '], residue),
        Tile::Wall => (['#', '#'], BORDER),
        Tile::Door if meta.is_unlocked() => (['#', '#'], residue),
        Tile::Door => (['#', '#'], (Color::Cyan, Color::DarkCyan)),
        Tile::Key if meta.is_unlocked() => (['_', '_'], residue),
        Tile::Key => (['o', '+'], (Color::Cyan, Color::Black)),
        Tile::Goal => (['[', ']'], (Color::Yellow, Color::DarkYellow)),
        Tile::Passage => (['[', ']'], (Color::Yellow, Color::DarkGreen)),
        Tile::Start => (['[', ']'], residue),
        Tile::Text(c) => ([c, ' '], residue),
    };
    (glyph, fg, bg)
}

const PLAYER: ([char; 2], Color, Color) = (['<', '>'], Color::Red, Color::DarkRed);

const LOGO: [&str; 8] = [
    "   ######    #######   ####     ##       ####     ####     ##     ######## ########",
    "  ##////##  ##/////## /##/##   /##      /##/##   ##/##    ####   //////## /##///// ",
    " ##    //  ##     //##/##//##  /##      /##//## ## /##   ##//##       ##  /##      ",
    "/##       /##      /##/## //## /## #####/## //###  /##  ##  //##     ##   /####### ",
    "/##       /##      /##/##  //##/##///// /##  //#   /## ##########   ##    /##////  ",
    "//##    ##//##     ## /##   //####      /##   /    /##/##//////##  ##     /##      ",
    " //######  //#######  /##    //###      /##        /##/##     /## ########/########",
    "  //////    ///////   //      ///       //         // //      // //////// //////// ",
];

// ══════════════════════════════════════════════════════════════
// Renderer
// ══════════════════════════════════════════════════════════════

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

    pub fn render(&mut self, app: &App) -> io::Result<()> {
        let (tw, th) = terminal::size().unwrap_or((80, 24));
        if tw as usize != self.term_w || th as usize != self.term_h {
            self.term_w = tw as usize;
            self.term_h = th as usize;
            self.front.resize(self.term_w, self.term_h);
            self.back.resize(self.term_w, self.term_h);
            self.back.cells.fill(Cell::INVALID);
            queue!(self.writer, SetBackgroundColor(Cell::BASE_BG), Clear(ClearType::All))?;
        }

        // Phase change: clear for a clean transition
        if self.last_phase != Some(app.phase) {
            self.back.cells.fill(Cell::INVALID);
            queue!(self.writer, SetBackgroundColor(Cell::BASE_BG), Clear(ClearType::All))?;
            self.last_phase = Some(app.phase);
        }

        self.front.clear();
        compose(&mut self.front, app);
        self.flush_diff()?;
        std::mem::swap(&mut self.front, &mut self.back);
        Ok(())
    }

    // ── Diff flush: only write changed cells ──

    fn flush_diff(&mut self) -> io::Result<()> {
        let mut last_fg = Color::Grey;
        let mut last_bg = Cell::BASE_BG;
        let mut cursor_at: Option<(usize, usize)> = None;

        queue!(self.writer, SetForegroundColor(last_fg), SetBackgroundColor(last_bg))?;

        for y in 0..self.front.height {
            for x in 0..self.front.width {
                let cell = self.front.get(x, y);
                if cell == self.back.get(x, y) {
                    continue;
                }
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
}

// ══════════════════════════════════════════════════════════════
// Compose: build front buffer content
// ══════════════════════════════════════════════════════════════

fn compose(buf: &mut FrameBuffer, app: &App) {
    match app.phase {
        Phase::Playing | Phase::Victory | Phase::VictoryHold => {
            compose_game(buf, app);
        }
        Phase::NamePrompt(kind) => {
            let mut row = 0;
            if kind == PromptFor::Finished {
                row = compose_game(buf, app) + 1;
            }
            let end = buf.put_str(0, row, app.prompt_label(), Color::Grey, Color::Reset);
            let end = buf.put_str(end, row, &app.name_input, Color::White, Color::Reset);
            buf.set(end, row, Cell::new('_', Color::White, Color::Reset));
        }
        Phase::MainMenu => {
            for (i, line) in LOGO.iter().enumerate() {
                let (a, rest) = line.split_at(34.min(line.len()));
                let (b, c) = rest.split_at(6.min(rest.len()));
                let x = buf.put_str(0, i, a, Color::Cyan, Color::Reset);
                let x = buf.put_str(x, i, b, Color::White, Color::Reset);
                buf.put_str(x, i, c, Color::Blue, Color::Reset);
            }
            compose_menu(buf, app, LOGO.len() + 1);
        }
        _ => {
            compose_menu(buf, app, 0);
        }
    }
}

/// Framed menu: title bar, numbered options with the highlighted one
/// marked, then the key hints. Single-option menus (notes) are neither
/// numbered nor highlighted.
fn compose_menu(buf: &mut FrameBuffer, app: &App, top: usize) {
    let Some((title, padding)) = app.phase.menu_title() else { return };
    let options: &[String] = &app.options;
    let numbered = options.len() > 1;

    let title_w = title.chars().count() + 4 * (padding + 1);
    let longest = options.iter().map(|o| o.chars().count()).max().unwrap_or(0);
    let inner_w = longest + 6 + if numbered { 4 } else { 0 };
    let box_w = title_w.max(inner_w + 4);
    let right = box_w - CELL_W;

    // Title bar
    let mut x = 0;
    for _ in 0..padding {
        x = buf.put_str(x, top, "##", BORDER.0, BORDER.1);
    }
    x = buf.put_str(x, top, &format!("  {}  ", title), Color::DarkBlue, Color::DarkGrey);
    while x < box_w.min(buf.width) {
        x = buf.put_str(x, top, "#", BORDER.0, BORDER.1);
    }

    let side = |buf: &mut FrameBuffer, y: usize| {
        buf.put_str(0, y, "##", BORDER.0, BORDER.1);
        buf.put_str(right, y, "##", BORDER.0, BORDER.1);
    };

    side(buf, top + 1);
    for (i, opt) in options.iter().enumerate() {
        let y = top + 2 + i;
        side(buf, y);
        let hovered = numbered && i == app.cursor;
        let fg = if hovered { Color::DarkBlue } else { Color::Blue };
        let mut x = buf.put_str(CELL_W, y, if hovered { " > " } else { "   " }, fg, Color::Reset);
        if numbered {
            x = buf.put_str(x, y, &format!("{}. ", i + 1), fg, Color::Reset);
        }
        x = buf.put_str(x, y, opt, fg, Color::Reset);
        if hovered {
            buf.put_str(x, y, " < ", fg, Color::Reset);
        }
    }
    let last = top + 2 + options.len();
    side(buf, last);
    for x in (0..box_w).step_by(CELL_W) {
        buf.put_str(x, last + 1, "##", BORDER.0, BORDER.1);
    }

    let hints = ["Navigate with W/S or numbers", "Go back with Q or Esc", "Select with Space or Return"];
    for (i, h) in hints.iter().enumerate() {
        buf.put_str(0, last + 2 + i, h, HINT, Color::Reset);
    }
}

/// HUD, active room and the line under it. Returns the first free row.
fn compose_game(buf: &mut FrameBuffer, app: &App) -> usize {
    let Some(session) = app.session.as_ref() else { return 0 };
    let width = session.level().room_width;
    let player = session.player();
    let celebrating = matches!(app.phase, Phase::Victory | Phase::VictoryHold | Phase::NamePrompt(_));

    // ── HUD row ──
    let hud = if celebrating {
        format!("Moves made: {}", session.move_count())
    } else {
        format!(
            "Moves made: {}     Position: {:2}, {:2}, {:2}",
            session.move_count(), player.col, player.row, player.room
        )
    };
    buf.put_str(0, HUD_ROW, &hud, Color::Grey, Color::Reset);

    // ── Active room ──
    let tiles = session.room_tiles();
    let meta = session.room_meta();
    let revealed = &app.spiral[..app.spiral_shown.min(app.spiral.len())];
    for r in 0..width {
        for c in 0..width {
            let i = r * width + c;
            let (glyph, fg, bg) = if !celebrating && player.row == r && player.col == c {
                PLAYER
            } else if revealed.contains(&(r, c)) {
                tile_style(Tile::Goal, Meta::NoId)
            } else {
                tile_style(tiles[i], meta[i])
            };
            let x = c * CELL_W;
            buf.set(x, MAP_ROW + r, Cell::new(glyph[0], fg, bg));
            buf.set(x + 1, MAP_ROW + r, Cell::new(glyph[1], fg, bg));
        }
    }

    // ── Message and hint ──
    let mut row = MAP_ROW + width + 1;
    if celebrating {
        let msg = format!("Congratulations! You've escaped the maze in {} moves!", session.move_count());
        buf.put_str(0, row, &msg, Color::Yellow, Color::Reset);
        if app.phase == Phase::VictoryHold {
            row += 1;
            buf.put_str(0, row, "Press any key to continue.", HINT, Color::Reset);
        }
    } else {
        if !app.status.is_empty() {
            buf.put_str(0, row, &app.status, Color::Yellow, Color::Reset);
        }
        row += 1;
        buf.put_str(0, row, "Use WASD to move, Q to quit.", HINT, Color::Reset);
    }
    row + 1
}
