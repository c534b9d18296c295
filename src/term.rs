use crate::round::{Bounds, Player, RoundState, Snapshot};
use crate::snake::Direction;
use crate::Coords;
use std::{io::{Stdout, Write, stdout}, time::Duration};

use crossterm::{cursor, execute, queue, style, terminal};
use crossterm::style::Color;
use crossterm::terminal::{ClearType, EnterAlternateScreen, LeaveAlternateScreen};
use crossterm::event::{Event, KeyEvent, read, poll};
use tracing::{debug, warn};

pub type TermInt = u16;
pub type ScreenPos = (TermInt, TermInt);

const SNAKE_BODY_CHAR: char = '█';
const SNAKE_STILL_HEAD_CHAR: char = '@';
const FOOD_CHAR: char = 'O';
const DEAD_SNAKE_CHAR: char = 'X';

/// Rows above the playable area: the status line and the top border.
const TOP_ROWS: TermInt = 2;

const BORDER_COLOR: Color = Color::DarkGrey;
const TEXT_COLOR: Color = Color::White;
const FOOD_COLOR: Color = Color::Red;

#[derive(Copy, Clone, Debug, PartialEq)]
struct Cell {
    ch: char,
    color: Color,
}

const BLANK: Cell = Cell { ch: ' ', color: Color::Reset };

pub struct TermManager {
    width: TermInt,
    height: TermInt,
    stdout: Stdout,
    screen: Vec<Cell>,
    current_msg: Option<Message>,
    active: bool,
}

struct Message {
    top_left: ScreenPos,
    width: TermInt,
    height: TermInt,
}

impl TermManager {
    pub fn new() -> crossterm::Result<Self> {
        let (width, height) = terminal::size()?;
        let stdout = stdout();
        let screen = vec![BLANK; width as usize * height as usize];
        Ok(TermManager { width, height, stdout, screen, current_msg: None, active: false })
    }

    pub fn setup(&mut self) -> crossterm::Result<()> {
        execute!(self.stdout, EnterAlternateScreen)?;
        self.active = true;
        terminal::enable_raw_mode()?;
        execute!(self.stdout, cursor::Hide, cursor::DisableBlinking)?;
        Ok(())
    }

    pub fn restore(&mut self) -> crossterm::Result<()> {
        if !self.active {
            return Ok(());
        }
        self.active = false;
        terminal::disable_raw_mode()?;
        execute!(
            self.stdout,
            style::ResetColor,
            cursor::Show,
            cursor::EnableBlinking,
            LeaveAlternateScreen
        )?;
        Ok(())
    }

    pub fn read_key_blocking(&mut self) -> crossterm::Result<KeyEvent> {
        loop {
            match read()? {
                Event::Key(ev) => return Ok(ev),
                Event::Resize(w, h) => self.resize(w, h)?,
                _ => {}
            }
        }
    }

    /// Drains whatever input is buffered without blocking past a short poll.
    pub fn read_key_events_queue(&mut self) -> crossterm::Result<Vec<KeyEvent>> {
        let mut events = vec![];

        while poll(Duration::from_millis(1))? {
            match read()? {
                Event::Key(ev) => events.push(ev),
                Event::Resize(w, h) => self.resize(w, h)?,
                _ => {}
            }
        }

        Ok(events)
    }

    /// Playable grid left after the status line and borders. May come out
    /// empty or negative on a tiny terminal.
    pub fn playable_bounds(&self) -> Bounds {
        Bounds::new(self.width as i32 - 2, self.height as i32 - TOP_ROWS as i32 - 1)
    }

    pub fn render(&mut self, snapshot: &Snapshot, debug: bool) -> crossterm::Result<()> {
        self.hide_message()?;
        let frame = self.compose(snapshot, debug);

        for (i, cell) in frame.iter().enumerate() {
            if *cell != self.screen[i] {
                let width = self.width as usize;
                let pos = ((i % width) as TermInt, (i / width) as TermInt);
                self.queue_cell(pos, *cell)?;
            }
        }

        self.screen = frame;
        self.flush()
    }

    pub fn show_message(&mut self, lines: &[&str]) -> crossterm::Result<()> {
        if self.has_message() {
            self.hide_message()?;
        }

        let msg_height = (lines.len() + 2) as TermInt;
        let msg_width = (lines.iter().map(|x| x.chars().count()).max().unwrap_or(0) + 2) as TermInt;
        let center = (self.width / 2, self.height / 2);
        let top_left = (
            center.0.saturating_sub(msg_width / 2),
            center.1.saturating_sub(msg_height / 2),
        );

        // Print the top and bottom empty lines
        for y in [top_left.1, top_left.1 + msg_height - 1] {
            for x_diff in 0..msg_width {
                self.queue_cell((top_left.0 + x_diff, y), Cell { ch: ' ', color: TEXT_COLOR })?;
            }
        }

        // Print the message lines
        for (i, line) in lines.iter().enumerate() {
            let padded_line = format!("{line: ^width$}", line = line, width = msg_width as usize);
            let y = top_left.1 + i as TermInt + 1;
            for (x_diff, ch) in padded_line.chars().enumerate() {
                let pos = (top_left.0 + x_diff as TermInt, y);
                self.queue_cell(pos, Cell { ch, color: TEXT_COLOR })?;
            }
        }

        self.current_msg = Some(Message::new(msg_width, msg_height, top_left));
        self.flush()
    }

    pub fn hide_message(&mut self) -> crossterm::Result<()> {
        let msg = match self.current_msg.take() {
            Some(msg) => msg,
            None => return Ok(()),
        };
        let top_left = msg.top_left();

        // Restore the content from the screen buffer
        for y_diff in 0..msg.height() {
            for x_diff in 0..msg.width() {
                let pos = (top_left.0 + x_diff, top_left.1 + y_diff);
                if let Some(i) = self.index(pos) {
                    self.queue_cell(pos, self.screen[i])?;
                }
            }
        }

        self.flush()
    }

    pub fn clear(&mut self) -> crossterm::Result<()> {
        execute!(self.stdout, style::ResetColor, terminal::Clear(ClearType::All))?;
        self.screen = vec![BLANK; self.width as usize * self.height as usize];
        self.current_msg = None;
        Ok(())
    }

    pub fn flush(&mut self) -> crossterm::Result<()> {
        self.stdout.flush()?;
        Ok(())
    }

    pub fn has_message(&self) -> bool {
        self.current_msg.is_some()
    }

    ///////////////////////////////////////////////////////////////////////////

    fn resize(&mut self, width: TermInt, height: TermInt) -> crossterm::Result<()> {
        debug!(width, height, "terminal resized");
        self.width = width;
        self.height = height;
        self.clear()
    }

    fn index(&self, (x, y): ScreenPos) -> Option<usize> {
        if x < self.width && y < self.height {
            Some(self.width as usize * y as usize + x as usize)
        } else {
            None
        }
    }

    fn queue_cell(&mut self, pos: ScreenPos, cell: Cell) -> crossterm::Result<()> {
        if self.index(pos).is_none() {
            return Ok(());
        }
        queue!(
            self.stdout,
            cursor::MoveTo(pos.0, pos.1),
            style::SetForegroundColor(cell.color),
            style::Print(cell.ch)
        )?;
        Ok(())
    }

    fn compose(&self, snapshot: &Snapshot, debug: bool) -> Vec<Cell> {
        let cells = vec![BLANK; self.screen.len()];
        let mut frame = Canvas { width: self.width, height: self.height, cells };
        if self.width < 2 || self.height < TOP_ROWS + 1 {
            return frame.cells;
        }

        frame.draw_borders();
        frame.put_text((0, 0), &status_line(snapshot), TEXT_COLOR);

        if let Some(food) = snapshot.food {
            frame.put_game(food, Cell { ch: FOOD_CHAR, color: FOOD_COLOR });
        }

        let dead = snapshot.state == RoundState::GameOver;
        for view in &snapshot.snakes {
            let color = player_color(view.player);
            // Tail first so the head is drawn on top of any overlap
            for (i, pos) in view.body.iter().enumerate().rev() {
                let ch = match (dead, i) {
                    (true, _) => DEAD_SNAKE_CHAR,
                    (false, 0) => head_char(view.direction),
                    _ => SNAKE_BODY_CHAR,
                };
                frame.put_game(*pos, Cell { ch, color });
            }
        }

        if debug {
            for (i, line) in debug_lines(snapshot).iter().enumerate() {
                frame.put_text((1, TOP_ROWS + i as TermInt), line, Color::Yellow);
            }
        }

        frame.cells
    }
}

impl Drop for TermManager {
    fn drop(&mut self) {
        if let Err(err) = self.restore() {
            warn!(?err, "failed to restore terminal");
        }
    }
}

impl Message {
    pub fn new(width: TermInt, height: TermInt, top_left: ScreenPos) -> Self {
        Message { width, height, top_left }
    }

    pub fn width(&self) -> TermInt {
        self.width
    }

    pub fn height(&self) -> TermInt {
        self.height
    }

    pub fn top_left(&self) -> ScreenPos {
        self.top_left
    }
}

struct Canvas {
    width: TermInt,
    height: TermInt,
    cells: Vec<Cell>,
}

impl Canvas {
    fn put(&mut self, (x, y): ScreenPos, cell: Cell) {
        if x < self.width && y < self.height {
            self.cells[self.width as usize * y as usize + x as usize] = cell;
        }
    }

    fn put_game(&mut self, (x, y): Coords, cell: Cell) {
        // Anything left of or above the grid has no screen cell
        if x < 0 || y < 0 {
            return;
        }
        let (sx, sy) = (x + 1, y + TOP_ROWS as i32);
        if sx < self.width as i32 - 1 && sy < self.height as i32 - 1 {
            self.put((sx as TermInt, sy as TermInt), cell);
        }
    }

    fn put_text(&mut self, (x, y): ScreenPos, text: &str, color: Color) {
        for (i, ch) in text.chars().enumerate() {
            self.put((x + i as TermInt, y), Cell { ch, color });
        }
    }

    fn draw_borders(&mut self) {
        let (top, bottom) = (TOP_ROWS - 1, self.height - 1);
        let end_x = self.width - 1;

        for x in 0..self.width {
            let ch = if x == 0 || x == end_x {'+'} else {'-'};
            self.put((x, top), Cell { ch, color: BORDER_COLOR });
            self.put((x, bottom), Cell { ch, color: BORDER_COLOR });
        }

        for y in TOP_ROWS..bottom {
            self.put((0, y), Cell { ch: '|', color: BORDER_COLOR });
            self.put((end_x, y), Cell { ch: '|', color: BORDER_COLOR });
        }
    }
}

fn player_color(player: Player) -> Color {
    match player {
        Player::One => Color::Green,
        Player::Two => Color::Cyan,
    }
}

fn head_char(direction: Option<Direction>) -> char {
    match direction {
        Some(Direction::Up) => '^',
        Some(Direction::Down) => 'v',
        Some(Direction::Left) => '<',
        Some(Direction::Right) => '>',
        None => SNAKE_STILL_HEAD_CHAR,
    }
}

fn status_line(snapshot: &Snapshot) -> String {
    let scores: Vec<String> = snapshot
        .snakes
        .iter()
        .map(|view| format!("P{}: {}", view.player.number(), view.score))
        .collect();

    format!(
        " {}   Goal: {}   Speed: {}ms",
        scores.join("  "),
        snapshot.win_score,
        snapshot.interval.as_millis()
    )
}

fn debug_lines(snapshot: &Snapshot) -> Vec<String> {
    let mut lines = vec![
        format!("tick: {}", snapshot.tick),
        format!("bounds: {}x{}", snapshot.bounds.width, snapshot.bounds.height),
        format!("interval: {:?}", snapshot.interval),
        format!("food: {:?}", snapshot.food),
    ];

    for view in &snapshot.snakes {
        lines.push(format!(
            "P{} head: {:?} dir: {:?} len: {}",
            view.player.number(),
            view.body.first(),
            view.direction,
            view.body.len()
        ));
    }

    lines
}
