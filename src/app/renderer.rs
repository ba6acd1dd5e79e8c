use std::io::{Stdout, Write};

use crossterm::{
    QueueableCommand, cursor, queue,
    style::{self, Attribute, Color, Stylize},
    terminal::{self, ClearType},
};
use unicode_truncate::UnicodeTruncateStr;

use crate::{
    app::canvas::{Canvas, GridCell},
    generators::{GenerationEvent, Generator},
};

/// Lines below the maze reserved for the status and the key hints
const STATUS_LINES: u16 = 2;

const CONTROLS_HINT: &str = "r: regenerate  Esc: exit";

pub struct Renderer {
    /// Standard output handle to write to the terminal
    stdout: Stdout,
    canvas: Canvas,
    generator: Generator,
    /// Whether the maze fit the terminal at the last full draw
    visible: bool,
    /// Last status line, redrawn with the canvas
    status: String,
}

impl Renderer {
    pub fn new(generator: Generator, maze_width: u16, maze_height: u16) -> Self {
        Self {
            stdout: std::io::stdout(),
            canvas: Canvas::new(generator, maze_width, maze_height),
            generator,
            visible: false,
            status: String::new(),
        }
    }

    /// Check if terminal size is sufficient for the canvas and the status lines
    fn fits(&self) -> std::io::Result<bool> {
        let (term_width, term_height) = terminal::size()?;
        Ok(term_width >= self.canvas.width() * GridCell::CELL_WIDTH
            && term_height >= self.canvas.height() + STATUS_LINES)
    }

    /// Clear the screen and draw every tile of the canvas.
    /// Returns Ok(false) and shows a resize message instead if the terminal is too small;
    /// events keep updating the canvas but are not drawn until the next successful call.
    pub fn draw_all(&mut self) -> std::io::Result<bool> {
        queue!(
            self.stdout,
            terminal::Clear(ClearType::All),
            cursor::MoveTo(0, 0)
        )?;
        self.visible = self.fits()?;
        // Everything is redrawn below, pending changes are stale
        self.canvas.take_changes();

        if !self.visible {
            let msg = format!(
                "Terminal size is too small to display a {}x{} canvas. Please resize the terminal.\r\n",
                self.canvas.width() * GridCell::CELL_WIDTH,
                self.canvas.height() + STATUS_LINES,
            );
            queue!(
                self.stdout,
                style::PrintStyledContent(msg.with(Color::Yellow).attribute(Attribute::Bold)),
                style::PrintStyledContent(
                    "Press Esc to exit...\r\n"
                        .with(Color::Blue)
                        .attribute(Attribute::Bold)
                )
            )?;
            self.stdout.flush()?;
            return Ok(false);
        }

        for (y, row) in self.canvas.rows().enumerate() {
            self.stdout.queue(cursor::MoveTo(0, y as u16))?;
            for cell in row {
                self.stdout.queue(style::Print(cell))?;
            }
        }
        self.print_status()?;
        Ok(true)
    }

    /// Apply one generation event to the canvas and draw the tiles it changed.
    pub fn render_event(&mut self, event: &GenerationEvent) -> std::io::Result<()> {
        self.canvas.apply(self.generator, event);
        let changes = self.canvas.take_changes();
        if !self.visible {
            return Ok(());
        }
        for ((x, y), cell) in changes {
            queue!(
                self.stdout,
                cursor::MoveTo(x * GridCell::CELL_WIDTH, y),
                style::Print(cell)
            )?;
        }
        self.stdout.flush()
    }

    pub fn status(&self) -> &str {
        &self.status
    }

    /// Set the status line and print it with the key hints below the maze.
    /// The status is kept while the terminal is too small and shown on the next full draw.
    pub fn draw_status(&mut self, status: &str) -> std::io::Result<()> {
        self.status.clear();
        self.status.push_str(status);
        if !self.visible {
            return Ok(());
        }
        self.print_status()
    }

    fn print_status(&mut self) -> std::io::Result<()> {
        let (term_width, _) = terminal::size()?;
        let row = self.canvas.height();
        let (status, _) = self.status.unicode_truncate(term_width as usize);
        let (hint, _) = CONTROLS_HINT.unicode_truncate(term_width as usize);
        queue!(
            self.stdout,
            cursor::MoveTo(0, row),
            terminal::Clear(ClearType::CurrentLine),
            style::PrintStyledContent(status.with(Color::Yellow).attribute(Attribute::Bold)),
            cursor::MoveTo(0, row + 1),
            terminal::Clear(ClearType::CurrentLine),
            style::PrintStyledContent(hint.with(Color::Blue)),
        )?;
        self.stdout.flush()
    }
}
