//! Render sinks: where the formatted key combination ends up.

use crate::error::Result;
use crossterm::{
    cursor::{Hide, Show},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{
    Frame, Terminal,
    backend::CrosstermBackend,
    layout::{Alignment, Rect},
    style::{Color, Modifier, Style},
    widgets::Paragraph,
};
use std::io::{self, Stdout};

/// Something that can paint a combination string.
///
/// Sinks are called while the key-state lock is held, from whichever thread
/// mutated the set (usually the listener thread).
pub trait RenderSink: Send {
    /// Clear the display and show `text`.
    fn render(&mut self, text: &str) -> Result<()>;
}

/// Implement RenderSink for closures.
impl<F> RenderSink for F
where
    F: FnMut(&str) + Send,
{
    fn render(&mut self, text: &str) -> Result<()> {
        self(text);
        Ok(())
    }
}

/// Full-screen terminal display that shows one line centered both ways.
pub struct TerminalDisplay {
    terminal: Terminal<CrosstermBackend<Stdout>>,
    active: bool,
}

impl TerminalDisplay {
    /// Switch the terminal to raw mode on the alternate screen and clear it.
    pub fn new() -> Result<Self> {
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        if let Err(e) = execute!(stdout, EnterAlternateScreen, Hide) {
            let _ = disable_raw_mode();
            return Err(e.into());
        }

        let mut display = Self {
            terminal: Terminal::new(CrosstermBackend::new(stdout))?,
            active: true,
        };
        display.terminal.clear()?;
        Ok(display)
    }

    /// Give the terminal back to the shell. Safe to call more than once.
    pub fn restore(&mut self) -> Result<()> {
        if !self.active {
            return Ok(());
        }
        self.active = false;

        disable_raw_mode()?;
        execute!(io::stdout(), LeaveAlternateScreen, Show)?;
        Ok(())
    }
}

impl RenderSink for TerminalDisplay {
    fn render(&mut self, text: &str) -> Result<()> {
        if !self.active {
            return Ok(());
        }
        self.terminal.draw(|frame| draw_centered(frame, text))?;
        Ok(())
    }
}

impl Drop for TerminalDisplay {
    fn drop(&mut self) {
        let _ = self.restore();
    }
}

/// The single row that vertically centers one line of text in `area`.
///
/// Returns an empty rect when the area has no room at all.
pub fn centered_line(area: Rect) -> Rect {
    if area.width == 0 || area.height == 0 {
        return Rect::new(area.x, area.y, 0, 0);
    }
    Rect::new(area.x, area.y + area.height / 2, area.width, 1)
}

fn draw_centered(frame: &mut Frame, text: &str) {
    let line = centered_line(frame.area());
    if line.area() == 0 {
        return;
    }

    // Paragraph clips text wider than the terminal instead of failing.
    let paragraph = Paragraph::new(text)
        .style(
            Style::default()
                .fg(Color::White)
                .bg(Color::Black)
                .add_modifier(Modifier::BOLD),
        )
        .alignment(Alignment::Center);
    frame.render_widget(paragraph, line);
}
