//! Console output sink
//!
//! The enumerator only hands text plus a foreground color hint to a
//! [`ConsoleSink`]; how that is rendered is up to the sink.

use std::io;

/// Foreground color hint
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Color {
    /// Labels
    Green,
    /// Values
    White,
    /// Error labels
    Red,
}

/// Destination for formatted console text
pub trait ConsoleSink {
    /// Write `text`, rendered in `color` when given
    fn write(&mut self, text: &str, color: Option<Color>) -> io::Result<()>;

    /// Write `text` followed by a newline
    fn write_line(&mut self, text: &str, color: Option<Color>) -> io::Result<()> {
        self.write(text, color)?;
        self.write("\n", None)
    }
}

impl<T: ConsoleSink + ?Sized> ConsoleSink for &mut T {
    fn write(&mut self, text: &str, color: Option<Color>) -> io::Result<()> {
        (**self).write(text, color)
    }
}

/// Terminal sink backed by crossterm
#[cfg(feature = "cli")]
pub struct TerminalSink<W: io::Write> {
    out: W,
    color: bool,
}

#[cfg(feature = "cli")]
impl TerminalSink<io::Stdout> {
    /// Sink writing to standard output
    pub fn stdout(color: bool) -> Self {
        Self::new(io::stdout(), color)
    }
}

#[cfg(feature = "cli")]
impl TerminalSink<io::Stderr> {
    /// Sink writing to standard error
    pub fn stderr(color: bool) -> Self {
        Self::new(io::stderr(), color)
    }
}

#[cfg(feature = "cli")]
impl<W: io::Write> TerminalSink<W> {
    pub fn new(out: W, color: bool) -> Self {
        Self { out, color }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

#[cfg(feature = "cli")]
impl<W: io::Write> ConsoleSink for TerminalSink<W> {
    fn write(&mut self, text: &str, color: Option<Color>) -> io::Result<()> {
        use crossterm::style::{self, Print, ResetColor, SetForegroundColor};
        use crossterm::QueueableCommand;

        match color.filter(|_| self.color) {
            Some(color) => {
                let fg = match color {
                    Color::Green => style::Color::Green,
                    Color::White => style::Color::White,
                    Color::Red => style::Color::Red,
                };
                self.out
                    .queue(SetForegroundColor(fg))?
                    .queue(Print(text))?
                    .queue(ResetColor)?;
            }
            None => {
                self.out.queue(Print(text))?;
            }
        }

        self.out.flush()
    }
}
