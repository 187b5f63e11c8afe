use crate::client::session::{Message, Sender};
use colored::Colorize;
use std::io::{self, Write};
use uuid::Uuid;

/// Streams transcript updates to a terminal.
///
/// Messages only ever grow, so for the message currently being drawn only
/// the newly appended suffix is written.
pub struct ConsoleRenderer<W: Write> {
    writer: W,
    show_user: bool,
    current: Option<Uuid>,
    printed: usize,
}

impl<W: Write> ConsoleRenderer<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            show_user: true,
            current: None,
            printed: 0,
        }
    }

    /// Skips echoing user messages, for when the terminal already shows them.
    pub fn hide_user(mut self) -> Self {
        self.show_user = false;
        self
    }

    pub fn render(&mut self, message: &Message) -> io::Result<()> {
        if message.sender == Sender::User && !self.show_user {
            return Ok(());
        }

        if self.current != Some(message.id) {
            self.close_line()?;
            self.write_header(message)?;
            self.current = Some(message.id);
            self.printed = 0;
        }

        if let Some(suffix) = message.text.get(self.printed..) {
            write!(self.writer, "{suffix}")?;
            self.printed = message.text.len();
        }

        if !message.streaming {
            self.close_line()?;
        }
        self.writer.flush()
    }

    pub fn into_inner(self) -> W {
        self.writer
    }

    fn write_header(&mut self, message: &Message) -> io::Result<()> {
        let time = message.timestamp.format("%H:%M").to_string();
        let label = match message.sender {
            Sender::User => "You".bold().cyan(),
            Sender::Bot => "Neko".bold().magenta(),
        };
        write!(self.writer, "{} {label}: ", format!("[{time}]").as_str().dimmed())
    }

    fn close_line(&mut self) -> io::Result<()> {
        if self.current.take().is_some() {
            writeln!(self.writer)?;
        }
        self.printed = 0;
        Ok(())
    }
}
