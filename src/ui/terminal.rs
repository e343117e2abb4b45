//! TerminalScreen: flushes a composed [`Screen`] to the real terminal.
//!
//! Every draw is a full redraw; the UI loop only draws when the session revision or
//! the viewport changed, which keeps typing-animation frames cheap enough.

use std::io::{self, Write};

use anyhow::Result;
use crossterm::{
    cursor,
    style::{Attribute, Color, Print, ResetColor, SetAttribute, SetForegroundColor},
    terminal, QueueableCommand,
};

use super::view::{clip, Screen, Tone};

pub struct TerminalScreen {
    stdout: io::Stdout,
    buf: Vec<u8>,
    active: bool,
}

impl Default for TerminalScreen {
    fn default() -> Self {
        Self::new()
    }
}

impl TerminalScreen {
    pub fn new() -> Self {
        Self {
            stdout: io::stdout(),
            buf: Vec::with_capacity(16 * 1024),
            active: false,
        }
    }

    pub fn enter(&mut self) -> Result<()> {
        terminal::enable_raw_mode()?;
        self.buf.clear();
        self.buf.queue(terminal::EnterAlternateScreen)?;
        self.buf.queue(terminal::DisableLineWrap)?;
        self.flush_buf()?;
        self.active = true;
        Ok(())
    }

    pub fn exit(&mut self) -> Result<()> {
        if !self.active {
            return Ok(());
        }
        self.buf.clear();
        self.buf.queue(ResetColor)?;
        self.buf.queue(SetAttribute(Attribute::Reset))?;
        self.buf.queue(terminal::EnableLineWrap)?;
        self.buf.queue(cursor::Show)?;
        self.buf.queue(terminal::LeaveAlternateScreen)?;
        self.flush_buf()?;
        terminal::disable_raw_mode()?;
        self.active = false;
        Ok(())
    }

    pub fn draw(&mut self, screen: &Screen, width: u16) -> Result<()> {
        self.buf.clear();
        encode_screen_into(screen, width, &mut self.buf)?;
        self.flush_buf()
    }

    fn flush_buf(&mut self) -> Result<()> {
        self.stdout.write_all(&self.buf)?;
        self.stdout.flush()?;
        Ok(())
    }
}

impl Drop for TerminalScreen {
    fn drop(&mut self) {
        // Always try to restore terminal state.
        let _ = self.exit();
    }
}

/// Encode a full redraw of `screen` into `out` without touching stdout.
pub fn encode_screen_into(screen: &Screen, width: u16, out: &mut Vec<u8>) -> Result<()> {
    out.queue(cursor::Hide)?;
    out.queue(terminal::Clear(terminal::ClearType::All))?;

    let mut current: Option<Tone> = None;
    for (y, line) in screen.lines.iter().enumerate() {
        if line.text.is_empty() {
            continue;
        }
        out.queue(cursor::MoveTo(0, y as u16))?;
        if current != Some(line.tone) {
            apply_tone_into(out, line.tone)?;
            current = Some(line.tone);
        }
        out.queue(Print(clip(&line.text, width as usize)))?;
    }

    out.queue(ResetColor)?;
    out.queue(SetAttribute(Attribute::Reset))?;
    if let Some((x, y)) = screen.cursor {
        out.queue(cursor::MoveTo(x, y))?;
        out.queue(cursor::Show)?;
    }
    Ok(())
}

fn apply_tone_into(out: &mut Vec<u8>, tone: Tone) -> Result<()> {
    out.queue(SetAttribute(Attribute::Reset))?;
    out.queue(SetForegroundColor(tone_color(tone)))?;
    match tone {
        Tone::Title | Tone::Player => {
            out.queue(SetAttribute(Attribute::Bold))?;
        }
        Tone::Muted => {
            out.queue(SetAttribute(Attribute::Dim))?;
        }
        _ => {}
    }
    Ok(())
}

fn tone_color(tone: Tone) -> Color {
    match tone {
        Tone::Title => Color::Rgb {
            r: 0xc9,
            g: 0xa8,
            b: 0xff,
        },
        Tone::Text | Tone::Input => Color::Rgb {
            r: 0xe8,
            g: 0xe3,
            b: 0xf5,
        },
        Tone::Player => Color::Rgb {
            r: 0x9a,
            g: 0xd0,
            b: 0xff,
        },
        Tone::Narrator => Color::Rgb {
            r: 0xf0,
            g: 0xd9,
            b: 0xa0,
        },
        Tone::Error => Color::Rgb {
            r: 0xff,
            g: 0x6b,
            b: 0x6b,
        },
        Tone::Notice => Color::Rgb {
            r: 0xff,
            g: 0xc1,
            b: 0x4d,
        },
        Tone::Muted => Color::Rgb {
            r: 0x7a,
            g: 0x6a,
            b: 0x9a,
        },
    }
}
