//! Screen composition: maps a `DisplaySession` into styled terminal lines.
//!
//! This module is pure (no I/O) so layouts can be unit-tested.

use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use crate::adventure::{DisplaySession, Speaker, View};

pub const MENU_TITLE: &str = "🌟 Добро пожаловать в «Мир Теней и Огня»!";
pub const MENU_GREETING: [&str; 3] = [
    "Здесь каждый шаг — выбор. Каждое слово — заклинание.",
    "Мир живёт и дышит... и ждёт тебя.",
    "Готов? Нажми — и ступай в неизведанное.",
];
pub const START_LABEL: &str = "⚔️ Начать приключение";
pub const CONTINUE_LABEL: &str = "⚔️ Продолжить приключение";
pub const QUIT_LABEL: &str = "Выход";

/// Rows reserved under the transcript: status line and input line.
const FOOTER_ROWS: usize = 2;

/// Terminal viewport dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    pub width: u16,
    pub height: u16,
}

impl Viewport {
    pub fn new(width: u16, height: u16) -> Self {
        Self { width, height }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tone {
    Title,
    Text,
    Player,
    Narrator,
    Error,
    Notice,
    Muted,
    Input,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScreenLine {
    pub text: String,
    pub tone: Tone,
}

impl ScreenLine {
    fn new(text: impl Into<String>, tone: Tone) -> Self {
        Self {
            text: text.into(),
            tone,
        }
    }

    fn blank() -> Self {
        Self::new(String::new(), Tone::Text)
    }
}

/// A composed frame: one entry per terminal row plus the input cursor, if shown.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Screen {
    pub lines: Vec<ScreenLine>,
    pub cursor: Option<(u16, u16)>,
    /// Largest useful scroll-back offset for this layout.
    pub max_scroll: usize,
}

impl Screen {
    pub fn text(&self) -> Vec<&str> {
        self.lines.iter().map(|l| l.text.as_str()).collect()
    }
}

/// Strings that come from config or the host rather than the session.
#[derive(Debug, Clone, Default)]
pub struct ScreenText {
    pub thinking_label: String,
    pub player_name: Option<String>,
}

fn char_width(ch: char) -> usize {
    ch.width().unwrap_or(0)
}

/// Greedy word wrap on display columns. Words wider than `width` are split.
pub fn wrap(text: &str, width: usize) -> Vec<String> {
    let width = width.max(1);
    let mut out = Vec::new();
    for paragraph in text.split('\n') {
        let mut line = String::new();
        let mut cols = 0usize;
        for word in paragraph.split(' ') {
            if cols > 0 && cols + 1 + word.width() > width {
                out.push(std::mem::take(&mut line));
                cols = 0;
            }
            if cols > 0 {
                line.push(' ');
                cols += 1;
            }
            for ch in word.chars() {
                let w = char_width(ch);
                if cols > 0 && cols + w > width {
                    out.push(std::mem::take(&mut line));
                    cols = 0;
                }
                line.push(ch);
                cols += w;
            }
        }
        out.push(line);
    }
    out
}

/// Longest prefix of `text` fitting in `width` columns.
pub fn clip(text: &str, width: usize) -> &str {
    let mut cols = 0;
    for (i, ch) in text.char_indices() {
        cols += char_width(ch);
        if cols > width {
            return &text[..i];
        }
    }
    text
}

/// Longest suffix of `text` fitting in `width` columns.
fn tail(text: &str, width: usize) -> &str {
    let mut cols = 0;
    for (i, ch) in text.char_indices().rev() {
        cols += char_width(ch);
        if cols > width {
            return &text[i + ch.len_utf8()..];
        }
    }
    text
}

fn tone_for(speaker: Speaker) -> Tone {
    match speaker {
        Speaker::Player => Tone::Player,
        Speaker::Narrator => Tone::Narrator,
        Speaker::Error => Tone::Error,
        Speaker::System => Tone::Notice,
        Speaker::Separator => Tone::Muted,
    }
}

fn transcript_lines(session: &DisplaySession, width: usize) -> Vec<ScreenLine> {
    let mut out = Vec::new();
    for entry in session.transcript() {
        let tone = tone_for(entry.speaker);
        if entry.speaker == Speaker::Separator {
            out.push(ScreenLine::new("─".repeat(width.max(1)), tone));
            continue;
        }
        for row in wrap(&entry.line(session.style()), width) {
            out.push(ScreenLine::new(row, tone));
        }
    }
    out
}

/// Compose the frame for the session's current view.
pub fn compose(session: &DisplaySession, vp: Viewport, text: &ScreenText) -> Screen {
    match session.view() {
        View::Menu => compose_menu(session, vp, text),
        View::Adventure => compose_adventure(session, vp, text),
    }
}

fn compose_menu(session: &DisplaySession, vp: Viewport, text: &ScreenText) -> Screen {
    let width = vp.width as usize;
    let mut lines = vec![ScreenLine::blank()];
    for row in wrap(MENU_TITLE, width) {
        lines.push(ScreenLine::new(row, Tone::Title));
    }
    lines.push(ScreenLine::blank());
    for greeting in MENU_GREETING {
        for row in wrap(greeting, width) {
            lines.push(ScreenLine::new(row, Tone::Text));
        }
    }
    lines.push(ScreenLine::blank());
    if let Some(name) = &text.player_name {
        lines.push(ScreenLine::new(format!("Игрок: {}", name), Tone::Muted));
        lines.push(ScreenLine::blank());
    }
    let start = if session.transcript().is_empty() {
        START_LABEL
    } else {
        CONTINUE_LABEL
    };
    lines.push(ScreenLine::new(format!("[Enter] {}", start), Tone::Input));
    lines.push(ScreenLine::new(format!("[q] {}", QUIT_LABEL), Tone::Muted));

    lines.truncate(vp.height as usize);
    Screen {
        lines,
        cursor: None,
        max_scroll: 0,
    }
}

fn compose_adventure(session: &DisplaySession, vp: Viewport, text: &ScreenText) -> Screen {
    let width = (vp.width as usize).max(1);
    let height = vp.height as usize;
    let area = height.saturating_sub(FOOTER_ROWS);

    let body = transcript_lines(session, width);
    let max_scroll = body.len().saturating_sub(area);
    let scroll = session.scroll_back().min(max_scroll);
    let end = body.len() - scroll;
    let start = end.saturating_sub(area);

    let mut lines: Vec<ScreenLine> = body[start..end].to_vec();
    while lines.len() < area {
        lines.push(ScreenLine::blank());
    }

    let status = if session.is_disabled() {
        ScreenLine::new("Ввод отключён", Tone::Notice)
    } else if session.is_awaiting_reply() {
        ScreenLine::new(text.thinking_label.clone(), Tone::Muted)
    } else if session.is_busy() {
        ScreenLine::new("…", Tone::Muted)
    } else if scroll > 0 {
        ScreenLine::new(format!("↑ {} (PgDn — вниз)", scroll), Tone::Muted)
    } else {
        ScreenLine::new("Enter — отправить · Esc — меню", Tone::Muted)
    };

    let prompt = "> ";
    let room = width.saturating_sub(prompt.len() + 1);
    let visible = tail(session.input(), room);
    let input_line = if session.is_disabled() {
        ScreenLine::new("✖ ввод недоступен", Tone::Muted)
    } else {
        let tone = if session.can_send() {
            Tone::Input
        } else {
            Tone::Muted
        };
        ScreenLine::new(format!("{}{}", prompt, visible), tone)
    };

    let mut cursor = None;
    if height >= FOOTER_ROWS {
        lines.push(status);
        lines.push(input_line);
        if session.can_send() {
            cursor = Some(((prompt.len() + visible.width()) as u16, (height - 1) as u16));
        }
    }
    lines.truncate(height);

    Screen {
        lines,
        cursor,
        max_scroll,
    }
}
