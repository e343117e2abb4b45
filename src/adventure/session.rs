use std::sync::{Arc, Mutex, MutexGuard};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::adventure::host::{HostError, HostSession, HOST_WARNING};
use crate::config::DisplayConfig;

/// Which of the two screens is showing.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum View {
    Menu,
    Adventure,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Speaker {
    Player,
    Narrator,
    /// Inline failure for a single turn.
    Error,
    /// Static notices (host warning).
    System,
    /// Rule drawn after a completed narration.
    Separator,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranscriptEntry {
    pub speaker: Speaker,
    pub text: String,
}

/// Labels used when a transcript entry is turned into a display line.
#[derive(Debug, Clone)]
pub struct TranscriptStyle {
    pub player_label: String,
    pub narrator_label: String,
    pub show_separators: bool,
}

impl Default for TranscriptStyle {
    fn default() -> Self {
        Self::from(&DisplayConfig::default())
    }
}

impl From<&DisplayConfig> for TranscriptStyle {
    fn from(display: &DisplayConfig) -> Self {
        Self {
            player_label: display.player_label.clone(),
            narrator_label: display.narrator_label.clone(),
            show_separators: display.show_separators,
        }
    }
}

impl TranscriptEntry {
    /// Single display line, e.g. `Ты: open the door` or `❌ network error: …`.
    pub fn line(&self, style: &TranscriptStyle) -> String {
        match self.speaker {
            Speaker::Player => format!("{}: {}", style.player_label, self.text),
            Speaker::Narrator => format!("{}: {}", style.narrator_label, self.text),
            Speaker::Error => format!("❌ {}", self.text),
            Speaker::System => self.text.clone(),
            Speaker::Separator => String::new(),
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SessionError {
    /// A request or its narration is still in flight.
    #[error("a turn is already in progress")]
    Busy,
    /// The host check failed at start; input stays disabled.
    #[error("input is disabled: host session data is missing")]
    Disabled,
}

/// # Display Session
///
/// Everything the two views show, owned in one place and handed to every handler:
///
/// - `view` - menu or adventure
/// - `transcript` - append-only list of speaker/text entries, lost on exit
/// - `busy` - true from request dispatch until the reply has been fully revealed
///   (or the turn failed); the send control is disabled meanwhile
///
/// Each mutation bumps `revision` so the UI loop can skip redraws when nothing changed.
///
/// ```rust
/// use lantern::adventure::session::{DisplaySession, TranscriptStyle, View};
///
/// let mut session = DisplaySession::new(TranscriptStyle::default());
/// assert_eq!(session.view(), View::Menu);
/// assert!(session.enter_adventure()); // first entry asks for the opening turn
/// session.begin_turn("").unwrap();
/// assert!(session.is_busy());
/// assert!(session.transcript().is_empty());
/// ```
#[derive(Debug, Clone)]
pub struct DisplaySession {
    view: View,
    transcript: Vec<TranscriptEntry>,
    busy: bool,
    awaiting_reply: bool,
    disabled: bool,
    opened: bool,
    input: String,
    scroll_back: usize,
    revision: u64,
    style: TranscriptStyle,
}

pub type SharedSession = Arc<Mutex<DisplaySession>>;

/// Lock a shared session, recovering the data if a previous holder panicked.
pub fn lock(session: &SharedSession) -> MutexGuard<'_, DisplaySession> {
    session.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl DisplaySession {
    pub fn new(style: TranscriptStyle) -> Self {
        Self {
            view: View::Menu,
            transcript: Vec::new(),
            busy: false,
            awaiting_reply: false,
            disabled: false,
            opened: false,
            input: String::new(),
            scroll_back: 0,
            revision: 0,
            style,
        }
    }

    /// Starting session for the interactive client. Without host session data the
    /// client opens on the adventure view showing [`HOST_WARNING`] with input disabled.
    pub fn for_host(style: TranscriptStyle, host: &Result<HostSession, HostError>) -> Self {
        let mut session = Self::new(style);
        if host.is_err() {
            session.disable_for_host(&HOST_WARNING);
            session.enter_adventure();
        }
        session
    }

    pub fn shared(self) -> SharedSession {
        Arc::new(Mutex::new(self))
    }

    pub fn view(&self) -> View {
        self.view
    }

    pub fn transcript(&self) -> &[TranscriptEntry] {
        &self.transcript
    }

    pub fn style(&self) -> &TranscriptStyle {
        &self.style
    }

    /// Transcript as display lines.
    pub fn lines(&self) -> Vec<String> {
        self.transcript.iter().map(|e| e.line(&self.style)).collect()
    }

    pub fn is_busy(&self) -> bool {
        self.busy
    }

    /// Busy and the backend has not answered yet.
    pub fn is_awaiting_reply(&self) -> bool {
        self.awaiting_reply
    }

    pub fn is_disabled(&self) -> bool {
        self.disabled
    }

    /// Whether the send control is enabled.
    pub fn can_send(&self) -> bool {
        !self.busy && !self.disabled
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn scroll_back(&self) -> usize {
        self.scroll_back
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    fn touch(&mut self) {
        self.revision = self.revision.wrapping_add(1);
    }

    /// Show the host warning and disable input for the rest of the session.
    pub fn disable_for_host(&mut self, notice: &[&str]) {
        for line in notice {
            self.transcript.push(TranscriptEntry {
                speaker: Speaker::System,
                text: line.to_string(),
            });
        }
        self.disabled = true;
        self.opened = true;
        self.touch();
    }

    pub fn show_menu(&mut self) {
        self.view = View::Menu;
        self.touch();
    }

    /// Switch to the adventure view. Returns true the first time, when the caller
    /// should send the opening turn.
    pub fn enter_adventure(&mut self) -> bool {
        self.view = View::Adventure;
        self.touch();
        if self.opened {
            false
        } else {
            self.opened = true;
            true
        }
    }

    /// Mark a request as dispatched. A non-empty `action` is echoed as a player line.
    pub fn begin_turn(&mut self, action: &str) -> Result<(), SessionError> {
        if self.disabled {
            return Err(SessionError::Disabled);
        }
        if self.busy {
            return Err(SessionError::Busy);
        }
        self.busy = true;
        self.awaiting_reply = true;
        if !action.is_empty() {
            self.transcript.push(TranscriptEntry {
                speaker: Speaker::Player,
                text: action.to_string(),
            });
        }
        self.scroll_back = 0;
        self.touch();
        Ok(())
    }

    /// Append an empty narrator entry for the typing renderer; returns its index.
    pub fn open_narration(&mut self) -> usize {
        self.awaiting_reply = false;
        self.transcript.push(TranscriptEntry {
            speaker: Speaker::Narrator,
            text: String::new(),
        });
        self.touch();
        self.transcript.len() - 1
    }

    pub fn clear_entry(&mut self, index: usize) {
        if let Some(entry) = self.transcript.get_mut(index) {
            entry.text.clear();
            self.touch();
        }
    }

    pub fn push_to_entry(&mut self, index: usize, ch: char) {
        if let Some(entry) = self.transcript.get_mut(index) {
            entry.text.push(ch);
            self.touch();
        }
    }

    pub fn scroll_to_bottom(&mut self) {
        if self.scroll_back != 0 {
            self.scroll_back = 0;
            self.touch();
        }
    }

    /// Narration fully revealed: release the send control.
    pub fn finish_turn(&mut self) {
        self.busy = false;
        if self.style.show_separators {
            self.transcript.push(TranscriptEntry {
                speaker: Speaker::Separator,
                text: String::new(),
            });
        }
        self.touch();
    }

    /// Turn failed: show the error inline and release the send control.
    pub fn fail_turn(&mut self, message: &str) {
        self.transcript.push(TranscriptEntry {
            speaker: Speaker::Error,
            text: message.to_string(),
        });
        self.busy = false;
        self.awaiting_reply = false;
        self.scroll_back = 0;
        self.touch();
    }

    pub fn push_input(&mut self, ch: char) {
        if self.disabled {
            return;
        }
        self.input.push(ch);
        self.touch();
    }

    pub fn pop_input(&mut self) {
        if self.input.pop().is_some() {
            self.touch();
        }
    }

    pub fn clear_input(&mut self) {
        if !self.input.is_empty() {
            self.input.clear();
            self.touch();
        }
    }

    /// Trimmed input ready to send, or None when there is nothing to send.
    pub fn pending_action(&self) -> Option<String> {
        let trimmed = self.input.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    }

    pub fn scroll_up(&mut self, lines: usize) {
        self.scroll_back = self.scroll_back.saturating_add(lines);
        self.touch();
    }

    pub fn scroll_down(&mut self, lines: usize) {
        self.scroll_back = self.scroll_back.saturating_sub(lines);
        self.touch();
    }

    /// Clamp the scroll offset to what the layout can show.
    pub fn clamp_scroll(&mut self, max: usize) {
        if self.scroll_back > max {
            self.scroll_back = max;
        }
    }
}
