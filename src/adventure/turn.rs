//! One send/receive cycle: dispatch the action, then either reveal the narrative
//! or render the failure inline.

use std::sync::Arc;
use std::time::Duration;

use log::{debug, info, warn};

use super::api::{StoryBackend, TurnError};
use super::host::HostSession;
use super::session::{lock, SessionError, SharedSession};
use super::typing::{RevealHandle, RevealTarget, Typewriter};
use crate::logutil::escape_log;

/// The narrator entry a reveal writes into.
pub struct NarrationTarget {
    session: SharedSession,
    entry: usize,
}

impl NarrationTarget {
    pub fn new(session: SharedSession, entry: usize) -> Self {
        Self { session, entry }
    }
}

impl RevealTarget for NarrationTarget {
    fn clear(&mut self) {
        lock(&self.session).clear_entry(self.entry);
    }

    fn push_char(&mut self, ch: char) {
        lock(&self.session).push_to_entry(self.entry, ch);
    }

    fn scroll_to_bottom(&mut self) {
        lock(&self.session).scroll_to_bottom();
    }
}

/// How a dispatched turn ended up.
#[derive(Debug)]
pub enum TurnReport {
    /// The reply is being revealed; the session is released when the handle completes.
    Narrating(RevealHandle),
    /// The error is already in the transcript and the session is released.
    Failed(TurnError),
}

/// Drives turns against a backend. Cheap to clone; clones share the session and
/// the animation token counter.
#[derive(Clone)]
pub struct TurnController {
    backend: Arc<dyn StoryBackend>,
    host: Option<HostSession>,
    session: SharedSession,
    typewriter: Typewriter,
    interval: Duration,
}

impl TurnController {
    pub fn new(
        backend: Arc<dyn StoryBackend>,
        host: Option<HostSession>,
        session: SharedSession,
        interval: Duration,
    ) -> Self {
        Self {
            backend,
            host,
            session,
            typewriter: Typewriter::new(),
            interval,
        }
    }

    pub fn session(&self) -> &SharedSession {
        &self.session
    }

    pub fn typewriter(&self) -> &Typewriter {
        &self.typewriter
    }

    /// Send `action` (empty for the opening narrative) and start revealing the reply.
    ///
    /// Returns `Err` without contacting the backend when the session is disabled or
    /// already busy.
    pub async fn play_turn(&self, action: &str) -> Result<TurnReport, SessionError> {
        let Some(host) = self.host.as_ref() else {
            return Err(SessionError::Disabled);
        };
        lock(&self.session).begin_turn(action)?;
        debug!("Turn dispatched: action=\"{}\"", escape_log(action));

        match self.backend.step(host.init_data(), action).await {
            Ok(text) => {
                info!(
                    "Narrative received ({} chars) for action=\"{}\"",
                    text.chars().count(),
                    escape_log(action)
                );
                let entry = {
                    let mut s = lock(&self.session);
                    if !action.is_empty() {
                        s.clear_input();
                    }
                    s.open_narration()
                };
                let target = Arc::new(std::sync::Mutex::new(NarrationTarget::new(
                    Arc::clone(&self.session),
                    entry,
                )));
                let session = Arc::clone(&self.session);
                let handle = self.typewriter.reveal(target, text, self.interval, move || {
                    lock(&session).finish_turn();
                });
                Ok(TurnReport::Narrating(handle))
            }
            Err(e) => {
                warn!("Turn failed for action=\"{}\": {}", escape_log(action), e);
                lock(&self.session).fail_turn(&e.to_string());
                Ok(TurnReport::Failed(e))
            }
        }
    }

    /// Send the current input line, if there is anything to send.
    pub async fn submit_input(&self) -> Option<Result<TurnReport, SessionError>> {
        let action = lock(&self.session).pending_action()?;
        Some(self.play_turn(&action).await)
    }
}
