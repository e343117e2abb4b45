//! # Adventure Core Module
//!
//! Everything between a key press and a revealed narrative, independent of the terminal:
//!
//! - [`host`] - host session data (`initData`) lookup and decoding
//! - [`api`] - the backend request/reply and the [`api::StoryBackend`] seam
//! - [`session`] - the explicit [`session::DisplaySession`] shared by all handlers
//! - [`typing`] - the character-by-character typing renderer
//! - [`turn`] - one send/receive cycle wiring the pieces together
//!
//! ```text
//! input ──► TurnController::play_turn ──► StoryBackend::step ──► reply
//!                 │                                                │
//!                 ▼                                                ▼
//!          DisplaySession (busy)  ◄──── Typewriter::reveal ◄── narrator entry
//! ```

pub mod api;
pub mod host;
pub mod session;
pub mod turn;
pub mod typing;

pub use api::{HttpBackend, StoryBackend, TurnError};
pub use host::{HostError, HostSession};
pub use session::{DisplaySession, SharedSession, Speaker, TranscriptStyle, View};
pub use turn::{TurnController, TurnReport};
pub use typing::{RevealOutcome, RevealTarget, Typewriter};
