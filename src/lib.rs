//! # Lantern - terminal client for a chat text adventure
//!
//! Lantern plays «Мир Теней и Огня», a text adventure whose story is written by a remote
//! backend. The player types an action; the client posts it together with the signed
//! host session data (Telegram `initData`) and reveals the narrative reply character by
//! character.
//!
//! ## Features
//!
//! - **Two views**: a menu and the adventure transcript, drawn with crossterm.
//! - **Typing renderer**: fixed-interval reveal with auto-scroll and a supersede token so
//!   overlapping reveals never interleave.
//! - **Explicit session**: one [`adventure::DisplaySession`] carries view, transcript and
//!   the busy flag instead of loose global state.
//! - **Tolerant wire format**: both backend endpoint variants (`/api/adventure`,
//!   `/api/step`) and both reply field spellings are accepted.
//! - **Graceful failures**: network, decode and backend failures end only the current
//!   turn and are shown inline.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use lantern::adventure::{HostSession, HttpBackend};
//! use lantern::config::Config;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load("lantern.toml").await?;
//!     let host = HostSession::from_env(None, &config.host);
//!     let backend = Arc::new(HttpBackend::new(&config.backend)?);
//!     lantern::ui::run_interactive(&config, host, backend).await
//! }
//! ```
//!
//! ## Module Organization
//!
//! - [`adventure`] - session model, typing renderer, backend client, turn controller
//! - [`ui`] - terminal views, key mapping and the interactive loop
//! - [`config`] - configuration loading and validation
//! - [`logutil`] - log-safe rendering of player text and secrets

pub mod adventure;
pub mod config;
pub mod logutil;
pub mod ui;
