//! # Terminal UI Module
//!
//! The interactive front end: a menu view and an adventure view drawn with crossterm.
//!
//! - [`keys`] - key press → [`keys::UiCommand`] mapping per view
//! - [`view`] - pure composition of a [`view::Screen`] from the session
//! - [`terminal`] - raw mode / alternate screen handling and frame output
//! - [`plain`] - line-mode reveal target used outside the full-screen UI
//!
//! The loop runs on the tokio runtime. Key events are read on a blocking thread and
//! forwarded over a channel; turns run as spawned tasks writing into the shared
//! session; the loop redraws whenever the session revision or terminal size changes.

pub mod keys;
pub mod plain;
pub mod terminal;
pub mod view;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use crossterm::event::{self, Event, KeyEvent, KeyEventKind};
use log::{debug, info, warn};
use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;

use crate::adventure::session::lock;
use crate::adventure::{
    DisplaySession, HostError, HostSession, StoryBackend, TranscriptStyle, TurnController, View,
};
use crate::config::Config;

use keys::{map_key, should_quit, UiCommand};
use terminal::TerminalScreen;
use view::{compose, ScreenText, Viewport};

/// Rows moved per PageUp / PageDown.
const SCROLL_STEP: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    Continue,
    Quit,
}

/// Run the interactive client until the player quits.
pub async fn run_interactive(
    config: &Config,
    host: Result<HostSession, HostError>,
    backend: Arc<dyn StoryBackend>,
) -> Result<()> {
    let session = DisplaySession::for_host(TranscriptStyle::from(&config.display), &host);
    let text = ScreenText {
        thinking_label: config.display.thinking_label.clone(),
        player_name: host.as_ref().ok().and_then(HostSession::player_name),
    };

    let host = match host {
        Ok(host) => Some(host),
        Err(e) => {
            warn!("{}; input disabled", e);
            None
        }
    };

    let controller = TurnController::new(
        backend,
        host,
        session.shared(),
        config.display.typing_interval(),
    );

    let mut screen = TerminalScreen::new();
    screen.enter()?;
    let result = event_loop(&mut screen, &controller, config, &text).await;
    controller.typewriter().cancel_all();
    let _ = screen.exit();
    result
}

async fn event_loop(
    screen: &mut TerminalScreen,
    controller: &TurnController,
    config: &Config,
    text: &ScreenText,
) -> Result<()> {
    let (tx, mut rx) = mpsc::channel::<Event>(64);
    let stop = Arc::new(AtomicBool::new(false));
    spawn_event_reader(tx, Arc::clone(&stop));

    let mut ticker = tokio::time::interval(config.display.frame_interval());
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let mut drawn: Option<(u64, Viewport)> = None;

    let outcome = loop {
        tokio::select! {
            ev = rx.recv() => match ev {
                Some(Event::Key(key)) if key.kind == KeyEventKind::Press => {
                    if apply_key(controller, key) == Flow::Quit {
                        break Ok(());
                    }
                }
                Some(Event::Resize(_, _)) => drawn = None,
                Some(_) => {}
                None => break Ok(()),
            },
            _ = ticker.tick() => {}
        }

        let (w, h) = crossterm::terminal::size().unwrap_or((80, 24));
        let vp = Viewport::new(w, h);
        let frame = next_frame(&mut lock(controller.session()), vp, text, &mut drawn);
        if let Some(frame) = frame {
            if let Err(e) = screen.draw(&frame, w) {
                break Err(e);
            }
        }
    };

    stop.store(true, Ordering::Relaxed);
    outcome
}

/// Compose a frame when the session or viewport changed since `drawn`, clamping the
/// scroll offset to the composed layout. The transcript is wrapped once per frame.
fn next_frame(
    session: &mut DisplaySession,
    vp: Viewport,
    text: &ScreenText,
    drawn: &mut Option<(u64, Viewport)>,
) -> Option<view::Screen> {
    let key = (session.revision(), vp);
    if *drawn == Some(key) {
        return None;
    }
    *drawn = Some(key);
    let frame = compose(session, vp, text);
    if session.view() == View::Adventure {
        session.clamp_scroll(frame.max_scroll);
    }
    Some(frame)
}

fn apply_key(controller: &TurnController, key: KeyEvent) -> Flow {
    if should_quit(key) {
        return Flow::Quit;
    }
    let view = lock(controller.session()).view();
    let Some(command) = map_key(view, key) else {
        return Flow::Continue;
    };

    match command {
        UiCommand::Quit => return Flow::Quit,
        UiCommand::StartAdventure => {
            let opening = lock(controller.session()).enter_adventure();
            if opening {
                info!("Adventure opened; requesting opening narrative");
                let c = controller.clone();
                tokio::spawn(async move {
                    if let Err(e) = c.play_turn("").await {
                        debug!("Opening turn not sent: {}", e);
                    }
                });
            }
        }
        UiCommand::BackToMenu => lock(controller.session()).show_menu(),
        UiCommand::Submit => {
            let c = controller.clone();
            tokio::spawn(async move {
                if let Some(Err(e)) = c.submit_input().await {
                    debug!("Input not sent: {}", e);
                }
            });
        }
        UiCommand::Insert(ch) => lock(controller.session()).push_input(ch),
        UiCommand::Backspace => lock(controller.session()).pop_input(),
        UiCommand::ScrollUp => lock(controller.session()).scroll_up(SCROLL_STEP),
        UiCommand::ScrollDown => lock(controller.session()).scroll_down(SCROLL_STEP),
    }
    Flow::Continue
}

/// Read terminal events on a blocking thread until `stop` is set or the receiver is gone.
fn spawn_event_reader(tx: mpsc::Sender<Event>, stop: Arc<AtomicBool>) {
    std::thread::spawn(move || {
        while !stop.load(Ordering::Relaxed) {
            match event::poll(Duration::from_millis(50)) {
                Ok(true) => match event::read() {
                    Ok(ev) => {
                        if tx.blocking_send(ev).is_err() {
                            break;
                        }
                    }
                    Err(e) => {
                        warn!("Terminal read failed: {}", e);
                        break;
                    }
                },
                Ok(false) => {}
                Err(e) => {
                    warn!("Terminal poll failed: {}", e);
                    break;
                }
            }
        }
    });
}
