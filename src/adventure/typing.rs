//! Typing renderer: reveals a narrative reply one character at a time.
//!
//! `reveal` clears the target, inserts the first character right away and then one
//! more every `interval`, scrolling the target to its bottom after each insertion.
//! When the last character is in, `on_complete` runs exactly once.
//!
//! Each reveal holds an animation token taken from its [`Typewriter`]. Starting a new
//! reveal (or cancelling through the [`RevealHandle`]) invalidates the older token;
//! the older reveal stops before its next insertion and its `on_complete` never runs.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use tokio::task::JoinHandle;

/// Lower bound applied to the reveal interval.
pub const MIN_INTERVAL: Duration = Duration::from_millis(1);

/// A text container the renderer can write into.
pub trait RevealTarget: Send {
    fn clear(&mut self);
    fn push_char(&mut self, ch: char);
    fn scroll_to_bottom(&mut self);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RevealOutcome {
    /// Every character was inserted and `on_complete` ran.
    Completed { steps: usize },
    /// A newer reveal or an explicit cancel took over after `steps` insertions.
    Superseded { steps: usize },
}

impl RevealOutcome {
    pub fn steps(&self) -> usize {
        match *self {
            RevealOutcome::Completed { steps } | RevealOutcome::Superseded { steps } => steps,
        }
    }
}

/// Hands out animation tokens; clones share the same token counter.
#[derive(Debug, Clone, Default)]
pub struct Typewriter {
    generation: Arc<AtomicU64>,
}

/// A reveal in flight.
#[derive(Debug)]
pub struct RevealHandle {
    token: u64,
    generation: Arc<AtomicU64>,
    task: JoinHandle<RevealOutcome>,
}

impl RevealHandle {
    pub fn token(&self) -> u64 {
        self.token
    }

    /// Whether this reveal still owns the current animation token.
    pub fn is_current(&self) -> bool {
        self.generation.load(Ordering::SeqCst) == self.token
    }

    /// Stop this reveal if it is still the current one. A newer reveal is left alone.
    pub fn cancel(&self) {
        let _ = self.generation.compare_exchange(
            self.token,
            self.token.wrapping_add(1),
            Ordering::SeqCst,
            Ordering::SeqCst,
        );
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Wait for the reveal to end.
    pub async fn finished(self) -> RevealOutcome {
        self.task
            .await
            .unwrap_or(RevealOutcome::Superseded { steps: 0 })
    }
}

fn lock_target<T>(target: &Mutex<T>) -> MutexGuard<'_, T> {
    target.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl Typewriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Token of the most recent reveal (0 before the first one).
    pub fn current_token(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    /// Cancel whatever reveal is in flight.
    pub fn cancel_all(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
    }

    /// Reveal `text` into `target` on the current tokio runtime.
    pub fn reveal<T, F>(
        &self,
        target: Arc<Mutex<T>>,
        text: impl Into<String>,
        interval: Duration,
        on_complete: F,
    ) -> RevealHandle
    where
        T: RevealTarget + 'static,
        F: FnOnce() + Send + 'static,
    {
        let token = self.generation.fetch_add(1, Ordering::SeqCst).wrapping_add(1);
        let generation = Arc::clone(&self.generation);
        let text: String = text.into();
        let interval = interval.max(MIN_INTERVAL);

        let task = {
            let generation = Arc::clone(&generation);
            tokio::spawn(async move {
                let is_current = || generation.load(Ordering::SeqCst) == token;

                {
                    let mut t = lock_target(&target);
                    if !is_current() {
                        return RevealOutcome::Superseded { steps: 0 };
                    }
                    t.clear();
                }

                let total = text.chars().count();
                let mut steps = 0;
                for ch in text.chars() {
                    {
                        // Checked under the target lock so a newer reveal's clear
                        // can never be followed by a stale insertion.
                        let mut t = lock_target(&target);
                        if !is_current() {
                            return RevealOutcome::Superseded { steps };
                        }
                        t.push_char(ch);
                        t.scroll_to_bottom();
                    }
                    steps += 1;
                    if steps < total {
                        tokio::time::sleep(interval).await;
                    }
                }

                if !is_current() {
                    return RevealOutcome::Superseded { steps };
                }
                on_complete();
                RevealOutcome::Completed { steps }
            })
        };

        RevealHandle {
            token,
            generation,
            task,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    #[derive(Default)]
    struct Recorder {
        text: String,
        clears: usize,
        pushes: usize,
        scrolls: usize,
    }

    impl RevealTarget for Recorder {
        fn clear(&mut self) {
            self.text.clear();
            self.clears += 1;
        }
        fn push_char(&mut self, ch: char) {
            self.text.push(ch);
            self.pushes += 1;
        }
        fn scroll_to_bottom(&mut self) {
            self.scrolls += 1;
        }
    }

    #[tokio::test]
    async fn reveals_every_character_then_completes_once() {
        let target = Arc::new(Mutex::new(Recorder {
            text: "stale".into(),
            ..Recorder::default()
        }));
        let done = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&done);

        let text = "Дверь скрипит.";
        let handle = Typewriter::new().reveal(
            Arc::clone(&target),
            text,
            Duration::from_millis(1),
            move || {
                counter.fetch_add(1, Ordering::SeqCst);
            },
        );
        let outcome = handle.finished().await;

        let n = text.chars().count();
        assert_eq!(outcome, RevealOutcome::Completed { steps: n });
        let t = target.lock().unwrap();
        assert_eq!(t.text, text);
        assert_eq!(t.clears, 1);
        assert_eq!(t.pushes, n);
        assert_eq!(t.scrolls, n);
        assert_eq!(done.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn empty_text_completes_immediately() {
        let target = Arc::new(Mutex::new(Recorder::default()));
        let done = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&done);
        let outcome = Typewriter::new()
            .reveal(target, "", Duration::from_millis(25), move || {
                counter.fetch_add(1, Ordering::SeqCst);
            })
            .finished()
            .await;
        assert_eq!(outcome, RevealOutcome::Completed { steps: 0 });
        assert_eq!(done.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn cancel_stops_without_completion() {
        let target = Arc::new(Mutex::new(Recorder::default()));
        let done = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&done);
        let handle = Typewriter::new().reveal(
            Arc::clone(&target),
            "x".repeat(500),
            Duration::from_millis(5),
            move || {
                counter.fetch_add(1, Ordering::SeqCst);
            },
        );
        tokio::time::sleep(Duration::from_millis(20)).await;
        handle.cancel();
        assert!(!handle.is_current());
        let outcome = handle.finished().await;
        assert!(matches!(outcome, RevealOutcome::Superseded { steps } if steps < 500));
        assert_eq!(done.load(Ordering::SeqCst), 0);
    }
}
