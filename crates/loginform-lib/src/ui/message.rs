//! Transient user-facing message channel.
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use serde::Serialize;

/// Visual flavour of a message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageKind {
    Info,
    Success,
    Error,
}

/// A message currently on screen
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Message {
    pub text: String,
    pub kind: MessageKind,
}

/// Where the controller sends user-facing feedback
pub trait MessageSink: Send + Sync {
    fn show(&self, text: &str, kind: MessageKind);
    fn clear(&self);
}

#[derive(Debug, Default)]
struct State {
    current: Option<Message>,
    // bumped on every change so a stale dismiss timer leaves newer messages alone
    generation: u64,
}

/// Single-slot message area that hides itself after a delay.
///
/// Outside a tokio runtime messages stay until cleared.
#[derive(Debug, Clone)]
pub struct MessageChannel {
    state: Arc<Mutex<State>>,
    dismiss_after: Duration,
}

impl MessageChannel {
    pub fn new(dismiss_after: Duration) -> Self {
        Self {
            state: Arc::new(Mutex::new(State::default())),
            dismiss_after,
        }
    }

    /// The message on screen, if any
    pub fn current(&self) -> Option<Message> {
        self.state.lock().current.clone()
    }

    /// Escape key pressed
    pub fn on_escape(&self) {
        self.clear();
    }

    /// Click anywhere outside the message container
    pub fn on_outside_click(&self) {
        self.clear();
    }
}

impl MessageSink for MessageChannel {
    fn show(&self, text: &str, kind: MessageKind) {
        let generation = {
            let mut state = self.state.lock();
            state.generation += 1;
            state.current = Some(Message {
                text: text.to_string(),
                kind,
            });
            state.generation
        };

        if let Ok(handle) = tokio::runtime::Handle::try_current() {
            let state = Arc::clone(&self.state);
            let delay = self.dismiss_after;
            handle.spawn(async move {
                tokio::time::sleep(delay).await;
                let mut state = state.lock();
                if state.generation == generation {
                    state.current = None;
                }
            });
        }
    }

    fn clear(&self) {
        let mut state = self.state.lock();
        state.generation += 1;
        state.current = None;
    }
}
