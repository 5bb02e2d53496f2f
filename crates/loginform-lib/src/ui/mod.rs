// ============================
// crates/loginform-lib/src/ui/mod.rs
// ============================
//! Injectable UI ports used by the form controller.
//!
//! The controller never touches a page directly: messages go through a
//! [`MessageSink`], delayed follow-ups through a [`Scheduler`], page changes
//! through a [`Navigator`], and time comes from a [`Clock`].

pub mod control;
pub mod message;
pub mod view;

use std::time::Duration;

use chrono::{DateTime, Utc};
use tracing::info;

pub use control::{LoadingGuard, SubmitControl};
pub use message::{Message, MessageChannel, MessageKind, MessageSink};
pub use view::{FormView, View, ViewState};

/// A unit of work run later by a [`Scheduler`]
pub type Task = Box<dyn FnOnce() + Send + 'static>;

/// Runs a task after a delay
pub trait Scheduler: Send + Sync {
    fn schedule(&self, delay: Duration, task: Task);
}

/// Scheduler backed by `tokio::time`; must be used inside a runtime
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioScheduler;

impl Scheduler for TokioScheduler {
    fn schedule(&self, delay: Duration, task: Task) {
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            task();
        });
    }
}

/// Moves the user to another page
pub trait Navigator: Send + Sync {
    fn redirect(&self, target: &str);
}

/// Navigator for headless use: records the redirect in the log
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNavigator;

impl Navigator for LogNavigator {
    fn redirect(&self, target: &str) {
        info!(target_page = %target, "redirecting");
    }
}

/// Source of the current time
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}
