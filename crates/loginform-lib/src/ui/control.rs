//! Submit button loading state.
use std::sync::atomic::{AtomicBool, Ordering};

/// The submit control of one form.
///
/// While a [`LoadingGuard`] is alive the control is disabled; dropping the
/// guard re-enables it on every exit path, including unwinding.
#[derive(Debug, Default)]
pub struct SubmitControl {
    disabled: AtomicBool,
}

impl SubmitControl {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_disabled(&self) -> bool {
        self.disabled.load(Ordering::Acquire)
    }

    /// Enter the loading state, or `None` if a submission is already running
    pub fn try_begin(&self) -> Option<LoadingGuard<'_>> {
        self.disabled
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| LoadingGuard { control: self })
    }
}

/// Keeps a [`SubmitControl`] disabled until dropped
#[derive(Debug)]
#[must_use = "the control is re-enabled as soon as the guard is dropped"]
pub struct LoadingGuard<'a> {
    control: &'a SubmitControl,
}

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        self.control.disabled.store(false, Ordering::Release);
    }
}
