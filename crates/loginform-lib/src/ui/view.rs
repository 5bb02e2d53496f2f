//! Which of the two forms is on screen.
use parking_lot::Mutex;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum View {
    #[default]
    Login,
    Signup,
}

/// Snapshot of the page layout
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ViewState {
    pub active: View,
    /// The admin link is only offered next to the signup form
    pub admin_link_visible: bool,
}

impl ViewState {
    fn for_view(active: View) -> Self {
        Self {
            active,
            admin_link_visible: active == View::Signup,
        }
    }
}

/// Holds the active form
#[derive(Debug)]
pub struct FormView {
    state: Mutex<ViewState>,
}

impl Default for FormView {
    fn default() -> Self {
        Self {
            state: Mutex::new(ViewState::for_view(View::Login)),
        }
    }
}

impl FormView {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> ViewState {
        *self.state.lock()
    }

    pub fn show(&self, view: View) {
        *self.state.lock() = ViewState::for_view(view);
    }
}
