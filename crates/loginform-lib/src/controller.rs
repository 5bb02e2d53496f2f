// ============================
// crates/loginform-lib/src/controller.rs
// ============================
//! The login/signup form controller.
//!
//! Validates submissions, calls the auth collaborator, keeps the session and
//! login history in the key-value store, and drives feedback through the UI
//! ports. Every failure is shown once on the message channel and also
//! returned to the caller.
use std::sync::Arc;

use loginform_common::{LoginActivityRecord, LoginCredentials, Session, SignupForm, User};
use tracing::{error, info, warn};

use crate::auth::AuthClient;
use crate::config::FormSettings;
use crate::error::{AuthError, FormError};
use crate::session;
use crate::store::KeyValueStore;
use crate::ui::{
    Clock, FormView, LogNavigator, MessageKind, MessageSink, Navigator, Scheduler, SubmitControl,
    SystemClock, TokioScheduler, View, ViewState,
};
use crate::validation;

pub const LOGIN_SUCCESS_MESSAGE: &str = "Login successful! Redirecting to dashboard...";
pub const LOGIN_FAILED_MESSAGE: &str = "Login failed. Please try again.";
pub const SIGNUP_SUCCESS_MESSAGE: &str = "Account created successfully! Please sign in.";
pub const SIGNUP_FAILED_MESSAGE: &str = "Signup failed. Please try again.";

/// Controller behind the login and signup forms
pub struct FormController {
    auth: Arc<dyn AuthClient>,
    store: Arc<dyn KeyValueStore>,
    messages: Arc<dyn MessageSink>,
    clock: Arc<dyn Clock>,
    scheduler: Arc<dyn Scheduler>,
    navigator: Arc<dyn Navigator>,
    view: Arc<FormView>,
    settings: FormSettings,
    login_control: Arc<SubmitControl>,
    signup_control: Arc<SubmitControl>,
}

impl FormController {
    /// Create a controller using the system clock, tokio timers and a logging navigator
    pub fn new(
        auth: Arc<dyn AuthClient>,
        store: Arc<dyn KeyValueStore>,
        messages: Arc<dyn MessageSink>,
        settings: FormSettings,
    ) -> Self {
        Self {
            auth,
            store,
            messages,
            clock: Arc::new(SystemClock),
            scheduler: Arc::new(TokioScheduler),
            navigator: Arc::new(LogNavigator),
            view: Arc::new(FormView::new()),
            settings,
            login_control: Arc::new(SubmitControl::new()),
            signup_control: Arc::new(SubmitControl::new()),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_scheduler(mut self, scheduler: Arc<dyn Scheduler>) -> Self {
        self.scheduler = scheduler;
        self
    }

    pub fn with_navigator(mut self, navigator: Arc<dyn Navigator>) -> Self {
        self.navigator = navigator;
        self
    }

    pub fn login_control(&self) -> &Arc<SubmitControl> {
        &self.login_control
    }

    pub fn signup_control(&self) -> &Arc<SubmitControl> {
        &self.signup_control
    }

    pub fn settings(&self) -> &FormSettings {
        &self.settings
    }

    pub fn view(&self) -> ViewState {
        self.view.current()
    }

    /// Switch to the signup form
    pub fn show_signup(&self) {
        self.view.show(View::Signup);
        self.messages.clear();
    }

    /// Switch to the login form
    pub fn show_login(&self) {
        self.view.show(View::Login);
        self.messages.clear();
    }

    /// CSS class for the strength bar under the signup password
    pub fn password_strength_class(&self, password: &str) -> &'static str {
        validation::password_strength(password).as_str()
    }

    /// Check for a cached session at start-up. Nothing is verified remotely.
    pub async fn restore_session(&self) -> Result<Option<Session>, FormError> {
        let session = session::load_session(self.store.as_ref()).await?;
        if let Some(session) = &session {
            info!(email = %session.user.email, "user already logged in");
        }
        Ok(session)
    }

    /// Forget the cached session
    pub async fn clear_session(&self) -> Result<(), FormError> {
        session::clear_session(self.store.as_ref()).await?;
        info!("session cleared");
        Ok(())
    }

    /// Submit the login form
    #[tracing::instrument(name = "login", skip_all)]
    pub async fn submit_login(&self, email: &str, password: &str) -> Result<Session, FormError> {
        let credentials = LoginCredentials {
            email: validation::trim_input(email).to_string(),
            password: password.to_string(),
        };
        validation::validate_login(&credentials)
            .map_err(|e| self.fail(e.into(), LOGIN_FAILED_MESSAGE))?;

        let Some(_loading) = self.login_control.try_begin() else {
            warn!("login already in progress");
            return Err(FormError::InFlight);
        };

        let session = self
            .sign_in(&credentials)
            .await
            .map_err(|e| self.fail(e, LOGIN_FAILED_MESSAGE))?;

        info!(email = %session.user.email, "login succeeded");
        self.messages.show(LOGIN_SUCCESS_MESSAGE, MessageKind::Success);

        let navigator = Arc::clone(&self.navigator);
        let target = self.settings.redirect_target.clone();
        self.scheduler.schedule(
            self.settings.redirect_delay(),
            Box::new(move || navigator.redirect(&target)),
        );

        Ok(session)
    }

    /// Submit the signup form
    #[tracing::instrument(name = "signup", skip_all)]
    pub async fn submit_signup(&self, form: &SignupForm) -> Result<User, FormError> {
        let form = SignupForm {
            name: validation::trim_input(&form.name).to_string(),
            email: validation::trim_input(&form.email).to_string(),
            ..form.clone()
        };
        validation::validate_signup(&form)
            .map_err(|e| self.fail(e.into(), SIGNUP_FAILED_MESSAGE))?;

        let Some(_loading) = self.signup_control.try_begin() else {
            warn!("signup already in progress");
            return Err(FormError::InFlight);
        };

        let user = self
            .auth
            .sign_up(&form.name, &form.email, &form.password)
            .await
            .map_err(|e| self.fail(e.into(), SIGNUP_FAILED_MESSAGE))?;

        info!(email = %user.email, "signup succeeded");
        self.messages.show(SIGNUP_SUCCESS_MESSAGE, MessageKind::Success);

        let view = Arc::clone(&self.view);
        let messages = Arc::clone(&self.messages);
        self.scheduler.schedule(
            self.settings.redirect_delay(),
            Box::new(move || {
                view.show(View::Login);
                messages.clear();
            }),
        );

        Ok(user)
    }

    async fn sign_in(&self, credentials: &LoginCredentials) -> Result<Session, FormError> {
        let session = self
            .auth
            .sign_in(&credentials.email, &credentials.password)
            .await?;
        session::save_session(self.store.as_ref(), &session).await?;

        // activity is diagnostic only, losing a record must not fail the login
        let record =
            LoginActivityRecord::new(&session.user, self.clock.now(), &self.settings.user_agent);
        if let Err(e) =
            session::record_login_activity(self.store.as_ref(), record, self.settings.activity_cap)
                .await
        {
            error!(error = %e, "failed to track login activity");
        }

        Ok(session)
    }

    /// Show the failure on the message channel and hand it back
    fn fail(&self, err: FormError, fallback: &str) -> FormError {
        match &err {
            FormError::Validation(e) => warn!(reason = %e, "submission rejected locally"),
            FormError::Auth(AuthError::Rejected { status, .. }) => {
                warn!(status, error = %err, "auth backend rejected submission");
            },
            _ => error!(error = %err, "submission failed"),
        }

        self.messages.show(&err.user_message(fallback), MessageKind::Error);
        err
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use crate::ui::{MessageChannel, Task};
    use async_trait::async_trait;
    use chrono::{DateTime, TimeZone, Utc};
    use loginform_common::{AUTH_TOKEN_KEY, LOGIN_ACTIVITY_KEY};
    use parking_lot::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    /// Auth backend double that counts calls and records the loading state it saw
    #[derive(Default)]
    struct MockAuth {
        sign_in_calls: AtomicUsize,
        sign_up_calls: AtomicUsize,
        reject_with: Mutex<Option<AuthError>>,
        observed: Mutex<Option<Arc<SubmitControl>>>,
        disabled_during_call: Mutex<Vec<bool>>,
    }

    impl MockAuth {
        fn failing(err: AuthError) -> Self {
            let mock = Self::default();
            *mock.reject_with.lock() = Some(err);
            mock
        }

        fn observe(&self, control: &Arc<SubmitControl>) {
            *self.observed.lock() = Some(Arc::clone(control));
        }

        fn record_control_state(&self) {
            if let Some(control) = self.observed.lock().as_ref() {
                self.disabled_during_call.lock().push(control.is_disabled());
            }
        }
    }

    #[async_trait]
    impl AuthClient for MockAuth {
        async fn sign_in(&self, email: &str, _password: &str) -> Result<Session, AuthError> {
            self.sign_in_calls.fetch_add(1, Ordering::SeqCst);
            self.record_control_state();
            if let Some(err) = self.reject_with.lock().clone() {
                return Err(err);
            }
            Ok(Session {
                token: "tok-1".to_string(),
                user: User {
                    id: "1".to_string(),
                    email: email.to_string(),
                    name: "Ann".to_string(),
                },
            })
        }

        async fn sign_up(&self, name: &str, email: &str, _password: &str) -> Result<User, AuthError> {
            self.sign_up_calls.fetch_add(1, Ordering::SeqCst);
            self.record_control_state();
            if let Some(err) = self.reject_with.lock().clone() {
                return Err(err);
            }
            Ok(User {
                id: "2".to_string(),
                email: email.to_string(),
                name: name.to_string(),
            })
        }
    }

    #[derive(Default)]
    struct ManualScheduler {
        tasks: Mutex<Vec<(Duration, Task)>>,
    }

    impl Scheduler for ManualScheduler {
        fn schedule(&self, delay: Duration, task: Task) {
            self.tasks.lock().push((delay, task));
        }
    }

    impl ManualScheduler {
        fn delays(&self) -> Vec<Duration> {
            self.tasks.lock().iter().map(|(d, _)| *d).collect()
        }

        fn run_all(&self) {
            let tasks: Vec<_> = self.tasks.lock().drain(..).collect();
            for (_, task) in tasks {
                task();
            }
        }
    }

    #[derive(Default)]
    struct RecordingNavigator {
        visited: Mutex<Vec<String>>,
    }

    impl Navigator for RecordingNavigator {
        fn redirect(&self, target: &str) {
            self.visited.lock().push(target.to_string());
        }
    }

    struct FixedClock(DateTime<Utc>);

    impl Clock for FixedClock {
        fn now(&self) -> DateTime<Utc> {
            self.0
        }
    }

    struct Harness {
        controller: FormController,
        auth: Arc<MockAuth>,
        store: Arc<MemoryStore>,
        messages: Arc<MessageChannel>,
        scheduler: Arc<ManualScheduler>,
        navigator: Arc<RecordingNavigator>,
    }

    fn harness(auth: MockAuth) -> Harness {
        let auth = Arc::new(auth);
        let store = Arc::new(MemoryStore::new());
        let messages = Arc::new(MessageChannel::new(Duration::from_secs(5)));
        let scheduler = Arc::new(ManualScheduler::default());
        let navigator = Arc::new(RecordingNavigator::default());
        let clock = Utc.with_ymd_and_hms(2024, 5, 1, 8, 0, 0).unwrap();

        let controller = FormController::new(
            auth.clone(),
            store.clone(),
            messages.clone(),
            FormSettings::default(),
        )
        .with_clock(Arc::new(FixedClock(clock)))
        .with_scheduler(scheduler.clone())
        .with_navigator(navigator.clone());

        Harness {
            controller,
            auth,
            store,
            messages,
            scheduler,
            navigator,
        }
    }

    fn signup_form() -> SignupForm {
        SignupForm {
            name: "  Bob ".to_string(),
            email: " bob@example.com ".to_string(),
            password: "Abcdefg1".to_string(),
            confirm_password: "Abcdefg1".to_string(),
            agree_terms: true,
        }
    }

    fn message_text(h: &Harness) -> Option<String> {
        h.messages.current().map(|m| m.text)
    }

    #[tokio::test]
    async fn test_login_success_persists_and_redirects() {
        let h = harness(MockAuth::default());

        let session = h
            .controller
            .submit_login("  ann@example.com ", "secret")
            .await
            .unwrap();
        assert_eq!(session.user.email, "ann@example.com");

        assert_eq!(
            h.store.get(AUTH_TOKEN_KEY).await.unwrap().as_deref(),
            Some("tok-1")
        );
        let activity = session::load_login_activity(h.store.as_ref()).await.unwrap();
        assert_eq!(activity.len(), 1);
        assert_eq!(activity[0].email, "ann@example.com");
        assert_eq!(activity[0].timestamp, "2024-05-01T08:00:00.000Z");

        assert_eq!(message_text(&h).as_deref(), Some(LOGIN_SUCCESS_MESSAGE));
        assert_eq!(h.scheduler.delays(), vec![Duration::from_secs(2)]);
        assert!(h.navigator.visited.lock().is_empty());

        h.scheduler.run_all();
        assert_eq!(*h.navigator.visited.lock(), vec!["dashboard.html".to_string()]);
        assert!(!h.controller.login_control().is_disabled());
    }

    #[tokio::test]
    async fn test_login_validation_never_calls_backend() {
        let h = harness(MockAuth::default());

        let err = h.controller.submit_login("", "secret").await.unwrap_err();
        assert!(matches!(err, FormError::Validation(validation::ValidationError::MissingFields)));
        assert_eq!(message_text(&h).as_deref(), Some("Please fill in all fields."));

        let err = h.controller.submit_login("ann@example", "secret").await.unwrap_err();
        assert!(matches!(err, FormError::Validation(validation::ValidationError::InvalidEmail)));
        assert_eq!(
            message_text(&h).as_deref(),
            Some("Please enter a valid email address.")
        );

        assert_eq!(h.auth.sign_in_calls.load(Ordering::SeqCst), 0);
        assert!(h.scheduler.delays().is_empty());
    }

    #[tokio::test]
    async fn test_login_rejected_shows_backend_message_and_reenables() {
        let h = harness(MockAuth::failing(AuthError::Rejected {
            status: 401,
            message: Some("Invalid email or password".to_string()),
        }));
        h.auth.observe(h.controller.login_control());

        let err = h
            .controller
            .submit_login("ann@example.com", "wrong")
            .await
            .unwrap_err();

        assert!(matches!(err, FormError::Auth(AuthError::Rejected { status: 401, .. })));
        assert_eq!(message_text(&h).as_deref(), Some("Invalid email or password"));
        // disabled while the backend was working, enabled again afterwards
        assert_eq!(*h.auth.disabled_during_call.lock(), vec![true]);
        assert!(!h.controller.login_control().is_disabled());
        assert_eq!(h.store.get(AUTH_TOKEN_KEY).await.unwrap(), None);
        assert!(h.scheduler.delays().is_empty());
    }

    #[tokio::test]
    async fn test_login_rejected_without_message_uses_fallback() {
        let h = harness(MockAuth::failing(AuthError::Rejected {
            status: 500,
            message: None,
        }));

        h.controller
            .submit_login("ann@example.com", "pw")
            .await
            .unwrap_err();
        assert_eq!(message_text(&h).as_deref(), Some(LOGIN_FAILED_MESSAGE));
    }

    #[tokio::test]
    async fn test_login_network_failure() {
        let h = harness(MockAuth::failing(AuthError::Network("refused".to_string())));

        let err = h
            .controller
            .submit_login("ann@example.com", "pw")
            .await
            .unwrap_err();
        assert!(matches!(err, FormError::Auth(AuthError::Network(_))));
        assert_eq!(
            message_text(&h).as_deref(),
            Some("Network error. Please check your connection.")
        );
        assert!(!h.controller.login_control().is_disabled());
    }

    #[tokio::test]
    async fn test_submission_refused_while_in_flight() {
        let h = harness(MockAuth::default());

        let _busy = h.controller.login_control().try_begin().unwrap();
        let err = h
            .controller
            .submit_login("ann@example.com", "pw")
            .await
            .unwrap_err();

        assert!(matches!(err, FormError::InFlight));
        assert_eq!(h.auth.sign_in_calls.load(Ordering::SeqCst), 0);
        assert_eq!(message_text(&h), None);
    }

    #[tokio::test]
    async fn test_validation_runs_before_in_flight_check() {
        let h = harness(MockAuth::default());

        let _busy = h.controller.login_control().try_begin().unwrap();
        let err = h.controller.submit_login("", "pw").await.unwrap_err();
        assert!(matches!(err, FormError::Validation(validation::ValidationError::MissingFields)));
        assert_eq!(message_text(&h).as_deref(), Some("Please fill in all fields."));

        let _busy = h.controller.signup_control().try_begin().unwrap();
        let mut form = signup_form();
        form.agree_terms = false;
        let err = h.controller.submit_signup(&form).await.unwrap_err();
        assert!(matches!(
            err,
            FormError::Validation(validation::ValidationError::TermsNotAccepted)
        ));
        assert_eq!(h.auth.sign_up_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_login_trims_browser_whitespace_only() {
        let h = harness(MockAuth::default());

        let session = h
            .controller
            .submit_login("\u{FEFF}ann@example.com\u{3000}", "pw")
            .await
            .unwrap();
        assert_eq!(session.user.email, "ann@example.com");

        // U+0085 is kept, and is a legal email character
        let session = h
            .controller
            .submit_login("\u{0085}ann@example.com", "pw")
            .await
            .unwrap();
        assert_eq!(session.user.email, "\u{0085}ann@example.com");
    }

    #[tokio::test]
    async fn test_activity_log_capped_over_repeated_logins() {
        let h = harness(MockAuth::default());
        let cap = h.controller.settings().activity_cap;

        for _ in 0..(cap + 5) {
            h.controller
                .submit_login("ann@example.com", "pw")
                .await
                .unwrap();
        }

        let raw = h.store.get(LOGIN_ACTIVITY_KEY).await.unwrap().unwrap();
        let activity: Vec<LoginActivityRecord> = serde_json::from_str(&raw).unwrap();
        assert_eq!(activity.len(), cap);
    }

    #[tokio::test]
    async fn test_signup_mismatched_passwords_never_calls_backend() {
        let h = harness(MockAuth::default());

        let mut form = signup_form();
        form.confirm_password = "Abcdefg2".to_string();
        let err = h.controller.submit_signup(&form).await.unwrap_err();

        assert!(matches!(
            err,
            FormError::Validation(validation::ValidationError::PasswordMismatch)
        ));
        assert_eq!(h.auth.sign_up_calls.load(Ordering::SeqCst), 0);
        assert_eq!(message_text(&h).as_deref(), Some("Passwords do not match."));
    }

    #[tokio::test]
    async fn test_signup_each_precondition_has_its_own_message() {
        let h = harness(MockAuth::default());

        let cases = [
            (
                SignupForm {
                    name: "   ".to_string(),
                    ..signup_form()
                },
                "Please fill in all fields.",
            ),
            (
                SignupForm {
                    email: "bob@".to_string(),
                    ..signup_form()
                },
                "Please enter a valid email address.",
            ),
            (
                SignupForm {
                    password: "abcdefg1".to_string(),
                    confirm_password: "abcdefg1".to_string(),
                    ..signup_form()
                },
                "Password must be at least 8 characters with uppercase, lowercase, and number.",
            ),
            (
                SignupForm {
                    agree_terms: false,
                    ..signup_form()
                },
                "Please agree to the terms and conditions.",
            ),
        ];

        for (form, expected) in cases {
            h.controller.submit_signup(&form).await.unwrap_err();
            assert_eq!(message_text(&h).as_deref(), Some(expected));
        }
        assert_eq!(h.auth.sign_up_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_signup_success_switches_to_login() {
        let h = harness(MockAuth::default());
        h.auth.observe(h.controller.signup_control());
        h.controller.show_signup();
        assert!(h.controller.view().admin_link_visible);

        let user = h.controller.submit_signup(&signup_form()).await.unwrap();
        assert_eq!(user.name, "Bob");
        assert_eq!(user.email, "bob@example.com");
        assert_eq!(*h.auth.disabled_during_call.lock(), vec![true]);
        assert!(!h.controller.signup_control().is_disabled());

        assert_eq!(message_text(&h).as_deref(), Some(SIGNUP_SUCCESS_MESSAGE));
        assert_eq!(h.controller.view().active, View::Signup);

        h.scheduler.run_all();
        assert_eq!(h.controller.view().active, View::Login);
        assert!(!h.controller.view().admin_link_visible);
        assert_eq!(message_text(&h), None);
        // signing up does not sign in
        assert_eq!(h.store.get(AUTH_TOKEN_KEY).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_signup_rejected_uses_fallback() {
        let h = harness(MockAuth::failing(AuthError::Rejected {
            status: 409,
            message: None,
        }));

        h.controller.submit_signup(&signup_form()).await.unwrap_err();
        assert_eq!(message_text(&h).as_deref(), Some(SIGNUP_FAILED_MESSAGE));
        assert!(!h.controller.signup_control().is_disabled());
    }

    #[tokio::test]
    async fn test_restore_and_clear_session() {
        let h = harness(MockAuth::default());
        assert_eq!(h.controller.restore_session().await.unwrap(), None);

        let session = h
            .controller
            .submit_login("ann@example.com", "pw")
            .await
            .unwrap();
        assert_eq!(h.controller.restore_session().await.unwrap(), Some(session));

        h.controller.clear_session().await.unwrap();
        assert_eq!(h.controller.restore_session().await.unwrap(), None);
        // history survives a logout
        assert!(h.store.get(LOGIN_ACTIVITY_KEY).await.unwrap().is_some());
    }

    #[test]
    fn test_view_switch_clears_message() {
        let h = harness(MockAuth::default());
        h.messages.show("stale", MessageKind::Info);

        h.controller.show_signup();
        assert_eq!(h.controller.view().active, View::Signup);
        assert_eq!(message_text(&h), None);

        assert_eq!(h.controller.password_strength_class("Aa1!aaaa"), "very-strong");
        assert_eq!(h.controller.password_strength_class(""), "weak");
    }
}
