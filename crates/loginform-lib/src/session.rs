// ============================
// crates/loginform-lib/src/session.rs
// ============================
//! Session persistence and login activity bookkeeping on top of a [`KeyValueStore`].
use loginform_common::{
    LoginActivityRecord, Session, User, AUTH_TOKEN_KEY, CURRENT_USER_KEY, LOGIN_ACTIVITY_KEY,
};
use tracing::{debug, warn};

use crate::error::AppError;
use crate::store::KeyValueStore;

/// Default number of login activity records kept
pub const DEFAULT_ACTIVITY_CAP: usize = 100;

/// Store a session, overwriting the previous one
pub async fn save_session(store: &dyn KeyValueStore, session: &Session) -> Result<(), AppError> {
    store.set(AUTH_TOKEN_KEY, &session.token).await?;
    store
        .set(CURRENT_USER_KEY, &serde_json::to_string(&session.user)?)
        .await?;
    Ok(())
}

/// Read the cached session, if any.
///
/// A token without a readable user profile counts as no session.
pub async fn load_session(store: &dyn KeyValueStore) -> Result<Option<Session>, AppError> {
    let Some(token) = store.get(AUTH_TOKEN_KEY).await? else {
        return Ok(None);
    };

    let user = match store.get(CURRENT_USER_KEY).await? {
        Some(raw) => match serde_json::from_str::<User>(&raw) {
            Ok(user) => user,
            Err(e) => {
                warn!(error = %e, "cached user profile is unreadable");
                return Ok(None);
            },
        },
        None => return Ok(None),
    };

    Ok(Some(Session { token, user }))
}

/// Forget the cached session; login activity is kept
pub async fn clear_session(store: &dyn KeyValueStore) -> Result<(), AppError> {
    store.remove(AUTH_TOKEN_KEY).await?;
    store.remove(CURRENT_USER_KEY).await?;
    Ok(())
}

/// Read the login activity log, newest first
pub async fn load_login_activity(
    store: &dyn KeyValueStore,
) -> Result<Vec<LoginActivityRecord>, AppError> {
    match store.get(LOGIN_ACTIVITY_KEY).await? {
        Some(raw) => Ok(serde_json::from_str(&raw)?),
        None => Ok(Vec::new()),
    }
}

/// Prepend a record to the login activity log and drop everything past `cap`
pub async fn record_login_activity(
    store: &dyn KeyValueStore,
    record: LoginActivityRecord,
    cap: usize,
) -> Result<(), AppError> {
    let mut activity = match load_login_activity(store).await {
        Ok(activity) => activity,
        Err(AppError::Json(e)) => {
            warn!(error = %e, "login activity log is unreadable, starting a new one");
            Vec::new()
        },
        Err(e) => return Err(e),
    };

    debug!(email = %record.email, session_id = %record.session_id, "login activity tracked");
    activity.insert(0, record);
    activity.truncate(cap);

    store
        .set(LOGIN_ACTIVITY_KEY, &serde_json::to_string(&activity)?)
        .await
}
