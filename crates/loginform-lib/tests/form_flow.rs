//! End-to-end: controller + REST collaborator + flat-file store.
use std::sync::Arc;
use std::time::Duration;

use axum::{http::StatusCode, routing::post, Json, Router};
use loginform_common::SignupForm;
use loginform_lib::auth::{AuthClient, RestAuthClient};
use loginform_lib::config::FormSettings;
use loginform_lib::session::load_login_activity;
use loginform_lib::store::FlatFileStore;
use loginform_lib::ui::{MessageChannel, MessageKind, Navigator, View};
use loginform_lib::{FormController, FormError};
use parking_lot::Mutex;
use serde_json::{json, Value};
use tokio::net::TcpListener;

#[derive(Default)]
struct RecordingNavigator {
    visited: Mutex<Vec<String>>,
}

impl Navigator for RecordingNavigator {
    fn redirect(&self, target: &str) {
        self.visited.lock().push(target.to_string());
    }
}

async fn backend() -> String {
    async fn login(Json(body): Json<Value>) -> (StatusCode, Json<Value>) {
        if body["password"] == "Abcdefg1" {
            (
                StatusCode::OK,
                Json(json!({
                    "token": "tok-e2e",
                    "user": { "id": 5, "email": body["email"], "name": "Ann" }
                })),
            )
        } else {
            (
                StatusCode::UNAUTHORIZED,
                Json(json!({ "message": "Invalid email or password" })),
            )
        }
    }

    async fn signup(Json(body): Json<Value>) -> Json<Value> {
        Json(json!({ "user": { "id": 6, "email": body["email"], "name": body["name"] } }))
    }

    let app = Router::new()
        .route("/api/login", post(login))
        .route("/api/signup", post(signup));
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

fn settings() -> FormSettings {
    FormSettings {
        redirect_delay_ms: 50,
        ..FormSettings::default()
    }
}

#[tokio::test]
async fn test_login_flow_against_rest_backend() {
    let base = backend().await;
    let dir = tempfile::tempdir().unwrap();

    let auth: Arc<dyn AuthClient> = Arc::new(RestAuthClient::new(&base).unwrap());
    let store = Arc::new(FlatFileStore::new(dir.path()).unwrap());
    let messages = Arc::new(MessageChannel::new(Duration::from_secs(5)));
    let navigator = Arc::new(RecordingNavigator::default());

    let controller = FormController::new(auth.clone(), store.clone(), messages.clone(), settings())
        .with_navigator(navigator.clone());

    // wrong password: backend message surfaces, nothing persisted
    let err = controller
        .submit_login("ann@example.com", "nope")
        .await
        .unwrap_err();
    assert!(matches!(err, FormError::Auth(_)));
    let shown = messages.current().unwrap();
    assert_eq!(shown.kind, MessageKind::Error);
    assert_eq!(shown.text, "Invalid email or password");
    assert!(!controller.login_control().is_disabled());

    let session = controller
        .submit_login("ann@example.com", "Abcdefg1")
        .await
        .unwrap();
    assert_eq!(session.token, "tok-e2e");
    assert_eq!(session.user.id, "5");
    assert_eq!(messages.current().unwrap().kind, MessageKind::Success);

    tokio::time::sleep(Duration::from_millis(300)).await;
    assert_eq!(*navigator.visited.lock(), vec!["dashboard.html".to_string()]);

    // a fresh controller over the same directory finds the session
    let reopened = FormController::new(
        auth,
        Arc::new(FlatFileStore::new(dir.path()).unwrap()),
        Arc::new(MessageChannel::new(Duration::from_secs(5))),
        settings(),
    );
    assert_eq!(reopened.restore_session().await.unwrap(), Some(session));

    let activity = load_login_activity(store.as_ref()).await.unwrap();
    assert_eq!(activity.len(), 1);
    assert_eq!(activity[0].name, "Ann");
}

#[tokio::test]
async fn test_signup_flow_returns_to_login_view() {
    let base = backend().await;
    let dir = tempfile::tempdir().unwrap();

    let messages = Arc::new(MessageChannel::new(Duration::from_secs(5)));
    let controller = FormController::new(
        Arc::new(RestAuthClient::new(&base).unwrap()),
        Arc::new(FlatFileStore::new(dir.path()).unwrap()),
        messages.clone(),
        settings(),
    );
    controller.show_signup();

    let user = controller
        .submit_signup(&SignupForm {
            name: "Bob".to_string(),
            email: "bob@example.com".to_string(),
            password: "Abcdefg1".to_string(),
            confirm_password: "Abcdefg1".to_string(),
            agree_terms: true,
        })
        .await
        .unwrap();
    assert_eq!(user.email, "bob@example.com");
    assert_eq!(controller.view().active, View::Signup);

    tokio::time::sleep(Duration::from_millis(300)).await;
    assert_eq!(controller.view().active, View::Login);
    assert_eq!(messages.current(), None);
}
