use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::{Parser, Subcommand};
use loginform_common::SignupForm;
use loginform_lib::{
    auth::build_auth_client,
    config::{LogFormat, Settings, DEFAULT_CONFIG_FILE},
    router,
    store::FlatFileStore,
    ui::{MessageChannel, MessageSink},
    validation, AppState, FormController, FormError,
};
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "loginform", version, about = "Login form controller and page server")]
struct Cli {
    /// Path to the TOML configuration file
    #[arg(long, short, env = "LOGINFORM_CONFIG", default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Serve the HTML pages and the health endpoint
    Serve,
    /// Sign in and cache the session
    Login {
        #[arg(long)]
        email: String,
        #[arg(long, env = "LOGINFORM_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Create an account
    Signup {
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
        #[arg(long, env = "LOGINFORM_PASSWORD", hide_env_values = true)]
        password: String,
        /// Defaults to `--password`
        #[arg(long)]
        confirm_password: Option<String>,
        #[arg(long)]
        agree_terms: bool,
    },
    /// Show the cached session, if any
    Status,
    /// Forget the cached session
    Logout,
    /// Rate a password the way the signup strength bar does
    Strength { password: String },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let settings = Settings::load_from(&cli.config)
        .with_context(|| format!("loading {}", cli.config.display()))?;

    init_tracing(&settings);

    match cli.command {
        Command::Serve => serve(settings).await,
        Command::Strength { password } => {
            println!(
                "{} (valid for signup: {})",
                validation::password_strength(&password),
                validation::validate_password(&password)
            );
            Ok(())
        },
        Command::Status => {
            let client = Client::new(settings)?;
            match client.controller.restore_session().await? {
                Some(session) => println!("logged in as {}", session.user.email),
                None => println!("not logged in"),
            }
            Ok(())
        },
        Command::Logout => {
            let client = Client::new(settings)?;
            client.controller.clear_session().await?;
            println!("logged out");
            Ok(())
        },
        Command::Login { email, password } => {
            let client = Client::new(settings)?;
            let result = client.controller.submit_login(&email, &password).await;
            client.finish(result.map(drop)).await
        },
        Command::Signup {
            name,
            email,
            password,
            confirm_password,
            agree_terms,
        } => {
            let client = Client::new(settings)?;
            client.controller.show_signup();
            let form = SignupForm {
                name,
                email,
                confirm_password: confirm_password.unwrap_or_else(|| password.clone()),
                password,
                agree_terms,
            };
            let result = client.controller.submit_signup(&form).await;
            client.finish(result.map(drop)).await
        },
    }
}

fn init_tracing(settings: &Settings) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&settings.log_level));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);

    match settings.log_format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Text => builder.init(),
    }
}

async fn serve(settings: Settings) -> anyhow::Result<()> {
    let addr = settings.bind_addr();
    let public_dir = settings.public_dir.clone();
    let app = router::create_router(Arc::new(AppState::new(settings)));

    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("binding {addr}"))?;
    info!(%addr, public_dir = %public_dir.display(), "server running");
    info!("visit: http://localhost:{}", addr.port());

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for SIGINT");
            std::future::pending::<()>().await;
        }
        info!("SIGINT received, shutting down gracefully");
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
                info!("SIGTERM received, shutting down gracefully");
            },
            Err(e) => {
                tracing::error!(error = %e, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            },
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
}

/// Headless form controller backed by the flat-file store
struct Client {
    controller: FormController,
    messages: Arc<MessageChannel>,
    follow_up_delay: Duration,
}

impl Client {
    fn new(settings: Settings) -> anyhow::Result<Self> {
        let auth = build_auth_client(&settings.auth)?;
        let store = Arc::new(FlatFileStore::new(&settings.data_dir)?);
        let messages = Arc::new(MessageChannel::new(settings.form.message_dismiss()));
        let follow_up_delay = settings.form.redirect_delay();

        Ok(Self {
            controller: FormController::new(auth, store, messages.clone(), settings.form),
            messages,
            follow_up_delay,
        })
    }

    /// Print the outcome and let the scheduled follow-up run before exiting
    async fn finish(&self, result: Result<(), FormError>) -> anyhow::Result<()> {
        if let Some(message) = self.messages.current() {
            println!("{}", message.text);
        }

        match result {
            Ok(()) => {
                tokio::time::sleep(self.follow_up_delay + Duration::from_millis(50)).await;
                self.messages.clear();
                Ok(())
            },
            Err(e) => Err(e.into()),
        }
    }
}
