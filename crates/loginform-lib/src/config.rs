// ============================
// crates/loginform-lib/src/config.rs
// ============================
//! Configuration management.
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{bail, Context, Result};
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

/// Config file read when no explicit path is given
pub const DEFAULT_CONFIG_FILE: &str = "loginform.toml";

/// Prefix of environment overrides, nested keys separated by `__`
pub const ENV_PREFIX: &str = "LOGINFORM_";

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Application settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    /// Interface the page server binds to
    pub host: IpAddr,
    /// Page server port (`PORT` overrides)
    pub port: u16,
    /// Directory holding the HTML entry points and assets
    pub public_dir: PathBuf,
    /// Directory of the flat-file key-value store used by the CLI client
    pub data_dir: PathBuf,
    /// Log level
    pub log_level: String,
    /// Log output format
    pub log_format: LogFormat,
    /// Form controller timings and limits
    pub form: FormSettings,
    /// Which auth collaborator to talk to
    pub auth: AuthBackend,
}

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// Form controller settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FormSettings {
    /// Delay between a success message and the follow-up navigation
    pub redirect_delay_ms: u64,
    /// How long a transient message stays on screen
    pub message_dismiss_ms: u64,
    /// Maximum number of login activity records kept
    pub activity_cap: usize,
    /// Where a successful login redirects to
    pub redirect_target: String,
    /// User agent recorded in login activity
    pub user_agent: String,
}

/// Auth collaborator selection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum AuthBackend {
    /// Custom REST API exposing `POST /api/login` and `POST /api/signup`
    Rest { base_url: String },
    /// Managed email/password auth service
    Managed { project_url: String, api_key: String },
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            host: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            port: 3000,
            public_dir: PathBuf::from("public"),
            data_dir: PathBuf::from("data"),
            log_level: "info".to_string(),
            log_format: LogFormat::Text,
            form: FormSettings::default(),
            auth: AuthBackend::default(),
        }
    }
}

impl Default for FormSettings {
    fn default() -> Self {
        Self {
            redirect_delay_ms: 2_000,
            message_dismiss_ms: 5_000,
            activity_cap: 100,
            redirect_target: "dashboard.html".to_string(),
            user_agent: concat!("loginform/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

impl Default for AuthBackend {
    fn default() -> Self {
        AuthBackend::Rest {
            base_url: "http://localhost:3000".to_string(),
        }
    }
}

impl FormSettings {
    pub fn redirect_delay(&self) -> Duration {
        Duration::from_millis(self.redirect_delay_ms)
    }

    pub fn message_dismiss(&self) -> Duration {
        Duration::from_millis(self.message_dismiss_ms)
    }
}

impl Settings {
    /// Load settings from `loginform.toml` (if present) and the environment
    pub fn load() -> Result<Self> {
        Self::load_from(DEFAULT_CONFIG_FILE)
    }

    /// Load settings from a specific TOML file and the environment.
    ///
    /// Precedence, lowest first: defaults, the file, `LOGINFORM_*`, `PORT`.
    /// A missing file is not an error.
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self> {
        let settings: Settings = Self::figment(path.as_ref())
            .extract()
            .context("failed to read configuration")?;
        settings.validate()?;
        Ok(settings)
    }

    fn figment(path: &Path) -> Figment {
        Figment::from(Serialized::defaults(Settings::default()))
            .merge(Toml::file(path))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .merge(Env::raw().only(&["port"]))
    }

    /// Reject settings the application cannot run with
    pub fn validate(&self) -> Result<()> {
        if !LOG_LEVELS.contains(&self.log_level.to_ascii_lowercase().as_str()) {
            bail!("invalid log level: {}", self.log_level);
        }

        if self.form.redirect_delay_ms == 0 || self.form.message_dismiss_ms == 0 {
            bail!("form delays must be greater than zero");
        }

        if self.form.activity_cap == 0 {
            bail!("activity_cap must be greater than zero");
        }

        if self.form.redirect_target.trim().is_empty() {
            bail!("redirect_target must not be empty");
        }

        match &self.auth {
            AuthBackend::Rest { base_url } => {
                reqwest::Url::parse(base_url)
                    .with_context(|| format!("invalid auth base_url: {base_url}"))?;
            },
            AuthBackend::Managed {
                project_url,
                api_key,
            } => {
                reqwest::Url::parse(project_url)
                    .with_context(|| format!("invalid auth project_url: {project_url}"))?;
                if api_key.is_empty() {
                    bail!("managed auth requires an api_key");
                }
            },
        }

        Ok(())
    }

    /// Socket address of the page server
    pub fn bind_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}
