//! Command implementations and the context they share.

pub mod api_keys;
pub mod billing;
pub mod config;
pub mod stats;
pub mod urls;

use anyhow::{Context as _, Result};
use indicatif::{ProgressBar, ProgressStyle};
use std::io::IsTerminal;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use intelink::api::ApiClient;
use intelink::config::{resolve_data_root, Config};
use intelink::models::auth::User;
use intelink::secrets::TokenStore;
use intelink::session::Session;

/// Everything a command needs: data root, config, session and API client.
pub struct Context {
    pub data_root: PathBuf,
    pub log_path: PathBuf,
    pub config: Config,
    pub api: ApiClient,
}

impl Context {
    /// Resolve the data root, start logging and open the persisted session.
    pub fn init(command: &str) -> Result<Self> {
        let data_root = resolve_data_root();
        let config = Config::load(&data_root)?;
        let log_path = intelink::logging::init_logging(&data_root, &config.log_filter, command)?;

        let session = Arc::new(Session::new(TokenStore::open(&data_root)));
        let api = ApiClient::new(&config, session).context("Failed to set up API client")?;

        Ok(Self {
            data_root,
            log_path,
            config,
            api,
        })
    }

    pub fn session(&self) -> &Arc<Session> {
        self.api.session()
    }

    /// Restore the user from persisted tokens, if any.
    pub async fn restore_session(&self) -> Result<Option<User>> {
        Ok(self.api.initialize_session().await?)
    }

    /// Guard for commands that need a signed-in user.
    pub async fn require_user(&self) -> Result<User> {
        self.restore_session().await?;
        Ok(self.session().require_authenticated()?)
    }

    /// Like `require_user`, but also requires the admin role.
    pub async fn require_admin(&self) -> Result<User> {
        let user = self.require_user().await?;
        if !user.is_admin() {
            anyhow::bail!("This command requires an administrator account");
        }
        Ok(user)
    }
}

/// Spinner on stderr, only when it is a terminal.
pub fn spinner(message: &str) -> Option<ProgressBar> {
    if !std::io::stderr().is_terminal() {
        return None;
    }
    let style = ProgressStyle::default_spinner()
        .template("{spinner:.green} {msg}")
        .ok()?
        .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏ ");
    let pb = ProgressBar::new_spinner();
    pb.set_style(style);
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    Some(pb)
}

pub fn finish_spinner(spinner: Option<ProgressBar>) {
    if let Some(pb) = spinner {
        pb.finish_and_clear();
    }
}

/// Ask for a yes/no confirmation; `assume_yes` skips the prompt.
pub fn confirm(message: &str, assume_yes: bool) -> Result<bool> {
    if assume_yes {
        return Ok(true);
    }
    Ok(inquire::Confirm::new(message)
        .with_default(false)
        .prompt()?)
}
