//! User configuration at ~/.config/ical-reply/config.toml
//!
//! Every key is optional. Values can also come from `ICAL_REPLY_*`
//! environment variables, which take precedence over the file.

use std::path::{Path, PathBuf};

use config::{Config, Environment, File};
use serde::Deserialize;

use crate::error::{ReplyError, ReplyResult};
use crate::response::ResponseState;
use crate::transfer::DEFAULT_MAIL_CLIENTS;

fn default_mail_clients() -> Vec<String> {
    DEFAULT_MAIL_CLIENTS.iter().map(|c| c.to_string()).collect()
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReplyConfig {
    /// Address to reply as when `-e` is not given.
    #[serde(default)]
    pub email: Option<String>,

    /// Transfer command when `-s` is not given.
    #[serde(default)]
    pub sendmail: Option<String>,

    /// Mail clients asked for their sendmail setting, in order.
    #[serde(default = "default_mail_clients")]
    pub mail_clients: Vec<String>,

    #[serde(default)]
    pub default_response: ResponseState,
}

impl Default for ReplyConfig {
    fn default() -> Self {
        ReplyConfig {
            email: None,
            sendmail: None,
            mail_clients: default_mail_clients(),
            default_response: ResponseState::default(),
        }
    }
}

impl ReplyConfig {
    pub fn config_path() -> ReplyResult<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| ReplyError::Config("Could not determine config directory".into()))?
            .join("ical-reply");

        Ok(config_dir.join("config.toml"))
    }

    /// Load from the default location. A missing file is not an error.
    pub fn load() -> ReplyResult<Self> {
        Self::load_from(&Self::config_path()?)
    }

    pub fn load_from(path: &Path) -> ReplyResult<Self> {
        let path = PathBuf::from(shellexpand::tilde(&path.to_string_lossy()).into_owned());
        tracing::debug!(path = %path.display(), "Loading config");

        Config::builder()
            .add_source(File::from(path).required(false))
            .add_source(
                Environment::with_prefix("ICAL_REPLY")
                    .try_parsing(true)
                    .list_separator(",")
                    .with_list_parse_key("mail_clients"),
            )
            .build()
            .map_err(|e| ReplyError::Config(e.to_string()))?
            .try_deserialize()
            .map_err(|e| ReplyError::Config(e.to_string()))
    }
}
