//! Mail transfer command (sendmail and friends).
//!
//! The command is resolved once at startup: an explicit override wins,
//! otherwise the configured mail clients are asked for their `sendmail`
//! setting, first answer wins.

use std::io::Write;
use std::process::{Command, Stdio};

use tracing::{debug, info};

use crate::error::{ReplyError, ReplyResult};

/// Mail clients queried with `-Q sendmail`, in order.
pub const DEFAULT_MAIL_CLIENTS: [&str; 2] = ["mutt", "neomutt"];

/// A command line that reads a message on stdin and takes recipients as arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferCommand {
    pub program: String,
    pub args: Vec<String>,
}

impl TransferCommand {
    /// Split a whitespace-separated template such as `/usr/sbin/sendmail -oem -oi`.
    pub fn parse(template: &str) -> ReplyResult<Self> {
        let mut words = template.split_whitespace();
        let program = words
            .next()
            .ok_or_else(|| ReplyError::TransferConfig("empty sendmail command".into()))?;
        Ok(TransferCommand {
            program: shellexpand::tilde(program).into_owned(),
            args: words.map(str::to_string).collect(),
        })
    }

    /// Explicit override, else the first mail client that reports a sendmail setting.
    pub fn resolve<S: AsRef<str>>(override_command: Option<&str>, mail_clients: &[S]) -> ReplyResult<Self> {
        if let Some(template) = override_command {
            debug!(template, "Using explicit sendmail command");
            return Self::parse(template);
        }

        for client in mail_clients {
            if let Some(template) = query_mail_client(client.as_ref()) {
                debug!(client = client.as_ref(), %template, "Using mail client's sendmail command");
                return Self::parse(&template);
            }
        }

        let tried: Vec<&str> = mail_clients.iter().map(AsRef::as_ref).collect();
        Err(ReplyError::TransferConfig(format!(
            "none of [{}] reported one; pass -s <command> or set `sendmail` in the config file",
            tried.join(", ")
        )))
    }

    /// Pipe `message` into the command with `recipient` as the trailing argument.
    ///
    /// Blocks until the command exits.
    pub fn send(&self, recipient: &str, message: &[u8]) -> ReplyResult<()> {
        info!(command = %self, recipient, "Sending reply");

        let mut child = Command::new(&self.program)
            .args(&self.args)
            .arg("--")
            .arg(recipient)
            .stdin(Stdio::piped())
            .spawn()
            .map_err(|source| ReplyError::TransferSpawn {
                command: self.program.clone(),
                source,
            })?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin.write_all(message)?;
        }

        let status = child.wait()?;
        if !status.success() {
            return Err(ReplyError::TransferExecution {
                command: self.to_string(),
                code: status.code().unwrap_or(-1),
            });
        }
        Ok(())
    }
}

impl std::fmt::Display for TransferCommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.program)?;
        for arg in &self.args {
            write!(f, " {arg}")?;
        }
        Ok(())
    }
}

/// Ask `<client> -Q sendmail` for its transfer command.
fn query_mail_client(client: &str) -> Option<String> {
    let binary = which::which(client).ok()?;
    let output = Command::new(&binary)
        .args(["-Q", "sendmail"])
        .stdin(Stdio::null())
        .stderr(Stdio::null())
        .output()
        .ok()?;
    if !output.status.success() {
        debug!(client, status = ?output.status.code(), "Mail client query failed");
        return None;
    }
    parse_sendmail_setting(&String::from_utf8_lossy(&output.stdout))
}

/// Extract the value from `sendmail="..."` (optionally `set sendmail = "..."`).
fn parse_sendmail_setting(output: &str) -> Option<String> {
    output.lines().find_map(|line| {
        let line = line.trim();
        let line = line.strip_prefix("set").map(str::trim_start).unwrap_or(line);
        let rest = line.strip_prefix("sendmail")?.trim_start();
        let value = rest.strip_prefix('=')?.trim();
        let value = value
            .strip_prefix('"')
            .and_then(|v| v.strip_suffix('"'))
            .unwrap_or(value)
            .trim();
        (!value.is_empty()).then(|| value.to_string())
    })
}
