use std::io::Write;
use std::path::PathBuf;

use anyhow::{Context, Result};
use ical_reply_core::config::ReplyConfig;
use ical_reply_core::ics::load_invitation;
use ical_reply_core::transfer::TransferCommand;
use ical_reply_core::{PreparedReply, ReplyError, ResponseState};
use owo_colors::OwoColorize;
use tracing::debug;

use crate::prompt;
use crate::render::Render;

pub enum StateChoice {
    Fixed(ResponseState),
    Ask,
}

pub struct ReplyArgs {
    pub filename: Option<PathBuf>,
    pub email: Option<String>,
    pub sendmail: Option<String>,
    pub state: Option<StateChoice>,
    pub display_only: bool,
    pub dry_run: bool,
    pub config: Option<PathBuf>,
}

pub fn run(args: ReplyArgs) -> Result<()> {
    let filename = args
        .filename
        .ok_or_else(|| ReplyError::Input("no invitation file given".into()))?;

    let config = match &args.config {
        Some(path) => ReplyConfig::load_from(path)?,
        None => ReplyConfig::load()?,
    };

    debug!(path = %filename.display(), "Loading invitation");
    let mut invitation = load_invitation(&filename)?;
    println!("{}", invitation.render());

    if args.display_only {
        return Ok(());
    }

    let email = args.email.or(config.email).ok_or_else(|| {
        ReplyError::Input("no address given; pass -e <address> or set `email` in the config file".into())
    })?;

    // Resolved before asking anything so a missing mailer fails early
    let transfer = if args.dry_run {
        None
    } else {
        let override_command = args.sendmail.or(config.sendmail);
        Some(TransferCommand::resolve(
            override_command.as_deref(),
            &config.mail_clients,
        )?)
    };

    let state = match args.state {
        Some(StateChoice::Fixed(state)) => state,
        Some(StateChoice::Ask) => {
            println!();
            prompt::ask_response()?
        }
        None => config.default_response,
    };
    debug!(%state, %email, "Answering invitation");

    let prepared = PreparedReply::prepare(&mut invitation, &email, state)?;
    let message = prepared
        .to_message()?
        .to_bytes()
        .context("Failed to build reply email")?;

    let Some(transfer) = transfer else {
        std::io::stdout().write_all(&message)?;
        return Ok(());
    };

    match transfer.send(&prepared.to, &message) {
        Ok(()) => {
            println!(
                "{} {} to {}",
                "Sent".green(),
                prepared.subject.bold(),
                prepared.to
            );
            Ok(())
        }
        Err(e @ ReplyError::TransferExecution { .. }) => {
            Err(report_transfer_failure(e, prompt::acknowledge))
        }
        Err(e) => Err(e.into()),
    }
}

/// Show a failed send and wait for the operator before giving up.
///
/// The send error is returned even if the acknowledgement cannot be read.
fn report_transfer_failure(
    error: ReplyError,
    acknowledge: impl FnOnce() -> Result<()>,
) -> anyhow::Error {
    eprintln!("{}", error.to_string().red());
    if let Err(ack_error) = acknowledge() {
        debug!(error = %ack_error, "Could not wait for acknowledgement");
    }
    error.into()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn failed_send() -> ReplyError {
        ReplyError::TransferExecution {
            command: "sendmail -t".into(),
            code: 75,
        }
    }

    #[test]
    fn test_transfer_failure_waits_for_acknowledgement() {
        let mut asked = false;
        let err = report_transfer_failure(failed_send(), || {
            asked = true;
            Ok(())
        });

        assert!(asked);
        assert!(matches!(
            err.downcast_ref::<ReplyError>(),
            Some(ReplyError::TransferExecution { code: 75, .. })
        ));
    }

    #[test]
    fn test_transfer_failure_survives_missing_terminal() {
        let err = report_transfer_failure(failed_send(), || anyhow::bail!("not a terminal"));

        assert!(matches!(
            err.downcast_ref::<ReplyError>(),
            Some(ReplyError::TransferExecution { code: 75, .. })
        ));
        assert!(err.to_string().contains("exit code 75"));
    }
}
