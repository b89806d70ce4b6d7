mod commands;
mod prompt;
mod render;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use ical_reply_core::{ReplyError, ResponseState};
use owo_colors::OwoColorize;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use commands::reply::{ReplyArgs, StateChoice};

#[derive(Parser)]
#[command(name = "ical-reply", version)]
#[command(about = "Show a calendar invitation and mail the organizer your answer")]
struct Cli {
    /// Invitation file (.ics)
    filename: Option<PathBuf>,

    /// Your address, as listed among the attendees
    #[arg(short, long)]
    email: Option<String>,

    /// Mail transfer command (default: ask mutt/neomutt for theirs)
    #[arg(short, long, value_name = "COMMAND")]
    sendmail: Option<String>,

    /// Accept the invitation
    #[arg(short, long, overrides_with_all = ["decline", "tentative", "interactive"])]
    accept: bool,

    /// Decline the invitation
    #[arg(short, long, overrides_with_all = ["accept", "tentative", "interactive"])]
    decline: bool,

    /// Accept tentatively
    #[arg(short, long, overrides_with_all = ["accept", "decline", "interactive"])]
    tentative: bool,

    /// Ask for the answer after showing the invitation
    #[arg(short, long, overrides_with_all = ["accept", "decline", "tentative"])]
    interactive: bool,

    /// Only show the invitation
    #[arg(short = 'D', long)]
    display_only: bool,

    /// Print the reply email instead of sending it
    #[arg(short = 'n', long)]
    dry_run: bool,

    /// Log filter used when RUST_LOG is unset
    #[arg(long, default_value = "warn")]
    log_level: String,

    /// Log as JSON lines
    #[arg(long)]
    json_logs: bool,

    /// Config file (default: ~/.config/ical-reply/config.toml)
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
}

impl Cli {
    /// At most one of the state flags survives parsing.
    fn state_choice(&self) -> Option<StateChoice> {
        if self.accept {
            Some(StateChoice::Fixed(ResponseState::Accepted))
        } else if self.decline {
            Some(StateChoice::Fixed(ResponseState::Declined))
        } else if self.tentative {
            Some(StateChoice::Fixed(ResponseState::Tentative))
        } else if self.interactive {
            Some(StateChoice::Ask)
        } else {
            None
        }
    }

    fn into_args(self) -> ReplyArgs {
        let state = self.state_choice();
        ReplyArgs {
            filename: self.filename,
            email: self.email,
            sendmail: self.sendmail,
            state,
            display_only: self.display_only,
            dry_run: self.dry_run,
            config: self.config,
        }
    }
}

fn init_telemetry(cli: &Cli) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));

    let registry = tracing_subscriber::registry().with(filter);

    // stdout carries the invitation and --dry-run output
    if cli.json_logs {
        registry
            .with(fmt::layer().json().with_target(true).with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_thread_ids(false)
                    .with_writer(std::io::stderr),
            )
            .init();
    }
}

fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let _ = e.print();
            // --help and --version also end up here
            return if e.use_stderr() {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            };
        }
    };

    init_telemetry(&cli);

    match commands::reply::run(cli.into_args()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            if matches!(e.downcast_ref::<ReplyError>(), Some(ReplyError::UserCancelled)) {
                eprintln!("aborted");
            } else {
                eprintln!("{} {e:#}", "Error:".red());
            }
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("ical-reply").chain(args.iter().copied()))
            .expect("Should parse")
    }

    #[test]
    fn test_last_state_flag_wins() {
        let cli = parse(&["-a", "-d", "-t", "invite.ics"]);
        assert!(matches!(
            cli.state_choice(),
            Some(StateChoice::Fixed(ResponseState::Tentative))
        ));

        let cli = parse(&["-i", "-a", "invite.ics"]);
        assert!(matches!(
            cli.state_choice(),
            Some(StateChoice::Fixed(ResponseState::Accepted))
        ));

        let cli = parse(&["-d", "-i", "invite.ics"]);
        assert!(matches!(cli.state_choice(), Some(StateChoice::Ask)));
    }

    #[test]
    fn test_no_state_flag() {
        let cli = parse(&["-e", "alice@x.com", "invite.ics"]);
        assert!(cli.state_choice().is_none());
        assert_eq!(cli.email.as_deref(), Some("alice@x.com"));
        assert_eq!(cli.log_level, "warn");
    }

    #[test]
    fn test_filename_is_optional_at_parse_time() {
        let cli = parse(&["-D"]);
        assert!(cli.filename.is_none());
        assert!(cli.display_only);
    }

    #[test]
    fn test_sendmail_override() {
        let cli = parse(&["-s", "msmtp -a work", "invite.ics"]);
        assert_eq!(cli.sendmail.as_deref(), Some("msmtp -a work"));
    }
}
