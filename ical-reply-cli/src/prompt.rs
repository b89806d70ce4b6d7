use anyhow::Result;
use dialoguer::Input;
use ical_reply_core::{ReplyError, ResponseState};
use owo_colors::OwoColorize;

const PROMPT: &str = "Accept Invitation? [Y]es/[n]o/[t]entative/[c]ancel";

#[derive(Debug, PartialEq, Eq)]
enum Answer {
    State(ResponseState),
    Cancel,
}

/// Map a typed answer; `None` means ask again.
fn parse_answer(input: &str) -> Option<Answer> {
    match input.trim().to_ascii_lowercase().as_str() {
        "" | "y" => Some(Answer::State(ResponseState::Accepted)),
        "n" => Some(Answer::State(ResponseState::Declined)),
        "t" => Some(Answer::State(ResponseState::Tentative)),
        "c" => Some(Answer::Cancel),
        _ => None,
    }
}

/// Ask until the answer is one of y/n/t/c. Cancelling is `ReplyError::UserCancelled`.
pub fn ask_response() -> Result<ResponseState> {
    loop {
        let input: String = Input::new()
            .with_prompt(PROMPT)
            .allow_empty(true)
            .interact_text()?;
        match parse_answer(&input) {
            Some(Answer::State(state)) => return Ok(state),
            Some(Answer::Cancel) => return Err(ReplyError::UserCancelled.into()),
            None => eprintln!("  {}", format!("Unknown answer: {input}").red()),
        }
    }
}

/// Block until the operator hits return.
pub fn acknowledge() -> Result<()> {
    let _: String = Input::new()
        .with_prompt("Press return to continue")
        .allow_empty(true)
        .interact_text()?;
    Ok(())
}
