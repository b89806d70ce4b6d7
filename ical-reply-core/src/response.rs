//! The user's answer to an invitation.

use std::fmt;
use std::str::FromStr;

use serde::Deserialize;

/// Participation status written into the reply (PARTSTAT).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseState {
    #[default]
    Accepted,
    Declined,
    Tentative,
}

impl ResponseState {
    pub fn as_ics_str(&self) -> &'static str {
        match self {
            ResponseState::Accepted => "ACCEPTED",
            ResponseState::Declined => "DECLINED",
            ResponseState::Tentative => "TENTATIVE",
        }
    }

    pub fn from_ics_str(s: &str) -> Option<Self> {
        match s.to_ascii_uppercase().as_str() {
            "ACCEPTED" => Some(ResponseState::Accepted),
            "DECLINED" => Some(ResponseState::Declined),
            "TENTATIVE" => Some(ResponseState::Tentative),
            _ => None,
        }
    }

    /// Used as the subject prefix, e.g. "Accepted".
    pub fn capitalized(&self) -> &'static str {
        match self {
            ResponseState::Accepted => "Accepted",
            ResponseState::Declined => "Declined",
            ResponseState::Tentative => "Tentative",
        }
    }

    /// STATUS of the reply event. Declining leaves it unset.
    pub fn event_status(&self) -> Option<&'static str> {
        match self {
            ResponseState::Accepted => Some("CONFIRMED"),
            ResponseState::Tentative => Some("TENTATIVE"),
            ResponseState::Declined => None,
        }
    }

    /// X-MICROSOFT-CDO-BUSYSTATUS of the reply event. Declining leaves it unset.
    pub fn busy_status(&self) -> Option<&'static str> {
        match self {
            ResponseState::Accepted => Some("BUSY"),
            ResponseState::Tentative => Some("TENTATIVE"),
            ResponseState::Declined => None,
        }
    }

    /// Plain-text mail body sent alongside the calendar part.
    pub fn body_text(&self, email: &str) -> String {
        match self {
            ResponseState::Accepted => format!(
                "Thank you for the invitation. I, {email}, will be attending."
            ),
            ResponseState::Tentative => format!(
                "Thank you for the invitation. I, {email}, am tentatively available and have marked this time on my calendar."
            ),
            ResponseState::Declined => format!(
                "Thank you for the invitation. Unfortunately, I, {email}, will not be able to attend."
            ),
        }
    }
}

impl fmt::Display for ResponseState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_ics_str())
    }
}

impl FromStr for ResponseState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ResponseState::from_ics_str(s).ok_or_else(|| format!("Unknown response state: {s}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_declined_sets_no_status_fields() {
        assert_eq!(ResponseState::Declined.event_status(), None);
        assert_eq!(ResponseState::Declined.busy_status(), None);
        assert_eq!(ResponseState::Accepted.event_status(), Some("CONFIRMED"));
        assert_eq!(ResponseState::Tentative.busy_status(), Some("TENTATIVE"));
    }

    #[test]
    fn test_body_text_mentions_email() {
        let body = ResponseState::Declined.body_text("me@example.com");
        assert_eq!(
            body,
            "Thank you for the invitation. Unfortunately, I, me@example.com, will not be able to attend."
        );
    }

    #[test]
    fn test_from_str_is_case_insensitive() {
        assert_eq!("tentative".parse(), Ok(ResponseState::Tentative));
        assert!("maybe".parse::<ResponseState>().is_err());
    }
}
