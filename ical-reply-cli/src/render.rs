//! Terminal rendering for invitations.

use ical_reply_core::Invitation;
use ical_reply_core::attendee::{calendar_address, display_name};
use owo_colors::OwoColorize;

/// Extension trait for TUI rendering with colors.
pub trait Render {
    fn render(&self) -> String;
}

impl Render for Invitation {
    fn render(&self) -> String {
        let (fields, description) = invitation_fields(self);

        let mut lines: Vec<String> = fields
            .into_iter()
            .map(|(label, value)| format!("{} {}", format!("{label:<9}").bold(), value))
            .collect();
        lines.push(String::new());
        lines.push(description.unwrap_or_else(|| "NO DESCRIPTION".dimmed().to_string()));
        lines.join("\n")
    }
}

/// Labelled header fields in display order, plus the description.
fn invitation_fields(invitation: &Invitation) -> (Vec<(&'static str, String)>, Option<String>) {
    let mut fields = Vec::new();

    let sender = invitation
        .organizer_address()
        .unwrap_or_else(|_| "NO SENDER".to_string());
    fields.push(("From:", sender));
    fields.push(("Title:", invitation.summary().unwrap_or_default()));

    let attendees: Vec<String> = invitation
        .attendees()
        .map(|attendee| {
            let address = calendar_address(attendee).unwrap_or_else(|_| attendee.value.clone());
            let name = display_name(attendee).unwrap_or(&address);
            format!("{name} <{address}>")
        })
        .collect();
    fields.push(("To:", attendees.join(", ")));

    if let Some(start) = invitation.start() {
        fields.push(("Start:", start.formatted_local()));
    }
    if let Some(end) = invitation.end() {
        fields.push(("End:", end.formatted_local()));
    }

    let locations = invitation.locations();
    if !locations.is_empty() {
        fields.push(("Location:", locations.join(", ")));
    }

    (fields, invitation.description())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ical_reply_core::ics::parse_invitation;

    #[test]
    fn test_fields_in_order() {
        let invitation = parse_invitation(
            "BEGIN:VCALENDAR\n\
VERSION:2.0\n\
METHOD:REQUEST\n\
BEGIN:VEVENT\n\
UID:1\n\
SUMMARY:Planning\n\
DESCRIPTION:Bring slides\n\
LOCATION:Room 1\n\
LOCATION:Room 2\n\
DTSTART:20250312\n\
ORGANIZER:mailto:carol@example.com\n\
ATTENDEE;CN=Alice:mailto:alice@x.com\n\
ATTENDEE:mailto:bob@x.com\n\
END:VEVENT\n\
END:VCALENDAR\n",
        )
        .expect("Should parse");

        let (fields, description) = invitation_fields(&invitation);
        let labels: Vec<&str> = fields.iter().map(|(l, _)| *l).collect();
        assert_eq!(labels, vec!["From:", "Title:", "To:", "Start:", "Location:"]);
        assert_eq!(fields[0].1, "carol@example.com");
        assert_eq!(fields[2].1, "Alice <alice@x.com>, bob@x.com <bob@x.com>");
        assert_eq!(fields[3].1, "2025-03-12 00:00");
        assert_eq!(fields[4].1, "Room 1, Room 2");
        assert_eq!(description.as_deref(), Some("Bring slides"));
    }

    #[test]
    fn test_placeholders() {
        let invitation = parse_invitation(
            "BEGIN:VCALENDAR\n\
VERSION:2.0\n\
BEGIN:VEVENT\n\
UID:1\n\
SUMMARY:Lonely\n\
END:VEVENT\n\
END:VCALENDAR\n",
        )
        .expect("Should parse");

        let (fields, description) = invitation_fields(&invitation);
        assert_eq!(fields[0], ("From:", "NO SENDER".to_string()));
        assert_eq!(description, None);
        assert!(invitation.render().contains("NO DESCRIPTION"));
    }
}
