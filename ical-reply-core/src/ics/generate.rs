//! ICS generation for replies.

use std::borrow::Cow;

use icalendar::{Calendar, Component as _};

use super::model::{Component, Property};
use crate::error::ReplyResult;
use crate::reply::Reply;

const PRODID_LINE: &str = "PRODID:-//ical-reply//EN";
/// RFC 5545 content lines are folded after 75 octets.
const MAX_LINE_OCTETS: usize = 75;

/// Generate the text/calendar body for a reply.
pub fn generate_reply_ics(reply: &Reply) -> ReplyResult<String> {
    let mut cal = Calendar::new();
    cal.append_property(icalendar::Property::new("METHOD", reply.method()));

    let mut ics_event = icalendar::Event::new();
    for prop in &reply.event().properties {
        let ical_prop = to_ical_property(prop);
        if prop.is("ATTENDEE") {
            ics_event.append_multi_property(ical_prop);
        } else {
            ics_event.append_property(ical_prop);
        }
    }

    let ics_event = ics_event.done();
    cal.push(ics_event);
    let cal = cal.done();

    let has_uid = reply.event().has_property("UID");
    Ok(finish_ics(&cal.to_string(), reply.timezones(), has_uid))
}

fn to_ical_property(prop: &Property) -> icalendar::Property {
    let mut ical_prop = icalendar::Property::new(prop.name.as_str(), prop.value.as_str());
    for param in &prop.params {
        ical_prop.add_parameter(param.name.as_str(), &param_value(&param.value));
    }
    ical_prop
}

/// Post-process the icalendar crate's output
/// - Replace PRODID with our own
/// - Remove CALSCALE:GREGORIAN (it's the default)
/// - Insert the copied VTIMEZONEs ahead of the event that references them
/// - Drop the random UID the builder makes up when the invitation had none
fn finish_ics(ics: &str, timezones: &[Component], has_uid: bool) -> String {
    let mut result = String::with_capacity(ics.len());

    for line in ics.lines() {
        if !has_uid && line.starts_with("UID:") {
            continue;
        }

        if line.starts_with("PRODID:") {
            result.push_str(PRODID_LINE);
            result.push_str("\r\n");
            continue;
        }

        if line == "CALSCALE:GREGORIAN" {
            continue;
        }

        if line == "BEGIN:VEVENT" {
            for timezone in timezones {
                write_component(&mut result, timezone);
            }
        }

        result.push_str(line);
        result.push_str("\r\n");
    }

    result
}

fn write_component(out: &mut String, component: &Component) {
    out.push_str(&format!("BEGIN:{}\r\n", component.name));
    for prop in &component.properties {
        out.push_str(&fold(&content_line(prop)));
        out.push_str("\r\n");
    }
    for child in &component.components {
        write_component(out, child);
    }
    out.push_str(&format!("END:{}\r\n", component.name));
}

fn content_line(prop: &Property) -> String {
    let mut line = prop.name.clone();
    for param in &prop.params {
        line.push(';');
        line.push_str(&param.name);
        line.push('=');
        line.push_str(&param_value(&param.value));
    }
    line.push(':');
    if is_text(prop) {
        line.push_str(&escape_text(&prop.value));
    } else {
        line.push_str(&prop.value);
    }
    line
}

/// Quote parameter values containing `:`, `;` or `,`.
///
/// The builder only quotes `:` and `;`, and passes already quoted values through.
fn param_value(value: &str) -> Cow<'_, str> {
    if value.contains([':', ';', ',']) {
        Cow::Owned(format!("\"{value}\""))
    } else {
        Cow::Borrowed(value)
    }
}

/// Whether the parser decoded this value as TEXT.
fn is_text(prop: &Property) -> bool {
    match prop.param("VALUE") {
        Some(value_type) => value_type.eq_ignore_ascii_case("TEXT"),
        None => {
            matches!(
                prop.name.as_str(),
                "TZID" | "TZNAME" | "COMMENT" | "SUMMARY" | "DESCRIPTION" | "LOCATION" | "UID"
            ) || prop.name.starts_with("X-")
        }
    }
}

fn escape_text(value: &str) -> String {
    value
        .replace('\\', r"\\")
        .replace(',', r"\,")
        .replace(';', r"\;")
        .replace('\n', r"\n")
}

fn fold(line: &str) -> String {
    let mut folded = String::with_capacity(line.len() + line.len() / MAX_LINE_OCTETS * 3);
    let mut width = 0;
    for c in line.chars() {
        let len = c.len_utf8();
        if width + len > MAX_LINE_OCTETS {
            folded.push_str("\r\n ");
            width = 1;
        }
        folded.push(c);
        width += len;
    }
    folded
}

#[cfg(test)]
mod tests {
    use super::*;
    use icalendar::Component as _;

    fn vtimezone() -> Component {
        let mut standard = Component::new("STANDARD");
        standard.push(Property::new("DTSTART", "16010101T000000"));
        standard.push(Property::new("TZOFFSETFROM", "+0200"));
        standard.push(Property::new("TZOFFSETTO", "+0200"));

        let mut vtz = Component::new("VTIMEZONE");
        vtz.push(Property::new("TZID", "Custom; Zone"));
        vtz.components.push(standard);
        vtz
    }

    #[test]
    fn test_finish_ics_inserts_timezones_before_event() {
        let ics = "BEGIN:VCALENDAR\r\n\
VERSION:2.0\r\n\
PRODID:ICALENDAR-RS\r\n\
CALSCALE:GREGORIAN\r\n\
METHOD:REPLY\r\n\
BEGIN:VEVENT\r\n\
UID:1\r\n\
END:VEVENT\r\n\
END:VCALENDAR\r\n";

        let output = finish_ics(ics, &[vtimezone()], true);

        assert!(output.contains(PRODID_LINE));
        assert!(!output.contains("CALSCALE"));
        let tz_at = output.find("BEGIN:VTIMEZONE").expect("Should have VTIMEZONE");
        let event_at = output.find("BEGIN:VEVENT").expect("Should have VEVENT");
        assert!(tz_at < event_at, "VTIMEZONE must precede VEVENT:\n{output}");
        assert!(output.contains("BEGIN:STANDARD\r\nDTSTART:16010101T000000\r\n"));
        assert!(output.contains("TZID:Custom\\; Zone\r\n"), "{output}");
        assert!(output.contains("UID:1\r\n"));
    }

    #[test]
    fn test_finish_ics_drops_made_up_uid() {
        let ics = "BEGIN:VCALENDAR\r\n\
METHOD:REPLY\r\n\
BEGIN:VEVENT\r\n\
DTSTAMP:20250310T093000Z\r\n\
UID:25cd3a76-ef3a-4f7c-9934-4a04937774d5\r\n\
END:VEVENT\r\n\
END:VCALENDAR\r\n";

        let output = finish_ics(ics, &[], false);
        assert!(!output.contains("UID:"), "{output}");
        assert!(output.contains("DTSTAMP:20250310T093000Z\r\n"));
    }

    #[test]
    fn test_content_line_quotes_special_parameter_values() {
        let prop = Property::new("ATTENDEE", "mailto:a@example.com").with_param("CN", "Doe, Jane");
        assert_eq!(content_line(&prop), "ATTENDEE;CN=\"Doe, Jane\":mailto:a@example.com");
    }

    #[test]
    fn test_event_parameters_are_quoted() {
        let prop = Property::new("ATTENDEE", "mailto:jane@x.com")
            .with_param("CN", "Doe, Jane")
            .with_param("PARTSTAT", "ACCEPTED");
        let ical_prop = to_ical_property(&prop);

        let mut event = icalendar::Event::new();
        event.append_multi_property(ical_prop);
        let mut cal = Calendar::new();
        cal.push(event.done());
        let text = cal.to_string();

        assert!(
            text.contains("ATTENDEE;CN=\"Doe, Jane\";PARTSTAT=ACCEPTED:mailto:jane@x.com"),
            "{text}"
        );
    }

    #[test]
    fn test_content_line_escapes_text_values() {
        let prop = Property::new("TZNAME", "CET, or so");
        assert_eq!(content_line(&prop), r"TZNAME:CET\, or so");

        let offset = Property::new("TZOFFSETTO", "+0100");
        assert_eq!(content_line(&offset), "TZOFFSETTO:+0100");
    }

    #[test]
    fn test_fold_long_lines() {
        let line = format!("DESCRIPTION:{}", "x".repeat(100));
        let folded = fold(&line);

        let parts: Vec<&str> = folded.split("\r\n").collect();
        assert_eq!(parts.len(), 2);
        assert_eq!(parts[0].len(), MAX_LINE_OCTETS);
        assert!(parts[1].starts_with(' '));
        assert_eq!(folded.replace("\r\n ", ""), line);
    }

    #[test]
    fn test_fold_does_not_split_multibyte_chars() {
        let line = format!("SUMMARY:{}", "ü".repeat(60));
        let folded = fold(&line);
        for part in folded.split("\r\n") {
            assert!(part.len() <= MAX_LINE_OCTETS);
        }
        assert_eq!(folded.replace("\r\n ", ""), line);
    }
}
