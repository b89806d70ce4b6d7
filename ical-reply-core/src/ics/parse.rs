//! ICS parsing using the icalendar crate's parser.

use std::path::Path;

use icalendar::parser::{self, read_calendar, unfold};
use tracing::{debug, warn};

use super::model::{Component, Parameter, Property};
use crate::error::{ReplyError, ReplyResult};
use crate::invitation::Invitation;

/// Read and parse an invitation file.
pub fn load_invitation(path: &Path) -> ReplyResult<Invitation> {
    let bytes = std::fs::read(path)
        .map_err(|e| ReplyError::Input(format!("{}: {e}", path.display())))?;
    let content = String::from_utf8_lossy(&bytes);
    debug!(path = %path.display(), bytes = bytes.len(), "Read invitation");
    parse_invitation(&content)
}

/// Parse ICS content into an Invitation.
///
/// Content lines that cannot be read are skipped instead of failing the whole
/// file. Only the first VEVENT is kept.
pub fn parse_invitation(content: &str) -> ReplyResult<Invitation> {
    let content = content.trim_start_matches('\u{feff}');
    let unfolded = unfold(content);
    let readable = drop_unreadable_lines(&unfolded);

    let calendar = read_calendar(&readable).map_err(|e| ReplyError::IcsParse(e.to_string()))?;

    let calendar_properties: Vec<Property> = calendar.properties.iter().map(to_property).collect();

    let mut events = calendar.components.iter().filter(|c| c.name == "VEVENT");
    let event = events
        .next()
        .map(to_component)
        .ok_or_else(|| ReplyError::IcsParse("no VEVENT in calendar".into()))?;
    let extra = events.count();
    if extra > 0 {
        warn!(extra, "Calendar contains more than one event, only the first is used");
    }

    let timezones: Vec<Component> = calendar
        .components
        .iter()
        .filter(|c| c.name == "VTIMEZONE")
        .map(to_component)
        .collect();

    Ok(Invitation::new(calendar_properties, event, timezones))
}

/// Keep only lines shaped like `NAME[;PARAMS]:VALUE`.
fn drop_unreadable_lines(unfolded: &str) -> String {
    let mut result = String::with_capacity(unfolded.len());
    for line in unfolded.lines() {
        let line = line.trim_end_matches('\r');
        if line.trim().is_empty() {
            continue;
        }
        let readable = line
            .find(':')
            .map(|colon| {
                let name = line[..colon].split(';').next().unwrap_or_default();
                !name.is_empty()
                    && name
                        .chars()
                        .all(|c| c.is_ascii_alphanumeric() || c == '-')
            })
            .unwrap_or(false);
        if !readable {
            warn!(line, "Skipping unreadable content line");
            continue;
        }
        result.push_str(line);
        result.push_str("\r\n");
    }
    result
}

fn to_component(parsed: &parser::Component<'_>) -> Component {
    Component {
        name: parsed.name.to_string().to_ascii_uppercase(),
        properties: parsed.properties.iter().map(to_property).collect(),
        components: parsed.components.iter().map(to_component).collect(),
    }
}

fn to_property(parsed: &parser::Property<'_>) -> Property {
    let params = parsed
        .params
        .iter()
        .map(|p| Parameter {
            name: p.key.to_string().to_ascii_uppercase(),
            value: p.val.as_ref().map(|v| v.to_string()).unwrap_or_default(),
        })
        .collect();

    Property {
        name: parsed.name.to_string().to_ascii_uppercase(),
        value: parsed.val.to_string(),
        params,
    }
}
