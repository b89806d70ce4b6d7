//! Attendee identity and participation state.

use tracing::{debug, warn};

use crate::error::{ReplyError, ReplyResult};
use crate::ics::Property;
use crate::response::ResponseState;

/// Parameters that only make sense on a request and are dropped once answered.
const NEGOTIATION_PARAMS: [&str; 4] = ["RSVP", "ROLE", "X-NUM-GUESTS", "CUTYPE"];

/// Email address of an ATTENDEE or ORGANIZER property.
///
/// Resolution order:
/// 1. the EMAIL parameter
/// 2. the value after the first `:` (`mailto:a@b`, and Exchange's `MAILTO:a@b`)
/// 3. the whole value, if it already looks like an address
pub fn calendar_address(prop: &Property) -> ReplyResult<String> {
    if let Some(email) = prop.param("EMAIL").map(str::trim).filter(|e| !e.is_empty()) {
        return Ok(email.to_string());
    }

    let value = prop.value.trim();
    if let Some((_, address)) = value.split_once(':') {
        return Ok(address.trim().to_string());
    }
    if value.contains('@') {
        return Ok(value.to_string());
    }
    Err(ReplyError::MalformedAttendee(prop.value.clone()))
}

/// Display name (CN parameter), if the producer supplied one.
pub fn display_name(prop: &Property) -> Option<&str> {
    prop.param("CN").map(str::trim).filter(|cn| !cn.is_empty())
}

/// Mark every given attendee with `state` and strip request-only parameters.
///
/// Applying the same state twice leaves the parameters unchanged.
pub fn set_accept_state<'a>(
    attendees: impl IntoIterator<Item = &'a mut Property>,
    state: ResponseState,
) {
    for attendee in attendees {
        attendee.set_param("PARTSTAT", state.as_ics_str());
        for name in NEGOTIATION_PARAMS {
            attendee.remove_param(name);
        }
    }
}

/// The first attendee whose address equals `email`, ignoring case.
///
/// Attendees whose address cannot be read are skipped.
pub fn find_matching_attendee<'a>(
    attendees: impl IntoIterator<Item = &'a Property>,
    email: &str,
) -> ReplyResult<&'a Property> {
    let wanted = email.trim();
    for attendee in attendees {
        match calendar_address(attendee) {
            Ok(address) if address.eq_ignore_ascii_case(wanted) => {
                debug!(%address, "Matched attendee");
                return Ok(attendee);
            }
            Ok(_) => {}
            Err(e) => warn!(error = %e, "Skipping attendee"),
        }
    }
    Err(ReplyError::NotInvited(wanted.to_string()))
}
