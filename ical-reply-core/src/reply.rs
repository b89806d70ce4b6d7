//! Building the REPLY calendar object.

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use crate::attendee::{calendar_address, find_matching_attendee};
use crate::error::{ReplyError, ReplyResult};
use crate::ics::{CalDateTime, Component, Property, TimezoneResolver, Zone, generate_reply_ics};
use crate::invitation::Invitation;
use crate::message::OutgoingMessage;
use crate::response::ResponseState;

/// Event properties copied verbatim from the invitation, in this order.
const COPIED_PROPERTIES: [&str; 5] = ["UID", "SUMMARY", "DTSTART", "DTEND", "ORGANIZER"];

const PRIORITY: &str = "5";
const BUSY_STATUS: &str = "X-MICROSOFT-CDO-BUSYSTATUS";

/// A calendar object with METHOD:REPLY holding exactly one event.
#[derive(Debug, Clone)]
pub struct Reply {
    event: Component,
    timezones: Vec<Component>,
}

impl Reply {
    pub fn method(&self) -> &'static str {
        "REPLY"
    }

    pub fn event(&self) -> &Component {
        &self.event
    }

    pub fn timezones(&self) -> &[Component] {
        &self.timezones
    }

    pub fn summary(&self) -> Option<String> {
        self.event.property("SUMMARY").map(|p| p.value.clone())
    }

    pub fn organizer_address(&self) -> ReplyResult<String> {
        let organizer = self.event.property("ORGANIZER").ok_or(ReplyError::NoOrganizer)?;
        calendar_address(organizer)
    }

    pub fn attendees(&self) -> impl Iterator<Item = &Property> {
        self.event.properties_named("ATTENDEE")
    }

    pub fn dtstamp(&self) -> Option<CalDateTime> {
        let resolver = TimezoneResolver::from_components(&self.timezones);
        CalDateTime::from_property(self.event.property("DTSTAMP")?, &resolver)
    }

    /// Serialize as text/calendar.
    pub fn to_ics(&self) -> ReplyResult<String> {
        generate_reply_ics(self)
    }
}

/// First half of a reply: everything that comes from the invitation alone.
///
/// Created before the attendee state is touched, completed with
/// [`ReplyBuilder::finish`] once the answering attendee is known.
#[derive(Debug, Clone)]
pub struct ReplyBuilder {
    event: Component,
    timezones: Vec<Component>,
}

impl ReplyBuilder {
    pub fn new(invitation: &Invitation) -> Self {
        Self::at(invitation, Utc::now())
    }

    /// Like [`ReplyBuilder::new`], stamping the reply with `now`.
    pub fn at(invitation: &Invitation, now: DateTime<Utc>) -> Self {
        let mut event = Component::new("VEVENT");

        for name in COPIED_PROPERTIES {
            if let Some(prop) = invitation.event().property(name) {
                event.push(prop.clone());
            }
        }
        let timezones = invitation.timezones().to_vec();

        // DTSTAMP keeps the zone the organizer used
        let dtstamp = match invitation.dtstamp() {
            Some(original) => original.now_like(now),
            None => {
                warn!("Invitation has no readable DTSTAMP, stamping reply in UTC");
                CalDateTime::DateTime {
                    local: now.naive_utc(),
                    zone: Zone::Utc,
                }
            }
        };
        event.set(dtstamp.to_property("DTSTAMP"));

        ReplyBuilder { event, timezones }
    }

    /// Attach the answering attendee and the state-dependent fields.
    pub fn finish(mut self, attendee: Property, state: ResponseState) -> Reply {
        self.event.remove("ATTENDEE");
        self.event.push(attendee);
        self.event.set(Property::new("PRIORITY", PRIORITY));

        if let Some(status) = state.event_status() {
            self.event.set(Property::new("STATUS", status));
        }
        if let Some(busy) = state.busy_status() {
            self.event.set(Property::new(BUSY_STATUS, busy));
        }

        Reply {
            event: self.event,
            timezones: self.timezones,
        }
    }
}

/// A finished reply together with everything needed to mail it.
#[derive(Debug, Clone)]
pub struct PreparedReply {
    pub reply: Reply,
    pub state: ResponseState,
    /// The answering attendee's address (mail From)
    pub from: String,
    /// The organizer's address (mail To)
    pub to: String,
    pub subject: String,
    pub body: String,
}

impl PreparedReply {
    /// Answer `invitation` as `email` with `state`.
    ///
    /// Marks the invitation's attendees with `state`. Fails without building
    /// anything mailable if `email` is not invited or there is no organizer.
    pub fn prepare(
        invitation: &mut Invitation,
        email: &str,
        state: ResponseState,
    ) -> ReplyResult<Self> {
        Self::prepare_at(invitation, email, state, Utc::now())
    }

    pub fn prepare_at(
        invitation: &mut Invitation,
        email: &str,
        state: ResponseState,
        now: DateTime<Utc>,
    ) -> ReplyResult<Self> {
        let builder = ReplyBuilder::at(invitation, now);

        invitation.set_accept_state(state);
        let attendee = find_matching_attendee(invitation.attendees(), email)?.clone();
        let reply = builder.finish(attendee, state);

        let to = reply.organizer_address()?;
        let subject = format!(
            "{}: {}",
            state.capitalized(),
            reply.summary().unwrap_or_default()
        );
        let body = state.body_text(email);

        debug!(%subject, "Built reply");
        info!(%state, from = email, %to, "Prepared reply");

        Ok(PreparedReply {
            reply,
            state,
            from: email.to_string(),
            to,
            subject,
            body,
        })
    }

    pub fn to_message(&self) -> ReplyResult<OutgoingMessage> {
        OutgoingMessage::from_reply(self)
    }
}
