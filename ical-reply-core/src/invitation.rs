//! Typed access to a parsed invitation.

use crate::attendee::calendar_address;
use crate::error::{ReplyError, ReplyResult};
use crate::ics::{CalDateTime, Component, Property, TimezoneResolver};
use crate::response::ResponseState;

/// A parsed calendar invitation: calendar-level properties, the single event
/// being answered, and the VTIMEZONEs its times refer to.
#[derive(Debug, Clone)]
pub struct Invitation {
    calendar_properties: Vec<Property>,
    event: Component,
    timezones: Vec<Component>,
}

impl Invitation {
    pub fn new(calendar_properties: Vec<Property>, event: Component, timezones: Vec<Component>) -> Self {
        Invitation {
            calendar_properties,
            event,
            timezones,
        }
    }

    /// METHOD of the calendar, e.g. REQUEST.
    pub fn method(&self) -> Option<&str> {
        self.calendar_properties
            .iter()
            .find(|p| p.is("METHOD"))
            .map(|p| p.value.as_str())
    }

    pub fn event(&self) -> &Component {
        &self.event
    }

    pub fn timezones(&self) -> &[Component] {
        &self.timezones
    }

    pub fn resolver(&self) -> TimezoneResolver {
        TimezoneResolver::from_components(&self.timezones)
    }

    pub fn uid(&self) -> Option<&str> {
        self.event.property("UID").map(|p| p.value.as_str())
    }

    pub fn summary(&self) -> Option<String> {
        self.event.property("SUMMARY").map(|p| p.value.clone())
    }

    pub fn description(&self) -> Option<String> {
        self.event.property("DESCRIPTION").map(|p| p.value.clone())
    }

    /// All non-empty LOCATION values, in file order.
    pub fn locations(&self) -> Vec<String> {
        self.event
            .properties_named("LOCATION")
            .map(|p| p.value.clone())
            .filter(|l| !l.is_empty())
            .collect()
    }

    pub fn organizer(&self) -> Option<&Property> {
        self.event.property("ORGANIZER")
    }

    /// Address of the organizer; the reply is sent there.
    pub fn organizer_address(&self) -> ReplyResult<String> {
        let organizer = self.organizer().ok_or(ReplyError::NoOrganizer)?;
        calendar_address(organizer)
    }

    pub fn attendees(&self) -> impl Iterator<Item = &Property> {
        self.event.properties_named("ATTENDEE")
    }

    pub fn attendees_mut(&mut self) -> impl Iterator<Item = &mut Property> {
        self.event.properties_named_mut("ATTENDEE")
    }

    /// Record `state` on every attendee of this invitation.
    pub fn set_accept_state(&mut self, state: ResponseState) {
        crate::attendee::set_accept_state(self.attendees_mut(), state);
    }

    pub fn start(&self) -> Option<CalDateTime> {
        self.date_time("DTSTART")
    }

    pub fn end(&self) -> Option<CalDateTime> {
        self.date_time("DTEND")
    }

    pub fn dtstamp(&self) -> Option<CalDateTime> {
        self.date_time("DTSTAMP")
    }

    fn date_time(&self, name: &str) -> Option<CalDateTime> {
        let prop = self.event.property(name)?;
        CalDateTime::from_property(prop, &self.resolver())
    }
}
