//! ICS parsing and generation.
//!
//! Parsing goes through the icalendar crate's parser into an owned property
//! bag; generation goes back out through the icalendar builder.

mod generate;
mod model;
mod parse;
mod time;

pub use generate::generate_reply_ics;
pub use model::{Component, Parameter, Property};
pub use parse::{load_invitation, parse_invitation};
pub use time::{CalDateTime, TimezoneResolver, VTimezone, Zone};
