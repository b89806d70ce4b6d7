//! Date-time values that remember the zone they were written in.

use std::fmt;

use chrono::{
    DateTime, Datelike, FixedOffset, Local, NaiveDate, NaiveDateTime, Offset, TimeDelta,
    TimeZone, Timelike, Utc,
};
use chrono_tz::Tz;
use tracing::warn;

use super::model::{Component, Property};

const DATE_FORMAT: &str = "%Y%m%d";
const DATE_TIME_FORMAT: &str = "%Y%m%dT%H%M%S";
const DISPLAY_FORMAT: &str = "%Y-%m-%d %H:%M %z";

/// The zone a date-time value is expressed in.
#[derive(Debug, Clone, PartialEq)]
pub enum Zone {
    /// `Z` suffix
    Utc,
    /// TZID naming an IANA zone
    Named(Tz),
    /// TZID pointing at a VTIMEZONE shipped inside the calendar file
    Defined(VTimezone),
    /// No zone information: wall-clock time wherever the reader is
    Floating,
}

/// A DTSTART/DTEND/DTSTAMP style value.
#[derive(Debug, Clone, PartialEq)]
pub enum CalDateTime {
    Date(NaiveDate),
    DateTime { local: NaiveDateTime, zone: Zone },
}

impl CalDateTime {
    /// Parse a date or date-time property, resolving its TZID against `zones`.
    pub fn from_property(prop: &Property, zones: &TimezoneResolver) -> Option<Self> {
        let value = prop.value.trim();

        let is_date = prop
            .param("VALUE")
            .is_some_and(|v| v.eq_ignore_ascii_case("DATE"))
            || value.len() == 8;
        if is_date {
            return NaiveDate::parse_from_str(value, DATE_FORMAT)
                .ok()
                .map(CalDateTime::Date);
        }

        if let Some(utc) = value.strip_suffix(['Z', 'z']) {
            return NaiveDateTime::parse_from_str(utc, DATE_TIME_FORMAT)
                .ok()
                .map(|local| CalDateTime::DateTime {
                    local,
                    zone: Zone::Utc,
                });
        }

        let local = NaiveDateTime::parse_from_str(value, DATE_TIME_FORMAT).ok()?;
        let zone = match prop.param("TZID") {
            Some(tzid) => zones.resolve(tzid),
            None => Zone::Floating,
        };
        Some(CalDateTime::DateTime { local, zone })
    }

    /// The absolute instant with the offset that was in effect, if there is one.
    pub fn to_fixed(&self) -> Option<DateTime<FixedOffset>> {
        let CalDateTime::DateTime { local, zone } = self else {
            return None;
        };
        match zone {
            Zone::Utc => Some(Utc.from_utc_datetime(local).fixed_offset()),
            Zone::Named(tz) => tz
                .from_local_datetime(local)
                .earliest()
                .map(|dt| dt.fixed_offset()),
            Zone::Defined(vtz) => vtz.offset_at_local(*local).from_local_datetime(local).single(),
            Zone::Floating => Local
                .from_local_datetime(local)
                .earliest()
                .map(|dt| dt.fixed_offset()),
        }
    }

    pub fn offset(&self) -> Option<FixedOffset> {
        self.to_fixed().map(|dt| *dt.offset())
    }

    /// Render as `YYYY-MM-DD HH:MM ±ZZZZ` in the given zone.
    pub fn formatted_in<Z>(&self, tz: &Z) -> String
    where
        Z: TimeZone,
        Z::Offset: fmt::Display,
    {
        match self {
            CalDateTime::Date(date) => date.format("%Y-%m-%d 00:00").to_string(),
            CalDateTime::DateTime { local, .. } => match self.to_fixed() {
                Some(dt) => dt.with_timezone(tz).format(DISPLAY_FORMAT).to_string(),
                // Wall-clock time that does not exist in its zone (DST gap)
                None => local.format("%Y-%m-%d %H:%M").to_string(),
            },
        }
    }

    /// Render in the system's local zone.
    pub fn formatted_local(&self) -> String {
        self.formatted_in(&Local)
    }

    /// `now`, expressed in the same zone as this value.
    pub fn now_like(&self, now: DateTime<Utc>) -> CalDateTime {
        let now = now.with_nanosecond(0).unwrap_or(now);
        let zone = match self {
            CalDateTime::DateTime { zone, .. } => zone.clone(),
            CalDateTime::Date(_) => Zone::Utc,
        };
        let local = match &zone {
            Zone::Utc => now.naive_utc(),
            Zone::Named(tz) => now.with_timezone(tz).naive_local(),
            Zone::Defined(vtz) => {
                let utc = now.naive_utc();
                utc + offset_delta(vtz.offset_at_utc(utc))
            }
            Zone::Floating => now.with_timezone(&Local).naive_local(),
        };
        CalDateTime::DateTime { local, zone }
    }

    /// Content line for this value under the given property name.
    pub fn to_property(&self, name: &str) -> Property {
        match self {
            CalDateTime::Date(date) => Property::new(name, date.format(DATE_FORMAT).to_string())
                .with_param("VALUE", "DATE"),
            CalDateTime::DateTime { local, zone } => {
                let value = local.format(DATE_TIME_FORMAT).to_string();
                match zone {
                    Zone::Utc => Property::new(name, format!("{value}Z")),
                    Zone::Named(tz) => Property::new(name, value).with_param("TZID", tz.name()),
                    Zone::Defined(vtz) => {
                        Property::new(name, value).with_param("TZID", vtz.tzid.as_str())
                    }
                    Zone::Floating => Property::new(name, value),
                }
            }
        }
    }
}

impl fmt::Display for CalDateTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.formatted_local())
    }
}

/// Looks up TZIDs: IANA names first, then VTIMEZONEs from the calendar file.
#[derive(Debug, Clone, Default)]
pub struct TimezoneResolver {
    defined: Vec<VTimezone>,
}

impl TimezoneResolver {
    pub fn from_components<'a>(components: impl IntoIterator<Item = &'a Component>) -> Self {
        let defined = components
            .into_iter()
            .filter(|c| c.is("VTIMEZONE"))
            .filter_map(VTimezone::from_component)
            .collect();
        TimezoneResolver { defined }
    }

    pub fn resolve(&self, tzid: &str) -> Zone {
        // Some producers write TZID=/Europe/Berlin (globally unique prefix)
        let name = tzid.trim().trim_start_matches('/');
        if let Ok(tz) = name.parse::<Tz>() {
            return Zone::Named(tz);
        }
        if let Some(vtz) = self.defined.iter().find(|v| v.tzid == tzid) {
            return Zone::Defined(vtz.clone());
        }
        warn!(tzid, "Unknown timezone, treating time as floating");
        Zone::Floating
    }
}

/// A timezone defined inline by a VTIMEZONE component.
#[derive(Debug, Clone, PartialEq)]
pub struct VTimezone {
    pub tzid: String,
    observances: Vec<Observance>,
}

/// One STANDARD or DAYLIGHT block.
#[derive(Debug, Clone, PartialEq)]
struct Observance {
    onset: NaiveDateTime,
    offset_from: FixedOffset,
    offset_to: FixedOffset,
    yearly: bool,
}

impl VTimezone {
    pub fn from_component(component: &Component) -> Option<Self> {
        let tzid = component.property("TZID")?.value.clone();
        let observances: Vec<Observance> = component
            .components
            .iter()
            .filter(|c| c.is("STANDARD") || c.is("DAYLIGHT"))
            .filter_map(Observance::from_component)
            .collect();
        if observances.is_empty() {
            return None;
        }
        Some(VTimezone { tzid, observances })
    }

    /// Offset in effect at a UTC instant.
    ///
    /// Recurring observances are assumed to start on the same month/day every
    /// year, so weekday rules (BYDAY=-1SU) can be off by up to a week.
    pub fn offset_at_utc(&self, instant: NaiveDateTime) -> FixedOffset {
        self.observances
            .iter()
            .filter_map(|o| o.last_onset_utc(instant).map(|onset| (onset, o.offset_to)))
            .max_by_key(|(onset, _)| *onset)
            .map(|(_, offset)| offset)
            .or_else(|| {
                self.observances
                    .iter()
                    .min_by_key(|o| o.onset)
                    .map(|o| o.offset_from)
            })
            .unwrap_or_else(|| Utc.fix())
    }

    /// Offset in effect at a wall-clock time in this zone.
    pub fn offset_at_local(&self, local: NaiveDateTime) -> FixedOffset {
        let guess = self.offset_at_utc(local);
        self.offset_at_utc(local - offset_delta(guess))
    }
}

impl Observance {
    fn from_component(component: &Component) -> Option<Self> {
        let onset =
            NaiveDateTime::parse_from_str(component.property("DTSTART")?.value.trim(), DATE_TIME_FORMAT)
                .ok()?;
        let offset_to = parse_utc_offset(&component.property("TZOFFSETTO")?.value)?;
        let offset_from = component
            .property("TZOFFSETFROM")
            .and_then(|p| parse_utc_offset(&p.value))
            .unwrap_or(offset_to);
        Some(Observance {
            onset,
            offset_from,
            offset_to,
            yearly: component.has_property("RRULE"),
        })
    }

    fn last_onset_utc(&self, instant: NaiveDateTime) -> Option<NaiveDateTime> {
        let to_utc = |local: NaiveDateTime| local - offset_delta(self.offset_from);
        let first = to_utc(self.onset);
        if first > instant {
            return None;
        }
        if !self.yearly {
            return Some(first);
        }
        let in_year = |year: i32| self.onset.with_year(year).map(to_utc);
        match in_year(instant.year()) {
            Some(onset) if onset <= instant => Some(onset),
            _ => in_year(instant.year() - 1).or(Some(first)),
        }
    }
}

fn offset_delta(offset: FixedOffset) -> TimeDelta {
    TimeDelta::seconds(i64::from(offset.local_minus_utc()))
}

/// Parse a UTC offset like `+0200`, `-0500` or `+053000`.
fn parse_utc_offset(s: &str) -> Option<FixedOffset> {
    let s = s.trim();
    let (sign, digits) = if let Some(rest) = s.strip_prefix('+') {
        (1, rest)
    } else if let Some(rest) = s.strip_prefix('-') {
        (-1, rest)
    } else {
        return None;
    };
    if !matches!(digits.len(), 4 | 6) || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let hours: i32 = digits[0..2].parse().ok()?;
    let minutes: i32 = digits[2..4].parse().ok()?;
    let seconds: i32 = if digits.len() == 6 {
        digits[4..6].parse().ok()?
    } else {
        0
    };
    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60 + seconds))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn berlin_vtimezone() -> Component {
        let mut standard = Component::new("STANDARD");
        standard.push(Property::new("DTSTART", "16011028T030000"));
        standard.push(Property::new("RRULE", "FREQ=YEARLY;BYDAY=-1SU;BYMONTH=10"));
        standard.push(Property::new("TZOFFSETFROM", "+0200"));
        standard.push(Property::new("TZOFFSETTO", "+0100"));

        let mut daylight = Component::new("DAYLIGHT");
        daylight.push(Property::new("DTSTART", "16010325T020000"));
        daylight.push(Property::new("RRULE", "FREQ=YEARLY;BYDAY=-1SU;BYMONTH=3"));
        daylight.push(Property::new("TZOFFSETFROM", "+0100"));
        daylight.push(Property::new("TZOFFSETTO", "+0200"));

        let mut vtz = Component::new("VTIMEZONE");
        vtz.push(Property::new("TZID", "W. Europe Standard Time"));
        vtz.components = vec![standard, daylight];
        vtz
    }

    fn utc(s: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(s, DATE_TIME_FORMAT).unwrap()
    }

    #[test]
    fn test_parse_utc_value() {
        let prop = Property::new("DTSTART", "20250320T150000Z");
        let value = CalDateTime::from_property(&prop, &TimezoneResolver::default()).unwrap();

        assert_eq!(
            value,
            CalDateTime::DateTime {
                local: utc("20250320T150000"),
                zone: Zone::Utc
            }
        );
        assert_eq!(value.formatted_in(&Utc), "2025-03-20 15:00 +0000");
    }

    #[test]
    fn test_parse_named_zone_converts_for_display() {
        let prop = Property::new("DTSTART", "20250715T100000").with_param("TZID", "Europe/Berlin");
        let value = CalDateTime::from_property(&prop, &TimezoneResolver::default()).unwrap();

        let plus_one = FixedOffset::east_opt(3600).unwrap();
        assert_eq!(value.formatted_in(&plus_one), "2025-07-15 09:00 +0100");
        assert_eq!(value.offset(), FixedOffset::east_opt(2 * 3600));
    }

    #[test]
    fn test_parse_all_day_date() {
        let prop = Property::new("DTSTART", "20250320").with_param("VALUE", "DATE");
        let value = CalDateTime::from_property(&prop, &TimezoneResolver::default()).unwrap();

        assert_eq!(value, CalDateTime::Date(NaiveDate::from_ymd_opt(2025, 3, 20).unwrap()));
        assert_eq!(value.formatted_in(&Utc), "2025-03-20 00:00");
        assert_eq!(value.offset(), None);
    }

    #[test]
    fn test_unknown_tzid_resolves_through_vtimezone() {
        let vtz = berlin_vtimezone();
        let resolver = TimezoneResolver::from_components([&vtz]);

        let summer = Property::new("DTSTART", "20250701T120000")
            .with_param("TZID", "W. Europe Standard Time");
        let value = CalDateTime::from_property(&summer, &resolver).unwrap();
        assert_eq!(value.offset(), FixedOffset::east_opt(2 * 3600));

        let winter = Property::new("DTSTART", "20250115T120000")
            .with_param("TZID", "W. Europe Standard Time");
        let value = CalDateTime::from_property(&winter, &resolver).unwrap();
        assert_eq!(value.offset(), FixedOffset::east_opt(3600));
    }

    #[test]
    fn test_unresolvable_tzid_is_floating() {
        let prop = Property::new("DTSTART", "20250701T120000").with_param("TZID", "Nowhere/Special");
        let value = CalDateTime::from_property(&prop, &TimezoneResolver::default()).unwrap();
        assert!(matches!(
            value,
            CalDateTime::DateTime {
                zone: Zone::Floating,
                ..
            }
        ));
    }

    #[test]
    fn test_now_like_keeps_defined_zone() {
        let vtz = berlin_vtimezone();
        let resolver = TimezoneResolver::from_components([&vtz]);
        let stamp = Property::new("DTSTAMP", "20250101T080000")
            .with_param("TZID", "W. Europe Standard Time");
        let stamp = CalDateTime::from_property(&stamp, &resolver).unwrap();

        let now = Utc.with_ymd_and_hms(2025, 7, 1, 10, 0, 0).unwrap();
        let reexpressed = stamp.now_like(now);

        assert_eq!(reexpressed.offset(), FixedOffset::east_opt(2 * 3600));
        let prop = reexpressed.to_property("DTSTAMP");
        assert_eq!(prop.value, "20250701T120000");
        assert_eq!(prop.param("TZID"), Some("W. Europe Standard Time"));
    }

    #[test]
    fn test_now_like_utc_stays_utc() {
        let stamp = Property::new("DTSTAMP", "20240101T000000Z");
        let stamp = CalDateTime::from_property(&stamp, &TimezoneResolver::default()).unwrap();
        let now = Utc.with_ymd_and_hms(2025, 7, 1, 10, 0, 0).unwrap();

        assert_eq!(stamp.now_like(now).to_property("DTSTAMP").value, "20250701T100000Z");
    }

    #[test]
    fn test_parse_utc_offset() {
        assert_eq!(parse_utc_offset("+0200"), FixedOffset::east_opt(7200));
        assert_eq!(parse_utc_offset("-0530"), FixedOffset::east_opt(-(5 * 3600 + 30 * 60)));
        assert_eq!(parse_utc_offset("+013015"), FixedOffset::east_opt(3600 + 30 * 60 + 15));
        assert_eq!(parse_utc_offset("0200"), None);
        assert_eq!(parse_utc_offset("+2"), None);
    }
}
