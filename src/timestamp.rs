//! Localized tooltips for server-rendered timestamps.

use crate::platform::{Control, Platform};
use chrono::{DateTime, FixedOffset, NaiveDateTime, TimeZone, Utc};
use tracing::warn;

pub const TOOLTIP_SELECTOR: &str = "[data-toggle='tooltip']";

/// Accepts RFC 3339, or a naive ISO-8601 date-time taken as UTC.
#[must_use]
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
	let raw = raw.trim();
	DateTime::parse_from_rfc3339(raw)
		.map(|at| at.with_timezone(&Utc))
		.ok()
		.or_else(|| {
			["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
				.iter()
				.find_map(|format| NaiveDateTime::parse_from_str(raw, format).ok())
				.map(|naive| Utc.from_utc_datetime(&naive))
		})
}

/// Formats like `Sep 4, 1986 8:30 PM` at the given offset east of UTC.
#[must_use]
pub fn format_timestamp(at: DateTime<Utc>, offset_minutes: i32) -> String {
	const FORMAT: &str = "%b %-d, %Y %-I:%M %p";
	match FixedOffset::east_opt(offset_minutes * 60) {
		Some(offset) => at.with_timezone(&offset).format(FORMAT).to_string(),
		None => at.format(FORMAT).to_string(),
	}
}

/// Sets the `title` of every tooltip element that carries a `data-timestamp`. Returns how many were set.
pub fn annotate_timestamps<P: Platform>(platform: &P, offset_minutes: i32) -> usize {
	let mut annotated = 0;
	for element in platform.query_all(TOOLTIP_SELECTOR) {
		let raw = match element.data("timestamp") {
			Some(raw) => raw,
			None => continue,
		};
		match parse_timestamp(&raw) {
			Some(at) => {
				element.set_attribute("title", &format_timestamp(at, offset_minutes));
				annotated += 1;
			}
			None => warn!(len = raw.len(), "Unparseable data-timestamp left as is."),
		}
	}
	annotated
}
