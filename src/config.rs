//! Page-global values the server injects into every rendered page.

use core::time::Duration;
use serde::{
	de::{Error as _, Unexpected},
	Deserialize,
};
use serde_json::Value;

pub const DEFAULT_ERROR_MESSAGE: &str = "Server error, please try again later.";
pub const DEFAULT_CSRF_HEADER: &str = "X-CSRFToken";

/// Element id of the inline JSON configuration block, if the page renders one.
pub const CONFIG_ELEMENT_ID: &str = "page-config";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct PageConfig {
	/// Anti-forgery token attached to mutating same-origin requests.
	pub csrf_token: Option<String>,
	/// Gates the notification poller.
	pub is_authenticated: bool,
	/// Shown when a failure carries no usable message.
	pub default_error_message: String,
	pub csrf_header: String,
	pub timing: Timing,
}

impl Default for PageConfig {
	fn default() -> Self {
		Self {
			csrf_token: None,
			is_authenticated: false,
			default_error_message: DEFAULT_ERROR_MESSAGE.to_owned(),
			csrf_header: DEFAULT_CSRF_HEADER.to_owned(),
			timing: Timing::default(),
		}
	}
}

impl PageConfig {
	/// Parses an inline configuration block. Missing fields keep their defaults.
	///
	/// # Errors
	///
	/// Iff `json` is not a JSON object matching [`PageConfig`]'s shape.
	pub fn from_json(json: &str) -> serde_json::Result<Self> {
		match serde_json::from_str(json)? {
			object @ Value::Object(_) => serde_json::from_value(object),
			other => Err(serde_json::Error::invalid_type(unexpected(&other), &"a JSON object")),
		}
	}
}

fn unexpected(value: &Value) -> Unexpected<'_> {
	match value {
		Value::Null => Unexpected::Unit,
		Value::Bool(value) => Unexpected::Bool(*value),
		Value::Number(_) => Unexpected::Other("number"),
		Value::String(value) => Unexpected::Str(value),
		Value::Array(_) => Unexpected::Seq,
		Value::Object(_) => Unexpected::Map,
	}
}

/// Shortest toast display time honoured.
pub const MIN_TOAST_MS: u32 = 500;
/// Shortest notification polling period honoured.
pub const MIN_POLL_INTERVAL_MS: u32 = 1000;

/// All delays are in milliseconds. Toast and polling durations below their minimums are raised to them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Timing {
	pub toast_ms: u32,
	pub hover_delay_ms: u32,
	pub hover_grace_ms: u32,
	pub poll_interval_ms: u32,
}

impl Default for Timing {
	fn default() -> Self {
		Self {
			toast_ms: 2000,
			hover_delay_ms: 500,
			hover_grace_ms: 200,
			poll_interval_ms: 30_000,
		}
	}
}

impl Timing {
	#[must_use]
	pub fn toast(&self) -> Duration {
		Duration::from_millis(self.toast_ms.max(MIN_TOAST_MS).into())
	}

	#[must_use]
	pub fn hover_delay(&self) -> Duration {
		Duration::from_millis(self.hover_delay_ms.into())
	}

	#[must_use]
	pub fn hover_grace(&self) -> Duration {
		Duration::from_millis(self.hover_grace_ms.into())
	}

	#[must_use]
	pub fn poll_interval(&self) -> Duration {
		Duration::from_millis(self.poll_interval_ms.max(MIN_POLL_INTERVAL_MS).into())
	}
}
