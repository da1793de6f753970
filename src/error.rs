//! Failure taxonomy and the message resolution shared by every request.

use crate::pipeline::Response;
use serde_json::Value;
use thiserror::Error;

/// A request that never completed: network failure, blocked request, aborted fetch.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("transport failure: {detail}")]
pub struct TransportError {
	/// Platform-supplied description, for logs only.
	pub detail: String,
}

impl TransportError {
	#[must_use]
	pub fn new(detail: impl Into<String>) -> Self {
		Self { detail: detail.into() }
	}
}

/// Everything that can go wrong between a user event and the DOM update it causes.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
	/// The request never completed.
	#[error(transparent)]
	Transport(#[from] TransportError),
	/// The server answered with a non-2xx status.
	#[error("request failed with status {status}")]
	Status {
		/// HTTP status code.
		status: u16,
		/// The human-readable message already shown to the user.
		message: String,
	},
	/// The server answered 2xx, but the body was not the expected JSON shape.
	#[error("malformed response body")]
	Malformed,
	/// A server-rendered element lacks a `data-*` attribute the handler needs.
	#[error("element is missing the `data-{attribute}` attribute")]
	MissingAttribute {
		/// Attribute name without the `data-` prefix.
		attribute: &'static str,
	},
	/// An element the page contract requires is absent.
	#[error("no element with id `{id}`")]
	MissingElement {
		/// The id that was looked up.
		id: String,
	},
}

impl Error {
	/// Whether the request pipeline has already turned this error into an error toast.
	#[must_use]
	pub fn is_reported(&self) -> bool {
		matches!(self, Self::Transport(_) | Self::Status { .. } | Self::Malformed)
	}
}

pub type Result<T, E = Error> = core::result::Result<T, E>;

/// Picks the single message shown for a failed response.
///
/// In order: the `message` of a body declared as JSON, the `message` of a body that
/// merely parses as JSON, then `default`. Non-string `message` values and malformed
/// JSON both degrade to `default`.
#[must_use]
pub fn resolve_failure_message(response: &Response, default: &str) -> String {
	if response.is_json() {
		if let Some(message) = message_field(&response.body) {
			return message;
		}
	}
	if !response.body.trim().is_empty() {
		if let Some(message) = message_field(&response.body) {
			return message;
		}
	}
	default.to_owned()
}

fn message_field(body: &str) -> Option<String> {
	match serde_json::from_str::<Value>(body).ok()? {
		Value::Object(mut map) => match map.remove("message")? {
			Value::String(message) => Some(message),
			_ => None,
		},
		_ => None,
	}
}
