//! The one path every request takes.
//!
//! [`Pipeline`] stamps same-origin requests with `X-Requested-With` and, for mutating methods, the anti-forgery
//! header. It also turns every failure (transport error, non-2xx status, unparseable body) into exactly one
//! error toast before handing the [`Error`] back. Callers therefore never report request failures themselves:
//! they only decide what *not* to change in the DOM.

use crate::{
	config::PageConfig,
	error::{resolve_failure_message, Error, Result},
	platform::Platform,
	toast::{Toast, ToastCategory},
};
use serde::{de::DeserializeOwned, Deserialize};
use std::rc::Rc;
use tracing::{debug, instrument, warn};
use url::Url;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
	Get,
	Head,
	Options,
	Trace,
	Post,
	Put,
	Patch,
	Delete,
}

impl Method {
	#[must_use]
	pub fn as_str(self) -> &'static str {
		match self {
			Self::Get => "GET",
			Self::Head => "HEAD",
			Self::Options => "OPTIONS",
			Self::Trace => "TRACE",
			Self::Post => "POST",
			Self::Put => "PUT",
			Self::Patch => "PATCH",
			Self::Delete => "DELETE",
		}
	}

	/// Methods that never change server state and so never carry the anti-forgery token.
	#[must_use]
	pub fn is_safe(self) -> bool {
		matches!(self, Self::Get | Self::Head | Self::Options | Self::Trace)
	}
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
	pub method: Method,
	pub url: String,
	pub headers: Vec<(String, String)>,
}

impl Request {
	/// Case-insensitive header lookup.
	#[must_use]
	pub fn header(&self, name: &str) -> Option<&str> {
		self.headers.iter().find(|(key, _)| key.eq_ignore_ascii_case(name)).map(|(_, value)| value.as_str())
	}
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
	pub status: u16,
	pub content_type: Option<String>,
	pub body: String,
}

impl Response {
	#[must_use]
	pub fn json(status: u16, body: impl Into<String>) -> Self {
		Self {
			status,
			content_type: Some("application/json".to_owned()),
			body: body.into(),
		}
	}

	#[must_use]
	pub fn html(status: u16, body: impl Into<String>) -> Self {
		Self {
			status,
			content_type: Some("text/html; charset=utf-8".to_owned()),
			body: body.into(),
		}
	}

	#[must_use]
	pub fn is_success(&self) -> bool {
		(200..300).contains(&self.status)
	}

	/// Whether the server declared the body as JSON.
	#[must_use]
	pub fn is_json(&self) -> bool {
		self.content_type.as_deref().map_or(false, |content_type| content_type.to_ascii_lowercase().contains("json"))
	}
}

/// The JSON shape every action and counter endpoint answers with.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Reply {
	#[serde(default)]
	pub count: Option<u64>,
	#[serde(default)]
	pub message: Option<String>,
}

/// Placeholder base for resolving relative URLs when the page origin is unknown.
const UNKNOWN_ORIGIN: &str = "http://origin.invalid/";

/// Whether `url`, resolved the way the browser resolves it against `origin`, stays on that origin.
///
/// Relative URLs stay on the page's origin even if `origin` is unknown.
#[must_use]
pub fn is_same_origin(url: &str, origin: Option<&str>) -> bool {
	let base = match Url::parse(origin.unwrap_or(UNKNOWN_ORIGIN)) {
		Ok(base) => base,
		Err(error) => {
			warn!(%error, "Unparseable page origin.");
			return false;
		}
	};
	match base.join(url) {
		Ok(resolved) => resolved.origin() == base.origin(),
		Err(_) => false,
	}
}

pub struct Pipeline<P: Platform> {
	platform: Rc<P>,
	config: Rc<PageConfig>,
	toast: Toast<P>,
}

impl<P: Platform> Clone for Pipeline<P> {
	fn clone(&self) -> Self {
		Self {
			platform: Rc::clone(&self.platform),
			config: Rc::clone(&self.config),
			toast: self.toast.clone(),
		}
	}
}

impl<P: Platform> Pipeline<P> {
	#[must_use]
	pub fn new(platform: Rc<P>, config: Rc<PageConfig>, toast: Toast<P>) -> Self {
		Self { platform, config, toast }
	}

	#[must_use]
	pub fn toast(&self) -> &Toast<P> {
		&self.toast
	}

	/// Builds the outgoing request with the standard headers.
	#[must_use]
	pub fn prepare(&self, method: Method, url: &str) -> Request {
		let mut headers = Vec::new();
		if is_same_origin(url, self.platform.origin().as_deref()) {
			headers.push(("X-Requested-With".to_owned(), "XMLHttpRequest".to_owned()));
			if !method.is_safe() {
				match &self.config.csrf_token {
					Some(token) => headers.push((self.config.csrf_header.clone(), token.clone())),
					None => warn!("Mutating request without an anti-forgery token configured."),
				}
			}
		}
		Request {
			method,
			url: url.to_owned(),
			headers,
		}
	}

	/// Sends a request and returns the response iff its status is 2xx.
	///
	/// # Errors
	///
	/// [`Error::Transport`] or [`Error::Status`], both already shown as an error toast.
	#[instrument(skip(self, method), fields(method = method.as_str()))]
	pub async fn send(&self, method: Method, url: &str) -> Result<Response> {
		let request = self.prepare(method, url);
		match self.platform.fetch(request).await {
			Ok(response) if response.is_success() => {
				debug!(status = response.status, len = response.body.len(), "Request succeeded.");
				Ok(response)
			}
			Ok(response) => {
				let message = resolve_failure_message(&response, &self.config.default_error_message);
				warn!(status = response.status, "Request failed.");
				self.report(&message);
				Err(Error::Status {
					status: response.status,
					message,
				})
			}
			Err(error) => {
				warn!(%error, "Request did not complete.");
				self.report(&self.config.default_error_message);
				Err(error.into())
			}
		}
	}

	/// [`send`](`Pipeline::send`), then decodes the body as JSON.
	///
	/// # Errors
	///
	/// As [`send`](`Pipeline::send`), plus [`Error::Malformed`] (also toasted) if the body doesn't decode as `T`.
	pub async fn send_json<T: DeserializeOwned>(&self, method: Method, url: &str) -> Result<T> {
		let response = self.send(method, url).await?;
		serde_json::from_str(&response.body).map_err(|error| {
			warn!(%error, "Malformed response body.");
			self.report(&self.config.default_error_message);
			Error::Malformed
		})
	}

	/// Reports a failure that the pipeline didn't observe itself, such as a reply missing a required field.
	pub fn report_malformed(&self) -> Error {
		self.report(&self.config.default_error_message);
		Error::Malformed
	}

	fn report(&self, message: &str) {
		self.toast.show(message, ToastCategory::Error);
	}
}
