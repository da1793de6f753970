//! Live counters: follower, collector and unread-notification counts.
//!
//! A counter only ever shows a value the server returned. There is no client-side arithmetic: every mutating
//! action is followed by a fresh fetch. Responses can still arrive out of order, so each counter endpoint keeps
//! a ticket and only the newest request's response may write the display.

use crate::{
	error::{Error, Result},
	pipeline::{Method, Pipeline, Reply},
	platform::{Control, Platform},
};
use core::cell::RefCell;
use futures::FutureExt;
use hashbrown::HashMap;
use std::rc::Rc;
use tracing::{instrument, trace, warn};

pub const NOTIFICATION_BADGE_ID: &str = "notification-badge";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CounterStyle {
	/// Always shows the numeral.
	Plain,
	/// Hides the element at zero, as the unread-notification badge does.
	HideWhenZero,
}

impl CounterStyle {
	pub fn apply<C: Control>(self, element: &C, count: u64) {
		match self {
			Self::Plain => element.set_text(&count.to_string()),
			Self::HideWhenZero if count == 0 => element.set_visible(false),
			Self::HideWhenZero => {
				element.set_visible(true);
				element.set_text(&count.to_string());
			}
		}
	}
}

pub struct Counters<P: Platform> {
	platform: Rc<P>,
	pipeline: Pipeline<P>,
	tickets: Rc<RefCell<HashMap<String, u64>>>,
}

impl<P: Platform> Clone for Counters<P> {
	fn clone(&self) -> Self {
		Self {
			platform: Rc::clone(&self.platform),
			pipeline: self.pipeline.clone(),
			tickets: Rc::clone(&self.tickets),
		}
	}
}

impl<P: Platform> Counters<P> {
	#[must_use]
	pub fn new(platform: Rc<P>, pipeline: Pipeline<P>) -> Self {
		Self {
			platform,
			pipeline,
			tickets: Rc::default(),
		}
	}

	/// Refetches the counter element with id `id`.
	///
	/// # Errors
	///
	/// [`Error::MissingElement`] if there is no such element, otherwise as [`refresh`](`Counters::refresh`).
	pub async fn refresh_by_id(&self, id: &str, style: CounterStyle) -> Result<u64> {
		let element = self.platform.element_by_id(id).ok_or_else(|| {
			warn!(id, "Counter element not found.");
			Error::MissingElement { id: id.to_owned() }
		})?;
		self.refresh(&element, style).await
	}

	/// Fetches the current count from the element's `data-href` and displays it.
	///
	/// Returns the fetched count even if a newer request has since been issued and the display was left alone.
	///
	/// # Errors
	///
	/// [`Error::MissingAttribute`] if the element has no `data-href`. Request failures are reported by the
	/// [`Pipeline`], and a reply without `count` counts as [`Error::Malformed`].
	#[instrument(skip(self, element))]
	pub async fn refresh(&self, element: &P::Element, style: CounterStyle) -> Result<u64> {
		let url = element.data("href").ok_or_else(|| {
			warn!("Counter element has no data-href.");
			Error::MissingAttribute { attribute: "href" }
		})?;
		let ticket = self.issue_ticket(&url);

		let reply: Reply = self.pipeline.send_json(Method::Get, &url).await?;
		let count = match reply.count {
			Some(count) => count,
			None => return Err(self.pipeline.report_malformed()),
		};

		if self.is_current(&url, ticket) {
			style.apply(element, count);
		} else {
			trace!(ticket, "Discarding superseded count.");
		}
		Ok(count)
	}

	/// Fire-and-forget [`refresh_by_id`](`Counters::refresh_by_id`).
	pub fn spawn_refresh(&self, id: String, style: CounterStyle) {
		let counters = self.clone();
		self.platform.spawn(
			async move {
				// Failures are already reported or logged.
				let _ = counters.refresh_by_id(&id, style).await;
			}
			.boxed_local(),
		);
	}

	fn issue_ticket(&self, url: &str) -> u64 {
		let mut tickets = self.tickets.borrow_mut();
		let ticket = tickets.entry(url.to_owned()).or_insert(0);
		*ticket += 1;
		*ticket
	}

	fn is_current(&self, url: &str, ticket: u64) -> bool {
		self.tickets.borrow().get(url) == Some(&ticket)
	}
}
