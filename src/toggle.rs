//! Follow/unfollow and collect/uncollect buttons.
//!
//! Each relationship is rendered as a pair of adjacent controls of which exactly one is visible. The
//! deactivating control (unfollow, uncollect) comes first, so an activating click reveals its *previous*
//! sibling and a deactivating click reveals its *next* one.
//!
//! Visibility changes only after the server confirmed the action. While a request for a given
//! (relationship, entity) is in flight, further clicks on either control of that pair are ignored and the
//! clicked control is disabled, so a slow first response can't be overtaken by a faster second one.

use crate::{
	counter::{CounterStyle, Counters},
	error::{Error, Result},
	pipeline::{Method, Pipeline, Reply},
	platform::{Control, Platform},
};
use core::cell::RefCell;
use futures::FutureExt;
use hashbrown::HashSet;
use std::rc::Rc;
use tracing::{debug, instrument, trace, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Relationship {
	/// Viewer follows a user.
	Follow,
	/// Viewer collects a photo.
	Collect,
}

impl Relationship {
	/// Element id of the count display affected by this relationship.
	#[must_use]
	pub fn counter_id(self, entity: &str) -> String {
		match self {
			Self::Follow => format!("followers-count-{}", entity),
			Self::Collect => format!("collectors-count-{}", entity),
		}
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ToggleAction {
	Follow,
	Unfollow,
	Collect,
	Uncollect,
}

impl ToggleAction {
	pub const ALL: [Self; 4] = [Self::Follow, Self::Unfollow, Self::Collect, Self::Uncollect];

	#[must_use]
	pub fn relationship(self) -> Relationship {
		match self {
			Self::Follow | Self::Unfollow => Relationship::Follow,
			Self::Collect | Self::Uncollect => Relationship::Collect,
		}
	}

	/// Whether this action establishes the relationship.
	#[must_use]
	pub fn activates(self) -> bool {
		matches!(self, Self::Follow | Self::Collect)
	}

	#[must_use]
	pub fn selector(self) -> &'static str {
		match self {
			Self::Follow => ".follow-btn",
			Self::Unfollow => ".unfollow-btn",
			Self::Collect => ".collect-btn",
			Self::Uncollect => ".uncollect-btn",
		}
	}

	/// Shown when the server confirms without a message of its own.
	#[must_use]
	pub fn confirmation(self) -> &'static str {
		match self {
			Self::Follow => "User followed.",
			Self::Unfollow => "Follow canceled.",
			Self::Collect => "Photo collected.",
			Self::Uncollect => "Collect canceled.",
		}
	}

	/// The control that represents the opposite state.
	pub fn counterpart<C: Control>(self, control: &C) -> Option<C> {
		if self.activates() {
			control.previous()
		} else {
			control.next()
		}
	}
}

type InFlight = (Relationship, String);

pub struct Toggles<P: Platform> {
	platform: Rc<P>,
	pipeline: Pipeline<P>,
	counters: Counters<P>,
	in_flight: Rc<RefCell<HashSet<InFlight>>>,
}

impl<P: Platform> Clone for Toggles<P> {
	fn clone(&self) -> Self {
		Self {
			platform: Rc::clone(&self.platform),
			pipeline: self.pipeline.clone(),
			counters: self.counters.clone(),
			in_flight: Rc::clone(&self.in_flight),
		}
	}
}

impl<P: Platform> Toggles<P> {
	#[must_use]
	pub fn new(platform: Rc<P>, pipeline: Pipeline<P>, counters: Counters<P>) -> Self {
		Self {
			platform,
			pipeline,
			counters,
			in_flight: Rc::default(),
		}
	}

	/// Handles a click on `control`. Returns whether a request was started.
	#[instrument(skip(self, control))]
	pub fn click(&self, action: ToggleAction, control: P::Element) -> bool {
		let (entity, url) = match (control.data("id"), control.data("href")) {
			(Some(entity), Some(url)) => (entity, url),
			_ => {
				warn!("Toggle control is missing data-id or data-href.");
				return false;
			}
		};

		let key = (action.relationship(), entity);
		if !self.in_flight.borrow_mut().insert(key.clone()) {
			trace!("Ignoring click while the previous request is in flight.");
			return false;
		}
		control.set_disabled(true);

		let toggles = self.clone();
		self.platform.spawn(
			async move {
				let result = toggles.perform(action, &control, &key.1, &url).await;
				control.set_disabled(false);
				toggles.in_flight.borrow_mut().remove(&key);
				match result {
					Err(error) if error.is_reported() => debug!(%error, "Toggle left unchanged."),
					Err(error) => warn!(%error, "Toggle left unchanged; the page markup is incomplete."),
					Ok(()) => (),
				}
			}
			.boxed_local(),
		);
		true
	}

	/// Whether a request for this pair is currently awaiting its response.
	#[must_use]
	pub fn is_pending(&self, relationship: Relationship, entity: &str) -> bool {
		self.in_flight.borrow().contains(&(relationship, entity.to_owned()))
	}

	async fn perform(&self, action: ToggleAction, control: &P::Element, entity: &str, url: &str) -> Result<()> {
		let reply: Reply = self.pipeline.send_json(Method::Post, url).await?;

		let counterpart = action.counterpart(control).ok_or_else(|| {
			warn!("Toggle control has no counterpart sibling; leaving the pair as is.");
			Error::MissingElement {
				id: format!("{:?} counterpart", action),
			}
		});
		if let Ok(counterpart) = &counterpart {
			counterpart.set_visible(true);
			control.set_visible(false);
		}

		self.counters.spawn_refresh(action.relationship().counter_id(entity), CounterStyle::Plain);
		self.pipeline.toast().info(reply.message.as_deref().unwrap_or_else(|| action.confirmation()));
		counterpart.map(drop)
	}
}
