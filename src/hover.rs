//! Hover-intent profile previews.
//!
//! Every `.profile-popover` element gets its own [`HoverTarget`] with its own timers, so sessions over different
//! targets never cancel each other. A target moves through
//!
//! ```text
//! Idle --enter--> PendingShow --delay--> Fetching --2xx--> Showing --leave + grace--> Idle
//!                      |                     |
//!                      +-------leave---------+--> Idle (no request / response discarded)
//! ```
//!
//! When the grace period after a leave expires, the panel stays open iff the pointer is over the panel or back
//! over the target.

use crate::{
	config::Timing,
	pipeline::{Method, Pipeline},
	platform::{Control, Panel, Platform},
};
use core::{
	cell::{Cell, RefCell},
	time::Duration,
};
use futures::FutureExt;
use std::rc::{Rc, Weak};
use tracing::{debug, instrument, trace, warn};

pub const PROFILE_POPOVER_SELECTOR: &str = ".profile-popover";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HoverPhase {
	Idle,
	PendingShow,
	Fetching,
	Showing,
}

enum State<P: Platform> {
	Idle,
	PendingShow(P::Timer),
	Fetching { generation: u64 },
	Showing { panel: P::Panel, hide: Option<P::Timer> },
}

pub struct HoverTarget<P: Platform> {
	this: Weak<Self>,
	element: P::Element,
	platform: Rc<P>,
	pipeline: Pipeline<P>,
	delay: Duration,
	grace: Duration,
	state: RefCell<State<P>>,
	generation: Cell<u64>,
}

impl<P: Platform> HoverTarget<P> {
	#[must_use]
	pub fn new(element: P::Element, platform: Rc<P>, pipeline: Pipeline<P>, timing: &Timing) -> Rc<Self> {
		Rc::new_cyclic(|this| Self {
			this: this.clone(),
			element,
			platform,
			pipeline,
			delay: timing.hover_delay(),
			grace: timing.hover_grace(),
			state: RefCell::new(State::Idle),
			generation: Cell::new(0),
		})
	}

	#[must_use]
	pub fn element(&self) -> &P::Element {
		&self.element
	}

	#[must_use]
	pub fn phase(&self) -> HoverPhase {
		match &*self.state.borrow() {
			State::Idle => HoverPhase::Idle,
			State::PendingShow(_) => HoverPhase::PendingShow,
			State::Fetching { .. } => HoverPhase::Fetching,
			State::Showing { .. } => HoverPhase::Showing,
		}
	}

	/// Pointer entered the target.
	#[instrument(skip(self))]
	pub fn enter(&self) {
		let mut state = self.state.borrow_mut();
		match &mut *state {
			State::Idle => {
				trace!("Starting hover-intent delay.");
				*state = State::PendingShow(self.schedule(self.delay, Self::show));
			}
			State::Showing { hide, .. } => {
				if hide.take().is_some() {
					trace!("Pointer returned; hide cancelled.");
				}
			}
			State::PendingShow(_) | State::Fetching { .. } => (),
		}
	}

	/// Pointer left the target.
	#[instrument(skip(self))]
	pub fn leave(&self) {
		let mut state = self.state.borrow_mut();
		match &mut *state {
			State::PendingShow(_) => {
				trace!("Left before the delay elapsed; no preview.");
				*state = State::Idle;
			}
			State::Fetching { .. } => {
				trace!("Left while the preview was loading; it will be discarded.");
				*state = State::Idle;
			}
			State::Showing { hide, .. } => *hide = Some(self.schedule(self.grace, Self::grace_expired)),
			State::Idle => (),
		}
	}

	/// Pointer left the floating panel.
	pub fn leave_panel(&self) {
		if let State::Showing { hide, .. } = &mut *self.state.borrow_mut() {
			*hide = Some(self.schedule(self.grace, Self::grace_expired));
		}
	}

	/// Closes the panel and cancels any timers.
	pub fn reset(&self) {
		*self.state.borrow_mut() = State::Idle;
	}

	fn schedule(&self, delay: Duration, then: fn(&Self)) -> P::Timer {
		let this = self.this.clone();
		self.platform.set_timeout(
			delay,
			Box::new(move || {
				if let Some(this) = this.upgrade() {
					then(&this);
				}
			}),
		)
	}

	fn show(&self) {
		let url = match self.element.data("href") {
			Some(url) => url,
			None => {
				warn!("Popover target has no data-href.");
				*self.state.borrow_mut() = State::Idle;
				return;
			}
		};

		let generation = self.generation.get() + 1;
		self.generation.set(generation);
		*self.state.borrow_mut() = State::Fetching { generation };
		debug!(generation, "Fetching preview.");

		let this = self.this.clone();
		let pipeline = self.pipeline.clone();
		self.platform.spawn(
			async move {
				let result = pipeline.send(Method::Get, &url).await;
				if let Some(this) = this.upgrade() {
					this.loaded(generation, result.map(|response| response.body));
				}
			}
			.boxed_local(),
		);
	}

	fn loaded(&self, generation: u64, markup: crate::error::Result<String>) {
		let mut state = self.state.borrow_mut();
		match &*state {
			State::Fetching { generation: current } if *current == generation => (),
			_ => {
				trace!(generation, "Discarding stale preview.");
				return;
			}
		}

		match markup {
			Ok(markup) => {
				#[cfg(feature = "dangerous-logging")]
				trace!(%markup, "Showing preview.");
				#[cfg(not(feature = "dangerous-logging"))]
				trace!(len = markup.len(), "Showing preview.");

				let this = self.this.clone();
				let panel = self.platform.open_panel(
					&self.element,
					&markup,
					Box::new(move || {
						if let Some(this) = this.upgrade() {
							this.leave_panel();
						}
					}),
				);
				*state = State::Showing { panel, hide: None };
			}
			// Already reported by the pipeline.
			Err(_) => *state = State::Idle,
		}
	}

	fn grace_expired(&self) {
		let mut state = self.state.borrow_mut();
		if let State::Showing { panel, hide } = &mut *state {
			if panel.is_hovered() || self.element.is_hovered() {
				trace!("Pointer is over the preview; keeping it.");
				*hide = None;
				return;
			}
			trace!("Hiding preview.");
			*state = State::Idle;
		}
	}
}

/// Owns one [`HoverTarget`] per tracked element.
pub struct HoverScheduler<P: Platform> {
	platform: Rc<P>,
	pipeline: Pipeline<P>,
	timing: Timing,
	targets: RefCell<Vec<Rc<HoverTarget<P>>>>,
}

impl<P: Platform> HoverScheduler<P> {
	#[must_use]
	pub fn new(platform: Rc<P>, pipeline: Pipeline<P>, timing: Timing) -> Self {
		Self {
			platform,
			pipeline,
			timing,
			targets: RefCell::default(),
		}
	}

	pub fn track(&self, element: P::Element) -> Rc<HoverTarget<P>> {
		let target = HoverTarget::new(element, Rc::clone(&self.platform), self.pipeline.clone(), &self.timing);
		self.targets.borrow_mut().push(Rc::clone(&target));
		target
	}

	/// Tracks every `.profile-popover` currently on the page.
	pub fn track_all(&self) -> Vec<Rc<HoverTarget<P>>> {
		self.platform.query_all(PROFILE_POPOVER_SELECTOR).into_iter().map(|element| self.track(element)).collect()
	}

	#[must_use]
	pub fn len(&self) -> usize {
		self.targets.borrow().len()
	}

	#[must_use]
	pub fn is_empty(&self) -> bool {
		self.targets.borrow().is_empty()
	}

	/// Closes all previews and forgets every target.
	pub fn clear(&self) {
		for target in self.targets.borrow_mut().drain(..) {
			target.reset();
		}
	}
}
