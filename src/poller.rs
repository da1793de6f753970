//! Periodic unread-notification count.

use crate::{
	config::PageConfig,
	counter::{CounterStyle, Counters, NOTIFICATION_BADGE_ID},
	platform::Platform,
};
use std::rc::Rc;
use tracing::{debug, info};

/// Refreshes `#notification-badge` on a fixed interval while alive.
///
/// Each tick is independent: a failed tick leaves the badge stale until the next one succeeds.
pub struct NotificationPoller<P: Platform> {
	_interval: P::Interval,
}

impl<P: Platform> NotificationPoller<P> {
	/// Starts polling iff the viewer is signed in and the page has a badge to update.
	#[must_use]
	pub fn start(platform: &Rc<P>, config: &PageConfig, counters: Counters<P>) -> Option<Self> {
		if !config.is_authenticated {
			debug!("Anonymous viewer; not polling notifications.");
			return None;
		}
		if platform.element_by_id(NOTIFICATION_BADGE_ID).is_none() {
			debug!("No #{} on this page; not polling notifications.", NOTIFICATION_BADGE_ID);
			return None;
		}

		let period = config.timing.poll_interval();
		info!(?period, "Polling notifications.");
		let interval = platform.set_interval(
			period,
			Box::new(move || counters.spawn_refresh(NOTIFICATION_BADGE_ID.to_owned(), CounterStyle::HideWhenZero)),
		);
		Some(Self { _interval: interval })
	}
}
