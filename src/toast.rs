//! The single transient message slot.

use crate::platform::{Control, Platform};
use core::{cell::RefCell, time::Duration};
use std::rc::Rc;
use tracing::{instrument, trace, warn};

/// Element id of the toast region.
pub const TOAST_ELEMENT_ID: &str = "toast";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum ToastCategory {
	#[default]
	Info,
	Error,
}

impl ToastCategory {
	#[must_use]
	pub fn background(self) -> &'static str {
		match self {
			Self::Info => "#333",
			Self::Error => "red",
		}
	}

	#[must_use]
	pub fn as_str(self) -> &'static str {
		match self {
			Self::Info => "info",
			Self::Error => "error",
		}
	}
}

/// Shows one message at a time and hides it after a fixed delay.
///
/// A new message replaces the visible one and restarts the delay, so at most one hide is ever pending.
pub struct Toast<P: Platform> {
	inner: Rc<Inner<P>>,
}

struct Inner<P: Platform> {
	platform: Rc<P>,
	region: Option<P::Element>,
	duration: Duration,
	pending_hide: RefCell<Option<P::Timer>>,
}

impl<P: Platform> Clone for Toast<P> {
	fn clone(&self) -> Self {
		Self { inner: Rc::clone(&self.inner) }
	}
}

impl<P: Platform> Toast<P> {
	/// Binds to the `#toast` region. Without one, messages are only logged.
	#[must_use]
	pub fn new(platform: Rc<P>, duration: Duration) -> Self {
		let region = platform.element_by_id(TOAST_ELEMENT_ID);
		if region.is_none() {
			warn!("No #{} region on this page; toasts will be dropped.", TOAST_ELEMENT_ID);
		}
		Self {
			inner: Rc::new(Inner {
				platform,
				region,
				duration,
				pending_hide: RefCell::new(None),
			}),
		}
	}

	#[instrument(skip(self, message, category), fields(category = category.as_str()))]
	pub fn show(&self, message: &str, category: ToastCategory) {
		#[cfg(feature = "dangerous-logging")]
		trace!(message, "Showing toast.");
		#[cfg(not(feature = "dangerous-logging"))]
		trace!(len = message.len(), "Showing toast.");

		let region = match &self.inner.region {
			Some(region) => region,
			None => return,
		};

		let mut pending_hide = self.inner.pending_hide.borrow_mut();
		// Dropping the previous handle cancels its hide.
		drop(pending_hide.take());

		region.set_text(message);
		region.set_style("background-color", category.background());
		region.set_visible(true);

		let hidden = region.clone();
		*pending_hide = Some(self.inner.platform.set_timeout(
			self.inner.duration,
			Box::new(move || {
				trace!("Hiding toast.");
				hidden.set_visible(false);
			}),
		));
	}

	pub fn info(&self, message: &str) {
		self.show(message, ToastCategory::Info);
	}

	pub fn error(&self, message: &str) {
		self.show(message, ToastCategory::Error);
	}
}
