//! The seam between the synchronizer and whatever hosts it.
//!
//! [`web::Browser`](crate::web::Browser) implements this for a real page. Handlers only ever touch the DOM,
//! the clock and the network through these traits.

use crate::{
	error::TransportError,
	pipeline::{Request, Response},
};
use core::time::Duration;
use futures::future::LocalBoxFuture;

/// A server-rendered element a handler reads from or writes to.
///
/// Clones refer to the same underlying element.
pub trait Control: Clone + 'static {
	/// Reads `data-{key}`.
	fn data(&self, key: &str) -> Option<String>;
	fn set_attribute(&self, name: &str, value: &str);
	fn set_text(&self, text: &str);
	fn set_style(&self, property: &str, value: &str);
	fn set_visible(&self, visible: bool);
	fn is_visible(&self) -> bool;
	fn set_disabled(&self, disabled: bool);
	/// Whether the pointer currently rests over this element.
	fn is_hovered(&self) -> bool;
	/// The immediately preceding element sibling.
	fn previous(&self) -> Option<Self>;
	/// The immediately following element sibling.
	fn next(&self) -> Option<Self>;
}

/// A floating panel opened next to an anchor element. Dropping it removes it from the page.
pub trait Panel: 'static {
	fn is_hovered(&self) -> bool;
}

/// Host environment: element lookup, timers, tasks and HTTP.
///
/// Everything runs on one thread. Timer and interval handles cancel when dropped,
/// and a cancelled callback never runs.
pub trait Platform: 'static {
	type Element: Control;
	type Timer: 'static;
	type Interval: 'static;
	type Panel: Panel;

	fn element_by_id(&self, id: &str) -> Option<Self::Element>;
	fn query_all(&self, selector: &str) -> Vec<Self::Element>;

	fn set_timeout(&self, delay: Duration, callback: Box<dyn FnOnce()>) -> Self::Timer;
	fn set_interval(&self, period: Duration, callback: Box<dyn FnMut()>) -> Self::Interval;
	fn spawn(&self, task: LocalBoxFuture<'static, ()>);

	fn fetch(&self, request: Request) -> LocalBoxFuture<'static, Result<Response, TransportError>>;
	/// Scheme, host and port of the current page, e.g. `https://example.com`.
	fn origin(&self) -> Option<String>;

	/// Shows `markup` in a floating panel anchored to `anchor`.
	/// `on_leave` runs whenever the pointer leaves the panel.
	fn open_panel(&self, anchor: &Self::Element, markup: &str, on_leave: Box<dyn Fn()>) -> Self::Panel;
}
