//! The real page: [`Browser`] implements [`Platform`] on top of `web-sys`, and [`attach`] wires a [`Page`] to
//! the document's events.
//!
//! From JavaScript, call the exported `attach()` once the DOM is ready, and `detach()` to undo it.
//! Attached pages also detach themselves on `pagehide`, except when the page is kept in the back-forward cache.

mod panel;
mod registry;

pub use panel::BrowserPanel;
pub use registry::{Listener, Registry};

use crate::{
	config::{PageConfig, CONFIG_ELEMENT_ID},
	error::TransportError,
	page::{Page, Role},
	pipeline::{Method, Request, Response},
	platform::{Control, Platform},
};
use core::{cell::RefCell, time::Duration};
use futures::{
	future::{AbortHandle, Abortable, LocalBoxFuture},
	FutureExt,
};
use gloo_timers::{callback::Interval, future::TimeoutFuture};
use js_sys::Reflect;
use std::rc::Rc;
use tracing::{debug, error, trace, warn};
use wasm_bindgen::{prelude::wasm_bindgen, JsCast, JsValue};
use wasm_bindgen_futures::spawn_local;
use web_sys::{Document, Element, Event, HtmlElement, PageTransitionEvent, Window};

impl Control for HtmlElement {
	fn data(&self, key: &str) -> Option<String> {
		self.get_attribute(&format!("data-{}", key))
	}

	fn set_attribute(&self, name: &str, value: &str) {
		if let Err(error) = Element::set_attribute(self, name, value) {
			warn!(?error, name, "Could not set attribute.");
		}
	}

	fn set_text(&self, text: &str) {
		self.set_text_content(Some(text));
	}

	fn set_style(&self, property: &str, value: &str) {
		if let Err(error) = self.style().set_property(property, value) {
			warn!(?error, property, "Could not set style.");
		}
	}

	fn set_visible(&self, visible: bool) {
		let style = self.style();
		let result = if visible {
			style.remove_property("display").map(drop)
		} else {
			style.set_property("display", "none")
		};
		if let Err(error) = result {
			warn!(?error, visible, "Could not change visibility.");
		}
	}

	fn is_visible(&self) -> bool {
		self.style().get_property_value("display").map_or(true, |display| display != "none")
	}

	fn set_disabled(&self, disabled: bool) {
		let result = if disabled {
			Element::set_attribute(self, "disabled", "")
		} else {
			self.remove_attribute("disabled")
		};
		if let Err(error) = result {
			warn!(?error, disabled, "Could not change disabled state.");
		}
	}

	fn is_hovered(&self) -> bool {
		self.matches(":hover").unwrap_or(false)
	}

	fn previous(&self) -> Option<Self> {
		self.previous_element_sibling()?.dyn_into().ok()
	}

	fn next(&self) -> Option<Self> {
		self.next_element_sibling()?.dyn_into().ok()
	}
}

/// Cancels its timeout when dropped.
pub struct BrowserTimer(AbortHandle);

impl Drop for BrowserTimer {
	fn drop(&mut self) {
		self.0.abort();
	}
}

pub struct Browser {
	window: Window,
	document: Document,
}

impl Browser {
	/// [`None`] outside a document context, e.g. in a worker.
	#[must_use]
	pub fn new() -> Option<Self> {
		let window = web_sys::window()?;
		let document = window.document()?;
		Some(Self { window, document })
	}

	#[must_use]
	pub fn window(&self) -> &Window {
		&self.window
	}

	#[must_use]
	pub fn document(&self) -> &Document {
		&self.document
	}
}

fn millis(duration: Duration) -> u32 {
	u32::try_from(duration.as_millis()).unwrap_or(u32::MAX)
}

fn transport(error: &gloo_net::Error) -> TransportError {
	TransportError::new(error.to_string())
}

impl Platform for Browser {
	type Element = HtmlElement;
	type Timer = BrowserTimer;
	type Interval = Interval;
	type Panel = BrowserPanel;

	fn element_by_id(&self, id: &str) -> Option<HtmlElement> {
		self.document.get_element_by_id(id)?.dyn_into().ok()
	}

	fn query_all(&self, selector: &str) -> Vec<HtmlElement> {
		let nodes = match self.document.query_selector_all(selector) {
			Ok(nodes) => nodes,
			Err(error) => {
				warn!(?error, selector, "Invalid selector.");
				return Vec::new();
			}
		};
		(0..nodes.length())
			.filter_map(|i| nodes.item(i))
			.filter_map(|node| node.dyn_into().ok())
			.collect()
	}

	fn set_timeout(&self, delay: Duration, callback: Box<dyn FnOnce()>) -> BrowserTimer {
		// Aborting instead of clearing lets `callback` drop its own handle while running.
		let (handle, registration) = AbortHandle::new_pair();
		let timeout = TimeoutFuture::new(millis(delay));
		spawn_local(
			Abortable::new(
				async move {
					timeout.await;
					callback();
				},
				registration,
			)
			.map(drop),
		);
		BrowserTimer(handle)
	}

	fn set_interval(&self, period: Duration, callback: Box<dyn FnMut()>) -> Interval {
		Interval::new(millis(period), callback)
	}

	fn spawn(&self, task: LocalBoxFuture<'static, ()>) {
		spawn_local(task);
	}

	fn fetch(&self, request: Request) -> LocalBoxFuture<'static, Result<Response, TransportError>> {
		async move {
			let method = match request.method {
				Method::Get => gloo_net::http::Method::GET,
				Method::Head => gloo_net::http::Method::HEAD,
				Method::Options => gloo_net::http::Method::OPTIONS,
				Method::Trace => gloo_net::http::Method::TRACE,
				Method::Post => gloo_net::http::Method::POST,
				Method::Put => gloo_net::http::Method::PUT,
				Method::Patch => gloo_net::http::Method::PATCH,
				Method::Delete => gloo_net::http::Method::DELETE,
			};
			let mut outgoing = gloo_net::http::Request::new(&request.url).method(method);
			for (name, value) in &request.headers {
				outgoing = outgoing.header(name, value);
			}
			let response = outgoing.send().await.map_err(|error| transport(&error))?;
			let status = response.status();
			let content_type = response.headers().get("content-type");
			let body = response.text().await.map_err(|error| transport(&error))?;
			trace!(status, len = body.len(), "Fetched.");
			Ok(Response { status, content_type, body })
		}
		.boxed_local()
	}

	fn origin(&self) -> Option<String> {
		self.window.location().origin().ok()
	}

	fn open_panel(&self, anchor: &HtmlElement, markup: &str, on_leave: Box<dyn Fn()>) -> BrowserPanel {
		BrowserPanel::open(&self.window, &self.document, anchor, markup, on_leave)
	}
}

/// Reads the JSON block with id `page-config`, falling back to the `csrf_token`, `is_authenticated` and
/// `default_error_message` globals templates traditionally set.
#[must_use]
pub fn read_config(browser: &Browser) -> PageConfig {
	if let Some(text) = browser.document.get_element_by_id(CONFIG_ELEMENT_ID).and_then(|block| block.text_content()) {
		match PageConfig::from_json(&text) {
			Ok(config) => return config,
			Err(error) => warn!(%error, "Ignoring malformed page config block."),
		}
	}

	let global = |name: &str| Reflect::get(&browser.window, &JsValue::from_str(name)).ok();
	let mut config = PageConfig {
		csrf_token: global("csrf_token").and_then(|value| value.as_string()),
		is_authenticated: global("is_authenticated").map_or(false, |value| value.is_truthy()),
		..PageConfig::default()
	};
	if let Some(message) = global("default_error_message").and_then(|value| value.as_string()) {
		config.default_error_message = message;
	}
	config
}

/// The element matching `selector` that `event` was dispatched on or inside of.
fn delegate_target(event: &Event, selector: &str) -> Option<HtmlElement> {
	let origin: Element = event.target()?.dyn_into().ok()?;
	origin.closest(selector).ok()??.dyn_into().ok()
}

/// A [`Page`] together with every listener that feeds it.
///
/// Dropping this stops polling, closes previews and removes all listeners.
pub struct AttachedPage {
	page: Rc<Page<Browser>>,
	registry: Registry,
}

impl AttachedPage {
	#[must_use]
	pub fn page(&self) -> &Page<Browser> {
		&self.page
	}

	#[must_use]
	pub fn registry(&self) -> &Registry {
		&self.registry
	}
}

impl Drop for AttachedPage {
	fn drop(&mut self) {
		self.page.teardown();
		self.registry.clear();
	}
}

/// Viewer's offset east of UTC, in minutes.
#[allow(clippy::cast_possible_truncation)]
fn local_offset_minutes() -> i32 {
	-(js_sys::Date::new_0().get_timezone_offset().round() as i32)
}

/// Binds delegated click handlers for every clickable [`Role`], hover handlers for each profile preview target,
/// then starts the page.
///
/// # Errors
///
/// Iff a listener could not be added. Listeners added up to that point are removed again.
pub fn attach(browser: Rc<Browser>, config: PageConfig) -> Result<AttachedPage, JsValue> {
	let page = Rc::new(Page::new(Rc::clone(&browser), config));
	let mut registry = Registry::new();

	let document: &web_sys::EventTarget = browser.document.as_ref();
	for role in Role::clickable() {
		let selector = role.selector().into_owned();
		let handler_page = Rc::clone(&page);
		registry.bind(
			role,
			Listener::new(document, "click", move |event| {
				if let Some(element) = delegate_target(&event, &selector) {
					handler_page.dispatch_click(role, element);
				}
			})?,
		);
	}

	for target in page.hover().track_all() {
		let element: web_sys::EventTarget = target.element().clone().into();
		let entering = Rc::clone(&target);
		registry.bind(Role::ProfilePopover, Listener::new(&element, "mouseenter", move |_| entering.enter())?);
		registry.bind(Role::ProfilePopover, Listener::new(&element, "mouseleave", move |_| target.leave())?);
	}

	page.start(local_offset_minutes());
	debug!(listeners = registry.len(), previews = registry.count(Role::ProfilePopover), "Listeners bound.");

	Ok(AttachedPage { page, registry })
}

thread_local! {
	/// The attached page, then its `pagehide` listener, dropped in that order.
	static ATTACHED: RefCell<Option<(AttachedPage, Option<Listener>)>> = RefCell::new(None);
}

#[cfg(feature = "console-log")]
fn install_console_log() {
	use std::sync::Once;
	static INSTALLED: Once = Once::new();
	INSTALLED.call_once(tracing_wasm::set_as_global_default);
}

/// Attaches to the current document, replacing any earlier attachment.
///
/// # Errors
///
/// Iff there is no document or a listener could not be added.
#[wasm_bindgen(js_name = attach)]
pub fn attach_to_document() -> Result<(), JsValue> {
	#[cfg(feature = "console-log")]
	install_console_log();

	detach_from_document();
	let browser = Rc::new(Browser::new().ok_or_else(|| JsValue::from_str("no document to attach to"))?);
	let config = read_config(&browser);
	let attached = attach(Rc::clone(&browser), config)?;
	let pagehide = Listener::new(browser.window.as_ref(), "pagehide", on_pagehide)
		.map_err(|error| error!(?error, "Could not watch for pagehide."))
		.ok();
	ATTACHED.with(|slot| *slot.borrow_mut() = Some((attached, pagehide)));
	Ok(())
}

/// Detaches unless the page is entering the back-forward cache, where it resumes as it was.
fn on_pagehide(event: Event) {
	if event.dyn_ref::<PageTransitionEvent>().map_or(false, PageTransitionEvent::persisted) {
		debug!("Page cached for back-forward navigation; staying attached.");
		return;
	}
	// Deferred so the listener isn't dropped while it runs.
	spawn_local(async { detach_from_document() });
}

/// Undoes [`attach_to_document`]. Does nothing if not attached.
#[wasm_bindgen(js_name = detach)]
pub fn detach_from_document() {
	let previous = ATTACHED.with(|slot| slot.borrow_mut().take());
	drop(previous);
}
