//! Explicit ownership of every DOM event listener the page installs.
//!
//! Each [`Listener`] owns its JavaScript closure and removes itself from its target when dropped, so tearing
//! down a [`Registry`] leaves no handlers behind that could fire into freed Rust state.

use crate::page::Role;
use hashbrown::HashMap;
use tracing::{trace, warn};
use wasm_bindgen::{closure::Closure, JsCast, JsValue};
use web_sys::{Event, EventTarget};

pub struct Listener {
	target: EventTarget,
	event: &'static str,
	closure: Closure<dyn Fn(Event)>,
}

impl Listener {
	/// # Errors
	///
	/// Iff `addEventListener` throws.
	pub fn new(target: &EventTarget, event: &'static str, handler: impl Fn(Event) + 'static) -> Result<Self, JsValue> {
		let closure = Closure::wrap(Box::new(handler) as Box<dyn Fn(Event)>);
		target.add_event_listener_with_callback(event, closure.as_ref().unchecked_ref())?;
		trace!(event, "Created listener.");
		Ok(Self {
			target: target.clone(),
			event,
			closure,
		})
	}
}

impl Drop for Listener {
	fn drop(&mut self) {
		if let Err(error) = self.target.remove_event_listener_with_callback(self.event, self.closure.as_ref().unchecked_ref()) {
			warn!(?error, event = self.event, "Failed to remove listener.");
		}
		trace!(event = self.event, "Destroyed listener.");
	}
}

/// Listeners grouped by the element role they serve.
#[derive(Default)]
pub struct Registry {
	bindings: HashMap<Role, Vec<Listener>>,
}

impl Registry {
	#[must_use]
	pub fn new() -> Self {
		Self::default()
	}

	pub fn bind(&mut self, role: Role, listener: Listener) {
		self.bindings.entry(role).or_default().push(listener);
	}

	#[must_use]
	pub fn count(&self, role: Role) -> usize {
		self.bindings.get(&role).map_or(0, Vec::len)
	}

	#[must_use]
	pub fn len(&self) -> usize {
		self.bindings.values().map(Vec::len).sum()
	}

	#[must_use]
	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}

	pub fn clear(&mut self) {
		let removed = self.len();
		self.bindings.clear();
		trace!(removed, "Registry cleared.");
	}
}
