use super::registry::Listener;
use crate::platform::Panel;
use tracing::error;
use wasm_bindgen::JsCast;
use web_sys::{Document, HtmlElement, Window};

/// Class names match Bootstrap's popover so existing page styles apply.
const PANEL_CLASS: &str = "popover bs-popover-bottom profile-preview";

pub struct BrowserPanel {
	element: Option<HtmlElement>,
	_leave: Option<Listener>,
}

impl BrowserPanel {
	pub(super) fn open(window: &Window, document: &Document, anchor: &HtmlElement, markup: &str, on_leave: Box<dyn Fn()>) -> Self {
		let element = match document.create_element("div").map(JsCast::dyn_into::<HtmlElement>) {
			Ok(Ok(element)) => element,
			_ => {
				error!("Could not create the preview panel.");
				return Self { element: None, _leave: None };
			}
		};
		element.set_class_name(PANEL_CLASS);
		let _ = element.set_attribute("role", "tooltip");
		element.set_inner_html(markup);

		let rect = anchor.get_bounding_client_rect();
		let scroll_x = window.page_x_offset().unwrap_or(0.0);
		let scroll_y = window.page_y_offset().unwrap_or(0.0);
		let style = element.style();
		let _ = style.set_property("position", "absolute");
		let _ = style.set_property("z-index", "1060");
		let _ = style.set_property("top", &format!("{}px", rect.bottom() + scroll_y));
		let _ = style.set_property("left", &format!("{}px", rect.left() + scroll_x));

		match document.body() {
			Some(body) => {
				if let Err(error) = body.append_child(&element) {
					error!(?error, "Could not attach the preview panel.");
				}
			}
			None => error!("Document has no body for the preview panel."),
		}

		let leave = Listener::new(element.as_ref(), "mouseleave", move |_| on_leave())
			.map_err(|error| error!(?error, "Could not watch the preview panel."))
			.ok();
		Self {
			element: Some(element),
			_leave: leave,
		}
	}
}

impl Panel for BrowserPanel {
	fn is_hovered(&self) -> bool {
		self.element.as_ref().map_or(false, |element| element.matches(":hover").unwrap_or(false))
	}
}

impl Drop for BrowserPanel {
	fn drop(&mut self) {
		if let Some(element) = &self.element {
			element.remove();
		}
	}
}
