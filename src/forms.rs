//! Non-networked page affordances: the delete confirmation dialog and inline edit forms.

use crate::{
	error::{Error, Result},
	platform::{Control, Platform},
};
use tracing::{trace, warn};

/// Buttons that open the `#confirm-delete` dialog.
pub const CONFIRM_DELETE_TRIGGER_SELECTOR: &str = "[data-target='#confirm-delete']";
pub const DELETE_FORM_SELECTOR: &str = ".delete-form";

/// Points the dialog's form(s) at the trigger's `data-href` before the dialog opens.
/// Returns how many forms were updated.
///
/// # Errors
///
/// [`Error::MissingAttribute`] if the trigger has no `data-href`.
pub fn prepare_confirm_delete<P: Platform>(platform: &P, trigger: &P::Element) -> Result<usize> {
	let action = trigger.data("href").ok_or_else(|| {
		warn!("Delete trigger has no data-href.");
		Error::MissingAttribute { attribute: "href" }
	})?;
	let forms = platform.query_all(DELETE_FORM_SELECTOR);
	for form in &forms {
		form.set_attribute("action", &action);
	}
	trace!(forms = forms.len(), "Delete form target set.");
	Ok(forms.len())
}

/// A read-only view that an edit button swaps for a form, and a cancel button swaps back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct InlineEditor {
	pub edit_button: &'static str,
	pub cancel_button: &'static str,
	pub view: &'static str,
	pub form: &'static str,
}

pub const DESCRIPTION_EDITOR: InlineEditor = InlineEditor {
	edit_button: "description-btn",
	cancel_button: "cancel-description",
	view: "description",
	form: "description-form",
};

pub const TAG_EDITOR: InlineEditor = InlineEditor {
	edit_button: "tag-btn",
	cancel_button: "cancel-tag",
	view: "tags",
	form: "tag-form",
};

pub const EDITORS: [InlineEditor; 2] = [DESCRIPTION_EDITOR, TAG_EDITOR];

impl InlineEditor {
	pub fn open<P: Platform>(&self, platform: &P) {
		self.swap(platform, self.view, self.form);
	}

	pub fn cancel<P: Platform>(&self, platform: &P) {
		self.swap(platform, self.form, self.view);
	}

	fn swap<P: Platform>(&self, platform: &P, hide: &str, show: &str) {
		match (platform.element_by_id(hide), platform.element_by_id(show)) {
			(Some(hide), Some(show)) => {
				hide.set_visible(false);
				show.set_visible(true);
			}
			_ => warn!(hide, show, "Inline editor elements missing."),
		}
	}
}
