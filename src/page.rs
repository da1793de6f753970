//! Wires every component of one page together and maps element roles to handlers.

use crate::{
	config::PageConfig,
	counter::Counters,
	forms::{prepare_confirm_delete, InlineEditor, CONFIRM_DELETE_TRIGGER_SELECTOR, EDITORS},
	hover::{HoverScheduler, PROFILE_POPOVER_SELECTOR},
	pipeline::Pipeline,
	platform::Platform,
	poller::NotificationPoller,
	timestamp::annotate_timestamps,
	toast::Toast,
	toggle::{ToggleAction, Toggles},
};
use core::cell::RefCell;
use std::{borrow::Cow, rc::Rc};
use tracing::{info, instrument};

/// What a server-rendered element is for, as far as event handling goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
	Toggle(ToggleAction),
	ProfilePopover,
	DeleteTrigger,
	EditOpen(InlineEditor),
	EditCancel(InlineEditor),
}

impl Role {
	/// Every role that reacts to clicks.
	#[must_use]
	pub fn clickable() -> Vec<Self> {
		let mut roles: Vec<Self> = ToggleAction::ALL.iter().copied().map(Self::Toggle).collect();
		roles.push(Self::DeleteTrigger);
		for editor in EDITORS {
			roles.push(Self::EditOpen(editor));
			roles.push(Self::EditCancel(editor));
		}
		roles
	}

	#[must_use]
	pub fn selector(self) -> Cow<'static, str> {
		match self {
			Self::Toggle(action) => action.selector().into(),
			Self::ProfilePopover => PROFILE_POPOVER_SELECTOR.into(),
			Self::DeleteTrigger => CONFIRM_DELETE_TRIGGER_SELECTOR.into(),
			Self::EditOpen(editor) => format!("#{}", editor.edit_button).into(),
			Self::EditCancel(editor) => format!("#{}", editor.cancel_button).into(),
		}
	}
}

pub struct Page<P: Platform> {
	platform: Rc<P>,
	config: Rc<PageConfig>,
	counters: Counters<P>,
	toggles: Toggles<P>,
	hover: HoverScheduler<P>,
	poller: RefCell<Option<NotificationPoller<P>>>,
}

impl<P: Platform> Page<P> {
	#[must_use]
	pub fn new(platform: Rc<P>, config: PageConfig) -> Self {
		let config = Rc::new(config);
		let toast = Toast::new(Rc::clone(&platform), config.timing.toast());
		let pipeline = Pipeline::new(Rc::clone(&platform), Rc::clone(&config), toast);
		let counters = Counters::new(Rc::clone(&platform), pipeline.clone());
		let toggles = Toggles::new(Rc::clone(&platform), pipeline.clone(), counters.clone());
		let hover = HoverScheduler::new(Rc::clone(&platform), pipeline, config.timing);
		Self {
			platform,
			config,
			counters,
			toggles,
			hover,
			poller: RefCell::new(None),
		}
	}

	/// Starts the poller and annotates timestamps. `offset_minutes` is the viewer's offset east of UTC.
	#[instrument(skip(self))]
	pub fn start(&self, offset_minutes: i32) {
		*self.poller.borrow_mut() = NotificationPoller::start(&self.platform, &self.config, self.counters.clone());
		let annotated = annotate_timestamps(&*self.platform, offset_minutes);
		info!(annotated, polling = self.is_polling(), "Page attached.");
	}

	/// Runs the click handler for `role`. Returns whether it did anything.
	pub fn dispatch_click(&self, role: Role, element: P::Element) -> bool {
		match role {
			Role::Toggle(action) => self.toggles.click(action, element),
			Role::DeleteTrigger => prepare_confirm_delete(&*self.platform, &element).is_ok(),
			Role::EditOpen(editor) => {
				editor.open(&*self.platform);
				true
			}
			Role::EditCancel(editor) => {
				editor.cancel(&*self.platform);
				true
			}
			Role::ProfilePopover => false,
		}
	}

	/// Stops polling and closes every preview.
	pub fn teardown(&self) {
		self.poller.borrow_mut().take();
		self.hover.clear();
		info!("Page detached.");
	}

	#[must_use]
	pub fn is_polling(&self) -> bool {
		self.poller.borrow().is_some()
	}

	#[must_use]
	pub fn hover(&self) -> &HoverScheduler<P> {
		&self.hover
	}
}
