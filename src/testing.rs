//! In-memory [`Platform`] with a virtual clock, for unit tests.

use crate::{
	error::TransportError,
	pipeline::{Request, Response},
	platform::{Control, Panel, Platform},
};
use core::{
	cell::{Cell, RefCell},
	future::Future,
	time::Duration,
};
use futures::{
	channel::oneshot,
	executor::{LocalPool, LocalSpawner},
	future::{self, LocalBoxFuture},
	task::LocalSpawnExt,
	FutureExt,
};
use hashbrown::HashMap;
use std::{
	collections::VecDeque,
	rc::{Rc, Weak},
};

#[derive(Default)]
struct Node {
	id: Option<String>,
	classes: Vec<String>,
	data: HashMap<String, String>,
	attributes: HashMap<String, String>,
	styles: HashMap<String, String>,
	text: String,
	visible: bool,
	disabled: bool,
	hovered: bool,
	previous: Weak<RefCell<Node>>,
	next: Weak<RefCell<Node>>,
}

#[derive(Clone)]
pub(crate) struct FakeElement(Rc<RefCell<Node>>);

impl FakeElement {
	pub(crate) fn new() -> Self {
		Self(Rc::new(RefCell::new(Node {
			visible: true,
			..Node::default()
		})))
	}

	pub(crate) fn id(self, id: &str) -> Self {
		self.0.borrow_mut().id = Some(id.to_owned());
		self
	}

	pub(crate) fn class(self, class: &str) -> Self {
		self.0.borrow_mut().classes.push(class.to_owned());
		self
	}

	pub(crate) fn with_data(self, key: &str, value: &str) -> Self {
		self.0.borrow_mut().data.insert(key.to_owned(), value.to_owned());
		self
	}

	pub(crate) fn with_attribute(self, name: &str, value: &str) -> Self {
		self.0.borrow_mut().attributes.insert(name.to_owned(), value.to_owned());
		self
	}

	pub(crate) fn hidden(self) -> Self {
		self.0.borrow_mut().visible = false;
		self
	}

	pub(crate) fn text(&self) -> String {
		self.0.borrow().text.clone()
	}

	pub(crate) fn style(&self, property: &str) -> Option<String> {
		self.0.borrow().styles.get(property).cloned()
	}

	pub(crate) fn attribute(&self, name: &str) -> Option<String> {
		self.0.borrow().attributes.get(name).cloned()
	}

	pub(crate) fn is_visible(&self) -> bool {
		self.0.borrow().visible
	}

	pub(crate) fn is_disabled(&self) -> bool {
		self.0.borrow().disabled
	}

	pub(crate) fn hover(&self, hovered: bool) {
		self.0.borrow_mut().hovered = hovered;
	}

	pub(crate) fn same(&self, other: &Self) -> bool {
		Rc::ptr_eq(&self.0, &other.0)
	}

	fn matches(&self, selector: &str) -> bool {
		let node = self.0.borrow();
		if let Some(class) = selector.strip_prefix('.') {
			node.classes.iter().any(|c| c == class)
		} else if let Some(id) = selector.strip_prefix('#') {
			node.id.as_deref() == Some(id)
		} else if let Some(inner) = selector.strip_prefix('[').and_then(|s| s.strip_suffix(']')) {
			let (name, expected) = match inner.split_once('=') {
				Some((name, value)) => (name, Some(value.trim_matches(|c| c == '\'' || c == '"'))),
				None => (inner, None),
			};
			let actual = match name.strip_prefix("data-") {
				Some(key) => node.data.get(key),
				None => node.attributes.get(name),
			};
			match (actual, expected) {
				(Some(actual), Some(expected)) => actual == expected,
				(Some(_), None) => true,
				(None, _) => false,
			}
		} else {
			false
		}
	}
}

impl Control for FakeElement {
	fn data(&self, key: &str) -> Option<String> {
		self.0.borrow().data.get(key).cloned()
	}

	fn set_attribute(&self, name: &str, value: &str) {
		self.0.borrow_mut().attributes.insert(name.to_owned(), value.to_owned());
	}

	fn set_text(&self, text: &str) {
		self.0.borrow_mut().text = text.to_owned();
	}

	fn set_style(&self, property: &str, value: &str) {
		self.0.borrow_mut().styles.insert(property.to_owned(), value.to_owned());
	}

	fn set_visible(&self, visible: bool) {
		self.0.borrow_mut().visible = visible;
	}

	fn is_visible(&self) -> bool {
		self.0.borrow().visible
	}

	fn set_disabled(&self, disabled: bool) {
		self.0.borrow_mut().disabled = disabled;
	}

	fn is_hovered(&self) -> bool {
		self.0.borrow().hovered
	}

	fn previous(&self) -> Option<Self> {
		self.0.borrow().previous.upgrade().map(FakeElement)
	}

	fn next(&self) -> Option<Self> {
		self.0.borrow().next.upgrade().map(FakeElement)
	}
}

pub(crate) struct FakeTimer(Rc<Cell<bool>>);

impl Drop for FakeTimer {
	fn drop(&mut self) {
		self.0.set(true);
	}
}

struct TimerEntry {
	due: Duration,
	sequence: u64,
	cancelled: Rc<Cell<bool>>,
	callback: Box<dyn FnOnce()>,
}

struct IntervalEntry {
	due: Duration,
	sequence: u64,
	period: Duration,
	cancelled: Rc<Cell<bool>>,
	callback: Rc<RefCell<Box<dyn FnMut()>>>,
}

struct PanelState {
	anchor: FakeElement,
	markup: String,
	open: Cell<bool>,
	hovered: Cell<bool>,
	on_leave: Box<dyn Fn()>,
}

pub(crate) struct FakePanel(Rc<PanelState>);

impl Panel for FakePanel {
	fn is_hovered(&self) -> bool {
		self.0.hovered.get()
	}
}

impl Drop for FakePanel {
	fn drop(&mut self) {
		self.0.open.set(false);
	}
}

type Reply = Result<Response, TransportError>;

pub(crate) struct FakePlatform {
	elements: RefCell<Vec<FakeElement>>,
	now: Cell<Duration>,
	sequence: Cell<u64>,
	timers: RefCell<Vec<TimerEntry>>,
	intervals: RefCell<Vec<IntervalEntry>>,
	pool: RefCell<LocalPool>,
	spawner: LocalSpawner,
	origin: RefCell<Option<String>>,
	requests: RefCell<Vec<Request>>,
	scripted: RefCell<HashMap<String, VecDeque<Reply>>>,
	held: RefCell<Vec<(String, oneshot::Sender<Reply>)>>,
	panels: RefCell<Vec<Rc<PanelState>>>,
}

impl FakePlatform {
	pub(crate) fn new() -> Rc<Self> {
		let pool = LocalPool::new();
		let spawner = pool.spawner();
		Rc::new(Self {
			elements: RefCell::default(),
			now: Cell::default(),
			sequence: Cell::default(),
			timers: RefCell::default(),
			intervals: RefCell::default(),
			pool: RefCell::new(pool),
			spawner,
			origin: RefCell::default(),
			requests: RefCell::default(),
			scripted: RefCell::default(),
			held: RefCell::default(),
			panels: RefCell::default(),
		})
	}

	pub(crate) fn add(&self, element: FakeElement) -> FakeElement {
		self.elements.borrow_mut().push(element.clone());
		element
	}

	/// Adds `elements` as consecutive siblings.
	pub(crate) fn add_siblings(&self, elements: &[FakeElement]) {
		for pair in elements.windows(2) {
			pair[0].0.borrow_mut().next = Rc::downgrade(&pair[1].0);
			pair[1].0.borrow_mut().previous = Rc::downgrade(&pair[0].0);
		}
		for element in elements {
			self.add(element.clone());
		}
	}

	pub(crate) fn set_origin(&self, origin: &str) {
		*self.origin.borrow_mut() = Some(origin.to_owned());
	}

	/// Queues a reply that the next request to `url` receives immediately.
	pub(crate) fn respond(&self, url: &str, reply: Reply) {
		self.scripted.borrow_mut().entry(url.to_owned()).or_default().push_back(reply);
	}

	/// Completes the oldest still-unanswered request to `url`.
	pub(crate) fn resolve(&self, url: &str, reply: Reply) -> bool {
		let sender = {
			let mut held = self.held.borrow_mut();
			match held.iter().position(|(held_url, _)| held_url == url) {
				Some(index) => held.remove(index).1,
				None => return false,
			}
		};
		let delivered = sender.send(reply).is_ok();
		self.run();
		delivered
	}

	pub(crate) fn requests(&self) -> Vec<Request> {
		self.requests.borrow().clone()
	}

	pub(crate) fn requests_to(&self, url: &str) -> usize {
		self.requests.borrow().iter().filter(|request| request.url == url).count()
	}

	pub(crate) fn pending_timers(&self) -> usize {
		self.timers.borrow().iter().filter(|timer| !timer.cancelled.get()).count()
	}

	pub(crate) fn active_intervals(&self) -> usize {
		self.intervals.borrow().iter().filter(|interval| !interval.cancelled.get()).count()
	}

	pub(crate) fn open_panels(&self) -> usize {
		self.panels.borrow().iter().filter(|panel| panel.open.get()).count()
	}

	pub(crate) fn panel_markup(&self, anchor: &FakeElement) -> Option<String> {
		self.open_panel_for(anchor).map(|panel| panel.markup.clone())
	}

	pub(crate) fn hover_panel(&self, anchor: &FakeElement, hovered: bool) {
		if let Some(panel) = self.open_panel_for(anchor) {
			panel.hovered.set(hovered);
		}
	}

	/// Moves the pointer out of the panel anchored to `anchor`.
	pub(crate) fn leave_panel(&self, anchor: &FakeElement) {
		if let Some(panel) = self.open_panel_for(anchor) {
			panel.hovered.set(false);
			(panel.on_leave)();
			self.run();
		}
	}

	fn open_panel_for(&self, anchor: &FakeElement) -> Option<Rc<PanelState>> {
		self.panels.borrow().iter().rev().find(|panel| panel.open.get() && panel.anchor.same(anchor)).cloned()
	}

	/// Runs spawned tasks until none can make progress.
	pub(crate) fn run(&self) {
		self.pool.borrow_mut().run_until_stalled();
	}

	pub(crate) fn block_on<F: Future>(&self, future: F) -> F::Output {
		self.pool.borrow_mut().run_until(future)
	}

	/// Moves the virtual clock forward, firing due timers and intervals in order.
	pub(crate) fn advance(&self, by: Duration) {
		let target = self.now.get() + by;
		self.run();
		while self.fire_next(target) {
			self.run();
		}
		self.now.set(target);
	}

	fn fire_next(&self, target: Duration) -> bool {
		self.timers.borrow_mut().retain(|timer| !timer.cancelled.get());
		self.intervals.borrow_mut().retain(|interval| !interval.cancelled.get());

		let timer = self.timers.borrow().iter().enumerate().filter(|(_, t)| t.due <= target).min_by_key(|(_, t)| (t.due, t.sequence)).map(|(i, t)| (i, t.due, t.sequence));
		let interval = self.intervals.borrow().iter().enumerate().filter(|(_, t)| t.due <= target).min_by_key(|(_, t)| (t.due, t.sequence)).map(|(i, t)| (i, t.due, t.sequence));

		match (timer, interval) {
			(Some((index, due, sequence)), interval) if interval.map_or(true, |(_, i_due, i_sequence)| (due, sequence) < (i_due, i_sequence)) => {
				let timer = self.timers.borrow_mut().remove(index);
				self.now.set(due);
				(timer.callback)();
				true
			}
			(_, Some((index, due, _))) => {
				let callback = {
					let mut intervals = self.intervals.borrow_mut();
					let interval = &mut intervals[index];
					interval.due += interval.period;
					Rc::clone(&interval.callback)
				};
				self.now.set(due);
				let mut callback = callback.borrow_mut();
				(*callback)();
				true
			}
			_ => false,
		}
	}

	fn next_sequence(&self) -> u64 {
		let sequence = self.sequence.get();
		self.sequence.set(sequence + 1);
		sequence
	}
}

impl Platform for FakePlatform {
	type Element = FakeElement;
	type Timer = FakeTimer;
	type Interval = FakeTimer;
	type Panel = FakePanel;

	fn element_by_id(&self, id: &str) -> Option<FakeElement> {
		self.elements.borrow().iter().find(|element| element.0.borrow().id.as_deref() == Some(id)).cloned()
	}

	fn query_all(&self, selector: &str) -> Vec<FakeElement> {
		self.elements.borrow().iter().filter(|element| selector.split(',').any(|part| element.matches(part.trim()))).cloned().collect()
	}

	fn set_timeout(&self, delay: Duration, callback: Box<dyn FnOnce()>) -> FakeTimer {
		let cancelled = Rc::new(Cell::new(false));
		self.timers.borrow_mut().push(TimerEntry {
			due: self.now.get() + delay,
			sequence: self.next_sequence(),
			cancelled: Rc::clone(&cancelled),
			callback,
		});
		FakeTimer(cancelled)
	}

	fn set_interval(&self, period: Duration, callback: Box<dyn FnMut()>) -> FakeTimer {
		let cancelled = Rc::new(Cell::new(false));
		self.intervals.borrow_mut().push(IntervalEntry {
			due: self.now.get() + period,
			sequence: self.next_sequence(),
			period,
			cancelled: Rc::clone(&cancelled),
			callback: Rc::new(RefCell::new(callback)),
		});
		FakeTimer(cancelled)
	}

	fn spawn(&self, task: LocalBoxFuture<'static, ()>) {
		self.spawner.spawn_local(task).expect("executor shut down");
	}

	fn fetch(&self, request: Request) -> LocalBoxFuture<'static, Result<Response, TransportError>> {
		let url = request.url.clone();
		self.requests.borrow_mut().push(request);
		if let Some(reply) = self.scripted.borrow_mut().get_mut(&url).and_then(VecDeque::pop_front) {
			return future::ready(reply).boxed_local();
		}
		let (sender, receiver) = oneshot::channel();
		self.held.borrow_mut().push((url, sender));
		async move { receiver.await.unwrap_or_else(|_| Err(TransportError::new("request dropped"))) }.boxed_local()
	}

	fn origin(&self) -> Option<String> {
		self.origin.borrow().clone()
	}

	fn open_panel(&self, anchor: &FakeElement, markup: &str, on_leave: Box<dyn Fn()>) -> FakePanel {
		let state = Rc::new(PanelState {
			anchor: anchor.clone(),
			markup: markup.to_owned(),
			open: Cell::new(true),
			hovered: Cell::new(false),
			on_leave,
		});
		self.panels.borrow_mut().push(Rc::clone(&state));
		FakePanel(state)
	}
}
