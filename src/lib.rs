#![doc(html_root_url = "https://docs.rs/albumy-dom/0.1.0")]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
//! Keeps a server-rendered photo-sharing page in sync with the server without reloads: follow and collect
//! toggles, follower/collector/notification counters, a transient toast, and hover-intent profile previews.
//!
//! Everything except [`web`] is independent of the browser and runs against a [`Platform`](platform::Platform).

pub mod config;
pub mod counter;
pub mod error;
pub mod forms;
pub mod hover;
pub mod page;
pub mod pipeline;
pub mod platform;
pub mod poller;
pub mod timestamp;
pub mod toast;
pub mod toggle;

#[cfg(target_arch = "wasm32")]
pub mod web;

#[cfg(test)]
mod testing;

#[cfg(doctest)]
pub mod readme {
	doc_comment::doctest!("../README.md");
}

pub use config::{PageConfig, Timing};
pub use error::{Error, Result};
pub use page::{Page, Role};
pub use toast::ToastCategory;
pub use toggle::ToggleAction;
