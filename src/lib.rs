//! # picker_embed
//!
//! Embed a remote **media picker** in a host page and get typed events back:
//!
//! - Show the picker in a container you own (`iframe`), a full-page **overlay**, or a small
//!   positioned **modal**
//! - Route the picker's `postMessage` traffic to per-integration callbacks, trusting only the
//!   picker's origin
//! - Remember the visitor's picker username across page loads
//!
//! ---
//!
//! ## How it fits together
//!
//! The picker is an ordinary web application served from its own origin. The host creates an
//! iframe pointing at its embed URL:
//!
//! ```text
//! <base>/embed?id=3&theme=dark&mediaSize=md&navbarSize=md&defaultTab=top&showNSFW=true
//!             &allowUsernameSelection=true&showCopyButton=false[&showCloseButton=true][&username=..]
//! ```
//!
//! and the picker posts messages back to the host window:
//!
//! | `type`                     | effect on the host                                    |
//! |----------------------------|-------------------------------------------------------|
//! | `picker:media-selected`    | `onSelectMedia`, then overlay/modal close themselves   |
//! | `picker:media-copy`        | `onCopyMedia` (only with `showCopyButton`)             |
//! | `picker:closed`            | the integration is closed                              |
//! | `picker:username-selected` | username stored                                        |
//! | `picker:username-cleared`  | username removed                                       |
//!
//! The `id` each message carries is the integration id the iframe was created with: `0` is
//! the overlay, `1` the modal, and every caller-owned frame gets a fresh id above `2`.
//!
//! ### Most important rules
//!
//! - **Only the picker origin is trusted.** Messages from any other origin are dropped before
//!   they are even parsed. The origin is derived from [`EmbedConfig::base_url`].
//! - **Re-activating is cheap.** Activating the overlay or the modal again with the same
//!   visible configuration keeps the loaded picker document (and its scroll position, search
//!   box, ...). Only a changed theme, size, tab, copy button or username setting reloads it.
//! - **Closing is idempotent.** [`EmbedController::desactivate`] on an unknown or already closed
//!   id does nothing.
//!
//! ---
//!
//! ## Crate layout
//!
//! - [`controller`]: the [`EmbedController`]: registry, lifecycle, embed URLs.
//! - [`router`]: message authentication and dispatch (plus an async queue, feature `tokio`).
//! - [`options`]: caller options, validation and defaults.
//! - [`protocol`]: message and media types shared with the picker.
//! - [`storage`]: username persistence.
//! - [`dom`]: the DOM operations the controller needs, as a trait.
//! - [`actions`], [`presets`], [`position`]: ready-made callbacks, appearance presets and the
//!   modal position clamp.
//! - `web` (wasm32 only): `web-sys` implementations and a `MediaPicker` JavaScript class.
//!
//! ---
//!
//! ## Quick start (Rust)
//!
//! ```no_run
//! # #[cfg(target_arch = "wasm32")]
//! # fn main() -> Result<(), picker_embed::EmbedError> {
//! use std::rc::Rc;
//! use picker_embed::web::{install_message_listener, LocalStorage, WebDom};
//! use picker_embed::{ActivateOptions, EmbedConfig, EmbedController, MediaEvent};
//!
//! let config = EmbedConfig::new("https://picker.example.org")?;
//! let controller = Rc::new(EmbedController::new(config, WebDom::new()?, LocalStorage::new())?);
//! install_message_listener(Rc::clone(&controller))?;
//!
//! controller.activate(
//!     ActivateOptions::overlay(|event: &MediaEvent| {
//!         tracing::info!(url = ?event.media.cache_url(), "picked");
//!     })
//!     .with_theme("dark"),
//! )?;
//! # Ok(())
//! # }
//! # #[cfg(not(target_arch = "wasm32"))]
//! # fn main() {}
//! ```
//!
//! ## Quick start (JavaScript)
//!
//! ```js
//! const picker = new MediaPicker("https://picker.example.org");
//! picker.activate({
//!   type: "modal",
//!   openPosition: { x: 10, y: 10 },
//!   onSelectMedia: ({ media }) => insert(media.cache_url),
//! });
//! ```
//!
//! ---
//!
//! ## Options and defaults
//!
//! | option                   | values                               | default  |
//! |--------------------------|--------------------------------------|----------|
//! | `type`                   | `iframe`, `overlay`, `modal`         | `iframe` |
//! | `container`              | element or selector (iframe only)    | required |
//! | `openPosition`           | `{x, y}` (modal only)                | required |
//! | `theme`                  | `light`, `dark`, `light-old`, `dark-old` | `light` |
//! | `mediaSize`/`navbarSize` | `sm`, `md`, `lg`                     | `md`     |
//! | `defaultTab`             | `search`, `fav`, `hot`, `top`, `new`, `rand` | `top` |
//! | `showNSFW`               | bool                                 | `true`   |
//! | `allowUsernameSelection` | bool                                 | `true`   |
//! | `showCopyButton`         | bool                                 | `false`  |
//! | `onSelectMedia`          | callback                             | required |
//! | `onCopyMedia`            | callback                             | none     |
//!
//! Anything invalid fails [`EmbedController::activate`] with
//! [`EmbedError::InvalidConfiguration`] (or [`EmbedError::ElementNotFound`] for a selector that
//! matches nothing) before any DOM change.
//!
//! ---
//!
//! ## Testing without a browser
//!
//! [`Dom`] and [`KeyValueStore`] are plain traits. Implement them over an in-memory tree and
//! [`MemoryStorage`], build an [`EmbedController`] over them and feed it messages with
//! [`EmbedController::handle_message`]. This crate's own integration tests do exactly that.

pub mod actions;
pub mod config;
pub mod controller;
pub mod dom;
pub mod error;
pub mod options;
pub mod position;
pub mod presets;
pub mod protocol;
pub mod router;
pub mod storage;

#[cfg(target_arch = "wasm32")]
pub mod web;

// -------- Core re-exports --------

#[doc(inline)]
pub use config::EmbedConfig;
#[doc(inline)]
pub use controller::EmbedController;
#[doc(inline)]
pub use dom::{Dom, Position, Size};
#[doc(inline)]
pub use error::{EmbedError, Result};
#[doc(inline)]
pub use options::{
    ActivateOptions, Appearance, Container, DefaultTab, EmbedOptions, IntegrationKind, Placement,
    SizeClass, Theme,
};
#[doc(inline)]
pub use protocol::{InboundMessage, IntegrationId, MediaCallback, MediaEvent, MediaRecord};
#[doc(inline)]
pub use router::Routed;
#[doc(inline)]
pub use storage::{KeyValueStore, MemoryStorage};

#[cfg(feature = "tokio")]
#[doc(inline)]
pub use router::{channel, event_loop, MessageSender};
