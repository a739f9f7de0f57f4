//! The slice of the DOM the controller touches.
//!
//! The browser implementation lives in `web` (wasm32 only). Anything else that can create
//! elements, set attributes and inline styles can host the controller, which is how the
//! integration tests drive it.

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// A top-left point in viewport pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// A box size in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    #[must_use]
    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

pub trait Dom {
    /// Handle to an element. Cloning must yield the same node, not a copy of it.
    type Element: Clone;

    /// All elements matching a CSS selector, in document order.
    fn query_selector_all(&self, selector: &str) -> Result<Vec<Self::Element>>;

    fn body(&self) -> Result<Self::Element>;

    /// Create a detached element.
    fn create_element(&self, tag: &str) -> Result<Self::Element>;

    fn append_child(&self, parent: &Self::Element, child: &Self::Element) -> Result<()>;

    /// Remove every child node of `element`.
    fn clear_children(&self, element: &Self::Element) -> Result<()>;

    /// Make `child` the only child of `parent`. If `child` cannot be inserted, `parent` is untouched.
    fn replace_children(&self, parent: &Self::Element, child: &Self::Element) -> Result<()>;

    fn first_element_child(&self, element: &Self::Element) -> Option<Self::Element>;

    fn get_attribute(&self, element: &Self::Element, name: &str) -> Option<String>;

    fn set_attribute(&self, element: &Self::Element, name: &str, value: &str) -> Result<()>;

    /// Set one inline style property (`display`, `pointer-events`, ...).
    fn set_style(&self, element: &Self::Element, property: &str, value: &str) -> Result<()>;

    fn viewport_size(&self) -> Size;

    /// Insert `text` into a text field at its caret, replacing the selection.
    fn insert_text(&self, field: &Self::Element, text: &str) -> Result<()>;

    /// Insert an HTML fragment into an editable element, as a paste would.
    fn paste_html(&self, target: &Self::Element, html: &str) -> Result<()>;
}

/// Resolve a selector to exactly one element.
pub fn resolve_one<D: Dom + ?Sized>(dom: &D, selector: &str) -> Result<D::Element> {
    let mut found = dom.query_selector_all(selector)?;
    match found.len() {
        0 => Err(crate::error::EmbedError::ElementNotFound {
            selector: selector.to_string(),
        }),
        1 => Ok(found.remove(0)),
        count => Err(crate::error::EmbedError::AmbiguousSelector {
            selector: selector.to_string(),
            count,
        }),
    }
}
