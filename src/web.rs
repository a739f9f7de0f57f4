//! Browser bindings: `web-sys` DOM and `localStorage`, the window `message` listener, and a
//! `MediaPicker` class for JavaScript callers.
//!
//! ```js
//! import init, { MediaPicker } from "picker_embed";
//!
//! await init();
//! const picker = new MediaPicker("https://picker.example.org");
//! picker.activate({ type: "overlay", theme: "dark", onSelectMedia: (e) => console.log(e.media) });
//! ```

use std::rc::Rc;

use js_sys::{Function, Reflect, JSON};
use serde_json::Value;
use tracing::{debug, warn};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{Document, Element, HtmlElement, HtmlInputElement, HtmlTextAreaElement, MessageEvent, Storage, Window};

use crate::config::EmbedConfig;
use crate::controller::EmbedController;
use crate::dom::{Dom, Size};
use crate::error::{EmbedError, Result};
use crate::options::{ActivateOptions, Container};
use crate::protocol::{IntegrationId, MediaCallback, MediaEvent};
use crate::storage::KeyValueStore;

fn dom_err(e: JsValue) -> EmbedError {
    EmbedError::Dom(format!("{e:?}"))
}

fn utf16_len(s: &str) -> u32 {
    u32::try_from(s.encode_utf16().count()).unwrap_or(u32::MAX)
}

/// The live document.
#[derive(Debug, Clone)]
pub struct WebDom {
    window: Window,
    document: Document,
}

impl WebDom {
    pub fn new() -> Result<Self> {
        let window = web_sys::window().ok_or_else(|| EmbedError::Dom("no window".into()))?;
        let document = window
            .document()
            .ok_or_else(|| EmbedError::Dom("no document".into()))?;
        Ok(Self { window, document })
    }

    pub fn window(&self) -> &Window {
        &self.window
    }
}

impl Dom for WebDom {
    type Element = Element;

    fn query_selector_all(&self, selector: &str) -> Result<Vec<Element>> {
        let nodes = self
            .document
            .query_selector_all(selector)
            .map_err(|_| EmbedError::invalid("container", format!("bad selector `{selector}`")))?;
        Ok((0..nodes.length())
            .filter_map(|i| nodes.item(i))
            .filter_map(|node| node.dyn_into::<Element>().ok())
            .collect())
    }

    fn body(&self) -> Result<Element> {
        self.document
            .body()
            .map(Element::from)
            .ok_or_else(|| EmbedError::Dom("document has no body".into()))
    }

    fn create_element(&self, tag: &str) -> Result<Element> {
        self.document.create_element(tag).map_err(dom_err)
    }

    fn append_child(&self, parent: &Element, child: &Element) -> Result<()> {
        parent.append_child(child).map(drop).map_err(dom_err)
    }

    fn clear_children(&self, element: &Element) -> Result<()> {
        element.set_inner_html("");
        Ok(())
    }

    fn replace_children(&self, parent: &Element, child: &Element) -> Result<()> {
        parent.append_child(child).map_err(dom_err)?;
        let child: &web_sys::Node = child.as_ref();
        while let Some(first) = parent.first_child() {
            if first.is_same_node(Some(child)) {
                break;
            }
            parent.remove_child(&first).map_err(dom_err)?;
        }
        Ok(())
    }

    fn first_element_child(&self, element: &Element) -> Option<Element> {
        element.first_element_child()
    }

    fn get_attribute(&self, element: &Element, name: &str) -> Option<String> {
        element.get_attribute(name)
    }

    fn set_attribute(&self, element: &Element, name: &str, value: &str) -> Result<()> {
        element.set_attribute(name, value).map_err(dom_err)
    }

    fn set_style(&self, element: &Element, property: &str, value: &str) -> Result<()> {
        let html = element
            .dyn_ref::<HtmlElement>()
            .ok_or_else(|| EmbedError::Dom(format!("<{}> has no style", element.tag_name())))?;
        html.style().set_property(property, value).map_err(dom_err)
    }

    fn viewport_size(&self) -> Size {
        let read = |v: std::result::Result<JsValue, JsValue>| {
            v.ok().and_then(|v| v.as_f64()).unwrap_or(0.0)
        };
        Size::new(
            read(self.window.inner_width()),
            read(self.window.inner_height()),
        )
    }

    fn insert_text(&self, field: &Element, text: &str) -> Result<()> {
        if let Some(input) = field.dyn_ref::<HtmlInputElement>() {
            let len = utf16_len(&input.value());
            let start = input.selection_start().map_err(dom_err)?.unwrap_or(len);
            let end = input.selection_end().map_err(dom_err)?.unwrap_or(start);
            input
                .set_range_text_with_start_and_end(text, start, end)
                .map_err(dom_err)?;
            let caret = start + utf16_len(text);
            return input.set_selection_range(caret, caret).map_err(dom_err);
        }
        if let Some(area) = field.dyn_ref::<HtmlTextAreaElement>() {
            let len = utf16_len(&area.value());
            let start = area.selection_start().map_err(dom_err)?.unwrap_or(len);
            let end = area.selection_end().map_err(dom_err)?.unwrap_or(start);
            area.set_range_text_with_start_and_end(text, start, end)
                .map_err(dom_err)?;
            let caret = start + utf16_len(text);
            return area.set_selection_range(caret, caret).map_err(dom_err);
        }
        field
            .insert_adjacent_text("beforeend", text)
            .map_err(dom_err)
    }

    fn paste_html(&self, target: &Element, html: &str) -> Result<()> {
        if let Some(el) = target.dyn_ref::<HtmlElement>() {
            if let Err(e) = el.focus() {
                debug!(error = ?e, "could not focus paste target");
            }
        }
        target
            .insert_adjacent_html("beforeend", html)
            .map_err(dom_err)
    }
}

/// `window.localStorage`, or nothing when the page is not allowed to use it.
#[derive(Debug, Clone)]
pub struct LocalStorage {
    storage: Option<Storage>,
}

impl LocalStorage {
    #[must_use]
    pub fn new() -> Self {
        let storage = web_sys::window().and_then(|w| w.local_storage().ok().flatten());
        if storage.is_none() {
            debug!("localStorage unavailable, username is kept for this page only");
        }
        Self { storage }
    }
}

impl Default for LocalStorage {
    fn default() -> Self {
        Self::new()
    }
}

impl KeyValueStore for LocalStorage {
    fn get(&self, key: &str) -> Option<String> {
        self.storage.as_ref()?.get_item(key).ok().flatten()
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        match &self.storage {
            Some(storage) => storage
                .set_item(key, value)
                .map_err(|e| EmbedError::Storage(format!("{e:?}"))),
            None => Err(EmbedError::Storage("localStorage unavailable".into())),
        }
    }

    fn remove(&self, key: &str) -> Result<()> {
        match &self.storage {
            Some(storage) => storage
                .remove_item(key)
                .map_err(|e| EmbedError::Storage(format!("{e:?}"))),
            None => Ok(()),
        }
    }
}

fn js_to_json(value: &JsValue) -> Option<Value> {
    let text = JSON::stringify(value).ok()?.as_string()?;
    serde_json::from_str(&text).ok()
}

fn json_to_js(value: &impl serde::Serialize) -> Result<JsValue> {
    let text = serde_json::to_string(value)?;
    JSON::parse(&text).map_err(dom_err)
}

/// Route every window `message` event into `controller`.
///
/// Call once per controller: each call adds another listener.
pub fn install_message_listener<S>(controller: Rc<EmbedController<WebDom, S>>) -> Result<()>
where
    S: KeyValueStore + 'static,
{
    let window = controller.dom().window().clone();
    let listener = Closure::<dyn FnMut(MessageEvent)>::new(move |event: MessageEvent| {
        let Some(data) = js_to_json(&event.data()) else {
            return;
        };
        controller.handle_message(&event.origin(), &data);
    });
    window
        .add_event_listener_with_callback("message", listener.as_ref().unchecked_ref())
        .map_err(dom_err)?;
    // The listener lives as long as the page.
    listener.forget();
    Ok(())
}

/// Wrap a JavaScript function as a media callback. Exceptions it throws are logged.
fn js_callback(function: Function) -> MediaCallback {
    MediaCallback::new(move |event: &MediaEvent| {
        let arg = match json_to_js(event) {
            Ok(arg) => arg,
            Err(e) => {
                warn!(error = %e, "could not convert media event");
                return;
            }
        };
        if let Err(e) = function.call1(&JsValue::NULL, &arg) {
            warn!(id = %event.id, error = ?e, "media callback threw");
        }
    })
}

fn function_field(options: &JsValue, name: &str) -> Option<MediaCallback> {
    Reflect::get(options, &JsValue::from_str(name))
        .ok()?
        .dyn_into::<Function>()
        .ok()
        .map(js_callback)
}

fn to_js_error(e: EmbedError) -> JsValue {
    let name = match &e {
        EmbedError::InvalidConfiguration { .. } | EmbedError::AmbiguousSelector { .. } => {
            "InvalidConfiguration"
        }
        EmbedError::ElementNotFound { .. } => "ElementNotFound",
        _ => "EmbedError",
    };
    let error = js_sys::Error::new(&e.to_string());
    error.set_name(name);
    error.into()
}

/// Read JavaScript options: plain fields through serde, the container and callbacks by hand.
fn read_options(options: &JsValue) -> Result<ActivateOptions<Element>> {
    let mut fields = js_to_json(options)
        .ok_or_else(|| EmbedError::invalid("options", "expected an object"))?;
    let map = fields
        .as_object_mut()
        .ok_or_else(|| EmbedError::invalid("options", "expected an object"))?;
    map.remove("container");
    map.remove("onSelectMedia");
    map.remove("onCopyMedia");
    let mut parsed: ActivateOptions<Element> = serde_json::from_value(fields)
        .map_err(|e| EmbedError::invalid("options", e.to_string()))?;

    let container = Reflect::get(options, &JsValue::from_str("container")).unwrap_or(JsValue::UNDEFINED);
    parsed.container = if let Some(selector) = container.as_string() {
        Some(Container::Selector(selector))
    } else if let Some(element) = container.dyn_ref::<Element>() {
        Some(Container::Element(element.clone()))
    } else {
        None
    };
    parsed.on_select_media = function_field(options, "onSelectMedia");
    parsed.on_copy_media = function_field(options, "onCopyMedia");
    Ok(parsed)
}

/// JavaScript entry point.
#[wasm_bindgen]
pub struct MediaPicker {
    controller: Rc<EmbedController<WebDom, LocalStorage>>,
}

#[wasm_bindgen]
impl MediaPicker {
    /// Create a picker for the application served at `base_url` and start listening.
    #[wasm_bindgen(constructor)]
    pub fn new(base_url: &str) -> std::result::Result<MediaPicker, JsValue> {
        let config = EmbedConfig::new(base_url).map_err(to_js_error)?;
        let dom = WebDom::new().map_err(to_js_error)?;
        let controller = Rc::new(
            EmbedController::new(config, dom, LocalStorage::new()).map_err(to_js_error)?,
        );
        install_message_listener(Rc::clone(&controller)).map_err(to_js_error)?;
        Ok(Self { controller })
    }

    /// Show the picker; returns the integration id.
    pub fn activate(&self, options: JsValue) -> std::result::Result<u32, JsValue> {
        let options = read_options(&options).map_err(to_js_error)?;
        self.controller
            .activate(options)
            .map(IntegrationId::as_u32)
            .map_err(to_js_error)
    }

    /// Close one integration, or all of them without an id.
    pub fn desactivate(&self, id: Option<u32>) {
        self.controller.desactivate(id.map(IntegrationId::from));
    }

    #[wasm_bindgen(getter)]
    pub fn username(&self) -> Option<String> {
        self.controller.username()
    }

    /// Set (or with `undefined`, clear) the username. Returns `false` for an invalid name.
    #[wasm_bindgen(js_name = setUsername)]
    pub fn set_username(&self, username: Option<String>) -> bool {
        match username {
            Some(name) => self.controller.set_username(&name),
            None => {
                self.controller.clear_username();
                true
            }
        }
    }
}
