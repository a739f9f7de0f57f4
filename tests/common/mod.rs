#![allow(dead_code)]

use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use std::rc::Rc;

use picker_embed::{
    Dom, EmbedConfig, EmbedController, EmbedError, MediaCallback, MediaEvent, MemoryStorage,
    Result, Size,
};
use serde_json::{json, Value};

pub const BASE: &str = "https://picker.example.org";
pub const VIEWPORT: Size = Size::new(1024.0, 768.0);

#[derive(Debug, Default)]
pub struct Node {
    pub tag: String,
    pub attrs: RefCell<BTreeMap<String, String>>,
    pub styles: RefCell<BTreeMap<String, String>>,
    pub children: RefCell<Vec<FakeElement>>,
    pub text: RefCell<String>,
}

/// Handle to a node of the fake tree; equality is node identity.
#[derive(Debug, Clone)]
pub struct FakeElement(pub Rc<Node>);

impl PartialEq for FakeElement {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl FakeElement {
    fn new(tag: &str) -> Self {
        Self(Rc::new(Node {
            tag: tag.to_string(),
            ..Node::default()
        }))
    }

    pub fn attr(&self, name: &str) -> Option<String> {
        self.0.attrs.borrow().get(name).cloned()
    }

    pub fn style(&self, name: &str) -> Option<String> {
        self.0.styles.borrow().get(name).cloned()
    }

    pub fn children(&self) -> Vec<FakeElement> {
        self.0.children.borrow().clone()
    }

    pub fn text(&self) -> String {
        self.0.text.borrow().clone()
    }

    /// The single iframe inside a container.
    pub fn iframe(&self) -> Option<FakeElement> {
        let children = self.children();
        assert!(children.len() <= 1, "container holds {} nodes", children.len());
        children.into_iter().find(|c| c.0.tag == "iframe")
    }

    fn matches(&self, selector: &str) -> bool {
        match selector.strip_prefix('#') {
            Some(id) => self.attr("id").as_deref() == Some(id),
            None => self.0.tag == selector,
        }
    }

    fn collect(&self, selector: &str, out: &mut Vec<FakeElement>) {
        for child in self.children() {
            if child.matches(selector) {
                out.push(child.clone());
            }
            child.collect(selector, out);
        }
    }
}

/// In-memory DOM: a body, element ids for selectors, inline styles as a map.
///
/// Clones share the same tree.
#[derive(Debug, Clone)]
pub struct FakeDom {
    pub body: FakeElement,
    pub created: Cell<usize>,
    pub viewport: Size,
    failing: RefCell<Option<&'static str>>,
}

impl FakeDom {
    pub fn new() -> Self {
        Self {
            body: FakeElement::new("body"),
            created: Cell::new(0),
            viewport: VIEWPORT,
            failing: RefCell::new(None),
        }
    }

    /// Make every later call to the named `Dom` operation fail; `None` heals it.
    pub fn fail_on(&self, operation: Option<&'static str>) {
        *self.failing.borrow_mut() = operation;
    }

    fn check(&self, operation: &str) -> Result<()> {
        if *self.failing.borrow() == Some(operation) {
            return Err(EmbedError::Dom(format!("{operation} failed")));
        }
        Ok(())
    }

    /// Add `<div id=..>` to the body, as a host page would for an embedded picker.
    pub fn add_div(&self, id: &str) -> FakeElement {
        let div = FakeElement::new("div");
        div.0.attrs.borrow_mut().insert("id".into(), id.into());
        self.body.0.children.borrow_mut().push(div.clone());
        div
    }

    pub fn add_input(&self, id: &str, value: &str) -> FakeElement {
        let input = self.add_div(id);
        *input.0.text.borrow_mut() = value.to_string();
        input
    }

    pub fn find(&self, selector: &str) -> Vec<FakeElement> {
        let mut out = Vec::new();
        self.body.collect(selector, &mut out);
        out
    }

    pub fn iframe_count(&self) -> usize {
        self.find("iframe").len()
    }
}

impl Dom for FakeDom {
    type Element = FakeElement;

    fn query_selector_all(&self, selector: &str) -> Result<Vec<FakeElement>> {
        if selector.is_empty() {
            return Err(EmbedError::invalid("container", "empty selector"));
        }
        Ok(self.find(selector))
    }

    fn body(&self) -> Result<FakeElement> {
        Ok(self.body.clone())
    }

    fn create_element(&self, tag: &str) -> Result<FakeElement> {
        self.check("create_element")?;
        self.created.set(self.created.get() + 1);
        Ok(FakeElement::new(tag))
    }

    fn append_child(&self, parent: &FakeElement, child: &FakeElement) -> Result<()> {
        self.check("append_child")?;
        parent.0.children.borrow_mut().push(child.clone());
        Ok(())
    }

    fn clear_children(&self, element: &FakeElement) -> Result<()> {
        element.0.children.borrow_mut().clear();
        Ok(())
    }

    fn replace_children(&self, parent: &FakeElement, child: &FakeElement) -> Result<()> {
        self.check("replace_children")?;
        *parent.0.children.borrow_mut() = vec![child.clone()];
        Ok(())
    }

    fn first_element_child(&self, element: &FakeElement) -> Option<FakeElement> {
        element.0.children.borrow().first().cloned()
    }

    fn get_attribute(&self, element: &FakeElement, name: &str) -> Option<String> {
        element.attr(name)
    }

    fn set_attribute(&self, element: &FakeElement, name: &str, value: &str) -> Result<()> {
        self.check("set_attribute")?;
        element
            .0
            .attrs
            .borrow_mut()
            .insert(name.to_string(), value.to_string());
        Ok(())
    }

    fn set_style(&self, element: &FakeElement, property: &str, value: &str) -> Result<()> {
        element
            .0
            .styles
            .borrow_mut()
            .insert(property.to_string(), value.to_string());
        Ok(())
    }

    fn viewport_size(&self) -> Size {
        self.viewport
    }

    fn insert_text(&self, field: &FakeElement, text: &str) -> Result<()> {
        field.0.text.borrow_mut().push_str(text);
        Ok(())
    }

    fn paste_html(&self, target: &FakeElement, html: &str) -> Result<()> {
        target.0.text.borrow_mut().push_str(html);
        Ok(())
    }
}

pub type TestController = EmbedController<FakeDom, MemoryStorage>;

pub fn controller() -> TestController {
    controller_with_storage(MemoryStorage::new())
}

pub fn controller_with_storage(storage: MemoryStorage) -> TestController {
    let config = EmbedConfig::new(BASE).expect("config");
    EmbedController::new(config, FakeDom::new(), storage).expect("controller")
}

/// A callback that records every event it receives.
pub fn recorder() -> (MediaCallback, Rc<RefCell<Vec<MediaEvent>>>) {
    let events = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&events);
    let callback = MediaCallback::new(move |event: &MediaEvent| sink.borrow_mut().push(event.clone()));
    (callback, events)
}

pub fn noop() -> MediaCallback {
    MediaCallback::new(|_: &MediaEvent| {})
}

pub fn media(id: u64) -> Value {
    json!({
        "id": id,
        "cache_url": format!("https://cdn.example.org/{id}.gif"),
        "source_url": format!("https://source.example.org/{id}"),
        "source_type": "upload",
        "source_exists": true,
        "slug": format!("media-{id}"),
        "user_id": 7,
        "score": 12,
        "interact_count": 3,
        "category": null,
        "created_at": "2024-01-01T00:00:00Z",
        "is_deleted": false
    })
}

pub fn selected(id: u32, media_id: u64) -> Value {
    json!({ "type": "picker:media-selected", "id": id, "media": media(media_id) })
}

pub fn copied(id: u32, media_id: u64) -> Value {
    json!({ "type": "picker:media-copy", "id": id, "media": media(media_id) })
}

/// Query parameters of an iframe's `src`, in order.
pub fn query_of(iframe: &FakeElement) -> Vec<(String, String)> {
    let src = iframe.attr("src").expect("iframe src");
    let url = url::Url::parse(&src).expect("src is a URL");
    url.query_pairs()
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect()
}

pub fn param(iframe: &FakeElement, name: &str) -> Option<String> {
    query_of(iframe)
        .into_iter()
        .find(|(k, _)| k == name)
        .map(|(_, v)| v)
}
