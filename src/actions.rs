//! Ready-made `onSelectMedia` / `onCopyMedia` callbacks.

use std::rc::Rc;

use tracing::warn;

use crate::dom::Dom;
use crate::protocol::{MediaCallback, MediaEvent};

/// Insert the selected media's URL into a text field at the caret.
pub fn insert_link<D>(dom: Rc<D>, field: D::Element) -> MediaCallback
where
    D: Dom + 'static,
    D::Element: 'static,
{
    MediaCallback::new(move |event: &MediaEvent| {
        let Some(url) = event.media.cache_url() else {
            warn!(id = %event.id, "selected media has no cache_url");
            return;
        };
        if let Err(e) = dom.insert_text(&field, url) {
            warn!(error = %e, id = %event.id, "could not insert media link");
        }
    })
}

/// Paste the selected media as an `<img>` into an editable element.
pub fn paste_image<D>(dom: Rc<D>, target: D::Element) -> MediaCallback
where
    D: Dom + 'static,
    D::Element: 'static,
{
    MediaCallback::new(move |event: &MediaEvent| {
        let Some(html) = image_html(event) else {
            warn!(id = %event.id, "selected media has no cache_url");
            return;
        };
        if let Err(e) = dom.paste_html(&target, &html) {
            warn!(error = %e, id = %event.id, "could not paste media");
        }
    })
}

fn image_html(event: &MediaEvent) -> Option<String> {
    Some(format!(
        r#"<img src="{}" alt="{}">"#,
        escape_attr(event.media.cache_url()?),
        escape_attr(event.media.slug().unwrap_or_default())
    ))
}

fn escape_attr(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(c),
        }
    }
    out
}
