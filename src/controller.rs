//! Integration registry and lifecycle.
//!
//! An [`EmbedController`] owns everything that outlives a single call: the registry of
//! integrations, the lazily created overlay and modal surfaces, the frame id counter and
//! the selected username. Hosts create one per page and route every picker message into it
//! (see [`EmbedController::handle_message`]).

use std::cell::RefCell;
use std::collections::BTreeMap;

use tracing::{debug, info, warn};
use url::Url;

use crate::config::EmbedConfig;
use crate::dom::Dom;
use crate::error::Result;
use crate::options::{normalize, ActivateOptions, EmbedOptions, Placement};
use crate::position;
use crate::protocol::IntegrationId;
use crate::storage::{KeyValueStore, UsernameStore};

/// Frame ids are handed out above this value; 0 and 1 belong to the overlay and the modal.
const LAST_RESERVED_ID: u32 = 2;

const HASH_ATTR: &str = "data-hash";
const ID_ATTR: &str = "data-integration-id";
const OVERLAY_DOM_ID: &str = "picker-embed-overlay";
const MODAL_DOM_ID: &str = "picker-embed-modal";

/// A controller-owned container: created once, shown and hidden, never removed.
#[derive(Debug)]
struct Surface<E> {
    element: E,
    visible: bool,
}

struct State<E> {
    registry: BTreeMap<IntegrationId, EmbedOptions<E>>,
    last_frame_id: u32,
    overlay: Option<Surface<E>>,
    modal: Option<Surface<E>>,
}

pub struct EmbedController<D: Dom, S> {
    config: EmbedConfig,
    endpoint: Url,
    trusted_origin: String,
    dom: D,
    state: RefCell<State<D::Element>>,
    username: RefCell<UsernameStore<S>>,
}

impl<D: Dom, S: KeyValueStore> EmbedController<D, S> {
    /// Build a controller and load the persisted username from `storage`.
    pub fn new(config: EmbedConfig, dom: D, storage: S) -> Result<Self> {
        let endpoint = config.embed_endpoint()?;
        let trusted_origin = config.trusted_origin();
        let username = UsernameStore::load(storage, config.storage_key.clone());
        Ok(Self {
            config,
            endpoint,
            trusted_origin,
            dom,
            state: RefCell::new(State {
                registry: BTreeMap::new(),
                last_frame_id: LAST_RESERVED_ID,
                overlay: None,
                modal: None,
            }),
            username: RefCell::new(username),
        })
    }

    pub fn config(&self) -> &EmbedConfig {
        &self.config
    }

    pub fn dom(&self) -> &D {
        &self.dom
    }

    pub fn trusted_origin(&self) -> &str {
        &self.trusted_origin
    }

    /// Validate `options` and show the picker.
    ///
    /// Frames get a fresh id on every call. The overlay and the modal are singletons: a
    /// second activation replaces the stored options, and if the visible configuration did
    /// not change the picker document already loaded is kept as is.
    ///
    /// On error nothing has changed: no id is consumed and no iframe is inserted.
    pub fn activate(&self, options: ActivateOptions<D::Element>) -> Result<IntegrationId> {
        let options = normalize(&self.dom, options)?;
        let id = match &options.placement {
            Placement::Frame(container) => {
                let id = IntegrationId::Frame(self.state.borrow().last_frame_id + 1);
                self.populate(container, id, &options)?;
                self.state.borrow_mut().last_frame_id = id.as_u32();
                id
            }
            Placement::Overlay => {
                let id = IntegrationId::Overlay;
                let container = self.overlay_surface()?;
                if self.already_open(id, &options) {
                    debug!(%id, "overlay already open with this configuration");
                } else {
                    self.populate(&container, id, &options)?;
                    self.set_styles(&container, &[("display", "block")])?;
                    self.set_visible(id, true);
                }
                id
            }
            Placement::Modal(preferred) => {
                let id = IntegrationId::Modal;
                let container = self.modal_surface()?;
                let at = position::adjust(
                    *preferred,
                    self.config.modal_size,
                    self.dom.viewport_size(),
                    self.config.viewport_margin,
                );
                let left = format!("{}px", at.x);
                let top = format!("{}px", at.y);
                let placed = [("left", left.as_str()), ("top", top.as_str())];
                if self.already_open(id, &options) {
                    debug!(%id, "modal already open with this configuration");
                    self.set_styles(&container, &placed)?;
                } else {
                    self.populate(&container, id, &options)?;
                    self.set_styles(&container, &placed)?;
                    self.set_styles(
                        &container,
                        &[("display", "block"), ("pointer-events", "auto")],
                    )?;
                    self.set_visible(id, true);
                }
                id
            }
        };
        info!(%id, kind = %options.kind(), "integration activated");
        self.state.borrow_mut().registry.insert(id, options);
        Ok(id)
    }

    /// Close one integration, or every registered one when `id` is `None`.
    ///
    /// Frames are emptied and forgotten. The overlay and the modal are hidden but stay
    /// registered. Unknown ids are ignored: a close message may race a local close.
    pub fn desactivate(&self, id: Option<IntegrationId>) {
        match id {
            Some(id) => self.desactivate_one(id),
            None => {
                let ids: Vec<IntegrationId> =
                    self.state.borrow().registry.keys().copied().collect();
                for id in ids {
                    self.desactivate_one(id);
                }
            }
        }
    }

    fn desactivate_one(&self, id: IntegrationId) {
        let result = match id {
            IntegrationId::Frame(_) => {
                let removed = self.state.borrow_mut().registry.remove(&id);
                match removed {
                    Some(EmbedOptions {
                        placement: Placement::Frame(container),
                        ..
                    }) => self.dom.clear_children(&container),
                    Some(_) => Ok(()),
                    None => {
                        debug!(%id, "desactivate: no such integration");
                        return;
                    }
                }
            }
            IntegrationId::Overlay | IntegrationId::Modal => {
                if !self.state.borrow().registry.contains_key(&id) {
                    debug!(%id, "desactivate: no such integration");
                    return;
                }
                self.hide_surface(id)
            }
        };
        match result {
            Ok(()) => info!(%id, "integration desactivated"),
            Err(e) => warn!(%id, error = %e, "desactivate left the DOM partially updated"),
        }
    }

    fn hide_surface(&self, id: IntegrationId) -> Result<()> {
        let element = {
            let state = self.state.borrow();
            let surface = match id {
                IntegrationId::Modal => state.modal.as_ref(),
                _ => state.overlay.as_ref(),
            };
            match surface {
                Some(surface) => surface.element.clone(),
                None => return Ok(()),
            }
        };
        self.set_visible(id, false);
        if id == IntegrationId::Modal {
            self.set_styles(&element, &[("display", "none"), ("pointer-events", "none")])
        } else {
            self.set_styles(&element, &[("display", "none")])
        }
    }

    /// Whether `id` is registered and, for the overlay and the modal, currently shown.
    #[must_use]
    pub fn is_active(&self, id: IntegrationId) -> bool {
        let state = self.state.borrow();
        if !state.registry.contains_key(&id) {
            return false;
        }
        match id {
            IntegrationId::Frame(_) => true,
            IntegrationId::Overlay => state.overlay.as_ref().is_some_and(|s| s.visible),
            IntegrationId::Modal => state.modal.as_ref().is_some_and(|s| s.visible),
        }
    }

    /// Every registered id, including hidden overlay and modal entries.
    #[must_use]
    pub fn integration_ids(&self) -> Vec<IntegrationId> {
        self.state.borrow().registry.keys().copied().collect()
    }

    /// The overlay container, once it has been created.
    pub fn overlay_element(&self) -> Option<D::Element> {
        self.state
            .borrow()
            .overlay
            .as_ref()
            .map(|s| s.element.clone())
    }

    /// The modal container, once it has been created.
    pub fn modal_element(&self) -> Option<D::Element> {
        self.state
            .borrow()
            .modal
            .as_ref()
            .map(|s| s.element.clone())
    }

    /// Run `f` against the stored options of `id`, if any.
    ///
    /// The registry stays borrowed while `f` runs; clone what you need out of it.
    pub fn with_options<R>(
        &self,
        id: IntegrationId,
        f: impl FnOnce(&EmbedOptions<D::Element>) -> R,
    ) -> Option<R> {
        self.state.borrow().registry.get(&id).map(f)
    }

    #[must_use]
    pub fn username(&self) -> Option<String> {
        self.username.borrow().get().map(str::to_string)
    }

    /// Select and persist a username. Returns `false` if `username` is not a valid name.
    pub fn set_username(&self, username: &str) -> bool {
        self.username.borrow_mut().set(username)
    }

    pub fn clear_username(&self) {
        self.username.borrow_mut().clear();
    }

    /// The URL an iframe for `id` with `options` loads.
    pub fn embed_url(&self, id: IntegrationId, options: &EmbedOptions<D::Element>) -> Url {
        let a = &options.appearance;
        let mut url = self.endpoint.clone();
        {
            let mut query = url.query_pairs_mut();
            query
                .append_pair("id", &id.as_u32().to_string())
                .append_pair("theme", a.theme.as_str())
                .append_pair("mediaSize", a.media_size.as_str())
                .append_pair("navbarSize", a.navbar_size.as_str())
                .append_pair("defaultTab", a.default_tab.as_str())
                .append_pair("showNSFW", bool_str(a.show_nsfw))
                .append_pair("allowUsernameSelection", bool_str(a.allow_username_selection))
                .append_pair("showCopyButton", bool_str(a.show_copy_button));
            if !matches!(options.placement, Placement::Frame(_)) {
                query.append_pair("showCloseButton", "true");
            }
            if a.allow_username_selection {
                if let Some(username) = self.username.borrow().get() {
                    query.append_pair("username", username);
                }
            }
        }
        url
    }

    fn already_open(&self, id: IntegrationId, options: &EmbedOptions<D::Element>) -> bool {
        if !self.is_active(id) {
            return false;
        }
        self.with_options(id, |stored| stored.content_hash() == options.content_hash())
            .unwrap_or(false)
    }

    /// Make sure `container` holds an iframe showing `options` for `id`.
    ///
    /// An iframe already tagged with the same content hash and id is left alone so the
    /// picker keeps its state; anything else in the container is replaced. The new iframe is
    /// fully built before the swap, so on error the container keeps what it had.
    fn populate(
        &self,
        container: &D::Element,
        id: IntegrationId,
        options: &EmbedOptions<D::Element>,
    ) -> Result<()> {
        let hash = options.content_hash();
        let wire_id = id.as_u32().to_string();
        if let Some(existing) = self.dom.first_element_child(container) {
            let same_hash = self.dom.get_attribute(&existing, HASH_ATTR).as_deref() == Some(hash.as_str());
            let same_id = self.dom.get_attribute(&existing, ID_ATTR).as_deref() == Some(wire_id.as_str());
            if same_hash && same_id {
                debug!(%id, %hash, "reusing iframe");
                return Ok(());
            }
        }

        let url = self.embed_url(id, options);
        let iframe = self.dom.create_element("iframe")?;
        self.dom.set_attribute(&iframe, "src", url.as_str())?;
        self.dom.set_attribute(&iframe, HASH_ATTR, &hash)?;
        self.dom.set_attribute(&iframe, ID_ATTR, &wire_id)?;
        self.dom.set_attribute(&iframe, "allow", "clipboard-write")?;
        self.dom.set_attribute(&iframe, "title", "Media picker")?;
        self.set_styles(
            &iframe,
            &[("width", "100%"), ("height", "100%"), ("border", "0")],
        )?;
        self.dom.replace_children(container, &iframe)?;
        debug!(%id, %url, "iframe inserted");
        Ok(())
    }

    fn overlay_surface(&self) -> Result<D::Element> {
        if let Some(element) = self.overlay_element() {
            return Ok(element);
        }
        let z_index = self.config.overlay_z_index.to_string();
        let element = self.create_surface(
            OVERLAY_DOM_ID,
            &[
                ("position", "fixed"),
                ("top", "0"),
                ("left", "0"),
                ("width", "100vw"),
                ("height", "100vh"),
                ("background-color", "rgba(0, 0, 0, 0.6)"),
                ("z-index", z_index.as_str()),
                ("display", "none"),
            ],
        )?;
        self.state.borrow_mut().overlay = Some(Surface {
            element: element.clone(),
            visible: false,
        });
        Ok(element)
    }

    fn modal_surface(&self) -> Result<D::Element> {
        if let Some(element) = self.modal_element() {
            return Ok(element);
        }
        let z_index = self.config.modal_z_index.to_string();
        let width = format!("{}px", self.config.modal_size.width);
        let height = format!("{}px", self.config.modal_size.height);
        let element = self.create_surface(
            MODAL_DOM_ID,
            &[
                ("position", "fixed"),
                ("width", width.as_str()),
                ("height", height.as_str()),
                ("border-radius", "8px"),
                ("overflow", "hidden"),
                ("box-shadow", "0 4px 24px rgba(0, 0, 0, 0.35)"),
                ("z-index", z_index.as_str()),
                ("display", "none"),
                ("pointer-events", "none"),
            ],
        )?;
        self.state.borrow_mut().modal = Some(Surface {
            element: element.clone(),
            visible: false,
        });
        Ok(element)
    }

    fn create_surface(&self, dom_id: &str, styles: &[(&str, &str)]) -> Result<D::Element> {
        let element = self.dom.create_element("div")?;
        self.dom.set_attribute(&element, "id", dom_id)?;
        self.set_styles(&element, styles)?;
        let body = self.dom.body()?;
        self.dom.append_child(&body, &element)?;
        debug!(dom_id, "surface created");
        Ok(element)
    }

    fn set_visible(&self, id: IntegrationId, visible: bool) {
        let mut state = self.state.borrow_mut();
        let surface = match id {
            IntegrationId::Overlay => state.overlay.as_mut(),
            IntegrationId::Modal => state.modal.as_mut(),
            IntegrationId::Frame(_) => None,
        };
        if let Some(surface) = surface {
            surface.visible = visible;
        }
    }

    fn set_styles(&self, element: &D::Element, styles: &[(&str, &str)]) -> Result<()> {
        for (property, value) in styles {
            self.dom.set_style(element, property, value)?;
        }
        Ok(())
    }
}

fn bool_str(value: bool) -> &'static str {
    if value {
        "true"
    } else {
        "false"
    }
}
