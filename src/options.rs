//! Caller options and their normalized form.
//!
//! [`ActivateOptions`] is what a host page hands over: every field optional, enum fields as
//! raw strings because they usually arrive from JavaScript. [`normalize`] turns it into an
//! [`EmbedOptions`], in which every field is validated and defaulted. The controller only
//! ever stores and serializes the normalized form.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};

use crate::dom::{self, Dom, Position};
use crate::error::{EmbedError, Result};
use crate::protocol::MediaCallback;

macro_rules! wire_enum {
    (
        $(#[$meta:meta])*
        $name:ident, $field:literal {
            $($variant:ident => $wire:literal),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $(#[serde(rename = $wire)] $variant),+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            #[must_use]
            pub const fn as_str(self) -> &'static str {
                match self {
                    $($name::$variant => $wire),+
                }
            }
        }

        impl FromStr for $name {
            type Err = EmbedError;

            fn from_str(s: &str) -> Result<Self> {
                match s {
                    $($wire => Ok($name::$variant),)+
                    other => Err(EmbedError::invalid(
                        $field,
                        format!(
                            "`{other}` is not one of: {}",
                            [$($wire),+].join(", ")
                        ),
                    )),
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

wire_enum! {
    /// Presentation mode of an integration.
    IntegrationKind, "type" {
        Iframe => "iframe",
        Overlay => "overlay",
        Modal => "modal",
    }
}

wire_enum! {
    Theme, "theme" {
        Light => "light",
        Dark => "dark",
        LightOld => "light-old",
        DarkOld => "dark-old",
    }
}

wire_enum! {
    /// Used for both `mediaSize` and `navbarSize`.
    SizeClass, "size" {
        Sm => "sm",
        Md => "md",
        Lg => "lg",
    }
}

wire_enum! {
    DefaultTab, "defaultTab" {
        Search => "search",
        Fav => "fav",
        Hot => "hot",
        Top => "top",
        New => "new",
        Rand => "rand",
    }
}

/// Where an iframe integration should live.
#[derive(Debug, Clone)]
pub enum Container<E> {
    Element(E),
    /// CSS selector; must match exactly one element.
    Selector(String),
}

/// Options as supplied by the caller. Absent fields get defaults during [`normalize`].
///
/// Deserializes from the same camelCase object the picker documentation uses; the
/// callbacks and a DOM element container can only be set from Rust.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", bound = "")]
pub struct ActivateOptions<E> {
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    #[serde(default, deserialize_with = "selector_container")]
    pub container: Option<Container<E>>,
    #[serde(default)]
    pub open_position: Option<Position>,
    #[serde(default)]
    pub theme: Option<String>,
    #[serde(default)]
    pub media_size: Option<String>,
    #[serde(default)]
    pub navbar_size: Option<String>,
    #[serde(default)]
    pub default_tab: Option<String>,
    #[serde(rename = "showNSFW", default)]
    pub show_nsfw: Option<bool>,
    #[serde(default)]
    pub allow_username_selection: Option<bool>,
    #[serde(default)]
    pub show_copy_button: Option<bool>,
    #[serde(skip)]
    pub on_select_media: Option<MediaCallback>,
    #[serde(skip)]
    pub on_copy_media: Option<MediaCallback>,
}

fn selector_container<'de, D, E>(deserializer: D) -> std::result::Result<Option<Container<E>>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.map(Container::Selector))
}

impl<E> Default for ActivateOptions<E> {
    fn default() -> Self {
        Self {
            kind: None,
            container: None,
            open_position: None,
            theme: None,
            media_size: None,
            navbar_size: None,
            default_tab: None,
            show_nsfw: None,
            allow_username_selection: None,
            show_copy_button: None,
            on_select_media: None,
            on_copy_media: None,
        }
    }
}

impl<E> ActivateOptions<E> {
    pub fn iframe(container: Container<E>, on_select_media: impl Into<MediaCallback>) -> Self {
        Self {
            kind: Some(IntegrationKind::Iframe.as_str().into()),
            container: Some(container),
            on_select_media: Some(on_select_media.into()),
            ..Self::default()
        }
    }

    pub fn overlay(on_select_media: impl Into<MediaCallback>) -> Self {
        Self {
            kind: Some(IntegrationKind::Overlay.as_str().into()),
            on_select_media: Some(on_select_media.into()),
            ..Self::default()
        }
    }

    pub fn modal(open_position: Position, on_select_media: impl Into<MediaCallback>) -> Self {
        Self {
            kind: Some(IntegrationKind::Modal.as_str().into()),
            open_position: Some(open_position),
            on_select_media: Some(on_select_media.into()),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_theme(mut self, theme: impl Into<String>) -> Self {
        self.theme = Some(theme.into());
        self
    }

    #[must_use]
    pub fn with_copy_button(mut self, on_copy_media: impl Into<MediaCallback>) -> Self {
        self.show_copy_button = Some(true);
        self.on_copy_media = Some(on_copy_media.into());
        self
    }

    /// Fill every appearance field the caller left unset from `appearance`.
    #[must_use]
    pub fn with_defaults_from(mut self, appearance: &Appearance) -> Self {
        self.theme
            .get_or_insert_with(|| appearance.theme.as_str().into());
        self.media_size
            .get_or_insert_with(|| appearance.media_size.as_str().into());
        self.navbar_size
            .get_or_insert_with(|| appearance.navbar_size.as_str().into());
        self.default_tab
            .get_or_insert_with(|| appearance.default_tab.as_str().into());
        self.show_nsfw.get_or_insert(appearance.show_nsfw);
        self.allow_username_selection
            .get_or_insert(appearance.allow_username_selection);
        self.show_copy_button
            .get_or_insert(appearance.show_copy_button);
        self
    }
}

/// Every option that ends up in the embed URL besides the id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Appearance {
    pub theme: Theme,
    pub media_size: SizeClass,
    pub navbar_size: SizeClass,
    pub default_tab: DefaultTab,
    #[serde(rename = "showNSFW")]
    pub show_nsfw: bool,
    pub allow_username_selection: bool,
    pub show_copy_button: bool,
}

impl Default for Appearance {
    fn default() -> Self {
        Self {
            theme: Theme::Light,
            media_size: SizeClass::Md,
            navbar_size: SizeClass::Md,
            default_tab: DefaultTab::Top,
            show_nsfw: true,
            allow_username_selection: true,
            show_copy_button: false,
        }
    }
}

/// Where a normalized integration renders. Carries exactly what its mode requires.
#[derive(Debug, Clone)]
pub enum Placement<E> {
    Frame(E),
    Overlay,
    Modal(Position),
}

impl<E> Placement<E> {
    #[must_use]
    pub fn kind(&self) -> IntegrationKind {
        match self {
            Self::Frame(_) => IntegrationKind::Iframe,
            Self::Overlay => IntegrationKind::Overlay,
            Self::Modal(_) => IntegrationKind::Modal,
        }
    }
}

/// Fully validated options, as stored in the registry.
#[derive(Debug, Clone)]
pub struct EmbedOptions<E> {
    pub placement: Placement<E>,
    pub appearance: Appearance,
    pub on_select_media: MediaCallback,
    pub on_copy_media: Option<MediaCallback>,
}

impl<E> EmbedOptions<E> {
    #[must_use]
    pub fn kind(&self) -> IntegrationKind {
        self.placement.kind()
    }

    /// Fingerprint of the fields that change what the picker renders.
    ///
    /// Stored as `data-hash` on the iframe; an iframe with the same hash is reused as is.
    #[must_use]
    pub fn content_hash(&self) -> String {
        let a = &self.appearance;
        let key = format!(
            "{}|{}|{}|{}|{}|{}|{}",
            a.theme,
            a.allow_username_selection,
            a.show_copy_button,
            a.media_size,
            a.navbar_size,
            a.default_tab,
            self.kind(),
        );
        format!("{:016x}", fnv1a64(key.as_bytes()))
    }

    /// The copy callback, if the copy button is shown at all.
    #[must_use]
    pub fn copy_callback(&self) -> Option<&MediaCallback> {
        if self.appearance.show_copy_button {
            self.on_copy_media.as_ref()
        } else {
            None
        }
    }
}

fn fnv1a64(bytes: &[u8]) -> u64 {
    const OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
    const PRIME: u64 = 0x0000_0100_0000_01b3;
    bytes
        .iter()
        .fold(OFFSET, |hash, &b| (hash ^ u64::from(b)).wrapping_mul(PRIME))
}

fn parse_or<T: FromStr<Err = EmbedError>>(
    raw: Option<&str>,
    field: &'static str,
    default: T,
) -> Result<T> {
    match raw {
        None => Ok(default),
        // Shared enums report the field they were parsed for.
        Some(s) => s.parse::<T>().map_err(|e| match e {
            EmbedError::InvalidConfiguration { message, .. } => {
                EmbedError::InvalidConfiguration { field, message }
            }
            other => other,
        }),
    }
}

/// Validate and default caller options.
///
/// Consumes the input; nothing is looked up in the DOM unless every other field is valid,
/// and nothing is mutated either way.
pub fn normalize<D: Dom + ?Sized>(
    dom: &D,
    options: ActivateOptions<D::Element>,
) -> Result<EmbedOptions<D::Element>> {
    let defaults = Appearance::default();
    let kind = parse_or(options.kind.as_deref(), "type", IntegrationKind::Iframe)?;
    let appearance = Appearance {
        theme: parse_or(options.theme.as_deref(), "theme", defaults.theme)?,
        media_size: parse_or(options.media_size.as_deref(), "mediaSize", defaults.media_size)?,
        navbar_size: parse_or(
            options.navbar_size.as_deref(),
            "navbarSize",
            defaults.navbar_size,
        )?,
        default_tab: parse_or(
            options.default_tab.as_deref(),
            "defaultTab",
            defaults.default_tab,
        )?,
        show_nsfw: options.show_nsfw.unwrap_or(defaults.show_nsfw),
        allow_username_selection: options
            .allow_username_selection
            .unwrap_or(defaults.allow_username_selection),
        show_copy_button: options
            .show_copy_button
            .unwrap_or(defaults.show_copy_button),
    };
    let on_select_media = options
        .on_select_media
        .ok_or_else(|| EmbedError::invalid("onSelectMedia", "a callback is required"))?;

    let placement = match kind {
        IntegrationKind::Overlay => Placement::Overlay,
        IntegrationKind::Modal => {
            let position = options.open_position.ok_or_else(|| {
                EmbedError::invalid("openPosition", "required when type is `modal`")
            })?;
            if !position.x.is_finite() || !position.y.is_finite() {
                return Err(EmbedError::invalid(
                    "openPosition",
                    format!("coordinates must be finite, got {position:?}"),
                ));
            }
            Placement::Modal(position)
        }
        IntegrationKind::Iframe => match options.container {
            None => {
                return Err(EmbedError::invalid(
                    "container",
                    "required when type is `iframe`",
                ))
            }
            Some(Container::Element(element)) => Placement::Frame(element),
            Some(Container::Selector(selector)) => {
                Placement::Frame(dom::resolve_one(dom, &selector)?)
            }
        },
    };

    Ok(EmbedOptions {
        placement,
        appearance,
        on_select_media,
        on_copy_media: options.on_copy_media,
    })
}
