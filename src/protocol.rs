//! Wire types shared with the embedded picker.
//!
//! The picker posts plain JSON objects to the host window:
//!
//! ```json
//! { "type": "picker:media-selected", "id": 3, "media": { "id": 42, "slug": "..." } }
//! ```
//!
//! `type` is always namespaced with [`MESSAGE_NAMESPACE`]; anything else posted to the
//! window belongs to someone else and is never looked at past that field.

use std::fmt;
use std::rc::Rc;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::options::IntegrationKind;

/// Prefix of every message type the picker sends.
pub const MESSAGE_NAMESPACE: &str = "picker:";

const OVERLAY_WIRE_ID: u32 = 0;
const MODAL_WIRE_ID: u32 = 1;

/// Identity of one integration.
///
/// The picker echoes the numeric form back in every message, so the mapping is part of the
/// protocol: `0` is the overlay, `1` the modal, anything above is a caller-owned frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum IntegrationId {
    Overlay,
    Modal,
    Frame(u32),
}

impl IntegrationId {
    #[must_use]
    pub const fn as_u32(self) -> u32 {
        match self {
            Self::Overlay => OVERLAY_WIRE_ID,
            Self::Modal => MODAL_WIRE_ID,
            Self::Frame(n) => n,
        }
    }

    #[must_use]
    pub const fn kind(self) -> IntegrationKind {
        match self {
            Self::Overlay => IntegrationKind::Overlay,
            Self::Modal => IntegrationKind::Modal,
            Self::Frame(_) => IntegrationKind::Iframe,
        }
    }
}

impl From<u32> for IntegrationId {
    fn from(raw: u32) -> Self {
        match raw {
            OVERLAY_WIRE_ID => Self::Overlay,
            MODAL_WIRE_ID => Self::Modal,
            n => Self::Frame(n),
        }
    }
}

impl fmt::Display for IntegrationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_u32())
    }
}

impl Serialize for IntegrationId {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u32(self.as_u32())
    }
}

/// A media item as described by the picker, passed through untouched.
///
/// The picker documents `id`, `cache_url`, `source_url`, `source_type`, `source_exists`, `slug`,
/// `user_id`, `score`, `interact_count`, `category`, `created_at` and `is_deleted`, but nothing here
/// depends on their shape: any JSON value is accepted and serialized back as it came. The accessors
/// are lenient views for the few fields host code usually reads.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MediaRecord(Value);

impl MediaRecord {
    /// Numeric id, also accepted as a decimal string.
    #[must_use]
    pub fn id(&self) -> Option<u64> {
        match self.get("id")? {
            Value::Number(n) => n.as_u64(),
            Value::String(s) => s.parse().ok(),
            _ => None,
        }
    }

    /// URL of the cached media file, the one to embed.
    #[must_use]
    pub fn cache_url(&self) -> Option<&str> {
        self.get("cache_url")?.as_str()
    }

    #[must_use]
    pub fn slug(&self) -> Option<&str> {
        self.get("slug")?.as_str()
    }

    /// Any field, by its wire name.
    #[must_use]
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.get(field)
    }

    #[must_use]
    pub fn as_value(&self) -> &Value {
        &self.0
    }

    #[must_use]
    pub fn into_value(self) -> Value {
        self.0
    }
}

impl From<Value> for MediaRecord {
    fn from(value: Value) -> Self {
        Self(value)
    }
}

/// Argument of `onSelectMedia` / `onCopyMedia`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MediaEvent {
    pub id: IntegrationId,
    #[serde(rename = "type")]
    pub kind: IntegrationKind,
    pub media: MediaRecord,
}

/// A media callback. Cheap to clone; the router invokes it and moves on.
#[derive(Clone)]
pub struct MediaCallback(Rc<dyn Fn(&MediaEvent)>);

impl MediaCallback {
    pub fn new(f: impl Fn(&MediaEvent) + 'static) -> Self {
        Self(Rc::new(f))
    }

    pub fn call(&self, event: &MediaEvent) {
        (self.0)(event);
    }
}

impl fmt::Debug for MediaCallback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("MediaCallback(..)")
    }
}

impl<F: Fn(&MediaEvent) + 'static> From<F> for MediaCallback {
    fn from(f: F) -> Self {
        Self::new(f)
    }
}

/// A message from the picker, after namespace filtering.
#[derive(Debug, Clone, PartialEq)]
pub enum InboundMessage {
    Closed { id: IntegrationId },
    UsernameSelected { username: String },
    UsernameCleared,
    MediaCopy { id: IntegrationId, media: MediaRecord },
    MediaSelected { id: IntegrationId, media: MediaRecord },
}

/// Why a payload did not become an [`InboundMessage`].
#[derive(Debug, Clone, PartialEq)]
pub enum Rejected {
    /// No string `type`, or a `type` outside [`MESSAGE_NAMESPACE`]: not ours.
    Foreign,
    /// Namespaced, but a kind this crate does not handle.
    UnknownKind(String),
    /// Known kind with a field missing or of the wrong shape.
    Malformed { kind: String, reason: String },
}

/// The un-namespaced kind of a picker message, or `None` if the payload is not one.
#[must_use]
pub fn namespaced_kind(data: &Value) -> Option<&str> {
    data.get("type")?.as_str()?.strip_prefix(MESSAGE_NAMESPACE)
}

impl InboundMessage {
    /// Decode a namespaced payload. Only `id` and `username` are checked; `media` is carried as is.
    pub fn decode(data: &Value) -> Result<Self, Rejected> {
        let kind = namespaced_kind(data).ok_or(Rejected::Foreign)?.to_string();
        let malformed = |reason: &str| Rejected::Malformed {
            kind: kind.clone(),
            reason: reason.to_string(),
        };
        let id = || -> Result<IntegrationId, Rejected> {
            let raw = data.get("id").ok_or_else(|| malformed("missing id"))?;
            raw.as_u64()
                .and_then(|n| u32::try_from(n).ok())
                .map(IntegrationId::from)
                .ok_or_else(|| malformed("id is not an integration id"))
        };
        let media = || -> Result<MediaRecord, Rejected> {
            match data.get("media") {
                None | Some(Value::Null) => Err(malformed("missing media")),
                Some(media) => Ok(MediaRecord::from(media.clone())),
            }
        };

        match kind.as_str() {
            "closed" => Ok(Self::Closed { id: id()? }),
            "username-selected" => Ok(Self::UsernameSelected {
                username: data
                    .get("username")
                    .and_then(Value::as_str)
                    .ok_or_else(|| malformed("missing username"))?
                    .to_string(),
            }),
            "username-cleared" => Ok(Self::UsernameCleared),
            "media-copy" => Ok(Self::MediaCopy {
                id: id()?,
                media: media()?,
            }),
            "media-selected" => Ok(Self::MediaSelected {
                id: id()?,
                media: media()?,
            }),
            _ => Err(Rejected::UnknownKind(format!("{MESSAGE_NAMESPACE}{kind}"))),
        }
    }
}
