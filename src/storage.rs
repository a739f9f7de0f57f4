//! Username persistence.
//!
//! The picker lets a visitor pick a username once and remembers it across embeds. The host
//! keeps the one value in a key-value store (`localStorage` in a browser) and hands it back
//! to every iframe it creates.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, warn};

use crate::error::Result;

static USERNAME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9_\-\[\]]{1,64}$").expect("username regex"));

/// A string key-value store. Implementations may be absent or read-only; `set` and `remove`
/// failures are logged by the caller and otherwise ignored.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: &str) -> Result<()>;
    fn remove(&self, key: &str) -> Result<()>;
}

/// Session-only store. Clones share the same map, which is how a "reload" is simulated:
/// build a second controller over a clone.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    items: Rc<RefCell<HashMap<String, String>>>,
}

impl MemoryStorage {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStorage {
    fn get(&self, key: &str) -> Option<String> {
        self.items.borrow().get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.items
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.items.borrow_mut().remove(key);
        Ok(())
    }
}

/// `[A-Za-z0-9_\-\[\]]{1,64}`.
#[must_use]
pub fn is_valid_username(name: &str) -> bool {
    USERNAME_RE.is_match(name)
}

/// The selected username plus the store it is mirrored into.
#[derive(Debug)]
pub struct UsernameStore<S> {
    storage: S,
    key: String,
    current: Option<String>,
}

impl<S: KeyValueStore> UsernameStore<S> {
    /// Load the persisted username. A stored value that fails validation is treated as
    /// pollution from some other script and ignored (but left in place).
    pub fn load(storage: S, key: impl Into<String>) -> Self {
        let key = key.into();
        let current = match storage.get(&key) {
            Some(stored) if is_valid_username(&stored) => Some(stored),
            Some(stored) => {
                warn!(key = %key, len = stored.len(), "ignoring malformed stored username");
                None
            }
            None => None,
        };
        Self {
            storage,
            key,
            current,
        }
    }

    #[must_use]
    pub fn get(&self) -> Option<&str> {
        self.current.as_deref()
    }

    /// Set and persist. Returns `false` (and changes nothing) for an invalid name.
    pub fn set(&mut self, username: &str) -> bool {
        if !is_valid_username(username) {
            warn!(len = username.len(), "rejecting malformed username");
            return false;
        }
        if let Err(e) = self.storage.set(&self.key, username) {
            warn!(error = %e, "username kept for this session only");
        }
        debug!(username, "username selected");
        self.current = Some(username.to_string());
        true
    }

    pub fn clear(&mut self) {
        if let Err(e) = self.storage.remove(&self.key) {
            warn!(error = %e, "failed to remove stored username");
        }
        debug!("username cleared");
        self.current = None;
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }
}
