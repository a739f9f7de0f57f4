use serde::Deserialize;
use url::Url;

use crate::dom::Size;
use crate::error::{EmbedError, Result};

const DEFAULT_EMBED_PATH: &str = "/embed";
const DEFAULT_STORAGE_KEY: &str = "picker_embed.username";
const DEFAULT_MODAL_WIDTH: f64 = 350.0;
const DEFAULT_MODAL_HEIGHT: f64 = 500.0;
const DEFAULT_VIEWPORT_MARGIN: f64 = 10.0;
const DEFAULT_OVERLAY_Z_INDEX: i32 = i32::MAX;
const DEFAULT_MODAL_Z_INDEX: i32 = i32::MAX - 1;

/// Where the picker lives and how its host-side surfaces look.
///
/// Only `base_url` is required. Everything else has a default, so a TOML file can be as
/// small as:
///
/// ```
/// use picker_embed::EmbedConfig;
///
/// let config = EmbedConfig::from_toml_str(r#"base_url = "https://picker.example.org""#).unwrap();
/// assert_eq!(config.trusted_origin(), "https://picker.example.org");
/// assert_eq!(config.embed_path, "/embed");
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct EmbedConfig {
    pub base_url: Url,
    #[serde(default = "default_embed_path")]
    pub embed_path: String,
    #[serde(default = "default_storage_key")]
    pub storage_key: String,
    #[serde(default = "default_modal_size")]
    pub modal_size: Size,
    #[serde(default = "default_viewport_margin")]
    pub viewport_margin: f64,
    #[serde(default = "default_overlay_z_index")]
    pub overlay_z_index: i32,
    #[serde(default = "default_modal_z_index")]
    pub modal_z_index: i32,
}

fn default_embed_path() -> String {
    DEFAULT_EMBED_PATH.to_string()
}

fn default_storage_key() -> String {
    DEFAULT_STORAGE_KEY.to_string()
}

fn default_modal_size() -> Size {
    Size::new(DEFAULT_MODAL_WIDTH, DEFAULT_MODAL_HEIGHT)
}

fn default_viewport_margin() -> f64 {
    DEFAULT_VIEWPORT_MARGIN
}

fn default_overlay_z_index() -> i32 {
    DEFAULT_OVERLAY_Z_INDEX
}

fn default_modal_z_index() -> i32 {
    DEFAULT_MODAL_Z_INDEX
}

impl EmbedConfig {
    /// Default configuration for a picker served at `base_url`.
    pub fn new(base_url: &str) -> Result<Self> {
        let base_url = Url::parse(base_url)
            .map_err(|e| EmbedError::Config(format!("invalid base_url `{base_url}`: {e}")))?;
        let config = Self {
            base_url,
            embed_path: default_embed_path(),
            storage_key: default_storage_key(),
            modal_size: default_modal_size(),
            viewport_margin: default_viewport_margin(),
            overlay_z_index: default_overlay_z_index(),
            modal_z_index: default_modal_z_index(),
        };
        config.validate()?;
        Ok(config)
    }

    pub fn from_toml_str(src: &str) -> Result<Self> {
        let config: Self =
            toml::from_str(src).map_err(|e| EmbedError::Config(format!("invalid TOML: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if !matches!(self.base_url.scheme(), "http" | "https") {
            return Err(EmbedError::Config(format!(
                "base_url must be http(s), got `{}`",
                self.base_url
            )));
        }
        if !self.embed_path.starts_with('/') {
            return Err(EmbedError::Config(format!(
                "embed_path must start with '/', got `{}`",
                self.embed_path
            )));
        }
        if self.storage_key.is_empty() {
            return Err(EmbedError::Config("storage_key must not be empty".into()));
        }
        if self.modal_size.width <= 0.0 || self.modal_size.height <= 0.0 {
            return Err(EmbedError::Config("modal_size must be positive".into()));
        }
        Ok(())
    }

    /// The only origin whose messages are acted upon, e.g. `https://picker.example.org`.
    #[must_use]
    pub fn trusted_origin(&self) -> String {
        self.base_url.origin().ascii_serialization()
    }

    /// `base_url` joined with `embed_path`, without a query.
    pub fn embed_endpoint(&self) -> Result<Url> {
        self.base_url
            .join(&self.embed_path)
            .map_err(|e| EmbedError::Config(format!("cannot join embed_path: {e}")))
    }
}
