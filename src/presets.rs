//! Ready-made appearance per (layout × theme).
//!
//! The table is embedded from `presets.toml` and parsed on first use.

use std::collections::HashMap;

use once_cell::sync::Lazy;
use tracing::error;

use crate::error::EmbedError;
use crate::options::{ActivateOptions, Appearance, IntegrationKind, Theme};

type PresetTable = HashMap<IntegrationKind, HashMap<Theme, Appearance>>;

const PRESETS_TOML: &str = include_str!("presets.toml");

static PRESETS: Lazy<PresetTable> = Lazy::new(|| match parse_presets(PRESETS_TOML) {
    Ok(table) => table,
    Err(e) => {
        error!(error = %e, "embedded preset table is invalid");
        PresetTable::new()
    }
});

fn parse_presets(src: &str) -> crate::error::Result<PresetTable> {
    let raw: HashMap<String, HashMap<String, Appearance>> =
        toml::from_str(src).map_err(|e| EmbedError::Config(e.to_string()))?;
    let mut table = PresetTable::new();
    for (layout, themes) in raw {
        let layout: IntegrationKind = layout.parse()?;
        let row = table.entry(layout).or_default();
        for (theme, appearance) in themes {
            row.insert(theme.parse()?, appearance);
        }
    }
    Ok(table)
}

/// The preset appearance for a layout and theme.
#[must_use]
pub fn preset(layout: IntegrationKind, theme: Theme) -> Option<Appearance> {
    PRESETS.get(&layout)?.get(&theme).copied()
}

/// Caller options pre-filled from a preset: only the placement and callbacks remain to set.
///
/// Falls back to the built-in defaults (with the requested theme) if the preset is missing.
#[must_use]
pub fn preset_options<E>(layout: IntegrationKind, theme: Theme) -> ActivateOptions<E> {
    let appearance = preset(layout, theme).unwrap_or(Appearance {
        theme,
        ..Appearance::default()
    });
    ActivateOptions {
        kind: Some(layout.as_str().into()),
        ..ActivateOptions::default()
    }
    .with_defaults_from(&appearance)
}
