//! Layered theme configuration.
//!
//! A theme is a JSON tree of namespaces: `dimensions` (numeric layout
//! constants), `styles` (named visual categories), `shapes` (base shape
//! configs, `shapes.gate` in particular), `gates` (per-gate shallow overrides
//! of the base gate shape) and `substitutions` (per-gate alternate visual
//! treatment). User themes deep-merge onto the embedded default; unknown keys
//! are preserved. Once merged, a theme is read-only for the whole render.
//!
//! Lookups are strict: a key the renderer needs that is absent or carries a
//! wrong-typed value fails with [`DrawError::MissingThemeKey`].

use once_cell::sync::Lazy;
use serde_json::{Map, Value};
use std::path::Path;

use crate::error::{DrawError, DrawResult};

static DEFAULT_THEME: Lazy<Value> = Lazy::new(|| {
    serde_json::from_str(include_str!("themes/default.json"))
        .expect("embedded default theme is valid JSON")
});

static NIGHT_OVERLAY: Lazy<Value> = Lazy::new(|| {
    serde_json::from_str(include_str!("themes/night.json"))
        .expect("embedded night theme is valid JSON")
});

/// Alternate visual treatment registered for a named gate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Substitution {
    /// Inline symbol drawn instead of the gate box, no label.
    Glyph(String),
    /// External image reference drawn at gate-box size, no label.
    Image(String),
    /// Box rendering with a named recurring effect, e.g. `pulse`.
    Animated(String),
}

/// Resolved box styling for one gate: the base `shapes.gate` config with the
/// per-gate override laid over it one level deep.
#[derive(Debug, Clone, PartialEq)]
pub struct GateConfig {
    pub fill: String,
    pub stroke: String,
    pub radius: f64,
    pub label: Option<String>,
}

impl GateConfig {
    /// The text drawn on the gate box: the configured label, else the gate
    /// name upper-cased.
    pub fn label_for(&self, gate_name: &str) -> String {
        self.label
            .clone()
            .unwrap_or_else(|| gate_name.to_uppercase())
    }
}

#[derive(Debug, Clone)]
pub struct Theme {
    root: Value,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            root: DEFAULT_THEME.clone(),
        }
    }
}

impl Theme {
    /// The embedded default theme with `overrides` deep-merged on top.
    pub fn from_value(overrides: &Value) -> Self {
        let mut theme = Self::default();
        theme.merge(overrides);
        theme
    }

    /// A bundled theme by name, if one exists.
    pub fn builtin(name: &str) -> Option<Self> {
        match name {
            "default" => Some(Self::default()),
            "night" => Some(Self::from_value(&NIGHT_OVERLAY)),
            _ => None,
        }
    }

    /// Resolves `source` as a theme file path (JSON, JSON5 fallback) or a
    /// bundled theme name.
    pub fn load(source: &str) -> DrawResult<Self> {
        let path = Path::new(source);
        if path.is_file() {
            let contents = std::fs::read_to_string(path)
                .map_err(|err| DrawError::theme_load(format!("{source}: {err}")))?;
            let overrides = parse_theme_document(&contents)
                .map_err(|err| DrawError::theme_load(format!("{source}: {err}")))?;
            return Ok(Self::from_value(&overrides));
        }
        Self::builtin(source).ok_or_else(|| {
            DrawError::theme_load(format!(
                "'{source}' is neither a theme file nor a bundled theme"
            ))
        })
    }

    /// Deep-merges `overlay` onto this theme in place.
    pub fn merge(&mut self, overlay: &Value) {
        deep_merge(&mut self.root, overlay);
    }

    /// The merged configuration tree.
    pub fn root(&self) -> &Value {
        &self.root
    }

    /// Numeric layout constant from `dimensions`.
    pub fn dimension(&self, key: &str) -> DrawResult<f64> {
        self.root
            .get("dimensions")
            .and_then(|dims| dims.get(key))
            .and_then(Value::as_f64)
            .ok_or_else(|| DrawError::missing_key(format!("dimensions.{key}")))
    }

    /// A whole style category from `styles`.
    pub fn style(&self, category: &str) -> DrawResult<&Value> {
        self.root
            .get("styles")
            .and_then(|styles| styles.get(category))
            .ok_or_else(|| DrawError::missing_key(format!("styles.{category}")))
    }

    /// A style category that must be a plain string, e.g. `background`.
    pub fn style_str(&self, category: &str) -> DrawResult<&str> {
        self.style(category)?
            .as_str()
            .ok_or_else(|| DrawError::missing_key(format!("styles.{category}")))
    }

    /// One field of a mapping-valued style category, e.g. `label_font.size`.
    pub fn style_field(&self, category: &str, subkey: &str) -> DrawResult<&Value> {
        self.style(category)?
            .get(subkey)
            .ok_or_else(|| DrawError::missing_key(format!("styles.{category}.{subkey}")))
    }

    pub fn style_field_str(&self, category: &str, subkey: &str) -> DrawResult<&str> {
        self.style_field(category, subkey)?
            .as_str()
            .ok_or_else(|| DrawError::missing_key(format!("styles.{category}.{subkey}")))
    }

    pub fn style_field_f64(&self, category: &str, subkey: &str) -> DrawResult<f64> {
        self.style_field(category, subkey)?
            .as_f64()
            .ok_or_else(|| DrawError::missing_key(format!("styles.{category}.{subkey}")))
    }

    fn shape_config(&self, shape: &str) -> DrawResult<&Map<String, Value>> {
        self.root
            .get("shapes")
            .and_then(|shapes| shapes.get(shape))
            .and_then(Value::as_object)
            .ok_or_else(|| DrawError::missing_key(format!("shapes.{shape}")))
    }

    /// The base gate shape with `gates[gate_name]` overlaid.
    ///
    /// The overlay is shallow: override keys replace base keys one level
    /// deep, never merged recursively.
    pub fn gate_config(&self, gate_name: &str) -> DrawResult<GateConfig> {
        let mut merged = self.shape_config("gate")?.clone();
        if let Some(overrides) = self
            .root
            .get("gates")
            .and_then(|gates| gates.get(gate_name))
            .and_then(Value::as_object)
        {
            for (key, value) in overrides {
                merged.insert(key.clone(), value.clone());
            }
        }

        let field = |key: &str| {
            merged
                .get(key)
                .and_then(Value::as_str)
                .map(str::to_string)
                .ok_or_else(|| DrawError::missing_key(format!("shapes.gate.{key}")))
        };
        Ok(GateConfig {
            fill: field("fill")?,
            stroke: field("stroke")?,
            radius: merged
                .get("radius")
                .and_then(Value::as_f64)
                .ok_or_else(|| DrawError::missing_key("shapes.gate.radius"))?,
            label: merged
                .get("label")
                .and_then(Value::as_str)
                .map(str::to_string),
        })
    }

    /// The alternate treatment registered for `gate_name`, if any.
    ///
    /// Descriptors with an unrecognized `type` tag resolve to `None` so the
    /// default box rendering applies.
    pub fn substitution(&self, gate_name: &str) -> Option<Substitution> {
        let descriptor = self.root.get("substitutions")?.get(gate_name)?;
        let value = descriptor.get("value")?.as_str()?.to_string();
        match descriptor.get("type")?.as_str()? {
            "emoji" => Some(Substitution::Glyph(value)),
            "image" => Some(Substitution::Image(value)),
            "animation" => Some(Substitution::Animated(value)),
            _ => None,
        }
    }
}

fn parse_theme_document(contents: &str) -> Result<Value, String> {
    match serde_json::from_str(contents) {
        Ok(value) => Ok(value),
        Err(json_err) => json5::from_str(contents).map_err(|_| json_err.to_string()),
    }
}

/// Recursive merge: for keys present in both trees, mappings merge
/// recursively and any other override value wins outright.
pub fn deep_merge(base: &mut Value, overlay: &Value) {
    if let (Value::Object(base_map), Value::Object(overlay_map)) = (&mut *base, overlay) {
        for (key, value) in overlay_map {
            match base_map.get_mut(key) {
                Some(slot) if slot.is_object() && value.is_object() => deep_merge(slot, value),
                _ => {
                    base_map.insert(key.clone(), value.clone());
                }
            }
        }
    } else {
        *base = overlay.clone();
    }
}
