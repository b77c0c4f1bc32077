//! Page description consumed when a configuration page is built.
//!
//! A layout lists the composite, its views, its subtracks and the eagerly
//! rendered controls (composite and view settings, subtrack visibility and
//! selection). Subtrack dialog controls arrive later as `ControlSpec`s from
//! the markup parser.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

use super::control::{ControlKind, FieldRole};
use super::ConfigError;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PageLayout {
    pub composite: String,
    #[serde(default)]
    pub views: Vec<String>,
    #[serde(default)]
    pub subtracks: Vec<SubtrackSpec>,
    #[serde(default)]
    pub controls: Vec<ControlSpec>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubtrackSpec {
    pub id: String,
    #[serde(default)]
    pub view: Option<String>,
}

/// One form field as rendered, before it is registered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControlSpec {
    pub name: String,
    pub kind: ControlKind,
    /// Text, selected option, radio option value or visibility level
    #[serde(default)]
    pub value: String,
    /// Checkbox / radio state
    #[serde(default)]
    pub checked: bool,
    #[serde(default)]
    pub role: Option<FieldRole>,
}

impl ControlSpec {
    pub fn new(name: impl Into<String>, kind: ControlKind, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind,
            value: value.into(),
            checked: false,
            role: None,
        }
    }

    pub fn checkbox(name: impl Into<String>, checked: bool) -> Self {
        Self {
            checked,
            ..Self::new(name, ControlKind::Checkbox, "on")
        }
    }

    pub fn radio(name: impl Into<String>, option: impl Into<String>, checked: bool) -> Self {
        Self {
            checked,
            ..Self::new(name, ControlKind::Radio, option)
        }
    }

    pub fn select(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self::new(name, ControlKind::Select, value)
    }

    pub fn text(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self::new(name, ControlKind::Text, value)
    }

    pub fn hidden(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self::new(name, ControlKind::Hidden, value)
    }

    pub fn with_role(mut self, role: FieldRole) -> Self {
        self.role = Some(role);
        self
    }
}

impl SubtrackSpec {
    pub fn new(id: impl Into<String>, view: Option<&str>) -> Self {
        Self {
            id: id.into(),
            view: view.map(str::to_string),
        }
    }
}

impl PageLayout {
    /// Load a layout from a JSON file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read page layout: {}", path.display()))?;
        let layout: PageLayout = serde_json::from_str(&text)
            .with_context(|| format!("Failed to parse page layout: {}", path.display()))?;
        layout.validate()?;
        Ok(layout)
    }

    /// Structural checks: a composite id, unique views and subtracks, and
    /// subtrack views that exist.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.composite.trim().is_empty() {
            return Err(ConfigError::Layout("composite id is empty".to_string()));
        }

        let mut views = HashSet::new();
        for view in &self.views {
            if view.is_empty() || !views.insert(view.as_str()) {
                return Err(ConfigError::Layout(format!("bad or duplicate view '{}'", view)));
            }
        }

        let mut subs = HashSet::new();
        for sub in &self.subtracks {
            if sub.id.is_empty() || !subs.insert(sub.id.as_str()) {
                return Err(ConfigError::Layout(format!(
                    "bad or duplicate subtrack '{}'",
                    sub.id
                )));
            }
            if sub.id == self.composite {
                return Err(ConfigError::Layout(format!(
                    "subtrack '{}' shares the composite id",
                    sub.id
                )));
            }
            if let Some(view) = &sub.view {
                if !views.contains(view.as_str()) {
                    return Err(ConfigError::Layout(format!(
                        "subtrack '{}' belongs to unknown view '{}'",
                        sub.id, view
                    )));
                }
            }
        }
        Ok(())
    }
}
