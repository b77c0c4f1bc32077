//! Named, typed, value-holding settings fields.
//!
//! A `Control` is the engine's view of one form field. Radio groups are split
//! into one control per option so that a child option can be matched to the
//! parent option with the same value.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::name::{ControlName, Setting, Tier};
use super::visibility::Visibility;
use super::ConfigError;

/// Index into the page's control arena.
pub type ControlId = usize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ControlKind {
    Checkbox,
    Radio,
    Select,
    Text,
    Hidden,
}

impl ControlKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ControlKind::Checkbox => "checkbox",
            ControlKind::Radio => "radio",
            ControlKind::Select => "select",
            ControlKind::Text => "text",
            ControlKind::Hidden => "hidden",
        }
    }
}

impl fmt::Display for ControlKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Current value of a control.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ControlValue {
    Bool(bool),
    /// One radio option: its fixed option value and whether it is selected
    Radio { option: String, checked: bool },
    Text(String),
    Vis(Visibility),
}

impl ControlValue {
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            ControlValue::Bool(b) => Some(*b),
            ControlValue::Radio { checked, .. } => Some(*checked),
            _ => None,
        }
    }

    pub fn as_vis(&self) -> Option<Visibility> {
        match self {
            ControlValue::Vis(v) => Some(*v),
            _ => None,
        }
    }

    /// Text as it would be transmitted in a form.
    pub fn to_form_text(&self) -> String {
        match self {
            ControlValue::Bool(true) => "on".to_string(),
            ControlValue::Bool(false) => String::new(),
            ControlValue::Radio { option, .. } => option.clone(),
            ControlValue::Text(s) => s.clone(),
            ControlValue::Vis(v) => v.as_str().to_string(),
        }
    }
}

impl fmt::Display for ControlValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ControlValue::Bool(b) => write!(f, "{}", b),
            ControlValue::Radio { option, checked } => {
                write!(f, "{}{}", option, if *checked { " (checked)" } else { "" })
            }
            ControlValue::Text(s) => write!(f, "\"{}\"", s),
            ControlValue::Vis(v) => write!(f, "{}", v),
        }
    }
}

/// Why a field is on the form. Decides submission rules, not tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldRole {
    #[default]
    Setting,
    /// Subtrack on/off checkbox
    Selection,
    /// Ordering/position data; always transmitted
    Structural,
}

/// Hidden companion of a checkbox (`boolshad.<name>`).
///
/// An unchecked checkbox sends nothing, so the shadow is what tells the
/// receiver that the boolean was present at all.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Shadow {
    pub name: String,
    pub changed: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Control {
    pub id: ControlId,
    pub name: ControlName,
    pub kind: ControlKind,
    pub value: ControlValue,
    pub role: FieldRole,
    pub shadow: Option<Shadow>,
    /// Set only by a direct user edit
    pub changed: bool,
    /// Keeps its transmission name; cleared for untouched controls at submit
    pub transmit: bool,
    pub disabled: bool,
}

impl Control {
    pub fn new(id: ControlId, name: ControlName, kind: ControlKind, value: ControlValue) -> Self {
        Self {
            id,
            name,
            kind,
            value,
            role: FieldRole::Setting,
            shadow: None,
            changed: false,
            transmit: true,
            disabled: false,
        }
    }

    /// Attach a `boolshad.` companion (checkboxes only).
    pub fn with_shadow(mut self, prefix: &str) -> Self {
        if self.kind == ControlKind::Checkbox {
            self.shadow = Some(Shadow {
                name: format!("{}{}", prefix, self.name.raw),
                changed: false,
            });
        }
        self
    }

    pub fn with_role(mut self, role: FieldRole) -> Self {
        self.role = role;
        self
    }

    pub fn tier(&self) -> Tier {
        self.name.tier
    }

    pub fn raw_name(&self) -> &str {
        &self.name.raw
    }

    pub fn is_visibility(&self) -> bool {
        self.name.setting == Setting::Visibility
    }

    /// Option value of a radio control.
    pub fn radio_option(&self) -> Option<&str> {
        match &self.value {
            ControlValue::Radio { option, .. } => Some(option),
            _ => None,
        }
    }

    /// Store a new value, checking it fits the control's kind.
    ///
    /// Radio options keep their option value; only `checked` moves.
    pub fn assign(&mut self, value: &ControlValue) -> Result<(), ConfigError> {
        let mismatch = || ConfigError::KindMismatch {
            name: self.name.raw.clone(),
            kind: self.kind.as_str(),
        };

        match (&mut self.value, value) {
            (ControlValue::Bool(b), ControlValue::Bool(new)) => *b = *new,
            (ControlValue::Radio { checked, .. }, ControlValue::Radio { checked: new, .. }) => {
                *checked = *new
            }
            (ControlValue::Text(s), ControlValue::Text(new)) => s.clone_from(new),
            (ControlValue::Vis(v), ControlValue::Vis(new)) => *v = *new,
            _ => return Err(mismatch()),
        }
        Ok(())
    }

    /// Parse user-entered text into a value for this control.
    pub fn parse_value(&self, text: &str) -> Result<ControlValue, ConfigError> {
        let invalid = || ConfigError::InvalidValue {
            name: self.name.raw.clone(),
            value: text.to_string(),
        };

        match &self.value {
            ControlValue::Bool(_) => match text.trim().to_ascii_lowercase().as_str() {
                "on" | "true" | "1" | "yes" | "checked" => Ok(ControlValue::Bool(true)),
                "off" | "false" | "0" | "no" | "" => Ok(ControlValue::Bool(false)),
                _ => Err(invalid()),
            },
            ControlValue::Radio { .. } => Ok(ControlValue::Radio {
                option: text.to_string(),
                checked: true,
            }),
            ControlValue::Text(_) => Ok(ControlValue::Text(text.to_string())),
            ControlValue::Vis(_) => text.parse::<Visibility>().map(ControlValue::Vis).map_err(|_| invalid()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::name::NameScope;

    fn name(raw: &str) -> ControlName {
        NameScope::new("comp", &[], &["sub1".to_string()], "vis", "sel")
            .decompose(raw)
            .unwrap()
    }

    #[test]
    fn test_shadow_only_for_checkboxes() {
        let cb = Control::new(0, name("comp.showLabels"), ControlKind::Checkbox, ControlValue::Bool(true))
            .with_shadow("boolshad.");
        assert_eq!(cb.shadow.as_ref().unwrap().name, "boolshad.comp.showLabels");

        let text = Control::new(1, name("comp.color"), ControlKind::Text, ControlValue::Text("0,0,0".into()))
            .with_shadow("boolshad.");
        assert!(text.shadow.is_none());
    }

    #[test]
    fn test_assign_checks_kind() {
        let mut c = Control::new(0, name("comp.color"), ControlKind::Text, ControlValue::Text("red".into()));
        assert!(c.assign(&ControlValue::Text("blue".into())).is_ok());
        assert_eq!(c.value, ControlValue::Text("blue".into()));
        assert!(matches!(
            c.assign(&ControlValue::Bool(true)),
            Err(ConfigError::KindMismatch { .. })
        ));
    }

    #[test]
    fn test_radio_assign_keeps_option() {
        let mut c = Control::new(
            0,
            name("comp.mode"),
            ControlKind::Radio,
            ControlValue::Radio { option: "points".into(), checked: false },
        );
        c.assign(&ControlValue::Radio { option: "lines".into(), checked: true }).unwrap();
        assert_eq!(c.radio_option(), Some("points"));
        assert_eq!(c.value.as_bool(), Some(true));
    }

    #[test]
    fn test_parse_value() {
        let vis = Control::new(0, name("sub1"), ControlKind::Select, ControlValue::Vis(Visibility::Hide));
        assert_eq!(vis.parse_value("pack").unwrap(), ControlValue::Vis(Visibility::Pack));
        assert!(vis.parse_value("huge").is_err());

        let cb = Control::new(1, name("sub1.on"), ControlKind::Checkbox, ControlValue::Bool(false));
        assert_eq!(cb.parse_value("on").unwrap(), ControlValue::Bool(true));
        assert!(cb.parse_value("maybe").is_err());
    }
}
