//! Control name grammar.
//!
//! Names are the only source of a control's place in the hierarchy:
//!
//! ```text
//! <composite>                        composite visibility
//! <composite>.<suffix>               composite setting ('_' also accepted)
//! <composite>_<view>.<suffix>        view setting ('.' / '_' accepted for both joints)
//! <composite>.<view>.vis             view visibility
//! <subtrack>                         subtrack visibility
//! <subtrack>.<suffix>                subtrack setting
//! <subtrack>_sel                     subtrack selection checkbox
//! ```
//!
//! Subtrack ids usually start with the composite id, so they are matched
//! first. Longer ids win over shorter ones that happen to be prefixes.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::ConfigError;

/// Hierarchy tier, ordered from farthest to nearest to the leaf.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Tier {
    Composite,
    View,
    Subtrack,
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Tier::Composite => "composite",
            Tier::View => "view",
            Tier::Subtrack => "subtrack",
        };
        f.write_str(s)
    }
}

/// The logical setting a control holds, shared across tiers.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Setting {
    Visibility,
    /// Subtrack on/off checkbox. Has no ancestors.
    Selection,
    Named(String),
}

impl fmt::Display for Setting {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Setting::Visibility => f.write_str("<vis>"),
            Setting::Selection => f.write_str("<sel>"),
            Setting::Named(s) => f.write_str(s),
        }
    }
}

/// A decomposed control name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ControlName {
    pub raw: String,
    pub tier: Tier,
    /// View the control belongs to (VIEW tier only; subtracks look theirs up)
    pub view: Option<String>,
    /// Owning subtrack (SUBTRACK tier only)
    pub subtrack: Option<String>,
    pub setting: Setting,
}

impl fmt::Display for ControlName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

/// Identifiers known to a page, used to decompose names.
#[derive(Debug, Clone, Default)]
pub struct NameScope {
    composite: String,
    /// Sorted longest first
    views: Vec<String>,
    /// Sorted longest first
    subtracks: Vec<String>,
    visibility_suffix: String,
    selection_suffix: String,
}

impl NameScope {
    pub fn new(
        composite: impl Into<String>,
        views: &[String],
        subtracks: &[String],
        visibility_suffix: impl Into<String>,
        selection_suffix: impl Into<String>,
    ) -> Self {
        let mut views = views.to_vec();
        views.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));
        let mut subtracks = subtracks.to_vec();
        subtracks.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));

        Self {
            composite: composite.into(),
            views,
            subtracks,
            visibility_suffix: visibility_suffix.into(),
            selection_suffix: selection_suffix.into(),
        }
    }

    pub fn composite(&self) -> &str {
        &self.composite
    }

    /// Decompose a raw name into tier, owner and setting.
    pub fn decompose(&self, raw: &str) -> Result<ControlName, ConfigError> {
        let fail = |reason: &str| ConfigError::Resolution {
            name: raw.to_string(),
            reason: reason.to_string(),
        };

        if raw.is_empty() {
            return Err(fail("empty name"));
        }

        // Subtracks first: their ids normally extend the composite id
        for sub in &self.subtracks {
            if raw == sub {
                return Ok(self.subtrack_name(raw, sub, Setting::Visibility));
            }
            if let Some(rest) = raw.strip_prefix(sub.as_str()) {
                if let Some(suffix) = rest.strip_prefix('.') {
                    if suffix.is_empty() {
                        return Err(fail("subtrack setting without suffix"));
                    }
                    let setting = Setting::Named(suffix.to_string());
                    return Ok(self.subtrack_name(raw, sub, setting));
                }
                if let Some(suffix) = rest.strip_prefix('_') {
                    if suffix == self.selection_suffix {
                        return Ok(self.subtrack_name(raw, sub, Setting::Selection));
                    }
                }
            }
        }

        if raw == self.composite {
            return Ok(ControlName {
                raw: raw.to_string(),
                tier: Tier::Composite,
                view: None,
                subtrack: None,
                setting: Setting::Visibility,
            });
        }

        let rest = strip_joint(raw, &self.composite)
            .ok_or_else(|| fail("not under the composite or any subtrack"))?;
        if rest.is_empty() {
            return Err(fail("composite setting without suffix"));
        }

        for view in &self.views {
            if let Some(suffix) = strip_joint(rest, view) {
                if suffix.is_empty() {
                    return Err(fail("view setting without suffix"));
                }
                let setting = if suffix == self.visibility_suffix {
                    Setting::Visibility
                } else {
                    Setting::Named(suffix.to_string())
                };
                return Ok(ControlName {
                    raw: raw.to_string(),
                    tier: Tier::View,
                    view: Some(view.clone()),
                    subtrack: None,
                    setting,
                });
            }
        }

        Ok(ControlName {
            raw: raw.to_string(),
            tier: Tier::Composite,
            view: None,
            subtrack: None,
            setting: Setting::Named(rest.to_string()),
        })
    }

    fn subtrack_name(&self, raw: &str, sub: &str, setting: Setting) -> ControlName {
        ControlName {
            raw: raw.to_string(),
            tier: Tier::Subtrack,
            view: None,
            subtrack: Some(sub.to_string()),
            setting,
        }
    }
}

/// `name` minus `root` and one '.' or '_' joint.
fn strip_joint<'a>(name: &'a str, root: &str) -> Option<&'a str> {
    let rest = name.strip_prefix(root)?;
    rest.strip_prefix('.').or_else(|| rest.strip_prefix('_'))
}
