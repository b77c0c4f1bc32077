//! Page-wide control registry.
//!
//! One `PageConfigState` exists per configuration page. It owns every
//! materialized control, the composite's views and subtracks, and the
//! per-subtrack dialog bookkeeping. Components take it by reference; there
//! is no ambient state.

use indexmap::IndexMap;
use log::{debug, info, warn};
use std::collections::HashMap;

use crate::config::EngineSettings;
use crate::entities::{
    ConfigError, Control, ControlId, ControlKind, ControlSpec, ControlValue, FieldRole, NameScope,
    PageLayout, Setting, Tier, Visibility,
};

/// Lifecycle of a subtrack's embedded configuration dialog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DialogState {
    /// Never populated
    #[default]
    Empty,
    /// Waiting on the fetch collaborator
    Pending,
    Open,
    /// Populated, currently closed
    Hidden,
}

#[derive(Debug, Clone)]
pub struct SubtrackEntry {
    pub id: String,
    pub view: Option<String>,
    pub dialog: DialogState,
    /// Bumped whenever a populate request starts or is cancelled
    pub epoch: u64,
    /// False while an ancestor's visibility hides the subtrack
    pub enabled: bool,
}

#[derive(Debug)]
pub struct PageConfigState {
    settings: EngineSettings,
    scope: NameScope,
    views: Vec<String>,
    subtracks: IndexMap<String, SubtrackEntry>,
    /// Arena; ids are indices and stay valid for the page lifetime
    controls: Vec<Control>,
    by_name: HashMap<String, Vec<ControlId>>,
    by_setting: HashMap<Setting, Vec<ControlId>>,
}

impl PageConfigState {
    /// Build the page from its layout and register the eagerly rendered
    /// controls, all starting unchanged.
    ///
    /// Controls whose names can't be resolved are logged and skipped.
    pub fn new(layout: &PageLayout, settings: EngineSettings) -> Result<Self, ConfigError> {
        layout.validate()?;

        let sub_ids: Vec<String> = layout.subtracks.iter().map(|s| s.id.clone()).collect();
        let scope = NameScope::new(
            layout.composite.clone(),
            &layout.views,
            &sub_ids,
            settings.visibility_suffix.clone(),
            settings.selection_suffix.clone(),
        );

        let subtracks = layout
            .subtracks
            .iter()
            .map(|s| {
                let entry = SubtrackEntry {
                    id: s.id.clone(),
                    view: s.view.clone(),
                    dialog: DialogState::Empty,
                    epoch: 0,
                    enabled: true,
                };
                (s.id.clone(), entry)
            })
            .collect();

        let mut state = Self {
            settings,
            scope,
            views: layout.views.clone(),
            subtracks,
            controls: Vec::new(),
            by_name: HashMap::new(),
            by_setting: HashMap::new(),
        };

        for spec in &layout.controls {
            if let Err(e) = state.register(spec) {
                warn!("{}", e);
            }
        }

        info!(
            "Page '{}' ready: {} views, {} subtracks, {} controls",
            layout.composite,
            state.views.len(),
            state.subtracks.len(),
            state.controls.len()
        );
        Ok(state)
    }

    /// Materialize one control. It starts unchanged regardless of how it
    /// was rendered.
    pub fn register(&mut self, spec: &ControlSpec) -> Result<ControlId, ConfigError> {
        let name = self.scope.decompose(&spec.name)?;

        if let Some(existing) = self.by_name.get(&spec.name) {
            let all_radio = spec.kind == ControlKind::Radio
                && existing
                    .iter()
                    .all(|&id| self.controls[id].kind == ControlKind::Radio);
            if !all_radio {
                return Err(ConfigError::Layout(format!(
                    "control '{}' registered twice",
                    spec.name
                )));
            }
        }

        let value = match spec.kind {
            ControlKind::Checkbox => ControlValue::Bool(spec.checked),
            ControlKind::Radio => ControlValue::Radio {
                option: spec.value.clone(),
                checked: spec.checked,
            },
            ControlKind::Select | ControlKind::Text | ControlKind::Hidden => {
                if name.setting == Setting::Visibility {
                    let vis = spec.value.parse::<Visibility>().map_err(|_| {
                        ConfigError::InvalidValue {
                            name: spec.name.clone(),
                            value: spec.value.clone(),
                        }
                    })?;
                    ControlValue::Vis(vis)
                } else {
                    ControlValue::Text(spec.value.clone())
                }
            }
        };

        let role = spec.role.unwrap_or_else(|| match &name.setting {
            Setting::Selection => FieldRole::Selection,
            Setting::Named(suffix)
                if spec.kind == ControlKind::Hidden
                    && self.settings.is_structural_suffix(suffix) =>
            {
                FieldRole::Structural
            }
            _ => FieldRole::Setting,
        });

        let id = self.controls.len();
        let setting = name.setting.clone();
        let control = Control::new(id, name, spec.kind, value)
            .with_shadow(&self.settings.shadow_prefix)
            .with_role(role);

        debug!(
            "Registered {} {} '{}' as #{}",
            control.tier(),
            control.kind,
            spec.name,
            id
        );

        self.by_name.entry(spec.name.clone()).or_default().push(id);
        self.by_setting.entry(setting).or_default().push(id);
        self.controls.push(control);
        Ok(id)
    }

    /// Drop every control and dialog. Nothing outlives the page.
    pub fn teardown(self) {
        info!(
            "Tearing down page '{}' ({} controls)",
            self.scope.composite(),
            self.controls.len()
        );
    }

    // --- Lookup ---

    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    pub fn composite_id(&self) -> &str {
        self.scope.composite()
    }

    pub fn views(&self) -> &[String] {
        &self.views
    }

    pub fn len(&self) -> usize {
        self.controls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.controls.is_empty()
    }

    pub fn control(&self, id: ControlId) -> Option<&Control> {
        self.controls.get(id)
    }

    pub fn control_mut(&mut self, id: ControlId) -> Option<&mut Control> {
        self.controls.get_mut(id)
    }

    /// All controls in registration order; index equals `ControlId`.
    pub fn controls(&self) -> &[Control] {
        &self.controls
    }

    pub fn controls_mut(&mut self) -> impl Iterator<Item = &mut Control> {
        self.controls.iter_mut()
    }

    /// All controls carrying `name` (several for a radio group).
    pub fn ids_by_name(&self, name: &str) -> &[ControlId] {
        self.by_name.get(name).map(Vec::as_slice).unwrap_or(&[])
    }

    /// First control carrying `name`.
    pub fn find(&self, name: &str) -> Option<ControlId> {
        self.ids_by_name(name).first().copied()
    }

    /// Option value of the checked radio in group `name`.
    pub fn checked_option(&self, name: &str) -> Option<&str> {
        self.ids_by_name(name)
            .iter()
            .find_map(|&id| match &self.controls[id].value {
                ControlValue::Radio {
                    option,
                    checked: true,
                } => Some(option.as_str()),
                _ => None,
            })
    }

    /// Every materialized control of a setting, across tiers.
    pub fn ids_with_setting(&self, setting: &Setting) -> &[ControlId] {
        self.by_setting
            .get(setting)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn subtrack(&self, id: &str) -> Option<&SubtrackEntry> {
        self.subtracks.get(id)
    }

    pub fn subtrack_mut(&mut self, id: &str) -> Option<&mut SubtrackEntry> {
        self.subtracks.get_mut(id)
    }

    /// Subtracks in page order.
    pub fn subtracks(&self) -> impl Iterator<Item = &SubtrackEntry> {
        self.subtracks.values()
    }

    pub fn view_of_subtrack(&self, id: &str) -> Option<&str> {
        self.subtracks.get(id).and_then(|s| s.view.as_deref())
    }

    /// The subtrack-tier control of `setting` owned by `subtrack`.
    pub fn subtrack_control(&self, subtrack: &str, setting: &Setting) -> Option<ControlId> {
        self.ids_with_setting(setting).iter().copied().find(|&id| {
            let c = &self.controls[id];
            c.tier() == Tier::Subtrack && c.name.subtrack.as_deref() == Some(subtrack)
        })
    }

    /// Enable or disable a subtrack; its selection checkbox follows.
    pub fn set_subtrack_enabled(&mut self, subtrack: &str, enabled: bool) {
        let Some(entry) = self.subtracks.get_mut(subtrack) else {
            return;
        };
        if entry.enabled != enabled {
            debug!(
                "Subtrack '{}' {}",
                subtrack,
                if enabled { "enabled" } else { "disabled (hidden by parent)" }
            );
        }
        entry.enabled = enabled;
        if let Some(sel) = self.subtrack_control(subtrack, &Setting::Selection) {
            self.controls[sel].disabled = !enabled;
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::entities::SubtrackSpec;

    /// Composite "hist" with views SIG and PKS, three subtracks (one outside
    /// any view) and a typical set of eagerly rendered controls.
    pub(crate) fn sample_layout() -> PageLayout {
        PageLayout {
            composite: "hist".to_string(),
            views: vec!["SIG".to_string(), "PKS".to_string()],
            subtracks: vec![
                SubtrackSpec::new("histSigA", Some("SIG")),
                SubtrackSpec::new("histSigB", Some("SIG")),
                SubtrackSpec::new("histPksA", Some("PKS")),
                SubtrackSpec::new("histLone", None),
            ],
            controls: vec![
                ControlSpec::select("hist", "full"),
                ControlSpec::text("hist.color", "0,0,0"),
                ControlSpec::checkbox("hist.showLabels", false),
                ControlSpec::radio("hist.mode", "points", true),
                ControlSpec::radio("hist.mode", "lines", false),
                ControlSpec::select("hist.SIG.vis", "full"),
                ControlSpec::select("hist.PKS.vis", "dense"),
                ControlSpec::text("hist_SIG.color", "0,0,0"),
                ControlSpec::select("histSigA", "full"),
                ControlSpec::select("histSigB", "full"),
                ControlSpec::select("histPksA", "dense"),
                ControlSpec::select("histLone", "full"),
                ControlSpec::checkbox("histSigA_sel", true),
                ControlSpec::checkbox("histSigB_sel", true),
                ControlSpec::checkbox("histPksA_sel", true),
                ControlSpec::checkbox("histLone_sel", false),
                ControlSpec::hidden("histSigA.priority", "1"),
            ],
        }
    }

    pub(crate) fn sample_state() -> PageConfigState {
        PageConfigState::new(&sample_layout(), EngineSettings::default()).unwrap()
    }

    /// Materialize the dialog controls of one subtrack, as population would.
    pub(crate) fn materialize(state: &mut PageConfigState, sub: &str) -> Vec<ControlId> {
        vec![
            state.register(&ControlSpec::text(format!("{}.color", sub), "0,0,0")).unwrap(),
            state.register(&ControlSpec::checkbox(format!("{}.showLabels", sub), false)).unwrap(),
            state.register(&ControlSpec::radio(format!("{}.mode", sub), "points", true)).unwrap(),
            state.register(&ControlSpec::radio(format!("{}.mode", sub), "lines", false)).unwrap(),
        ]
    }

    #[test]
    fn test_registration_starts_unchanged() {
        let state = sample_state();
        assert_eq!(state.len(), 17);
        assert!(state.controls().iter().all(|c| !c.changed));
        assert_eq!(state.composite_id(), "hist");
    }

    #[test]
    fn test_roles_are_derived() {
        let state = sample_state();
        let sel = state.find("histSigA_sel").unwrap();
        assert_eq!(state.control(sel).unwrap().role, FieldRole::Selection);
        let prio = state.find("histSigA.priority").unwrap();
        assert_eq!(state.control(prio).unwrap().role, FieldRole::Structural);
        let color = state.find("hist.color").unwrap();
        assert_eq!(state.control(color).unwrap().role, FieldRole::Setting);
    }

    #[test]
    fn test_visibility_values_parsed() {
        let state = sample_state();
        let vis = state.find("hist.PKS.vis").unwrap();
        assert_eq!(
            state.control(vis).unwrap().value,
            ControlValue::Vis(Visibility::Dense)
        );
    }

    #[test]
    fn test_unresolvable_controls_skipped() {
        let mut layout = sample_layout();
        layout.controls.push(ControlSpec::text("otherTrack.color", "1"));
        let state = PageConfigState::new(&layout, EngineSettings::default()).unwrap();
        assert_eq!(state.len(), 17);
        assert!(state.find("otherTrack.color").is_none());
    }

    #[test]
    fn test_duplicate_names_only_for_radios() {
        let mut state = sample_state();
        assert!(state.register(&ControlSpec::radio("hist.mode", "bars", false)).is_ok());
        assert_eq!(state.ids_by_name("hist.mode").len(), 3);
        assert!(matches!(
            state.register(&ControlSpec::text("hist.color", "1,1,1")),
            Err(ConfigError::Layout(_))
        ));
    }

    #[test]
    fn test_checked_option() {
        let state = sample_state();
        assert_eq!(state.checked_option("hist.mode"), Some("points"));
        assert_eq!(state.checked_option("hist.color"), None);
    }

    #[test]
    fn test_subtrack_lookup() {
        let mut state = sample_state();
        assert_eq!(state.view_of_subtrack("histPksA"), Some("PKS"));
        assert_eq!(state.view_of_subtrack("histLone"), None);
        assert!(state.subtrack_control("histSigA", &Setting::Visibility).is_some());

        state.set_subtrack_enabled("histSigA", false);
        let sel = state.find("histSigA_sel").unwrap();
        assert!(state.control(sel).unwrap().disabled);
        assert!(!state.subtrack("histSigA").unwrap().enabled);
    }
}
