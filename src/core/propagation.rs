//! Push and pull of settings between tiers.
//!
//! Push: an edited composite or view control overwrites every materialized
//! descendant, and those descendants become "inherited" again.
//!
//! Pull: a freshly populated subtrack control takes its value from ancestors
//! the user has edited. The nearest tier wins when more than one ancestor
//! was edited.

use log::{debug, warn};

use super::change_tracker::{clear_changed, is_changed};
use super::hierarchy::{ancestors_of, descendants_of};
use super::limiter::propagate_visibility;
use super::page_state::PageConfigState;
use crate::entities::{ControlId, ControlKind, ControlValue, Visibility};

/// Result of pulling inherited values into one control.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InheritOutcome {
    /// Nothing governs this control
    NoAncestors,
    /// No ancestor contributed a value
    Unchanged,
    /// The control carries the user's own edit and `force` was not set
    KeptOwnEdit,
    Applied { from: ControlId },
    /// Visibility capped by the minimum of its ancestors
    Limited { level: Visibility },
    /// Several tiers contributed different values; the nearest was applied
    Conflict {
        applied: ControlId,
        ignored: Vec<ControlId>,
    },
}

/// Copy `parent`'s value to all of its materialized descendants and clear
/// their changed flags, whether or not they were edited.
///
/// Returns the overwritten controls.
pub fn propagate_down(state: &mut PageConfigState, parent: ControlId) -> Vec<ControlId> {
    let Some(p) = state.control(parent) else {
        return Vec::new();
    };
    if p.is_visibility() {
        return propagate_visibility(state, parent);
    }

    let value = p.value.clone();
    let selected = match p.kind {
        ControlKind::Radio => Some(state.checked_option(p.raw_name()).map(str::to_string)),
        _ => None,
    };
    let parent_name = p.name.raw.clone();

    let children = descendants_of(state, parent);
    for &child in &children {
        let Some(c) = state.control_mut(child) else {
            continue;
        };
        let result = match (&selected, c.kind) {
            (Some(selected), ControlKind::Radio) => {
                let checked = c.radio_option() == selected.as_deref();
                c.assign(&ControlValue::Radio {
                    option: String::new(),
                    checked,
                })
            }
            _ => c.assign(&value),
        };
        if let Err(e) = result {
            warn!("Can't push '{}': {}", parent_name, e);
            continue;
        }
        clear_changed(c);
    }

    debug!("Pushed '{}' to {} descendants", parent_name, children.len());
    children
}

/// Pull ancestor values into `child`.
///
/// An ancestor contributes when `force` is set or it was edited. A child the
/// user edited is left alone unless `force` is set.
pub fn inherit_on_load(state: &mut PageConfigState, child: ControlId, force: bool) -> InheritOutcome {
    let Some(c) = state.control(child) else {
        return InheritOutcome::NoAncestors;
    };
    if !force && is_changed(c) {
        return InheritOutcome::KeptOwnEdit;
    }
    let is_vis = c.is_visibility();

    let parents = ancestors_of(state, child);
    if parents.is_empty() {
        return InheritOutcome::NoAncestors;
    }
    let contributors: Vec<ControlId> = parents
        .iter()
        .copied()
        .filter(|&p| force || state.control(p).is_some_and(is_changed))
        .collect();
    let Some(&nearest) = contributors.first() else {
        return InheritOutcome::Unchanged;
    };

    if is_vis {
        // every ancestor limits, edited or not
        let Some(level) = parents
            .iter()
            .filter_map(|&p| state.control(p).and_then(|c| c.value.as_vis()))
            .min()
        else {
            return InheritOutcome::Unchanged;
        };
        if let Some(c) = state.control_mut(child) {
            c.value = ControlValue::Vis(level);
            clear_changed(c);
        }
        return InheritOutcome::Limited { level };
    }

    let value = match state.control(nearest) {
        Some(p) => p.value.clone(),
        None => return InheritOutcome::Unchanged,
    };
    let ignored: Vec<ControlId> = contributors[1..]
        .iter()
        .copied()
        .filter(|&p| state.control(p).is_some_and(|c| c.value != value))
        .collect();

    let Some(c) = state.control_mut(child) else {
        return InheritOutcome::Unchanged;
    };
    if let Err(e) = c.assign(&value) {
        warn!("Can't inherit into '{}': {}", c.name, e);
        return InheritOutcome::Unchanged;
    }
    clear_changed(c);

    if ignored.is_empty() {
        InheritOutcome::Applied { from: nearest }
    } else {
        warn!(
            "'{}' was edited at more than one tier; using the nearest",
            c.name
        );
        InheritOutcome::Conflict {
            applied: nearest,
            ignored,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::change_tracker::mark_changed;
    use crate::core::page_state::tests::{materialize, sample_state};

    fn edit(state: &mut PageConfigState, name: &str, value: ControlValue) -> ControlId {
        let id = state.find(name).unwrap();
        let c = state.control_mut(id).unwrap();
        c.assign(&value).unwrap();
        mark_changed(c);
        id
    }

    fn text(state: &PageConfigState, id: ControlId) -> String {
        state.control(id).unwrap().value.to_form_text()
    }

    #[test]
    fn test_push_is_idempotent() {
        let mut state = sample_state();
        let a = materialize(&mut state, "histSigA");
        let b = materialize(&mut state, "histLone");
        let comp = edit(&mut state, "hist.color", ControlValue::Text("255,0,0".into()));

        propagate_down(&mut state, comp);
        let once: Vec<_> = state.controls().to_vec();
        propagate_down(&mut state, comp);
        assert_eq!(state.controls(), once.as_slice());

        assert_eq!(text(&state, a[0]), "255,0,0");
        assert_eq!(text(&state, b[0]), "255,0,0");
        assert!(!state.control(a[0]).unwrap().changed);
    }

    #[test]
    fn test_push_overwrites_edited_child() {
        let mut state = sample_state();
        let ids = materialize(&mut state, "histSigA");
        edit(&mut state, "histSigA.color", ControlValue::Text("1,1,1".into()));
        let view = edit(&mut state, "hist_SIG.color", ControlValue::Text("9,9,9".into()));

        let touched = propagate_down(&mut state, view);
        assert_eq!(touched, vec![ids[0]]);
        assert_eq!(text(&state, ids[0]), "9,9,9");
        assert!(!state.control(ids[0]).unwrap().changed);
    }

    #[test]
    fn test_push_radio_checks_matching_option() {
        let mut state = sample_state();
        let ids = materialize(&mut state, "histLone");
        let parent_ids = state.ids_by_name("hist.mode").to_vec();
        for &id in &parent_ids {
            let c = state.control_mut(id).unwrap();
            let lines = c.radio_option() == Some("lines");
            c.assign(&ControlValue::Radio { option: String::new(), checked: lines }).unwrap();
            mark_changed(c);
        }

        propagate_down(&mut state, parent_ids[0]);
        assert_eq!(state.checked_option("histLone.mode"), Some("lines"));
        assert!(!state.control(ids[2]).unwrap().changed);
    }

    #[test]
    fn test_push_checkbox_clears_shadow() {
        let mut state = sample_state();
        let ids = materialize(&mut state, "histSigB");
        mark_changed(state.control_mut(ids[1]).unwrap());
        let comp = edit(&mut state, "hist.showLabels", ControlValue::Bool(true));

        propagate_down(&mut state, comp);
        let cb = state.control(ids[1]).unwrap();
        assert_eq!(cb.value, ControlValue::Bool(true));
        assert!(!cb.shadow.as_ref().unwrap().changed);
    }

    #[test]
    fn test_pull_prefers_changed_ancestor() {
        let mut state = sample_state();
        // composite edited, view untouched: composite wins though farther away
        edit(&mut state, "hist.color", ControlValue::Text("5,5,5".into()));
        let ids = materialize(&mut state, "histSigA");

        let comp = state.find("hist.color").unwrap();
        assert_eq!(
            inherit_on_load(&mut state, ids[0], false),
            InheritOutcome::Applied { from: comp }
        );
        assert_eq!(text(&state, ids[0]), "5,5,5");
    }

    #[test]
    fn test_pull_nearest_wins_on_conflict() {
        let mut state = sample_state();
        let comp = edit(&mut state, "hist.color", ControlValue::Text("5,5,5".into()));
        let view = edit(&mut state, "hist_SIG.color", ControlValue::Text("7,7,7".into()));
        let ids = materialize(&mut state, "histSigB");

        assert_eq!(
            inherit_on_load(&mut state, ids[0], false),
            InheritOutcome::Conflict { applied: view, ignored: vec![comp] }
        );
        assert_eq!(text(&state, ids[0]), "7,7,7");
    }

    #[test]
    fn test_pull_keeps_user_edit() {
        let mut state = sample_state();
        edit(&mut state, "hist.color", ControlValue::Text("5,5,5".into()));
        let ids = materialize(&mut state, "histLone");
        edit(&mut state, "histLone.color", ControlValue::Text("1,2,3".into()));

        assert_eq!(inherit_on_load(&mut state, ids[0], false), InheritOutcome::KeptOwnEdit);
        assert_eq!(text(&state, ids[0]), "1,2,3");
        assert!(state.control(ids[0]).unwrap().changed);

        // force overrides the edit
        inherit_on_load(&mut state, ids[0], true);
        assert_eq!(text(&state, ids[0]), "5,5,5");
        assert!(!state.control(ids[0]).unwrap().changed);
    }

    #[test]
    fn test_pull_without_edits_leaves_value() {
        let mut state = sample_state();
        let ids = materialize(&mut state, "histPksA");
        assert_eq!(inherit_on_load(&mut state, ids[0], false), InheritOutcome::Unchanged);
        assert_eq!(text(&state, ids[0]), "0,0,0");
    }

    #[test]
    fn test_pull_visibility_takes_minimum() {
        let mut state = sample_state();
        edit(&mut state, "hist", ControlValue::Vis(Visibility::Pack));
        edit(&mut state, "hist.SIG.vis", ControlValue::Vis(Visibility::Squish));
        let sub = state.find("histSigA").unwrap();

        assert_eq!(
            inherit_on_load(&mut state, sub, true),
            InheritOutcome::Limited { level: Visibility::Squish }
        );
        assert_eq!(state.control(sub).unwrap().value, ControlValue::Vis(Visibility::Squish));
    }

    #[test]
    fn test_pull_radio_option() {
        let mut state = sample_state();
        for id in state.ids_by_name("hist.mode").to_vec() {
            let c = state.control_mut(id).unwrap();
            let lines = c.radio_option() == Some("lines");
            c.assign(&ControlValue::Radio { option: String::new(), checked: lines }).unwrap();
            mark_changed(c);
        }
        let ids = materialize(&mut state, "histSigA");
        inherit_on_load(&mut state, ids[2], false);
        inherit_on_load(&mut state, ids[3], false);
        assert_eq!(state.checked_option("histSigA.mode"), Some("lines"));
    }
}
