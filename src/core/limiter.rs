//! Visibility limiting.
//!
//! A subtrack never shows more than its view allows, and a view never more
//! than the composite. Pushed levels always overwrite the subtrack's own
//! choice.

use log::{debug, warn};

use super::change_tracker::clear_changed;
use super::hierarchy::{composite_visibility, view_visibility};
use super::page_state::PageConfigState;
use crate::entities::{ControlId, ControlValue, Setting, Tier, Visibility};

pub fn limited_visibility(composite: Visibility, view: Visibility) -> Visibility {
    composite.min(view)
}

/// Push a view's visibility, capped by `composite_vis`, to every subtrack
/// visibility control in that view.
pub fn apply_visibility_to_children(
    state: &mut PageConfigState,
    view_ctrl: ControlId,
    composite_vis: Visibility,
) -> Vec<ControlId> {
    let Some(ctrl) = state.control(view_ctrl) else {
        return Vec::new();
    };
    let (Some(view), Some(view_vis)) = (ctrl.name.view.clone(), ctrl.value.as_vis()) else {
        warn!("'{}' is not a view visibility control", ctrl.name);
        return Vec::new();
    };

    let level = limited_visibility(composite_vis, view_vis);
    debug!(
        "View {} visibility {} limited by composite {} -> {}",
        view, view_vis, composite_vis, level
    );
    set_subtrack_levels(state, Some(view.as_str()), level)
}

/// Visibility push from a composite or view visibility control.
///
/// Returns every subtrack visibility control that was overwritten.
pub fn propagate_visibility(state: &mut PageConfigState, parent: ControlId) -> Vec<ControlId> {
    let Some(ctrl) = state.control(parent) else {
        return Vec::new();
    };
    let Some(level) = ctrl.value.as_vis() else {
        return Vec::new();
    };

    match ctrl.tier() {
        Tier::Subtrack => Vec::new(),
        Tier::View => {
            let Some(comp) = composite_visibility(state) else {
                warn!("No composite visibility control to limit '{}' with", ctrl.name);
                return Vec::new();
            };
            let composite_vis = state
                .control(comp)
                .and_then(|c| c.value.as_vis())
                .unwrap_or(Visibility::Full);
            apply_visibility_to_children(state, parent, composite_vis)
        }
        Tier::Composite => {
            let mut touched = Vec::new();
            for view in state.views().to_vec() {
                match view_visibility(state, &view) {
                    Some(view_ctrl) => {
                        touched.extend(apply_visibility_to_children(state, view_ctrl, level))
                    }
                    None => touched.extend(set_subtrack_levels(state, Some(view.as_str()), level)),
                }
            }
            touched.extend(set_subtrack_levels(state, None, level));
            touched
        }
    }
}

/// Overwrite the visibility of every subtrack in `view` (or outside any
/// view) and enable or disable those subtracks to match.
fn set_subtrack_levels(
    state: &mut PageConfigState,
    view: Option<&str>,
    level: Visibility,
) -> Vec<ControlId> {
    let targets: Vec<ControlId> = state
        .ids_with_setting(&Setting::Visibility)
        .iter()
        .copied()
        .filter(|&id| {
            let c = &state.controls()[id];
            c.tier() == Tier::Subtrack
                && c.name.subtrack.as_deref().map(|s| state.view_of_subtrack(s)) == Some(view)
        })
        .collect();

    for &id in &targets {
        if let Some(c) = state.control_mut(id) {
            c.value = ControlValue::Vis(level);
            clear_changed(c);
        }
    }

    let subtracks: Vec<String> = state
        .subtracks()
        .filter(|s| s.view.as_deref() == view)
        .map(|s| s.id.clone())
        .collect();
    for sub in &subtracks {
        state.set_subtrack_enabled(sub, !level.is_hidden());
    }

    targets
}
