//! Ancestor and descendant lookup.
//!
//! Relationships come from the decomposed names alone: same setting, higher
//! tier, and for subtracks the view recorded in the page layout.

use log::debug;

use super::page_state::PageConfigState;
use crate::entities::{Control, ControlId, ControlKind, Setting, Tier};

/// Governing controls of `id`, nearest (view) first, composite last.
///
/// A radio option's ancestor is the parent option with the same option
/// value, not the parent group.
pub fn ancestors_of(state: &PageConfigState, id: ControlId) -> Vec<ControlId> {
    let Some(child) = state.control(id) else {
        return Vec::new();
    };
    if child.name.setting == Setting::Selection {
        return Vec::new();
    }

    let mut parents = Vec::with_capacity(2);
    match child.tier() {
        Tier::Composite => {}
        Tier::View => {
            parents.extend(composite_control(state, child));
        }
        Tier::Subtrack => {
            let view = child
                .name
                .subtrack
                .as_deref()
                .and_then(|sub| state.view_of_subtrack(sub));
            if let Some(view) = view {
                parents.extend(view_control(state, view, child));
            }
            parents.extend(composite_control(state, child));
        }
    }

    if parents.is_empty() {
        debug!("No parents found for '{}'", child.name);
    }
    parents
}

/// Every materialized lower-tier control governed by `id`.
///
/// For a composite control: each view's control followed by that view's
/// subtracks, then subtracks outside any view.
pub fn descendants_of(state: &PageConfigState, id: ControlId) -> Vec<ControlId> {
    let Some(parent) = state.control(id) else {
        return Vec::new();
    };
    let setting = &parent.name.setting;
    let same_setting = state.ids_with_setting(setting);

    let subtracks_in = |view: Option<&str>| -> Vec<ControlId> {
        same_setting
            .iter()
            .copied()
            .filter(|&cid| {
                let c = control(state, cid);
                c.tier() == Tier::Subtrack
                    && c.name.subtrack.as_deref().map(|s| state.view_of_subtrack(s)) == Some(view)
            })
            .collect()
    };

    match parent.tier() {
        Tier::Subtrack => Vec::new(),
        Tier::View => {
            let Some(view) = parent.name.view.as_deref() else {
                return Vec::new();
            };
            subtracks_in(Some(view))
        }
        Tier::Composite => {
            let mut children = Vec::new();
            for view in state.views() {
                children.extend(same_setting.iter().copied().filter(|&cid| {
                    let c = control(state, cid);
                    c.tier() == Tier::View && c.name.view.as_deref() == Some(view.as_str())
                }));
                children.extend(subtracks_in(Some(view.as_str())));
            }
            children.extend(subtracks_in(None));
            children
        }
    }
}

/// Composite-tier control for the child's setting.
pub fn composite_control(state: &PageConfigState, child: &Control) -> Option<ControlId> {
    pick(state, child, |c| c.tier() == Tier::Composite)
}

/// View-tier control of `view` for the child's setting.
pub fn view_control(state: &PageConfigState, view: &str, child: &Control) -> Option<ControlId> {
    pick(state, child, |c| {
        c.tier() == Tier::View && c.name.view.as_deref() == Some(view)
    })
}

/// Composite visibility control, if rendered.
pub fn composite_visibility(state: &PageConfigState) -> Option<ControlId> {
    state
        .ids_with_setting(&Setting::Visibility)
        .iter()
        .copied()
        .find(|&id| control(state, id).tier() == Tier::Composite)
}

/// View visibility control of `view`, if rendered.
pub fn view_visibility(state: &PageConfigState, view: &str) -> Option<ControlId> {
    state
        .ids_with_setting(&Setting::Visibility)
        .iter()
        .copied()
        .find(|&id| {
            let c = control(state, id);
            c.tier() == Tier::View && c.name.view.as_deref() == Some(view)
        })
}

fn pick<F>(state: &PageConfigState, child: &Control, accept: F) -> Option<ControlId>
where
    F: Fn(&Control) -> bool,
{
    let child_option = child.radio_option();
    state
        .ids_with_setting(&child.name.setting)
        .iter()
        .copied()
        .find(|&id| {
            let c = control(state, id);
            if !accept(c) {
                return false;
            }
            match (child.kind, child_option) {
                (ControlKind::Radio, Some(option)) => c.radio_option() == Some(option),
                _ => true,
            }
        })
}

/// Ids handed out by the index always resolve.
fn control(state: &PageConfigState, id: ControlId) -> &Control {
    &state.controls()[id]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::page_state::tests::{materialize, sample_state};

    fn names(state: &PageConfigState, ids: &[ControlId]) -> Vec<String> {
        ids.iter()
            .map(|&id| state.control(id).unwrap().name.raw.clone())
            .collect()
    }

    #[test]
    fn test_ancestors_nearest_first() {
        let mut state = sample_state();
        let ids = materialize(&mut state, "histSigA");
        let parents = ancestors_of(&state, ids[0]);
        assert_eq!(names(&state, &parents), vec!["hist_SIG.color", "hist.color"]);
    }

    #[test]
    fn test_ancestors_without_view() {
        let mut state = sample_state();
        let ids = materialize(&mut state, "histLone");
        let parents = ancestors_of(&state, ids[0]);
        assert_eq!(names(&state, &parents), vec!["hist.color"]);

        // PKS has no color control of its own
        let ids = materialize(&mut state, "histPksA");
        assert_eq!(names(&state, &ancestors_of(&state, ids[0])), vec!["hist.color"]);
    }

    #[test]
    fn test_radio_ancestor_is_matching_option() {
        let mut state = sample_state();
        let ids = materialize(&mut state, "histLone");
        let lines = ids[3];
        let parents = ancestors_of(&state, lines);
        assert_eq!(parents.len(), 1);
        let parent = state.control(parents[0]).unwrap();
        assert_eq!(parent.radio_option(), Some("lines"));
    }

    #[test]
    fn test_visibility_ancestors() {
        let state = sample_state();
        let vis = state.find("histSigA").unwrap();
        assert_eq!(names(&state, &ancestors_of(&state, vis)), vec!["hist.SIG.vis", "hist"]);

        let view_vis = state.find("hist.PKS.vis").unwrap();
        assert_eq!(names(&state, &ancestors_of(&state, view_vis)), vec!["hist"]);

        let sel = state.find("histSigA_sel").unwrap();
        assert!(ancestors_of(&state, sel).is_empty());
    }

    #[test]
    fn test_descendants_only_materialized() {
        let mut state = sample_state();
        let comp = state.find("hist.color").unwrap();
        assert_eq!(names(&state, &descendants_of(&state, comp)), vec!["hist_SIG.color"]);

        materialize(&mut state, "histSigB");
        materialize(&mut state, "histLone");
        assert_eq!(
            names(&state, &descendants_of(&state, comp)),
            vec!["hist_SIG.color", "histSigB.color", "histLone.color"]
        );

        let view = state.find("hist_SIG.color").unwrap();
        assert_eq!(names(&state, &descendants_of(&state, view)), vec!["histSigB.color"]);
        let sub = state.find("histSigB.color").unwrap();
        assert!(descendants_of(&state, sub).is_empty());
    }

    #[test]
    fn test_visibility_helpers() {
        let state = sample_state();
        assert_eq!(composite_visibility(&state), state.find("hist"));
        assert_eq!(view_visibility(&state, "PKS"), state.find("hist.PKS.vis"));
        assert_eq!(view_visibility(&state, "NONE"), None);
    }
}
