//! Submission filtering.
//!
//! Only controls the user edited reach the server, so inherited values never
//! override anything stored for a lower tier. Structural fields are the
//! exception and always go out.

use indexmap::IndexMap;
use log::{debug, info};
use serde::Serialize;
use std::collections::HashSet;
use url::form_urlencoded;

use super::change_tracker::is_changed;
use super::page_state::PageConfigState;
use crate::entities::{ControlId, ControlKind, FieldRole};

/// Controls that will be transmitted. Built right before submission.
#[derive(Debug, Clone, Default)]
pub struct ChangeSet {
    ids: Vec<ControlId>,
}

impl ChangeSet {
    pub fn contains(&self, id: ControlId) -> bool {
        self.ids.binary_search(&id).is_ok()
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = ControlId> + '_ {
        self.ids.iter().copied()
    }
}

/// One `name=value` pair of the submitted form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FormField {
    pub name: String,
    pub value: String,
}

/// Fields handed to the form-submission collaborator, in page order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SubmitPayload {
    pub fields: Vec<FormField>,
}

impl SubmitPayload {
    fn push(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.fields.push(FormField {
            name: name.into(),
            value: value.into(),
        });
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|f| f.name == name)
            .map(|f| f.value.as_str())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// `application/x-www-form-urlencoded` body.
    pub fn to_query_string(&self) -> String {
        let mut ser = form_urlencoded::Serializer::new(String::new());
        for f in &self.fields {
            ser.append_pair(&f.name, &f.value);
        }
        ser.finish()
    }

    /// Fields as a JSON object keyed by name, in page order.
    pub fn to_json(&self) -> serde_json::Result<String> {
        let map: IndexMap<&str, &str> = self
            .fields
            .iter()
            .map(|f| (f.name.as_str(), f.value.as_str()))
            .collect();
        serde_json::to_string_pretty(&map)
    }
}

/// Changed controls plus structural fields. A radio group counts as changed
/// when any of its options is.
pub fn build_change_set(state: &PageConfigState) -> ChangeSet {
    let changed_groups: HashSet<&str> = state
        .controls()
        .iter()
        .filter(|c| c.kind == ControlKind::Radio && is_changed(c))
        .map(|c| c.raw_name())
        .collect();

    let ids = state
        .controls()
        .iter()
        .filter(|c| {
            is_changed(c)
                || c.role == FieldRole::Structural
                || (c.kind == ControlKind::Radio && changed_groups.contains(c.raw_name()))
        })
        .map(|c| c.id)
        .collect();

    ChangeSet { ids }
}

/// Strip the transmission name from every control outside the change set,
/// then encode what is left. Display values are untouched.
pub fn prepare_for_submit(state: &mut PageConfigState) -> SubmitPayload {
    let set = build_change_set(state);
    for c in state.controls_mut() {
        c.transmit = set.contains(c.id);
    }

    let mut payload = SubmitPayload::default();
    let mut radio_groups: HashSet<&str> = HashSet::new();

    for c in state.controls().iter().filter(|c| c.transmit) {
        match c.kind {
            ControlKind::Checkbox => {
                let checked = c.value.as_bool().unwrap_or(false);
                if checked && !c.disabled {
                    payload.push(c.raw_name(), "on");
                }
                if let Some(shadow) = c.shadow.as_ref().filter(|s| s.changed) {
                    let value = match (c.disabled, checked) {
                        (false, _) => "0",
                        (true, true) => "-1",
                        (true, false) => "-2",
                    };
                    payload.push(shadow.name.as_str(), value);
                }
            }
            ControlKind::Radio => {
                if c.disabled || !radio_groups.insert(c.raw_name()) {
                    continue;
                }
                if let Some(option) = state.checked_option(c.raw_name()) {
                    payload.push(c.raw_name(), option);
                }
            }
            ControlKind::Select | ControlKind::Text | ControlKind::Hidden => {
                if c.disabled {
                    debug!("Skipping disabled '{}'", c.name);
                    continue;
                }
                payload.push(c.raw_name(), c.value.to_form_text());
            }
        }
    }

    info!(
        "Submitting {} of {} controls as {} fields",
        set.len(),
        state.len(),
        payload.len()
    );
    payload
}
