//! Routes page events to the engine.
//!
//! Every user action and every fetch completion goes through one
//! `Dispatcher`, handled to completion before the next. Completions from
//! other threads are posted through `sender()` and drained by `run_pending`.

use crossbeam_channel::{Receiver, Sender, unbounded};
use log::{debug, trace, warn};
use serde::{Deserialize, Serialize};

use super::change_tracker::{clear_changed, mark_changed};
use super::dialogs::{
    OpenOutcome, PopulateOutcome, PopulateTicket, SubtrackSource, close_dialog, complete_populate,
    open_dialog,
};
use super::page_state::PageConfigState;
use super::propagation::{inherit_on_load, propagate_down};
use super::submit::{SubmitPayload, prepare_for_submit};
use crate::entities::{ConfigError, ControlId, ControlKind, ControlValue, Setting, Tier};

/// Something that happened on the page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum PageEvent {
    /// User changed a control. Radio groups take the option value.
    Edit { name: String, value: String },
    Open { subtrack: String },
    Close { subtrack: String },
    /// Fetch completion for a populate request
    Populated {
        subtrack: String,
        epoch: u64,
        markup: String,
    },
    Submit,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    Edited {
        id: ControlId,
        propagated: Vec<ControlId>,
    },
    Opened(OpenOutcome),
    Closed,
    Populated(PopulateOutcome),
    Submitted(SubmitPayload),
}

pub struct Dispatcher {
    tx: Sender<PageEvent>,
    rx: Receiver<PageEvent>,
    source: Option<Box<dyn SubtrackSource>>,
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl Dispatcher {
    pub fn new() -> Self {
        let (tx, rx) = unbounded();
        Self { tx, rx, source: None }
    }

    /// Fetch markup from `source` whenever a dialog needs populating.
    pub fn with_source(mut self, source: Box<dyn SubtrackSource>) -> Self {
        self.source = Some(source);
        self
    }

    /// Handle for posting completions from elsewhere.
    pub fn sender(&self) -> Sender<PageEvent> {
        self.tx.clone()
    }

    pub fn post(&self, event: PageEvent) {
        if self.tx.send(event).is_err() {
            warn!("Event queue closed, event dropped");
        }
    }

    pub fn pending(&self) -> usize {
        self.rx.len()
    }

    /// Handle every queued event. Errors are logged and do not stop the
    /// queue.
    pub fn run_pending(&mut self, state: &mut PageConfigState) -> Vec<DispatchOutcome> {
        let mut outcomes = Vec::new();
        while let Ok(event) = self.rx.try_recv() {
            match self.dispatch(state, event) {
                Ok(outcome) => outcomes.push(outcome),
                Err(e) => warn!("{}", e),
            }
        }
        outcomes
    }

    pub fn dispatch(
        &mut self,
        state: &mut PageConfigState,
        event: PageEvent,
    ) -> Result<DispatchOutcome, ConfigError> {
        trace!("Dispatching {:?}", event);
        match event {
            PageEvent::Edit { name, value } => {
                let (id, propagated) = apply_edit(state, &name, &value)?;
                Ok(DispatchOutcome::Edited { id, propagated })
            }
            PageEvent::Open { subtrack } => {
                let outcome = open_dialog(state, &subtrack)?;
                if let OpenOutcome::Requested(ticket) = &outcome {
                    self.request(state, ticket)?;
                }
                Ok(DispatchOutcome::Opened(outcome))
            }
            PageEvent::Close { subtrack } => {
                close_dialog(state, &subtrack)?;
                Ok(DispatchOutcome::Closed)
            }
            PageEvent::Populated {
                subtrack,
                epoch,
                markup,
            } => {
                let ticket = PopulateTicket { subtrack, epoch };
                let outcome = complete_populate(state, &ticket, &markup)?;
                Ok(DispatchOutcome::Populated(outcome))
            }
            PageEvent::Submit => Ok(DispatchOutcome::Submitted(prepare_for_submit(state))),
        }
    }

    /// Fetch markup for a ticket and queue its completion. Without a
    /// source the caller is expected to post `Populated` itself.
    fn request(&self, state: &mut PageConfigState, ticket: &PopulateTicket) -> Result<(), ConfigError> {
        let Some(source) = &self.source else {
            return Ok(());
        };
        match source.fetch(&ticket.subtrack) {
            Ok(markup) => self.post(PageEvent::Populated {
                subtrack: ticket.subtrack.clone(),
                epoch: ticket.epoch,
                markup,
            }),
            Err(e) => {
                warn!("Can't fetch configuration for '{}': {:#}", ticket.subtrack, e);
                close_dialog(state, &ticket.subtrack)?;
            }
        }
        Ok(())
    }
}

/// Store a user edit, mark it changed and push it down if it governs lower
/// tiers.
fn apply_edit(
    state: &mut PageConfigState,
    name: &str,
    value: &str,
) -> Result<(ControlId, Vec<ControlId>), ConfigError> {
    let ids = state.ids_by_name(name).to_vec();
    let Some(&id) = ids.first() else {
        return Err(ConfigError::UnknownControl(name.to_string()));
    };
    let Some(ctrl) = state.control(id) else {
        return Err(ConfigError::UnknownControl(name.to_string()));
    };

    if ctrl.kind == ControlKind::Radio {
        let known = ids
            .iter()
            .any(|&i| state.control(i).and_then(|c| c.radio_option()) == Some(value));
        if !known {
            return Err(ConfigError::InvalidValue {
                name: name.to_string(),
                value: value.to_string(),
            });
        }
        // every option of the group is marked, so the group is sent as a whole
        for &i in &ids {
            if let Some(c) = state.control_mut(i) {
                let checked = c.radio_option() == Some(value);
                c.assign(&ControlValue::Radio {
                    option: String::new(),
                    checked,
                })?;
                mark_changed(c);
            }
        }
    } else {
        let parsed = ctrl.parse_value(value)?;
        if let Some(c) = state.control_mut(id) {
            c.assign(&parsed)?;
            mark_changed(c);
        }
    }

    let Some(ctrl) = state.control(id) else {
        return Ok((id, Vec::new()));
    };
    debug!("Edited '{}' = {}", ctrl.name, ctrl.value);

    let propagated = match ctrl.tier() {
        Tier::Composite | Tier::View => propagate_down(state, id),
        Tier::Subtrack if ctrl.is_visibility() => {
            selection_follows_visibility(state, id);
            Vec::new()
        }
        Tier::Subtrack => Vec::new(),
    };
    Ok((id, propagated))
}

/// A subtrack shown at any level is selected; hiding it deselects it and
/// hands the visibility back to its ancestors.
fn selection_follows_visibility(state: &mut PageConfigState, vis_id: ControlId) {
    let Some(ctrl) = state.control(vis_id) else {
        return;
    };
    let (Some(subtrack), Some(level)) = (ctrl.name.subtrack.clone(), ctrl.value.as_vis()) else {
        return;
    };
    let Some(sel) = state.subtrack_control(&subtrack, &Setting::Selection) else {
        debug!("No selection control for '{}'", subtrack);
        return;
    };

    let selected = !level.is_hidden();
    if let Some(c) = state.control_mut(sel) {
        c.value = ControlValue::Bool(selected);
        mark_changed(c);
    }

    if !selected {
        inherit_on_load(state, vis_id, true);
        if let Some(c) = state.control_mut(vis_id) {
            clear_changed(c);
        }
        debug!("'{}' deselected; visibility returned to its parents", subtrack);
    }
}
