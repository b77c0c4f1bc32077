//! Lazily populated subtrack dialogs.
//!
//! A subtrack's settings controls do not exist until its dialog is first
//! opened. Opening starts a fetch and hands out a `PopulateTicket`; the
//! completion is applied only if the ticket's epoch still matches the
//! dialog's, so a cancelled or superseded fetch can never register controls.

use anyhow::{Context, Result};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::PathBuf;

use super::page_state::{DialogState, PageConfigState};
use super::propagation::inherit_on_load;
use crate::entities::{ConfigError, ControlId, ControlKind};
use crate::markup::parse_controls;

/// Fetches the configuration markup of one subtrack.
pub trait SubtrackSource {
    fn fetch(&self, subtrack: &str) -> Result<String>;
}

/// Reads `<dir>/<subtrack>.html`.
#[derive(Debug, Clone)]
pub struct DirSource {
    dir: PathBuf,
}

impl DirSource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

impl SubtrackSource for DirSource {
    fn fetch(&self, subtrack: &str) -> Result<String> {
        let path = self.dir.join(format!("{}.html", subtrack));
        std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read subtrack markup: {}", path.display()))
    }
}

/// Identifies one populate request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PopulateTicket {
    pub subtrack: String,
    pub epoch: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OpenOutcome {
    /// Already populated; now visible
    Shown,
    /// Caller must fetch markup and complete with this ticket
    Requested(PopulateTicket),
    AlreadyPending,
    /// Hidden by an ancestor's visibility
    Disabled,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PopulateOutcome {
    /// Ticket no longer matches; nothing registered
    Stale,
    Filled(Vec<ControlId>),
    /// Markup held no controls
    Empty,
}

pub fn open_dialog(state: &mut PageConfigState, subtrack: &str) -> Result<OpenOutcome, ConfigError> {
    let entry = state
        .subtrack_mut(subtrack)
        .ok_or_else(|| ConfigError::UnknownSubtrack(subtrack.to_string()))?;

    if !entry.enabled {
        debug!("Dialog for '{}' unavailable: subtrack is hidden", subtrack);
        return Ok(OpenOutcome::Disabled);
    }

    let outcome = match entry.dialog {
        DialogState::Open => OpenOutcome::Shown,
        DialogState::Hidden => {
            entry.dialog = DialogState::Open;
            OpenOutcome::Shown
        }
        DialogState::Pending => OpenOutcome::AlreadyPending,
        DialogState::Empty => {
            entry.epoch += 1;
            entry.dialog = DialogState::Pending;
            debug!("Requesting configuration for '{}' (epoch {})", subtrack, entry.epoch);
            OpenOutcome::Requested(PopulateTicket {
                subtrack: subtrack.to_string(),
                epoch: entry.epoch,
            })
        }
    };
    Ok(outcome)
}

/// Close a dialog. Closing one still waiting on its fetch cancels the fetch.
pub fn close_dialog(state: &mut PageConfigState, subtrack: &str) -> Result<(), ConfigError> {
    let entry = state
        .subtrack_mut(subtrack)
        .ok_or_else(|| ConfigError::UnknownSubtrack(subtrack.to_string()))?;

    match entry.dialog {
        DialogState::Pending => {
            entry.epoch += 1;
            entry.dialog = DialogState::Empty;
            debug!("Cancelled pending configuration for '{}'", subtrack);
        }
        DialogState::Open => entry.dialog = DialogState::Hidden,
        DialogState::Empty | DialogState::Hidden => {}
    }
    Ok(())
}

/// Register the controls found in `markup` and pull inherited values into
/// them before they become interactive.
pub fn complete_populate(
    state: &mut PageConfigState,
    ticket: &PopulateTicket,
    markup: &str,
) -> Result<PopulateOutcome, ConfigError> {
    let entry = state
        .subtrack(&ticket.subtrack)
        .ok_or_else(|| ConfigError::UnknownSubtrack(ticket.subtrack.clone()))?;
    if entry.dialog != DialogState::Pending || entry.epoch != ticket.epoch {
        debug!(
            "Dropping stale configuration for '{}' (epoch {}, current {})",
            ticket.subtrack, ticket.epoch, entry.epoch
        );
        return Ok(PopulateOutcome::Stale);
    }

    let specs = parse_controls(markup, &state.settings().shadow_prefix)?;
    let known: HashSet<String> = specs
        .iter()
        .filter(|s| state.find(&s.name).is_some())
        .map(|s| s.name.clone())
        .collect();

    let mut ids = Vec::with_capacity(specs.len());
    for spec in specs.iter().filter(|s| !known.contains(&s.name)) {
        match state.register(spec) {
            Ok(id) => ids.push(id),
            Err(e) => warn!("{}", e),
        }
    }

    for &id in &ids {
        let hidden = state.control(id).is_some_and(|c| c.kind == ControlKind::Hidden);
        if !hidden {
            inherit_on_load(state, id, false);
        }
    }

    if let Some(entry) = state.subtrack_mut(&ticket.subtrack) {
        entry.dialog = DialogState::Open;
    }

    if ids.is_empty() {
        warn!("No configuration controls found for '{}'", ticket.subtrack);
        return Ok(PopulateOutcome::Empty);
    }
    info!("Populated '{}' with {} controls", ticket.subtrack, ids.len());
    Ok(PopulateOutcome::Filled(ids))
}

/// Open a dialog and, if it still needs markup, fetch and apply it in one go.
///
/// Returns `None` when no fetch was needed.
pub fn populate_with(
    state: &mut PageConfigState,
    subtrack: &str,
    source: &dyn SubtrackSource,
) -> Result<Option<PopulateOutcome>> {
    let OpenOutcome::Requested(ticket) = open_dialog(state, subtrack)? else {
        return Ok(None);
    };
    let markup = match source.fetch(subtrack) {
        Ok(markup) => markup,
        Err(e) => {
            close_dialog(state, subtrack)?;
            return Err(e);
        }
    };
    Ok(Some(complete_populate(state, &ticket, &markup)?))
}
