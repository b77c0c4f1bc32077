//! Changed-flag bookkeeping.
//!
//! The changed flag separates values a user chose from values that were
//! inherited. Checkbox shadows move in lockstep with their checkbox.

use crate::entities::Control;

/// Mark a control as edited by the user. Idempotent.
pub fn mark_changed(control: &mut Control) {
    control.changed = true;
    control.transmit = true;
    if let Some(shadow) = control.shadow.as_mut() {
        shadow.changed = true;
    }
}

/// Mark a control as holding an inherited (or initial) value.
pub fn clear_changed(control: &mut Control) {
    control.changed = false;
    if let Some(shadow) = control.shadow.as_mut() {
        shadow.changed = false;
    }
}

pub fn is_changed(control: &Control) -> bool {
    control.changed
}
