//! Core engine modules - registry, inheritance, submission, events
//!
//! These modules hold the page's behaviour, independent of how controls are
//! rendered or how markup is fetched.

pub mod change_tracker;
pub mod dialogs;
pub mod dispatcher;
pub mod hierarchy;
pub mod limiter;
pub mod page_state;
pub mod propagation;
pub mod submit;

// Re-exports for convenience
pub use dialogs::{DirSource, OpenOutcome, PopulateOutcome, PopulateTicket, SubtrackSource};
pub use dispatcher::{DispatchOutcome, Dispatcher, PageEvent};
pub use page_state::{DialogState, PageConfigState, SubtrackEntry};
pub use propagation::InheritOutcome;
pub use submit::{ChangeSet, FormField, SubmitPayload};
