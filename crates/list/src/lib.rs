//! Interactive result list controller.
//!
//! A state machine over the ordered, possibly-circular list of result items,
//! driven by abstract keyboard and pointer identities. It consumes the query
//! engine's `results` and `clear` events, keeps the active and hovered
//! pointers consistent with asynchronously arriving result sets, and commits
//! a selected value back to the host through a preventable `select` event.
//! The controller is UI-framework-agnostic; a UI-binding collaborator
//! translates platform events into [`Key`] identities and item indices.

mod controller;

pub use controller::{KeyOutcome, ListController, ListItem, Selection};
pub use typeahead_types::{Key, ListOptions};
