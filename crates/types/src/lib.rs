//! Shared type definitions for the typeahead crates.
//!
//! This crate holds the data model passed between the query engine, the
//! result pipeline, and the list controller: result records, lifecycle event
//! payloads, the effect enum returned by state-machine operations, abstract
//! key identities, and the scalar configuration structs.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;

mod event;

pub use event::{Event, Relay};

/// A single displayable suggestion surfaced to the list and to the host.
///
/// The three fields are independently-derived views of the same underlying
/// item: `display` is the formatted/highlighted form used for rendering,
/// `raw` is the post-filter original item, and `text` is the plain-text form
/// used for filtering and for committing back into the input. Records are
/// created once per pipeline run and replaced wholesale on the next results
/// event.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ResultRecord {
    /// Formatted form, ready for rendering.
    pub display: String,
    /// Post-filter, pre-highlight original item.
    pub raw: Value,
    /// Plain-text form used for filtering and input commit.
    pub text: String,
}

/// Payload of the `clear` event, fired whenever input no longer carries a
/// live query.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ClearPayload {
    /// The query that was current before the reset, if any.
    pub previous_query: Option<String>,
}

/// Payload of the `query` event, fired synchronously when the debounce timer
/// elapses and a request is about to be dispatched.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct QueryPayload {
    /// Full raw input text the query was extracted from.
    pub input_value: String,
    /// The extracted query about to be dispatched.
    pub query: String,
}

/// Payload of the `results` event.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ResultsPayload {
    /// The query these results answer.
    pub query: String,
    /// The raw source response the records were derived from.
    pub data: Value,
    /// Ordered records in pipeline output order.
    pub results: Vec<ResultRecord>,
}

/// Payload of the `select` event fired by the list controller.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SelectPayload {
    /// Index of the selected item within the current item set.
    pub index: usize,
    /// The record bound to the selected item.
    pub record: ResultRecord,
}

/// Distinguishes user-driven input changes from programmatic ones.
///
/// Programmatic changes (the host or the engine writing a committed value
/// back into the field) must never re-trigger a query.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub enum InputOrigin {
    /// The user typed this value.
    User,
    /// The engine or host set this value.
    Programmatic,
}

/// Abstract key identities consumed by the list controller.
///
/// The UI-binding collaborator translates platform key codes into these
/// identities; the controller never sees platform codes.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Key {
    Down,
    Up,
    Enter,
    Escape,
    Tab,
    /// Any key the controller does not handle; passes through untouched.
    Other,
}

/// Instructions emitted by engine operations for the host to execute.
///
/// State updates are pure; effects describe the side work the imperative
/// shell must perform (schedule a timer, dispatch a fetch) and the lifecycle
/// events it should forward to collaborators such as the list controller.
#[derive(Clone, Debug, PartialEq)]
pub enum Effect {
    /// The `clear` lifecycle event fired.
    Clear(ClearPayload),
    /// The `query` lifecycle event fired.
    Query(QueryPayload),
    /// The `results` lifecycle event fired.
    Results(ResultsPayload),
    /// Arm the single pending debounce timer. Arming implicitly cancels any
    /// outstanding timer: a fire whose generation is no longer current is
    /// ignored by the engine.
    DebounceArmed {
        /// Generation tag to hand back via `debounce_elapsed`.
        generation: u64,
        /// Quiet window before dispatch.
        delay: Duration,
    },
    /// Perform the transport fetch for `request` and feed the response back
    /// through `response_arrived` tagged with `query`.
    FetchRequested {
        /// The query string the response will be checked against.
        query: String,
        /// Exact request string to hand to the transport.
        request: String,
    },
}

fn default_min_query_length() -> i32 {
    1
}

fn default_query_delay_ms() -> u64 {
    100
}

/// Scalar configuration for the query engine.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EngineOptions {
    /// Minimum query length eligible for dispatch. Zero permits the empty
    /// string; a negative value disables dispatch entirely.
    #[serde(default = "default_min_query_length")]
    pub min_query_length: i32,
    /// Debounce quiet window in milliseconds. Zero dispatches synchronously
    /// with no timer.
    #[serde(default = "default_query_delay_ms")]
    pub query_delay_ms: u64,
    /// Optional delimiter; the query is the trailing delimited segment,
    /// left-trimmed.
    #[serde(default)]
    pub query_delimiter: Option<String>,
    /// Cap on emitted records when positive; zero or negative means
    /// unlimited.
    #[serde(default)]
    pub max_results: i32,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            min_query_length: default_min_query_length(),
            query_delay_ms: default_query_delay_ms(),
            query_delimiter: None,
            max_results: 0,
        }
    }
}

impl EngineOptions {
    /// Debounce delay as a [`Duration`].
    pub fn query_delay(&self) -> Duration {
        Duration::from_millis(self.query_delay_ms)
    }
}

fn default_true() -> bool {
    true
}

/// Scalar configuration for the list controller.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ListOptions {
    /// Wrap navigation at list boundaries.
    #[serde(default = "default_true")]
    pub circular: bool,
    /// Never auto-hide the list on empty results.
    #[serde(default)]
    pub always_show_list: bool,
    /// Activate index 0 whenever results repopulate and nothing is active.
    #[serde(default)]
    pub activate_first_item: bool,
    /// Let Tab commit the active item; when false Tab is not intercepted.
    #[serde(default = "default_true")]
    pub tab_select: bool,
    /// Delimiter used when splicing a committed value back into the input.
    /// Must match the engine's `query_delimiter`.
    #[serde(default)]
    pub query_delimiter: Option<String>,
}

impl Default for ListOptions {
    fn default() -> Self {
        Self {
            circular: true,
            always_show_list: false,
            activate_first_item: false,
            tab_select: true,
            query_delimiter: None,
        }
    }
}
