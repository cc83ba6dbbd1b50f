//! Typeahead query engine.
//!
//! Three cooperating pieces, all synchronous state machines:
//!
//! - [`source`]: normalizes a static list, a key-to-list map, or a remote
//!   transport behind one request interface, with an in-memory response cache
//!   for the remote variant.
//! - [`pipeline`]: turns a raw source response into ordered, display-ready
//!   result records through locate, filter, highlight, and format stages.
//! - [`query`]: owns the current query, debounces input, dispatches to the
//!   source, discards stale responses, and publishes the `clear`, `query`,
//!   and `results` lifecycle events.
//!
//! The [`runtime`] module is the imperative shell: a tokio-backed driver that
//! owns the debounce task handle and runs transport fetches, feeding their
//! outcomes back into the engine. State updates stay pure; the driver only
//! executes the effects they return.

pub mod pipeline;
pub mod query;
pub mod runtime;
pub mod source;

pub use pipeline::{Locator, ResultPipeline};
pub use query::{QueryEngine, QueryEngineBuilder, RequestTemplate};
pub use runtime::EngineDriver;
pub use source::{PendingFetch, SourceAdapter, SourceConfig, SourceConfigError, SourceReply, Transport};
