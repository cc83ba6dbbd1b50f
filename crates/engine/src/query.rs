//! The query engine state machine.
//!
//! Owns the current query and results, debounces input changes, dispatches
//! requests to the source adapter, discards stale responses, and publishes
//! the `clear`, `query`, and `results` lifecycle events.
//!
//! The machine moves between no-query, debouncing, and dispatched:
//!
//! - an input change with a live query arms (or re-arms) the single pending
//!   debounce timer; starting a new timer implicitly cancels the outstanding
//!   one,
//! - when the timer fires, the query is recorded as current, the `query`
//!   event fires synchronously, and the request goes to the source,
//! - an input change with no live query cancels any pending timer, fires
//!   `clear`, and resets query and results.
//!
//! State updates are pure and every operation returns the effects the host
//! must execute: lifecycle events to forward, a timer to arm, or a transport
//! fetch to perform. No two transitions run concurrently; one operation
//! completes, including its synchronous event cascade, before the next signal
//! is processed.

use std::fmt;
use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, warn};
use typeahead_types::{ClearPayload, Effect, EngineOptions, InputOrigin, QueryPayload, Relay, ResultRecord, ResultsPayload};
use typeahead_util::delimiter::trailing_segment;
use typeahead_util::template::substitute_query;

use crate::pipeline::ResultPipeline;
use crate::source::{SourceAdapter, SourceConfig, SourceConfigError, SourceReply, Transport, resolve_source};

/// Builds the opaque request value handed to the source.
pub enum RequestTemplate {
    /// String template; `{query}` is substituted with the URI-encoded query.
    Template(String),
    /// Custom function; owns its encoding.
    Func(Box<dyn Fn(&str) -> String + Send>),
}

impl RequestTemplate {
    fn build(&self, query: &str) -> String {
        match self {
            Self::Template(template) => substitute_query(template, query),
            Self::Func(build) => build(query),
        }
    }
}

impl fmt::Debug for RequestTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Template(template) => f.debug_tuple("Template").field(template).finish(),
            Self::Func(_) => f.write_str("Func"),
        }
    }
}

#[derive(Debug)]
struct PendingQuery {
    query: String,
    generation: u64,
}

/// Builder resolving the source configuration and assembling the engine.
#[derive(Debug, Default)]
pub struct QueryEngineBuilder {
    options: EngineOptions,
    source: Option<SourceConfig>,
    request_template: Option<RequestTemplate>,
    pipeline: ResultPipeline,
}

impl QueryEngineBuilder {
    /// Set the scalar options.
    pub fn options(mut self, options: EngineOptions) -> Self {
        self.options = options;
        self
    }

    /// Set the source configuration.
    pub fn source(mut self, source: SourceConfig) -> Self {
        self.source = Some(source);
        self
    }

    /// Set an explicit request template.
    pub fn request_template(mut self, template: RequestTemplate) -> Self {
        self.request_template = Some(template);
        self
    }

    /// Set the result pipeline. Its cap is overwritten from the options'
    /// `max_results` at build time.
    pub fn pipeline(mut self, pipeline: ResultPipeline) -> Self {
        self.pipeline = pipeline;
        self
    }

    /// Append a filter to the pipeline without replacing it.
    pub fn filter<F>(mut self, filter: F) -> Self
    where
        F: Fn(&str, Vec<Value>) -> Vec<Value> + Send + 'static,
    {
        self.pipeline = self.pipeline.with_filter(filter);
        self
    }

    /// Resolve the source and assemble the engine.
    ///
    /// Fails when the source configuration is unusable; an engine is never
    /// built around a partially-working source.
    pub fn build(self) -> Result<QueryEngine, SourceConfigError> {
        let Some(source) = self.source else {
            return Err(SourceConfigError::MissingSource);
        };
        let resolved = resolve_source(source)?;
        let request_template = match self.request_template {
            Some(template) => Some(template),
            None => resolved.derived_template.map(RequestTemplate::Template),
        };
        let mut pipeline = self.pipeline;
        pipeline.set_max_results(self.options.max_results);
        Ok(QueryEngine {
            options: self.options,
            request_template,
            source: resolved.adapter,
            pipeline,
            input_value: String::new(),
            query: None,
            results: Vec::new(),
            pending: None,
            generation: 0,
            on_clear: Relay::new(),
            on_query: Relay::new(),
            on_results: Relay::new(),
        })
    }
}

/// The query engine. See the module docs for the state machine.
#[derive(Debug)]
pub struct QueryEngine {
    options: EngineOptions,
    request_template: Option<RequestTemplate>,
    source: SourceAdapter,
    pipeline: ResultPipeline,
    input_value: String,
    query: Option<String>,
    results: Vec<ResultRecord>,
    pending: Option<PendingQuery>,
    generation: u64,
    on_clear: Relay<ClearPayload>,
    on_query: Relay<QueryPayload>,
    on_results: Relay<ResultsPayload>,
}

impl QueryEngine {
    /// Start building an engine.
    pub fn builder() -> QueryEngineBuilder {
        QueryEngineBuilder::default()
    }

    /// The query currently considered current, if any.
    pub fn query(&self) -> Option<&str> {
        self.query.as_deref()
    }

    /// The records from the most recent results event. Read-only for
    /// collaborators; replaced wholesale on the next event.
    pub fn results(&self) -> &[ResultRecord] {
        &self.results
    }

    /// The most recent full input text.
    pub fn input_value(&self) -> &str {
        &self.input_value
    }

    /// The engine's scalar options.
    pub fn options(&self) -> &EngineOptions {
        &self.options
    }

    /// The transport behind a remote source, when there is one.
    pub fn transport(&self) -> Option<Arc<dyn Transport>> {
        self.source.transport()
    }

    /// Subscribers for the `clear` event.
    pub fn on_clear(&mut self) -> &mut Relay<ClearPayload> {
        &mut self.on_clear
    }

    /// Subscribers for the `query` event.
    pub fn on_query(&mut self) -> &mut Relay<QueryPayload> {
        &mut self.on_query
    }

    /// Subscribers for the `results` event.
    pub fn on_results(&mut self) -> &mut Relay<ResultsPayload> {
        &mut self.on_results
    }

    /// React to the bound field's value changing.
    ///
    /// Programmatic changes update the tracked input text but never
    /// re-trigger a query. User changes extract the query (the trailing
    /// delimited segment, left-trimmed) and either arm the debounce timer or,
    /// for a non-live query, cancel everything and fire `clear`.
    pub fn notify_input(&mut self, value: &str, origin: InputOrigin) -> Vec<Effect> {
        self.input_value = value.to_string();
        if origin == InputOrigin::Programmatic {
            return Vec::new();
        }

        let query = trailing_segment(value, self.options.query_delimiter.as_deref()).to_string();
        if !self.query_is_live(&query) {
            return self.reset_query();
        }

        self.generation += 1;
        let generation = self.generation;
        self.pending = Some(PendingQuery { query, generation });

        let delay = self.options.query_delay();
        if delay.is_zero() {
            // Zero delay dispatches synchronously with no timer.
            return self.dispatch_pending(generation);
        }
        vec![Effect::DebounceArmed { generation, delay }]
    }

    /// React to the debounce timer firing.
    ///
    /// Fires whose generation no longer matches the pending query are the
    /// cancelled remains of a superseded timer and are ignored.
    pub fn debounce_elapsed(&mut self, generation: u64) -> Vec<Effect> {
        if self.pending.as_ref().is_none_or(|pending| pending.generation != generation) {
            debug!(generation, "debounce fire ignored; timer superseded");
            return Vec::new();
        }
        self.dispatch_pending(generation)
    }

    /// React to a source response arriving for `query` via `request`.
    ///
    /// The response is cached on the adapter first, then checked against the
    /// current query by string equality; two different queries that normalize
    /// to the same string are indistinguishable here. A response is also
    /// accepted when the current query would send the exact same request,
    /// which services a query that was deduplicated against an in-flight
    /// fetch. Stale responses are dropped silently.
    pub fn response_arrived(&mut self, query: &str, request: &str, response: Value) -> Vec<Effect> {
        self.source.complete(request, response.clone());

        let Some(current) = self.current_query_for(query, request) else {
            debug!(query = %query, request = %request, "stale response dropped");
            return Vec::new();
        };
        self.process_response(&current, response)
    }

    /// React to the transport reporting a failure for `query` via `request`.
    ///
    /// The core defines only the success path; this engine surfaces failures
    /// as an empty `results` event for the requesting query (still subject to
    /// the staleness guard) and logs the error. Nothing is cached, so a later
    /// identical request may retry.
    pub fn transport_failed(&mut self, query: &str, request: &str, error: &anyhow::Error) -> Vec<Effect> {
        self.source.fail(request);
        warn!(query = %query, request = %request, error = %error, "transport fetch failed");

        let Some(current) = self.current_query_for(query, request) else {
            return Vec::new();
        };
        self.process_response(&current, Value::Null)
    }

    /// Whether `query` is eligible to dispatch.
    fn query_is_live(&self, query: &str) -> bool {
        let minimum = self.options.min_query_length;
        if minimum < 0 {
            return false;
        }
        query.chars().count() >= minimum as usize
    }

    /// The current query this arrival satisfies, if it is not stale.
    fn current_query_for(&self, query: &str, request: &str) -> Option<String> {
        let current = self.query.as_deref()?;
        if current == query || self.build_request(current) == request {
            return Some(current.to_string());
        }
        None
    }

    fn build_request(&self, query: &str) -> String {
        match &self.request_template {
            Some(template) => template.build(query),
            None => query.to_string(),
        }
    }

    /// Cancel any pending dispatch and fire `clear`. The default action
    /// resets the current query and results.
    fn reset_query(&mut self) -> Vec<Effect> {
        self.pending = None;
        self.generation += 1;

        let payload = ClearPayload {
            previous_query: self.query.clone(),
        };
        let event = self.on_clear.emit(payload.clone());
        if !event.is_default_prevented() {
            self.query = None;
            self.results.clear();
        }
        vec![Effect::Clear(payload)]
    }

    /// Timer-fire transition: record the query as current, fire `query`
    /// synchronously, and hand the request to the source. The default action
    /// of the `query` event is the record-and-dispatch step; preventing it
    /// leaves the engine's query untouched and sends nothing.
    fn dispatch_pending(&mut self, generation: u64) -> Vec<Effect> {
        let Some(pending) = self.pending.take_if(|pending| pending.generation == generation) else {
            return Vec::new();
        };

        let payload = QueryPayload {
            input_value: self.input_value.clone(),
            query: pending.query.clone(),
        };
        let mut effects = vec![Effect::Query(payload.clone())];
        let event = self.on_query.emit(payload);
        if event.is_default_prevented() {
            return effects;
        }

        self.query = Some(pending.query.clone());
        let request = self.build_request(&pending.query);
        debug!(query = %pending.query, request = %request, "dispatching source request");

        match self.source.send_request(&request) {
            SourceReply::Ready(response) => effects.extend(self.process_response(&pending.query, response)),
            SourceReply::Pending(fetch) => {
                if fetch.should_dispatch {
                    effects.push(Effect::FetchRequested {
                        query: pending.query,
                        request: fetch.request,
                    });
                }
            }
        }
        effects
    }

    /// Run the pipeline and fire `results`. The default action stores the
    /// records as the current result set.
    fn process_response(&mut self, query: &str, response: Value) -> Vec<Effect> {
        let payload = self.pipeline.run(query, &response);
        let event = self.on_results.emit(payload.clone());
        if !event.is_default_prevented() {
            self.results = payload.results.clone();
        }
        vec![Effect::Results(payload)]
    }
}
