//! The imperative shell around the query engine.
//!
//! The engine's state transitions are pure and return effects; this driver
//! executes them on tokio. It owns the single debounce task handle, aborting
//! it whenever a fresh timer is armed, and runs transport fetches on the
//! blocking pool, feeding timer fires and fetch outcomes back into the engine
//! over a channel. Superseding queries never abort an in-flight fetch; its
//! eventual outcome is invalidated by the engine's staleness check instead.

use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::warn;
use typeahead_types::{Effect, InputOrigin};

use crate::query::QueryEngine;
use crate::source::Transport;

enum DriverMsg {
    DebounceElapsed(u64),
    FetchDone {
        query: String,
        request: String,
        outcome: anyhow::Result<Value>,
    },
}

struct DebounceTask {
    generation: u64,
    handle: JoinHandle<()>,
}

/// Tokio-backed driver owning an engine and its scheduled work.
pub struct EngineDriver {
    engine: QueryEngine,
    transport: Option<Arc<dyn Transport>>,
    messages_tx: mpsc::UnboundedSender<DriverMsg>,
    messages_rx: mpsc::UnboundedReceiver<DriverMsg>,
    debounce: Option<DebounceTask>,
}

impl EngineDriver {
    /// Wrap an engine. The transport, when the source has one, is taken from
    /// the engine's resolved source.
    pub fn new(engine: QueryEngine) -> Self {
        let (messages_tx, messages_rx) = mpsc::unbounded_channel();
        let transport = engine.transport();
        Self {
            engine,
            transport,
            messages_tx,
            messages_rx,
            debounce: None,
        }
    }

    /// Borrow the engine, e.g. to read the current results.
    pub fn engine(&self) -> &QueryEngine {
        &self.engine
    }

    /// Mutably borrow the engine, e.g. to subscribe to its events.
    pub fn engine_mut(&mut self) -> &mut QueryEngine {
        &mut self.engine
    }

    /// Forward an input change and execute the resulting effects. Returns
    /// the lifecycle effects for the host to hand to its collaborators.
    pub fn notify_input(&mut self, value: &str, origin: InputOrigin) -> Vec<Effect> {
        let effects = self.engine.notify_input(value, origin);
        self.execute(effects)
    }

    /// Await the next timer fire or fetch completion, feed it into the
    /// engine, and return the resulting lifecycle effects. The returned list
    /// is empty when the signal turned out to be superseded.
    pub async fn next_effects(&mut self) -> Vec<Effect> {
        // The receiver cannot close while we hold a sender clone.
        let Some(message) = self.messages_rx.recv().await else {
            return Vec::new();
        };
        let effects = match message {
            DriverMsg::DebounceElapsed(generation) => {
                if self.debounce.as_ref().is_some_and(|task| task.generation == generation) {
                    self.debounce = None;
                }
                self.engine.debounce_elapsed(generation)
            }
            DriverMsg::FetchDone { query, request, outcome } => match outcome {
                Ok(response) => self.engine.response_arrived(&query, &request, response),
                Err(error) => self.engine.transport_failed(&query, &request, &error),
            },
        };
        self.execute(effects)
    }

    /// Execute scheduling effects, passing lifecycle effects through.
    fn execute(&mut self, effects: Vec<Effect>) -> Vec<Effect> {
        let mut lifecycle = Vec::with_capacity(effects.len());
        for effect in effects {
            match effect {
                Effect::DebounceArmed { generation, delay } => self.arm_debounce(generation, delay),
                Effect::FetchRequested { query, request } => self.spawn_fetch(query, request),
                other => lifecycle.push(other),
            }
        }
        lifecycle
    }

    /// Arm the debounce timer, aborting any outstanding one. The engine also
    /// ignores fires from superseded generations, so the abort is an
    /// optimization rather than the correctness boundary.
    fn arm_debounce(&mut self, generation: u64, delay: Duration) {
        if let Some(previous) = self.debounce.take() {
            previous.handle.abort();
        }
        let sender = self.messages_tx.clone();
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let _ = sender.send(DriverMsg::DebounceElapsed(generation));
        });
        self.debounce = Some(DebounceTask { generation, handle });
    }

    /// Run a transport fetch on the blocking pool.
    fn spawn_fetch(&mut self, query: String, request: String) {
        let Some(transport) = self.transport.clone() else {
            warn!(request = %request, "fetch requested but no transport is attached");
            return;
        };
        let sender = self.messages_tx.clone();
        tokio::task::spawn_blocking(move || {
            let outcome = transport.fetch(&request);
            let _ = sender.send(DriverMsg::FetchDone { query, request, outcome });
        });
    }
}

impl Drop for EngineDriver {
    fn drop(&mut self) {
        if let Some(task) = self.debounce.take() {
            task.handle.abort();
        }
    }
}
