//! Suggestion sources behind one request interface.
//!
//! The configured source value is a tagged union resolved exactly once, at
//! configuration time, into a [`SourceAdapter`]. Resolution failure yields an
//! explicit [`SourceConfigError`], never a partially-working adapter.
//!
//! The remote variant keeps an in-memory cache keyed by the exact request
//! string, plus in-flight bookkeeping so repeated identical requests never
//! re-hit the transport. The cache is intentionally unbounded and never
//! invalidated within a session: callers with high query cardinality should
//! hold the adapter accordingly.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use serde_json::Value;
use thiserror::Error;
use tracing::debug;
use typeahead_util::template;

/// Contract a remote transport collaborator must satisfy.
///
/// The core only defines the success path: a fetch either yields the raw
/// response value or an error the host decides how to surface. There is no
/// cancellation; superseded fetches are invalidated by the engine's
/// staleness check when their response finally arrives.
pub trait Transport: Send + Sync + fmt::Debug {
    /// Perform the request and return the raw response.
    fn fetch(&self, request: &str) -> anyhow::Result<Value>;
}

/// Errors raised while resolving a source configuration.
#[derive(Debug, Error)]
pub enum SourceConfigError {
    /// No source was configured at all.
    #[error("no suggestion source configured")]
    MissingSource,
    /// A string source that is neither a URL-style template nor a recognized
    /// query template.
    #[error("unusable string source '{0}': expected a URL or a template containing {{query}}")]
    UnusableSource(String),
    /// A template source was supplied without a transport capability to
    /// resolve it against.
    #[error("template source '{0}' requires a transport capability")]
    MissingTransport(String),
}

/// The configured origin of suggestion data.
pub enum SourceConfig {
    /// Static sequence; every request resolves with the full sequence.
    List(Vec<Value>),
    /// Literal query-to-results mapping; exact key match only.
    Map(IndexMap<String, Vec<Value>>),
    /// User-supplied transport already satisfying the request contract.
    Transport(Arc<dyn Transport>),
    /// Template string resolved against an injected transport capability.
    Template {
        /// Request template; must look like a URL or carry `{query}`.
        template: String,
        /// Transport the substituted requests are sent through.
        transport: Option<Arc<dyn Transport>>,
    },
}

impl SourceConfig {
    /// Convenience constructor for the common static string-list mode.
    pub fn from_strings<I, S>(items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::List(items.into_iter().map(|item| Value::String(item.into())).collect())
    }
}

impl fmt::Debug for SourceConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::List(items) => f.debug_tuple("List").field(&items.len()).finish(),
            Self::Map(map) => f.debug_tuple("Map").field(&map.len()).finish(),
            Self::Transport(_) => f.write_str("Transport"),
            Self::Template { template, .. } => f.debug_tuple("Template").field(template).finish(),
        }
    }
}

/// A resolved source plus the request template the source string contributed,
/// if any.
#[derive(Debug)]
pub struct ResolvedSource {
    /// The normalized adapter.
    pub adapter: SourceAdapter,
    /// Template derived from a string source; the engine installs it as the
    /// request template when the host did not configure one explicitly.
    pub derived_template: Option<String>,
}

/// Resolve a [`SourceConfig`] into a normalized adapter.
pub fn resolve_source(config: SourceConfig) -> Result<ResolvedSource, SourceConfigError> {
    match config {
        SourceConfig::List(items) => Ok(ResolvedSource {
            adapter: SourceAdapter::list(items),
            derived_template: None,
        }),
        SourceConfig::Map(map) => Ok(ResolvedSource {
            adapter: SourceAdapter::map(map),
            derived_template: None,
        }),
        SourceConfig::Transport(transport) => Ok(ResolvedSource {
            adapter: SourceAdapter::remote(transport),
            derived_template: None,
        }),
        SourceConfig::Template { template, transport } => {
            if !template::is_url_template(&template) {
                return Err(SourceConfigError::UnusableSource(template));
            }
            let Some(transport) = transport else {
                return Err(SourceConfigError::MissingTransport(template));
            };
            Ok(ResolvedSource {
                adapter: SourceAdapter::remote(transport),
                derived_template: Some(template),
            })
        }
    }
}

/// A fetch the host must perform before results can surface.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct PendingFetch {
    /// Exact request string to hand to the transport.
    pub request: String,
    /// Whether the caller should dispatch a new fetch; `false` when an
    /// identical request is already in flight.
    pub should_dispatch: bool,
}

/// Outcome of handing a request to a source.
#[derive(Debug)]
pub enum SourceReply {
    /// The response is available immediately (static, mapped, or cached).
    Ready(Value),
    /// The response requires a transport round trip.
    Pending(PendingFetch),
}

enum SourceKind {
    List(Vec<Value>),
    Map(IndexMap<String, Vec<Value>>),
    Remote {
        transport: Arc<dyn Transport>,
        cache: HashMap<String, Value>,
        in_flight: HashSet<String>,
    },
}

/// Uniform asynchronous request interface over the configured source.
pub struct SourceAdapter {
    kind: SourceKind,
}

impl SourceAdapter {
    fn list(items: Vec<Value>) -> Self {
        Self {
            kind: SourceKind::List(items),
        }
    }

    fn map(map: IndexMap<String, Vec<Value>>) -> Self {
        Self {
            kind: SourceKind::Map(map),
        }
    }

    fn remote(transport: Arc<dyn Transport>) -> Self {
        Self {
            kind: SourceKind::Remote {
                transport,
                cache: HashMap::new(),
                in_flight: HashSet::new(),
            },
        }
    }

    /// The transport behind a remote source, when there is one.
    pub fn transport(&self) -> Option<Arc<dyn Transport>> {
        match &self.kind {
            SourceKind::Remote { transport, .. } => Some(Arc::clone(transport)),
            _ => None,
        }
    }

    /// Hand a request to the source.
    ///
    /// Static and mapped sources resolve immediately; the full sequence is
    /// returned unfiltered for a list source (filtering is the pipeline's
    /// job), and an exact key match or empty sequence for a map source. A
    /// remote source answers from cache when it can and otherwise reports a
    /// pending fetch.
    pub fn send_request(&mut self, request: &str) -> SourceReply {
        match &mut self.kind {
            SourceKind::List(items) => SourceReply::Ready(Value::Array(items.clone())),
            SourceKind::Map(map) => {
                let results = map.get(request).cloned().unwrap_or_default();
                SourceReply::Ready(Value::Array(results))
            }
            SourceKind::Remote { cache, in_flight, .. } => {
                if let Some(cached) = cache.get(request) {
                    debug!(request = %request, "source cache hit");
                    return SourceReply::Ready(cached.clone());
                }
                let should_dispatch = in_flight.insert(request.to_string());
                debug!(request = %request, should_dispatch, "source cache miss");
                SourceReply::Pending(PendingFetch {
                    request: request.to_string(),
                    should_dispatch,
                })
            }
        }
    }

    /// Record a completed fetch: cache the response and clear the in-flight
    /// mark. No-op for non-remote sources.
    pub fn complete(&mut self, request: &str, response: Value) {
        if let SourceKind::Remote { cache, in_flight, .. } = &mut self.kind {
            in_flight.remove(request);
            cache.insert(request.to_string(), response);
        }
    }

    /// Record a failed fetch: clear the in-flight mark so a later identical
    /// request may retry. Nothing is cached.
    pub fn fail(&mut self, request: &str) {
        if let SourceKind::Remote { in_flight, .. } = &mut self.kind {
            in_flight.remove(request);
        }
    }
}

impl fmt::Debug for SourceAdapter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            SourceKind::List(items) => f.debug_struct("SourceAdapter").field("list_len", &items.len()).finish(),
            SourceKind::Map(map) => f.debug_struct("SourceAdapter").field("map_len", &map.len()).finish(),
            SourceKind::Remote { cache, in_flight, .. } => f
                .debug_struct("SourceAdapter")
                .field("cached", &cache.len())
                .field("in_flight", &in_flight.len())
                .finish(),
        }
    }
}
