//! The result-transformation pipeline.
//!
//! Turns a raw source response into the ordered record list carried by a
//! `results` event. Stages run in a fixed order and every stage is optional
//! (absence is identity): list-locate, the filter chain, text-locate,
//! highlight, format, and the cap. No stage re-sorts; relative order is
//! preserved end to end. Missing locators and empty stage output degrade to
//! an empty result list rather than an error.

use std::collections::HashMap;
use std::fmt;

use serde_json::Value;
use typeahead_types::{ResultRecord, ResultsPayload};
use typeahead_util::locator::{resolve_path, scalar_to_string};

/// A list- or text-locator: a dotted path resolved by sequential property
/// lookup, or a custom function.
pub enum Locator {
    /// Dotted path such as `"query.results.place"`.
    Path(String),
    /// Custom extraction function; `None` means "not found".
    Func(Box<dyn Fn(&Value) -> Option<Value> + Send>),
}

impl Locator {
    fn resolve(&self, value: &Value) -> Option<Value> {
        match self {
            Self::Path(path) => resolve_path(value, path),
            Self::Func(locate) => locate(value),
        }
    }
}

impl fmt::Debug for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Path(path) => f.debug_tuple("Path").field(path).finish(),
            Self::Func(_) => f.write_str("Func"),
        }
    }
}

/// One entry in the ordered filter chain.
pub type FilterFn = Box<dyn Fn(&str, Vec<Value>) -> Vec<Value> + Send>;

/// Maps plain-text items to display items; defaults to an identity copy.
pub type HighlightFn = Box<dyn Fn(&str, &[String]) -> Vec<String> + Send>;

/// Final formatting stage; receives the raw, highlighted, and plain-text
/// parallel arrays.
pub type FormatFn = Box<dyn Fn(&str, &[Value], &[String], &[String]) -> Vec<String> + Send>;

/// The configured stage set.
///
/// Built once and owned by the query engine; `run` is a pure function of the
/// query and the raw response.
#[derive(Default)]
pub struct ResultPipeline {
    list_locator: Option<Locator>,
    filters: Vec<FilterFn>,
    text_locator: Option<Locator>,
    highlighter: Option<HighlightFn>,
    formatter: Option<FormatFn>,
    max_results: i32,
}

impl ResultPipeline {
    /// A pipeline with every stage at identity and no cap.
    pub fn new() -> Self {
        Self::default()
    }

    /// Configure the list locator applied to non-array responses.
    pub fn with_list_locator(mut self, locator: Locator) -> Self {
        self.list_locator = Some(locator);
        self
    }

    /// Append a filter to the ordered chain.
    pub fn with_filter<F>(mut self, filter: F) -> Self
    where
        F: Fn(&str, Vec<Value>) -> Vec<Value> + Send + 'static,
    {
        self.filters.push(Box::new(filter));
        self
    }

    /// Configure the per-item text locator.
    pub fn with_text_locator(mut self, locator: Locator) -> Self {
        self.text_locator = Some(locator);
        self
    }

    /// Configure the highlighter.
    pub fn with_highlighter<F>(mut self, highlighter: F) -> Self
    where
        F: Fn(&str, &[String]) -> Vec<String> + Send + 'static,
    {
        self.highlighter = Some(Box::new(highlighter));
        self
    }

    /// Configure the formatter.
    pub fn with_formatter<F>(mut self, formatter: F) -> Self
    where
        F: Fn(&str, &[Value], &[String], &[String]) -> Vec<String> + Send + 'static,
    {
        self.formatter = Some(Box::new(formatter));
        self
    }

    /// Cap emitted records when positive; zero or negative means unlimited.
    pub fn with_max_results(mut self, max_results: i32) -> Self {
        self.max_results = max_results;
        self
    }

    pub(crate) fn set_max_results(&mut self, max_results: i32) {
        self.max_results = max_results;
    }

    /// Run the staged transformation for one response.
    pub fn run(&self, query: &str, response: &Value) -> ResultsPayload {
        let data = response.clone();

        let Some(mut items) = self.locate_list(response) else {
            return empty_payload(query, data);
        };

        // Ordered filter chain; an empty result stops the chain and later
        // filters are skipped, not applied to empty input.
        for filter in &self.filters {
            items = filter(query, items);
            if items.is_empty() {
                return empty_payload(query, data);
            }
        }

        // Text projection plus the text-to-original backmap. Collisions are
        // last-write-wins: distinct items sharing a text overwrite earlier
        // entries, so every record with that text carries the last item.
        let mut texts = Vec::with_capacity(items.len());
        let mut raw_lookup: HashMap<String, Value> = HashMap::with_capacity(items.len());
        for item in &items {
            let text = match &self.text_locator {
                Some(locator) => locator.resolve(item).map(|value| scalar_to_string(&value)).unwrap_or_default(),
                None => scalar_to_string(item),
            };
            raw_lookup.insert(text.clone(), item.clone());
            texts.push(text);
        }

        let highlighted = match &self.highlighter {
            Some(highlight) => highlight(query, &texts),
            None => texts.clone(),
        };

        let formatted = match &self.formatter {
            Some(format) => format(query, &items, &highlighted, &texts),
            None => highlighted,
        };

        // Cap: min(max_results, formatted.len()), additionally bounded by the
        // text array so a length-changing formatter cannot run past it.
        let mut len = formatted.len().min(texts.len());
        if self.max_results > 0 {
            len = len.min(self.max_results as usize);
        }

        let mut results = Vec::with_capacity(len);
        for index in 0..len {
            let text = texts[index].clone();
            let raw = raw_lookup.get(&text).cloned().unwrap_or(Value::Null);
            results.push(ResultRecord {
                display: formatted[index].clone(),
                raw,
                text,
            });
        }

        ResultsPayload {
            query: query.to_string(),
            data,
            results,
        }
    }

    /// Stage 1: extract the item array from the response.
    ///
    /// Array responses pass through untouched. Non-array responses go through
    /// the list locator; no locator or a non-array locator result
    /// short-circuits to `None` and the pipeline emits an empty list.
    fn locate_list(&self, response: &Value) -> Option<Vec<Value>> {
        if let Value::Array(items) = response {
            return Some(items.clone());
        }
        let located = self.list_locator.as_ref()?.resolve(response)?;
        match located {
            Value::Array(items) => Some(items),
            _ => None,
        }
    }
}

impl fmt::Debug for ResultPipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResultPipeline")
            .field("list_locator", &self.list_locator)
            .field("filters", &self.filters.len())
            .field("text_locator", &self.text_locator)
            .field("highlighter", &self.highlighter.is_some())
            .field("formatter", &self.formatter.is_some())
            .field("max_results", &self.max_results)
            .finish()
    }
}

fn empty_payload(query: &str, data: Value) -> ResultsPayload {
    ResultsPayload {
        query: query.to_string(),
        data,
        results: Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    #[test]
    fn identity_pipeline_turns_strings_into_records() {
        let pipeline = ResultPipeline::new();
        let payload = pipeline.run("ap", &json!(["apple", "apricot"]));

        assert_eq!(payload.query, "ap");
        assert_eq!(payload.data, json!(["apple", "apricot"]));
        assert_eq!(payload.results.len(), 2);
        assert_eq!(payload.results[0].text, "apple");
        assert_eq!(payload.results[0].display, "apple");
        assert_eq!(payload.results[0].raw, json!("apple"));
    }

    #[test]
    fn non_array_response_without_locator_is_empty() {
        let pipeline = ResultPipeline::new();
        let payload = pipeline.run("q", &json!({"rows": ["a"]}));
        assert!(payload.results.is_empty());
        assert_eq!(payload.data, json!({"rows": ["a"]}));
    }

    #[test]
    fn list_locator_extracts_from_nested_response() {
        let pipeline = ResultPipeline::new().with_list_locator(Locator::Path("query.results".into()));
        let payload = pipeline.run("q", &json!({"query": {"results": ["a", "b"]}}));
        assert_eq!(payload.results.len(), 2);

        // Missing path short-circuits to empty, not an error.
        let payload = pipeline.run("q", &json!({"query": {}}));
        assert!(payload.results.is_empty());
    }

    #[test]
    fn item_removed_by_first_filter_never_reaches_later_stages() {
        let seen_by_second = Arc::new(Mutex::new(Vec::new()));
        let log = Arc::clone(&seen_by_second);
        let pipeline = ResultPipeline::new()
            .with_filter(|query, items| {
                items
                    .into_iter()
                    .filter(|item| scalar_to_string(item).starts_with(query))
                    .collect()
            })
            .with_filter(move |_, items| {
                let mut log = log.lock().expect("log lock");
                for item in &items {
                    log.push(scalar_to_string(item));
                }
                items
            });

        let payload = pipeline.run("ap", &json!(["apple", "banana", "apricot"]));
        assert_eq!(payload.results.len(), 2);
        assert_eq!(*seen_by_second.lock().expect("log lock"), vec!["apple", "apricot"]);
    }

    #[test]
    fn empty_filter_output_stops_the_chain() {
        static LATER_CALLS: AtomicUsize = AtomicUsize::new(0);
        let pipeline = ResultPipeline::new().with_filter(|_, _| Vec::new()).with_filter(|_, items| {
            LATER_CALLS.fetch_add(1, Ordering::SeqCst);
            items
        });

        let payload = pipeline.run("q", &json!(["a", "b"]));
        assert!(payload.results.is_empty());
        assert_eq!(LATER_CALLS.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn cap_truncates_in_original_relative_order() {
        let pipeline = ResultPipeline::new().with_max_results(2);
        let payload = pipeline.run("q", &json!(["a", "b", "c", "d", "e"]));
        let texts: Vec<&str> = payload.results.iter().map(|record| record.text.as_str()).collect();
        assert_eq!(texts, vec!["a", "b"]);
    }

    #[test]
    fn zero_or_negative_cap_means_unlimited() {
        let five = json!(["a", "b", "c", "d", "e"]);
        assert_eq!(ResultPipeline::new().with_max_results(0).run("q", &five).results.len(), 5);
        assert_eq!(ResultPipeline::new().with_max_results(-3).run("q", &five).results.len(), 5);
    }

    #[test]
    fn text_locator_projects_structured_items() {
        let pipeline = ResultPipeline::new().with_text_locator(Locator::Path("name".into()));
        let payload = pipeline.run("q", &json!([{"name": "alpha", "id": 1}, {"name": "beta", "id": 2}]));

        assert_eq!(payload.results[0].text, "alpha");
        assert_eq!(payload.results[0].raw, json!({"name": "alpha", "id": 1}));
        assert_eq!(payload.results[1].text, "beta");
    }

    #[test]
    fn text_collisions_are_last_write_wins() {
        // Two distinct items share the text "dup"; both records carry the
        // later item's raw value. This reproduces the backmap contract and
        // must not be "fixed" by deduplicating on identity.
        let pipeline = ResultPipeline::new().with_text_locator(Locator::Path("name".into()));
        let payload = pipeline.run("q", &json!([{"name": "dup", "id": 1}, {"name": "dup", "id": 2}]));

        assert_eq!(payload.results.len(), 2);
        assert_eq!(payload.results[0].raw, json!({"name": "dup", "id": 2}));
        assert_eq!(payload.results[1].raw, json!({"name": "dup", "id": 2}));
    }

    #[test]
    fn highlighter_sees_text_and_formatter_sees_all_three_views() {
        let pipeline = ResultPipeline::new()
            .with_text_locator(Locator::Path("name".into()))
            .with_highlighter(|query, texts| texts.iter().map(|text| text.replace(query, &format!("[{query}]"))).collect())
            .with_formatter(|_, raw, highlighted, texts| {
                raw.iter()
                    .zip(highlighted)
                    .zip(texts)
                    .map(|((item, shown), text)| format!("{shown} ({text}, id {})", item["id"]))
                    .collect()
            });

        let payload = pipeline.run("al", &json!([{"name": "alpha", "id": 7}]));
        assert_eq!(payload.results[0].display, "[al]pha (alpha, id 7)");
        assert_eq!(payload.results[0].text, "alpha");
    }

    #[test]
    fn shortening_formatter_bounds_the_zip() {
        let pipeline = ResultPipeline::new().with_formatter(|_, _, highlighted, _| highlighted.iter().take(1).cloned().collect());
        let payload = pipeline.run("q", &json!(["a", "b", "c"]));
        assert_eq!(payload.results.len(), 1);
        assert_eq!(payload.results[0].text, "a");
    }

    #[test]
    fn lengthening_formatter_cannot_run_past_the_items() {
        let pipeline = ResultPipeline::new().with_formatter(|_, _, highlighted, _| {
            let mut out = highlighted.to_vec();
            out.push("phantom".into());
            out
        });
        let payload = pipeline.run("q", &json!(["a"]));
        assert_eq!(payload.results.len(), 1);
    }

    #[test]
    fn custom_function_locators_are_honored() {
        let pipeline = ResultPipeline::new()
            .with_list_locator(Locator::Func(Box::new(|response| response.get("wrapped").cloned())))
            .with_text_locator(Locator::Func(Box::new(|item| item.get(0).cloned())));
        let payload = pipeline.run("q", &json!({"wrapped": [["inner", 1]]}));
        assert_eq!(payload.results[0].text, "inner");
    }
}
