//! End-to-end wiring of the query engine and the list controller, the way a
//! host binds them: engine effects are forwarded to the controller, and a
//! committed selection is written back into the input as a programmatic
//! change.

use typeahead_engine::{QueryEngine, SourceConfig};
use typeahead_list::{Key, ListController, ListOptions};
use typeahead_types::{Effect, EngineOptions, InputOrigin};
use typeahead_util::filters;

struct Host {
    engine: QueryEngine,
    list: ListController,
    input: String,
}

impl Host {
    fn new(engine: QueryEngine, list: ListController) -> Self {
        Self {
            engine,
            list,
            input: String::new(),
        }
    }

    fn type_text(&mut self, value: &str) {
        self.input = value.to_string();
        let effects = self.engine.notify_input(value, InputOrigin::User);
        self.forward(effects);
    }

    fn fire_debounce(&mut self, generation: u64) {
        let effects = self.engine.debounce_elapsed(generation);
        self.forward(effects);
    }

    fn forward(&mut self, effects: Vec<Effect>) {
        for effect in effects {
            match effect {
                Effect::Results(payload) => self.list.handle_results(&payload),
                Effect::Clear(payload) => self.list.handle_clear(&payload),
                _ => {}
            }
        }
    }

    fn press(&mut self, key: Key) {
        if let Some(selection) = self.list.handle_key(key, &self.input).selection
            && let Some(committed) = selection.committed_value
        {
            self.input = committed;
            let effects = self.engine.notify_input(&self.input, InputOrigin::Programmatic);
            self.forward(effects);
        }
    }
}

fn client_side_host(engine_options: EngineOptions, list_options: ListOptions) -> Host {
    let engine = QueryEngine::builder()
        .options(engine_options)
        .source(SourceConfig::from_strings(["apple", "apricot", "banana"]))
        .filter(filters::starts_with)
        .build()
        .expect("engine");
    Host::new(engine, ListController::new(list_options))
}

#[test]
fn prefix_query_activates_first_item_automatically() {
    let mut host = client_side_host(
        EngineOptions {
            query_delay_ms: 0,
            ..EngineOptions::default()
        },
        ListOptions {
            activate_first_item: true,
            ..ListOptions::default()
        },
    );

    host.type_text("ap");

    let texts: Vec<&str> = host.list.items().iter().map(|item| item.record.text.as_str()).collect();
    assert_eq!(texts, vec!["apple", "apricot"]);
    assert_eq!(host.list.active_index(), Some(0));
    assert!(host.list.is_visible());
}

#[test]
fn selection_commits_text_and_does_not_retrigger() {
    let mut host = client_side_host(
        EngineOptions {
            query_delay_ms: 0,
            ..EngineOptions::default()
        },
        ListOptions {
            activate_first_item: true,
            ..ListOptions::default()
        },
    );

    host.type_text("ap");
    host.press(Key::Enter);

    // The committed value replaced the input; the programmatic write-back
    // left the engine's query and the item set untouched.
    assert_eq!(host.input, "apple");
    assert_eq!(host.engine.input_value(), "apple");
    assert_eq!(host.engine.query(), Some("ap"));
    assert_eq!(host.list.items().len(), 2);
    assert!(!host.list.is_visible());
}

#[test]
fn debounced_flow_only_renders_the_last_burst_query() {
    let mut host = client_side_host(
        EngineOptions::default(),
        ListOptions {
            activate_first_item: true,
            ..ListOptions::default()
        },
    );

    host.type_text("b");
    host.type_text("ba");
    host.type_text("ban");
    // Generations 1 and 2 were superseded; only the third timer is live.
    host.fire_debounce(1);
    host.fire_debounce(2);
    assert!(host.list.items().is_empty());

    host.fire_debounce(3);
    let texts: Vec<&str> = host.list.items().iter().map(|item| item.record.text.as_str()).collect();
    assert_eq!(texts, vec!["banana"]);
}

#[test]
fn delimited_selection_splices_only_the_trailing_segment() {
    let engine = QueryEngine::builder()
        .options(EngineOptions {
            query_delay_ms: 0,
            query_delimiter: Some(",".into()),
            ..EngineOptions::default()
        })
        .source(SourceConfig::from_strings(["bar", "baz"]))
        .filter(filters::starts_with)
        .build()
        .expect("engine");
    let list = ListController::new(ListOptions {
        activate_first_item: true,
        query_delimiter: Some(",".into()),
        ..ListOptions::default()
    });
    let mut host = Host::new(engine, list);

    host.type_text("foo, ba");
    assert_eq!(host.engine.query(), Some("ba"));

    host.press(Key::Enter);
    assert_eq!(host.input, "foo, bar, ");
}
