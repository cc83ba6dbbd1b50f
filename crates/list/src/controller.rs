//! The list controller state machine.

use tracing::debug;
use typeahead_types::{ClearPayload, Key, ListOptions, Relay, ResultRecord, ResultsPayload, SelectPayload};
use typeahead_util::delimiter::splice_trailing_segment;

/// A rendering-layer wrapper bound 1:1 to a result record.
///
/// Carries the transient UI flags: at most one item is active and at most one
/// is hovered at any time.
#[derive(Clone, Debug, PartialEq)]
pub struct ListItem {
    /// The bound record.
    pub record: ResultRecord,
    /// Navigation cursor flag.
    pub active: bool,
    /// Pointer cursor flag.
    pub hovered: bool,
}

impl ListItem {
    fn new(record: ResultRecord) -> Self {
        Self {
            record,
            active: false,
            hovered: false,
        }
    }
}

/// Outcome of a committed selection.
#[derive(Clone, Debug, PartialEq)]
pub struct Selection {
    /// The payload the `select` event carried.
    pub payload: SelectPayload,
    /// The new full input value after the delimiter splice; `None` when a
    /// subscriber prevented the default commit.
    pub committed_value: Option<String>,
}

/// Outcome of feeding one key into the controller.
#[derive(Debug, Default)]
pub struct KeyOutcome {
    /// Whether the key was handled; handled keys suppress the input field's
    /// default handling, unhandled keys pass through untouched.
    pub handled: bool,
    /// A selection committed by this key, if any.
    pub selection: Option<Selection>,
}

impl KeyOutcome {
    fn handled() -> Self {
        Self {
            handled: true,
            selection: None,
        }
    }

    fn pass() -> Self {
        Self::default()
    }

    fn from_selection(selection: Option<Selection>) -> Self {
        match selection {
            Some(selection) => Self {
                handled: true,
                selection: Some(selection),
            },
            None => Self::pass(),
        }
    }
}

/// State machine over the ordered item set. See the crate docs.
#[derive(Debug)]
pub struct ListController {
    options: ListOptions,
    items: Vec<ListItem>,
    active: Option<usize>,
    hovered: Option<usize>,
    visible: bool,
    pointer_over_list: bool,
    last_key_was_tab: bool,
    on_select: Relay<SelectPayload>,
}

impl ListController {
    /// Create a controller with the given options and an empty item set.
    pub fn new(options: ListOptions) -> Self {
        let visible = options.always_show_list;
        Self {
            options,
            items: Vec::new(),
            active: None,
            hovered: None,
            visible,
            pointer_over_list: false,
            last_key_was_tab: false,
            on_select: Relay::new(),
        }
    }

    // ===== Selectors =====

    /// The current item set, in result order.
    pub fn items(&self) -> &[ListItem] {
        &self.items
    }

    /// Index of the active item, if any.
    pub fn active_index(&self) -> Option<usize> {
        self.active
    }

    /// The record bound to the active item, if any.
    pub fn active_record(&self) -> Option<&ResultRecord> {
        self.active.map(|index| &self.items[index].record)
    }

    /// Index of the hovered item, if any.
    pub fn hovered_index(&self) -> Option<usize> {
        self.hovered
    }

    /// Whether the list is currently visible.
    pub fn is_visible(&self) -> bool {
        self.visible
    }

    /// Subscribers for the `select` event.
    pub fn on_select(&mut self) -> &mut Relay<SelectPayload> {
        &mut self.on_select
    }

    // ===== Event consumption =====

    /// Replace the entire item set from a `results` event.
    ///
    /// Pointers reset with the replacement; with `activate_first_item` set
    /// and results present, index 0 becomes active. Unless `always_show_list`
    /// is set, visibility follows whether any results arrived.
    pub fn handle_results(&mut self, payload: &ResultsPayload) {
        self.items = payload.results.iter().cloned().map(ListItem::new).collect();
        self.active = None;
        self.hovered = None;
        if self.options.activate_first_item && !self.items.is_empty() {
            self.set_active(Some(0));
        }
        if !self.options.always_show_list {
            self.visible = !self.items.is_empty();
        }
        debug!(count = self.items.len(), visible = self.visible, "result list replaced");
    }

    /// Replace the item set with nothing from a `clear` event.
    pub fn handle_clear(&mut self, _payload: &ClearPayload) {
        self.items.clear();
        self.active = None;
        self.hovered = None;
        if !self.options.always_show_list {
            self.visible = false;
        }
    }

    // ===== Navigation =====

    /// Move the active pointer to the next item.
    ///
    /// While nothing is active the cursor rests on the first item, so the
    /// first move activates index 1; on a circular three-item list three
    /// moves return to index 0. At the end of a non-circular list the active
    /// pointer stays unchanged, it is not cleared.
    pub fn move_next(&mut self) {
        if self.items.is_empty() {
            return;
        }
        let current = self.active.unwrap_or(0);
        let next = if current + 1 < self.items.len() {
            current + 1
        } else if self.options.circular {
            0
        } else {
            current
        };
        self.set_active(Some(next));
    }

    /// Move the active pointer to the previous item. The counterpart of
    /// [`move_next`](Self::move_next): from no-active-item a circular list
    /// wraps to the last item, a non-circular one activates index 0.
    pub fn move_prev(&mut self) {
        if self.items.is_empty() {
            return;
        }
        let current = self.active.unwrap_or(0);
        let prev = if current > 0 {
            current - 1
        } else if self.options.circular {
            self.items.len() - 1
        } else {
            current
        };
        self.set_active(Some(prev));
    }

    fn set_active(&mut self, index: Option<usize>) {
        if let Some(previous) = self.active.take() {
            self.items[previous].active = false;
        }
        if let Some(index) = index
            && index < self.items.len()
        {
            self.items[index].active = true;
            self.active = Some(index);
        }
    }

    /// Move the hover pointer; `None` or an out-of-range target clears it.
    pub fn set_hovered(&mut self, target: Option<usize>) {
        if let Some(previous) = self.hovered.take() {
            self.items[previous].hovered = false;
        }
        if let Some(index) = target
            && index < self.items.len()
        {
            self.items[index].hovered = true;
            self.hovered = Some(index);
        }
    }

    /// Track whether the pointer is over the list region, for the blur rule.
    pub fn set_pointer_over_list(&mut self, over: bool) {
        self.pointer_over_list = over;
        if !over {
            self.set_hovered(None);
        }
    }

    // ===== Selection =====

    /// Commit the active item, if there is one.
    ///
    /// Fires the `select` event carrying the bound record. The default
    /// action computes the new input value by splicing the record's text over
    /// the trailing delimited segment of `input_value`, and hides the list
    /// unless `always_show_list` is set. A subscriber may prevent the
    /// default, in which case the list stays as it is and
    /// `committed_value` is `None`.
    pub fn select_active(&mut self, input_value: &str) -> Option<Selection> {
        let index = self.active?;
        let payload = SelectPayload {
            index,
            record: self.items[index].record.clone(),
        };
        let event = self.on_select.emit(payload.clone());
        let committed_value = if event.is_default_prevented() {
            None
        } else {
            if !self.options.always_show_list {
                self.visible = false;
            }
            Some(splice_trailing_segment(
                input_value,
                self.options.query_delimiter.as_deref(),
                &payload.record.text,
            ))
        };
        Some(Selection { payload, committed_value })
    }

    /// Pointer-click equivalent of [`select_active`](Self::select_active).
    /// Clicks outside the item region (`None` or out of range) are ignored.
    pub fn select_by_pointer(&mut self, target: Option<usize>, input_value: &str) -> Option<Selection> {
        let index = target?;
        if index >= self.items.len() {
            return None;
        }
        self.set_active(Some(index));
        self.select_active(input_value)
    }

    // ===== Keyboard and focus =====

    /// Feed one abstract key into the controller.
    ///
    /// DOWN activates the next item and shows the list if it was hidden while
    /// results exist; UP activates the previous item; ENTER commits the
    /// active item; ESCAPE hides a visible list; TAB commits only when
    /// `tab_select` is enabled and an item is active, and is otherwise not
    /// intercepted. Unhandled keys pass through untouched.
    pub fn handle_key(&mut self, key: Key, input_value: &str) -> KeyOutcome {
        let outcome = match key {
            Key::Down => {
                if self.items.is_empty() {
                    KeyOutcome::pass()
                } else {
                    self.visible = true;
                    self.move_next();
                    KeyOutcome::handled()
                }
            }
            Key::Up => {
                if self.items.is_empty() {
                    KeyOutcome::pass()
                } else {
                    self.move_prev();
                    KeyOutcome::handled()
                }
            }
            Key::Enter => KeyOutcome::from_selection(self.select_active(input_value)),
            Key::Escape => {
                if self.visible {
                    self.hide();
                    KeyOutcome::handled()
                } else {
                    KeyOutcome::pass()
                }
            }
            Key::Tab => {
                if self.options.tab_select && self.active.is_some() {
                    KeyOutcome::from_selection(self.select_active(input_value))
                } else {
                    KeyOutcome::pass()
                }
            }
            Key::Other => KeyOutcome::pass(),
        };
        self.last_key_was_tab = matches!(key, Key::Tab);
        outcome
    }

    /// React to the bound input losing focus.
    ///
    /// The list stays visible when the pointer is over it (a mouse-driven
    /// selection is in progress) or when the last key was Tab (normal
    /// tab-order navigation); otherwise it hides.
    pub fn handle_blur(&mut self) {
        if self.pointer_over_list || self.last_key_was_tab {
            return;
        }
        self.hide();
    }

    /// Hide the list. Explicit hides apply even with `always_show_list`,
    /// which only guards automatic hiding.
    pub fn hide(&mut self) {
        self.visible = false;
    }
}
