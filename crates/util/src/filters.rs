//! Built-in result filters.
//!
//! Each filter has the `(query, items) -> items` shape the pipeline's filter
//! chain expects and preserves relative order. Matching is case-insensitive
//! and runs against the plain-text form of each item, so the filters work for
//! string items and for structured items alike.

use serde_json::Value;

use crate::locator::scalar_to_string;

fn lowercase(text: &str) -> String {
    text.chars().flat_map(|c| c.to_lowercase()).collect()
}

fn item_text(item: &Value) -> String {
    lowercase(&scalar_to_string(item))
}

/// Keep items whose text starts with the query.
pub fn starts_with(query: &str, items: Vec<Value>) -> Vec<Value> {
    let needle = lowercase(query);
    items.into_iter().filter(|item| item_text(item).starts_with(&needle)).collect()
}

/// Keep items whose text contains the query as a substring.
pub fn phrase_match(query: &str, items: Vec<Value>) -> Vec<Value> {
    let needle = lowercase(query);
    items.into_iter().filter(|item| item_text(item).contains(&needle)).collect()
}

/// Keep items whose text contains every query character in order.
pub fn char_match(query: &str, items: Vec<Value>) -> Vec<Value> {
    let needle: Vec<char> = lowercase(query).chars().collect();
    items
        .into_iter()
        .filter(|item| is_subsequence(&needle, &item_text(item)))
        .collect()
}

/// In-order subsequence scan, one pass over the haystack.
fn is_subsequence(needle: &[char], hay: &str) -> bool {
    let mut pending = needle.iter();
    let mut next = pending.next();
    for c in hay.chars() {
        match next {
            Some(&expected) if expected == c => next = pending.next(),
            Some(_) => {}
            None => break,
        }
    }
    next.is_none()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn fruit() -> Vec<Value> {
        vec![json!("Apple"), json!("apricot"), json!("banana")]
    }

    #[test]
    fn starts_with_is_case_insensitive_and_order_preserving() {
        let kept = starts_with("ap", fruit());
        assert_eq!(kept, vec![json!("Apple"), json!("apricot")]);
    }

    #[test]
    fn phrase_match_finds_substrings() {
        let kept = phrase_match("ana", fruit());
        assert_eq!(kept, vec![json!("banana")]);
    }

    #[test]
    fn char_match_requires_in_order_characters() {
        let kept = char_match("act", fruit());
        assert_eq!(kept, vec![json!("apricot")]);

        let none = char_match("tca", fruit());
        assert!(none.is_empty());
    }

    #[test]
    fn empty_query_keeps_everything() {
        assert_eq!(starts_with("", fruit()).len(), 3);
        assert_eq!(phrase_match("", fruit()).len(), 3);
        assert_eq!(char_match("", fruit()).len(), 3);
    }

    #[test]
    fn non_string_items_filter_on_their_text_form() {
        let items = vec![json!(42), json!(47), json!("420")];
        let kept = starts_with("4", items);
        assert_eq!(kept, vec![json!(42), json!(47), json!("420")]);

        let kept = starts_with("42", vec![json!(42), json!(47), json!("420")]);
        assert_eq!(kept, vec![json!(42), json!("420")]);
    }
}
