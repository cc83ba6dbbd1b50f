//! Request-template substitution.
//!
//! A string source or request template carries a `{query}` placeholder that
//! is replaced with the URI-encoded query at dispatch time. Template
//! functions own their encoding; only the string form encodes here.

use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use url::Url;

/// Placeholder replaced with the encoded query.
pub const QUERY_PLACEHOLDER: &str = "{query}";

/// Characters left intact by URI-component encoding.
const QUERY_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

/// Replace every `{query}` occurrence in `template` with the URI-encoded
/// query.
///
/// # Example
/// ```
/// use typeahead_util::template::substitute_query;
///
/// let request = substitute_query("https://example.com/ac?q={query}", "a b");
/// assert_eq!(request, "https://example.com/ac?q=a%20b");
/// ```
pub fn substitute_query(template: &str, query: &str) -> String {
    let encoded = utf8_percent_encode(query, QUERY_ENCODE_SET).to_string();
    template.replace(QUERY_PLACEHOLDER, &encoded)
}

/// Whether a string source looks like a usable request template.
///
/// Accepted forms are absolute URLs (with or without a placeholder) and any
/// string carrying a `{query}` placeholder. Everything else is an unusable
/// source and must surface as a configuration error, not a silent no-op.
pub fn is_url_template(source: &str) -> bool {
    source.contains(QUERY_PLACEHOLDER) || Url::parse(source).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn substitutes_and_encodes_query() {
        assert_eq!(substitute_query("/ac?q={query}", "caf\u{e9} au lait"), "/ac?q=caf%C3%A9%20au%20lait");
    }

    #[test]
    fn substitutes_every_occurrence() {
        assert_eq!(substitute_query("{query}/{query}", "x"), "x/x");
    }

    #[test]
    fn unreserved_marks_pass_through() {
        assert_eq!(substitute_query("q={query}", "a-b_c.d!e~f*g'h(i)"), "q=a-b_c.d!e~f*g'h(i)");
    }

    #[test]
    fn template_without_placeholder_is_returned_verbatim() {
        assert_eq!(substitute_query("https://example.com/fixed", "ignored"), "https://example.com/fixed");
    }

    #[test]
    fn recognizes_url_and_placeholder_templates() {
        assert!(is_url_template("https://example.com/ac?q={query}"));
        assert!(is_url_template("https://example.com/ac"));
        assert!(is_url_template("select * from places where text=\"{query}\""));
        assert!(!is_url_template("not a template"));
    }
}
