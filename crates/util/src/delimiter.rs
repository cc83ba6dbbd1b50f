//! Delimiter handling for query extraction and input commits.
//!
//! With a delimiter configured, only the trailing delimited segment of the
//! input is "the query", and committing a selection replaces only that
//! segment. Without one, the whole input is the query and a commit replaces
//! it outright.

/// Extract the query from raw input text.
///
/// Splits on the delimiter (when present) and takes the trailing segment,
/// left-trimmed.
///
/// # Example
/// ```
/// use typeahead_util::delimiter::trailing_segment;
///
/// assert_eq!(trailing_segment("foo, ba", Some(",")), "ba");
/// assert_eq!(trailing_segment("foo, ba", None), "foo, ba");
/// ```
pub fn trailing_segment<'a>(input: &'a str, delimiter: Option<&str>) -> &'a str {
    let segment = match delimiter.filter(|delim| !delim.is_empty()) {
        Some(delim) => input.rsplit(delim).next().unwrap_or(""),
        None => input,
    };
    segment.trim_start()
}

/// Replace the trailing delimited segment of `input` with `replacement`.
///
/// Preceding segments are trimmed and re-joined with `"<delim> "`, and a
/// trailing `"<delim> "` is appended so the user can continue typing the next
/// entry. Without a delimiter the committed value replaces the input
/// entirely.
///
/// # Example
/// ```
/// use typeahead_util::delimiter::splice_trailing_segment;
///
/// assert_eq!(splice_trailing_segment("foo, ba", Some(","), "bar"), "foo, bar, ");
/// assert_eq!(splice_trailing_segment("ba", None, "bar"), "bar");
/// ```
pub fn splice_trailing_segment(input: &str, delimiter: Option<&str>, replacement: &str) -> String {
    let Some(delim) = delimiter.filter(|delim| !delim.is_empty()) else {
        return replacement.to_string();
    };

    let mut segments: Vec<&str> = input.split(delim).collect();
    segments.pop();

    let mut committed = String::new();
    for segment in segments {
        committed.push_str(segment.trim());
        committed.push_str(delim);
        committed.push(' ');
    }
    committed.push_str(replacement);
    committed.push_str(delim);
    committed.push(' ');
    committed
}
