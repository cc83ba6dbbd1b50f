//! Leaf helpers shared by the typeahead engine and list crates.
//!
//! Nothing here holds state: path resolution over JSON values, delimiter
//! handling for query extraction and input commits, request-template
//! substitution, and the built-in result filters.

pub mod delimiter;
pub mod filters;
pub mod locator;
pub mod template;

pub use delimiter::{splice_trailing_segment, trailing_segment};
pub use locator::{resolve_path, scalar_to_string};
pub use template::{is_url_template, substitute_query};
