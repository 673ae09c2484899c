//! Filesystem-safe names and search-query cleanup.
//!
//! `safe_filename` folds arbitrary text (accents, ligatures, punctuation)
//! into a stem restricted to ASCII alphanumerics, space, `-` and `_`.
//! `clean_search_title` strips video-platform decorations such as
//! "(Official Video)" before a title is used as a music search query.

mod sanitize;
mod title;

pub use sanitize::{safe_filename, EMPTY_INPUT_NAME, EMPTY_RESULT_NAME};
pub use title::{clean_search_title, is_unavailable_title};
