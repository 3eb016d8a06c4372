//! Chat title derivation.
//!
//! A chat keeps the placeholder title until its first message, at
//! which point the title is fixed from that message's first line and
//! only an explicit rename changes it afterwards.

use crate::data::models::PLACEHOLDER_TITLE;

/// Titles longer than this get truncated
const TITLE_LIMIT: usize = 48;
/// Characters kept when truncating, before the ellipsis marker
const TITLE_KEEP: usize = 45;

/// Derive a display title from message text.
///
/// Takes the first non-empty line; when it runs past 48 characters it
/// is cut to 45 plus `...`. Blank input yields the placeholder.
pub fn derive_title(text: &str) -> String {
    let first_line = text.lines().map(str::trim).find(|l| !l.is_empty());
    let Some(line) = first_line else {
        return PLACEHOLDER_TITLE.to_string();
    };

    if line.chars().count() > TITLE_LIMIT {
        let mut title: String = line.chars().take(TITLE_KEEP).collect();
        title.push_str("...");
        title
    } else {
        line.to_string()
    }
}
