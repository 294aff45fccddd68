//! Functional-shape probe: does the source look like a loadable driver?
//!
//! Nothing is loaded or executed. A category counts as present when an
//! identifier containing it is followed by `(` anywhere in the text.

use crate::models::ShapeResult;
use crate::source::SourceText;
use regex::Regex;
use std::collections::BTreeMap;

/// Entry points a module needs to be loaded and unloaded.
pub const LIFECYCLE_ENTRY_POINTS: &[&str] = &["init", "exit"];

/// Default entry-point categories for a character driver.
pub const DEFAULT_ENTRY_POINTS: &[&str] = &["init", "exit", "read", "write"];

fn has_entry_point(text: &str, category: &str) -> bool {
    let pattern = format!(r"\b\w*{}\w*\s*\(", regex::escape(category));
    match Regex::new(&pattern) {
        Ok(re) => re.is_match(text),
        Err(_) => false,
    }
}

/// Probe `source` for the `required` categories plus the lifecycle ones.
pub fn probe_shape(source: &SourceText, compiled: bool, required: &[String]) -> ShapeResult {
    let text = source.as_str();
    let mut entry_points_found = BTreeMap::new();
    for category in required
        .iter()
        .map(String::as_str)
        .chain(LIFECYCLE_ENTRY_POINTS.iter().copied())
    {
        entry_points_found
            .entry(category.to_string())
            .or_insert_with(|| has_entry_point(text, category));
    }
    let module_loadable = compiled
        && LIFECYCLE_ENTRY_POINTS
            .iter()
            .all(|c| entry_points_found.get(*c).copied().unwrap_or(false));
    ShapeResult {
        entry_points_found,
        module_loadable,
    }
}
