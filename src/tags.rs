//! Tag-set algebra for batch tag updates.
//!
//! Pure functions: the store applies these to a batch of annotations and
//! sends the result to the server in a single update call. Replacing tags
//! needs no helper, it is a plain overwrite at the call site.

use std::collections::HashSet;

/// Union of `existing` and `new_tags`, duplicate-free.
///
/// Relative order of existing tags is preserved; new tags are appended in
/// input order.
pub fn add_tags(existing: &[String], new_tags: &[String]) -> Vec<String> {
    let mut seen: HashSet<&str> = HashSet::with_capacity(existing.len() + new_tags.len());
    let mut result = Vec::with_capacity(existing.len() + new_tags.len());
    for tag in existing.iter().chain(new_tags) {
        if seen.insert(tag.as_str()) {
            result.push(tag.clone());
        }
    }
    result
}

/// `existing` minus `remove`, order preserved. Removing a tag that is not
/// present is a no-op.
pub fn remove_tags(existing: &[String], remove: &[String]) -> Vec<String> {
    let removing: HashSet<&str> = remove.iter().map(String::as_str).collect();
    existing
        .iter()
        .filter(|tag| !removing.contains(tag.as_str()))
        .cloned()
        .collect()
}
