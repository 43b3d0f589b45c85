use std::collections::HashMap;

use super::detection::Detection;

/// Raw class label -> number of detections with that label.
pub type Inventory = HashMap<String, u32>;

pub const NO_OBJECTS_WARNING: &str =
    "No objects found. Try lowering the 'Strictness' in the sidebar.";

pub fn summarize(detections: &[Detection]) -> Inventory {
    let mut counts = Inventory::new();
    for det in detections {
        *counts.entry(det.label.clone()).or_insert(0) += 1;
    }
    counts
}

/// One "<count> <Label>" line per class, most frequent first.
pub fn report_lines(inventory: &Inventory) -> Vec<String> {
    let mut entries: Vec<_> = inventory.iter().collect();
    entries.sort_by(|(la, ca), (lb, cb)| cb.cmp(ca).then_with(|| la.cmp(lb)));
    entries
        .into_iter()
        .map(|(label, count)| format!("{} {}", count, capitalize(label)))
        .collect()
}

/// Upper-cases the first character and lower-cases the rest.
pub fn capitalize(label: &str) -> String {
    let mut chars = label.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}
