//! Element label storage.
//!
//! Labels map `(ElementType, ElementId)` → integer tags, grouped by label
//! name. This is useful for boundary markers, material ids, or any other
//! integer annotation that should survive handle invalidation.

use std::collections::{HashMap, HashSet};

use crate::storage::id::ElementId;
use crate::topology::element_type::ElementType;

/// Key of a labelled element.
pub type LabelKey = (ElementType, ElementId);

/// Named integer labels for mesh elements.
#[derive(Clone, Debug, Default)]
pub struct LabelSet {
    labels: HashMap<String, HashMap<LabelKey, i32>>,
}

impl LabelSet {
    /// Creates an empty label set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Assigns `value` for `element` under label `name`.
    ///
    /// Returns the previous value, if any.
    pub fn set_label(&mut self, element: LabelKey, name: &str, value: i32) -> Option<i32> {
        self.labels
            .entry(name.to_string())
            .or_default()
            .insert(element, value)
    }

    /// Returns the label value for `element` under `name`.
    pub fn get_label(&self, element: LabelKey, name: &str) -> Option<i32> {
        self.labels
            .get(name)
            .and_then(|map| map.get(&element).copied())
    }

    /// Keys carrying `name == value`, sorted.
    pub fn stratum(&self, name: &str, value: i32) -> Vec<LabelKey> {
        let mut keys: Vec<LabelKey> = self.labels.get(name).map_or_else(Vec::new, |map| {
            map.iter()
                .filter_map(|(&key, &v)| (v == value).then_some(key))
                .collect()
        });
        keys.sort_unstable();
        keys
    }

    /// Returns true when the label set has no entries.
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Remove all label entries for the provided elements.
    pub fn clear_elements<I>(&mut self, elements: I)
    where
        I: IntoIterator<Item = LabelKey>,
    {
        let targets: HashSet<LabelKey> = elements.into_iter().collect();
        if targets.is_empty() {
            return;
        }
        self.labels.retain(|_, map| {
            map.retain(|key, _| !targets.contains(key));
            !map.is_empty()
        });
    }
}
