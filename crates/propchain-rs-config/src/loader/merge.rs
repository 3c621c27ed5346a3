//! Child-over-parent merge for resolved layers.

use crate::{MergedProperties, PropertyLayer};

/// Start from the parent scope and overwrite with every key of the child.
pub(super) fn merge_layer(parent: &MergedProperties, child: PropertyLayer) -> MergedProperties {
    let mut merged = parent.clone();
    for (key, value) in child {
        merged.insert(key, value);
    }
    merged
}
