//! Patch merging.
//!
//! After a filter change the executor only returns bins that still have
//! matching rows. Showing that shorter result directly would shrink the
//! chart's domain, so a patch keeps the displayed keys and zero-fills the
//! bins that disappeared.

use std::collections::HashMap;

use crate::state::{key_bits, BinSet};

/// Reconcile a fresh result with the bins currently displayed
///
/// Full (non-patch) updates and results at least as long as the displayed
/// set replace it as-is.
pub fn merge_patch(previous: &BinSet, fresh: BinSet, patch: bool) -> BinSet {
    if !patch || fresh.len() >= previous.len() {
        return fresh;
    }

    let lookup: HashMap<u64, f64> = fresh.iter().map(|(k, v)| (key_bits(k), v)).collect();
    let values = previous
        .keys()
        .iter()
        .map(|&k| lookup.get(&key_bits(k)).copied().unwrap_or(0.0))
        .collect();

    BinSet::from_parts(previous.keys().to_vec(), values)
}
