//! Size-based blob selection over labeled components.

use std::cmp::Reverse;

use ndarray::Array2;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use super::components::ComponentLabels;

/// Which labeled regions survive the size filter.
///
/// Regions (background included) are ranked by area, largest first, ties
/// going to the lower label. The `max_candidates` largest are considered;
/// with `exclude_dominant_region` the top-ranked one is dropped as the scene
/// backdrop. Survivors must have an area strictly greater than `min_area`.
/// The background label is never selected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct BlobPolicy {
    pub max_candidates: usize,
    pub exclude_dominant_region: bool,
    pub min_area: usize,
}

impl Default for BlobPolicy {
    fn default() -> Self {
        Self {
            max_candidates: 6,
            exclude_dominant_region: true,
            min_area: 400,
        }
    }
}

/// All labels (background included) ordered by descending area.
pub fn rank_by_area(components: &ComponentLabels) -> Vec<u32> {
    let mut ranked: Vec<u32> = components.stats.iter().map(|s| s.label).collect();
    // Stable sort keeps lower labels first among equal areas
    ranked.sort_by_key(|&label| Reverse(components.stats[label as usize].area));
    ranked
}

/// Labels kept by `policy`, in rank order.
pub fn select_blobs(components: &ComponentLabels, policy: &BlobPolicy) -> Vec<u32> {
    let skip = usize::from(policy.exclude_dominant_region);
    let ranked = rank_by_area(components);

    if policy.exclude_dominant_region {
        if let Some(&dominant) = ranked.first() {
            tracing::trace!(
                label = dominant,
                area = components.stats[dominant as usize].area,
                "dropping dominant region"
            );
        }
    }

    ranked
        .into_iter()
        .take(policy.max_candidates)
        .skip(skip)
        .filter(|&label| {
            let area = components.stats[label as usize].area;
            let keep = label != 0 && area > policy.min_area;
            tracing::trace!(label, area, keep, "blob candidate");
            keep
        })
        .collect()
}

/// Paint the pixels of `keep` labels as 1 in a fresh mask.
pub fn paint_labels(components: &ComponentLabels, keep: &[u32]) -> Array2<u8> {
    let mut lookup = vec![false; components.len()];
    for &label in keep {
        if let Some(slot) = lookup.get_mut(label as usize) {
            *slot = true;
        }
    }
    components
        .labels
        .mapv(|label| lookup.get(label as usize).copied().unwrap_or(false) as u8)
}
