//! Aggregations over upgrade candidates
//!
//! Provides per-magnitude counts and the display ordering used by the table
//! renderer and the selection loop.

use super::{UpgradeCandidate, UpgradeMagnitude};
use serde::Serialize;

/// Number of candidates per upgrade magnitude
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MagnitudeCounts {
    pub major: usize,
    pub minor: usize,
    pub patch: usize,
    pub total: usize,
}

impl MagnitudeCounts {
    /// Returns true if no candidates were counted
    pub fn is_empty(&self) -> bool {
        self.total == 0
    }
}

/// Count candidates by magnitude
pub fn count_by_magnitude<'a>(
    candidates: impl IntoIterator<Item = &'a UpgradeCandidate>,
) -> MagnitudeCounts {
    let mut counts = MagnitudeCounts::default();
    for candidate in candidates {
        match candidate.magnitude {
            UpgradeMagnitude::Major => counts.major += 1,
            UpgradeMagnitude::Minor => counts.minor += 1,
            UpgradeMagnitude::Patch => counts.patch += 1,
            UpgradeMagnitude::None => {}
        }
        counts.total += 1;
    }
    counts
}

/// Display priority: patch first, then minor, then major
fn magnitude_priority(magnitude: UpgradeMagnitude) -> u8 {
    match magnitude {
        UpgradeMagnitude::Patch => 1,
        UpgradeMagnitude::Minor => 2,
        UpgradeMagnitude::Major => 3,
        UpgradeMagnitude::None => 4,
    }
}

/// Sort candidates patch → minor → major, then by name
pub fn sort_candidates<'a>(
    candidates: impl IntoIterator<Item = &'a UpgradeCandidate>,
) -> Vec<&'a UpgradeCandidate> {
    let mut sorted: Vec<&UpgradeCandidate> = candidates.into_iter().collect();
    sorted.sort_by(|a, b| {
        magnitude_priority(a.magnitude)
            .cmp(&magnitude_priority(b.magnitude))
            .then_with(|| a.dependency_name.cmp(&b.dependency_name))
    });
    sorted
}
