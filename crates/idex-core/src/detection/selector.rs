//! Filters raw detections down to one box per card field.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::models::{Detection, FieldKind};

/// Default minimum detection confidence.
pub const DEFAULT_CONFIDENCE_THRESHOLD: f32 = 0.5;

/// How to choose between several accepted detections of the same field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TieBreak {
    /// The detection appearing last in detector output wins.
    #[default]
    LastSeen,
    /// The most confident detection wins; equal scores go to the later one.
    HighestConfidence,
}

impl TieBreak {
    /// Whether `candidate`, seen after `current`, replaces it.
    pub fn prefers(&self, current: f32, candidate: f32) -> bool {
        match self {
            TieBreak::LastSeen => true,
            TieBreak::HighestConfidence => candidate >= current,
        }
    }
}

/// Confidence filter, field allowlist and duplicate resolution.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RegionSelector {
    confidence_threshold: f32,
    tie_break: TieBreak,
}

impl RegionSelector {
    /// Create a selector with the given threshold and last-seen-wins.
    pub fn new(confidence_threshold: f32) -> Self {
        Self {
            confidence_threshold,
            tie_break: TieBreak::default(),
        }
    }

    /// Set the duplicate resolution policy.
    pub fn with_tie_break(mut self, tie_break: TieBreak) -> Self {
        self.tie_break = tie_break;
        self
    }

    pub fn confidence_threshold(&self) -> f32 {
        self.confidence_threshold
    }

    pub fn tie_break(&self) -> TieBreak {
        self.tie_break
    }

    /// The field a detection stands for, if it passes the threshold and
    /// its label is on the allowlist.
    pub fn accept(&self, detection: &Detection) -> Option<FieldKind> {
        if detection.confidence.is_nan() || detection.confidence < self.confidence_threshold {
            trace!(
                "Dropping {} at {:.3} (threshold {:.3})",
                detection.label, detection.confidence, self.confidence_threshold
            );
            return None;
        }

        let kind = detection.field_kind();
        if kind.is_none() {
            trace!("Dropping unsupported label {}", detection.label);
        }
        kind
    }

    /// All accepted detections with their field kinds, in input order.
    pub fn accepted<'a>(&self, detections: &'a [Detection]) -> Vec<(FieldKind, &'a Detection)> {
        detections
            .iter()
            .filter_map(|d| self.accept(d).map(|kind| (kind, d)))
            .collect()
    }

    /// Keep at most one detection per field.
    pub fn select<'a>(&self, detections: &'a [Detection]) -> BTreeMap<FieldKind, &'a Detection> {
        let mut selected: BTreeMap<FieldKind, &'a Detection> = BTreeMap::new();

        for (kind, detection) in self.accepted(detections) {
            match selected.get(&kind) {
                Some(current) if !self.tie_break.prefers(current.confidence, detection.confidence) => {
                    debug!(
                        "Keeping {} at {:.3} over {:.3}",
                        kind, current.confidence, detection.confidence
                    );
                }
                _ => {
                    selected.insert(kind, detection);
                }
            }
        }

        selected
    }
}

impl Default for RegionSelector {
    fn default() -> Self {
        Self::new(DEFAULT_CONFIDENCE_THRESHOLD)
    }
}

/// Select one detection per field with last-seen-wins.
pub fn select(
    detections: &[Detection],
    confidence_threshold: f32,
) -> BTreeMap<FieldKind, &Detection> {
    RegionSelector::new(confidence_threshold).select(detections)
}
