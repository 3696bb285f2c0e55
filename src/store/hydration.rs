//! Hydration tiers: deciding which annotations keep full geometry resident.
//!
//! Large datasets carry hundreds of thousands of annotations; keeping every
//! coordinate list in memory is not affordable. The store keeps a subset
//! "hydrated" (full [`crate::model::Annotation`]) and represents the rest as
//! stubs. The partition is recomputed whenever the full annotation list is
//! replaced.

use std::collections::HashSet;

use crate::model::{Annotation, AnnotationId, Position};

/// Picks the annotations whose full geometry stays resident in memory.
pub trait HydrationPolicy {
    fn select_hydrated(&self, annotations: &[Annotation]) -> HashSet<AnnotationId>;
}

/// Hydrates a leading fraction of the list in input order.
///
/// Order-dependent and blind to what is actually visible; install a
/// viewport-aware policy via `AnnotationStore::set_hydration_policy` when one
/// is available.
#[derive(Debug, Clone, Copy)]
pub struct LeadingFractionPolicy {
    fraction: f64,
}

impl LeadingFractionPolicy {
    /// Create a policy hydrating the first `fraction` of the list.
    /// The fraction is clamped to `0.0..=1.0`.
    pub fn new(fraction: f64) -> Self {
        Self {
            fraction: fraction.clamp(0.0, 1.0),
        }
    }

    pub fn fraction(&self) -> f64 {
        self.fraction
    }
}

impl Default for LeadingFractionPolicy {
    fn default() -> Self {
        Self::new(0.2)
    }
}

impl HydrationPolicy for LeadingFractionPolicy {
    fn select_hydrated(&self, annotations: &[Annotation]) -> HashSet<AnnotationId> {
        let count = (annotations.len() as f64 * self.fraction).floor() as usize;
        annotations[..count]
            .iter()
            .map(|annotation| annotation.id.clone())
            .collect()
    }
}

/// Memory accounting for the hydration strategy. Diagnostic only, never used
/// for control flow.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MemoryStats {
    pub total_annotations: usize,
    pub hydrated_count: usize,
    pub stub_count: usize,
    /// Hydrated share of the annotation count, 0-100.
    pub hydrated_percent: f64,
    /// Coordinate bytes if every annotation were hydrated.
    pub total_coordinate_bytes: usize,
    /// Coordinate bytes actually resident in the hydrated tier.
    pub hydrated_coordinate_bytes: usize,
    /// Bytes spent on retained centroids in the stub tier.
    pub stub_coordinate_bytes: usize,
    /// Coordinate bytes the stub strategy avoids keeping resident.
    pub theoretical_savings_bytes: usize,
    /// Savings as a share of the full-hydration footprint, 0-100.
    pub theoretical_savings_percent: f64,
}

impl MemoryStats {
    /// Compute stats for an annotation list and its hydrated subset.
    pub fn compute(annotations: &[Annotation], hydrated: &HashSet<AnnotationId>) -> Self {
        let position_size = std::mem::size_of::<Position>();
        let mut total_coordinate_bytes = 0;
        let mut hydrated_coordinate_bytes = 0;
        for annotation in annotations {
            let bytes = annotation.coordinates.len() * position_size;
            total_coordinate_bytes += bytes;
            if hydrated.contains(&annotation.id) {
                hydrated_coordinate_bytes += bytes;
            }
        }

        let total_annotations = annotations.len();
        let hydrated_count = hydrated.len();
        let stub_count = total_annotations - hydrated_count;
        let theoretical_savings_bytes = total_coordinate_bytes - hydrated_coordinate_bytes;

        Self {
            total_annotations,
            hydrated_count,
            stub_count,
            hydrated_percent: percent(hydrated_count, total_annotations),
            total_coordinate_bytes,
            hydrated_coordinate_bytes,
            // One retained centroid per stub.
            stub_coordinate_bytes: stub_count * position_size,
            theoretical_savings_bytes,
            theoretical_savings_percent: percent(theoretical_savings_bytes, total_coordinate_bytes),
        }
    }
}

fn percent(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 / whole as f64 * 100.0
    }
}
