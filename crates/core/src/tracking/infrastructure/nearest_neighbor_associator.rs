/// Greedy nearest-neighbor subject association.
///
/// Each frontal detection is matched to the remembered subject whose last
/// face center is closest, provided the distance (in previous face widths)
/// is within `max_distance`. Unmatched detections get a fresh handle from a
/// free-list arena, so identity survives detector reordering and short
/// occlusions covered by the tracker's grace window.
use std::collections::HashSet;

use crate::shared::bounding_box::BoundingBox;
use crate::tracking::domain::handle_arena::HandleArena;
use crate::tracking::domain::subject_associator::{KnownSubject, SubjectAssociator};
use crate::tracking::domain::subject_state::SubjectId;

pub struct NearestNeighborAssociator {
    max_distance: f64,
    arena: HandleArena,
}

impl NearestNeighborAssociator {
    pub fn new(max_distance: f64) -> Self {
        Self {
            max_distance,
            arena: HandleArena::new(),
        }
    }
}

impl SubjectAssociator for NearestNeighborAssociator {
    fn associate(&mut self, known: &[KnownSubject], detections: &[BoundingBox]) -> Vec<SubjectId> {
        let mut assigned: Vec<Option<SubjectId>> = vec![None; detections.len()];
        for (ki, di) in greedy_match(known, detections, self.max_distance) {
            assigned[di] = Some(known[ki].id);
        }

        assigned
            .into_iter()
            .map(|slot| slot.unwrap_or_else(|| self.arena.allocate()))
            .collect()
    }

    fn release(&mut self, id: SubjectId) {
        self.arena.release(id);
    }
}

/// Greedy distance matching: pairs sorted by ascending distance, each
/// subject/detection used at most once.
fn greedy_match(
    known: &[KnownSubject],
    detections: &[BoundingBox],
    max_distance: f64,
) -> Vec<(usize, usize)> {
    let mut pairs: Vec<(usize, usize, f64)> = Vec::new();
    for (ki, subject) in known.iter().enumerate() {
        for (di, det) in detections.iter().enumerate() {
            let distance = subject.last_box.relative_center_distance(det);
            if distance <= max_distance {
                pairs.push((ki, di, distance));
            }
        }
    }
    pairs.sort_by(|a, b| a.2.partial_cmp(&b.2).unwrap_or(std::cmp::Ordering::Equal));

    let mut used_known = HashSet::new();
    let mut used_dets = HashSet::new();
    let mut matches = Vec::new();

    for (ki, di, _) in &pairs {
        if !used_known.contains(ki) && !used_dets.contains(di) {
            used_known.insert(*ki);
            used_dets.insert(*di);
            matches.push((*ki, *di));
        }
    }
    matches
}
