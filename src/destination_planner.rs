//! Turns one scene snapshot into an ordered list of (origin, destination)
//! pairs on the drop grid.
//!
//! Ordering is closest-object-first: small joint excursions fail reachability
//! less often and move faster. Destination search is a greedy first-fit over
//! a fixed lattice in row-major order; it is not globally optimal and that is
//! an accepted trade-off, determinism matters more here than packing.

use log::debug;

use crate::config;
use crate::object_feed::DetectedObject;

#[derive(Debug, Clone, PartialEq)]
pub struct TargetAssignment {
    pub origin_x: f64,
    pub origin_y: f64,
    /// `None` when the lattice had no collision-free cell left; the object
    /// is skipped this cycle, never an error.
    pub destination: Option<(f64, f64)>,
}

/// Plans the whole cycle. For a fixed object list the output is
/// bit-identical across calls: stable sort, fixed scan order, no randomness.
pub fn plan(objects: &[DetectedObject]) -> Vec<TargetAssignment> {
    let mut ordered: Vec<&DetectedObject> = objects.iter().collect();
    ordered.sort_by(|a, b| {
        a.dist2_from_origin()
            .partial_cmp(&b.dist2_from_origin())
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let mut claimed: Vec<(f64, f64)> = Vec::new();
    let mut assignments = Vec::with_capacity(ordered.len());
    for target in ordered {
        let destination = find_destination(target, objects, &claimed);
        match destination {
            Some(cell) => claimed.push(cell),
            None => debug!(
                "no collision-free cell for object at ({}, {})",
                target.mid_x, target.mid_y
            ),
        }
        assignments.push(TargetAssignment {
            origin_x: target.mid_x,
            origin_y: target.mid_y,
            destination,
        });
    }
    assignments
}

/// First lattice cell, scanning row-major from (-GRID_LIMIT, -GRID_LIMIT),
/// that is outside the forbidden band and at least MIN_DIST from every other
/// object and every cell already claimed this cycle.
fn find_destination(
    target: &DetectedObject,
    objects: &[DetectedObject],
    claimed: &[(f64, f64)],
) -> Option<(f64, f64)> {
    let steps = (config::GRID_LIMIT / config::GRID_STEP).round() as i64;
    for iy in -steps..=steps {
        let ty = iy as f64 * config::GRID_STEP;
        if ty.abs() <= config::FORBIDDEN_Y {
            continue;
        }
        for ix in -steps..=steps {
            let tx = ix as f64 * config::GRID_STEP;
            if cell_is_clear(tx, ty, target, objects, claimed) {
                return Some((tx, ty));
            }
        }
    }
    None
}

fn cell_is_clear(
    tx: f64,
    ty: f64,
    target: &DetectedObject,
    objects: &[DetectedObject],
    claimed: &[(f64, f64)],
) -> bool {
    for other in objects {
        // The object being moved vacates its own spot.
        if std::ptr::eq(other, target) {
            continue;
        }
        if distance(tx, ty, other.mid_x, other.mid_y) < config::MIN_DIST {
            return false;
        }
    }
    claimed
        .iter()
        .all(|&(cx, cy)| distance(tx, ty, cx, cy) >= config::MIN_DIST)
}

fn distance(x1: f64, y1: f64, x2: f64, y2: f64) -> f64 {
    (x1 - x2).hypot(y1 - y2)
}
