use futures_signals::signal::Mutable;
use std::time::Instant;

use crate::config;

/// One object as reported by the overhead camera, arena-plane cm.
#[derive(Debug, Clone, PartialEq)]
pub struct DetectedObject {
    /// Generation marker of the vision scan this row belongs to. Objects
    /// from different iterations must never be mixed.
    pub iteration: u64,
    pub mid_x: f64,
    pub mid_y: f64,
    pub width: f64,
    pub height: f64,
    pub area: f64,
}

impl DetectedObject {
    /// Squared distance from the arena origin (the base axis).
    pub fn dist2_from_origin(&self) -> f64 {
        self.mid_x * self.mid_x + self.mid_y * self.mid_y
    }

    /// Plausibility filter; the camera occasionally reports reflections or
    /// parts of the arm itself and those never match the block geometry.
    pub fn is_plausible(&self) -> bool {
        (config::MIN_WIDTH..=config::MAX_WIDTH).contains(&self.width)
            && (config::MIN_HEIGHT..=config::MAX_HEIGHT).contains(&self.height)
            && (config::MIN_AREA..=config::MAX_AREA).contains(&self.area)
    }
}

/// The latest committed view of the scene. `iteration` is the newest
/// generation marker present in the feed at read time; `taken_at` is when
/// this snapshot was committed by whoever produced it.
#[derive(Debug, Clone)]
pub struct ObjectSnapshot {
    pub iteration: u64,
    pub taken_at: Instant,
    pub objects: Vec<DetectedObject>,
}

impl ObjectSnapshot {
    pub fn new(iteration: u64, objects: Vec<DetectedObject>) -> Self {
        Self { iteration, taken_at: Instant::now(), objects }
    }

    pub fn empty() -> Self {
        Self::new(0, Vec::new())
    }

    /// Whether this snapshot was produced by a later scan than `other_iteration`.
    pub fn is_newer_than(&self, other_iteration: u64) -> bool {
        self.iteration > other_iteration
    }
}

/// Read-side of the vision pipeline. Implementations must return only the
/// newest iteration's objects, already plausibility-filtered.
pub trait ObjectFeed {
    fn read(&self) -> anyhow::Result<ObjectSnapshot>;
}

/// Single synchronized point of exchange between the background poller and
/// the decision loop: one atomic get-latest / replace, no partial reads.
pub type SnapshotHolder = Mutable<ObjectSnapshot>;

/// Feed view over a [SnapshotHolder]; this is what the decision loop reads
/// so it never blocks on camera hardware.
#[derive(Clone)]
pub struct SharedSnapshotFeed {
    holder: SnapshotHolder,
}

impl SharedSnapshotFeed {
    pub fn new(holder: SnapshotHolder) -> Self {
        Self { holder }
    }
}

impl ObjectFeed for SharedSnapshotFeed {
    fn read(&self) -> anyhow::Result<ObjectSnapshot> {
        Ok(self.holder.get_cloned())
    }
}
