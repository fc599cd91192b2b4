use std::collections::VecDeque;
use std::sync::Mutex;

use crate::object_feed::{DetectedObject, ObjectFeed, ObjectSnapshot};

/// Fake feed for tests and `--fake-hw` runs.
///
/// Two modes: a scripted queue of snapshots where the last one sticks once
/// the queue drains, or a cycling feed that re-reports the same objects with
/// a bumped iteration marker on every read (i.e. a camera that keeps
/// re-scanning a scene nobody is changing).
pub struct MockObjectFeed {
    inner: Mutex<Inner>,
}

enum Inner {
    Scripted {
        queue: VecDeque<ObjectSnapshot>,
        last: ObjectSnapshot,
    },
    Cycling {
        objects: Vec<DetectedObject>,
        iteration: u64,
    },
}

impl MockObjectFeed {
    pub fn scripted(snapshots: Vec<ObjectSnapshot>) -> Self {
        let queue: VecDeque<ObjectSnapshot> = snapshots.into();
        Self {
            inner: Mutex::new(Inner::Scripted { queue, last: ObjectSnapshot::empty() }),
        }
    }

    pub fn cycling(objects: Vec<DetectedObject>) -> Self {
        Self {
            inner: Mutex::new(Inner::Cycling { objects, iteration: 0 }),
        }
    }
}

impl ObjectFeed for MockObjectFeed {
    fn read(&self) -> anyhow::Result<ObjectSnapshot> {
        let mut inner = self.inner.lock().unwrap();
        match &mut *inner {
            Inner::Scripted { queue, last } => {
                if let Some(next) = queue.pop_front() {
                    *last = next;
                }
                Ok(last.clone())
            }
            Inner::Cycling { objects, iteration } => {
                *iteration += 1;
                let objects = objects
                    .iter()
                    .map(|o| DetectedObject { iteration: *iteration, ..o.clone() })
                    .collect();
                Ok(ObjectSnapshot::new(*iteration, objects))
            }
        }
    }
}
