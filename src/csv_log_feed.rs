use std::path::{Path, PathBuf};

use anyhow::Context;
use log::debug;
use serde::Deserialize;

use crate::object_feed::{DetectedObject, ObjectFeed, ObjectSnapshot};

/// Reads the vision pipeline's append-only object log. The camera process
/// flushes a batch of rows every few seconds and bumps the iteration marker
/// on each flush, so the file accumulates many generations; only the newest
/// one describes the scene as it is now.
pub struct CsvLogFeed {
    log_path: PathBuf,
}

/// Column layout must match what camruler writes.
#[derive(Debug, Deserialize)]
struct LogRow {
    iteration: u64,
    mid_x: f64,
    mid_y: f64,
    width: f64,
    height: f64,
    area: f64,
}

impl CsvLogFeed {
    pub fn new(log_path: impl AsRef<Path>) -> Self {
        Self { log_path: log_path.as_ref().to_path_buf() }
    }
}

impl ObjectFeed for CsvLogFeed {
    fn read(&self) -> anyhow::Result<ObjectSnapshot> {
        let mut reader = csv::Reader::from_path(&self.log_path)
            .with_context(|| format!("opening object log {:?}", self.log_path))?;

        let mut objects = Vec::new();
        for row in reader.deserialize() {
            let row: LogRow = row.context("malformed object log row")?;
            objects.push(DetectedObject {
                iteration: row.iteration,
                mid_x: row.mid_x,
                mid_y: row.mid_y,
                width: row.width,
                height: row.height,
                area: row.area,
            });
        }

        let latest = objects.iter().map(|o| o.iteration).max().unwrap_or(0);
        let total = objects.len();
        objects.retain(|o| o.iteration == latest && o.is_plausible());
        debug!(
            "object log: {} rows, {} in iteration {} after filtering",
            total,
            objects.len(),
            latest
        );

        Ok(ObjectSnapshot::new(latest, objects))
    }
}
