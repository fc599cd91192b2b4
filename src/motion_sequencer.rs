//! Drives one object through pickup, parking, re-scan verification and
//! drop-off. Phases are strictly sequential: nothing is sent until the
//! previous command's acknowledgement has been observed, and the arm is the
//! only resource so there is never more than one object in flight.

use log::{error, info, warn};
use thiserror::Error;
use tokio::time::sleep;

use crate::command_link::{CommandLink, JointCommand};
use crate::config;
use crate::kinematics::KinematicsOracle;
use crate::object_feed::{ObjectFeed, ObjectSnapshot};

/// Per-object result. Everything except `ConnectionLost` is contained here:
/// the caller just moves on to the next object.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveOutcome {
    Completed,
    /// The solver could not reach the origin or the destination.
    Unreachable,
    /// Verification kept seeing the object at its origin and the retry
    /// budget ran out.
    PickupFailed,
    /// The link went silent; the whole run must stop.
    ConnectionLost,
}

#[derive(Error, Debug)]
pub enum SequencerError {
    /// The vision pipeline stopped producing fresh snapshots after a move.
    /// Fatal: without re-observation we cannot verify anything.
    #[error("no fresh snapshot after {polls} polls; vision pipeline stalled?")]
    RescanStalled { polls: u32 },
    #[error("object feed failed mid-sequence")]
    Feed(#[source] anyhow::Error),
}

pub struct MotionSequencer<'a> {
    feed: &'a dyn ObjectFeed,
    kinematics: &'a dyn KinematicsOracle,
    link: &'a mut CommandLink,
}

impl<'a> MotionSequencer<'a> {
    pub fn new(
        feed: &'a dyn ObjectFeed,
        kinematics: &'a dyn KinematicsOracle,
        link: &'a mut CommandLink,
    ) -> Self {
        Self { feed, kinematics, link }
    }

    pub async fn execute(
        &mut self,
        origin: (f64, f64),
        destination: (f64, f64),
    ) -> Result<MoveOutcome, SequencerError> {
        let (mut origin_x, mut origin_y) = origin;
        let mut picked_up = false;

        for attempt in 1..=config::MAX_PICKUP_ATTEMPTS {
            // PICKUP_COMPUTE
            let solution = self.kinematics.solve(origin_x, origin_y, config::PICKUP_Z);
            if !solution.reachable {
                warn!("pickup at ({origin_x}, {origin_y}) is unreachable, skipping object");
                return Ok(MoveOutcome::Unreachable);
            }

            let premove = self.read_feed()?.iteration;

            // PICKUP_SEND / PICKUP_ACK_WAIT
            if !self.acked(&JointCommand::from_solution(&solution, true)) {
                return Ok(MoveOutcome::ConnectionLost);
            }
            sleep(config::SETTLE_DELAY).await;

            // DEADZONE_SEND / DEADZONE_ACK_WAIT: park clear of the camera,
            // leaving on the side the arm already swung toward.
            let pose = deadzone_pose_for(solution.base_deg);
            if !self.acked(&JointCommand::parked(pose)) {
                return Ok(MoveOutcome::ConnectionLost);
            }
            sleep(config::SETTLE_DELAY).await;

            // RESCAN_WAIT / PICKUP_VERIFY
            let snapshot = self.await_fresh_snapshot(premove).await?;
            match lingering_object(&snapshot, origin_x, origin_y) {
                None => {
                    picked_up = true;
                    break;
                }
                Some((seen_x, seen_y)) => {
                    info!(
                        "pickup attempt {attempt}/{} left object near ({seen_x}, {seen_y}), retrying there",
                        config::MAX_PICKUP_ATTEMPTS
                    );
                    origin_x = seen_x;
                    origin_y = seen_y;
                }
            }
        }

        if !picked_up {
            warn!(
                "object near ({origin_x}, {origin_y}) still present after {} attempts, skipping",
                config::MAX_PICKUP_ATTEMPTS
            );
            return Ok(MoveOutcome::PickupFailed);
        }

        // DROPOFF_COMPUTE
        let (dest_x, dest_y) = destination;
        let solution = self.kinematics.solve(dest_x, dest_y, config::PICKUP_Z);
        if !solution.reachable {
            warn!("destination ({dest_x}, {dest_y}) is unreachable, skipping object");
            return Ok(MoveOutcome::Unreachable);
        }

        // DROPOFF_SEND / DROPOFF_ACK_WAIT
        if !self.acked(&JointCommand::from_solution(&solution, false)) {
            return Ok(MoveOutcome::ConnectionLost);
        }
        sleep(config::SETTLE_DELAY).await;

        info!("placed object from ({origin_x}, {origin_y}) at ({dest_x}, {dest_y})");
        Ok(MoveOutcome::Completed)
    }

    fn acked(&mut self, command: &JointCommand) -> bool {
        match self.link.request(command) {
            Ok(_) => true,
            Err(e) => {
                error!("link failure, declaring connection lost: {e}");
                false
            }
        }
    }

    fn read_feed(&self) -> Result<ObjectSnapshot, SequencerError> {
        self.feed.read().map_err(SequencerError::Feed)
    }

    /// Polls until a snapshot from a later scan appears, or the scene reads
    /// empty (which is itself a definitive fresh observation).
    async fn await_fresh_snapshot(
        &self,
        premove_iteration: u64,
    ) -> Result<ObjectSnapshot, SequencerError> {
        for _ in 0..config::RESCAN_MAX_POLLS {
            sleep(config::RESCAN_POLL_INTERVAL).await;
            let snapshot = self.read_feed()?;
            if snapshot.is_newer_than(premove_iteration) || snapshot.objects.is_empty() {
                return Ok(snapshot);
            }
        }
        Err(SequencerError::RescanStalled { polls: config::RESCAN_MAX_POLLS })
    }
}

/// Pickup succeeded iff nothing in the fresh snapshot remains within
/// MIN_DIST of where we grabbed. Returns the closest straggler's position
/// for the retry.
fn lingering_object(snapshot: &ObjectSnapshot, origin_x: f64, origin_y: f64) -> Option<(f64, f64)> {
    snapshot
        .objects
        .iter()
        .map(|o| (o.mid_x, o.mid_y, (o.mid_x - origin_x).hypot(o.mid_y - origin_y)))
        .filter(|&(_, _, d)| d < config::MIN_DIST)
        .min_by(|a, b| a.2.partial_cmp(&b.2).unwrap_or(std::cmp::Ordering::Equal))
        .map(|(x, y, _)| (x, y))
}

/// |base| <= 90 or >= 270 means the arm came in from the near half of the
/// workspace; park it there rather than sweep back across the camera.
fn deadzone_pose_for(base_deg: f64) -> (f64, f64, f64) {
    if base_deg.abs() >= 270.0 || base_deg.abs() <= 90.0 {
        config::DEADZONE_NEAR
    } else {
        config::DEADZONE_FAR
    }
}
