//! Top-level loop: poll the scene, plan a cycle, run each assignment
//! through the sequencer, and stop the whole run the moment the link dies.

use log::{debug, error, info, warn};
use thiserror::Error;
use tokio::time::sleep;

use crate::command_link::CommandLink;
use crate::config;
use crate::destination_planner;
use crate::kinematics::KinematicsOracle;
use crate::motion_sequencer::{MotionSequencer, MoveOutcome, SequencerError};
use crate::object_feed::ObjectFeed;

/// Process-wide link health. `Lost` is sticky: there is no reconnection
/// inside a run, the arm is left in its last commanded pose and an operator
/// restarts the stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Healthy,
    Lost,
}

#[derive(Error, Debug)]
pub enum RunError {
    #[error("connection to the brain lost; restart required")]
    ConnectionLost,
    #[error(transparent)]
    Sequencer(#[from] SequencerError),
}

pub struct Orchestrator {
    feed: Box<dyn ObjectFeed>,
    kinematics: Box<dyn KinematicsOracle>,
    link: CommandLink,
    connection: ConnectionState,
}

impl Orchestrator {
    pub fn new(
        feed: Box<dyn ObjectFeed>,
        kinematics: Box<dyn KinematicsOracle>,
        link: CommandLink,
    ) -> Self {
        Self { feed, kinematics, link, connection: ConnectionState::Healthy }
    }

    pub fn connection(&self) -> ConnectionState {
        self.connection
    }

    /// Runs cycles until the link dies or the vision pipeline stalls. Only
    /// ever returns with an error; a healthy system sorts forever.
    pub async fn run(&mut self) -> Result<(), RunError> {
        info!("orchestrator starting");
        loop {
            let snapshot = match self.feed.read() {
                Ok(snapshot) => snapshot,
                Err(e) => {
                    warn!("feed read failed, backing off: {e:#}");
                    sleep(config::EMPTY_FEED_BACKOFF).await;
                    continue;
                }
            };
            if snapshot.objects.is_empty() {
                debug!("no valid targets, backing off");
                sleep(config::EMPTY_FEED_BACKOFF).await;
                continue;
            }

            let assignments = destination_planner::plan(&snapshot.objects);
            info!(
                "cycle (iteration {}): {} objects, {} placeable",
                snapshot.iteration,
                assignments.len(),
                assignments.iter().filter(|a| a.destination.is_some()).count()
            );

            for assignment in &assignments {
                if self.connection == ConnectionState::Lost {
                    break;
                }
                let Some(destination) = assignment.destination else {
                    info!(
                        "no destination for object at ({}, {}), leaving it",
                        assignment.origin_x, assignment.origin_y
                    );
                    continue;
                };

                let mut sequencer =
                    MotionSequencer::new(&*self.feed, &*self.kinematics, &mut self.link);
                let outcome = sequencer
                    .execute((assignment.origin_x, assignment.origin_y), destination)
                    .await?;
                match outcome {
                    MoveOutcome::Completed => {}
                    MoveOutcome::Unreachable | MoveOutcome::PickupFailed => {
                        // Contained by the sequencer; on to the next object.
                    }
                    MoveOutcome::ConnectionLost => {
                        error!("connection lost, aborting run");
                        self.connection = ConnectionState::Lost;
                    }
                }
            }

            if self.connection == ConnectionState::Lost {
                return Err(RunError::ConnectionLost);
            }
            sleep(config::CYCLE_DELAY).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kinematics::PlanarArmKinematics;
    use crate::object_feed::{DetectedObject, ObjectSnapshot};
    use crate::object_feed_mock::MockObjectFeed;
    use crate::transport_mock::{MockTransport, SentLog};

    fn obj(iteration: u64, mid_x: f64, mid_y: f64) -> DetectedObject {
        DetectedObject { iteration, mid_x, mid_y, width: 5.0, height: 6.0, area: 30.0 }
    }

    fn orchestrator_with(feed: MockObjectFeed, transport: MockTransport) -> (Orchestrator, SentLog) {
        let log = transport.sent_log();
        let orchestrator = Orchestrator::new(
            Box::new(feed),
            Box::new(PlanarArmKinematics),
            CommandLink::new(Box::new(transport)),
        );
        (orchestrator, log)
    }

    #[tokio::test(start_paused = true)]
    async fn silence_at_first_pickup_ends_the_run() {
        let feed = MockObjectFeed::cycling(vec![obj(0, 15.0, 0.0)]);
        let (mut orchestrator, log) = orchestrator_with(feed, MockTransport::with_acks([""]));

        let err = orchestrator.run().await.unwrap_err();
        assert!(matches!(err, RunError::ConnectionLost));
        assert_eq!(orchestrator.connection(), ConnectionState::Lost);
        assert_eq!(log.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn lost_connection_skips_remaining_assignments() {
        // Two plannable objects; the link dies on the very first command.
        let feed = MockObjectFeed::cycling(vec![obj(0, 15.0, 0.0), obj(0, -15.0, 0.0)]);
        let (mut orchestrator, log) = orchestrator_with(feed, MockTransport::with_acks([""]));

        let err = orchestrator.run().await.unwrap_err();
        assert!(matches!(err, RunError::ConnectionLost));
        // The second object never produced a command.
        assert_eq!(log.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn runs_until_acks_dry_up() {
        // The camera keeps re-reporting the same stubborn object, so the
        // run burns pickup attempts until the remote goes dark mid-cycle.
        let feed = MockObjectFeed::cycling(vec![obj(0, 15.0, 0.0)]);
        let (mut orchestrator, log) = orchestrator_with(feed, MockTransport::answering_n_times(3));

        let err = orchestrator.run().await.unwrap_err();
        assert!(matches!(err, RunError::ConnectionLost));
        // Three acked commands plus the one that timed out.
        assert_eq!(log.len(), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn empty_snapshots_back_off_until_objects_appear() {
        let feed = MockObjectFeed::scripted(vec![
            ObjectSnapshot::new(1, vec![]),
            ObjectSnapshot::new(2, vec![]),
            ObjectSnapshot::new(3, vec![obj(3, 15.0, 0.0)]),
        ]);
        let (mut orchestrator, log) = orchestrator_with(feed, MockTransport::with_acks([""]));

        let err = orchestrator.run().await.unwrap_err();
        assert!(matches!(err, RunError::ConnectionLost));
        assert_eq!(log.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn stalled_vision_surfaces_as_error() {
        // Iteration marker never advances and the scene never reads empty.
        let feed = MockObjectFeed::scripted(vec![
            ObjectSnapshot::new(1, vec![obj(1, 15.0, 0.0)]),
            ObjectSnapshot::new(1, vec![obj(1, 15.0, 0.0)]),
        ]);
        let (mut orchestrator, _log) =
            orchestrator_with(feed, MockTransport::always_answering());

        let err = orchestrator.run().await.unwrap_err();
        assert!(matches!(err, RunError::Sequencer(SequencerError::RescanStalled { .. })));
    }
}
