use log::warn;
use tokio::sync;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender};
use tokio::task::JoinHandle;
use tokio::time::{interval, Duration, MissedTickBehavior};

use crate::object_feed::{ObjectFeed, ObjectSnapshot, SharedSnapshotFeed, SnapshotHolder};

/// Background task that keeps the shared snapshot fresh so the decision loop
/// never touches camera I/O directly. A failed read keeps the previously
/// committed snapshot in place and the poller running.
pub struct SnapshotPoller {
    handle: JoinHandle<()>,
    pub holder: SnapshotHolder,
    shutdown: UnboundedSender<()>,
}

impl SnapshotPoller {
    pub async fn start(
        feed: Box<dyn ObjectFeed + Send>,
        poll_interval: Duration,
    ) -> anyhow::Result<Self> {
        let initial = feed.read()?;
        let holder = SnapshotHolder::new(initial);
        let holder_for_task = holder.clone();
        let (shutdown_tx, shutdown_rx) = sync::mpsc::unbounded_channel::<()>();
        let handle = tokio::spawn(async move {
            run_poll_loop(feed, holder_for_task, poll_interval, shutdown_rx).await;
        });
        Ok(Self { handle, holder, shutdown: shutdown_tx })
    }

    /// Decision-loop view of the latest committed snapshot.
    pub fn feed(&self) -> SharedSnapshotFeed {
        SharedSnapshotFeed::new(self.holder.clone())
    }

    pub fn latest(&self) -> ObjectSnapshot {
        self.holder.get_cloned()
    }
}

async fn run_poll_loop(
    feed: Box<dyn ObjectFeed + Send>,
    holder: SnapshotHolder,
    poll_interval: Duration,
    mut shutdown: UnboundedReceiver<()>,
) {
    let mut interval = interval(poll_interval);
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
    loop {
        tokio::select! {
            _ = interval.tick() => {
                match feed.read() {
                    Ok(snapshot) => holder.set(snapshot),
                    Err(e) => warn!("dropping unreadable snapshot, keeping prior: {e:#}"),
                }
            },
            _ = shutdown.recv() => {
                return;
            },
        }
    }
}

impl Drop for SnapshotPoller {
    fn drop(&mut self) {
        if self.shutdown.send(()).is_err() {
            self.handle.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::object_feed::DetectedObject;
    use std::sync::Mutex;

    struct FlakyFeed {
        reads: Mutex<Vec<anyhow::Result<ObjectSnapshot>>>,
    }

    impl FlakyFeed {
        fn new(mut reads: Vec<anyhow::Result<ObjectSnapshot>>) -> Self {
            reads.reverse();
            Self { reads: Mutex::new(reads) }
        }
    }

    impl ObjectFeed for FlakyFeed {
        fn read(&self) -> anyhow::Result<ObjectSnapshot> {
            match self.reads.lock().unwrap().pop() {
                Some(result) => result,
                None => Err(anyhow::anyhow!("script exhausted")),
            }
        }
    }

    fn obj(iteration: u64) -> DetectedObject {
        DetectedObject {
            iteration,
            mid_x: 0.0,
            mid_y: 12.0,
            width: 5.0,
            height: 6.0,
            area: 30.0,
        }
    }

    #[tokio::test(start_paused = true)]
    async fn commits_fresh_snapshots_on_interval() {
        let feed = FlakyFeed::new(vec![
            Ok(ObjectSnapshot::new(1, vec![obj(1)])),
            Ok(ObjectSnapshot::new(2, vec![obj(2), obj(2)])),
        ]);
        let poller = SnapshotPoller::start(Box::new(feed), Duration::from_millis(100))
            .await
            .unwrap();
        assert_eq!(poller.latest().iteration, 1);

        tokio::time::sleep(Duration::from_millis(150)).await;
        let snap = poller.latest();
        assert_eq!(snap.iteration, 2);
        assert_eq!(snap.objects.len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn commits_can_be_watched_as_a_stream() {
        use futures::StreamExt;
        use futures_signals::signal::SignalExt;

        let feed = FlakyFeed::new(vec![
            Ok(ObjectSnapshot::new(1, vec![obj(1)])),
            Ok(ObjectSnapshot::new(2, vec![obj(2)])),
        ]);
        let poller = SnapshotPoller::start(Box::new(feed), Duration::from_millis(100))
            .await
            .unwrap();

        let mut stream = poller.holder.signal_cloned().to_stream();
        let initial = stream.next().await.unwrap();
        assert_eq!(initial.iteration, 1);
        let committed = stream.next().await.unwrap();
        assert_eq!(committed.iteration, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn failed_read_retains_prior_snapshot() {
        let feed = FlakyFeed::new(vec![
            Ok(ObjectSnapshot::new(3, vec![obj(3)])),
            Err(anyhow::anyhow!("garbled log")),
        ]);
        let poller = SnapshotPoller::start(Box::new(feed), Duration::from_millis(100))
            .await
            .unwrap();

        tokio::time::sleep(Duration::from_millis(150)).await;
        let snap = poller.latest();
        assert_eq!(snap.iteration, 3);
        assert_eq!(snap.objects.len(), 1);
    }
}
