//! Main pick-and-place loop: watch the vision log, plan destinations, and
//! drive the arm over serial until the link dies.
//!
//! `--fake-hw` swaps in a scripted camera and a mock brain so the whole
//! stack can be exercised on a dev machine.

use std::path::PathBuf;

use clap::Parser;
use log::error;

use vex_pickbot::command_link::CommandLink;
use vex_pickbot::config;
use vex_pickbot::csv_log_feed::CsvLogFeed;
use vex_pickbot::kinematics::PlanarArmKinematics;
use vex_pickbot::object_feed::{DetectedObject, ObjectFeed};
use vex_pickbot::object_feed_mock::MockObjectFeed;
use vex_pickbot::orchestrator::Orchestrator;
use vex_pickbot::snapshot_poller::SnapshotPoller;
use vex_pickbot::transport::Transport;
use vex_pickbot::transport_factory::TransportFactory;
use vex_pickbot::transport_mock::MockTransport;

#[derive(Parser, Debug)]
#[clap(name = "sorter")]
struct Opts {
    /// Object log written by the camera process.
    #[clap(long, default_value = "object_log.csv")]
    object_log: PathBuf,

    /// Serial device for the brain.
    #[clap(long, default_value = "/dev/ttyACM0")]
    port: String,

    #[clap(long)]
    fake_hw: bool,

    /// With --fake-hw: how many commands the fake brain acks before going
    /// dark (which is the only way a run ends).
    #[clap(long, default_value = "24")]
    fake_acks: usize,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    env_logger::init();
    let opts: Opts = Opts::parse();

    let transport: Box<dyn Transport> = if opts.fake_hw {
        Box::new(MockTransport::answering_n_times(opts.fake_acks))
    } else {
        TransportFactory::new().create(&opts.port)?
    };
    let link = CommandLink::new(transport);

    let mut _poller = None;
    let feed: Box<dyn ObjectFeed> = if opts.fake_hw {
        Box::new(MockObjectFeed::cycling(demo_scene()))
    } else {
        let poller = SnapshotPoller::start(
            Box::new(CsvLogFeed::new(&opts.object_log)),
            config::FEED_POLL_INTERVAL,
        )
        .await?;
        let feed = poller.feed();
        _poller = Some(poller);
        Box::new(feed)
    };

    let mut orchestrator = Orchestrator::new(feed, Box::new(PlanarArmKinematics), link);
    if let Err(e) = orchestrator.run().await {
        error!("run ended: {e}");
        return Err(e.into());
    }
    Ok(())
}

fn demo_scene() -> Vec<DetectedObject> {
    vec![
        DetectedObject { iteration: 0, mid_x: 15.0, mid_y: 0.0, width: 5.0, height: 6.0, area: 30.0 },
        DetectedObject { iteration: 0, mid_x: -12.0, mid_y: 11.0, width: 5.5, height: 6.5, area: 35.0 },
    ]
}
