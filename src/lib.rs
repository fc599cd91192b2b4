pub mod command_link;
pub mod config;
pub mod csv_log_feed;
pub mod destination_planner;
pub mod kinematics;
pub mod motion_sequencer;
pub mod object_feed;
pub mod object_feed_mock;
pub mod orchestrator;
pub mod snapshot_poller;
pub mod transport;
pub mod transport_factory;
pub mod transport_mock;
pub mod transport_serial;
