use std::path::Path;

use log::info;

use crate::transport::Transport;
use crate::transport_mock::MockTransport;
use crate::transport_serial::SerialTransport;

/// Picks the real serial link when the device node is present, otherwise a
/// mock that acks everything, so the rest of the stack can be exercised on a
/// dev machine with no brain attached.
#[derive(Default)]
pub struct TransportFactory {
    force_mock: bool,
}

impl TransportFactory {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn new_maybe_mock(force_mock: bool) -> Self {
        Self { force_mock }
    }

    pub fn create(&self, port_path: &str) -> anyhow::Result<Box<dyn Transport>> {
        if !self.force_mock && Path::new(port_path).exists() {
            Ok(Box::new(SerialTransport::open(port_path)?))
        } else {
            info!("no serial device at {port_path}, using mock transport");
            Ok(Box::new(MockTransport::always_answering()))
        }
    }
}
