use std::io::{Read, Write};
use std::time::Duration;

use anyhow::Context;
use log::{debug, trace};

use crate::transport::Transport;

const BAUD_RATE: u32 = 115200;

/// Serial link to the brain. The remote opens its end as a plain file in
/// read/write binary mode, so the protocol really is just bytes on a wire.
pub struct SerialTransport {
    port: Box<dyn serialport::SerialPort>,
}

impl SerialTransport {
    pub fn open(path: &str) -> anyhow::Result<Self> {
        let port = serialport::new(path, BAUD_RATE)
            .timeout(Duration::from_secs(1))
            .open()
            .with_context(|| format!("opening serial port {path}"))?;
        debug!("opened serial port {path} at {BAUD_RATE} baud");
        Ok(Self { port })
    }
}

impl Transport for SerialTransport {
    fn send_line(&mut self, line: &str) -> anyhow::Result<()> {
        trace!("serial tx: {line}");
        self.port
            .write_all(format!("{line}\r\n").as_bytes())
            .context("serial write")?;
        self.port.flush().context("serial flush")?;
        Ok(())
    }

    fn receive(&mut self, timeout: Duration) -> anyhow::Result<String> {
        self.port.set_timeout(timeout).context("serial set_timeout")?;
        let mut buf = [0u8; 64];
        match self.port.read(&mut buf) {
            Ok(n) => {
                let text = String::from_utf8_lossy(&buf[..n]).trim().to_string();
                trace!("serial rx: {text:?}");
                Ok(text)
            }
            Err(e) if e.kind() == std::io::ErrorKind::TimedOut => Ok(String::new()),
            Err(e) => Err(e).context("serial read"),
        }
    }
}
