use std::time::Duration;

/// Half-duplex line transport to the brain. One command out, one free-text
/// acknowledgement back; there is no framing beyond the trailing newline on
/// the outbound side.
pub trait Transport {
    /// Fire-and-forget: queues `line` (newline appended) for the remote.
    fn send_line(&mut self, line: &str) -> anyhow::Result<()>;

    /// Waits up to `timeout` for whatever the remote says next. An empty
    /// string means the remote stayed silent; that is not an I/O error.
    fn receive(&mut self, timeout: Duration) -> anyhow::Result<String>;
}
