use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::transport::Transport;

/// Shared view of everything a [MockTransport] has sent; clones stay valid
/// after the mock itself is boxed up and handed to the code under test.
#[derive(Clone, Debug, Default)]
pub struct SentLog(Arc<Mutex<Vec<String>>>);

impl SentLog {
    pub fn lines(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }

    pub fn len(&self) -> usize {
        self.0.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn push(&self, line: &str) {
        self.0.lock().unwrap().push(line.to_string());
    }
}

/// Fake transport for tests and `--fake-hw` runs. Records every line sent
/// and replays a script of acknowledgements; an empty string in the script
/// simulates the remote staying silent through the timeout. Once the script
/// drains the remote goes dark, unless a default ack is configured.
#[derive(Debug, Default)]
pub struct MockTransport {
    sent: SentLog,
    acks: VecDeque<String>,
    default_ack: Option<String>,
}

impl MockTransport {
    pub fn with_acks<S: Into<String>>(acks: impl IntoIterator<Item = S>) -> Self {
        Self {
            sent: SentLog::default(),
            acks: acks.into_iter().map(Into::into).collect(),
            default_ack: None,
        }
    }

    /// A remote that answers "Done" the first `n` times and then goes dark.
    pub fn answering_n_times(n: usize) -> Self {
        Self::with_acks(vec!["Done"; n])
    }

    /// A remote that never stops answering.
    pub fn always_answering() -> Self {
        Self {
            default_ack: Some("Done".to_string()),
            ..Default::default()
        }
    }

    pub fn sent_log(&self) -> SentLog {
        self.sent.clone()
    }
}

impl Transport for MockTransport {
    fn send_line(&mut self, line: &str) -> anyhow::Result<()> {
        self.sent.push(line);
        Ok(())
    }

    fn receive(&mut self, _timeout: Duration) -> anyhow::Result<String> {
        Ok(self
            .acks
            .pop_front()
            .or_else(|| self.default_ack.clone())
            .unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn replays_script_then_goes_silent() {
        let mut transport = MockTransport::with_acks(["Done", "", "Busy"]);
        let log = transport.sent_log();
        transport.send_line("0.0 90.0 0.0 True").unwrap();
        assert_eq!(log.lines(), vec!["0.0 90.0 0.0 True"]);

        let timeout = Duration::from_secs(1);
        assert_eq!(transport.receive(timeout).unwrap(), "Done");
        assert_eq!(transport.receive(timeout).unwrap(), "");
        assert_eq!(transport.receive(timeout).unwrap(), "Busy");
        assert_eq!(transport.receive(timeout).unwrap(), "");
    }

    #[test]
    fn always_answering_never_drains() {
        let mut transport = MockTransport::always_answering();
        let timeout = Duration::from_secs(1);
        for _ in 0..10 {
            assert_eq!(transport.receive(timeout).unwrap(), "Done");
        }
    }
}
