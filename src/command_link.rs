use std::time::Duration;

use log::{debug, warn};
use thiserror::Error;

use crate::config;
use crate::kinematics::JointAngles;
use crate::transport::Transport;

/// One motion command for the brain: three joint targets plus whether the
/// electromagnet should engage before the move (pickup) or release after it
/// (drop-off).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct JointCommand {
    pub base_deg: f64,
    pub shoulder_deg: f64,
    pub elbow_deg: f64,
    pub is_pickup: bool,
}

impl JointCommand {
    pub fn from_solution(angles: &JointAngles, is_pickup: bool) -> Self {
        Self {
            base_deg: angles.base_deg,
            shoulder_deg: angles.shoulder_deg,
            elbow_deg: angles.elbow_deg,
            is_pickup,
        }
    }

    /// A fixed parking pose; the magnet stays engaged since we park while
    /// carrying.
    pub fn parked((base_deg, shoulder_deg, elbow_deg): (f64, f64, f64)) -> Self {
        Self { base_deg, shoulder_deg, elbow_deg, is_pickup: true }
    }

    /// Whitespace-separated wire form. The brain's firmware string-matches
    /// Python-style bool literals, so it is `True`/`False` on the wire.
    pub fn to_wire_line(&self) -> String {
        let places = config::ANGLE_DECIMAL_PLACES;
        format!(
            "{:.places$} {:.places$} {:.places$} {}",
            self.base_deg,
            self.shoulder_deg,
            self.elbow_deg,
            if self.is_pickup { "True" } else { "False" },
        )
    }
}

#[derive(Error, Debug)]
pub enum LinkError {
    #[error("no acknowledgement after {attempts} attempt(s) of {timeout:?}")]
    AckTimeout { attempts: u32, timeout: Duration },
    #[error(transparent)]
    Transport(#[from] anyhow::Error),
}

/// Ack policy around the raw transport: send once, then wait for any
/// non-empty acknowledgement within the configured attempt budget. The
/// command is deliberately not re-sent on silence; the brain may well have
/// executed the move and a duplicate would run it twice.
pub struct CommandLink {
    transport: Box<dyn Transport>,
    timeout: Duration,
    attempts: u32,
}

impl CommandLink {
    pub fn new(transport: Box<dyn Transport>) -> Self {
        Self::with_policy(transport, config::ACK_TIMEOUT, config::ACK_ATTEMPTS)
    }

    pub fn with_policy(transport: Box<dyn Transport>, timeout: Duration, attempts: u32) -> Self {
        assert!(attempts > 0, "need at least one receive attempt");
        Self { transport, timeout, attempts }
    }

    /// Sends `command` and waits for the remote to speak. Returns the
    /// trimmed acknowledgement text.
    pub fn request(&mut self, command: &JointCommand) -> Result<String, LinkError> {
        let line = command.to_wire_line();
        debug!("sending command: {line}");
        self.transport.send_line(&line)?;

        for attempt in 1..=self.attempts {
            let ack = self.transport.receive(self.timeout)?;
            let ack = ack.trim();
            if !ack.is_empty() {
                debug!("acknowledged: {ack}");
                return Ok(ack.to_string());
            }
            warn!(
                "remote silent for {:?} (attempt {attempt}/{})",
                self.timeout, self.attempts
            );
        }
        Err(LinkError::AckTimeout { attempts: self.attempts, timeout: self.timeout })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport_mock::MockTransport;

    #[test]
    fn wire_format_rounds_to_one_decimal() {
        let command = JointCommand {
            base_deg: 12.04,
            shoulder_deg: 45.55,
            elbow_deg: -30.0,
            is_pickup: true,
        };
        assert_eq!(command.to_wire_line(), "12.0 45.5 -30.0 True");

        let drop = JointCommand { is_pickup: false, ..command };
        assert!(drop.to_wire_line().ends_with("False"));
    }

    #[test]
    fn ack_is_trimmed() {
        let mut link = CommandLink::new(Box::new(MockTransport::with_acks(["  Done\r\n"])));
        let ack = link.request(&JointCommand::parked(config::DEADZONE_NEAR)).unwrap();
        assert_eq!(ack, "Done");
    }

    #[test]
    fn silence_exhausts_attempts_without_resending() {
        let transport = MockTransport::with_acks(["", ""]);
        let log = transport.sent_log();
        let mut link = CommandLink::with_policy(
            Box::new(transport),
            Duration::from_secs(1),
            2,
        );
        let err = link.request(&JointCommand::parked(config::DEADZONE_NEAR)).unwrap_err();
        assert!(matches!(err, LinkError::AckTimeout { attempts: 2, .. }));
        // One send regardless of receive attempts.
        assert_eq!(log.len(), 1);
    }

    #[test]
    fn late_ack_within_attempt_budget_succeeds() {
        let transport = MockTransport::with_acks(["", "Done"]);
        let mut link = CommandLink::with_policy(
            Box::new(transport),
            Duration::from_secs(1),
            2,
        );
        let ack = link.request(&JointCommand::parked(config::DEADZONE_FAR)).unwrap();
        assert_eq!(ack, "Done");
    }
}
