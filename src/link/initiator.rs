use core::time::Duration;

use embedded_hal::blocking::delay::DelayMs;

use crate::config::LinkConfig;
use crate::irq::IrqEvent;
use crate::radio::{Radio, RadioError};
use crate::status::{Signal, StatusIndicator, RX_PULSE_MS};

use super::{
    complete_transmission, drain_crc_failure, message, millis, Clock, Fault, LinkStats,
};

/// Initiator state machine states
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LinkState {
    /// Between rounds
    Idle,
    /// Listening for a pong until the deadline
    AwaitingReply {
        /// Clock value after which the round is abandoned
        deadline: Duration,
    },
}

/// How a round ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RoundOutcome {
    /// A pong arrived in time; the sequence number advanced
    Acknowledged {
        /// Sequence number of the acknowledged ping
        sequence: u32,
    },
    /// No pong within the reply window; the sequence number is unchanged
    TimedOut {
        /// Sequence number of the abandoned ping
        sequence: u32,
    },
    /// The ping could not be sent or its transmission was not confirmed
    SendFailed,
}

/// Device A: sends numbered pings and waits for pongs
///
/// `N` is the receive buffer capacity; replies longer than `N - 1` bytes are
/// truncated.
pub struct Initiator<R, T, S, const N: usize = 64> {
    radio: R,
    timer: T,
    status: S,
    config: LinkConfig,
    sequence: u32,
    state: LinkState,
    stats: LinkStats,
    buffer: [u8; N],
}

impl<R, T, S, const N: usize> Initiator<R, T, S, N>
where
    R: Radio,
    T: Clock + DelayMs<u32>,
    S: StatusIndicator,
{
    /// Create the role; the radio must already be initialized
    pub fn new(radio: R, timer: T, status: S, config: LinkConfig) -> Self {
        Self {
            radio,
            timer,
            status,
            config,
            sequence: 0,
            state: LinkState::Idle,
            stats: LinkStats::default(),
            buffer: [0; N],
        }
    }

    /// Sequence number of the next ping
    pub fn sequence(&self) -> u32 {
        self.sequence
    }

    /// Current state
    pub fn state(&self) -> LinkState {
        self.state
    }

    /// Counters since creation
    pub fn stats(&self) -> &LinkStats {
        &self.stats
    }

    /// Radio reference
    pub fn radio(&self) -> &R {
        &self.radio
    }

    /// Mutable radio reference
    pub fn radio_mut(&mut self) -> &mut R {
        &mut self.radio
    }

    /// Status indicator reference
    pub fn status_mut(&mut self) -> &mut S {
        &mut self.status
    }

    /// Give back radio, timer and status indicator
    pub fn release(self) -> (R, T, S) {
        (self.radio, self.timer, self.status)
    }

    /// Run one ping round, including the pause that follows it
    ///
    /// Non-fatal faults are reported and folded into the outcome. An `Err`
    /// is always fatal for the node.
    pub fn run_round(&mut self) -> Result<RoundOutcome, Fault> {
        self.stats.rounds += 1;

        let request = message::request(self.sequence);
        match self.radio.send(&request) {
            Ok(()) => {}
            Err(RadioError::OversizedPayload { len }) => {
                return Ok(self.send_failed(Fault::OversizedPayload { len }));
            }
            Err(err) => return Err(err.into()),
        }

        let confirmed = complete_transmission(
            &mut self.radio,
            &mut self.timer,
            &mut self.status,
            &self.config,
            &mut self.stats,
        )?;
        if !confirmed {
            self.stats.send_failures += 1;
            self.timer.delay_ms(self.config.send_backoff_ms);
            return Ok(RoundOutcome::SendFailed);
        }
        info!("ping {} sent, waiting for pong", self.sequence);

        let outcome = if self.await_reply()? {
            let sequence = self.sequence;
            info!("pong received for ping {}", sequence);
            self.stats.replies += 1;
            self.sequence = self.sequence.wrapping_add(1);
            RoundOutcome::Acknowledged { sequence }
        } else {
            let sequence = self.sequence;
            self.stats.timeouts += 1;
            self.status.report(&Fault::ProtocolTimeout { sequence });
            RoundOutcome::TimedOut { sequence }
        };

        self.timer.delay_ms(self.config.round_interval_ms);
        Ok(outcome)
    }

    fn send_failed(&mut self, fault: Fault) -> RoundOutcome {
        self.stats.send_failures += 1;
        self.status.report(&fault);
        self.timer.delay_ms(self.config.send_backoff_ms);
        RoundOutcome::SendFailed
    }

    /// Listen until a pong arrives or the reply window closes
    fn await_reply(&mut self) -> Result<bool, Fault> {
        self.radio.clear_event(IrqEvent::ReceiveDone);
        self.radio.clear_event(IrqEvent::CrcError);
        self.radio.listen()?;

        let deadline = self.timer.now() + millis(self.config.reply_timeout_ms);
        self.state = LinkState::AwaitingReply { deadline };

        let result = self.poll_until(deadline);
        self.state = LinkState::Idle;
        result
    }

    fn poll_until(&mut self, deadline: Duration) -> Result<bool, Fault> {
        loop {
            drain_crc_failure(&mut self.radio, &mut self.status, &mut self.stats);

            if let Some(reception) = self.radio.receive_if_ready(&mut self.buffer)? {
                if reception.is_truncated() {
                    self.stats.truncated += 1;
                    self.status.report(&Fault::TruncatedReceive {
                        reported: reception.reported,
                        delivered: reception.len,
                    });
                }
                self.status.pulse(Signal::Receive, RX_PULSE_MS);

                if message::is_reply(&self.buffer[..reception.len]) {
                    return Ok(true);
                }
                self.stats.ignored += 1;
            }

            if self.timer.now() >= deadline {
                return Ok(false);
            }
            self.timer.delay_ms(self.config.poll_step_ms());
        }
    }
}
