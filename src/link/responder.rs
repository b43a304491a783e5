use embedded_hal::blocking::delay::DelayMs;

use crate::config::LinkConfig;
use crate::radio::{Radio, RadioError};
use crate::status::{Signal, StatusIndicator, RX_PULSE_MS};

use super::{complete_transmission, drain_crc_failure, message, Clock, Fault, LinkStats};

/// Device B: listens continuously and answers every ping with a pong
///
/// `N` is the receive buffer capacity; requests longer than `N - 1` bytes
/// are truncated before being echoed.
pub struct Responder<R, T, S, const N: usize = 64> {
    radio: R,
    timer: T,
    status: S,
    config: LinkConfig,
    stats: LinkStats,
    buffer: [u8; N],
}

impl<R, T, S, const N: usize> Responder<R, T, S, N>
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
            stats: LinkStats::default(),
            buffer: [0; N],
        }
    }

    /// Enter continuous receive
    pub fn start(&mut self) -> Result<(), Fault> {
        self.radio.listen()?;
        info!("responder listening");
        Ok(())
    }

    /// Handle at most one pending packet
    ///
    /// Yields the length of the pong sent, or `WouldBlock` when nothing
    /// needed a reply.
    pub fn poll(&mut self) -> nb::Result<usize, Fault> {
        match self.handle() {
            Ok(Some(len)) => Ok(len),
            Ok(None) => Err(nb::Error::WouldBlock),
            Err(fault) => Err(nb::Error::Other(fault)),
        }
    }

    /// One iteration of the responder loop: poll, then pause
    pub fn step(&mut self) -> Result<Option<usize>, Fault> {
        let handled = match self.poll() {
            Ok(len) => Some(len),
            Err(nb::Error::WouldBlock) => None,
            Err(nb::Error::Other(fault)) => return Err(fault),
        };
        self.timer.delay_ms(self.config.responder_poll_ms);
        Ok(handled)
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

    fn handle(&mut self) -> Result<Option<usize>, Fault> {
        drain_crc_failure(&mut self.radio, &mut self.status, &mut self.stats);

        let reception = match self.radio.receive_if_ready(&mut self.buffer)? {
            Some(reception) => reception,
            None => return Ok(None),
        };
        if reception.is_truncated() {
            self.stats.truncated += 1;
            self.status.report(&Fault::TruncatedReceive {
                reported: reception.reported,
                delivered: reception.len,
            });
        }
        self.status.pulse(Signal::Receive, RX_PULSE_MS);

        let request = &self.buffer[..reception.len];
        if !message::is_request(request) {
            debug!("ignoring {} bytes without ping marker", reception.len);
            self.stats.ignored += 1;
            return Ok(None);
        }

        let reply = message::reply(request);
        let sent = match self.radio.send(&reply) {
            Ok(()) => complete_transmission(
                &mut self.radio,
                &mut self.timer,
                &mut self.status,
                &self.config,
                &mut self.stats,
            )?,
            Err(RadioError::OversizedPayload { len }) => {
                self.status.report(&Fault::OversizedPayload { len });
                false
            }
            Err(err) => return Err(err.into()),
        };

        self.radio.listen()?;

        if sent {
            info!("pong sent ({} bytes)", reply.len());
            self.stats.replies += 1;
            Ok(Some(reply.len()))
        } else {
            self.stats.send_failures += 1;
            Ok(None)
        }
    }
}
