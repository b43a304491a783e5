//! Ping/Pong link protocol
//!
//! Two mutually exclusive roles share one radio link:
//! - [`Initiator`]: sends `"Ping <n>"` and waits a bounded time for a pong
//! - [`Responder`]: listens continuously and answers every ping
//!
//! Waiting is bounded busy polling against deadlines taken from a [`Clock`],
//! with a blocking delay between polls.

use core::time::Duration;

use embedded_hal::blocking::delay::DelayMs;

use crate::config::{LinkConfig, TxCompletion};
use crate::irq::IrqEvent;
use crate::radio::{Radio, RadioError};
use crate::status::{Signal, StatusIndicator, TX_PULSE_MS};

/// Initiator (Ping) role
pub mod initiator;

/// Request and reply payloads
pub mod message;

/// Responder (Pong) role
pub mod responder;

pub use initiator::{Initiator, LinkState, RoundOutcome};
pub use responder::Responder;

/// Monotonic time source
pub trait Clock {
    /// Time elapsed since an arbitrary fixed origin
    fn now(&self) -> Duration;
}

/// Everything that can go wrong on the link
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Fault {
    /// The radio did not report the expected silicon revision
    HardwareAbsent {
        /// Value read from the `Version` register
        version: u8,
    },
    /// A payload longer than 255 bytes was rejected
    OversizedPayload {
        /// Rejected length
        len: usize,
    },
    /// A packet was longer than the receive buffer and got cut
    TruncatedReceive {
        /// Length announced by the chip
        reported: usize,
        /// Bytes actually delivered
        delivered: usize,
    },
    /// A packet failed its CRC check and was dropped
    CrcFailure,
    /// No reply arrived within the reply window
    ProtocolTimeout {
        /// Sequence number of the abandoned ping
        sequence: u32,
    },
    /// TransmitDone did not arrive in time
    TransmitTimeout,
    /// SPI or GPIO failure
    Bus(RadioError),
}

impl Fault {
    /// Whether the fault stops the node for good
    pub fn is_fatal(&self) -> bool {
        matches!(self, Fault::HardwareAbsent { .. } | Fault::Bus(_))
    }
}

impl From<RadioError> for Fault {
    fn from(error: RadioError) -> Self {
        match error {
            RadioError::HardwareAbsent { version } => Fault::HardwareAbsent { version },
            RadioError::OversizedPayload { len } => Fault::OversizedPayload { len },
            other => Fault::Bus(other),
        }
    }
}

/// Link counters since the role was created
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct LinkStats {
    /// Rounds started (initiator)
    pub rounds: u32,
    /// Pongs received (initiator) or sent (responder)
    pub replies: u32,
    /// Rounds without a reply
    pub timeouts: u32,
    /// Sends rejected or unconfirmed
    pub send_failures: u32,
    /// TransmitDone waits that expired
    pub tx_timeouts: u32,
    /// Packets dropped for a bad CRC
    pub crc_failures: u32,
    /// Packets cut to fit the receive buffer
    pub truncated: u32,
    /// Packets without the expected marker
    pub ignored: u32,
}

fn millis(ms: u32) -> Duration {
    Duration::from_millis(ms as u64)
}

/// Report a CRC failure latched since the last poll
fn drain_crc_failure<R, S>(radio: &mut R, status: &mut S, stats: &mut LinkStats)
where
    R: Radio,
    S: StatusIndicator,
{
    if radio.take_event(IrqEvent::CrcError) {
        stats.crc_failures += 1;
        status.report(&Fault::CrcFailure);
    }
}

/// Finish a transmission started by `Radio::send` according to the policy
///
/// Returns `Ok(false)` when TransmitDone never came; the radio has then been
/// re-initialized. Fails only on faults that stop the node.
fn complete_transmission<R, T, S>(
    radio: &mut R,
    timer: &mut T,
    status: &mut S,
    config: &LinkConfig,
    stats: &mut LinkStats,
) -> Result<bool, Fault>
where
    R: Radio,
    T: Clock + DelayMs<u32>,
    S: StatusIndicator,
{
    match config.tx_completion {
        TxCompletion::FixedDelay { settle_ms } => timer.delay_ms(settle_ms),
        TxCompletion::AwaitTxDone { timeout_ms } => {
            let deadline = timer.now() + millis(timeout_ms);
            while !radio.take_event(IrqEvent::TransmitDone) {
                if timer.now() >= deadline {
                    stats.tx_timeouts += 1;
                    status.report(&Fault::TransmitTimeout);
                    radio.recover()?;
                    return Ok(false);
                }
                timer.delay_ms(config.poll_step_ms());
            }
        }
    }

    status.pulse(Signal::Transmit, TX_PULSE_MS);
    Ok(true)
}
