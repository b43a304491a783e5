//! Status indication
//!
//! The link layer signals outcomes through a [`StatusIndicator`]:
//! - Transmit pulse after every send
//! - Receive pulse after every packet read from the FIFO
//! - Error pulse once per non-fatal fault
//! - Endless blink when the node halts on a fatal fault

use embedded_hal::{blocking::delay::DelayMs, digital::v2::OutputPin};

use crate::link::Fault;

/// Transmit pulse length in milliseconds
pub const TX_PULSE_MS: u32 = 100;
/// Receive pulse length in milliseconds
pub const RX_PULSE_MS: u32 = 100;
/// Error pulse length in milliseconds
pub const ERROR_PULSE_MS: u32 = 500;
/// Half period of the fatal blink in milliseconds
pub const FATAL_BLINK_MS: u32 = 200;

/// What an indication means
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Signal {
    /// A packet was sent
    Transmit,
    /// A packet was received
    Receive,
    /// Something went wrong
    Error,
}

/// Sink for status indications
pub trait StatusIndicator {
    /// Show `signal` for `duration_ms`, blocking meanwhile
    fn pulse(&mut self, signal: Signal, duration_ms: u32);

    /// Enter the permanent failure state
    ///
    /// Hardware implementations never return.
    fn halt(&mut self, fault: &Fault);

    /// Log a non-fatal fault and signal it once
    fn report(&mut self, fault: &Fault) {
        warn!("link fault: {:?}", fault);
        self.pulse(Signal::Error, ERROR_PULSE_MS);
    }
}

/// Three LEDs: transmit, receive and error
pub struct LedIndicator<TX, RX, ERR, D> {
    tx: TX,
    rx: RX,
    err: ERR,
    delay: D,
}

impl<TX, RX, ERR, D> LedIndicator<TX, RX, ERR, D>
where
    TX: OutputPin,
    RX: OutputPin,
    ERR: OutputPin,
    D: DelayMs<u32>,
{
    /// Create the indicator with every LED off
    pub fn new(mut tx: TX, mut rx: RX, mut err: ERR, delay: D) -> Self {
        tx.set_low().ok();
        rx.set_low().ok();
        err.set_low().ok();
        Self { tx, rx, err, delay }
    }

    /// Give back the pins and the delay
    pub fn release(self) -> (TX, RX, ERR, D) {
        (self.tx, self.rx, self.err, self.delay)
    }
}

fn blink<P: OutputPin, D: DelayMs<u32>>(pin: &mut P, delay: &mut D, duration_ms: u32) {
    pin.set_high().ok();
    delay.delay_ms(duration_ms);
    pin.set_low().ok();
}

impl<TX, RX, ERR, D> StatusIndicator for LedIndicator<TX, RX, ERR, D>
where
    TX: OutputPin,
    RX: OutputPin,
    ERR: OutputPin,
    D: DelayMs<u32>,
{
    fn pulse(&mut self, signal: Signal, duration_ms: u32) {
        match signal {
            Signal::Transmit => blink(&mut self.tx, &mut self.delay, duration_ms),
            Signal::Receive => blink(&mut self.rx, &mut self.delay, duration_ms),
            Signal::Error => blink(&mut self.err, &mut self.delay, duration_ms),
        }
    }

    fn halt(&mut self, fault: &Fault) {
        error!("fatal: {:?}", fault);
        loop {
            blink(&mut self.err, &mut self.delay, FATAL_BLINK_MS);
            self.delay.delay_ms(FATAL_BLINK_MS);
        }
    }
}
