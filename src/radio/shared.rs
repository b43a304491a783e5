//! Radio shared between main and interrupt context
//!
//! The DIO0 handler has to talk to the chip (read and clear `IrqFlags`) while
//! the main context may be halfway through its own register sequence. Every
//! access therefore goes through one `critical_section::Mutex`: a chip-select
//! pair is never interleaved, and each [`Radio`] call on `&SharedRadio` is a
//! single critical section with respect to the handler.
//!
//! That includes `initialize` and `recover`: the reset pulse and settle time
//! (20 ms of blocking delay) run with interrupts masked. DIO0 edges in that
//! window stay pending and are serviced once the section ends, after the
//! mailbox has been reset.
//!
//! ```ignore
//! static EVENTS: EventMailbox = EventMailbox::new();
//! static RADIO: SharedRadio<Board> = SharedRadio::new();
//!
//! RADIO.install(Sx127x::new(spi, cs, reset, delay, &EVENTS, RadioConfig::default())?);
//!
//! #[interrupt]
//! fn IO_IRQ_BANK0() {
//!     RADIO.on_interrupt();
//! }
//! ```

use core::cell::RefCell;

use critical_section::Mutex;
use embedded_hal::{
    blocking::{
        delay::DelayMs,
        spi::{Transfer, Write},
    },
    digital::v2::OutputPin,
};

use crate::irq::IrqEvent;

use super::sx127x::Sx127x;
use super::traits::{Radio, RadioError, RadioMode, Reception};

/// Interrupt-safe home for a radio driver
pub struct SharedRadio<R> {
    inner: Mutex<RefCell<Option<R>>>,
}

impl<R> SharedRadio<R> {
    /// Empty slot, usable in a `static`
    pub const fn new() -> Self {
        Self {
            inner: Mutex::new(RefCell::new(None)),
        }
    }

    /// Put the driver in place, returning the previous one
    pub fn install(&self, radio: R) -> Option<R> {
        critical_section::with(|cs| self.inner.borrow_ref_mut(cs).replace(radio))
    }

    /// Take the driver out again
    pub fn take(&self) -> Option<R> {
        critical_section::with(|cs| self.inner.borrow_ref_mut(cs).take())
    }

    /// Run `f` on the driver inside a critical section
    pub fn lock<T>(&self, f: impl FnOnce(&mut R) -> Result<T, RadioError>) -> Result<T, RadioError> {
        critical_section::with(|cs| match self.inner.borrow_ref_mut(cs).as_mut() {
            Some(radio) => f(radio),
            None => Err(RadioError::NotInstalled),
        })
    }
}

impl<R> Default for SharedRadio<R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a, SPI, CS, RESET, DELAY> SharedRadio<Sx127x<'a, SPI, CS, RESET, DELAY>>
where
    SPI: Transfer<u8> + Write<u8>,
    CS: OutputPin,
    RESET: OutputPin,
    DELAY: DelayMs<u32>,
{
    /// DIO0 rising-edge handler body
    ///
    /// Bus errors cannot be propagated out of an interrupt; they are logged and
    /// reported as `IrqEvent::None`.
    pub fn on_interrupt(&self) -> IrqEvent {
        match self.lock(|radio| radio.service_interrupt()) {
            Ok(event) => event,
            Err(err) => {
                error!("irq service failed: {:?}", err);
                IrqEvent::None
            }
        }
    }
}

impl<R: Radio> Radio for &SharedRadio<R> {
    fn mode(&self) -> RadioMode {
        critical_section::with(|cs| {
            self.inner
                .borrow_ref(cs)
                .as_ref()
                .map_or(RadioMode::Sleep, |radio| radio.mode())
        })
    }

    fn set_mode(&mut self, mode: RadioMode) -> Result<(), RadioError> {
        self.lock(|radio| radio.set_mode(mode))
    }

    fn send(&mut self, payload: &[u8]) -> Result<(), RadioError> {
        self.lock(|radio| radio.send(payload))
    }

    fn receive_if_ready(&mut self, buffer: &mut [u8]) -> Result<Option<Reception>, RadioError> {
        self.lock(|radio| radio.receive_if_ready(buffer))
    }

    fn take_event(&mut self, event: IrqEvent) -> bool {
        self.lock(|radio| Ok(radio.take_event(event)))
            .unwrap_or(false)
    }

    fn clear_event(&mut self, event: IrqEvent) {
        let _ = self.lock(|radio| {
            radio.clear_event(event);
            Ok(())
        });
    }

    fn initialize(&mut self) -> Result<(), RadioError> {
        self.lock(|radio| radio.initialize())
    }

    fn recover(&mut self) -> Result<(), RadioError> {
        self.lock(|radio| radio.recover())
    }
}
