use crate::irq::IrqEvent;

/// Possible errors in radio operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RadioError {
    /// SPI transfer error
    Spi,
    /// GPIO error (chip-select or reset pin)
    Gpio,
    /// The `Version` register did not hold the expected silicon revision
    HardwareAbsent {
        /// Value actually read
        version: u8,
    },
    /// Payload longer than the 255 bytes the FIFO framing allows
    OversizedPayload {
        /// Rejected payload length
        len: usize,
    },
    /// A shared radio was used before a driver was installed in it
    NotInstalled,
}

/// Operating mode of the transceiver
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum RadioMode {
    /// Lowest power, FIFO inaccessible
    Sleep = 0x00,
    /// Oscillator running, ready for configuration
    Standby = 0x01,
    /// Transmitting the FIFO contents; the chip returns to Standby when done
    Transmit = 0x03,
    /// Receiving packets until told otherwise
    ReceiveContinuous = 0x05,
}

impl RadioMode {
    /// Mode bits of the `OpMode` register
    pub fn code(self) -> u8 {
        self as u8
    }
}

/// Outcome of a successful FIFO read
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Reception {
    /// Bytes copied into the caller's buffer
    pub len: usize,
    /// Length announced by the chip in `RxNbBytes`
    pub reported: usize,
}

impl Reception {
    /// The chip announced more bytes than the buffer could take
    pub fn is_truncated(&self) -> bool {
        self.reported > self.len
    }
}

/// Radio contract driven by the link protocol
///
/// Implemented by the SX127x driver, by the interrupt-safe shared wrapper and
/// by test doubles.
pub trait Radio {
    /// Current operating mode as last commanded
    fn mode(&self) -> RadioMode;

    /// Switch operating mode
    fn set_mode(&mut self, mode: RadioMode) -> Result<(), RadioError>;

    /// Load `payload` into the FIFO and start transmitting it
    ///
    /// Returns without waiting for the transmission to finish.
    fn send(&mut self, payload: &[u8]) -> Result<(), RadioError>;

    /// Copy the last received packet into `buffer` if a ReceiveDone event is pending
    ///
    /// At most `buffer.len() - 1` bytes are copied.
    fn receive_if_ready(&mut self, buffer: &mut [u8]) -> Result<Option<Reception>, RadioError>;

    /// Consume a pending event of the given kind
    fn take_event(&mut self, event: IrqEvent) -> bool;

    /// Forget a pending event of the given kind
    fn clear_event(&mut self, event: IrqEvent);

    /// Reset the chip, apply the stored configuration and verify the silicon
    fn initialize(&mut self) -> Result<(), RadioError>;

    /// Bring a misbehaving radio back to a known state
    fn recover(&mut self) -> Result<(), RadioError> {
        self.initialize()
    }

    /// Enter continuous receive
    fn listen(&mut self) -> Result<(), RadioError> {
        self.set_mode(RadioMode::ReceiveContinuous)
    }

    /// Put the radio into standby mode
    fn standby(&mut self) -> Result<(), RadioError> {
        self.set_mode(RadioMode::Standby)
    }

    /// Put the radio into sleep mode
    fn sleep(&mut self) -> Result<(), RadioError> {
        self.set_mode(RadioMode::Sleep)
    }
}
