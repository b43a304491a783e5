//! SX127x radio driver
//!
//! Owns the chip's operating mode and turns configure / send / listen /
//! receive intents into register sequences. Completion of a transmission or
//! reception is signalled on DIO0; [`Sx127x::service_interrupt`] is the body
//! of that interrupt handler and feeds the [`EventMailbox`].
//!
//! Nothing else posts events. A driver without an interrupt path never sees
//! TransmitDone or ReceiveDone, so every wait for them times out. Install it
//! in a [`SharedRadio`](super::SharedRadio) and call
//! [`SharedRadio::on_interrupt`](super::SharedRadio::on_interrupt) on the
//! DIO0 rising edge.

use embedded_hal::{
    blocking::{
        delay::DelayMs,
        spi::{Transfer, Write},
    },
    digital::v2::OutputPin,
};

use crate::config::radio::{frf_bytes, frf_from_hz, RadioConfig};
use crate::irq::{EventMailbox, IrqEvent, IrqFlags};

use super::interface::RegisterInterface;
use super::registers::{
    Register, DIO0_RX_TX_DONE, EXPECTED_VERSION, IRQ_CLEAR_ALL, MAX_PAYLOAD_LEN, MODE_LONG_RANGE,
};
use super::traits::{Radio, RadioError, RadioMode, Reception};

/// Time the reset line is held low
pub const RESET_PULSE_MS: u32 = 10;
/// Time between releasing reset and the first register access
pub const RESET_SETTLE_MS: u32 = 10;

/// Carriers below this use the low-frequency port, which shifts the RSSI scale
const LOW_FREQUENCY_PORT_MAX_HZ: u32 = 779_000_000;

/// SX127x Radio Driver
pub struct Sx127x<'a, SPI, CS, RESET, DELAY> {
    bus: RegisterInterface<SPI, CS>,
    reset: RESET,
    delay: DELAY,
    events: &'a EventMailbox,
    config: RadioConfig,
    mode: RadioMode,
}

impl<'a, SPI, CS, RESET, DELAY> Sx127x<'a, SPI, CS, RESET, DELAY>
where
    SPI: Transfer<u8> + Write<u8>,
    CS: OutputPin,
    RESET: OutputPin,
    DELAY: DelayMs<u32>,
{
    /// Create new instance of SX127x driver
    ///
    /// Does not touch the chip beyond deselecting it; call
    /// [`initialize`](Self::initialize) before anything else.
    pub fn new(
        spi: SPI,
        cs: CS,
        reset: RESET,
        delay: DELAY,
        events: &'a EventMailbox,
        config: RadioConfig,
    ) -> Result<Self, RadioError> {
        Ok(Self {
            bus: RegisterInterface::new(spi, cs)?,
            reset,
            delay,
            events,
            config,
            mode: RadioMode::Sleep,
        })
    }

    /// Pulse the reset line and wait for the chip to come up
    ///
    /// The chip wakes in FSK standby; the owned mode reads `Sleep` until
    /// [`initialize`](Self::initialize) commands LoRa sleep, which it does
    /// first thing.
    pub fn reset(&mut self) -> Result<(), RadioError> {
        self.reset.set_low().map_err(|_| RadioError::Gpio)?;
        self.delay.delay_ms(RESET_PULSE_MS);
        self.reset.set_high().map_err(|_| RadioError::Gpio)?;
        self.delay.delay_ms(RESET_SETTLE_MS);
        self.mode = RadioMode::Sleep;
        Ok(())
    }

    /// Reset the chip, apply the configuration and check the silicon revision
    ///
    /// A wrong `Version` (wiring fault, missing module) yields
    /// [`RadioError::HardwareAbsent`]; the caller decides whether that is fatal.
    pub fn initialize(&mut self) -> Result<(), RadioError> {
        self.reset()?;
        self.set_mode(RadioMode::Sleep)?;
        self.set_mode(RadioMode::Standby)?;

        self.write_frequency(self.config.frequency)?;
        self.bus
            .write_register(Register::PaConfig, self.config.output_power.register_value())?;
        self.bus
            .write_register(Register::ModemConfig1, self.config.modem_config1())?;
        self.bus
            .write_register(Register::ModemConfig2, self.config.modem_config2())?;
        let [preamble_msb, preamble_lsb] = self.config.preamble_bytes();
        self.bus.write_register(Register::PreambleMsb, preamble_msb)?;
        self.bus.write_register(Register::PreambleLsb, preamble_lsb)?;
        self.bus.write_register(Register::FifoTxBaseAddr, 0x00)?;
        self.bus.write_register(Register::FifoRxBaseAddr, 0x00)?;
        self.bus.write_register(Register::DioMapping1, DIO0_RX_TX_DONE)?;

        let version = self.version()?;
        if version != EXPECTED_VERSION {
            error!("SX127x not detected (version {:#x})", version);
            return Err(RadioError::HardwareAbsent { version });
        }
        info!("SX127x detected (version {:#x})", version);

        self.events.reset();
        Ok(())
    }

    /// Set operating mode
    pub fn set_mode(&mut self, mode: RadioMode) -> Result<(), RadioError> {
        self.bus
            .write_register(Register::OpMode, MODE_LONG_RANGE | mode.code())?;
        trace!("mode {:?} -> {:?}", self.mode, mode);
        self.mode = mode;
        Ok(())
    }

    /// Current operating mode
    pub fn mode(&self) -> RadioMode {
        self.mode
    }

    /// Configuration applied at initialization
    pub fn config(&self) -> &RadioConfig {
        &self.config
    }

    /// Re-tune the carrier; kept for the next [`recover`](Self::recover) too
    pub fn set_frequency(&mut self, frequency: u32) -> Result<(), RadioError> {
        self.write_frequency(frequency)?;
        self.config.frequency = frequency;
        Ok(())
    }

    fn write_frequency(&mut self, frequency: u32) -> Result<(), RadioError> {
        let [msb, mid, lsb] = frf_bytes(frf_from_hz(frequency));
        self.bus.write_register(Register::FrfMsb, msb)?;
        self.bus.write_register(Register::FrfMid, mid)?;
        self.bus.write_register(Register::FrfLsb, lsb)
    }

    /// Silicon revision, 0x12 on a healthy SX1276/77/78/79
    pub fn version(&mut self) -> Result<u8, RadioError> {
        self.bus.read_register(Register::Version)
    }

    /// Load `payload` into the FIFO and start transmitting it
    ///
    /// The chip clears Transmit mode on its own and raises TransmitDone;
    /// this call does not wait for that.
    pub fn send(&mut self, payload: &[u8]) -> Result<(), RadioError> {
        if payload.len() > MAX_PAYLOAD_LEN {
            return Err(RadioError::OversizedPayload { len: payload.len() });
        }

        self.set_mode(RadioMode::Standby)?;
        self.bus.write_register(Register::FifoAddrPtr, 0x00)?;
        self.bus.write_fifo(payload)?;
        self.bus
            .write_register(Register::PayloadLength, payload.len() as u8)?;
        self.events.clear(IrqEvent::TransmitDone);
        self.set_mode(RadioMode::Transmit)?;

        info!("sending {} bytes", payload.len());
        Ok(())
    }

    /// Copy the last received packet into `buffer` if ReceiveDone is pending
    ///
    /// At most `buffer.len() - 1` bytes are delivered; a longer packet is
    /// truncated and logged.
    pub fn receive_if_ready(
        &mut self,
        buffer: &mut [u8],
    ) -> Result<Option<Reception>, RadioError> {
        if !self.events.take(IrqEvent::ReceiveDone) {
            return Ok(None);
        }

        let reported = self.bus.read_register(Register::RxNbBytes)? as usize;
        let capacity = buffer.len().saturating_sub(1);
        let len = if reported > capacity {
            warn!(
                "received {} bytes, truncated to {}",
                reported,
                capacity
            );
            capacity
        } else {
            reported
        };

        let fifo_addr = self.bus.read_register(Register::FifoRxCurrentAddr)?;
        self.bus.write_register(Register::FifoAddrPtr, fifo_addr)?;
        self.bus.read_fifo(&mut buffer[..len])?;

        info!("received {} bytes", len);
        Ok(Some(Reception { len, reported }))
    }

    /// DIO0 interrupt body: read, clear and decode `IrqFlags`
    ///
    /// The flags are cleared whatever they contain. The decoded event is
    /// posted to the mailbox and returned.
    pub fn service_interrupt(&mut self) -> Result<IrqEvent, RadioError> {
        let raw = self.bus.read_register(Register::IrqFlags)?;
        self.bus.write_register(Register::IrqFlags, IRQ_CLEAR_ALL)?;

        let event = IrqEvent::decode(IrqFlags::from_bits_retain(raw));
        debug!("irq flags {:#x} -> {:?}", raw, event);

        match event {
            IrqEvent::TransmitDone if self.mode == RadioMode::Transmit => {
                self.mode = RadioMode::Standby;
            }
            IrqEvent::CrcError => warn!("payload CRC error, packet discarded"),
            _ => {}
        }

        self.events.post(event);
        Ok(event)
    }

    /// RSSI of the last packet in dBm
    pub fn packet_rssi(&mut self) -> Result<i16, RadioError> {
        let raw = self.bus.read_register(Register::PktRssiValue)? as i16;
        let offset = if self.config.frequency < LOW_FREQUENCY_PORT_MAX_HZ {
            -164
        } else {
            -157
        };
        Ok(offset + raw)
    }

    /// SNR of the last packet in dB
    pub fn packet_snr(&mut self) -> Result<i8, RadioError> {
        let raw = self.bus.read_register(Register::PktSnrValue)?;
        Ok((raw as i8) / 4)
    }

    /// Reset the chip and apply the stored configuration again
    pub fn recover(&mut self) -> Result<(), RadioError> {
        warn!("re-initializing radio");
        self.initialize()
    }

    /// Give back the owned peripherals
    pub fn release(self) -> (SPI, CS, RESET, DELAY) {
        let (spi, cs) = self.bus.release();
        (spi, cs, self.reset, self.delay)
    }
}

impl<'a, SPI, CS, RESET, DELAY> Radio for Sx127x<'a, SPI, CS, RESET, DELAY>
where
    SPI: Transfer<u8> + Write<u8>,
    CS: OutputPin,
    RESET: OutputPin,
    DELAY: DelayMs<u32>,
{
    fn mode(&self) -> RadioMode {
        self.mode
    }

    fn set_mode(&mut self, mode: RadioMode) -> Result<(), RadioError> {
        Sx127x::set_mode(self, mode)
    }

    fn send(&mut self, payload: &[u8]) -> Result<(), RadioError> {
        Sx127x::send(self, payload)
    }

    fn receive_if_ready(&mut self, buffer: &mut [u8]) -> Result<Option<Reception>, RadioError> {
        Sx127x::receive_if_ready(self, buffer)
    }

    fn take_event(&mut self, event: IrqEvent) -> bool {
        self.events.take(event)
    }

    fn clear_event(&mut self, event: IrqEvent) {
        self.events.clear(event)
    }

    fn initialize(&mut self) -> Result<(), RadioError> {
        Sx127x::initialize(self)
    }

    fn recover(&mut self) -> Result<(), RadioError> {
        Sx127x::recover(self)
    }
}
