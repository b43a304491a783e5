//! SX127x LoRa-mode register map
//!
//! Only the registers this driver touches are listed.

/// Register addresses (7-bit)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum Register {
    /// FIFO read/write access
    Fifo = 0x00,
    /// Operating mode and LoRa mode select
    OpMode = 0x01,
    /// Carrier frequency, bits 23..16
    FrfMsb = 0x06,
    /// Carrier frequency, bits 15..8
    FrfMid = 0x07,
    /// Carrier frequency, bits 7..0
    FrfLsb = 0x08,
    /// PA selection and output power
    PaConfig = 0x09,
    /// SPI cursor into the FIFO
    FifoAddrPtr = 0x0D,
    /// Start of the transmit area in the FIFO
    FifoTxBaseAddr = 0x0E,
    /// Start of the receive area in the FIFO
    FifoRxBaseAddr = 0x0F,
    /// Start address of the last received packet
    FifoRxCurrentAddr = 0x10,
    /// Interrupt flags, write 1 to clear
    IrqFlags = 0x12,
    /// Length of the last received packet
    RxNbBytes = 0x13,
    /// SNR of the last packet, in quarter dB
    PktSnrValue = 0x19,
    /// RSSI of the last packet
    PktRssiValue = 0x1A,
    /// Bandwidth, coding rate, header mode
    ModemConfig1 = 0x1D,
    /// Spreading factor, CRC enable
    ModemConfig2 = 0x1E,
    /// Preamble length, high byte
    PreambleMsb = 0x20,
    /// Preamble length, low byte
    PreambleLsb = 0x21,
    /// Number of bytes to transmit
    PayloadLength = 0x22,
    /// DIO0..DIO3 function mapping
    DioMapping1 = 0x40,
    /// Silicon revision
    Version = 0x42,
}

impl Register {
    /// Register address
    pub fn addr(self) -> u8 {
        self as u8
    }
}

/// Write bit of the SPI address byte
pub const SPI_WRITE: u8 = 0x80;

/// Mask selecting the 7 address bits of the SPI address byte
pub const SPI_ADDR_MASK: u8 = 0x7F;

/// `OpMode` bit 7: LoRa (long range) mode
pub const MODE_LONG_RANGE: u8 = 0x80;

/// Silicon revision reported by SX1276/77/78/79 in `Version`
pub const EXPECTED_VERSION: u8 = 0x12;

/// Largest payload the FIFO framing supports
pub const MAX_PAYLOAD_LEN: usize = 255;

/// Value that clears every bit of `IrqFlags`
pub const IRQ_CLEAR_ALL: u8 = 0xFF;

/// `DioMapping1` value routing RxDone (RX) and TxDone (TX) to DIO0
pub const DIO0_RX_TX_DONE: u8 = 0x00;
