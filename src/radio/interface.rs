//! Chip-select guarded SPI transactions
//!
//! Every operation here is one bus transaction: chip-select goes low, the
//! address byte and data are clocked, chip-select goes high again. The pin is
//! released even when the SPI transfer itself fails.

use embedded_hal::{
    blocking::spi::{Transfer, Write},
    digital::v2::OutputPin,
};

use super::registers::{Register, SPI_ADDR_MASK, SPI_WRITE};
use super::traits::RadioError;

/// Register and FIFO access over SPI with a software chip-select
pub struct RegisterInterface<SPI, CS> {
    spi: SPI,
    cs: CS,
}

impl<SPI, CS> RegisterInterface<SPI, CS>
where
    SPI: Transfer<u8> + Write<u8>,
    CS: OutputPin,
{
    /// Take ownership of the bus and leave the chip deselected
    pub fn new(spi: SPI, mut cs: CS) -> Result<Self, RadioError> {
        cs.set_high().map_err(|_| RadioError::Gpio)?;
        Ok(Self { spi, cs })
    }

    /// Run `op` with the chip selected
    fn transaction<T>(
        &mut self,
        op: impl FnOnce(&mut SPI) -> Result<T, RadioError>,
    ) -> Result<T, RadioError> {
        self.cs.set_low().map_err(|_| RadioError::Gpio)?;
        let result = op(&mut self.spi);
        self.cs.set_high().map_err(|_| RadioError::Gpio)?;
        result
    }

    /// Write one register
    pub fn write_register(&mut self, reg: Register, value: u8) -> Result<(), RadioError> {
        let buffer = [reg.addr() | SPI_WRITE, value];
        self.transaction(|spi| spi.write(&buffer).map_err(|_| RadioError::Spi))
    }

    /// Read one register
    pub fn read_register(&mut self, reg: Register) -> Result<u8, RadioError> {
        let mut buffer = [reg.addr() & SPI_ADDR_MASK, 0];
        self.transaction(|spi| {
            spi.transfer(&mut buffer).map_err(|_| RadioError::Spi)?;
            Ok(())
        })?;
        Ok(buffer[1])
    }

    /// Burst-write `data` into the FIFO at the current `FifoAddrPtr`
    pub fn write_fifo(&mut self, data: &[u8]) -> Result<(), RadioError> {
        let header = [Register::Fifo.addr() | SPI_WRITE];
        self.transaction(|spi| {
            spi.write(&header).map_err(|_| RadioError::Spi)?;
            spi.write(data).map_err(|_| RadioError::Spi)
        })
    }

    /// Burst-read `buffer.len()` bytes from the FIFO at the current `FifoAddrPtr`
    pub fn read_fifo(&mut self, buffer: &mut [u8]) -> Result<(), RadioError> {
        let header = [Register::Fifo.addr() & SPI_ADDR_MASK];
        buffer.fill(0);
        self.transaction(|spi| {
            spi.write(&header).map_err(|_| RadioError::Spi)?;
            spi.transfer(buffer).map_err(|_| RadioError::Spi)?;
            Ok(())
        })
    }

    /// Give back the SPI bus and chip-select pin
    pub fn release(self) -> (SPI, CS) {
        (self.spi, self.cs)
    }
}
