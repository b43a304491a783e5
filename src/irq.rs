//! Interrupt event model
//!
//! The SX127x raises DIO0 on a rising edge when a packet has been sent or
//! received. The handler reads `IrqFlags`, clears it by writing all ones and
//! decodes the flags into one [`IrqEvent`]. Events reach the main context
//! through an [`EventMailbox`]: one latch per event kind, so only the
//! latest occurrence of each kind is kept.

use core::sync::atomic::{AtomicBool, Ordering};

use bitflags::bitflags;

bitflags! {
    /// Contents of the `IrqFlags` register
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct IrqFlags: u8 {
        /// Receive window elapsed (single receive only)
        const RX_TIMEOUT = 0x80;
        /// Packet reception complete
        const RX_DONE = 0x40;
        /// Payload CRC check failed
        const PAYLOAD_CRC_ERROR = 0x20;
        /// Valid header received
        const VALID_HEADER = 0x10;
        /// FIFO payload transmission complete
        const TX_DONE = 0x08;
        /// Channel activity detection finished
        const CAD_DONE = 0x04;
        /// Frequency hopping channel change
        const FHSS_CHANGE_CHANNEL = 0x02;
        /// Channel activity detected
        const CAD_DETECTED = 0x01;
    }
}

/// Event decoded from one DIO0 interrupt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum IrqEvent {
    /// No flag of interest was set
    None,
    /// The transmission finished and the chip went back to standby
    TransmitDone,
    /// A packet with a valid CRC is waiting in the FIFO
    ReceiveDone,
    /// A packet arrived with a bad CRC and must be discarded
    CrcError,
}

impl IrqEvent {
    /// Decode `flags`, first match wins
    ///
    /// The chip raises RX_DONE together with PAYLOAD_CRC_ERROR, so a CRC error
    /// takes precedence over a receive.
    pub fn decode(flags: IrqFlags) -> Self {
        if flags.contains(IrqFlags::PAYLOAD_CRC_ERROR) {
            IrqEvent::CrcError
        } else if flags.contains(IrqFlags::RX_DONE) {
            IrqEvent::ReceiveDone
        } else if flags.contains(IrqFlags::TX_DONE) {
            IrqEvent::TransmitDone
        } else {
            IrqEvent::None
        }
    }
}

/// Single-slot, overwrite-tolerant handoff from interrupt to main context
///
/// One latch per event kind. Only plain atomic loads and stores are used, so
/// it works on cores without compare-and-swap (Cortex-M0+). A post landing
/// between the load and the store of a `take` merges into the occurrence
/// being taken.
pub struct EventMailbox {
    transmit_done: AtomicBool,
    receive_done: AtomicBool,
    crc_error: AtomicBool,
}

impl EventMailbox {
    /// Empty mailbox
    pub const fn new() -> Self {
        Self {
            transmit_done: AtomicBool::new(false),
            receive_done: AtomicBool::new(false),
            crc_error: AtomicBool::new(false),
        }
    }

    fn latch(&self, event: IrqEvent) -> Option<&AtomicBool> {
        match event {
            IrqEvent::None => None,
            IrqEvent::TransmitDone => Some(&self.transmit_done),
            IrqEvent::ReceiveDone => Some(&self.receive_done),
            IrqEvent::CrcError => Some(&self.crc_error),
        }
    }

    /// Record an occurrence of `event`; `IrqEvent::None` is not recorded
    pub fn post(&self, event: IrqEvent) {
        if let Some(latch) = self.latch(event) {
            latch.store(true, Ordering::Release);
        }
    }

    /// Consume a pending `event`, returning whether one was pending
    pub fn take(&self, event: IrqEvent) -> bool {
        match self.latch(event) {
            Some(latch) if latch.load(Ordering::Acquire) => {
                latch.store(false, Ordering::Release);
                true
            }
            _ => false,
        }
    }

    /// Forget a pending `event`
    pub fn clear(&self, event: IrqEvent) {
        if let Some(latch) = self.latch(event) {
            latch.store(false, Ordering::Release);
        }
    }

    /// Whether `event` is pending, without consuming it
    pub fn is_pending(&self, event: IrqEvent) -> bool {
        self.latch(event)
            .map_or(false, |latch| latch.load(Ordering::Acquire))
    }

    /// Forget every pending event
    pub fn reset(&self) {
        self.clear(IrqEvent::TransmitDone);
        self.clear(IrqEvent::ReceiveDone);
        self.clear(IrqEvent::CrcError);
    }
}

impl Default for EventMailbox {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_priority() {
        assert_eq!(IrqEvent::decode(IrqFlags::RX_DONE), IrqEvent::ReceiveDone);
        assert_eq!(IrqEvent::decode(IrqFlags::TX_DONE), IrqEvent::TransmitDone);
        assert_eq!(
            IrqEvent::decode(IrqFlags::PAYLOAD_CRC_ERROR),
            IrqEvent::CrcError
        );
        assert_eq!(
            IrqEvent::decode(IrqFlags::RX_DONE | IrqFlags::PAYLOAD_CRC_ERROR),
            IrqEvent::CrcError
        );
        assert_eq!(
            IrqEvent::decode(IrqFlags::RX_DONE | IrqFlags::VALID_HEADER),
            IrqEvent::ReceiveDone
        );
        assert_eq!(IrqEvent::decode(IrqFlags::VALID_HEADER), IrqEvent::None);
        assert_eq!(IrqEvent::decode(IrqFlags::empty()), IrqEvent::None);
    }

    #[test]
    fn test_decode_raw_register_values() {
        assert_eq!(IrqEvent::decode(IrqFlags::from_bits_retain(0x50)), IrqEvent::ReceiveDone);
        assert_eq!(IrqEvent::decode(IrqFlags::from_bits_retain(0x70)), IrqEvent::CrcError);
        assert_eq!(IrqEvent::decode(IrqFlags::from_bits_retain(0x08)), IrqEvent::TransmitDone);
    }

    #[test]
    fn test_mailbox_take_consumes() {
        let mailbox = EventMailbox::new();
        assert!(!mailbox.take(IrqEvent::ReceiveDone));

        mailbox.post(IrqEvent::ReceiveDone);
        assert!(mailbox.is_pending(IrqEvent::ReceiveDone));
        assert!(!mailbox.is_pending(IrqEvent::TransmitDone));
        assert!(mailbox.take(IrqEvent::ReceiveDone));
        assert!(!mailbox.take(IrqEvent::ReceiveDone));
    }

    #[test]
    fn test_mailbox_latest_occurrence_wins() {
        let mailbox = EventMailbox::new();
        mailbox.post(IrqEvent::ReceiveDone);
        mailbox.post(IrqEvent::ReceiveDone);
        mailbox.post(IrqEvent::TransmitDone);

        assert!(mailbox.take(IrqEvent::ReceiveDone));
        assert!(!mailbox.take(IrqEvent::ReceiveDone));
        assert!(mailbox.take(IrqEvent::TransmitDone));
    }

    #[test]
    fn test_mailbox_ignores_none_and_clears() {
        let mailbox = EventMailbox::new();
        mailbox.post(IrqEvent::None);
        assert!(!mailbox.take(IrqEvent::None));

        mailbox.post(IrqEvent::CrcError);
        mailbox.post(IrqEvent::ReceiveDone);
        mailbox.clear(IrqEvent::CrcError);
        assert!(!mailbox.is_pending(IrqEvent::CrcError));
        assert!(mailbox.is_pending(IrqEvent::ReceiveDone));

        mailbox.reset();
        assert!(!mailbox.is_pending(IrqEvent::ReceiveDone));
    }
}
