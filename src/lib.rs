//! SX127x LoRa driver and Ping/Pong link protocol
//!
//! This crate drives a Semtech SX1276/77/78/79 (or RFM95) transceiver over SPI
//! and runs a minimal two-node request/acknowledge protocol on top of it.
//!
//! # Layers
//! - [`radio::interface`]: chip-select guarded register and FIFO transactions
//! - [`radio::sx127x`]: mode state machine, modem setup and packet framing
//! - [`irq`]: decoding of the `IrqFlags` register and the event mailbox
//! - [`link`]: the Ping (initiator) and Pong (responder) roles
//! - [`node`]: startup, fault policy and role dispatch
//!
//! # Example
//! The driver learns about finished transmissions and receptions only through
//! DIO0. Keep it in a [`radio::SharedRadio`], call
//! [`on_interrupt`](radio::SharedRadio::on_interrupt) from the DIO0 handler
//! and hand `&RADIO` to the node as its radio. `Spi`, `Cs`, `Reset`, `Delay`,
//! `Timer` and `Leds` stand for the board's HAL types.
//!
//! ```ignore
//! use sx127x_link::{
//!     config::{LinkConfig, RadioConfig, Role},
//!     irq::EventMailbox,
//!     node::Node,
//!     radio::{SharedRadio, Sx127x},
//! };
//!
//! type Board = Sx127x<'static, Spi, Cs, Reset, Delay>;
//!
//! static EVENTS: EventMailbox = EventMailbox::new();
//! static RADIO: SharedRadio<Board> = SharedRadio::new();
//!
//! #[entry]
//! fn main() -> ! {
//!     // board bring-up yields spi, cs, reset, delay, timer and leds
//!     RADIO.install(Sx127x::new(spi, cs, reset, delay, &EVENTS, RadioConfig::default()).unwrap());
//!
//!     let node: Node<_, _, _, 64> = Node::new(&RADIO, timer, leds, Role::Initiator, LinkConfig::default());
//!     node.run()
//! }
//!
//! #[interrupt]
//! fn IO_IRQ_BANK0() {
//!     // clear the GPIO edge, then
//!     RADIO.on_interrupt();
//! }
//! ```

#![warn(missing_docs)]
#![no_std]

#[macro_use]
mod fmt;

/// Radio and link configuration
pub mod config;

/// Interrupt flag decoding and event mailbox
pub mod irq;

/// Ping/Pong link protocol
pub mod link;

/// Startup and role dispatch
pub mod node;

/// Radio hardware layer
pub mod radio;

/// Status indication
pub mod status;

pub use config::{LinkConfig, RadioConfig, Role};
pub use irq::{EventMailbox, IrqEvent};
pub use link::Fault;
pub use node::Node;
pub use radio::{Radio, RadioError, RadioMode, Sx127x};
