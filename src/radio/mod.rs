pub mod interface;
pub mod registers;
pub mod shared;
pub mod sx127x;
/// Radio contract shared by the driver and its stand-ins
pub mod traits;

pub use interface::RegisterInterface;
pub use shared::SharedRadio;
pub use sx127x::Sx127x;
pub use traits::{Radio, RadioError, RadioMode, Reception};
