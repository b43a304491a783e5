use core::fmt::Write;

use heapless::{String, Vec};

use crate::radio::registers::MAX_PAYLOAD_LEN;

/// Marker identifying a request
pub const REQUEST_MARKER: &[u8] = b"Ping";
/// Marker identifying a reply
pub const REPLY_MARKER: &[u8] = b"Pong";
/// Text placed in front of the echoed request in a reply
pub const REPLY_PREFIX: &[u8] = b"Pong para: ";

/// A payload that always fits the FIFO framing
pub type Message = Vec<u8, MAX_PAYLOAD_LEN>;

/// `"Ping <sequence>"`
pub fn request(sequence: u32) -> Message {
    let mut text: String<MAX_PAYLOAD_LEN> = String::new();
    // "Ping " and ten digits always fit
    let _ = write!(text, "Ping {}", sequence);
    text.into_bytes()
}

/// `"Pong para: <request>"`, with the echoed request cut to fit 255 bytes
pub fn reply(request: &[u8]) -> Message {
    let mut message = Message::new();
    let room = MAX_PAYLOAD_LEN - REPLY_PREFIX.len();
    let echoed = &request[..request.len().min(room)];
    let _ = message.extend_from_slice(REPLY_PREFIX);
    let _ = message.extend_from_slice(echoed);
    message
}

/// Payload carries the request marker
pub fn is_request(payload: &[u8]) -> bool {
    contains(payload, REQUEST_MARKER)
}

/// Payload carries the reply marker
pub fn is_reply(payload: &[u8]) -> bool {
    contains(payload, REPLY_MARKER)
}

fn contains(haystack: &[u8], needle: &[u8]) -> bool {
    needle.is_empty() || haystack.windows(needle.len()).any(|window| window == needle)
}
