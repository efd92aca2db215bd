//! Pure, stateless protocol codec for Envertec bridge frames (spec.md §4.1).
//!
//! Nothing in this module touches a socket or holds state across calls —
//! mirrors the way the teacher corpus isolates wire-format logic (e.g.
//! `fingerprinting::tcp_syn`) from the transport code that calls it.

mod frame;
mod ids;
mod inverter;
mod reply;
mod time;

pub use frame::{bridge_id, classify, Direction, Variant, MIN_HEADER_LEN};
pub use ids::{BridgeId, InverterId, ParseIdError};
pub use inverter::{iter_payload_blocks, InverterRecord, BLOCK_LEN};
pub use reply::{build_handshake_reply, build_payload_ack};
pub use time::{decode_instant, decode_time, encode_time};
