//! Frame classification: the 6-byte command tag table from spec.md §3.

use super::ids::BridgeId;

/// Minimum length for `classify`/`bridge_id` to operate on a frame: the
/// 6-byte tag plus the 4-byte bridge ID.
pub const MIN_HEADER_LEN: usize = 10;

const TAG_HANDSHAKE_EVB: [u8; 6] = [0x68, 0x00, 0x30, 0x68, 0x10, 0x06];
const TAG_HANDSHAKE_EVT: [u8; 6] = [0x68, 0x00, 0x20, 0x68, 0x10, 0x06];
const TAG_PAYLOAD_EVB201: [u8; 6] = [0x68, 0x03, 0xd6, 0x68, 0x10, 0x04];
const TAG_PAYLOAD_EVB300: [u8; 6] = [0x68, 0x02, 0xdc, 0x68, 0x10, 0x72];
const TAG_PAYLOAD_EVT800: [u8; 6] = [0x68, 0x00, 0x56, 0x68, 0x10, 0x04];
const TAG_ACK_TYPE0: [u8; 6] = [0x68, 0x00, 0x30, 0x68, 0x10, 0x07];
const TAG_ACK_TYPE1: [u8; 6] = [0x68, 0x00, 0x18, 0x68, 0x10, 0x09];
const TAG_ACK_TYPE2: [u8; 6] = [0x68, 0x00, 0x1e, 0x68, 0x10, 0x70];
const TAG_ACK_TYPE3: [u8; 6] = [0x68, 0x00, 0x20, 0x68, 0x10, 0x27];
const TAG_ADD_MICROINVERTER: [u8; 6] = [0x68, 0x00, 0x24, 0x68, 0x10, 0x09];
const TAG_PAYLOAD_ACK: [u8; 6] = [0x68, 0x00, 0x12, 0x68, 0x10, 0x15];

pub(crate) const TAG_LEN: usize = 6;

/// Which side of the pairing a frame travels on, independent of which
/// socket it happened to be read from (useful for logging upstream traffic
/// whose variant we still want to name).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    DeviceToUpstream,
    UpstreamToDevice,
    Unknown,
}

/// Every frame variant named in spec.md §3's command tag table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Variant {
    HandshakeEvb,
    HandshakeEvt,
    PayloadEvb201,
    PayloadEvb300,
    PayloadEvt800,
    AckType0,
    AckType1,
    AckType2,
    AckType3,
    AddMicroinverter,
    PayloadAck,
    Unknown,
}

impl Variant {
    pub fn direction(self) -> Direction {
        use Variant::*;
        match self {
            HandshakeEvb | HandshakeEvt | PayloadEvb201 | PayloadEvb300 | PayloadEvt800 => {
                Direction::DeviceToUpstream
            }
            AckType0 | AckType1 | AckType2 | AckType3 | AddMicroinverter | PayloadAck => {
                Direction::UpstreamToDevice
            }
            Unknown => Direction::Unknown,
        }
    }

    pub fn is_payload(self) -> bool {
        matches!(
            self,
            Variant::PayloadEvb201 | Variant::PayloadEvb300 | Variant::PayloadEvt800
        )
    }

    pub fn name(self) -> &'static str {
        use Variant::*;
        match self {
            HandshakeEvb => "handshake_evb",
            HandshakeEvt => "handshake_evt",
            PayloadEvb201 => "payload_evb201",
            PayloadEvb300 => "payload_evb300",
            PayloadEvt800 => "payload_evt800",
            AckType0 => "ack_type0",
            AckType1 => "ack_type1",
            AckType2 => "ack_type2",
            AckType3 => "ack_type3",
            AddMicroinverter => "add_microinverter",
            PayloadAck => "payload_ack",
            Unknown => "unknown",
        }
    }
}

/// Classify `frame` by comparing its first 6 bytes against the tag table.
/// Returns `Unknown` if no tag matches or the frame is shorter than 10
/// bytes, per spec.md §4.1.
pub fn classify(frame: &[u8]) -> Variant {
    if frame.len() < MIN_HEADER_LEN {
        return Variant::Unknown;
    }
    let tag = &frame[..TAG_LEN];
    match tag {
        _ if tag == TAG_HANDSHAKE_EVB => Variant::HandshakeEvb,
        _ if tag == TAG_HANDSHAKE_EVT => Variant::HandshakeEvt,
        _ if tag == TAG_PAYLOAD_EVB201 => Variant::PayloadEvb201,
        _ if tag == TAG_PAYLOAD_EVB300 => Variant::PayloadEvb300,
        _ if tag == TAG_PAYLOAD_EVT800 => Variant::PayloadEvt800,
        _ if tag == TAG_ACK_TYPE0 => Variant::AckType0,
        _ if tag == TAG_ACK_TYPE1 => Variant::AckType1,
        _ if tag == TAG_ACK_TYPE2 => Variant::AckType2,
        _ if tag == TAG_ACK_TYPE3 => Variant::AckType3,
        _ if tag == TAG_ADD_MICROINVERTER => Variant::AddMicroinverter,
        _ if tag == TAG_PAYLOAD_ACK => Variant::PayloadAck,
        _ => Variant::Unknown,
    }
}

/// Reply tag bytes used by `crate::codec::reply`.
pub(crate) mod reply_tags {
    pub const ACK_TYPE0: [u8; 6] = super::TAG_ACK_TYPE0;
    pub const ACK_TYPE2: [u8; 6] = super::TAG_ACK_TYPE2;
    pub const PAYLOAD_ACK: [u8; 6] = super::TAG_PAYLOAD_ACK;
}

/// The 4-byte bridge ID at bytes 6..10.
///
/// Fails with `None` when `frame.len() < 10` (spec.md's `FrameTooShort`,
/// represented here as an `Option` rather than an error type since the
/// caller always treats it as "nothing to do", never as a fatal condition).
pub fn bridge_id(frame: &[u8]) -> Option<BridgeId> {
    if frame.len() < MIN_HEADER_LEN {
        return None;
    }
    Some(BridgeId::from_bytes([frame[6], frame[7], frame[8], frame[9]]))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame_with_tag(tag: [u8; 6]) -> Vec<u8> {
        let mut f = tag.to_vec();
        f.extend_from_slice(&[0x11, 0x12, 0x13, 0x14]);
        f
    }

    #[test]
    fn classifies_every_known_tag() {
        assert_eq!(classify(&frame_with_tag(TAG_HANDSHAKE_EVB)), Variant::HandshakeEvb);
        assert_eq!(classify(&frame_with_tag(TAG_HANDSHAKE_EVT)), Variant::HandshakeEvt);
        assert_eq!(classify(&frame_with_tag(TAG_PAYLOAD_EVB201)), Variant::PayloadEvb201);
        assert_eq!(classify(&frame_with_tag(TAG_PAYLOAD_EVB300)), Variant::PayloadEvb300);
        assert_eq!(classify(&frame_with_tag(TAG_PAYLOAD_EVT800)), Variant::PayloadEvt800);
        assert_eq!(classify(&frame_with_tag(TAG_ACK_TYPE0)), Variant::AckType0);
        assert_eq!(classify(&frame_with_tag(TAG_ACK_TYPE1)), Variant::AckType1);
        assert_eq!(classify(&frame_with_tag(TAG_ACK_TYPE2)), Variant::AckType2);
        assert_eq!(classify(&frame_with_tag(TAG_ACK_TYPE3)), Variant::AckType3);
        assert_eq!(classify(&frame_with_tag(TAG_ADD_MICROINVERTER)), Variant::AddMicroinverter);
        assert_eq!(classify(&frame_with_tag(TAG_PAYLOAD_ACK)), Variant::PayloadAck);
    }

    #[test]
    fn short_or_unrecognized_frame_is_unknown() {
        assert_eq!(classify(&[0x68, 0x00]), Variant::Unknown);
        assert_eq!(classify(&[0u8; 10]), Variant::Unknown);
    }

    #[test]
    fn bridge_id_reads_bytes_6_to_10() {
        let frame = frame_with_tag(TAG_HANDSHAKE_EVB);
        assert_eq!(bridge_id(&frame).map(|id| id.to_string()), Some("11121314".to_string()));
    }

    #[test]
    fn bridge_id_none_when_too_short() {
        assert_eq!(bridge_id(&[0u8; 9]), None);
    }
}
