//! Synthetic reply synthesis for simulation mode: spec.md §4.1
//! `build_handshake_reply` / `build_payload_ack`.

use chrono::{DateTime, Utc};

use super::frame::{classify, reply_tags, Variant, TAG_LEN};
use super::time::encode_time;

const PAYLOAD_ACK_TRAILER: [u8; 8] = [0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x89, 0x16];

/// Synthesize the handshake-acknowledgement reply for a simulated session.
///
/// `HandshakeEvb` gets ACK type 0's tag with the frame's own suffix copied
/// verbatim; `HandshakeEvt` gets ACK type 2's tag with the suffix copied and
/// then its timestamp field (bytes 14..) overwritten with `encode_time(now)`.
/// Any other variant has no handshake reply.
pub fn build_handshake_reply(frame: &[u8], now: DateTime<Utc>) -> Option<Vec<u8>> {
    match classify(frame) {
        Variant::HandshakeEvb => {
            let mut reply = reply_tags::ACK_TYPE0.to_vec();
            reply.extend_from_slice(&frame[TAG_LEN..]);
            Some(reply)
        }
        Variant::HandshakeEvt => {
            let mut reply = reply_tags::ACK_TYPE2.to_vec();
            reply.extend_from_slice(&frame[TAG_LEN..]);
            let ts = encode_time(now);
            let ts_offset = 14;
            if reply.len() >= ts_offset + ts.len() {
                reply[ts_offset..ts_offset + ts.len()].copy_from_slice(&ts);
            }
            Some(reply)
        }
        _ => None,
    }
}

/// Synthesize the payload-acknowledgement reply for a simulated session.
/// Only payload variants get a reply; everything else is `None`.
pub fn build_payload_ack(frame: &[u8]) -> Option<Vec<u8>> {
    let variant = classify(frame);
    if !variant.is_payload() {
        return None;
    }
    let mut reply = reply_tags::PAYLOAD_ACK.to_vec();
    reply.extend_from_slice(&frame[6..10]);
    reply.extend_from_slice(&PAYLOAD_ACK_TRAILER);
    Some(reply)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn evb_handshake() -> Vec<u8> {
        let mut f = vec![0x68, 0x00, 0x30, 0x68, 0x10, 0x06];
        f.extend_from_slice(&[0x94, 0x00, 0x29, 0x53]);
        f.extend(std::iter::repeat(0u8).take(48 - f.len()));
        f
    }

    #[test]
    fn evb_handshake_reply_matches_scenario_1() {
        let frame = evb_handshake();
        let reply = build_handshake_reply(&frame, Utc::now()).expect("reply");
        assert_eq!(reply.len(), frame.len());
        assert_eq!(&reply[..6], &[0x68, 0x00, 0x30, 0x68, 0x10, 0x07]);
        assert_eq!(&reply[6..], &frame[6..]);
    }

    #[test]
    fn evt_handshake_reply_matches_scenario_2() {
        let mut frame = vec![0x68, 0x00, 0x20, 0x68, 0x10, 0x06];
        frame.extend_from_slice(&[0xab, 0xcd, 0xef, 0x01]);
        frame.extend(std::iter::repeat(0u8).take(20));
        let now = Utc.with_ymd_and_hms(2024, 3, 15, 12, 0, 0).unwrap();
        let reply = build_handshake_reply(&frame, now).expect("reply");
        assert_eq!(&reply[..6], &[0x68, 0x00, 0x1e, 0x68, 0x10, 0x70]);
        assert_eq!(&reply[6..10], &[0xab, 0xcd, 0xef, 0x01]);
        assert_eq!(&reply[14..20], &[0x7c, 0x03, 0x0f, 0x14, 0x00, 0x00]);
    }

    #[test]
    fn payload_ack_matches_scenario_3() {
        let mut frame = vec![0x68, 0x03, 0xd6, 0x68, 0x10, 0x04];
        frame.extend_from_slice(&[0xaa, 0xbb, 0xcc, 0xdd]);
        let ack = build_payload_ack(&frame).expect("ack");
        assert_eq!(
            ack,
            vec![0x68, 0x00, 0x12, 0x68, 0x10, 0x15, 0xaa, 0xbb, 0xcc, 0xdd, 0, 0, 0, 0, 0, 0, 0x89, 0x16]
        );
    }

    #[test]
    fn unknown_frame_has_no_reply() {
        let frame = vec![0u8; 20];
        assert!(build_handshake_reply(&frame, Utc::now()).is_none());
        assert!(build_payload_ack(&frame).is_none());
    }
}
