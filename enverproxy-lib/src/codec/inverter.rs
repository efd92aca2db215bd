//! Per-inverter telemetry blocks: spec.md §3 `InverterRecord` and §4.1
//! `decode_inverter`/`iter_payload_blocks`.

use serde::Serialize;
use tracing::warn;

use super::ids::{BridgeId, InverterId};

/// Width of one inverter record inside a payload frame.
pub const BLOCK_LEN: usize = 20;
/// Byte offset of the first block within a payload frame (after the 6-byte
/// tag, 4-byte bridge ID, and 10 bytes of filler).
pub const FIRST_BLOCK_OFFSET: usize = 20;
/// Distance between the start of consecutive blocks; the 12 bytes past
/// `BLOCK_LEN` are an undocumented gap this implementation does not
/// interpret (spec.md §9 Open Question) and never reads.
pub const BLOCK_STRIDE: usize = 32;
/// Hard cap on blocks iterated per frame (spec.md §4.1).
pub const MAX_BLOCKS: usize = 20;

/// A decoded telemetry sample. All numeric fields are pre-formatted to the
/// widths spec.md §3 requires, since the MQTT payload carries them as JSON
/// strings, not numbers.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InverterRecord {
    pub wrid: InverterId,
    pub brid: BridgeId,
    pub dc: String,
    pub power: String,
    pub totalkwh: String,
    pub temp: String,
    pub ac: String,
    pub freq: String,
}

impl InverterRecord {
    /// True when this record's `wrid` is the sentinel "no inverter"
    /// identifier, which spec.md §3/§8 says must be filtered out before
    /// publish.
    pub fn is_zero(&self) -> bool {
        self.wrid.is_zero()
    }

    pub fn with_brid(mut self, brid: BridgeId) -> Self {
        self.brid = brid;
        self
    }

    /// Decode a 20-byte inverter block per spec.md §4.1's layout table.
    ///
    /// On a block shorter than 20 bytes, all numeric fields are zero and
    /// `wrid` is the all-zero identifier; a warning is logged but this is
    /// never an error (spec.md's `FrameTooShort` is non-fatal here).
    pub fn decode(block: &[u8]) -> Self {
        if block.len() < BLOCK_LEN {
            warn!(len = block.len(), "inverter block shorter than 20 bytes, zeroing record");
            return Self::zeroed();
        }

        let wrid = InverterId::from_bytes([block[0], block[1], block[2], block[3]]);
        let dc = u16::from_be_bytes([block[6], block[7]]);
        let power = u16::from_be_bytes([block[8], block[9]]);
        let totalkwh = u32::from_be_bytes([block[10], block[11], block[12], block[13]]);
        let temp = u16::from_be_bytes([block[14], block[15]]);
        let ac = u16::from_be_bytes([block[16], block[17]]);
        let freq_whole = block[18];
        let freq_frac = block[19];

        Self {
            wrid,
            brid: BridgeId::ZERO,
            dc: format!("{:.2}", f64::from(dc) / 512.0),
            power: format!("{:.2}", f64::from(power) / 64.0),
            totalkwh: format!("{:.3}", f64::from(totalkwh) / 8192.0),
            temp: format!("{:.2}", f64::from(temp) / 128.0 - 40.0),
            ac: format!("{:.2}", f64::from(ac) / 64.0),
            freq: format!("{:.2}", f64::from(freq_whole) + f64::from(freq_frac) / 256.0),
        }
    }

    fn zeroed() -> Self {
        Self {
            wrid: InverterId::ZERO,
            brid: BridgeId::ZERO,
            dc: format!("{:.2}", 0.0),
            power: format!("{:.2}", 0.0),
            totalkwh: format!("{:.3}", 0.0),
            temp: format!("{:.2}", 0.0),
            ac: format!("{:.2}", 0.0),
            freq: format!("{:.2}", 0.0),
        }
    }
}

/// Largest `i` such that block `i` (stride `BLOCK_STRIDE`, starting at
/// `FIRST_BLOCK_OFFSET`) fits entirely within `frame_len`, capped at
/// `MAX_BLOCKS`. Mirrors spec.md §4.1's "iteration terminates when the next
/// full stride would overflow".
fn block_count(frame_len: usize) -> usize {
    let mut n = 0;
    while n < MAX_BLOCKS {
        let start = FIRST_BLOCK_OFFSET + BLOCK_STRIDE * n;
        if start + BLOCK_STRIDE > frame_len {
            break;
        }
        n += 1;
    }
    n
}

/// Iterate the 20-byte inverter blocks embedded in a payload frame, per
/// spec.md §4.1. The 12-byte gap between blocks is skipped, never decoded.
pub fn iter_payload_blocks(frame: &[u8]) -> impl Iterator<Item = &[u8]> {
    let n = block_count(frame.len());
    (0..n).map(move |i| {
        let start = FIRST_BLOCK_OFFSET + BLOCK_STRIDE * i;
        &frame[start..start + BLOCK_LEN]
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_block() -> Vec<u8> {
        let mut b = vec![0u8; BLOCK_LEN];
        b[0..4].copy_from_slice(&[0x11, 0x12, 0x13, 0x14]);
        b[6..8].copy_from_slice(&512u16.to_be_bytes());
        b[8..10].copy_from_slice(&64u16.to_be_bytes());
        b[10..14].copy_from_slice(&8192u32.to_be_bytes());
        b[14..16].copy_from_slice(&(128u16 * 128).to_be_bytes());
        b[16..18].copy_from_slice(&64u16.to_be_bytes());
        b[18] = 50;
        b[19] = 0;
        b
    }

    #[test]
    fn decodes_scenario_3_values() {
        let rec = InverterRecord::decode(&sample_block());
        assert_eq!(rec.wrid.to_string(), "11121314");
        assert_eq!(rec.dc, "1.00");
        assert_eq!(rec.power, "1.00");
        assert_eq!(rec.totalkwh, "1.000");
        assert_eq!(rec.temp, "88.00");
        assert_eq!(rec.ac, "1.00");
        assert_eq!(rec.freq, "50.00");
        assert!(!rec.is_zero());
    }

    #[test]
    fn short_block_zeroes_without_panicking() {
        let rec = InverterRecord::decode(&[0u8; 5]);
        assert!(rec.is_zero());
        assert_eq!(rec.power, "0.00");
    }

    #[test]
    fn iterates_blocks_with_32_byte_stride_and_caps_at_20() {
        // exactly 3 full strides
        let frame_len = FIRST_BLOCK_OFFSET + BLOCK_STRIDE * 3;
        let mut frame = vec![0u8; frame_len];
        for i in 0..3 {
            let start = FIRST_BLOCK_OFFSET + BLOCK_STRIDE * i;
            frame[start] = i as u8 + 1;
        }
        let blocks: Vec<_> = iter_payload_blocks(&frame).collect();
        assert_eq!(blocks.len(), 3);
        for (i, block) in blocks.iter().enumerate() {
            assert_eq!(block[0], i as u8 + 1);
        }
    }

    #[test]
    fn partial_trailing_stride_is_not_iterated() {
        // one full stride plus a partial one that must not be yielded
        let frame_len = FIRST_BLOCK_OFFSET + BLOCK_STRIDE + 10;
        let frame = vec![0u8; frame_len];
        assert_eq!(iter_payload_blocks(&frame).count(), 1);
    }

    #[test]
    fn hard_cap_is_20_blocks() {
        let frame_len = FIRST_BLOCK_OFFSET + BLOCK_STRIDE * 50;
        let frame = vec![0u8; frame_len];
        assert_eq!(iter_payload_blocks(&frame).count(), MAX_BLOCKS);
    }
}
