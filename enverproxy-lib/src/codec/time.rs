//! Handshake timestamp codec: bytes 14..20 of a frame, per spec.md §4.1.
//!
//! The six octets are `yy mm dd HH MM SS` in China time (UTC+8); `yy` is
//! `actual_year - 1900`. `decode_time` renders the decoded instant in the
//! host's local timezone; `encode_time` is its inverse, converting a wall
//! clock moment to UTC+8 before splitting it into octets.

use chrono::{DateTime, FixedOffset, Local, TimeZone, Utc};

use crate::error::{ProxyError, Result};

const TIMESTAMP_OFFSET: usize = 14;
const TIMESTAMP_LEN: usize = 6;
/// A frame must be at least this long for bytes 14..20 to exist.
pub const MIN_TIMESTAMP_FRAME_LEN: usize = TIMESTAMP_OFFSET + TIMESTAMP_LEN;

fn china_offset() -> FixedOffset {
    FixedOffset::east_opt(8 * 3600).expect("UTC+8 is a valid fixed offset")
}

/// Decode bytes 14..20 of `frame` into the wall-clock string
/// `"dd.mm.yyyy HH:MM:SS"`, rendered in the host's local timezone.
///
/// Fails with `ProxyError::InvalidValue` when `frame` is too short to carry
/// a timestamp field (spec.md's `FrameTooShort`, never fatal to the caller
/// — callers log and move on rather than propagating).
pub fn decode_time(frame: &[u8]) -> Result<String> {
    let dt = decode_instant(frame)?;
    Ok(dt.with_timezone(&Local).format("%d.%m.%Y %H:%M:%S").to_string())
}

/// Decode bytes 14..20 of `frame` into the UTC instant they represent.
pub fn decode_instant(frame: &[u8]) -> Result<DateTime<Utc>> {
    if frame.len() < MIN_TIMESTAMP_FRAME_LEN {
        return Err(ProxyError::InvalidValue {
            key: "frame.timestamp".to_string(),
            reason: format!(
                "frame too short ({} bytes) to carry a timestamp",
                frame.len()
            ),
        });
    }
    let b = &frame[TIMESTAMP_OFFSET..TIMESTAMP_OFFSET + TIMESTAMP_LEN];
    let year = 1900 + i32::from(b[0]);
    let (month, day, hour, minute, second) = (
        u32::from(b[1]),
        u32::from(b[2]),
        u32::from(b[3]),
        u32::from(b[4]),
        u32::from(b[5]),
    );
    let naive = chrono::NaiveDate::from_ymd_opt(year, month, day)
        .and_then(|d| d.and_hms_opt(hour, minute, second))
        .ok_or_else(|| ProxyError::InvalidValue {
            key: "frame.timestamp".to_string(),
            reason: format!(
                "invalid timestamp fields y={year} m={month} d={day} h={hour} mi={minute} s={second}"
            ),
        })?;
    let china = china_offset()
        .from_local_datetime(&naive)
        .single()
        .ok_or_else(|| ProxyError::InvalidValue {
            key: "frame.timestamp".to_string(),
            reason: "ambiguous or nonexistent local timestamp".to_string(),
        })?;
    Ok(china.with_timezone(&Utc))
}

/// Encode `now` (any timezone) as the 6 big-endian octets
/// `year-1900, month, day, hour, minute, second` in China time (UTC+8).
/// Inverse of `decode_time`/`decode_instant` on bytes 14..20.
pub fn encode_time(now: DateTime<Utc>) -> [u8; TIMESTAMP_LEN] {
    let china = now.with_timezone(&china_offset());
    [
        (china.format("%Y").to_string().parse::<i32>().unwrap_or(0) - 1900) as u8,
        china.format("%m").to_string().parse().unwrap_or(0),
        china.format("%d").to_string().parse().unwrap_or(0),
        china.format("%H").to_string().parse().unwrap_or(0),
        china.format("%M").to_string().parse().unwrap_or(0),
        china.format("%S").to_string().parse().unwrap_or(0),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn frame_with_timestamp(ts: [u8; 6]) -> Vec<u8> {
        let mut f = vec![0u8; MIN_TIMESTAMP_FRAME_LEN];
        f[TIMESTAMP_OFFSET..].copy_from_slice(&ts);
        f
    }

    #[test]
    fn encode_matches_spec_example() {
        // 2024-03-15 20:00:00 China time (UTC+8) -> 7c 03 0f 14 00 00
        let utc = Utc.with_ymd_and_hms(2024, 3, 15, 12, 0, 0).unwrap();
        assert_eq!(encode_time(utc), [0x7c, 0x03, 0x0f, 0x14, 0x00, 0x00]);
    }

    #[test]
    fn decode_then_encode_is_identity_on_the_timestamp_bytes() {
        let ts = [0x7c, 0x03, 0x0f, 0x14, 0x00, 0x00];
        let frame = frame_with_timestamp(ts);
        let instant = decode_instant(&frame).expect("decodes");
        assert_eq!(encode_time(instant), ts);
    }

    #[test]
    fn too_short_frame_is_an_error() {
        assert!(decode_time(&[0u8; 10]).is_err());
    }
}
