//! Newtype wrappers for the 4-byte wire identifiers (SPEC_FULL.md §3):
//! `BridgeId` (the bridge's own serial, bytes 6..10 of every frame) and
//! `InverterId` (`wrid`, the per-microinverter serial inside a payload
//! block). Both render as 8-char lowercase hex; keeping them as distinct
//! types means a bridge ID can never be passed where an inverter ID is
//! expected, and every `format!("{:02x}...", ...)` call has one owner.

use std::fmt;
use std::str::FromStr;

use serde::Serialize;

fn hex4(bytes: [u8; 4]) -> String {
    format!("{:02x}{:02x}{:02x}{:02x}", bytes[0], bytes[1], bytes[2], bytes[3])
}

fn parse_hex4(s: &str) -> Option<[u8; 4]> {
    if s.len() != 8 || !s.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }
    let mut bytes = [0u8; 4];
    for (i, byte) in bytes.iter_mut().enumerate() {
        *byte = u8::from_str_radix(&s[i * 2..i * 2 + 2], 16).ok()?;
    }
    Some(bytes)
}

/// A parsed-from-string identifier didn't look like 8 hex characters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParseIdError;

impl fmt::Display for ParseIdError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "expected 8 lowercase hex characters")
    }
}

impl std::error::Error for ParseIdError {}

macro_rules! device_id {
    ($name:ident) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub struct $name([u8; 4]);

        impl $name {
            pub const ZERO: $name = $name([0, 0, 0, 0]);

            pub fn from_bytes(bytes: [u8; 4]) -> Self {
                Self(bytes)
            }

            pub fn is_zero(self) -> bool {
                self.0 == [0, 0, 0, 0]
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::ZERO
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", hex4(self.0))
            }
        }

        impl FromStr for $name {
            type Err = ParseIdError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                parse_hex4(s).map(Self).ok_or(ParseIdError)
            }
        }

        impl Serialize for $name {
            fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
            where
                S: serde::Serializer,
            {
                serializer.collect_str(self)
            }
        }
    };
}

device_id!(BridgeId);
device_id!(InverterId);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_as_lowercase_hex() {
        let id = InverterId::from_bytes([0x11, 0x12, 0x13, 0x14]);
        assert_eq!(id.to_string(), "11121314");
    }

    #[test]
    fn zero_is_zero() {
        assert!(InverterId::ZERO.is_zero());
        assert!(!InverterId::from_bytes([0, 0, 0, 1]).is_zero());
    }

    #[test]
    fn round_trips_through_parse() {
        let id: BridgeId = "abcdef01".parse().unwrap();
        assert_eq!(id.to_string(), "abcdef01");
    }

    #[test]
    fn rejects_wrong_length_or_non_hex() {
        assert_eq!("abc".parse::<BridgeId>(), Err(ParseIdError));
        assert_eq!("zzzzzzzz".parse::<BridgeId>(), Err(ParseIdError));
    }
}
