//! Small shared helpers for the Sigil indexer.

use alloy::primitives::{hex, Address};
use chrono::{DateTime, TimeZone, Utc};

/// The Ethereum zero address (0x0000000000000000000000000000000000000000)
pub const ZERO_ADDRESS: &str = "0x0000000000000000000000000000000000000000";

/// Encode bytes as a lowercase hex string with 0x prefix.
pub fn hex_encode(bytes: &[u8]) -> String {
    format!("0x{}", hex::encode(bytes))
}

/// Lowercase an address string for consistent storage and comparisons.
pub fn normalize_address(addr: &str) -> String {
    addr.to_lowercase()
}

/// Render an alloy [`Address`] as a lowercase 0x-prefixed string.
pub fn address_to_string(addr: &Address) -> String {
    hex_encode(addr.as_slice())
}

/// True when the address is the zero address (used by contracts to signal
/// "no referrer").
pub fn is_zero_address(addr: &str) -> bool {
    addr.eq_ignore_ascii_case(ZERO_ADDRESS)
}

/// Convert a unix timestamp from a block header into a UTC datetime.
/// Out-of-range values collapse to the epoch rather than panicking.
pub fn ts_from_unix(secs: u64) -> DateTime<Utc> {
    Utc.timestamp_opt(secs as i64, 0)
        .single()
        .unwrap_or_else(|| Utc.timestamp_opt(0, 0).single().unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_encode_is_lowercase_prefixed() {
        assert_eq!(hex_encode(&[0xAB, 0xCD]), "0xabcd");
    }

    #[test]
    fn zero_address_detection_ignores_case() {
        assert!(is_zero_address("0x0000000000000000000000000000000000000000"));
        assert!(!is_zero_address("0x0000000000000000000000000000000000000001"));
    }

    #[test]
    fn ts_from_unix_roundtrips() {
        let ts = ts_from_unix(1_700_000_000);
        assert_eq!(ts.timestamp(), 1_700_000_000);
    }
}
