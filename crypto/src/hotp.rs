//! HMAC-based one-time passwords over an arbitrary counter.
//!
//! The counter is not restricted to 8 bytes: beacon-bound OTPs feed the
//! 8-byte big-endian time step followed by 32 bytes of beacon randomness.
//! Truncation follows RFC 4226 section 5.3 exactly, since any deviation
//! changes every derived code.

use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::HotpError;

type HmacSha256 = Hmac<Sha256>;

pub const DEFAULT_DIGITS: u32 = 6;
pub const MIN_DIGITS: u32 = 1;
pub const MAX_DIGITS: u32 = 10;

/// Compute `truncate(HMAC-SHA256(key, counter)) mod 10^digits`.
///
/// The result is always in `[0, 10^digits)`.
pub fn compute_otp(key: &[u8], counter: &[u8], digits: u32) -> Result<u32, HotpError> {
    if !(MIN_DIGITS..=MAX_DIGITS).contains(&digits) {
        return Err(HotpError::InvalidDigits(digits));
    }
    if key.is_empty() {
        return Err(HotpError::EmptyKey);
    }

    let mut mac =
        HmacSha256::new_from_slice(key).map_err(|e| HotpError::Mac(e.to_string()))?;
    mac.update(counter);
    let digest = mac.finalize().into_bytes();

    let truncated = dynamic_truncate(&digest);
    Ok((u64::from(truncated) % 10u64.pow(digits)) as u32)
}

/// RFC 4226 dynamic truncation: the low nibble of the last byte selects which
/// four bytes become a big-endian 31-bit integer.
fn dynamic_truncate(digest: &[u8]) -> u32 {
    // offset <= 15, so offset + 4 <= 19 stays inside a 32-byte digest
    let offset = (digest[digest.len() - 1] & 0x0F) as usize;
    let word = [
        digest[offset],
        digest[offset + 1],
        digest[offset + 2],
        digest[offset + 3],
    ];
    u32::from_be_bytes(word) & 0x7FFF_FFFF
}

/// Render a code zero-padded to `digits` characters, as a client would display it.
pub fn format_code(code: u32, digits: u32) -> String {
    format!("{:0width$}", code, width = digits as usize)
}

#[cfg(test)]
mod tests {
    use super::*;

    const RFC6238_SHA256_SEED: &[u8] = b"12345678901234567890123456789012";

    fn rfc6238(time: u64) -> u32 {
        let counter = (time / 30).to_be_bytes();
        compute_otp(RFC6238_SHA256_SEED, &counter, 8).unwrap()
    }

    #[test]
    fn rfc6238_sha256_vectors() {
        assert_eq!(rfc6238(59), 46119246);
        assert_eq!(rfc6238(1111111109), 68084774);
        assert_eq!(rfc6238(1111111111), 67062674);
        assert_eq!(rfc6238(1234567890), 91819424);
        assert_eq!(rfc6238(2000000000), 90698825);
        assert_eq!(rfc6238(20000000000), 77737706);
    }

    #[test]
    fn truncation_reads_offset_from_last_nibble() {
        let mut digest = [0u8; 32];
        digest[31] = 0x0A;
        digest[10..14].copy_from_slice(&[0xFF, 0x00, 0x00, 0x01]);
        // sign bit cleared
        assert_eq!(dynamic_truncate(&digest), 0x7F00_0001);
    }

    #[test]
    fn truncation_max_offset_stays_in_bounds() {
        let mut digest = [0u8; 32];
        digest[31] = 0xFF;
        digest[15..19].copy_from_slice(&[0x12, 0x34, 0x56, 0x78]);
        assert_eq!(dynamic_truncate(&digest), 0x1234_5678);
    }

    #[test]
    fn rejects_out_of_range_digits() {
        assert_eq!(compute_otp(b"k", b"c", 0), Err(HotpError::InvalidDigits(0)));
        assert_eq!(compute_otp(b"k", b"c", 11), Err(HotpError::InvalidDigits(11)));
    }

    #[test]
    fn rejects_empty_key() {
        assert_eq!(compute_otp(b"", b"c", 6), Err(HotpError::EmptyKey));
    }

    #[test]
    fn accepts_empty_counter() {
        let code = compute_otp(b"k", b"", 6).unwrap();
        assert!(code < 1_000_000);
    }

    #[test]
    fn ten_digits_returns_full_31_bit_value() {
        let counter = [0u8; 40];
        let ten = compute_otp(b"k", &counter, 10).unwrap();
        let six = compute_otp(b"k", &counter, 6).unwrap();
        assert!(ten <= 0x7FFF_FFFF);
        assert_eq!(ten % 1_000_000, six);
    }

    #[test]
    fn format_pads_with_leading_zeros() {
        assert_eq!(format_code(42, 6), "000042");
        assert_eq!(format_code(123456, 6), "123456");
        assert_eq!(format_code(7, 8), "00000007");
    }
}
