use proptest::prelude::*;

use e2totp_crypto::{compute_otp, HotpError};

proptest! {
    /// Same inputs always produce the same code.
    #[test]
    fn deterministic(
        key in prop::collection::vec(any::<u8>(), 1..64),
        counter in prop::collection::vec(any::<u8>(), 0..64),
        digits in 1u32..=10,
    ) {
        let a = compute_otp(&key, &counter, digits).unwrap();
        let b = compute_otp(&key, &counter, digits).unwrap();
        prop_assert_eq!(a, b);
    }

    /// Output is always in `[0, 10^digits)`.
    #[test]
    fn in_range(
        key in prop::collection::vec(any::<u8>(), 1..64),
        counter in prop::collection::vec(any::<u8>(), 0..64),
        digits in 1u32..=10,
    ) {
        let code = compute_otp(&key, &counter, digits).unwrap();
        prop_assert!(u64::from(code) < 10u64.pow(digits));
    }

    /// Digit counts outside [1, 10] are rejected regardless of key and counter.
    #[test]
    fn invalid_digits_rejected(digits in 11u32..1000) {
        prop_assert_eq!(compute_otp(b"k", b"c", digits), Err(HotpError::InvalidDigits(digits)));
    }
}

/// Flipping any single bit of the key or the 40-byte counter changes the code.
///
/// With 8-digit codes a chance collision has probability 1e-8 per flip, so across
/// a few hundred flips any repeat points at a truncation bug rather than luck.
#[test]
fn single_bit_flips_change_output() {
    let key = b"supersecretsharedkey".to_vec();
    let mut counter = Vec::with_capacity(40);
    counter.extend_from_slice(&5u64.to_be_bytes());
    counter.extend_from_slice(&[0x5Au8; 32]);

    let base = compute_otp(&key, &counter, 8).unwrap();
    let mut flips = 0usize;
    let mut unchanged = 0usize;

    for i in 0..counter.len() * 8 {
        let mut flipped = counter.clone();
        flipped[i / 8] ^= 1 << (i % 8);
        flips += 1;
        if compute_otp(&key, &flipped, 8).unwrap() == base {
            unchanged += 1;
        }
    }
    for i in 0..key.len() * 8 {
        let mut flipped = key.clone();
        flipped[i / 8] ^= 1 << (i % 8);
        flips += 1;
        if compute_otp(&flipped, &counter, 8).unwrap() == base {
            unchanged += 1;
        }
    }

    assert_eq!(flips, 480);
    assert_eq!(unchanged, 0, "{unchanged} of {flips} bit flips left the code unchanged");
}
