//! One-time password primitives.
//!
//! - **HMAC-SHA256** over an arbitrary-length counter/context string
//! - **RFC 4226 dynamic truncation** down to a 31-bit integer, reduced to `digits` decimal digits

pub mod error;
pub mod hotp;

pub use error::HotpError;
pub use hotp::{compute_otp, format_code, DEFAULT_DIGITS, MAX_DIGITS, MIN_DIGITS};
