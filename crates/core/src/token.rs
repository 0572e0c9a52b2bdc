//! Secure random identifiers: session tokens and account numbers.
//!
//! Both draw from the operating system CSPRNG.

use crate::error::{CoreError, CoreResult};
use rand::rngs::OsRng;
use rand::{Rng, RngCore};

/// Số byte entropy của một session token
pub const TOKEN_BYTES: usize = 32;

/// Độ dài token sau khi hex-encode
pub const TOKEN_LEN: usize = TOKEN_BYTES * 2;

/// Sinh opaque session token (64 ký tự hex)
pub fn generate_session_token() -> String {
    let mut bytes = [0u8; TOKEN_BYTES];
    OsRng.fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// Rejects strings that could never have been issued.
///
/// The token has no internal structure beyond its shape; this only stops
/// obviously bogus input before it reaches the store.
pub fn check_token_shape(token: &str) -> CoreResult<()> {
    if token.len() != TOKEN_LEN || !token.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(CoreError::MalformedToken);
    }
    Ok(())
}

/// Sinh account number gồm `length` chữ số, chữ số đầu khác 0
pub fn generate_account_number(length: usize) -> CoreResult<String> {
    if length == 0 {
        return Err(CoreError::InvalidIdFormat(
            "account number length must be at least 1".to_string(),
        ));
    }

    let mut rng = OsRng;
    let mut number = String::with_capacity(length);
    number.push(char::from(b'0' + rng.gen_range(1..=9u8)));
    for _ in 1..length {
        number.push(char::from(b'0' + rng.gen_range(0..=9u8)));
    }
    Ok(number)
}
