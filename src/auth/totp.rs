//! TOTP secrets, provisioning URIs and code format checks

use rand::RngCore;
use url::Url;

/// Secret length in bytes (160 bits)
pub const SECRET_BYTES: usize = 20;

/// Digits of a one-time code
pub const CODE_DIGITS: usize = 6;

const BASE32_ALPHABET: &[u8; 32] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ234567";

/// RFC 4648 base32 without padding, as authenticator apps expect it
pub fn base32_encode(bytes: &[u8]) -> String {
    let mut out = String::with_capacity((bytes.len() * 8).div_ceil(5));
    let mut buffer: u32 = 0;
    let mut bits = 0u32;

    for &byte in bytes {
        buffer = (buffer << 8) | u32::from(byte);
        bits += 8;
        while bits >= 5 {
            bits -= 5;
            out.push(BASE32_ALPHABET[((buffer >> bits) & 0x1f) as usize] as char);
        }
        buffer &= (1 << bits) - 1;
    }
    if bits > 0 {
        out.push(BASE32_ALPHABET[((buffer << (5 - bits)) & 0x1f) as usize] as char);
    }
    out
}

/// A fresh base32 secret from the thread RNG
pub fn generate_secret() -> String {
    generate_secret_with(&mut rand::thread_rng())
}

pub fn generate_secret_with<R: RngCore + ?Sized>(rng: &mut R) -> String {
    let mut bytes = [0u8; SECRET_BYTES];
    rng.fill_bytes(&mut bytes);
    base32_encode(&bytes)
}

/// `otpauth://totp/<issuer>:<account>?secret=<secret>&issuer=<issuer>`
pub fn provisioning_uri(issuer: &str, account: &str, secret: &str) -> Result<Url, url::ParseError> {
    let mut uri = Url::parse("otpauth://totp/")?;
    uri.set_path(&format!("/{issuer}:{account}"));
    uri.query_pairs_mut()
        .append_pair("secret", secret)
        .append_pair("issuer", issuer);
    Ok(uri)
}

/// Exactly six ASCII digits
pub fn is_valid_code(code: &str) -> bool {
    code.len() == CODE_DIGITS && code.bytes().all(|b| b.is_ascii_digit())
}
