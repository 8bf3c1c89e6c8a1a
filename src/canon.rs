// src/canon.rs
use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;

use crate::config::BootstrapSecret;

type HmacSha256 = Hmac<Sha256>;

/// The four fields covered by the bootstrap signature.
#[derive(Debug, Clone, Copy)]
pub struct SignedFields<'a> {
    pub nonce: &'a str,
    pub device_pubkey: &'a str,
    pub build_id: &'a str,
    pub timestamp: &'a str,
}

// Field order is part of the wire protocol; no separators.
pub fn canonical_message(f: &SignedFields<'_>) -> Vec<u8> {
    [
        f.nonce.as_bytes(),
        f.device_pubkey.as_bytes(),
        f.build_id.as_bytes(),
        f.timestamp.as_bytes(),
    ]
    .concat()
}

fn mac(secret: &BootstrapSecret, f: &SignedFields<'_>) -> Vec<u8> {
    let mut mac =
        HmacSha256::new_from_slice(secret.expose()).expect("HMAC can take key of any size");
    mac.update(&canonical_message(f));
    mac.finalize().into_bytes().to_vec()
}

/// Expected signature for `f`, lowercase hex, as a client computes it.
/// Presented signatures are decoded before comparison, so either hex case verifies.
#[allow(dead_code)]
pub fn sign(secret: &BootstrapSecret, f: &SignedFields<'_>) -> String {
    hex::encode(mac(secret, f))
}

/// Checks `presented` against the expected MAC in constant time.
///
/// Undecodable hex and wrong lengths are plain rejections.
pub fn verify(secret: &BootstrapSecret, f: &SignedFields<'_>, presented: &str) -> bool {
    let Ok(presented) = hex::decode(presented) else {
        return false;
    };
    let expected = mac(secret, f);
    // Slice ct_eq returns false on length mismatch; only the length leaks.
    expected.as_slice().ct_eq(presented.as_slice()).into()
}
