// src/token.rs
use rand::{rngs::OsRng, RngCore};
use thiserror::Error;

pub const TOKEN_BYTES: usize = 32;

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("entropy unavailable: {0}")]
    EntropyUnavailable(#[from] rand::Error),
}

/// Mints a device token from the OS random source.
pub fn gen_device_token() -> Result<String, TokenError> {
    gen_device_token_from(&mut OsRng)
}

/// 32 random bytes as 64 lowercase hex chars. Never falls back to another source.
pub fn gen_device_token_from<R: RngCore + ?Sized>(rng: &mut R) -> Result<String, TokenError> {
    let mut b = [0u8; TOKEN_BYTES];
    rng.try_fill_bytes(&mut b)?;
    Ok(hex::encode(b))
}
