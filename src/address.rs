//! Address and signature validation.
//!
//! Solana addresses are Base58-encoded 32-byte Ed25519 public keys and
//! transaction signatures are Base58-encoded 64-byte Ed25519 signatures.
//! Both are checked here before they are attached to a request.

use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::Signature;

use crate::error::{Error, Result};

pub const PUBKEY_BYTES: usize = 32;
pub const SIGNATURE_BYTES: usize = 64;

/// Validate an address string and return it as a [`Pubkey`].
///
/// Fails with [`Error::InvalidAddress`] if the string is empty, contains a
/// character outside the Base58 alphabet, or does not decode to 32 bytes.
pub fn validate_address(address: &str) -> Result<Pubkey> {
    let bytes = decode_fixed::<PUBKEY_BYTES>(address).map_err(Error::InvalidAddress)?;
    Ok(Pubkey::new_from_array(bytes))
}

/// Validate a transaction signature string and return it as a [`Signature`].
pub fn validate_signature(signature: &str) -> Result<Signature> {
    let bytes = decode_fixed::<SIGNATURE_BYTES>(signature).map_err(Error::InvalidSignature)?;
    Ok(Signature::from(bytes))
}

fn decode_fixed<const N: usize>(input: &str) -> std::result::Result<[u8; N], String> {
    if input.is_empty() {
        return Err("empty string".into());
    }

    let bytes = bs58::decode(input)
        .into_vec()
        .map_err(|e| format!("base58 decode failed: {e}"))?;

    bytes
        .try_into()
        .map_err(|v: Vec<u8>| format!("expected {N} bytes, got {}", v.len()))
}
