use crate::determinism::json_canonical::to_canonical_bytes;
use crate::error::{CoreError, CoreResult};
use serde::Serialize;
use sha2::{Digest, Sha256};

pub fn sha256_hex(bytes: &[u8]) -> String {
    let mut h = Sha256::new();
    h.update(bytes);
    hex::encode(h.finalize())
}

/// SHA-256 over the canonical JSON form of `value`.
pub fn canonical_fingerprint<T: Serialize>(value: &T) -> CoreResult<String> {
    Ok(sha256_hex(&to_canonical_bytes(value)?))
}

pub fn validation_id_from_fingerprint_hex32(fingerprint_hex: &str) -> CoreResult<String> {
    let hex = fingerprint_hex.trim();
    if hex.len() < 32 || !hex.chars().take(32).all(|c| c.is_ascii_hexdigit()) {
        return Err(CoreError::InvalidInput(
            "fingerprint must be hex with length >= 32".to_string(),
        ));
    }
    Ok(format!("v_{}", hex[..32].to_ascii_lowercase()))
}
