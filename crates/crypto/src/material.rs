//! Channel crypto material derivation.
//!
//! Every mesh channel is identified by a `#name`. The symmetric key and
//! the one-byte header tag used to pre-filter frames are both derived
//! deterministically from that name, so any two clients configured with
//! the same channel name converge on the same material without key
//! exchange.

use sha2::{Digest, Sha256};

use crate::error::CryptoError;

/// Length of the derived channel key in bytes (AES-128).
pub const KEY_LEN: usize = 16;

/// Immutable per-channel crypto material, derived once at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelMaterial {
    /// Normalized (lowercase) channel name
    pub name: String,
    /// Symmetric channel key
    pub key: [u8; KEY_LEN],
    /// One-byte tag prefixed to every encrypted channel payload
    pub header_tag: u8,
}

/// Derive channel material from a channel name.
///
/// The name must start with `#` followed by at least one character from
/// `[A-Za-z0-9_-]`. The name is normalized to lowercase before hashing,
/// so `#Coverage` and `#coverage` share a key. The key is the first 16
/// bytes of SHA-256 over the normalized name; the header tag is the
/// first byte of SHA-256 over the key.
///
/// Derivation is deterministic: the same name always yields the same
/// material, across calls and across runs.
pub fn derive_material(name: &str) -> Result<ChannelMaterial, CryptoError> {
    let Some(rest) = name.strip_prefix('#') else {
        return Err(CryptoError::InvalidChannelName(format!(
            "channel name must start with '#': {:?}",
            name
        )));
    };

    if rest.is_empty() {
        return Err(CryptoError::InvalidChannelName(
            "channel name must not be empty after '#'".to_string(),
        ));
    }

    if !rest
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return Err(CryptoError::InvalidChannelName(format!(
            "channel name contains disallowed characters: {:?}",
            name
        )));
    }

    let normalized = name.to_ascii_lowercase();

    let name_hash = Sha256::digest(normalized.as_bytes());
    let mut key = [0u8; KEY_LEN];
    key.copy_from_slice(&name_hash[..KEY_LEN]);

    let key_hash = Sha256::digest(key);
    let header_tag = key_hash[0];

    Ok(ChannelMaterial {
        name: normalized,
        key,
        header_tag,
    })
}
