//! Symmetric channel message encryption and decryption.
//!
//! Channel payload layout on the wire:
//!
//! ```text
//! [ channel tag (1) | MAC (2) | ciphertext (n * 16) ]
//! ```
//!
//! The ciphertext is a sequence of independent AES-128 blocks under the
//! channel key. There is no IV and no chaining: each block decrypts on
//! its own. The concatenated plaintext is a 4-byte little-endian Unix
//! timestamp, a flags byte, then UTF-8 text zero-padded to the block
//! boundary.
//!
//! Decryption is total over garbage input: every structural anomaly is
//! `None`, never a panic, because unmatched frames arrive continuously
//! during normal operation.

use aes::cipher::{generic_array::GenericArray, BlockDecrypt, BlockEncrypt, KeyInit};
use aes::Aes128;
use sha2::{Digest, Sha256};
use tracing::trace;

use crate::material::{ChannelMaterial, KEY_LEN};

/// AES-128 block length in bytes.
pub const BLOCK_LEN: usize = 16;

/// Channel tag (1) plus truncated MAC (2).
pub const FRAME_OVERHEAD: usize = 3;

/// Byte offset of the message text within the plaintext.
const TEXT_OFFSET: usize = 5;

/// A structurally decoded channel message.
///
/// Validity beyond structure (whether the text is meaningful) is judged
/// by the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecryptedMessage {
    /// Unix timestamp in seconds, as carried in the message
    pub timestamp: u32,
    /// Message flags byte
    pub flags: u8,
    /// Message text, trailing NUL padding trimmed
    pub text: String,
}

/// Decrypt and structurally decode a channel message payload.
///
/// Returns `None` on a payload shorter than the tag+MAC overhead, zero
/// cipher blocks, or a ciphertext that is not a whole number of blocks.
/// Garbage plaintext still decodes (lossy UTF-8); it simply will not
/// match anything downstream.
pub fn decrypt_channel_message(payload: &[u8], key: &[u8; KEY_LEN]) -> Option<DecryptedMessage> {
    if payload.len() < FRAME_OVERHEAD {
        trace!(len = payload.len(), "payload shorter than tag+MAC overhead");
        return None;
    }

    let ciphertext = &payload[FRAME_OVERHEAD..];
    if ciphertext.is_empty() || ciphertext.len() % BLOCK_LEN != 0 {
        trace!(len = ciphertext.len(), "ciphertext is not a whole number of blocks");
        return None;
    }

    let cipher = Aes128::new(GenericArray::from_slice(key));

    let mut plaintext = Vec::with_capacity(ciphertext.len());
    for chunk in ciphertext.chunks_exact(BLOCK_LEN) {
        let mut block = GenericArray::clone_from_slice(chunk);
        cipher.decrypt_block(&mut block);
        plaintext.extend_from_slice(&block);
    }

    if plaintext.len() < TEXT_OFFSET {
        return None;
    }

    let timestamp = u32::from_le_bytes(plaintext[..4].try_into().ok()?);
    let flags = plaintext[4];

    let text_bytes = &plaintext[TEXT_OFFSET..];
    let trimmed_len = text_bytes
        .iter()
        .rposition(|&b| b != 0)
        .map_or(0, |pos| pos + 1);
    let text = String::from_utf8_lossy(&text_bytes[..trimmed_len]).into_owned();

    Some(DecryptedMessage {
        timestamp,
        flags,
        text,
    })
}

/// Encrypt a channel message into a wire payload.
///
/// Produces the tag+MAC+ciphertext layout that [`decrypt_channel_message`]
/// consumes, zero-padding the plaintext to the block boundary. The MAC is
/// the first two bytes of SHA-256 over the key followed by the ciphertext.
pub fn encrypt_channel_message(
    material: &ChannelMaterial,
    timestamp: u32,
    flags: u8,
    text: &str,
) -> Vec<u8> {
    let mut plaintext = Vec::with_capacity(TEXT_OFFSET + text.len());
    plaintext.extend_from_slice(&timestamp.to_le_bytes());
    plaintext.push(flags);
    plaintext.extend_from_slice(text.as_bytes());

    // Pad with NULs to a whole number of blocks, at least one.
    let padded_len = plaintext.len().div_ceil(BLOCK_LEN).max(1) * BLOCK_LEN;
    plaintext.resize(padded_len, 0);

    let cipher = Aes128::new(GenericArray::from_slice(&material.key));

    let mut ciphertext = Vec::with_capacity(padded_len);
    for chunk in plaintext.chunks_exact(BLOCK_LEN) {
        let mut block = GenericArray::clone_from_slice(chunk);
        cipher.encrypt_block(&mut block);
        ciphertext.extend_from_slice(&block);
    }

    let mut mac_input = Vec::with_capacity(KEY_LEN + ciphertext.len());
    mac_input.extend_from_slice(&material.key);
    mac_input.extend_from_slice(&ciphertext);
    let mac = Sha256::digest(&mac_input);

    let mut payload = Vec::with_capacity(FRAME_OVERHEAD + ciphertext.len());
    payload.push(material.header_tag);
    payload.extend_from_slice(&mac[..2]);
    payload.extend_from_slice(&ciphertext);
    payload
}
