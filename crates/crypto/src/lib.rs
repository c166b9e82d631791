//! Cryptographic primitives for EchoGrid channel messages.
//!
//! This crate derives per-channel key material from a channel name and
//! implements the symmetric block scheme used for group text messages on
//! the mesh: stateless AES-128 blocks with no IV, framed by a one-byte
//! channel tag and a two-byte MAC.
//!
//! There is deliberately no cryptographic novelty here. The channel key
//! is a truncated SHA-256 of the normalized channel name; the scheme
//! exists for channel scoping, not confidentiality guarantees.

#![warn(missing_docs)]

pub mod cipher;
pub mod error;
pub mod material;

pub use cipher::{decrypt_channel_message, encrypt_channel_message, DecryptedMessage, BLOCK_LEN};
pub use error::{CryptoError, CryptoResult};
pub use material::{derive_material, ChannelMaterial};
