//! Cryptographic utilities
//!
//! This module provides:
//! - The hashing protocol (BLAKE2b-512 digests, UTXO keys)
//! - ECDSA key management (secp256k1)

pub mod hash;
pub mod keys;

pub use hash::{
    blake2b_512, hash_full, hash_multi, hash_optional, sha256, utxo_key, Digest, HashError,
    Hashable, DIGEST_SIZE,
};
pub use keys::{
    public_key_from_bytes, public_key_from_hex, public_key_to_address, sign_message,
    verify_signature, KeyError, KeyPair, PUBLIC_KEY_SIZE, SIGNATURE_SIZE,
};
