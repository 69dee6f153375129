//! Locking conditions and unlock proofs
//!
//! Only the single-key lock is evaluated here: its bytes are a compressed
//! public key and the unlock is a compact signature over the spending
//! transaction's digest. The other lock types are carried as opaque data.

use super::stack::{Stack, StackLimits};
use super::ScriptError;
use crate::crypto::{public_key_from_bytes, verify_signature, Digest, Hashable, KeyError};
use secp256k1::PublicKey;
use serde::{Deserialize, Serialize};

/// The kind of locking condition on an output
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
#[repr(u8)]
pub enum LockType {
    /// Bytes are a public key; unlocked by a signature from it
    Key = 0,
    /// Bytes are a hash of a public key
    KeyHash = 1,
    /// Bytes are a script
    Script = 2,
    /// Bytes are a hash of a redeem script
    Redeem = 3,
}

impl From<LockType> for u8 {
    fn from(t: LockType) -> u8 {
        t as u8
    }
}

impl TryFrom<u8> for LockType {
    type Error = ScriptError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(LockType::Key),
            1 => Ok(LockType::KeyHash),
            2 => Ok(LockType::Script),
            3 => Ok(LockType::Redeem),
            other => Err(ScriptError::UnknownLockType(other)),
        }
    }
}

/// Locking condition of an output
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Lock {
    #[serde(rename = "type")]
    pub lock_type: LockType,
    #[serde(with = "hex_bytes")]
    pub bytes: Vec<u8>,
}

impl Lock {
    pub fn new(lock_type: LockType, bytes: Vec<u8>) -> Self {
        Self { lock_type, bytes }
    }

    /// Single-key lock for a public key
    pub fn from_public_key(public_key: &PublicKey) -> Self {
        Self::new(LockType::Key, public_key.serialize().to_vec())
    }

    pub fn is_single_key(&self) -> bool {
        self.lock_type == LockType::Key
    }

    /// The owning public key of a single-key lock
    pub fn public_key(&self) -> Option<PublicKey> {
        if !self.is_single_key() {
            return None;
        }
        public_key_from_bytes(&self.bytes).ok()
    }

    /// Check that `unlock` satisfies this lock for a transaction digest
    pub fn verify(&self, unlock: &Unlock, digest: &Digest) -> Result<bool, KeyError> {
        if !self.is_single_key() {
            return Ok(false);
        }
        let public_key = public_key_from_bytes(&self.bytes)?;
        verify_signature(&public_key, digest.as_bytes(), &unlock.bytes)
    }

    /// Run `unlock` against this lock on a stack bounded by `limits`
    ///
    /// The unlock proof is pushed as one item, so a proof larger than the
    /// item limit fails with a stack overflow before any signature check.
    /// Malformed keys or signatures evaluate to false.
    pub fn evaluate(
        &self,
        unlock: &Unlock,
        digest: &Digest,
        limits: StackLimits,
    ) -> Result<bool, ScriptError> {
        let mut stack = Stack::with_limits(limits);
        stack.push(unlock.bytes.clone())?;
        if !self.is_single_key() {
            return Ok(false);
        }

        let signature = stack.pop()?;
        let public_key = match public_key_from_bytes(&self.bytes) {
            Ok(key) => key,
            Err(_) => return Ok(false),
        };
        Ok(verify_signature(&public_key, digest.as_bytes(), &signature).unwrap_or(false))
    }
}

impl Hashable for Lock {
    fn compute_hash(&self, buf: &mut Vec<u8>) {
        (self.lock_type as u8).compute_hash(buf);
        self.bytes.compute_hash(buf);
    }
}

/// Proof that satisfies a lock
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Unlock {
    #[serde(with = "hex_bytes")]
    pub bytes: Vec<u8>,
}

impl Unlock {
    pub fn new(bytes: Vec<u8>) -> Self {
        Self { bytes }
    }
}

impl Hashable for Unlock {
    fn compute_hash(&self, buf: &mut Vec<u8>) {
        self.bytes.compute_hash(buf);
    }
}

/// Byte fields travel as lowercase hex strings
pub(crate) mod hex_bytes {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&hex::encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let s = String::deserialize(deserializer)?;
        hex::decode(s.strip_prefix("0x").unwrap_or(&s)).map_err(serde::de::Error::custom)
    }
}
