//! Hashing protocol for ledger records
//!
//! Every record that takes part in transaction identity writes its own
//! fields, in a fixed order, into a byte buffer through [`Hashable`]. The
//! buffer is then run once through BLAKE2b-512. UTXO keys and
//! transaction IDs are all derived this way.

use blake2::{Blake2b512, Digest as _};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha2::Sha256;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Size of a digest in bytes
pub const DIGEST_SIZE: usize = 64;

/// Errors raised when parsing a digest
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HashError {
    #[error("Invalid hex string: {0}")]
    InvalidHex(String),
    #[error("Invalid digest length: expected 64 bytes, got {0}")]
    InvalidLength(usize),
}

// =============================================================================
// Digest
// =============================================================================

/// A 64-byte BLAKE2b-512 digest
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Digest([u8; DIGEST_SIZE]);

impl Digest {
    /// The all-zero digest, used as the hash of an absent record
    pub const NULL: Digest = Digest([0u8; DIGEST_SIZE]);

    pub fn from_bytes(bytes: [u8; DIGEST_SIZE]) -> Self {
        Self(bytes)
    }

    pub fn from_slice(bytes: &[u8]) -> Result<Self, HashError> {
        let array: [u8; DIGEST_SIZE] = bytes
            .try_into()
            .map_err(|_| HashError::InvalidLength(bytes.len()))?;
        Ok(Self(array))
    }

    pub fn as_bytes(&self) -> &[u8; DIGEST_SIZE] {
        &self.0
    }

    pub fn is_null(&self) -> bool {
        self.0 == [0u8; DIGEST_SIZE]
    }

    /// `0x`-prefixed lowercase hex form
    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(self.0))
    }
}

impl Default for Digest {
    fn default() -> Self {
        Self::NULL
    }
}

impl AsRef<[u8]> for Digest {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Display for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Digest({})", self.to_hex())
    }
}

impl FromStr for Digest {
    type Err = HashError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let body = s.strip_prefix("0x").unwrap_or(s);
        if body.len() != DIGEST_SIZE * 2 {
            return Err(HashError::InvalidLength(body.len() / 2));
        }
        if body.bytes().any(|b| b.is_ascii_uppercase()) {
            return Err(HashError::InvalidHex("uppercase hex digit".to_string()));
        }
        let bytes = hex::decode(body).map_err(|e| HashError::InvalidHex(e.to_string()))?;
        Self::from_slice(&bytes)
    }
}

impl Serialize for Digest {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Digest {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

// =============================================================================
// Hashable
// =============================================================================

/// A record that knows how to write its hash contribution
///
/// Implementations append their fields to `buf` in a fixed order. Two
/// equal records must always produce the same bytes.
pub trait Hashable {
    fn compute_hash(&self, buf: &mut Vec<u8>);
}

macro_rules! hashable_le {
    ($($t:ty),*) => {
        $(
            impl Hashable for $t {
                fn compute_hash(&self, buf: &mut Vec<u8>) {
                    buf.extend_from_slice(&self.to_le_bytes());
                }
            }
        )*
    };
}

hashable_le!(u8, u16, u32, u64, i32, i64);

impl Hashable for bool {
    fn compute_hash(&self, buf: &mut Vec<u8>) {
        buf.push(*self as u8);
    }
}

impl Hashable for str {
    fn compute_hash(&self, buf: &mut Vec<u8>) {
        buf.extend_from_slice(self.as_bytes());
    }
}

impl Hashable for String {
    fn compute_hash(&self, buf: &mut Vec<u8>) {
        self.as_str().compute_hash(buf);
    }
}

impl Hashable for Digest {
    fn compute_hash(&self, buf: &mut Vec<u8>) {
        buf.extend_from_slice(&self.0);
    }
}

impl<T: Hashable> Hashable for [T] {
    fn compute_hash(&self, buf: &mut Vec<u8>) {
        for item in self {
            item.compute_hash(buf);
        }
    }
}

impl<T: Hashable> Hashable for Vec<T> {
    fn compute_hash(&self, buf: &mut Vec<u8>) {
        self.as_slice().compute_hash(buf);
    }
}

impl<T: Hashable, const N: usize> Hashable for [T; N] {
    fn compute_hash(&self, buf: &mut Vec<u8>) {
        self.as_slice().compute_hash(buf);
    }
}

impl<T: Hashable + ?Sized> Hashable for &T {
    fn compute_hash(&self, buf: &mut Vec<u8>) {
        (**self).compute_hash(buf);
    }
}

// =============================================================================
// Digest functions
// =============================================================================

/// Run raw bytes through the digest primitive
pub fn blake2b_512(data: &[u8]) -> Digest {
    let mut hasher = Blake2b512::new();
    hasher.update(data);
    let out = hasher.finalize();
    let mut bytes = [0u8; DIGEST_SIZE];
    bytes.copy_from_slice(&out);
    Digest(bytes)
}

/// Hash a full record
pub fn hash_full<T: Hashable + ?Sized>(record: &T) -> Digest {
    let mut buf = Vec::new();
    record.compute_hash(&mut buf);
    blake2b_512(&buf)
}

/// Hash a record that may be absent; `None` hashes to [`Digest::NULL`]
pub fn hash_optional<T: Hashable + ?Sized>(record: Option<&T>) -> Digest {
    match record {
        Some(record) => hash_full(record),
        None => Digest::NULL,
    }
}

/// Hash the concatenation of two records' contributions
pub fn hash_multi<A: Hashable + ?Sized, B: Hashable + ?Sized>(a: &A, b: &B) -> Digest {
    let mut buf = Vec::new();
    a.compute_hash(&mut buf);
    b.compute_hash(&mut buf);
    blake2b_512(&buf)
}

/// Key of output `index` of the transaction hashed to `tx_hash`
pub fn utxo_key(tx_hash: &Digest, index: u64) -> Digest {
    hash_multi(tx_hash, &index.to_le_bytes())
}

/// Computes SHA-256 hash of the input data
pub fn sha256(data: &[u8]) -> Vec<u8> {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hasher.finalize().to_vec()
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Pair {
        left: u32,
        right: String,
    }

    impl Hashable for Pair {
        fn compute_hash(&self, buf: &mut Vec<u8>) {
            self.left.compute_hash(buf);
            self.right.compute_hash(buf);
        }
    }

    #[test]
    fn test_hash_is_deterministic() {
        let a = Pair {
            left: 7,
            right: "boa".to_string(),
        };
        let b = Pair {
            left: 7,
            right: "boa".to_string(),
        };
        assert_eq!(hash_full(&a), hash_full(&b));
        assert_ne!(hash_full(&a), Digest::NULL);
    }

    #[test]
    fn test_absent_record_is_null() {
        assert_eq!(hash_optional::<Pair>(None), Digest::NULL);
        assert!(hash_optional::<u32>(None).is_null());
        assert!(!hash_optional(Some(&0u32)).is_null());
    }

    #[test]
    fn test_sequences_hash_elements_in_order() {
        let forward = hash_full(&vec![1u32, 2, 3]);
        let reverse = hash_full(&vec![3u32, 2, 1]);
        assert_ne!(forward, reverse);

        // A sequence contributes exactly its elements' bytes
        let mut expected = Vec::new();
        for v in [1u32, 2, 3] {
            expected.extend_from_slice(&v.to_le_bytes());
        }
        assert_eq!(forward, blake2b_512(&expected));
    }

    #[test]
    fn test_hash_multi_is_order_sensitive() {
        let a = hash_full("first");
        let b = hash_full("second");
        assert_ne!(hash_multi(&a, &b), hash_multi(&b, &a));

        let mut concat = a.as_bytes().to_vec();
        concat.extend_from_slice(b.as_bytes());
        assert_eq!(hash_multi(&a, &b), blake2b_512(&concat));
    }

    #[test]
    fn test_utxo_key_uses_le_index() {
        let tx_hash = hash_full("tx");
        let key = utxo_key(&tx_hash, 1);
        let mut buf = tx_hash.as_bytes().to_vec();
        buf.extend_from_slice(&[1, 0, 0, 0, 0, 0, 0, 0]);
        assert_eq!(key, blake2b_512(&buf));
        assert_ne!(utxo_key(&tx_hash, 0), key);
    }

    #[test]
    fn test_digest_text_form() {
        let d = hash_full("hello");
        let text = d.to_string();
        assert!(text.starts_with("0x"));
        assert_eq!(text.len(), 2 + DIGEST_SIZE * 2);
        assert_eq!(text, text.to_lowercase());
        assert_eq!(text.parse::<Digest>().unwrap(), d);

        let json = serde_json::to_string(&d).unwrap();
        assert_eq!(json, format!("\"{}\"", text));
        assert_eq!(serde_json::from_str::<Digest>(&json).unwrap(), d);
    }

    #[test]
    fn test_digest_parse_errors() {
        assert!(matches!(
            "0x1234".parse::<Digest>(),
            Err(HashError::InvalidLength(_))
        ));
        let bad = format!("0x{}", "zz".repeat(DIGEST_SIZE));
        assert!(matches!(bad.parse::<Digest>(), Err(HashError::InvalidHex(_))));

        // Only the lowercase form is accepted
        let upper = hash_full("hello").to_string().to_uppercase().replacen("0X", "0x", 1);
        assert!(matches!(upper.parse::<Digest>(), Err(HashError::InvalidHex(_))));
        let json = format!("\"{}\"", upper);
        assert!(serde_json::from_str::<Digest>(&json).is_err());
    }

    #[test]
    fn test_sha256() {
        assert_eq!(
            hex::encode(sha256(b"hello world")),
            "b94d27b9934d3e08a52e52d7da7dabfac484efe37a5380ee9088f7ace2efcde9"
        );
    }
}
