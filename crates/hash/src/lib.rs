//! Deterministic 32-bit hashing of byte ranges.
//!
//! Two fixed algorithms are available. Which one [`hash`] uses is decided when
//! the crate is built: 64-bit targets use [`wyhash()`], other targets, or any
//! build with the `hash32` feature, use [`wyhash32()`]. Results are only
//! comparable within one build configuration.
//!
//! These hashes are for in-memory indexing. They are not cryptographic and not
//! resistant to adversarial inputs.

mod wyhash;
mod wyhash32;

use std::{fmt, str::FromStr};

use thiserror::Error;

pub use wyhash::{wyhash, WYHASH_SECRET};
pub use wyhash32::wyhash32;

/// Seed used with [`wyhash32`] by [`HashAlgorithm::Wyhash32`].
pub const WYHASH32_SEED: u32 = 0x91BA_C172;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HashAlgorithmError {
    #[error("Unknown hash algorithm: {0}")]
    UnknownAlgorithm(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HashAlgorithm {
    /// 64-bit wyhash with seed 0 and [`WYHASH_SECRET`], truncated to 32 bits
    Wyhash,
    /// wyhash32 with [`WYHASH32_SEED`]
    Wyhash32,
}

impl HashAlgorithm {
    #[cfg(all(target_pointer_width = "64", not(feature = "hash32")))]
    pub const DEFAULT: HashAlgorithm = HashAlgorithm::Wyhash;

    #[cfg(any(not(target_pointer_width = "64"), feature = "hash32"))]
    pub const DEFAULT: HashAlgorithm = HashAlgorithm::Wyhash32;

    #[inline]
    pub fn hash(self, bytes: &[u8]) -> u32 {
        match self {
            HashAlgorithm::Wyhash => wyhash(bytes, 0, &WYHASH_SECRET) as u32,
            HashAlgorithm::Wyhash32 => wyhash32(bytes, WYHASH32_SEED),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            HashAlgorithm::Wyhash => "wyhash",
            HashAlgorithm::Wyhash32 => "wyhash32",
        }
    }
}

impl Default for HashAlgorithm {
    fn default() -> Self {
        HashAlgorithm::DEFAULT
    }
}

impl fmt::Display for HashAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HashAlgorithm {
    type Err = HashAlgorithmError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "wyhash" => Ok(HashAlgorithm::Wyhash),
            "wyhash32" => Ok(HashAlgorithm::Wyhash32),
            _ => Err(HashAlgorithmError::UnknownAlgorithm(s.to_string())),
        }
    }
}

/// Hash `bytes` with [`HashAlgorithm::DEFAULT`].
#[inline]
pub fn hash(bytes: &[u8]) -> u32 {
    HashAlgorithm::DEFAULT.hash(bytes)
}
