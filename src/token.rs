//! Per-record capability tokens (`auth_hash`).
//!
//! A token is 128 random bits, rendered as 32 lowercase hex characters on the
//! wire and in the experiment file. Whoever holds the current token may update
//! the record; every successful create or update issues a fresh one.

use std::fmt;
use std::str::FromStr;

use rand::Rng;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

const TOKEN_BYTES: usize = 16;

#[derive(Debug, Error, PartialEq, Eq)]
#[error("auth_hash must be {} hex characters", TOKEN_BYTES * 2)]
pub struct MalformedToken;

#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct AuthToken([u8; TOKEN_BYTES]);

impl AuthToken {
    /// Draw a fresh token from the thread RNG.
    pub fn generate() -> Self {
        let mut bytes = [0u8; TOKEN_BYTES];
        rand::thread_rng().fill(&mut bytes);
        Self(bytes)
    }

    /// Strict equality against the caller-supplied rendering.
    pub fn matches(&self, supplied: &str) -> bool {
        supplied == self.to_string()
    }
}

impl fmt::Display for AuthToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}

// Tokens are secrets; keep them out of debug logs.
impl fmt::Debug for AuthToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AuthToken(..)")
    }
}

impl FromStr for AuthToken {
    type Err = MalformedToken;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut bytes = [0u8; TOKEN_BYTES];
        hex::decode_to_slice(s, &mut bytes).map_err(|_| MalformedToken)?;
        Ok(Self(bytes))
    }
}

impl Serialize for AuthToken {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for AuthToken {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}
