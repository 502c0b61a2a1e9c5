//! Entropy pool and verification hashing.
//!
//! The pool is the only source of drawn numbers and proof snippets.
//! The hasher binds each draw to its game so stored records can be
//! re-checked later.

mod hash;
mod ring;

pub use hash::{djb2_two_pass, to_hex, HashAlgorithm, VerificationHasher};
pub use ring::EntropyPool;
