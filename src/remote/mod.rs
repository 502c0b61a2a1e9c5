//! Remote cross-verification.
//!
//! Compares local verification records against a server-side copy,
//! such as the one published by the `server` feature.

mod client;

pub use client::{CrossVerification, CrossVerifier, HttpRemoteVerifier, RemoteError, RemoteVerifier};
