//! Transparent encryption layer for remote drives.
//!
//! [`CryptFileService`] wraps any [`FileService`](drive_crypt_protocol::service::FileService)
//! and encrypts node names and file content of nodes tagged with `crypt` in
//! their private metadata. Untagged nodes pass through unchanged.

pub mod config;
pub mod crypto;
pub mod service;
pub mod tag;

pub use {
    crypto::Cipher,
    service::{CryptFileService, CryptReadable, CryptWritable},
    tag::UnsupportedCryptVersion,
};
