//! Node names are encrypted with AES-SIV using a zero nonce, so the result is
//! deterministic. The remote service identifies children by name, so encrypting
//! the same name again must yield the same ciphertext. The SIV output is
//! encoded as lowercase hex, which is accepted by remote services with
//! case-insensitive or restricted namespaces.
//!
//! File content is encrypted with AES-256-CTR. The content key and the initial
//! counter block are derived from the encryption key with HKDF-SHA256. The
//! keystream byte at position `i` depends only on the key and `i`, so:
//!
//! - ciphertext has exactly the same length as plaintext, which keeps sizes
//!   reported by the remote service correct;
//! - any range of a file can be encrypted or decrypted on its own, which keeps
//!   seeking, resumable uploads and chunked hashing working.
//!
//! There is no authentication tag on file content.

mod cipher;
pub mod hasher;
pub mod io;

pub use {
    cipher::Cipher,
    hasher::{EncryptHasher, EncryptHasherFactory},
    io::{DecryptReadableFile, EncryptWritableFile},
};
