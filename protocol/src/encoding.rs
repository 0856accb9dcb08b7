//! Compact binary form for values that cross a process boundary
//! (hasher factories handed to worker processes, persisted node records).

use {
    anyhow::{Context as _, Result},
    serde::{Serialize, de::DeserializeOwned},
};

#[inline]
pub fn serialize<T: Serialize>(value: &T) -> Result<Vec<u8>> {
    bincode::serde::encode_to_vec(value, bincode::config::standard())
        .context("failed to serialize value")
}

#[inline]
pub fn deserialize<T: DeserializeOwned>(data: &[u8]) -> Result<T> {
    let (value, len) = bincode::serde::decode_from_slice(data, bincode::config::standard())
        .context("failed to deserialize value")?;
    anyhow::ensure!(
        len == data.len(),
        "trailing data after value; consumed {len} of {} bytes",
        data.len(),
    );
    Ok(value)
}
