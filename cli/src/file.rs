use {
    anyhow::{Result, format_err},
    drive_crypt::Cipher,
    fs_err::File,
    std::{
        io::{Read, Write},
        path::Path,
    },
    tracing::info,
};

const CHUNK_SIZE: usize = 64 * 1024;

/// Applies the content keystream to `input` and writes the result to `output`.
///
/// The same call encrypts and decrypts. `offset` is the position of the first
/// input byte within the remote file.
pub fn transform_file(cipher: &Cipher, input: &Path, output: &Path, offset: u64) -> Result<u64> {
    let mut reader = File::open(input)?;
    let mut writer = File::create(output)?;
    let mut buf = vec![0_u8; CHUNK_SIZE];
    let mut position = offset;
    loop {
        let len = reader.read(&mut buf)?;
        let Some(chunk) = buf.get_mut(..len).filter(|chunk| !chunk.is_empty()) else {
            break;
        };
        cipher.apply_keystream(chunk, position)?;
        writer.write_all(chunk)?;
        position = position
            .checked_add(u64::try_from(len)?)
            .ok_or_else(|| format_err!("file is too large"))?;
    }
    writer.flush()?;
    let total = position.saturating_sub(offset);
    info!(bytes = total, path = %output.display(), "file written");
    Ok(total)
}
