use {
    aes::Aes256,
    aes_siv::{Aes256SivAead, KeyInit, Nonce, aead::Aead},
    anyhow::{Context, Result, format_err},
    ctr::cipher::{KeyIvInit, StreamCipher, StreamCipherSeek},
    drive_crypt_protocol::credentials::EncryptionKey,
    hkdf::Hkdf,
    sha2::Sha256,
};

type Aes256Ctr = ctr::Ctr128BE<Aes256>;

const CONTENT_KEY_INFO: &[u8] = b"drive-crypt content v1";
const CONTENT_KEY_SIZE: usize = 32;
const CONTENT_IV_SIZE: usize = 16;

pub struct Cipher {
    names: Aes256SivAead,
    content_key: [u8; CONTENT_KEY_SIZE],
    content_iv: [u8; CONTENT_IV_SIZE],
}

impl Cipher {
    #[inline]
    pub fn new(key: &EncryptionKey) -> Result<Self> {
        let mut okm = [0_u8; CONTENT_KEY_SIZE + CONTENT_IV_SIZE];
        Hkdf::<Sha256>::new(None, key.get().as_ref())
            .expand(CONTENT_KEY_INFO, &mut okm)
            .map_err(|err| format_err!("content key derivation failed: {err}"))?;
        let (content_key, content_iv) = okm.split_at(CONTENT_KEY_SIZE);
        Ok(Self {
            names: Aes256SivAead::new(key.get()),
            content_key: content_key.try_into()?,
            content_iv: content_iv.try_into()?,
        })
    }

    /// XORs `buf` in place with the keystream starting at absolute
    /// position `offset`. Encryption and decryption are the same operation.
    #[inline]
    pub fn apply_keystream(&self, buf: &mut [u8], offset: u64) -> Result<()> {
        let mut ctr = Aes256Ctr::new((&self.content_key).into(), (&self.content_iv).into());
        ctr.try_seek(offset)
            .map_err(|err| format_err!("cannot seek keystream to {offset}: {err}"))?;
        ctr.try_apply_keystream(buf)
            .map_err(|err| format_err!("keystream exhausted after {offset}: {err}"))
    }

    #[inline]
    pub fn encrypt(&self, plaintext: &[u8], offset: u64) -> Result<Vec<u8>> {
        let mut output = plaintext.to_vec();
        self.apply_keystream(&mut output, offset)?;
        Ok(output)
    }

    #[inline]
    pub fn decrypt(&self, ciphertext: &[u8], offset: u64) -> Result<Vec<u8>> {
        self.encrypt(ciphertext, offset)
    }

    /// Output matches `[0-9a-f]+` and is `2 * (name.len() + 16)` characters long.
    #[inline]
    pub fn encrypt_name(&self, name: &str) -> Result<String> {
        let ciphertext = self
            .names
            .encrypt(&Nonce::default(), name.as_bytes())
            .context("name encryption failed")?;
        Ok(hex::encode(ciphertext))
    }

    #[inline]
    pub fn decrypt_name(&self, name: &str) -> Result<String> {
        let ciphertext =
            hex::decode(name).with_context(|| format!("encrypted name is not hex: `{name}`"))?;
        let plaintext = self
            .names
            .decrypt(&Nonce::default(), ciphertext.as_slice())
            .with_context(|| format!("decryption failed for `{name}`"))?;
        Ok(String::from_utf8(plaintext)?)
    }
}

#[cfg(test)]
#[expect(
    clippy::arithmetic_side_effects,
    clippy::as_conversions,
    clippy::indexing_slicing,
    reason = "test"
)]
mod tests {
    use {super::*, rand::RngCore};

    fn cipher() -> Cipher {
        Cipher::new(&EncryptionKey::from([7; 64])).unwrap()
    }

    #[test]
    fn binary_roundtrip() {
        let cipher = cipher();
        let binary: Vec<u8> = (0..=254).collect();

        let encrypted = cipher.encrypt(&binary, 0).unwrap();
        assert_ne!(encrypted, binary);
        assert_eq!(encrypted.len(), binary.len());

        let decrypted = cipher.decrypt(&encrypted, 0).unwrap();
        assert_eq!(decrypted, binary);
    }

    #[test]
    fn roundtrip_at_any_offset() {
        let cipher = cipher();
        let mut data = vec![0_u8; 1000];
        rand::rng().fill_bytes(&mut data);
        for offset in [0, 1, 15, 16, 17, 4095, 1 << 40, u64::from(u32::MAX)] {
            let encrypted = cipher.encrypt(&data, offset).unwrap();
            assert_eq!(encrypted.len(), data.len());
            assert_eq!(cipher.decrypt(&encrypted, offset).unwrap(), data);
        }
    }

    #[test]
    fn wrong_offset_does_not_decrypt() {
        let cipher = cipher();
        let data = b"some file content".to_vec();
        let encrypted = cipher.encrypt(&data, 100).unwrap();
        assert_ne!(cipher.decrypt(&encrypted, 101).unwrap(), data);
    }

    #[test]
    fn split_encryption_matches_whole() {
        let cipher = cipher();
        let mut data = vec![0_u8; 300];
        rand::rng().fill_bytes(&mut data);
        let offset = 37;
        let whole = cipher.encrypt(&data, offset).unwrap();
        for split in [0, 1, 15, 16, 33, 299, 300] {
            let (head, tail) = data.split_at(split);
            let mut joined = cipher.encrypt(head, offset).unwrap();
            joined.extend(cipher.encrypt(tail, offset + split as u64).unwrap());
            assert_eq!(joined, whole, "split at {split}");
        }
    }

    #[test]
    fn empty_input() {
        let cipher = cipher();
        assert!(cipher.encrypt(&[], 12345).unwrap().is_empty());
    }

    #[test]
    fn different_keys_different_keystream() {
        let other = Cipher::new(&EncryptionKey::from([8; 64])).unwrap();
        let data = [0_u8; 64];
        assert_ne!(
            cipher().encrypt(&data, 0).unwrap(),
            other.encrypt(&data, 0).unwrap()
        );
    }

    #[test]
    fn name_roundtrip() {
        let cipher = cipher();
        let text = "1234567890\
            abcdefghijklmnopqrstuvwxyz\
            ().~@-[]{}:,\
            レオナルド・ディ・セル・ピエーロ・ダ・ヴィンチ";

        let encrypted = cipher.encrypt_name(text).unwrap();
        assert_ne!(encrypted, text);
        assert!(
            encrypted
                .chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit())
        );
        assert_eq!(encrypted.len(), 2 * (text.len() + 16));

        let decrypted = cipher.decrypt_name(&encrypted).unwrap();
        assert_eq!(decrypted, text);
    }

    #[test]
    fn name_encryption_is_deterministic() {
        let cipher = cipher();
        assert_eq!(
            cipher.encrypt_name("report.pdf").unwrap(),
            cipher.encrypt_name("report.pdf").unwrap()
        );
        assert_ne!(
            cipher.encrypt_name("a.txt").unwrap(),
            cipher.encrypt_name("b.txt").unwrap()
        );
    }

    #[test]
    fn empty_name_is_not_empty() {
        let cipher = cipher();
        let encrypted = cipher.encrypt_name("").unwrap();
        assert_eq!(encrypted.len(), 32);
        assert_eq!(cipher.decrypt_name(&encrypted).unwrap(), "");
    }

    #[test]
    fn decrypt_name_rejects_garbage() {
        let cipher = cipher();
        cipher.decrypt_name("not hex at all").unwrap_err();
        cipher.decrypt_name("abcd").unwrap_err();

        let mut encrypted = cipher.encrypt_name("secret.txt").unwrap().into_bytes();
        encrypted[0] = if encrypted[0] == b'0' { b'1' } else { b'0' };
        cipher
            .decrypt_name(&String::from_utf8(encrypted).unwrap())
            .unwrap_err();

        let other = Cipher::new(&EncryptionKey::from([8; 64])).unwrap();
        let encrypted = cipher.encrypt_name("secret.txt").unwrap();
        other.decrypt_name(&encrypted).unwrap_err();
    }
}
