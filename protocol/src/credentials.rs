use {
    aes_siv::{Aes256SivAead, Key, aead::array::Array},
    anyhow::{Error, format_err},
    base64::{Engine, display::Base64Display, prelude::BASE64_URL_SAFE_NO_PAD},
    generic_array::typenum::U64,
    rand::CryptoRng,
    serde::{Deserialize, Deserializer, Serialize, Serializer, de},
    std::{
        borrow::Cow,
        fmt::{self, Debug, Display},
        str::FromStr,
    },
};

pub const KEY_LENGTH: usize = 64;

/// Secret used to encrypt node names and file contents.
///
/// Every client that shares a remote drive must use the same key, otherwise
/// names and contents written by one client are unreadable by the others.
#[derive(Clone)]
pub struct EncryptionKey(Array<u8, U64>);

impl EncryptionKey {
    #[must_use]
    #[inline]
    pub fn generate() -> Self {
        Self::generate_with_rng(&mut rand::rng())
    }

    #[inline]
    pub fn generate_with_rng<R: CryptoRng + ?Sized>(rng: &mut R) -> Self {
        let mut key = Key::<Aes256SivAead>::default();
        rng.fill_bytes(&mut key);
        Self(key)
    }

    #[must_use]
    #[inline]
    pub fn get(&self) -> &Array<u8, U64> {
        &self.0
    }

    #[must_use]
    #[inline]
    pub fn display_unmasked(&self) -> impl Display + '_ {
        Base64Display::new(self.0.as_ref(), &BASE64_URL_SAFE_NO_PAD)
    }
}

impl From<[u8; KEY_LENGTH]> for EncryptionKey {
    #[inline]
    fn from(bytes: [u8; KEY_LENGTH]) -> Self {
        Self(bytes.into())
    }
}

impl TryFrom<&[u8]> for EncryptionKey {
    type Error = Error;

    #[inline]
    fn try_from(bytes: &[u8]) -> Result<Self, Self::Error> {
        let array = <[u8; KEY_LENGTH]>::try_from(bytes).map_err(|_| {
            format_err!(
                "encryption key must be {KEY_LENGTH} bytes long, got {}",
                bytes.len()
            )
        })?;
        Ok(Self::from(array))
    }
}

impl FromStr for EncryptionKey {
    type Err = Error;

    #[inline]
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::try_from(BASE64_URL_SAFE_NO_PAD.decode(s)?.as_slice())
    }
}

impl Serialize for EncryptionKey {
    #[inline]
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&self.display_unmasked())
    }
}

impl<'de> Deserialize<'de> for EncryptionKey {
    #[inline]
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Cow::<'_, str>::deserialize(deserializer)?
            .parse()
            .map_err(de::Error::custom)
    }
}

impl Debug for EncryptionKey {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("EncryptionKey(..)")
    }
}
