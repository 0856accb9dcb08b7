use {
    crate::crypto::Cipher,
    anyhow::Result,
    cadd::ops::Cadd,
    drive_crypt_protocol::{
        credentials::EncryptionKey,
        service::{Hasher, HasherFactory},
    },
    serde::{Deserialize, Serialize},
    std::sync::Arc,
};

/// Feeds encrypted bytes to the inner hasher, so the digest matches the one
/// the remote service computes over the stored ciphertext.
pub struct EncryptHasher<H> {
    inner: H,
    cipher: Arc<Cipher>,
    // Number of bytes fed so far.
    offset: u64,
}

impl<H> EncryptHasher<H> {
    #[must_use]
    #[inline]
    pub fn new(inner: H, cipher: Arc<Cipher>) -> Self {
        Self {
            inner,
            cipher,
            offset: 0,
        }
    }
}

impl<H: Hasher> Hasher for EncryptHasher<H> {
    #[inline]
    async fn update(&mut self, chunk: &[u8]) -> Result<()> {
        let encrypted = self.cipher.encrypt(chunk, self.offset)?;
        self.inner.update(&encrypted).await?;
        self.offset = self.offset.cadd(u64::try_from(chunk.len())?)?;
        Ok(())
    }

    #[inline]
    async fn digest(&self) -> Result<Vec<u8>> {
        self.inner.digest().await
    }

    #[inline]
    async fn hexdigest(&self) -> Result<String> {
        self.inner.hexdigest().await
    }

    /// The copy continues from the same position as the original.
    #[inline]
    async fn copy(&self) -> Result<Self> {
        Ok(Self {
            inner: self.inner.copy().await?,
            cipher: Arc::clone(&self.cipher),
            offset: self.offset,
        })
    }
}

/// Creates [`EncryptHasher`]s around hashers of the inner factory.
///
/// Holds the key itself rather than a live [`Cipher`], so the factory stays
/// plain data that can be serialized and used in another process.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EncryptHasherFactory<F> {
    inner: F,
    key: EncryptionKey,
}

impl<F> EncryptHasherFactory<F> {
    #[must_use]
    #[inline]
    pub fn new(inner: F, key: EncryptionKey) -> Self {
        Self { inner, key }
    }
}

impl<F: HasherFactory> HasherFactory for EncryptHasherFactory<F> {
    type Hasher = EncryptHasher<F::Hasher>;

    #[inline]
    async fn create(&self) -> Result<Self::Hasher> {
        let cipher = Arc::new(Cipher::new(&self.key)?);
        Ok(EncryptHasher::new(self.inner.create().await?, cipher))
    }
}
