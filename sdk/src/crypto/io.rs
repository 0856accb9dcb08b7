use {
    crate::{crypto::Cipher, tag::decode_node},
    anyhow::Result,
    cadd::ops::Cadd,
    drive_crypt_protocol::{
        Node,
        service::{ReadableFile, WritableFile},
    },
    futures::{Stream, StreamExt},
    std::sync::Arc,
};

/// Decrypts content of an encrypted remote file as it is read.
pub struct DecryptReadableFile<R> {
    inner: R,
    cipher: Arc<Cipher>,
}

impl<R> DecryptReadableFile<R> {
    #[must_use]
    #[inline]
    pub fn new(inner: R, cipher: Arc<Cipher>) -> Self {
        Self { inner, cipher }
    }

    #[must_use]
    #[inline]
    pub fn into_inner(self) -> R {
        self.inner
    }
}

impl<R: ReadableFile> ReadableFile for DecryptReadableFile<R> {
    #[inline]
    async fn read(&mut self, size: usize) -> Result<Vec<u8>> {
        let offset = self.inner.tell().await?;
        let mut chunk = self.inner.read(size).await?;
        self.cipher.apply_keystream(&mut chunk, offset)?;
        Ok(chunk)
    }

    #[inline]
    async fn tell(&mut self) -> Result<u64> {
        self.inner.tell().await
    }

    #[inline]
    async fn seek(&mut self, offset: u64) -> Result<u64> {
        self.inner.seek(offset).await
    }

    #[inline]
    fn chunks(&mut self) -> impl Stream<Item = Result<Vec<u8>>> + Send + '_ {
        let cipher = &self.cipher;
        // Chunks carry no position, so track it here.
        let mut offset = 0_u64;
        self.inner.chunks().map(move |chunk| -> Result<Vec<u8>> {
            let mut chunk = chunk?;
            cipher.apply_keystream(&mut chunk, offset)?;
            offset = offset.cadd(u64::try_from(chunk.len())?)?;
            Ok(chunk)
        })
    }

    /// The node is returned as reported by the inner file.
    #[inline]
    async fn node(&mut self) -> Result<Node> {
        self.inner.node().await
    }
}

/// Encrypts content before handing it to the remote file.
pub struct EncryptWritableFile<W> {
    inner: W,
    cipher: Arc<Cipher>,
}

impl<W> EncryptWritableFile<W> {
    #[must_use]
    #[inline]
    pub fn new(inner: W, cipher: Arc<Cipher>) -> Self {
        Self { inner, cipher }
    }

    #[must_use]
    #[inline]
    pub fn into_inner(self) -> W {
        self.inner
    }
}

impl<W: WritableFile> WritableFile for EncryptWritableFile<W> {
    #[inline]
    async fn tell(&mut self) -> Result<u64> {
        self.inner.tell().await
    }

    #[inline]
    async fn seek(&mut self, offset: u64) -> Result<u64> {
        self.inner.seek(offset).await
    }

    /// Encrypts at the position reported by the inner file rather than at a
    /// locally counted one: a buffering or resumed writer may be positioned
    /// elsewhere.
    #[inline]
    async fn write(&mut self, chunk: &[u8]) -> Result<usize> {
        let offset = self.inner.tell().await?;
        let chunk = self.cipher.encrypt(chunk, offset)?;
        self.inner.write(&chunk).await
    }

    /// Returns the uploaded node with its name decrypted.
    #[inline]
    async fn node(&mut self) -> Result<Option<Node>> {
        self.inner
            .node()
            .await?
            .map(|node| decode_node(&self.cipher, node))
            .transpose()
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
    use {
        super::*,
        crate::tag::default_private,
        chrono::Utc,
        drive_crypt_protocol::{NodeId, credentials::EncryptionKey},
        futures::{TryStreamExt, stream},
    };

    fn cipher() -> Arc<Cipher> {
        Arc::new(Cipher::new(&EncryptionKey::from([5; 64])).unwrap())
    }

    fn node(name: &str) -> Node {
        Node {
            id: NodeId::from("id"),
            parent_id: None,
            name: name.to_owned(),
            is_directory: false,
            is_trashed: false,
            ctime: Utc::now(),
            mtime: Utc::now(),
            mime_type: String::new(),
            hash: String::new(),
            size: 0,
            media_info: None,
            private: Some(default_private()),
        }
    }

    /// Remote file held in memory. Records the sizes it was asked to read.
    struct MemoryFile {
        content: Vec<u8>,
        chunk_size: usize,
        position: usize,
        reads: Vec<usize>,
        node: Node,
    }

    impl MemoryFile {
        fn new(content: Vec<u8>, chunk_size: usize) -> Self {
            Self {
                content,
                chunk_size,
                position: 0,
                reads: Vec::new(),
                node: node("file"),
            }
        }
    }

    impl ReadableFile for MemoryFile {
        async fn read(&mut self, size: usize) -> Result<Vec<u8>> {
            self.reads.push(size);
            let end = self.content.len().min(self.position + size);
            let chunk = self.content[self.position..end].to_vec();
            self.position = end;
            Ok(chunk)
        }

        async fn tell(&mut self) -> Result<u64> {
            Ok(self.position as u64)
        }

        async fn seek(&mut self, offset: u64) -> Result<u64> {
            self.position = usize::try_from(offset)?.min(self.content.len());
            Ok(self.position as u64)
        }

        fn chunks(&mut self) -> impl Stream<Item = Result<Vec<u8>>> + Send + '_ {
            let chunks: Vec<_> = self
                .content
                .chunks(self.chunk_size)
                .map(|chunk| Ok::<_, anyhow::Error>(chunk.to_vec()))
                .collect();
            stream::iter(chunks)
        }

        async fn node(&mut self) -> Result<Node> {
            Ok(self.node.clone())
        }
    }

    impl WritableFile for MemoryFile {
        async fn tell(&mut self) -> Result<u64> {
            Ok(self.position as u64)
        }

        async fn seek(&mut self, offset: u64) -> Result<u64> {
            self.position = usize::try_from(offset)?;
            Ok(offset)
        }

        async fn write(&mut self, chunk: &[u8]) -> Result<usize> {
            let end = self.position + chunk.len();
            if self.content.len() < end {
                self.content.resize(end, 0);
            }
            self.content[self.position..end].copy_from_slice(chunk);
            self.position = end;
            Ok(chunk.len())
        }

        async fn node(&mut self) -> Result<Option<Node>> {
            Ok(Some(self.node.clone()))
        }
    }

    #[tokio::test]
    async fn read_decrypts_at_inner_position() {
        let cipher = cipher();
        let content = b"789abc0123456789".to_vec();
        let inner = MemoryFile::new(cipher.encrypt(&content, 0).unwrap(), 4);
        let mut file = DecryptReadableFile::new(inner, Arc::clone(&cipher));

        assert_eq!(file.read(6).await.unwrap(), b"789abc");
        assert_eq!(file.read(123).await.unwrap(), b"0123456789");
        assert!(file.read(1).await.unwrap().is_empty());

        assert_eq!(file.seek(3).await.unwrap(), 3);
        assert_eq!(file.tell().await.unwrap(), 3);
        assert_eq!(file.read(5).await.unwrap(), b"abc01");
        assert_eq!(file.into_inner().reads, [6, 123, 1, 5]);
    }

    #[tokio::test]
    async fn chunks_decrypt_with_running_offset() {
        let cipher = cipher();
        let content: Vec<u8> = (0..100).collect();
        let inner = MemoryFile::new(cipher.encrypt(&content, 0).unwrap(), 7);
        let mut file = DecryptReadableFile::new(inner, cipher);

        let chunks: Vec<Vec<u8>> = file.chunks().try_collect().await.unwrap();
        assert_eq!(chunks.len(), 15);
        assert_eq!(chunks.concat(), content);
    }

    #[tokio::test]
    async fn readable_node_is_not_decoded() {
        let cipher = cipher();
        let mut inner = MemoryFile::new(Vec::new(), 1);
        inner.node = node(&cipher.encrypt_name("file").unwrap());
        let expected = inner.node.clone();
        let mut file = DecryptReadableFile::new(inner, cipher);
        assert_eq!(file.node().await.unwrap(), expected);
    }

    #[tokio::test]
    async fn write_encrypts_at_inner_position() {
        let cipher = cipher();
        let mut file = EncryptWritableFile::new(MemoryFile::new(Vec::new(), 1), Arc::clone(&cipher));

        assert_eq!(file.write(b"xyz").await.unwrap(), 3);
        assert_eq!(file.write(b"456").await.unwrap(), 3);
        assert_eq!(file.tell().await.unwrap(), 6);
        let stored = file.into_inner().content;
        assert_eq!(stored, cipher.encrypt(b"xyz456", 0).unwrap());
    }

    #[tokio::test]
    async fn write_after_seek_uses_new_position() {
        let cipher = cipher();
        let mut file = EncryptWritableFile::new(MemoryFile::new(Vec::new(), 1), Arc::clone(&cipher));

        file.write(b"aaaaaaaa").await.unwrap();
        file.seek(2).await.unwrap();
        file.write(b"bb").await.unwrap();
        let stored = file.into_inner().content;
        assert_eq!(cipher.decrypt(&stored, 0).unwrap(), b"aabbaaaa");
    }

    #[tokio::test]
    async fn writable_node_is_decoded() {
        let cipher = cipher();
        let mut inner = MemoryFile::new(Vec::new(), 1);
        inner.node = node(&cipher.encrypt_name("new_name").unwrap());
        let mut file = EncryptWritableFile::new(inner, cipher);
        let node = file.node().await.unwrap().unwrap();
        assert_eq!(node.name, "new_name");
        assert_eq!(node.private, Some(default_private()));
    }

    #[tokio::test]
    async fn writable_plain_node_is_untouched() {
        let mut inner = MemoryFile::new(Vec::new(), 1);
        inner.node.private = None;
        let mut file = EncryptWritableFile::new(inner, cipher());
        assert_eq!(file.node().await.unwrap().unwrap().name, "file");
    }
}
