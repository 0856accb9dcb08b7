//! [`CryptFileService`] wraps another [`FileService`] and encrypts names and
//! content of tagged nodes on their way to the remote drive.
//!
//! Every operation that receives a node or private metadata decides first:
//!
//! - no `crypt` tag: the call is forwarded unchanged;
//! - `crypt` tag `"1"`: names and content are transformed around the call;
//! - any other tag: the call fails with [`UnsupportedCryptVersion`] and the
//!   upstream service is never contacted.
//!
//! Directories and files are always created with a `crypt` tag: the current
//! version is added to the supplied private metadata unless it already has
//! one, so new content is always encrypted.
//!
//! [`UnsupportedCryptVersion`]: crate::tag::UnsupportedCryptVersion

use {
    crate::{
        crypto::{Cipher, DecryptReadableFile, EncryptHasherFactory, EncryptWritableFile},
        tag::{self, CryptMode, crypt_mode, decode_node, tag_new_content},
    },
    anyhow::Result,
    drive_crypt_protocol::{
        ChangeAction, ChangeBatch, FileInfo, Node, NodeRecord, PrivateMap,
        credentials::EncryptionKey,
        service::{FileService, ReadableFile, WritableFile},
    },
    futures::{Stream, TryStreamExt, future::Either},
    std::{pin::pin, sync::Arc},
    stream_generator::generate_try_stream,
    tracing::debug,
};

pub struct CryptFileService<S> {
    upstream: S,
    key: EncryptionKey,
    cipher: Arc<Cipher>,
}

impl<S> CryptFileService<S> {
    #[inline]
    pub fn new(upstream: S, key: EncryptionKey) -> Result<Self> {
        let cipher = Arc::new(Cipher::new(&key)?);
        Ok(Self {
            upstream,
            key,
            cipher,
        })
    }

    #[must_use]
    #[inline]
    pub fn upstream(&self) -> &S {
        &self.upstream
    }

    #[must_use]
    #[inline]
    pub fn into_upstream(self) -> S {
        self.upstream
    }

    fn decode_change(&self, change: ChangeAction) -> Result<ChangeAction> {
        match change {
            ChangeAction::Removed(_) => Ok(change),
            ChangeAction::Updated(node) => {
                Ok(ChangeAction::Updated(decode_node(&self.cipher, node)?))
            }
        }
    }
}

impl<S: FileService> FileService for CryptFileService<S> {
    type Readable = CryptReadable<S::Readable>;
    type Writable = CryptWritable<S::Writable>;
    type HasherFactory = EncryptHasherFactory<S::HasherFactory>;

    #[inline]
    async fn is_authorized(&self) -> Result<bool> {
        self.upstream.is_authorized().await
    }

    #[inline]
    async fn get_oauth_url(&self) -> Result<String> {
        self.upstream.get_oauth_url().await
    }

    #[inline]
    async fn set_oauth_token(&self, token: &str) -> Result<()> {
        self.upstream.set_oauth_token(token).await
    }

    /// The stream ends after the first batch that cannot be decoded.
    #[inline]
    fn get_changes(&self, cursor: &str) -> impl Stream<Item = Result<ChangeBatch>> + Send {
        generate_try_stream(move |mut y| async move {
            let mut batches = pin!(self.upstream.get_changes(cursor));
            while let Some(batch) = batches.try_next().await? {
                let changes = batch
                    .changes
                    .into_iter()
                    .map(|change| self.decode_change(change))
                    .collect::<Result<Vec<_>>>()?;
                debug!(count = changes.len(), cursor = %batch.cursor, "decoded change batch");
                y.send(Ok(ChangeBatch {
                    changes,
                    cursor: batch.cursor,
                }))
                .await;
            }
            Ok::<(), anyhow::Error>(())
        })
    }

    #[inline]
    async fn move_node(
        &self,
        node: &Node,
        new_parent: Option<&Node>,
        new_name: Option<&str>,
        trashed: Option<bool>,
    ) -> Result<Node> {
        match crypt_mode(node.private.as_ref())? {
            CryptMode::Plain => {
                debug!(id = %node.id, "moving plain node");
                self.upstream
                    .move_node(node, new_parent, new_name, trashed)
                    .await
            }
            CryptMode::Encrypted => {
                debug!(id = %node.id, "moving encrypted node");
                let node = node.with_name(self.cipher.encrypt_name(&node.name)?);
                let new_name = new_name
                    .map(|name| self.cipher.encrypt_name(name))
                    .transpose()?;
                let moved = self
                    .upstream
                    .move_node(&node, new_parent, new_name.as_deref(), trashed)
                    .await?;
                decode_node(&self.cipher, moved)
            }
        }
    }

    #[inline]
    async fn create_directory(
        &self,
        name: &str,
        parent: &Node,
        private: Option<PrivateMap>,
        exist_ok: bool,
    ) -> Result<Node> {
        let private = tag_new_content(private);
        crypt_mode(Some(&private))?;
        debug!("creating encrypted directory");
        let name = self.cipher.encrypt_name(name)?;
        let created = self
            .upstream
            .create_directory(&name, parent, Some(private), exist_ok)
            .await?;
        decode_node(&self.cipher, created)
    }

    #[inline]
    async fn download_file(&self, node: &Node) -> Result<Self::Readable> {
        match crypt_mode(node.private.as_ref())? {
            CryptMode::Plain => {
                debug!(id = %node.id, "downloading plain file");
                Ok(CryptReadable::Plain(
                    self.upstream.download_file(node).await?,
                ))
            }
            CryptMode::Encrypted => {
                debug!(id = %node.id, "downloading encrypted file");
                let file = self.upstream.download_file(node).await?;
                Ok(CryptReadable::Encrypted(DecryptReadableFile::new(
                    file,
                    Arc::clone(&self.cipher),
                )))
            }
        }
    }

    #[inline]
    async fn upload_file(
        &self,
        name: &str,
        parent: &Node,
        info: FileInfo,
        private: Option<PrivateMap>,
    ) -> Result<Self::Writable> {
        let private = tag_new_content(private);
        crypt_mode(Some(&private))?;
        debug!(size = ?info.size, "uploading encrypted file");
        let name = self.cipher.encrypt_name(name)?;
        let file = self
            .upstream
            .upload_file(&name, parent, info, Some(private))
            .await?;
        Ok(CryptWritable::Encrypted(EncryptWritableFile::new(
            file,
            Arc::clone(&self.cipher),
        )))
    }

    #[inline]
    async fn get_hasher_factory(&self) -> Result<Self::HasherFactory> {
        let inner = self.upstream.get_hasher_factory().await?;
        Ok(EncryptHasherFactory::new(inner, self.key.clone()))
    }

    #[inline]
    fn decode_record(&self, record: NodeRecord) -> Result<NodeRecord> {
        let record = self.upstream.decode_record(record)?;
        tag::decode_record(&self.cipher, record)
    }
}

/// File opened for reading through [`CryptFileService`].
pub enum CryptReadable<R> {
    Plain(R),
    Encrypted(DecryptReadableFile<R>),
}

impl<R> CryptReadable<R> {
    #[must_use]
    #[inline]
    pub fn is_encrypted(&self) -> bool {
        matches!(self, Self::Encrypted(_))
    }

    #[must_use]
    #[inline]
    pub fn into_inner(self) -> R {
        match self {
            Self::Plain(file) => file,
            Self::Encrypted(file) => file.into_inner(),
        }
    }
}

impl<R: ReadableFile> ReadableFile for CryptReadable<R> {
    #[inline]
    async fn read(&mut self, size: usize) -> Result<Vec<u8>> {
        match self {
            Self::Plain(file) => file.read(size).await,
            Self::Encrypted(file) => file.read(size).await,
        }
    }

    #[inline]
    async fn tell(&mut self) -> Result<u64> {
        match self {
            Self::Plain(file) => file.tell().await,
            Self::Encrypted(file) => file.tell().await,
        }
    }

    #[inline]
    async fn seek(&mut self, offset: u64) -> Result<u64> {
        match self {
            Self::Plain(file) => file.seek(offset).await,
            Self::Encrypted(file) => file.seek(offset).await,
        }
    }

    #[inline]
    fn chunks(&mut self) -> impl Stream<Item = Result<Vec<u8>>> + Send + '_ {
        match self {
            Self::Plain(file) => Either::Left(file.chunks()),
            Self::Encrypted(file) => Either::Right(file.chunks()),
        }
    }

    #[inline]
    async fn node(&mut self) -> Result<Node> {
        match self {
            Self::Plain(file) => file.node().await,
            Self::Encrypted(file) => file.node().await,
        }
    }
}

/// File opened for writing through [`CryptFileService`].
pub enum CryptWritable<W> {
    Plain(W),
    Encrypted(EncryptWritableFile<W>),
}

impl<W> CryptWritable<W> {
    #[must_use]
    #[inline]
    pub fn is_encrypted(&self) -> bool {
        matches!(self, Self::Encrypted(_))
    }

    #[must_use]
    #[inline]
    pub fn into_inner(self) -> W {
        match self {
            Self::Plain(file) => file,
            Self::Encrypted(file) => file.into_inner(),
        }
    }
}

impl<W: WritableFile> WritableFile for CryptWritable<W> {
    #[inline]
    async fn tell(&mut self) -> Result<u64> {
        match self {
            Self::Plain(file) => file.tell().await,
            Self::Encrypted(file) => file.tell().await,
        }
    }

    #[inline]
    async fn seek(&mut self, offset: u64) -> Result<u64> {
        match self {
            Self::Plain(file) => file.seek(offset).await,
            Self::Encrypted(file) => file.seek(offset).await,
        }
    }

    #[inline]
    async fn write(&mut self, chunk: &[u8]) -> Result<usize> {
        match self {
            Self::Plain(file) => file.write(chunk).await,
            Self::Encrypted(file) => file.write(chunk).await,
        }
    }

    #[inline]
    async fn node(&mut self) -> Result<Option<Node>> {
        match self {
            Self::Plain(file) => file.node().await,
            Self::Encrypted(file) => file.node().await,
        }
    }
}
