//! Capabilities of a remote drive.
//!
//! A `FileService` is usually a stack: the innermost implementation talks to
//! the remote API, and each outer layer wraps the one below it and implements
//! the same trait. Handles (`ReadableFile`, `WritableFile`) are released when
//! dropped.

use {
    crate::{ChangeBatch, FileInfo, Node, NodeRecord, PrivateMap},
    anyhow::Result,
    futures::Stream,
    serde::{Serialize, de::DeserializeOwned},
    std::future::Future,
};

/// Byte stream of a remote file opened for reading.
pub trait ReadableFile: Send + Sync {
    /// Reads up to `size` bytes at the current position.
    /// An empty chunk means end of file.
    fn read(&mut self, size: usize) -> impl Future<Output = Result<Vec<u8>>> + Send;

    fn tell(&mut self) -> impl Future<Output = Result<u64>> + Send;

    /// Moves to an absolute position and returns it.
    fn seek(&mut self, offset: u64) -> impl Future<Output = Result<u64>> + Send;

    /// Streams the remaining content from the start of the file.
    ///
    /// The stream is forward only and does not report positions.
    fn chunks(&mut self) -> impl Stream<Item = Result<Vec<u8>>> + Send + '_;

    fn node(&mut self) -> impl Future<Output = Result<Node>> + Send;
}

/// Byte stream of a remote file being uploaded.
pub trait WritableFile: Send + Sync {
    fn tell(&mut self) -> impl Future<Output = Result<u64>> + Send;

    fn seek(&mut self, offset: u64) -> impl Future<Output = Result<u64>> + Send;

    /// Returns the number of bytes accepted.
    fn write(&mut self, chunk: &[u8]) -> impl Future<Output = Result<usize>> + Send;

    /// Node of the uploaded file, available once the service has committed it.
    fn node(&mut self) -> impl Future<Output = Result<Option<Node>>> + Send;
}

/// Incremental content hash computed the same way the remote service does.
pub trait Hasher: Send + Sync + Sized {
    fn update(&mut self, chunk: &[u8]) -> impl Future<Output = Result<()>> + Send;

    fn digest(&self) -> impl Future<Output = Result<Vec<u8>>> + Send;

    fn hexdigest(&self) -> impl Future<Output = Result<String>> + Send;

    /// Independent hasher that continues from the current state.
    fn copy(&self) -> impl Future<Output = Result<Self>> + Send;
}

/// Creates hashers.
///
/// A factory is plain data: it can be serialized, sent to another process
/// and used there without access to the service that produced it.
pub trait HasherFactory: Clone + Send + Sync + Serialize + DeserializeOwned {
    type Hasher: Hasher;

    fn create(&self) -> impl Future<Output = Result<Self::Hasher>> + Send;
}

pub trait FileService: Send + Sync {
    type Readable: ReadableFile;
    type Writable: WritableFile;
    type HasherFactory: HasherFactory;

    fn is_authorized(&self) -> impl Future<Output = Result<bool>> + Send;

    fn get_oauth_url(&self) -> impl Future<Output = Result<String>> + Send;

    fn set_oauth_token(&self, token: &str) -> impl Future<Output = Result<()>> + Send;

    /// Streams change batches recorded after `cursor`.
    fn get_changes(&self, cursor: &str) -> impl Stream<Item = Result<ChangeBatch>> + Send;

    /// Renames, moves and/or trashes a node.
    fn move_node(
        &self,
        node: &Node,
        new_parent: Option<&Node>,
        new_name: Option<&str>,
        trashed: Option<bool>,
    ) -> impl Future<Output = Result<Node>> + Send;

    fn create_directory(
        &self,
        name: &str,
        parent: &Node,
        private: Option<PrivateMap>,
        exist_ok: bool,
    ) -> impl Future<Output = Result<Node>> + Send;

    fn download_file(&self, node: &Node) -> impl Future<Output = Result<Self::Readable>> + Send;

    fn upload_file(
        &self,
        name: &str,
        parent: &Node,
        info: FileInfo,
        private: Option<PrivateMap>,
    ) -> impl Future<Output = Result<Self::Writable>> + Send;

    fn get_hasher_factory(&self) -> impl Future<Output = Result<Self::HasherFactory>> + Send;

    /// Converts a record loaded from a local snapshot into the form
    /// this layer exposes to its callers.
    #[inline]
    fn decode_record(&self, record: NodeRecord) -> Result<NodeRecord> {
        Ok(record)
    }
}
