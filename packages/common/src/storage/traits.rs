use async_trait::async_trait;
use tokio::io::AsyncRead;

use super::error::StorageError;
use super::hash::ContentHash;

/// Type alias for a boxed async reader.
pub type BoxReader = Box<dyn AsyncRead + Unpin + Send>;

/// Content-addressed blob storage for uploaded documents and avatars.
///
/// Uploads arrive as fully buffered multipart fields, so `put` takes a byte
/// slice; downloads are streamed back to the client.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Store bytes and return the content hash. Storing the same bytes
    /// twice is a no-op that returns the same hash.
    async fn put(&self, data: &[u8]) -> Result<ContentHash, StorageError>;

    /// Retrieve a blob as a streaming async reader.
    async fn get_stream(&self, hash: &ContentHash) -> Result<BoxReader, StorageError>;

    /// Delete a blob by its content hash.
    ///
    /// Returns `true` if the blob was deleted, `false` if it did not exist.
    async fn delete(&self, hash: &ContentHash) -> Result<bool, StorageError>;
}
