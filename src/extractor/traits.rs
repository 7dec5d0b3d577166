use crate::extractor::models::MediaInfo;
use crate::utils::error::Result;
use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::BoxStream;

/// Chunked body of one variant
pub type ChunkStream = BoxStream<'static, Result<Bytes>>;

/// An open byte stream for one variant
pub struct MediaStream {
    /// Total length when the server announces it
    pub total_bytes: Option<u64>,
    pub chunks: ChunkStream,
}

/// Core trait for stream-info providers
///
/// This trait isolates the downloader from the specific extraction method
/// (yt-dlp today), and lets tests substitute an in-memory provider.
#[async_trait]
pub trait StreamProvider: Send + Sync {
    /// Returns a unique identifier for this provider (e.g. "yt-dlp")
    fn id(&self) -> &'static str;

    /// Checks whether the URL is one this provider can handle. No network access.
    fn validate_url(&self, url: &str) -> bool;

    /// Fetches metadata and the variant list. Fails with `InfoFetch`.
    async fn fetch_info(&self, url: &str) -> Result<MediaInfo>;

    /// Opens the byte stream of one variant. Fails with `Stream`.
    async fn fetch_stream(&self, url: &str, variant_id: &str) -> Result<MediaStream>;
}
