pub mod fetcher;
pub mod models;
pub mod traits;
pub mod ytdlp;

pub use fetcher::fetch_media_info;
pub use models::{MediaInfo, StreamVariant, Thumbnail};
pub use traits::{ChunkStream, MediaStream, StreamProvider};
pub use ytdlp::YtDlpExtractor;
