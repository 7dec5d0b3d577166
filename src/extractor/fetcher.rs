//! Metadata fetching: validate once, ask the provider once

use crate::extractor::models::MediaInfo;
use crate::extractor::traits::StreamProvider;
use crate::utils::error::{Result, VidgrabError};
use tracing::{debug, warn};

/// Fetch a [`MediaInfo`] snapshot for `url`.
///
/// Invalid URLs are rejected before any network call. There is no retry: a
/// provider failure surfaces immediately as `InfoFetch`.
pub async fn fetch_media_info(provider: &dyn StreamProvider, url: &str) -> Result<MediaInfo> {
    let url = url.trim();
    if !provider.validate_url(url) {
        warn!("Rejected URL before fetching: {}", url);
        return Err(VidgrabError::InvalidUrl(url.to_string()));
    }

    debug!("Fetching info from {} for {}", provider.id(), url);
    match provider.fetch_info(url).await {
        Ok(info) => Ok(info),
        Err(VidgrabError::InfoFetch(msg)) => Err(VidgrabError::InfoFetch(msg)),
        Err(other) => Err(VidgrabError::InfoFetch(other.to_string())),
    }
}
