//! How acquired media is delivered: as a video or as a photo.

use crate::download::FetchResult;
use crate::extract::VIDEO_SIZE_THRESHOLD;

/// Delivery kind of an acquired buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    /// Sent as `media.mp4` / `video/mp4`.
    Video,
    /// Sent as `media.jpg` with the declared type (default `image/jpeg`).
    Image,
}

impl MediaKind {
    /// `video/*` content types and buffers above 2 MiB are videos; the rest are images.
    #[must_use]
    pub fn classify(content_type: &str, len: usize) -> Self {
        let is_video = content_type
            .get(..6)
            .is_some_and(|prefix| prefix.eq_ignore_ascii_case("video/"));
        if is_video || len > VIDEO_SIZE_THRESHOLD {
            Self::Video
        } else {
            Self::Image
        }
    }

    /// Classifies a fetch result.
    #[must_use]
    pub fn of(media: &FetchResult) -> Self {
        Self::classify(&media.content_type, media.len())
    }

    /// File name used when delivering.
    #[must_use]
    pub fn file_name(self) -> &'static str {
        match self {
            Self::Video => "media.mp4",
            Self::Image => "media.jpg",
        }
    }

    /// Content type used when delivering; images keep a declared type.
    #[must_use]
    pub fn delivery_content_type(self, declared: &str) -> String {
        match self {
            Self::Video => "video/mp4".to_string(),
            Self::Image if declared.trim().is_empty() => "image/jpeg".to_string(),
            Self::Image => declared.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_video_by_content_type() {
        assert_eq!(MediaKind::classify("video/mp4", 10), MediaKind::Video);
        assert_eq!(MediaKind::classify("VIDEO/webm", 10), MediaKind::Video);
    }

    #[test]
    fn test_video_by_size() {
        assert_eq!(
            MediaKind::classify("application/octet-stream", 3 * 1024 * 1024),
            MediaKind::Video
        );
        assert_eq!(MediaKind::classify("", 3 * 1024 * 1024), MediaKind::Video);
    }

    #[test]
    fn test_small_non_video_is_image() {
        let kind = MediaKind::classify("", 5000);
        assert_eq!(kind, MediaKind::Image);
        assert_eq!(kind.file_name(), "media.jpg");
        assert_eq!(kind.delivery_content_type(""), "image/jpeg");
        assert_eq!(kind.delivery_content_type("image/png"), "image/png");
    }

    #[test]
    fn test_video_delivery() {
        let media = FetchResult::new(vec![0; 16], "video/quicktime", "https://x");
        let kind = MediaKind::of(&media);
        assert_eq!(kind.file_name(), "media.mp4");
        assert_eq!(kind.delivery_content_type("video/quicktime"), "video/mp4");
    }
}
