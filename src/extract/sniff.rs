//! Content-type classification by magic bytes.
//!
//! The extraction tool never reports a MIME type, so the buffer itself is the
//! only signal. This is approximate: the size fallback labels any large
//! unrecognised buffer as MP4.

/// Buffers above this size with no recognised signature are assumed to be video.
pub const VIDEO_SIZE_THRESHOLD: usize = 2 * 1024 * 1024;

/// Fallback content type for small unrecognised buffers.
pub const OCTET_STREAM: &str = "application/octet-stream";

/// Classifies a buffer, in order:
///
/// 1. `FF D8` prefix → `image/jpeg`
/// 2. `ftyp` at bytes 4..8 → `video/mp4`
/// 3. PNG, GIF, WebP and EBML (Matroska/WebM) signatures
/// 4. longer than [`VIDEO_SIZE_THRESHOLD`] → `video/mp4`
/// 5. otherwise [`OCTET_STREAM`]
#[must_use]
pub fn sniff_content_type(bytes: &[u8]) -> &'static str {
    if bytes.starts_with(&[0xFF, 0xD8]) {
        return "image/jpeg";
    }
    if bytes.get(4..8) == Some(b"ftyp".as_slice()) {
        return "video/mp4";
    }
    if bytes.starts_with(b"\x89PNG\r\n\x1a\n") {
        return "image/png";
    }
    if bytes.starts_with(b"GIF87a") || bytes.starts_with(b"GIF89a") {
        return "image/gif";
    }
    if bytes.starts_with(b"RIFF") && bytes.get(8..12) == Some(b"WEBP".as_slice()) {
        return "image/webp";
    }
    if bytes.starts_with(&[0x1A, 0x45, 0xDF, 0xA3]) {
        return "video/webm";
    }
    if bytes.len() > VIDEO_SIZE_THRESHOLD {
        return "video/mp4";
    }
    OCTET_STREAM
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_jpeg_prefix() {
        assert_eq!(sniff_content_type(&[0xFF, 0xD8, 0xFF, 0xE0, 0, 0x10]), "image/jpeg");
    }

    #[test]
    fn test_ftyp_box() {
        let mut bytes = vec![0x00, 0x00, 0x00, 0x18];
        bytes.extend_from_slice(b"ftypmp42");
        assert_eq!(sniff_content_type(&bytes), "video/mp4");
    }

    #[test]
    fn test_large_unsigned_buffer_is_video() {
        let bytes = vec![0u8; 3 * 1024 * 1024];
        assert_eq!(sniff_content_type(&bytes), "video/mp4");
    }

    #[test]
    fn test_small_unsigned_buffer_is_octet_stream() {
        let bytes = vec![0u8; 10 * 1024];
        assert_eq!(sniff_content_type(&bytes), OCTET_STREAM);
    }

    #[test]
    fn test_threshold_is_exclusive() {
        assert_eq!(sniff_content_type(&vec![0u8; VIDEO_SIZE_THRESHOLD]), OCTET_STREAM);
        assert_eq!(
            sniff_content_type(&vec![0u8; VIDEO_SIZE_THRESHOLD + 1]),
            "video/mp4"
        );
    }

    #[test]
    fn test_other_image_signatures() {
        assert_eq!(sniff_content_type(b"\x89PNG\r\n\x1a\n...."), "image/png");
        assert_eq!(sniff_content_type(b"GIF89a......"), "image/gif");
        assert_eq!(sniff_content_type(b"RIFF\x10\0\0\0WEBPVP8 "), "image/webp");
        assert_eq!(sniff_content_type(&[0x1A, 0x45, 0xDF, 0xA3, 0x9F]), "video/webm");
    }

    #[test]
    fn test_short_and_empty_buffers() {
        assert_eq!(sniff_content_type(&[]), OCTET_STREAM);
        assert_eq!(sniff_content_type(&[0xFF]), OCTET_STREAM);
        assert_eq!(sniff_content_type(b"ftyp"), OCTET_STREAM);
    }
}
