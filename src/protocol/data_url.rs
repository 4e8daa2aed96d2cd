//! Data URL decoding for the save-image side channel.
//!
//! Format: `data:[<mime>][;base64],<data>`. Decoding never fails loudly; a
//! malformed URL (no `data:` scheme, no comma, bad base64) yields an empty
//! byte sequence and the caller skips the save.

// ============================================================================
// Imports
// ============================================================================

use base64::Engine;
use base64::engine::general_purpose::STANDARD as Base64Standard;
use tracing::debug;

// ============================================================================
// Constants
// ============================================================================

/// MIME type reported when the URL carries no usable media type.
pub const FALLBACK_MIME: &str = "application/octet-stream";

/// RFC 2397 default media type for an empty prefix.
const DEFAULT_MIME: &str = "text/plain";

// ============================================================================
// DataUrl
// ============================================================================

/// A decoded data URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataUrl {
    /// Media type, without parameters.
    pub mime: String,
    /// Decoded body.
    pub bytes: Vec<u8>,
}

impl DataUrl {
    /// Decodes a data URL.
    ///
    /// # Example
    ///
    /// ```ignore
    /// let url = DataUrl::decode("data:image/png;base64,aGVsbG8=");
    /// assert_eq!(url.mime, "image/png");
    /// assert_eq!(url.bytes, b"hello");
    /// ```
    #[must_use]
    pub fn decode(data_url: &str) -> Self {
        let Some(rest) = data_url
            .get(..5)
            .filter(|scheme| scheme.eq_ignore_ascii_case("data:"))
            .map(|_| &data_url[5..])
        else {
            debug!(len = data_url.len(), "Data URL without data: scheme");
            return Self::empty();
        };

        let Some(comma) = rest.find(',') else {
            debug!(len = data_url.len(), "Data URL without comma");
            return Self::empty();
        };

        let meta = &rest[..comma];
        let body = &rest[comma + 1..];

        let mut params = meta.split(';');
        let mime = params.next().unwrap_or_default().trim();
        let is_base64 = params.any(|p| p.trim().eq_ignore_ascii_case("base64"));
        let mime = if mime.is_empty() { DEFAULT_MIME } else { mime };

        let bytes = if is_base64 {
            Base64Standard
                .decode(body.trim())
                .inspect_err(|e| debug!(error = %e, mime, "Data URL body is not base64"))
                .unwrap_or_default()
        } else {
            urlencoding::decode_binary(body.as_bytes()).into_owned()
        };

        Self {
            mime: mime.to_ascii_lowercase(),
            bytes,
        }
    }

    /// A data URL with no body.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            mime: FALLBACK_MIME.to_string(),
            bytes: Vec::new(),
        }
    }

    /// Returns `true` if there is nothing to save.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// File extension for the media type, without the dot.
    ///
    /// Falls back to sniffing the bytes, then to `bin`.
    #[must_use]
    pub fn extension(&self) -> &'static str {
        match self.mime.as_str() {
            m if m.ends_with("png") => "png",
            "image/jpeg" | "image/jpg" => "jpg",
            "image/gif" => "gif",
            "image/webp" => "webp",
            _ => image::guess_format(&self.bytes)
                .ok()
                .and_then(|format| format.extensions_str().first().copied())
                .unwrap_or("bin"),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_png() {
        let url = DataUrl::decode("data:image/png;base64,aGVsbG8=");
        assert_eq!(url.mime, "image/png");
        assert_eq!(url.bytes, b"hello");
        assert_eq!(url.extension(), "png");
    }

    #[test]
    fn test_missing_comma_yields_empty() {
        let url = DataUrl::decode("data:image/png;base64aGVsbG8=");
        assert!(url.is_empty());
        assert_eq!(url.mime, FALLBACK_MIME);
    }

    #[test]
    fn test_missing_scheme_yields_empty() {
        let url = DataUrl::decode("image/png;base64,aGVsbG8=");
        assert!(url.is_empty());
        assert_eq!(url.mime, FALLBACK_MIME);
    }

    #[test]
    fn test_bad_base64_yields_empty() {
        let url = DataUrl::decode("data:image/png;base64,@@@not-base64");
        assert!(url.is_empty());
        assert_eq!(url.mime, "image/png");
    }

    #[test]
    fn test_percent_encoded_body() {
        let url = DataUrl::decode("data:,hello%20world");
        assert_eq!(url.mime, "text/plain");
        assert_eq!(url.bytes, b"hello world");
        assert_eq!(url.extension(), "bin");
    }

    #[test]
    fn test_extension_from_mime() {
        let jpeg = DataUrl {
            mime: "image/jpeg".into(),
            bytes: vec![1],
        };
        assert_eq!(jpeg.extension(), "jpg");
    }

    #[test]
    fn test_extension_sniffed_from_bytes() {
        let png_magic = vec![0x89, b'P', b'N', b'G', 0x0d, 0x0a, 0x1a, 0x0a, 0, 0];
        let url = DataUrl {
            mime: FALLBACK_MIME.into(),
            bytes: png_magic,
        };
        assert_eq!(url.extension(), "png");
    }
}
