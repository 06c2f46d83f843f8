// src/engine/media.rs
//
// Declared content-type validation against the accepted allow-list.

use crate::error::TranscodeError;
use mime::Mime;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaType {
    Jpeg,
    Png,
    WebP,
    Heic,
    Heif,
}

impl MediaType {
    /// Every content type `parse` accepts
    pub const ACCEPTED: &'static [&'static str] = &[
        "image/jpeg",
        "image/jpg",
        "image/png",
        "image/webp",
        "image/heic",
        "image/heif",
        "image/heic-sequence",
        "image/heif-sequence",
    ];

    /// Parse a Content-Type header value. Parameters (`; charset=...`) are
    /// ignored; anything outside the allow-list, or a value that does not
    /// parse as a media type, is `UnsupportedType`.
    pub fn parse(content_type: &str) -> Result<Self, TranscodeError> {
        let mime: Mime = content_type
            .trim()
            .parse()
            .map_err(|_| TranscodeError::unsupported_type(format!("'{content_type}' (unparsable)")))?;

        match mime.essence_str().to_ascii_lowercase().as_str() {
            "image/jpeg" | "image/jpg" => Ok(Self::Jpeg),
            "image/png" => Ok(Self::Png),
            "image/webp" => Ok(Self::WebP),
            "image/heic" | "image/heic-sequence" => Ok(Self::Heic),
            "image/heif" | "image/heif-sequence" => Ok(Self::Heif),
            other => Err(TranscodeError::unsupported_type(other.to_string())),
        }
    }

    /// HEIC/HEIF go through the dedicated libheif path
    pub fn is_heif(self) -> bool {
        matches!(self, Self::Heic | Self::Heif)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Jpeg => "image/jpeg",
            Self::Png => "image/png",
            Self::WebP => "image/webp",
            Self::Heic => "image/heic",
            Self::Heif => "image/heif",
        }
    }
}

impl fmt::Display for MediaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
