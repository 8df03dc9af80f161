//! Data URIs, the image interchange format in both directions.

use crate::error::{LuminaError, Result};
use base64::Engine;
use serde::{Deserialize, Serialize};

/// Why a string was not accepted as a `data:<mime>;base64,<data>` URI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MalformedDataUri {
    /// No `data:` scheme prefix.
    MissingScheme,
    /// No comma separating the header from the payload.
    MissingPayload,
    /// The header is not `<mime>;base64`.
    NotBase64,
    /// The MIME type is empty.
    MissingMimeType,
    /// Nothing after the comma.
    EmptyPayload,
}

impl std::fmt::Display for MalformedDataUri {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let msg = match self {
            Self::MissingScheme => "missing data: scheme",
            Self::MissingPayload => "missing ',' before payload",
            Self::NotBase64 => "header is not <mime>;base64",
            Self::MissingMimeType => "empty MIME type",
            Self::EmptyPayload => "empty payload",
        };
        f.write_str(msg)
    }
}

/// One base64 image payload with its MIME type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InlineImage {
    /// MIME type, e.g. `image/png`.
    pub mime_type: String,
    /// Base64 payload, kept exactly as received.
    pub data: String,
}

impl InlineImage {
    /// Creates an inline image from an already-encoded payload.
    pub fn new(mime_type: impl Into<String>, data: impl Into<String>) -> Self {
        Self {
            mime_type: mime_type.into(),
            data: data.into(),
        }
    }

    /// Encodes raw bytes.
    pub fn from_bytes(mime_type: impl Into<String>, bytes: &[u8]) -> Self {
        Self::new(
            mime_type,
            base64::engine::general_purpose::STANDARD.encode(bytes),
        )
    }

    /// Parses a `data:<mime>;base64,<data>` URI.
    ///
    /// The payload is not decoded or normalised.
    pub fn parse(uri: &str) -> std::result::Result<Self, MalformedDataUri> {
        let rest = uri
            .strip_prefix("data:")
            .ok_or(MalformedDataUri::MissingScheme)?;
        let (header, data) = rest
            .split_once(',')
            .ok_or(MalformedDataUri::MissingPayload)?;
        let mime_type = header
            .strip_suffix(";base64")
            .ok_or(MalformedDataUri::NotBase64)?;

        if mime_type.is_empty() {
            return Err(MalformedDataUri::MissingMimeType);
        }
        if mime_type.contains(';') {
            return Err(MalformedDataUri::NotBase64);
        }
        if data.is_empty() {
            return Err(MalformedDataUri::EmptyPayload);
        }

        Ok(Self::new(mime_type, data))
    }

    /// Renders this image as a data URI.
    pub fn to_data_uri(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, self.data)
    }

    /// Decodes the base64 payload into raw bytes.
    pub fn decode(&self) -> Result<Vec<u8>> {
        base64::engine::general_purpose::STANDARD
            .decode(&self.data)
            .map_err(|e| LuminaError::Decode(e.to_string()))
    }
}

/// Result of turning one reference image into a request part.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReferenceDecode {
    /// The data URI was well formed.
    Inline(InlineImage),
    /// The entry was dropped from the request.
    Skipped {
        /// Position in the reference list.
        index: usize,
        /// Why it was dropped.
        reason: MalformedDataUri,
    },
}

impl ReferenceDecode {
    /// Classifies the reference at `index`.
    pub fn from_uri(index: usize, uri: &str) -> Self {
        match InlineImage::parse(uri) {
            Ok(image) => Self::Inline(image),
            Err(reason) => Self::Skipped { index, reason },
        }
    }

    /// Returns the inline image if the entry was accepted.
    pub fn into_inline(self) -> Option<InlineImage> {
        match self {
            Self::Inline(image) => Some(image),
            Self::Skipped { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_keeps_mime_and_payload() {
        let uri = "data:image/jpeg;base64,/9j/4AAQSkZJRg==";
        let image = InlineImage::parse(uri).unwrap();
        assert_eq!(image.mime_type, "image/jpeg");
        assert_eq!(image.data, "/9j/4AAQSkZJRg==");
        assert_eq!(image.to_data_uri(), uri);
    }

    #[test]
    fn test_parse_rejects_malformed() {
        let cases = [
            ("iVBORw0KGgo=", MalformedDataUri::MissingScheme),
            ("data:image/png;base64", MalformedDataUri::MissingPayload),
            ("data:image/png,iVBORw0KGgo=", MalformedDataUri::NotBase64),
            ("data:;base64,iVBORw0KGgo=", MalformedDataUri::MissingMimeType),
            ("data:image/png;base64,", MalformedDataUri::EmptyPayload),
            (
                "data:image/png;name=a.png;base64,iVBORw0KGgo=",
                MalformedDataUri::NotBase64,
            ),
        ];
        for (uri, expected) in cases {
            assert_eq!(InlineImage::parse(uri), Err(expected), "{uri}");
        }
    }

    #[test]
    fn test_from_bytes_and_decode() {
        let bytes = [0x89, 0x50, 0x4E, 0x47, 0x00, 0xFF];
        let image = InlineImage::from_bytes("image/png", &bytes);
        assert_eq!(image.decode().unwrap(), bytes);

        let broken = InlineImage::new("image/png", "not base64!");
        assert!(matches!(broken.decode(), Err(LuminaError::Decode(_))));
    }

    #[test]
    fn test_reference_decode_tags_outcome() {
        let accepted = ReferenceDecode::from_uri(0, "data:image/webp;base64,UklGRg==");
        assert_eq!(
            accepted.clone().into_inline(),
            Some(InlineImage::new("image/webp", "UklGRg=="))
        );

        let skipped = ReferenceDecode::from_uri(3, "https://example.com/cat.png");
        assert_eq!(
            skipped,
            ReferenceDecode::Skipped {
                index: 3,
                reason: MalformedDataUri::MissingScheme
            }
        );
        assert_eq!(skipped.into_inline(), None);
    }
}
