//! `data:<mime>;base64,<payload>` encoding.

use std::fmt;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;

use super::CaptureError;

/// A decoded data URI. Only the base64 form is produced or accepted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataUri {
    pub mime: String,
    pub data: Vec<u8>,
}

impl DataUri {
    pub fn new(mime: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            mime: mime.into(),
            data,
        }
    }

    pub fn parse(uri: &str) -> Result<Self, CaptureError> {
        let rest = uri
            .strip_prefix("data:")
            .ok_or_else(|| CaptureError::MalformedDataUri("missing data: scheme".to_string()))?;
        let (header, payload) = rest
            .split_once(',')
            .ok_or_else(|| CaptureError::MalformedDataUri("missing payload separator".to_string()))?;
        let mime = header.strip_suffix(";base64").ok_or_else(|| {
            CaptureError::MalformedDataUri("only base64 payloads are supported".to_string())
        })?;
        if mime.is_empty() {
            return Err(CaptureError::MalformedDataUri("empty media type".to_string()));
        }
        let data = STANDARD
            .decode(payload)
            .map_err(|e| CaptureError::MalformedDataUri(e.to_string()))?;
        Ok(Self::new(mime, data))
    }

    pub fn is_image(&self) -> bool {
        is_image_mime(&self.mime)
    }
}

impl fmt::Display for DataUri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "data:{};base64,{}", self.mime, STANDARD.encode(&self.data))
    }
}

/// Media type of a base64 data URI, read from the header alone. The
/// payload is not decoded.
pub fn header_mime(uri: &str) -> Option<&str> {
    let (header, _) = uri.strip_prefix("data:")?.split_once(',')?;
    header.strip_suffix(";base64").filter(|mime| !mime.is_empty())
}

/// `image/*`, the only media types accepted for photos.
pub fn is_image_mime(mime: &str) -> bool {
    mime.strip_prefix("image/")
        .map(|sub| !sub.is_empty())
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_and_parse() {
        let uri = DataUri::new("image/jpeg", vec![0xff, 0xd8, 0xff]);
        let text = uri.to_string();
        assert_eq!(text, "data:image/jpeg;base64,/9j/");
        assert_eq!(DataUri::parse(&text).unwrap(), uri);
    }

    #[test]
    fn test_parse_rejects_non_base64() {
        assert!(DataUri::parse("data:image/png,rawbytes").is_err());
        assert!(DataUri::parse("image/png;base64,AAAA").is_err());
        assert!(DataUri::parse("data:;base64,AAAA").is_err());
        assert!(DataUri::parse("data:image/png;base64,@@@").is_err());
    }

    #[test]
    fn test_header_mime_skips_payload() {
        assert_eq!(header_mime("data:image/png;base64,@@@"), Some("image/png"));
        assert_eq!(header_mime("data:image/png,raw"), None);
        assert_eq!(header_mime("data:;base64,AAAA"), None);
        assert_eq!(header_mime("https://example.com/a.png"), None);
    }

    #[test]
    fn test_is_image_mime() {
        assert!(is_image_mime("image/png"));
        assert!(is_image_mime("image/jpeg"));
        assert!(!is_image_mime("image/"));
        assert!(!is_image_mime("application/pdf"));
    }
}
