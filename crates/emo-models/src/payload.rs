//! Encoded frame payloads sent for interpretation.

use std::fmt;

/// A downscaled, encoded frame ready to upload.
#[derive(Clone, PartialEq, Eq)]
pub struct PreparedImage {
    /// Encoded image bytes
    pub data: Vec<u8>,
    pub width: u32,
    pub height: u32,
    /// MIME type of `data`
    pub mime_type: &'static str,
}

impl PreparedImage {
    pub const JPEG: &'static str = "image/jpeg";

    pub fn jpeg(data: Vec<u8>, width: u32, height: u32) -> Self {
        Self {
            data,
            width,
            height,
            mime_type: Self::JPEG,
        }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

// Payload bytes are noise in logs.
impl fmt::Debug for PreparedImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PreparedImage")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("mime_type", &self.mime_type)
            .field("bytes", &self.data.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debug_hides_bytes() {
        let image = PreparedImage::jpeg(vec![0xFF, 0xD8, 0xFF], 4, 3);
        let debug = format!("{:?}", image);
        assert!(debug.contains("bytes: 3"));
        assert_eq!(image.mime_type, "image/jpeg");
        assert_eq!(image.len(), 3);
    }
}
