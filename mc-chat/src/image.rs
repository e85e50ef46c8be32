use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use std::path::Path;

const IMAGE_DATA_URI_PREFIX: &str = "data:image/jpeg;base64,";

/// Result of turning a local file into an image payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageEncoding {
    Encoded { payload: String },
    /// The file could not be read; the payload is empty.
    Unreadable { reason: String },
}

impl ImageEncoding {
    pub fn payload(&self) -> &str {
        match self {
            ImageEncoding::Encoded { payload } => payload,
            ImageEncoding::Unreadable { .. } => "",
        }
    }

    pub fn is_unreadable(&self) -> bool {
        matches!(self, ImageEncoding::Unreadable { .. })
    }

    pub fn data_uri(&self) -> String {
        format!("{IMAGE_DATA_URI_PREFIX}{}", self.payload())
    }
}

/// Reads `path` and base64-encodes its bytes. Never fails: unreadable files
/// degrade to an empty payload and a warning.
pub async fn encode_image(path: &Path) -> ImageEncoding {
    match tokio::fs::read(path).await {
        Ok(bytes) => ImageEncoding::Encoded {
            payload: STANDARD.encode(bytes),
        },
        Err(e) => {
            let reason = if e.kind() == std::io::ErrorKind::NotFound {
                format!("file {} not found", path.display())
            } else {
                format!("read {}: {e}", path.display())
            };
            tracing::warn!(
                path = %path.display(),
                %reason,
                "image unreadable; sending empty payload"
            );
            ImageEncoding::Unreadable { reason }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn encodes_file_bytes_as_standard_base64() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("pixel.jpg");
        std::fs::write(&path, b"\xff\xd8\xff\xe0jpeg").unwrap();

        let enc = encode_image(&path).await;
        assert_eq!(enc.payload(), "/9j/4GpwZWc=");
        assert_eq!(enc.data_uri(), "data:image/jpeg;base64,/9j/4GpwZWc=");
        assert!(!enc.is_unreadable());
    }

    #[tokio::test]
    async fn missing_file_degrades_to_empty_payload() {
        let tmp = tempfile::tempdir().unwrap();
        let enc = encode_image(&tmp.path().join("missing.jpg")).await;
        assert!(enc.is_unreadable());
        assert_eq!(enc.payload(), "");
        assert_eq!(enc.data_uri(), "data:image/jpeg;base64,");
        match enc {
            ImageEncoding::Unreadable { reason } => assert!(reason.contains("not found")),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[tokio::test]
    async fn directory_path_is_unreadable() {
        let tmp = tempfile::tempdir().unwrap();
        let enc = encode_image(tmp.path()).await;
        assert!(enc.is_unreadable());
        assert_eq!(enc.payload(), "");
    }
}
