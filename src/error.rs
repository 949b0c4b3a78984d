use std::path::{Path, PathBuf};

/// Failures surfaced by the editor's collaborators and guards.
///
/// A cancelled file picker is not an error: [`FilePicker`](crate::services::FilePicker)
/// reports it as `Ok(None)`.
#[derive(Debug, thiserror::Error)]
pub enum EditorError {
    /// Platform information could not be discovered.
    #[error("platform info unavailable: {0}")]
    Platform(String),

    /// The native file picker itself failed (not a cancellation).
    #[error("file picker failed: {0}")]
    Picker(String),

    /// A file could not be read or written.
    #[error("{}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Metadata is missing, malformed, or cannot be encoded for this format.
    #[error("metadata error: {0}")]
    Decode(String),

    /// A command was rejected before any collaborator was called.
    #[error("{0}")]
    Validation(String),
}

impl EditorError {
    pub fn io(path: &Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }

    pub fn decode(msg: impl Into<String>) -> Self {
        Self::Decode(msg.into())
    }

    /// Convert a codec error, keeping I/O failures distinguishable from decode failures.
    pub fn from_codec(path: &Path, err: anyhow::Error) -> Self {
        let io_kind = err
            .chain()
            .find_map(|cause| cause.downcast_ref::<std::io::Error>())
            .map(|io| io.kind());

        match io_kind {
            Some(kind) => Self::Io {
                path: path.to_path_buf(),
                source: std::io::Error::new(kind, format!("{err:#}")),
            },
            None => Self::Decode(format!("{err:#}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Context;

    #[test]
    fn codec_io_error_stays_io() {
        let err = std::fs::read("/nonexistent/photo.jpg")
            .context("Failed to read image file")
            .unwrap_err();
        let converted = EditorError::from_codec(Path::new("/nonexistent/photo.jpg"), err);
        match converted {
            EditorError::Io { path, source } => {
                assert_eq!(path, PathBuf::from("/nonexistent/photo.jpg"));
                assert_eq!(source.kind(), std::io::ErrorKind::NotFound);
                assert!(source.to_string().contains("Failed to read image file"));
            }
            other => panic!("expected Io, got {other:?}"),
        }
    }

    #[test]
    fn codec_other_error_is_decode() {
        let err = anyhow::anyhow!("bad exif");
        let converted = EditorError::from_codec(Path::new("a.jpg"), err);
        assert!(matches!(converted, EditorError::Decode(ref m) if m == "bad exif"));
        assert_eq!(converted.to_string(), "metadata error: bad exif");
    }

    #[test]
    fn io_display_includes_path() {
        let err = EditorError::io(
            Path::new("/a.jpg"),
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        );
        assert_eq!(err.to_string(), "/a.jpg: denied");
    }
}
