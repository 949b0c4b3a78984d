use std::path::Path;

use crate::config::Config;
use crate::error::EditorError;
use crate::exif::{self, WriteOptions};
use crate::metadata::Metadata;

use super::MetadataCodec;

/// The crate's own XMP/IPTC/EXIF codec, run off the async executor.
#[derive(Debug, Clone, Default)]
pub struct ExifCodec {
    options: WriteOptions,
}

impl ExifCodec {
    pub fn new(options: WriteOptions) -> Self {
        Self { options }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(WriteOptions::from_config(config))
    }
}

#[async_trait::async_trait]
impl MetadataCodec for ExifCodec {
    async fn read_metadata(&self, path: &Path) -> Result<Metadata, EditorError> {
        let owned = path.to_path_buf();
        tokio::task::spawn_blocking(move || exif::read_metadata(&owned))
            .await
            .map_err(|e| EditorError::decode(format!("metadata reader stopped: {e}")))?
            .map_err(|e| EditorError::from_codec(path, e))
    }

    async fn write_metadata(&self, path: &Path, metadata: &Metadata) -> Result<(), EditorError> {
        let owned = path.to_path_buf();
        let metadata = metadata.clone();
        let options = self.options;
        tokio::task::spawn_blocking(move || exif::write_metadata(&owned, &metadata, &options))
            .await
            .map_err(|e| EditorError::decode(format!("metadata writer stopped: {e}")))?
            .map_err(|e| EditorError::from_codec(path, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exif::fixtures;
    use image::ImageFormat;
    use tempfile::TempDir;

    #[tokio::test]
    async fn round_trip_through_codec() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("photo.jpg");
        std::fs::write(&path, fixtures::encoded(ImageFormat::Jpeg)).unwrap();

        let codec = ExifCodec::new(WriteOptions {
            backup_originals: false,
            mirror_to_exif: true,
        });
        let written = Metadata {
            title: "Title".into(),
            keywords: vec!["k1".into(), "k2".into()],
            ..Metadata::default()
        };
        codec.write_metadata(&path, &written).await.unwrap();

        let read = codec.read_metadata(&path).await.unwrap();
        assert_eq!(read.title, "Title");
        assert_eq!(read.keywords, vec!["k1", "k2"]);
    }

    #[tokio::test]
    async fn config_controls_backups() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("photo.jpg");
        std::fs::write(&path, fixtures::encoded(ImageFormat::Jpeg)).unwrap();
        let written = Metadata { title: "Title".into(), ..Metadata::default() };

        let mut config = Config::default();
        config.output.backup_originals = false;
        ExifCodec::from_config(&config).write_metadata(&path, &written).await.unwrap();
        assert!(!dir.path().join("photo.jpg.bak").exists());

        config.output.backup_originals = true;
        ExifCodec::from_config(&config).write_metadata(&path, &written).await.unwrap();
        assert!(dir.path().join("photo.jpg.bak").exists());
    }

    #[tokio::test]
    async fn missing_file_maps_to_io() {
        let err = ExifCodec::default()
            .read_metadata(Path::new("/nonexistent/photo.jpg"))
            .await
            .unwrap_err();
        assert!(matches!(err, EditorError::Io { .. }));
    }

    #[tokio::test]
    async fn unsupported_write_maps_to_decode() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("anim.gif");
        std::fs::write(&path, fixtures::encoded(ImageFormat::Gif)).unwrap();

        let err = ExifCodec::default()
            .write_metadata(&path, &Metadata { title: "x".into(), ..Metadata::default() })
            .await
            .unwrap_err();
        assert!(matches!(err, EditorError::Decode(ref m) if m.contains("not supported")));
    }
}
