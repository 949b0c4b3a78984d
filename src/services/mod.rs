//! Collaborators the editor depends on but does not implement itself.
//!
//! Each concern is a trait so front ends and tests can supply their own
//! implementation. The crate ships production implementations:
//!
//! - [`SystemPlatform`]: platform info from the Rust target constants
//! - [`TokioFileReader`]: file bytes via `tokio::fs`
//! - [`ExifCodec`]: XMP/IPTC/EXIF read and write (see [`crate::exif`])
//! - [`MemoryPreviews`]: in-process preview registry
//! - [`FixedPicker`] and, with the `gui` feature, `DialogPicker`

mod codec;
mod files;
mod picker;
mod platform;
mod preview;

pub use codec::ExifCodec;
pub use files::TokioFileReader;
#[cfg(feature = "gui")]
pub use picker::DialogPicker;
pub use picker::FixedPicker;
pub use platform::SystemPlatform;
pub use preview::{MemoryPreviews, PreviewHandle, PreviewId, PreviewStore};

use std::path::{Path, PathBuf};

use crate::config::FileFilter;
use crate::error::EditorError;
use crate::metadata::{Metadata, PlatformInfo};

/// Source of host platform information.
#[async_trait::async_trait]
pub trait PlatformProvider: Send + Sync {
    async fn platform_info(&self) -> Result<PlatformInfo, EditorError>;
}

/// Lets the user choose one image file.
#[async_trait::async_trait]
pub trait FilePicker: Send + Sync {
    /// Returns `Ok(None)` when the user cancels.
    async fn pick_image_file(&self, filter: &FileFilter) -> Result<Option<PathBuf>, EditorError>;
}

/// Reads raw file bytes for the preview.
#[async_trait::async_trait]
pub trait FileReader: Send + Sync {
    async fn read_file_bytes(&self, path: &Path) -> Result<Vec<u8>, EditorError>;
}

/// Reads and writes the descriptive metadata embedded in an image file.
///
/// # Example
///
/// ```rust,no_run
/// use image_meta::services::{ExifCodec, MetadataCodec};
/// use std::path::Path;
///
/// # async fn example() -> Result<(), image_meta::EditorError> {
/// let codec = ExifCodec::default();
/// let mut metadata = codec.read_metadata(Path::new("photo.jpg")).await?;
/// metadata.title = "Harbor at dusk".into();
/// codec.write_metadata(Path::new("photo.jpg"), &metadata).await?;
/// # Ok(())
/// # }
/// ```
#[async_trait::async_trait]
pub trait MetadataCodec: Send + Sync {
    async fn read_metadata(&self, path: &Path) -> Result<Metadata, EditorError>;
    async fn write_metadata(&self, path: &Path, metadata: &Metadata) -> Result<(), EditorError>;
}
