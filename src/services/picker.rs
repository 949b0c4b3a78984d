use std::path::PathBuf;

use crate::config::FileFilter;
use crate::error::EditorError;

use super::FilePicker;

/// A picker whose answer is decided up front.
///
/// Used where the path is already known, such as a command-line argument.
#[derive(Debug, Clone, Default)]
pub struct FixedPicker {
    path: Option<PathBuf>,
}

impl FixedPicker {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Some(path.into()),
        }
    }

    /// A picker that always reports cancellation.
    pub fn cancelled() -> Self {
        Self { path: None }
    }
}

#[async_trait::async_trait]
impl FilePicker for FixedPicker {
    async fn pick_image_file(&self, filter: &FileFilter) -> Result<Option<PathBuf>, EditorError> {
        if let Some(path) = &self.path {
            if !filter.matches(path) {
                log::warn!(
                    "{} does not match the {} filter ({})",
                    path.display(),
                    filter.name,
                    filter.extensions.join(", ")
                );
            }
        }
        Ok(self.path.clone())
    }
}

/// Native file dialog.
#[cfg(feature = "gui")]
#[derive(Debug, Clone, Copy, Default)]
pub struct DialogPicker;

#[cfg(feature = "gui")]
#[async_trait::async_trait]
impl FilePicker for DialogPicker {
    async fn pick_image_file(&self, filter: &FileFilter) -> Result<Option<PathBuf>, EditorError> {
        let handle = rfd::AsyncFileDialog::new()
            .add_filter(filter.name.as_str(), filter.extensions.as_slice())
            .pick_file()
            .await;
        Ok(handle.map(|h| h.path().to_path_buf()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn fixed_picker_returns_path() {
        let picker = FixedPicker::new("/photos/a.jpg");
        let picked = picker.pick_image_file(&FileFilter::default()).await.unwrap();
        assert_eq!(picked, Some(PathBuf::from("/photos/a.jpg")));
    }

    #[tokio::test]
    async fn cancelled_picker_returns_none() {
        let picked = FixedPicker::cancelled()
            .pick_image_file(&FileFilter::default())
            .await
            .unwrap();
        assert!(picked.is_none());
    }
}
