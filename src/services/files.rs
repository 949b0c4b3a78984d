use std::path::Path;

use crate::error::EditorError;

use super::FileReader;

/// Reads files with `tokio::fs`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioFileReader;

#[async_trait::async_trait]
impl FileReader for TokioFileReader {
    async fn read_file_bytes(&self, path: &Path) -> Result<Vec<u8>, EditorError> {
        tokio::fs::read(path)
            .await
            .map_err(|e| EditorError::io(path, e))
    }
}
