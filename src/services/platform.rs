use crate::error::EditorError;
use crate::metadata::PlatformInfo;

use super::PlatformProvider;

/// Reports the platform this binary was compiled for.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemPlatform;

#[async_trait::async_trait]
impl PlatformProvider for SystemPlatform {
    async fn platform_info(&self) -> Result<PlatformInfo, EditorError> {
        Ok(PlatformInfo {
            os: std::env::consts::OS.to_string(),
            arch: std::env::consts::ARCH.to_string(),
            family: std::env::consts::FAMILY.to_string(),
        })
    }
}
