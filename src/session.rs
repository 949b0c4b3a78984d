use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::metadata::{Metadata, PlatformInfo};
use crate::services::{PreviewHandle, PreviewId};

/// Finite display state of the session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Status {
    #[default]
    Idle,
    Loading,
    ReadingMetadata,
    SavingMetadata,
    Success,
    Error,
}

impl Status {
    /// An async command is in flight.
    pub fn is_busy(self) -> bool {
        matches!(
            self,
            Self::Loading | Self::ReadingMetadata | Self::SavingMetadata
        )
    }

    /// Whether a front end should let the user trigger `open_image`.
    ///
    /// The editor does not serialize overlapping commands; front ends gate
    /// their affordances on this.
    pub fn can_open(self) -> bool {
        !self.is_busy()
    }

    /// Whether a front end should let the user trigger `save_metadata`.
    pub fn can_save(self) -> bool {
        !matches!(self, Self::Loading | Self::SavingMetadata)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Loading => "loading",
            Self::ReadingMetadata => "reading-metadata",
            Self::SavingMetadata => "saving-metadata",
            Self::Success => "success",
            Self::Error => "error",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

const GENERIC_ERROR: &str = "An error occurred";

/// Human-readable status line for a status and its stored error message.
pub fn status_message(status: Status, error_message: Option<&str>) -> String {
    match status {
        Status::Idle => "Ready".into(),
        Status::Loading => "Loading image...".into(),
        Status::ReadingMetadata => "Reading metadata...".into(),
        Status::SavingMetadata => "Saving metadata...".into(),
        Status::Success => "Operation succeeded!".into(),
        Status::Error => error_message.unwrap_or(GENERIC_ERROR).to_string(),
    }
}

/// The single mutable state of a running editor.
///
/// Only [`Editor`](crate::editor::Editor) mutates a session; the
/// transition helpers keep `error_message` set exactly while `status` is
/// [`Status::Error`].
#[derive(Debug, Default)]
pub struct Session {
    image_path: Option<PathBuf>,
    image_preview: Option<PreviewHandle>,
    metadata: Metadata,
    platform_info: PlatformInfo,
    status: Status,
    error_message: Option<String>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn image_path(&self) -> Option<&PathBuf> {
        self.image_path.as_ref()
    }

    pub fn image_preview(&self) -> Option<PreviewId> {
        self.image_preview.as_ref().map(PreviewHandle::id)
    }

    pub fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    pub fn platform_info(&self) -> &PlatformInfo {
        &self.platform_info
    }

    pub fn status(&self) -> Status {
        self.status
    }

    pub fn error_message(&self) -> Option<&str> {
        self.error_message.as_deref()
    }

    pub fn status_message(&self) -> String {
        status_message(self.status, self.error_message.as_deref())
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            image_path: self.image_path.clone(),
            image_preview: self.image_preview(),
            metadata: self.metadata.clone(),
            platform_info: self.platform_info.clone(),
            status: self.status,
            error_message: self.error_message.clone(),
        }
    }

    // ── transitions (crate-internal) ────────────────────────────────

    /// Enter a non-error status, clearing any stored error.
    pub(crate) fn enter(&mut self, status: Status) {
        debug_assert_ne!(status, Status::Error);
        log::debug!("status: {} -> {}", self.status, status);
        self.status = status;
        self.error_message = None;
    }

    /// Enter the error status with a message.
    pub(crate) fn fail(&mut self, message: String) {
        log::debug!("status: {} -> error", self.status);
        self.status = Status::Error;
        self.error_message = Some(message);
    }

    /// Put back a status and message captured earlier.
    pub(crate) fn restore(&mut self, status: Status, error_message: Option<String>) {
        log::debug!("status: {} -> {} (restored)", self.status, status);
        self.status = status;
        self.error_message = error_message;
    }

    /// Select a new image path, dropping (and so releasing) the previous preview.
    pub(crate) fn select_image(&mut self, path: PathBuf) {
        self.image_preview = None;
        self.image_path = Some(path);
    }

    pub(crate) fn set_preview(&mut self, preview: PreviewHandle) {
        self.image_preview = Some(preview);
    }

    pub(crate) fn take_preview(&mut self) -> Option<PreviewHandle> {
        self.image_preview.take()
    }

    pub(crate) fn metadata_mut(&mut self) -> &mut Metadata {
        &mut self.metadata
    }

    pub(crate) fn replace_metadata(&mut self, metadata: Metadata) {
        self.metadata = metadata;
    }

    pub(crate) fn set_platform_info(&mut self, info: PlatformInfo) {
        self.platform_info = info;
    }
}

/// Owned, serializable copy of a [`Session`] for rendering.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub image_path: Option<PathBuf>,
    pub image_preview: Option<PreviewId>,
    pub metadata: Metadata,
    pub platform_info: PlatformInfo,
    pub status: Status,
    pub error_message: Option<String>,
}

impl SessionSnapshot {
    pub fn status_message(&self) -> String {
        status_message(self.status, self.error_message.as_deref())
    }

    pub fn keywords_text(&self) -> String {
        self.metadata.keywords_text()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [Status; 6] = [
        Status::Idle,
        Status::Loading,
        Status::ReadingMetadata,
        Status::SavingMetadata,
        Status::Success,
        Status::Error,
    ];

    // ── status_message ───────────────────────────────────────────────

    #[test]
    fn message_per_status() {
        assert_eq!(status_message(Status::Idle, None), "Ready");
        assert_eq!(status_message(Status::Loading, None), "Loading image...");
        assert_eq!(status_message(Status::ReadingMetadata, None), "Reading metadata...");
        assert_eq!(status_message(Status::SavingMetadata, None), "Saving metadata...");
        assert_eq!(status_message(Status::Success, None), "Operation succeeded!");
    }

    #[test]
    fn error_message_substituted() {
        assert_eq!(status_message(Status::Error, Some("disk full")), "disk full");
        assert_eq!(status_message(Status::Error, None), "An error occurred");
    }

    #[test]
    fn non_error_ignores_stored_message() {
        assert_eq!(status_message(Status::Success, Some("stale")), "Operation succeeded!");
    }

    // ── front-end gating ─────────────────────────────────────────────

    #[test]
    fn save_disabled_while_loading_or_saving() {
        for status in ALL {
            let expected = !matches!(status, Status::Loading | Status::SavingMetadata);
            assert_eq!(status.can_save(), expected, "can_save for {status}");
        }
    }

    #[test]
    fn open_inert_while_busy() {
        for status in ALL {
            let expected = matches!(status, Status::Idle | Status::Success | Status::Error);
            assert_eq!(status.can_open(), expected, "can_open for {status}");
        }
    }

    #[test]
    fn status_serializes_kebab_case() {
        let json = serde_json::to_string(&Status::ReadingMetadata).unwrap();
        assert_eq!(json, "\"reading-metadata\"");
        for status in ALL {
            assert_eq!(
                serde_json::to_string(&status).unwrap(),
                format!("\"{}\"", status.as_str())
            );
        }
    }

    // ── transitions ──────────────────────────────────────────────────

    #[test]
    fn error_message_tracks_error_status() {
        let mut s = Session::new();
        s.fail("boom".into());
        assert_eq!(s.status(), Status::Error);
        assert_eq!(s.error_message(), Some("boom"));

        s.enter(Status::Loading);
        assert_eq!(s.error_message(), None);

        s.restore(Status::Error, Some("boom".into()));
        assert_eq!(s.status_message(), "boom");
    }

    #[test]
    fn snapshot_copies_fields() {
        let mut s = Session::new();
        s.select_image(PathBuf::from("/a.jpg"));
        s.metadata_mut().title = "t".into();
        let snap = s.snapshot();
        assert_eq!(snap.image_path, Some(PathBuf::from("/a.jpg")));
        assert_eq!(snap.image_preview, None);
        assert_eq!(snap.metadata.title, "t");
        assert_eq!(snap.status, Status::Idle);
    }
}
