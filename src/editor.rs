use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::config::{Config, FileFilter};
use crate::error::EditorError;
use crate::metadata::{MetadataEdit, MetadataField};
use crate::services::{
    ExifCodec, FilePicker, FileReader, FixedPicker, MemoryPreviews, MetadataCodec,
    PlatformProvider, PreviewHandle, PreviewStore, SystemPlatform, TokioFileReader,
};
use crate::session::{Session, SessionSnapshot, Status};

/// Owns the editing session and runs commands against it.
///
/// `Editor` is a cheap handle: clones share the same session and
/// collaborators. Commands never return errors; every failure ends in
/// [`Status::Error`] with a message in the session.
///
/// The session lock is only held between awaits, so edits made while an
/// open or save is in flight are applied immediately. A metadata read that
/// completes afterwards replaces the whole record, edits included.
/// Overlapping `open_image`/`save_metadata` calls are not serialized here;
/// front ends gate them with [`Status::can_open`] and [`Status::can_save`].
///
/// # Example
///
/// ```rust,no_run
/// use image_meta::editor::Editor;
/// use image_meta::metadata::MetadataField;
/// use image_meta::services::FixedPicker;
/// use std::sync::Arc;
///
/// # async fn example() {
/// let editor = Editor::builder()
///     .picker(Arc::new(FixedPicker::new("photo.jpg")))
///     .build();
///
/// editor.initialize().await;
/// editor.open_image().await;
/// editor.edit_field(MetadataField::Title, "Harbor at dusk");
/// editor.edit_keywords("sea, boats, evening");
/// editor.save_metadata().await;
///
/// println!("{}", editor.status_message());
/// # }
/// ```
#[derive(Clone)]
pub struct Editor {
    session: Arc<Mutex<Session>>,
    platform: Arc<dyn PlatformProvider>,
    picker: Arc<dyn FilePicker>,
    reader: Arc<dyn FileReader>,
    codec: Arc<dyn MetadataCodec>,
    previews: Arc<dyn PreviewStore>,
    filter: Arc<FileFilter>,
}

/// Wires collaborators into an [`Editor`].
///
/// Anything not set falls back to the production implementation. The
/// picker falls back to one that always cancels.
#[derive(Default)]
pub struct EditorBuilder {
    platform: Option<Arc<dyn PlatformProvider>>,
    picker: Option<Arc<dyn FilePicker>>,
    reader: Option<Arc<dyn FileReader>>,
    codec: Option<Arc<dyn MetadataCodec>>,
    previews: Option<Arc<dyn PreviewStore>>,
    filter: FileFilter,
    default_codec: ExifCodec,
}

impl EditorBuilder {
    pub fn platform(mut self, platform: Arc<dyn PlatformProvider>) -> Self {
        self.platform = Some(platform);
        self
    }

    pub fn picker(mut self, picker: Arc<dyn FilePicker>) -> Self {
        self.picker = Some(picker);
        self
    }

    pub fn reader(mut self, reader: Arc<dyn FileReader>) -> Self {
        self.reader = Some(reader);
        self
    }

    pub fn codec(mut self, codec: Arc<dyn MetadataCodec>) -> Self {
        self.codec = Some(codec);
        self
    }

    pub fn previews(mut self, previews: Arc<dyn PreviewStore>) -> Self {
        self.previews = Some(previews);
        self
    }

    pub fn filter(mut self, filter: FileFilter) -> Self {
        self.filter = filter;
        self
    }

    /// Take the picker filter and the default codec's write options from `config`.
    pub fn config(mut self, config: &Config) -> Self {
        self.filter = config.file_filter.clone();
        self.default_codec = ExifCodec::from_config(config);
        self
    }

    pub fn build(self) -> Editor {
        Editor {
            session: Arc::new(Mutex::new(Session::new())),
            platform: self.platform.unwrap_or_else(|| Arc::new(SystemPlatform)),
            picker: self
                .picker
                .unwrap_or_else(|| Arc::new(FixedPicker::cancelled())),
            reader: self.reader.unwrap_or_else(|| Arc::new(TokioFileReader)),
            codec: self
                .codec
                .unwrap_or_else(|| Arc::new(self.default_codec)),
            previews: self
                .previews
                .unwrap_or_else(|| Arc::new(MemoryPreviews::new())),
            filter: Arc::new(self.filter),
        }
    }
}

impl Editor {
    pub fn builder() -> EditorBuilder {
        EditorBuilder::default()
    }

    fn lock(&self) -> MutexGuard<'_, Session> {
        self.session.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn fail(&self, context: &str, err: &EditorError) {
        log::error!("{context}: {err}");
        self.lock().fail(format!("{context}: {err}"));
    }

    // ── commands ─────────────────────────────────────────────────────

    /// Fetch platform information.
    ///
    /// Success leaves the status alone. Failure enters [`Status::Error`]
    /// but blocks nothing: `open_image` still works afterwards.
    pub async fn initialize(&self) {
        match self.platform.platform_info().await {
            Ok(info) => {
                log::debug!("Platform: {} {} ({})", info.os, info.arch, info.family);
                self.lock().set_platform_info(info);
            }
            Err(e) => self.fail("Failed to get platform info", &e),
        }
    }

    /// Pick an image, load its preview, and read its metadata.
    ///
    /// Cancelling the picker restores the status and message held before
    /// the call, unless another command moved the session off `loading`
    /// meanwhile. Once a path is picked it stays selected even if reading
    /// fails; the previous preview is released at that point.
    pub async fn open_image(&self) {
        let (prior_status, prior_error) = {
            let mut session = self.lock();
            let prior = (
                session.status(),
                session.error_message().map(str::to_string),
            );
            session.enter(Status::Loading);
            prior
        };

        let path = match self.picker.pick_image_file(&self.filter).await {
            Ok(Some(path)) => path,
            Ok(None) => {
                log::debug!("Image selection cancelled");
                let mut session = self.lock();
                if session.status() == Status::Loading {
                    session.restore(prior_status, prior_error);
                }
                return;
            }
            Err(e) => return self.fail("Failed to open image", &e),
        };

        log::info!("Opening {}", path.display());
        self.lock().select_image(path.clone());

        let bytes = match self.reader.read_file_bytes(&path).await {
            Ok(bytes) => bytes,
            Err(e) => return self.fail("Failed to open image", &e),
        };
        let preview = PreviewHandle::create(Arc::clone(&self.previews), bytes);
        {
            let mut session = self.lock();
            session.set_preview(preview);
            session.enter(Status::ReadingMetadata);
        }

        match self.codec.read_metadata(&path).await {
            Ok(metadata) => {
                let mut session = self.lock();
                session.replace_metadata(metadata);
                session.enter(Status::Success);
            }
            Err(e) => self.fail("Failed to read metadata", &e),
        }
    }

    /// Replace one free-text field. Never fails and never changes the status.
    pub fn edit_field(&self, field: MetadataField, value: impl Into<String>) {
        self.apply(MetadataEdit::Field(field, value.into()));
    }

    /// Replace the keyword list from comma-separated text.
    pub fn edit_keywords(&self, raw: &str) {
        self.apply(MetadataEdit::Keywords(raw.to_string()));
    }

    pub fn apply(&self, edit: MetadataEdit) {
        let target = match &edit {
            MetadataEdit::Field(field, _) => field.name(),
            MetadataEdit::Keywords(_) => "keywords",
        };
        let mut session = self.lock();
        if session.status().is_busy() {
            log::debug!("Edit to {target} applied while {}", session.status());
        }
        session.metadata_mut().apply(edit);
    }

    /// Write the current metadata to the selected image.
    ///
    /// Without a selected image this fails immediately and the codec is
    /// never called. The in-memory metadata is kept whatever the outcome.
    pub async fn save_metadata(&self) {
        let (path, metadata) = {
            let mut session = self.lock();
            let Some(path) = session.image_path().cloned() else {
                let err = EditorError::Validation("no image selected".into());
                log::warn!("Cannot save metadata: {err}");
                session.fail(format!("Cannot save metadata: {err}"));
                return;
            };
            session.enter(Status::SavingMetadata);
            (path, session.metadata().clone())
        };

        match self.codec.write_metadata(&path, &metadata).await {
            Ok(()) => {
                log::info!("Saved metadata to {}", path.display());
                self.lock().enter(Status::Success);
            }
            Err(e) => self.fail("Failed to save metadata", &e),
        }
    }

    /// Release the preview currently held, if any.
    pub fn teardown(&self) {
        let preview = self.lock().take_preview();
        if let Some(preview) = preview {
            log::debug!("Teardown releases {}", preview.id());
        }
    }

    // ── accessors ────────────────────────────────────────────────────

    pub fn snapshot(&self) -> SessionSnapshot {
        self.lock().snapshot()
    }

    pub fn status(&self) -> Status {
        self.lock().status()
    }

    pub fn status_message(&self) -> String {
        self.lock().status_message()
    }

    pub fn filter(&self) -> &FileFilter {
        &self.filter
    }
}
