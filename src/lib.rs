//! # image-meta
//!
//! Edit the descriptive metadata of an image: title, description, keywords,
//! author, and copyright, with the capture date shown read-only.
//!
//! ## Quick Start
//!
//! The [`Editor`] owns the editing session and drives the collaborators
//! (file picker, file reader, metadata codec, preview store):
//!
//! ```rust,no_run
//! use image_meta::config::Config;
//! use image_meta::editor::Editor;
//! use image_meta::metadata::MetadataField;
//! use image_meta::services::FixedPicker;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     // Load config from file (picker filter, backups, EXIF mirroring)
//!     let config = Config::load(Some("config.json".as_ref()))?;
//!
//!     let editor = Editor::builder()
//!         .config(&config)
//!         .picker(Arc::new(FixedPicker::new("photo.jpg")))
//!         .build();
//!
//!     editor.initialize().await;
//!     editor.open_image().await;
//!     editor.edit_field(MetadataField::Title, "Harbor at dusk");
//!     editor.edit_keywords("sea, boats, evening");
//!     editor.save_metadata().await;
//!
//!     let session = editor.snapshot();
//!     println!("{}: {}", session.status, session.status_message());
//!     Ok(())
//! }
//! ```
//!
//! ## Lower-Level Usage
//!
//! The codec can be used on its own:
//!
//! ```rust,no_run
//! use image_meta::exif::{read_metadata, write_metadata, WriteOptions};
//! use std::path::Path;
//!
//! fn main() -> anyhow::Result<()> {
//!     let path = Path::new("photo.jpg");
//!     let mut metadata = read_metadata(path)?;
//!     println!("Taken: {:?}", metadata.date_taken);
//!
//!     metadata.copyright = "CC-BY 4.0".into();
//!     write_metadata(path, &metadata, &WriteOptions::default())?;
//!     Ok(())
//! }
//! ```
//!
//! ## Modules
//!
//! - [`editor`]: the session orchestrator and its builder
//! - [`session`]: session state, status machine, and snapshots
//! - [`metadata`]: the metadata record and edit commands
//! - [`services`]: collaborator traits and their default implementations
//! - [`exif`]: XMP/IPTC/EXIF reading and writing
//! - [`config`]: configuration types and loading/saving
//! - [`error`]: the error type surfaced by collaborators

pub mod config;
pub mod editor;
pub mod error;
pub mod exif;
pub mod metadata;
pub mod services;
pub mod session;

pub use editor::{Editor, EditorBuilder};
pub use error::EditorError;
pub use metadata::{Metadata, MetadataEdit, MetadataField, PlatformInfo};
pub use session::{SessionSnapshot, Status};
