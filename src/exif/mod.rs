//! Descriptive metadata reading and writing across XMP, IPTC, and EXIF.
//!
//! This module provides two main functions:
//!
//! - [`read_metadata`]: Read title, description, keywords, author, copyright,
//!   and capture date from any supported image
//! - [`write_metadata`]: Write edited fields back to the image (format-aware)
//!
//! | Format | Read | Write |
//! |--------|------|-------|
//! | JPEG | XMP + IPTC + EXIF | XMP + IPTC + EXIF IFD0 |
//! | PNG | XMP (`iTXt`) + EXIF | XMP (`iTXt`) |
//! | WebP, TIFF, GIF | EXIF | not supported |

mod iptc;
mod reader;
mod writer;
mod xmp;

use std::fmt;
use std::path::Path;

use image::ImageFormat;

pub use reader::read_metadata;
pub use writer::{write_metadata, WriteOptions};

/// Container format of an image file, as far as metadata handling cares.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageKind {
    Jpeg,
    Png,
    WebP,
    Tiff,
    Gif,
    /// Recognized by `image` but without metadata support here.
    Other,
}

impl ImageKind {
    /// Detect the format from file contents, falling back to the extension.
    pub fn detect(bytes: &[u8], path: &Path) -> Option<Self> {
        let format = image::guess_format(bytes)
            .ok()
            .or_else(|| ImageFormat::from_path(path).ok())?;
        Some(match format {
            ImageFormat::Jpeg => Self::Jpeg,
            ImageFormat::Png => Self::Png,
            ImageFormat::WebP => Self::WebP,
            ImageFormat::Tiff => Self::Tiff,
            ImageFormat::Gif => Self::Gif,
            _ => Self::Other,
        })
    }
}

impl fmt::Display for ImageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Jpeg => "JPEG",
            Self::Png => "PNG",
            Self::WebP => "WebP",
            Self::Tiff => "TIFF",
            Self::Gif => "GIF",
            Self::Other => "this kind of",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use std::io::Cursor;

    use image::{ImageFormat, Rgb, RgbImage};

    /// Encode a small solid image in the given format.
    pub fn encoded(format: ImageFormat) -> Vec<u8> {
        let img = RgbImage::from_pixel(8, 8, Rgb([200, 120, 40]));
        let mut buf = Cursor::new(Vec::new());
        img.write_to(&mut buf, format).unwrap();
        buf.into_inner()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detect_by_content() {
        let jpeg = fixtures::encoded(ImageFormat::Jpeg);
        let png = fixtures::encoded(ImageFormat::Png);
        // Contents win over a misleading extension
        assert_eq!(ImageKind::detect(&jpeg, Path::new("a.png")), Some(ImageKind::Jpeg));
        assert_eq!(ImageKind::detect(&png, Path::new("a.jpg")), Some(ImageKind::Png));
    }

    #[test]
    fn detect_falls_back_to_extension() {
        assert_eq!(ImageKind::detect(b"", Path::new("a.TIFF")), Some(ImageKind::Tiff));
        assert_eq!(ImageKind::detect(b"", Path::new("a.webp")), Some(ImageKind::WebP));
    }

    #[test]
    fn detect_unknown() {
        assert_eq!(ImageKind::detect(b"hello", Path::new("notes.txt")), None);
        assert_eq!(ImageKind::detect(b"hello", Path::new("noext")), None);
    }

    #[test]
    fn display_names() {
        assert_eq!(ImageKind::Jpeg.to_string(), "JPEG");
        assert_eq!(ImageKind::Gif.to_string(), "GIF");
    }
}
