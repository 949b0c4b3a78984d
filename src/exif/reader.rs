use anyhow::{Context, Result};
use img_parts::Bytes;
use img_parts::jpeg::Jpeg;
use img_parts::png::Png;
use nom_exif::*;
use std::path::Path;

use super::ImageKind;
use super::iptc::{self, IptcFields};
use super::xmp::{self, XmpFields};
use crate::metadata::Metadata;

// IFD0 tag IDs read by code
const TAG_ARTIST: u16 = 0x013B;
const TAG_COPYRIGHT: u16 = 0x8298;

/// Descriptive EXIF values extracted from an image.
#[derive(Debug, Clone, Default)]
struct ExifFields {
    description: Option<String>,
    artist: Option<String>,
    copyright: Option<String>,
    date_taken: Option<String>,
}

/// Read the editable metadata of an image file.
///
/// Each field takes the first non-empty value from XMP, then IPTC, then
/// EXIF. An image that carries no metadata at all yields an empty
/// [`Metadata`]; a file that is not a recognizable image is an error.
pub fn read_metadata(path: &Path) -> Result<Metadata> {
    let bytes = std::fs::read(path).context("Failed to read image file")?;
    let kind = ImageKind::detect(&bytes, path)
        .with_context(|| format!("{} is not a recognized image format", path.display()))?;

    let (xmp, iptc) = match kind {
        ImageKind::Jpeg => read_jpeg_containers(bytes)?,
        ImageKind::Png => (read_png_xmp(bytes)?, IptcFields::default()),
        _ => (XmpFields::default(), IptcFields::default()),
    };
    let exif = read_exif_fields(path);

    let metadata = Metadata {
        title: first_non_empty([xmp.title, iptc.headline, iptc.object_name]),
        description: first_non_empty([xmp.description, iptc.caption, exif.description]),
        keywords: clean_keywords(if xmp.keywords.is_empty() {
            iptc.keywords
        } else {
            xmp.keywords
        }),
        date_taken: exif.date_taken,
        author: first_non_empty([xmp.creator, iptc.byline, exif.artist]),
        copyright: first_non_empty([xmp.rights, iptc.copyright, exif.copyright]),
    };

    log::debug!("Read metadata from {} ({kind})", path.display());
    Ok(metadata)
}

fn first_non_empty<const N: usize>(candidates: [Option<String>; N]) -> String {
    candidates
        .into_iter()
        .flatten()
        .map(|s| s.trim().to_string())
        .find(|s| !s.is_empty())
        .unwrap_or_default()
}

fn clean_keywords(keywords: Vec<String>) -> Vec<String> {
    keywords
        .into_iter()
        .map(|k| k.trim().to_string())
        .filter(|k| !k.is_empty())
        .collect()
}

/// XMP and IPTC from a JPEG's APP1 and APP13 segments.
fn read_jpeg_containers(bytes: Vec<u8>) -> Result<(XmpFields, IptcFields)> {
    let jpeg = Jpeg::from_bytes(Bytes::from(bytes))
        .map_err(|e| anyhow::anyhow!("Failed to parse JPEG: {e}"))?;

    let xmp = jpeg
        .segments()
        .iter()
        .find(|s| s.marker() == 0xE1 && s.contents().starts_with(xmp::JPEG_XMP_HEADER))
        .map(|s| xmp::parse(&String::from_utf8_lossy(&s.contents()[xmp::JPEG_XMP_HEADER.len()..])))
        .unwrap_or_default();

    let iptc = jpeg
        .segments()
        .iter()
        .find(|s| s.marker() == 0xED && s.contents().starts_with(iptc::IPTC_HEADER))
        .map(|s| iptc::parse(s.contents()))
        .unwrap_or_default();

    Ok((xmp, iptc))
}

/// XMP from a PNG `iTXt` chunk.
fn read_png_xmp(bytes: Vec<u8>) -> Result<XmpFields> {
    let png = Png::from_bytes(Bytes::from(bytes))
        .map_err(|e| anyhow::anyhow!("Failed to parse PNG: {e}"))?;

    let text = png
        .chunks()
        .iter()
        .filter(|c| c.kind() == *b"iTXt")
        .find_map(|c| itxt_xmp_text(c.contents()));

    Ok(text.map(|t| xmp::parse(&t)).unwrap_or_default())
}

/// The text of an uncompressed XMP `iTXt` chunk, or `None` for any other chunk.
pub(super) fn itxt_xmp_text(contents: &[u8]) -> Option<String> {
    let keyword_end = contents.iter().position(|&b| b == 0)?;
    if &contents[..keyword_end] != xmp::PNG_XMP_KEYWORD {
        return None;
    }
    let compressed = *contents.get(keyword_end + 1)?;
    if compressed != 0 {
        log::debug!("Compressed XMP iTXt chunk is not supported");
        return None;
    }
    // Skip compression method, then language tag and translated keyword
    let mut pos = keyword_end + 3;
    for _ in 0..2 {
        let rel = contents.get(pos..)?.iter().position(|&b| b == 0)?;
        pos += rel + 1;
    }
    Some(String::from_utf8_lossy(contents.get(pos..)?).to_string())
}

/// Read descriptive EXIF values. Missing or unparsable EXIF yields defaults.
fn read_exif_fields(path: &Path) -> ExifFields {
    let mut parser = MediaParser::new();
    let ms = match MediaSource::file_path(path) {
        Ok(ms) => ms,
        Err(e) => {
            log::debug!("No EXIF source for {}: {e}", path.display());
            return ExifFields::default();
        }
    };

    let iter: ExifIter = match parser.parse(ms) {
        Ok(iter) => iter,
        Err(_) => {
            log::debug!("No EXIF data found in {}", path.display());
            return ExifFields::default();
        }
    };
    let exif: Exif = iter.into();

    ExifFields {
        description: exif.get(ExifTag::ImageDescription).and_then(entry_to_string),
        artist: exif.get_by_ifd_tag_code(0, TAG_ARTIST).and_then(entry_to_string),
        copyright: exif.get_by_ifd_tag_code(0, TAG_COPYRIGHT).and_then(entry_to_string),
        date_taken: exif.get(ExifTag::DateTimeOriginal).and_then(entry_to_string),
    }
}

/// Convert an EntryValue to an Option<String>.
fn entry_to_string(val: &EntryValue) -> Option<String> {
    let s = val.to_string();
    let s = s.trim().trim_matches('"').trim_end_matches('\0').trim().to_string();
    if s.is_empty() { None } else { Some(s) }
}
