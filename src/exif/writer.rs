use anyhow::{Context, Result, bail};
use img_parts::jpeg::{Jpeg, JpegSegment};
use img_parts::png::{Png, PngChunk};
use img_parts::{Bytes, ImageEXIF};
use little_exif::exif_tag::ExifTag;
use little_exif::filetype::FileExtension;
use little_exif::metadata::Metadata as ExifMetadata;
use std::path::{Path, PathBuf};

use super::ImageKind;
use super::iptc;
use super::reader::itxt_xmp_text;
use super::xmp;
use crate::config::Config;
use crate::metadata::Metadata;

// little_exif as_u8_vec(JPEG) returns: [APP1 marker 2B][length 2B][Exif\0\0 6B][TIFF data]
// img-parts set_exif() expects just the TIFF data (after Exif\0\0)
const JPEG_EXIF_OVERHEAD: usize = 10; // 2 + 2 + 6
/// Largest payload a JPEG APPn segment can carry (length field minus itself).
const JPEG_SEGMENT_MAX: usize = 65533;

/// Controls how [`write_metadata`] touches the file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WriteOptions {
    /// Copy the original to `<name>.<ext>.bak` before the first write.
    pub backup_originals: bool,
    /// Also write description, author, and copyright into EXIF IFD0 (JPEG).
    pub mirror_to_exif: bool,
}

impl Default for WriteOptions {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

impl WriteOptions {
    pub fn from_config(config: &Config) -> Self {
        Self {
            backup_originals: config.output.backup_originals,
            mirror_to_exif: config.writing.mirror_to_exif,
        }
    }
}

/// Write the non-empty fields of `metadata` into the image at `path`.
///
/// Empty fields leave the file's existing values in place; `date_taken` is
/// never written. All segments and chunks unrelated to the written
/// properties are preserved.
pub fn write_metadata(path: &Path, metadata: &Metadata, options: &WriteOptions) -> Result<()> {
    let bytes = std::fs::read(path).context("Failed to read image file")?;
    let kind = ImageKind::detect(&bytes, path)
        .with_context(|| format!("{} is not a recognized image format", path.display()))?;

    if !has_writable_fields(metadata) {
        log::debug!("No metadata fields to write for {}", path.display());
        return Ok(());
    }

    let output = match kind {
        ImageKind::Jpeg => write_jpeg(path, bytes, metadata, options)?,
        ImageKind::Png => write_png(bytes, metadata)?,
        other => bail!("writing metadata to {other} files is not supported"),
    };

    if options.backup_originals {
        if let Err(e) = backup_file(path) {
            log::warn!("Failed to backup {}: {e}", path.display());
        }
    }

    std::fs::write(path, &output).context("Failed to write image file")?;
    log::info!("Wrote metadata to {} ({kind})", path.display());
    Ok(())
}

fn has_writable_fields(metadata: &Metadata) -> bool {
    !metadata.title.is_empty()
        || !metadata.description.is_empty()
        || !metadata.keywords.is_empty()
        || !metadata.author.is_empty()
        || !metadata.copyright.is_empty()
}

/// Create a backup of the original file.
fn backup_file(path: &Path) -> Result<PathBuf> {
    let backup_path = path.with_extension(format!(
        "{}.bak",
        path.extension().unwrap_or_default().to_string_lossy()
    ));

    if !backup_path.exists() {
        std::fs::copy(path, &backup_path).context("Failed to create backup")?;
        log::debug!("Backup created: {}", backup_path.display());
    }

    Ok(backup_path)
}

// ============================================================================
// JPEG
// ============================================================================

fn write_jpeg(path: &Path, bytes: Vec<u8>, metadata: &Metadata, options: &WriteOptions) -> Result<Bytes> {
    let mut jpeg = Jpeg::from_bytes(Bytes::from(bytes))
        .map_err(|e| anyhow::anyhow!("Failed to parse JPEG: {e}"))?;

    if options.mirror_to_exif {
        update_exif(&mut jpeg, path, metadata);
    }
    update_xmp_segment(&mut jpeg, metadata)?;
    update_iptc_segment(&mut jpeg, metadata)?;

    Ok(jpeg.encoder().bytes())
}

/// Find the position of the EXIF APP1 segment in a JPEG.
/// EXIF segments have marker 0xE1 (APP1) and contents starting with "Exif\0\0".
fn find_exif_segment_pos(segments: &[JpegSegment]) -> Option<usize> {
    const EXIF_PREFIX: &[u8] = b"Exif\0\0";
    segments
        .iter()
        .position(|s| s.marker() == 0xE1 && s.contents().starts_with(EXIF_PREFIX))
}

fn find_xmp_segment_pos(segments: &[JpegSegment]) -> Option<usize> {
    segments
        .iter()
        .position(|s| s.marker() == 0xE1 && s.contents().starts_with(xmp::JPEG_XMP_HEADER))
}

fn find_iptc_segment_pos(segments: &[JpegSegment]) -> Option<usize> {
    segments
        .iter()
        .position(|s| s.marker() == 0xED && s.contents().starts_with(iptc::IPTC_HEADER))
}

/// Load existing EXIF metadata from a file path using little_exif.
/// Returns None if it can't parse (instead of losing data).
fn load_existing_exif(path: &Path) -> Option<ExifMetadata> {
    let path_owned = path.to_path_buf();
    // Suppress panics from little_exif
    let prev_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(|_| {}));
    let result = std::panic::catch_unwind(move || ExifMetadata::new_from_path(&path_owned));
    std::panic::set_hook(prev_hook);

    match result {
        Ok(Ok(m)) => {
            if m.data().is_empty() {
                log::debug!("little_exif loaded empty metadata");
                None
            } else {
                log::debug!("little_exif loaded {} existing EXIF tags", m.data().len());
                Some(m)
            }
        }
        Ok(Err(e)) => {
            log::debug!("little_exif could not parse EXIF: {e}");
            None
        }
        Err(_) => {
            log::debug!("little_exif panicked parsing EXIF");
            None
        }
    }
}

/// Mirror description, author, and copyright into EXIF IFD0.
///
/// When the file has EXIF that little_exif cannot parse, EXIF is left
/// untouched rather than rebuilt from scratch.
fn update_exif(jpeg: &mut Jpeg, path: &Path, metadata: &Metadata) {
    let mut new_tags = Vec::new();
    if !metadata.description.is_empty() {
        new_tags.push(ExifTag::ImageDescription(metadata.description.clone()));
    }
    if !metadata.author.is_empty() {
        new_tags.push(ExifTag::Artist(metadata.author.clone()));
    }
    if !metadata.copyright.is_empty() {
        new_tags.push(ExifTag::Copyright(metadata.copyright.clone()));
    }
    if new_tags.is_empty() {
        return;
    }

    let orig_exif_pos = find_exif_segment_pos(jpeg.segments());

    let mut exif = match load_existing_exif(path) {
        Some(existing) => existing,
        None if jpeg.exif().is_none() => ExifMetadata::new(),
        None => {
            log::warn!(
                "Existing EXIF in {} could not be parsed; leaving it unchanged",
                path.display()
            );
            return;
        }
    };
    for tag in new_tags {
        exif.set_tag(tag);
    }

    let exif_bytes = exif.as_u8_vec(FileExtension::JPEG);
    if exif_bytes.len() <= JPEG_EXIF_OVERHEAD {
        return;
    }
    jpeg.set_exif(Some(Bytes::from(exif_bytes[JPEG_EXIF_OVERHEAD..].to_vec())));

    // set_exif() inserts at position 3, which may be after XMP APP1.
    // Move the EXIF segment back to its original position so EXIF comes
    // before XMP (required for many EXIF parsers).
    if let Some(new_pos) = find_exif_segment_pos(jpeg.segments()) {
        let target_pos = orig_exif_pos.unwrap_or(1); // default: right after APP0
        if target_pos < new_pos {
            let segments = jpeg.segments_mut();
            let seg = segments.remove(new_pos);
            segments.insert(target_pos, seg);
        }
    }
}

/// Update or create the XMP APP1 segment.
fn update_xmp_segment(jpeg: &mut Jpeg, metadata: &Metadata) -> Result<()> {
    let xmp_pos = find_xmp_segment_pos(jpeg.segments());
    let existing_xmp = xmp_pos.map(|pos| {
        let contents = jpeg.segments()[pos].contents();
        String::from_utf8_lossy(&contents[xmp::JPEG_XMP_HEADER.len()..]).to_string()
    });

    let new_xmp = xmp::build(existing_xmp.as_deref(), metadata);

    let mut contents = Vec::with_capacity(xmp::JPEG_XMP_HEADER.len() + new_xmp.len());
    contents.extend_from_slice(xmp::JPEG_XMP_HEADER);
    contents.extend_from_slice(new_xmp.as_bytes());
    if contents.len() > JPEG_SEGMENT_MAX {
        bail!(
            "XMP packet is {} bytes, more than a JPEG segment can hold ({JPEG_SEGMENT_MAX})",
            contents.len()
        );
    }
    let new_segment = JpegSegment::new_with_contents(0xE1, Bytes::from(contents));

    // Insert after EXIF APP1 or at position 2
    let anchor = find_exif_segment_pos(jpeg.segments()).map(|p| p + 1);

    let segments = jpeg.segments_mut();
    match xmp_pos {
        Some(pos) => segments[pos] = new_segment,
        None => {
            let insert_pos = anchor.unwrap_or(2).min(segments.len());
            segments.insert(insert_pos, new_segment);
        }
    }
    Ok(())
}

/// Update or create the IPTC APP13 segment.
fn update_iptc_segment(jpeg: &mut Jpeg, metadata: &Metadata) -> Result<()> {
    let iptc_pos = find_iptc_segment_pos(jpeg.segments());
    let existing = iptc_pos.map(|pos| jpeg.segments()[pos].contents().to_vec());

    let new_contents = iptc::build(existing.as_deref(), metadata);
    if new_contents.len() > JPEG_SEGMENT_MAX {
        bail!(
            "IPTC block is {} bytes, more than a JPEG segment can hold ({JPEG_SEGMENT_MAX})",
            new_contents.len()
        );
    }
    let new_segment = JpegSegment::new_with_contents(0xED, Bytes::from(new_contents));

    // Insert after XMP or EXIF
    let anchor = find_xmp_segment_pos(jpeg.segments())
        .or_else(|| find_exif_segment_pos(jpeg.segments()))
        .map(|p| p + 1);

    let segments = jpeg.segments_mut();
    match iptc_pos {
        Some(pos) => segments[pos] = new_segment,
        None => {
            let insert_pos = anchor.unwrap_or(2).min(segments.len());
            segments.insert(insert_pos, new_segment);
        }
    }
    Ok(())
}

// ============================================================================
// PNG
// ============================================================================

fn write_png(bytes: Vec<u8>, metadata: &Metadata) -> Result<Bytes> {
    let mut png = Png::from_bytes(Bytes::from(bytes))
        .map_err(|e| anyhow::anyhow!("Failed to parse PNG: {e}"))?;

    let existing = png
        .chunks()
        .iter()
        .enumerate()
        .filter(|(_, c)| c.kind() == *b"iTXt")
        .find_map(|(i, c)| itxt_xmp_text(c.contents()).map(|text| (i, text)));

    let new_xmp = xmp::build(existing.as_ref().map(|(_, text)| text.as_str()), metadata);

    // keyword\0, compression flag, compression method, language\0, translated keyword\0
    let mut contents = xmp::PNG_XMP_KEYWORD.to_vec();
    contents.extend_from_slice(&[0, 0, 0, 0, 0]);
    contents.extend_from_slice(new_xmp.as_bytes());
    let chunk = PngChunk::new(*b"iTXt", Bytes::from(contents));

    let chunks = png.chunks_mut();
    match existing {
        Some((pos, _)) => chunks[pos] = chunk,
        None => {
            let iend = chunks
                .iter()
                .position(|c| c.kind() == *b"IEND")
                .unwrap_or(chunks.len());
            chunks.insert(iend, chunk);
        }
    }

    Ok(png.encoder().bytes())
}
