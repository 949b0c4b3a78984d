//! IPTC-IIM records inside a JPEG APP13 (Photoshop 3.0) segment.

use crate::metadata::Metadata;

pub const IPTC_HEADER: &[u8] = b"Photoshop 3.0\0";
const IPTC_8BIM: &[u8] = b"8BIM";
const IPTC_RESOURCE_ID: u16 = 0x0404;

const TAG_MARKER: u8 = 0x1C;

// Record 2 (application) dataset numbers
const DS_RECORD_VERSION: u8 = 0;
const DS_OBJECT_NAME: u8 = 5;
const DS_HEADLINE: u8 = 105;
const DS_KEYWORDS: u8 = 25;
const DS_BYLINE: u8 = 80;
const DS_COPYRIGHT: u8 = 116;
const DS_CAPTION: u8 = 120;

// Record 1 (envelope): coded character set, ESC % G = UTF-8
const DS_CODED_CHARSET: u8 = 90;
const UTF8_CHARSET: &[u8] = &[0x1B, 0x25, 0x47];

/// Descriptive properties found in IPTC-IIM.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IptcFields {
    pub headline: Option<String>,
    pub object_name: Option<String>,
    pub caption: Option<String>,
    pub keywords: Vec<String>,
    pub byline: Option<String>,
    pub copyright: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Dataset {
    record: u8,
    number: u8,
    data: Vec<u8>,
}

/// A Photoshop image resource block.
struct Resource<'a> {
    id: u16,
    /// The whole block, header and padding included.
    raw: &'a [u8],
    data: &'a [u8],
}

/// Walk the 8BIM resource blocks that follow the Photoshop header.
fn resources(segment: &[u8]) -> Vec<Resource<'_>> {
    let mut out = Vec::new();
    if !segment.starts_with(IPTC_HEADER) {
        return out;
    }
    let data = segment;
    let mut pos = IPTC_HEADER.len();
    while pos + 12 <= data.len() {
        if &data[pos..pos + 4] != IPTC_8BIM {
            break;
        }
        let resource_id = u16::from_be_bytes([data[pos + 4], data[pos + 5]]);
        // Skip pascal string (1 byte length + string + padding to even)
        let pascal_len = data[pos + 6] as usize;
        let pascal_padded = if (pascal_len + 1) % 2 == 0 { pascal_len + 1 } else { pascal_len + 2 };
        let data_start = pos + 6 + pascal_padded;
        if data_start + 4 > data.len() {
            break;
        }
        let data_len = u32::from_be_bytes([
            data[data_start],
            data[data_start + 1],
            data[data_start + 2],
            data[data_start + 3],
        ]) as usize;
        let body_start = data_start + 4;
        let body_end = (body_start + data_len).min(data.len());
        let resource_end_padded = if data_len % 2 == 0 { body_start + data_len } else { body_start + data_len + 1 };
        let end = resource_end_padded.min(data.len());

        out.push(Resource {
            id: resource_id,
            raw: &data[pos..end],
            data: &data[body_start..body_end],
        });

        pos = resource_end_padded;
    }
    out
}

/// Split IIM data into datasets. Stops at the first malformed tag.
fn datasets(iim: &[u8]) -> Vec<Dataset> {
    let mut out = Vec::new();
    let mut pos = 0;
    while pos + 5 <= iim.len() {
        if iim[pos] != TAG_MARKER {
            break;
        }
        let record = iim[pos + 1];
        let number = iim[pos + 2];
        let len = u16::from_be_bytes([iim[pos + 3], iim[pos + 4]]);
        if len & 0x8000 != 0 {
            // Extended-length datasets never carry the text records we use
            log::debug!("IPTC extended dataset {record}:{number} ends parsing");
            break;
        }
        let start = pos + 5;
        let end = start + len as usize;
        if end > iim.len() {
            break;
        }
        out.push(Dataset {
            record,
            number,
            data: iim[start..end].to_vec(),
        });
        pos = end;
    }
    out
}

/// Extract descriptive properties from an APP13 segment's contents.
pub fn parse(segment: &[u8]) -> IptcFields {
    let mut fields = IptcFields::default();
    let Some(iim) = resources(segment).into_iter().find(|r| r.id == IPTC_RESOURCE_ID) else {
        return fields;
    };

    for ds in datasets(iim.data).into_iter().filter(|d| d.record == 2) {
        let text = String::from_utf8_lossy(&ds.data).trim().to_string();
        if text.is_empty() {
            continue;
        }
        match ds.number {
            DS_HEADLINE => fields.headline = Some(text),
            DS_OBJECT_NAME => fields.object_name = Some(text),
            DS_CAPTION => fields.caption = Some(text),
            DS_KEYWORDS => fields.keywords.push(text),
            DS_BYLINE => fields.byline = Some(text),
            DS_COPYRIGHT => fields.copyright = Some(text),
            _ => {}
        }
    }
    fields
}

/// Build APP13 contents carrying the non-empty fields of `metadata`.
///
/// Other Photoshop resources and unrelated IIM datasets are preserved.
/// Keywords are replaced as a whole.
pub fn build(existing: Option<&[u8]>, metadata: &Metadata) -> Vec<u8> {
    let mut result = Vec::new();
    result.extend_from_slice(IPTC_HEADER);

    let existing_resources = existing.map(resources).unwrap_or_default();
    let mut kept: Vec<Dataset> = Vec::new();

    for resource in &existing_resources {
        if resource.id == IPTC_RESOURCE_ID {
            kept = datasets(resource.data);
        } else {
            // Preserve this resource
            result.extend_from_slice(resource.raw);
        }
    }

    let replacing = |number: u8| match number {
        DS_HEADLINE => !metadata.title.is_empty(),
        DS_CAPTION => !metadata.description.is_empty(),
        DS_KEYWORDS => !metadata.keywords.is_empty(),
        DS_BYLINE => !metadata.author.is_empty(),
        DS_COPYRIGHT => !metadata.copyright.is_empty(),
        _ => false,
    };
    kept.retain(|d| !(d.record == 2 && replacing(d.number)));
    kept.retain(|d| !(d.record == 2 && d.number == DS_RECORD_VERSION));
    kept.retain(|d| !(d.record == 1 && d.number == DS_CODED_CHARSET));

    let mut records = vec![
        Dataset {
            record: 1,
            number: DS_CODED_CHARSET,
            data: UTF8_CHARSET.to_vec(),
        },
        // Record version (2:0) is mandatory
        Dataset {
            record: 2,
            number: DS_RECORD_VERSION,
            data: vec![0x00, 0x04],
        },
    ];
    records.extend(kept);

    let mut push = |number: u8, value: &str, max: usize| {
        records.push(Dataset {
            record: 2,
            number,
            data: truncate_utf8(value, max).to_vec(),
        });
    };
    if !metadata.title.is_empty() {
        push(DS_HEADLINE, &metadata.title, 256);
    }
    for k in &metadata.keywords {
        push(DS_KEYWORDS, k, 64);
    }
    if !metadata.author.is_empty() {
        push(DS_BYLINE, &metadata.author, 32);
    }
    if !metadata.copyright.is_empty() {
        push(DS_COPYRIGHT, &metadata.copyright, 128);
    }
    if !metadata.description.is_empty() {
        push(DS_CAPTION, &metadata.description, 2000);
    }

    // Envelope record sorts before application record
    records.sort_by_key(|d| d.record);

    let mut iptc_data = Vec::new();
    for ds in &records {
        iptc_data.extend_from_slice(&[TAG_MARKER, ds.record, ds.number]);
        iptc_data.extend_from_slice(&(ds.data.len() as u16).to_be_bytes());
        iptc_data.extend_from_slice(&ds.data);
    }

    // Write the IPTC-IIM as 8BIM resource 0x0404
    result.extend_from_slice(IPTC_8BIM);
    result.extend_from_slice(&IPTC_RESOURCE_ID.to_be_bytes());
    result.push(0x00); // pascal string (empty, length 0)
    result.push(0x00); // padding to even
    result.extend_from_slice(&(iptc_data.len() as u32).to_be_bytes());
    result.extend_from_slice(&iptc_data);
    if iptc_data.len() % 2 != 0 {
        result.push(0x00); // pad to even
    }

    result
}

/// Longest prefix of `s` within `max` bytes that ends on a char boundary.
fn truncate_utf8(s: &str, max: usize) -> &[u8] {
    if s.len() <= max {
        return s.as_bytes();
    }
    let mut end = max;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    &s.as_bytes()[..end]
}
