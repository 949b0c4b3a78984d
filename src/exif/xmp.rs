//! XMP packet parsing and editing.
//!
//! Works on the packet text directly: elements are located by tag name and
//! replaced in place, so properties this crate does not know about survive
//! a rewrite untouched.

use crate::metadata::Metadata;

/// APP1 prefix identifying an XMP packet in a JPEG.
pub const JPEG_XMP_HEADER: &[u8] = b"http://ns.adobe.com/xap/1.0/\0";

/// iTXt keyword identifying an XMP packet in a PNG.
pub const PNG_XMP_KEYWORD: &[u8] = b"XML:com.adobe.xmp";

const DC_NS: &str = "xmlns:dc=\"http://purl.org/dc/elements/1.1/\"";
const PHOTOSHOP_NS: &str = "xmlns:photoshop=\"http://ns.adobe.com/photoshop/1.0/\"";

const EMPTY_PACKET: &str = "<?xpacket begin=\"\u{feff}\" id=\"W5M0MpCehiHzreSzNTczkc9d\"?>\n\
<x:xmpmeta xmlns:x=\"adobe:ns:meta/\">\n\
<rdf:RDF xmlns:rdf=\"http://www.w3.org/1999/02/22-rdf-syntax-ns#\">\n\
<rdf:Description rdf:about=\"\"\n  \
xmlns:dc=\"http://purl.org/dc/elements/1.1/\"\n  \
xmlns:photoshop=\"http://ns.adobe.com/photoshop/1.0/\">\n\
</rdf:Description>\n\
</rdf:RDF>\n\
</x:xmpmeta>\n\
<?xpacket end=\"w\"?>";

/// Descriptive properties found in an XMP packet.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct XmpFields {
    pub title: Option<String>,
    pub description: Option<String>,
    pub keywords: Vec<String>,
    pub creator: Option<String>,
    pub rights: Option<String>,
}

/// Extract the `dc:*` properties from an XMP packet.
pub fn parse(xmp: &str) -> XmpFields {
    XmpFields {
        title: element_body(xmp, "dc:title")
            .and_then(first_value)
            .or_else(|| element_body(xmp, "photoshop:Headline").and_then(first_value)),
        description: element_body(xmp, "dc:description").and_then(first_value),
        keywords: element_body(xmp, "dc:subject")
            .map(list_items)
            .unwrap_or_default(),
        creator: element_body(xmp, "dc:creator").and_then(|b| {
            let items = list_items(b);
            if items.is_empty() { None } else { Some(items.join("; ")) }
        }),
        rights: element_body(xmp, "dc:rights").and_then(first_value),
    }
}

/// Produce a packet carrying every non-empty field of `metadata`.
///
/// An existing packet is edited in place; otherwise a fresh one is built.
/// Empty fields leave whatever the packet already holds.
pub fn build(existing: Option<&str>, metadata: &Metadata) -> String {
    let mut xmp = existing.unwrap_or(EMPTY_PACKET).to_string();

    ensure_namespace(&mut xmp, "xmlns:dc=", DC_NS);
    ensure_namespace(&mut xmp, "xmlns:photoshop=", PHOTOSHOP_NS);
    open_self_closing_description(&mut xmp);

    let mut new_elements = String::new();

    if !metadata.title.is_empty() {
        let t = xml_escape(&metadata.title);
        remove_xml_element(&mut xmp, "dc:title");
        remove_xml_element(&mut xmp, "photoshop:Headline");
        new_elements.push_str(&format!(
            "  <dc:title><rdf:Alt><rdf:li xml:lang=\"x-default\">{t}</rdf:li></rdf:Alt></dc:title>\n"
        ));
        new_elements.push_str(&format!("  <photoshop:Headline>{t}</photoshop:Headline>\n"));
    }

    if !metadata.description.is_empty() {
        let d = xml_escape(&metadata.description);
        remove_xml_element(&mut xmp, "dc:description");
        new_elements.push_str(&format!(
            "  <dc:description><rdf:Alt><rdf:li xml:lang=\"x-default\">{d}</rdf:li></rdf:Alt></dc:description>\n"
        ));
    }

    if !metadata.keywords.is_empty() {
        remove_xml_element(&mut xmp, "dc:subject");
        new_elements.push_str("  <dc:subject><rdf:Bag>\n");
        for k in &metadata.keywords {
            new_elements.push_str(&format!("    <rdf:li>{}</rdf:li>\n", xml_escape(k)));
        }
        new_elements.push_str("  </rdf:Bag></dc:subject>\n");
    }

    if !metadata.author.is_empty() {
        remove_xml_element(&mut xmp, "dc:creator");
        new_elements.push_str(&format!(
            "  <dc:creator><rdf:Seq><rdf:li>{}</rdf:li></rdf:Seq></dc:creator>\n",
            xml_escape(&metadata.author)
        ));
    }

    if !metadata.copyright.is_empty() {
        remove_xml_element(&mut xmp, "dc:rights");
        new_elements.push_str(&format!(
            "  <dc:rights><rdf:Alt><rdf:li xml:lang=\"x-default\">{}</rdf:li></rdf:Alt></dc:rights>\n",
            xml_escape(&metadata.copyright)
        ));
    }

    match xmp.find("</rdf:Description>") {
        Some(pos) => xmp.insert_str(pos, &new_elements),
        None => log::warn!("XMP packet has no rdf:Description; properties not written"),
    }

    xmp
}

/// Declare a namespace on the first `rdf:Description` if it is missing.
fn ensure_namespace(xmp: &mut String, prefix: &str, declaration: &str) {
    if xmp.contains(prefix) {
        return;
    }
    if let Some(pos) = xmp.find("rdf:about=\"\"") {
        let insert_at = pos + "rdf:about=\"\"".len();
        xmp.insert_str(insert_at, &format!("\n  {declaration}"));
    }
}

/// Turn `<rdf:Description .../>` into an open/close pair so children can be added.
fn open_self_closing_description(xmp: &mut String) {
    if xmp.contains("</rdf:Description>") {
        return;
    }
    let Some(desc_start) = xmp.find("<rdf:Description") else {
        return;
    };
    let Some(close_pos) = xmp[desc_start..].find("/>") else {
        return;
    };
    let abs_close = desc_start + close_pos;
    xmp.replace_range(abs_close..abs_close + 2, ">");
    if let Some(rdf_end) = xmp.find("</rdf:RDF>") {
        xmp.insert_str(rdf_end, "</rdf:Description>\n");
    }
}

/// Locate the opening tag of `tag`, skipping longer names that share the prefix.
fn find_open_tag(xml: &str, tag: &str) -> Option<usize> {
    let open = format!("<{tag}");
    let mut from = 0;
    while let Some(rel) = xml[from..].find(&open) {
        let start = from + rel;
        let next = xml[start + open.len()..].chars().next();
        if matches!(next, Some('>' | '/' | ' ' | '\n' | '\r' | '\t')) {
            return Some(start);
        }
        from = start + open.len();
    }
    None
}

/// Inner text of the first `tag` element, or `None` if absent or self-closing.
fn element_body<'a>(xml: &'a str, tag: &str) -> Option<&'a str> {
    let start = find_open_tag(xml, tag)?;
    let open_end = start + xml[start..].find('>')?;
    if xml[..open_end].ends_with('/') {
        return None;
    }
    let body_start = open_end + 1;
    let close = format!("</{tag}>");
    let body_len = xml[body_start..].find(&close)?;
    Some(&xml[body_start..body_start + body_len])
}

/// Values of every `rdf:li` in a container body; plain text if there are none.
fn list_items(body: &str) -> Vec<String> {
    let mut items = Vec::new();
    let mut rest = body;
    while let Some(start) = find_open_tag(rest, "rdf:li") {
        let Some(gt) = rest[start..].find('>') else {
            break;
        };
        let value_start = start + gt + 1;
        if rest[..value_start - 1].ends_with('/') {
            rest = &rest[value_start..];
            continue;
        }
        let Some(len) = rest[value_start..].find("</rdf:li>") else {
            break;
        };
        let value = xml_unescape(rest[value_start..value_start + len].trim());
        if !value.is_empty() {
            items.push(value);
        }
        rest = &rest[value_start + len + "</rdf:li>".len()..];
    }

    if items.is_empty() && !body.contains('<') {
        let value = xml_unescape(body.trim());
        if !value.is_empty() {
            items.push(value);
        }
    }
    items
}

fn first_value(body: &str) -> Option<String> {
    list_items(body).into_iter().next()
}

/// Remove an XML element and its contents from a string.
fn remove_xml_element(xml: &mut String, tag: &str) {
    let Some(start) = find_open_tag(xml, tag) else {
        return;
    };
    let close = format!("</{tag}>");
    let end_abs = match xml[start..].find(&close) {
        Some(end) => start + end + close.len(),
        None => match xml[start..].find("/>") {
            Some(end) => start + end + 2,
            None => return,
        },
    };
    // Also remove trailing newline if present
    let end_abs = if xml.as_bytes().get(end_abs) == Some(&b'\n') {
        end_abs + 1
    } else {
        end_abs
    };
    // Swallow the indentation before the element too
    let indent = start - xml[..start].trim_end_matches(' ').len();
    let start = if xml[..start - indent].ends_with('\n') {
        start - indent
    } else {
        start
    };
    xml.replace_range(start..end_abs, "");
}

/// Escape special XML characters.
fn xml_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

fn xml_unescape(s: &str) -> String {
    s.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}
