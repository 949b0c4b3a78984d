use serde::{Deserialize, Serialize};

/// User-editable descriptive metadata embedded in an image.
///
/// Free-text fields default to the empty string. `date_taken` is read from
/// the file and never produced by an edit.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metadata {
    pub title: String,
    pub description: String,
    /// Insertion order is preserved; never contains empty or whitespace-only entries.
    pub keywords: Vec<String>,
    pub date_taken: Option<String>,
    pub author: String,
    pub copyright: String,
}

/// The free-text fields an edit can target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetadataField {
    Title,
    Description,
    Author,
    Copyright,
}

impl MetadataField {
    pub const ALL: [MetadataField; 4] = [
        MetadataField::Title,
        MetadataField::Description,
        MetadataField::Author,
        MetadataField::Copyright,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::Title => "title",
            Self::Description => "description",
            Self::Author => "author",
            Self::Copyright => "copyright",
        }
    }
}

/// A single edit to a [`Metadata`] record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MetadataEdit {
    /// Replace one free-text field.
    Field(MetadataField, String),
    /// Replace the keyword list from comma-separated text.
    Keywords(String),
}

impl Metadata {
    /// Read one free-text field.
    pub fn field(&self, field: MetadataField) -> &str {
        match field {
            MetadataField::Title => &self.title,
            MetadataField::Description => &self.description,
            MetadataField::Author => &self.author,
            MetadataField::Copyright => &self.copyright,
        }
    }

    /// Replace one free-text field, leaving every other field untouched.
    pub fn set_field(&mut self, field: MetadataField, value: impl Into<String>) {
        let slot = match field {
            MetadataField::Title => &mut self.title,
            MetadataField::Description => &mut self.description,
            MetadataField::Author => &mut self.author,
            MetadataField::Copyright => &mut self.copyright,
        };
        *slot = value.into();
    }

    /// Apply an edit in place.
    pub fn apply(&mut self, edit: MetadataEdit) {
        match edit {
            MetadataEdit::Field(field, value) => self.set_field(field, value),
            MetadataEdit::Keywords(raw) => self.keywords = normalize_keywords(&raw),
        }
    }

    /// Return a copy with the edit applied.
    pub fn with(&self, edit: MetadataEdit) -> Self {
        let mut next = self.clone();
        next.apply(edit);
        next
    }

    /// Keywords in their editable text form.
    pub fn keywords_text(&self) -> String {
        self.keywords.join(", ")
    }

    /// True when no field carries a value.
    pub fn is_empty(&self) -> bool {
        self.title.is_empty()
            && self.description.is_empty()
            && self.keywords.is_empty()
            && self.date_taken.is_none()
            && self.author.is_empty()
            && self.copyright.is_empty()
    }
}

/// Split comma-separated keyword text, trimming each entry and dropping empties.
///
/// Order is preserved and duplicates are kept.
pub fn normalize_keywords(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|k| !k.is_empty())
        .map(str::to_string)
        .collect()
}

/// Immutable description of the host platform.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlatformInfo {
    pub os: String,
    pub arch: String,
    pub family: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Metadata {
        Metadata {
            title: "Harbor".into(),
            description: "Boats at dusk".into(),
            keywords: vec!["sea".into(), "boat".into()],
            date_taken: Some("2023:07:09 20:36:33".into()),
            author: "Ana".into(),
            copyright: "CC-BY".into(),
        }
    }

    // ── normalize_keywords ───────────────────────────────────────────

    #[test]
    fn keywords_drop_empties_keep_duplicates() {
        assert_eq!(normalize_keywords("a, , b ,a"), vec!["a", "b", "a"]);
    }

    #[test]
    fn keywords_whitespace_only() {
        assert!(normalize_keywords("  ,\t, ").is_empty());
        assert!(normalize_keywords("").is_empty());
    }

    #[test]
    fn keywords_inner_spaces_preserved() {
        assert_eq!(
            normalize_keywords("golden hour,  new york "),
            vec!["golden hour", "new york"]
        );
    }

    // ── edits ────────────────────────────────────────────────────────

    #[test]
    fn set_field_touches_only_that_field() {
        for field in MetadataField::ALL {
            let mut m = sample();
            m.set_field(field, "changed");
            assert_eq!(m.field(field), "changed");
            for other in MetadataField::ALL.into_iter().filter(|f| *f != field) {
                assert_eq!(m.field(other), sample().field(other));
            }
            assert_eq!(m.keywords, sample().keywords);
            assert_eq!(m.date_taken, sample().date_taken);
        }
    }

    #[test]
    fn keyword_edit_leaves_text_fields() {
        let m = sample().with(MetadataEdit::Keywords("x,y".into()));
        assert_eq!(m.keywords, vec!["x", "y"]);
        assert_eq!(m.title, "Harbor");
        assert_eq!(m.date_taken.as_deref(), Some("2023:07:09 20:36:33"));
    }

    #[test]
    fn edits_fold_in_order() {
        let edits = vec![
            MetadataEdit::Field(MetadataField::Title, "one".into()),
            MetadataEdit::Keywords("a, b".into()),
            MetadataEdit::Field(MetadataField::Title, "two".into()),
            MetadataEdit::Field(MetadataField::Author, "Bo".into()),
        ];
        let folded = edits
            .into_iter()
            .fold(Metadata::default(), |m, e| m.with(e));
        assert_eq!(folded.title, "two");
        assert_eq!(folded.author, "Bo");
        assert_eq!(folded.keywords, vec!["a", "b"]);
        assert!(folded.description.is_empty());
    }

    #[test]
    fn keywords_text_round_trips_through_normalize() {
        let m = sample();
        assert_eq!(m.keywords_text(), "sea, boat");
        assert_eq!(normalize_keywords(&m.keywords_text()), m.keywords);
    }

    #[test]
    fn default_is_empty() {
        assert!(Metadata::default().is_empty());
        assert!(!sample().is_empty());
    }

    #[test]
    fn field_names() {
        let names: Vec<_> = MetadataField::ALL.iter().map(|f| f.name()).collect();
        assert_eq!(names, ["title", "description", "author", "copyright"]);
    }
}
