//! Content schemas and the validation loop.
//!
//! Each collection is declared as a list of [`Field`] descriptors. One
//! generic loop checks a raw frontmatter record against the list, collecting
//! every violation, and the typed record is then assembled from the checked
//! values.
//!
//! ```text
//! RawEntry ──► for field in fields(kind) ──► CheckedFields ──► BlogPost / StoreItem
//!                    │
//!                    ├── required?        MissingField
//!                    ├── FieldKind::check TypeMismatch / DuplicateTag
//!                    └── ImageProbe       ImageTooSmall / ImageUnreadable
//! ```

mod date;
mod error;
mod image;
mod types;

pub use error::{ValidationError, ValidationErrors};
pub use image::{FsImageProbe, ImageProbe};
pub use types::{BlogPost, ImageAsset, StoreItem, ValidatedRecord};

use crate::content::{CollectionKind, Frontmatter, RawEntry};
use chrono::{DateTime, Utc};
use serde_yaml::Value;
use std::{
    collections::{BTreeMap, HashSet},
    path::Path,
};

/// Minimum `heroImage` width of a blog post.
pub const BLOG_HERO_MIN_WIDTH: u32 = 1080;

/// Minimum `heroImage` width of a store item.
pub const STORE_HERO_MIN_WIDTH: u32 = 100;

/// Value shape and refinement of a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    NonEmptyText,
    /// Coerced from any accepted date representation.
    Date,
    /// Sequence of text without duplicates (case-sensitive).
    UniqueTags,
    /// Image reference whose intrinsic width is at least `min_width`.
    Image { min_width: u32 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Field {
    pub name: &'static str,
    pub kind: FieldKind,
    pub required: bool,
}

impl Field {
    const fn required(name: &'static str, kind: FieldKind) -> Self {
        Self {
            name,
            kind,
            required: true,
        }
    }

    const fn optional(name: &'static str, kind: FieldKind) -> Self {
        Self {
            name,
            kind,
            required: false,
        }
    }
}

pub const BLOG_FIELDS: &[Field] = &[
    Field::required("title", FieldKind::NonEmptyText),
    Field::required("description", FieldKind::Text),
    Field::required("pubDate", FieldKind::Date),
    Field::optional("updatedDate", FieldKind::Text),
    Field::optional("badge", FieldKind::Text),
    Field::optional("tags", FieldKind::UniqueTags),
    Field::required(
        "heroImage",
        FieldKind::Image {
            min_width: BLOG_HERO_MIN_WIDTH,
        },
    ),
];

pub const STORE_FIELDS: &[Field] = &[
    Field::required("title", FieldKind::Text),
    Field::required("description", FieldKind::Text),
    Field::required("custom_link_label", FieldKind::Text),
    Field::optional("custom_link", FieldKind::Text),
    Field::required("updatedDate", FieldKind::Date),
    Field::optional("pricing", FieldKind::Text),
    Field::optional("oldPricing", FieldKind::Text),
    Field::optional("badge", FieldKind::Text),
    Field::optional("checkoutUrl", FieldKind::Text),
    Field::required(
        "heroImage",
        FieldKind::Image {
            min_width: STORE_HERO_MIN_WIDTH,
        },
    ),
];

/// Field list of a collection.
pub const fn fields(kind: CollectionKind) -> &'static [Field] {
    match kind {
        CollectionKind::Blog => BLOG_FIELDS,
        CollectionKind::Store => STORE_FIELDS,
    }
}

/// A value that passed its field check.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Text(String),
    Date(DateTime<Utc>),
    Tags(Vec<String>),
    Image(ImageAsset),
}

/// Checked values keyed by field name, consumed by [`Record::from_checked`].
#[derive(Debug, Default)]
pub struct CheckedFields(BTreeMap<&'static str, FieldValue>);

impl CheckedFields {
    pub fn text(&mut self, name: &str) -> Option<String> {
        match self.0.remove(name)? {
            FieldValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn date(&mut self, name: &str) -> Option<DateTime<Utc>> {
        match self.0.remove(name)? {
            FieldValue::Date(d) => Some(d),
            _ => None,
        }
    }

    pub fn tags(&mut self, name: &str) -> Option<Vec<String>> {
        match self.0.remove(name)? {
            FieldValue::Tags(tags) => Some(tags),
            _ => None,
        }
    }

    pub fn image(&mut self, name: &str) -> Option<ImageAsset> {
        match self.0.remove(name)? {
            FieldValue::Image(image) => Some(image),
            _ => None,
        }
    }
}

/// A typed record assembled from checked fields.
pub trait Record: Sized {
    const KIND: CollectionKind;

    /// `extra` holds the frontmatter keys the schema does not declare.
    fn from_checked(fields: &mut CheckedFields, extra: Frontmatter) -> Result<Self, ValidationError>;

    fn into_validated(self) -> ValidatedRecord;
}

fn missing(field: &str) -> ValidationError {
    ValidationError::MissingField {
        field: field.to_owned(),
    }
}

impl Record for BlogPost {
    const KIND: CollectionKind = CollectionKind::Blog;

    fn from_checked(f: &mut CheckedFields, extra: Frontmatter) -> Result<Self, ValidationError> {
        Ok(Self {
            title: f.text("title").ok_or_else(|| missing("title"))?,
            description: f.text("description").ok_or_else(|| missing("description"))?,
            pub_date: f.date("pubDate").ok_or_else(|| missing("pubDate"))?,
            updated_date: f.text("updatedDate"),
            badge: f.text("badge"),
            tags: f.tags("tags"),
            hero_image: f.image("heroImage").ok_or_else(|| missing("heroImage"))?,
            extra,
        })
    }

    fn into_validated(self) -> ValidatedRecord {
        ValidatedRecord::Blog(self)
    }
}

impl Record for StoreItem {
    const KIND: CollectionKind = CollectionKind::Store;

    fn from_checked(f: &mut CheckedFields, _extra: Frontmatter) -> Result<Self, ValidationError> {
        Ok(Self {
            title: f.text("title").ok_or_else(|| missing("title"))?,
            description: f.text("description").ok_or_else(|| missing("description"))?,
            custom_link_label: f
                .text("custom_link_label")
                .ok_or_else(|| missing("custom_link_label"))?,
            custom_link: f.text("custom_link"),
            updated_date: f.date("updatedDate").ok_or_else(|| missing("updatedDate"))?,
            pricing: f.text("pricing"),
            old_pricing: f.text("oldPricing"),
            badge: f.text("badge"),
            checkout_url: f.text("checkoutUrl"),
            hero_image: f.image("heroImage").ok_or_else(|| missing("heroImage"))?,
        })
    }

    fn into_validated(self) -> ValidatedRecord {
        ValidatedRecord::Store(self)
    }
}

/// Validate a raw entry against the schema of `kind`.
pub fn validate(
    kind: CollectionKind,
    entry: &RawEntry,
    probe: &dyn ImageProbe,
) -> Result<ValidatedRecord, ValidationErrors> {
    match kind {
        CollectionKind::Blog => validate_as::<BlogPost>(entry, probe).map(Record::into_validated),
        CollectionKind::Store => validate_as::<StoreItem>(entry, probe).map(Record::into_validated),
    }
}

/// Validate a raw entry into a typed record.
///
/// Every field is checked before returning, so the error lists all
/// violations of the record, not only the first one.
pub fn validate_as<T: Record>(
    entry: &RawEntry,
    probe: &dyn ImageProbe,
) -> Result<T, ValidationErrors> {
    let schema = fields(T::KIND);
    let mut checked = CheckedFields::default();
    let mut errors = Vec::new();

    for field in schema {
        match entry.data.get(field.name) {
            None if field.required => errors.push(missing(field.name)),
            None => {}
            Some(value) => match field.kind.check(field.name, value, &entry.path, probe) {
                Ok(value) => {
                    checked.0.insert(field.name, value);
                }
                Err(mut errs) => errors.append(&mut errs),
            },
        }
    }

    if !errors.is_empty() {
        return Err(ValidationErrors(errors));
    }

    let extra = entry
        .data
        .iter()
        .filter(|(key, _)| !schema.iter().any(|field| field.name == key.as_str()))
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect();

    T::from_checked(&mut checked, extra).map_err(|err| ValidationErrors(vec![err]))
}

impl FieldKind {
    fn check(
        self,
        field: &str,
        value: &Value,
        origin: &Path,
        probe: &dyn ImageProbe,
    ) -> Result<FieldValue, Vec<ValidationError>> {
        match self {
            Self::Text => expect_str(field, value, "text")
                .map(|s| FieldValue::Text(s.to_owned()))
                .map_err(|err| vec![err]),
            Self::NonEmptyText => {
                let s = expect_str(field, value, "non-empty text").map_err(|err| vec![err])?;
                if s.is_empty() {
                    return Err(vec![mismatch(field, "non-empty text", value)]);
                }
                Ok(FieldValue::Text(s.to_owned()))
            }
            Self::Date => date::coerce(value)
                .map(FieldValue::Date)
                .ok_or_else(|| vec![mismatch(field, "date", value)]),
            Self::UniqueTags => check_tags(field, value).map(FieldValue::Tags),
            Self::Image { min_width } => check_image(field, value, min_width, origin, probe)
                .map(FieldValue::Image)
                .map_err(|err| vec![err]),
        }
    }
}

fn check_tags(field: &str, value: &Value) -> Result<Vec<String>, Vec<ValidationError>> {
    let Value::Sequence(items) = value else {
        return Err(vec![mismatch(field, "list of text", value)]);
    };

    let mut errors = Vec::new();
    let mut tags = Vec::with_capacity(items.len());
    for (i, item) in items.iter().enumerate() {
        match item {
            Value::String(tag) => tags.push(tag.clone()),
            other => errors.push(mismatch(&format!("{field}[{i}]"), "text", other)),
        }
    }

    let mut seen = HashSet::with_capacity(tags.len());
    if let Some(tag) = tags.iter().find(|tag| !seen.insert(tag.as_str())) {
        errors.push(ValidationError::DuplicateTag {
            field: field.to_owned(),
            tag: tag.clone(),
        });
    }

    if errors.is_empty() { Ok(tags) } else { Err(errors) }
}

fn check_image(
    field: &str,
    value: &Value,
    min_width: u32,
    origin: &Path,
    probe: &dyn ImageProbe,
) -> Result<ImageAsset, ValidationError> {
    let src = expect_str(field, value, "image reference")?;
    let asset = probe
        .probe(src, origin)
        .map_err(|err| ValidationError::ImageUnreadable {
            field: field.to_owned(),
            src: src.to_owned(),
            reason: format!("{err:#}"),
        })?;

    if asset.width < min_width {
        return Err(ValidationError::ImageTooSmall {
            field: field.to_owned(),
            required: min_width,
            actual: asset.width,
        });
    }
    Ok(asset)
}

fn expect_str<'a>(
    field: &str,
    value: &'a Value,
    expected: &'static str,
) -> Result<&'a str, ValidationError> {
    value.as_str().ok_or_else(|| mismatch(field, expected, value))
}

fn mismatch(field: &str, expected: &'static str, found: &Value) -> ValidationError {
    ValidationError::TypeMismatch {
        field: field.to_owned(),
        expected,
        found: describe(found),
    }
}

/// Short description of a YAML value for error messages.
fn describe(value: &Value) -> String {
    match value {
        Value::Null => "null".into(),
        Value::Bool(b) => format!("boolean `{b}`"),
        Value::Number(n) => format!("number `{n}`"),
        Value::String(s) if s.is_empty() => "empty text".into(),
        Value::String(s) => format!("`{s}`"),
        Value::Sequence(_) => "list".into(),
        Value::Mapping(_) => "mapping".into(),
        Value::Tagged(tagged) => format!("tagged value `{}`", tagged.tag),
    }
}
