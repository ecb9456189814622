//! Validated record types.

use crate::content::Frontmatter;
use chrono::{DateTime, Utc};
use std::path::PathBuf;

/// A resolved image reference with its intrinsic dimensions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageAsset {
    /// Reference as written in frontmatter.
    pub src: String,
    /// Resolved file on disk.
    pub path: PathBuf,
    pub width: u32,
    pub height: u32,
}

/// A validated `blog` entry.
///
/// Optional fields are `None` when absent, which is distinct from `Some("")`.
#[derive(Debug, Clone, PartialEq)]
pub struct BlogPost {
    pub title: String,
    pub description: String,
    pub pub_date: DateTime<Utc>,
    pub updated_date: Option<String>,
    pub badge: Option<String>,
    pub tags: Option<Vec<String>>,
    pub hero_image: ImageAsset,
    /// Frontmatter keys not declared by the schema, kept verbatim.
    pub extra: Frontmatter,
}

impl BlogPost {
    pub fn tags(&self) -> &[String] {
        self.tags.as_deref().unwrap_or_default()
    }

    /// `updatedDate` when it reads as a date, else `pubDate`.
    pub fn last_modified(&self) -> DateTime<Utc> {
        self.updated_date
            .as_deref()
            .and_then(super::date::parse)
            .unwrap_or(self.pub_date)
    }
}

/// A validated `store` entry: display metadata for one product.
#[derive(Debug, Clone, PartialEq)]
pub struct StoreItem {
    pub title: String,
    pub description: String,
    pub custom_link_label: String,
    pub custom_link: Option<String>,
    pub updated_date: DateTime<Utc>,
    /// Free-form price text (e.g. "$199 MXN").
    pub pricing: Option<String>,
    pub old_pricing: Option<String>,
    pub badge: Option<String>,
    pub checkout_url: Option<String>,
    pub hero_image: ImageAsset,
}

/// Output of [`super::validate`].
#[derive(Debug, Clone, PartialEq)]
pub enum ValidatedRecord {
    Blog(BlogPost),
    Store(StoreItem),
}
