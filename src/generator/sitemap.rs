//! Sitemap generation.
//!
//! Generates a sitemap.xml file listing the site index, both collection
//! indexes, every validated entry and the configured extra pages.
//!
//! # Sitemap Format
//!
//! ```xml
//! <?xml version="1.0" encoding="UTF-8"?>
//! <urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">
//!   <url>
//!     <loc>https://asjordi.dev/blog/hello-world/</loc>
//!     <lastmod>2022-07-08</lastmod>
//!   </url>
//! </urlset>
//! ```

use crate::{
    config::SiteConfig,
    content::{CollectionKind, Collections},
    log,
};
use anyhow::{Context, Result, anyhow};
use chrono::{DateTime, Utc};
use std::{collections::HashSet, fs, path::Path};

// ============================================================================
// Constants
// ============================================================================

/// XML namespace for sitemap
const SITEMAP_NS: &str = "http://www.sitemaps.org/schemas/sitemap/0.9";

// ============================================================================
// Public API
// ============================================================================

/// Build sitemap if enabled in config.
pub fn build_sitemap(config: &SiteConfig, collections: &Collections) -> Result<()> {
    if config.build.sitemap.enable {
        let site_url = config
            .base
            .url
            .as_deref()
            .ok_or_else(|| anyhow!("[base.url] is required for sitemap generation"))?;

        let sitemap = Sitemap::from_collections(
            collections,
            site_url,
            &config.build.sitemap.exclude,
            &config.build.sitemap.pages,
        );
        sitemap.write(&config.sitemap_path())?;
    }
    Ok(())
}

// ============================================================================
// Sitemap Implementation
// ============================================================================

/// Sitemap data structure
struct Sitemap {
    /// List of URL entries
    urls: Vec<UrlEntry>,
}

/// Single URL entry in the sitemap
struct UrlEntry {
    /// Full URL location
    loc: String,
    /// Last modification date (optional, YYYY-MM-DD format)
    lastmod: Option<String>,
}

impl Sitemap {
    /// Collect routes in page order, dropping excluded prefixes and repeats.
    fn from_collections(
        collections: &Collections,
        site_url: &str,
        exclude: &[String],
        pages: &[String],
    ) -> Self {
        let blog = collections.blog.iter().map(|post| {
            (
                CollectionKind::Blog.permalink(&post.slug),
                Some(post.data.last_modified()),
            )
        });
        let store = collections.store.iter().map(|item| {
            (
                CollectionKind::Store.permalink(&item.slug),
                Some(item.data.updated_date),
            )
        });

        let mut routes: Vec<(String, Option<DateTime<Utc>>)> = vec![
            ("/".into(), None),
            (format!("{}/", CollectionKind::Blog.route()), None),
        ];
        routes.extend(blog);
        routes.push((format!("{}/", CollectionKind::Store.route()), None));
        routes.extend(store);
        routes.extend(pages.iter().map(|page| (page.clone(), None)));

        let base = site_url.trim_end_matches('/');
        let mut seen = HashSet::new();
        let urls = routes
            .into_iter()
            .filter(|(route, _)| !is_excluded(route, exclude))
            .filter(|(route, _)| seen.insert(route.clone()))
            .map(|(route, lastmod)| UrlEntry {
                loc: format!("{base}{route}"),
                lastmod: lastmod.map(|date| date.format("%Y-%m-%d").to_string()),
            })
            .collect();

        Self { urls }
    }

    /// Generate sitemap XML string.
    fn into_xml(self) -> String {
        let mut xml = String::with_capacity(4096);

        xml.push_str(r#"<?xml version="1.0" encoding="UTF-8"?>"#);
        xml.push('\n');
        xml.push_str(&format!(r#"<urlset xmlns="{SITEMAP_NS}">"#));
        xml.push('\n');

        for entry in self.urls {
            xml.push_str("  <url>\n");
            xml.push_str(&format!("    <loc>{}</loc>\n", escape_xml(&entry.loc)));
            if let Some(lastmod) = entry.lastmod {
                xml.push_str(&format!("    <lastmod>{lastmod}</lastmod>\n"));
            }
            xml.push_str("  </url>\n");
        }

        xml.push_str("</urlset>\n");
        xml
    }

    /// Write sitemap to output file.
    fn write(self, sitemap_path: &Path) -> Result<()> {
        let count = self.urls.len();
        let xml = self.into_xml();

        if let Some(parent) = sitemap_path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        fs::write(sitemap_path, xml)
            .with_context(|| format!("Failed to write sitemap to {}", sitemap_path.display()))?;

        log!(
            "sitemap";
            "{} ({count} urls)",
            sitemap_path.file_name().unwrap_or_default().to_string_lossy()
        );
        Ok(())
    }
}

// ============================================================================
// Helper Functions
// ============================================================================

/// Whether `route` falls under any excluded prefix (`/tienda` drops `/tienda/x/`).
fn is_excluded(route: &str, exclude: &[String]) -> bool {
    exclude.iter().any(|prefix| route.starts_with(prefix.as_str()))
}

/// Escape special XML characters.
fn escape_xml(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

// ============================================================================
// Tests
// ============================================================================
