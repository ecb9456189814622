//! rss feed generation.
//!
//! Maps validated blog posts into a [`FeedDocument`], one entry per post in
//! store order, and renders it as RSS 2.0.

use super::markup::{HtmlSanitizer, MarkdownRenderer, MarkupError, Renderer, Sanitizer};
use crate::{
    config::SiteConfig,
    content::{CollectionKind, Entry},
    log,
    schema::BlogPost,
};
use anyhow::{Context, Result, anyhow};
use chrono::{DateTime, Utc};
use regex::Regex;
use rss::{
    CategoryBuilder, ChannelBuilder, GuidBuilder, ItemBuilder,
    extension::{ExtensionBuilder, ExtensionMap},
    validation::Validate,
};
use serde_yaml::Value;
use std::{collections::BTreeMap, fs, sync::LazyLock};
use thiserror::Error;

/// Entry fields computed by the generator; post fields with these names are
/// never passed through.
pub const RESERVED_FIELDS: [&str; 4] = ["title", "pubDate", "description", "link"];

const GENERATOR: &str = "bitacora";
const CONTENT_NAMESPACE: &str = "http://purl.org/rss/1.0/modules/content/";
const CUSTOM_PREFIX: &str = "custom";

// ============================================================================
// Public API
// ============================================================================

/// Build rss feed if enabled in config.
pub fn build_rss(config: &SiteConfig, posts: &[Entry<BlogPost>]) -> Result<()> {
    if !config.build.rss.enable {
        return Ok(());
    }

    let site = SiteMeta::from_config(config)?;
    let pipeline = config.build.rss.content.then(ContentPipeline::default);
    let feed = generate_feed(posts, &site, pipeline.as_ref())?;
    let xml = feed.to_xml()?;

    let rss_path = config.rss_path();
    if let Some(parent) = rss_path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    fs::write(&rss_path, xml).with_context(|| format!("Failed to write {}", rss_path.display()))?;

    log!(
        "rss";
        "{} ({} entries)",
        rss_path.file_name().unwrap_or_default().to_string_lossy(),
        feed.entries.len()
    );
    Ok(())
}

/// Map posts to feed entries, preserving their order.
///
/// With a `pipeline`, each body is rendered then sanitized and embedded as
/// entry content. Any post failing either step fails the whole feed.
pub fn generate_feed(
    posts: &[Entry<BlogPost>],
    site: &SiteMeta,
    pipeline: Option<&ContentPipeline>,
) -> Result<FeedDocument, FeedError> {
    let entries = posts
        .iter()
        .map(|post| FeedEntry::from_post(post, pipeline))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(FeedDocument {
        site: site.clone(),
        entries,
    })
}

// ============================================================================
// Types
// ============================================================================

/// Site constants shared by every entry of the feed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SiteMeta {
    pub title: String,
    pub description: String,
    /// Absolute site URL, e.g. `https://asjordi.dev`.
    pub url: String,
    pub language: String,
    /// `email (Name)`, when an email is configured.
    pub managing_editor: Option<String>,
}

impl SiteMeta {
    pub fn from_config(config: &SiteConfig) -> Result<Self> {
        let url = config
            .base
            .url
            .clone()
            .ok_or_else(|| anyhow!("[base.url] is required for rss generation"))?;

        Ok(Self {
            title: config.base.title.clone(),
            description: config.base.description.clone(),
            url,
            language: config.base.language.clone(),
            managing_editor: normalize_managing_editor(&config.base.author, &config.base.email),
        })
    }

    /// Resolve a site-relative link against the site URL.
    fn absolute(&self, link: &str) -> String {
        format!("{}{link}", self.url.trim_end_matches('/'))
    }

    /// Namespace URI of the `custom:` extension elements, owned by the site.
    pub fn custom_namespace(&self) -> String {
        self.absolute("/ns/custom")
    }
}

/// Markdown renderer and HTML sanitizer applied to post bodies.
pub struct ContentPipeline {
    renderer: Box<dyn Renderer>,
    sanitizer: Box<dyn Sanitizer>,
}

impl ContentPipeline {
    pub fn new(renderer: impl Renderer + 'static, sanitizer: impl Sanitizer + 'static) -> Self {
        Self {
            renderer: Box::new(renderer),
            sanitizer: Box::new(sanitizer),
        }
    }

    fn run(&self, slug: &str, markdown: &str) -> Result<String, FeedError> {
        let html = self
            .renderer
            .render(markdown)
            .map_err(|source| FeedError::RenderFailure {
                slug: slug.to_owned(),
                source,
            })?;

        self.sanitizer
            .sanitize(&html)
            .map_err(|source| FeedError::SanitizeFailure {
                slug: slug.to_owned(),
                source,
            })
    }
}

impl Default for ContentPipeline {
    fn default() -> Self {
        Self::new(MarkdownRenderer, HtmlSanitizer)
    }
}

/// One post of the feed.
#[derive(Debug, Clone, PartialEq)]
pub struct FeedEntry {
    pub title: String,
    pub pub_date: DateTime<Utc>,
    pub description: String,
    /// Site-relative link, `/blog/<slug>/`.
    pub link: String,
    pub categories: Vec<String>,
    /// Sanitized HTML of the body.
    pub content: Option<String>,
    /// Scalar post fields outside the schema, rendered under `custom:`.
    pub custom: BTreeMap<String, String>,
}

impl FeedEntry {
    fn from_post(
        post: &Entry<BlogPost>,
        pipeline: Option<&ContentPipeline>,
    ) -> Result<Self, FeedError> {
        let content = pipeline
            .map(|pipeline| pipeline.run(&post.slug, &post.body))
            .transpose()?;

        Ok(Self {
            title: post.data.title.clone(),
            pub_date: post.data.pub_date,
            description: post.data.description.clone(),
            link: CollectionKind::Blog.permalink(&post.slug),
            categories: post.data.tags().to_vec(),
            content,
            custom: passthrough_fields(&post.data),
        })
    }
}

/// A generated feed, ready to render.
#[derive(Debug, Clone, PartialEq)]
pub struct FeedDocument {
    pub site: SiteMeta,
    pub entries: Vec<FeedEntry>,
}

impl FeedDocument {
    /// Render as RSS 2.0 XML.
    pub fn to_xml(&self) -> Result<String, FeedError> {
        let items: Vec<_> = self.entries.iter().map(|entry| self.to_item(entry)).collect();

        let mut namespaces = BTreeMap::new();
        if self.entries.iter().any(|entry| entry.content.is_some()) {
            namespaces.insert("content".to_owned(), CONTENT_NAMESPACE.to_owned());
        }
        if self.entries.iter().any(|entry| !entry.custom.is_empty()) {
            namespaces.insert(CUSTOM_PREFIX.to_owned(), self.site.custom_namespace());
        }

        let channel = ChannelBuilder::default()
            .title(&self.site.title)
            .link(&self.site.url)
            .description(&self.site.description)
            .language(self.site.language.clone())
            .managing_editor(self.site.managing_editor.clone())
            .generator(GENERATOR.to_string())
            .namespaces(namespaces)
            .items(items)
            .build();

        channel
            .validate()
            .map_err(|e| FeedError::Invalid(e.to_string()))?;
        Ok(channel.to_string())
    }

    fn to_item(&self, entry: &FeedEntry) -> rss::Item {
        let link = self.site.absolute(&entry.link);
        let categories: Vec<_> = entry
            .categories
            .iter()
            .map(|tag| CategoryBuilder::default().name(tag.clone()).build())
            .collect();

        ItemBuilder::default()
            .title(entry.title.clone())
            .link(Some(link.clone()))
            .guid(GuidBuilder::default().permalink(true).value(link).build())
            .description(entry.description.clone())
            .pub_date(entry.pub_date.to_rfc2822())
            .categories(categories)
            .content(entry.content.clone())
            .extensions(custom_extensions(&entry.custom))
            .build()
    }
}

/// Errors that abort feed generation.
#[derive(Debug, Error)]
pub enum FeedError {
    #[error("failed to render `{slug}`: {source}")]
    RenderFailure { slug: String, source: MarkupError },

    #[error("failed to sanitize `{slug}`: {source}")]
    SanitizeFailure { slug: String, source: MarkupError },

    #[error("rss validation failed: {0}")]
    Invalid(String),
}

// ============================================================================
// Helper Functions
// ============================================================================

/// Undeclared post fields that can travel as `custom:<name>` elements.
///
/// Reserved names are skipped so computed values win. Only scalar values
/// whose key is a valid XML name are kept.
fn passthrough_fields(post: &BlogPost) -> BTreeMap<String, String> {
    static RE_XML_NAME: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_.-]*$").unwrap());

    post.extra
        .iter()
        .filter(|(key, _)| !RESERVED_FIELDS.contains(&key.as_str()))
        .filter(|(key, _)| RE_XML_NAME.is_match(key))
        .filter_map(|(key, value)| {
            let value = match value {
                Value::String(s) => s.clone(),
                Value::Number(n) => n.to_string(),
                Value::Bool(b) => b.to_string(),
                _ => return None,
            };
            Some((key.clone(), value))
        })
        .collect()
}

fn custom_extensions(custom: &BTreeMap<String, String>) -> ExtensionMap {
    let mut map = ExtensionMap::new();
    if custom.is_empty() {
        return map;
    }

    let elements = custom
        .iter()
        .map(|(name, value)| {
            let extension = ExtensionBuilder::default()
                .name(format!("{CUSTOM_PREFIX}:{name}"))
                .value(Some(value.clone()))
                .build();
            (name.clone(), vec![extension])
        })
        .collect();
    map.insert(CUSTOM_PREFIX.to_owned(), elements);
    map
}

/// Normalize the managing editor to rss format: "email@example.com (Name)"
///
/// Priority:
/// 1. `author` if already in valid format
/// 2. `email (author)` when both are set
/// 3. bare `email`
fn normalize_managing_editor(author: &str, email: &str) -> Option<String> {
    static RE_VALID_AUTHOR: LazyLock<Regex> = LazyLock::new(|| {
        Regex::new(r"^[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}[ \t]*\([^)]+\)$").unwrap()
    });

    if RE_VALID_AUTHOR.is_match(author) {
        return Some(author.to_owned());
    }

    match (email.is_empty(), author.is_empty()) {
        (true, _) => None,
        (false, true) => Some(email.to_owned()),
        (false, false) => Some(format!("{email} ({author})")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::ImageAsset;
    use chrono::TimeZone;
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn site() -> SiteMeta {
        SiteMeta {
            title: "Jordi".into(),
            description: "Blog personal".into(),
            url: "https://asjordi.dev/".into(),
            language: "es-MX".into(),
            managing_editor: Some("hola@asjordi.dev (Jordi)".into()),
        }
    }

    fn post(slug: &str, body: &str) -> Entry<BlogPost> {
        Entry {
            id: format!("{slug}.md"),
            slug: slug.into(),
            path: PathBuf::from(format!("src/content/blog/{slug}.md")),
            body: body.into(),
            data: BlogPost {
                title: format!("Post {slug}"),
                description: format!("About {slug}"),
                pub_date: Utc.with_ymd_and_hms(2022, 7, 8, 0, 0, 0).unwrap(),
                updated_date: None,
                badge: None,
                tags: None,
                hero_image: ImageAsset {
                    src: "./hero.png".into(),
                    path: PathBuf::from("src/content/blog/hero.png"),
                    width: 1200,
                    height: 675,
                },
                extra: Default::default(),
            },
        }
    }

    fn extra(yaml: &str) -> crate::content::Frontmatter {
        serde_yaml::from_str(yaml).unwrap()
    }

    struct FailingRenderer;

    impl Renderer for FailingRenderer {
        fn render(&self, _: &str) -> Result<String, MarkupError> {
            Err(MarkupError("unbalanced fence".into()))
        }
    }

    struct LeakySanitizer;

    impl Sanitizer for LeakySanitizer {
        fn sanitize(&self, _: &str) -> Result<String, MarkupError> {
            Err(MarkupError("script element survived sanitizing".into()))
        }
    }

    #[test]
    fn test_entry_link_from_slug() {
        let feed = generate_feed(&[post("hello-world", "")], &site(), None).unwrap();
        assert_eq!(feed.entries[0].link, "/blog/hello-world/");
        assert_eq!(feed.entries[0].title, "Post hello-world");
        assert_eq!(feed.entries[0].description, "About hello-world");
        assert_eq!(feed.entries[0].content, None);
    }

    #[test]
    fn test_entries_keep_store_order() {
        let posts = [post("p3", ""), post("p1", ""), post("p2", "")];
        let feed = generate_feed(&posts, &site(), None).unwrap();

        let links: Vec<_> = feed.entries.iter().map(|e| e.link.as_str()).collect();
        assert_eq!(links, ["/blog/p3/", "/blog/p1/", "/blog/p2/"]);
    }

    #[test]
    fn test_categories_from_tags() {
        let mut post = post("streams", "");
        post.data.tags = Some(vec!["java".into(), "streams".into()]);

        let feed = generate_feed(&[post], &site(), None).unwrap();
        assert_eq!(feed.entries[0].categories, ["java", "streams"]);
    }

    #[test]
    fn test_content_is_sanitized() {
        let posts = [post("xss", "Hola\n\n<script>alert(1)</script>\n")];
        let pipeline = ContentPipeline::default();
        let feed = generate_feed(&posts, &site(), Some(&pipeline)).unwrap();

        let content = feed.entries[0].content.as_deref().unwrap();
        assert!(content.contains("<p>Hola</p>"));
        assert!(!content.contains("<script"));
    }

    #[test]
    fn test_render_failure_is_fatal() {
        let posts = [post("ok", "fine"), post("broken", "```")];
        let pipeline = ContentPipeline::new(FailingRenderer, HtmlSanitizer);

        let err = generate_feed(&posts, &site(), Some(&pipeline)).unwrap_err();
        assert!(matches!(&err, FeedError::RenderFailure { slug, .. } if slug == "ok"));
        assert!(err.to_string().contains("unbalanced fence"));
    }

    #[test]
    fn test_sanitize_failure_is_fatal() {
        let pipeline = ContentPipeline::new(MarkdownRenderer, LeakySanitizer);
        let err = generate_feed(&[post("xss", "x")], &site(), Some(&pipeline)).unwrap_err();
        assert!(matches!(err, FeedError::SanitizeFailure { .. }));
    }

    #[test]
    fn test_passthrough_skips_reserved_and_non_scalar() {
        let mut post = post("custom", "");
        post.data.extra = extra(
            "link: https://elsewhere.dev\ncustomData: hola\nreadingTime: 5\ndraft: false\nseries: [a, b]\nbad key: x",
        );

        let feed = generate_feed(&[post], &site(), None).unwrap();
        let entry = &feed.entries[0];

        assert_eq!(entry.link, "/blog/custom/");
        assert_eq!(
            entry.custom,
            BTreeMap::from([
                ("customData".to_string(), "hola".to_string()),
                ("draft".to_string(), "false".to_string()),
                ("readingTime".to_string(), "5".to_string()),
            ])
        );
    }

    #[test]
    fn test_to_xml() {
        let mut first = post("hello-world", "**Hola**");
        first.data.tags = Some(vec!["java".into()]);
        first.data.extra = extra("customData: hola");

        let pipeline = ContentPipeline::default();
        let xml = generate_feed(&[first], &site(), Some(&pipeline))
            .unwrap()
            .to_xml()
            .unwrap();

        assert!(xml.contains("<link>https://asjordi.dev/blog/hello-world/</link>"));
        assert!(xml.contains("<category>java</category>"));
        assert!(xml.contains("Jul 2022 00:00:00 +0000</pubDate>"));
        assert!(xml.contains("<generator>bitacora</generator>"));
        assert!(xml.contains("<managingEditor>hola@asjordi.dev (Jordi)</managingEditor>"));
        assert!(xml.contains("<content:encoded>"));
        assert!(xml.contains(CONTENT_NAMESPACE));
        assert!(xml.contains(r#"xmlns:custom="https://asjordi.dev/ns/custom""#));
        assert!(xml.contains("<custom:customData>hola</custom:customData>"));
    }

    #[test]
    fn test_to_xml_rejects_invalid_site_url() {
        let site = SiteMeta {
            url: "not a url".into(),
            ..site()
        };
        let feed = generate_feed(&[post("a", "")], &site, None).unwrap();
        assert!(matches!(feed.to_xml(), Err(FeedError::Invalid(_))));
    }

    #[test]
    fn test_custom_namespace_follows_site_url() {
        let site = SiteMeta {
            url: "https://preview.asjordi.dev/".into(),
            ..site()
        };
        assert_eq!(site.custom_namespace(), "https://preview.asjordi.dev/ns/custom");

        let mut post = post("custom", "");
        post.data.extra = extra("customData: hola");
        let xml = generate_feed(&[post], &site, None).unwrap().to_xml().unwrap();
        assert!(xml.contains("https://preview.asjordi.dev/ns/custom"));
        assert!(!xml.contains("https://asjordi.dev/ns/custom"));
    }

    #[test]
    fn test_normalize_managing_editor() {
        assert_eq!(
            normalize_managing_editor("hola@asjordi.dev (Jordi)", ""),
            Some("hola@asjordi.dev (Jordi)".to_string())
        );
        assert_eq!(
            normalize_managing_editor("Jordi", "hola@asjordi.dev"),
            Some("hola@asjordi.dev (Jordi)".to_string())
        );
        assert_eq!(
            normalize_managing_editor("", "hola@asjordi.dev"),
            Some("hola@asjordi.dev".to_string())
        );
        assert_eq!(normalize_managing_editor("Jordi", ""), None);
    }

    #[test]
    fn test_build_rss_writes_file() {
        let dir = TempDir::new().unwrap();
        let mut config = SiteConfig::default();
        config.base.title = "Jordi".into();
        config.base.url = Some("https://asjordi.dev".into());
        config.build.output = dir.path().join("dist");

        build_rss(&config, &[post("hello-world", "Hola")]).unwrap();

        let xml = fs::read_to_string(dir.path().join("dist/rss.xml")).unwrap();
        assert!(xml.contains("https://asjordi.dev/blog/hello-world/"));
    }

    #[test]
    fn test_build_rss_disabled() {
        let dir = TempDir::new().unwrap();
        let mut config = SiteConfig::default();
        config.build.rss.enable = false;
        config.build.output = dir.path().to_path_buf();

        build_rss(&config, &[post("a", "")]).unwrap();
        assert!(!dir.path().join("rss.xml").exists());
    }
}
