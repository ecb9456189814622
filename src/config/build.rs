//! `[build]` section configuration.
//!
//! Paths plus the rss and sitemap generation switches.

use super::defaults;
use educe::Educe;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// `[build]` section in bitacora.toml.
///
/// # Example
/// ```toml
/// [build]
/// content = "src/content"  # Collection directories live here
/// public = "public"        # Root for `/`-prefixed image references
/// output = "dist"
///
/// [build.rss]
/// content = false
///
/// [build.sitemap]
/// exclude = ["/tienda", "/services"]
/// ```
#[derive(Debug, Clone, Educe, Serialize, Deserialize)]
#[educe(Default)]
#[serde(default, deny_unknown_fields)]
pub struct BuildConfig {
    /// Project root directory (usually set via CLI `--root`).
    #[serde(default = "defaults::build::root")]
    #[educe(Default = defaults::build::root())]
    pub root: Option<PathBuf>,

    /// Directory holding one sub-directory per collection (`blog/`, `store/`).
    #[serde(default = "defaults::build::content")]
    #[educe(Default = defaults::build::content())]
    pub content: PathBuf,

    /// Static files directory; `/hero.png` references resolve here.
    #[serde(default = "defaults::build::public")]
    #[educe(Default = defaults::build::public())]
    pub public: PathBuf,

    /// Directory the feed and sitemap are written to.
    #[serde(default = "defaults::build::output")]
    #[educe(Default = defaults::build::output())]
    pub output: PathBuf,

    #[serde(default)]
    pub rss: RssConfig,

    #[serde(default)]
    pub sitemap: SitemapConfig,
}

/// `[build.rss]` section - feed generation.
#[derive(Debug, Clone, Educe, Serialize, Deserialize)]
#[educe(Default)]
#[serde(deny_unknown_fields)]
pub struct RssConfig {
    #[serde(default = "defaults::r#true")]
    #[educe(Default = true)]
    pub enable: bool,

    /// Output path, relative to `[build] output`.
    #[serde(default = "defaults::build::rss::path")]
    #[educe(Default = defaults::build::rss::path())]
    pub path: PathBuf,

    /// Embed each post body (rendered and sanitized) as `content:encoded`.
    #[serde(default = "defaults::r#true")]
    #[educe(Default = true)]
    pub content: bool,
}

/// `[build.sitemap]` section.
#[derive(Debug, Clone, Educe, Serialize, Deserialize)]
#[educe(Default)]
#[serde(deny_unknown_fields)]
pub struct SitemapConfig {
    #[serde(default = "defaults::r#true")]
    #[educe(Default = true)]
    pub enable: bool,

    /// Output path, relative to `[build] output`.
    #[serde(default = "defaults::build::sitemap::path")]
    #[educe(Default = defaults::build::sitemap::path())]
    pub path: PathBuf,

    /// URL path prefixes left out of the sitemap.
    #[serde(default = "defaults::build::sitemap::exclude")]
    #[educe(Default = defaults::build::sitemap::exclude())]
    pub exclude: Vec<String>,

    /// Extra routes not derived from a collection (e.g. `/about/`).
    #[serde(default)]
    pub pages: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::super::SiteConfig;
    use super::*;

    #[test]
    fn test_build_config_defaults() {
        let config = r#"
            [base]
            title = "Test"
            description = "Test blog"
        "#;
        let config: SiteConfig = toml::from_str(config).unwrap();

        assert_eq!(config.build.content, PathBuf::from("src/content"));
        assert_eq!(config.build.public, PathBuf::from("public"));
        assert_eq!(config.build.output, PathBuf::from("dist"));
        assert!(config.build.rss.enable);
        assert!(config.build.rss.content);
        assert_eq!(config.build.rss.path, PathBuf::from("rss.xml"));
        assert!(config.build.sitemap.enable);
        assert_eq!(config.build.sitemap.exclude, vec!["/tienda", "/services"]);
        assert!(config.build.sitemap.pages.is_empty());
    }

    #[test]
    fn test_rss_config() {
        let config = r#"
            [base]
            title = "Test"
            description = "Test blog"

            [build.rss]
            enable = false
            path = "feed/rss.xml"
            content = false
        "#;
        let config: SiteConfig = toml::from_str(config).unwrap();

        assert!(!config.build.rss.enable);
        assert!(!config.build.rss.content);
        assert_eq!(config.build.rss.path, PathBuf::from("feed/rss.xml"));
    }

    #[test]
    fn test_sitemap_config() {
        let config = r#"
            [base]
            title = "Test"
            description = "Test blog"

            [build.sitemap]
            exclude = ["/drafts"]
            pages = ["/about/", "/services/"]
        "#;
        let config: SiteConfig = toml::from_str(config).unwrap();

        assert_eq!(config.build.sitemap.exclude, vec!["/drafts"]);
        assert_eq!(config.build.sitemap.pages, vec!["/about/", "/services/"]);
    }

    #[test]
    fn test_unknown_build_field_rejection() {
        let config = r#"
            [base]
            title = "Test"
            description = "Test blog"

            [build]
            minify = true
        "#;
        assert!(toml::from_str::<SiteConfig>(config).is_err());
    }
}
