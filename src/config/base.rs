//! `[base]` section configuration.

use super::defaults;
use educe::Educe;
use serde::{Deserialize, Serialize};

/// `[base]` section in bitacora.toml - site-wide constants.
///
/// # Example
/// ```toml
/// [base]
/// title = "Jordi"
/// description = "Notas sobre Java, Spring y desarrollo web"
/// url = "https://asjordi.dev"
/// ```
#[derive(Debug, Clone, Educe, Serialize, Deserialize)]
#[educe(Default)]
#[serde(deny_unknown_fields)]
pub struct BaseConfig {
    /// Site title, used as the feed channel title.
    pub title: String,

    /// Site description, used as the feed channel description.
    pub description: String,

    /// Base URL that feed and sitemap links are resolved against.
    /// Required when rss or sitemap generation is enabled.
    #[serde(default = "defaults::base::url")]
    #[educe(Default = defaults::base::url())]
    pub url: Option<String>,

    #[serde(default = "defaults::base::author")]
    #[educe(Default = defaults::base::author())]
    pub author: String,

    #[serde(default = "defaults::base::email")]
    #[educe(Default = defaults::base::email())]
    pub email: String,

    /// BCP 47 language code (e.g., "es-MX", "en-US").
    #[serde(default = "defaults::base::language")]
    #[educe(Default = defaults::base::language())]
    pub language: String,
}
