//! Site building orchestration.
//!
//! Content is validated as a whole before anything is written, so a single
//! invalid record leaves the output directory untouched.
//!
//! # Architecture
//!
//! ```text
//! build_site()
//!     │
//!     ├── load_collections()
//!     │       │
//!     │       └── ContentStore ──► schema validation ──► Collections
//!     │           (every failing record is logged, then the build stops)
//!     │
//!     ├── build_rss()     ──► <output>/rss.xml
//!     │
//!     └── build_sitemap() ──► <output>/sitemap.xml
//! ```

use crate::{
    config::SiteConfig,
    content::{Collections, ContentStore, InvalidContent, RecordFailure},
    generator::{rss::build_rss, sitemap::build_sitemap},
    log,
    schema::FsImageProbe,
};
use anyhow::Result;

/// Load and validate every collection under `[build] content`.
pub fn load_collections(config: &SiteConfig) -> Result<Collections> {
    let store = ContentStore::new(&config.build.content);
    let probe = FsImageProbe::new(&config.build.public);

    let collections = Collections::load(&store, &probe).inspect_err(|err| {
        if let Some(invalid) = err.downcast_ref::<InvalidContent>() {
            for line in invalid.0.iter().flat_map(RecordFailure::report_lines) {
                log!("error"; "{line}");
            }
        }
    })?;

    log!(
        "content";
        "{} posts, {} store items",
        collections.blog.len(),
        collections.store.len()
    );
    Ok(collections)
}

/// Validate content without writing any output.
pub fn check_site(config: &SiteConfig) -> Result<()> {
    load_collections(config)?;
    log!("check"; "all content is valid");
    Ok(())
}

/// Validate content, then write the rss feed and the sitemap.
pub fn build_site(config: &SiteConfig) -> Result<()> {
    let collections = load_collections(config)?;

    build_rss(config, &collections.blog)?;
    build_sitemap(config, &collections)?;

    log!("build"; "done, output in {}", config.build.output.display());
    Ok(())
}
