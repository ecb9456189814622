//! Documents derived from validated content.
//!
//! - [`rss`]: blog syndication feed
//! - [`sitemap`]: search engine sitemap
//! - [`markup`]: markdown rendering and sanitizing for feed content

pub mod markup;
pub mod rss;
pub mod sitemap;
