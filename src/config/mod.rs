//! Site configuration management for `bitacora.toml`.
//!
//! # Sections
//!
//! | Section     | Purpose                                        |
//! |-------------|------------------------------------------------|
//! | `[base]`    | Site constants (title, description, url)       |
//! | `[build]`   | Content/output paths, rss and sitemap switches |
//! | `[extra]`   | User-defined custom fields                     |
//!
//! # Example
//!
//! ```toml
//! [base]
//! title = "Jordi"
//! description = "Blog personal"
//! url = "https://asjordi.dev"
//!
//! [build]
//! content = "src/content"
//! output = "dist"
//!
//! [build.sitemap]
//! exclude = ["/tienda", "/services"]
//! ```

mod base;
mod build;
pub mod defaults;
mod error;

use base::BaseConfig;
use build::BuildConfig;
use error::ConfigError;

use crate::cli::{Cli, Commands};
use anyhow::{Result, bail};
use educe::Educe;
use serde::{Deserialize, Serialize};
use std::{
    collections::HashMap,
    fs,
    path::{Path, PathBuf},
};

/// Root configuration structure representing bitacora.toml
#[derive(Debug, Clone, Educe, Serialize, Deserialize)]
#[educe(Default)]
#[serde(deny_unknown_fields)]
pub struct SiteConfig {
    /// Absolute path to the config file (set after loading)
    #[serde(skip)]
    pub config_path: PathBuf,

    #[serde(default)]
    pub base: BaseConfig,

    #[serde(default)]
    pub build: BuildConfig,

    /// User-defined extra fields
    #[serde(default)]
    pub extra: HashMap<String, toml::Value>,
}

impl SiteConfig {
    /// Parse configuration from TOML string
    pub fn parse(content: &str) -> Result<Self> {
        let config: SiteConfig = toml::from_str(content).map_err(ConfigError::Toml)?;
        Ok(config)
    }

    /// Load configuration from file path
    pub fn from_path(path: &Path) -> Result<Self> {
        let content =
            fs::read_to_string(path).map_err(|err| ConfigError::Io(path.to_path_buf(), err))?;
        let mut config = Self::parse(&content)?;
        config.config_path = path.to_path_buf();
        Ok(config)
    }

    pub fn get_root(&self) -> &Path {
        self.build.root.as_deref().unwrap_or(Path::new("./"))
    }

    pub fn set_root(&mut self, path: &Path) {
        self.build.root = Some(path.to_path_buf())
    }

    /// Apply CLI overrides and resolve every path against the project root.
    pub fn update_with_cli(&mut self, cli: &Cli) {
        let root = cli
            .root
            .clone()
            .unwrap_or_else(|| self.get_root().to_owned());

        Self::update_option(&mut self.build.content, cli.content.as_ref());
        Self::update_option(&mut self.build.output, cli.output.as_ref());

        let root = Self::normalize_path(&root);
        self.set_root(&root);
        self.config_path = Self::normalize_path(&root.join(&cli.config));
        self.build.content = Self::normalize_path(&root.join(&self.build.content));
        self.build.public = Self::normalize_path(&root.join(&self.build.public));
        self.build.output = Self::normalize_path(&root.join(&self.build.output));

        match &cli.command {
            Commands::Build { build_args } => {
                Self::update_option(&mut self.build.rss.enable, build_args.rss.as_ref());
                Self::update_option(&mut self.build.sitemap.enable, build_args.sitemap.as_ref());
                if let Some(url) = &build_args.base_url {
                    self.base.url = Some(url.clone());
                }
            }
            // `check` only validates content, nothing is written.
            Commands::Check => {
                self.build.rss.enable = false;
                self.build.sitemap.enable = false;
            }
        }
    }

    /// Update config option if CLI value is provided
    fn update_option<T: Clone>(config_option: &mut T, cli_option: Option<&T>) {
        if let Some(option) = cli_option {
            *config_option = option.clone();
        }
    }

    /// Normalize a path to absolute, using canonicalize if the path exists
    fn normalize_path(path: &Path) -> PathBuf {
        path.canonicalize().unwrap_or_else(|_| {
            if path.is_absolute() {
                path.to_path_buf()
            } else {
                std::env::current_dir()
                    .map(|cwd| cwd.join(path))
                    .unwrap_or_else(|_| path.to_path_buf())
            }
        })
    }

    /// Resolved output path of the rss feed.
    pub fn rss_path(&self) -> PathBuf {
        self.build.output.join(&self.build.rss.path)
    }

    /// Resolved output path of the sitemap.
    pub fn sitemap_path(&self) -> PathBuf {
        self.build.output.join(&self.build.sitemap.path)
    }

    pub fn validate(&self) -> Result<()> {
        let needs_url = self.build.rss.enable || self.build.sitemap.enable;
        match &self.base.url {
            None if needs_url => bail!(ConfigError::Validation(
                "[base.url] is required for rss and sitemap generation".into()
            )),
            Some(url) if !url.starts_with("http") => bail!(ConfigError::Validation(
                "[base.url] must start with http:// or https://".into()
            )),
            _ => {}
        }

        if let Some(prefix) = self
            .build
            .sitemap
            .exclude
            .iter()
            .chain(&self.build.sitemap.pages)
            .find(|route| !route.starts_with('/'))
        {
            bail!(ConfigError::Validation(format!(
                "[build.sitemap] routes must start with `/`: `{prefix}`"
            )));
        }

        if !self.build.content.is_dir() {
            bail!(ConfigError::Validation(format!(
                "[build.content] not found: {}",
                self.build.content.display()
            )));
        }

        Ok(())
    }
}
