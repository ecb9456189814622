//! Image probing for `heroImage` refinements.
//!
//! The validator only needs intrinsic pixel dimensions; how a reference is
//! resolved and read lives behind [`ImageProbe`].

use super::ImageAsset;
use anyhow::{Context, Result, bail};
use std::path::{Path, PathBuf};

/// Resolves an image reference and reports its pixel dimensions.
pub trait ImageProbe {
    /// `origin` is the content file that holds the reference.
    fn probe(&self, src: &str, origin: &Path) -> Result<ImageAsset>;
}

/// Reads image headers from disk.
///
/// - `/images/hero.png` resolves against the public directory
/// - `./hero.png`, `../../assets/hero.png` resolve against the content file
#[derive(Debug, Clone)]
pub struct FsImageProbe {
    public: PathBuf,
}

impl FsImageProbe {
    pub fn new(public: impl Into<PathBuf>) -> Self {
        Self {
            public: public.into(),
        }
    }

    fn resolve(&self, src: &str, origin: &Path) -> PathBuf {
        match src.strip_prefix('/') {
            Some(rest) => self.public.join(rest),
            None => origin.parent().unwrap_or(Path::new(".")).join(src),
        }
    }
}

impl ImageProbe for FsImageProbe {
    fn probe(&self, src: &str, origin: &Path) -> Result<ImageAsset> {
        if src.contains("://") {
            bail!("remote images are not supported");
        }

        let path = self.resolve(src, origin);
        let size = imagesize::size(&path)
            .with_context(|| format!("failed to read {}", path.display()))?;

        Ok(ImageAsset {
            src: src.to_owned(),
            path,
            width: u32::try_from(size.width)?,
            height: u32::try_from(size.height)?,
        })
    }
}
