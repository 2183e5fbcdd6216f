//! Where partition images come from and where erase images go.
//!
//! The decoder only needs bytes; these traits keep the transport out of it.
//! The file-backed implementations cover dumps already pulled off a device.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use partition::{erase_image, Geometry, PartitionError};
use tracing::{info, warn};

/// Produces a raw partition image.
pub trait PartitionSource {
    /// Fetches the partition into `target` and returns its bytes.
    fn fetch(&self, target: &Path) -> Result<Vec<u8>>;
}

/// Accepts a payload to program over the partition.
pub trait EraseTarget {
    fn program(&self, payload: &[u8]) -> Result<()>;
}

/// A partition image already saved to disk.
#[derive(Debug, Clone, Copy)]
pub struct DumpFile {
    geometry: Geometry,
}

impl DumpFile {
    #[must_use]
    pub fn new(geometry: Geometry) -> Self {
        Self { geometry }
    }
}

impl PartitionSource for DumpFile {
    /// Reads the image at `target`.
    ///
    /// A file shorter than the geometry fails with
    /// [`PartitionError::ImageTooShort`]; a longer one is truncated.
    fn fetch(&self, target: &Path) -> Result<Vec<u8>> {
        self.geometry
            .validate()
            .context("invalid partition geometry")?;
        let mut image = fs::read(target)
            .with_context(|| format!("reading partition image {}", target.display()))?;
        let expected = self.geometry.image_len();
        if image.len() < expected {
            return Err(PartitionError::ImageTooShort {
                expected,
                actual: image.len(),
            })
            .with_context(|| format!("partition image {}", target.display()));
        }
        if image.len() > expected {
            warn!(
                path = %target.display(),
                expected,
                actual = image.len(),
                "image longer than the partition, ignoring the excess"
            );
            image.truncate(expected);
        }
        Ok(image)
    }
}

/// Writes the erase payload to a file, ready to be flashed.
#[derive(Debug, Clone)]
pub struct EraseFile {
    path: PathBuf,
}

impl EraseFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl EraseTarget for EraseFile {
    fn program(&self, payload: &[u8]) -> Result<()> {
        fs::write(&self.path, payload)
            .with_context(|| format!("writing erase image {}", self.path.display()))
    }
}

/// Programs an all-`0xFF` image of `geometry` to `target`. Returns its size.
pub fn clear<T: EraseTarget + ?Sized>(geometry: &Geometry, target: &T) -> Result<usize> {
    geometry.validate().context("invalid partition geometry")?;
    let payload = erase_image(geometry);
    target.program(&payload)?;
    info!(bytes = payload.len(), "erase image programmed");
    Ok(payload.len())
}
