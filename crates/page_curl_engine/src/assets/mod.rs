//! Asset access for bundled, read-only binary resources
//!
//! An [`AssetSource`] resolves asset names (e.g. `materials/lit.filamat`) to
//! an open [`AssetFile`] carrying the reported length. [`read_asset`] reads a
//! whole asset into memory and releases the file before returning.

pub mod image_loader;
pub mod reader;
pub mod sources;

pub use image_loader::ImageData;
pub use reader::read_asset;
pub use sources::{DirectoryAssetSource, MemoryAssetSource};

use std::io::Read;
use thiserror::Error;

/// Source of named, read-only assets
pub trait AssetSource {
    /// Open the named asset for reading
    fn open(&self, name: &str) -> Result<AssetFile<'_>, AssetError>;

    /// Check whether the named asset can be resolved
    fn contains(&self, name: &str) -> bool;
}

/// An open asset: a reader plus the length reported by its source
pub struct AssetFile<'a> {
    name: String,
    length: u64,
    reader: Box<dyn Read + 'a>,
}

impl<'a> AssetFile<'a> {
    /// Wrap a reader for the named asset
    pub fn new(name: impl Into<String>, length: u64, reader: impl Read + 'a) -> Self {
        Self {
            name: name.into(),
            length,
            reader: Box::new(reader),
        }
    }

    /// Asset name as requested from the source
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Length in bytes reported by the source
    pub fn length(&self) -> u64 {
        self.length
    }

    /// Consume the handle, yielding its reader
    pub fn into_reader(self) -> Box<dyn Read + 'a> {
        self.reader
    }
}

impl std::fmt::Debug for AssetFile<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AssetFile")
            .field("name", &self.name)
            .field("length", &self.length)
            .finish_non_exhaustive()
    }
}

/// Asset loading errors
#[derive(Error, Debug)]
pub enum AssetError {
    /// Asset not found
    #[error("Asset not found: {0}")]
    NotFound(String),

    /// Asset name is absolute or leaves the bundle root
    #[error("Invalid asset name: {0}")]
    InvalidName(String),

    /// IO error while opening or reading an asset
    #[error("IO error reading asset '{name}': {source}")]
    Io {
        /// Asset name
        name: String,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// Fewer bytes were available than the reported asset length
    #[error("Asset '{name}' truncated: expected {expected} bytes, read {actual}")]
    Truncated {
        /// Asset name
        name: String,
        /// Reported length
        expected: u64,
        /// Bytes actually read
        actual: usize,
    },

    /// Reported length does not fit in memory on this platform
    #[error("Asset '{name}' too large: {length} bytes")]
    TooLarge {
        /// Asset name
        name: String,
        /// Reported length
        length: u64,
    },

    /// Failed to decode asset contents
    #[error("Failed to load asset: {0}")]
    LoadFailed(String),
}
