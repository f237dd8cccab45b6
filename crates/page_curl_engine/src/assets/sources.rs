//! Asset source implementations
//!
//! [`DirectoryAssetSource`] mirrors an application bundle laid out on disk;
//! [`MemoryAssetSource`] serves embedded or generated blobs.

use std::collections::HashMap;
use std::fs::File;
use std::io::Cursor;
use std::path::{Component, Path, PathBuf};

use super::{AssetError, AssetFile, AssetSource};

/// Resolves asset names against an ordered list of directories
#[derive(Debug, Clone, Default)]
pub struct DirectoryAssetSource {
    search_paths: Vec<PathBuf>,
}

impl DirectoryAssetSource {
    /// Create a source rooted at a single directory
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            search_paths: vec![root.into()],
        }
    }

    /// Create a source that searches the given directories in order
    pub fn with_search_paths<I, P>(paths: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        Self {
            search_paths: paths.into_iter().map(Into::into).collect(),
        }
    }

    /// Directories searched by this source
    pub fn search_paths(&self) -> &[PathBuf] {
        &self.search_paths
    }

    /// Resolve an asset name to the first existing file
    ///
    /// Names that are absolute or climb out of the search directory with
    /// `..` never resolve.
    pub fn resolve(&self, name: &str) -> Option<PathBuf> {
        if !is_bundle_relative(name) {
            return None;
        }
        self.search_paths
            .iter()
            .map(|dir| dir.join(Path::new(name)))
            .find(|candidate| candidate.is_file())
    }
}

/// Check that an asset name stays inside the directory it is joined to
fn is_bundle_relative(name: &str) -> bool {
    Path::new(name)
        .components()
        .all(|component| matches!(component, Component::Normal(_) | Component::CurDir))
}

impl AssetSource for DirectoryAssetSource {
    fn open(&self, name: &str) -> Result<AssetFile<'_>, AssetError> {
        if !is_bundle_relative(name) {
            return Err(AssetError::InvalidName(name.to_string()));
        }

        let path = self
            .resolve(name)
            .ok_or_else(|| AssetError::NotFound(name.to_string()))?;

        log::debug!("Opening asset '{}' at {:?}", name, path);

        let io_error = |source| AssetError::Io {
            name: name.to_string(),
            source,
        };
        let file = File::open(&path).map_err(io_error)?;
        let length = file.metadata().map_err(io_error)?.len();

        Ok(AssetFile::new(name, length, file))
    }

    fn contains(&self, name: &str) -> bool {
        self.resolve(name).is_some()
    }
}

/// Serves assets from named in-memory buffers
#[derive(Debug, Clone, Default)]
pub struct MemoryAssetSource {
    assets: HashMap<String, Vec<u8>>,
}

impl MemoryAssetSource {
    /// Create an empty source
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace an asset
    pub fn insert(&mut self, name: impl Into<String>, bytes: impl Into<Vec<u8>>) {
        self.assets.insert(name.into(), bytes.into());
    }

    /// Builder-style variant of [`MemoryAssetSource::insert`]
    pub fn with_asset(mut self, name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        self.insert(name, bytes);
        self
    }

    /// Number of assets held
    pub fn len(&self) -> usize {
        self.assets.len()
    }

    /// Check if the source holds no assets
    pub fn is_empty(&self) -> bool {
        self.assets.is_empty()
    }
}

impl AssetSource for MemoryAssetSource {
    fn open(&self, name: &str) -> Result<AssetFile<'_>, AssetError> {
        let bytes = self
            .assets
            .get(name)
            .ok_or_else(|| AssetError::NotFound(name.to_string()))?;

        Ok(AssetFile::new(name, bytes.len() as u64, Cursor::new(bytes.as_slice())))
    }

    fn contains(&self, name: &str) -> bool {
        self.assets.contains_key(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;
    use tempfile::TempDir;

    #[test]
    fn test_directory_source_searches_in_order() {
        let first = TempDir::new().unwrap();
        let second = TempDir::new().unwrap();
        std::fs::create_dir_all(second.path().join("materials")).unwrap();
        std::fs::write(second.path().join("materials/lit.filamat"), b"second").unwrap();

        let source = DirectoryAssetSource::with_search_paths([first.path(), second.path()]);
        assert!(source.contains("materials/lit.filamat"));

        // A copy in the first directory shadows the second
        std::fs::create_dir_all(first.path().join("materials")).unwrap();
        std::fs::write(first.path().join("materials/lit.filamat"), b"first!").unwrap();

        let asset = source.open("materials/lit.filamat").unwrap();
        assert_eq!(asset.length(), 6);
        let mut contents = String::new();
        asset.into_reader().read_to_string(&mut contents).unwrap();
        assert_eq!(contents, "first!");
    }

    #[test]
    fn test_directory_source_missing_asset() {
        let dir = TempDir::new().unwrap();
        let source = DirectoryAssetSource::new(dir.path());

        assert!(!source.contains("materials/lit.filamat"));
        let result = source.open("materials/lit.filamat");
        assert!(matches!(result, Err(AssetError::NotFound(name)) if name == "materials/lit.filamat"));
    }

    #[test]
    fn test_directories_are_not_assets() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir_all(dir.path().join("materials")).unwrap();

        let source = DirectoryAssetSource::new(dir.path());
        assert!(!source.contains("materials"));
    }

    #[test]
    fn test_names_cannot_escape_the_bundle() {
        let outer = TempDir::new().unwrap();
        let bundle = outer.path().join("bundle");
        std::fs::create_dir_all(bundle.join("materials")).unwrap();
        std::fs::write(outer.path().join("secret.bin"), b"outside").unwrap();
        std::fs::write(bundle.join("materials/lit.filamat"), b"inside").unwrap();

        let source = DirectoryAssetSource::new(&bundle);
        let absolute = outer.path().join("secret.bin");
        let absolute = absolute.to_str().unwrap();

        for name in ["../secret.bin", "materials/../../secret.bin", absolute] {
            assert!(!source.contains(name), "{} must not resolve", name);
            assert!(matches!(source.open(name), Err(AssetError::InvalidName(_))));
        }

        assert!(source.contains("./materials/lit.filamat"));
        assert!(source.open("materials/lit.filamat").is_ok());
    }

    #[test]
    fn test_memory_source() {
        let source = MemoryAssetSource::new().with_asset("a.bin", vec![1u8, 2, 3]);
        assert_eq!(source.len(), 1);
        assert!(source.contains("a.bin"));
        assert!(!source.contains("b.bin"));

        let asset = source.open("a.bin").unwrap();
        assert_eq!(asset.name(), "a.bin");
        assert_eq!(asset.length(), 3);
    }
}
