//! Image loading for the page texture
//!
//! Decodes PNG images to RGBA8 for upload through the engine.

use std::path::Path;

use super::{read_asset, AssetError, AssetSource};

/// Decoded RGBA8 image data
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageData {
    /// Raw RGBA pixel data
    pub data: Vec<u8>,
    /// Image width in pixels
    pub width: u32,
    /// Image height in pixels
    pub height: u32,
}

impl ImageData {
    /// Load an image from a file path
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, AssetError> {
        let path_ref = path.as_ref();

        log::debug!("Loading image from: {:?}", path_ref);

        let img = image::open(path_ref)
            .map_err(|e| AssetError::LoadFailed(format!("Failed to load image {:?}: {}", path_ref, e)))?;

        let rgba_img = img.to_rgba8();
        let (width, height) = rgba_img.dimensions();

        log::info!("Loaded image {}x{} from {:?}", width, height, path_ref);

        Ok(Self {
            data: rgba_img.into_raw(),
            width,
            height,
        })
    }

    /// Load a named image asset through an asset source
    pub fn from_asset<S>(source: &S, name: &str) -> Result<Self, AssetError>
    where
        S: AssetSource + ?Sized,
    {
        let bytes = read_asset(source, name)?;
        Self::from_bytes(&bytes)
    }

    /// Decode an image from memory
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, AssetError> {
        let img = image::load_from_memory(bytes)
            .map_err(|e| AssetError::LoadFailed(format!("Failed to load image from bytes: {}", e)))?;

        let rgba_img = img.to_rgba8();
        let (width, height) = rgba_img.dimensions();

        log::debug!("Loaded image {}x{} from memory", width, height);

        Ok(Self {
            data: rgba_img.into_raw(),
            width,
            height,
        })
    }

    /// Bytes needed for `width` x `height` RGBA8 pixels, `None` on overflow
    pub fn rgba_len(width: u32, height: u32) -> Option<usize> {
        usize::try_from(width)
            .ok()?
            .checked_mul(usize::try_from(height).ok()?)?
            .checked_mul(4)
    }

    /// Create a solid color image
    ///
    /// # Panics
    /// Panics if the pixel buffer size overflows `usize`.
    pub fn solid_color(width: u32, height: u32, color: [u8; 4]) -> Self {
        let len = Self::rgba_len(width, height)
            .unwrap_or_else(|| panic!("{}x{} image size overflows usize", width, height));
        let data = color.repeat(len / 4);

        Self {
            data,
            width,
            height,
        }
    }

    /// Size of the pixel data in bytes
    pub fn size_bytes(&self) -> usize {
        self.data.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::{DirectoryAssetSource, MemoryAssetSource};
    use image::{ImageFormat, Rgba, RgbaImage};
    use std::io::Cursor;

    fn encode_png(width: u32, height: u32, color: [u8; 4]) -> Vec<u8> {
        let img = RgbaImage::from_pixel(width, height, Rgba(color));
        let mut bytes = Cursor::new(Vec::new());
        img.write_to(&mut bytes, ImageFormat::Png).unwrap();
        bytes.into_inner()
    }

    #[test]
    fn test_solid_color_image() {
        let img = ImageData::solid_color(4, 4, [255, 0, 0, 255]);
        assert_eq!(img.width, 4);
        assert_eq!(img.height, 4);
        assert_eq!(img.size_bytes(), 4 * 4 * 4);
        assert_eq!(&img.data[0..4], &[255, 0, 0, 255]);
    }

    #[test]
    fn test_rgba_len_uses_wide_arithmetic() {
        assert_eq!(ImageData::rgba_len(3, 2), Some(24));
        assert_eq!(ImageData::rgba_len(u32::MAX, 0), Some(0));

        // 65536 * 65536 overflows u32 but not a 64-bit usize
        #[cfg(target_pointer_width = "64")]
        assert_eq!(ImageData::rgba_len(65_536, 65_536), Some(65_536 * 65_536 * 4));
        #[cfg(target_pointer_width = "64")]
        assert_eq!(ImageData::rgba_len(u32::MAX, u32::MAX), None);
    }

    #[test]
    fn test_decode_png_from_asset() {
        let source = MemoryAssetSource::new()
            .with_asset("textures/page.png", encode_png(3, 2, [10, 20, 30, 255]));

        let img = ImageData::from_asset(&source, "textures/page.png").unwrap();
        assert_eq!((img.width, img.height), (3, 2));
        assert_eq!(img, ImageData::solid_color(3, 2, [10, 20, 30, 255]));
    }

    #[test]
    fn test_decode_png_from_search_paths() {
        let empty = tempfile::TempDir::new().unwrap();
        let bundle = tempfile::TempDir::new().unwrap();
        std::fs::create_dir_all(bundle.path().join("textures")).unwrap();
        std::fs::write(bundle.path().join("textures/page.png"), encode_png(2, 2, [1, 2, 3, 255])).unwrap();

        let source = DirectoryAssetSource::with_search_paths([empty.path(), bundle.path()]);
        let img = ImageData::from_asset(&source, "textures/page.png").unwrap();
        assert_eq!(img, ImageData::solid_color(2, 2, [1, 2, 3, 255]));
    }

    #[test]
    fn test_load_png_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("page.png");
        std::fs::write(&path, encode_png(8, 8, [255, 255, 255, 255])).unwrap();

        let img = ImageData::from_file(&path).unwrap();
        assert_eq!(img.size_bytes(), 8 * 8 * 4);
    }

    #[test]
    fn test_garbage_bytes_fail() {
        let result = ImageData::from_bytes(b"not a png");
        assert!(matches!(result, Err(AssetError::LoadFailed(_))));
    }

    #[test]
    fn test_nonexistent_file() {
        let result = ImageData::from_file("nonexistent_file.png");
        assert!(result.is_err(), "Should fail to load nonexistent file");
    }
}
