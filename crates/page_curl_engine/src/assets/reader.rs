//! Whole-asset reads
//!
//! The asset handle is owned by [`read_asset`] and dropped before it returns,
//! so the underlying file is closed on success and on every error path.

use std::io::Read;

use super::{AssetError, AssetSource};

/// Read the named asset fully into a buffer sized by its reported length
///
/// The returned buffer always holds exactly `length` bytes. A source that
/// yields fewer bytes than it reported produces [`AssetError::Truncated`];
/// bytes beyond the reported length are never read.
pub fn read_asset<S>(source: &S, name: &str) -> Result<Vec<u8>, AssetError>
where
    S: AssetSource + ?Sized,
{
    let result = read_fully(source, name);
    match &result {
        Ok(buffer) => log::debug!("Read asset '{}' ({} bytes)", name, buffer.len()),
        Err(e) => log::error!("Failed to read asset '{}': {}", name, e),
    }
    result
}

fn read_fully<S>(source: &S, name: &str) -> Result<Vec<u8>, AssetError>
where
    S: AssetSource + ?Sized,
{
    let asset = source.open(name)?;
    let length = asset.length();
    let expected = usize::try_from(length).map_err(|_| AssetError::TooLarge {
        name: name.to_string(),
        length,
    })?;

    let mut buffer = Vec::with_capacity(expected);
    let read = asset
        .into_reader()
        .take(length)
        .read_to_end(&mut buffer)
        .map_err(|source| AssetError::Io {
            name: name.to_string(),
            source,
        })?;

    if read != expected {
        return Err(AssetError::Truncated {
            name: name.to_string(),
            expected: length,
            actual: read,
        });
    }

    Ok(buffer)
}
