//! Material builder
//!
//! Hands a payload and its size to an engine for compilation.

use super::{EngineError, EngineResult, MaterialEngine, MaterialHandle};

/// Builder for compiling a material from a package payload
///
/// # Examples
/// ```ignore
/// let material = MaterialBuilder::new()
///     .payload(&bytes, bytes.len())
///     .build(&mut engine)?;
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct MaterialBuilder<'a> {
    payload: Option<(&'a [u8], usize)>,
}

impl<'a> MaterialBuilder<'a> {
    /// Create a builder with no payload
    pub const fn new() -> Self {
        Self { payload: None }
    }

    /// Set the payload and the number of bytes of it to use
    pub fn payload(mut self, bytes: &'a [u8], size: usize) -> Self {
        self.payload = Some((bytes, size));
        self
    }

    /// Compile the material on the given engine
    pub fn build<E>(self, engine: &mut E) -> EngineResult<MaterialHandle>
    where
        E: MaterialEngine + ?Sized,
    {
        let (bytes, size) = self.payload.ok_or(EngineError::EmptyPayload)?;
        if size > bytes.len() {
            return Err(EngineError::PayloadLength {
                declared: size,
                available: bytes.len(),
            });
        }
        if size == 0 {
            return Err(EngineError::EmptyPayload);
        }

        engine.create_material(&bytes[..size])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::{PackageWriter, ParameterType, SoftwareEngine};

    fn payload() -> Vec<u8> {
        PackageWriter::new("flat")
            .parameter("roughness", ParameterType::Float)
            .build()
            .unwrap()
    }

    #[test]
    fn test_build_without_payload() {
        let mut engine = SoftwareEngine::new();
        let result = MaterialBuilder::new().build(&mut engine);
        assert!(matches!(result, Err(EngineError::EmptyPayload)));
        assert_eq!(engine.material_count(), 0);
    }

    #[test]
    fn test_declared_size_larger_than_buffer() {
        let mut engine = SoftwareEngine::new();
        let bytes = payload();
        let result = MaterialBuilder::new().payload(&bytes, bytes.len() + 1).build(&mut engine);
        assert!(matches!(result, Err(EngineError::PayloadLength { .. })));
        assert_eq!(engine.material_count(), 0);
    }

    #[test]
    fn test_short_size_truncates_payload() {
        let mut engine = SoftwareEngine::new();
        let bytes = payload();
        let result = MaterialBuilder::new().payload(&bytes, bytes.len() - 2).build(&mut engine);
        assert!(matches!(result, Err(EngineError::InvalidPayload(_))));
    }

    #[test]
    fn test_build_records_payload_size() {
        let mut engine = SoftwareEngine::new();
        let bytes = payload();
        let material = MaterialBuilder::new().payload(&bytes, bytes.len()).build(&mut engine).unwrap();

        assert_eq!(engine.material_payload_size(material), Some(bytes.len()));
        assert_eq!(engine.material_name(material), Some("flat"));
    }
}
