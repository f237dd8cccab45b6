//! Rendering engine interface
//!
//! Materials, material instances and textures are engine-owned resources
//! addressed through typed handles. [`MaterialEngine`] is the seam the page
//! materials are written against; [`SoftwareEngine`] is the in-process
//! implementation used by the sample app and the tests.

pub mod builder;
pub mod package;
pub mod software;

pub use builder::MaterialBuilder;
pub use package::{MaterialPackage, PackageError, PackageWriter, ParameterDescriptor, ParameterType};
pub use software::SoftwareEngine;

use thiserror::Error;

use crate::assets::ImageData;
use crate::foundation::collections::TypedHandle;
use crate::foundation::math::{Vec3, Vec4};

/// Marker for handles to compiled materials
#[derive(Debug)]
pub enum Material {}

/// Marker for handles to material instances
#[derive(Debug)]
pub enum MaterialInstance {}

/// Marker for handles to textures
#[derive(Debug)]
pub enum Texture {}

/// Handle to a compiled material
pub type MaterialHandle = TypedHandle<Material>;

/// Handle to a material instance
pub type MaterialInstanceHandle = TypedHandle<MaterialInstance>;

/// Handle to a texture
pub type TextureHandle = TypedHandle<Texture>;

/// Value bound to a named material parameter
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ParameterValue {
    /// Scalar float
    Float(f32),
    /// Three-component vector
    Float3(Vec3),
    /// Four-component vector
    Float4(Vec4),
    /// Texture sampled through a 2D sampler
    Texture(TextureHandle),
}

impl ParameterValue {
    /// Parameter type this value can be bound to
    pub const fn ty(&self) -> ParameterType {
        match self {
            Self::Float(_) => ParameterType::Float,
            Self::Float3(_) => ParameterType::Float3,
            Self::Float4(_) => ParameterType::Float4,
            Self::Texture(_) => ParameterType::Sampler2d,
        }
    }
}

/// Engine errors
#[derive(Error, Debug)]
pub enum EngineError {
    /// Payload could not be decoded as a material package
    #[error("Invalid material payload: {0}")]
    InvalidPayload(#[from] PackageError),

    /// No payload was supplied to the builder
    #[error("Material builder has no payload")]
    EmptyPayload,

    /// Declared payload size exceeds the buffer
    #[error("Payload size {declared} exceeds buffer of {available} bytes")]
    PayloadLength {
        /// Size passed to the builder
        declared: usize,
        /// Bytes actually available
        available: usize,
    },

    /// Material handle is stale or foreign
    #[error("Invalid material handle")]
    InvalidMaterial,

    /// Instance handle is stale or foreign
    #[error("Invalid material instance handle")]
    InvalidInstance,

    /// Texture handle is stale or foreign
    #[error("Invalid texture handle")]
    InvalidTexture,

    /// Material does not declare the named parameter
    #[error("Material '{material}' has no parameter '{name}'")]
    UnknownParameter {
        /// Material name
        material: String,
        /// Requested parameter
        name: String,
    },

    /// Value type does not match the declared parameter type
    #[error("Parameter '{name}' is {expected}, got {found}")]
    ParameterType {
        /// Parameter name
        name: String,
        /// Declared type
        expected: ParameterType,
        /// Supplied type
        found: ParameterType,
    },

    /// Sampler parameter has no texture bound
    #[error("Parameter '{0}' has no texture bound")]
    ParameterUnset(String),

    /// Pixel data does not match the texture dimensions
    #[error("Texture data is {actual} bytes, expected {expected}")]
    TextureData {
        /// Bytes required for width * height RGBA8
        expected: usize,
        /// Bytes supplied
        actual: usize,
    },
}

/// Result type for engine operations
pub type EngineResult<T> = Result<T, EngineError>;

/// Material and resource operations provided by a rendering engine
pub trait MaterialEngine {
    /// Compile a material from a complete package payload
    fn create_material(&mut self, payload: &[u8]) -> EngineResult<MaterialHandle>;

    /// Destroy a material and every instance created from it
    fn destroy_material(&mut self, material: MaterialHandle) -> EngineResult<()>;

    /// Check whether a material declares the named parameter
    fn has_parameter(&self, material: MaterialHandle, name: &str) -> EngineResult<bool>;

    /// Declared type of a material parameter, `None` if it is not declared
    fn parameter_type(&self, material: MaterialHandle, name: &str) -> EngineResult<Option<ParameterType>>;

    /// Create a new instance of a material
    fn create_instance(&mut self, material: MaterialHandle) -> EngineResult<MaterialInstanceHandle>;

    /// Destroy a single material instance
    fn destroy_instance(&mut self, instance: MaterialInstanceHandle) -> EngineResult<()>;

    /// Bind a value to a named parameter of an instance
    fn set_parameter(
        &mut self,
        instance: MaterialInstanceHandle,
        name: &str,
        value: ParameterValue,
    ) -> EngineResult<()>;

    /// Read back the value bound to a named parameter of an instance
    fn parameter(&self, instance: MaterialInstanceHandle, name: &str) -> EngineResult<ParameterValue>;

    /// Upload an RGBA8 image as a texture
    fn create_texture(&mut self, image: &ImageData) -> EngineResult<TextureHandle>;

    /// Destroy a texture
    fn destroy_texture(&mut self, texture: TextureHandle) -> EngineResult<()>;

    /// Bind a scalar float parameter
    fn set_float(&mut self, instance: MaterialInstanceHandle, name: &str, value: f32) -> EngineResult<()> {
        self.set_parameter(instance, name, ParameterValue::Float(value))
    }

    /// Bind a float3 parameter from components
    fn set_float3(
        &mut self,
        instance: MaterialInstanceHandle,
        name: &str,
        x: f32,
        y: f32,
        z: f32,
    ) -> EngineResult<()> {
        self.set_parameter(instance, name, ParameterValue::Float3(Vec3::new(x, y, z)))
    }

    /// Bind a texture to a sampler parameter
    fn set_texture(
        &mut self,
        instance: MaterialInstanceHandle,
        name: &str,
        texture: TextureHandle,
    ) -> EngineResult<()> {
        self.set_parameter(instance, name, ParameterValue::Texture(texture))
    }
}
