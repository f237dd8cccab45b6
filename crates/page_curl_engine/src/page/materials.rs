//! Loader for the page curl material
//!
//! Construction reads the whole material asset, compiles it through the
//! engine and checks that every parameter the page relies on is declared.
//! A [`PageMaterials`] value therefore only exists once the material is ready.

use thiserror::Error;

use super::{Parameter, LIT_MATERIAL_ASSET};
use crate::assets::{read_asset, AssetError, AssetSource};
use crate::render::{
    EngineError, MaterialBuilder, MaterialEngine, MaterialHandle, MaterialInstanceHandle,
    PackageError, PackageWriter, ParameterType, TextureHandle,
};

/// Base color parameter name
pub const BASE_COLOR: &str = "baseColor";
/// Roughness parameter name
pub const ROUGHNESS: &str = "roughness";
/// Metallic parameter name
pub const METALLIC: &str = "metallic";

/// Base color given to new instances (white)
pub const DEFAULT_BASE_COLOR: [f32; 3] = [1.0, 1.0, 1.0];
/// Roughness given to new instances
pub const DEFAULT_ROUGHNESS: f32 = 0.0;
/// Metallic given to new instances
pub const DEFAULT_METALLIC: f32 = 0.0;

const SURFACE_PARAMETERS: [(&str, ParameterType); 3] = [
    (BASE_COLOR, ParameterType::Float3),
    (ROUGHNESS, ParameterType::Float),
    (METALLIC, ParameterType::Float),
];

/// Errors raised while loading the page material
#[derive(Error, Debug)]
pub enum PageMaterialsError {
    /// Material asset could not be read
    #[error("Failed to read material asset: {0}")]
    Asset(#[from] AssetError),

    /// Engine rejected an operation
    #[error("Engine error: {0}")]
    Engine(#[from] EngineError),

    /// Compiled material lacks a parameter the page binds
    #[error("Material does not declare parameter '{0}'")]
    MissingParameter(&'static str),

    /// Compiled material declares a bound parameter with the wrong type
    #[error("Material declares parameter '{name}' as {found}, expected {expected}")]
    MistypedParameter {
        /// Parameter name
        name: &'static str,
        /// Type the page binds
        expected: ParameterType,
        /// Type the material declares
        found: ParameterType,
    },
}

/// The compiled page material and its instance factory
#[derive(Debug)]
pub struct PageMaterials {
    material: MaterialHandle,
}

impl PageMaterials {
    /// Load and compile `materials/lit.filamat`
    pub fn new<E, S>(engine: &mut E, assets: &S) -> Result<Self, PageMaterialsError>
    where
        E: MaterialEngine + ?Sized,
        S: AssetSource + ?Sized,
    {
        Self::with_asset(engine, assets, LIT_MATERIAL_ASSET)
    }

    /// Load and compile the named material asset
    ///
    /// The asset is read in full before the engine is involved; if reading
    /// fails, no material is built.
    pub fn with_asset<E, S>(engine: &mut E, assets: &S, asset_name: &str) -> Result<Self, PageMaterialsError>
    where
        E: MaterialEngine + ?Sized,
        S: AssetSource + ?Sized,
    {
        let payload = read_asset(assets, asset_name)?;
        let material = MaterialBuilder::new()
            .payload(&payload, payload.len())
            .build(engine)?;

        if let Err(e) = Self::check_parameters(engine, material) {
            log::error!("Material asset '{}' is unusable for pages: {}", asset_name, e);
            engine.destroy_material(material)?;
            return Err(e);
        }

        log::info!("Loaded page material from '{}'", asset_name);
        Ok(Self { material })
    }

    fn check_parameters<E>(engine: &E, material: MaterialHandle) -> Result<(), PageMaterialsError>
    where
        E: MaterialEngine + ?Sized,
    {
        let required = SURFACE_PARAMETERS
            .iter()
            .copied()
            .chain(Parameter::ALL.iter().map(|p| (p.name(), p.ty())));

        for (name, expected) in required {
            match engine.parameter_type(material, name)? {
                None => return Err(PageMaterialsError::MissingParameter(name)),
                Some(found) if found != expected => {
                    return Err(PageMaterialsError::MistypedParameter { name, expected, found });
                }
                Some(_) => {}
            }
        }
        Ok(())
    }

    /// Create an instance with white base color, zero roughness and zero metallic
    ///
    /// If a default cannot be applied the instance is destroyed before the
    /// error is returned.
    pub fn create_instance<E>(&self, engine: &mut E) -> Result<MaterialInstanceHandle, PageMaterialsError>
    where
        E: MaterialEngine + ?Sized,
    {
        let instance = engine.create_instance(self.material)?;
        if let Err(e) = Self::apply_defaults(engine, instance) {
            engine.destroy_instance(instance)?;
            return Err(e.into());
        }
        Ok(instance)
    }

    fn apply_defaults<E>(engine: &mut E, instance: MaterialInstanceHandle) -> Result<(), EngineError>
    where
        E: MaterialEngine + ?Sized,
    {
        let [r, g, b] = DEFAULT_BASE_COLOR;
        engine.set_float3(instance, BASE_COLOR, r, g, b)?;
        engine.set_float(instance, ROUGHNESS, DEFAULT_ROUGHNESS)?;
        engine.set_float(instance, METALLIC, DEFAULT_METALLIC)
    }

    /// The compiled material
    pub const fn material(&self) -> MaterialHandle {
        self.material
    }

    /// Shader-side name of a page parameter
    pub const fn parameter_name(parameter: Parameter) -> &'static str {
        parameter.name()
    }

    /// Set the curl cone apex and angle of an instance
    pub fn set_curl<E>(
        engine: &mut E,
        instance: MaterialInstanceHandle,
        apex: f32,
        theta: f32,
    ) -> Result<(), PageMaterialsError>
    where
        E: MaterialEngine + ?Sized,
    {
        engine.set_float(instance, Parameter::ApexFloat.name(), apex)?;
        engine.set_float(instance, Parameter::ThetaFloat.name(), theta)?;
        Ok(())
    }

    /// Bind the image drawn on the page
    pub fn set_image_texture<E>(
        engine: &mut E,
        instance: MaterialInstanceHandle,
        texture: TextureHandle,
    ) -> Result<(), PageMaterialsError>
    where
        E: MaterialEngine + ?Sized,
    {
        engine.set_texture(instance, Parameter::ImageTexture.name(), texture)?;
        Ok(())
    }

    /// Destroy the material and every instance created from it
    pub fn destroy<E>(self, engine: &mut E) -> Result<(), PageMaterialsError>
    where
        E: MaterialEngine + ?Sized,
    {
        engine.destroy_material(self.material)?;
        Ok(())
    }
}

/// Serialized package declaring every parameter the page material uses
pub fn lit_material_package() -> Result<Vec<u8>, PackageError> {
    let writer = SURFACE_PARAMETERS
        .iter()
        .fold(PackageWriter::new("lit"), |writer, (name, ty)| writer.parameter(*name, *ty));
    Parameter::ALL
        .iter()
        .fold(writer, |writer, p| writer.parameter(p.name(), p.ty()))
        .build()
}
