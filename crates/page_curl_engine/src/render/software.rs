//! CPU-side reference engine
//!
//! Implements [`MaterialEngine`] without a GPU. Each material records its
//! declared parameters and a uniform block layout; each instance owns a copy
//! of the uniform block plus its texture bindings.

use std::collections::HashMap;

use super::package::{MaterialPackage, ParameterDescriptor, ParameterType};
use super::{
    EngineError, EngineResult, MaterialEngine, MaterialHandle, MaterialInstanceHandle,
    ParameterValue, TextureHandle,
};
use crate::assets::ImageData;
use crate::foundation::collections::HandleMap;
use crate::foundation::math::{Vec3, Vec4};

/// Where a parameter's value is stored
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ParameterSlot {
    /// Byte offset into the uniform block
    Uniform { ty: ParameterType, offset: usize },
    /// Texture binding
    Sampler,
}

impl ParameterSlot {
    const fn ty(self) -> ParameterType {
        match self {
            Self::Uniform { ty, .. } => ty,
            Self::Sampler => ParameterType::Sampler2d,
        }
    }
}

struct MaterialRecord {
    name: String,
    payload_size: usize,
    parameters: Vec<ParameterDescriptor>,
    slots: HashMap<String, ParameterSlot>,
    uniform_size: usize,
}

impl MaterialRecord {
    fn from_package(package: MaterialPackage, payload_size: usize) -> Self {
        let mut slots = HashMap::with_capacity(package.parameters.len());
        let mut offset: usize = 0;

        for parameter in &package.parameters {
            let slot = match uniform_layout(parameter.ty) {
                Some((size, align)) => {
                    offset = offset.next_multiple_of(align);
                    let slot = ParameterSlot::Uniform { ty: parameter.ty, offset };
                    offset += size;
                    slot
                }
                None => ParameterSlot::Sampler,
            };
            slots.insert(parameter.name.clone(), slot);
        }

        Self {
            name: package.name,
            payload_size,
            parameters: package.parameters,
            slots,
            uniform_size: offset.next_multiple_of(16),
        }
    }

    fn slot(&self, name: &str) -> EngineResult<ParameterSlot> {
        self.slots
            .get(name)
            .copied()
            .ok_or_else(|| EngineError::UnknownParameter {
                material: self.name.clone(),
                name: name.to_string(),
            })
    }
}

/// Size and alignment of a uniform parameter (std140 rules)
const fn uniform_layout(ty: ParameterType) -> Option<(usize, usize)> {
    match ty {
        ParameterType::Float => Some((4, 4)),
        ParameterType::Float3 => Some((12, 16)),
        ParameterType::Float4 => Some((16, 16)),
        ParameterType::Sampler2d => None,
    }
}

struct InstanceRecord {
    material: MaterialHandle,
    uniforms: Vec<u8>,
    textures: HashMap<String, TextureHandle>,
}

struct TextureRecord {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

/// In-process [`MaterialEngine`] implementation
#[derive(Default)]
pub struct SoftwareEngine {
    materials: HandleMap<MaterialRecord>,
    instances: HandleMap<InstanceRecord>,
    textures: HandleMap<TextureRecord>,
}

impl SoftwareEngine {
    /// Create an engine with no resources
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live materials
    pub fn material_count(&self) -> usize {
        self.materials.len()
    }

    /// Number of live material instances
    pub fn instance_count(&self) -> usize {
        self.instances.len()
    }

    /// Number of live textures
    pub fn texture_count(&self) -> usize {
        self.textures.len()
    }

    /// Name baked into a material's package
    pub fn material_name(&self, material: MaterialHandle) -> Option<&str> {
        self.materials.get(material.key()).map(|m| m.name.as_str())
    }

    /// Size in bytes of the payload a material was compiled from
    pub fn material_payload_size(&self, material: MaterialHandle) -> Option<usize> {
        self.materials.get(material.key()).map(|m| m.payload_size)
    }

    /// Parameters declared by a material, in package order
    pub fn material_parameters(&self, material: MaterialHandle) -> Option<&[ParameterDescriptor]> {
        self.materials.get(material.key()).map(|m| m.parameters.as_slice())
    }

    /// Material an instance was created from
    pub fn instance_material(&self, instance: MaterialInstanceHandle) -> Option<MaterialHandle> {
        self.instances.get(instance.key()).map(|i| i.material)
    }

    /// Raw uniform block of an instance
    pub fn instance_uniforms(&self, instance: MaterialInstanceHandle) -> Option<&[u8]> {
        self.instances.get(instance.key()).map(|i| i.uniforms.as_slice())
    }

    /// Dimensions of a texture
    pub fn texture_size(&self, texture: TextureHandle) -> Option<(u32, u32)> {
        self.textures.get(texture.key()).map(|t| (t.width, t.height))
    }

    /// RGBA8 pixels of a texture
    pub fn texture_pixels(&self, texture: TextureHandle) -> Option<&[u8]> {
        self.textures.get(texture.key()).map(|t| t.pixels.as_slice())
    }

    fn material_record(&self, material: MaterialHandle) -> EngineResult<&MaterialRecord> {
        self.materials.get(material.key()).ok_or(EngineError::InvalidMaterial)
    }

    fn instance_record(&self, instance: MaterialInstanceHandle) -> EngineResult<&InstanceRecord> {
        self.instances.get(instance.key()).ok_or(EngineError::InvalidInstance)
    }
}

impl MaterialEngine for SoftwareEngine {
    fn create_material(&mut self, payload: &[u8]) -> EngineResult<MaterialHandle> {
        let package = MaterialPackage::parse(payload).map_err(|e| {
            log::warn!("Rejected material payload ({} bytes): {}", payload.len(), e);
            e
        })?;
        let record = MaterialRecord::from_package(package, payload.len());

        log::info!(
            "Built material '{}' ({} bytes, {} parameters, {} byte uniform block)",
            record.name,
            record.payload_size,
            record.parameters.len(),
            record.uniform_size
        );

        Ok(MaterialHandle::new(self.materials.insert(record)))
    }

    fn destroy_material(&mut self, material: MaterialHandle) -> EngineResult<()> {
        let record = self
            .materials
            .remove(material.key())
            .ok_or(EngineError::InvalidMaterial)?;

        let before = self.instances.len();
        self.instances.retain(|_, instance| instance.material != material);
        log::debug!(
            "Destroyed material '{}' and {} instance(s)",
            record.name,
            before - self.instances.len()
        );
        Ok(())
    }

    fn has_parameter(&self, material: MaterialHandle, name: &str) -> EngineResult<bool> {
        Ok(self.material_record(material)?.slots.contains_key(name))
    }

    fn parameter_type(&self, material: MaterialHandle, name: &str) -> EngineResult<Option<ParameterType>> {
        Ok(self
            .material_record(material)?
            .slots
            .get(name)
            .map(|slot| slot.ty()))
    }

    fn create_instance(&mut self, material: MaterialHandle) -> EngineResult<MaterialInstanceHandle> {
        let uniform_size = self.material_record(material)?.uniform_size;
        let record = InstanceRecord {
            material,
            uniforms: vec![0; uniform_size],
            textures: HashMap::new(),
        };
        Ok(MaterialInstanceHandle::new(self.instances.insert(record)))
    }

    fn destroy_instance(&mut self, instance: MaterialInstanceHandle) -> EngineResult<()> {
        self.instances
            .remove(instance.key())
            .map(|_| ())
            .ok_or(EngineError::InvalidInstance)
    }

    fn set_parameter(
        &mut self,
        instance: MaterialInstanceHandle,
        name: &str,
        value: ParameterValue,
    ) -> EngineResult<()> {
        let material = self.instance_record(instance)?.material;
        let slot = self.material_record(material)?.slot(name)?;

        if slot.ty() != value.ty() {
            return Err(EngineError::ParameterType {
                name: name.to_string(),
                expected: slot.ty(),
                found: value.ty(),
            });
        }
        if let ParameterValue::Texture(texture) = value {
            if !self.textures.contains_key(texture.key()) {
                return Err(EngineError::InvalidTexture);
            }
        }

        let record = self
            .instances
            .get_mut(instance.key())
            .ok_or(EngineError::InvalidInstance)?;

        match (slot, value) {
            (ParameterSlot::Uniform { offset, .. }, ParameterValue::Float(v)) => {
                write_floats(&mut record.uniforms, offset, &[v]);
            }
            (ParameterSlot::Uniform { offset, .. }, ParameterValue::Float3(v)) => {
                write_floats(&mut record.uniforms, offset, &[v.x, v.y, v.z]);
            }
            (ParameterSlot::Uniform { offset, .. }, ParameterValue::Float4(v)) => {
                write_floats(&mut record.uniforms, offset, &[v.x, v.y, v.z, v.w]);
            }
            (ParameterSlot::Sampler, ParameterValue::Texture(texture)) => {
                record.textures.insert(name.to_string(), texture);
            }
            // Types were checked above
            _ => unreachable!("parameter slot and value types diverged"),
        }
        Ok(())
    }

    fn parameter(&self, instance: MaterialInstanceHandle, name: &str) -> EngineResult<ParameterValue> {
        let record = self.instance_record(instance)?;
        let slot = self.material_record(record.material)?.slot(name)?;

        let value = match slot {
            ParameterSlot::Uniform { ty: ParameterType::Float, offset } => {
                ParameterValue::Float(read_float(&record.uniforms, offset))
            }
            ParameterSlot::Uniform { ty: ParameterType::Float3, offset } => {
                let [x, y, z] = read_floats::<3>(&record.uniforms, offset);
                ParameterValue::Float3(Vec3::new(x, y, z))
            }
            ParameterSlot::Uniform { ty: ParameterType::Float4, offset } => {
                let [x, y, z, w] = read_floats::<4>(&record.uniforms, offset);
                ParameterValue::Float4(Vec4::new(x, y, z, w))
            }
            ParameterSlot::Uniform { ty: ParameterType::Sampler2d, .. } | ParameterSlot::Sampler => {
                let texture = record
                    .textures
                    .get(name)
                    .copied()
                    .ok_or_else(|| EngineError::ParameterUnset(name.to_string()))?;
                ParameterValue::Texture(texture)
            }
        };
        Ok(value)
    }

    fn create_texture(&mut self, image: &ImageData) -> EngineResult<TextureHandle> {
        let expected = ImageData::rgba_len(image.width, image.height).unwrap_or(usize::MAX);
        if image.data.len() != expected {
            return Err(EngineError::TextureData {
                expected,
                actual: image.data.len(),
            });
        }

        let record = TextureRecord {
            width: image.width,
            height: image.height,
            pixels: image.data.clone(),
        };
        log::debug!("Created {}x{} texture", image.width, image.height);
        Ok(TextureHandle::new(self.textures.insert(record)))
    }

    fn destroy_texture(&mut self, texture: TextureHandle) -> EngineResult<()> {
        self.textures
            .remove(texture.key())
            .ok_or(EngineError::InvalidTexture)?;

        for instance in self.instances.values_mut() {
            instance.textures.retain(|_, bound| *bound != texture);
        }
        Ok(())
    }
}

fn write_floats(block: &mut [u8], offset: usize, values: &[f32]) {
    let bytes: &[u8] = bytemuck::cast_slice(values);
    block[offset..offset + bytes.len()].copy_from_slice(bytes);
}

fn read_float(block: &[u8], offset: usize) -> f32 {
    bytemuck::pod_read_unaligned(&block[offset..offset + 4])
}

fn read_floats<const N: usize>(block: &[u8], offset: usize) -> [f32; N] {
    std::array::from_fn(|i| read_float(block, offset + i * 4))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::PackageWriter;
    use approx::assert_relative_eq;

    fn lit_payload() -> Vec<u8> {
        PackageWriter::new("lit")
            .parameter("roughness", ParameterType::Float)
            .parameter("baseColor", ParameterType::Float3)
            .parameter("metallic", ParameterType::Float)
            .parameter("tint", ParameterType::Float4)
            .parameter("imageTexture", ParameterType::Sampler2d)
            .build()
            .unwrap()
    }

    fn engine_with_material() -> (SoftwareEngine, MaterialHandle) {
        let mut engine = SoftwareEngine::new();
        let material = engine.create_material(&lit_payload()).unwrap();
        (engine, material)
    }

    #[test]
    fn test_uniform_layout_follows_std140() {
        let record = MaterialRecord::from_package(MaterialPackage::parse(&lit_payload()).unwrap(), 0);

        // roughness @0, baseColor aligned to 16, metallic packs after the vec3
        assert_eq!(record.slot("roughness").unwrap(), ParameterSlot::Uniform { ty: ParameterType::Float, offset: 0 });
        assert_eq!(record.slot("baseColor").unwrap(), ParameterSlot::Uniform { ty: ParameterType::Float3, offset: 16 });
        assert_eq!(record.slot("metallic").unwrap(), ParameterSlot::Uniform { ty: ParameterType::Float, offset: 28 });
        assert_eq!(record.slot("tint").unwrap(), ParameterSlot::Uniform { ty: ParameterType::Float4, offset: 32 });
        assert_eq!(record.slot("imageTexture").unwrap(), ParameterSlot::Sampler);
        assert_eq!(record.uniform_size, 48);
    }

    #[test]
    fn test_layout_of_scalars_only() {
        let payload = PackageWriter::new("scalars")
            .parameter("a", ParameterType::Float)
            .parameter("b", ParameterType::Float)
            .build()
            .unwrap();
        let record = MaterialRecord::from_package(MaterialPackage::parse(&payload).unwrap(), payload.len());

        assert_eq!(record.slot("b").unwrap(), ParameterSlot::Uniform { ty: ParameterType::Float, offset: 4 });
        assert_eq!(record.uniform_size, 16);
        assert_eq!(record.payload_size, payload.len());
    }

    #[test]
    fn test_rejects_invalid_payload() {
        let mut engine = SoftwareEngine::new();
        let result = engine.create_material(b"definitely not a material");
        assert!(matches!(result, Err(EngineError::InvalidPayload(_))));
        assert_eq!(engine.material_count(), 0);
    }

    #[test]
    fn test_set_and_read_back_parameters() {
        let (mut engine, material) = engine_with_material();
        let instance = engine.create_instance(material).unwrap();

        engine.set_float3(instance, "baseColor", 0.25, 0.5, 1.0).unwrap();
        engine.set_float(instance, "metallic", 0.75).unwrap();
        engine
            .set_parameter(instance, "tint", ParameterValue::Float4(Vec4::new(1.0, 2.0, 3.0, 4.0)))
            .unwrap();

        match engine.parameter(instance, "baseColor").unwrap() {
            ParameterValue::Float3(color) => {
                assert_relative_eq!(color, Vec3::new(0.25, 0.5, 1.0));
            }
            other => panic!("Expected float3, got {:?}", other),
        }
        assert_eq!(engine.parameter(instance, "metallic").unwrap(), ParameterValue::Float(0.75));
        assert_eq!(engine.parameter(instance, "roughness").unwrap(), ParameterValue::Float(0.0));
        assert_eq!(
            engine.parameter(instance, "tint").unwrap(),
            ParameterValue::Float4(Vec4::new(1.0, 2.0, 3.0, 4.0))
        );
    }

    #[test]
    fn test_type_and_name_checks() {
        let (mut engine, material) = engine_with_material();
        let instance = engine.create_instance(material).unwrap();

        let result = engine.set_float(instance, "baseColor", 1.0);
        assert!(matches!(
            result,
            Err(EngineError::ParameterType { expected: ParameterType::Float3, found: ParameterType::Float, .. })
        ));

        let result = engine.set_float(instance, "apexFloat", 1.0);
        assert!(matches!(result, Err(EngineError::UnknownParameter { .. })));
        assert!(!engine.has_parameter(material, "apexFloat").unwrap());
        assert!(engine.has_parameter(material, "metallic").unwrap());
        assert_eq!(engine.parameter_type(material, "baseColor").unwrap(), Some(ParameterType::Float3));
        assert_eq!(engine.parameter_type(material, "imageTexture").unwrap(), Some(ParameterType::Sampler2d));
        assert_eq!(engine.parameter_type(material, "apexFloat").unwrap(), None);
    }

    #[test]
    fn test_texture_binding() {
        let (mut engine, material) = engine_with_material();
        let instance = engine.create_instance(material).unwrap();

        assert!(matches!(
            engine.parameter(instance, "imageTexture"),
            Err(EngineError::ParameterUnset(_))
        ));

        let texture = engine.create_texture(&ImageData::solid_color(2, 2, [255; 4])).unwrap();
        assert_eq!(engine.texture_size(texture), Some((2, 2)));
        assert_eq!(engine.texture_pixels(texture).map(<[u8]>::len), Some(16));
        engine.set_texture(instance, "imageTexture", texture).unwrap();
        assert_eq!(engine.parameter(instance, "imageTexture").unwrap(), ParameterValue::Texture(texture));

        engine.destroy_texture(texture).unwrap();
        assert!(matches!(
            engine.parameter(instance, "imageTexture"),
            Err(EngineError::ParameterUnset(_))
        ));
        assert!(matches!(
            engine.set_texture(instance, "imageTexture", texture),
            Err(EngineError::InvalidTexture)
        ));
    }

    #[test]
    fn test_texture_size_mismatch() {
        let mut engine = SoftwareEngine::new();
        let mut image = ImageData::solid_color(2, 2, [0; 4]);
        image.data.pop();
        assert!(matches!(
            engine.create_texture(&image),
            Err(EngineError::TextureData { expected: 16, actual: 15 })
        ));
    }

    #[test]
    fn test_destroying_material_destroys_instances() {
        let (mut engine, material) = engine_with_material();
        let first = engine.create_instance(material).unwrap();
        let _second = engine.create_instance(material).unwrap();
        assert_eq!(engine.instance_count(), 2);

        engine.destroy_instance(first).unwrap();
        assert_eq!(engine.instance_count(), 1);
        assert!(matches!(engine.destroy_instance(first), Err(EngineError::InvalidInstance)));

        engine.destroy_material(material).unwrap();
        assert_eq!(engine.material_count(), 0);
        assert_eq!(engine.instance_count(), 0);
        assert!(matches!(engine.create_instance(material), Err(EngineError::InvalidMaterial)));
    }
}
