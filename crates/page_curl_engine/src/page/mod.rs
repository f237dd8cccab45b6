//! Page curl materials
//!
//! Loads the compiled `lit` material used by the page curl effect and hands
//! out instances with the sample's default surface parameters.

pub mod materials;
pub mod parameter;

pub use materials::{lit_material_package, PageMaterials, PageMaterialsError};
pub use parameter::Parameter;

/// Asset name of the compiled page material
pub const LIT_MATERIAL_ASSET: &str = "materials/lit.filamat";
