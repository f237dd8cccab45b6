//! # Page Curl Engine
//!
//! Material loading and parameter binding for the page curl sample.
//!
//! ## Features
//!
//! - **Asset Access**: Whole-asset reads from directory or in-memory bundles
//! - **Material Packages**: Chunked compiled-material format with parameter tables
//! - **Engine Seam**: `MaterialEngine` trait with a CPU-side reference engine
//! - **Page Materials**: Lit material instances with the page's default surface
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use page_curl_engine::prelude::*;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut engine = SoftwareEngine::new();
//!     let assets = DirectoryAssetSource::new("assets");
//!
//!     let materials = PageMaterials::new(&mut engine, &assets)?;
//!     let page = materials.create_instance(&mut engine)?;
//!     PageMaterials::set_curl(&mut engine, page, 1.0, 0.5)?;
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions, clippy::similar_names, clippy::too_many_arguments)]

pub mod foundation;
pub mod config;
pub mod assets;
pub mod render;
pub mod page;

/// Common imports for crate users
pub mod prelude {
    pub use crate::{
        assets::{AssetError, AssetSource, DirectoryAssetSource, ImageData, MemoryAssetSource},
        config::{Config, PageCurlConfig},
        foundation::math::{Vec3, Vec4},
        page::{PageMaterials, PageMaterialsError, Parameter},
        render::{
            EngineError, MaterialBuilder, MaterialEngine, MaterialHandle, MaterialInstanceHandle,
            ParameterValue, SoftwareEngine, TextureHandle,
        },
    };
}
