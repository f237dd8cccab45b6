//! Page curl demo application
//!
//! Loads the page material from the asset bundle, creates one material
//! instance per page and sweeps the curl parameters across a page turn.
//!
//! Usage:
//!   page_curl [config.toml|config.ron]
//!   page_curl --write-sample <bundle-dir>

use std::path::{Path, PathBuf};

use page_curl_engine::foundation::logging;
use page_curl_engine::page::{lit_material_package, LIT_MATERIAL_ASSET};
use page_curl_engine::prelude::*;
use page_curl_engine::render::PackageError;
use page_curl_engine::config::ConfigError;
use thiserror::Error;

const PAGE_COUNT: usize = 2;
const TURN_STEPS: u32 = 8;

#[derive(Error, Debug)]
enum AppError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Material error: {0}")]
    Materials(#[from] PageMaterialsError),

    #[error("Asset error: {0}")]
    Asset(#[from] AssetError),

    #[error("Engine error: {0}")]
    Engine(#[from] EngineError),

    #[error("Package error: {0}")]
    Package(#[from] PackageError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Usage: page_curl [config] | page_curl --write-sample <bundle-dir>")]
    Usage,
}

struct PageCurlApp {
    engine: SoftwareEngine,
    materials: PageMaterials,
    pages: Vec<MaterialInstanceHandle>,
    texture: Option<TextureHandle>,
}

impl PageCurlApp {
    fn new(config: &PageCurlConfig) -> Result<Self, AppError> {
        log::info!("Creating page curl demo...");
        let mut engine = SoftwareEngine::new();
        let assets = DirectoryAssetSource::with_search_paths(config.search_paths.iter().cloned());

        let materials = PageMaterials::with_asset(&mut engine, &assets, &config.material_asset)?;
        let pages = (0..PAGE_COUNT)
            .map(|_| materials.create_instance(&mut engine))
            .collect::<Result<Vec<_>, _>>()?;

        let texture = match &config.page_texture {
            Some(name) => {
                let image = ImageData::from_asset(&assets, name)?;
                let texture = engine.create_texture(&image)?;
                for &page in &pages {
                    PageMaterials::set_image_texture(&mut engine, page, texture)?;
                }
                Some(texture)
            }
            None => {
                log::warn!("No page texture configured; pages render untextured");
                None
            }
        };

        log::info!("Created {} page instance(s)", pages.len());
        Ok(Self {
            engine,
            materials,
            pages,
            texture,
        })
    }

    /// Sweep the top page through a full turn
    fn run(&mut self) -> Result<(), AppError> {
        let Some(&top) = self.pages.last() else {
            return Ok(());
        };

        for step in 0..=TURN_STEPS {
            let t = step as f32 / TURN_STEPS as f32;
            let theta = t * std::f32::consts::FRAC_PI_2;
            let apex = -15.0 * (1.0 - t) - 1.0;
            PageMaterials::set_curl(&mut self.engine, top, apex, theta)?;
            log::debug!("Step {}: apex = {:.2}, theta = {:.3}", step, apex, theta);
        }

        log::info!("Page turn complete");
        Ok(())
    }

    fn shutdown(self) -> Result<(), AppError> {
        let Self {
            mut engine,
            materials,
            texture,
            ..
        } = self;

        materials.destroy(&mut engine)?;
        if let Some(texture) = texture {
            engine.destroy_texture(texture)?;
        }
        log::info!("Released page resources");
        Ok(())
    }
}

fn write_sample(bundle_dir: &Path) -> Result<(), AppError> {
    let path = bundle_dir.join(LIT_MATERIAL_ASSET);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let package = lit_material_package()?;
    std::fs::write(&path, &package)?;
    log::info!("Wrote {} byte material package to {:?}", package.len(), path);
    Ok(())
}

fn run(args: &[String]) -> Result<(), AppError> {
    match args {
        [flag, dir] if flag == "--write-sample" => {
            logging::init_with_filter("info");
            write_sample(&PathBuf::from(dir))
        }
        [flag, ..] if flag == "--write-sample" => Err(AppError::Usage),
        [] | [_] => {
            let config = match args.first() {
                Some(path) => PageCurlConfig::load_from_file(path)?,
                None => PageCurlConfig::default(),
            };
            logging::init_with_filter(&config.log_level);

            let mut app = PageCurlApp::new(&config)?;
            app.run()?;
            app.shutdown()
        }
        _ => Err(AppError::Usage),
    }
}

fn main() {
    let args: Vec<String> = std::env::args().skip(1).collect();
    if let Err(e) = run(&args) {
        log::error!("{}", e);
        eprintln!("error: {}", e);
        std::process::exit(1);
    }
}
